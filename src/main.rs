mod cli;
mod config;
mod render;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ledgertrail::{
    AccountFilter, FileSource, HttpSource, MovementSource, OpeningBalanceSource, StatementReport,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ConfigCmd, OutputFormat, SourceArgs, StatementArgs};
use crate::config::{AppConfig, app_paths, load_or_init_config, write_config};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("LEDGERTRAIL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let paths = app_paths(cli.home.clone())?;
    let (mut cfg, cfg_path) = load_or_init_config(&paths)?;

    match cli.command {
        Command::Statement(args) => handle_statement(&cfg, args),
        Command::Accounts(source) => {
            let sources = Sources::resolve(&cfg, &source)?;
            let mut report = sources.load()?;
            report.set_filter(AccountFilter::All);
            sources.refresh_openings(&mut report);
            print!("{}", render::accounts_table(&report));
            Ok(())
        }
        Command::Config(args) => handle_config(args.cmd, &mut cfg, &cfg_path),
    }
}

/// Movement and opening-balance collaborators picked from flags and config.
enum Sources {
    File(FileSource),
    Http(HttpSource),
}

impl Sources {
    fn resolve(cfg: &AppConfig, args: &SourceArgs) -> Result<Self> {
        if let Some(path) = &args.movements_file {
            return Ok(Sources::File(FileSource::new(
                path,
                args.openings_file.clone(),
            )));
        }

        let base = args
            .api_url
            .clone()
            .or_else(|| cfg.api_base_url.clone())
            .ok_or_else(|| {
                anyhow!(
                    "No movement source. Pass --movements-file <path>, --api-url <url>, or run: ledgertrail config set --api-url <url>"
                )
            })?;
        let token = args.token.clone().or_else(|| cfg.api_token.clone());
        let http = HttpSource::new(&base, token, cfg.request_timeout())
            .with_context(|| format!("Invalid API URL {base}"))?;
        Ok(Sources::Http(http))
    }

    fn movements(&self) -> &dyn MovementSource {
        match self {
            Sources::File(s) => s,
            Sources::Http(s) => s,
        }
    }

    fn openings(&self) -> &(dyn OpeningBalanceSource + Sync) {
        match self {
            Sources::File(s) => s,
            Sources::Http(s) => s,
        }
    }

    fn spinner(&self, msg: &'static str) -> Option<ProgressBar> {
        if !matches!(self, Sources::Http(_)) {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        pb.set_message(msg);
        Some(pb)
    }

    fn load(&self) -> Result<StatementReport> {
        let pb = self.spinner("Loading bank statements...");
        let loaded = StatementReport::load(self.movements());
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        Ok(loaded?)
    }

    fn refresh_openings(&self, report: &mut StatementReport) {
        let pb = self.spinner("Fetching opening balances...");
        let requested = report.refresh_openings(self.openings());
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        tracing::debug!(requested, "opening balance fetches merged");
    }
}

fn handle_statement(cfg: &AppConfig, args: StatementArgs) -> Result<()> {
    let sources = Sources::resolve(cfg, &args.source)?;
    let mut report = sources.load()?;

    let account = if args.all {
        None
    } else {
        args.account.as_deref().or(cfg.default_account.as_deref())
    };
    let missing = report.set_filter(AccountFilter::from_option(account));
    tracing::debug!(missing = missing.len(), "accounts without opening balance");
    sources.refresh_openings(&mut report);

    let view = report.view();
    match args.format {
        OutputFormat::Table => print!("{}", render::statement_table(&report, &view)),
        OutputFormat::Tsv => print!("{}", render::statement_tsv(&report, &view)),
    }
    Ok(())
}

fn handle_config(cmd: ConfigCmd, cfg: &mut AppConfig, cfg_path: &std::path::Path) -> Result<()> {
    match cmd {
        ConfigCmd::Show => {
            println!("config\t{}", cfg_path.display());
            println!(
                "api_base_url\t{}",
                cfg.api_base_url.as_deref().unwrap_or("<not set>")
            );
            println!(
                "api_token\t{}",
                if cfg.api_token.is_some() { "<set>" } else { "<not set>" }
            );
            println!("request_timeout_secs\t{}", cfg.request_timeout_secs);
            println!(
                "default_account\t{}",
                cfg.default_account.as_deref().unwrap_or("<all>")
            );
        }
        ConfigCmd::Set {
            api_url,
            token,
            clear_token,
            timeout_secs,
            default_account,
            clear_default_account,
        } => {
            if let Some(url) = api_url {
                HttpSource::new(&url, None, cfg.request_timeout())
                    .with_context(|| format!("Invalid API URL {url}"))?;
                cfg.api_base_url = Some(url);
            }
            if clear_token {
                cfg.api_token = None;
            } else if let Some(token) = token {
                cfg.api_token = Some(token);
            }
            if let Some(secs) = timeout_secs {
                if secs == 0 {
                    return Err(anyhow!("--timeout-secs must be > 0"));
                }
                cfg.request_timeout_secs = secs;
            }
            if clear_default_account {
                cfg.default_account = None;
            } else if let Some(code) = default_account {
                cfg.default_account = Some(code);
            }
            write_config(cfg_path, cfg)?;
            println!("Updated {}", cfg_path.display());
        }
    }
    Ok(())
}
