use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ledgertrail")]
#[command(about = "Bank statement running balances", long_about = None)]
pub struct Cli {
    /// Override the ledgertrail home directory (a config subdir is created inside it).
    #[arg(long, env = "LEDGERTRAIL_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Log more detail to stderr (repeat for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the running-balance statement.
    Statement(StatementArgs),
    /// List the accounts present in the movements.
    Accounts(SourceArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Read movements from a JSON file instead of the API.
    #[arg(long)]
    pub movements_file: Option<PathBuf>,

    /// JSON object of opening balances keyed by account code (with --movements-file).
    #[arg(long, requires = "movements_file")]
    pub openings_file: Option<PathBuf>,

    /// API base URL; overrides the configured one.
    #[arg(long)]
    pub api_url: Option<String>,

    #[arg(long, env = "LEDGERTRAIL_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatementArgs {
    /// Restrict to one account code.
    #[arg(long)]
    pub account: Option<String>,

    /// Ignore the configured default account and show every account.
    #[arg(long, conflicts_with = "account")]
    pub all: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Tsv,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    Show,
    Set {
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        clear_token: bool,
        #[arg(long)]
        timeout_secs: Option<u64>,
        #[arg(long)]
        default_account: Option<String>,
        #[arg(long)]
        clear_default_account: bool,
    },
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}
