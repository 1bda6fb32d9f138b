use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the back-office API (e.g. `http://localhost:4000/api`).
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Bearer token sent with every API request.
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Account shown when `--account` is not given.
    #[serde(default)]
    pub default_account: Option<String>,
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            request_timeout_secs: default_timeout_secs(),
            default_account: None,
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
}

pub fn app_paths(override_home: Option<PathBuf>) -> Result<AppPaths> {
    if let Some(home) = override_home {
        return Ok(AppPaths {
            config_dir: home.join("config"),
        });
    }

    let proj = ProjectDirs::from("com", "ledgertrail", "ledgertrail")
        .context("Failed to resolve platform directories")?;

    Ok(AppPaths {
        config_dir: proj.config_dir().to_path_buf(),
    })
}

pub fn load_or_init_config(paths: &AppPaths) -> Result<(AppConfig, PathBuf)> {
    fs::create_dir_all(&paths.config_dir)
        .with_context(|| format!("Failed to create config dir {}", paths.config_dir.display()))?;

    let cfg_path = paths.config_dir.join("config.json");
    if !cfg_path.exists() {
        let cfg = AppConfig::default();
        write_config(&cfg_path, &cfg)?;
        tracing::debug!(path = %cfg_path.display(), "wrote default config");
        return Ok((cfg, cfg_path));
    }

    let raw = fs::read_to_string(&cfg_path)
        .with_context(|| format!("Failed to read {}", cfg_path.display()))?;
    let cfg: AppConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", cfg_path.display()))?;

    Ok((cfg, cfg_path))
}

pub fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
