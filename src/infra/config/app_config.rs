// Process configuration.
//
// Settings come from `config.json` (or `config.development.json` when
// BANDIT_ENV=development), with DISCORD_TOKEN and DATABASE_URL from the
// environment taking precedence. `main` loads `.env` before calling `load()`.

use crate::core::moderation::RetryPolicy;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;

/// Raw shape of the JSON config file. Every key is optional so the
/// environment can fill the gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    token: Option<String>,
    database_url: Option<String>,
    store_timeout_secs: Option<u64>,
    connect_attempts: Option<u32>,
    connect_retry_delay_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token: String,
    pub database_url: String,
    /// Applies to pool acquisition and to blocked store operations
    pub store_timeout: Duration,
    pub connect_retry: RetryPolicy,
}

impl AppConfig {
    /// Load from the first config file found plus the process environment.
    pub fn load() -> Result<Self> {
        let env_name = std::env::var("BANDIT_ENV").ok();
        let file_name = config_file_name(env_name.as_deref());

        let mut search_dirs = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            search_dirs.push(cwd);
        }
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            search_dirs.push(exe_dir);
        }

        let path = find_config_file(file_name, &search_dirs);
        match &path {
            Some(p) => tracing::info!("Loading configuration from {}", p.display()),
            None => tracing::warn!("No {} found, using environment only", file_name),
        }

        Self::resolve(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Merge an optional config file with environment overrides.
    fn resolve(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = match path {
            Some(path) => read_config_file(path)?,
            None => FileConfig::default(),
        };

        let token = env("DISCORD_TOKEN")
            .or(file.token)
            .filter(|t| !t.trim().is_empty());
        let database_url = env("DATABASE_URL")
            .or(file.database_url)
            .filter(|u| !u.trim().is_empty());

        let Some(token) = token else {
            bail!("Missing Discord token: set `token` in the config file or DISCORD_TOKEN");
        };
        let Some(database_url) = database_url else {
            bail!("Missing database URL: set `databaseUrl` in the config file or DATABASE_URL");
        };

        let defaults = RetryPolicy::default();
        let connect_retry = RetryPolicy::new(
            file.connect_attempts.unwrap_or(defaults.max_attempts),
            file.connect_retry_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.delay),
        );

        Ok(Self {
            token,
            database_url,
            store_timeout: Duration::from_secs(
                file.store_timeout_secs.unwrap_or(DEFAULT_STORE_TIMEOUT_SECS),
            ),
            connect_retry,
        })
    }
}

fn config_file_name(env_name: Option<&str>) -> &'static str {
    match env_name {
        Some("development") => "config.development.json",
        _ => "config.json",
    }
}

fn find_config_file(file_name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    // Editors on Windows like to prepend a BOM
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw.as_str());

    serde_json::from_str(raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}
