use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/cofre.toml";

/// What to do with the active account when a reloaded account list no
/// longer contains it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StaleSelection {
    /// Keep the selection and the last statement rendered for it.
    #[default]
    Keep,
    /// Drop the selection and blank the statement.
    Clear,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub session_path: String,
    pub timezone: String,
    pub notice_ttl_ms: u64,
    pub stale_selection: StaleSelection,
    pub log_file: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            session_path: "config/cofre_session.json".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
            notice_ttl_ms: 2500,
            stale_selection: StaleSelection::Keep,
            log_file: "config/cofre.log".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|err| AppError::InvalidConfig(format!("timezone {}: {err}", self.timezone)))
    }
}

#[derive(Debug, Default, Parser)]
#[command(name = "cofre_tui", disable_version_flag = true)]
pub struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    pub config: Option<String>,
    /// Override the API base URL (e.g. http://127.0.0.1:8000/api/).
    #[arg(long)]
    pub base_url: Option<String>,
    /// Override the file holding the session token.
    #[arg(long)]
    pub session_path: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    pub timezone: Option<String>,
    /// Policy for a selected account that disappears after a reload.
    #[arg(long, value_enum)]
    pub stale_selection: Option<StaleSelection>,
    /// Override the log file path.
    #[arg(long)]
    pub log_file: Option<String>,
    /// Override the log level (tracing filter directive).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    load_from(Args::parse())
}

pub fn load_from(args: Args) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("COFRE_TUI"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(session_path) = args.session_path {
        settings.session_path = session_path;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(stale_selection) = args.stale_selection {
        settings.stale_selection = stale_selection;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = log_file;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }

    // Url::join drops the last path segment unless it ends with '/'.
    if !settings.base_url.ends_with('/') {
        settings.base_url.push('/');
    }
    settings.tz()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            config: Some("config/does-not-exist".to_string()),
            ..Args::default()
        }
    }

    #[test]
    fn defaults_apply_without_file() {
        let settings = load_from(args()).unwrap();
        assert_eq!(settings.notice_ttl(), Duration::from_millis(2500));
        assert_eq!(settings.stale_selection, StaleSelection::Keep);
        assert!(settings.base_url.ends_with("/api/"));
    }

    #[test]
    fn cli_overrides_and_base_url_gets_trailing_slash() {
        let settings = load_from(Args {
            base_url: Some("http://ledger.local/api".to_string()),
            stale_selection: Some(StaleSelection::Clear),
            ..args()
        })
        .unwrap();
        assert_eq!(settings.base_url, "http://ledger.local/api/");
        assert_eq!(settings.stale_selection, StaleSelection::Clear);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = load_from(Args {
            timezone: Some("Mars/Olympus".to_string()),
            ..args()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }
}
