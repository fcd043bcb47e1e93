//! Environment-driven configuration.

use std::path::PathBuf;

use stockdash_observability::LogFormat;

pub const DEFAULT_PREFS_PATH: &str = "stockdash-prefs.json";
pub const DEFAULT_USER: &str = "demo@stockdash.local";
pub const DEFAULT_PASSWORD: &str = "demo";

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `STOCKDASH_PREFS_PATH`: file backing the display preference slot.
    pub prefs_path: PathBuf,
    /// `STOCKDASH_SEED`: start with the sample catalogue.
    pub seed_sample_items: bool,
    /// `STOCKDASH_PREFERS_DARK`: initial system signal for headless runs.
    pub prefers_dark: bool,
    /// `STOCKDASH_LOG_FORMAT`: `json` (default) or `pretty`.
    pub log_format: LogFormat,
    /// `STOCKDASH_USER` / `STOCKDASH_PASSWORD`: credentials for the headless login.
    pub user: String,
    pub password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prefs_path: PathBuf::from(DEFAULT_PREFS_PATH),
            seed_sample_items: true,
            prefers_dark: false,
            log_format: LogFormat::Json,
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparseable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| lookup(key).and_then(|v| parse_flag(&v)).unwrap_or(default);

        Self {
            prefs_path: lookup("STOCKDASH_PREFS_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.prefs_path),
            seed_sample_items: flag("STOCKDASH_SEED", defaults.seed_sample_items),
            prefers_dark: flag("STOCKDASH_PREFERS_DARK", defaults.prefers_dark),
            log_format: lookup("STOCKDASH_LOG_FORMAT")
                .map(|v| LogFormat::parse_lenient(&v))
                .unwrap_or(defaults.log_format),
            user: lookup("STOCKDASH_USER").unwrap_or(defaults.user),
            password: lookup("STOCKDASH_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
