//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_CHANGE_POLL_INTERVAL_MS, DEFAULT_EXPIRED_SWEEP_INTERVAL_SECS, DEFAULT_MAX_PASTE_SIZE,
    DEFAULT_PORT,
};
use crate::db::StorageBackend;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the pastebin service.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: String,
    pub backend: StorageBackend,
    pub port: u16,
    pub max_paste_size: usize,
    /// Base used to render short links, e.g. `http://localhost:8080`.
    pub public_base_url: String,
    pub expired_sweep_interval: Duration,
    pub change_poll_interval: Duration,
    /// Interval of the demo object generator; `None` keeps it disabled.
    pub demo_feed_interval: Option<Duration>,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}='{}'", key, raw);
            None
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unset or unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parsed(&lookup, "PORT").unwrap_or(DEFAULT_PORT);
        let data_dir = lookup("DATA_DIR").map(expand_tilde).unwrap_or_else(|| {
            let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
            home.join(".cache")
                .join("pastebin")
                .to_string_lossy()
                .to_string()
        });
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Self {
            data_dir,
            backend: parsed(&lookup, "STORAGE_BACKEND").unwrap_or_default(),
            port,
            max_paste_size: parsed(&lookup, "MAX_PASTE_SIZE").unwrap_or(DEFAULT_MAX_PASTE_SIZE),
            public_base_url,
            expired_sweep_interval: Duration::from_secs(
                parsed(&lookup, "EXPIRED_SWEEP_INTERVAL_SECS")
                    .filter(|secs: &u64| *secs > 0)
                    .unwrap_or(DEFAULT_EXPIRED_SWEEP_INTERVAL_SECS),
            ),
            change_poll_interval: Duration::from_millis(
                parsed(&lookup, "CHANGE_POLL_INTERVAL_MS")
                    .filter(|ms: &u64| *ms > 0)
                    .unwrap_or(DEFAULT_CHANGE_POLL_INTERVAL_MS),
            ),
            demo_feed_interval: parsed(&lookup, "DEMO_FEED_INTERVAL_SECS")
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// Render the public short link for `code`.
    pub fn short_link(&self, code: &str) -> String {
        format!("{}/s/{}", self.public_base_url, code)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_env_flag, Config};
    use crate::db::StorageBackend;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn parse_env_flag_accepts_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_accepts_falsy_values() {
        for value in ["", "0", "false", "FALSE", " no ", "off"] {
            assert_eq!(parse_env_flag(value), Some(false), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_rejects_unknown_values() {
        assert_eq!(parse_env_flag("maybe"), None);
        assert_eq!(parse_env_flag("enabled"), None);
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend, StorageBackend::Json);
        assert_eq!(config.public_base_url, "http://localhost:8080");
        assert_eq!(config.expired_sweep_interval, Duration::from_secs(3600));
        assert!(config.demo_feed_interval.is_none());
    }

    #[test]
    fn overrides_are_parsed_and_bad_values_ignored() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("STORAGE_BACKEND", "redb"),
            ("PUBLIC_BASE_URL", "https://paste.example/"),
            ("CHANGE_POLL_INTERVAL_MS", "250"),
            ("MAX_PASTE_SIZE", "lots"),
            ("DATA_DIR", "/srv/pastebin"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.backend, StorageBackend::Redb);
        assert_eq!(config.data_dir, "/srv/pastebin");
        assert_eq!(config.change_poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_paste_size, 10 * 1024 * 1024);
        assert_eq!(config.short_link("abc123"), "https://paste.example/s/abc123");
    }
}
