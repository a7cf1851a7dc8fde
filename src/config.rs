// src/config.rs

use std::{net::IpAddr, path::PathBuf, time::Duration};
use tracing::warn;

use crate::query::FilterMode;

pub const DEFAULT_DATA_PATH: &str = "data/climate_finance_sample.csv";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_CHAT_API_BASE: &str = "https://api.groq.com/openai/v1";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub static_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub filter_mode: FilterMode,
    pub chat: ChatConfig,
    pub upstream_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = match get("HOST") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(host = %raw, "invalid HOST, binding 0.0.0.0");
                IpAddr::from([0, 0, 0, 0])
            }),
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(port = %raw, "invalid PORT, using {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let filter_mode = if get("STRICT_FILTERS").map_or(false, |v| parse_flag(&v)) {
            FilterMode::Strict
        } else {
            FilterMode::Permissive
        };

        let timeout_secs = get("UPSTREAM_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);

        Self {
            data_path: get("CLIMATE_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            host,
            port,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            filter_mode,
            chat: ChatConfig {
                api_key: get("GROQ_API_KEY"),
                model: get("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                api_base: get("CHAT_API_BASE")
                    .unwrap_or_else(|| DEFAULT_CHAT_API_BASE.to_string()),
            },
            upstream_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(cfg.static_dir, PathBuf::from(DEFAULT_STATIC_DIR));
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.filter_mode, FilterMode::Permissive);
        assert_eq!(cfg.chat.api_key, None);
        assert_eq!(cfg.chat.model, DEFAULT_CHAT_MODEL);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config_from(&[
            ("CLIMATE_DATA_PATH", "/srv/data.csv"),
            ("PORT", "8081"),
            ("STRICT_FILTERS", "Yes"),
            ("GROQ_API_KEY", "secret"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
        ]);
        assert_eq!(cfg.data_path, PathBuf::from("/srv/data.csv"));
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.filter_mode, FilterMode::Strict);
        assert_eq!(cfg.chat.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = config_from(&[
            ("PORT", "not-a-port"),
            ("HOST", "nowhere"),
            ("GROQ_API_KEY", "   "),
            ("UPSTREAM_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.host, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(cfg.chat.api_key, None);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(30));
    }
}
