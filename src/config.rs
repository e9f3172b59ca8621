//! # config — layered configuration
//!
//! Keys are looked up in an ordered list of [`ConfigSource`]s and the first
//! source holding a non-empty value wins:
//!
//! 1. process environment (after `.env` has been loaded by `main`)
//! 2. secrets file (`SECRETS_FILE`, default `secrets.env`, dotenv syntax)
//!
//! A required key missing from every source is a fatal [`ConfigError`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ConfigError;

const DEFAULT_SECRETS_FILE: &str = "secrets.env";

// ─── Sources ──────────────────────────────────────────────────────────────────

/// One provider of configuration values.
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &str;
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads straight from the process environment.
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Key/value pairs parsed from a dotenv-style file without exporting them
/// into the process environment.
pub struct SecretsFile {
    path:   String,
    values: HashMap<String, String>,
}

impl SecretsFile {
    /// A missing file yields an empty source.
    pub fn load(path: &str) -> Self {
        let mut values = HashMap::new();

        match dotenvy::from_filename_iter(path) {
            Ok(iter) => {
                for item in iter {
                    match item {
                        Ok((key, value)) => {
                            values.insert(key, value);
                        }
                        Err(e) => warn!(path, error = %e, "Skipping malformed secrets line"),
                    }
                }
                debug!(path, keys = values.len(), "Secrets file loaded");
            }
            Err(_) => debug!(path, "No secrets file — environment only"),
        }

        Self { path: path.to_string(), values }
    }
}

impl ConfigSource for SecretsFile {
    fn name(&self) -> &str {
        &self.path
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Ordered chain of sources; first non-empty value wins.
pub struct ConfigLoader {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigLoader {
    pub fn new(sources: Vec<Box<dyn ConfigSource>>) -> Self {
        Self { sources }
    }

    /// Environment first, then the secrets file named by `SECRETS_FILE`.
    pub fn standard() -> Self {
        let secrets_path = std::env::var("SECRETS_FILE")
            .unwrap_or_else(|_| DEFAULT_SECRETS_FILE.to_string());

        Self::new(vec![
            Box::new(EnvSource),
            Box::new(SecretsFile::load(&secrets_path)),
        ])
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| {
            source
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .inspect(|_| debug!(key, source = source.name(), "Config key resolved"))
        })
    }

    pub fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: format!("'{raw}': {e}"),
            }),
            None => Ok(default),
        }
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

/// Watchlist document location and credentials.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_url: String,
    pub token:   String,
    /// `owner/repo`
    pub repo:    String,
    pub path:    String,
    pub branch:  Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub api_url:      String,
    pub access_token: String,
    /// The single recipient every alert goes to.
    pub user_id:      String,
}

/// Everything the monitor needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub store:         StoreConfig,
    pub notify:        NotifyConfig,
    pub quote_api_url: String,
    /// Pause between two entries of a batch run (provider rate limits).
    pub entry_delay:   Duration,
    pub http_timeout:  Duration,
    pub bind_addr:     SocketAddr,
    /// When set, the manager API requires `X-API-Key`.
    pub api_key:       Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(&ConfigLoader::standard())
    }

    pub fn load(loader: &ConfigLoader) -> Result<Self, ConfigError> {
        let repo = loader.require("WATCHLIST_REPO")?;
        if !repo.contains('/') {
            return Err(ConfigError::Invalid {
                key:    "WATCHLIST_REPO",
                reason: format!("'{repo}' is not in owner/repo form"),
            });
        }

        let store = StoreConfig {
            api_url: loader.get_or("GITHUB_API_URL", "https://api.github.com"),
            token:   loader.require("GITHUB_TOKEN")?,
            repo,
            path:    loader.get_or("WATCHLIST_PATH", "watchlist.json"),
            branch:  loader.get("WATCHLIST_BRANCH"),
        };

        let notify = NotifyConfig {
            api_url:      loader.get_or("LINE_API_URL", "https://api.line.me"),
            access_token: loader.require("LINE_ACCESS_TOKEN")?,
            user_id:      loader.require("LINE_USER_ID")?,
        };

        let entry_delay_secs: u64 = loader.parse_or("ENTRY_DELAY_SECS", 2)?;
        let http_timeout_secs: u64 = loader.parse_or("HTTP_TIMEOUT_SECS", 10)?;
        let bind_addr: SocketAddr =
            loader.parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;

        Ok(Self {
            store,
            notify,
            quote_api_url: loader.get_or("QUOTE_API_URL", "https://query1.finance.yahoo.com"),
            entry_delay:   Duration::from_secs(entry_delay_secs),
            http_timeout:  Duration::from_secs(http_timeout_secs),
            bind_addr,
            api_key:       loader.get("API_KEY"),
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct MapSource(&'static str, HashMap<&'static str, &'static str>);

    impl ConfigSource for MapSource {
        fn name(&self) -> &str {
            self.0
        }

        fn get(&self, key: &str) -> Option<String> {
            self.1.get(key).map(|v| v.to_string())
        }
    }

    fn source(name: &'static str, pairs: &[(&'static str, &'static str)]) -> Box<dyn ConfigSource> {
        Box::new(MapSource(name, pairs.iter().copied().collect()))
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("GITHUB_TOKEN", "ghp_test"),
            ("WATCHLIST_REPO", "someone/stock-monitor"),
            ("LINE_ACCESS_TOKEN", "line-token"),
            ("LINE_USER_ID", "U123"),
        ]
    }

    #[test]
    fn first_source_with_value_wins() {
        let loader = ConfigLoader::new(vec![
            source("primary", &[("LINE_USER_ID", "from-primary")]),
            source("fallback", &[("LINE_USER_ID", "from-fallback"), ("API_KEY", "k")]),
        ]);

        assert_eq!(loader.get("LINE_USER_ID").as_deref(), Some("from-primary"));
        assert_eq!(loader.get("API_KEY").as_deref(), Some("k"));
        assert_eq!(loader.get("NOPE"), None);
    }

    #[test]
    fn blank_value_falls_through_to_next_source() {
        let loader = ConfigLoader::new(vec![
            source("primary", &[("GITHUB_TOKEN", "   ")]),
            source("fallback", &[("GITHUB_TOKEN", "ghp_real")]),
        ]);
        assert_eq!(loader.get("GITHUB_TOKEN").as_deref(), Some("ghp_real"));
    }

    #[test]
    fn defaults_apply_when_optional_keys_absent() {
        let loader = ConfigLoader::new(vec![source("only", &required())]);
        let config = Config::load(&loader).unwrap();

        assert_eq!(config.store.path, "watchlist.json");
        assert_eq!(config.store.api_url, "https://api.github.com");
        assert_eq!(config.store.branch, None);
        assert_eq!(config.entry_delay, Duration::from_secs(2));
        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn missing_required_key_is_fatal() {
        let mut pairs = required();
        pairs.retain(|(k, _)| *k != "LINE_ACCESS_TOKEN");
        let loader = ConfigLoader::new(vec![source("only", &pairs)]);

        let err = Config::load(&loader).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("LINE_ACCESS_TOKEN")));
    }

    #[test]
    fn unparseable_delay_is_rejected() {
        let mut pairs = required();
        pairs.push(("ENTRY_DELAY_SECS", "soon"));
        let loader = ConfigLoader::new(vec![source("only", &pairs)]);

        let err = Config::load(&loader).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ENTRY_DELAY_SECS", .. }));
    }

    #[test]
    fn repo_must_be_owner_slash_name() {
        let mut pairs = required();
        pairs.retain(|(k, _)| *k != "WATCHLIST_REPO");
        pairs.push(("WATCHLIST_REPO", "stock-monitor"));
        let loader = ConfigLoader::new(vec![source("only", &pairs)]);

        assert!(matches!(
            Config::load(&loader).unwrap_err(),
            ConfigError::Invalid { key: "WATCHLIST_REPO", .. }
        ));
    }

    #[test]
    fn missing_secrets_file_is_an_empty_source() {
        let secrets = SecretsFile::load("/definitely/not/here/secrets.env");
        assert_eq!(secrets.get("GITHUB_TOKEN"), None);
    }
}
