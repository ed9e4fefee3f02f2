//! Configuration management for the CLI.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use termsync_engine::{FetchFailurePolicy, ReconcileOptions};

/// Application name announced to the accounting system.
pub const DEFAULT_APP_NAME: &str = "TermSync";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_LOG_DIR: &str = "logs";

/// Configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the accounting gateway
    pub remote_url: Option<String>,
    /// Application name used when opening sessions
    pub app_name: String,
    /// Behaviour when the remote snapshot cannot be read
    pub on_fetch_failure: FetchFailurePolicy,
    /// Report unconfirmed additions as failures
    pub demote_unresolved: bool,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Directory of the rolling log files
    pub log_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let remote_url = lookup("TERMSYNC_REMOTE_URL").filter(|url| !url.trim().is_empty());

        let app_name = lookup("TERMSYNC_APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        let on_fetch_failure = match lookup("TERMSYNC_ON_FETCH_FAILURE").as_deref() {
            None | Some("proceed") => FetchFailurePolicy::ProceedEmpty,
            Some("abort") => FetchFailurePolicy::Abort,
            Some(other) => return Err(ConfigError::InvalidFetchPolicy(other.to_string())),
        };

        let demote_unresolved = match lookup("TERMSYNC_DEMOTE_UNRESOLVED") {
            None => false,
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidBool("TERMSYNC_DEMOTE_UNRESOLVED", raw))?,
        };

        let timeout = lookup("TERMSYNC_TIMEOUT_SECS")
            .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidTimeout)?;

        let log_dir = lookup("TERMSYNC_LOG_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())
            .into();

        Ok(Self {
            remote_url,
            app_name,
            on_fetch_failure,
            demote_unresolved,
            timeout,
            log_dir,
        })
    }

    /// The remote URL, required unless running against the in-memory remote.
    pub fn require_remote_url(&self) -> Result<&str, ConfigError> {
        self.remote_url
            .as_deref()
            .ok_or(ConfigError::MissingRemoteUrl)
    }

    /// Reconciliation options derived from this configuration.
    pub fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            on_fetch_failure: self.on_fetch_failure,
            demote_unresolved: self.demote_unresolved,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TERMSYNC_REMOTE_URL environment variable is required")]
    MissingRemoteUrl,

    #[error("Invalid TERMSYNC_ON_FETCH_FAILURE value '{0}' (expected 'proceed' or 'abort')")]
    InvalidFetchPolicy(String),

    #[error("Invalid {0} value '{1}' (expected 'true' or 'false')")]
    InvalidBool(&'static str, String),

    #[error("Invalid TERMSYNC_TIMEOUT_SECS value")]
    InvalidTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.remote_url, None);
        assert_eq!(config.app_name, "TermSync");
        assert_eq!(config.on_fetch_failure, FetchFailurePolicy::ProceedEmpty);
        assert!(!config.demote_unresolved);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert!(matches!(
            config.require_remote_url(),
            Err(ConfigError::MissingRemoteUrl)
        ));
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("TERMSYNC_REMOTE_URL", "http://localhost:8080"),
            ("TERMSYNC_APP_NAME", "QB_Terms_Integration"),
            ("TERMSYNC_ON_FETCH_FAILURE", "abort"),
            ("TERMSYNC_DEMOTE_UNRESOLVED", "true"),
            ("TERMSYNC_TIMEOUT_SECS", "5"),
            ("TERMSYNC_LOG_DIR", "/var/log/termsync"),
        ])
        .unwrap();

        assert_eq!(config.require_remote_url().unwrap(), "http://localhost:8080");
        assert_eq!(config.app_name, "QB_Terms_Integration");
        assert_eq!(
            config.options(),
            ReconcileOptions {
                on_fetch_failure: FetchFailurePolicy::Abort,
                demote_unresolved: true,
            }
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/termsync"));
    }

    #[test]
    fn blank_remote_url_is_missing() {
        let config = load(&[("TERMSYNC_REMOTE_URL", "  ")]).unwrap();
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            load(&[("TERMSYNC_ON_FETCH_FAILURE", "retry")]),
            Err(ConfigError::InvalidFetchPolicy(v)) if v == "retry"
        ));
        assert!(matches!(
            load(&[("TERMSYNC_DEMOTE_UNRESOLVED", "yes")]),
            Err(ConfigError::InvalidBool(_, _))
        ));
        assert!(matches!(
            load(&[("TERMSYNC_TIMEOUT_SECS", "-1")]),
            Err(ConfigError::InvalidTimeout)
        ));
    }
}
