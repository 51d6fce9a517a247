//! Realtime Configuration
//!
//! Every field has a default so a local, in-process setup needs no
//! configuration at all. The websocket transport additionally needs an
//! endpoint and a project id, checked by [`RealtimeConfig::validate_remote`].

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::Severity;
use crate::realtime::{RealtimeError, RealtimeResult};

/// Environment variable names read by [`RealtimeConfig::from_env`]
pub const ENV_ENDPOINT: &str = "APPWRITE_ENDPOINT";
pub const ENV_PROJECT_ID: &str = "APPWRITE_PROJECT_ID";
pub const ENV_DATABASE_ID: &str = "APPWRITE_DATABASE_ID";
pub const ENV_SESSION: &str = "APPWRITE_SESSION";
pub const ENV_HEARTBEAT_SECS: &str = "REALTIME_HEARTBEAT_SECS";
pub const ENV_LOG_LEVEL: &str = "REALTIME_LOG_LEVEL";

/// Realtime client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// REST endpoint, e.g. "https://cloud.appwrite.io/v1"
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Project the realtime socket is opened for
    #[serde(default)]
    pub project_id: Option<String>,

    /// Database used when a subscription names none (default: "main")
    #[serde(default = "default_database_id")]
    pub database_id: String,

    /// Session secret sent after the socket connects
    #[serde(default)]
    pub session: Option<String>,

    /// Client heartbeat interval in seconds (default: 20)
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_id() -> String {
    "main".to_string()
}

fn default_heartbeat_interval_secs() -> u64 {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            project_id: None,
            database_id: default_database_id(),
            session: None,
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            log_level: default_log_level(),
        }
    }
}

impl RealtimeConfig {
    /// Config pointing at a remote backend
    pub fn remote(endpoint: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            project_id: Some(project_id.into()),
            ..Default::default()
        }
    }

    /// Override the default database
    pub fn with_database(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    /// Load from a JSON file
    pub fn from_file(path: &Path) -> RealtimeResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RealtimeError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            RealtimeError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.severity()?;
        Ok(config)
    }

    /// Load from the process environment
    pub fn from_env() -> RealtimeResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> RealtimeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.endpoint = get(ENV_ENDPOINT);
        config.project_id = get(ENV_PROJECT_ID);
        config.session = get(ENV_SESSION);

        if let Some(database_id) = get(ENV_DATABASE_ID) {
            config.database_id = database_id;
        }

        if let Some(secs) = get(ENV_HEARTBEAT_SECS) {
            config.heartbeat_interval_secs = secs.trim().parse().map_err(|_| {
                RealtimeError::ConfigError(format!("{} must be a number, got '{}'", ENV_HEARTBEAT_SECS, secs))
            })?;
        }

        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level;
        }

        config.severity()?;
        Ok(config)
    }

    /// Parsed minimum log severity
    pub fn severity(&self) -> RealtimeResult<Severity> {
        self.log_level.parse().map_err(RealtimeError::ConfigError)
    }

    /// Check the settings the websocket transport needs
    pub fn validate_remote(&self) -> RealtimeResult<()> {
        if self.endpoint.as_deref().map_or(true, str::is_empty) {
            return Err(RealtimeError::ConfigError("Endpoint is not defined".into()));
        }
        if self.project_id.as_deref().map_or(true, str::is_empty) {
            return Err(RealtimeError::ConfigError("Project ID is not defined".into()));
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(RealtimeError::ConfigError(
                "heartbeat_interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RealtimeConfig::default();
        assert_eq!(config.database_id, "main");
        assert_eq!(config.heartbeat_interval_secs, 20);
        assert_eq!(config.severity().unwrap(), Severity::Info);
        assert!(config.validate_remote().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = RealtimeConfig::from_lookup(lookup(&[
            (ENV_ENDPOINT, "https://cloud.example.com/v1"),
            (ENV_PROJECT_ID, "portal"),
            (ENV_DATABASE_ID, "content"),
            (ENV_HEARTBEAT_SECS, "5"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint.as_deref(), Some("https://cloud.example.com/v1"));
        assert_eq!(config.database_id, "content");
        assert_eq!(config.heartbeat_interval_secs, 5);
        assert!(config.validate_remote().is_ok());
    }

    #[test]
    fn test_empty_database_falls_back_to_main() {
        let config = RealtimeConfig::from_lookup(lookup(&[(ENV_DATABASE_ID, "")])).unwrap();
        assert_eq!(config.database_id, "main");
    }

    #[test]
    fn test_bad_heartbeat_rejected() {
        let err = RealtimeConfig::from_lookup(lookup(&[(ENV_HEARTBEAT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, RealtimeError::ConfigError(_)));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let err = RealtimeConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "chatty")])).unwrap_err();
        assert!(matches!(err, RealtimeError::ConfigError(_)));
    }

    #[test]
    fn test_validate_remote_messages() {
        let err = RealtimeConfig::default().validate_remote().unwrap_err();
        assert_eq!(err, RealtimeError::ConfigError("Endpoint is not defined".into()));

        let mut config = RealtimeConfig::default();
        config.endpoint = Some("http://localhost/v1".into());
        let err = config.validate_remote().unwrap_err();
        assert_eq!(err, RealtimeError::ConfigError("Project ID is not defined".into()));
    }

    #[test]
    fn test_json_defaults() {
        let config: RealtimeConfig =
            serde_json::from_str(r#"{"endpoint": "http://localhost/v1", "project_id": "p"}"#).unwrap();
        assert_eq!(config.database_id, "main");
        assert_eq!(config.log_level, "info");
        assert!(config.session.is_none());
    }
}
