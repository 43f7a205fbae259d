//! Environment configuration for the database pool and sync transactions.

use std::time::Duration;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| PipelineError::Config("DATABASE_URL not set".into()))?;

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url,
            max_connections,
        })
    }

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

/// Limits applied to every per-document sync transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// `statement_timeout` for each statement in the transaction.
    pub statement_timeout: Duration,
    /// `lock_timeout` for acquiring the document row lock.
    pub lock_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            statement_timeout: Duration::from_millis(30_000),
            lock_timeout: Duration::from_millis(5_000),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let statement_timeout = millis_from_env("SYNC_STATEMENT_TIMEOUT_MS")?
            .unwrap_or(defaults.statement_timeout);
        let lock_timeout =
            millis_from_env("SYNC_LOCK_TIMEOUT_MS")?.unwrap_or(defaults.lock_timeout);

        Ok(Self {
            statement_timeout,
            lock_timeout,
        })
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

fn millis_from_env(name: &str) -> Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| PipelineError::Config(format!("{name} must be a number of milliseconds, got '{value}'"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.statement_timeout, Duration::from_secs(30));
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_sync_config_builder() {
        let config = SyncConfig::default()
            .with_statement_timeout(Duration::from_millis(100))
            .with_lock_timeout(Duration::from_millis(50));
        assert_eq!(config.statement_timeout, Duration::from_millis(100));
        assert_eq!(config.lock_timeout, Duration::from_millis(50));
    }

    #[test]
    fn test_pipeline_config_builder() {
        let config = PipelineConfig::new("postgres://localhost/sfs").with_max_connections(12);
        assert_eq!(config.database_url, "postgres://localhost/sfs");
        assert_eq!(config.max_connections, 12);
    }

    #[test]
    fn test_unset_millis_is_none() {
        assert!(millis_from_env("SFS_TRACKER_TEST_UNSET_TIMEOUT_MS")
            .unwrap()
            .is_none());
    }
}
