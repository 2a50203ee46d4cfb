#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(feature = "cli")]
pub use cli::CliArgs;
pub use toml_config::TomlConfig;

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub port: u16,
    /// Most URLs accepted in one request.
    pub max_count_urls: usize,
    /// Admission cap: batches running at once across the process.
    pub max_requests: usize,
    /// Worker-pool width per batch.
    pub max_outcome_requests: usize,
    /// Per-fetch deadline, seconds.
    pub max_outcome_timeout: u64,
    pub shutdown_timeout: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            max_count_urls: 20,
            max_requests: 100,
            max_outcome_requests: 4,
            max_outcome_timeout: 1,
            shutdown_timeout: 10,
        }
    }
}

impl ServiceConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl ConfigProvider for ServiceConfig {
    fn max_count_urls(&self) -> usize {
        self.max_count_urls
    }

    fn max_concurrent_requests(&self) -> usize {
        self.max_requests
    }

    fn max_outcome_requests(&self) -> usize {
        self.max_outcome_requests
    }

    fn outcome_timeout(&self) -> Duration {
        Duration::from_secs(self.max_outcome_timeout)
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_range("port", self.port, 1, u16::MAX)?;
        validate_positive_number("max_count_urls", self.max_count_urls, 1)?;
        validate_positive_number("max_requests", self.max_requests, 1)?;
        validate_positive_number("max_outcome_requests", self.max_outcome_requests, 1)?;
        validate_range("max_outcome_timeout", self.max_outcome_timeout, 1, 3600)?;
        validate_range("shutdown_timeout", self.shutdown_timeout, 1, 3600)?;
        Ok(())
    }
}
