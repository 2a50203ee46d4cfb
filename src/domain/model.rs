use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::FetchError;

/// URL to fetched body, built only from successful outcomes.
pub type ResultSet = HashMap<String, String>;

/// Ordered URLs submitted together; resolved all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchRequest {
    pub urls: Vec<String>,
}

impl BatchRequest {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl From<Vec<String>> for BatchRequest {
    fn from(urls: Vec<String>) -> Self {
        Self::new(urls)
    }
}

/// Result of one dequeued URL.
#[derive(Debug)]
pub enum FetchOutcome {
    Success { url: String, body: String },
    Failure { url: String, cause: FetchError },
}

impl FetchOutcome {
    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }
}

/// Per-batch knobs: pool width and per-fetch deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub workers: usize,
    pub fetch_timeout: Duration,
}

impl BatchSettings {
    pub fn new(workers: usize, fetch_timeout: Duration) -> Self {
        Self {
            workers,
            fetch_timeout,
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self::new(config.max_outcome_requests(), config.outcome_timeout())
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(1))
    }
}
