use std::time::Duration;
use thiserror::Error;

/// Failure of a single fetch, or of the batch that owned it.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("couldn't fetch {url:?}: couldn't build request: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("couldn't fetch {url:?}: request failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("couldn't fetch {url:?}: timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("couldn't fetch {url:?}: couldn't read body: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("batch cancelled before completion")]
    Cancelled,

    #[error("fetch worker aborted: {0}")]
    WorkerAborted(String),
}

impl FetchError {
    /// URL the failure belongs to, when it belongs to one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Request { url, .. }
            | Self::Network { url, .. }
            | Self::Timeout { url, .. }
            | Self::Body { url, .. } => Some(url),
            Self::Cancelled | Self::WorkerAborted(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("{message}")]
    InvalidWork { message: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("too many concurrent requests (capacity {cap})")]
    CapacityExceeded { cap: usize },

    #[error("Invalid value for {field} ({value:?}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigParse { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {message}")]
    Server { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    Upstream,
    Capacity,
    Configuration,
    System,
}

impl LinkError {
    pub fn invalid_work(message: impl Into<String>) -> Self {
        Self::InvalidWork {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidWork { .. } => ErrorCategory::Client,
            Self::Fetch(_) => ErrorCategory::Upstream,
            Self::CapacityExceeded { .. } => ErrorCategory::Capacity,
            Self::InvalidConfigValue { .. } | Self::ConfigParse { .. } => {
                ErrorCategory::Configuration
            }
            Self::Io(_) | Self::Server { .. } => ErrorCategory::System,
        }
    }

    /// HTTP status the transport layer reports for this error.
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Client => 400,
            ErrorCategory::Capacity => 429,
            ErrorCategory::Upstream | ErrorCategory::Configuration | ErrorCategory::System => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_url() {
        let err = FetchError::Timeout {
            url: "http://slow.test/".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(err.is_timeout());
        assert_eq!(err.url(), Some("http://slow.test/"));
        assert_eq!(
            err.to_string(),
            "couldn't fetch \"http://slow.test/\": timed out after 1s"
        );
    }

    #[test]
    fn test_status_codes_follow_category() {
        assert_eq!(LinkError::invalid_work("bad").status_code(), 400);
        assert_eq!(LinkError::CapacityExceeded { cap: 1 }.status_code(), 429);
        assert_eq!(LinkError::from(FetchError::Cancelled).status_code(), 500);
        assert_eq!(
            LinkError::ConfigParse {
                message: "x".into()
            }
            .category(),
            ErrorCategory::Configuration
        );
    }
}
