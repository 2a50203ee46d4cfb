use crate::utils::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;

/// One HTTP GET, body read to the end as text.
///
/// Deadlines and cancellation are applied by the caller; implementations
/// only perform the request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

pub trait ConfigProvider: Send + Sync {
    fn max_count_urls(&self) -> usize;
    fn max_concurrent_requests(&self) -> usize;
    fn max_outcome_requests(&self) -> usize;
    fn outcome_timeout(&self) -> Duration;
}
