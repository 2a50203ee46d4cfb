use crate::domain::ports::Fetcher;
use crate::utils::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// `Fetcher` backed by a reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let request = self
            .client
            .get(url)
            .build()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        // Error statuses still carry a body, and that body is the result.
        tracing::trace!("{} responded {}", url, response.status());

        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}

/// Runs one bounded-time fetch under the batch token.
///
/// Returns `Ok(None)` when the token is (or becomes) cancelled: no network
/// call is started on a cancelled token, and an in-flight call is dropped.
pub async fn fetch_unit(
    fetcher: &dyn Fetcher,
    url: &str,
    timeout: Duration,
    token: &CancellationToken,
) -> Result<Option<String>, FetchError> {
    if token.is_cancelled() {
        return Ok(None);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Ok(None),
        res = tokio::time::timeout(timeout, fetcher.get(url)) => match res {
            Ok(body) => body.map(Some),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        },
    }
}
