use crate::core::aggregate::ResultAggregate;
use crate::core::fetch::fetch_unit;
use crate::domain::model::FetchOutcome;
use crate::domain::ports::Fetcher;
use crate::utils::error::FetchError;
use async_channel::Receiver;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Why a worker stopped pulling work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Queue closed and empty.
    Drained,
    /// Token fired while waiting for, or while fetching, a URL.
    Cancelled,
    /// A fetch failed and was reported.
    Failed,
}

/// Everything a worker shares with its siblings.
#[derive(Clone)]
pub struct WorkerContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub queue: Receiver<String>,
    pub token: CancellationToken,
    pub aggregate: Arc<ResultAggregate>,
    pub failures: mpsc::Sender<FetchError>,
    pub fetch_timeout: Duration,
}

pub async fn run_worker(id: usize, ctx: WorkerContext) -> WorkerExit {
    let mut fetched = 0usize;

    let exit = loop {
        let url = tokio::select! {
            biased;
            _ = ctx.token.cancelled() => break WorkerExit::Cancelled,
            next = ctx.queue.recv() => match next {
                Ok(url) => url,
                Err(_) => break WorkerExit::Drained,
            },
        };

        let outcome =
            match fetch_unit(ctx.fetcher.as_ref(), &url, ctx.fetch_timeout, &ctx.token).await {
                Ok(Some(body)) => FetchOutcome::Success { url, body },
                Ok(None) => break WorkerExit::Cancelled,
                Err(cause) => FetchOutcome::Failure { url, cause },
            };

        match outcome {
            FetchOutcome::Success { url, body } => {
                fetched += 1;
                ctx.aggregate.append([(url, body)]);
            }
            FetchOutcome::Failure { url, cause } => {
                tracing::debug!("worker {} failed on {}", id, url);
                if ctx.failures.send(cause).await.is_err() {
                    tracing::error!("worker {}: failure channel closed", id);
                }
                break WorkerExit::Failed;
            }
        }
    };

    tracing::trace!("worker {} exit {:?} after {} fetches", id, exit, fetched);
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feeder::work_queue;
    use async_trait::async_trait;

    struct ScriptedFetcher;

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn get(&self, url: &str) -> Result<String, FetchError> {
            if url.contains("slow") {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(url.to_uppercase())
        }
    }

    fn context(
        capacity: usize,
    ) -> (
        async_channel::Sender<String>,
        mpsc::Receiver<FetchError>,
        WorkerContext,
    ) {
        let (queue_tx, queue_rx) = work_queue(capacity);
        let (fail_tx, fail_rx) = mpsc::channel(1);
        let ctx = WorkerContext {
            fetcher: Arc::new(ScriptedFetcher),
            queue: queue_rx,
            token: CancellationToken::new(),
            aggregate: Arc::new(ResultAggregate::new()),
            failures: fail_tx,
            fetch_timeout: Duration::from_millis(100),
        };
        (queue_tx, fail_rx, ctx)
    }

    #[tokio::test]
    async fn test_drains_queue_into_aggregate() {
        let (queue, _failures, ctx) = context(4);
        for url in ["a", "b", "c"] {
            queue.send(url.to_string()).await.unwrap();
        }
        queue.close();

        let exit = run_worker(0, ctx.clone()).await;

        assert_eq!(exit, WorkerExit::Drained);
        let set = ctx.aggregate.snapshot();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get("b").map(String::as_str), Some("B"));
    }

    #[tokio::test]
    async fn test_failure_is_reported_once_and_stops_worker() {
        let (queue, mut failures, ctx) = context(4);
        for url in ["a", "slow", "c"] {
            queue.send(url.to_string()).await.unwrap();
        }
        queue.close();

        let exit = run_worker(0, ctx.clone()).await;

        assert_eq!(exit, WorkerExit::Failed);
        let err = failures.recv().await.unwrap();
        assert!(err.is_timeout());
        assert_eq!(err.url(), Some("slow"));
        // "c" stays queued: a failed worker pulls nothing else
        assert_eq!(ctx.queue.len(), 1);
        assert_eq!(ctx.aggregate.len(), 1);
    }

    #[tokio::test]
    async fn test_exits_on_cancel_while_idle() {
        let (_queue, _failures, ctx) = context(4);
        let token = ctx.token.clone();
        let worker = tokio::spawn(run_worker(0, ctx));

        token.cancel();

        assert_eq!(worker.await.unwrap(), WorkerExit::Cancelled);
    }

    #[tokio::test]
    async fn test_ignores_queued_work_once_cancelled() {
        let (queue, _failures, ctx) = context(4);
        queue.send("a".to_string()).await.unwrap();
        ctx.token.cancel();

        assert_eq!(run_worker(0, ctx.clone()).await, WorkerExit::Cancelled);
        assert!(ctx.aggregate.is_empty());
    }
}
