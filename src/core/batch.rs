use crate::core::aggregate::ResultAggregate;
use crate::core::coordinator::Coordinator;
use crate::core::feeder::{feed, work_queue};
use crate::core::worker::{run_worker, WorkerContext, WorkerExit};
use crate::domain::model::{BatchSettings, ResultSet};
use crate::domain::ports::Fetcher;
use crate::utils::error::FetchError;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Fetches every URL with `settings.workers` concurrent workers.
///
/// All-or-nothing: the first failure cancels the rest of the batch and is
/// returned alone. Cancelling `parent` stops new fetches and yields
/// [`FetchError::Cancelled`] unless a fetch had already failed or every URL
/// had already been fetched. A panicking worker yields
/// [`FetchError::WorkerAborted`], but a recorded fetch failure wins. Every task
/// spawned here is joined before returning; dropping the returned future
/// cancels them.
pub async fn run_batch(
    fetcher: Arc<dyn Fetcher>,
    urls: Vec<String>,
    settings: BatchSettings,
    parent: &CancellationToken,
) -> Result<ResultSet, FetchError> {
    let width = settings.workers.max(1);
    let total = urls.len();
    let token = parent.child_token();
    let _cancel_on_drop = token.clone().drop_guard();

    tracing::debug!("batch start: {} urls, {} workers", total, width);

    let (queue_tx, queue_rx) = work_queue(width);
    let feeder = tokio::spawn(feed(urls, queue_tx, token.clone()));
    let (failures, coordinator) = Coordinator::spawn(token.clone(), width);
    let aggregate = Arc::new(ResultAggregate::with_capacity(total));

    let ctx = WorkerContext {
        fetcher,
        queue: queue_rx,
        token: token.clone(),
        aggregate: aggregate.clone(),
        failures,
        fetch_timeout: settings.fetch_timeout,
    };
    let mut workers = JoinSet::new();
    for id in 0..width {
        workers.spawn(run_worker(id, ctx.clone()));
    }
    // Only workers may hold the failure sender, or the coordinator never drains.
    drop(ctx);

    let mut aborted = None;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(WorkerExit::Cancelled) => tracing::trace!("worker stopped by cancellation"),
            Ok(_) => {}
            Err(e) => {
                tracing::error!("fetch worker aborted: {}", e);
                token.cancel();
                aborted.get_or_insert_with(|| e.to_string());
            }
        }
    }

    let first_failure = coordinator.drained().await;

    // Workers are gone; release the feeder if it is still waiting on a slot.
    token.cancel();
    let published = match feeder.await {
        Ok(n) => n,
        Err(e) => {
            aborted.get_or_insert_with(|| format!("feeder: {}", e));
            0
        }
    };

    if let Some(err) = first_failure {
        return Err(err);
    }
    if let Some(msg) = aborted {
        return Err(FetchError::WorkerAborted(msg));
    }
    // Idle workers may lose the race to a late cancel; only missing work counts.
    if published < total || aggregate.appended() < total {
        tracing::debug!("batch cancelled after {}/{} urls published", published, total);
        return Err(FetchError::Cancelled);
    }

    let results = match Arc::try_unwrap(aggregate) {
        Ok(aggregate) => aggregate.into_result_set(),
        Err(shared) => shared.snapshot(),
    };
    tracing::debug!("batch done: {} results", results.len());
    Ok(results)
}

/// Fetcher and settings bundled for repeated batches.
#[derive(Clone)]
pub struct BatchEngine {
    fetcher: Arc<dyn Fetcher>,
    settings: BatchSettings,
}

impl BatchEngine {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: BatchSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> BatchSettings {
        self.settings
    }

    pub async fn run(
        &self,
        urls: Vec<String>,
        parent: &CancellationToken,
    ) -> Result<ResultSet, FetchError> {
        run_batch(self.fetcher.clone(), urls, self.settings, parent).await
    }
}
