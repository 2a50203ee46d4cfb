use crate::utils::error::FetchError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Collects worker failures for one batch; the first one wins.
///
/// On the first report the batch token is cancelled. Later reports are
/// drained and dropped. The verdict is only available once every sender has
/// been dropped, i.e. after the driver has joined all workers.
pub struct Coordinator {
    handle: JoinHandle<Option<FetchError>>,
}

impl Coordinator {
    /// Starts the coordinator task. Each worker reports at most once, so a
    /// buffer of `workers` never blocks a reporter.
    pub fn spawn(token: CancellationToken, workers: usize) -> (mpsc::Sender<FetchError>, Self) {
        let (tx, rx) = mpsc::channel(workers.max(1));
        let handle = tokio::spawn(collect_first_failure(rx, token));
        (tx, Self { handle })
    }

    /// Waits until every report has been processed and returns the
    /// definitive failure, if any.
    pub async fn drained(self) -> Option<FetchError> {
        match self.handle.await {
            Ok(first) => first,
            Err(e) => Some(FetchError::WorkerAborted(format!("coordinator: {}", e))),
        }
    }
}

async fn collect_first_failure(
    mut reports: mpsc::Receiver<FetchError>,
    token: CancellationToken,
) -> Option<FetchError> {
    let mut first: Option<FetchError> = None;

    while let Some(err) = reports.recv().await {
        if first.is_some() {
            tracing::debug!("discarding later failure: {}", err);
            continue;
        }
        tracing::warn!("batch failed: {}", err);
        token.cancel();
        first = Some(err);
    }

    first
}
