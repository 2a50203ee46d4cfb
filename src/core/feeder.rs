use async_channel::{Receiver, Sender};
use tokio_util::sync::CancellationToken;

/// Bounded queue sized to the pool width.
pub fn work_queue(width: usize) -> (Sender<String>, Receiver<String>) {
    async_channel::bounded(width.max(1))
}

/// Publishes `urls` in order, blocking while the queue is full.
///
/// Stops at the first observed cancellation. The queue is closed on every
/// exit path. Returns how many URLs were published.
pub async fn feed(urls: Vec<String>, queue: Sender<String>, token: CancellationToken) -> usize {
    let total = urls.len();
    let mut published = 0;

    for url in urls {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("feeder cancelled after {}/{} urls", published, total);
                break;
            }
            sent = queue.send(url) => {
                if sent.is_err() {
                    // every consumer is gone
                    break;
                }
                published += 1;
            }
        }
    }

    queue.close();
    published
}
