use crate::domain::model::ResultSet;
use std::sync::{Mutex, MutexGuard};

/// Accumulates successful `(url, body)` pairs from concurrent workers.
///
/// Appends are serialized by a lock. Reads are meant to happen once every
/// writer has been joined; `into_result_set` enforces that by taking the
/// aggregate by value, and `snapshot` still locks so an early read is
/// merely incomplete, never racy.
#[derive(Debug, Default)]
pub struct ResultAggregate {
    inner: Mutex<Collected>,
}

#[derive(Debug, Default)]
struct Collected {
    results: ResultSet,
    /// Outcomes appended, duplicates of one URL included.
    appended: usize,
}

impl ResultAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Collected {
                results: ResultSet::with_capacity(capacity),
                appended: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Collected> {
        // A panicking writer cannot leave a half-inserted entry behind.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append<I>(&self, outcomes: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut collected = self.lock();
        for (url, body) in outcomes {
            collected.results.insert(url, body);
            collected.appended += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful fetches recorded, counting repeated URLs.
    pub fn appended(&self) -> usize {
        self.lock().appended
    }

    pub fn snapshot(&self) -> ResultSet {
        self.lock().results.clone()
    }

    pub fn into_result_set(self) -> ResultSet {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_append_many_and_read() {
        let agg = ResultAggregate::new();
        agg.append(vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]);
        agg.append(std::iter::empty());

        agg.append([("a".to_string(), "again".to_string())]);

        assert_eq!(agg.len(), 2);
        assert_eq!(agg.appended(), 3);
        let set = agg.into_result_set();
        assert_eq!(set.get("a").map(String::as_str), Some("again"));
        assert_eq!(set.get("b").map(String::as_str), Some("2"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        let agg = Arc::new(ResultAggregate::new());
        let mut handles = Vec::new();
        for w in 0..8 {
            let agg = agg.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    agg.append([(format!("{}-{}", w, i), String::new())]);
                    tokio::task::yield_now().await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(agg.snapshot().len(), 400);
        let agg = Arc::try_unwrap(agg).unwrap();
        assert_eq!(agg.into_result_set().len(), 400);
    }
}
