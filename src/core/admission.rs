use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Process-wide cap on concurrently running batches.
///
/// A gate, not a queue: over-cap callers are refused immediately.
#[derive(Debug)]
pub struct AdmissionController {
    in_flight: AtomicUsize,
    capacity: usize,
}

impl AdmissionController {
    pub fn new(capacity: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Admits the caller if fewer than `capacity` batches are in flight.
    ///
    /// Comparison and increment are one atomic step.
    pub fn try_admit(&self) -> bool {
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .is_ok()
    }

    /// Returns one admission. Must be paired with a successful `try_admit`.
    pub fn release(&self) {
        let released = self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if released.is_err() {
            tracing::error!("admission released with nothing in flight");
        }
    }

    /// Admission tied to a guard that releases on drop, unwinding included.
    pub fn admit(self: &Arc<Self>) -> Option<AdmissionGuard> {
        self.try_admit().then(|| AdmissionGuard {
            controller: Arc::clone(self),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[must_use = "capacity is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct AdmissionGuard {
    controller: Arc<AdmissionController>,
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.controller.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn test_strict_cap() {
        let gate = AdmissionController::new(2);
        assert!(gate.try_admit());
        assert!(gate.try_admit());
        assert!(!gate.try_admit());
        assert_eq!(gate.in_flight(), 2);

        gate.release();
        assert!(gate.try_admit());
        assert_eq!(gate.in_flight(), 2);
    }

    #[test]
    fn test_zero_capacity_admits_nothing() {
        let gate = AdmissionController::new(0);
        assert!(!gate.try_admit());
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_release_never_underflows() {
        let gate = AdmissionController::new(1);
        gate.release();
        assert_eq!(gate.in_flight(), 0);
        assert!(gate.try_admit());
    }

    #[test]
    fn test_guard_releases_on_drop_and_panic() {
        let gate = Arc::new(AdmissionController::new(1));
        {
            let _guard = gate.admit().unwrap();
            assert!(gate.admit().is_none());
        }
        assert_eq!(gate.in_flight(), 0);

        let shared = gate.clone();
        let outcome = std::thread::spawn(move || {
            let _guard = shared.admit().unwrap();
            panic!("batch blew up");
        })
        .join();
        assert!(outcome.is_err());
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_concurrent_admissions_respect_cap() {
        let gate = Arc::new(AdmissionController::new(100));
        let barrier = Arc::new(Barrier::new(101));

        let handles: Vec<_> = (0..101)
            .map(|_| {
                let gate = gate.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    gate.try_admit()
                })
            })
            .collect();
        let admitted: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(admitted.iter().filter(|ok| !**ok).count(), 1);
        assert_eq!(gate.in_flight(), 100);
    }
}
