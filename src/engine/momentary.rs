//! Momentary scheduler - delayed "return to rest" for momentary pulses
//!
//! Each address has at most one pending revert. Arming a new pulse on an
//! address cancels the pending one first, and an epoch check keeps a revert
//! whose timer already elapsed from firing after it was superseded.
//!
//! Press and revert callbacks run under a reentrant firing lock, never under
//! the pending-table lock. A press and a revert can never interleave, and a
//! callback may still query the scheduler or arm another pulse.

use parking_lot::{Mutex, ReentrantMutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

type RevertFn = Box<dyn FnOnce() + Send>;
type PendingTable = Arc<Mutex<HashMap<String, PendingRevert>>>;

struct PendingRevert {
    epoch: u64,
    abort: AbortHandle,
    revert: RevertFn,
}

/// Cancellable per-address revert timers
#[derive(Clone)]
pub struct MomentaryScheduler {
    pending: PendingTable,
    firing: Arc<ReentrantMutex<()>>,
    epoch: Arc<AtomicU64>,
    runtime: Handle,
}

impl MomentaryScheduler {
    /// Create a scheduler whose timers run on `runtime`
    pub fn new(runtime: Handle) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            firing: Arc::new(ReentrantMutex::new(())),
            epoch: Arc::new(AtomicU64::new(0)),
            runtime,
        }
    }

    /// Run `press` now and `revert` after `delay`, without blocking the caller
    ///
    /// Any revert still pending for `address` is dropped without firing.
    pub fn pulse<P, R>(&self, address: &str, delay: Duration, press: P, revert: R) -> u64
    where
        P: FnOnce(),
        R: FnOnce() + Send + 'static,
    {
        let _firing = self.firing.lock();

        let previous = self.pending.lock().remove(address);
        if let Some(previous) = previous {
            previous.abort.abort();
            debug!(address, epoch = previous.epoch, "Momentary re-pressed, pending revert cancelled");
        }

        press();

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let table = self.pending.clone();
        let firing = self.firing.clone();
        let key = address.to_string();

        // The task cannot fire before the insert below: it needs the firing
        // lock we are holding.
        let mut pending = self.pending.lock();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            fire_if_current(&table, &firing, &key, epoch);
        });

        let replaced = pending.insert(
            address.to_string(),
            PendingRevert {
                epoch,
                abort: task.abort_handle(),
                revert: Box::new(revert),
            },
        );
        // A callback armed its own pulse on this address meanwhile
        if let Some(stale) = replaced {
            stale.abort.abort();
        }

        epoch
    }

    /// Whether a revert is pending for `address`
    pub fn is_pending(&self, address: &str) -> bool {
        self.pending.lock().contains_key(address)
    }

    /// Number of pending reverts
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Cancel every timer and fire its revert immediately
    ///
    /// Returns how many reverts were flushed.
    pub fn flush(&self) -> usize {
        let _firing = self.firing.lock();

        let drained: Vec<(String, PendingRevert)> = self.pending.lock().drain().collect();
        let count = drained.len();
        for (address, entry) in drained {
            entry.abort.abort();
            debug!(address = %address, "Flushing pending momentary revert");
            (entry.revert)();
        }
        count
    }
}

/// Timer body: run the revert for `key` unless a newer pulse replaced it
fn fire_if_current(table: &PendingTable, firing: &ReentrantMutex<()>, key: &str, epoch: u64) {
    let _firing = firing.lock();

    let entry = {
        let mut pending = table.lock();
        match pending.get(key) {
            Some(entry) if entry.epoch == epoch => pending.remove(key),
            _ => None,
        }
    };

    match entry {
        Some(entry) => {
            trace!(address = %key, epoch, "Momentary revert firing");
            (entry.revert)();
        },
        None => trace!(address = %key, epoch, "Superseded revert skipped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let c = Arc::new(AtomicUsize::new(0));
        (c.clone(), c)
    }

    #[tokio::test]
    async fn test_press_runs_immediately_and_revert_later() {
        let scheduler = MomentaryScheduler::new(Handle::current());
        let (presses, presses_in) = counter();
        let (reverts, reverts_in) = counter();

        scheduler.pulse(
            "/m",
            Duration::from_millis(50),
            || {
                presses_in.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                reverts_in.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert_eq!(presses.load(Ordering::SeqCst), 1);
        assert_eq!(reverts.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_pending("/m"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(reverts.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending("/m"));
    }

    #[tokio::test]
    async fn test_repress_cancels_previous_revert() {
        let scheduler = MomentaryScheduler::new(Handle::current());
        let (reverts, _) = counter();

        let first = reverts.clone();
        let epoch1 = scheduler.pulse("/m", Duration::from_millis(100), || {}, move || {
            first.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = reverts.clone();
        let epoch2 = scheduler.pulse("/m", Duration::from_millis(100), || {}, move || {
            second.fetch_add(10, Ordering::SeqCst);
        });
        assert!(epoch2 > epoch1);
        assert_eq!(scheduler.pending_count(), 1);

        // First timer would have elapsed here
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert_eq!(reverts.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(reverts.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_addresses_are_independent() {
        let scheduler = MomentaryScheduler::new(Handle::current());
        let (reverts, _) = counter();

        for address in ["/a", "/b"] {
            let reverts = reverts.clone();
            scheduler.pulse(address, Duration::from_millis(20), || {}, move || {
                reverts.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(scheduler.pending_count(), 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(reverts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_callbacks_may_reenter_scheduler() {
        let scheduler = MomentaryScheduler::new(Handle::current());
        let (reverts, reverts_in) = counter();
        let (tx, rx) = std::sync::mpsc::channel();

        let outer = scheduler.clone();
        std::thread::spawn(move || {
            let inner = outer.clone();
            outer.pulse(
                "/m",
                Duration::from_millis(20),
                || {
                    assert!(!inner.is_pending("/m"));
                    inner.pulse("/other", Duration::from_millis(20), || {}, || {});
                },
                move || {
                    reverts_in.fetch_add(1, Ordering::SeqCst);
                },
            );
            tx.send(()).unwrap();
        });

        rx.recv_timeout(Duration::from_millis(500))
            .expect("pulse blocked on its own scheduler");
        assert_eq!(scheduler.pending_count(), 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(reverts.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_flush_fires_pending_reverts_once() {
        let scheduler = MomentaryScheduler::new(Handle::current());
        let (reverts, reverts_in) = counter();

        scheduler.pulse("/m", Duration::from_secs(30), || {}, move || {
            reverts_in.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(scheduler.flush(), 1);
        assert_eq!(reverts.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(scheduler.flush(), 0);
        assert_eq!(reverts.load(Ordering::SeqCst), 1);
    }
}
