//! Resource registry and the instrumented lock path
//!
//! Each resource wraps a raw mutual-exclusion primitive plus a name. The
//! registry's [`Registry::acquire`] is the instrumented acquisition: a
//! non-blocking fast path, and on contention a wait-for edge recorded with
//! the detector before the indefinite blocking wait. Release happens when
//! the returned [`ResourceGuard`] is dropped.

use crate::core::detector::Detector;
use crate::core::logger::{self, Event};
use crate::core::types::{ResourceId, WorkerId, WorkerInfo};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// One lockable unit: a raw primitive plus its display name
struct Resource {
    name: String,
    lock: Mutex<()>,
}

/// Fixed set of lockable resources shared by every worker
///
/// Constructed once at session start; teardown is the registry's `Drop`.
/// Resource and worker identities are indices into the vectors given at
/// construction, so acquisition panics on an out-of-range id; plans are
/// validated before any worker runs.
pub struct Registry {
    resources: Vec<Resource>,
    roster: Arc<Vec<WorkerInfo>>,
    detector: Arc<Detector>,
}

/// Guard for an acquired resource, reports the release when dropped
pub struct ResourceGuard<'a> {
    registry: &'a Registry,
    resource: ResourceId,
    worker: WorkerId,
    _guard: MutexGuard<'a, ()>,
}

impl Registry {
    /// Create a registry over the named resources
    ///
    /// Every resource starts unlocked and unowned.
    pub fn new(names: Vec<String>, roster: Arc<Vec<WorkerInfo>>, detector: Arc<Detector>) -> Self {
        Registry {
            resources: names
                .into_iter()
                .map(|name| Resource {
                    name,
                    lock: Mutex::new(()),
                })
                .collect(),
            roster,
            detector,
        }
    }

    /// Number of resources in the registry
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Display name of a resource
    pub fn resource_name(&self, resource: ResourceId) -> &str {
        &self.resources[resource].name
    }

    pub(crate) fn worker_label(&self, worker: WorkerId) -> &str {
        &self.roster[worker].label
    }

    /// Acquire `resource` on behalf of `worker`, blocking on contention
    ///
    /// The fast path is a non-blocking attempt. On contention the wait-for
    /// edge is recorded first, then the call suspends with no timeout until
    /// the holder releases. Either way the detector records the ownership
    /// transfer before this returns.
    pub fn acquire(&self, resource: ResourceId, worker: WorkerId) -> ResourceGuard<'_> {
        let res = &self.resources[resource];

        if logger::is_enabled() {
            logger::log_event(&Event::Attempt {
                worker: self.worker_label(worker).to_owned(),
                resource: res.name.clone(),
            });
        }

        if let Some(guard) = res.lock.try_lock() {
            self.detector.acquired(worker, resource);
            if logger::is_enabled() {
                logger::log_event(&Event::Acquired {
                    worker: self.worker_label(worker).to_owned(),
                    resource: res.name.clone(),
                    contended: false,
                });
            }
            return ResourceGuard {
                registry: self,
                resource,
                worker,
                _guard: guard,
            };
        }

        // Contended: record the edge, then block until the holder releases.
        let owner = self.detector.record_wait(worker, resource);
        if logger::is_enabled() {
            if let Some(owner) = owner {
                logger::log_event(&Event::Waiting {
                    waiter: self.worker_label(worker).to_owned(),
                    owner: self.worker_label(owner).to_owned(),
                    resource: res.name.clone(),
                });
            }
        }

        let guard = res.lock.lock();

        self.detector.acquired(worker, resource);
        if logger::is_enabled() {
            logger::log_event(&Event::Acquired {
                worker: self.worker_label(worker).to_owned(),
                resource: res.name.clone(),
                contended: true,
            });
        }
        ResourceGuard {
            registry: self,
            resource,
            worker,
            _guard: guard,
        }
    }
}

impl Drop for ResourceGuard<'_> {
    fn drop(&mut self) {
        self.registry.detector.released(self.worker, self.resource);
        if logger::is_enabled() {
            logger::log_event(&Event::Released {
                worker: self.registry.worker_label(self.worker).to_owned(),
                resource: self.registry.resource_name(self.resource).to_owned(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn test_registry(workers: usize, names: &[&str]) -> Arc<Registry> {
        let roster = Arc::new(
            (0..workers)
                .map(|id| WorkerInfo {
                    id,
                    label: format!("T{}", id + 1),
                })
                .collect::<Vec<_>>(),
        );
        let detector = Arc::new(Detector::new(workers, names.len()));
        Arc::new(Registry::new(
            names.iter().map(|&n| n.to_owned()).collect(),
            roster,
            detector,
        ))
    }

    #[test]
    fn uncontended_acquire_records_ownership() {
        let registry = test_registry(1, &["A"]);
        {
            let _guard = registry.acquire(0, 0);
            assert_eq!(registry.detector.owner_of(0), Some(0));
        }
        assert_eq!(registry.detector.owner_of(0), None);
        assert!(registry.detector.is_idle());
    }

    #[test]
    fn contended_handoff_clears_the_wait_edge() {
        let registry = test_registry(2, &["A"]);
        let (holding_tx, holding_rx) = mpsc::channel();

        let holder = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let guard = registry.acquire(0, 0);
                holding_tx.send(()).expect("main thread is waiting");
                thread::sleep(Duration::from_millis(150));
                drop(guard);
            })
        };

        holding_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("holder must acquire first");

        // Blocks until the holder releases, then the edge must be gone.
        let guard = registry.acquire(0, 1);
        assert!(!registry.detector.edge(1, 0));
        assert_eq!(registry.detector.owner_of(0), Some(1));

        drop(guard);
        holder.join().expect("holder must finish");
        assert!(registry.detector.is_idle());
    }
}
