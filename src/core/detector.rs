//! Shared detection state and the confirmation dispatcher
//!
//! The [`Detector`] owns everything the cycle search needs to see a
//! consistent world: the wait-for graph, the per-resource owner table, and
//! the per-worker waits-for table. All three live behind one mutex, which is
//! the sole serialization point for detection state. A cycle scan holds that
//! guard for the full traversal, so it can never observe a half-updated edge
//! set; the graph is small and polling is infrequent, so briefly blocking
//! workers during a scan is an accepted tradeoff.
//!
//! The [`Dispatcher`] runs the user's confirmation callback on its own
//! thread, fed through a channel, so the callback can block or terminate the
//! process without entangling the monitor loop.

use crate::core::graph::WaitForGraph;
use crate::core::types::{DeadlockReport, ResourceId, WorkerId};
use anyhow::{Context, Result};
use crossbeam_channel::{Sender, unbounded};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::thread;

/// Detection state protected by the single guard
struct State {
    /// Which worker is waiting for which other worker
    graph: WaitForGraph,
    /// Current owner of each resource, indexed by `ResourceId`
    owners: Vec<Option<WorkerId>>,
    /// Which resource each blocked worker is waiting on
    waits_for: FxHashMap<WorkerId, ResourceId>,
}

/// Tracks wait-for relationships between a fixed set of workers
///
/// The detector is mutated from the instrumented lock path and scanned from
/// the monitor. Ownership updates and edge updates always happen under the
/// same guard, so an observed edge always has a consistent owner behind it.
pub struct Detector {
    state: Mutex<State>,
}

impl Detector {
    /// Create a detector for `workers` workers and `resources` resources
    pub fn new(workers: usize, resources: usize) -> Self {
        Detector {
            state: Mutex::new(State {
                graph: WaitForGraph::new(workers),
                owners: vec![None; resources],
                waits_for: FxHashMap::default(),
            }),
        }
    }

    /// Record that `worker` is about to block on `resource`
    ///
    /// Reads the resource's current owner under the guard and, if one is
    /// recorded, inserts the wait-for edge in the same critical section.
    /// When the owner released between the failed fast-path attempt and this
    /// call, no edge is inserted; the blocking acquisition will return
    /// promptly and [`Detector::acquired`] cleans up the waits-for entry.
    ///
    /// # Returns
    /// The owner the edge points at, for the "waiting" diagnostic line
    pub fn record_wait(&self, worker: WorkerId, resource: ResourceId) -> Option<WorkerId> {
        let mut state = self.state.lock();
        state.waits_for.insert(worker, resource);
        let owner = state.owners[resource];
        if let Some(owner) = owner {
            state.graph.add_edge(worker, owner);
        }
        owner
    }

    /// Forget that `worker` is waiting, without recording ownership
    ///
    /// Removes the worker's waits-for entry and every outgoing edge. The
    /// acquisition path uses [`Detector::acquired`] instead, which does this
    /// and the ownership transfer in one critical section.
    pub fn clear_wait(&self, worker: WorkerId) {
        let mut state = self.state.lock();
        state.waits_for.remove(&worker);
        state.graph.clear_outgoing(worker);
    }

    /// Record that `worker` now owns `resource`
    ///
    /// Clears the worker's own wait state and transfers ownership. Any other
    /// worker still blocked on this resource gets its edge re-pointed at the
    /// new owner, so edges keep tracking the holder across handoffs instead
    /// of going stale.
    pub fn acquired(&self, worker: WorkerId, resource: ResourceId) {
        let mut state = self.state.lock();
        state.waits_for.remove(&worker);
        state.graph.clear_outgoing(worker);
        state.owners[resource] = Some(worker);

        let State {
            graph, waits_for, ..
        } = &mut *state;
        for (&waiter, &wanted) in waits_for.iter() {
            if wanted == resource && waiter != worker {
                graph.clear_outgoing(waiter);
                graph.add_edge(waiter, worker);
            }
        }
    }

    /// Record that `worker` released `resource`
    ///
    /// Clears ownership and drops the edges of workers blocked on this
    /// resource that point at the releasing worker. Without this, a waiter
    /// that loses the handoff race would keep an edge into a worker that no
    /// longer holds anything it wants.
    pub fn released(&self, worker: WorkerId, resource: ResourceId) {
        let mut state = self.state.lock();
        if state.owners[resource] == Some(worker) {
            state.owners[resource] = None;
        }

        let State {
            graph, waits_for, ..
        } = &mut *state;
        for (&waiter, &wanted) in waits_for.iter() {
            if wanted == resource {
                graph.remove_edge(waiter, worker);
            }
        }
    }

    /// Search for a cycle among the current wait-for edges
    ///
    /// The whole traversal runs under the state guard, so concurrent edge
    /// mutation cannot be observed mid-scan.
    pub fn find_cycle(&self) -> Option<Vec<WorkerId>> {
        self.state.lock().graph.find_cycle()
    }

    /// Whether any wait-for cycle currently exists
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// The resource each cycle member is blocked on, in cycle order
    pub fn waiting_pairs(&self, cycle: &[WorkerId]) -> Vec<(WorkerId, ResourceId)> {
        let state = self.state.lock();
        cycle
            .iter()
            .filter_map(|&w| state.waits_for.get(&w).map(|&r| (w, r)))
            .collect()
    }

    /// Current owner of `resource`, if any
    pub fn owner_of(&self, resource: ResourceId) -> Option<WorkerId> {
        self.state.lock().owners[resource]
    }

    /// Whether the edge `from -> to` currently exists
    pub fn edge(&self, from: WorkerId, to: WorkerId) -> bool {
        self.state.lock().graph.has_edge(from, to)
    }

    /// Whether nothing is owned and nobody is waiting
    ///
    /// True once every worker has drained: no edges, no waits-for entries,
    /// no recorded owners.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.graph.is_empty()
            && state.waits_for.is_empty()
            && state.owners.iter().all(Option::is_none)
    }
}

/// Background dispatcher for asynchronous callback execution
///
/// Runs a dedicated thread that receives confirmed deadlock reports through
/// a channel and executes the registered callback there. The monitor only
/// ever performs a non-blocking send, so a slow or process-terminating
/// callback cannot wedge the sampling loop.
pub struct Dispatcher {
    /// Channel sender for transmitting confirmed reports
    sender: Sender<DeadlockReport>,
    /// Background thread handle
    _thread_handle: thread::JoinHandle<()>,
}

impl Dispatcher {
    /// Create a dispatcher that runs `callback` for every confirmed report
    ///
    /// # Errors
    /// Returns an error if the dispatcher thread cannot be spawned; the
    /// runtime cannot provide the guarantees the detector depends on, so
    /// the caller treats this as fatal.
    pub fn new(callback: Box<dyn Fn(DeadlockReport) + Send + 'static>) -> Result<Self> {
        let (tx, rx) = unbounded::<DeadlockReport>();

        let thread_handle = thread::Builder::new()
            .name("gridlock-dispatch".into())
            .spawn(move || {
                while let Ok(report) = rx.recv() {
                    callback(report);
                }
            })
            .context("failed to spawn dispatcher thread")?;

        Ok(Dispatcher {
            sender: tx,
            _thread_handle: thread_handle,
        })
    }

    /// Send a confirmed report to the dispatcher thread
    pub fn send(&self, report: DeadlockReport) {
        // Non-blocking; the report is dropped if the channel is closed
        let _ = self.sender.send(report);
    }
}
