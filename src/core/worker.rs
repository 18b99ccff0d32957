//! Homogeneous worker tasks
//!
//! Every worker is the same machine parameterized by identity and an ordered
//! acquisition plan, so scenarios generalize past two hard-wired roles. The
//! stagger between acquisitions widens the window in which an opposing
//! worker can grab the contended resource, making crossed-acquisition
//! deadlocks reproducible rather than racy.

use crate::core::registry::Registry;
use crate::core::types::{ResourceId, WorkerId};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One worker's scripted behavior
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    /// Resources to acquire, in order
    pub plan: Vec<ResourceId>,
    /// Pause between consecutive acquisitions
    pub stagger: Duration,
    /// How long to keep everything held once the plan completes
    pub hold: Duration,
}

impl WorkerSpec {
    /// A worker that acquires `plan` in order with the default 500ms stagger
    pub fn new(plan: impl Into<Vec<ResourceId>>) -> Self {
        WorkerSpec {
            plan: plan.into(),
            stagger: Duration::from_millis(500),
            hold: Duration::ZERO,
        }
    }

    /// Override the pause between consecutive acquisitions
    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Override how long the worker holds its resources before releasing
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Display label encoding the acquisition pattern, e.g. `T1(A->B)`
    pub(crate) fn label(&self, id: WorkerId, names: &[String]) -> String {
        let pattern = self
            .plan
            .iter()
            .map(|&r| names[r].as_str())
            .collect::<Vec<_>>()
            .join("->");
        format!("T{}({pattern})", id + 1)
    }
}

/// Spawn the worker thread executing `spec` against the registry
///
/// # Errors
/// Returns an error if the OS refuses to create the thread; the session
/// cannot run its scenario without all of its workers, so this is fatal.
pub(crate) fn spawn(
    registry: Arc<Registry>,
    id: WorkerId,
    spec: WorkerSpec,
) -> Result<JoinHandle<()>> {
    let name = registry.worker_label(id).to_owned();
    thread::Builder::new()
        .name(name)
        .spawn(move || run(&registry, id, &spec))
        .with_context(|| format!("failed to spawn worker {id}"))
}

fn run(registry: &Registry, id: WorkerId, spec: &WorkerSpec) {
    let mut guards = Vec::with_capacity(spec.plan.len());
    for (step, &resource) in spec.plan.iter().enumerate() {
        if step > 0 {
            thread::sleep(spec.stagger);
        }
        // Blocks forever on a deadlocked resource; the monitor's
        // confirmation path exits the process out from under us.
        guards.push(registry.acquire(resource, id));
    }

    if !spec.hold.is_zero() {
        thread::sleep(spec.hold);
    }

    // Release in reverse acquisition order.
    while guards.pop().is_some() {}
}
