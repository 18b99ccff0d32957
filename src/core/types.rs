use serde::{Deserialize, Serialize};

/// Worker identifier type
///
/// An index in `[0, N)`, assigned at session start and stable for the
/// worker's lifetime.
pub type WorkerId = usize;

/// Resource identifier type
///
/// An index in `[0, R)` into the resource registry.
pub type ResourceId = usize;

/// A worker's identity together with its human-readable label
///
/// The label encodes the worker's intended lock-acquisition pattern
/// (e.g. `T1(A->B)`) and is used only for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerInfo {
    /// Stable index of the worker
    pub id: WorkerId,
    /// Display label derived from the worker's acquisition plan
    pub label: String,
}

/// Represents the result of a confirmed deadlock
///
/// This structure contains detailed information about a deadlock that
/// persisted through the whole confirmation window, including which workers
/// form the cycle and which resource each of them is stuck on. It is passed
/// to the confirmation callback and can be used to diagnose the root cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlockReport {
    /// Workers involved in the deadlock cycle, in cycle order
    ///
    /// For example, if worker 0 is waiting for worker 1, and worker 1 is
    /// waiting for worker 0, the cycle is `[0, 1]`.
    pub cycle: Vec<WorkerInfo>,

    /// Map of cycle members to the resource they are blocked on
    ///
    /// Each tuple is `(worker_id, resource_id)`. Only workers that are part
    /// of the cycle are included.
    pub waiting_on: Vec<(WorkerId, ResourceId)>,

    /// How long the cycle persisted before confirmation, in seconds
    pub persisted_secs: f64,

    /// ISO-8601 timestamp of the moment the deadlock was confirmed
    pub timestamp: String,
}
