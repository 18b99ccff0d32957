//! # Gridlock
//!
//! A runtime deadlock detector for mutually-exclusive resource locks held by
//! concurrent workers.
//!
//! Gridlock tracks which worker is blocked on which other worker's resource
//! in a directed wait-for graph, polls the graph for cycles on a fixed
//! interval, and confirms a deadlock only once a cycle has persisted through
//! a whole confirmation window, filtering transient contention from the
//! real thing.
//!
//! ## Features
//!
//! - Instrumented lock acquisition over a fixed resource registry
//! - Three-color DFS cycle search over the wait-for graph
//! - Debounced confirmation with a configurable sampling cadence
//! - Structured deadlock reports through a caller-supplied callback
//! - Human-readable or JSON-line diagnostic logging
//!
//! ## Example
//!
//! ```no_run
//! use gridlock::{Gridlock, WorkerSpec};
//!
//! let mut session = Gridlock::new()
//!     .resources(["A", "B"])
//!     .worker(WorkerSpec::new([0, 1]))
//!     .worker(WorkerSpec::new([1, 0]))
//!     .log_to_stdout()
//!     .start()
//!     .expect("failed to start session");
//!
//! // Blocks until the crossed acquisitions deadlock; the default callback
//! // then reports the cycle and exits with status 0.
//! session.join_workers();
//! ```

mod core;
pub use core::{
    Detector, Dispatcher, Gridlock, Monitor, MonitorConfig, Registry, ResourceGuard, Session,
    WorkerSpec, logger,
    types::{DeadlockReport, ResourceId, WorkerId, WorkerInfo},
};
