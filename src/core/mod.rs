// Core types
pub mod types;
pub use types::*;

// Diagnostic output
pub mod logger;

// Graph implementation
pub mod graph;

// Shared detection state
pub mod detector;
pub use detector::{Detector, Dispatcher};

// Confirmation monitor
pub mod monitor;
pub use monitor::{Monitor, MonitorConfig};

// Resources and the instrumented lock path
pub mod registry;
pub use registry::{Registry, ResourceGuard};

// Worker tasks
pub mod worker;
pub use worker::WorkerSpec;

use anyhow::{Context, Result, ensure};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Gridlock configuration struct
///
/// Collects the resource names, worker plans, monitor cadence, and
/// confirmation callback, then [`Gridlock::start`] wires everything together
/// and brings the session up.
pub struct Gridlock {
    resources: Vec<String>,
    workers: Vec<WorkerSpec>,
    config: MonitorConfig,
    callback: Box<dyn Fn(DeadlockReport) + Send + 'static>,
    log_path: Option<String>,
    log_stdout: bool,
}

impl Default for Gridlock {
    fn default() -> Self {
        Self::new()
    }
}

impl Gridlock {
    /// Create a new Gridlock with default settings
    ///
    /// By default:
    /// - Diagnostic logging is disabled
    /// - Sampling runs every 100ms with a 5 second confirmation window
    /// - The callback terminates the process with status 0, since a
    ///   confirmed, reported deadlock is the designed outcome rather than a
    ///   failure
    pub fn new() -> Self {
        Gridlock {
            resources: Vec::new(),
            workers: Vec::new(),
            config: MonitorConfig::default(),
            callback: Box::new(|_report| {
                std::process::exit(0);
            }),
            log_path: None,
            log_stdout: false,
        }
    }

    /// Add one named resource
    pub fn resource(mut self, name: impl Into<String>) -> Self {
        self.resources.push(name.into());
        self
    }

    /// Add several named resources at once
    pub fn resources<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a worker; its identity is its insertion index
    pub fn worker(mut self, spec: WorkerSpec) -> Self {
        self.workers.push(spec);
        self
    }

    /// Set the time between cycle samples
    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.config.sample_interval = interval;
        self
    }

    /// Set how long a cycle must persist before confirmation
    pub fn confirmation_window(mut self, window: Duration) -> Self {
        self.config.confirmation_window = window;
        self
    }

    /// Set a custom callback to be invoked when a deadlock is confirmed
    ///
    /// The callback runs on the dispatcher thread. Tests typically send the
    /// report through a channel here instead of exiting the process.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(DeadlockReport) + Send + 'static,
    {
        self.callback = Box::new(callback);
        self
    }

    /// Write diagnostics as JSON lines to the given file
    pub fn with_log<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.log_path = Some(path.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Write human-readable diagnostics to standard output
    pub fn log_to_stdout(mut self) -> Self {
        self.log_stdout = true;
        self
    }

    /// Validate the configuration and bring the session up
    ///
    /// Spawns the dispatcher, the monitor, and every worker thread.
    ///
    /// # Errors
    /// Returns an error if the configuration is inconsistent, the log file
    /// cannot be opened, or any thread fails to spawn. All of these are
    /// fatal: the session cannot provide its guarantees without them.
    pub fn start(self) -> Result<Session> {
        ensure!(!self.resources.is_empty(), "at least one resource required");
        ensure!(!self.workers.is_empty(), "at least one worker required");
        ensure!(
            !self.config.sample_interval.is_zero(),
            "sample interval must be non-zero"
        );
        for (id, spec) in self.workers.iter().enumerate() {
            for &r in &spec.plan {
                ensure!(
                    r < self.resources.len(),
                    "worker {id} plan references unknown resource {r}"
                );
            }
        }

        if let Some(path) = &self.log_path {
            logger::init_file(path).context("failed to initialize event log")?;
        } else if self.log_stdout {
            logger::init_stdout();
        }

        let roster: Arc<Vec<WorkerInfo>> = Arc::new(
            self.workers
                .iter()
                .enumerate()
                .map(|(id, spec)| WorkerInfo {
                    id,
                    label: spec.label(id, &self.resources),
                })
                .collect(),
        );

        let detector = Arc::new(Detector::new(self.workers.len(), self.resources.len()));
        let registry = Arc::new(Registry::new(
            self.resources,
            Arc::clone(&roster),
            Arc::clone(&detector),
        ));

        let dispatcher = Dispatcher::new(self.callback)?;
        let monitor = Monitor::spawn(
            Arc::clone(&detector),
            Arc::clone(&roster),
            self.config,
            dispatcher,
        )?;

        let workers = self
            .workers
            .into_iter()
            .enumerate()
            .map(|(id, spec)| worker::spawn(Arc::clone(&registry), id, spec))
            .collect::<Result<Vec<_>>>()?;

        Ok(Session {
            registry,
            detector,
            monitor,
            workers,
        })
    }
}

/// A running detection session
///
/// Owns the registry, the detector, the monitor, and the worker handles.
pub struct Session {
    registry: Arc<Registry>,
    detector: Arc<Detector>,
    monitor: Monitor,
    workers: Vec<JoinHandle<()>>,
}

impl Session {
    /// The session's resource registry
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The session's shared detection state
    pub fn detector(&self) -> &Arc<Detector> {
        &self.detector
    }

    /// Wait for every worker to finish
    ///
    /// Blocks indefinitely while workers are deadlocked; in that case the
    /// default confirmation callback exits the process out from under them.
    pub fn join_workers(&mut self) {
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }

    /// Stop the monitor and wait for it to exit
    ///
    /// Worker threads still blocked inside an acquisition are left detached;
    /// unblocking a deadlocked worker is exactly what this system does not
    /// promise.
    pub fn shutdown(self) {
        self.monitor.stop();
        self.monitor.join();
    }
}
