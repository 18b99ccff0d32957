//! Diagnostic event logging
//!
//! One self-contained line per lock event, serialized through a single
//! process-global guard so concurrent output from workers and the monitor
//! never interleaves mid-line. Stdout mode renders human-readable lines;
//! file mode writes the same events as JSON lines for machine consumption.

use crate::core::types::DeadlockReport;
use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// A single diagnostic event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A worker is about to try a lock
    Attempt { worker: String, resource: String },
    /// A worker obtained a lock, possibly after blocking
    Acquired {
        worker: String,
        resource: String,
        contended: bool,
    },
    /// A wait-for edge was created: `waiter` blocks on `owner`'s resource
    Waiting {
        waiter: String,
        owner: String,
        resource: String,
    },
    /// A worker released a lock
    Released { worker: String, resource: String },
    /// The monitor confirmed a persistent deadlock
    Confirmed { report: DeadlockReport },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Attempt { worker, resource } => {
                write!(f, "[{worker}] attempting to lock {resource}")
            }
            Event::Acquired {
                worker,
                resource,
                contended: false,
            } => write!(f, "[{worker}] locked {resource}"),
            Event::Acquired {
                worker, resource, ..
            } => write!(f, "[{worker}] locked {resource} after waiting"),
            Event::Waiting {
                waiter,
                owner,
                resource,
            } => write!(f, "[{waiter}] waiting for [{owner}] (resource {resource})"),
            Event::Released { worker, resource } => {
                write!(f, "[{worker}] released {resource}")
            }
            Event::Confirmed { report } => {
                write!(
                    f,
                    "=== deadlock confirmed after {:.1}s ===\ndeadlocked workers:",
                    report.persisted_secs
                )?;
                for worker in &report.cycle {
                    write!(f, "\n  - {}", worker.label)?;
                }
                Ok(())
            }
        }
    }
}

/// A file-mode log line: the event plus an absolute timestamp
#[derive(Serialize)]
struct LogLine<'a> {
    /// Seconds since the Unix epoch, with microsecond precision
    timestamp: f64,
    #[serde(flatten)]
    event: &'a Event,
}

/// Determines how the logger should operate
enum LogMode {
    /// Logging is disabled entirely
    Disabled,
    /// Human-readable lines on standard output
    Stdout,
    /// JSON lines appended to the given file
    ToFile(File),
}

/// Logger for recording lock events
pub struct EventLog {
    mode: LogMode,
}

impl EventLog {
    fn new() -> Self {
        EventLog {
            mode: LogMode::Disabled,
        }
    }

    fn write(&mut self, event: &Event) {
        match &mut self.mode {
            LogMode::Disabled => {}
            LogMode::Stdout => println!("{event}"),
            LogMode::ToFile(file) => {
                let now = Utc::now();
                let timestamp =
                    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0;
                let line = LogLine { timestamp, event };
                if let Ok(json) = serde_json::to_string(&line) {
                    let _ = writeln!(file, "{json}");
                    let _ = file.flush();
                }
            }
        }
    }
}

// Global logger instance; its mutex doubles as the print guard.
lazy_static::lazy_static! {
    static ref GLOBAL_LOG: Mutex<EventLog> = Mutex::new(EventLog::new());
}

/// Route diagnostics to standard output
pub fn init_stdout() {
    GLOBAL_LOG.lock().mode = LogMode::Stdout;
}

/// Route diagnostics to `path` as JSON lines
///
/// # Errors
/// Returns an error if the log file cannot be opened for appending
pub fn init_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("failed to open event log file")?;
    GLOBAL_LOG.lock().mode = LogMode::ToFile(file);
    Ok(())
}

/// Turn diagnostic output off
pub fn disable() {
    GLOBAL_LOG.lock().mode = LogMode::Disabled;
}

/// Whether any diagnostic sink is active
///
/// Call sites use this to skip building label strings when nobody listens.
pub fn is_enabled() -> bool {
    !matches!(GLOBAL_LOG.lock().mode, LogMode::Disabled)
}

/// Emit one event through the global print guard
pub fn log_event(event: &Event) {
    GLOBAL_LOG.lock().write(event);
}
