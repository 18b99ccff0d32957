//! Periodic cycle sampling with temporal confirmation
//!
//! A momentary cycle snapshot can be a false positive (both workers caught
//! mid-transition), so the monitor only confirms a deadlock once a cycle has
//! been seen on every sample across the whole confirmation window. Any clear
//! sample resets the count. Detection latency is therefore bounded by
//! `sample_interval * threshold` plus one interval; this is the only timeout
//! concept in the system.

use crate::core::detector::{Detector, Dispatcher};
use crate::core::logger::{self, Event};
use crate::core::types::{DeadlockReport, WorkerId, WorkerInfo};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Sampling cadence and confirmation window of the monitor
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// Time between consecutive cycle samples
    pub sample_interval: Duration,
    /// How long a cycle must persist before it is confirmed
    pub confirmation_window: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            sample_interval: Duration::from_millis(100),
            confirmation_window: Duration::from_secs(5),
        }
    }
}

impl MonitorConfig {
    /// Consecutive positive samples required before confirmation
    pub fn threshold(&self) -> u32 {
        (self.confirmation_window.as_millis() / self.sample_interval.as_millis().max(1)) as u32
    }
}

/// Dedicated sampling thread watching the detector for persistent cycles
///
/// Spawned once at session start. Terminal on confirmation; cancellable via
/// [`Monitor::stop`] so tests can tear down a simulated deadlock without
/// killing the process.
pub struct Monitor {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Start the monitor thread
    ///
    /// On confirmation the report is logged and handed to `dispatcher`,
    /// which runs the configured callback; the monitor loop then ends.
    ///
    /// # Errors
    /// Returns an error if the monitor thread cannot be spawned, which is
    /// fatal for the session.
    pub fn spawn(
        detector: Arc<Detector>,
        roster: Arc<Vec<WorkerInfo>>,
        config: MonitorConfig,
        dispatcher: Dispatcher,
    ) -> Result<Monitor> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("gridlock-monitor".into())
            .spawn(move || sample_loop(&detector, &roster, config, &dispatcher, &flag))
            .context("failed to spawn monitor thread")?;

        Ok(Monitor {
            stop,
            handle: Some(handle),
        })
    }

    /// Ask the monitor to exit at its next sample
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Block until the monitor thread has exited
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn sample_loop(
    detector: &Detector,
    roster: &[WorkerInfo],
    config: MonitorConfig,
    dispatcher: &Dispatcher,
    stop: &AtomicBool,
) {
    let threshold = config.threshold();
    let mut streak: u32 = 0;
    let mut first_positive: Option<Instant> = None;

    loop {
        thread::sleep(config.sample_interval);
        if stop.load(Ordering::Relaxed) {
            return;
        }

        match detector.find_cycle() {
            None => {
                streak = 0;
                first_positive = None;
            }
            Some(cycle) => {
                streak += 1;
                let since = *first_positive.get_or_insert_with(Instant::now);

                // One sample more than the threshold, so the full window has
                // elapsed between the first sighting and confirmation.
                if streak > threshold {
                    let report = build_report(detector, roster, &cycle, since.elapsed());
                    logger::log_event(&Event::Confirmed {
                        report: report.clone(),
                    });
                    dispatcher.send(report);
                    return;
                }
            }
        }
    }
}

fn build_report(
    detector: &Detector,
    roster: &[WorkerInfo],
    cycle: &[WorkerId],
    persisted: Duration,
) -> DeadlockReport {
    DeadlockReport {
        cycle: cycle.iter().map(|&w| roster[w].clone()).collect(),
        waiting_on: detector.waiting_pairs(cycle),
        persisted_secs: persisted.as_secs_f64(),
        timestamp: Utc::now().to_rfc3339(),
    }
}
