use gridlock::{DeadlockReport, Gridlock};
use std::sync::mpsc;
use std::time::Duration;

#[allow(dead_code)]
pub const DEADLOCK_TIMEOUT: Duration = Duration::from_secs(3);
#[allow(dead_code)]
pub const NO_DEADLOCK_TIMEOUT: Duration = Duration::from_millis(600);

/// A builder preconfigured with a fast monitor cadence and a callback that
/// forwards confirmed reports through the returned channel instead of
/// exiting the process.
pub fn channel_builder(
    interval_ms: u64,
    window_ms: u64,
) -> (Gridlock, mpsc::Receiver<DeadlockReport>) {
    let (tx, rx) = mpsc::channel::<DeadlockReport>();
    let builder = Gridlock::new()
        .sample_interval(Duration::from_millis(interval_ms))
        .confirmation_window(Duration::from_millis(window_ms))
        .callback(move |report| {
            let _ = tx.send(report);
        });
    (builder, rx)
}

#[allow(dead_code)]
pub fn expect_deadlock(rx: &mpsc::Receiver<DeadlockReport>, timeout: Duration) -> DeadlockReport {
    match rx.recv_timeout(timeout) {
        Ok(report) => report,
        Err(_) => panic!("no deadlock confirmed within {timeout:?}"),
    }
}

#[allow(dead_code)]
pub fn assert_no_deadlock(rx: &mpsc::Receiver<DeadlockReport>, timeout: Duration) {
    assert!(
        rx.recv_timeout(timeout).is_err(),
        "unexpected deadlock confirmation"
    );
}
