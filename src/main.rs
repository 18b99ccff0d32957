use anyhow::Result;
use clap::Parser;
use gridlock::{Gridlock, WorkerSpec};
use std::time::Duration;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Gridlock - runtime deadlock detection over a polled wait-for graph"
)]
struct Cli {
    /// Milliseconds between wait-for-graph samples
    #[arg(long, default_value_t = 100)]
    sample_interval_ms: u64,

    /// Seconds a cycle must persist before it is confirmed
    #[arg(long, default_value_t = 5)]
    confirmation_window_secs: u64,
}

/// Runs the canonical crossed-acquisition scenario: T1 takes A then B while
/// T2 takes B then A, which converges to a two-worker deadlock that the
/// monitor confirms and reports before exiting with status 0.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut session = Gridlock::new()
        .resources(["A", "B"])
        .worker(WorkerSpec::new([0, 1]))
        .worker(WorkerSpec::new([1, 0]))
        .sample_interval(Duration::from_millis(cli.sample_interval_ms))
        .confirmation_window(Duration::from_secs(cli.confirmation_window_secs))
        .log_to_stdout()
        .start()?;

    session.join_workers();
    session.shutdown();
    Ok(())
}
