mod common;

use gridlock::WorkerSpec;
use std::time::Duration;

#[test]
fn two_worker_crossed_acquisition_is_confirmed() {
    let (builder, rx) = common::channel_builder(20, 200);
    let session = builder
        .resources(["A", "B"])
        .worker(WorkerSpec::new([0, 1]).with_stagger(Duration::from_millis(100)))
        .worker(WorkerSpec::new([1, 0]).with_stagger(Duration::from_millis(100)))
        .start()
        .expect("failed to start session");

    let report = common::expect_deadlock(&rx, common::DEADLOCK_TIMEOUT);

    // Both workers, each named by its acquisition pattern.
    assert_eq!(report.cycle.len(), 2, "cycle must involve both workers");
    let labels: Vec<&str> = report.cycle.iter().map(|w| w.label.as_str()).collect();
    assert!(labels.contains(&"T1(A->B)"));
    assert!(labels.contains(&"T2(B->A)"));
    assert_eq!(report.waiting_on.len(), 2);

    // The wait-for graph converged to crossed edges and nothing else.
    let detector = session.detector();
    assert!(detector.edge(0, 1) && detector.edge(1, 0));
    assert!(!detector.edge(0, 0) && !detector.edge(1, 1));

    // Confirmation is terminal: exactly one report.
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}
