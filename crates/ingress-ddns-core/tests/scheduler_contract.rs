//! Contract Test: Scheduling and Shutdown
//!
//! Constraints verified:
//! - The first pass runs immediately on start
//! - Subsequent passes run after the fixed delay, not before
//! - Shutdown stops the loop between passes
//!
//! These tests run on a paused clock, so delays elapse instantly.

mod common;

use common::*;
use ingress_ddns_core::{ReconcileEvent, Reconciler, Scheduler};
use std::time::Duration;

fn scheduler(
    hostnames: &StaticHostnames,
    store: &RecordingStore,
) -> (Scheduler, tokio::sync::mpsc::Receiver<ReconcileEvent>) {
    let config = test_config();
    let (reconciler, events) = Reconciler::new(
        Box::new(hostnames.clone()),
        Box::new(SwitchableIpSource::new(ip("203.0.113.5"))),
        Box::new(store.clone()),
        &config,
    )
    .expect("reconciler construction succeeds");

    (Scheduler::new(reconciler, config.interval()), events)
}

fn completed_passes(events: &mut tokio::sync::mpsc::Receiver<ReconcileEvent>) -> usize {
    let mut count = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, ReconcileEvent::PassCompleted { .. }) {
            count += 1;
        }
    }
    count
}

#[tokio::test(start_paused = true)]
async fn first_pass_runs_immediately_then_every_interval() {
    let hostnames = StaticHostnames::new(&["app"]);
    let store = RecordingStore::new();
    let (scheduler, mut events) = scheduler(&hostnames, &store);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { scheduler.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(hostnames.call_count(), 1, "first pass runs on start");
    assert_eq!(store.mutations().len(), 1, "first pass creates the record");

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(hostnames.call_count(), 1, "no second pass before the interval");

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(hostnames.call_count(), 2, "second pass after 60 seconds");

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(hostnames.call_count(), 3);
    assert_eq!(store.mutations().len(), 1, "later passes are no-ops");

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(completed_passes(&mut events), 3);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_loop() {
    let hostnames = StaticHostnames::new(&["app"]);
    let store = RecordingStore::new();
    let (scheduler, _events) = scheduler(&hostnames, &store);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { scheduler.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(Duration::from_secs(1)).await;
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(result.is_ok(), "scheduler should stop within 5 seconds");
    assert!(result.unwrap().unwrap().is_ok());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(hostnames.call_count(), 1, "no pass after shutdown");
}

#[tokio::test(start_paused = true)]
async fn failing_passes_keep_the_loop_alive() {
    let hostnames = StaticHostnames::failing();
    let store = RecordingStore::new();
    let (scheduler, _events) = scheduler(&hostnames, &store);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { scheduler.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(Duration::from_secs(181)).await;
    assert_eq!(hostnames.call_count(), 4);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
