use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast;

use studio_bridge_protocol::InvocationId;

use super::sweeper::{spawn_sweep_loop, sweep_pass};
use super::*;

fn bridge_with_timeout(ms: u64) -> RequestBridge {
    RequestBridge::with_timeout(Duration::from_millis(ms))
}

#[tokio::test(start_paused = true)]
async fn test_submit_then_complete() {
    let bridge = RequestBridge::new();
    let handle = bridge.submit("/api/place-info", json!({})).unwrap();
    let id = handle.id();

    assert_eq!(bridge.len(), 1);
    assert!(bridge.complete(id, json!({"name": "MyGame"})));
    assert_eq!(handle.await.unwrap(), json!({"name": "MyGame"}));
    assert!(bridge.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_ids_are_unique() {
    let bridge = RequestBridge::new();
    let mut seen = HashSet::new();
    let mut handles = Vec::new();

    for _ in 0..100 {
        let handle = bridge.submit("/api/selection", json!({})).unwrap();
        assert!(seen.insert(handle.id()));
        handles.push(handle);
    }
    assert_eq!(bridge.len(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_peek_returns_oldest_until_settled() {
    let bridge = RequestBridge::new();
    let a = bridge.submit("/api/place-info", json!({})).unwrap();
    tokio::time::advance(Duration::from_millis(10)).await;
    let b = bridge.submit("/api/services", json!({"serviceName": "Workspace"})).unwrap();

    for _ in 0..3 {
        let oldest = bridge.peek_oldest().unwrap();
        assert_eq!(oldest.id, a.id());
        assert_eq!(oldest.endpoint, "/api/place-info");
    }

    assert!(bridge.complete(a.id(), json!(null)));
    let next = bridge.peek_oldest().unwrap();
    assert_eq!(next.id, b.id());
    assert_eq!(next.payload, json!({"serviceName": "Workspace"}));
}

#[tokio::test(start_paused = true)]
async fn test_same_instant_breaks_tie_by_submission_order() {
    let bridge = RequestBridge::new();
    let first = bridge.submit("/api/file-tree", json!({})).unwrap();
    let second = bridge.submit("/api/file-tree", json!({})).unwrap();

    assert_eq!(bridge.peek_oldest().unwrap().id, first.id());
    assert!(bridge.complete(first.id(), json!([])));
    assert_eq!(bridge.peek_oldest().unwrap().id, second.id());
}

#[tokio::test(start_paused = true)]
async fn test_peek_on_empty_table() {
    let bridge = RequestBridge::new();
    assert!(bridge.peek_oldest().is_none());
    assert_eq!(bridge.stats().polls, 1);
}

#[tokio::test(start_paused = true)]
async fn test_fail_settles_remote_error() {
    let bridge = RequestBridge::new();
    let handle = bridge.submit("/api/file-content", json!({"path": "x"})).unwrap();

    assert!(bridge.fail(handle.id(), json!("Script not found")));
    match handle.await {
        Err(BridgeError::RemoteExecution { message, .. }) => {
            assert_eq!(message, "Script not found");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(bridge.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_late_complete_is_noop() {
    let bridge = RequestBridge::new();
    let handle = bridge.submit("/api/place-info", json!({})).unwrap();
    let other = bridge.submit("/api/selection", json!({})).unwrap();
    let id = handle.id();

    assert!(bridge.complete(id, json!({"name": "MyGame"})));
    assert!(!bridge.complete(id, json!({"name": "Other"})));
    assert!(!bridge.fail(id, json!("late")));

    assert_eq!(handle.await.unwrap(), json!({"name": "MyGame"}));
    assert_eq!(bridge.len(), 1);
    assert_eq!(bridge.peek_oldest().unwrap().id, other.id());
    assert_eq!(bridge.stats().completed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_id_is_noop() {
    let bridge = RequestBridge::new();
    let _handle = bridge.submit("/api/place-info", json!({})).unwrap();

    assert!(!bridge.complete(InvocationId::new(), json!({})));
    assert!(!bridge.fail(InvocationId::new(), json!("x")));
    assert_eq!(bridge.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timer_expires_invocation() {
    let bridge = bridge_with_timeout(1_000);
    let handle = bridge.submit("/api/place-info", json!({})).unwrap();
    let id = handle.id();

    let started = tokio::time::Instant::now();
    let outcome = handle.await;

    assert_eq!(outcome, Err(BridgeError::Timeout { timeout_ms: 1_000 }));
    assert!(started.elapsed() >= Duration::from_millis(1_000));
    assert!(bridge.is_empty());
    assert!(!bridge.complete(id, json!({})));
    assert_eq!(bridge.stats().timed_out, 1);
}

#[tokio::test(start_paused = true)]
async fn test_not_due_before_timeout() {
    let bridge = bridge_with_timeout(1_000);
    let handle = bridge.submit("/api/place-info", json!({})).unwrap();

    tokio::time::advance(Duration::from_millis(999)).await;
    assert!(!bridge.expire_if_due(handle.id()));
    assert_eq!(bridge.sweep(), 0);
    assert_eq!(bridge.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sweep_and_timer_settle_once() {
    let bridge = bridge_with_timeout(500);
    let handle = bridge.submit("/api/selection", json!({})).unwrap();

    tokio::time::advance(Duration::from_millis(500)).await;
    // Whichever path ran first, the other found nothing to do
    bridge.sweep();
    tokio::task::yield_now().await;

    assert_eq!(handle.await, Err(BridgeError::Timeout { timeout_ms: 500 }));
    assert_eq!(bridge.stats().timed_out, 1);
    assert!(bridge.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_completion_beats_timer() {
    let bridge = bridge_with_timeout(1_000);
    let handle = bridge.submit("/api/place-info", json!({})).unwrap();
    let id = handle.id();

    tokio::time::advance(Duration::from_millis(400)).await;
    assert!(bridge.complete(id, json!(42)));
    tokio::time::advance(Duration::from_millis(1_000)).await;

    assert_eq!(handle.await.unwrap(), json!(42));
    assert_eq!(bridge.stats().timed_out, 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_pending() {
    let bridge = RequestBridge::new();
    let a = bridge.submit("/api/place-info", json!({})).unwrap();
    let b = bridge.submit("/api/selection", json!({})).unwrap();

    assert_eq!(bridge.close(), 2);
    assert_eq!(a.await, Err(BridgeError::Cancelled));
    assert_eq!(b.await, Err(BridgeError::Cancelled));
    assert!(bridge.is_closed());
    assert!(bridge.is_empty());

    match bridge.submit("/api/place-info", json!({})) {
        Err(BridgeError::TransportFailure(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(bridge.close(), 0);
    assert_eq!(bridge.stats().cancelled, 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_bridge_cancels_handles() {
    let bridge = RequestBridge::new();
    let handle = bridge.submit("/api/place-info", json!({})).unwrap();
    drop(bridge);

    assert_eq!(handle.await, Err(BridgeError::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_handle_still_settles() {
    let bridge = RequestBridge::new();
    let handle = bridge.submit("/api/place-info", json!({})).unwrap();
    let id = handle.id();
    drop(handle);

    assert!(bridge.complete(id, json!({})));
    assert!(bridge.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stats_counts_outcomes() {
    let bridge = bridge_with_timeout(100);
    let ok = bridge.submit("/api/a", json!({})).unwrap();
    let bad = bridge.submit("/api/b", json!({})).unwrap();
    let slow = bridge.submit("/api/c", json!({})).unwrap();

    bridge.complete(ok.id(), json!(1));
    bridge.fail(bad.id(), json!("no"));
    let _ = slow.await;

    let stats = bridge.stats();
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.timed_out, 1);
    assert_eq!(stats.pending, 0);
}

#[test]
fn test_sweep_without_runtime_timers() {
    // Outside a runtime no timer is armed, so only the sweep can expire
    let bridge = RequestBridge::with_timeout(Duration::ZERO);
    let handle = bridge.submit("/api/place-info", json!({})).unwrap();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async {
        assert_eq!(bridge.len(), 1);
        assert_eq!(bridge.sweep(), 1);
        assert_eq!(handle.await, Err(BridgeError::Timeout { timeout_ms: 0 }));
    });
}

#[test]
fn test_sweeper_loop_expires_and_stops() {
    let bridge = RequestBridge::with_timeout(Duration::ZERO);
    let handle = bridge.submit("/api/selection", json!({})).unwrap();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let sweeper = spawn_sweeper(bridge.clone(), Duration::from_millis(10), shutdown_rx);

        assert_eq!(handle.await, Err(BridgeError::Timeout { timeout_ms: 0 }));

        shutdown_tx.send(()).unwrap();
        sweeper.await.unwrap();
    });
}

#[tokio::test(start_paused = true)]
async fn test_sweep_pass_reports_count() {
    let bridge = bridge_with_timeout(1_000);
    assert_eq!(sweep_pass(&bridge).await, 0);
}

#[test]
fn test_sweeper_survives_panicking_pass() {
    let bridge = RequestBridge::with_timeout(Duration::ZERO);
    let handle = bridge.submit("/api/selection", json!({})).unwrap();
    let passes = Arc::new(AtomicUsize::new(0));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let sweeper = {
            let bridge = bridge.clone();
            let passes = Arc::clone(&passes);
            spawn_sweep_loop(Duration::from_millis(10), shutdown_rx, move || {
                if passes.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("first sweep pass blows up");
                }
                bridge.sweep()
            })
        };

        assert_eq!(handle.await, Err(BridgeError::Timeout { timeout_ms: 0 }));
        assert!(passes.load(Ordering::SeqCst) >= 2);

        shutdown_tx.send(()).unwrap();
        sweeper.await.unwrap();
    });
}

#[tokio::test(start_paused = true)]
async fn test_sweep_pass_expires_due_invocation() {
    let bridge = bridge_with_timeout(1_000);
    let handle = bridge.submit("/api/selection", json!({})).unwrap();

    tokio::time::advance(Duration::from_millis(1_000)).await;
    // The armed timer and the pass race; exactly one of them settles
    let expired = sweep_pass(&bridge).await;
    assert!(expired <= 1);
    assert_eq!(handle.await, Err(BridgeError::Timeout { timeout_ms: 1_000 }));
    assert_eq!(bridge.stats().timed_out, 1);
}
