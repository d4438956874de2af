//! Tests for readiness state and the warm-up task

use super::*;
use std::time::Duration;

/// Test ReadinessState basic functionality
#[test]
fn test_readiness_state_transitions() {
    let state = ReadinessState::new();

    // Initially not ready
    assert!(!state.is_ready());

    // After set_ready, should be ready
    state.set_ready();
    assert!(state.is_ready());

    // Clone should share state
    let cloned = state.clone();
    assert!(cloned.is_ready());

    // Setting ready again is a no-op
    cloned.set_ready();
    assert!(state.is_ready());
}

#[test]
fn test_readiness_default_is_not_ready() {
    assert!(!ReadinessState::default().is_ready());
}

/// Not ready for the whole delay, ready from then on
#[tokio::test(start_paused = true)]
async fn test_warmup_flips_after_delay() {
    let readiness = ReadinessState::new();
    let handle = spawn_warmup(readiness.clone(), Duration::from_secs(10));

    tokio::time::sleep(Duration::from_millis(9_999)).await;
    assert!(!readiness.is_ready(), "Should not be ready before the delay");

    tokio::time::sleep(Duration::from_millis(2)).await;
    handle.await.expect("warm-up task");
    assert!(readiness.is_ready(), "Should be ready after the delay");

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!(readiness.is_ready(), "Readiness never reverts");
}

/// Readers during the warm-up never block and never see a torn state
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_see_monotone_transition() {
    let readiness = ReadinessState::new();
    let _warmup = spawn_warmup(readiness.clone(), Duration::from_millis(50));

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let readiness = readiness.clone();
            tokio::spawn(async move {
                let mut seen_ready = false;
                for _ in 0..200 {
                    let now = readiness.is_ready();
                    assert!(!(seen_ready && !now), "Readiness went back to not ready");
                    seen_ready |= now;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            })
        })
        .collect();

    for reader in readers {
        reader.await.expect("reader task");
    }
    assert!(readiness.is_ready());
}
