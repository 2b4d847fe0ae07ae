use super::*;
use crate::clock::ManualClock;

use std::sync::Arc;
use std::time::Duration;


/// Registry driven by a manual clock so elapsed times are exact.
fn manual_registry() -> (TimingRegistry, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let registry = TimingRegistry::new().with_clock(clock.clone());
    (registry, clock)
}

fn assert_ms_eq(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected} ms, got {actual} ms"
    );
}

#[test]
fn test_start_stop_measures_exact_elapsed() {
    let (mut registry, clock) = manual_registry();

    registry.start("db");
    clock.advance(Duration::from_millis(5));
    let elapsed = registry.stop("db").unwrap();

    assert_ms_eq(elapsed, 5.0);
}

#[test]
fn test_stop_preserves_sub_millisecond_precision() {
    let (mut registry, clock) = manual_registry();

    registry.start("cache");
    clock.advance(Duration::from_micros(250));
    let elapsed = registry.stop("cache").unwrap();

    assert_ms_eq(elapsed, 0.25);
}

#[test]
fn test_elapsed_is_non_negative_with_system_clock() {
    let mut registry = TimingRegistry::new();
    registry.start("noop");
    let elapsed = registry.stop("noop").unwrap();
    assert!(elapsed >= 0.0);
}

#[test]
fn test_accumulator_sums_completed_pairs() {
    let (mut registry, clock) = manual_registry();

    for ms in [2u64, 3, 4] {
        registry.start("render");
        clock.advance(Duration::from_millis(ms));
        registry.stop("render").unwrap();
    }

    let stats = registry.stats("render").unwrap();
    assert_eq!(stats.calls, 3);
    assert_ms_eq(stats.total_ms(), 9.0);
}

#[test]
fn test_stop_without_start_fails_loudly() {
    let (mut registry, _clock) = manual_registry();

    let err = registry.stop("never_started").unwrap_err();
    assert!(matches!(err, TimingError::TimerNotRunning(name) if name == "never_started"));
}

#[test]
fn test_unmatched_stop_does_not_mutate_accumulators() {
    let (mut registry, clock) = manual_registry();

    registry.start("db");
    clock.advance(Duration::from_millis(1));
    registry.stop("db").unwrap();

    assert!(registry.stop("db").is_err());

    let stats = registry.stats("db").unwrap();
    assert_eq!(stats.calls, 1);
    assert_ms_eq(stats.total_ms(), 1.0);
}

#[test]
fn test_restart_discards_earlier_pending_start() {
    let (mut registry, clock) = manual_registry();

    registry.start("fetch");
    clock.advance(Duration::from_millis(10));
    // Last start wins.
    registry.start("fetch");
    clock.advance(Duration::from_millis(5));
    let elapsed = registry.stop("fetch").unwrap();

    assert_ms_eq(elapsed, 5.0);
    let stats = registry.stats("fetch").unwrap();
    assert_eq!(stats.calls, 1);
}

#[test]
fn test_is_running_follows_timer_lifecycle() {
    let (mut registry, _clock) = manual_registry();

    assert!(!registry.is_running("db"));
    registry.start("db");
    assert!(registry.is_running("db"));
    registry.stop("db").unwrap();
    assert!(!registry.is_running("db"));
}

#[test]
fn test_first_start_survives_later_cycles() {
    let (mut registry, clock) = manual_registry();

    let first = clock.now();
    registry.start("db");
    clock.advance(Duration::from_millis(1));
    registry.stop("db").unwrap();

    clock.advance(Duration::from_millis(100));
    registry.start("db");
    clock.advance(Duration::from_millis(1));
    registry.stop("db").unwrap();

    assert_eq!(registry.stats("db").unwrap().first_start, first);
}

#[test]
fn test_stats_unknown_metric_is_none() {
    let (registry, _clock) = manual_registry();
    assert!(registry.stats("unknown").is_none());
}

#[test]
fn test_metrics_are_tracked_independently() {
    let (mut registry, clock) = manual_registry();

    registry.start("outer");
    clock.advance(Duration::from_millis(2));
    registry.start("inner");
    clock.advance(Duration::from_millis(3));
    let inner = registry.stop("inner").unwrap();
    clock.advance(Duration::from_millis(1));
    let outer = registry.stop("outer").unwrap();

    assert_ms_eq(inner, 3.0);
    assert_ms_eq(outer, 6.0);
}
