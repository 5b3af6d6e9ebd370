//! Provider integration tests.
//!
//! Exercise the public provider API end to end: synchronous generation,
//! lane-change hysteresis across cycles, routing changes, and the background
//! worker's blocking and shutdown behaviour.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use marga::{
    Error, LaneMap, MargaConfig, ProviderState, ReferenceLineProvider, RouteMap, SmootherKind,
    VehicleState,
};

use common::{
    background_config, init_logging, parallel_routing, running_provider, sync_config,
    two_lane_routing, wait_for,
};

fn segment_ids(lines: &marga::ReferenceLines) -> Vec<String> {
    lines
        .iter()
        .map(|entry| entry.segment.id().to_string())
        .collect()
}

// ============================================================================
// Synchronous generation
// ============================================================================

#[test]
fn test_sync_two_lanes_first_cycle_yields_current_lane_only() {
    init_logging();
    let provider = running_provider(sync_config());
    provider.update_vehicle_state(VehicleState::new(10.0, 0.0, 0.0, 0.0));
    provider.update_routing(&two_lane_routing(1)).unwrap();

    let lines = provider.get_reference_lines().unwrap();
    assert_eq!(lines.len(), 1);

    let entry = &lines[0];
    assert_eq!(entry.segment.id().as_str(), "lane_0");
    assert!(entry.segment.is_on_segment());

    // Smoothing disabled: the line is the raw path
    let raw = LaneMap::build_path(&entry.segment);
    assert_eq!(entry.line.path(), &raw);
    assert_relative_eq!(entry.line.length(), 110.0, epsilon = 1e-9);
}

#[test]
fn test_sync_mode_does_not_block_without_routing() {
    let provider = running_provider(sync_config());

    let started = Instant::now();
    assert!(matches!(
        provider.get_reference_lines(),
        Err(Error::RoutingNotReady)
    ));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(provider.latest().is_none());
}

#[test]
fn test_vehicle_on_second_lane_follows_it() {
    let provider = running_provider(sync_config());
    provider.update_vehicle_state(VehicleState::new(40.0, 3.4, 0.0, 5.0));
    provider.update_routing(&two_lane_routing(1)).unwrap();

    let lines = provider.get_reference_lines().unwrap();
    assert_eq!(segment_ids(&lines), vec!["lane_1"]);
}

// ============================================================================
// Lane-change hysteresis
// ============================================================================

#[test]
fn test_lane_change_offered_after_settling_on_lane() {
    init_logging();
    let provider = running_provider(sync_config());
    provider.update_routing(&two_lane_routing(1)).unwrap();

    // min_length_factor * min_length_for_lane_change = 6 m of travel
    let expected = [(10.0, 1), (12.0, 1), (14.0, 1), (16.0, 2), (18.0, 2)];
    for (x, count) in expected {
        provider.update_vehicle_state(VehicleState::new(x, 0.05, 0.0, 2.0));
        let lines = provider.get_reference_lines().unwrap();
        assert_eq!(lines.len(), count, "at x = {}", x);
    }

    let lines = provider.latest().unwrap();
    assert_eq!(segment_ids(&lines), vec!["lane_0", "lane_1"]);
    assert!(!lines[1].segment.is_on_segment());
}

#[test]
fn test_no_lane_change_while_far_from_center() {
    let provider = running_provider(sync_config());
    provider.update_routing(&two_lane_routing(1)).unwrap();

    for i in 0..20 {
        let x = 10.0 + i as f64 * 5.0;
        provider.update_vehicle_state(VehicleState::new(x, 0.5, 0.0, 5.0));
        let lines = provider.get_reference_lines().unwrap();
        assert_eq!(segment_ids(&lines), vec!["lane_0"]);
    }
}

#[test]
fn test_reckless_prioritized_lane_change_comes_first() {
    let mut config = sync_config();
    config.lane_change.reckless = true;
    config.lane_change.prioritize = true;

    let provider = running_provider(config);
    provider.update_vehicle_state(VehicleState::new(10.0, 0.0, 0.0, 0.0));
    provider.update_routing(&parallel_routing(1, "lane", 3)).unwrap();

    let lines = provider.get_reference_lines().unwrap();
    // Only the first alternative moves to the front
    assert_eq!(segment_ids(&lines), vec!["lane_1", "lane_0", "lane_2"]);
    assert_eq!(provider.tracked_segment_count(), 0);
}

// ============================================================================
// Routing updates
// ============================================================================

#[test]
fn test_routing_change_clears_history_same_route_keeps_it() {
    let provider = running_provider(sync_config());
    provider.update_vehicle_state(VehicleState::new(10.0, 0.0, 0.0, 0.0));
    provider.update_routing(&two_lane_routing(1)).unwrap();
    provider.get_reference_lines().unwrap();
    assert_eq!(provider.tracked_segment_count(), 1);

    provider.update_routing(&two_lane_routing(2)).unwrap();
    assert_eq!(provider.tracked_segment_count(), 1);

    // Evidence carried over: 6 m later the lane change is offered
    provider.update_vehicle_state(VehicleState::new(16.0, 0.0, 0.0, 0.0));
    assert_eq!(provider.get_reference_lines().unwrap().len(), 2);

    provider.update_routing(&parallel_routing(3, "detour", 2)).unwrap();
    assert_eq!(provider.tracked_segment_count(), 0);
    assert_eq!(provider.get_reference_lines().unwrap().len(), 1);
}

#[test]
fn test_rejected_routing_keeps_previous_route() {
    let provider = running_provider(sync_config());
    provider.update_routing(&two_lane_routing(1)).unwrap();

    let result = provider.update_routing(&marga::RoutingResult::default());
    assert!(matches!(result, Err(Error::Adapter(_))));
    assert_eq!(provider.get_reference_lines().unwrap().len(), 1);
}

fn routing_with_nan_waypoint(sequence: u64) -> marga::RoutingResult {
    marga::RoutingResult::new(
        sequence,
        vec![marga::RoutingLane::new(
            "broken",
            vec![
                marga::Point2D::new(0.0, 0.0),
                marga::Point2D::new(f64::NAN, 0.0),
                marga::Point2D::new(100.0, 0.0),
            ],
        )],
    )
}

#[test]
fn test_sync_non_finite_lane_is_rejected() {
    let provider = running_provider(sync_config());
    provider.update_routing(&two_lane_routing(1)).unwrap();

    let result = provider.update_routing(&routing_with_nan_waypoint(2));
    assert!(matches!(result, Err(Error::Adapter(_))));
    assert_eq!(segment_ids(&provider.get_reference_lines().unwrap()), vec!["lane_0"]);
}

#[test]
fn test_background_worker_survives_non_finite_lane() {
    init_logging();
    let provider = running_provider(background_config(5));

    let result = provider.update_routing(&routing_with_nan_waypoint(1));
    assert!(matches!(result, Err(Error::Adapter(_))));
    thread::sleep(Duration::from_millis(30));

    provider.update_routing(&two_lane_routing(2)).unwrap();
    let lines = provider
        .get_reference_lines_timeout(Duration::from_secs(2))
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert!(provider.snapshot_sequence() > 0);
    assert_eq!(provider.state(), ProviderState::Running);

    provider.stop();
}

// ============================================================================
// Smoothing strategies
// ============================================================================

#[test]
fn test_smoothed_lines_keep_endpoints() {
    let mut config = sync_config();
    config.smoothing.enabled = true;
    config.smoothing.strategy = SmootherKind::Midpoint;

    let provider = running_provider(config);
    provider.update_routing(&two_lane_routing(1)).unwrap();

    let lines = provider.get_reference_lines().unwrap();
    let entry = &lines[0];
    let raw = entry.segment.waypoints();
    let smoothed = entry.line.points();

    assert_eq!(raw.first(), smoothed.first());
    assert_eq!(raw.last(), smoothed.last());
}

#[test]
fn test_corner_cutting_strategy_refines_line() {
    let mut config = sync_config();
    config.smoothing.enabled = true;
    config.smoothing.strategy = SmootherKind::CornerCutting;

    let provider = running_provider(config);
    provider.update_vehicle_state(VehicleState::new(50.0, 0.0, 0.0, 0.0));
    provider.update_routing(&two_lane_routing(1)).unwrap();

    let lines = provider.get_reference_lines().unwrap();
    let entry = &lines[0];
    assert!(entry.line.points().len() > entry.segment.waypoints().len());
    assert_relative_eq!(
        entry.line.length(),
        LaneMap::build_path(&entry.segment).length(),
        epsilon = 1e-6
    );
}

#[test]
fn test_config_file_drives_provider() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[provider]\nenable_background_thread = false\n\n[lane_change]\nreckless = true"
    )
    .unwrap();
    let config = MargaConfig::load(file.path()).unwrap();

    let provider = running_provider(config);
    provider.update_routing(&two_lane_routing(1)).unwrap();
    assert_eq!(provider.get_reference_lines().unwrap().len(), 2);
}

// ============================================================================
// Background worker
// ============================================================================

#[test]
fn test_background_get_blocks_until_first_snapshot() {
    init_logging();
    let provider = Arc::new(running_provider(background_config(10)));
    let (tx, rx) = mpsc::channel();

    let reader = {
        let provider = Arc::clone(&provider);
        thread::spawn(move || {
            let result = provider.get_reference_lines().map(|lines| lines.len());
            tx.send(result).ok();
        })
    };

    // No routing yet: the worker skips cycles and the reader stays blocked
    assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
    assert_eq!(provider.snapshot_sequence(), 0);

    provider.update_vehicle_state(VehicleState::new(10.0, 0.0, 0.0, 3.0));
    provider.update_routing(&two_lane_routing(1)).unwrap();

    let count = rx.recv_timeout(Duration::from_secs(2)).unwrap().unwrap();
    assert_eq!(count, 1);
    reader.join().unwrap();

    provider.stop();
}

#[test]
fn test_background_worker_publishes_periodically() {
    let provider = running_provider(background_config(10));
    provider.update_routing(&two_lane_routing(1)).unwrap();

    assert!(wait_for(Duration::from_secs(2), || {
        provider.snapshot_sequence() >= 3
    }));
    provider.stop();
}

#[test]
fn test_stop_releases_blocked_reader() {
    let provider = Arc::new(running_provider(background_config(10)));
    let (tx, rx) = mpsc::channel();

    let reader = {
        let provider = Arc::clone(&provider);
        thread::spawn(move || {
            tx.send(provider.get_reference_lines().map(|lines| lines.len()))
                .ok();
        })
    };
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    provider.stop();
    let result = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(matches!(
        result,
        Err(Error::InvalidState {
            state: ProviderState::Stopped,
            ..
        })
    ));
    reader.join().unwrap();
}

#[test]
fn test_stop_wakes_worker_without_waiting_out_period() {
    let provider = running_provider(background_config(5_000));
    thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    provider.stop();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(provider.state(), ProviderState::Stopped);
}

#[test]
fn test_drop_without_stop_joins_worker() {
    let started = Instant::now();
    {
        let provider = running_provider(background_config(5_000));
        provider.update_routing(&two_lane_routing(1)).unwrap();
        thread::sleep(Duration::from_millis(20));
    }
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_no_publication_after_stop_under_update_stress() {
    init_logging();
    let provider = Arc::new(running_provider(background_config(2)));
    provider.update_routing(&two_lane_routing(1)).unwrap();
    assert!(wait_for(Duration::from_secs(2), || {
        provider.snapshot_sequence() >= 3
    }));

    let running = Arc::new(AtomicBool::new(true));
    let updaters: Vec<_> = (0..4)
        .map(|t| {
            let provider = Arc::clone(&provider);
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let mut i = 0u64;
                while running.load(Ordering::Relaxed) {
                    let x = 10.0 + (i % 100) as f64;
                    provider.update_vehicle_state(VehicleState::new(x, 0.0, 0.0, 4.0));
                    if t == 0 {
                        provider.update_routing(&two_lane_routing(i + 2)).unwrap();
                    }
                    i += 1;
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(30));
    provider.stop();
    let sequence = provider.snapshot_sequence();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(provider.snapshot_sequence(), sequence);

    running.store(false, Ordering::Relaxed);
    for updater in updaters {
        updater.join().unwrap();
    }
    assert_eq!(provider.snapshot_sequence(), sequence);
}

#[test]
fn test_reinit_after_stop_starts_fresh() {
    let provider = running_provider(sync_config());
    provider.update_routing(&two_lane_routing(1)).unwrap();
    provider.get_reference_lines().unwrap();
    provider.stop();

    provider.init(LaneMap::default()).unwrap();
    assert_eq!(provider.state(), ProviderState::Initialized);
    assert!(provider.latest().is_none());
    assert_eq!(provider.tracked_segment_count(), 0);
    assert!(matches!(
        provider.get_reference_lines(),
        Err(Error::RoutingNotReady)
    ));

    provider.start().unwrap();
    provider.update_routing(&two_lane_routing(1)).unwrap();
    provider.get_reference_lines().unwrap();
    assert_eq!(provider.snapshot_sequence(), 2);
}

#[test]
fn test_provider_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReferenceLineProvider<LaneMap>>();
}
