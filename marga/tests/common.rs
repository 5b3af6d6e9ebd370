//! Test fixtures for provider integration tests.
//!
//! Straight parallel lanes, providers in both modes, and polling helpers.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use marga::{LaneMap, MargaConfig, Point2D, ReferenceLineProvider, RoutingLane, RoutingResult};

/// Lateral distance between neighbouring lanes (meters).
pub const LANE_SPACING: f64 = 3.5;

/// Install a test logger once per binary.
pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Straight lane along +X at height `y`, one waypoint every 10 m.
pub fn straight_lane(id: &str, y: f64, length: f64) -> RoutingLane {
    let count = (length / 10.0) as usize;
    RoutingLane::new(
        id,
        (0..=count).map(|i| Point2D::new(i as f64 * 10.0, y)).collect(),
    )
}

/// `lanes` parallel 300 m lanes named `{prefix}_0`, `{prefix}_1`, ...
pub fn parallel_routing(sequence: u64, prefix: &str, lanes: usize) -> RoutingResult {
    RoutingResult::new(
        sequence,
        (0..lanes)
            .map(|i| straight_lane(&format!("{prefix}_{i}"), i as f64 * LANE_SPACING, 300.0))
            .collect(),
    )
}

/// Two-lane route `lane_0` (y = 0) and `lane_1` (y = 3.5).
pub fn two_lane_routing(sequence: u64) -> RoutingResult {
    parallel_routing(sequence, "lane", 2)
}

/// Synchronous-mode configuration without smoothing.
pub fn sync_config() -> MargaConfig {
    let mut config = MargaConfig::default();
    config.provider.enable_background_thread = false;
    config.smoothing.enabled = false;
    config
}

/// Background-mode configuration with a short cycle period.
pub fn background_config(cycle_period_ms: u64) -> MargaConfig {
    let mut config = MargaConfig::default();
    config.provider.enable_background_thread = true;
    config.provider.cycle_period_ms = cycle_period_ms;
    config
}

/// Initialized and started provider.
pub fn running_provider(config: MargaConfig) -> ReferenceLineProvider<LaneMap> {
    let provider = ReferenceLineProvider::new(config);
    provider.init(LaneMap::default()).unwrap();
    provider.start().unwrap();
    provider
}

/// Poll `condition` until it holds or `timeout` expires.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
