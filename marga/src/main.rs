//! Marga demo - drives a simulated vehicle along a two-lane route
//!
//! Usage: `marga [config.toml]`
//!
//! Configuration comes from the file argument, `marga.toml` in the working
//! directory, or built-in defaults, in that order.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use marga::{
    LaneMap, MargaConfig, Point2D, ReferenceLineProvider, Result, RoutingLane, RoutingResult,
    VehicleState,
};

const ROUTE_LENGTH: f64 = 300.0;
const LANE_SPACING: f64 = 3.5;
const WAYPOINT_SPACING: f64 = 5.0;

const SPEED: f64 = 8.0;
const TICK: Duration = Duration::from_millis(100);
const TICKS: usize = 60;

fn load_config() -> Result<MargaConfig> {
    let args: Vec<String> = std::env::args().collect();

    if let Some(path) = args.get(1) {
        log::info!("Loading configuration from {}", path);
        return MargaConfig::load(Path::new(path));
    }
    if Path::new("marga.toml").exists() {
        log::info!("Loading configuration from marga.toml");
        return MargaConfig::load(Path::new("marga.toml"));
    }
    log::info!("Using default configuration");
    Ok(MargaConfig::default())
}

fn straight_lane(id: &str, y: f64) -> RoutingLane {
    let count = (ROUTE_LENGTH / WAYPOINT_SPACING) as usize;
    RoutingLane::new(
        id,
        (0..=count)
            .map(|i| Point2D::new(i as f64 * WAYPOINT_SPACING, y))
            .collect(),
    )
}

fn demo_route() -> RoutingResult {
    RoutingResult::new(
        1,
        vec![straight_lane("lane_0", 0.0), straight_lane("lane_1", LANE_SPACING)],
    )
}

fn run(config: MargaConfig) -> Result<()> {
    let provider = Arc::new(ReferenceLineProvider::new(config.clone()));
    provider.init(LaneMap::from_config(&config.map))?;
    provider.start()?;

    provider.update_vehicle_state(VehicleState::new(0.0, 0.0, 0.0, SPEED));
    provider.update_routing(&demo_route())?;

    // Vehicle simulation: constant speed along lane 0
    let vehicle = {
        let provider = Arc::clone(&provider);
        thread::Builder::new()
            .name("marga-vehicle".to_string())
            .spawn(move || {
                for tick in 1..=TICKS {
                    let x = SPEED * TICK.as_secs_f64() * tick as f64;
                    let state = VehicleState::new(x, 0.0, 0.0, SPEED)
                        .with_timestamp((tick as u64) * TICK.as_micros() as u64);
                    provider.update_vehicle_state(state);
                    thread::sleep(TICK);
                }
            })?
    };

    for _ in 0..(TICKS / 5) {
        match provider.get_reference_lines_timeout(Duration::from_secs(2)) {
            Ok(lines) => {
                let lane_change = lines.iter().any(|entry| !entry.segment.is_on_segment());
                let lengths: Vec<String> = lines
                    .iter()
                    .map(|entry| format!("{}={:.1}m", entry.segment.id(), entry.line.length()))
                    .collect();
                log::info!(
                    "{} reference lines [{}], lane change offered: {}",
                    lines.len(),
                    lengths.join(", "),
                    lane_change
                );
            }
            Err(e) => log::warn!("No reference lines: {}", e),
        }
        thread::sleep(TICK * 5);
    }

    if vehicle.join().is_err() {
        log::error!("Vehicle simulation thread panicked");
    }

    provider.stop();
    log::info!(
        "Published {} snapshots, tracking {} segments",
        provider.snapshot_sequence(),
        provider.tracked_segment_count()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("marga demo starting...");
    log::info!("  Background thread: {}", config.provider.enable_background_thread);
    log::info!("  Cycle period: {} ms", config.provider.cycle_period_ms);
    log::info!("  Smoothing: {} ({:?})", config.smoothing.enabled, config.smoothing.strategy);

    if let Err(e) = run(config) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }

    log::info!("marga demo finished");
}
