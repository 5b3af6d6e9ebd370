//! Configuration loading for Marga

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MargaConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub lane_change: LaneChangeConfig,
    #[serde(default)]
    pub look_ahead: LookAheadConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub map: MapConfig,
}

impl MargaConfig {
    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Background generation settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Run generation on a background thread (default: true).
    /// When false, `get_reference_lines` generates synchronously.
    #[serde(default = "default_enable_background_thread")]
    pub enable_background_thread: bool,

    /// Background cycle period in milliseconds (default: 200)
    #[serde(default = "default_cycle_period_ms")]
    pub cycle_period_ms: u64,
}

impl ProviderConfig {
    /// Cycle period as a duration.
    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle_period_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enable_background_thread: default_enable_background_thread(),
            cycle_period_ms: default_cycle_period_ms(),
        }
    }
}

/// Lane-change eligibility settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LaneChangeConfig {
    /// Always allow lane change, ignoring history (default: false)
    #[serde(default)]
    pub reckless: bool,

    /// Move the first alternative-lane segment to the front (default: false)
    #[serde(default)]
    pub prioritize: bool,

    /// Minimum travel distance for a lane change in meters (default: 10.0)
    #[serde(default = "default_min_length_for_lane_change")]
    pub min_length_for_lane_change: f64,

    /// Vehicle must have come this close to the lane center (meters, default: 0.25)
    #[serde(default = "default_near_centerline_l")]
    pub near_centerline_l: f64,

    /// Fraction of `min_length_for_lane_change` that must be traveled (default: 0.6)
    #[serde(default = "default_min_length_factor")]
    pub min_length_factor: f64,
}

impl Default for LaneChangeConfig {
    fn default() -> Self {
        Self {
            reckless: false,
            prioritize: false,
            min_length_for_lane_change: default_min_length_for_lane_change(),
            near_centerline_l: default_near_centerline_l(),
            min_length_factor: default_min_length_factor(),
        }
    }
}

/// Segment extraction window
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LookAheadConfig {
    /// Distance behind the vehicle in meters (default: 30.0)
    #[serde(default = "default_look_backward_distance")]
    pub look_backward_distance: f64,

    /// Forward distance when driving fast in meters (default: 250.0)
    #[serde(default = "default_look_forward_distance")]
    pub look_forward_distance: f64,

    /// Forward distance otherwise in meters (default: 100.0)
    #[serde(default = "default_look_forward_min_distance")]
    pub look_forward_min_distance: f64,

    /// Look-ahead time used to pick the forward distance in seconds (default: 8.0)
    #[serde(default = "default_look_forward_time_sec")]
    pub look_forward_time_sec: f64,
}

impl LookAheadConfig {
    /// Forward extraction distance for the given speed.
    pub fn look_forward(&self, linear_velocity: f64) -> f64 {
        if linear_velocity * self.look_forward_time_sec > self.look_forward_min_distance {
            self.look_forward_distance
        } else {
            self.look_forward_min_distance
        }
    }
}

impl Default for LookAheadConfig {
    fn default() -> Self {
        Self {
            look_backward_distance: default_look_backward_distance(),
            look_forward_distance: default_look_forward_distance(),
            look_forward_min_distance: default_look_forward_min_distance(),
            look_forward_time_sec: default_look_forward_time_sec(),
        }
    }
}

/// Smoothing strategy selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SmootherKind {
    /// Weighted midpoint relaxation
    #[default]
    Midpoint,
    /// Chaikin corner cutting with a deviation bound
    CornerCutting,
}

/// Smoothing settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SmoothingConfig {
    /// Smooth segments before publishing (default: true)
    #[serde(default = "default_smoothing_enabled")]
    pub enabled: bool,

    /// Strategy (default: midpoint)
    #[serde(default)]
    pub strategy: SmootherKind,

    /// Maximum relaxation iterations (default: 200)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Pull towards the raw waypoint (default: 0.5)
    #[serde(default = "default_weight_data")]
    pub weight_data: f64,

    /// Pull towards the neighbour midpoint (default: 0.1)
    #[serde(default = "default_weight_smooth")]
    pub weight_smooth: f64,

    /// Convergence tolerance on total squared change (default: 1e-6)
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Corner-cutting rounds (default: 3)
    #[serde(default = "default_corner_cutting_rounds")]
    pub corner_cutting_rounds: usize,

    /// Corner-cutting deviation bound in meters (default: 0.1)
    #[serde(default = "default_max_deviation")]
    pub max_deviation: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: default_smoothing_enabled(),
            strategy: SmootherKind::default(),
            max_iterations: default_max_iterations(),
            weight_data: default_weight_data(),
            weight_smooth: default_weight_smooth(),
            tolerance: default_tolerance(),
            corner_cutting_rounds: default_corner_cutting_rounds(),
            max_deviation: default_max_deviation(),
        }
    }
}

/// Lane map settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MapConfig {
    /// Half lane width in meters (default: 1.75)
    #[serde(default = "default_lane_half_width")]
    pub lane_half_width: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            lane_half_width: default_lane_half_width(),
        }
    }
}

// Default value functions
fn default_enable_background_thread() -> bool {
    true
}
fn default_cycle_period_ms() -> u64 {
    200
}

// Lane change defaults
fn default_min_length_for_lane_change() -> f64 {
    10.0
}
fn default_near_centerline_l() -> f64 {
    0.25
}
fn default_min_length_factor() -> f64 {
    0.6
}

// Look-ahead defaults
fn default_look_backward_distance() -> f64 {
    30.0
}
fn default_look_forward_distance() -> f64 {
    250.0
}
fn default_look_forward_min_distance() -> f64 {
    100.0
}
fn default_look_forward_time_sec() -> f64 {
    8.0
}

// Smoothing defaults
fn default_smoothing_enabled() -> bool {
    true
}
fn default_max_iterations() -> usize {
    200
}
fn default_weight_data() -> f64 {
    0.5
}
fn default_weight_smooth() -> f64 {
    0.1
}
fn default_tolerance() -> f64 {
    1e-6
}
fn default_corner_cutting_rounds() -> usize {
    3
}
fn default_max_deviation() -> f64 {
    0.1
}

fn default_lane_half_width() -> f64 {
    1.75
}
