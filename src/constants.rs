pub const PI: f64 = std::f64::consts::PI;
pub const GRAVITY: f64 = 9.81; // m/s^2

// Hazen-Williams head loss: h = 10.67 L Q^1.852 / (C^1.852 D^4.87)
pub const HW_CONSTANT: f64 = 10.67;
pub const H_EXPONENT: f64 = 1.852;
pub const HW_DIAMETER_EXPONENT: f64 = 4.87;

pub const LPS_PER_CMS: f64 = 1000.0;
pub const MM_PER_M: f64 = 1000.0;
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Synthetic pipe that dissipates the pressure differential through friction
pub const HEADLOSS_PIPE_DIAMETER: f64 = 0.05; // m
pub const HEADLOSS_PIPE_ROUGHNESS: f64 = 130.0;

/// Synthetic pipe that dissipates the pressure differential through a minor loss
pub const MINOR_LOSS_PIPE_DIAMETER: f64 = 0.35; // m
pub const MINOR_LOSS_PIPE_LENGTH: f64 = 0.1; // m
pub const MINOR_LOSS_PIPE_ROUGHNESS: f64 = 130.0;

/// Flow-control valves are sized small, the setting governs their behaviour
pub const VALVE_DIAMETER: f64 = 12.0; // mm

/// Unit-height storage used by the tank and storage methods
pub const UNIT_HEIGHT: f64 = 1.0; // m

pub const EMITTER_EXPONENT: f64 = 0.5;
pub const DECIMALS: usize = 4;

/// SWMM conversions
pub const MANNING_ROUGHNESS: f64 = 0.011;
pub const DEFAULT_MAX_SEGMENT_LENGTH: f64 = 100.0; // m
pub const RATING_CURVE_MAX_DEPTH: usize = 10; // m
pub const MIN_STORAGE_DEPTH: f64 = 100.0; // m
pub const RESERVOIR_DEPTH_MARGIN: f64 = 10.0; // m
pub const RESERVOIR_STORAGE_DROP: f64 = 30.0; // m
pub const DUMMY_OUTLET_COEFFICIENT: f64 = 0.00001;

/// Round to a fixed number of decimals the way values are written to model files
pub fn round_to(value: f64, decimals: usize) -> f64 {
  let factor = 10.0_f64.powi(decimals as i32);
  (value * factor).round() / factor
}
