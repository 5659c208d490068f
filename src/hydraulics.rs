//! Closed-form sizing of the synthetic elements that reproduce a pressure-dependent withdrawal.
//!
//! Demands are in m^3/s, heads and lengths in m, durations in minutes.

use crate::constants::*;
use crate::error::ConvertError;

/// Minimum pressure (no withdrawal) and desired pressure (full withdrawal), in m
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureRange {
  pub hmin: f64,
  pub hdes: f64,
}

impl PressureRange {
  pub fn new(hmin: f64, hdes: f64) -> Result<Self, ConvertError> {
    if !hmin.is_finite() || !hdes.is_finite() || hmin < 0.0 || hdes < hmin {
      return Err(ConvertError::InvalidPressureRange { hmin, hdes });
    }
    Ok(Self { hmin, hdes })
  }

  /// Hdes - Hmin
  pub fn differential(&self) -> f64 {
    self.hdes - self.hmin
  }

  /// The differential, for methods that divide by it
  pub fn require_differential(&self, method: &'static str) -> Result<f64, ConvertError> {
    let dh = self.differential();
    if dh > 0.0 { Ok(dh) } else { Err(ConvertError::ZeroPressureDifferential { method }) }
  }
}

/// Reject demands that cannot be sized
pub fn checked_demand(node: &str, demand: f64) -> Result<f64, ConvertError> {
  if demand.is_finite() && demand > 0.0 {
    Ok(demand)
  } else {
    Err(ConvertError::InvalidDemand { node: node.into(), demand })
  }
}

/// Volume a consumer should collect over the supply period (m^3)
pub fn desired_volume(demand: f64, duration_minutes: f64) -> f64 {
  demand * SECONDS_PER_MINUTE * duration_minutes
}

/// Diameter of a cylinder of unit height holding `volume`
pub fn unit_height_diameter(volume: f64) -> f64 {
  round_to((4.0 * volume / (PI * UNIT_HEIGHT)).sqrt(), DECIMALS)
}

/// Length of the 50 mm, C = 130 pipe that loses `dh` when carrying `demand` (Hazen-Williams)
pub fn headloss_pipe_length(demand: f64, dh: f64) -> f64 {
  let length = dh * HEADLOSS_PIPE_ROUGHNESS.powf(H_EXPONENT) * HEADLOSS_PIPE_DIAMETER.powf(HW_DIAMETER_EXPONENT)
    / (HW_CONSTANT * demand.powf(H_EXPONENT));
  round_to(length, DECIMALS)
}

/// Flow through a Hazen-Williams pipe losing `dh`, the inverse of [`headloss_pipe_length`]
pub fn headloss_pipe_flow(length: f64, diameter: f64, roughness: f64, dh: f64) -> f64 {
  if length <= 0.0 || dh <= 0.0 {
    return 0.0;
  }
  (dh * roughness.powf(H_EXPONENT) * diameter.powf(HW_DIAMETER_EXPONENT) / (HW_CONSTANT * length)).powf(1.0 / H_EXPONENT)
}

/// Minor-loss coefficient of the 350 mm pipe that loses `dh` when carrying `demand`
pub fn minor_loss_coefficient(demand: f64, dh: f64) -> f64 {
  dh * GRAVITY * PI.powi(2) * MINOR_LOSS_PIPE_DIAMETER.powi(4) / (8.0 * demand.powi(2))
}

/// Emitter coefficient delivering `flow` (in the file's flow units) at pressure `dh`
pub fn emitter_coefficient(flow: f64, dh: f64) -> f64 {
  flow / dh.powf(EMITTER_EXPONENT)
}

/// Rating curve (depth, flow) of an outlet delivering `flow` at `hdes` and nothing below `hmin`.
///
/// Depths run from 0 to 10 m in 1 m steps; depths under `hmin` deliver no flow.
pub fn rating_curve(flow: f64, range: &PressureRange) -> Vec<(f64, f64)> {
  let dh = range.differential();
  (0..=RATING_CURVE_MAX_DEPTH)
    .map(|depth| {
      let depth = depth as f64;
      let head = (depth - range.hmin).max(0.0);
      let q = if dh > 0.0 { flow * (head / dh).sqrt() } else { 0.0 };
      (depth, q)
    })
    .collect()
}
