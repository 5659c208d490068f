use crate::constants::PI;

#[derive(Debug, Clone)]
pub struct Tank {
  pub initial_level: f64,    // initial level of the tank (m)
  pub min_level: f64,        // minimum level of the tank (m)
  pub max_level: f64,        // maximum level of the tank (m)
  pub diameter: f64,         // nominal diameter of the tank (m)
  pub min_volume: f64,       // minimum volume of the tank (m^3)
  pub volume_curve_id: Option<Box<str>>, // id of the volume curve
}

impl Tank {
  /// Volume held between the minimum and maximum level of a cylindrical tank
  pub fn active_volume(&self) -> f64 {
    PI * self.diameter * self.diameter / 4.0 * (self.max_level - self.min_level)
  }
}
