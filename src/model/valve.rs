use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveType {
  PRV, // Pressure Reducing Valve
  PSV, // Pressure Sustaining Valve
  PBV, // Pressure Breaker Valve
  FCV, // Flow Control Valve
  TCV, // Throttle Control Valve
  PCV, // Positional Control Valve
  GPV, // General Purpose Valve
}

impl FromStr for ValveType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "PRV" => Ok(ValveType::PRV),
      "PSV" => Ok(ValveType::PSV),
      "PBV" => Ok(ValveType::PBV),
      "FCV" => Ok(ValveType::FCV),
      "TCV" => Ok(ValveType::TCV),
      "PCV" => Ok(ValveType::PCV),
      "GPV" => Ok(ValveType::GPV),
      _ => Err(format!("Invalid valve type: {}", s)),
    }
  }
}

impl std::fmt::Display for ValveType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}", self)
  }
}

#[derive(Debug, Clone)]
pub struct Valve {
  pub diameter: f64,
  /// Flow (FCV), pressure (PRV/PSV/PBV) or loss coefficient (TCV); the head curve id for GPVs is dropped
  pub setting: f64,
  pub minor_loss: f64,
  pub valve_type: ValveType,
}
