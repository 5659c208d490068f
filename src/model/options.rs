use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowUnits {
  // Imperial units
  CFS,  // Cubic feet per second
  GPM,  // Gallons per minute
  MGD,  // Million gallons per day
  IMGD, // Imperial million gallons per day
  AFD,  // Acre-feet per day
  // Metric units
  LPS,  // Liters per second
  LPM,  // Liters per minute
  MLD,  // Million liters per day
  CMS,  // Cubic meters per second
  CMH,  // Cubic meters per hour
  CMD   // Cubic meters per day
}

/// FromStr implementation for FlowUnits
impl FromStr for FlowUnits {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "CFS" => Ok(FlowUnits::CFS),
      "GPM" => Ok(FlowUnits::GPM),
      "MGD" => Ok(FlowUnits::MGD),
      "IMGD" => Ok(FlowUnits::IMGD),
      "AFD" => Ok(FlowUnits::AFD),
      "LPS" => Ok(FlowUnits::LPS),
      "LPM" => Ok(FlowUnits::LPM),
      "MLD" => Ok(FlowUnits::MLD),
      "CMS" => Ok(FlowUnits::CMS),
      "CMH" => Ok(FlowUnits::CMH),
      "CMD" => Ok(FlowUnits::CMD),
      _ => Err(format!("Invalid flow unit: {}", s)),
    }
  }
}

impl std::fmt::Display for FlowUnits {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl FlowUnits {
  /// Metric flow units imply metres for lengths and heads and millimetres for diameters
  pub fn is_metric(&self) -> bool {
    matches!(self, FlowUnits::LPS | FlowUnits::LPM | FlowUnits::MLD | FlowUnits::CMS | FlowUnits::CMH | FlowUnits::CMD)
  }

  /// Multiplier converting a flow in these units to m^3/s
  pub fn to_cms(&self) -> f64 {
    match self {
      FlowUnits::CFS => 0.028316847,
      FlowUnits::GPM => 6.30901964e-5,
      FlowUnits::MGD => 0.043812636,
      FlowUnits::IMGD => 0.052616782,
      FlowUnits::AFD => 0.014276410,
      FlowUnits::LPS => 1e-3,
      FlowUnits::LPM => 1.0 / 60_000.0,
      FlowUnits::MLD => 1.0 / 86.4,
      FlowUnits::CMS => 1.0,
      FlowUnits::CMH => 1.0 / 3600.0,
      FlowUnits::CMD => 1.0 / 86_400.0,
    }
  }

  /// Express a flow given in m^3/s in these units
  pub fn from_cms(&self, flow: f64) -> f64 {
    flow / self.to_cms()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandModel {
  DDA, // demand-driven analysis
  PDA, // pressure-driven analysis
}

impl FromStr for DemandModel {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "DDA" => Ok(DemandModel::DDA),
      "PDA" | "PDD" => Ok(DemandModel::PDA),
      _ => Err(format!("Invalid demand model: {}", s)),
    }
  }
}

impl std::fmt::Display for DemandModel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// Options read from the [OPTIONS] and [TIMES] sections
#[derive(Debug, Clone)]
pub struct SimulationOptions {
  pub flow_units: FlowUnits,
  pub demand_model: DemandModel,
  pub minimum_pressure: f64,
  pub required_pressure: f64,
  pub emitter_exponent: f64,
  /// Simulation duration in seconds
  pub duration: u64,
}

/// Default implementation for SimulationOptions (EPANET defaults)
impl Default for SimulationOptions {
  fn default() -> Self {
    Self {
      flow_units: FlowUnits::GPM,
      demand_model: DemandModel::DDA,
      minimum_pressure: 0.0,
      required_pressure: 0.1,
      emitter_exponent: 0.5,
      duration: 0,
    }
  }
}

impl SimulationOptions {
  pub fn duration_minutes(&self) -> f64 {
    self.duration as f64 / 60.0
  }
}
