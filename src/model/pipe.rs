use std::str::FromStr;

use crate::constants::MM_PER_M;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PipeStatus {
  Open,
  Closed,
  CheckValve
}

impl FromStr for PipeStatus {
  type Err = String;
  fn from_str(status: &str) -> Result<Self, Self::Err> {
    match status.to_uppercase().as_str() {
      "OPEN" => Ok(PipeStatus::Open),
      "CLOSED" => Ok(PipeStatus::Closed),
      "CV" => Ok(PipeStatus::CheckValve),
      _ => Err(format!("Invalid pipe status: {}", status)),
    }
  }
}

impl std::fmt::Display for PipeStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PipeStatus::Open => write!(f, "Open"),
      PipeStatus::Closed => write!(f, "Closed"),
      PipeStatus::CheckValve => write!(f, "CV"),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Pipe {
  pub diameter: f64,   // mm, as written in a metric INP file
  pub length: f64,     // m
  pub roughness: f64,  // Hazen-Williams C
  pub minor_loss: f64, // dimensionless K
  pub status: PipeStatus,
}

impl Pipe {
  pub fn diameter_m(&self) -> f64 {
    self.diameter / MM_PER_M
  }
}
