use crate::model::reservoir::Reservoir;
use crate::model::tank::Tank;
use crate::model::junction::Junction;

/// Node struct
#[derive(Debug, Clone)]
pub struct Node {
  pub id: Box<str>,
  pub node_type: NodeType,
  /// Elevation for junctions and tanks, total head for reservoirs (m)
  pub elevation: f64,
  /// Map coordinates from [COORDINATES], if listed
  pub coordinates: Option<(f64, f64)>,
}

/// Node types
#[derive(Debug, Clone)]
pub enum NodeType {
  Reservoir(Reservoir),
  Tank(Tank),
  Junction(Junction),
}

impl Node {
  pub fn is_junction(&self) -> bool {
    matches!(self.node_type, NodeType::Junction(_))
  }

  pub fn is_reservoir(&self) -> bool {
    matches!(self.node_type, NodeType::Reservoir(_))
  }

  /// Base demand in m^3/s, zero for anything but junctions
  pub fn base_demand(&self) -> f64 {
    match &self.node_type {
      NodeType::Junction(junction) => junction.basedemand,
      _ => 0.0,
    }
  }

  /// Coordinates, falling back to the origin for nodes without a [COORDINATES] row
  pub fn position(&self) -> (f64, f64) {
    self.coordinates.unwrap_or((0.0, 0.0))
  }

  pub fn kind(&self) -> &'static str {
    match self.node_type {
      NodeType::Junction(_) => "junction",
      NodeType::Reservoir(_) => "reservoir",
      NodeType::Tank(_) => "tank",
    }
  }
}
