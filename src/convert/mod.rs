//! Conversion of a pressure-dependent EPANET network into an IWS model.
//!
//! Every demand junction gets its withdrawal rerouted through synthetic elements whose size
//! is computed from the demand, the supply duration and the pressure range. EPANET methods
//! splice those elements into the source file; SWMM methods fill a built-in template.

pub mod duration;
mod epanet;
mod cv_tank;
mod cv_res;
mod fcv_em;
mod fcv_res;
mod psv_tank;
mod swmm;
mod outlet_outfall;
mod outlet_storage;

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use hashbrown::HashSet;
use simplelog::{info, debug};

use crate::constants::DEFAULT_MAX_SEGMENT_LENGTH;
use crate::error::ConvertError;
use crate::hydraulics::{checked_demand, PressureRange};
use crate::model::network::Network;
use crate::model::options::DemandModel;
use crate::splice::buffer::TextBuffer;
use crate::splice::{self, Edit, Placement};
use crate::utils::paths;

pub use swmm::SWMM_TEMPLATE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
  /// Check valve and unit-height tank
  CvTank,
  /// Check valve and reservoir at the minimum pressure head
  CvRes,
  /// Flow control valve and emitter
  FcvEm,
  /// Flow control valve and reservoir
  FcvRes,
  /// Pressure sustaining valve and tank
  PsvTank,
  /// SWMM outlet discharging to an outfall
  OutletOutfall,
  /// SWMM outlet discharging to a storage unit
  OutletStorage,
}

impl Method {
  pub const ALL: [Method; 7] = [
    Method::CvTank,
    Method::CvRes,
    Method::FcvEm,
    Method::FcvRes,
    Method::PsvTank,
    Method::OutletOutfall,
    Method::OutletStorage,
  ];

  pub fn label(&self) -> &'static str {
    match self {
      Method::CvTank => "CV-Tank",
      Method::CvRes => "CV-Res",
      Method::FcvEm => "FCV-EM",
      Method::FcvRes => "FCV-Res",
      Method::PsvTank => "PSV-Tank",
      Method::OutletOutfall => "Outlet-Outfall",
      Method::OutletStorage => "Outlet-Storage",
    }
  }

  /// Appended to the input file stem to name the output
  pub fn suffix(&self) -> String {
    format!("_{}", self.label())
  }

  pub fn is_swmm(&self) -> bool {
    matches!(self, Method::OutletOutfall | Method::OutletStorage)
  }

  /// Methods whose sizing divides by Hdes - Hmin
  pub fn divides_by_differential(&self) -> bool {
    matches!(self, Method::FcvEm | Method::OutletOutfall | Method::OutletStorage)
  }

  /// Methods whose sizing depends on the supply volume
  pub fn needs_duration(&self) -> bool {
    matches!(self, Method::CvTank | Method::PsvTank | Method::OutletOutfall | Method::OutletStorage)
  }
}

impl FromStr for Method {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let key: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_uppercase();
    Method::ALL.iter()
      .find(|m| m.label().replace('-', "").to_uppercase() == key)
      .copied()
      .ok_or_else(|| format!("Invalid method: {} (expected one of {})", s, Method::ALL.map(|m| m.label()).join(", ")))
  }
}

impl std::fmt::Display for Method {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.label())
  }
}

/// User-supplied conversion parameters
#[derive(Debug, Clone)]
pub struct ConvertOptions {
  /// Pressure below which a consumer collects nothing (m)
  pub hmin: f64,
  /// Pressure at which a consumer collects its full demand (m)
  pub hdes: f64,
  /// Longest conduit kept whole in SWMM conversions (m)
  pub max_segment_length: f64,
}

impl Default for ConvertOptions {
  fn default() -> Self {
    Self { hmin: 0.0, hdes: 10.0, max_segment_length: DEFAULT_MAX_SEGMENT_LENGTH }
  }
}

impl ConvertOptions {
  /// Check the parameters `method` depends on before anything is read or written
  pub fn validate(&self, method: Method) -> Result<PressureRange, ConvertError> {
    let pressure = PressureRange::new(self.hmin, self.hdes)?;
    if method.divides_by_differential() {
      pressure.require_differential(method.label())?;
    }
    if method.is_swmm() && (!self.max_segment_length.is_finite() || self.max_segment_length <= 0.0) {
      return Err(ConvertError::InvalidSegmentLength(self.max_segment_length));
    }
    Ok(pressure)
  }
}

/// A junction with a positive base demand
#[derive(Debug, Clone)]
pub struct DemandNode<'a> {
  pub id: &'a str,
  pub elevation: f64,
  /// m^3/s
  pub demand: f64,
  pub coordinates: (f64, f64),
}

/// Everything a method needs to lay out its synthetic elements
pub(crate) struct Context<'a> {
  pub network: &'a Network,
  pub pressure: PressureRange,
  pub demand_nodes: Vec<DemandNode<'a>>,
  pub duration_minutes: f64,
  pub max_segment_length: f64,
}

/// Text a conversion starts from
pub(crate) enum Base {
  Source,
  SwmmTemplate,
}

/// Edits produced by a method, with the identifiers it creates
pub(crate) struct Plan {
  pub base: Base,
  pub edits: Vec<Edit>,
  pub nodes: Vec<String>,
  pub links: Vec<String>,
  /// Rows of the `_Demands.csv` companion file
  pub demand_table: Option<Vec<(String, f64)>>,
}

impl Plan {
  pub fn epanet() -> Self {
    Self { base: Base::Source, edits: Vec::new(), nodes: Vec::new(), links: Vec::new(), demand_table: None }
  }

  pub fn swmm() -> Self {
    Self { base: Base::SwmmTemplate, ..Plan::epanet() }
  }

  pub fn edit(&mut self, edit: Edit) {
    self.edits.push(edit);
  }
}

/// Files written by a conversion
#[derive(Debug, Clone)]
pub struct Conversion {
  pub method: Method,
  pub output: PathBuf,
  pub demand_table: Option<PathBuf>,
  pub placements: Vec<Placement>,
}

/// Junctions with non-zero demand, in file order
pub fn demand_nodes(network: &Network) -> Result<Vec<DemandNode<'_>>, ConvertError> {
  network.demand_nodes()
    .map(|node| {
      Ok(DemandNode {
        id: &node.id,
        elevation: node.elevation,
        demand: checked_demand(&node.id, node.base_demand())?,
        coordinates: node.position(),
      })
    })
    .collect()
}

/// Conditions every conversion requires of the source network
fn check_network(network: &Network) -> Result<(), ConvertError> {
  if !network.options.flow_units.is_metric() {
    return Err(ConvertError::UnsupportedUnits(network.options.flow_units.to_string()));
  }
  if network.options.demand_model != DemandModel::PDA {
    return Err(ConvertError::WrongDemandModel(network.options.demand_model.to_string()));
  }
  Ok(())
}

/// Generated identifiers must be unique and distinct from the source network's
fn check_ids(network: &Network, plan: &Plan) -> Result<(), ConvertError> {
  let mut seen = HashSet::new();
  for id in &plan.nodes {
    if network.node_map.contains_key(id.as_str()) || !seen.insert(id.as_str()) {
      return Err(ConvertError::IdCollision(id.clone()));
    }
  }
  seen.clear();
  for id in &plan.links {
    if network.link_map.contains_key(id.as_str()) || !seen.insert(id.as_str()) {
      return Err(ConvertError::IdCollision(id.clone()));
    }
  }
  Ok(())
}

fn build_plan(method: Method, ctx: &Context) -> Result<Plan, ConvertError> {
  match method {
    Method::CvTank => cv_tank::plan(ctx),
    Method::CvRes => cv_res::plan(ctx),
    Method::FcvEm => fcv_em::plan(ctx),
    Method::FcvRes => fcv_res::plan(ctx),
    Method::PsvTank => psv_tank::plan(ctx),
    Method::OutletOutfall => outlet_outfall::plan(ctx),
    Method::OutletStorage => outlet_storage::plan(ctx),
  }
}

/// Convert the network in `input` with `method`, writing `{stem}_{method}.inp` next to it.
///
/// Nothing is written unless the whole conversion succeeds.
pub fn convert(input: &Path, method: Method, options: &ConvertOptions) -> Result<Conversion, ConvertError> {
  let pressure = options.validate(method)?;

  let source = fs::read_to_string(input)?;
  let mut network = Network::default();
  network.read_inp(&source)?;
  check_network(&network)?;

  let duration_minutes = network.options.duration_minutes();
  if method.needs_duration() && duration_minutes <= 0.0 {
    return Err(ConvertError::InvalidDuration("network duration must be positive".to_string()));
  }

  let ctx = Context {
    network: &network,
    pressure,
    demand_nodes: demand_nodes(&network)?,
    duration_minutes,
    max_segment_length: options.max_segment_length,
  };
  debug!("{}: {} demand nodes, duration {} min", method, ctx.demand_nodes.len(), duration_minutes);

  let plan = build_plan(method, &ctx)?;
  check_ids(&network, &plan)?;

  let mut buffer = match plan.base {
    Base::Source => TextBuffer::from_text(&source),
    Base::SwmmTemplate => TextBuffer::from_text(SWMM_TEMPLATE),
  };
  let placements = splice::apply(&mut buffer, plan.edits)?;

  let output = paths::with_suffix(input, &method.suffix());
  let demand_table = match &plan.demand_table {
    Some(rows) => {
      let path = paths::sibling(&output, "_Demands", "csv");
      crate::output::write_demand_table(&path, rows)?;
      Some(path)
    }
    None => None,
  };
  if let Err(err) = buffer.save(&output) {
    if let Some(path) = &demand_table {
      let _ = fs::remove_file(path);
    }
    return Err(err);
  }

  info!("{} conversion written to {} ({} edits)", method, output.display(), placements.len());
  Ok(Conversion { method, output, demand_table, placements })
}

/// Run every method on the same input; one failing method does not stop the others
pub fn convert_all(input: &Path, options: &ConvertOptions) -> Vec<(Method, Result<Conversion, ConvertError>)> {
  Method::ALL.iter().map(|&method| (method, convert(input, method, options))).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn method_names_parse_loosely() {
    assert_eq!("cv-tank".parse::<Method>().unwrap(), Method::CvTank);
    assert_eq!("Outlet_Storage".parse::<Method>().unwrap(), Method::OutletStorage);
    assert_eq!("FCVEM".parse::<Method>().unwrap(), Method::FcvEm);
    assert!("tank".parse::<Method>().is_err());
  }

  #[test]
  fn validation_depends_on_the_method() {
    let flat = ConvertOptions { hmin: 5.0, hdes: 5.0, ..Default::default() };
    assert!(flat.validate(Method::CvTank).is_ok());
    assert!(matches!(flat.validate(Method::FcvEm), Err(ConvertError::ZeroPressureDifferential { .. })));

    let unsplittable = ConvertOptions { max_segment_length: 0.0, ..Default::default() };
    assert!(unsplittable.validate(Method::CvRes).is_ok());
    assert!(matches!(unsplittable.validate(Method::OutletStorage), Err(ConvertError::InvalidSegmentLength(_))));
  }

  #[test]
  fn suffixes_are_distinct() {
    let suffixes: std::collections::HashSet<String> = Method::ALL.iter().map(|m| m.suffix()).collect();
    assert_eq!(suffixes.len(), Method::ALL.len());
    assert_eq!(Method::PsvTank.suffix(), "_PSV-Tank");
  }
}
