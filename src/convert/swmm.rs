//! Layout shared by the SWMM methods: discretized conduits, junctions, reservoirs as storage.

use hashbrown::HashSet;

use crate::constants::{HEADLOSS_PIPE_ROUGHNESS, MANNING_ROUGHNESS};
use crate::convert::Context;
use crate::discretize::{discretize, Conduit, Endpoint};
use crate::error::ConvertError;
use crate::model::link::LinkType;
use crate::model::node::NodeType;
use crate::splice::{Edit, Target};
use crate::utils::record::{format_number, Record};

/// Empty SWMM 5 project in LPS with Hazen-Williams force mains
pub const SWMM_TEMPLATE: &str = include_str!("../templates/swmm.inp");

const MINUTES_PER_DAY: u64 = 24 * 60;

#[derive(Debug, Clone)]
pub(super) struct SwmmJunction {
  pub id: Box<str>,
  pub elevation: f64,
  pub coordinates: (f64, f64),
}

#[derive(Debug, Clone)]
pub(super) struct SwmmReservoir {
  pub id: Box<str>,
  pub head: f64,
  pub coordinates: (f64, f64),
  /// Elevation assigned when the reservoir starts a split conduit
  pub split_elevation: Option<f64>,
}

/// The source network recast as SWMM nodes and conduits
pub(super) struct SwmmLayout {
  pub junctions: Vec<SwmmJunction>,
  pub reservoirs: Vec<SwmmReservoir>,
  pub conduits: Vec<Conduit>,
  /// Identifiers created by discretization
  pub new_nodes: Vec<String>,
  pub new_links: Vec<String>,
}

impl SwmmLayout {
  pub fn max_reservoir_head(&self) -> f64 {
    self.reservoirs.iter().map(|r| r.head).fold(0.0, f64::max)
  }
}

/// Recast the network for SWMM, splitting conduits longer than the maximum segment length
pub(super) fn layout(ctx: &Context) -> Result<SwmmLayout, ConvertError> {
  let network = ctx.network;

  for node in &network.nodes {
    if let NodeType::Tank(_) = node.node_type {
      return Err(ConvertError::UnsupportedElement { id: node.id.clone(), kind: node.kind() });
    }
  }

  let mut conduits = Vec::with_capacity(network.links.len());
  for link in &network.links {
    let LinkType::Pipe(pipe) = &link.link_type else {
      return Err(ConvertError::UnsupportedElement { id: link.id.clone(), kind: link.kind() });
    };
    conduits.push(Conduit {
      id: link.id.clone(),
      from: link.start_node_id.clone(),
      to: link.end_node_id.clone(),
      length: pipe.length,
      diameter: pipe.diameter_m(),
    });
  }

  let endpoint = |id: &str| {
    network.node(id).map(|node| Endpoint {
      id: node.id.clone(),
      elevation: if node.is_reservoir() { None } else { Some(node.elevation) },
      coordinates: node.position(),
    })
  };
  let taken_nodes: HashSet<Box<str>> = network.node_map.keys().cloned().collect();
  let taken_links: HashSet<Box<str>> = network.link_map.keys().cloned().collect();
  let discretized = discretize(&conduits, endpoint, ctx.max_segment_length, &taken_nodes, &taken_links)?;

  let mut junctions: Vec<SwmmJunction> = network.junctions()
    .map(|node| SwmmJunction { id: node.id.clone(), elevation: node.elevation, coordinates: node.position() })
    .collect();
  let new_nodes = discretized.nodes.iter().map(|n| n.id.to_string()).collect();
  junctions.extend(discretized.nodes.into_iter().map(|n| SwmmJunction { id: n.id, elevation: n.elevation, coordinates: n.coordinates }));

  let reservoirs = network.reservoirs()
    .map(|node| SwmmReservoir {
      id: node.id.clone(),
      head: node.elevation,
      coordinates: node.position(),
      split_elevation: discretized.reservoir_elevations.iter()
        .find(|(id, _)| *id == node.id)
        .map(|(_, elevation)| *elevation),
    })
    .collect();

  let new_links = discretized.conduits.iter()
    .filter(|c| !taken_links.contains(&c.id))
    .map(|c| c.id.to_string())
    .collect();

  Ok(SwmmLayout { junctions, reservoirs, conduits: discretized.conduits, new_nodes, new_links })
}

/// Junction rows: no depth, surcharge depth high enough to never flood
pub(super) fn junction_rows(layout: &SwmmLayout) -> Vec<String> {
  layout.junctions.iter()
    .map(|j| Record::new(&*j.id).num(j.elevation).num(0.0).num(0.0).num(100.0).num(0.0).render())
    .collect()
}

pub(super) fn conduit_rows(layout: &SwmmLayout) -> Vec<String> {
  layout.conduits.iter()
    .map(|c| {
      Record::new(&*c.id)
        .text(&*c.from)
        .text(&*c.to)
        .num(c.length)
        .num(MANNING_ROUGHNESS)
        .num(0.0)
        .num(0.0)
        .num(0.0)
        .num(0.0)
        .render()
    })
    .collect()
}

/// Circular force mains with the Hazen-Williams coefficient of the synthetic pipes
pub(super) fn xsection_rows(layout: &SwmmLayout) -> Vec<String> {
  layout.conduits.iter()
    .map(|c| {
      Record::new(&*c.id)
        .text("FORCE_MAIN")
        .num(c.diameter)
        .num(HEADLOSS_PIPE_ROUGHNESS)
        .num(0.0)
        .num(0.0)
        .num(1.0)
        .render()
    })
    .collect()
}

/// A functional storage unit of huge constant area standing in for a reservoir
pub(super) fn reservoir_storage_row(id: &str, elevation: f64, max_depth: f64, init_depth: f64) -> String {
  Record::new(id)
    .num(elevation)
    .num(max_depth)
    .num(init_depth)
    .text("FUNCTIONAL")
    .num(0.0)
    .num(0.0)
    .num(1_000_000.0)
    .num(0.0)
    .num(0.0)
    .render()
}

pub(super) fn outfall_row(id: &str, elevation: f64) -> String {
  Record::new(id).num(elevation).text("FREE").blank().text("NO").render()
}

pub(super) fn coordinate_row(id: &str, (x, y): (f64, f64)) -> String {
  Record::new(id).num(x).num(y).render()
}

/// One curve: the first row names its type, a lone `;` closes it
pub(super) fn curve_rows(id: &str, kind: &str, points: &[(f64, f64)]) -> Vec<String> {
  let mut rows: Vec<String> = points.iter().enumerate()
    .map(|(i, (x, y))| {
      let row = Record::new(id);
      let row = if i == 0 { row.text(kind) } else { row.blank() };
      row.num(*x).num(*y).render()
    })
    .collect();
  rows.push(";".to_string());
  rows
}

/// Bounding box of the map with a quarter of its span as margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct MapExtent {
  pub min: (f64, f64),
  pub max: (f64, f64),
}

impl MapExtent {
  pub fn of(points: &[(f64, f64)]) -> Self {
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (x, y) in points {
      min = (min.0.min(*x), min.1.min(*y));
      max = (max.0.max(*x), max.1.max(*y));
    }
    if points.is_empty() {
      min = (0.0, 0.0);
      max = (0.0, 0.0);
    }
    let pad = |span: f64| if span > 0.0 { span / 4.0 } else { 1.0 };
    let (px, py) = (pad(max.0 - min.0), pad(max.1 - min.1));
    Self { min: (min.0 - px, min.1 - py), max: (max.0 + px, max.1 + py) }
  }

  pub fn edit(&self) -> Edit {
    let line = format!(
      "DIMENSIONS {} {} {} {}",
      format_number(self.min.0), format_number(self.min.1), format_number(self.max.0), format_number(self.max.1)
    );
    Edit::new("map dimensions", Target::Option { section: "MAP", key: "DIMENSIONS", skip: 0 }, vec![line])
  }
}

/// Simulation end time matching the supply duration; a full day ends at `24:00:00`
pub(super) fn end_time_edit(duration_minutes: f64) -> Result<Edit, ConvertError> {
  let minutes = duration_minutes.round() as u64;
  if minutes == 0 || minutes > MINUTES_PER_DAY {
    return Err(ConvertError::InvalidDuration(format!("{} min does not fit in a single SWMM day", duration_minutes)));
  }
  let line = format!("END_TIME             {:02}:{:02}:00", minutes / 60, minutes % 60);
  Ok(Edit::new("end time", Target::Option { section: "OPTIONS", key: "END_TIME", skip: 0 }, vec![line]))
}

/// Row insertions at the top of every template section
pub(super) fn section_edit(name: &'static str, section: &'static str, rows: Vec<String>) -> Edit {
  Edit::new(name, Target::Start(section), rows)
}
