//! Rows and edits shared by the EPANET methods.

use crate::hydraulics::PressureRange;
use crate::model::network::Network;
use crate::model::pipe::PipeStatus;
use crate::model::valve::ValveType;
use crate::splice::{Edit, Target};
use crate::utils::record::{format_number, Record};

pub(super) fn junction_row(id: &str, elevation: f64) -> String {
  Record::new(id).num(elevation).num(0.0).blank().terminated().render()
}

/// Every junction of the source network with its demand removed
pub(super) fn zeroed_junctions(network: &Network) -> Vec<String> {
  network.junctions().map(|node| junction_row(&node.id, node.elevation)).collect()
}

/// Replace the [JUNCTIONS] rows with demand-free ones, followed by `extra` rows
pub(super) fn junctions_edit(network: &Network, extra: Vec<String>) -> Edit {
  let mut rows = zeroed_junctions(network);
  rows.extend(extra);
  Edit::new("junctions", Target::Rows("JUNCTIONS"), rows)
}

/// Demands moved to synthetic elements must not also be drawn through [DEMANDS]
pub(super) fn clear_demands() -> Edit {
  Edit::new("demands", Target::Rows("DEMANDS"), Vec::new()).optional()
}

/// Write the conversion's pressure range over the two lines after `Demand Model`
pub(super) fn pressure_patch(pressure: &PressureRange) -> Edit {
  Edit::new(
    "pressure options",
    Target::Option { section: "OPTIONS", key: "Demand Model", skip: 1 },
    vec![
      format!(" Minimum Pressure   {}", format_number(pressure.hmin)),
      format!(" Required Pressure  {}", format_number(pressure.hdes)),
    ],
  )
}

pub(super) fn reservoir_row(id: &str, head: f64) -> String {
  Record::new(id).num(head).blank().terminated().render()
}

/// Unit-height tank starting empty
pub(super) fn tank_row(id: &str, elevation: f64, diameter: f64) -> String {
  Record::new(id)
    .num(elevation)
    .num(0.0)
    .num(0.0)
    .num(1.0)
    .num(diameter)
    .num(0.0)
    .blank()
    .terminated()
    .render()
}

pub(super) struct PipeRow<'a> {
  pub id: &'a str,
  pub from: &'a str,
  pub to: &'a str,
  pub length: f64,
  /// mm
  pub diameter: f64,
  pub roughness: f64,
  pub minor_loss: f64,
  pub status: PipeStatus,
}

impl PipeRow<'_> {
  pub fn render(&self) -> String {
    Record::new(self.id)
      .text(self.from)
      .text(self.to)
      .num(self.length)
      .num(self.diameter)
      .num(self.roughness)
      .num(self.minor_loss)
      .text(self.status.to_string())
      .terminated()
      .render()
  }
}

pub(super) fn valve_row(id: &str, from: &str, to: &str, diameter: f64, valve_type: ValveType, setting: f64) -> String {
  Record::new(id)
    .text(from)
    .text(to)
    .num(diameter)
    .text(valve_type.to_string())
    .num(setting)
    .num(0.0)
    .terminated()
    .render()
}

pub(super) fn emitter_row(id: &str, coefficient: f64) -> String {
  Record::new(id).num(coefficient).render()
}

pub(super) fn coordinate_row(id: &str, (x, y): (f64, f64), (dx, dy): (f64, f64)) -> String {
  Record::new(id).num(x + dx).num(y + dy).render()
}

