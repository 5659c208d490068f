use crate::constants::{MINOR_LOSS_PIPE_DIAMETER, MINOR_LOSS_PIPE_LENGTH, MINOR_LOSS_PIPE_ROUGHNESS, MM_PER_M, VALVE_DIAMETER};
use crate::convert::epanet::{clear_demands, coordinate_row, junction_row, junctions_edit, pressure_patch, reservoir_row, valve_row, PipeRow};
use crate::convert::{Context, Plan};
use crate::error::ConvertError;
use crate::hydraulics::minor_loss_coefficient;
use crate::model::pipe::PipeStatus;
use crate::model::valve::ValveType;
use crate::splice::{Edit, Target};

const NODE_OFFSET: (f64, f64) = (-30.0, 30.0);
const RESERVOIR_OFFSET: (f64, f64) = (-60.0, 0.0);

/// Each demand junction discharges through a flow-capping valve and a minor-loss pipe into a
/// reservoir held at Hmin above it
pub(super) fn plan(ctx: &Context) -> Result<Plan, ConvertError> {
  let dh = ctx.pressure.differential();
  let units = ctx.network.options.flow_units;
  let mut plan = Plan::epanet();
  let mut artificial = Vec::new();
  let mut reservoirs = Vec::new();
  let mut pipes = Vec::new();
  let mut valves = Vec::new();
  let mut coordinates = Vec::new();
  let mut reservoir_coordinates = Vec::new();

  for node in &ctx.demand_nodes {
    let node_id = format!("ANforNode{}", node.id);
    let reservoir_id = format!("AR{}", node.id);
    let pipe_id = format!("Pipe1forNode{}", node.id);
    let valve_id = format!("FCVforNode{}", node.id);

    artificial.push(junction_row(&node_id, node.elevation));
    reservoirs.push(reservoir_row(&reservoir_id, node.elevation + ctx.pressure.hmin));
    valves.push(valve_row(&valve_id, node.id, &node_id, VALVE_DIAMETER, ValveType::FCV, units.from_cms(node.demand)));
    pipes.push(PipeRow {
      id: &pipe_id,
      from: &node_id,
      to: &reservoir_id,
      length: MINOR_LOSS_PIPE_LENGTH,
      diameter: MINOR_LOSS_PIPE_DIAMETER * MM_PER_M,
      roughness: MINOR_LOSS_PIPE_ROUGHNESS,
      minor_loss: minor_loss_coefficient(node.demand, dh),
      status: PipeStatus::CheckValve,
    }.render());
    coordinates.push(coordinate_row(&node_id, node.coordinates, NODE_OFFSET));
    reservoir_coordinates.push(coordinate_row(&reservoir_id, node.coordinates, RESERVOIR_OFFSET));

    plan.nodes.push(node_id);
    plan.nodes.push(reservoir_id);
    plan.links.push(pipe_id);
    plan.links.push(valve_id);
  }
  coordinates.extend(reservoir_coordinates);

  plan.edit(junctions_edit(ctx.network, artificial));
  plan.edit(clear_demands());
  plan.edit(Edit::new("reservoirs", Target::End("RESERVOIRS"), reservoirs));
  plan.edit(Edit::new("pipes", Target::End("PIPES"), pipes));
  plan.edit(Edit::new("valves", Target::Start("VALVES"), valves));
  plan.edit(Edit::new("coordinates", Target::End("COORDINATES"), coordinates));
  plan.edit(pressure_patch(&ctx.pressure));
  Ok(plan)
}
