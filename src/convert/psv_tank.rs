use crate::constants::{round_to, DECIMALS, MINOR_LOSS_PIPE_DIAMETER, MINOR_LOSS_PIPE_LENGTH, MINOR_LOSS_PIPE_ROUGHNESS, MM_PER_M, UNIT_HEIGHT, VALVE_DIAMETER};
use crate::convert::epanet::{clear_demands, coordinate_row, junction_row, junctions_edit, pressure_patch, tank_row, valve_row, PipeRow};
use crate::convert::{Context, Plan};
use crate::error::ConvertError;
use crate::hydraulics::{desired_volume, minor_loss_coefficient, unit_height_diameter};
use crate::model::pipe::PipeStatus;
use crate::model::valve::ValveType;
use crate::splice::{Edit, Target};

const INLET_OFFSET: (f64, f64) = (20.0, -20.0);
const OUTLET_OFFSET: (f64, f64) = (40.0, 0.0);
const TANK_OFFSET: (f64, f64) = (60.0, -20.0);

/// Each demand junction fills a tank from the top: minor-loss pipe, atmospheric PSV, tank
/// sitting one metre below the junction
pub(super) fn plan(ctx: &Context) -> Result<Plan, ConvertError> {
  let dh = ctx.pressure.differential();
  let mut plan = Plan::epanet();
  let (mut inlets, mut outlets) = (Vec::new(), Vec::new());
  let mut tanks = Vec::new();
  let (mut inlet_pipes, mut outlet_pipes) = (Vec::new(), Vec::new());
  let mut valves = Vec::new();
  let (mut inlet_coordinates, mut outlet_coordinates, mut tank_coordinates) = (Vec::new(), Vec::new(), Vec::new());

  for node in &ctx.demand_nodes {
    let inlet_id = format!("AN1forNode{}", node.id);
    let outlet_id = format!("AN2forNode{}", node.id);
    let tank_id = format!("ATforNode{}", node.id);
    let inlet_pipe_id = format!("Pipe1forNode{}", node.id);
    let outlet_pipe_id = format!("Pipe2forNode{}", node.id);
    let valve_id = format!("APSVforNode{}", node.id);

    let diameter = unit_height_diameter(desired_volume(node.demand, ctx.duration_minutes));
    tanks.push(tank_row(&tank_id, node.elevation - UNIT_HEIGHT, diameter));
    inlets.push(junction_row(&inlet_id, node.elevation));
    outlets.push(junction_row(&outlet_id, node.elevation));

    let pipe = |id: &str, from: &str, to: &str, minor_loss: f64| PipeRow {
      id,
      from,
      to,
      length: MINOR_LOSS_PIPE_LENGTH,
      diameter: MINOR_LOSS_PIPE_DIAMETER * MM_PER_M,
      roughness: MINOR_LOSS_PIPE_ROUGHNESS,
      minor_loss,
      status: PipeStatus::CheckValve,
    }.render();
    inlet_pipes.push(pipe(&inlet_pipe_id, node.id, &inlet_id, round_to(minor_loss_coefficient(node.demand, dh), DECIMALS)));
    outlet_pipes.push(pipe(&outlet_pipe_id, &outlet_id, &tank_id, 0.0));
    valves.push(valve_row(&valve_id, &inlet_id, &outlet_id, VALVE_DIAMETER, ValveType::PSV, 0.0));

    inlet_coordinates.push(coordinate_row(&inlet_id, node.coordinates, INLET_OFFSET));
    outlet_coordinates.push(coordinate_row(&outlet_id, node.coordinates, OUTLET_OFFSET));
    tank_coordinates.push(coordinate_row(&tank_id, node.coordinates, TANK_OFFSET));

    plan.nodes.extend([inlet_id, outlet_id, tank_id]);
    plan.links.extend([inlet_pipe_id, outlet_pipe_id, valve_id]);
  }
  inlets.extend(outlets);
  inlet_pipes.extend(outlet_pipes);
  inlet_coordinates.extend(outlet_coordinates);
  inlet_coordinates.extend(tank_coordinates);

  plan.edit(junctions_edit(ctx.network, inlets));
  plan.edit(clear_demands());
  plan.edit(Edit::new("tanks", Target::Start("TANKS"), tanks));
  plan.edit(Edit::new("pipes", Target::End("PIPES"), inlet_pipes));
  plan.edit(Edit::new("valves", Target::Start("VALVES"), valves));
  plan.edit(Edit::new("coordinates", Target::End("COORDINATES"), inlet_coordinates));
  plan.edit(pressure_patch(&ctx.pressure));
  Ok(plan)
}
