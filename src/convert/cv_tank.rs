use crate::constants::{HEADLOSS_PIPE_DIAMETER, HEADLOSS_PIPE_ROUGHNESS, MM_PER_M};
use crate::convert::epanet::{clear_demands, coordinate_row, junctions_edit, pressure_patch, tank_row, PipeRow};
use crate::convert::{Context, Plan};
use crate::error::ConvertError;
use crate::hydraulics::{desired_volume, headloss_pipe_length, unit_height_diameter};
use crate::model::pipe::PipeStatus;
use crate::splice::{Edit, Target};

const TANK_OFFSET: (f64, f64) = (2.0, 2.0);

/// Each demand junction fills a unit-height tank through a check-valved friction pipe
pub(super) fn plan(ctx: &Context) -> Result<Plan, ConvertError> {
  let dh = ctx.pressure.differential();
  let mut plan = Plan::epanet();
  let mut tanks = Vec::new();
  let mut pipes = Vec::new();
  let mut coordinates = Vec::new();

  for node in &ctx.demand_nodes {
    let tank_id = format!("TankforNode{}", node.id);
    let pipe_id = format!("PipeforNode{}", node.id);

    let diameter = unit_height_diameter(desired_volume(node.demand, ctx.duration_minutes));
    tanks.push(tank_row(&tank_id, node.elevation, diameter));
    pipes.push(PipeRow {
      id: &pipe_id,
      from: node.id,
      to: &tank_id,
      length: headloss_pipe_length(node.demand, dh),
      diameter: HEADLOSS_PIPE_DIAMETER * MM_PER_M,
      roughness: HEADLOSS_PIPE_ROUGHNESS,
      minor_loss: 0.0,
      status: PipeStatus::CheckValve,
    }.render());
    coordinates.push(coordinate_row(&tank_id, node.coordinates, TANK_OFFSET));

    plan.nodes.push(tank_id);
    plan.links.push(pipe_id);
  }

  plan.edit(junctions_edit(ctx.network, Vec::new()));
  plan.edit(clear_demands());
  plan.edit(Edit::new("tanks", Target::Start("TANKS"), tanks));
  plan.edit(Edit::new("pipes", Target::End("PIPES"), pipes));
  plan.edit(Edit::new("coordinates", Target::End("COORDINATES"), coordinates));
  plan.edit(pressure_patch(&ctx.pressure));
  Ok(plan)
}
