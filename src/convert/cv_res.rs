use crate::constants::{HEADLOSS_PIPE_DIAMETER, HEADLOSS_PIPE_ROUGHNESS, MM_PER_M};
use crate::convert::epanet::{clear_demands, coordinate_row, junctions_edit, pressure_patch, reservoir_row, PipeRow};
use crate::convert::{Context, Plan};
use crate::error::ConvertError;
use crate::hydraulics::headloss_pipe_length;
use crate::model::pipe::PipeStatus;
use crate::splice::{Edit, Target};

const RESERVOIR_OFFSET: (f64, f64) = (2.0, 2.0);

/// Each demand junction discharges into a reservoir held at Hmin above it
pub(super) fn plan(ctx: &Context) -> Result<Plan, ConvertError> {
  let dh = ctx.pressure.differential();
  let mut plan = Plan::epanet();
  let mut reservoirs = Vec::new();
  let mut pipes = Vec::new();
  let mut coordinates = Vec::new();

  for node in &ctx.demand_nodes {
    let reservoir_id = format!("AR{}", node.id);
    let pipe_id = format!("PipeforNode{}", node.id);

    reservoirs.push(reservoir_row(&reservoir_id, node.elevation + ctx.pressure.hmin));
    pipes.push(PipeRow {
      id: &pipe_id,
      from: node.id,
      to: &reservoir_id,
      length: headloss_pipe_length(node.demand, dh),
      diameter: HEADLOSS_PIPE_DIAMETER * MM_PER_M,
      roughness: HEADLOSS_PIPE_ROUGHNESS,
      minor_loss: 0.0,
      status: PipeStatus::CheckValve,
    }.render());
    coordinates.push(coordinate_row(&reservoir_id, node.coordinates, RESERVOIR_OFFSET));

    plan.nodes.push(reservoir_id);
    plan.links.push(pipe_id);
  }

  plan.edit(junctions_edit(ctx.network, Vec::new()));
  plan.edit(clear_demands());
  plan.edit(Edit::new("reservoirs", Target::End("RESERVOIRS"), reservoirs));
  plan.edit(Edit::new("pipes", Target::End("PIPES"), pipes));
  plan.edit(Edit::new("coordinates", Target::End("COORDINATES"), coordinates));
  plan.edit(pressure_patch(&ctx.pressure));
  Ok(plan)
}
