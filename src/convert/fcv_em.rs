use crate::constants::{EMITTER_EXPONENT, MINOR_LOSS_PIPE_DIAMETER, MINOR_LOSS_PIPE_LENGTH, MINOR_LOSS_PIPE_ROUGHNESS, MM_PER_M, VALVE_DIAMETER};
use crate::convert::epanet::{clear_demands, coordinate_row, emitter_row, junction_row, junctions_edit, pressure_patch, valve_row, PipeRow};
use crate::convert::{Context, Method, Plan};
use crate::error::ConvertError;
use crate::hydraulics::emitter_coefficient;
use crate::model::pipe::PipeStatus;
use crate::model::valve::ValveType;
use crate::splice::{Edit, Target};

const NODE_OFFSET: (f64, f64) = (30.0, -30.0);
const EMITTER_OFFSET: (f64, f64) = (60.0, 0.0);

/// Each demand junction feeds an emitter through a flow-capping valve
pub(super) fn plan(ctx: &Context) -> Result<Plan, ConvertError> {
  let dh = ctx.pressure.require_differential(Method::FcvEm.label())?;
  let units = ctx.network.options.flow_units;
  let mut plan = Plan::epanet();
  let mut artificial = Vec::new();
  let mut emitter_nodes = Vec::new();
  let mut pipes = Vec::new();
  let mut valves = Vec::new();
  let mut emitters = Vec::new();
  let mut coordinates = Vec::new();
  let mut emitter_coordinates = Vec::new();

  for node in &ctx.demand_nodes {
    let node_id = format!("ANforNode{}", node.id);
    let emitter_id = format!("EM{}", node.id);
    let pipe_id = format!("Pipe1forNode{}", node.id);
    let valve_id = format!("FCVforNode{}", node.id);
    let flow = units.from_cms(node.demand);

    artificial.push(junction_row(&node_id, node.elevation));
    emitter_nodes.push(junction_row(&emitter_id, node.elevation));
    pipes.push(PipeRow {
      id: &pipe_id,
      from: node.id,
      to: &node_id,
      length: MINOR_LOSS_PIPE_LENGTH,
      diameter: MINOR_LOSS_PIPE_DIAMETER * MM_PER_M,
      roughness: MINOR_LOSS_PIPE_ROUGHNESS,
      minor_loss: 0.0,
      status: PipeStatus::CheckValve,
    }.render());
    valves.push(valve_row(&valve_id, &node_id, &emitter_id, VALVE_DIAMETER, ValveType::FCV, flow));
    emitters.push(emitter_row(&emitter_id, emitter_coefficient(flow, dh)));
    coordinates.push(coordinate_row(&node_id, node.coordinates, NODE_OFFSET));
    emitter_coordinates.push(coordinate_row(&emitter_id, node.coordinates, EMITTER_OFFSET));

    plan.nodes.push(node_id);
    plan.nodes.push(emitter_id);
    plan.links.push(pipe_id);
    plan.links.push(valve_id);
  }
  artificial.extend(emitter_nodes);
  coordinates.extend(emitter_coordinates);

  plan.edit(junctions_edit(ctx.network, artificial));
  plan.edit(clear_demands());
  plan.edit(Edit::new("pipes", Target::End("PIPES"), pipes));
  plan.edit(Edit::new("valves", Target::Start("VALVES"), valves));
  plan.edit(Edit::new("emitters", Target::Start("EMITTERS"), emitters));
  plan.edit(Edit::new("coordinates", Target::End("COORDINATES"), coordinates));
  plan.edit(Edit::new(
    "emitter exponent",
    Target::Option { section: "OPTIONS", key: "Emitter Exponent", skip: 0 },
    vec![format!(" Emitter Exponent   {:.4}", EMITTER_EXPONENT)],
  ));
  plan.edit(pressure_patch(&ctx.pressure));
  Ok(plan)
}
