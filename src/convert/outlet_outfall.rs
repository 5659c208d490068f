use crate::constants::{LPS_PER_CMS, MIN_STORAGE_DEPTH, RESERVOIR_DEPTH_MARGIN};
use crate::convert::swmm::{
  conduit_rows, coordinate_row, curve_rows, end_time_edit, junction_rows, layout, outfall_row,
  reservoir_storage_row, section_edit, xsection_rows, MapExtent,
};
use crate::convert::{Context, Method, Plan};
use crate::error::ConvertError;
use crate::hydraulics::rating_curve;
use crate::utils::record::Record;

const OUTFALL_OFFSET: (f64, f64) = (20.0, 20.0);

/// Rating table shared by all consumers with the same demand, keyed in mL/s
fn table_id(demand: f64) -> i64 {
  (demand * 1e6).round() as i64
}

/// Each demand junction discharges to a free outfall through an outlet whose rating curve
/// follows the pressure-dependent withdrawal
pub(super) fn plan(ctx: &Context) -> Result<Plan, ConvertError> {
  ctx.pressure.require_differential(Method::OutletOutfall.label())?;
  let layout = layout(ctx)?;
  let mut plan = Plan::swmm();

  let max_depth = MIN_STORAGE_DEPTH.max(layout.max_reservoir_head() + RESERVOIR_DEPTH_MARGIN);
  let storage: Vec<String> = layout.reservoirs.iter()
    .map(|r| reservoir_storage_row(&r.id, 0.0, max_depth, r.head))
    .collect();

  let mut outfalls = Vec::new();
  let mut outlets = Vec::new();
  let mut tables: Vec<i64> = Vec::new();
  let mut demand_table = Vec::new();
  let mut outfall_coordinates = Vec::new();

  for node in &ctx.demand_nodes {
    let outfall_id = format!("Outfall{}", node.id);
    let outlet_id = format!("Outlet{}", node.id);
    let table = table_id(node.demand);

    outfalls.push(outfall_row(&outfall_id, node.elevation));
    outlets.push(
      Record::new(&outlet_id)
        .text(node.id)
        .text(&outfall_id)
        .num(0.0)
        .text("TABULAR/DEPTH")
        .text(table.to_string())
        .blank()
        .text("YES")
        .render(),
    );
    let (x, y) = node.coordinates;
    outfall_coordinates.push(coordinate_row(&outfall_id, (x + OUTFALL_OFFSET.0, y + OUTFALL_OFFSET.1)));
    if !tables.contains(&table) {
      tables.push(table);
    }
    demand_table.push((outlet_id.clone(), node.demand));

    plan.nodes.push(outfall_id);
    plan.links.push(outlet_id);
  }

  // the curve follows the rounded table flow so consumers sharing it agree exactly
  let curves: Vec<String> = tables.iter()
    .flat_map(|&table| {
      let flow = table as f64 / 1e6 * LPS_PER_CMS;
      curve_rows(&table.to_string(), "Rating", &rating_curve(flow, &ctx.pressure))
    })
    .collect();

  let mut points: Vec<(f64, f64)> = layout.junctions.iter().map(|j| j.coordinates).collect();
  points.extend(layout.reservoirs.iter().map(|r| r.coordinates));
  let mut coordinates: Vec<String> = layout.junctions.iter().map(|j| coordinate_row(&j.id, j.coordinates))
    .chain(layout.reservoirs.iter().map(|r| coordinate_row(&r.id, r.coordinates)))
    .collect();
  for node in &ctx.demand_nodes {
    points.push((node.coordinates.0 + OUTFALL_OFFSET.0, node.coordinates.1 + OUTFALL_OFFSET.1));
  }
  coordinates.extend(outfall_coordinates);

  plan.edit(end_time_edit(ctx.duration_minutes)?);
  plan.edit(section_edit("junctions", "JUNCTIONS", junction_rows(&layout)));
  plan.edit(section_edit("outfalls", "OUTFALLS", outfalls));
  plan.edit(section_edit("storage", "STORAGE", storage));
  plan.edit(section_edit("conduits", "CONDUITS", conduit_rows(&layout)));
  plan.edit(section_edit("outlets", "OUTLETS", outlets));
  plan.edit(section_edit("xsections", "XSECTIONS", xsection_rows(&layout)));
  plan.edit(section_edit("curves", "CURVES", curves));
  plan.edit(MapExtent::of(&points).edit());
  plan.edit(section_edit("coordinates", "COORDINATES", coordinates));

  plan.nodes.extend(layout.new_nodes);
  plan.links.extend(layout.new_links);
  plan.demand_table = Some(demand_table);
  Ok(plan)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equal_demands_share_a_table() {
    assert_eq!(table_id(0.01), 10000);
    assert_eq!(table_id(0.0100000001), table_id(0.01));
    assert_ne!(table_id(0.011), table_id(0.01));
  }
}
