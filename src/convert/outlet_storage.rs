use crate::constants::{
  DUMMY_OUTLET_COEFFICIENT, EMITTER_EXPONENT, LPS_PER_CMS, MIN_STORAGE_DEPTH, RESERVOIR_DEPTH_MARGIN,
  RESERVOIR_STORAGE_DROP, UNIT_HEIGHT,
};
use crate::convert::swmm::{
  conduit_rows, coordinate_row, curve_rows, end_time_edit, junction_rows, layout, outfall_row,
  reservoir_storage_row, section_edit, xsection_rows, MapExtent, SwmmLayout,
};
use crate::convert::{Context, Method, Plan};
use crate::discretize::RESERVOIR_ELEVATION_OFFSET;
use crate::error::ConvertError;
use crate::hydraulics::desired_volume;
use crate::utils::record::Record;

const STORAGE_OFFSET: (f64, f64) = (2.0, 2.0);
const DUMMY_OFFSET: (f64, f64) = (-2.0, -2.0);
const DUMMY_OUTFALL: &str = "DummyOutfall";
const DUMMY_OUTLET: &str = "DummyOutlet";

/// Storage curve depths: full area up to the unit height, then practically nothing
const STORAGE_CURVE_DEPTHS: [f64; 4] = [0.0, 1.0, 1.0001, 100.0];
const NEGLIGIBLE_AREA: f64 = 0.000001;

/// Storage curve shared by consumers with the same area, keyed in cm^2
fn curve_id(area: f64) -> i64 {
  (area * 10_000.0).round() as i64
}

fn storage_curve(area: f64) -> Vec<(f64, f64)> {
  STORAGE_CURVE_DEPTHS.iter()
    .map(|&depth| (depth, if depth <= UNIT_HEIGHT { area } else { NEGLIGIBLE_AREA }))
    .collect()
}

/// Elevation of a reservoir's storage unit: below its head, or just above a split conduit
fn reservoir_elevation(head: f64, split_elevation: Option<f64>) -> f64 {
  match split_elevation {
    Some(elevation) => elevation + RESERVOIR_ELEVATION_OFFSET,
    None => head - RESERVOIR_STORAGE_DROP,
  }
}

/// SWMM needs an outfall; this one drains a negligible flow from the first junction
fn dummy_outlet(layout: &SwmmLayout, ctx: &Context) -> Option<(String, String, (f64, f64))> {
  let first = layout.junctions.first()?;
  let elevation = ctx.demand_nodes.iter().map(|n| n.elevation).reduce(f64::min)
    .or_else(|| layout.junctions.iter().map(|j| j.elevation).reduce(f64::min))
    .unwrap_or(0.0);
  let outlet = Record::new(DUMMY_OUTLET)
    .text(&*first.id)
    .text(DUMMY_OUTFALL)
    .num(0.0)
    .text("FUNCTIONAL/DEPTH")
    .num(DUMMY_OUTLET_COEFFICIENT)
    .num(0.0)
    .text("YES")
    .render();
  let (x, y) = first.coordinates;
  Some((outfall_row(DUMMY_OUTFALL, elevation), outlet, (x + DUMMY_OFFSET.0, y + DUMMY_OFFSET.1)))
}

/// Each demand junction fills a unit-height storage unit sized for its supply volume, through
/// an outlet following the pressure-dependent withdrawal
pub(super) fn plan(ctx: &Context) -> Result<Plan, ConvertError> {
  let dh = ctx.pressure.require_differential(Method::OutletStorage.label())?;
  let layout = layout(ctx)?;
  let mut plan = Plan::swmm();
  let max_head = layout.max_reservoir_head();

  let reservoir_depth = MIN_STORAGE_DEPTH.max(max_head + RESERVOIR_DEPTH_MARGIN);
  let mut storage: Vec<String> = layout.reservoirs.iter()
    .map(|r| {
      let elevation = reservoir_elevation(r.head, r.split_elevation);
      reservoir_storage_row(&r.id, elevation, reservoir_depth, r.head - elevation)
    })
    .collect();

  let storage_depth = MIN_STORAGE_DEPTH.max(max_head);
  let mut outlets = Vec::new();
  let mut curve_ids: Vec<i64> = Vec::new();
  let mut demand_table = Vec::new();
  let mut storage_coordinates = Vec::new();

  for node in &ctx.demand_nodes {
    let storage_id = format!("StorageforNode{}", node.id);
    let outlet_id = format!("Outlet{}", node.id);
    let area = desired_volume(node.demand, ctx.duration_minutes) / UNIT_HEIGHT;
    let curve = curve_id(area);

    storage.push(
      Record::new(&storage_id)
        .num(node.elevation)
        .num(storage_depth)
        .num(0.0)
        .text("TABULAR")
        .text(curve.to_string())
        .blank()
        .blank()
        .num(0.0)
        .num(0.0)
        .render(),
    );
    outlets.push(
      Record::new(&outlet_id)
        .text(node.id)
        .text(&storage_id)
        .num(0.0)
        .text("FUNCTIONAL/DEPTH")
        .num(node.demand * LPS_PER_CMS / dh.sqrt())
        .num(EMITTER_EXPONENT)
        .text("YES")
        .render(),
    );
    let (x, y) = node.coordinates;
    storage_coordinates.push(coordinate_row(&storage_id, (x + STORAGE_OFFSET.0, y + STORAGE_OFFSET.1)));
    if !curve_ids.contains(&curve) {
      curve_ids.push(curve);
    }
    demand_table.push((outlet_id.clone(), node.demand));

    plan.nodes.push(storage_id);
    plan.links.push(outlet_id);
  }

  let curves: Vec<String> = curve_ids.iter()
    .flat_map(|&curve| curve_rows(&curve.to_string(), "Storage", &storage_curve(curve as f64 / 10_000.0)))
    .collect();

  let mut points: Vec<(f64, f64)> = layout.junctions.iter().map(|j| j.coordinates).collect();
  points.extend(layout.reservoirs.iter().map(|r| r.coordinates));
  points.extend(ctx.demand_nodes.iter().map(|n| (n.coordinates.0 + STORAGE_OFFSET.0, n.coordinates.1 + STORAGE_OFFSET.1)));
  let mut coordinates: Vec<String> = layout.junctions.iter().map(|j| coordinate_row(&j.id, j.coordinates))
    .chain(layout.reservoirs.iter().map(|r| coordinate_row(&r.id, r.coordinates)))
    .collect();
  coordinates.extend(storage_coordinates);

  let mut outfalls = Vec::new();
  if let Some((outfall, outlet, position)) = dummy_outlet(&layout, ctx) {
    outfalls.push(outfall);
    outlets.push(outlet);
    coordinates.push(coordinate_row(DUMMY_OUTFALL, position));
    points.push(position);
    plan.nodes.push(DUMMY_OUTFALL.to_string());
    plan.links.push(DUMMY_OUTLET.to_string());
  }

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
