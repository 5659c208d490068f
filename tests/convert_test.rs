//! Integration tests converting the fixture networks with every method

use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use tempfile::TempDir;

use iws_rs::convert::{convert, convert_all, duration::change_duration, ConvertOptions, Method};
use iws_rs::error::ConvertError;
use iws_rs::hydraulics::{desired_volume, headloss_pipe_length};
use iws_rs::model::network::Network;
use iws_rs::model::node::NodeType;
use iws_rs::model::pipe::PipeStatus;

/// Copy a fixture into a scratch directory so outputs land next to it
fn stage(name: &str) -> (TempDir, PathBuf) {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let path = dir.path().join(name);
  fs::copy(Path::new("networks").join(name), &path).expect("Failed to copy fixture");
  (dir, path)
}

/// Stage a fixture with its text rewritten
fn stage_modified(name: &str, edit: impl Fn(&str) -> String) -> (TempDir, PathBuf) {
  let (dir, path) = stage(name);
  let text = fs::read_to_string(&path).unwrap();
  fs::write(&path, edit(&text)).unwrap();
  (dir, path)
}

/// Drop a section, header included, up to the next header
fn without_section(text: &str, header: &str) -> String {
  let mut skipping = false;
  let mut kept = String::new();
  for line in text.lines() {
    if line.starts_with('[') {
      skipping = line == header;
    }
    if !skipping {
      kept.push_str(line);
      kept.push('\n');
    }
  }
  kept
}

fn outputs(dir: &TempDir) -> Vec<String> {
  let mut names: Vec<String> = fs::read_dir(dir.path()).unwrap()
    .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
    .collect();
  names.sort();
  names
}

/// Check that every expected element exists and the counts grew as expected
fn verify_added(source: &Network, converted: &Network, nodes: &[&str], links: &[&str]) {
  for id in nodes {
    assert!(converted.node(id).is_some(), "Node {} not found", id);
  }
  for id in links {
    assert!(converted.link(id).is_some(), "Link {} not found", id);
  }
  assert_eq!(converted.nodes.len(), source.nodes.len() + nodes.len(), "unexpected node count");
  assert_eq!(converted.links.len(), source.links.len() + links.len(), "unexpected link count");
}

#[test]
fn test_cv_tank_sizes_tank_for_supply_volume() {
  let (_dir, path) = stage("simple.inp");
  let conversion = convert(&path, Method::CvTank, &ConvertOptions::default()).unwrap();
  assert!(conversion.output.ends_with("simple_CV-Tank.inp"));
  assert!(conversion.demand_table.is_none());

  let source = Network::from_file(&path).unwrap();
  let converted = Network::from_file(&conversion.output).unwrap();
  verify_added(&source, &converted, &["TankforNodeJ1"], &["PipeforNodeJ1"]);

  let tank = converted.node("TankforNodeJ1").unwrap();
  let NodeType::Tank(tank_data) = &tank.node_type else { panic!("TankforNodeJ1 is not a tank") };
  assert_relative_eq!(tank.elevation, 10.0);
  assert_relative_eq!(tank_data.diameter, 13.5406, epsilon = 1e-4);
  // the tank holds what J1 should receive over four hours
  assert_relative_eq!(tank_data.active_volume(), desired_volume(0.01, 240.0), max_relative = 1e-4);

  let pipe = converted.link("PipeforNodeJ1").unwrap().as_pipe().unwrap();
  assert_relative_eq!(pipe.length, headloss_pipe_length(0.01, 10.0));
  assert_relative_eq!(pipe.diameter, 50.0);
  assert_eq!(pipe.status, PipeStatus::CheckValve);

  // demands moved to the tank, nothing else draws water
  assert_eq!(converted.demand_nodes().count(), 0);
  assert!(converted.node("TankforNodeJ2").is_none());
  assert_relative_eq!(converted.options.required_pressure, 10.0);
  assert_relative_eq!(converted.options.minimum_pressure, 0.0);
}

#[test]
fn test_placements_point_at_generated_blocks() {
  let (_dir, path) = stage("simple.inp");
  let conversion = convert(&path, Method::CvTank, &ConvertOptions::default()).unwrap();
  let text = fs::read_to_string(&conversion.output).unwrap();
  let lines: Vec<&str> = text.lines().collect();

  let expected = [
    ("junctions", " J1"),
    ("tanks", " TankforNodeJ1"),
    ("pipes", " PipeforNodeJ1"),
    ("pressure options", " Minimum Pressure"),
    ("coordinates", " TankforNodeJ1"),
  ];
  for (name, prefix) in expected {
    let placement = conversion.placements.iter().find(|p| p.name == name)
      .unwrap_or_else(|| panic!("no placement for {}", name));
    assert!(lines[placement.line].starts_with(prefix), "{} landed on '{}'", name, lines[placement.line]);
  }

  // untouched text is carried over verbatim
  let source = fs::read_to_string(&path).unwrap();
  for unchanged in ["Single reservoir feeding two consumers", " Duration           \t4:00", " Units              \tLPS"] {
    assert!(source.contains(unchanged));
    assert!(text.contains(unchanged), "'{}' was lost", unchanged);
  }
  assert!(text.ends_with("[END]\n"));
}

#[test]
fn test_epanet_methods_round_trip() {
  let (_dir, path) = stage("branched.inp");
  let source = Network::from_file(&path).unwrap();
  let consumers = ["N2", "N3", "N4", "N5"];
  let ids = |prefixes: &[&str]| -> Vec<String> {
    prefixes.iter().flat_map(|prefix| consumers.iter().map(move |id| format!("{}{}", prefix, id))).collect()
  };

  let cases: [(Method, Vec<String>, Vec<String>); 5] = [
    (Method::CvTank, ids(&["TankforNode"]), ids(&["PipeforNode"])),
    (Method::CvRes, ids(&["AR"]), ids(&["PipeforNode"])),
    (Method::FcvEm, ids(&["ANforNode", "EM"]), ids(&["Pipe1forNode", "FCVforNode"])),
    (Method::FcvRes, ids(&["ANforNode", "AR"]), ids(&["Pipe1forNode", "FCVforNode"])),
    (Method::PsvTank, ids(&["AN1forNode", "AN2forNode", "ATforNode"]), ids(&["Pipe1forNode", "Pipe2forNode", "APSVforNode"])),
  ];
  for (method, nodes, links) in cases {
    let conversion = convert(&path, method, &ConvertOptions::default())
      .unwrap_or_else(|e| panic!("{} failed: {}", method, e));
    let converted = Network::from_file(&conversion.output).unwrap();
    let nodes: Vec<&str> = nodes.iter().map(String::as_str).collect();
    let links: Vec<&str> = links.iter().map(String::as_str).collect();
    verify_added(&source, &converted, &nodes, &links);
    assert_eq!(converted.demand_nodes().count(), 0, "{} left demands behind", method);
  }
}

#[test]
fn test_fcv_em_settings_and_emitters() {
  let (_dir, path) = stage("branched.inp");
  let conversion = convert(&path, Method::FcvEm, &ConvertOptions { hmin: 2.0, hdes: 12.0, ..Default::default() }).unwrap();
  let converted = Network::from_file(&conversion.output).unwrap();

  let valve = converted.link("FCVforNodeN3").unwrap().as_valve().unwrap();
  assert_relative_eq!(valve.setting, 8.0, epsilon = 1e-9);
  let NodeType::Junction(emitter) = &converted.node("EMN3").unwrap().node_type else { panic!("EMN3 is not a junction") };
  assert_relative_eq!(emitter.emitter.unwrap(), 8.0 / 10.0_f64.sqrt(), epsilon = 1e-4);
  assert_relative_eq!(converted.options.emitter_exponent, 0.5);
  assert_relative_eq!(converted.options.minimum_pressure, 2.0);
  assert_relative_eq!(converted.options.required_pressure, 12.0);
}

#[test]
fn test_zero_differential_only_rejected_where_divided() {
  let (dir, path) = stage("simple.inp");
  let flat = ConvertOptions { hmin: 5.0, hdes: 5.0, ..Default::default() };

  let result = convert(&path, Method::FcvEm, &flat);
  assert!(matches!(result, Err(ConvertError::ZeroPressureDifferential { .. })));
  assert_eq!(outputs(&dir), vec!["simple.inp".to_string()]);

  assert!(convert(&path, Method::CvTank, &flat).is_ok());
  assert!(matches!(
    convert(&path, Method::CvTank, &ConvertOptions { hmin: 10.0, hdes: 5.0, ..Default::default() }),
    Err(ConvertError::InvalidPressureRange { .. })
  ));
}

#[test]
fn test_demand_driven_network_is_rejected() {
  let (dir, path) = stage_modified("simple.inp", |text| text.replace("\tPDA", "\tDDA"));
  let result = convert(&path, Method::CvRes, &ConvertOptions::default());
  assert!(matches!(result, Err(ConvertError::WrongDemandModel(_))));
  assert_eq!(outputs(&dir), vec!["simple.inp".to_string()]);
}

#[test]
fn test_imperial_units_are_rejected() {
  let (dir, path) = stage_modified("simple.inp", |text| text.replace("\tLPS", "\tGPM"));
  let result = convert(&path, Method::CvTank, &ConvertOptions::default());
  assert!(matches!(result, Err(ConvertError::UnsupportedUnits(ref units)) if units == "GPM"));
  assert_eq!(outputs(&dir), vec!["simple.inp".to_string()]);
}

#[test]
fn test_generated_ids_may_not_shadow_existing_ones() {
  let (dir, path) = stage_modified("simple.inp", |text| {
    text.replace("\n\n[RESERVOIRS]", "\n TankforNodeJ1  \t5  \t0  \t;\n\n[RESERVOIRS]")
  });
  assert!(Network::from_file(&path).unwrap().node("TankforNodeJ1").is_some());

  let result = convert(&path, Method::CvTank, &ConvertOptions::default());
  assert!(matches!(result, Err(ConvertError::IdCollision(ref id)) if id == "TankforNodeJ1"));
  assert_eq!(outputs(&dir), vec!["simple.inp".to_string()]);

  // other methods name their elements differently
  assert!(convert(&path, Method::FcvRes, &ConvertOptions::default()).is_ok());
}

#[test]
fn test_negative_demand_is_reported_with_its_node() {
  let (dir, path) = stage_modified("simple.inp", |text| {
    without_section(text, "[DEMANDS]").replacen("\t10          \t10          \t", "\t10          \t-10         \t", 1)
  });
  let result = convert(&path, Method::CvTank, &ConvertOptions::default());
  assert!(matches!(result, Err(ConvertError::InvalidDemand { ref node, .. }) if &**node == "J1"));
  assert_eq!(outputs(&dir), vec!["simple.inp".to_string()]);
}

#[test]
fn test_missing_section_writes_nothing() {
  let (dir, path) = stage_modified("simple.inp", |text| without_section(text, "[TANKS]"));
  assert!(!fs::read_to_string(&path).unwrap().contains("[TANKS]"));

  let result = convert(&path, Method::CvTank, &ConvertOptions::default());
  assert!(matches!(result, Err(ConvertError::MissingSection(ref name)) if name == "TANKS"));
  assert_eq!(outputs(&dir), vec!["simple.inp".to_string()]);

  // methods that do not touch [TANKS] still work
  assert!(convert(&path, Method::CvRes, &ConvertOptions::default()).is_ok());
}

#[test]
fn test_outlet_outfall_discretizes_and_writes_demands() {
  let (_dir, path) = stage("simple.inp");
  let conversion = convert(&path, Method::OutletOutfall, &ConvertOptions::default()).unwrap();
  let text = fs::read_to_string(&conversion.output).unwrap();

  // P1 (257 m) becomes three conduits, P2 (80 m) stays whole
  for id in ["P1-1", "P1-2", "P1-3", "P2", "R1-1-J1", "R1-2-J1", "OutfallJ1", "OutletJ1"] {
    assert!(text.lines().any(|line| line.split_whitespace().next() == Some(id)), "{} missing", id);
  }
  assert!(!text.lines().any(|line| line.split_whitespace().next() == Some("P1")));
  assert!(text.contains("END_TIME             04:00:00"));
  assert!(text.lines().any(|line| line.split_whitespace().collect::<Vec<_>>() == ["10000", "Rating", "0", "0"]));

  let table = conversion.demand_table.unwrap();
  assert!(table.ends_with("simple_Outlet-Outfall_Demands.csv"));
  assert_eq!(fs::read_to_string(table).unwrap(), "ID,Demand\nOutletJ1,0.01\n");
}

#[test]
fn test_outlet_storage_sizes_storage_and_reservoir() {
  let (_dir, path) = stage("simple.inp");
  let conversion = convert(&path, Method::OutletStorage, &ConvertOptions::default()).unwrap();
  let text = fs::read_to_string(&conversion.output).unwrap();
  let row = |id: &str| -> Vec<String> {
    text.lines()
      .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
      .find(|fields| fields.first().map(String::as_str) == Some(id) && fields.len() > 4)
      .unwrap_or_else(|| panic!("no row for {}", id))
  };

  // R1 starts the split P1, so it sits just above the first interior node
  assert_eq!(row("R1")[..5], ["R1", "12", "100", "38", "FUNCTIONAL"]);
  assert_eq!(row("StorageforNodeJ1")[..6], ["StorageforNodeJ1", "10", "100", "0", "TABULAR", "1440000"]);
  assert_eq!(row("OutletJ1")[..5], ["OutletJ1", "J1", "StorageforNodeJ1", "0", "FUNCTIONAL/DEPTH"]);
  assert_eq!(row("DummyOutlet")[..3], ["DummyOutlet", "J1", "DummyOutfall"]);
  assert!(conversion.demand_table.is_some());
}

#[test]
fn test_outlet_methods_split_parallel_mains() {
  let (_dir, path) = stage_modified("simple.inp", |text| {
    text.replace("\n\n[PUMPS]", "\n P3  \tR1  \tJ1  \t300  \t150  \t130  \t0  \tOpen  \t;\n\n[PUMPS]")
  });
  for method in [Method::OutletOutfall, Method::OutletStorage] {
    let conversion = convert(&path, method, &ConvertOptions::default())
      .unwrap_or_else(|e| panic!("{} failed: {}", method, e));
    let text = fs::read_to_string(&conversion.output).unwrap();
    let first_fields: Vec<&str> = text.lines().filter_map(|line| line.split_whitespace().next()).collect();
    for id in ["R1-1-J1", "R1-2-J1", "R1-P3-1-J1", "R1-P3-2-J1", "P1-3", "P3-1", "P3-3"] {
      assert!(first_fields.contains(&id), "{}: {} missing", method, id);
    }
  }
}

#[test]
fn test_full_day_supply_converts_to_swmm() {
  let (_dir, path) = stage("simple.inp");
  let full_day = change_duration(&path, 24, 0).unwrap();
  let conversion = convert(&full_day, Method::OutletOutfall, &ConvertOptions::default()).unwrap();
  let text = fs::read_to_string(&conversion.output).unwrap();
  assert!(text.contains("END_TIME             24:00:00"));
}

#[test]
fn test_swmm_rejects_tanks() {
  let (_dir, path) = stage_modified("simple.inp", |text| {
    text.replace("[TANKS]\n", "[TANKS]\n T1  30  1  0  5  10  0  ;\n")
  });
  let result = convert(&path, Method::OutletOutfall, &ConvertOptions::default());
  assert!(matches!(result, Err(ConvertError::UnsupportedElement { ref id, .. }) if &**id == "T1"));
}

#[test]
fn test_convert_all_runs_every_method() {
  let (dir, path) = stage("simple.inp");
  let results = convert_all(&path, &ConvertOptions::default());
  assert_eq!(results.len(), Method::ALL.len());
  for (method, result) in &results {
    assert!(result.is_ok(), "{} failed: {:?}", method, result.as_ref().err());
  }
  // seven models plus the demands tables of the two outlet methods
  assert_eq!(outputs(&dir).len(), 1 + 7 + 2);
}

#[test]
fn test_change_duration_scales_demands() {
  let (_dir, path) = stage("branched.inp");
  let output = change_duration(&path, 3, 0).unwrap();
  assert!(output.ends_with("branched_3hr.inp"));

  let source = Network::from_file(&path).unwrap();
  let rescaled = Network::from_file(&output).unwrap();
  assert_eq!(rescaled.options.duration, 3 * 3600);
  for node in source.junctions() {
    let scaled = rescaled.node(&node.id).unwrap();
    assert_relative_eq!(scaled.base_demand(), node.base_demand() * 2.0, epsilon = 1e-12);
  }
  // the supplied volume is unchanged
  let n3 = rescaled.node("N3").unwrap();
  assert_relative_eq!(desired_volume(n3.base_demand(), 180.0), desired_volume(0.008, 360.0), epsilon = 1e-9);
  let NodeType::Junction(junction) = &n3.node_type else { panic!("N3 is not a junction") };
  assert_eq!(junction.pattern.as_deref(), Some("1"));

  let output = change_duration(&path, 2, 30).unwrap();
  assert!(output.ends_with("branched_2hr30min.inp"));
  assert_eq!(Network::from_file(&output).unwrap().options.duration, 2 * 3600 + 30 * 60);
}

#[test]
fn test_change_duration_replaces_demand_rows() {
  let (_dir, path) = stage("simple.inp");
  let output = change_duration(&path, 8, 0).unwrap();
  let rescaled = Network::from_file(&output).unwrap();
  // [DEMANDS] rows are folded into [JUNCTIONS] instead of overriding them
  assert_relative_eq!(rescaled.node("J1").unwrap().base_demand(), 0.005, epsilon = 1e-12);
  assert_relative_eq!(rescaled.options.duration_minutes(), 480.0);
}
