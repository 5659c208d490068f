use std::fs;
use std::path::Path;

use hashbrown::HashSet;
use simplelog::debug;

use crate::error::{InputError, OptionExt, ParseExt};
use crate::model::network::Network;
use crate::model::node::{Node, NodeType};
use crate::model::link::{Link, LinkType};
use crate::model::junction::Junction;
use crate::model::reservoir::Reservoir;
use crate::model::tank::Tank;
use crate::model::pipe::{Pipe, PipeStatus};
use crate::model::valve::{Valve, ValveType};
use crate::model::pump::Pump;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
  Junctions,
  Reservoirs,
  Tanks,
  Pipes,
  Pumps,
  Valves,
  Demands,
  Emitters,
  Coordinates,
  Options,
  Times,
  None,
}

impl ReadState {
  fn from_header(header: &str) -> ReadState {
    match header.to_uppercase().as_str() {
      "[JUNCTIONS]" => ReadState::Junctions,
      "[RESERVOIRS]" => ReadState::Reservoirs,
      "[TANKS]" => ReadState::Tanks,
      "[PIPES]" => ReadState::Pipes,
      "[PUMPS]" => ReadState::Pumps,
      "[VALVES]" => ReadState::Valves,
      "[DEMANDS]" => ReadState::Demands,
      "[EMITTERS]" => ReadState::Emitters,
      "[COORDINATES]" => ReadState::Coordinates,
      "[OPTIONS]" => ReadState::Options,
      "[TIMES]" => ReadState::Times,
      _ => ReadState::None,
    }
  }

  /// Sections whose rows refer to nodes and are read once all nodes are known
  fn is_deferred(&self) -> bool {
    matches!(self, ReadState::Pipes | ReadState::Pumps | ReadState::Valves | ReadState::Demands | ReadState::Emitters | ReadState::Coordinates)
  }
}

impl Network {
  /// Read a network from an INP file on disk
  pub fn from_file(path: impl AsRef<Path>) -> Result<Network, InputError> {
    let mut network = Network::default();
    network.read_file(path)?;
    Ok(network)
  }

  /// Read an INP file into this network
  pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<(), InputError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
      .map_err(|e| InputError::new(format!("Failed to open file: {}: {}", path.display(), e)))?;
    self.read_inp(&text)
  }

  /// Read a network from the text of an INP file.
  ///
  /// Node sections are read in a first pass; links, demands, emitters and coordinates are
  /// resolved afterwards so sections may appear in any order. Demands are converted to m^3/s.
  pub fn read_inp(&mut self, inp: &str) -> Result<(), InputError> {
    // set the initial state to none
    let mut state = ReadState::None;
    let mut deferred: Vec<(usize, ReadState, &str)> = Vec::new();

    for (index, raw) in inp.lines().enumerate() {
      let line_number = index + 1;
      // strip comments
      let line = raw.split(';').next().unwrap_or("").trim();

      if line.is_empty() {
        continue;
      }
      // if the line starts with [, it is a new section
      if line.starts_with('[') {
        state = ReadState::from_header(line);
        continue;
      }

      if state.is_deferred() {
        deferred.push((line_number, state, line));
        continue;
      }

      let result = match state {
        ReadState::Junctions => self.read_junction(line).and_then(|node| self.add_node(node)),
        ReadState::Reservoirs => self.read_reservoir(line).and_then(|node| self.add_node(node)),
        ReadState::Tanks => self.read_tank(line).and_then(|node| self.add_node(node)),
        ReadState::Options => self.read_option(line),
        ReadState::Times => self.read_time(line),
        _ => Ok(()),
      };
      result.map_err(|e| e.with_line(line_number))?;
    }

    let mut demand_overrides = HashSet::new();
    for (line_number, state, line) in deferred {
      let result = match state {
        ReadState::Pipes => self.read_pipe(line).and_then(|link| self.add_link(link)),
        ReadState::Pumps => self.read_pump(line).and_then(|link| self.add_link(link)),
        ReadState::Valves => self.read_valve(line).and_then(|link| self.add_link(link)),
        ReadState::Demands => self.read_demand(line, &mut demand_overrides),
        ReadState::Emitters => self.read_emitter(line),
        ReadState::Coordinates => self.read_coordinates(line),
        _ => Ok(()),
      };
      result.map_err(|e| e.with_line(line_number))?;
    }

    // express all demands in m^3/s
    let factor = self.options.flow_units.to_cms();
    for node in self.nodes.iter_mut() {
      if let NodeType::Junction(junction) = &mut node.node_type {
        junction.basedemand *= factor;
      }
    }

    debug!("Read {} nodes and {} links ({} flow units)", self.nodes.len(), self.links.len(), self.options.flow_units);
    Ok(())
  }

  /// Read a junction: ID, elevation, [demand], [pattern]
  fn read_junction(&self, line: &str) -> Result<Node, InputError> {
    let mut parts = line.split_whitespace();
    let id: Box<str> = parts.next().ok_or_missing("junction id")?.into();
    let elevation = parts.next().ok_or_missing("junction elevation")?.parse_field::<f64>("elevation")?;
    let basedemand = match parts.next() {
      Some(demand) => demand.parse_field::<f64>("demand")?,
      None => 0.0,
    };
    let pattern = parts.next().map(|p| p.into());

    Ok(Node {
      id,
      elevation,
      coordinates: None,
      node_type: NodeType::Junction(Junction { basedemand, pattern, emitter: None }),
    })
  }

  /// Read a reservoir: ID, head, [pattern]
  fn read_reservoir(&self, line: &str) -> Result<Node, InputError> {
    let mut parts = line.split_whitespace();
    let id: Box<str> = parts.next().ok_or_missing("reservoir id")?.into();
    let head = parts.next().ok_or_missing("reservoir head")?.parse_field::<f64>("head")?;
    let head_pattern = parts.next().map(|p| p.into());

    Ok(Node {
      id,
      elevation: head,
      coordinates: None,
      node_type: NodeType::Reservoir(Reservoir { head_pattern }),
    })
  }

  /// Read a tank: ID, elevation, initial level, min level, max level, diameter, min volume, [curve]
  fn read_tank(&self, line: &str) -> Result<Node, InputError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 6 {
      return Err(InputError::new("Tank requires at least 6 fields").with_context(line.to_string()));
    }
    let field = |index: usize, name: &str| -> Result<f64, InputError> {
      match parts.get(index) {
        Some(value) => value.parse_field::<f64>(name),
        None => Ok(0.0),
      }
    };
    let volume_curve_id = parts.get(7).filter(|c| **c != "*").map(|c| (*c).into());

    Ok(Node {
      id: parts[0].into(),
      elevation: field(1, "elevation")?,
      coordinates: None,
      node_type: NodeType::Tank(Tank {
        initial_level: field(2, "initial level")?,
        min_level: field(3, "minimum level")?,
        max_level: field(4, "maximum level")?,
        diameter: field(5, "diameter")?,
        min_volume: field(6, "minimum volume")?,
        volume_curve_id,
      }),
    })
  }

  /// Both ends of a link must be nodes read earlier
  fn check_link_nodes(&self, start: &str, end: &str) -> Result<(), InputError> {
    for id in [start, end] {
      if !self.node_map.contains_key(id) {
        return Err(InputError::new(format!("Unknown node: {}", id)));
      }
    }
    Ok(())
  }

  /// Read a pipe: ID, node1, node2, length, diameter, roughness, [minor loss], [status]
  fn read_pipe(&self, line: &str) -> Result<Link, InputError> {
    let mut parts = line.split_whitespace();
    let id: Box<str> = parts.next().ok_or_missing("pipe id")?.into();
    let start_node_id: Box<str> = parts.next().ok_or_missing("pipe start node")?.into();
    let end_node_id: Box<str> = parts.next().ok_or_missing("pipe end node")?.into();
    let length = parts.next().ok_or_missing("pipe length")?.parse_field::<f64>("length")?;
    let diameter = parts.next().ok_or_missing("pipe diameter")?.parse_field::<f64>("diameter")?;
    let roughness = parts.next().ok_or_missing("pipe roughness")?.parse_field::<f64>("roughness")?;
    let minor_loss = match parts.next() {
      Some(value) => value.parse_field::<f64>("minor loss")?,
      None => 0.0,
    };
    let status = match parts.next() {
      Some(value) => value.parse::<PipeStatus>().map_err(InputError::new)?,
      None => PipeStatus::Open,
    };

    self.check_link_nodes(&start_node_id, &end_node_id)?;
    Ok(Link {
      id,
      start_node_id,
      end_node_id,
      link_type: LinkType::Pipe(Pipe { diameter, length, roughness, minor_loss, status }),
    })
  }

  /// Read a pump: ID, node1, node2; the keyword/value parameters are left in the text
  fn read_pump(&self, line: &str) -> Result<Link, InputError> {
    let mut parts = line.split_whitespace();
    let id: Box<str> = parts.next().ok_or_missing("pump id")?.into();
    let start_node_id: Box<str> = parts.next().ok_or_missing("pump start node")?.into();
    let end_node_id: Box<str> = parts.next().ok_or_missing("pump end node")?.into();

    self.check_link_nodes(&start_node_id, &end_node_id)?;
    Ok(Link { id, start_node_id, end_node_id, link_type: LinkType::Pump(Pump) })
  }

  /// Read a valve: ID, node1, node2, diameter, type, setting, [minor loss]
  fn read_valve(&self, line: &str) -> Result<Link, InputError> {
    let mut parts = line.split_whitespace();
    let id: Box<str> = parts.next().ok_or_missing("valve id")?.into();
    let start_node_id: Box<str> = parts.next().ok_or_missing("valve start node")?.into();
    let end_node_id: Box<str> = parts.next().ok_or_missing("valve end node")?.into();
    let diameter = parts.next().ok_or_missing("valve diameter")?.parse_field::<f64>("diameter")?;
    let valve_type = parts.next().ok_or_missing("valve type")?
      .parse::<ValveType>().map_err(InputError::new)?;
    let setting_field = parts.next().ok_or_missing("valve setting")?;
    // GPV settings are curve ids
    let setting = match valve_type {
      ValveType::GPV => 0.0,
      _ => setting_field.parse_field::<f64>("setting")?,
    };
    let minor_loss = match parts.next() {
      Some(value) => value.parse_field::<f64>("minor loss")?,
      None => 0.0,
    };

    self.check_link_nodes(&start_node_id, &end_node_id)?;
    Ok(Link {
      id,
      start_node_id,
      end_node_id,
      link_type: LinkType::Valve(Valve { diameter, setting, minor_loss, valve_type }),
    })
  }

  /// Read a demand row: junction, demand, [pattern], [category]
  ///
  /// The first row for a junction replaces the demand from [JUNCTIONS], later rows add to it.
  fn read_demand(&mut self, line: &str, overrides: &mut HashSet<Box<str>>) -> Result<(), InputError> {
    let mut parts = line.split_whitespace();
    let id: Box<str> = parts.next().ok_or_missing("demand junction")?.into();
    let demand = parts.next().ok_or_missing("demand")?.parse_field::<f64>("demand")?;
    let pattern = parts.next();

    let index = *self.node_map.get(&id)
      .ok_or_else(|| InputError::new(format!("Unknown node: {}", id)))?;
    let NodeType::Junction(junction) = &mut self.nodes[index].node_type else {
      return Err(InputError::new(format!("Demand can only be set for junctions: {}", id)));
    };
    if overrides.insert(id) {
      junction.basedemand = demand;
      if let Some(pattern) = pattern {
        junction.pattern = Some(pattern.into());
      }
    } else {
      junction.basedemand += demand;
    }
    Ok(())
  }

  /// Read an emitter row: junction, coefficient
  fn read_emitter(&mut self, line: &str) -> Result<(), InputError> {
    let mut parts = line.split_whitespace();
    let id = parts.next().ok_or_missing("emitter junction")?;
    let coefficient = parts.next().ok_or_missing("emitter coefficient")?.parse_field::<f64>("coefficient")?;
    let index = *self.node_map.get(id)
      .ok_or_else(|| InputError::new(format!("Unknown node: {}", id)))?;
    match &mut self.nodes[index].node_type {
      NodeType::Junction(junction) => {
        junction.emitter = Some(coefficient);
        Ok(())
      }
      _ => Err(InputError::new(format!("Emitters can only be set for junctions: {}", id))),
    }
  }

  /// Read a coordinate row: node, x, y
  fn read_coordinates(&mut self, line: &str) -> Result<(), InputError> {
    let mut parts = line.split_whitespace();
    let id = parts.next().ok_or_missing("coordinate node")?;
    let x = parts.next().ok_or_missing("x coordinate")?.parse_field::<f64>("x coordinate")?;
    let y = parts.next().ok_or_missing("y coordinate")?.parse_field::<f64>("y coordinate")?;
    let index = *self.node_map.get(id)
      .ok_or_else(|| InputError::new(format!("Unknown node: {}", id)))?;
    self.nodes[index].coordinates = Some((x, y));
    Ok(())
  }

  /// Read the options relevant to conversion; everything else is left to the file
  fn read_option(&mut self, line: &str) -> Result<(), InputError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let keyword = parts[0].to_uppercase();
    let second = parts.get(1).map(|s| s.to_uppercase()).unwrap_or_default();
    let value = |index: usize, name: &str| -> Result<f64, InputError> {
      parts.get(index).ok_or_missing(name)?.parse_field::<f64>(name)
    };

    match (keyword.as_str(), second.as_str()) {
      ("UNITS", _) => {
        self.options.flow_units = parts.get(1).ok_or_missing("units")?
          .parse().map_err(InputError::new)?;
      }
      ("DEMAND", "MODEL") => {
        self.options.demand_model = parts.get(2).ok_or_missing("demand model")?
          .parse().map_err(InputError::new)?;
      }
      ("MINIMUM", "PRESSURE") => self.options.minimum_pressure = value(2, "minimum pressure")?,
      ("REQUIRED", "PRESSURE") => self.options.required_pressure = value(2, "required pressure")?,
      ("EMITTER", "EXPONENT") => self.options.emitter_exponent = value(2, "emitter exponent")?,
      _ => {}
    }
    Ok(())
  }

  fn read_time(&mut self, line: &str) -> Result<(), InputError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts[0].eq_ignore_ascii_case("DURATION") {
      let value = parts.get(1).ok_or_missing("duration")?;
      self.options.duration = parse_clock_time(value, parts.get(2).copied())?;
    }
    Ok(())
  }
}

/// Parse an EPANET time value ("4:00", "4:30:00", "4.5", "90 MIN") into seconds
pub fn parse_clock_time(value: &str, unit: Option<&str>) -> Result<u64, InputError> {
  if value.contains(':') {
    let mut seconds = 0.0;
    let mut scale = 3600.0;
    for part in value.split(':') {
      seconds += part.parse_field::<f64>("time")? * scale;
      scale /= 60.0;
    }
    return Ok(seconds.round() as u64);
  }
  let amount = value.parse_field::<f64>("time")?;
  let scale = match unit.map(|u| u.to_uppercase()).as_deref() {
    None | Some("HOURS") | Some("HOUR") | Some("HR") => 3600.0,
    Some("MIN") | Some("MINUTES") | Some("MINUTE") => 60.0,
    Some("SEC") | Some("SECONDS") | Some("SECOND") => 1.0,
    Some("DAYS") | Some("DAY") => 86400.0,
    Some(other) => return Err(InputError::new(format!("Invalid time unit: {}", other))),
  };
  if amount < 0.0 {
    return Err(InputError::new(format!("Negative time: {}", value)));
  }
  Ok((amount * scale).round() as u64)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clock_times() {
    assert_eq!(parse_clock_time("4:00", None).unwrap(), 4 * 3600);
    assert_eq!(parse_clock_time("0:30:15", None).unwrap(), 30 * 60 + 15);
    assert_eq!(parse_clock_time("90", Some("MIN")).unwrap(), 90 * 60);
    assert_eq!(parse_clock_time("2.5", None).unwrap(), 9000);
    assert!(parse_clock_time("x", None).is_err());
  }

  #[test]
  fn demands_section_overrides_then_adds() {
    let inp = "[JUNCTIONS]\n J1 10 5 ;\n[RESERVOIRS]\n R1 50\n[DEMANDS]\n J1 2\n J1 3\n[OPTIONS]\n Units LPS\n";
    let mut network = Network::default();
    network.read_inp(inp).unwrap();
    let demand = network.node("J1").unwrap().base_demand();
    assert!((demand - 0.005).abs() < 1e-12);
  }

  #[test]
  fn unknown_node_reports_line() {
    let inp = "[JUNCTIONS]\n J1 10\n[PIPES]\n P1 J1 J9 10 100 130\n";
    let err = Network::default().read_inp(inp).unwrap_err();
    assert_eq!(err.line, Some(4));
    assert!(err.message.contains("J9"));
  }

  #[test]
  fn duplicate_node_is_rejected() {
    let inp = "[JUNCTIONS]\n J1 10\n J1 12\n";
    let err = Network::default().read_inp(inp).unwrap_err();
    assert_eq!(err.line, Some(3));
  }
}
