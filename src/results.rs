//! Time series produced by an external hydraulic solver for a converted model.
//!
//! Files are JSON or MessagePack, picked by extension. Series are stored per timestep:
//! `pressures[t][node]`, `demands[t][node]`, `flows[t][link]`. Flows of EPANET models are in
//! m^3/s; flows of SWMM models are in the template's LPS.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use hashbrown::HashMap;
use rmp_serde::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
  Json,
  MessagePack,
}

fn format_of(path: &Path) -> Result<Format, ConvertError> {
  match path.extension().and_then(|ext| ext.to_str()) {
    Some("json") => Ok(Format::Json),
    Some("mpk") | Some("msgpack") => Ok(Format::MessagePack),
    other => Err(ConvertError::Results(format!("Unsupported file extension: {}", other.unwrap_or("")))),
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
  /// Seconds since the start of the simulation
  pub times: Vec<f64>,
  #[serde(alias = "nodes")]
  pub node_ids: Vec<String>,
  #[serde(alias = "links")]
  pub link_ids: Vec<String>,
  /// Pressure (EPANET) or depth (SWMM) per timestep and node
  #[serde(default)]
  pub pressures: Vec<Vec<f64>>,
  #[serde(default)]
  pub demands: Vec<Vec<f64>>,
  #[serde(default)]
  pub flows: Vec<Vec<f64>>,
}

/// Which series of the results to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
  Pressure,
  Demand,
  Flow,
}

impl SimulationResults {
  pub fn read_file(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
    let path = path.as_ref();
    let format = format_of(path)?;
    let reader = BufReader::new(File::open(path)?);
    let results: SimulationResults = match format {
      Format::Json => serde_json::from_reader(reader)
        .map_err(|e| ConvertError::Results(format!("Failed to parse {}: {}", path.display(), e)))?,
      Format::MessagePack => rmp_serde::from_read(reader)
        .map_err(|e| ConvertError::Results(format!("Failed to parse {}: {}", path.display(), e)))?,
    };
    results.check()?;
    Ok(results)
  }

  pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), ConvertError> {
    let path = path.as_ref();
    let format = format_of(path)?;
    let writer = BufWriter::new(File::create(path)?);
    match format {
      Format::Json => serde_json::to_writer(writer, self)
        .map_err(|e| ConvertError::Results(format!("Failed to write results to file: {}", e)))?,
      Format::MessagePack => {
        let mut serializer = Serializer::new(writer).with_struct_map();
        self.serialize(&mut serializer).map_err(|e| ConvertError::Results(format!("Failed to write results to file: {}", e)))?
      }
    }
    Ok(())
  }

  /// Every present series must have one row per timestep and one column per element
  pub fn check(&self) -> Result<(), ConvertError> {
    if self.times.windows(2).any(|w| w[1] <= w[0]) {
      return Err(ConvertError::Results("times must be strictly increasing".to_string()));
    }
    let shapes = [
      ("pressures", &self.pressures, self.node_ids.len()),
      ("demands", &self.demands, self.node_ids.len()),
      ("flows", &self.flows, self.link_ids.len()),
    ];
    for (name, rows, width) in shapes {
      if rows.is_empty() {
        continue;
      }
      if rows.len() != self.times.len() {
        return Err(ConvertError::Results(format!("{} has {} timesteps, expected {}", name, rows.len(), self.times.len())));
      }
      if let Some(t) = rows.iter().position(|row| row.len() != width) {
        return Err(ConvertError::Results(format!("{} at timestep {} has {} values, expected {}", name, t, rows[t].len(), width)));
      }
    }
    Ok(())
  }

  /// Node or link ids a series is keyed by
  pub fn ids(&self, series: Series) -> &[String] {
    match series {
      Series::Pressure | Series::Demand => &self.node_ids,
      Series::Flow => &self.link_ids,
    }
  }

  /// Column lookup for one series, indexed once for repeated queries
  pub fn columns(&self, series: Series) -> Result<Columns<'_>, ConvertError> {
    let (rows, name) = match series {
      Series::Pressure => (&self.pressures, "pressures"),
      Series::Demand => (&self.demands, "demands"),
      Series::Flow => (&self.flows, "flows"),
    };
    if rows.is_empty() {
      return Err(ConvertError::Results(format!("no {} in results", name)));
    }
    let index = self.ids(series).iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
    Ok(Columns { rows, index, name })
  }
}

/// One series of the results with its id index
pub struct Columns<'a> {
  rows: &'a [Vec<f64>],
  index: HashMap<&'a str, usize>,
  name: &'static str,
}

impl Columns<'_> {
  pub fn get(&self, id: &str) -> Result<Vec<f64>, ConvertError> {
    let column = *self.index.get(id)
      .ok_or_else(|| ConvertError::Results(format!("{} not found in {}", id, self.name)))?;
    Ok(self.rows.iter().map(|row| row[column]).collect())
  }
}
