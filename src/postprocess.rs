//! Satisfaction and pressure statistics from simulated IWS models.
//!
//! Each layout exposes consumers differently: a demand junction in the source network, a
//! synthetic tank, pipe, valve, outlet or storage unit in a converted model. Consumers are
//! reported under the id of the demand junction they stand for.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use simplelog::{info, debug};

use crate::constants::{LPS_PER_CMS, SECONDS_PER_MINUTE, UNIT_HEIGHT};
use crate::convert::Method;
use crate::error::ConvertError;
use crate::hydraulics::{desired_volume, headloss_pipe_flow};
use crate::model::network::Network;
use crate::output;
use crate::results::{Series, SimulationResults};
use crate::utils::paths;

/// Satisfaction ratios and pressures are both reported in percent/metres on this scale
const PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
  /// Satisfaction ratio: share of the desired volume received so far (%)
  Satisfaction,
  /// Pressure, or water depth for SWMM models, at the demand junctions (m)
  Pressure,
}

impl FromStr for OutputKind {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "S" => Ok(OutputKind::Satisfaction),
      "P" => Ok(OutputKind::Pressure),
      _ => Err(format!("Invalid output type: {} (expected S or P)", s)),
    }
  }
}

/// How the simulated model represents consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
  /// The source network run with pressure-dependent demands
  Pda,
  Converted(Method),
}

impl FromStr for Layout {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.eq_ignore_ascii_case("PDA") {
      return Ok(Layout::Pda);
    }
    s.parse::<Method>().map(Layout::Converted)
  }
}

impl std::fmt::Display for Layout {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Layout::Pda => write!(f, "PDA"),
      Layout::Converted(method) => write!(f, "{}", method),
    }
  }
}

#[derive(Debug, Clone)]
pub struct ProcessOptions {
  pub output: OutputKind,
  pub low_percentile: u32,
  pub high_percentile: u32,
  /// Export the processed series and statistics as CSV files next to the model
  pub save: bool,
}

impl Default for ProcessOptions {
  fn default() -> Self {
    Self { output: OutputKind::Satisfaction, low_percentile: 10, high_percentile: 90, save: true }
  }
}

/// Per-timestep values for every consumer
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
  /// Seconds
  pub times: Vec<f64>,
  pub consumers: Vec<String>,
  /// `values[t][consumer]`
  pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
  pub mean: Vec<f64>,
  pub median: Vec<f64>,
  pub low: Vec<f64>,
  pub high: Vec<f64>,
}

/// Result of post-processing one simulation
#[derive(Debug, Clone)]
pub struct Processed {
  pub series: TimeSeries,
  pub statistics: Statistics,
  /// CSV files written, empty unless saving was requested
  pub files: Vec<PathBuf>,
}

/// A consumer as it appears in the results
struct Consumer {
  /// Demand junction the consumer stands for
  id: String,
  /// Element carrying the consumer's series
  element: String,
  /// Desired withdrawal in m^3/s, for cumulative satisfaction
  demand: f64,
}

/// Cumulative satisfaction: `SR[k] = SR[k-1] + q[k-1] (t[k] - t[k-1]) / V * 100`, `SR[0] = 0`
pub fn cumulative_satisfaction(times: &[f64], flows: &[f64], volume: f64) -> Vec<f64> {
  let mut ratios = Vec::with_capacity(times.len());
  for k in 0..times.len() {
    let ratio = if k == 0 {
      0.0
    } else {
      ratios[k - 1] + flows[k - 1] * (times[k] - times[k - 1]) / volume * PERCENT
    };
    ratios.push(ratio);
  }
  ratios
}

/// Percentile with linear interpolation between the closest ranks
pub fn percentile(values: &[f64], p: f64) -> f64 {
  if values.is_empty() {
    return f64::NAN;
  }
  let mut sorted = values.to_vec();
  sorted.sort_by(|a, b| a.total_cmp(b));
  let rank = p / PERCENT * (sorted.len() - 1) as f64;
  let below = rank.floor() as usize;
  let above = rank.ceil() as usize;
  sorted[below] + (sorted[above] - sorted[below]) * (rank - below as f64)
}

/// Mean, median and the two percentiles across consumers at each timestep
pub fn statistics(series: &TimeSeries, low: u32, high: u32) -> Result<Statistics, ConvertError> {
  if !(0 < low && low < high && high < 100) {
    return Err(ConvertError::InvalidStatistics(format!("percentiles must satisfy 0 < {} < {} < 100", low, high)));
  }
  if series.consumers.is_empty() {
    return Err(ConvertError::InvalidStatistics("no consumers found in the results".to_string()));
  }
  let mut stats = Statistics { mean: Vec::new(), median: Vec::new(), low: Vec::new(), high: Vec::new() };
  for row in &series.values {
    stats.mean.push(row.iter().sum::<f64>() / row.len() as f64);
    stats.median.push(percentile(row, 50.0));
    stats.low.push(percentile(row, low as f64));
    stats.high.push(percentile(row, high as f64));
  }
  Ok(stats)
}

/// Elements of `ids` named `{prefix}{junction}`
fn prefixed<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> Vec<(String, String)> {
  ids.filter_map(|id| id.strip_prefix(prefix).map(|junction| (junction.to_string(), id.to_string())))
    .filter(|(junction, _)| !junction.is_empty())
    .collect()
}

fn read_network(path: &Path) -> Result<Network, ConvertError> {
  Ok(Network::from_file(path)?)
}

/// Consumers whose satisfaction accumulates from a flow or demand series
fn flow_consumers(layout: Layout, model: &Path, results: &SimulationResults) -> Result<(Vec<Consumer>, f64), ConvertError> {
  let network = match layout {
    Layout::Converted(Method::OutletOutfall) => None,
    _ => Some(read_network(model)?),
  };

  let consumers: Vec<Consumer> = match (layout, &network) {
    (Layout::Pda, Some(network)) => network.demand_nodes()
      .map(|node| Consumer { id: node.id.to_string(), element: node.id.to_string(), demand: node.base_demand() })
      .collect(),
    (Layout::Converted(Method::CvRes), Some(network)) => {
      let dh = network.options.required_pressure - network.options.minimum_pressure;
      let links = network.links.iter().map(|l| &*l.id);
      prefixed(links, "PipeforNode").into_iter()
        .filter_map(|(id, element)| {
          let pipe = network.link(&element)?.as_pipe()?;
          let demand = headloss_pipe_flow(pipe.length, pipe.diameter_m(), pipe.roughness, dh);
          Some(Consumer { id, element, demand })
        })
        .collect()
    }
    (Layout::Converted(Method::FcvEm | Method::FcvRes), Some(network)) => {
      let to_cms = network.options.flow_units.to_cms();
      let links = network.links.iter().map(|l| &*l.id);
      prefixed(links, "FCVforNode").into_iter()
        .filter_map(|(id, element)| {
          let valve = network.link(&element)?.as_valve()?;
          (valve.setting != 0.0).then(|| Consumer { id, element, demand: valve.setting * to_cms })
        })
        .collect()
    }
    (Layout::Converted(Method::OutletOutfall), _) => {
      let table = paths::sibling(model, "_Demands", "csv");
      output::read_demand_table(&table)?.into_iter()
        .filter_map(|(element, demand)| {
          let id = element.strip_prefix("Outlet")?.to_string();
          Some(Consumer { id, element, demand })
        })
        .collect()
    }
    _ => return Err(ConvertError::Results(format!("{} does not accumulate flows", layout))),
  };

  let duration = match &network {
    Some(network) => network.options.duration_minutes(),
    None => results.times.last().copied().unwrap_or(0.0) / SECONDS_PER_MINUTE,
  };
  if duration <= 0.0 {
    return Err(ConvertError::InvalidDuration("supply duration must be positive".to_string()));
  }
  Ok((consumers, duration))
}

fn satisfaction(layout: Layout, model: &Path, results: &SimulationResults) -> Result<TimeSeries, ConvertError> {
  let times = results.times.clone();
  let mut consumers: Vec<String> = Vec::new();
  let mut columns: Vec<Vec<f64>> = Vec::new();

  match layout {
    Layout::Converted(method @ (Method::CvTank | Method::PsvTank | Method::OutletStorage)) => {
      // unit-height storage: the water level is the fraction of the volume received
      let prefix = match method {
        Method::CvTank => "TankforNode",
        Method::PsvTank => "ATforNode",
        _ => "StorageforNode",
      };
      let levels_of = results.columns(Series::Pressure)?;
      for (id, element) in prefixed(results.node_ids.iter().map(String::as_str), prefix) {
        let levels = levels_of.get(&element)?;
        columns.push(levels.iter().map(|level| level.min(UNIT_HEIGHT).max(0.0) / UNIT_HEIGHT * PERCENT).collect());
        consumers.push(id);
      }
    }
    _ => {
      let (list, duration) = flow_consumers(layout, model, results)?;
      let (series, scale) = match layout {
        Layout::Pda => (Series::Demand, 1.0),
        Layout::Converted(Method::OutletOutfall) => (Series::Flow, 1.0 / LPS_PER_CMS),
        _ => (Series::Flow, 1.0),
      };
      let flows_of = results.columns(series)?;
      for consumer in list {
        let volume = desired_volume(consumer.demand, duration);
        if !(volume > 0.0) {
          return Err(ConvertError::Results(format!("{} has no desired volume", consumer.element)));
        }
        let flows: Vec<f64> = flows_of.get(&consumer.element)?.iter().map(|q| q * scale).collect();
        columns.push(cumulative_satisfaction(&times, &flows, volume));
        consumers.push(consumer.id);
      }
    }
  }
  Ok(transpose(times, consumers, columns))
}

fn pressure(layout: Layout, model: &Path, results: &SimulationResults) -> Result<TimeSeries, ConvertError> {
  let consumers: Vec<String> = match layout {
    Layout::Pda => read_network(model)?.demand_nodes().map(|n| n.id.to_string()).collect(),
    Layout::Converted(method) => {
      let (ids, prefix): (Vec<&str>, &str) = match method {
        Method::CvTank => (results.node_ids.iter().map(String::as_str).collect(), "TankforNode"),
        Method::PsvTank => (results.node_ids.iter().map(String::as_str).collect(), "ATforNode"),
        Method::OutletStorage => (results.node_ids.iter().map(String::as_str).collect(), "StorageforNode"),
        Method::CvRes => (results.link_ids.iter().map(String::as_str).collect(), "PipeforNode"),
        Method::FcvEm | Method::FcvRes => (results.link_ids.iter().map(String::as_str).collect(), "FCVforNode"),
        Method::OutletOutfall => (results.link_ids.iter().map(String::as_str).collect(), "Outlet"),
      };
      prefixed(ids.into_iter(), prefix).into_iter().map(|(id, _)| id).collect()
    }
  };
  let pressures = results.columns(Series::Pressure)?;
  let columns = consumers.iter()
    .map(|id| pressures.get(id))
    .collect::<Result<Vec<_>, _>>()?;
  Ok(transpose(results.times.clone(), consumers, columns))
}

fn transpose(times: Vec<f64>, consumers: Vec<String>, columns: Vec<Vec<f64>>) -> TimeSeries {
  let values = (0..times.len()).map(|t| columns.iter().map(|column| column[t]).collect()).collect();
  TimeSeries { times, consumers, values }
}

/// Turn raw results into a per-consumer series of the requested kind
pub fn process_results(layout: Layout, model: &Path, results: &SimulationResults, output: OutputKind) -> Result<TimeSeries, ConvertError> {
  match output {
    OutputKind::Satisfaction => satisfaction(layout, model, results),
    OutputKind::Pressure => pressure(layout, model, results),
  }
}

/// Process the results of simulating `model`, optionally exporting CSV files next to it
pub fn process(layout: Layout, model: &Path, results_path: &Path, options: &ProcessOptions) -> Result<Processed, ConvertError> {
  let low = options.low_percentile;
  let high = options.high_percentile;
  if !(0 < low && low < high && high < 100) {
    return Err(ConvertError::InvalidStatistics(format!("percentiles must satisfy 0 < {} < {} < 100", low, high)));
  }

  let results = SimulationResults::read_file(results_path)?;
  let series = process_results(layout, model, &results, options.output)?;
  let statistics = statistics(&series, low, high)?;
  debug!("{}: {} consumers over {} timesteps", layout, series.consumers.len(), series.times.len());

  let mut files = Vec::new();
  if options.save {
    let path = paths::sibling(model, "_TimeSeries", "csv");
    output::write_time_series(&path, &series.times, &series.consumers, &series.values)?;
    files.push(path);

    let low_name = format!("{}thPercentile", low);
    let high_name = format!("{}thPercentile", high);
    let exports = [
      ("_Means".to_string(), "Mean", &statistics.mean),
      ("_Medians".to_string(), "Median", &statistics.median),
      (format!("_{}", low_name), low_name.as_str(), &statistics.low),
      (format!("_{}", high_name), high_name.as_str(), &statistics.high),
    ];
    for (suffix, name, values) in exports {
      let path = paths::sibling(model, &suffix, "csv");
      output::write_statistic(&path, name, &series.times, values)?;
      files.push(path);
    }
    info!("Processed {} results written next to {}", layout, model.display());
  }

  Ok(Processed { series, statistics, files })
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;

  #[test]
  fn satisfaction_accumulates_previous_flow() {
    let ratios = cumulative_satisfaction(&[0.0, 60.0, 120.0], &[0.01, 0.02, 0.0], 1.2);
    assert_relative_eq!(ratios[0], 0.0);
    assert_relative_eq!(ratios[1], 50.0);
    assert_relative_eq!(ratios[2], 150.0);
  }

  #[test]
  fn percentiles_interpolate_linearly() {
    let values = [4.0, 1.0, 3.0, 2.0];
    assert_relative_eq!(percentile(&values, 50.0), 2.5);
    assert_relative_eq!(percentile(&values, 10.0), 1.3);
    assert_relative_eq!(percentile(&values, 90.0), 3.7);
    assert_relative_eq!(percentile(&[7.0], 90.0), 7.0);
  }

  #[test]
  fn statistics_reject_bad_percentiles() {
    let series = TimeSeries { times: vec![0.0], consumers: vec!["J1".into()], values: vec![vec![1.0]] };
    assert!(statistics(&series, 90, 10).is_err());
    assert!(statistics(&series, 0, 50).is_err());
    assert!(statistics(&series, 10, 100).is_err());
    let stats = statistics(&series, 10, 90).unwrap();
    assert_eq!(stats.mean, vec![1.0]);
  }

  #[test]
  fn layouts_parse() {
    assert_eq!("pda".parse::<Layout>().unwrap(), Layout::Pda);
    assert_eq!("FCV-Res".parse::<Layout>().unwrap(), Layout::Converted(Method::FcvRes));
    assert_eq!("p".parse::<OutputKind>().unwrap(), OutputKind::Pressure);
  }

  #[test]
  fn storage_levels_become_percentages() {
    let results = SimulationResults {
      times: vec![0.0, 60.0],
      node_ids: vec!["J1".into(), "StorageforNodeJ1".into()],
      link_ids: Vec::new(),
      pressures: vec![vec![5.0, 0.0], vec![6.0, 1.4]],
      demands: Vec::new(),
      flows: Vec::new(),
    };
    let model = Path::new("unused.inp");
    let series = process_results(Layout::Converted(Method::OutletStorage), model, &results, OutputKind::Satisfaction).unwrap();
    assert_eq!(series.consumers, vec!["J1".to_string()]);
    assert_eq!(series.values, vec![vec![0.0], vec![100.0]]);

    let pressures = process_results(Layout::Converted(Method::OutletStorage), model, &results, OutputKind::Pressure).unwrap();
    assert_eq!(pressures.values, vec![vec![5.0], vec![6.0]]);
  }
}
