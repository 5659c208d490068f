//! Rescaling of a network to a different supply duration.
//!
//! A consumer expecting a fixed daily volume over a shorter supply window draws at a
//! proportionally higher rate, so every base demand is scaled by `old / new` duration.

use std::fs;
use std::path::{Path, PathBuf};

use simplelog::info;

use crate::error::ConvertError;
use crate::model::network::Network;
use crate::model::node::{Node, NodeType};
use crate::splice::buffer::TextBuffer;
use crate::splice::{self, Edit, Target};
use crate::utils::paths;
use crate::utils::record::Record;

const MAX_HOURS: u32 = 24;
const MAX_MINUTES: u32 = 59;

/// `_4hr`, or `_4hr30min` when the minutes are not zero
pub fn duration_suffix(hours: u32, minutes: u32) -> String {
  if minutes == 0 {
    format!("_{}hr", hours)
  } else {
    format!("_{}hr{:02}min", hours, minutes)
  }
}

fn junction_row(node: &Node, demand: f64) -> String {
  let pattern = match &node.node_type {
    NodeType::Junction(junction) => junction.pattern.as_deref(),
    _ => None,
  };
  let row = Record::new(&*node.id).num(node.elevation).num(demand);
  match pattern {
    Some(pattern) => row.text(pattern),
    None => row.blank(),
  }
  .terminated()
  .render()
}

/// Write `{stem}_{hours}hr.inp` with the supply duration set to `hours:minutes` and every
/// junction's base demand scaled to deliver the same volume over it
pub fn change_duration(input: &Path, hours: u32, minutes: u32) -> Result<PathBuf, ConvertError> {
  if hours > MAX_HOURS {
    return Err(ConvertError::InvalidDuration(format!("{} h is not intermittent supply", hours)));
  }
  if minutes > MAX_MINUTES {
    return Err(ConvertError::InvalidDuration(format!("{} min is not a valid minute count", minutes)));
  }
  let new_minutes = (hours * 60 + minutes) as f64;
  if new_minutes <= 0.0 {
    return Err(ConvertError::InvalidDuration("new duration must be positive".to_string()));
  }

  let source = fs::read_to_string(input)?;
  let mut network = Network::default();
  network.read_inp(&source)?;

  let old_minutes = network.options.duration_minutes();
  if old_minutes <= 0.0 {
    return Err(ConvertError::InvalidDuration("network duration must be positive".to_string()));
  }
  let multiplier = old_minutes / new_minutes;
  let units = network.options.flow_units;

  let rows = network.junctions()
    .map(|node| junction_row(node, units.from_cms(node.base_demand() * multiplier)))
    .collect();
  let edits = vec![
    Edit::new("junctions", Target::Rows("JUNCTIONS"), rows),
    Edit::new("demands", Target::Rows("DEMANDS"), Vec::new()).optional(),
    Edit::new(
      "duration",
      Target::Option { section: "TIMES", key: "Duration", skip: 0 },
      vec![format!(" Duration           {}:{:02}", hours, minutes)],
    ),
  ];

  let mut buffer = TextBuffer::from_text(&source);
  splice::apply(&mut buffer, edits)?;

  let output = paths::with_suffix(input, &duration_suffix(hours, minutes));
  buffer.save(&output)?;
  info!("Duration {} min -> {} min, demands scaled by {:.4}, written to {}", old_minutes, new_minutes, multiplier, output.display());
  Ok(output)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn suffix_mentions_minutes_only_when_set() {
    assert_eq!(duration_suffix(8, 0), "_8hr");
    assert_eq!(duration_suffix(2, 5), "_2hr05min");
  }

  #[test]
  fn rejects_out_of_range_durations() {
    let path = Path::new("does-not-matter.inp");
    assert!(matches!(change_duration(path, 25, 0), Err(ConvertError::InvalidDuration(_))));
    assert!(matches!(change_duration(path, 1, 60), Err(ConvertError::InvalidDuration(_))));
    assert!(matches!(change_duration(path, 0, 0), Err(ConvertError::InvalidDuration(_))));
  }
}
