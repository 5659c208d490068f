use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::splice::buffer::{Line, TextBuffer};

/// Row of the `_Demands.csv` companion of an outlet model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DemandRow {
  #[serde(rename = "ID")]
  id: String,
  /// m^3/s
  #[serde(rename = "Demand")]
  demand: f64,
}

/// `net.inp` -> `net.inp.tmp`, renamed over the target once fully written
fn temporary_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".tmp");
  path.with_file_name(name)
}

/// Write through `write` to a temporary sibling, then move it into place
fn write_atomically<F>(path: &Path, write: F) -> Result<(), ConvertError>
where
  F: FnOnce(&Path) -> Result<(), ConvertError>,
{
  let temporary = temporary_path(path);
  if let Err(err) = write(&temporary) {
    let _ = fs::remove_file(&temporary);
    return Err(err);
  }
  fs::rename(&temporary, path)?;
  Ok(())
}

impl TextBuffer {
  pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
    let last = self.lines.len().saturating_sub(1);
    for (i, line) in self.lines.iter().enumerate() {
      match line {
        Line::Source(text) => {
          writer.write_all(text.as_bytes())?;
          // a generated line may now follow what used to be the unterminated last line
          if i < last && !text.ends_with('\n') {
            writer.write_all(self.line_ending.as_bytes())?;
          }
        }
        Line::Generated(text) => {
          writer.write_all(text.as_bytes())?;
          writer.write_all(self.line_ending.as_bytes())?;
        }
      }
    }
    Ok(())
  }

  /// Save to `path`; an existing file is only replaced once the new one is complete
  pub fn save(&self, path: &Path) -> Result<(), ConvertError> {
    write_atomically(path, |temporary| {
      let mut writer = BufWriter::new(File::create(temporary)?);
      self.write_to(&mut writer)?;
      writer.flush()?;
      Ok(())
    })
  }

  pub fn to_text(&self) -> String {
    let mut bytes = Vec::new();
    // writing to memory cannot fail
    let _ = self.write_to(&mut bytes);
    String::from_utf8_lossy(&bytes).into_owned()
  }
}

/// Write the `ID,Demand` table the outlet post-processing reads desired rates from
pub fn write_demand_table(path: &Path, rows: &[(String, f64)]) -> Result<(), ConvertError> {
  write_atomically(path, |temporary| {
    let mut writer = csv::Writer::from_path(temporary)?;
    for (id, demand) in rows {
      writer.serialize(DemandRow { id: id.clone(), demand: *demand })?;
    }
    writer.flush()?;
    Ok(())
  })
}

pub fn read_demand_table(path: &Path) -> Result<Vec<(String, f64)>, ConvertError> {
  let mut reader = csv::Reader::from_path(path)?;
  let mut rows = Vec::new();
  for row in reader.deserialize() {
    let row: DemandRow = row?;
    rows.push((row.id, row.demand));
  }
  Ok(rows)
}

/// One column per consumer, one row per timestep
pub fn write_time_series(path: &Path, times: &[f64], consumers: &[String], values: &[Vec<f64>]) -> Result<(), ConvertError> {
  write_atomically(path, |temporary| {
    let mut writer = csv::Writer::from_path(temporary)?;
    let mut header = vec!["Time".to_string()];
    header.extend(consumers.iter().cloned());
    writer.write_record(&header)?;
    for (time, row) in times.iter().zip(values) {
      let mut record = vec![time.to_string()];
      record.extend(row.iter().map(|v| v.to_string()));
      writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
  })
}

/// A single statistic over time, e.g. the mean satisfaction
pub fn write_statistic(path: &Path, name: &str, times: &[f64], values: &[f64]) -> Result<(), ConvertError> {
  write_atomically(path, |temporary| {
    let mut writer = csv::Writer::from_path(temporary)?;
    writer.write_record(["Time", name])?;
    for (time, value) in times.iter().zip(values) {
      writer.write_record([time.to_string(), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generated_lines_use_the_source_terminator() {
    let mut buffer = TextBuffer::from_text("[A]\r\nlast");
    buffer.lines.push(Line::Generated("new".into()));
    assert_eq!(buffer.to_text(), "[A]\r\nlast\r\nnew\r\n");
  }

  #[test]
  fn save_replaces_the_target_and_leaves_no_temporary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.inp");
    fs::write(&path, "old").unwrap();
    TextBuffer::from_text("[TITLE]\n").save(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "[TITLE]\n");
    assert!(!temporary_path(&path).exists());
  }

  #[test]
  fn demand_table_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net_Demands.csv");
    write_demand_table(&path, &[("OutletJ1".into(), 0.01)]).unwrap();
    assert!(fs::read_to_string(&path).unwrap().starts_with("ID,Demand\n"));
    assert_eq!(read_demand_table(&path).unwrap(), vec![("OutletJ1".to_string(), 0.01)]);
  }
}
