//! Section-aware editing of INP files.
//!
//! Edits are declared against section anchors in the unmodified base file. Every anchor is
//! resolved in a first pass; the second pass checks that no two edits touch the same lines,
//! computes where each block lands in the output and splices the blocks in from the bottom up.

pub mod buffer;
pub mod sections;

use simplelog::debug;

use crate::error::ConvertError;
use crate::splice::buffer::{Line, TextBuffer};
use crate::splice::sections::SectionIndex;

/// Where an edit applies, relative to the base file
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
  /// Insert before the first row of a section, after its header and column titles
  Start(&'static str),
  /// Insert after the last row of a section
  End(&'static str),
  /// Replace every row of a section
  Rows(&'static str),
  /// Overwrite lines starting `skip` lines below the option line beginning with `key`
  Option { section: &'static str, key: &'static str, skip: usize },
}

/// A block of generated lines and where it goes
#[derive(Debug, Clone)]
pub struct Edit {
  pub name: &'static str,
  pub target: Target,
  pub block: Vec<String>,
  /// Optional edits are dropped when their section is absent
  pub required: bool,
}

impl Edit {
  pub fn new(name: &'static str, target: Target, block: Vec<String>) -> Self {
    Self { name, target, block, required: true }
  }

  pub fn optional(mut self) -> Self {
    self.required = false;
    self
  }
}

/// Final position of an applied edit in the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
  pub name: &'static str,
  /// First output line of the block
  pub line: usize,
  pub len: usize,
}

#[derive(Debug, Clone)]
struct Resolved {
  order: usize,
  start: usize,
  /// Exclusive end of the replaced range; equal to `start` for insertions
  end: usize,
}

fn resolve(buffer: &TextBuffer, index: &SectionIndex, edit: &Edit) -> Result<(usize, usize), ConvertError> {
  let lines = &buffer.lines;
  match edit.target {
    Target::Start(section) => {
      let start = index.start(lines, section)?;
      Ok((start, start))
    }
    Target::End(section) => {
      let end = index.end(lines, section)?;
      Ok((end, end))
    }
    Target::Rows(section) => Ok((index.start(lines, section)?, index.end(lines, section)?)),
    Target::Option { section, key, skip } => {
      let start = index.option_line(lines, section, key)? + skip;
      let end = start + edit.block.len();
      // the overwritten lines must stay inside the option's section
      if end > lines.len() || index.section_end_after(start) < end {
        return Err(ConvertError::MissingOption(format!("{} (+{} lines)", key, skip + edit.block.len())));
      }
      Ok((start, end))
    }
  }
}

/// Apply `edits` to `buffer`, returning where each block landed
pub fn apply(buffer: &mut TextBuffer, edits: Vec<Edit>) -> Result<Vec<Placement>, ConvertError> {
  let index = SectionIndex::scan(&buffer.lines);

  // pass one: resolve all anchors against the unmodified buffer
  let mut resolved = Vec::with_capacity(edits.len());
  for (order, edit) in edits.iter().enumerate() {
    match resolve(buffer, &index, edit) {
      Ok((start, end)) => resolved.push(Resolved { order, start, end }),
      Err(ConvertError::MissingSection(name)) if !edit.required => {
        debug!("Skipping edit '{}': section [{}] not present", edit.name, name);
      }
      Err(err) => return Err(err),
    }
  }

  // pass two: order by position, reject overlaps and compute final offsets
  resolved.sort_by_key(|r| (r.start, r.end, r.order));
  for pair in resolved.windows(2) {
    if pair[0].end > pair[1].start {
      return Err(ConvertError::OverlappingEdits { first: edits[pair[0].order].name, second: edits[pair[1].order].name });
    }
  }

  let mut shift: isize = 0;
  let mut placements = Vec::with_capacity(resolved.len());
  for r in &resolved {
    let len = edits[r.order].block.len();
    placements.push(Placement { name: edits[r.order].name, line: (r.start as isize + shift) as usize, len });
    shift += len as isize - (r.end - r.start) as isize;
  }

  // splice from the bottom so earlier positions stay valid
  let mut edits: Vec<Option<Edit>> = edits.into_iter().map(Some).collect();
  for r in resolved.iter().rev() {
    if let Some(edit) = edits[r.order].take() {
      buffer.lines.splice(r.start..r.end, edit.block.into_iter().map(Line::Generated));
    }
  }

  placements.sort_by_key(|p| p.line);
  Ok(placements)
}

#[cfg(test)]
mod tests {
  use super::*;

  const TEXT: &str = "[JUNCTIONS]\n;ID\n J1 10 5\n\n[TANKS]\n;ID\n\n[PIPES]\n;ID\n P1 R1 J1\n\n[OPTIONS]\n Demand Model PDA\n Minimum Pressure 0\n Required Pressure 0.1\n";

  fn block(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn offsets_account_for_earlier_blocks() {
    let mut buffer = TextBuffer::from_text(TEXT);
    let edits = vec![
      Edit::new("pipes", Target::End("PIPES"), block(&["P2", "P3"])),
      Edit::new("junctions", Target::Rows("JUNCTIONS"), block(&["J1 10 0", "J2 11 0"])),
      Edit::new("tanks", Target::Start("TANKS"), block(&["T1"])),
      Edit::new("pressure", Target::Option { section: "OPTIONS", key: "Demand Model", skip: 1 }, block(&["Min 1", "Req 9"])),
    ];
    let placements = apply(&mut buffer, edits).unwrap();
    let texts: Vec<&str> = buffer.texts().collect();

    let at = |name: &str| placements.iter().find(|p| p.name == name).unwrap().line;
    assert_eq!(texts[at("junctions")], "J1 10 0");
    assert_eq!(texts[at("junctions") + 1], "J2 11 0");
    assert_eq!(texts[at("tanks")], "T1");
    assert_eq!(texts[at("tanks") - 1], ";ID");
    assert_eq!(texts[at("pipes")], "P2");
    assert_eq!(texts[at("pipes") - 1], " P1 R1 J1");
    assert_eq!(texts[at("pressure")], "Min 1");
    assert_eq!(texts[at("pressure") - 1], " Demand Model PDA");
    assert_eq!(buffer.len(), TextBuffer::from_text(TEXT).len() + 1 + 1 + 2);
  }

  #[test]
  fn missing_required_section_fails_before_any_change() {
    let mut buffer = TextBuffer::from_text(TEXT);
    let edits = vec![
      Edit::new("pipes", Target::End("PIPES"), block(&["P2"])),
      Edit::new("valves", Target::Start("VALVES"), block(&["V1"])),
    ];
    assert!(matches!(apply(&mut buffer, edits), Err(ConvertError::MissingSection(name)) if name == "VALVES"));
    assert_eq!(buffer.len(), TextBuffer::from_text(TEXT).len());
  }

  #[test]
  fn optional_edit_is_skipped() {
    let mut buffer = TextBuffer::from_text(TEXT);
    let edits = vec![Edit::new("demands", Target::Rows("DEMANDS"), Vec::new()).optional()];
    assert!(apply(&mut buffer, edits).unwrap().is_empty());
  }

  #[test]
  fn overlapping_edits_are_rejected() {
    let mut buffer = TextBuffer::from_text(TEXT);
    let edits = vec![
      Edit::new("rows", Target::Rows("JUNCTIONS"), block(&["J1"])),
      Edit::new("patch", Target::Option { section: "JUNCTIONS", key: "J1", skip: 0 }, block(&["J9"])),
    ];
    assert!(matches!(apply(&mut buffer, edits), Err(ConvertError::OverlappingEdits { .. })));
  }

  #[test]
  fn patch_may_not_cross_a_header() {
    let mut buffer = TextBuffer::from_text(TEXT);
    let edits = vec![
      Edit::new("patch", Target::Option { section: "PIPES", key: "P1", skip: 1 }, block(&["a", "b"])),
    ];
    assert!(matches!(apply(&mut buffer, edits), Err(ConvertError::MissingOption(_))));
  }
}
