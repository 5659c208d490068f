use std::fs;
use std::path::Path;

/// One line of a model file.
///
/// Source lines keep their original terminator so untouched text is reproduced byte for
/// byte; generated lines carry none and are terminated when written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
  Source(String),
  Generated(String),
}

impl Line {
  /// Line content without its terminator
  pub fn text(&self) -> &str {
    match self {
      Line::Source(text) => text.trim_end_matches(['\n', '\r']),
      Line::Generated(text) => text,
    }
  }

  /// True for a `[NAME]` section header
  pub fn is_header(&self) -> bool {
    self.text().trim_start().starts_with('[')
  }

  pub fn is_blank(&self) -> bool {
    self.text().trim().is_empty()
  }

  pub fn is_comment(&self) -> bool {
    self.text().trim_start().starts_with(';')
  }
}

/// A model file held as a sequence of lines
#[derive(Debug, Clone)]
pub struct TextBuffer {
  pub lines: Vec<Line>,
  /// Terminator used for generated lines, detected from the source text
  pub line_ending: &'static str,
}

impl TextBuffer {
  pub fn from_text(text: &str) -> Self {
    let line_ending = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let lines = text.split_inclusive('\n').map(|line| Line::Source(line.to_string())).collect();
    Self { lines, line_ending }
  }

  pub fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
    Ok(Self::from_text(&fs::read_to_string(path)?))
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn texts(&self) -> impl Iterator<Item = &str> {
    self.lines.iter().map(Line::text)
  }

  /// Index of the first line whose text equals `text` after trimming
  pub fn find(&self, text: &str) -> Option<usize> {
    self.texts().position(|line| line.trim() == text)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keeps_terminators_of_source_lines() {
    let buffer = TextBuffer::from_text("[A]\r\nx\r\nlast");
    assert_eq!(buffer.line_ending, "\r\n");
    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.lines[0], Line::Source("[A]\r\n".into()));
    assert_eq!(buffer.lines[1].text(), "x");
    assert_eq!(buffer.lines[2].text(), "last");
    assert!(buffer.lines[0].is_header());
  }
}
