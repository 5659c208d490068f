use crate::error::ConvertError;
use crate::splice::buffer::Line;

/// Location of every `[NAME]` header in a buffer, built in one scan
#[derive(Debug, Clone)]
pub struct SectionIndex {
  headers: Vec<(String, usize)>,
  len: usize,
}

impl SectionIndex {
  pub fn scan(lines: &[Line]) -> Self {
    let headers = lines.iter().enumerate()
      .filter(|(_, line)| line.is_header())
      .map(|(index, line)| (section_name(line.text()), index))
      .collect();
    Self { headers, len: lines.len() }
  }

  /// Line index of a section header
  pub fn header(&self, name: &str) -> Option<usize> {
    self.headers.iter().find(|(header, _)| header.eq_ignore_ascii_case(name)).map(|(_, index)| *index)
  }

  fn require(&self, name: &str) -> Result<usize, ConvertError> {
    self.header(name).ok_or_else(|| ConvertError::MissingSection(name.to_string()))
  }

  /// Line index of the header following `header`, or the end of the buffer
  fn next_header(&self, header: usize) -> usize {
    self.headers.iter().map(|(_, index)| *index).find(|index| *index > header).unwrap_or(self.len)
  }

  /// First row position of a section: after the header and its column-title comment lines
  pub fn start(&self, lines: &[Line], name: &str) -> Result<usize, ConvertError> {
    let header = self.require(name)?;
    let end = self.next_header(header);
    let mut position = header + 1;
    while position < end && lines[position].is_comment() {
      position += 1;
    }
    Ok(position)
  }

  /// Position just after the last row of a section, before any trailing blank lines
  pub fn end(&self, lines: &[Line], name: &str) -> Result<usize, ConvertError> {
    let start = self.start(lines, name)?;
    let mut position = self.next_header(start - 1);
    while position > start && lines[position - 1].is_blank() {
      position -= 1;
    }
    Ok(position)
  }

  /// Line of the first row in `section` whose leading words match `key`, ignoring case
  pub fn option_line(&self, lines: &[Line], section: &str, key: &str) -> Result<usize, ConvertError> {
    let header = self.require(section)?;
    let end = self.next_header(header);
    let key_words: Vec<String> = key.split_whitespace().map(str::to_uppercase).collect();
    (header + 1..end)
      .find(|index| {
        let words: Vec<String> = lines[*index].text().split_whitespace().take(key_words.len()).map(str::to_uppercase).collect();
        words == key_words
      })
      .ok_or_else(|| ConvertError::MissingOption(key.to_string()))
  }

  /// Lines from `position` up to the end of the section containing it
  pub fn section_end_after(&self, position: usize) -> usize {
    self.headers.iter().map(|(_, index)| *index).find(|index| *index >= position).unwrap_or(self.len)
  }
}

fn section_name(header: &str) -> String {
  let header = header.trim();
  let inner = header.trim_start_matches('[');
  inner.split(']').next().unwrap_or(inner).trim().to_uppercase()
}
