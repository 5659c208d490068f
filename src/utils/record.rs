/// Column layout of generated rows, matching what EPANET writes
const ID_WIDTH: usize = 16;
const FIELD_WIDTH: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
  Text(String),
  /// Shortest representation that round-trips
  Num(f64),
  Blank,
}

impl Field {
  fn render(&self) -> String {
    match self {
      Field::Text(text) => text.clone(),
      Field::Num(value) => format_number(*value),
      Field::Blank => String::new(),
    }
  }
}

/// One whitespace-separated row of a model section
#[derive(Debug, Clone)]
pub struct Record {
  fields: Vec<Field>,
  terminated: bool,
}

impl Record {
  pub fn new(id: impl Into<String>) -> Self {
    Self { fields: vec![Field::Text(id.into())], terminated: false }
  }

  pub fn text(mut self, text: impl Into<String>) -> Self {
    self.fields.push(Field::Text(text.into()));
    self
  }

  pub fn num(mut self, value: f64) -> Self {
    self.fields.push(Field::Num(value));
    self
  }

  pub fn blank(mut self) -> Self {
    self.fields.push(Field::Blank);
    self
  }

  /// End the row with a `;` like EPANET does for element rows
  pub fn terminated(mut self) -> Self {
    self.terminated = true;
    self
  }

  pub fn render(&self) -> String {
    let mut row = String::from(" ");
    for (i, field) in self.fields.iter().enumerate() {
      let width = if i == 0 { ID_WIDTH } else { FIELD_WIDTH };
      if i > 0 {
        row.push('\t');
      }
      row.push_str(&format!("{:<width$}", field.render(), width = width));
    }
    if self.terminated {
      row.push_str("\t;");
      row
    } else {
      row.trim_end().to_string()
    }
  }
}

fn normalize_zero(value: f64) -> f64 {
  if value == 0.0 { 0.0 } else { value }
}

/// Plain decimal notation without trailing zeros (130.0 -> "130", 0.00001 -> "0.00001")
pub fn format_number(value: f64) -> String {
  format!("{}", normalize_zero(value))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_aligned_fields() {
    let row = Record::new("T1").num(10.0).num(0.0).num(0.5).blank().terminated().render();
    let fields: Vec<&str> = row.split_whitespace().collect();
    assert_eq!(fields, vec!["T1", "10", "0", "0.5", ";"]);
    assert!(row.starts_with(" T1 "));
  }

  #[test]
  fn numbers_are_never_exponential() {
    assert_eq!(format_number(0.00001), "0.00001");
    assert_eq!(format_number(-0.0), "0");
    assert_eq!(format_number(1000000.0), "1000000");
  }

  #[test]
  fn unterminated_rows_are_trimmed() {
    assert_eq!(Record::new("a").blank().render(), " a");
  }
}
