use std::str::FromStr;

/// Error raised while reading an INP file, carrying the offending line when known
#[derive(Debug)]
pub struct InputError {
  pub message: String,
  pub line: Option<usize>,
  pub context: Option<String>,
}

impl InputError {
  pub fn new(message: impl Into<String>) -> Self {
    Self { message: message.into(), line: None, context: None }
  }

  pub fn with_line(mut self, line: usize) -> Self {
    // keep the innermost line number
    if self.line.is_none() {
      self.line = Some(line);
    }
    self
  }

  pub fn with_context(mut self, context: impl Into<String>) -> Self {
    self.context = Some(context.into());
    self
  }
}

impl std::fmt::Display for InputError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.message)?;
    if let Some(line) = self.line {
      write!(f, " (line {})", line)?;
    }
    if let Some(ctx) = &self.context {
      write!(f, " [{}]", ctx)?;
    }
    Ok(())
  }
}

impl std::error::Error for InputError {}

impl From<std::io::Error> for InputError {
  fn from(err: std::io::Error) -> Self {
    InputError::new(format!("IO error: {}", err))
  }
}

/// Helper trait for converting Option to Result with error context
pub trait OptionExt<T> {
  fn ok_or_missing(self, field: &str) -> Result<T, InputError>;
}

impl<T> OptionExt<T> for Option<T> {
  fn ok_or_missing(self, field: &str) -> Result<T, InputError> {
    self.ok_or_else(|| InputError::new(format!("Missing required field: {}", field)))
  }
}

/// Helper trait for parsing with better error messages
pub trait ParseExt {
  fn parse_field<T: FromStr>(&self, field: &str) -> Result<T, InputError>;
}

impl ParseExt for &str {
  fn parse_field<T: FromStr>(&self, field: &str) -> Result<T, InputError> {
    self.parse::<T>().map_err(|_| InputError::new(format!("Invalid {}: '{}'", field, self)))
  }
}

/// Errors raised by the converters, the duration changer and the post-processor
#[derive(Debug)]
pub enum ConvertError {
  /// The source network could not be read
  Input(InputError),
  Io(std::io::Error),
  Csv(csv::Error),
  /// Minimum and desired pressure do not satisfy 0 <= Hmin <= Hdes
  InvalidPressureRange { hmin: f64, hdes: f64 },
  /// The method divides by Hdes - Hmin, which is zero
  ZeroPressureDifferential { method: &'static str },
  InvalidSegmentLength(f64),
  /// The network is not set up for pressure-dependent analysis
  WrongDemandModel(String),
  UnsupportedUnits(String),
  InvalidDuration(String),
  /// A section header needed for splicing is absent from the base file
  MissingSection(String),
  /// An option line needed for patching is absent, or the patch would leave its section
  MissingOption(String),
  InvalidDemand { node: Box<str>, demand: f64 },
  UnknownNode(Box<str>),
  /// SWMM conversions carry junctions, reservoirs and pipes only
  UnsupportedElement { id: Box<str>, kind: &'static str },
  /// A synthesized identifier clashes with an existing one
  IdCollision(String),
  /// Two edits touch the same lines
  OverlappingEdits { first: &'static str, second: &'static str },
  /// Simulation results are malformed or miss an element
  Results(String),
  InvalidStatistics(String),
}

impl std::fmt::Display for ConvertError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ConvertError::Input(err) => write!(f, "Failed to read network: {}", err),
      ConvertError::Io(err) => write!(f, "IO error: {}", err),
      ConvertError::Csv(err) => write!(f, "CSV error: {}", err),
      ConvertError::InvalidPressureRange { hmin, hdes } => {
        write!(f, "Invalid pressure range: minimum {} and desired {} must satisfy 0 <= Hmin <= Hdes", hmin, hdes)
      }
      ConvertError::ZeroPressureDifferential { method } => {
        write!(f, "Method {} requires a desired pressure strictly above the minimum pressure", method)
      }
      ConvertError::InvalidSegmentLength(length) => write!(f, "Invalid maximum segment length: {}", length),
      ConvertError::WrongDemandModel(model) => {
        write!(f, "Network uses demand model {}; conversion requires PDA", model)
      }
      ConvertError::UnsupportedUnits(units) => write!(f, "Flow units {} are not metric", units),
      ConvertError::InvalidDuration(msg) => write!(f, "Invalid supply duration: {}", msg),
      ConvertError::MissingSection(name) => write!(f, "Section [{}] not found", name),
      ConvertError::MissingOption(key) => write!(f, "Option line '{}' not found", key),
      ConvertError::InvalidDemand { node, demand } => {
        write!(f, "Node {} has non-positive or non-finite demand {}", node, demand)
      }
      ConvertError::UnknownNode(id) => write!(f, "Unknown node: {}", id),
      ConvertError::UnsupportedElement { id, kind } => {
        write!(f, "{} is a {}, which cannot be converted", id, kind)
      }
      ConvertError::IdCollision(id) => write!(f, "Generated identifier {} already exists", id),
      ConvertError::OverlappingEdits { first, second } => {
        write!(f, "Edits '{}' and '{}' overlap", first, second)
      }
      ConvertError::Results(msg) => write!(f, "Invalid simulation results: {}", msg),
      ConvertError::InvalidStatistics(msg) => write!(f, "Invalid statistics request: {}", msg),
    }
  }
}

impl std::error::Error for ConvertError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ConvertError::Input(err) => Some(err),
      ConvertError::Io(err) => Some(err),
      ConvertError::Csv(err) => Some(err),
      _ => None,
    }
  }
}

impl From<InputError> for ConvertError {
  fn from(err: InputError) -> Self {
    ConvertError::Input(err)
  }
}

impl From<std::io::Error> for ConvertError {
  fn from(err: std::io::Error) -> Self {
    ConvertError::Io(err)
  }
}

impl From<csv::Error> for ConvertError {
  fn from(err: csv::Error) -> Self {
    ConvertError::Csv(err)
  }
}
