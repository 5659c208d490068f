#[derive(Debug, Clone, Default)]
pub struct Junction {
  /// Base demand (m^3/s), summed over all demand categories
  pub basedemand: f64,
  pub pattern: Option<Box<str>>,
  /// Emitter coefficient in the file's flow units
  pub emitter: Option<f64>,
}
