#[derive(Debug, Clone, Default)]
pub struct Reservoir {
  pub head_pattern: Option<Box<str>>,
}
