use crate::model::pipe::Pipe;
use crate::model::pump::Pump;
use crate::model::valve::Valve;

/// Link struct
#[derive(Debug, Clone)]
pub struct Link {
  /// Link ID
  pub id: Box<str>,
  /// Link type (pipe, pump, valve)
  pub link_type: LinkType,
  /// Start node ID
  pub start_node_id: Box<str>,
  /// End node ID
  pub end_node_id: Box<str>,
}

#[derive(Debug, Clone)]
pub enum LinkType {
  Pipe(Pipe),
  Pump(Pump),
  Valve(Valve)
}

impl Link {
  pub fn kind(&self) -> &'static str {
    match self.link_type {
      LinkType::Pipe(_) => "pipe",
      LinkType::Pump(_) => "pump",
      LinkType::Valve(_) => "valve",
    }
  }

  pub fn as_pipe(&self) -> Option<&Pipe> {
    match &self.link_type {
      LinkType::Pipe(pipe) => Some(pipe),
      _ => None,
    }
  }

  pub fn as_valve(&self) -> Option<&Valve> {
    match &self.link_type {
      LinkType::Valve(valve) => Some(valve),
      _ => None,
    }
  }
}
