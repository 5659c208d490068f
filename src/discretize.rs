//! Splitting of long conduits into equal segments for SWMM models.

use hashbrown::HashSet;

use crate::error::ConvertError;

/// Elevation gap imposed on a reservoir end of a split conduit (m)
pub const RESERVOIR_ELEVATION_OFFSET: f64 = 1.0;

/// Most segments a single conduit may be split into
pub const MAX_SEGMENTS: f64 = 10_000.0;

/// How interior nodes of a split conduit are named
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeNaming {
  /// `{from}-{k}-{to}`
  Endpoints,
  /// `{from}-{conduit}-{k}-{to}`, for conduits running parallel to one already split
  Qualified,
}

impl NodeNaming {
  fn id(&self, conduit: &Conduit, k: usize) -> Box<str> {
    match self {
      NodeNaming::Endpoints => format!("{}-{}-{}", conduit.from, k, conduit.to).into(),
      NodeNaming::Qualified => format!("{}-{}-{}-{}", conduit.from, conduit.id, k, conduit.to).into(),
    }
  }
}

/// Endpoint of a conduit; reservoirs have no meaningful elevation of their own
#[derive(Debug, Clone)]
pub struct Endpoint {
  pub id: Box<str>,
  pub elevation: Option<f64>,
  pub coordinates: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conduit {
  pub id: Box<str>,
  pub from: Box<str>,
  pub to: Box<str>,
  pub length: f64,
  /// m
  pub diameter: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteriorNode {
  pub id: Box<str>,
  pub elevation: f64,
  pub coordinates: (f64, f64),
}

/// Result of splitting one conduit
#[derive(Debug, Clone)]
pub struct Split {
  pub segments: Vec<Conduit>,
  pub nodes: Vec<InteriorNode>,
  /// Elevations used at the two ends, after the reservoir rule
  pub start_elevation: f64,
  pub end_elevation: f64,
}

/// Elevations at both ends; a reservoir end sits one metre above or below the other end
fn end_elevations(conduit: &Conduit, start: &Endpoint, end: &Endpoint) -> Result<(f64, f64), ConvertError> {
  match (start.elevation, end.elevation) {
    (Some(a), Some(b)) => Ok((a, b)),
    (None, Some(b)) => Ok((b + RESERVOIR_ELEVATION_OFFSET, b)),
    (Some(a), None) => Ok((a, a - RESERVOIR_ELEVATION_OFFSET)),
    (None, None) => Err(ConvertError::UnsupportedElement { id: conduit.id.clone(), kind: "reservoir-to-reservoir pipe" }),
  }
}

/// Split `conduit` into `ceil(length / max_length)` equal segments `{id}-{k}`.
///
/// Interior nodes are named by `naming` and get linearly interpolated elevations and
/// coordinates. A conduit no longer than `max_length` comes back as a single segment.
pub fn split_conduit(
  conduit: &Conduit,
  start: &Endpoint,
  end: &Endpoint,
  max_length: f64,
  naming: NodeNaming,
) -> Result<Split, ConvertError> {
  let (start_elevation, end_elevation) = end_elevations(conduit, start, end)?;
  let parts = (conduit.length / max_length).ceil().max(1.0);
  if !(parts <= MAX_SEGMENTS) {
    return Err(ConvertError::InvalidSegmentLength(max_length));
  }
  let parts = parts as usize;
  if parts == 1 {
    return Ok(Split { segments: vec![conduit.clone()], nodes: Vec::new(), start_elevation, end_elevation });
  }

  let segment_length = conduit.length / parts as f64;
  let (x0, y0) = start.coordinates;
  let (x1, y1) = end.coordinates;

  let nodes: Vec<InteriorNode> = (1..parts)
    .map(|k| {
      let t = k as f64 / parts as f64;
      InteriorNode {
        id: naming.id(conduit, k),
        elevation: start_elevation + (end_elevation - start_elevation) * t,
        coordinates: (x0 + (x1 - x0) * t, y0 + (y1 - y0) * t),
      }
    })
    .collect();

  let segments = (0..parts)
    .map(|k| Conduit {
      id: format!("{}-{}", conduit.id, k + 1).into(),
      from: if k == 0 { conduit.from.clone() } else { nodes[k - 1].id.clone() },
      to: if k + 1 == parts { conduit.to.clone() } else { nodes[k].id.clone() },
      length: segment_length,
      diameter: conduit.diameter,
    })
    .collect();

  Ok(Split { segments, nodes, start_elevation, end_elevation })
}

/// All conduits after discretization, plus the interior nodes that were created
#[derive(Debug, Clone, Default)]
pub struct Discretized {
  pub conduits: Vec<Conduit>,
  pub nodes: Vec<InteriorNode>,
  /// Reservoirs that start a split conduit, with the elevation the split assigned them.
  /// A reservoir starting several split conduits keeps the elevation of the last one.
  pub reservoir_elevations: Vec<(Box<str>, f64)>,
}

impl Discretized {
  fn set_reservoir_elevation(&mut self, id: &str, elevation: f64) {
    match self.reservoir_elevations.iter_mut().find(|(other, _)| &**other == id) {
      Some(entry) => entry.1 = elevation,
      None => self.reservoir_elevations.push((id.into(), elevation)),
    }
  }
}

/// Discretize every conduit.
///
/// `endpoint` resolves node ids; `taken_nodes` and `taken_links` are the identifiers already in
/// use, which generated ones may not collide with. Interior nodes whose endpoint names are
/// already in use, as for parallel conduits, are qualified with the conduit id. Nothing is
/// returned unless every conduit splits cleanly.
pub fn discretize<F>(
  conduits: &[Conduit],
  endpoint: F,
  max_length: f64,
  taken_nodes: &HashSet<Box<str>>,
  taken_links: &HashSet<Box<str>>,
) -> Result<Discretized, ConvertError>
where
  F: Fn(&str) -> Option<Endpoint>,
{
  if !max_length.is_finite() || max_length <= 0.0 {
    return Err(ConvertError::InvalidSegmentLength(max_length));
  }

  let mut result = Discretized::default();
  let mut new_nodes: HashSet<Box<str>> = HashSet::new();
  let mut new_links: HashSet<Box<str>> = HashSet::new();

  for conduit in conduits {
    let start = endpoint(&conduit.from).ok_or_else(|| ConvertError::UnknownNode(conduit.from.clone()))?;
    let end = endpoint(&conduit.to).ok_or_else(|| ConvertError::UnknownNode(conduit.to.clone()))?;
    let is_free = |id: &Box<str>| !taken_nodes.contains(id) && !new_nodes.contains(id);
    let mut split = split_conduit(conduit, &start, &end, max_length, NodeNaming::Endpoints)?;
    if !split.nodes.iter().all(|node| is_free(&node.id)) {
      split = split_conduit(conduit, &start, &end, max_length, NodeNaming::Qualified)?;
    }

    if !split.nodes.is_empty() {
      for node in &split.nodes {
        if taken_nodes.contains(&node.id) || !new_nodes.insert(node.id.clone()) {
          return Err(ConvertError::IdCollision(node.id.to_string()));
        }
      }
      for segment in &split.segments {
        if taken_links.contains(&segment.id) || !new_links.insert(segment.id.clone()) {
          return Err(ConvertError::IdCollision(segment.id.to_string()));
        }
      }
      if start.elevation.is_none() {
        result.set_reservoir_elevation(&start.id, split.start_elevation);
      }
    }

    result.conduits.extend(split.segments);
    result.nodes.extend(split.nodes);
  }
  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;

  fn conduit(length: f64) -> Conduit {
    Conduit { id: "P1".into(), from: "A".into(), to: "B".into(), length, diameter: 0.15 }
  }

  fn endpoint(id: &str, elevation: Option<f64>, x: f64) -> Endpoint {
    Endpoint { id: id.into(), elevation, coordinates: (x, 0.0) }
  }

  #[test]
  fn short_conduit_is_untouched() {
    let split = split_conduit(&conduit(100.0), &endpoint("A", Some(5.0), 0.0), &endpoint("B", Some(3.0), 1.0), 100.0, NodeNaming::Endpoints).unwrap();
    assert_eq!(split.segments, vec![conduit(100.0)]);
    assert!(split.nodes.is_empty());
  }

  #[test]
  fn long_conduit_splits_evenly() {
    let split = split_conduit(&conduit(257.0), &endpoint("A", Some(12.0), 0.0), &endpoint("B", Some(9.0), 30.0), 100.0, NodeNaming::Endpoints).unwrap();
    assert_eq!(split.segments.len(), 3);
    for segment in &split.segments {
      assert_relative_eq!(segment.length, 257.0 / 3.0);
    }
    let total: f64 = split.segments.iter().map(|s| s.length).sum();
    assert_relative_eq!(total, 257.0, epsilon = 1e-9);

    let ids: Vec<&str> = split.nodes.iter().map(|n| &*n.id).collect();
    assert_eq!(ids, vec!["A-1-B", "A-2-B"]);
    assert_eq!(&*split.segments[0].to, "A-1-B");
    assert_eq!(&*split.segments[2].from, "A-2-B");
    assert_relative_eq!(split.nodes[0].elevation, 11.0);
    assert_relative_eq!(split.nodes[1].coordinates.0, 20.0);
  }

  #[test]
  fn reservoir_start_sits_above_the_other_end() {
    let split = split_conduit(&conduit(300.0), &endpoint("A", None, 0.0), &endpoint("B", Some(10.0), 0.0), 100.0, NodeNaming::Endpoints).unwrap();
    assert_relative_eq!(split.start_elevation, 11.0);
    assert!(split.nodes.iter().all(|n| n.elevation > 10.0 && n.elevation < 11.0));
  }

  #[test]
  fn generated_ids_may_not_collide() {
    let lookup = |id: &str| Some(endpoint(id, Some(1.0), 0.0));
    let taken: HashSet<Box<str>> = ["A-1-B".into()].into_iter().collect();
    let result = discretize(&[conduit(250.0)], lookup, 100.0, &taken, &HashSet::new()).unwrap();
    assert_eq!(&*result.nodes[0].id, "A-P1-1-B");

    let taken: HashSet<Box<str>> = ["A-1-B".into(), "A-P1-2-B".into()].into_iter().collect();
    let result = discretize(&[conduit(250.0)], lookup, 100.0, &taken, &HashSet::new());
    assert!(matches!(result, Err(ConvertError::IdCollision(id)) if id == "A-P1-2-B"));
  }

  #[test]
  fn parallel_conduits_get_qualified_interior_nodes() {
    let lookup = |id: &str| Some(endpoint(id, Some(1.0), 0.0));
    let twin = Conduit { id: "P2".into(), ..conduit(300.0) };
    let result = discretize(&[conduit(250.0), twin], lookup, 100.0, &HashSet::new(), &HashSet::new()).unwrap();

    let ids: Vec<&str> = result.nodes.iter().map(|n| &*n.id).collect();
    assert_eq!(ids, vec!["A-1-B", "A-2-B", "A-P2-1-B", "A-P2-2-B"]);
    let p2: Vec<(&str, &str)> = result.conduits[3..].iter().map(|c| (&*c.from, &*c.to)).collect();
    assert_eq!(p2, vec![("A", "A-P2-1-B"), ("A-P2-1-B", "A-P2-2-B"), ("A-P2-2-B", "B")]);
  }

  #[test]
  fn reservoir_keeps_the_last_split_elevation() {
    let lookup = |id: &str| match id {
      "R" => Some(endpoint("R", None, 0.0)),
      "B" => Some(endpoint("B", Some(10.0), 0.0)),
      _ => Some(endpoint(id, Some(20.0), 0.0)),
    };
    let first = Conduit { id: "P1".into(), from: "R".into(), to: "B".into(), length: 300.0, diameter: 0.1 };
    let second = Conduit { id: "P2".into(), from: "R".into(), to: "C".into(), length: 300.0, diameter: 0.1 };
    let result = discretize(&[first, second], lookup, 100.0, &HashSet::new(), &HashSet::new()).unwrap();
    assert_eq!(result.reservoir_elevations, vec![(Box::<str>::from("R"), 21.0)]);
  }

  #[test]
  fn rejects_absurd_segment_counts() {
    let result = split_conduit(&conduit(100.0), &endpoint("A", Some(1.0), 0.0), &endpoint("B", Some(1.0), 1.0), 1e-9, NodeNaming::Endpoints);
    assert!(matches!(result, Err(ConvertError::InvalidSegmentLength(_))));
  }

  #[test]
  fn rejects_non_positive_segment_length() {
    let lookup = |id: &str| Some(endpoint(id, Some(1.0), 0.0));
    let result = discretize(&[conduit(250.0)], lookup, 0.0, &HashSet::new(), &HashSet::new());
    assert!(matches!(result, Err(ConvertError::InvalidSegmentLength(_))));
  }
}
