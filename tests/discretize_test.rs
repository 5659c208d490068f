//! Integration test splitting the conduits of a fixture network

use approx::assert_relative_eq;
use hashbrown::HashSet;

use iws_rs::discretize::{discretize, Conduit, Endpoint};
use iws_rs::model::network::Network;

fn conduits(network: &Network) -> Vec<Conduit> {
  network.links.iter()
    .filter_map(|link| {
      let pipe = link.as_pipe()?;
      Some(Conduit {
        id: link.id.clone(),
        from: link.start_node_id.clone(),
        to: link.end_node_id.clone(),
        length: pipe.length,
        diameter: pipe.diameter_m(),
      })
    })
    .collect()
}

#[test]
fn test_discretize_simple_network() {
  let network = Network::from_file("networks/simple.inp").expect("Failed to load simple.inp");
  let endpoint = |id: &str| {
    network.node(id).map(|node| Endpoint {
      id: node.id.clone(),
      elevation: if node.is_reservoir() { None } else { Some(node.elevation) },
      coordinates: node.position(),
    })
  };
  let taken_nodes: HashSet<Box<str>> = network.node_map.keys().cloned().collect();
  let taken_links: HashSet<Box<str>> = network.link_map.keys().cloned().collect();
  let result = discretize(&conduits(&network), endpoint, 100.0, &taken_nodes, &taken_links).unwrap();

  let ids: Vec<&str> = result.conduits.iter().map(|c| &*c.id).collect();
  assert_eq!(ids, vec!["P1-1", "P1-2", "P1-3", "P2"]);
  for segment in &result.conduits[..3] {
    assert_relative_eq!(segment.length, 257.0 / 3.0, epsilon = 1e-9);
    assert_relative_eq!(segment.diameter, 0.15);
  }

  // R1 -> J1 descends from one metre above J1
  assert_eq!(result.nodes.len(), 2);
  for node in &result.nodes {
    assert!(node.elevation > 10.0 && node.elevation < 11.0, "{} at {}", node.id, node.elevation);
    assert!(node.coordinates.0 > 0.0 && node.coordinates.0 < 100.0);
    assert_relative_eq!(node.coordinates.1, 50.0);
  }
  assert_eq!(result.reservoir_elevations, vec![(Box::<str>::from("R1"), 11.0)]);

  // an arbitrarily long segment limit leaves the network as it is
  let whole = discretize(&conduits(&network), endpoint, f64::MAX, &taken_nodes, &taken_links).unwrap();
  assert_eq!(whole.conduits, conduits(&network));
  assert!(whole.nodes.is_empty());
}
