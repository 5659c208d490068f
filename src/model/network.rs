use hashbrown::HashMap;

use crate::model::link::Link;
use crate::model::node::Node;
use crate::model::options::SimulationOptions;
use crate::error::InputError;

#[derive(Default, Debug)]
pub struct Network {
  pub options: SimulationOptions,
  pub nodes: Vec<Node>,
  pub links: Vec<Link>,

  pub node_map: HashMap<Box<str>, usize>,
  pub link_map: HashMap<Box<str>, usize>,
}

/// Network methods to add nodes and links
impl Network {
  pub fn add_node(&mut self, node: Node) -> Result<(), InputError> {
    if self.node_map.contains_key(&node.id) {
      return Err(InputError::new(format!("Node {} already exists", node.id)));
    }
    self.node_map.insert(node.id.clone(), self.nodes.len());
    self.nodes.push(node);
    Ok(())
  }

  pub fn add_link(&mut self, link: Link) -> Result<(), InputError> {
    if self.link_map.contains_key(&link.id) {
      return Err(InputError::new(format!("Link {} already exists", link.id)));
    }
    self.link_map.insert(link.id.clone(), self.links.len());
    self.links.push(link);
    Ok(())
  }

  pub fn node(&self, id: &str) -> Option<&Node> {
    self.node_map.get(id).map(|&index| &self.nodes[index])
  }

  pub fn link(&self, id: &str) -> Option<&Link> {
    self.link_map.get(id).map(|&index| &self.links[index])
  }

  pub fn junctions(&self) -> impl Iterator<Item = &Node> {
    self.nodes.iter().filter(|node| node.is_junction())
  }

  pub fn reservoirs(&self) -> impl Iterator<Item = &Node> {
    self.nodes.iter().filter(|node| node.is_reservoir())
  }

  /// Junctions with a non-zero base demand, in file order
  pub fn demand_nodes(&self) -> impl Iterator<Item = &Node> {
    self.junctions().filter(|node| node.base_demand() != 0.0)
  }
}
