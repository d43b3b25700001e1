//! Input validation and node/link normalization.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::warn;
use serde_json::Value;

use super::matrix::LinksMatrix;
use super::types::{GraphData, GraphLink, Link, Node};
use crate::error::{GraphError, LinkEnd, Result};

/// Check input integrity.
///
/// Missing nodes or a missing link list only log a warning; the caller keeps
/// going with empty collections. Dangling endpoints and non-numeric weights
/// are fatal.
pub fn validate_graph_data(data: &GraphData) -> Result<()> {
	if data.nodes.is_empty() {
		warn!("linkgraph: {}", GraphError::InsufficientData);
	}
	if data.links.is_none() {
		warn!("linkgraph: {}", GraphError::InsufficientLinks);
	}

	let ids: HashSet<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
	for link in data.links() {
		if !ids.contains(link.source.as_str()) {
			return Err(GraphError::InvalidLinks {
				id: link.source.to_string(),
				end: LinkEnd::Source,
			});
		}
		if !ids.contains(link.target.as_str()) {
			return Err(GraphError::InvalidLinks {
				id: link.target.to_string(),
				end: LinkEnd::Target,
			});
		}
		link_value(link)?;
	}
	Ok(())
}

/// Numeric weight of a link. Absent (and zero) weights count as 1.
pub fn link_value(link: &GraphLink) -> Result<f64> {
	match &link.value {
		None => Ok(1.0),
		Some(Value::Number(n)) => match n.as_f64() {
			Some(v) if v != 0.0 => Ok(v),
			_ => Ok(1.0),
		},
		Some(_) => Err(GraphError::InvalidLinkValue {
			from: link.source.to_string(),
			to: link.target.to_string(),
		}),
	}
}

/// Key nodes by id and settle their live coordinates: a pinned axis adopts
/// its pin, everything else keeps its current value (0 when never set).
pub fn initialize_nodes(nodes: impl IntoIterator<Item = Node>) -> IndexMap<String, Node> {
	nodes
		.into_iter()
		.map(|mut node| {
			if let Some(fx) = node.fx {
				node.x = fx;
			}
			if let Some(fy) = node.fy {
				node.y = fy;
			}
			(node.id.to_string(), node)
		})
		.collect()
}

/// Fresh link records for an input list.
pub fn initialize_links(links: &[GraphLink]) -> Result<Vec<Link>> {
	links
		.iter()
		.map(|link| {
			Ok(Link {
				source: link.source.clone(),
				target: link.target.clone(),
				value: link_value(link)?,
				is_hidden: false,
				attrs: link.attrs.clone(),
			})
		})
		.collect()
}

/// Flag nodes with no visible connection in the matrix.
pub fn tag_orphan_nodes(nodes: &mut IndexMap<String, Node>, matrix: &LinksMatrix) {
	for (id, node) in nodes.iter_mut() {
		node.orphan = matrix.degree(id).is_zero();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph::config::GraphConfig;
	use crate::components::graph::types::GraphNode;
	use serde_json::json;

	fn data(value: serde_json::Value) -> GraphData {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn dangling_target_is_fatal() {
		let input = data(json!({
			"nodes": [{ "id": "A" }],
			"links": [{ "source": "A", "target": "Z" }],
		}));
		match validate_graph_data(&input) {
			Err(GraphError::InvalidLinks { id, end }) => {
				assert_eq!(id, "Z");
				assert_eq!(end, LinkEnd::Target);
			}
			other => panic!("unexpected result: {other:?}"),
		}
	}

	#[test]
	fn non_numeric_value_is_fatal() {
		let input = data(json!({
			"nodes": [{ "id": "A" }, { "id": "B" }],
			"links": [{ "source": "A", "target": "B", "value": "heavy" }],
		}));
		assert!(matches!(
			validate_graph_data(&input),
			Err(GraphError::InvalidLinkValue { .. })
		));
	}

	#[test]
	fn missing_nodes_and_links_only_warn() {
		assert!(validate_graph_data(&GraphData::default()).is_ok());
	}

	#[test]
	fn pins_become_live_coordinates() {
		let mut node = GraphNode::new("a").at(3.0, 4.0);
		node.fx = Some(10.0);
		let nodes = initialize_nodes([Node::from(&node), Node::from(&GraphNode::new("b"))]);

		assert_eq!((nodes["a"].x, nodes["a"].y), (10.0, 4.0));
		assert_eq!((nodes["b"].x, nodes["b"].y), (0.0, 0.0));
	}

	#[test]
	fn normalization_is_idempotent() {
		let mut pinned = GraphNode::new("a");
		pinned.fy = Some(-7.0);
		let once = initialize_nodes([
			Node::from(&pinned),
			Node::from(&GraphNode::new("b").at(1.0, 2.0)),
		]);
		let twice = initialize_nodes(once.values().cloned());

		assert_eq!(once, twice);
		assert_eq!(once.keys().collect::<Vec<_>>(), vec!["a", "b"]);
	}

	#[test]
	fn orphans_are_tagged_from_the_matrix() {
		let input = data(json!({
			"nodes": [{ "id": "A" }, { "id": "B" }, { "id": "C" }],
			"links": [{ "source": "A", "target": "B" }],
		}));
		let links = initialize_links(input.links()).unwrap();
		let matrix = LinksMatrix::build(&links, &GraphConfig::default());
		let mut nodes = initialize_nodes(input.nodes.iter().map(Node::from));
		tag_orphan_nodes(&mut nodes, &matrix);

		assert!(!nodes["A"].orphan);
		assert!(!nodes["B"].orphan);
		assert!(nodes["C"].orphan);
	}

	#[test]
	fn zero_and_missing_values_weigh_one() {
		let mut link = GraphLink::new("a", "b");
		assert_eq!(link_value(&link).unwrap(), 1.0);
		link.value = Some(json!(0));
		assert_eq!(link_value(&link).unwrap(), 1.0);
		link.value = Some(json!(2.5));
		assert_eq!(link_value(&link).unwrap(), 2.5);
	}
}
