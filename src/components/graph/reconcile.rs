//! Reconciliation of new input against the previous internal state.
//!
//! Decides how much has to be rebuilt when data or configuration change, and
//! carries physical state (positions, velocities, drag pins, collapse state)
//! over to the rebuilt records so incremental edits do not reset the layout.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::config::GraphConfig;
use super::matrix::LinksMatrix;
use super::normalize::{initialize_links, initialize_nodes, tag_orphan_nodes, validate_graph_data};
use super::types::{GraphData, GraphLink, GraphNode, Link, Node};
use crate::error::Result;

/// Node attributes owned by the simulation, ignored when comparing input.
const SIMULATION_ONLY: [&str; 5] = ["x", "y", "vx", "vy", "index"];

/// How the graph elements changed between two inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElementChanges {
	/// Some node or link differs, ignoring simulation-only fields.
	pub graph_elements_updated: bool,
	/// Counts, node ids or link endpoint pairs differ.
	pub new_graph_elements: bool,
}

/// How the effective configuration changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfigChanges {
	/// Anything differs.
	pub config_updated: bool,
	/// The physics sub-object differs.
	pub d3_config_updated: bool,
}

fn comparable_attrs(attrs: &Map<String, Value>) -> Map<String, Value> {
	attrs
		.iter()
		.filter(|(k, _)| !SIMULATION_ONLY.contains(&k.as_str()))
		.map(|(k, v)| (k.clone(), v.clone()))
		.collect()
}

fn same_node(a: &GraphNode, b: &GraphNode) -> bool {
	a.id == b.id && a.fx == b.fx && a.fy == b.fy && comparable_attrs(&a.attrs) == comparable_attrs(&b.attrs)
}

fn endpoint_pairs(links: &[GraphLink]) -> HashSet<(&str, &str)> {
	links
		.iter()
		.map(|l| (l.source.as_str(), l.target.as_str()))
		.collect()
}

/// Compare the next input with the previous one.
pub fn check_for_graph_elements_changes(next: &GraphData, previous: &GraphData) -> ElementChanges {
	let nodes_equal = next.nodes.len() == previous.nodes.len()
		&& next.nodes.iter().zip(&previous.nodes).all(|(a, b)| same_node(a, b));
	let links_equal = next.links() == previous.links();

	let next_ids: HashSet<&str> = next.nodes.iter().map(|n| n.id.as_str()).collect();
	let previous_ids: HashSet<&str> = previous.nodes.iter().map(|n| n.id.as_str()).collect();

	let new_graph_elements = next.nodes.len() != previous.nodes.len()
		|| next.links().len() != previous.links().len()
		|| next_ids != previous_ids
		|| endpoint_pairs(next.links()) != endpoint_pairs(previous.links());

	ElementChanges {
		graph_elements_updated: !(nodes_equal && links_equal),
		new_graph_elements,
	}
}

/// Compare two effective configurations.
pub fn check_for_graph_config_changes(next: &GraphConfig, previous: &GraphConfig) -> ConfigChanges {
	ConfigChanges {
		config_updated: next != previous,
		d3_config_updated: next.d3 != previous.d3,
	}
}

/// State a rebuild can draw physical fields from.
#[derive(Clone, Copy, Debug)]
pub struct Previous<'a> {
	/// Last input.
	pub data: &'a GraphData,
	/// Last node records.
	pub nodes: &'a IndexMap<String, Node>,
	/// Last link records.
	pub links: &'a [Link],
	/// Last effective configuration.
	pub config: &'a GraphConfig,
}

/// Result of (re)initializing graph elements.
#[derive(Clone, Debug)]
pub struct GraphElements {
	/// Node records keyed by id.
	pub nodes: IndexMap<String, Node>,
	/// Link records in input order.
	pub links: Vec<Link>,
	/// Adjacency/visibility matrix.
	pub matrix: LinksMatrix,
}

/// Normalize `data` and carry physical state over from `previous`.
///
/// Nodes present on both sides keep highlight, position, velocity and index.
/// A pinned axis from the new input wins over the carried position; a pin
/// set by dragging survives as long as the input does not pin that node
/// itself.
pub fn merge_nodes(data: &GraphData, previous: Option<Previous<'_>>) -> IndexMap<String, Node> {
	let previous_input: HashMap<&str, &GraphNode> = previous
		.map(|p| p.data.nodes.iter().map(|n| (n.id.as_str(), n)).collect())
		.unwrap_or_default();

	let merged = data.nodes.iter().map(|input| {
		let mut node = Node::from(input);
		let Some(old) = previous.and_then(|p| p.nodes.get(input.id.as_str())) else {
			return node;
		};
		let old_input = previous_input.get(input.id.as_str());
		let input_pinned = input.fx.is_some() || input.fy.is_some();
		let was_input_pinned = old_input.is_some_and(|n| n.fx.is_some() || n.fy.is_some());

		node.highlighted = old.highlighted;
		node.index = old.index;
		node.vx = old.vx;
		node.vy = old.vy;
		node.x = old.x;
		node.y = old.y;
		if !input_pinned && !was_input_pinned {
			node.fx = old.fx;
			node.fy = old.fy;
		}
		node
	});

	initialize_nodes(merged)
}

/// Build link records, reusing the physical state of structurally matching
/// previous links.
///
/// Toggling `directed`, or running without `collapsible`, makes every link
/// visible again.
pub fn merge_links(
	links: &[GraphLink],
	config: &GraphConfig,
	previous: Option<Previous<'_>>,
) -> Result<Vec<Link>> {
	let toggled_directed = previous.is_some_and(|p| p.config.directed != config.directed);

	let mut fresh = initialize_links(links)?;
	if let Some(previous) = previous {
		for link in &mut fresh {
			let matching = previous
				.links
				.iter()
				.find(|l| l.connects(link.source.as_str(), link.target.as_str()));
			if let Some(old) = matching {
				link.is_hidden = old.is_hidden && config.collapsible && !toggled_directed;
			}
		}
	}
	Ok(fresh)
}

/// Validate and (re)build nodes, links and the matrix.
pub fn initialize_graph_elements(
	data: &GraphData,
	config: &GraphConfig,
	previous: Option<Previous<'_>>,
) -> Result<GraphElements> {
	validate_graph_data(data)?;

	let links = merge_links(data.links(), config, previous)?;
	let matrix = LinksMatrix::build(&links, config);
	let mut nodes = merge_nodes(data, previous);
	tag_orphan_nodes(&mut nodes, &matrix);

	Ok(GraphElements {
		nodes,
		links,
		matrix,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn data(value: Value) -> GraphData {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn identical_input_is_not_an_update() {
		let a = data(json!({ "nodes": [{ "id": "a" }], "links": [] }));
		assert_eq!(
			check_for_graph_elements_changes(&a, &a.clone()),
			ElementChanges::default()
		);
	}

	#[test]
	fn position_only_changes_are_ignored() {
		let a = data(json!({ "nodes": [{ "id": "a", "x": 1 }], "links": [] }));
		let b = data(json!({ "nodes": [{ "id": "a", "x": 99, "vx": 3 }], "links": [] }));
		assert!(!check_for_graph_elements_changes(&b, &a).graph_elements_updated);
	}

	#[test]
	fn attribute_changes_update_without_new_elements() {
		let a = data(json!({ "nodes": [{ "id": "a" }], "links": [] }));
		let b = data(json!({ "nodes": [{ "id": "a", "color": "red" }], "links": [] }));
		let changes = check_for_graph_elements_changes(&b, &a);
		assert!(changes.graph_elements_updated);
		assert!(!changes.new_graph_elements);
	}

	#[test]
	fn added_nodes_and_rewired_links_are_new_elements() {
		let a = data(json!({
			"nodes": [{ "id": "a" }, { "id": "b" }, { "id": "c" }],
			"links": [{ "source": "a", "target": "b" }],
		}));
		let b = data(json!({
			"nodes": [{ "id": "a" }, { "id": "b" }, { "id": "c" }],
			"links": [{ "source": "a", "target": "c" }],
		}));
		let changes = check_for_graph_elements_changes(&b, &a);
		assert!(changes.graph_elements_updated && changes.new_graph_elements);

		let mut c = a.clone();
		c.nodes.push(GraphNode::new("d"));
		assert!(check_for_graph_elements_changes(&c, &a).new_graph_elements);
	}

	#[test]
	fn physics_changes_are_flagged_separately() {
		let base = GraphConfig::default();
		let mut wider = base.clone();
		wider.width = 1000.0;
		assert_eq!(
			check_for_graph_config_changes(&wider, &base),
			ConfigChanges {
				config_updated: true,
				d3_config_updated: false
			}
		);

		let mut stiffer = base.clone();
		stiffer.d3.link_strength = 2.0;
		assert!(check_for_graph_config_changes(&stiffer, &base).d3_config_updated);
	}

	#[test]
	fn adding_a_node_keeps_existing_positions() {
		let config = GraphConfig::default();
		let first = data(json!({
			"nodes": [{ "id": "A", "x": 10, "y": 20 }],
			"links": [],
		}));
		let built = initialize_graph_elements(&first, &config, None).unwrap();

		let mut moved = built.nodes.clone();
		moved["A"].x = 42.0;
		moved["A"].vx = 1.5;

		let second = data(json!({
			"nodes": [{ "id": "A", "x": 10, "y": 20 }, { "id": "B" }],
			"links": [],
		}));
		let previous = Previous {
			data: &first,
			nodes: &moved,
			links: &built.links,
			config: &config,
		};
		let rebuilt = initialize_graph_elements(&second, &config, Some(previous)).unwrap();

		assert_eq!((rebuilt.nodes["A"].x, rebuilt.nodes["A"].y), (42.0, 20.0));
		assert_eq!(rebuilt.nodes["A"].vx, 1.5);
		assert_eq!((rebuilt.nodes["B"].x, rebuilt.nodes["B"].y), (0.0, 0.0));
	}

	#[test]
	fn input_pins_win_and_drag_pins_survive() {
		let config = GraphConfig::default();
		let first = data(json!({ "nodes": [{ "id": "A" }, { "id": "B" }], "links": [] }));
		let built = initialize_graph_elements(&first, &config, None).unwrap();
		let mut dragged = built.nodes.clone();
		dragged["A"].x = 5.0;
		dragged["A"].fx = Some(5.0);
		dragged["A"].fy = Some(0.0);

		let second = data(json!({
			"nodes": [{ "id": "A" }, { "id": "B", "fx": 70 }],
			"links": [],
		}));
		let previous = Previous {
			data: &first,
			nodes: &dragged,
			links: &built.links,
			config: &config,
		};
		let rebuilt = initialize_graph_elements(&second, &config, Some(previous)).unwrap();

		assert_eq!(rebuilt.nodes["A"].fx, Some(5.0));
		assert_eq!(rebuilt.nodes["B"].x, 70.0);
	}

	#[test]
	fn collapse_state_survives_unless_directed_toggles() {
		let config = GraphConfig {
			collapsible: true,
			..Default::default()
		};
		let input = data(json!({
			"nodes": [{ "id": "A" }, { "id": "B" }],
			"links": [{ "source": "A", "target": "B", "color": "red" }],
		}));
		let mut built = initialize_graph_elements(&input, &config, None).unwrap();
		built.links[0].is_hidden = true;
		let previous = Previous {
			data: &input,
			nodes: &built.nodes,
			links: &built.links,
			config: &config,
		};

		let kept = initialize_graph_elements(&input, &config, Some(previous)).unwrap();
		assert!(kept.links[0].is_hidden);
		assert_eq!(kept.matrix.get("A", "B"), Some(0.0));
		assert_eq!(kept.links[0].attr_str("color"), Some("red"));

		let directed = GraphConfig {
			directed: true,
			..config.clone()
		};
		let reset = initialize_graph_elements(&input, &directed, Some(previous)).unwrap();
		assert!(!reset.links[0].is_hidden);

		let plain = GraphConfig::default();
		let reset = initialize_graph_elements(&input, &plain, Some(previous)).unwrap();
		assert!(!reset.links[0].is_hidden);
	}
}
