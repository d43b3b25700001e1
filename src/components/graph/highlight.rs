//! Highlight propagation across a node's neighborhood.

use indexmap::IndexMap;

use super::config::GraphConfig;
use super::matrix::LinksMatrix;
use super::types::Node;

/// Link currently under the pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightedLink {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
}

/// Set `highlighted` on `id` and, unless `highlight_degree` is 0, on every
/// node directly connected to it in the matrix.
///
/// Returns the id of the highlighted node, empty when un-highlighting.
pub fn update_node_highlighted_value(
	nodes: &mut IndexMap<String, Node>,
	matrix: &LinksMatrix,
	config: &GraphConfig,
	id: &str,
	value: bool,
) -> String {
	if let Some(node) = nodes.get_mut(id) {
		node.highlighted = value;
	}

	if config.highlight_degree != 0 {
		for neighbor in matrix.neighbors(id) {
			if let Some(node) = nodes.get_mut(neighbor) {
				node.highlighted = value;
			}
		}
	}

	if value { id.to_string() } else { String::new() }
}

/// Whether a link should be drawn highlighted.
///
/// A link lights up when the highlighted node is one of its ends and both ends
/// are highlighted, or when it is the highlighted link itself.
pub fn is_link_highlighted(
	source: &Node,
	target: &Node,
	highlighted_node: &str,
	highlighted_link: Option<&HighlightedLink>,
) -> bool {
	let main_node_participates = !highlighted_node.is_empty()
		&& (source.id.as_str() == highlighted_node || target.id.as_str() == highlighted_node);
	let by_node = main_node_participates && source.highlighted && target.highlighted;
	let by_link = highlighted_link.is_some_and(|l| {
		l.source == source.id.as_str() && l.target == target.id.as_str()
	});
	by_node || by_link
}

/// Whether a node counts as highlighted, directly or as an end of the
/// highlighted link.
pub fn is_node_highlighted(node: &Node, highlighted_link: Option<&HighlightedLink>) -> bool {
	node.highlighted
		|| highlighted_link.is_some_and(|l| {
			l.source == node.id.as_str() || l.target == node.id.as_str()
		})
}
