//! Collapse/expand of leaf subtrees through the visibility matrix.

use indexmap::IndexMap;

use super::config::GraphConfig;
use super::matrix::LinksMatrix;
use super::types::{Link, Node};

/// A `(source, target)` pair selected for toggling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
	/// Clicked node.
	pub source: String,
	/// Leaf neighbor.
	pub target: String,
}

fn is_leaf(id: &str, matrix: &LinksMatrix, directed: bool) -> bool {
	let degree = matrix.degree(id);
	if directed {
		degree.in_degree <= 1 && degree.out_degree < 1
	} else {
		degree.in_degree <= 1 && degree.out_degree <= 1
	}
}

/// Connections from `root` to every neighbor that does not branch further.
pub fn leaf_connections(root: &str, matrix: &LinksMatrix, config: &GraphConfig) -> Vec<Connection> {
	matrix
		.neighbors(root)
		.filter(|target| is_leaf(target, matrix, config.directed))
		.map(|target| Connection {
			source: root.to_string(),
			target: target.to_string(),
		})
		.collect()
}

/// Flip the visibility of each connection. Visible entries drop to 0, hidden
/// ones come back with the weight of their link (1 when unknown).
pub fn toggle_matrix_connections(
	matrix: &mut LinksMatrix,
	connections: &[Connection],
	links: &[Link],
	config: &GraphConfig,
) {
	for connection in connections {
		let (source, target) = (connection.source.as_str(), connection.target.as_str());
		let value = if matrix.is_visible(source, target) {
			0.0
		} else {
			links
				.iter()
				.find(|l| {
					l.connects(source, target) || (!config.directed && l.connects(target, source))
				})
				.map_or(1.0, |l| l.value)
		};
		matrix.set(source, target, value);
		if !config.directed {
			matrix.set(target, source, value);
		}
	}
}

/// Bring every link's `is_hidden` flag in line with the matrix.
pub fn toggle_links_connections(links: &mut [Link], matrix: &LinksMatrix) {
	for link in links {
		link.is_hidden = !matrix.is_visible(link.source.as_str(), link.target.as_str());
	}
}

/// Orphans are always shown; other nodes only while a visible link touches them.
pub fn is_node_visible(id: &str, nodes: &IndexMap<String, Node>, matrix: &LinksMatrix) -> bool {
	if nodes.get(id).is_some_and(|n| n.orphan) {
		return true;
	}
	!matrix.degree(id).is_zero()
}

/// Outcome of a collapse toggle.
#[derive(Clone, Debug, PartialEq)]
pub struct Toggle {
	/// Connections that flipped.
	pub connections: Vec<Connection>,
	/// The first flipped connection became visible.
	pub expanding: bool,
}

/// Toggle the leaf subtree of `id`, keeping matrix and link list in lockstep.
pub fn toggle_subtree(
	id: &str,
	matrix: &mut LinksMatrix,
	links: &mut [Link],
	config: &GraphConfig,
) -> Toggle {
	let connections = leaf_connections(id, matrix, config);
	toggle_matrix_connections(matrix, &connections, links, config);
	toggle_links_connections(links, matrix);
	let expanding = connections
		.first()
		.is_some_and(|c| matrix.is_visible(&c.source, &c.target));
	Toggle {
		connections,
		expanding,
	}
}
