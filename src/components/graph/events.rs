//! Notifications queued by the engine for the embedding application.

use super::types::Node;

/// Something the host may want to react to. Drained with
/// `GraphState::drain_events`.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
	/// Click on the background.
	ClickGraph,
	/// Confirmed single click on a node.
	ClickNode {
		/// Node id.
		id: String,
		/// Node record at the time of the click.
		node: Node,
	},
	/// Second click on a node inside the disambiguation window.
	DoubleClickNode {
		/// Node id.
		id: String,
		/// Node record.
		node: Node,
	},
	/// Context-menu click on a node.
	RightClickNode {
		/// Node id.
		id: String,
		/// Node record.
		node: Node,
	},
	/// Pointer entered a node.
	MouseOverNode {
		/// Node id.
		id: String,
		/// Node record.
		node: Node,
	},
	/// Pointer left a node.
	MouseOutNode {
		/// Node id.
		id: String,
		/// Node record.
		node: Node,
	},
	/// Click on a link.
	ClickLink {
		/// Source node id.
		source: String,
		/// Target node id.
		target: String,
	},
	/// Context-menu click on a link.
	RightClickLink {
		/// Source node id.
		source: String,
		/// Target node id.
		target: String,
	},
	/// Pointer entered a link.
	MouseOverLink {
		/// Source node id.
		source: String,
		/// Target node id.
		target: String,
	},
	/// Pointer left a link.
	MouseOutLink {
		/// Source node id.
		source: String,
		/// Target node id.
		target: String,
	},
	/// A dragged node was dropped.
	NodePositionChange {
		/// Node id.
		id: String,
		/// Final x.
		x: f64,
		/// Final y.
		y: f64,
	},
	/// Zoom factor changed (debounced).
	ZoomChange {
		/// Zoom before the latest change.
		previous: f64,
		/// Zoom after it.
		current: f64,
	},
}
