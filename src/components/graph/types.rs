//! Graph data structures: caller input and the engine's internal records.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Node identity. Accepts JSON strings or numbers and stores them as strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
	/// Borrow the id as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl From<String> for NodeId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl From<i64> for NodeId {
	fn from(value: i64) -> Self {
		Self(value.to_string())
	}
}

impl std::borrow::Borrow<str> for NodeId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl<'de> Deserialize<'de> for NodeId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Str(String),
			Int(i64),
			Float(f64),
		}

		Ok(match Raw::deserialize(deserializer)? {
			Raw::Str(s) => NodeId(s),
			Raw::Int(i) => NodeId(i.to_string()),
			Raw::Float(f) => NodeId(f.to_string()),
		})
	}
}

/// A node as supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique identifier for this node. Used to reference nodes in links.
	pub id: NodeId,
	/// Initial x position.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x: Option<f64>,
	/// Initial y position.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub y: Option<f64>,
	/// Pinned x position. The simulation never moves a pinned axis.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fx: Option<f64>,
	/// Pinned y position.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fy: Option<f64>,
	/// Arbitrary style/display attributes (`color`, `size`, `label`, ...).
	#[serde(flatten)]
	pub attrs: Map<String, Value>,
}

impl GraphNode {
	/// Node with an id and nothing else.
	pub fn new(id: impl Into<NodeId>) -> Self {
		Self {
			id: id.into(),
			..Default::default()
		}
	}

	/// Builder-style position setter.
	pub fn at(mut self, x: f64, y: f64) -> Self {
		self.x = Some(x);
		self.y = Some(y);
		self
	}
}

/// A relation between two nodes as supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
	/// Source node ID.
	pub source: NodeId,
	/// Target node ID.
	pub target: NodeId,
	/// Optional weight. Kept raw so non-numeric values can be reported.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
	/// Arbitrary style attributes.
	#[serde(flatten)]
	pub attrs: Map<String, Value>,
}

impl GraphLink {
	/// Link between two ids with default weight.
	pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			..Default::default()
		}
	}
}

/// Complete graph input: nodes, links and an optional focus request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
	/// Graph nodes.
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	/// Graph links. `None` means the list was not supplied at all.
	#[serde(default)]
	pub links: Option<Vec<GraphLink>>,
	/// Node the viewport should center on.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub focused_node_id: Option<NodeId>,
}

impl GraphData {
	/// Input with the given nodes and links.
	pub fn new(nodes: Vec<GraphNode>, links: Vec<GraphLink>) -> Self {
		Self {
			nodes,
			links: Some(links),
			focused_node_id: None,
		}
	}

	/// The link list, empty when it was not supplied.
	pub fn links(&self) -> &[GraphLink] {
		self.links.as_deref().unwrap_or_default()
	}
}

/// Normalized node record. Carries both the caller's attributes and the
/// simulation-owned fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
	/// Node identity.
	pub id: NodeId,
	/// Style/display attributes copied from the input.
	pub attrs: Map<String, Value>,
	/// Current x position.
	pub x: f64,
	/// Current y position.
	pub y: f64,
	/// Pinned x position.
	pub fx: Option<f64>,
	/// Pinned y position.
	pub fy: Option<f64>,
	/// Velocity along x.
	pub vx: f64,
	/// Velocity along y.
	pub vy: f64,
	/// Position in the simulation's body list once bound.
	pub index: Option<usize>,
	/// Highlight flag.
	pub highlighted: bool,
	/// True iff the node had no incident links when the state was built.
	pub orphan: bool,
}

impl Node {
	/// String attribute lookup.
	pub fn attr_str(&self, key: &str) -> Option<&str> {
		self.attrs.get(key).and_then(Value::as_str)
	}

	/// Numeric attribute lookup.
	pub fn attr_f64(&self, key: &str) -> Option<f64> {
		self.attrs.get(key).and_then(Value::as_f64)
	}

	/// True when either axis is pinned.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

impl From<&GraphNode> for Node {
	fn from(node: &GraphNode) -> Self {
		Self {
			id: node.id.clone(),
			attrs: node.attrs.clone(),
			x: node.x.unwrap_or(0.0),
			y: node.y.unwrap_or(0.0),
			fx: node.fx,
			fy: node.fy,
			..Default::default()
		}
	}
}

/// Link record shared by rendering and the simulation. Endpoints are always
/// plain ids; the simulation resolves them to body indices when it binds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Link {
	/// Source node id.
	pub source: NodeId,
	/// Target node id.
	pub target: NodeId,
	/// Weight, 1 when not given.
	pub value: f64,
	/// Hidden by a collapse.
	pub is_hidden: bool,
	/// Style attributes copied from the input.
	pub attrs: Map<String, Value>,
}

impl Link {
	/// String attribute lookup.
	pub fn attr_str(&self, key: &str) -> Option<&str> {
		self.attrs.get(key).and_then(Value::as_str)
	}

	/// Numeric attribute lookup.
	pub fn attr_f64(&self, key: &str) -> Option<f64> {
		self.attrs.get(key).and_then(Value::as_f64)
	}

	/// True when both endpoints match.
	pub fn connects(&self, source: &str, target: &str) -> bool {
		self.source.as_str() == source && self.target.as_str() == target
	}
}
