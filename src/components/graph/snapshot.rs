//! Immutable render snapshot.
//!
//! The engine resolves every visual property (position, style, highlight,
//! visibility) into plain records once per frame. Drawing and hit-testing only
//! ever read a [`GraphSnapshot`].

use std::f64::consts::PI;

use indexmap::IndexMap;
use serde_json::Value;

use super::collapse::is_node_visible;
use super::config::{GraphConfig, LineType, or_same};
use super::highlight::{HighlightedLink, is_link_highlighted, is_node_highlighted};
use super::marker::{Marker, MarkerCache};
use super::matrix::LinksMatrix;
use super::types::{Link, Node};
use super::viewport::{FocusAnimation, Transform};

/// Links are trimmed slightly inside the circle edge so strokes meet it cleanly.
const EDGE_TRIM: f64 = 0.95;
const ARC_SAMPLES: usize = 16;

/// A node ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
	/// Node id.
	pub id: String,
	/// Center x in graph space.
	pub x: f64,
	/// Center y in graph space.
	pub y: f64,
	/// Circle radius in graph space.
	pub radius: f64,
	/// Fill color.
	pub color: String,
	/// Stroke color, `"none"` for no stroke.
	pub stroke_color: String,
	/// Stroke width.
	pub stroke_width: f64,
	/// Opacity after highlight dimming.
	pub opacity: f64,
	/// Label text, if labels are rendered.
	pub label: Option<String>,
	/// Label font size.
	pub font_size: f64,
	/// Label color.
	pub font_color: String,
	/// Part of the highlighted neighborhood.
	pub highlighted: bool,
	/// Not hidden by a collapse.
	pub visible: bool,
}

/// Geometry of a link path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LinkPath {
	/// Straight segment between the endpoints.
	Line,
	/// Clockwise circular arc between the endpoints.
	Arc {
		/// Center x.
		cx: f64,
		/// Center y.
		cy: f64,
		/// Radius.
		radius: f64,
		/// Start angle in radians.
		start: f64,
		/// End angle in radians, reached by increasing angle.
		end: f64,
	},
}

/// A link ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderLink {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Start x, outside the source circle.
	pub x1: f64,
	/// Start y.
	pub y1: f64,
	/// End x, outside the target circle (and its arrowhead).
	pub x2: f64,
	/// End y.
	pub y2: f64,
	/// Path between the endpoints.
	pub path: LinkPath,
	/// Stroke color.
	pub color: String,
	/// Stroke width in graph units, constant on screen.
	pub stroke_width: f64,
	/// Opacity after highlight dimming.
	pub opacity: f64,
	/// Label text, if link labels are rendered.
	pub label: Option<String>,
	/// Highlighted through a node or by hovering.
	pub highlighted: bool,
	/// Hidden by a collapse.
	pub hidden: bool,
	/// Arrowhead for directed graphs.
	pub marker: Option<Marker>,
	/// Arrowhead length along the link.
	pub marker_length: f64,
	/// Arrowhead width across the link.
	pub marker_breadth: f64,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	/// Nodes in input order.
	pub nodes: Vec<RenderNode>,
	/// Links in input order.
	pub links: Vec<RenderLink>,
	/// Current pan/zoom.
	pub transform: Transform,
	/// Focus animation in progress.
	pub focus: Option<FocusAnimation>,
	/// Viewport width.
	pub width: f64,
	/// Viewport height.
	pub height: f64,
}

impl GraphSnapshot {
	/// Topmost visible node under the graph-space point.
	pub fn node_at(&self, gx: f64, gy: f64) -> Option<&RenderNode> {
		self.nodes.iter().rev().find(|n| {
			let (dx, dy) = (n.x - gx, n.y - gy);
			n.visible && dx * dx + dy * dy <= n.radius * n.radius
		})
	}

	/// Topmost visible link passing within `tolerance` of the graph-space point.
	pub fn link_at(&self, gx: f64, gy: f64, tolerance: f64) -> Option<&RenderLink> {
		self.links
			.iter()
			.rev()
			.filter(|l| !l.hidden)
			.find(|l| l.distance_to(gx, gy) <= tolerance.max(l.stroke_width))
	}

	/// Resolved node by id.
	pub fn node(&self, id: &str) -> Option<&RenderNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Resolved link by endpoints.
	pub fn link(&self, source: &str, target: &str) -> Option<&RenderLink> {
		self.links
			.iter()
			.find(|l| l.source == source && l.target == target)
	}
}

impl RenderLink {
	/// Shortest distance from a graph-space point to the link path.
	pub fn distance_to(&self, px: f64, py: f64) -> f64 {
		match self.path {
			LinkPath::Line => segment_distance(px, py, (self.x1, self.y1), (self.x2, self.y2)),
			LinkPath::Arc {
				cx,
				cy,
				radius,
				start,
				end,
			} => {
				let points: Vec<(f64, f64)> = (0..=ARC_SAMPLES)
					.map(|i| {
						let angle = start + (end - start) * i as f64 / ARC_SAMPLES as f64;
						(cx + radius * angle.cos(), cy + radius * angle.sin())
					})
					.collect();
				points
					.windows(2)
					.map(|w| segment_distance(px, py, w[0], w[1]))
					.fold(f64::INFINITY, f64::min)
			}
		}
	}
}

fn segment_distance(px: f64, py: f64, a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 == 0.0 {
		0.0
	} else {
		(((px - a.0) * dx + (py - a.1) * dy) / len2).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
	((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Clockwise arc of radius `radius` from one point to another, taking the
/// short way round. Radii below half the chord are widened to a half circle.
pub fn arc_between(from: (f64, f64), to: (f64, f64), radius: f64) -> LinkPath {
	let (dx, dy) = (to.0 - from.0, to.1 - from.1);
	let chord = (dx * dx + dy * dy).sqrt();
	if chord == 0.0 {
		return LinkPath::Line;
	}
	let radius = radius.max(chord / 2.0);
	let (ux, uy) = (dx / chord, dy / chord);
	let offset = (radius * radius - chord * chord / 4.0).max(0.0).sqrt();
	let (mx, my) = ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
	let (cx, cy) = (mx - uy * offset, my + ux * offset);
	let start = (from.1 - cy).atan2(from.0 - cx);
	let mut end = (to.1 - cy).atan2(to.0 - cx);
	if end < start {
		end += 2.0 * PI;
	}
	LinkPath::Arc {
		cx,
		cy,
		radius,
		start,
		end,
	}
}

fn path_for(line_type: LineType, from: (f64, f64), to: (f64, f64)) -> LinkPath {
	match line_type {
		LineType::Straight => LinkPath::Line,
		LineType::CurveSmooth => {
			let (dx, dy) = (to.0 - from.0, to.1 - from.1);
			arc_between(from, to, (dx * dx + dy * dy).sqrt())
		}
		LineType::CurveFull => arc_between(from, to, 0.0),
	}
}

fn label_text(attrs: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
	match attrs.get(key)? {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

/// State the snapshot is resolved from.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotSource<'a> {
	/// Node records keyed by id.
	pub nodes: &'a IndexMap<String, Node>,
	/// Link records.
	pub links: &'a [Link],
	/// Visibility matrix.
	pub matrix: &'a LinksMatrix,
	/// Effective configuration.
	pub config: &'a GraphConfig,
	/// Id of the highlighted node, empty when none.
	pub highlighted_node: &'a str,
	/// Hovered link, if any.
	pub highlighted_link: Option<&'a HighlightedLink>,
	/// Current pan/zoom.
	pub transform: Transform,
	/// Focus animation in progress.
	pub focus: Option<FocusAnimation>,
}

impl SnapshotSource<'_> {
	fn something_highlighted(&self) -> bool {
		!self.highlighted_node.is_empty() || self.highlighted_link.is_some()
	}

	fn node_size(&self, node: &Node) -> f64 {
		node.attr_f64("size").unwrap_or(self.config.node.size)
	}

	fn render_node(&self, node: &Node) -> RenderNode {
		let config = &self.config.node;
		let highlighted = is_node_highlighted(node, self.highlighted_link);

		let opacity = if self.something_highlighted() {
			if highlighted {
				config.opacity
			} else {
				self.config.highlight_opacity
			}
		} else {
			node.attr_f64("opacity").unwrap_or(config.opacity)
		};

		let base_color = node.attr_str("color").unwrap_or(&config.color);
		let base_stroke = node.attr_str("strokeColor").unwrap_or(&config.stroke_color);
		let (color, stroke_color) = if highlighted {
			(
				or_same(&config.highlight_color, base_color),
				or_same(&config.highlight_stroke_color, base_stroke),
			)
		} else {
			(base_color, base_stroke)
		};

		let render_label = node
			.attrs
			.get("renderLabel")
			.and_then(Value::as_bool)
			.unwrap_or(config.render_label);
		let label = render_label.then(|| {
			label_text(&node.attrs, &config.label_property).unwrap_or_else(|| node.id.to_string())
		});

		RenderNode {
			id: node.id.to_string(),
			x: node.x,
			y: node.y,
			radius: (self.node_size(node) / PI).sqrt(),
			color: color.to_string(),
			stroke_color: stroke_color.to_string(),
			stroke_width: node.attr_f64("strokeWidth").unwrap_or(config.stroke_width),
			opacity,
			label,
			font_size: node.attr_f64("fontSize").unwrap_or(config.font_size),
			font_color: node
				.attr_str("fontColor")
				.unwrap_or(&config.font_color)
				.to_string(),
			highlighted,
			visible: is_node_visible(node.id.as_str(), self.nodes, self.matrix),
		}
	}

	fn render_link(&self, link: &Link, markers: &mut MarkerCache) -> Option<RenderLink> {
		let config = &self.config.link;
		let source = self.nodes.get(link.source.as_str())?;
		let target = self.nodes.get(link.target.as_str())?;

		let highlighted =
			is_link_highlighted(source, target, self.highlighted_node, self.highlighted_link);

		let opacity = if self.something_highlighted() {
			if highlighted {
				config.opacity
			} else {
				self.config.highlight_opacity
			}
		} else {
			link.attr_f64("opacity").unwrap_or(config.opacity)
		};

		let base_color = link.attr_str("color").unwrap_or(&config.color);
		let color = if highlighted {
			or_same(&config.highlight_color, &config.color)
		} else {
			base_color
		};

		let k = self.transform.k;
		let stroke_width = link.attr_f64("strokeWidth").unwrap_or(config.stroke_width) / k;

		// Pull both ends out to the circle edges, the target end also clears
		// the arrowhead.
		let (mut x1, mut y1, mut x2, mut y2) = (source.x, source.y, target.x, target.y);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let norm = (dx * dx + dy * dy).sqrt();
		if norm > 0.0 {
			let (ux, uy) = (dx / norm, dy / norm);
			let source_radius = (self.node_size(source) / PI).sqrt() * EDGE_TRIM;
			let arrow = if self.config.directed {
				stroke_width * config.marker_width.min(config.marker_height)
			} else {
				0.0
			};
			let target_radius = (self.node_size(target) / PI).sqrt() * EDGE_TRIM + arrow;
			x1 += source_radius * ux;
			y1 += source_radius * uy;
			x2 -= target_radius * ux;
			y2 -= target_radius * uy;
		}

		let line_type = link
			.attrs
			.get("type")
			.and_then(|v| serde_json::from_value::<LineType>(v.clone()).ok())
			.unwrap_or(config.line_type);

		let marker = self
			.config
			.directed
			.then(|| markers.get(highlighted, k, self.config.max_zoom));

		let label = config
			.render_label
			.then(|| label_text(&link.attrs, &config.label_property))
			.flatten();

		Some(RenderLink {
			source: link.source.to_string(),
			target: link.target.to_string(),
			x1,
			y1,
			x2,
			y2,
			path: path_for(line_type, (x1, y1), (x2, y2)),
			color: color.to_string(),
			stroke_width,
			opacity,
			label,
			highlighted,
			hidden: self.config.collapsible && link.is_hidden,
			marker,
			marker_length: stroke_width * config.marker_width,
			marker_breadth: stroke_width * config.marker_height,
		})
	}
}

/// Resolve the current state into a snapshot.
pub fn build_snapshot(source: SnapshotSource<'_>, markers: &mut MarkerCache) -> GraphSnapshot {
	GraphSnapshot {
		nodes: source
			.nodes
			.values()
			.map(|n| source.render_node(n))
			.collect(),
		links: source
			.links
			.iter()
			.filter_map(|l| source.render_link(l, markers))
			.collect(),
		transform: source.transform,
		focus: source.focus,
		width: source.config.width,
		height: source.config.height,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph::types::NodeId;

	struct Fixture {
		nodes: IndexMap<String, Node>,
		links: Vec<Link>,
		matrix: LinksMatrix,
		config: GraphConfig,
	}

	fn fixture(config: GraphConfig) -> Fixture {
		let mut nodes = IndexMap::new();
		for (id, x) in [("a", 0.0), ("b", 100.0), ("c", 200.0)] {
			nodes.insert(
				id.to_string(),
				Node {
					id: NodeId::from(id),
					x,
					..Default::default()
				},
			);
		}
		let links = vec![
			Link {
				source: NodeId::from("a"),
				target: NodeId::from("b"),
				value: 1.0,
				..Default::default()
			},
			Link {
				source: NodeId::from("b"),
				target: NodeId::from("c"),
				value: 1.0,
				..Default::default()
			},
		];
		let matrix = LinksMatrix::build(&links, &config);
		Fixture {
			nodes,
			links,
			matrix,
			config,
		}
	}

	fn snapshot(f: &Fixture, highlighted_node: &str) -> GraphSnapshot {
		build_snapshot(
			SnapshotSource {
				nodes: &f.nodes,
				links: &f.links,
				matrix: &f.matrix,
				config: &f.config,
				highlighted_node,
				highlighted_link: None,
				transform: Transform::IDENTITY,
				focus: None,
			},
			&mut MarkerCache::default(),
		)
	}

	#[test]
	fn endpoints_are_trimmed_to_circle_edges() {
		let f = fixture(GraphConfig::default());
		let snap = snapshot(&f, "");
		let link = snap.link("a", "b").unwrap();
		let trim = (200.0 / PI).sqrt() * EDGE_TRIM;
		assert!((link.x1 - trim).abs() < 1e-9);
		assert!((link.x2 - (100.0 - trim)).abs() < 1e-9);
		assert!(link.marker.is_none());
	}

	#[test]
	fn directed_links_get_markers_and_clear_them() {
		let f = fixture(GraphConfig {
			directed: true,
			..Default::default()
		});
		let snap = snapshot(&f, "");
		let link = snap.link("a", "b").unwrap();
		assert_eq!(link.marker.map(|m| m.id()), Some("marker-small"));
		let trim = (200.0 / PI).sqrt() * EDGE_TRIM + 1.5 * 6.0;
		assert!((link.x2 - (100.0 - trim)).abs() < 1e-9);
	}

	#[test]
	fn highlight_dims_everything_else() {
		let mut f = fixture(GraphConfig {
			highlight_opacity: 0.2,
			..Default::default()
		});
		f.nodes["a"].highlighted = true;
		f.nodes["b"].highlighted = true;
		let snap = snapshot(&f, "a");

		assert_eq!(snap.node("a").unwrap().opacity, 1.0);
		assert_eq!(snap.node("c").unwrap().opacity, 0.2);
		assert!(snap.link("a", "b").unwrap().highlighted);
		assert_eq!(snap.link("b", "c").unwrap().opacity, 0.2);
	}

	#[test]
	fn labels_fall_back_to_the_id() {
		let mut f = fixture(GraphConfig {
			node: crate::components::graph::config::NodeConfig {
				label_property: "name".into(),
				..Default::default()
			},
			..Default::default()
		});
		f.nodes["a"]
			.attrs
			.insert("name".into(), Value::String("Alpha".into()));
		let snap = snapshot(&f, "");
		assert_eq!(snap.node("a").unwrap().label.as_deref(), Some("Alpha"));
		assert_eq!(snap.node("b").unwrap().label.as_deref(), Some("b"));
	}

	#[test]
	fn hit_testing_finds_nodes_and_links() {
		let f = fixture(GraphConfig::default());
		let snap = snapshot(&f, "");
		assert_eq!(snap.node_at(101.0, 2.0).map(|n| n.id.as_str()), Some("b"));
		assert!(snap.node_at(50.0, 30.0).is_none());
		let link = snap.link_at(50.0, 1.0, 3.0).unwrap();
		assert_eq!((link.source.as_str(), link.target.as_str()), ("a", "b"));
	}

	#[test]
	fn full_curve_is_a_half_circle() {
		match arc_between((0.0, 0.0), (10.0, 0.0), 0.0) {
			LinkPath::Arc {
				cx,
				cy,
				radius,
				start,
				end,
			} => {
				assert!((cx - 5.0).abs() < 1e-9 && cy.abs() < 1e-9);
				assert!((radius - 5.0).abs() < 1e-9);
				assert!((end - start - PI).abs() < 1e-9);
			}
			LinkPath::Line => panic!("expected an arc"),
		}
	}
}
