//! Graph configuration with built-in defaults.
//!
//! Callers pass a partial JSON object; [`GraphConfig::from_partial`] deep-merges
//! it over the defaults so every field the engine reads is always defined.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Physics tuning for the force simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsConfig {
	/// Alpha the simulation settles toward after a perturbation.
	pub alpha_target: f64,
	/// Many-body strength. Negative values repel.
	pub gravity: f64,
	/// Rest length of link springs.
	pub link_length: f64,
	/// Stiffness of link springs.
	pub link_strength: f64,
	/// Turn off spring attraction along links.
	pub disable_link_force: bool,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			alpha_target: 0.05,
			gravity: -100.0,
			link_length: 100.0,
			link_strength: 1.0,
			disable_link_force: false,
		}
	}
}

/// Default node styling. Individual nodes override these through attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
	/// Fill color.
	pub color: String,
	/// Fill color while highlighted. `"SAME"` keeps `color`.
	pub highlight_color: String,
	/// Area of the node symbol.
	pub size: f64,
	/// Opacity when nothing is highlighted.
	pub opacity: f64,
	/// Stroke color, `"none"` for no stroke.
	pub stroke_color: String,
	/// Stroke width.
	pub stroke_width: f64,
	/// Stroke color while highlighted. `"SAME"` keeps `stroke_color`.
	pub highlight_stroke_color: String,
	/// Attribute used as label text.
	pub label_property: String,
	/// Draw labels at all.
	pub render_label: bool,
	/// Label font size.
	pub font_size: f64,
	/// Label color.
	pub font_color: String,
}

impl Default for NodeConfig {
	fn default() -> Self {
		Self {
			color: "#d3d3d3".to_string(),
			highlight_color: SAME.to_string(),
			size: 200.0,
			opacity: 1.0,
			stroke_color: "none".to_string(),
			stroke_width: 1.5,
			highlight_stroke_color: SAME.to_string(),
			label_property: "id".to_string(),
			render_label: true,
			font_size: 8.0,
			font_color: "black".to_string(),
		}
	}
}

/// Shape of a link path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineType {
	/// Straight segment.
	#[default]
	Straight,
	/// Gentle arc whose radius follows the link length.
	CurveSmooth,
	/// Half circle.
	CurveFull,
}

/// Default link styling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkConfig {
	/// Stroke color.
	pub color: String,
	/// Stroke color while highlighted. `"SAME"` keeps `color`.
	pub highlight_color: String,
	/// Opacity when nothing is highlighted.
	pub opacity: f64,
	/// Stroke width.
	pub stroke_width: f64,
	/// Arrow marker width, in stroke widths.
	pub marker_width: f64,
	/// Arrow marker height, in stroke widths.
	pub marker_height: f64,
	/// Path shape.
	#[serde(rename = "type")]
	pub line_type: LineType,
	/// Attribute used as label text.
	pub label_property: String,
	/// Draw labels at all.
	pub render_label: bool,
}

impl Default for LinkConfig {
	fn default() -> Self {
		Self {
			color: "#d3d3d3".to_string(),
			highlight_color: SAME.to_string(),
			opacity: 1.0,
			stroke_width: 1.5,
			marker_width: 6.0,
			marker_height: 6.0,
			line_type: LineType::Straight,
			label_property: "label".to_string(),
			render_label: false,
		}
	}
}

/// Sentinel meaning "use the non-highlighted value".
pub const SAME: &str = "SAME";

/// Resolve a highlight style value that may be [`SAME`].
pub fn or_same<'a>(value: &'a str, fallback: &'a str) -> &'a str {
	if value == SAME { fallback } else { value }
}

/// Effective graph configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
	/// Restart the simulation when a dragged node is dropped.
	pub automatic_rearrange_after_drop_node: bool,
	/// Clicking a node toggles its leaf connections.
	pub collapsible: bool,
	/// Links are directed.
	pub directed: bool,
	/// Duration of the focus animation, in seconds.
	pub focus_animation_duration: f64,
	/// Zoom applied when focusing a node. Clamped into `[min_zoom, max_zoom]`.
	pub focus_zoom: f64,
	/// Disable drag and zoom entirely.
	pub freeze_all_drag_events: bool,
	/// Viewport height.
	pub height: f64,
	/// 0 highlights only the hovered node, anything else includes direct neighbors.
	pub highlight_degree: u32,
	/// Opacity of elements outside the highlighted neighborhood.
	pub highlight_opacity: f64,
	/// Zoom applied when zoom handling is (re)configured.
	pub initial_zoom: Option<f64>,
	/// Hovering a link highlights it.
	pub link_highlight_behavior: bool,
	/// Upper zoom bound.
	pub max_zoom: f64,
	/// Lower zoom bound.
	pub min_zoom: f64,
	/// Hovering a node highlights it (and its neighbors).
	pub node_highlight_behavior: bool,
	/// Suppress zoom-change notifications.
	pub pan_and_zoom: bool,
	/// Never run the simulation.
	pub static_graph: bool,
	/// Never run the simulation, but still allow dragging.
	pub static_graph_with_drag_and_drop: bool,
	/// Reject drags that leave the viewport.
	pub bounded: bool,
	/// Viewport width.
	pub width: f64,
	/// Physics tuning.
	pub d3: PhysicsConfig,
	/// Default node styling.
	pub node: NodeConfig,
	/// Default link styling.
	pub link: LinkConfig,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			automatic_rearrange_after_drop_node: false,
			collapsible: false,
			directed: false,
			focus_animation_duration: 0.75,
			focus_zoom: 1.0,
			freeze_all_drag_events: false,
			height: 400.0,
			highlight_degree: 1,
			highlight_opacity: 1.0,
			initial_zoom: None,
			link_highlight_behavior: false,
			max_zoom: 8.0,
			min_zoom: 0.1,
			node_highlight_behavior: false,
			pan_and_zoom: false,
			static_graph: false,
			static_graph_with_drag_and_drop: false,
			bounded: false,
			width: 800.0,
			d3: PhysicsConfig::default(),
			node: NodeConfig::default(),
			link: LinkConfig::default(),
		}
	}
}

impl GraphConfig {
	/// Merge a partial user configuration over the defaults.
	pub fn from_partial(partial: &Value) -> Result<Self> {
		let mut merged = serde_json::to_value(Self::default())?;
		if !partial.is_null() {
			merge(&mut merged, partial);
		}
		let mut config: Self = serde_json::from_value(merged)?;
		config.clamp_focus_zoom();
		Ok(config)
	}

	fn clamp_focus_zoom(&mut self) {
		if self.focus_zoom > self.max_zoom {
			self.focus_zoom = self.max_zoom;
		} else if self.focus_zoom < self.min_zoom {
			self.focus_zoom = self.min_zoom;
		}
	}

	/// Clamp a zoom factor into the configured range.
	pub fn clamp_zoom(&self, k: f64) -> f64 {
		k.clamp(self.min_zoom, self.max_zoom.max(self.min_zoom))
	}
}

/// Recursively merge `patch` into `base`. Objects merge key by key, anything
/// else replaces the base value.
pub fn merge(base: &mut Value, patch: &Value) {
	match (base, patch) {
		(Value::Object(base), Value::Object(patch)) => {
			for (key, value) in patch {
				match base.get_mut(key) {
					Some(existing) => merge(existing, value),
					None => {
						base.insert(key.clone(), value.clone());
					}
				}
			}
		}
		(base, patch) => *base = patch.clone(),
	}
}
