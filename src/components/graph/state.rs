//! Graph state engine.
//!
//! [`GraphState`] owns the normalized nodes and links, the visibility matrix,
//! the force simulation and every piece of interaction state. It is created
//! once per graph instance, reconciled in place on each new input through
//! [`GraphState::update`], and advanced by the host calling
//! [`GraphState::tick`] and [`GraphState::poll`] from its frame loop.
//!
//! Nothing here reads a clock. Time-dependent operations take `now` in
//! milliseconds, which keeps the engine deterministic under test.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde_json::Value;

use super::collapse::{is_node_visible, toggle_subtree};
use super::config::GraphConfig;
use super::events::GraphEvent;
use super::highlight::{HighlightedLink, update_node_highlighted_value};
use super::interaction::{
	ClickDisambiguator, ClickOutcome, DragState, Handlers, Timer, ZOOM_DEBOUNCE_MS,
};
use super::marker::MarkerCache;
use super::matrix::LinksMatrix;
use super::normalize::initialize_nodes;
use super::reconcile::{
	GraphElements, Previous, check_for_graph_config_changes, check_for_graph_elements_changes,
	initialize_graph_elements,
};
use super::simulation::ForceSimulation;
use super::snapshot::{GraphSnapshot, SnapshotSource, build_snapshot};
use super::types::{GraphData, Link, Node};
use super::viewport::{FocusAnimation, Transform, Viewport, compute_focus_transform, is_within_bounds};
use crate::error::{GraphError, Result};

/// Long-lived state of one graph instance.
pub struct GraphState {
	id: String,
	data: GraphData,
	config: GraphConfig,
	nodes: IndexMap<String, Node>,
	links: Vec<Link>,
	matrix: LinksMatrix,
	simulation: ForceSimulation,
	transform: Transform,
	previous_zoom: f64,
	highlighted_node: String,
	highlighted_link: Option<HighlightedLink>,
	focus_transform: Option<Transform>,
	focus_animation: bool,
	focus_timer: Timer<()>,
	clicks: ClickDisambiguator,
	zoom_notice: Timer<(f64, f64)>,
	drag: DragState,
	drag_bindings: HashSet<String>,
	handlers: Handlers,
	events: Vec<GraphEvent>,
	markers: MarkerCache,
}

impl GraphState {
	/// Build the state for graph `id` from its first input.
	///
	/// `config` is a partial configuration merged over the defaults.
	pub fn new(id: &str, data: GraphData, config: &Value, handlers: Handlers) -> Result<Self> {
		if id.trim().is_empty() {
			return Err(GraphError::MissingIdentity);
		}
		let config = GraphConfig::from_partial(config)?;
		let GraphElements {
			nodes,
			links,
			matrix,
		} = initialize_graph_elements(&data, &config, None)?;

		let mut state = Self {
			id: id.replace(' ', "_"),
			simulation: ForceSimulation::new(&config),
			data,
			config,
			nodes,
			links,
			matrix,
			transform: Transform::IDENTITY,
			previous_zoom: 1.0,
			highlighted_node: String::new(),
			highlighted_link: None,
			focus_transform: None,
			focus_animation: false,
			focus_timer: Timer::default(),
			clicks: ClickDisambiguator::default(),
			zoom_notice: Timer::default(),
			drag: DragState::default(),
			drag_bindings: HashSet::new(),
			handlers,
			events: Vec::new(),
			markers: MarkerCache::default(),
		};

		state.bind_simulation();
		state.refresh_drag_bindings();
		if !state.config.static_graph && !state.config.static_graph_with_drag_and_drop {
			state.simulation.restart();
		}
		state.configure_zoom();
		state.previous_zoom = state.transform.k;

		info!(
			"linkgraph: graph \"{}\" created with {} nodes, {} links",
			state.id,
			state.nodes.len(),
			state.links.len()
		);
		Ok(state)
	}

	/// Reconcile a new input with the current state.
	///
	/// Physical state (positions, velocities, drag pins, collapse decisions)
	/// carries over wherever the node or link survives. On error nothing
	/// changes.
	pub fn update(&mut self, data: GraphData, config: &Value, now: f64) -> Result<()> {
		let next_config = GraphConfig::from_partial(config)?;
		let elements = check_for_graph_elements_changes(&data, &self.data);
		let changes = check_for_graph_config_changes(&next_config, &self.config);
		let visibility_rules_changed = next_config.directed != self.config.directed
			|| next_config.collapsible != self.config.collapsible;

		let rebuilt = if elements.graph_elements_updated || visibility_rules_changed {
			Some(initialize_graph_elements(
				&data,
				&next_config,
				Some(Previous {
					data: &self.data,
					nodes: &self.nodes,
					links: &self.links,
					config: &self.config,
				}),
			)?)
		} else {
			None
		};

		debug!(
			"linkgraph: update (elements updated: {}, new elements: {}, config updated: {}, physics updated: {})",
			elements.graph_elements_updated,
			elements.new_graph_elements,
			changes.config_updated,
			changes.d3_config_updated
		);

		if elements.new_graph_elements {
			self.simulation.stop();
		}
		if next_config.pan_and_zoom != self.config.pan_and_zoom {
			self.transform = Transform::IDENTITY;
		}

		let previous_focus = self.data.focused_node_id.clone();
		self.data = data;
		self.config = next_config;
		if let Some(GraphElements {
			nodes,
			links,
			matrix,
		}) = rebuilt
		{
			self.nodes = nodes;
			self.links = links;
			self.matrix = matrix;
			if !self.highlighted_node.is_empty() && !self.nodes.contains_key(&self.highlighted_node) {
				self.highlighted_node.clear();
			}
			self.bind_simulation();
		}

		self.update_focus(previous_focus.as_ref().map(|id| id.as_str()), now);
		self.apply_config_changes(
			changes.config_updated,
			elements.new_graph_elements || changes.d3_config_updated,
		);
		Ok(())
	}

	fn apply_config_changes(&mut self, config_updated: bool, rebind: bool) {
		if config_updated {
			self.simulation.configure(&self.config);
		}
		if self.config.static_graph || self.config.static_graph_with_drag_and_drop {
			self.simulation.stop();
		}

		if !self.config.static_graph && rebind {
			self.bind_simulation();
			self.refresh_drag_bindings();
			if !self.config.static_graph_with_drag_and_drop {
				// a rebuilt layout starts hot, like a fresh simulation
				self.simulation.set_alpha(1.0);
				self.simulation.restart();
			}
		} else if config_updated {
			self.refresh_drag_bindings();
		}

		if config_updated {
			self.configure_zoom();
		}
	}

	fn update_focus(&mut self, previous: Option<&str>, now: f64) {
		let current = self.data.focused_node_id.as_ref().map(|id| id.to_string());
		if current.as_deref() == previous {
			return;
		}

		if let Some(id) = current {
			match self.nodes.get(&id).map(|n| (n.x, n.y)) {
				Some((x, y)) => {
					let transform = compute_focus_transform(x, y, &self.config);
					self.focus_transform = Some(transform);
					self.zoom(transform, now);
				}
				None => warn!("linkgraph: cannot focus unknown node \"{}\"", id),
			}
		}

		self.focus_animation = true;
		self.focus_timer
			.schedule((), now + self.config.focus_animation_duration * 1000.0);
	}

	/// Zoom range and initial zoom.
	fn configure_zoom(&mut self) {
		self.transform = self.transform.clamped(&self.config);
		if let Some(k) = self.config.initial_zoom {
			let k = self.config.clamp_zoom(k);
			let (cx, cy) = (self.config.width / 2.0, self.config.height / 2.0);
			self.transform = self
				.transform
				.zoom_at(cx, cy, k / self.transform.k, &self.config);
		}
	}

	fn bind_simulation(&mut self) {
		for (index, node) in self.nodes.values_mut().enumerate() {
			node.index = Some(index);
		}
		self.simulation.bind(&self.nodes, &self.links);
	}

	fn refresh_drag_bindings(&mut self) {
		self.drag_bindings = if self.config.freeze_all_drag_events {
			HashSet::new()
		} else {
			self.nodes
				.keys()
				.filter(|id| is_node_visible(id, &self.nodes, &self.matrix))
				.cloned()
				.collect()
		};
	}

	fn publish_positions(&mut self) {
		for (node, body) in self.nodes.values_mut().zip(self.simulation.bodies()) {
			node.x = body.x;
			node.y = body.y;
			node.vx = body.vx;
			node.vy = body.vy;
		}
	}

	/// Advance the simulation one iteration and publish positions. Returns
	/// whether anything moved.
	pub fn tick(&mut self) -> bool {
		if !self.simulation.tick() {
			return false;
		}
		self.publish_positions();
		true
	}

	/// Fire every timer whose deadline has passed.
	pub fn poll(&mut self, now: f64) {
		if let Some(id) = self.clicks.due(now) {
			self.confirm_click(&id);
		}
		if let Some((previous, current)) = self.zoom_notice.due(now) {
			self.events.push(GraphEvent::ZoomChange { previous, current });
		}
		if self.focus_timer.due(now).is_some() {
			self.focus_animation = false;
		}
	}

	fn node_event(&self, id: &str, make: fn(String, Node) -> GraphEvent) -> Option<GraphEvent> {
		self.nodes.get(id).map(|n| make(id.to_string(), n.clone()))
	}

	fn confirm_click(&mut self, id: &str) {
		if !self.nodes.contains_key(id) {
			return;
		}
		if self.config.collapsible {
			let toggle = toggle_subtree(id, &mut self.matrix, &mut self.links, &self.config);
			debug!(
				"linkgraph: {} {} connection(s) of \"{}\"",
				if toggle.expanding { "expanded" } else { "collapsed" },
				toggle.connections.len(),
				id
			);
			self.simulation.bind_links(&self.nodes, &self.links);
			if toggle.expanding {
				self.refresh_drag_bindings();
			}
		}
		if let Some(event) = self.node_event(id, |id, node| GraphEvent::ClickNode { id, node }) {
			self.events.push(event);
		}
	}

	/// Click on node `id`. Confirmed as a single click by [`Self::poll`] once
	/// the disambiguation window passes; a second click inside the window
	/// becomes a double click instead.
	pub fn click_node(&mut self, id: &str, now: f64) {
		if !self.nodes.contains_key(id) {
			return;
		}
		// A click whose window already elapsed must not pair with this one.
		self.poll(now);
		match self.clicks.click(id, now, self.handlers.click_ttl()) {
			ClickOutcome::Pending => {}
			ClickOutcome::DoubleClick(id) => {
				if let Some(event) =
					self.node_event(&id, |id, node| GraphEvent::DoubleClickNode { id, node })
				{
					self.events.push(event);
				}
			}
		}
	}

	/// Context-menu click on node `id`.
	pub fn right_click_node(&mut self, id: &str) {
		if let Some(event) = self.node_event(id, |id, node| GraphEvent::RightClickNode { id, node }) {
			self.events.push(event);
		}
	}

	/// Click on the background. Ends any focus animation.
	pub fn click_graph(&mut self) {
		self.stop_focus_animation();
		self.events.push(GraphEvent::ClickGraph);
	}

	/// Click on a link.
	pub fn click_link(&mut self, source: &str, target: &str) {
		self.events.push(GraphEvent::ClickLink {
			source: source.to_string(),
			target: target.to_string(),
		});
	}

	/// Context-menu click on a link.
	pub fn right_click_link(&mut self, source: &str, target: &str) {
		self.events.push(GraphEvent::RightClickLink {
			source: source.to_string(),
			target: target.to_string(),
		});
	}

	/// Pointer entered node `id`. Ignored while dragging.
	pub fn mouse_over_node(&mut self, id: &str) {
		self.hover_node(id, true);
	}

	/// Pointer left node `id`. Ignored while dragging.
	pub fn mouse_out_node(&mut self, id: &str) {
		self.hover_node(id, false);
	}

	fn hover_node(&mut self, id: &str, over: bool) {
		if self.drag.active || !self.nodes.contains_key(id) {
			return;
		}
		let event = if over {
			self.node_event(id, |id, node| GraphEvent::MouseOverNode { id, node })
		} else {
			self.node_event(id, |id, node| GraphEvent::MouseOutNode { id, node })
		};
		self.events.extend(event);
		if self.config.node_highlight_behavior {
			self.highlighted_node = update_node_highlighted_value(
				&mut self.nodes,
				&self.matrix,
				&self.config,
				id,
				over,
			);
		}
	}

	/// Pointer entered a link.
	pub fn mouse_over_link(&mut self, source: &str, target: &str) {
		self.events.push(GraphEvent::MouseOverLink {
			source: source.to_string(),
			target: target.to_string(),
		});
		if self.config.link_highlight_behavior {
			self.highlighted_link = Some(HighlightedLink {
				source: source.to_string(),
				target: target.to_string(),
			});
		}
	}

	/// Pointer left a link.
	pub fn mouse_out_link(&mut self, source: &str, target: &str) {
		self.events.push(GraphEvent::MouseOutLink {
			source: source.to_string(),
			target: target.to_string(),
		});
		if self.config.link_highlight_behavior {
			self.highlighted_link = None;
		}
	}

	/// Begin dragging node `id`. Returns false when the node cannot be
	/// dragged (unknown, not drag-bound, or drag events frozen).
	pub fn drag_start(&mut self, id: &str) -> bool {
		if self.config.freeze_all_drag_events || !self.drag_bindings.contains(id) {
			return false;
		}
		self.drag = DragState {
			active: true,
			node_id: Some(id.to_string()),
			moved: false,
		};
		self.simulation.stop();
		self.stop_focus_animation();
		true
	}

	/// Move the dragged node `id` by a graph-space delta. Returns whether the
	/// move was applied.
	pub fn drag_move(&mut self, id: &str, dx: f64, dy: f64) -> bool {
		if !self.drag.active || self.drag.node_id.as_deref() != Some(id) || self.config.static_graph
		{
			return false;
		}
		let Some((index, _, node)) = self.nodes.get_full_mut(id) else {
			return false;
		};
		let (x, y) = (node.x + dx, node.y + dy);
		if self.config.bounded
			&& !is_within_bounds((x, y), &self.transform, Viewport::from(&self.config))
		{
			return false;
		}

		node.x = x;
		node.y = y;
		node.fx = Some(x);
		node.fy = Some(y);
		self.simulation.pin(index, x, y);
		self.drag.moved = true;
		true
	}

	/// Finish the current drag.
	pub fn drag_end(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		if drag.moved {
			if let Some(node) = drag.node_id.as_deref().and_then(|id| self.nodes.get(id)) {
				self.events.push(GraphEvent::NodePositionChange {
					id: node.id.to_string(),
					x: node.x,
					y: node.y,
				});
			}
		}
		if !self.config.static_graph && self.config.automatic_rearrange_after_drop_node {
			self.simulation.set_alpha_target(self.config.d3.alpha_target);
			self.simulation.restart();
		}
	}

	/// Set the pan/zoom transform. The zoom factor is clamped into the
	/// configured range; zoom changes are reported after a quiet window.
	pub fn zoom(&mut self, transform: Transform, now: f64) {
		if self.config.freeze_all_drag_events {
			return;
		}
		self.transform = transform.clamped(&self.config);
		let k = self.transform.k;
		if self.handlers.zoom_change && k != self.previous_zoom && !self.config.pan_and_zoom {
			self.zoom_notice
				.schedule((self.previous_zoom, k), now + ZOOM_DEBOUNCE_MS);
			self.previous_zoom = k;
		}
	}

	/// Scale by `factor` around the screen point `(sx, sy)`.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64, now: f64) {
		let transform = self.transform.zoom_at(sx, sy, factor, &self.config);
		self.zoom(transform, now);
	}

	/// Translate the view by a screen-space delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		if self.config.freeze_all_drag_events {
			return;
		}
		self.transform.x += dx;
		self.transform.y += dy;
	}

	/// Drop drag pins, move nodes back to their input positions and let the
	/// layout settle again. Static graphs are left alone.
	pub fn reset_nodes_positions(&mut self) {
		if self.config.static_graph {
			return;
		}
		let initial = initialize_nodes(self.data.nodes.iter().map(Node::from));
		for node in self.nodes.values_mut() {
			if node.fx.is_some() && node.fy.is_some() {
				node.fx = None;
				node.fy = None;
			}
			if let Some(start) = initial.get(node.id.as_str()) {
				node.x = start.x;
				node.y = start.y;
			}
		}
		for (index, node) in self.nodes.values().enumerate() {
			self.simulation.sync_body(index, node);
		}
		self.simulation.set_alpha_target(self.config.d3.alpha_target);
		self.simulation.restart();
	}

	/// Stop the simulation.
	pub fn pause_simulation(&mut self) {
		self.simulation.stop();
	}

	/// Resume the simulation unless the graph is static.
	pub fn restart_simulation(&mut self) {
		if !self.config.static_graph {
			self.simulation.restart();
		}
	}

	/// Cancel every pending timer and stop the simulation. Call before
	/// discarding the instance.
	pub fn teardown(&mut self) {
		self.simulation.stop();
		self.clicks.cancel();
		self.focus_timer.cancel();
		self.zoom_notice.cancel();
		self.drag = DragState::default();
		debug!("linkgraph: graph \"{}\" torn down", self.id);
	}

	fn stop_focus_animation(&mut self) {
		self.focus_animation = false;
		self.focus_timer.cancel();
	}

	/// Replace the declared host handlers.
	pub fn set_handlers(&mut self, handlers: Handlers) {
		if !handlers.zoom_change {
			self.zoom_notice.cancel();
		}
		self.handlers = handlers;
	}

	/// Take every queued event.
	pub fn drain_events(&mut self) -> Vec<GraphEvent> {
		std::mem::take(&mut self.events)
	}

	/// Resolve the current state for rendering.
	pub fn snapshot(&mut self) -> GraphSnapshot {
		let focus = self
			.focus_transform
			.filter(|_| self.focus_animation)
			.map(|transform| FocusAnimation {
				transform,
				duration: self.config.focus_animation_duration,
			});
		build_snapshot(
			SnapshotSource {
				nodes: &self.nodes,
				links: &self.links,
				matrix: &self.matrix,
				config: &self.config,
				highlighted_node: &self.highlighted_node,
				highlighted_link: self.highlighted_link.as_ref(),
				transform: self.transform,
				focus,
			},
			&mut self.markers,
		)
	}

	/// Graph identity, with spaces replaced by underscores.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Last accepted input.
	pub fn data(&self) -> &GraphData {
		&self.data
	}

	/// Effective configuration.
	pub fn config(&self) -> &GraphConfig {
		&self.config
	}

	/// Node records keyed by id.
	pub fn nodes(&self) -> &IndexMap<String, Node> {
		&self.nodes
	}

	/// Node record by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.get(id)
	}

	/// Link records.
	pub fn links(&self) -> &[Link] {
		&self.links
	}

	/// Visibility matrix.
	pub fn matrix(&self) -> &LinksMatrix {
		&self.matrix
	}

	/// Current pan/zoom.
	pub fn transform(&self) -> Transform {
		self.transform
	}

	/// Id of the highlighted node, empty when none.
	pub fn highlighted_node(&self) -> &str {
		&self.highlighted_node
	}

	/// Hovered link, if highlighted.
	pub fn highlighted_link(&self) -> Option<&HighlightedLink> {
		self.highlighted_link.as_ref()
	}

	/// Whether ticks currently move nodes.
	pub fn is_simulation_running(&self) -> bool {
		self.simulation.is_running()
	}

	/// The simulation itself.
	pub fn simulation(&self) -> &ForceSimulation {
		&self.simulation
	}

	/// Whether node `id` currently accepts drags.
	pub fn is_drag_bound(&self, id: &str) -> bool {
		self.drag_bindings.contains(id)
	}

	/// Whether a drag is in progress.
	pub fn is_dragging(&self) -> bool {
		self.drag.active
	}

	/// Whether a focus animation is running.
	pub fn is_focus_animating(&self) -> bool {
		self.focus_animation
	}

	/// Whether a node click is waiting for disambiguation.
	pub fn has_pending_click(&self) -> bool {
		self.clicks.is_pending()
	}
}
