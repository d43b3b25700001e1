//! Leptos component wrapping the graph canvas.
//!
//! The component owns one [`GraphState`], feeds it pointer and wheel events,
//! and runs a `requestAnimationFrame` loop that polls timers, ticks the
//! simulation, renders the snapshot and forwards queued events to the
//! optional callbacks. New `data`/`config` values are reconciled in place.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::config::GraphConfig;
use super::events::GraphEvent;
use super::interaction::Handlers;
use super::render;
use super::snapshot::GraphSnapshot;
use super::state::GraphState;
use super::types::{GraphData, Node};
use super::viewport::Transform;

/// Pointer travel (screen pixels) below which a press still counts as a click.
const CLICK_SLOP: f64 = 3.0;
/// Link hit distance in screen pixels.
const LINK_HIT_TOLERANCE: f64 = 4.0;
/// How fast the displayed view eases toward a focus target.
const FOCUS_EASING: f64 = 4.0;

/// What the pointer is doing between press and release.
enum Pointer {
	Idle,
	Node {
		id: String,
		start: (f64, f64),
		last: (f64, f64),
		dragging: bool,
		moved: bool,
	},
	Pan {
		start: (f64, f64),
		last: (f64, f64),
		moved: bool,
	},
}

enum Hit {
	Node(String),
	Link(String, String),
	Background,
}

/// Host callbacks, all optional.
#[derive(Clone, Copy, Default)]
struct Callbacks {
	click_graph: Option<Callback<()>>,
	click_node: Option<Callback<(String, Node)>>,
	double_click_node: Option<Callback<(String, Node)>>,
	right_click_node: Option<Callback<(String, Node)>>,
	mouse_over_node: Option<Callback<(String, Node)>>,
	mouse_out_node: Option<Callback<(String, Node)>>,
	click_link: Option<Callback<(String, String)>>,
	right_click_link: Option<Callback<(String, String)>>,
	mouse_over_link: Option<Callback<(String, String)>>,
	mouse_out_link: Option<Callback<(String, String)>>,
	node_position_change: Option<Callback<(String, f64, f64)>>,
	zoom_change: Option<Callback<(f64, f64)>>,
}

impl Callbacks {
	fn handlers(&self) -> Handlers {
		Handlers {
			double_click_node: self.double_click_node.is_some(),
			zoom_change: self.zoom_change.is_some(),
		}
	}

	fn dispatch(&self, events: Vec<GraphEvent>) {
		fn run<T: 'static>(callback: Option<Callback<T>>, args: T) {
			if let Some(callback) = callback {
				callback.run(args);
			}
		}

		for event in events {
			match event {
				GraphEvent::ClickGraph => run(self.click_graph, ()),
				GraphEvent::ClickNode { id, node } => run(self.click_node, (id, node)),
				GraphEvent::DoubleClickNode { id, node } => run(self.double_click_node, (id, node)),
				GraphEvent::RightClickNode { id, node } => run(self.right_click_node, (id, node)),
				GraphEvent::MouseOverNode { id, node } => run(self.mouse_over_node, (id, node)),
				GraphEvent::MouseOutNode { id, node } => run(self.mouse_out_node, (id, node)),
				GraphEvent::ClickLink { source, target } => run(self.click_link, (source, target)),
				GraphEvent::RightClickLink { source, target } => {
					run(self.right_click_link, (source, target))
				}
				GraphEvent::MouseOverLink { source, target } => {
					run(self.mouse_over_link, (source, target))
				}
				GraphEvent::MouseOutLink { source, target } => {
					run(self.mouse_out_link, (source, target))
				}
				GraphEvent::NodePositionChange { id, x, y } => {
					run(self.node_position_change, (id, x, y))
				}
				GraphEvent::ZoomChange { previous, current } => {
					run(self.zoom_change, (previous, current))
				}
			}
		}
	}
}

/// Bundles the engine with drawing and pointer state.
struct GraphContext {
	state: GraphState,
	ctx: CanvasRenderingContext2d,
	frame: GraphSnapshot,
	view: Transform,
	pointer: Pointer,
	hovered_node: Option<String>,
	hovered_link: Option<(String, String)>,
	last_frame: f64,
}

impl GraphContext {
	fn frame(&mut self, now: f64) {
		self.state.poll(now);
		self.state.tick();
		self.frame = self.state.snapshot();

		let dt = (now - self.last_frame).max(0.0);
		self.last_frame = now;
		self.view = match self.frame.focus {
			Some(focus) if focus.duration > 0.0 => {
				let t = 1.0 - (-FOCUS_EASING * dt / (focus.duration * 1000.0)).exp();
				self.view.lerp(&self.frame.transform, t)
			}
			_ => self.frame.transform,
		};

		render::render(&self.frame, &self.ctx, &self.view);
	}

	fn hit(&self, (sx, sy): (f64, f64)) -> Hit {
		let transform = self.state.transform();
		let (gx, gy) = transform.invert(sx, sy);
		if let Some(node) = self.frame.node_at(gx, gy) {
			return Hit::Node(node.id.clone());
		}
		match self.frame.link_at(gx, gy, LINK_HIT_TOLERANCE / transform.k) {
			Some(link) => Hit::Link(link.source.clone(), link.target.clone()),
			None => Hit::Background,
		}
	}

	fn pointer_down(&mut self, at: (f64, f64)) {
		self.pointer = match self.hit(at) {
			Hit::Node(id) => Pointer::Node {
				dragging: self.state.drag_start(&id),
				id,
				start: at,
				last: at,
				moved: false,
			},
			Hit::Link(..) | Hit::Background => Pointer::Pan {
				start: at,
				last: at,
				moved: false,
			},
		};
	}

	fn pointer_move(&mut self, at: (f64, f64)) {
		if matches!(self.pointer, Pointer::Idle) {
			self.hover(at);
			return;
		}
		let k = self.state.transform().k;
		match &mut self.pointer {
			Pointer::Node {
				id,
				start,
				last,
				dragging,
				moved,
			} => {
				*moved |= distance(*start, at) > CLICK_SLOP;
				if *dragging {
					self.state
						.drag_move(id, (at.0 - last.0) / k, (at.1 - last.1) / k);
				}
				*last = at;
			}
			Pointer::Pan { start, last, moved } => {
				*moved |= distance(*start, at) > CLICK_SLOP;
				self.state.pan_by(at.0 - last.0, at.1 - last.1);
				*last = at;
			}
			Pointer::Idle => {}
		}
	}

	fn pointer_up(&mut self, now: f64) {
		match std::mem::replace(&mut self.pointer, Pointer::Idle) {
			Pointer::Node {
				id,
				dragging,
				moved,
				..
			} => {
				if dragging {
					self.state.drag_end();
				}
				if !moved {
					self.state.click_node(&id, now);
				}
			}
			Pointer::Pan {
				start,
				moved: false,
				..
			} => match self.hit(start) {
				Hit::Link(source, target) => self.state.click_link(&source, &target),
				Hit::Node(_) | Hit::Background => self.state.click_graph(),
			},
			Pointer::Pan { .. } | Pointer::Idle => {}
		}
	}

	fn hover(&mut self, at: (f64, f64)) {
		let (node, link) = match self.hit(at) {
			Hit::Node(id) => (Some(id), None),
			Hit::Link(source, target) => (None, Some((source, target))),
			Hit::Background => (None, None),
		};
		if node != self.hovered_node {
			if let Some(old) = self.hovered_node.take() {
				self.state.mouse_out_node(&old);
			}
			if let Some(new) = &node {
				self.state.mouse_over_node(new);
			}
			self.hovered_node = node;
		}
		if link != self.hovered_link {
			if let Some((source, target)) = self.hovered_link.take() {
				self.state.mouse_out_link(&source, &target);
			}
			if let Some((source, target)) = &link {
				self.state.mouse_over_link(source, target);
			}
			self.hovered_link = link;
		}
	}

	fn leave(&mut self) {
		if let Pointer::Node { dragging: true, .. } = self.pointer {
			self.state.drag_end();
		}
		self.pointer = Pointer::Idle;
		if let Some(id) = self.hovered_node.take() {
			self.state.mouse_out_node(&id);
		}
		if let Some((source, target)) = self.hovered_link.take() {
			self.state.mouse_out_link(&source, &target);
		}
	}

	fn context_menu(&mut self, at: (f64, f64)) {
		match self.hit(at) {
			Hit::Node(id) => self.state.right_click_node(&id),
			Hit::Link(source, target) => self.state.right_click_link(&source, &target),
			Hit::Background => {}
		}
	}
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
	((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn fit_canvas(canvas: &HtmlCanvasElement, config: &GraphConfig) {
	canvas.set_width(config.width.max(0.0) as u32);
	canvas.set_height(config.height.max(0.0) as u32);
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

fn pointer_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

type SharedContext = Rc<RefCell<Option<GraphContext>>>;

/// Run `f` against the live context and hand back whatever events it queued.
fn with_context(context: &SharedContext, f: impl FnOnce(&mut GraphContext)) -> Vec<GraphEvent> {
	match context.borrow_mut().as_mut() {
		Some(c) => {
			f(c);
			c.state.drain_events()
		}
		None => Vec::new(),
	}
}

/// Renders an interactive node-link graph on a canvas element.
///
/// `data` and `config` are reactive; every change is reconciled with the
/// running layout instead of rebuilding it. `config` is a partial JSON object
/// merged over the defaults. An empty `id` renders an empty canvas and logs
/// the error.
#[component]
pub fn GraphCanvas(
	/// Graph identity.
	#[prop(into)]
	id: String,
	/// Nodes, links and the optional focused node.
	#[prop(into)]
	data: Signal<GraphData>,
	/// Partial configuration.
	#[prop(into, default = Signal::stored(json!({})))]
	config: Signal<Value>,
	/// Background click.
	#[prop(optional, into)]
	on_click_graph: Option<Callback<()>>,
	/// Confirmed single click on a node.
	#[prop(optional, into)]
	on_click_node: Option<Callback<(String, Node)>>,
	/// Double click on a node. Its presence delays single clicks.
	#[prop(optional, into)]
	on_double_click_node: Option<Callback<(String, Node)>>,
	/// Context-menu click on a node.
	#[prop(optional, into)]
	on_right_click_node: Option<Callback<(String, Node)>>,
	/// Pointer entered a node.
	#[prop(optional, into)]
	on_mouse_over_node: Option<Callback<(String, Node)>>,
	/// Pointer left a node.
	#[prop(optional, into)]
	on_mouse_out_node: Option<Callback<(String, Node)>>,
	/// Click on a link.
	#[prop(optional, into)]
	on_click_link: Option<Callback<(String, String)>>,
	/// Context-menu click on a link.
	#[prop(optional, into)]
	on_right_click_link: Option<Callback<(String, String)>>,
	/// Pointer entered a link.
	#[prop(optional, into)]
	on_mouse_over_link: Option<Callback<(String, String)>>,
	/// Pointer left a link.
	#[prop(optional, into)]
	on_mouse_out_link: Option<Callback<(String, String)>>,
	/// A dragged node was dropped at `(x, y)`.
	#[prop(optional, into)]
	on_node_position_change: Option<Callback<(String, f64, f64)>>,
	/// Zoom changed from the first value to the second (debounced).
	#[prop(optional, into)]
	on_zoom_change: Option<Callback<(f64, f64)>>,
) -> impl IntoView {
	let callbacks = Callbacks {
		click_graph: on_click_graph,
		click_node: on_click_node,
		double_click_node: on_double_click_node,
		right_click_node: on_right_click_node,
		mouse_over_node: on_mouse_over_node,
		mouse_out_node: on_mouse_out_node,
		click_link: on_click_link,
		right_click_link: on_right_click_link,
		mouse_over_link: on_mouse_over_link,
		mouse_out_link: on_mouse_out_link,
		node_position_change: on_node_position_change,
		zoom_change: on_zoom_change,
	};

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: SharedContext = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let frame_handle = Rc::new(Cell::new(0));
	let (context_init, animate_init, handle_init) =
		(context.clone(), animate.clone(), frame_handle.clone());

	Effect::new(move |_| {
		let data = data.get();
		let config = config.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let now = js_sys::Date::now();

		if let Some(c) = context_init.borrow_mut().as_mut() {
			if let Err(e) = c.state.update(data, &config, now) {
				error!("linkgraph: {}", e);
			}
			fit_canvas(&canvas, c.state.config());
			return;
		}

		let state = match GraphState::new(&id, data, &config, callbacks.handlers()) {
			Ok(state) => state,
			Err(e) => {
				error!("linkgraph: {}", e);
				return;
			}
		};
		let Some(ctx) = context_2d(&canvas) else {
			error!("linkgraph: canvas has no 2d context");
			return;
		};
		fit_canvas(&canvas, state.config());

		*context_init.borrow_mut() = Some(GraphContext {
			view: state.transform(),
			state,
			ctx,
			frame: GraphSnapshot::default(),
			pointer: Pointer::Idle,
			hovered_node: None,
			hovered_link: None,
			last_frame: now,
		});

		let (context_anim, animate_inner, handle_inner) =
			(context_init.clone(), animate_init.clone(), handle_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let now = js_sys::Date::now();
			callbacks.dispatch(with_context(&context_anim, |c| c.frame(now)));
			if let (Some(cb), Some(window)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				if let Ok(handle) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
					handle_inner.set(handle);
				}
			}
		}));
		if let (Some(cb), Some(window)) = (animate_init.borrow().as_ref(), web_sys::window()) {
			if let Ok(handle) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				handle_init.set(handle);
			}
		}
	});

	let teardown = StoredValue::new_local((context.clone(), animate.clone(), frame_handle.clone()));
	on_cleanup(move || {
		teardown.try_with_value(|(context, animate, handle)| {
			if let Some(window) = web_sys::window() {
				let _ = window.cancel_animation_frame(handle.get());
			}
			animate.borrow_mut().take();
			if let Some(c) = context.borrow_mut().as_mut() {
				c.state.teardown();
			}
		});
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some(at) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		callbacks.dispatch(with_context(&context_md, |c| c.pointer_down(at)));
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(at) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		callbacks.dispatch(with_context(&context_mm, |c| c.pointer_move(at)));
	};

	let context_mu = context.clone();
	let on_mouseup = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let now = js_sys::Date::now();
		callbacks.dispatch(with_context(&context_mu, |c| c.pointer_up(now)));
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		callbacks.dispatch(with_context(&context_ml, GraphContext::leave));
	};

	let context_cm = context.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some(at) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		callbacks.dispatch(with_context(&context_cm, |c| c.context_menu(at)));
	};

	let context_wh = context;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let now = js_sys::Date::now();
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		callbacks.dispatch(with_context(&context_wh, |c| {
			c.state.zoom_at(x, y, factor, now)
		}));
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:contextmenu=on_contextmenu
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
