//! linkgraph: interactive force-directed node-link graphs for the browser.
//!
//! The crate provides a headless graph engine ([`GraphState`]) with
//! collapsible leaf subtrees, neighborhood highlighting and debounced
//! interaction events, plus a WASM canvas component ([`GraphCanvas`]) that
//! drives it.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde_json::{Value, json};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod error;

pub use components::graph::{
	GraphCanvas, GraphConfig, GraphData, GraphEvent, GraphLink, GraphNode, GraphSnapshot,
	GraphState, Handlers, Node, NodeId, Transform,
};
pub use error::GraphError;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("linkgraph: logging initialized");
}

/// Text of the `<script>` element with the given id.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load graph data from a script element with id="graph-data".
/// Expected format: JSON with { nodes: [...], links: [...] }
fn load_graph_data() -> Option<GraphData> {
	let json_text = script_text("graph-data")?;
	match serde_json::from_str::<GraphData>(&json_text) {
		Ok(data) => {
			info!(
				"linkgraph: loaded {} nodes, {} links",
				data.nodes.len(),
				data.links().len()
			);
			Some(data)
		}
		Err(e) => {
			warn!("linkgraph: failed to parse graph data: {}", e);
			None
		}
	}
}

/// Load an optional partial configuration from id="graph-config".
fn load_graph_config() -> Value {
	let Some(json_text) = script_text("graph-config") else {
		return json!({});
	};
	match serde_json::from_str::<Value>(&json_text) {
		Ok(config) => config,
		Err(e) => {
			warn!("linkgraph: failed to parse graph config: {}", e);
			json!({})
		}
	}
}

/// Main application component.
/// Loads graph data and configuration from the DOM and renders the graph.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data = load_graph_data().unwrap_or_default();
	let graph_config = load_graph_config();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="linkgraph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="graph-page">
			<GraphCanvas
				id="graph"
				data=Signal::stored(graph_data)
				config=Signal::stored(graph_config)
				on_click_node=|(id, _): (String, Node)| info!("linkgraph: clicked node \"{}\"", id)
				on_node_position_change=|(id, x, y): (String, f64, f64)| {
					info!("linkgraph: node \"{}\" dropped at ({:.1}, {:.1})", id, x, y)
				}
			/>
			<div class="graph-overlay">
				<p class="subtitle">"Click a node to collapse its leaves. Drag nodes to reposition. Scroll to zoom."</p>
			</div>
		</div>
	}
}
