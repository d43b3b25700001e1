//! Interactive node-link graph.
//!
//! The crate splits into a headless engine and a thin canvas front end:
//! - [`GraphState`] normalizes input, maintains the visibility matrix, runs
//!   the force layout and turns interactions into [`GraphEvent`]s
//! - [`GraphSnapshot`] is the resolved, immutable view of one frame
//! - [`GraphCanvas`] is the Leptos component that feeds pointer input to the
//!   engine and paints each snapshot
//!
//! # Example
//!
//! ```ignore
//! use linkgraph::{GraphCanvas, GraphData, GraphLink, GraphNode};
//!
//! let data = GraphData::new(
//!     vec![GraphNode::new("a"), GraphNode::new("b")],
//!     vec![GraphLink::new("a", "b")],
//! );
//!
//! view! {
//!     <GraphCanvas
//!         id="deps"
//!         data=Signal::stored(data)
//!         config=Signal::stored(json!({ "collapsible": true }))
//!         on_click_node=|(id, _node)| log::info!("clicked {id}")
//!     />
//! }
//! ```

pub mod collapse;
mod component;
pub mod config;
mod events;
pub mod highlight;
pub mod interaction;
pub mod marker;
pub mod matrix;
pub mod normalize;
pub mod reconcile;
mod render;
pub mod simulation;
mod snapshot;
mod state;
mod types;
pub mod viewport;

pub use component::GraphCanvas;
pub use config::GraphConfig;
pub use events::GraphEvent;
pub use interaction::Handlers;
pub use snapshot::{GraphSnapshot, LinkPath, RenderLink, RenderNode};
pub use state::GraphState;
pub use types::{GraphData, GraphLink, GraphNode, Link, Node, NodeId};
pub use viewport::{FocusAnimation, Transform};
