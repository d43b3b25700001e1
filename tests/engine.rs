//! End-to-end scenarios driving the headless engine the way the canvas does.

use linkgraph::components::graph::viewport::compute_focus_transform;
use linkgraph::error::LinkEnd;
use linkgraph::{GraphData, GraphError, GraphEvent, GraphState, Handlers, Transform};
use serde_json::{Value, json};

fn data(value: Value) -> GraphData {
	serde_json::from_value(value).unwrap()
}

fn star() -> GraphData {
	data(json!({
		"nodes": [
			{ "id": "A", "x": 100, "y": 100 },
			{ "id": "B", "x": 150, "y": 100 },
			{ "id": "C", "x": 100, "y": 150 }
		],
		"links": [{ "source": "A", "target": "B" }, { "source": "A", "target": "C" }]
	}))
}

fn pair() -> GraphData {
	data(json!({
		"nodes": [{ "id": "a", "x": 10, "y": 20 }, { "id": "b", "x": 50, "y": 20 }],
		"links": [{ "source": "a", "target": "b" }]
	}))
}

fn hidden_links(state: &GraphState) -> Vec<bool> {
	state.links().iter().map(|l| l.is_hidden).collect()
}

#[test]
fn clicking_the_hub_collapses_and_expands_its_leaves() {
	let mut graph =
		GraphState::new("tree", star(), &json!({ "collapsible": true }), Handlers::default())
			.unwrap();

	graph.click_node("A", 0.0);
	graph.poll(0.0);
	assert_eq!(hidden_links(&graph), [true, true]);
	assert!(!graph.matrix().is_visible("A", "B"));

	let frame = graph.snapshot();
	assert!(!frame.node("B").unwrap().visible);
	assert!(frame.link("A", "B").unwrap().hidden);
	assert!(matches!(
		graph.drain_events().as_slice(),
		[GraphEvent::ClickNode { id, .. }] if id == "A"
	));

	graph.click_node("A", 10.0);
	graph.poll(10.0);
	assert_eq!(hidden_links(&graph), [false, false]);
	assert!(graph.snapshot().node("B").unwrap().visible);
	assert!(graph.is_drag_bound("B"));
}

#[test]
fn collapse_survives_unrelated_additions() {
	let config = json!({ "collapsible": true });
	let mut graph = GraphState::new("tree", star(), &config, Handlers::default()).unwrap();
	graph.click_node("A", 0.0);
	graph.poll(0.0);

	let mut next = star();
	next.nodes.push(serde_json::from_value(json!({ "id": "D" })).unwrap());
	graph.update(next, &config, 5.0).unwrap();

	assert_eq!(hidden_links(&graph), [true, true]);
	assert!(graph.snapshot().node("D").unwrap().visible);
}

#[test]
fn toggling_directed_reveals_collapsed_links() {
	let mut graph =
		GraphState::new("tree", star(), &json!({ "collapsible": true }), Handlers::default())
			.unwrap();
	graph.click_node("A", 0.0);
	graph.poll(0.0);

	graph
		.update(star(), &json!({ "collapsible": true, "directed": true }), 5.0)
		.unwrap();
	assert_eq!(hidden_links(&graph), [false, false]);
}

#[test]
fn dangling_link_is_rejected() {
	let input = data(json!({
		"nodes": [{ "id": "A" }],
		"links": [{ "source": "A", "target": "Z" }]
	}));
	let err = GraphState::new("broken", input, &json!({}), Handlers::default()).err();
	assert!(matches!(
		err,
		Some(GraphError::InvalidLinks { ref id, end: LinkEnd::Target }) if id == "Z"
	));
}

#[test]
fn non_numeric_link_value_is_rejected() {
	let input = data(json!({
		"nodes": [{ "id": "A" }, { "id": "B" }],
		"links": [{ "source": "A", "target": "B", "value": "heavy" }]
	}));
	let err = GraphState::new("broken", input, &json!({}), Handlers::default()).err();
	assert!(matches!(err, Some(GraphError::InvalidLinkValue { .. })));
}

#[test]
fn adding_a_node_keeps_the_existing_layout() {
	let input = data(json!({ "nodes": [{ "id": "A", "x": 30, "y": 40 }], "links": [] }));
	let mut graph = GraphState::new("grow", input, &json!({}), Handlers::default()).unwrap();
	for _ in 0..20 {
		graph.tick();
	}
	let settled = graph.node("A").map(|n| (n.x, n.y)).unwrap();

	let grown = data(json!({
		"nodes": [{ "id": "A", "x": 30, "y": 40 }, { "id": "B", "x": 0, "y": 0 }],
		"links": [{ "source": "A", "target": "B" }]
	}));
	graph.update(grown, &json!({}), 0.0).unwrap();

	assert_eq!(graph.node("A").map(|n| (n.x, n.y)), Some(settled));
	assert!(graph.node("B").is_some());
	assert!(graph.is_simulation_running());
}

fn tick_until_still(graph: &mut GraphState) -> usize {
	let mut ticks = 0;
	while graph.tick() && ticks < 5_000 {
		ticks += 1;
	}
	ticks
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
	((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

#[test]
fn structural_change_reheats_a_cooled_layout() {
	let input = data(json!({
		"nodes": [{ "id": "A", "x": 400, "y": 200 }, { "id": "B", "x": 450, "y": 200 }],
		"links": [{ "source": "A", "target": "B" }]
	}));
	let mut graph = GraphState::new("reheat", input, &json!({}), Handlers::default()).unwrap();
	tick_until_still(&mut graph);
	assert!(!graph.is_simulation_running());

	assert!(graph.drag_start("B"));
	assert!(graph.drag_move("B", 40.0, 0.0));
	graph.drag_end();
	let position = |graph: &GraphState, id: &str| graph.node(id).map(|n| (n.x, n.y)).unwrap();
	let dropped = position(&graph, "B");

	let grown = data(json!({
		"nodes": [
			{ "id": "A", "x": 400, "y": 200 },
			{ "id": "B", "x": 450, "y": 200 },
			{ "id": "C", "x": 0, "y": 0 }
		],
		"links": [{ "source": "A", "target": "B" }, { "source": "C", "target": "A" }]
	}));
	graph.update(grown, &json!({}), 0.0).unwrap();
	let before = distance(position(&graph, "C"), position(&graph, "A"));

	assert!(tick_until_still(&mut graph) > 50);
	let after = distance(position(&graph, "C"), position(&graph, "A"));
	assert!(after < before / 2.0, "C stayed {after} away from A");
	assert_eq!(position(&graph, "B"), dropped);
}

#[test]
fn hover_highlight_respects_degree() {
	let chain = || {
		data(json!({
			"nodes": [{ "id": "a" }, { "id": "b" }, { "id": "c" }, { "id": "d" }],
			"links": [
				{ "source": "a", "target": "b" },
				{ "source": "b", "target": "c" },
				{ "source": "c", "target": "d" }
			]
		}))
	};
	let highlighted = |graph: &GraphState| -> Vec<String> {
		graph
			.nodes()
			.values()
			.filter(|n| n.highlighted)
			.map(|n| n.id.to_string())
			.collect()
	};

	let config = json!({ "nodeHighlightBehavior": true, "highlightOpacity": 0.2 });
	let mut graph = GraphState::new("hl", chain(), &config, Handlers::default()).unwrap();
	graph.mouse_over_node("b");
	assert_eq!(graph.highlighted_node(), "b");
	assert_eq!(highlighted(&graph), ["a", "b", "c"]);

	let frame = graph.snapshot();
	assert_eq!(frame.node("d").unwrap().opacity, 0.2);
	assert!(frame.link("a", "b").unwrap().highlighted);
	assert!(!frame.link("c", "d").unwrap().highlighted);

	graph.mouse_out_node("b");
	assert_eq!(graph.highlighted_node(), "");
	assert!(highlighted(&graph).is_empty());

	let config = json!({ "nodeHighlightBehavior": true, "highlightDegree": 0 });
	let mut graph = GraphState::new("hl", chain(), &config, Handlers::default()).unwrap();
	graph.mouse_over_node("b");
	assert_eq!(highlighted(&graph), ["b"]);
}

#[test]
fn drag_is_bounded_and_reports_the_drop() {
	let mut graph =
		GraphState::new("drag", pair(), &json!({ "bounded": true }), Handlers::default()).unwrap();

	assert!(graph.drag_start("a"));
	assert!(!graph.is_simulation_running());
	assert!(graph.drag_move("a", 5.0, 5.0));
	assert!(!graph.drag_move("a", -100.0, 0.0));

	let node = graph.node("a").unwrap();
	assert_eq!((node.x, node.y), (15.0, 25.0));
	assert_eq!((node.fx, node.fy), (Some(15.0), Some(25.0)));

	graph.drag_end();
	assert_eq!(
		graph.drain_events(),
		[GraphEvent::NodePositionChange {
			id: "a".into(),
			x: 15.0,
			y: 25.0
		}]
	);
}

#[test]
fn static_graph_refuses_moves() {
	let mut graph =
		GraphState::new("still", pair(), &json!({ "staticGraph": true }), Handlers::default())
			.unwrap();
	assert!(!graph.is_simulation_running());
	assert!(graph.drag_start("a"));
	assert!(!graph.drag_move("a", 5.0, 5.0));
	graph.drag_end();
	assert!(graph.drain_events().is_empty());
}

#[test]
fn frozen_drag_events_ignore_drag_and_zoom() {
	let mut graph = GraphState::new(
		"frozen",
		pair(),
		&json!({ "freezeAllDragEvents": true }),
		Handlers::default(),
	)
	.unwrap();
	assert!(!graph.drag_start("a"));
	graph.zoom_at(0.0, 0.0, 2.0, 0.0);
	assert_eq!(graph.transform(), Transform::IDENTITY);
}

#[test]
fn double_click_waits_for_the_window() {
	let handlers = Handlers {
		double_click_node: true,
		..Default::default()
	};
	let mut graph = GraphState::new("dbl", pair(), &json!({}), handlers).unwrap();

	graph.click_node("a", 0.0);
	graph.click_node("a", 100.0);
	assert!(matches!(
		graph.drain_events().as_slice(),
		[GraphEvent::DoubleClickNode { id, .. }] if id == "a"
	));
	graph.poll(500.0);
	assert!(graph.drain_events().is_empty());

	graph.click_node("a", 1000.0);
	graph.poll(1299.0);
	assert!(graph.drain_events().is_empty());
	graph.poll(1300.0);
	assert!(matches!(
		graph.drain_events().as_slice(),
		[GraphEvent::ClickNode { id, .. }] if id == "a"
	));
}

#[test]
fn zoom_changes_are_debounced() {
	let handlers = Handlers {
		zoom_change: true,
		..Default::default()
	};
	let mut graph = GraphState::new("zoom", pair(), &json!({}), handlers).unwrap();

	graph.zoom(Transform { x: 0.0, y: 0.0, k: 2.0 }, 0.0);
	graph.zoom(Transform { x: 0.0, y: 0.0, k: 3.0 }, 50.0);
	graph.poll(120.0);
	assert!(graph.drain_events().is_empty());
	graph.poll(150.0);
	assert_eq!(
		graph.drain_events(),
		[GraphEvent::ZoomChange {
			previous: 2.0,
			current: 3.0
		}]
	);

	// same zoom level, nothing to report
	graph.zoom(Transform { x: 10.0, y: 0.0, k: 3.0 }, 200.0);
	graph.poll(1000.0);
	assert!(graph.drain_events().is_empty());
}

#[test]
fn pan_and_zoom_mode_suppresses_zoom_notifications() {
	let handlers = Handlers {
		zoom_change: true,
		..Default::default()
	};
	let mut graph = GraphState::new("zoom", pair(), &json!({ "panAndZoom": true }), handlers).unwrap();
	graph.zoom_at(0.0, 0.0, 2.0, 0.0);
	graph.poll(1000.0);
	assert!(graph.drain_events().is_empty());

	let mut silent = GraphState::new("zoom", pair(), &json!({}), Handlers::default()).unwrap();
	silent.zoom_at(0.0, 0.0, 2.0, 0.0);
	silent.poll(1000.0);
	assert!(silent.drain_events().is_empty());
}

#[test]
fn focusing_a_node_animates_for_the_configured_duration() {
	let mut graph = GraphState::new("focus", pair(), &json!({}), Handlers::default()).unwrap();
	let mut focused = pair();
	focused.focused_node_id = Some("b".into());

	graph.update(focused, &json!({}), 1000.0).unwrap();
	let expected = compute_focus_transform(50.0, 20.0, graph.config());
	assert_eq!(graph.transform(), expected);
	assert!(graph.is_focus_animating());
	assert_eq!(graph.snapshot().focus.map(|f| f.transform), Some(expected));

	graph.poll(1749.0);
	assert!(graph.is_focus_animating());
	graph.poll(1750.0);
	assert!(!graph.is_focus_animating());
	assert!(graph.snapshot().focus.is_none());
}

#[test]
fn unknown_focus_keeps_the_view() {
	let mut graph = GraphState::new("focus", pair(), &json!({}), Handlers::default()).unwrap();
	let mut focused = pair();
	focused.focused_node_id = Some("nowhere".into());
	graph.update(focused, &json!({}), 0.0).unwrap();
	assert_eq!(graph.transform(), Transform::IDENTITY);
}

#[test]
fn teardown_cancels_pending_work() {
	let handlers = Handlers {
		double_click_node: true,
		zoom_change: true,
	};
	let mut graph = GraphState::new("gone", pair(), &json!({}), handlers).unwrap();
	graph.click_node("a", 0.0);
	graph.zoom_at(0.0, 0.0, 2.0, 0.0);

	graph.teardown();
	graph.poll(10_000.0);
	assert!(graph.drain_events().is_empty());
	assert!(!graph.has_pending_click());
	assert!(!graph.is_simulation_running());
}

#[test]
fn dropping_the_zoom_handler_cancels_its_notice() {
	let handlers = Handlers {
		zoom_change: true,
		..Default::default()
	};
	let mut graph = GraphState::new("zoom", pair(), &json!({}), handlers).unwrap();
	graph.zoom_at(0.0, 0.0, 2.0, 0.0);
	graph.set_handlers(Handlers::default());
	graph.poll(1000.0);
	assert!(graph.drain_events().is_empty());
}

#[test]
fn reset_releases_drag_pins() {
	let mut graph = GraphState::new("reset", pair(), &json!({}), Handlers::default()).unwrap();
	graph.drag_start("a");
	graph.drag_move("a", 30.0, 30.0);
	graph.drag_end();

	graph.reset_nodes_positions();
	let node = graph.node("a").unwrap();
	assert_eq!((node.x, node.y), (10.0, 20.0));
	assert_eq!((node.fx, node.fy), (None, None));
	assert!(graph.is_simulation_running());
}
