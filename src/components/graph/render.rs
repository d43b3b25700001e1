//! Canvas rendering of a [`GraphSnapshot`].
//!
//! Drawing is a pure function of the snapshot and the displayed transform.
//! The canvas is cleared, then everything is drawn in graph space, back to
//! front:
//! 1. Each visible link: its path, its arrowhead, then its label
//! 2. Each visible node: its circle, its stroke, then its label

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::snapshot::{GraphSnapshot, LinkPath, RenderLink, RenderNode};
use super::viewport::Transform;

const LABEL_FONT: &str = "sans-serif";

/// Renders the complete graph to the canvas under `view`.
pub fn render(frame: &GraphSnapshot, ctx: &CanvasRenderingContext2d, view: &Transform) {
	ctx.clear_rect(0.0, 0.0, frame.width, frame.height);

	ctx.save();
	let _ = ctx.translate(view.x, view.y);
	let _ = ctx.scale(view.k, view.k);

	for link in frame.links.iter().filter(|l| !l.hidden) {
		draw_link(ctx, link);
	}
	for node in frame.nodes.iter().filter(|n| n.visible) {
		draw_node(ctx, node);
	}

	ctx.restore();
	ctx.set_global_alpha(1.0);
}

fn draw_link(ctx: &CanvasRenderingContext2d, link: &RenderLink) {
	ctx.set_global_alpha(link.opacity);
	ctx.set_stroke_style_str(&link.color);
	ctx.set_line_width(link.stroke_width);

	ctx.begin_path();
	let (end_x, end_y, ux, uy) = match link.path {
		LinkPath::Line => {
			ctx.move_to(link.x1, link.y1);
			ctx.line_to(link.x2, link.y2);
			let (dx, dy) = (link.x2 - link.x1, link.y2 - link.y1);
			let len = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
			(link.x2, link.y2, dx / len, dy / len)
		}
		LinkPath::Arc {
			cx,
			cy,
			radius,
			start,
			end,
		} => {
			let _ = ctx.arc(cx, cy, radius, start, end);
			// clockwise tangent at the end of the arc
			(
				cx + radius * end.cos(),
				cy + radius * end.sin(),
				-end.sin(),
				end.cos(),
			)
		}
	};
	ctx.stroke();

	if link.marker.is_some() {
		draw_arrow(ctx, link, (end_x, end_y), (ux, uy));
	}

	if let Some(label) = &link.label {
		let (mx, my) = ((link.x1 + link.x2) / 2.0, (link.y1 + link.y2) / 2.0);
		ctx.set_fill_style_str(&link.color);
		ctx.set_font(&format!("{}px {}", 8.0, LABEL_FONT));
		ctx.set_text_align("center");
		let _ = ctx.fill_text(label, mx, my - 2.0);
		ctx.set_text_align("start");
	}
}

/// Arrowhead whose base sits on the path end and whose tip points along it.
fn draw_arrow(
	ctx: &CanvasRenderingContext2d,
	link: &RenderLink,
	(base_x, base_y): (f64, f64),
	(ux, uy): (f64, f64),
) {
	let (tip_x, tip_y) = (base_x + ux * link.marker_length, base_y + uy * link.marker_length);
	let (px, py) = (-uy * link.marker_breadth * 0.5, ux * link.marker_breadth * 0.5);

	ctx.set_fill_style_str(&link.color);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(base_x + px, base_y + py);
	ctx.line_to(base_x - px, base_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_node(ctx: &CanvasRenderingContext2d, node: &RenderNode) {
	ctx.set_global_alpha(node.opacity);

	ctx.begin_path();
	let _ = ctx.arc(node.x, node.y, node.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&node.color);
	ctx.fill();

	if node.stroke_color != "none" && node.stroke_width > 0.0 {
		ctx.set_stroke_style_str(&node.stroke_color);
		ctx.set_line_width(node.stroke_width);
		ctx.stroke();
	}

	if let Some(label) = &node.label {
		ctx.set_fill_style_str(&node.font_color);
		ctx.set_font(&format!(
			"{}{}px {}",
			if node.highlighted { "bold " } else { "" },
			node.font_size,
			LABEL_FONT
		));
		let dx = node.radius + node.font_size / 2.0;
		let _ = ctx.fill_text(label, node.x + dx, node.y + node.font_size / 3.0);
	}
}
