use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::flow::snapshot::{EdgeCurve, NodeSprite, ParticleSprite, Tooltip};
use crate::flow::{FrameSnapshot, RenderAdapter};

const BACKGROUND: &str = "#1a1a2e";
const ARROW_SIZE: f64 = 10.0;
const LINE_HEIGHT: f64 = 1.1;
const DASH: f64 = 8.0;
const GAP: f64 = 4.0;
const DASH_SPEED: f64 = 30.0;

pub struct CanvasRenderer {
	ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
	pub fn new(ctx: CanvasRenderingContext2d) -> Self {
		Self { ctx }
	}
}

impl RenderAdapter for CanvasRenderer {
	fn render(&mut self, frame: &FrameSnapshot) {
		let ctx = &self.ctx;
		ctx.set_fill_style_str(BACKGROUND);
		ctx.fill_rect(0.0, 0.0, frame.width, frame.height);
		draw_edges(ctx, &frame.edges, frame.animating, frame.flow_time);
		draw_particles(ctx, &frame.particles);
		draw_nodes(ctx, &frame.nodes);
		if let Some(round) = frame.announcement {
			draw_announcement(ctx, frame.width, round);
		}
		if let Some(ref tooltip) = frame.tooltip {
			draw_tooltip(ctx, tooltip);
		}
	}
}

fn draw_edges(ctx: &CanvasRenderingContext2d, edges: &[EdgeCurve], animating: bool, flow_time: f64) {
	// Dashed while idle: plain relationship lines rather than live flows.
	let dash = if animating {
		js_sys::Array::new()
	} else {
		js_sys::Array::of2(&JsValue::from_f64(DASH), &JsValue::from_f64(GAP))
	};
	let _ = ctx.set_line_dash(&dash);
	ctx.set_line_dash_offset(-(flow_time * DASH_SPEED) % (DASH + GAP));

	for curve in edges {
		let path = &curve.path;
		let alpha = if animating { 0.8 } else { 0.6 };
		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {alpha})"));
		ctx.set_line_width(1.5 + 0.5 * f64::from(curve.rate.min(10)));
		ctx.begin_path();
		ctx.move_to(path.start.x, path.start.y);
		ctx.quadratic_curve_to(path.control.x, path.control.y, path.end.x, path.end.y);
		ctx.stroke();

		let tangent = path.tangent_at(1.0);
		let length = tangent.length();
		if length < 0.001 {
			continue;
		}
		let (ux, uy) = (tangent.x / length, tangent.y / length);
		let (tip_x, tip_y) = (path.end.x, path.end.y);
		let (back_x, back_y) = (tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);
		let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
		ctx.set_fill_style_str(&format!("rgba(100, 180, 255, {alpha})"));
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_line_dash_offset(0.0);
}

fn draw_particles(ctx: &CanvasRenderingContext2d, particles: &[ParticleSprite]) {
	ctx.set_fill_style_str("#e0f0ff");
	for particle in particles {
		ctx.set_global_alpha(particle.opacity);
		ctx.begin_path();
		let _ = ctx.arc(
			particle.position.x,
			particle.position.y,
			particle.size,
			0.0,
			2.0 * PI,
		);
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(ctx: &CanvasRenderingContext2d, nodes: &[NodeSprite]) {
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for node in nodes {
		let (x, y, r) = (node.position.x, node.position.y, node.radius);
		let (alpha, stroke) = if node.hovered { (1.0, 3.0) } else { (0.8, 2.0) };

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&node.color);
		ctx.fill();
		ctx.set_global_alpha(1.0);
		ctx.set_stroke_style_str("#ffffff");
		ctx.set_line_width(stroke);
		ctx.stroke();

		draw_label(ctx, &node.label, x, y, r);
	}
}

/// One line per `\n`, centred on the node as a block.
fn draw_label(ctx: &CanvasRenderingContext2d, label: &str, x: f64, y: f64, radius: f64) {
	let size = (radius / 5.0).max(10.0);
	let lines: Vec<&str> = label.lines().collect();
	let step = size * LINE_HEIGHT;
	let top = y - step * (lines.len().saturating_sub(1) as f64) / 2.0;

	ctx.set_fill_style_str("white");
	ctx.set_font(&format!("{size}px sans-serif"));
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x, top + step * i as f64);
	}
}

fn draw_announcement(ctx: &CanvasRenderingContext2d, width: f64, round: u32) {
	ctx.set_text_align("center");
	ctx.set_text_baseline("top");
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.9)");
	ctx.set_font("bold 28px sans-serif");
	let _ = ctx.fill_text(&format!("Round {round}"), width / 2.0, 24.0);
}

fn draw_tooltip(ctx: &CanvasRenderingContext2d, tooltip: &Tooltip) {
	ctx.set_font("13px sans-serif");
	let width = ctx
		.measure_text(&tooltip.text)
		.map(|m| m.width())
		.unwrap_or(0.0);
	let (x, y) = (tooltip.at.x, tooltip.at.y);

	ctx.set_fill_style_str("rgba(0, 0, 0, 0.75)");
	ctx.fill_rect(x, y, width + 16.0, 24.0);
	ctx.set_text_align("left");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str("white");
	let _ = ctx.fill_text(&tooltip.text, x + 8.0, y + 12.0);
}
