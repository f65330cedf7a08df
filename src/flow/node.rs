//! Nodes: positioned circles with a base, target and rendered radius.

use super::geometry::{Circle, Point};
use super::sizing::{MAX_SCALE, MIN_SCALE};

/// A labelled circle on the canvas.
///
/// `base_radius` is fixed at creation. `target_radius` is set by sizing events
/// and `radius` (the rendered size) eases toward it frame by frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Catalog id, unique within a session.
	pub id: String,
	/// Display text; `\n` separates lines.
	pub label: String,
	/// CSS fill colour.
	pub color: String,
	/// Centre on the canvas.
	pub position: Point,
	base_radius: f64,
	radius: f64,
	target_radius: f64,
}

impl Node {
	/// A node at its base size.
	pub fn new(
		id: impl Into<String>,
		label: impl Into<String>,
		color: impl Into<String>,
		base_radius: f64,
		position: Point,
	) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			color: color.into(),
			position,
			base_radius,
			radius: base_radius,
			target_radius: base_radius,
		}
	}

	/// Radius from the catalog.
	pub fn base_radius(&self) -> f64 {
		self.base_radius
	}

	/// Radius as currently drawn.
	pub fn radius(&self) -> f64 {
		self.radius
	}

	/// Radius the node is easing toward.
	pub fn target_radius(&self) -> f64 {
		self.target_radius
	}

	/// The node as drawn this frame.
	pub fn circle(&self) -> Circle {
		Circle {
			center: self.position,
			radius: self.radius,
		}
	}

	/// Hit test against the drawn circle.
	pub fn contains(&self, point: Point) -> bool {
		self.position.distance(point) <= self.radius
	}

	/// Sets the size the node grows or shrinks toward, kept inside the
	/// `[0.5, 2.0] × base` band. A non-finite radius is ignored.
	pub fn set_target_radius(&mut self, radius: f64) {
		if !radius.is_finite() {
			return;
		}
		self.target_radius = radius.clamp(
			self.base_radius * MIN_SCALE,
			self.base_radius * MAX_SCALE,
		);
	}

	/// Moves the rendered radius toward the target. Returns true while still moving.
	pub fn ease_radius(&mut self, speed: f64, dt: f64) -> bool {
		let gap = self.target_radius - self.radius;
		if gap.abs() < 0.01 {
			self.radius = self.target_radius;
			return false;
		}
		self.radius += gap * (speed * dt).min(1.0);
		true
	}

	/// Places the centre at `point`, keeping the whole circle inside `width × height`.
	pub fn move_within(&mut self, point: Point, width: f64, height: f64) {
		self.position = Point::new(
			clamp_axis(point.x, self.radius, width),
			clamp_axis(point.y, self.radius, height),
		);
	}
}

fn clamp_axis(value: f64, radius: f64, extent: f64) -> f64 {
	// A circle wider than the canvas is centred instead.
	if radius * 2.0 >= extent {
		return extent / 2.0;
	}
	value.clamp(radius, extent - radius)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node() -> Node {
		Node::new("qmail", "QMail", "#ff7b7b", 30.0, Point::new(100.0, 100.0))
	}

	#[test]
	fn target_radius_is_clamped_to_band() {
		let mut n = node();
		n.set_target_radius(500.0);
		assert_eq!(n.target_radius(), 60.0);
		n.set_target_radius(1.0);
		assert_eq!(n.target_radius(), 15.0);
	}

	#[test]
	fn non_finite_target_is_ignored() {
		let mut n = node();
		n.set_target_radius(45.0);
		for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
			n.set_target_radius(bad);
			assert_eq!(n.target_radius(), 45.0);
		}
	}

	#[test]
	fn easing_converges_on_target() {
		let mut n = node();
		n.set_target_radius(45.0);
		let mut frames = 0;
		while n.ease_radius(4.0, 0.016) {
			frames += 1;
			assert!(n.radius() >= 30.0 && n.radius() <= 45.0);
			assert!(frames < 1000);
		}
		assert_eq!(n.radius(), 45.0);
	}

	#[test]
	fn moves_are_clamped_to_canvas() {
		let mut n = node();
		n.move_within(Point::new(-50.0, 990.0), 800.0, 600.0);
		assert_eq!(n.position, Point::new(30.0, 570.0));
		n.move_within(Point::new(400.0, 300.0), 800.0, 600.0);
		assert_eq!(n.position, Point::new(400.0, 300.0));
	}

	#[test]
	fn oversized_circle_is_centred() {
		let mut n = node();
		n.move_within(Point::new(0.0, 0.0), 50.0, 600.0);
		assert_eq!(n.position, Point::new(25.0, 30.0));
	}
}
