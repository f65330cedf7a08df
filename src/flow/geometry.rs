//! Connector geometry: circle-edge to circle-edge quadratic curves.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::error::{FlowError, FlowResult};

const EPSILON: f64 = 1e-9;

/// A position or offset in canvas pixels, `y` growing downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Creates a point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean length, treating the point as a vector.
	pub fn length(self) -> f64 {
		(self.x * self.x + self.y * self.y).sqrt()
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Point) -> f64 {
		(other - self).length()
	}

	/// Halfway between the two points.
	pub fn midpoint(self, other: Point) -> Point {
		Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;

	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

/// A circle at its current rendered size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
	/// Centre of the circle.
	pub center: Point,
	/// Rendered radius.
	pub radius: f64,
}

/// Control points of a quadratic connector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgePath {
	/// On the source circumference.
	pub start: Point,
	/// Bezier control point.
	pub control: Point,
	/// On the target circumference.
	pub end: Point,
}

impl EdgePath {
	/// Position along the curve at `t`.
	pub fn point_at(&self, t: f64) -> Point {
		bezier_point(self.start, self.control, self.end, t)
	}

	/// Direction of travel at `t`, not normalised.
	pub fn tangent_at(&self, t: f64) -> Point {
		(self.control - self.start) * (2.0 * (1.0 - t)) + (self.end - self.control) * (2.0 * t)
	}
}

/// Builds the connector between two circles.
///
/// Each end sits on its circle's circumference, on the line between the two
/// centres. The control point is the midpoint of those ends pushed
/// perpendicular to that line by `curve_factor` (positive bends to the left
/// of the direction of travel in screen coordinates).
pub fn edge_path(source: Circle, target: Circle, curve_factor: f64) -> FlowResult<EdgePath> {
	let delta = target.center - source.center;
	let distance = delta.length();
	if distance < EPSILON {
		return Err(FlowError::DegenerateGeometry);
	}

	let unit = delta * (1.0 / distance);
	let start = source.center + unit * source.radius;
	let end = target.center - unit * target.radius;
	let normal = Point::new(-unit.y, unit.x);
	let control = start.midpoint(end) + normal * curve_factor;

	Ok(EdgePath {
		start,
		control,
		end,
	})
}

/// Quadratic Bezier evaluation. `t` outside `[0, 1]` extrapolates.
pub fn bezier_point(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
	let u = 1.0 - t;
	p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}
