//! Plain per-frame records handed to a [`RenderAdapter`].

use super::geometry::{EdgePath, Point};
use super::simulation::SimulationState;

/// A node as drawn this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSprite {
	/// Catalog id.
	pub id: String,
	/// Display text, possibly multi-line.
	pub label: String,
	/// CSS fill colour.
	pub color: String,
	/// Centre.
	pub position: Point,
	/// Rendered radius.
	pub radius: f64,
	/// Under the pointer.
	pub hovered: bool,
}

/// An edge together with its curve for this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeCurve {
	/// Node the flow leaves.
	pub source: String,
	/// Node the flow enters.
	pub target: String,
	/// Flow rate.
	pub rate: u32,
	/// Where to draw it.
	pub path: EdgePath,
}

/// A particle resolved to screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSprite {
	/// Centre.
	pub position: Point,
	/// Radius.
	pub size: f64,
	/// Alpha in `[0.7, 1.0]`.
	pub opacity: f64,
}

/// Name of the hovered node, shown next to the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	/// Single-line node name.
	pub text: String,
	/// Top-left corner of the box.
	pub at: Point,
}

/// Everything needed to draw one frame, consistent for a single tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameSnapshot {
	/// Canvas width.
	pub width: f64,
	/// Canvas height.
	pub height: f64,
	/// Nodes, bottom first.
	pub nodes: Vec<NodeSprite>,
	/// Edges that have a curve this frame.
	pub edges: Vec<EdgeCurve>,
	/// Empty unless animating.
	pub particles: Vec<ParticleSprite>,
	/// Whether particles are ticking.
	pub animating: bool,
	/// Round loop state.
	pub simulation: SimulationState,
	/// Round number to announce, while its banner is live.
	pub announcement: Option<u32>,
	/// Hover label, if the pointer rests on a node.
	pub tooltip: Option<Tooltip>,
	/// Seconds of frames stepped so far; drives the idle dash crawl.
	pub flow_time: f64,
}

/// Draws snapshots. The core never reaches past this trait.
pub trait RenderAdapter {
	/// Draws one frame.
	fn render(&mut self, frame: &FrameSnapshot);
}
