use log::warn;

use super::types::FlowStatus;
use crate::flow::{
	Catalog, FlowConfig, FlowResult, FlowSession, FrameSnapshot, Point, Scheduler, UserAction,
};

/// A press that travels less than this is a click, not a drag.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<String>,
	/// Pointer position minus node centre at press time.
	pub grab_offset: Point,
	pub press_at: Point,
	pub moved: bool,
}

/// Everything the canvas keeps between frames.
pub struct CanvasState<S: Scheduler> {
	pub session: FlowSession<S>,
	pub drag: DragState,
	message: Option<String>,
}

impl<S: Scheduler> CanvasState<S> {
	pub fn new(width: f64, height: f64, scheduler: S) -> FlowResult<Self> {
		let config = FlowConfig {
			canvas_width: width,
			canvas_height: height,
			..FlowConfig::default()
		};
		let catalog = Catalog::builtin()?;
		Ok(Self::with_session(FlowSession::with_os_rng(
			&catalog, config, scheduler,
		)))
	}

	pub fn with_session(session: FlowSession<S>) -> Self {
		Self {
			session,
			drag: DragState::default(),
			message: None,
		}
	}

	/// Applies a control-panel action, remembering why it failed if it did.
	pub fn apply(&mut self, action: UserAction) {
		match self.session.apply(action) {
			Ok(()) => self.message = None,
			Err(err) => {
				warn!("action rejected: {err}");
				self.message = Some(err.to_string());
			}
		}
	}

	/// Picks up the node under `at` and brings it to the front.
	pub fn pointer_down(&mut self, at: Point) {
		let Some(id) = self.session.node_at(at).map(str::to_owned) else {
			return;
		};
		if let Err(err) = self.session.raise_node(&id) {
			warn!("pressed node vanished: {err}");
			return;
		}
		let center = self
			.session
			.world()
			.node(&id)
			.map(|n| n.position)
			.unwrap_or(at);
		self.drag = DragState {
			node: Some(id),
			grab_offset: at - center,
			press_at: at,
			moved: false,
		};
	}

	pub fn pointer_move(&mut self, at: Point) {
		let Some(id) = self.drag.node.clone() else {
			self.session.hover_at(Some(at));
			return;
		};
		if !self.drag.moved && at.distance(self.drag.press_at) < CLICK_SLOP {
			return;
		}
		self.drag.moved = true;
		self.session.hover_at(None);
		if let Err(err) = self.session.drag_node(&id, at - self.drag.grab_offset) {
			warn!("drag lost its node: {err}");
			self.drag = DragState::default();
		}
	}

	/// Ends a press. One that never moved toggles the node's emphasis.
	pub fn pointer_up(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		if let (Some(id), false) = (drag.node, drag.moved) {
			self.apply(UserAction::ToggleEmphasis { node: id });
		}
	}

	pub fn pointer_leave(&mut self) {
		self.drag = DragState::default();
		self.session.hover_at(None);
	}

	pub fn frame(&mut self, dt: f64) -> FrameSnapshot {
		self.session.pump_timers();
		self.session.step(dt)
	}

	pub fn status(&self) -> FlowStatus {
		let simulation = self.session.simulation();
		FlowStatus {
			animating: self.session.is_animating(),
			simulation: simulation.state(),
			max_rounds: simulation.max_rounds(),
			announcement: simulation.announcement(),
			edge_count: self.session.world().ledger().len(),
			message: self.message.clone(),
		}
	}
}
