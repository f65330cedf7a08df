use crate::flow::SimulationState;

/// What the control panel shows, refreshed by the canvas when it changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowStatus {
	pub animating: bool,
	pub simulation: SimulationState,
	pub max_rounds: u32,
	pub announcement: Option<u32>,
	pub edge_count: usize,
	/// Why the last action was rejected, if it was.
	pub message: Option<String>,
}

impl FlowStatus {
	pub fn summary(&self) -> String {
		let flows = match self.edge_count {
			1 => "1 flow".to_owned(),
			n => format!("{n} flows"),
		};
		match self.simulation {
			SimulationState::Running { round } => {
				format!("Round {round} of {} · {flows}", self.max_rounds)
			}
			SimulationState::Idle => flows,
		}
	}
}
