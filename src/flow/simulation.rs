//! Round-based simulation: each round replaces the edges with a random batch,
//! resizes the nodes and arms the timer for the next round.

use log::{debug, info};

use super::scheduler::{Scheduler, TimerHandle, TimerTask};
use super::world::FlowWorld;

/// Where the round loop is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SimulationState {
	/// No run in progress.
	#[default]
	Idle,
	/// A run is in progress.
	Running {
		/// Current round, from one up to the configured maximum.
		round: u32,
	},
}

impl SimulationState {
	/// True while a run is in progress.
	pub fn is_running(self) -> bool {
		matches!(self, SimulationState::Running { .. })
	}
}

/// Something observers may want to surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationEvent {
	/// A round replaced the edges.
	RoundStarted {
		/// The round that began.
		round: u32,
		/// How many random flows it generated.
		edges: usize,
	},
	/// The last round elapsed.
	Finished {
		/// Rounds completed.
		rounds: u32,
	},
	/// The run was stopped early.
	Stopped {
		/// Round in progress when stopped.
		round: u32,
	},
}

#[derive(Clone, Copy, Debug)]
struct Announcement {
	round: u32,
	timer: TimerHandle,
}

/// Drives `Idle -> Running(1..=max) -> Idle`, owning the round timer and the
/// banner timer.
#[derive(Debug)]
pub struct SimulationController {
	state: SimulationState,
	max_rounds: u32,
	round_interval_ms: u32,
	announcement_ms: u32,
	round_timer: Option<TimerHandle>,
	announcement: Option<Announcement>,
}

impl SimulationController {
	/// An idle controller.
	pub fn new(max_rounds: u32, round_interval_ms: u32, announcement_ms: u32) -> Self {
		Self {
			state: SimulationState::Idle,
			max_rounds,
			round_interval_ms,
			announcement_ms,
			round_timer: None,
			announcement: None,
		}
	}

	/// Current state.
	pub fn state(&self) -> SimulationState {
		self.state
	}

	/// Rounds per run.
	pub fn max_rounds(&self) -> u32 {
		self.max_rounds
	}

	/// Round whose banner is still showing.
	pub fn announcement(&self) -> Option<u32> {
		self.announcement.map(|a| a.round)
	}

	/// Idle to running at round one. Returns `None` if already running.
	pub fn start(
		&mut self,
		world: &mut FlowWorld,
		scheduler: &mut dyn Scheduler,
	) -> Option<SimulationEvent> {
		if self.state.is_running() {
			debug!("simulation already running");
			return None;
		}
		info!("simulation started ({} rounds)", self.max_rounds);
		self.state = SimulationState::Running { round: 0 };
		self.advance_round(world, scheduler)
	}

	/// Starts the next round, or ends the run after the last one.
	///
	/// A new round clears the edges and their particles, generates a random
	/// batch, sizes the nodes from it and arms both timers. When idle this
	/// only makes sure no round timer is left armed.
	pub fn advance_round(
		&mut self,
		world: &mut FlowWorld,
		scheduler: &mut dyn Scheduler,
	) -> Option<SimulationEvent> {
		let SimulationState::Running { round } = self.state else {
			self.cancel_round_timer(scheduler);
			return None;
		};
		if round >= self.max_rounds {
			self.cancel_round_timer(scheduler);
			self.state = SimulationState::Idle;
			info!("simulation finished after {round} rounds");
			return Some(SimulationEvent::Finished { rounds: round });
		}

		let round = round + 1;
		self.state = SimulationState::Running { round };
		let edges = world.reseed_edges();

		self.cancel_round_timer(scheduler);
		self.round_timer = Some(scheduler.schedule(self.round_interval_ms, TimerTask::AdvanceRound));
		self.announce(round, scheduler);

		info!("round {round}/{}: {edges} flows", self.max_rounds);
		Some(SimulationEvent::RoundStarted { round, edges })
	}

	/// Running to idle at any point, cancelling both timers.
	pub fn stop(&mut self, scheduler: &mut dyn Scheduler) -> Option<SimulationEvent> {
		let SimulationState::Running { round } = self.state else {
			return None;
		};
		self.cancel_round_timer(scheduler);
		if let Some(announcement) = self.announcement.take() {
			scheduler.cancel(announcement.timer);
		}
		self.state = SimulationState::Idle;
		info!("simulation stopped at round {round}");
		Some(SimulationEvent::Stopped { round })
	}

	/// Dispatches a fired timer. Handles this controller no longer tracks are
	/// dropped, so nothing fires into a stopped run.
	pub fn on_timer(
		&mut self,
		handle: TimerHandle,
		task: TimerTask,
		world: &mut FlowWorld,
		scheduler: &mut dyn Scheduler,
	) -> Option<SimulationEvent> {
		match task {
			TimerTask::AdvanceRound if self.round_timer == Some(handle) => {
				self.round_timer = None;
				self.advance_round(world, scheduler)
			}
			TimerTask::ExpireAnnouncement
				if self.announcement.is_some_and(|a| a.timer == handle) =>
			{
				self.announcement = None;
				None
			}
			_ => {
				debug!("ignoring stale timer {handle:?} ({task:?})");
				None
			}
		}
	}

	fn announce(&mut self, round: u32, scheduler: &mut dyn Scheduler) {
		if let Some(previous) = self.announcement.take() {
			scheduler.cancel(previous.timer);
		}
		let timer = scheduler.schedule(self.announcement_ms, TimerTask::ExpireAnnouncement);
		self.announcement = Some(Announcement { round, timer });
	}

	fn cancel_round_timer(&mut self, scheduler: &mut dyn Scheduler) {
		if let Some(timer) = self.round_timer.take() {
			scheduler.cancel(timer);
		}
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;
	use crate::flow::catalog::Catalog;
	use crate::flow::config::FlowConfig;
	use crate::flow::scheduler::ManualScheduler;

	fn world() -> FlowWorld {
		let config = FlowConfig {
			max_rounds: 3,
			..FlowConfig::default()
		};
		let nodes = Catalog::builtin().unwrap().place(900.0, 600.0);
		FlowWorld::new(nodes, config, StdRng::seed_from_u64(42))
	}

	fn controller() -> SimulationController {
		SimulationController::new(3, 5000, 3000)
	}

	fn fire_due(
		sim: &mut SimulationController,
		world: &mut FlowWorld,
		scheduler: &mut ManualScheduler,
	) -> Vec<SimulationEvent> {
		let mut events = Vec::new();
		for (handle, task) in scheduler.take_due() {
			events.extend(sim.on_timer(handle, task, world, scheduler));
		}
		events
	}

	#[test]
	fn start_runs_first_round_and_is_idempotent() {
		let (mut w, mut s, mut sim) = (world(), ManualScheduler::new(), controller());

		let first = sim.start(&mut w, &mut s);
		assert!(matches!(first, Some(SimulationEvent::RoundStarted { round: 1, .. })));
		assert_eq!(sim.announcement(), Some(1));
		assert!(!w.ledger().is_empty());
		assert_eq!(s.pending(), 2);

		assert_eq!(sim.start(&mut w, &mut s), None);
		assert_eq!(sim.state(), SimulationState::Running { round: 1 });
		assert_eq!(s.pending(), 2);
	}

	#[test]
	fn runs_to_idle_after_max_rounds() {
		let (mut w, mut s, mut sim) = (world(), ManualScheduler::new(), controller());
		sim.start(&mut w, &mut s);

		s.advance(3000);
		assert!(fire_due(&mut sim, &mut w, &mut s).is_empty());
		assert_eq!(sim.announcement(), None);

		s.advance(2000);
		let events = fire_due(&mut sim, &mut w, &mut s);
		assert!(matches!(events[..], [SimulationEvent::RoundStarted { round: 2, .. }]));

		s.advance(5000);
		fire_due(&mut sim, &mut w, &mut s);
		assert_eq!(sim.state(), SimulationState::Running { round: 3 });

		s.advance(5000);
		let events = fire_due(&mut sim, &mut w, &mut s);
		assert!(events.contains(&SimulationEvent::Finished { rounds: 3 }));
		assert_eq!(sim.state(), SimulationState::Idle);
		assert_eq!(s.pending(), 0);

		s.advance(60_000);
		assert!(fire_due(&mut sim, &mut w, &mut s).is_empty());
	}

	#[test]
	fn each_round_replaces_edges_and_particles() {
		let (mut w, mut s, mut sim) = (world(), ManualScheduler::new(), controller());
		w.add_edge("ollie", "qmail", 3).unwrap();
		sim.start(&mut w, &mut s);

		let total: u32 = w.ledger().edges().iter().map(|e| e.rate).sum();
		assert_eq!(w.animator().len(), total as usize);
		for node in w.nodes() {
			let expected = crate::flow::sizing::resolve_radius(
				node.base_radius(),
				w.ledger().net_flow(&node.id),
				w.config().sensitivity,
			);
			assert!((node.target_radius() - expected).abs() < 1e-9);
		}
	}

	#[test]
	fn stop_cancels_timers_and_ignores_late_fires() {
		let (mut w, mut s, mut sim) = (world(), ManualScheduler::new(), controller());
		sim.start(&mut w, &mut s);
		let edges_before = w.ledger().edges().to_vec();

		assert_eq!(sim.stop(&mut s), Some(SimulationEvent::Stopped { round: 1 }));
		assert_eq!(s.pending(), 0);
		assert_eq!(sim.announcement(), None);
		assert_eq!(sim.stop(&mut s), None);

		// A handle that escaped cancellation is ignored.
		assert_eq!(
			sim.on_timer(TimerHandle(1), TimerTask::AdvanceRound, &mut w, &mut s),
			None
		);
		assert_eq!(sim.advance_round(&mut w, &mut s), None);
		assert_eq!(w.ledger().edges(), &edges_before[..]);
		assert_eq!(sim.state(), SimulationState::Idle);
	}

	#[test]
	fn restart_after_stop_begins_at_round_one() {
		let (mut w, mut s, mut sim) = (world(), ManualScheduler::new(), controller());
		sim.start(&mut w, &mut s);
		s.advance(5000);
		fire_due(&mut sim, &mut w, &mut s);
		sim.stop(&mut s);

		assert!(matches!(
			sim.start(&mut w, &mut s),
			Some(SimulationEvent::RoundStarted { round: 1, .. })
		));
	}
}
