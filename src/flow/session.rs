//! One visualisation session: the world, the round loop, the animation toggle
//! and the timers that drive them.

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::catalog::Catalog;
use super::config::FlowConfig;
use super::error::{FlowError, FlowResult};
use super::geometry::Point;
use super::node::Node;
use super::scheduler::{ManualScheduler, Scheduler};
use super::simulation::{SimulationController, SimulationEvent, SimulationState};
use super::sizing::{self, MAX_SCALE, MIN_SCALE};
use super::snapshot::{FrameSnapshot, NodeSprite, Tooltip};
use super::world::FlowWorld;

const EMPHASIS_SCALE: f64 = 1.5;
/// Tooltip box position relative to the pointer.
const TOOLTIP_OFFSET: Point = Point::new(10.0, -30.0);

/// Actions a user can take from the control panel.
#[derive(Clone, Debug, PartialEq)]
pub enum UserAction {
	/// Adds `source -> target` carrying `rate`.
	AddEdge {
		/// Node the flow leaves.
		source: String,
		/// Node the flow enters.
		target: String,
		/// Positive flow rate.
		rate: u32,
	},
	/// Removes `source -> target`.
	RemoveEdge {
		/// Node the flow leaves.
		source: String,
		/// Node the flow enters.
		target: String,
	},
	/// Removes every flow.
	ClearEdges,
	/// Adds a random batch of flows.
	GenerateRandomEdges,
	/// Starts particles and sizes the nodes once.
	StartAnimation,
	/// Freezes particles.
	StopAnimation,
	/// Starts or stops the animation.
	ToggleAnimation,
	/// Starts the round loop.
	StartSimulation,
	/// Stops the round loop and the animation.
	StopSimulation,
	/// Stops the round loop and the animation, and returns every node to its
	/// base size.
	Reset,
	/// Sets `base × factor` on one node, or all when `node` is `None`.
	ScaleNodes {
		/// Which node, or `None` for all of them.
		node: Option<String>,
		/// Multiple of the base radius, clamped to the size band.
		factor: f64,
	},
	/// Flips a node between its base size and an enlarged one.
	ToggleEmphasis {
		/// The node to flip.
		node: String,
	},
}

/// The session context every operation runs against.
pub struct FlowSession<S: Scheduler> {
	world: FlowWorld,
	simulation: SimulationController,
	scheduler: S,
	animating: bool,
	hovered: Option<String>,
	pointer: Option<Point>,
	flow_time: f64,
	events: Vec<SimulationEvent>,
}

impl<S: Scheduler> FlowSession<S> {
	/// A session with the catalog's nodes placed on the configured canvas.
	pub fn new(catalog: &Catalog, config: FlowConfig, scheduler: S, rng: StdRng) -> Self {
		let nodes = catalog.place(config.canvas_width, config.canvas_height);
		let simulation = SimulationController::new(
			config.max_rounds,
			config.round_interval_ms,
			config.announcement_ms,
		);
		info!("session created with {} nodes", nodes.len());
		Self {
			world: FlowWorld::new(nodes, config, rng),
			simulation,
			scheduler,
			animating: false,
			hovered: None,
			pointer: None,
			flow_time: 0.0,
			events: Vec::new(),
		}
	}

	/// Seeds the session from the operating system's entropy source.
	pub fn with_os_rng(catalog: &Catalog, config: FlowConfig, scheduler: S) -> Self {
		Self::new(catalog, config, scheduler, StdRng::from_os_rng())
	}

	/// Nodes, flows and particles.
	pub fn world(&self) -> &FlowWorld {
		&self.world
	}

	/// The round loop.
	pub fn simulation(&self) -> &SimulationController {
		&self.simulation
	}

	/// Timer source.
	pub fn scheduler(&self) -> &S {
		&self.scheduler
	}

	/// Timer source, mutably.
	pub fn scheduler_mut(&mut self) -> &mut S {
		&mut self.scheduler
	}

	/// Whether particles are ticking.
	pub fn is_animating(&self) -> bool {
		self.animating
	}

	/// Node under the pointer.
	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_deref()
	}

	/// Simulation events since the last call.
	pub fn take_events(&mut self) -> Vec<SimulationEvent> {
		std::mem::take(&mut self.events)
	}

	/// Runs one user action. On error the session is unchanged.
	pub fn apply(&mut self, action: UserAction) -> FlowResult<()> {
		debug!("action: {action:?}");
		match action {
			UserAction::AddEdge {
				source,
				target,
				rate,
			} => self.world.add_edge(&source, &target, rate)?,
			UserAction::RemoveEdge { source, target } => {
				self.world.remove_edge(&source, &target)?;
			}
			UserAction::ClearEdges => self.world.clear_edges(),
			UserAction::GenerateRandomEdges => {
				self.world.generate_random_edges();
			}
			UserAction::StartAnimation => self.start_animation(),
			UserAction::StopAnimation => self.stop_animation(),
			UserAction::ToggleAnimation => {
				if self.animating {
					self.stop_animation();
				} else {
					self.start_animation();
				}
			}
			UserAction::StartSimulation => self.start_simulation(),
			UserAction::StopSimulation => self.stop_simulation(),
			UserAction::Reset => self.reset(),
			UserAction::ScaleNodes { node, factor } => self.scale_nodes(node.as_deref(), factor)?,
			UserAction::ToggleEmphasis { node } => self.toggle_emphasis(&node)?,
		}
		Ok(())
	}

	/// Turns particle ticking on and sizes nodes from their net flow, once.
	pub fn start_animation(&mut self) {
		if self.animating {
			return;
		}
		self.animating = true;
		self.world.size_by_flow();
		info!("animation started");
	}

	/// Freezes particles where they are.
	pub fn stop_animation(&mut self) {
		if self.animating {
			self.animating = false;
			info!("animation stopped");
		}
	}

	/// Starts the round loop with particles running. No-op while running.
	pub fn start_simulation(&mut self) {
		let Some(event) = self
			.simulation
			.start(&mut self.world, &mut self.scheduler)
		else {
			return;
		};
		self.events.push(event);
		self.animating = true;
	}

	/// Stops the round loop and the animation, cancelling pending timers.
	pub fn stop_simulation(&mut self) {
		self.events.extend(self.simulation.stop(&mut self.scheduler));
		self.stop_animation();
	}

	/// Full stop: no round loop, no animation, every node back to base size.
	pub fn reset(&mut self) {
		self.stop_simulation();
		sizing::reset_to_base(&mut self.world.nodes);
	}

	/// Retargets one node (or all) to `base × factor`, clamped to the size band.
	pub fn scale_nodes(&mut self, node: Option<&str>, factor: f64) -> FlowResult<()> {
		if !factor.is_finite() {
			return Err(FlowError::InvalidScale { factor });
		}
		let factor = factor.clamp(MIN_SCALE, MAX_SCALE);
		let apply = |n: &mut Node| {
			let base = n.base_radius();
			n.set_target_radius(base * factor);
		};
		match node {
			Some(id) => apply(self.world.node_mut(id)?),
			None => self.world.nodes.iter_mut().for_each(apply),
		}
		Ok(())
	}

	/// Flips a node between base size and `1.5 × base`.
	pub fn toggle_emphasis(&mut self, id: &str) -> FlowResult<()> {
		let node = self.world.node_mut(id)?;
		let base = node.base_radius();
		if (node.target_radius() - base).abs() < f64::EPSILON {
			node.set_target_radius(base * EMPHASIS_SCALE);
		} else {
			node.set_target_radius(base);
		}
		Ok(())
	}

	/// Drag update: moves the node, keeping its circle on the canvas.
	pub fn drag_node(&mut self, id: &str, to: Point) -> FlowResult<()> {
		let (width, height) = (self.world.width, self.world.height);
		self.world.node_mut(id)?.move_within(to, width, height);
		Ok(())
	}

	/// Moves the canvas bounds, pulling nodes back inside.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.world.width = width;
		self.world.height = height;
		for node in &mut self.world.nodes {
			let at = node.position;
			node.move_within(at, width, height);
		}
	}

	/// Topmost node under `point`. Later nodes draw on top.
	pub fn node_at(&self, point: Point) -> Option<&str> {
		self.world
			.nodes
			.iter()
			.rev()
			.find(|n| n.contains(point))
			.map(|n| n.id.as_str())
	}

	/// Brings a node to the top of drawing and hit-testing, as when a drag
	/// picks it up.
	pub fn raise_node(&mut self, id: &str) -> FlowResult<()> {
		self.world.raise_node(id)
	}

	/// Tracks the pointer for hover. `None` clears it, as during a drag.
	pub fn hover_at(&mut self, at: Option<Point>) {
		self.hovered = at.and_then(|p| self.node_at(p)).map(str::to_owned);
		self.pointer = at.filter(|_| self.hovered.is_some());
	}

	/// Runs every timer that has fired, in order, each to completion.
	pub fn pump_timers(&mut self) {
		for (handle, task) in self.scheduler.take_due() {
			let event = self
				.simulation
				.on_timer(handle, task, &mut self.world, &mut self.scheduler);
			self.events.extend(event);
		}
	}

	/// Advances one frame and returns what to draw.
	pub fn step(&mut self, dt: f64) -> FrameSnapshot {
		self.flow_time += dt;
		let speed = self.world.config.radius_speed;
		for node in &mut self.world.nodes {
			node.ease_radius(speed, dt);
		}
		let curves = self.world.curves();
		let particles = if self.animating {
			self.world
				.animator
				.tick(self.world.ledger.edges(), &curves, dt)
		} else {
			Vec::new()
		};

		FrameSnapshot {
			width: self.world.width,
			height: self.world.height,
			nodes: self.node_sprites(),
			edges: curves,
			particles,
			animating: self.animating,
			simulation: self.simulation.state(),
			announcement: self.simulation.announcement(),
			tooltip: self.tooltip(),
			flow_time: self.flow_time,
		}
	}

	fn tooltip(&self) -> Option<Tooltip> {
		let node = self.world.node(self.hovered.as_deref()?)?;
		Some(Tooltip {
			text: node.label.lines().collect::<Vec<_>>().join(" "),
			at: self.pointer? + TOOLTIP_OFFSET,
		})
	}

	fn node_sprites(&self) -> Vec<NodeSprite> {
		self.world
			.nodes
			.iter()
			.map(|n| NodeSprite {
				id: n.id.clone(),
				label: n.label.clone(),
				color: n.color.clone(),
				position: n.position,
				radius: n.radius(),
				hovered: self.hovered.as_deref() == Some(n.id.as_str()),
			})
			.collect()
	}

	/// Shorthand for `simulation().state()`.
	pub fn simulation_state(&self) -> SimulationState {
		self.simulation.state()
	}
}

impl FlowSession<ManualScheduler> {
	/// Moves the virtual clock and runs whatever fell due.
	pub fn advance_clock(&mut self, ms: u64) {
		self.scheduler.advance(ms);
		self.pump_timers();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn session() -> FlowSession<ManualScheduler> {
		FlowSession::new(
			&Catalog::builtin().unwrap(),
			FlowConfig::default(),
			ManualScheduler::new(),
			StdRng::seed_from_u64(9),
		)
	}

	fn add(source: &str, target: &str, rate: u32) -> UserAction {
		UserAction::AddEdge {
			source: source.into(),
			target: target.into(),
			rate,
		}
	}

	#[test]
	fn rejected_actions_leave_state_intact() {
		let mut s = session();
		s.apply(add("ollie", "qmail", 2)).unwrap();
		assert!(matches!(
			s.apply(add("ollie", "qmail", 4)),
			Err(FlowError::DuplicateEdge { .. })
		));
		assert!(matches!(
			s.apply(add("qmail", "qmail", 4)),
			Err(FlowError::SelfLoop { .. })
		));
		assert_eq!(s.world().ledger().len(), 1);
		assert_eq!(s.world().animator().len(), 2);
	}

	#[test]
	fn remove_and_clear_drop_particles() {
		let mut s = session();
		s.apply(add("ollie", "qmail", 2)).unwrap();
		s.apply(add("qmail", "tests", 3)).unwrap();
		s.apply(UserAction::RemoveEdge {
			source: "ollie".into(),
			target: "qmail".into(),
		})
		.unwrap();
		assert_eq!(s.world().animator().len(), 3);

		s.apply(UserAction::ClearEdges).unwrap();
		assert!(s.world().animator().is_empty());
		assert!(s.world().ledger().is_empty());
	}

	#[test]
	fn animation_start_sizes_once_from_net_flow() {
		let mut s = session();
		s.apply(add("ollie", "qmail", 4)).unwrap();
		s.apply(UserAction::StartAnimation).unwrap();

		let qmail = s.world().node("qmail").unwrap();
		assert!((qmail.target_radius() - 36.0).abs() < 1e-9);

		// Adding flow afterwards does not resize until the next event.
		s.apply(add("tests", "qmail", 5)).unwrap();
		for _ in 0..200 {
			s.step(0.016);
		}
		let qmail = s.world().node("qmail").unwrap();
		assert!((qmail.radius() - 36.0).abs() < 1e-9);
	}

	#[test]
	fn particles_only_render_while_animating() {
		let mut s = session();
		s.apply(add("ollie", "conversational", 3)).unwrap();
		let still = s.step(0.016);
		assert_eq!(still.edges.len(), 1);
		assert!(still.particles.is_empty());

		s.apply(UserAction::ToggleAnimation).unwrap();
		let moving = s.step(0.016);
		assert_eq!(moving.particles.len(), 3);
		assert!(moving.animating);
	}

	#[test]
	fn scale_and_emphasis_respect_the_size_band() {
		let mut s = session();
		s.apply(UserAction::ScaleNodes {
			node: None,
			factor: 5.0,
		})
		.unwrap();
		assert!(s
			.world()
			.nodes()
			.iter()
			.all(|n| n.target_radius() == n.base_radius() * 2.0));

		s.apply(UserAction::Reset).unwrap();
		s.apply(UserAction::ToggleEmphasis {
			node: "ollie".into(),
		})
		.unwrap();
		assert_eq!(s.world().node("ollie").unwrap().target_radius(), 150.0);
		s.toggle_emphasis("ollie").unwrap();
		assert_eq!(s.world().node("ollie").unwrap().target_radius(), 100.0);

		assert!(matches!(
			s.scale_nodes(Some("nobody"), 1.0),
			Err(FlowError::UnknownNode { .. })
		));
	}

	#[test]
	fn hit_test_prefers_topmost_node() {
		let mut s = session();
		s.drag_node("qmail", Point::new(400.0, 300.0)).unwrap();
		s.drag_node("borrower", Point::new(440.0, 300.0)).unwrap();
		// borrower comes later in the catalog, so it is drawn above qmail.
		assert_eq!(s.node_at(Point::new(402.0, 300.0)), Some("borrower"));
		assert_eq!(s.node_at(Point::new(375.0, 300.0)), Some("qmail"));
		assert_eq!(s.node_at(Point::new(5.0, 5.0)), None);
	}

	#[test]
	fn hover_is_flagged_in_snapshot() {
		let mut s = session();
		let at = s.world().node("ollie").unwrap().position;
		s.hover_at(Some(at));
		let frame = s.step(0.016);
		let hovered: Vec<_> = frame.nodes.iter().filter(|n| n.hovered).collect();
		assert_eq!(hovered.len(), 1);
		assert_eq!(hovered[0].id, "ollie");

		let tooltip = frame.tooltip.unwrap();
		assert_eq!(tooltip.text, "Ollie/Comms Agentic Squad");
		assert_eq!(tooltip.at, at + Point::new(10.0, -30.0));

		s.hover_at(Some(Point::new(5.0, 5.0)));
		assert_eq!(s.hovered(), None);
		assert_eq!(s.step(0.016).tooltip, None);
	}

	#[test]
	fn raised_node_wins_hit_tests() {
		let mut s = session();
		s.drag_node("qmail", Point::new(400.0, 300.0)).unwrap();
		s.drag_node("borrower", Point::new(440.0, 300.0)).unwrap();
		s.raise_node("qmail").unwrap();
		assert_eq!(s.node_at(Point::new(402.0, 300.0)), Some("qmail"));
		assert_eq!(s.step(0.016).nodes.last().unwrap().id, "qmail");
		assert!(matches!(
			s.raise_node("ghost"),
			Err(FlowError::UnknownNode { .. })
		));
	}

	#[test]
	fn non_finite_scale_is_rejected() {
		let mut s = session();
		for factor in [f64::NAN, f64::INFINITY] {
			assert!(matches!(
				s.apply(UserAction::ScaleNodes { node: None, factor }),
				Err(FlowError::InvalidScale { .. })
			));
		}
		for _ in 0..10 {
			s.step(0.016);
		}
		for node in s.world().nodes() {
			assert_eq!(node.target_radius(), node.base_radius());
			assert_eq!(node.radius(), node.base_radius());
		}
	}

	#[test]
	fn flow_time_accumulates_per_step() {
		let mut s = session();
		s.step(0.5);
		assert!((s.step(0.25).flow_time - 0.75).abs() < 1e-12);
	}

	#[test]
	fn degenerate_edges_are_skipped_for_the_frame() {
		let mut s = session();
		s.apply(add("qFile", "borrower", 1)).unwrap();
		let at = s.world().node("qFile").unwrap().position;
		s.drag_node("borrower", at).unwrap();
		let frame = s.step(0.016);
		assert!(frame.edges.is_empty());
		assert_eq!(s.world().ledger().len(), 1);
	}
}
