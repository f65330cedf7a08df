//! Shared per-session state: nodes, edges and their particles.

use log::trace;
use rand::rngs::StdRng;

use super::config::FlowConfig;
use super::error::{FlowError, FlowResult};
use super::geometry::edge_path;
use super::ledger::{Edge, FlowLedger};
use super::node::Node;
use super::particles::ParticleAnimator;
use super::sizing;
use super::snapshot::EdgeCurve;

/// Every edge-set change goes through here so particles never outlive
/// (or miss) the edge they belong to.
pub struct FlowWorld {
	pub(crate) config: FlowConfig,
	pub(crate) nodes: Vec<Node>,
	pub(crate) ledger: FlowLedger,
	pub(crate) animator: ParticleAnimator,
	pub(crate) rng: StdRng,
	pub(crate) width: f64,
	pub(crate) height: f64,
}

impl FlowWorld {
	/// A world with no edges. Edges may only join the given nodes.
	pub fn new(nodes: Vec<Node>, config: FlowConfig, rng: StdRng) -> Self {
		let ledger = FlowLedger::new(nodes.iter().map(|n| n.id.clone()));
		let animator = ParticleAnimator::new(
			config.particle_size,
			config.particle_speed,
			config.rate_coefficient,
		);
		Self {
			width: config.canvas_width,
			height: config.canvas_height,
			config,
			nodes,
			ledger,
			animator,
			rng,
		}
	}

	/// Tunables in effect.
	pub fn config(&self) -> &FlowConfig {
		&self.config
	}

	/// Nodes in drawing order, bottom first.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Current flows.
	pub fn ledger(&self) -> &FlowLedger {
		&self.ledger
	}

	/// Particles for the current flows.
	pub fn animator(&self) -> &ParticleAnimator {
		&self.animator
	}

	/// Looks a node up by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub(crate) fn node_mut(&mut self, id: &str) -> FlowResult<&mut Node> {
		self.nodes
			.iter_mut()
			.find(|n| n.id == id)
			.ok_or_else(|| FlowError::UnknownNode {
				node_id: id.to_owned(),
			})
	}

	/// Ids in drawing order.
	pub fn node_ids(&self) -> Vec<String> {
		self.nodes.iter().map(|n| n.id.clone()).collect()
	}

	/// Adds a flow and spawns its particles.
	pub fn add_edge(&mut self, source: &str, target: &str, rate: u32) -> FlowResult<()> {
		let edge = self.ledger.add_edge(source, target, rate)?.clone();
		self.animator.spawn(&edge, &mut self.rng);
		Ok(())
	}

	/// Removes a flow and its particles.
	pub fn remove_edge(&mut self, source: &str, target: &str) -> FlowResult<Edge> {
		let edge = self.ledger.remove_edge(source, target)?;
		self.animator.discard(&edge.key());
		Ok(edge)
	}

	/// Removes every flow and particle.
	pub fn clear_edges(&mut self) {
		self.ledger.remove_all_edges();
		self.animator.clear();
	}

	/// Adds a random batch on top of the current edges.
	pub fn generate_random_edges(&mut self) -> Vec<Edge> {
		let ids = self.node_ids();
		let limits = self.config.limits();
		let added = self
			.ledger
			.generate_random_edges(&ids, &limits, &mut self.rng);
		for edge in &added {
			self.animator.spawn(edge, &mut self.rng);
		}
		added
	}

	/// One-shot sizing from the current net flows.
	pub fn size_by_flow(&mut self) {
		sizing::apply_net_flow(&mut self.nodes, &self.ledger, self.config.sensitivity);
	}

	/// Replaces every edge with a fresh random batch and resizes.
	pub fn reseed_edges(&mut self) -> usize {
		self.clear_edges();
		let added = self.generate_random_edges().len();
		self.size_by_flow();
		added
	}

	/// Moves a node to the top of the drawing order, so it also wins hit tests.
	pub(crate) fn raise_node(&mut self, id: &str) -> FlowResult<()> {
		let index = self
			.nodes
			.iter()
			.position(|n| n.id == id)
			.ok_or_else(|| FlowError::UnknownNode {
				node_id: id.to_owned(),
			})?;
		let node = self.nodes.remove(index);
		self.nodes.push(node);
		Ok(())
	}

	/// Curves for the current positions and radii. Degenerate pairs are left out.
	pub fn curves(&self) -> Vec<EdgeCurve> {
		let mut curves = Vec::with_capacity(self.ledger.len());
		for edge in self.ledger.edges() {
			let (Some(source), Some(target)) = (self.node(&edge.source), self.node(&edge.target))
			else {
				continue;
			};
			match edge_path(source.circle(), target.circle(), self.config.curve_factor) {
				Ok(path) => curves.push(EdgeCurve {
					source: edge.source.clone(),
					target: edge.target.clone(),
					rate: edge.rate,
					path,
				}),
				Err(err) => trace!("skipping {} -> {}: {err}", edge.source, edge.target),
			}
		}
		curves
	}
}
