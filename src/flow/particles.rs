//! Particles recycling along edge curves.

use std::collections::HashMap;

use rand::Rng;

use super::ledger::{Edge, EdgeKey};
use super::snapshot::{EdgeCurve, ParticleSprite};

const START_OPACITY: f64 = 0.7;
const END_SIZE_SCALE: f64 = 1.8;

/// A dot somewhere along an edge, `progress` in `[0, 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
	progress: f64,
	base_size: f64,
}

impl Particle {
	/// A particle at `progress`, wrapped into `[0, 1)`.
	pub fn new(progress: f64, base_size: f64) -> Self {
		Self {
			progress: progress.rem_euclid(1.0),
			base_size,
		}
	}

	/// Fraction of the curve travelled.
	pub fn progress(&self) -> f64 {
		self.progress
	}

	/// Moves forward by `step`, wrapping past the end back into `[0, 1)`.
	pub fn advance(&mut self, step: f64) {
		self.progress = (self.progress + step).rem_euclid(1.0);
	}

	/// Grows from `1.0×` to `1.8×` base size along the curve.
	pub fn size(&self) -> f64 {
		self.base_size * (1.0 + (END_SIZE_SCALE - 1.0) * self.progress)
	}

	/// Fades in from `0.7` to `1.0` along the curve.
	pub fn opacity(&self) -> f64 {
		START_OPACITY + (1.0 - START_OPACITY) * self.progress
	}
}

/// One particle collection per edge, `rate` particles each.
#[derive(Clone, Debug)]
pub struct ParticleAnimator {
	particles: HashMap<EdgeKey, Vec<Particle>>,
	base_size: f64,
	base_speed: f64,
	rate_coefficient: f64,
}

impl ParticleAnimator {
	/// An animator with no particles yet.
	pub fn new(base_size: f64, base_speed: f64, rate_coefficient: f64) -> Self {
		Self {
			particles: HashMap::new(),
			base_size,
			base_speed,
			rate_coefficient,
		}
	}

	/// Progress per second for an edge carrying `rate`.
	pub fn speed_for(&self, rate: u32) -> f64 {
		self.base_speed + f64::from(rate) * self.rate_coefficient
	}

	/// Particles riding `key`, empty when it has none.
	pub fn particles(&self, key: &EdgeKey) -> &[Particle] {
		self.particles.get(key).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Particle count over all edges.
	pub fn len(&self) -> usize {
		self.particles.values().map(Vec::len).sum()
	}

	/// True when no edge has particles.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Replaces the edge's particles with `rate` fresh ones at random offsets.
	pub fn spawn<R: Rng>(&mut self, edge: &Edge, rng: &mut R) {
		let base_size = self.base_size;
		let fresh = (0..edge.rate)
			.map(|_| Particle::new(rng.random::<f64>(), base_size))
			.collect();
		self.particles.insert(edge.key(), fresh);
	}

	/// Forgets the edge's particles.
	pub fn discard(&mut self, key: &EdgeKey) {
		self.particles.remove(key);
	}

	/// Forgets every particle.
	pub fn clear(&mut self) {
		self.particles.clear();
	}

	/// Drops every collection, then spawns one per edge.
	pub fn rebuild<R: Rng>(&mut self, edges: &[Edge], rng: &mut R) {
		self.clear();
		for edge in edges {
			self.spawn(edge, rng);
		}
	}

	/// Advances every particle on every edge by `speed × dt`.
	pub fn advance(&mut self, edges: &[Edge], dt: f64) {
		for edge in edges {
			let step = self.speed_for(edge.rate) * dt;
			if let Some(list) = self.particles.get_mut(&edge.key()) {
				for particle in list.iter_mut() {
					particle.advance(step);
				}
			}
		}
	}

	/// Resolves every particle on the given curves to a drawable sprite.
	pub fn sprites(&self, curves: &[EdgeCurve]) -> Vec<ParticleSprite> {
		let mut sprites = Vec::with_capacity(self.len());
		for curve in curves {
			let key = EdgeKey::new(&curve.source, &curve.target);
			for particle in self.particles(&key) {
				sprites.push(ParticleSprite {
					position: curve.path.point_at(particle.progress),
					size: particle.size(),
					opacity: particle.opacity(),
				});
			}
		}
		sprites
	}

	/// One complete frame: advance everything, then resolve positions.
	///
	/// Edges missing from `curves` (degenerate this frame) still advance but
	/// produce no sprites.
	pub fn tick(&mut self, edges: &[Edge], curves: &[EdgeCurve], dt: f64) -> Vec<ParticleSprite> {
		self.advance(edges, dt);
		self.sprites(curves)
	}
}
