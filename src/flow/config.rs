//! Tunables for geometry, sizing, particles and the round loop.

use serde::Deserialize;

use super::error::{FlowError, FlowResult};
use super::ledger::GenerationLimits;

/// Session tunables. Every field has a default, so JSON overrides may be partial.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowConfig {
	/// Perpendicular bend of connectors, in pixels.
	pub curve_factor: f64,
	/// Radius change per unit of net flow, as a fraction of base radius.
	pub sensitivity: f64,
	/// How quickly rendered radii chase their targets (per second).
	pub radius_speed: f64,
	/// Particle radius at the start of a curve.
	pub particle_size: f64,
	/// Curve fraction per second before the rate bonus.
	pub particle_speed: f64,
	/// Extra curve fraction per second per unit of rate.
	pub rate_coefficient: f64,
	/// Random edges per batch, `[min, max)`.
	pub edge_count: [usize; 2],
	/// Random edge rates, `[min, max]`.
	pub edge_rate: [u32; 2],
	/// Random draws per requested edge before giving up on it.
	pub max_attempts: u32,
	/// Rounds per simulation run.
	pub max_rounds: u32,
	/// Delay between rounds.
	pub round_interval_ms: u32,
	/// How long a round banner stays up.
	pub announcement_ms: u32,
	/// Canvas size used until the host reports a real one.
	pub canvas_width: f64,
	/// See `canvas_width`.
	pub canvas_height: f64,
}

impl Default for FlowConfig {
	fn default() -> Self {
		Self {
			curve_factor: 30.0,
			sensitivity: 0.05,
			radius_speed: 3.0,
			particle_size: 4.0,
			particle_speed: 0.15,
			rate_coefficient: 0.05,
			edge_count: [5, 10],
			edge_rate: [1, 5],
			max_attempts: 20,
			max_rounds: 5,
			round_interval_ms: 5000,
			announcement_ms: 3000,
			canvas_width: 900.0,
			canvas_height: 600.0,
		}
	}
}

impl FlowConfig {
	/// Parses overrides; missing fields keep their defaults.
	pub fn from_json(text: &str) -> FlowResult<Self> {
		let config: FlowConfig = serde_json::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects settings the session cannot run with.
	pub fn validate(&self) -> FlowResult<()> {
		let invalid = |message: &str| Err(FlowError::Malformed(message.to_owned()));
		if self.sensitivity < 0.0 {
			return invalid("sensitivity must not be negative");
		}
		if self.edge_rate[0] == 0 || self.edge_rate[0] > self.edge_rate[1] {
			return invalid("edge_rate must be a positive, ordered pair");
		}
		if self.edge_count[0] > self.edge_count[1] {
			return invalid("edge_count must be ordered");
		}
		if self.max_rounds == 0 {
			return invalid("max_rounds must be at least one");
		}
		if self.particle_speed < 0.0 || self.rate_coefficient < 0.0 {
			return invalid("particle speeds must not be negative");
		}
		Ok(())
	}

	/// Bounds for random edge batches.
	pub fn limits(&self) -> GenerationLimits {
		GenerationLimits {
			count: self.edge_count[0]..self.edge_count[1],
			rate: self.edge_rate[0]..=self.edge_rate[1],
			max_attempts: self.max_attempts,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = FlowConfig::from_json(r#"{ "max_rounds": 3, "sensitivity": 0.1 }"#).unwrap();
		assert_eq!(config.max_rounds, 3);
		assert_eq!(config.sensitivity, 0.1);
		assert_eq!(config.round_interval_ms, 5000);
		assert_eq!(config.limits().count, 5..10);
	}

	#[test]
	fn rejects_unknown_fields_and_bad_ranges() {
		assert!(matches!(
			FlowConfig::from_json(r#"{ "rounds": 3 }"#),
			Err(FlowError::Malformed(_))
		));
		assert!(matches!(
			FlowConfig::from_json(r#"{ "edge_rate": [0, 4] }"#),
			Err(FlowError::Malformed(_))
		));
		assert!(matches!(
			FlowConfig::from_json(r#"{ "max_rounds": 0 }"#),
			Err(FlowError::Malformed(_))
		));
	}
}
