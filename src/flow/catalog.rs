//! The static node catalog.

use std::collections::HashSet;

use log::info;
use serde::Deserialize;

use super::error::{FlowError, FlowResult};
use super::geometry::Point;
use super::node::Node;

const BUILTIN: &str = include_str!("catalog.json");

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NodeSpec {
	/// Unique id.
	pub id: String,
	/// Display text; `\n` separates lines.
	pub label: String,
	/// CSS fill colour.
	pub color: String,
	/// Radius with no flow applied.
	pub base_radius: f64,
	/// Position relative to the canvas centre.
	#[serde(default)]
	pub offset: Point,
}

/// The nodes a session starts with, in drawing order.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Catalog {
	/// Entries, bottom first.
	pub nodes: Vec<NodeSpec>,
}

impl Catalog {
	/// The organisational units shipped with the app.
	pub fn builtin() -> FlowResult<Self> {
		Self::from_json(BUILTIN)
	}

	/// Parses and validates a catalog: ids must be unique, radii positive.
	pub fn from_json(text: &str) -> FlowResult<Self> {
		let catalog: Catalog = serde_json::from_str(text)?;
		catalog.validate()?;
		info!("loaded catalog with {} nodes", catalog.nodes.len());
		Ok(catalog)
	}

	fn validate(&self) -> FlowResult<()> {
		let mut seen = HashSet::new();
		for spec in &self.nodes {
			if !seen.insert(spec.id.as_str()) {
				return Err(FlowError::InvalidCatalog {
					message: format!("duplicate node id {}", spec.id),
				});
			}
			if !(spec.base_radius > 0.0) {
				return Err(FlowError::InvalidCatalog {
					message: format!("node {} needs a positive radius", spec.id),
				});
			}
		}
		Ok(())
	}

	/// Ids in catalog order.
	pub fn ids(&self) -> Vec<String> {
		self.nodes.iter().map(|n| n.id.clone()).collect()
	}

	/// Creates nodes around the centre of a `width × height` canvas.
	pub fn place(&self, width: f64, height: f64) -> Vec<Node> {
		let center = Point::new(width / 2.0, height / 2.0);
		self.nodes
			.iter()
			.map(|spec| {
				Node::new(
					spec.id.clone(),
					spec.label.clone(),
					spec.color.clone(),
					spec.base_radius,
					center + spec.offset,
				)
			})
			.collect()
	}
}
