//! Error types for the flow core.

use thiserror::Error;

/// Result type alias for flow operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors reported by ledger mutations, geometry and catalog loading.
///
/// None of these are fatal. A failed mutation leaves the previous state intact.
#[derive(Debug, Error, PartialEq)]
pub enum FlowError {
	/// An edge from a node to itself was requested.
	#[error("a flow cannot connect {node_id} to itself")]
	SelfLoop {
		/// The node on both ends.
		node_id: String,
	},

	/// The ordered pair already carries an edge.
	#[error("a flow from {source_id} to {target_id} already exists")]
	DuplicateEdge {
		/// Where the flow starts.
		source_id: String,
		/// Where the flow ends.
		target_id: String,
	},

	/// No edge joins the ordered pair.
	#[error("no flow from {source_id} to {target_id}")]
	UnknownEdge {
		/// Where the flow would start.
		source_id: String,
		/// Where the flow would end.
		target_id: String,
	},

	/// An edge endpoint (or action target) names no node.
	#[error("unknown node: {node_id}")]
	UnknownNode {
		/// The id that matched nothing.
		node_id: String,
	},

	/// A rate of zero was supplied.
	#[error("flow rate must be a positive integer")]
	ZeroRate,

	/// A size factor that is not a finite number.
	#[error("size factor must be a finite number, got {factor}")]
	InvalidScale {
		/// The rejected factor.
		factor: f64,
	},

	/// Two node centres coincide, so no direction can be derived.
	#[error("connected nodes share a centre")]
	DegenerateGeometry,

	/// The static node catalog failed validation.
	#[error("invalid catalog: {message}")]
	InvalidCatalog {
		/// What was wrong with it.
		message: String,
	},

	/// Static configuration could not be parsed.
	#[error("malformed configuration: {0}")]
	Malformed(String),
}

impl From<serde_json::Error> for FlowError {
	fn from(err: serde_json::Error) -> Self {
		FlowError::Malformed(err.to_string())
	}
}
