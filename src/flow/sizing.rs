//! Radius policy driven by net flow.
//!
//! Sizing runs once per explicit event (animation start, simulation round).
//! It only moves each node's target radius; the per-frame easing never calls
//! back into this module, so radii cannot drift while particles tick.

use log::debug;

use super::ledger::FlowLedger;
use super::node::Node;

/// Smallest rendered radius as a multiple of the base radius.
pub const MIN_SCALE: f64 = 0.5;
/// Largest rendered radius as a multiple of the base radius.
pub const MAX_SCALE: f64 = 2.0;

/// `base × (1 + net_flow × sensitivity)`, clamped to `[0.5, 2.0] × base`.
pub fn resolve_radius(base_radius: f64, net_flow: i64, sensitivity: f64) -> f64 {
	let raw = base_radius * (1.0 + net_flow as f64 * sensitivity);
	raw.clamp(base_radius * MIN_SCALE, base_radius * MAX_SCALE)
}

/// Retargets every node from the ledger's current net flows.
pub fn apply_net_flow(nodes: &mut [Node], ledger: &FlowLedger, sensitivity: f64) {
	for node in nodes.iter_mut() {
		let net = ledger.net_flow(&node.id);
		let radius = resolve_radius(node.base_radius(), net, sensitivity);
		debug!("sizing {}: net flow {net}, radius {radius:.1}", node.id);
		node.set_target_radius(radius);
	}
}

/// Retargets every node to its base radius.
pub fn reset_to_base(nodes: &mut [Node]) {
	for node in nodes.iter_mut() {
		let base = node.base_radius();
		node.set_target_radius(base);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::flow::geometry::Point;

	#[test]
	fn large_inflow_is_capped_at_double() {
		assert_eq!(resolve_radius(100.0, 50, 0.1), 200.0);
	}

	#[test]
	fn large_outflow_is_floored_at_half() {
		assert_eq!(resolve_radius(100.0, -50, 0.1), 50.0);
	}

	#[test]
	fn moderate_flow_scales_linearly() {
		assert!((resolve_radius(80.0, 3, 0.05) - 92.0).abs() < 1e-9);
		assert!((resolve_radius(80.0, -2, 0.05) - 72.0).abs() < 1e-9);
		assert_eq!(resolve_radius(80.0, 0, 0.05), 80.0);
	}

	#[test]
	fn apply_uses_each_nodes_net_flow() {
		let mut nodes = vec![
			Node::new("a", "A", "#fff", 40.0, Point::new(0.0, 0.0)),
			Node::new("b", "B", "#fff", 40.0, Point::new(100.0, 0.0)),
			Node::new("c", "C", "#fff", 40.0, Point::new(0.0, 100.0)),
		];
		let mut ledger = FlowLedger::new(["a", "b", "c"]);
		ledger.add_edge("a", "b", 4).unwrap();

		apply_net_flow(&mut nodes, &ledger, 0.1);
		assert!((nodes[0].target_radius() - 24.0).abs() < 1e-9);
		assert!((nodes[1].target_radius() - 56.0).abs() < 1e-9);
		assert_eq!(nodes[2].target_radius(), 40.0);

		reset_to_base(&mut nodes);
		assert!(nodes.iter().all(|n| n.target_radius() == n.base_radius()));
	}
}
