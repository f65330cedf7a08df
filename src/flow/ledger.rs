//! Directed, rated flows between named nodes.

use std::collections::HashSet;
use std::ops::{Range, RangeInclusive};

use log::debug;
use rand::Rng;

use super::error::{FlowError, FlowResult};

/// A directed flow. `rate` is always at least one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
	/// Node the flow leaves.
	pub source: String,
	/// Node the flow enters.
	pub target: String,
	/// Units per tick; drives particle count and speed.
	pub rate: u32,
}

impl Edge {
	/// The ordered pair this edge occupies.
	pub fn key(&self) -> EdgeKey {
		EdgeKey::new(&self.source, &self.target)
	}
}

/// Identity of an edge: its ordered endpoint pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
	/// Node the flow leaves.
	pub source: String,
	/// Node the flow enters.
	pub target: String,
}

impl EdgeKey {
	/// Key for `source -> target`.
	pub fn new(source: &str, target: &str) -> Self {
		Self {
			source: source.to_owned(),
			target: target.to_owned(),
		}
	}
}

/// Bounds for random edge generation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationLimits {
	/// How many edges to aim for; the end is exclusive.
	pub count: Range<usize>,
	/// Rates to sample from, both ends inclusive.
	pub rate: RangeInclusive<u32>,
	/// Random pair draws allowed per requested edge before giving up on it.
	pub max_attempts: u32,
}

/// The current set of flows, at most one per ordered pair of known nodes.
#[derive(Clone, Debug, Default)]
pub struct FlowLedger {
	known: HashSet<String>,
	edges: Vec<Edge>,
	pairs: HashSet<EdgeKey>,
}

impl FlowLedger {
	/// An empty ledger that accepts edges between `node_ids`.
	pub fn new<I, S>(node_ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			known: node_ids.into_iter().map(Into::into).collect(),
			edges: Vec::new(),
			pairs: HashSet::new(),
		}
	}

	/// Edges in insertion order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Number of edges.
	pub fn len(&self) -> usize {
		self.edges.len()
	}

	/// True when no flows exist.
	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}

	/// Whether `source -> target` already carries a flow.
	pub fn contains(&self, source: &str, target: &str) -> bool {
		self.pairs.contains(&EdgeKey::new(source, target))
	}

	/// Whether edges may touch `node_id`.
	pub fn is_known(&self, node_id: &str) -> bool {
		self.known.contains(node_id)
	}

	fn validate(&self, source: &str, target: &str, rate: u32) -> FlowResult<()> {
		if source == target {
			return Err(FlowError::SelfLoop {
				node_id: source.to_owned(),
			});
		}
		for id in [source, target] {
			if !self.is_known(id) {
				return Err(FlowError::UnknownNode {
					node_id: id.to_owned(),
				});
			}
		}
		if rate == 0 {
			return Err(FlowError::ZeroRate);
		}
		if self.contains(source, target) {
			return Err(FlowError::DuplicateEdge {
				source_id: source.to_owned(),
				target_id: target.to_owned(),
			});
		}
		Ok(())
	}

	/// Inserts `source -> target`. On error nothing changes.
	pub fn add_edge(&mut self, source: &str, target: &str, rate: u32) -> FlowResult<&Edge> {
		if let Err(err) = self.validate(source, target, rate) {
			debug!("rejected flow {source} -> {target}: {err}");
			return Err(err);
		}
		let edge = Edge {
			source: source.to_owned(),
			target: target.to_owned(),
			rate,
		};
		self.pairs.insert(edge.key());
		self.edges.push(edge);
		debug!("added flow {source} -> {target} at rate {rate}");
		Ok(&self.edges[self.edges.len() - 1])
	}

	/// Removes `source -> target`, returning it.
	pub fn remove_edge(&mut self, source: &str, target: &str) -> FlowResult<Edge> {
		let key = EdgeKey::new(source, target);
		if !self.pairs.remove(&key) {
			return Err(FlowError::UnknownEdge {
				source_id: key.source,
				target_id: key.target,
			});
		}
		let index = self
			.edges
			.iter()
			.position(|e| e.source == source && e.target == target)
			.ok_or_else(|| FlowError::UnknownEdge {
				source_id: source.to_owned(),
				target_id: target.to_owned(),
			})?;
		Ok(self.edges.remove(index))
	}

	/// Drops every edge. Calling it on an empty ledger is fine.
	pub fn remove_all_edges(&mut self) {
		self.edges.clear();
		self.pairs.clear();
	}

	/// Total rate entering `node_id`.
	pub fn inflow(&self, node_id: &str) -> i64 {
		self.edges
			.iter()
			.filter(|e| e.target == node_id)
			.map(|e| i64::from(e.rate))
			.sum()
	}

	/// Total rate leaving `node_id`.
	pub fn outflow(&self, node_id: &str) -> i64 {
		self.edges
			.iter()
			.filter(|e| e.source == node_id)
			.map(|e| i64::from(e.rate))
			.sum()
	}

	/// Incoming minus outgoing rate.
	pub fn net_flow(&self, node_id: &str) -> i64 {
		self.inflow(node_id) - self.outflow(node_id)
	}

	/// Adds randomly chosen edges among `node_ids` and returns the ones added.
	///
	/// Self-loops, existing pairs and unknown ids are never produced. When
	/// fewer pairs are free than requested, or a requested edge runs out of
	/// attempts, fewer edges come back.
	pub fn generate_random_edges<R: Rng>(
		&mut self,
		node_ids: &[String],
		limits: &GenerationLimits,
		rng: &mut R,
	) -> Vec<Edge> {
		let mut candidates: Vec<&str> = Vec::with_capacity(node_ids.len());
		for id in node_ids {
			if self.is_known(id) && !candidates.contains(&id.as_str()) {
				candidates.push(id);
			}
		}
		let n = candidates.len();
		if n < 2 {
			return Vec::new();
		}

		let free = candidates
			.iter()
			.flat_map(|s| candidates.iter().map(move |t| (*s, *t)))
			.filter(|(s, t)| s != t && !self.contains(s, t))
			.count();
		let requested = if limits.count.is_empty() {
			limits.count.start
		} else {
			rng.random_range(limits.count.clone())
		};
		let wanted = requested.min(free);

		let low = (*limits.rate.start()).max(1);
		let high = (*limits.rate.end()).max(low);

		let mut added = Vec::with_capacity(wanted);
		for _ in 0..wanted {
			let mut placed = false;
			for _ in 0..limits.max_attempts {
				let source = candidates[rng.random_range(0..n)];
				let target = candidates[rng.random_range(0..n)];
				if source == target || self.contains(source, target) {
					continue;
				}
				let rate = rng.random_range(low..=high);
				if let Ok(edge) = self.add_edge(source, target, rate) {
					added.push(edge.clone());
					placed = true;
					break;
				}
			}
			if !placed {
				debug!("gave up on a random flow after {} attempts", limits.max_attempts);
			}
		}
		debug!("generated {} of {requested} requested flows", added.len());
		added
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;

	fn ledger() -> FlowLedger {
		FlowLedger::new(["ollie", "qmail", "tests"])
	}

	fn nine_ids() -> Vec<String> {
		(0..9).map(|i| format!("n{i}")).collect()
	}

	#[test]
	fn add_edge_moves_net_flow_by_rate() {
		let mut l = ledger();
		l.add_edge("qmail", "tests", 2).unwrap();
		let (src, tgt) = (l.net_flow("ollie"), l.net_flow("tests"));

		l.add_edge("ollie", "tests", 7).unwrap();
		assert_eq!(l.net_flow("ollie"), src - 7);
		assert_eq!(l.net_flow("tests"), tgt + 7);
		assert_eq!(l.inflow("tests"), 9);
		assert_eq!(l.outflow("qmail"), 2);
	}

	#[test]
	fn self_loop_is_rejected_without_change() {
		let mut l = ledger();
		assert_eq!(
			l.add_edge("ollie", "ollie", 3),
			Err(FlowError::SelfLoop {
				node_id: "ollie".into()
			})
		);
		assert!(l.is_empty());
		// Checked before the node is looked up.
		assert!(matches!(
			l.add_edge("ghost", "ghost", 1),
			Err(FlowError::SelfLoop { .. })
		));
	}

	#[test]
	fn duplicate_pair_is_rejected() {
		let mut l = ledger();
		l.add_edge("ollie", "qmail", 1).unwrap();
		assert!(matches!(
			l.add_edge("ollie", "qmail", 5),
			Err(FlowError::DuplicateEdge { .. })
		));
		assert_eq!(l.len(), 1);
		assert_eq!(l.edges()[0].rate, 1);

		// The reverse direction is a different pair.
		l.add_edge("qmail", "ollie", 5).unwrap();
		assert_eq!(l.len(), 2);
	}

	#[test]
	fn unknown_nodes_and_zero_rates_are_rejected() {
		let mut l = ledger();
		assert_eq!(
			l.add_edge("ollie", "nobody", 1),
			Err(FlowError::UnknownNode {
				node_id: "nobody".into()
			})
		);
		assert_eq!(l.add_edge("ollie", "qmail", 0), Err(FlowError::ZeroRate));
		assert!(l.is_empty());
	}

	#[test]
	fn remove_edge_and_clear() {
		let mut l = ledger();
		l.add_edge("ollie", "qmail", 1).unwrap();
		l.add_edge("qmail", "tests", 2).unwrap();

		let removed = l.remove_edge("ollie", "qmail").unwrap();
		assert_eq!(removed.rate, 1);
		assert!(!l.contains("ollie", "qmail"));
		assert!(matches!(
			l.remove_edge("ollie", "qmail"),
			Err(FlowError::UnknownEdge { .. })
		));

		l.remove_all_edges();
		l.remove_all_edges();
		assert!(l.is_empty());
		assert_eq!(l.net_flow("tests"), 0);
		// Pair index is cleared too.
		l.add_edge("qmail", "tests", 2).unwrap();
	}

	#[test]
	fn random_edges_stay_within_requested_bounds() {
		let ids = nine_ids();
		let limits = GenerationLimits {
			count: 5..10,
			rate: 1..=5,
			max_attempts: 20,
		};
		for seed in 0..200 {
			let mut l = FlowLedger::new(ids.iter().cloned());
			let mut rng = StdRng::seed_from_u64(seed);
			let added = l.generate_random_edges(&ids, &limits, &mut rng);

			assert!((5..=9).contains(&added.len()), "seed {seed}: {}", added.len());
			assert_eq!(added.len(), l.len());
			let unique: HashSet<EdgeKey> = added.iter().map(Edge::key).collect();
			assert_eq!(unique.len(), added.len());
			for edge in &added {
				assert_ne!(edge.source, edge.target);
				assert!((1..=5).contains(&edge.rate));
			}
		}
	}

	#[test]
	fn random_edges_terminate_when_pairs_run_out() {
		let ids: Vec<String> = vec!["a".into(), "b".into()];
		let mut l = FlowLedger::new(ids.iter().cloned());
		l.add_edge("a", "b", 1).unwrap();
		let limits = GenerationLimits {
			count: 5..10,
			rate: 1..=3,
			max_attempts: 10,
		};
		let mut rng = StdRng::seed_from_u64(7);

		let added = l.generate_random_edges(&ids, &limits, &mut rng);
		assert!(added.len() <= 1);
		assert!(l.len() <= 2);

		let again = l.generate_random_edges(&ids, &limits, &mut rng);
		if l.len() == 2 {
			assert!(again.is_empty());
		}
	}

	#[test]
	fn random_edges_skip_unknown_and_tiny_inputs() {
		let mut l = FlowLedger::new(["a"]);
		let limits = GenerationLimits {
			count: 1..3,
			rate: 1..=1,
			max_attempts: 5,
		};
		let mut rng = StdRng::seed_from_u64(1);
		let ids = vec!["a".to_owned(), "ghost".to_owned()];
		assert!(l.generate_random_edges(&ids, &limits, &mut rng).is_empty());
	}
}
