//! Adjacency/visibility matrix.
//!
//! Maps every node id to its neighbors and the weight of the connecting link.
//! A weight of 0 means the link is logically absent (collapsed). The matrix is
//! rebuilt from the link list on every structural change and only toggled in
//! place by collapse/expand.

use indexmap::IndexMap;

use super::config::GraphConfig;
use super::types::Link;

/// In/out degree of a node, counted over nonzero matrix entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Degree {
	/// Number of visible incoming connections.
	pub in_degree: usize,
	/// Number of visible outgoing connections.
	pub out_degree: usize,
}

impl Degree {
	/// No visible connection in either direction.
	pub fn is_zero(&self) -> bool {
		self.in_degree == 0 && self.out_degree == 0
	}
}

/// Node id -> neighbor id -> weight.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinksMatrix {
	rows: IndexMap<String, IndexMap<String, f64>>,
}

impl LinksMatrix {
	/// Build the matrix from a link list.
	///
	/// Hidden links get weight 0 while `collapsible` is on. Undirected graphs
	/// mirror every entry.
	pub fn build(links: &[Link], config: &GraphConfig) -> Self {
		let mut matrix = Self::default();
		for link in links {
			let (source, target) = (link.source.as_str(), link.target.as_str());
			matrix.rows.entry(source.to_string()).or_default();
			matrix.rows.entry(target.to_string()).or_default();

			let value = if config.collapsible && link.is_hidden {
				0.0
			} else {
				link.value
			};
			matrix.set(source, target, value);
			if !config.directed {
				matrix.set(target, source, value);
			}
		}
		matrix
	}

	/// Weight of the `(source, target)` entry, if one exists.
	pub fn get(&self, source: &str, target: &str) -> Option<f64> {
		self.rows.get(source).and_then(|row| row.get(target)).copied()
	}

	/// True iff the entry exists with a nonzero weight.
	pub fn is_visible(&self, source: &str, target: &str) -> bool {
		self.get(source, target).is_some_and(|w| w != 0.0)
	}

	/// Set the `(source, target)` entry, creating rows as needed.
	pub fn set(&mut self, source: &str, target: &str, value: f64) {
		self.rows
			.entry(source.to_string())
			.or_default()
			.insert(target.to_string(), value);
	}

	/// Neighbor ids of `id` in insertion order, including hidden ones.
	pub fn neighbors(&self, id: &str) -> impl Iterator<Item = &str> {
		self.rows
			.get(id)
			.into_iter()
			.flat_map(|row| row.keys().map(String::as_str))
	}

	/// Row of `id`, if present.
	pub fn row(&self, id: &str) -> Option<&IndexMap<String, f64>> {
		self.rows.get(id)
	}

	/// Visible in/out degree of `id`.
	pub fn degree(&self, id: &str) -> Degree {
		let mut degree = Degree::default();
		for (source, row) in &self.rows {
			for (target, &weight) in row {
				if weight == 0.0 {
					continue;
				}
				if source == id {
					degree.out_degree += 1;
				}
				if target == id {
					degree.in_degree += 1;
				}
			}
		}
		degree
	}
}
