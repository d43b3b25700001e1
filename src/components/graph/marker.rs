//! Arrowhead selection for directed links.
//!
//! Markers come in three sizes picked from the current zoom relative to
//! `maxZoom`, each with a plain and a highlighted flavor.

use std::collections::HashMap;

/// Zoom-dependent marker size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerSize {
	/// Zoom below a quarter of `maxZoom`.
	Small,
	/// Zoom between a quarter and half of `maxZoom`.
	Medium,
	/// Everything above.
	Large,
}

impl MarkerSize {
	/// Size class for zoom `k`.
	pub fn for_zoom(k: f64, max_zoom: f64) -> Self {
		let (medium_from, large_from) = (max_zoom / 4.0, max_zoom / 2.0);
		if k < medium_from {
			Self::Small
		} else if k < large_from {
			Self::Medium
		} else {
			Self::Large
		}
	}
}

/// A resolved arrowhead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Marker {
	/// Size class.
	pub size: MarkerSize,
	/// Drawn in the highlight color.
	pub highlighted: bool,
}

impl Marker {
	/// Stable identifier, e.g. `marker-medium-highlighted`.
	pub fn id(&self) -> &'static str {
		match (self.size, self.highlighted) {
			(MarkerSize::Small, false) => "marker-small",
			(MarkerSize::Small, true) => "marker-small-highlighted",
			(MarkerSize::Medium, false) => "marker-medium",
			(MarkerSize::Medium, true) => "marker-medium-highlighted",
			(MarkerSize::Large, false) => "marker-large",
			(MarkerSize::Large, true) => "marker-large-highlighted",
		}
	}
}

/// Memo of marker lookups keyed by highlight, zoom and `maxZoom`.
///
/// Zoom values repeat a lot while the user holds still, so a plain map without
/// eviction is enough.
#[derive(Clone, Debug, Default)]
pub struct MarkerCache {
	entries: HashMap<(bool, u64, u64), Marker>,
}

impl MarkerCache {
	/// Marker for the given highlight state and zoom.
	pub fn get(&mut self, highlighted: bool, k: f64, max_zoom: f64) -> Marker {
		*self
			.entries
			.entry((highlighted, k.to_bits(), max_zoom.to_bits()))
			.or_insert_with(|| Marker {
				size: MarkerSize::for_zoom(k, max_zoom),
				highlighted,
			})
	}

	/// Number of memoized entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether nothing has been memoized yet.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn size_follows_zoom_thresholds() {
		assert_eq!(MarkerSize::for_zoom(1.0, 8.0), MarkerSize::Small);
		assert_eq!(MarkerSize::for_zoom(2.0, 8.0), MarkerSize::Medium);
		assert_eq!(MarkerSize::for_zoom(3.9, 8.0), MarkerSize::Medium);
		assert_eq!(MarkerSize::for_zoom(4.0, 8.0), MarkerSize::Large);
	}

	#[test]
	fn cache_reuses_entries() {
		let mut cache = MarkerCache::default();
		let first = cache.get(true, 1.0, 8.0);
		assert_eq!(first.id(), "marker-small-highlighted");
		cache.get(true, 1.0, 8.0);
		assert_eq!(cache.len(), 1);
		assert_eq!(cache.get(false, 5.0, 8.0).id(), "marker-large");
		assert_eq!(cache.len(), 2);
	}
}
