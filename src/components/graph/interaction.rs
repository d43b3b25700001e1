//! Timers and pointer state for user interaction.
//!
//! The engine never reads wall time. Every operation receives `now` in
//! milliseconds and deferred work is kept as a deadline that the host fires
//! through `GraphState::poll`.

/// How long a click waits for a second one when a double-click handler exists.
pub const DOUBLE_CLICK_TTL_MS: f64 = 300.0;
/// Quiet window for zoom-change notifications.
pub const ZOOM_DEBOUNCE_MS: f64 = 100.0;

/// A single cancellable deferred value. Scheduling again supersedes the
/// pending one.
#[derive(Clone, Debug)]
pub struct Timer<T> {
	pending: Option<(T, f64)>,
}

impl<T> Default for Timer<T> {
	fn default() -> Self {
		Self { pending: None }
	}
}

impl<T> Timer<T> {
	/// Schedule `value` to fire at `deadline`.
	pub fn schedule(&mut self, value: T, deadline: f64) {
		self.pending = Some((value, deadline));
	}

	/// Take the value if its deadline has passed.
	pub fn due(&mut self, now: f64) -> Option<T> {
		match self.pending {
			Some((_, deadline)) if now >= deadline => self.pending.take().map(|(v, _)| v),
			_ => None,
		}
	}

	/// Drop the pending value, if any.
	pub fn cancel(&mut self) -> Option<T> {
		self.pending.take().map(|(v, _)| v)
	}

	/// Whether something is waiting.
	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}
}

/// What a node click turned into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
	/// Provisionally a single click; fires when the window elapses.
	Pending,
	/// Second click inside the window. The single click was cancelled.
	DoubleClick(String),
}

/// Single vs double click disambiguation for node clicks.
#[derive(Clone, Debug, Default)]
pub struct ClickDisambiguator {
	timer: Timer<String>,
}

impl ClickDisambiguator {
	/// Register a click on `id`. `ttl` is the disambiguation window.
	pub fn click(&mut self, id: &str, now: f64, ttl: f64) -> ClickOutcome {
		if self.timer.cancel().is_some() {
			return ClickOutcome::DoubleClick(id.to_string());
		}
		self.timer.schedule(id.to_string(), now + ttl);
		ClickOutcome::Pending
	}

	/// The node whose single click is now confirmed, if any.
	pub fn due(&mut self, now: f64) -> Option<String> {
		self.timer.due(now)
	}

	/// Forget any pending click.
	pub fn cancel(&mut self) {
		self.timer.cancel();
	}

	/// Whether a click is waiting to be confirmed.
	pub fn is_pending(&self) -> bool {
		self.timer.is_pending()
	}
}

/// Tracks an in-progress node drag.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	/// A drag gesture is in progress.
	pub active: bool,
	/// Node being dragged.
	pub node_id: Option<String>,
	/// Set once the node actually moved.
	pub moved: bool,
}

/// Optional host handlers whose presence changes engine behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Handlers {
	/// A double-click handler exists, so single clicks must wait.
	pub double_click_node: bool,
	/// Someone listens for zoom changes.
	pub zoom_change: bool,
}

impl Handlers {
	/// Disambiguation window implied by these handlers.
	pub fn click_ttl(&self) -> f64 {
		if self.double_click_node {
			DOUBLE_CLICK_TTL_MS
		} else {
			0.0
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn timer_fires_once_after_deadline() {
		let mut timer = Timer::default();
		timer.schedule("x", 100.0);
		assert_eq!(timer.due(99.0), None);
		assert_eq!(timer.due(100.0), Some("x"));
		assert_eq!(timer.due(500.0), None);
	}

	#[test]
	fn rescheduling_supersedes() {
		let mut timer = Timer::default();
		timer.schedule(1, 100.0);
		timer.schedule(2, 200.0);
		assert_eq!(timer.due(150.0), None);
		assert_eq!(timer.due(200.0), Some(2));
	}

	#[test]
	fn second_click_in_window_is_a_double_click() {
		let mut clicks = ClickDisambiguator::default();
		assert_eq!(clicks.click("a", 0.0, DOUBLE_CLICK_TTL_MS), ClickOutcome::Pending);
		assert_eq!(
			clicks.click("a", 120.0, DOUBLE_CLICK_TTL_MS),
			ClickOutcome::DoubleClick("a".into())
		);
		assert_eq!(clicks.due(1000.0), None);
	}

	#[test]
	fn lone_click_confirms_after_window() {
		let mut clicks = ClickDisambiguator::default();
		clicks.click("a", 0.0, DOUBLE_CLICK_TTL_MS);
		assert_eq!(clicks.due(299.0), None);
		assert_eq!(clicks.due(300.0), Some("a".into()));
		assert!(!clicks.is_pending());
	}

	#[test]
	fn ttl_depends_on_double_click_handler() {
		assert_eq!(Handlers::default().click_ttl(), 0.0);
		let handlers = Handlers {
			double_click_node: true,
			..Default::default()
		};
		assert_eq!(handlers.click_ttl(), DOUBLE_CLICK_TTL_MS);
	}
}
