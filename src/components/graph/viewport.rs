//! Pan/zoom transforms, programmatic focus and drag bounds.

use super::config::GraphConfig;

/// Translation and scale applied to the rendering surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
	/// Horizontal translation in screen pixels.
	pub x: f64,
	/// Vertical translation in screen pixels.
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

impl Default for Transform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl Transform {
	/// No translation, unit scale.
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	/// Graph coordinates to screen coordinates.
	pub fn apply(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}

	/// Screen coordinates to graph coordinates.
	pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Scale by `factor` around the screen point `(sx, sy)`, keeping the
	/// resulting zoom inside the configured range.
	pub fn zoom_at(&self, sx: f64, sy: f64, factor: f64, config: &GraphConfig) -> Self {
		let k = config.clamp_zoom(self.k * factor);
		let ratio = k / self.k;
		Self {
			x: sx - (sx - self.x) * ratio,
			y: sy - (sy - self.y) * ratio,
			k,
		}
	}

	/// Same transform with its scale clamped into the configured range.
	pub fn clamped(&self, config: &GraphConfig) -> Self {
		Self {
			k: config.clamp_zoom(self.k),
			..*self
		}
	}

	/// Linear blend toward `other`; `t` of 0 keeps `self`, 1 yields `other`.
	pub fn lerp(&self, other: &Self, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		Self {
			x: self.x + (other.x - self.x) * t,
			y: self.y + (other.y - self.y) * t,
			k: self.k + (other.k - self.k) * t,
		}
	}
}

/// Size of the visible drawing area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Width in screen pixels.
	pub width: f64,
	/// Height in screen pixels.
	pub height: f64,
}

impl From<&GraphConfig> for Viewport {
	fn from(config: &GraphConfig) -> Self {
		Self {
			width: config.width,
			height: config.height,
		}
	}
}

/// Programmatic focus in progress: the renderer eases toward `transform` over
/// `duration` seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusAnimation {
	/// Destination transform.
	pub transform: Transform,
	/// Animation length in seconds.
	pub duration: f64,
}

/// Transform that centers the viewport on `(x, y)` at the focus zoom:
/// translate to the viewport center, scale, then translate by the negated
/// target position.
pub fn compute_focus_transform(x: f64, y: f64, config: &GraphConfig) -> Transform {
	let k = config.clamp_zoom(config.focus_zoom);
	Transform {
		x: config.width / 2.0 - k * x,
		y: config.height / 2.0 - k * y,
		k,
	}
}

/// True iff the graph-space `position` lands inside the visible rectangle
/// under `transform`.
pub fn is_within_bounds(position: (f64, f64), transform: &Transform, viewport: Viewport) -> bool {
	let inv = 1.0 / transform.k;
	let (x, y) = position;
	x > -transform.x * inv
		&& x < (viewport.width - transform.x) * inv
		&& y > -transform.y * inv
		&& y < (viewport.height - transform.y) * inv
}
