//! Force simulation driver.
//!
//! A velocity-Verlet integrator in the style of d3-force: every tick pulls
//! each body toward the viewport center, repels every pair of bodies, and
//! (unless disabled) pulls linked bodies toward a rest length. A cooling
//! parameter `alpha` scales all forces and decays toward `alpha_target`; the
//! simulation stops once it falls below `ALPHA_MIN`.
//!
//! Bodies are indexed in node-map order and links reference bodies by index,
//! so the driver never aliases the engine's node records. The engine reads
//! the body list back after each tick.

use indexmap::IndexMap;
use log::debug;

use super::config::GraphConfig;
use super::types::{Link, Node};

/// Alpha below which a cooling simulation stops.
pub const ALPHA_MIN: f64 = 0.001;
/// Strength of the x/y centering forces.
pub const CENTER_STRENGTH: f64 = 0.06;
const VELOCITY_DECAY: f64 = 0.4;
const DISTANCE_MIN2: f64 = 1.0;

/// Physical state of one node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Body {
	/// Position along x.
	pub x: f64,
	/// Position along y.
	pub y: f64,
	/// Velocity along x.
	pub vx: f64,
	/// Velocity along y.
	pub vy: f64,
	/// Pinned x position.
	pub fx: Option<f64>,
	/// Pinned y position.
	pub fy: Option<f64>,
}

impl From<&Node> for Body {
	fn from(node: &Node) -> Self {
		Self {
			x: node.x,
			y: node.y,
			vx: node.vx,
			vy: node.vy,
			fx: node.fx,
			fy: node.fy,
		}
	}
}

#[derive(Clone, Debug)]
struct Spring {
	source: usize,
	target: usize,
	bias: f64,
}

/// Deterministic generator used to separate coincident bodies.
#[derive(Clone, Debug)]
struct Lcg(u64);

impl Lcg {
	fn next(&mut self) -> f64 {
		self.0 = (1_664_525 * self.0 + 1_013_904_223) % 4_294_967_296;
		self.0 as f64 / 4_294_967_296.0
	}

	fn jiggle(&mut self) -> f64 {
		(self.next() - 0.5) * 1e-6
	}
}

/// Iterative force layout over a set of bodies.
#[derive(Clone, Debug)]
pub struct ForceSimulation {
	bodies: Vec<Body>,
	springs: Vec<Spring>,
	center: (f64, f64),
	gravity: f64,
	link_length: f64,
	link_strength: f64,
	link_force: bool,
	frozen: bool,
	alpha: f64,
	alpha_target: f64,
	alpha_decay: f64,
	running: bool,
	random: Lcg,
}

impl ForceSimulation {
	/// New, stopped simulation tuned from `config`.
	pub fn new(config: &GraphConfig) -> Self {
		let mut simulation = Self {
			bodies: Vec::new(),
			springs: Vec::new(),
			center: (0.0, 0.0),
			gravity: 0.0,
			link_length: 0.0,
			link_strength: 0.0,
			link_force: true,
			frozen: false,
			alpha: 1.0,
			alpha_target: 0.0,
			alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
			running: false,
			random: Lcg(1),
		};
		simulation.configure(config);
		simulation
	}

	/// Re-read force parameters. Used when physics tuning changes without a
	/// structural rebuild.
	pub fn configure(&mut self, config: &GraphConfig) {
		self.center = (config.width / 2.0, config.height / 2.0);
		self.gravity = config.d3.gravity;
		self.link_length = config.d3.link_length;
		self.link_strength = config.d3.link_strength;
		self.link_force = !config.d3.disable_link_force;
		self.frozen = config.static_graph;
		if self.frozen {
			self.running = false;
		}
	}

	/// Replace all bodies with the given nodes (in map order) and bind the
	/// visible links to them.
	pub fn bind(&mut self, nodes: &IndexMap<String, Node>, links: &[Link]) {
		self.bodies = nodes.values().map(Body::from).collect();
		self.bind_links(nodes, links);
	}

	/// Rebind springs only. Hidden links and links with unknown ends are
	/// skipped.
	pub fn bind_links(&mut self, nodes: &IndexMap<String, Node>, links: &[Link]) {
		let mut springs: Vec<Spring> = links
			.iter()
			.filter(|l| !l.is_hidden)
			.filter_map(|l| {
				let source = nodes.get_index_of(l.source.as_str())?;
				let target = nodes.get_index_of(l.target.as_str())?;
				(source != target).then_some(Spring {
					source,
					target,
					bias: 0.0,
				})
			})
			.collect();

		let mut count = vec![0usize; self.bodies.len()];
		for spring in &springs {
			count[spring.source] += 1;
			count[spring.target] += 1;
		}
		for spring in &mut springs {
			let (s, t) = (count[spring.source] as f64, count[spring.target] as f64);
			spring.bias = s / (s + t);
		}
		self.springs = springs;
	}

	/// Current bodies, in node-map order.
	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	/// Number of bound springs.
	pub fn spring_count(&self) -> usize {
		self.springs.len()
	}

	/// Current cooling parameter.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Set the cooling parameter directly.
	pub fn set_alpha(&mut self, alpha: f64) {
		self.alpha = alpha.clamp(0.0, 1.0);
	}

	/// Alpha the simulation settles toward.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	/// Whether ticks currently advance the layout.
	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Reactivate a stopped or cooled-down simulation. Static graphs stay put.
	pub fn restart(&mut self) {
		if self.frozen {
			return;
		}
		if self.alpha < ALPHA_MIN {
			self.alpha = self.alpha_target.max(ALPHA_MIN);
		}
		debug!("linkgraph: simulation restart (alpha {:.3})", self.alpha);
		self.running = true;
	}

	/// Stop ticking. Positions and velocities are kept.
	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Pin body `index` at `(x, y)`.
	pub fn pin(&mut self, index: usize, x: f64, y: f64) {
		if let Some(body) = self.bodies.get_mut(index) {
			body.x = x;
			body.y = y;
			body.fx = Some(x);
			body.fy = Some(y);
		}
	}

	/// Overwrite the position (and pins) of body `index` from a node record.
	pub fn sync_body(&mut self, index: usize, node: &Node) {
		if let Some(body) = self.bodies.get_mut(index) {
			*body = Body::from(node);
		}
	}

	/// Advance one iteration if running. Returns whether anything moved.
	pub fn tick(&mut self) -> bool {
		if !self.running || self.frozen {
			return false;
		}
		self.step();
		if self.alpha < ALPHA_MIN {
			debug!("linkgraph: simulation cooled down");
			self.running = false;
		}
		true
	}

	/// One iteration regardless of the running flag.
	pub fn step(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		let alpha = self.alpha;

		if self.link_force {
			self.apply_springs(alpha);
		}
		self.apply_many_body(alpha);
		self.apply_centering(alpha);

		let decay = 1.0 - VELOCITY_DECAY;
		for body in &mut self.bodies {
			match body.fx {
				Some(fx) => {
					body.x = fx;
					body.vx = 0.0;
				}
				None => {
					body.vx *= decay;
					body.x += body.vx;
				}
			}
			match body.fy {
				Some(fy) => {
					body.y = fy;
					body.vy = 0.0;
				}
				None => {
					body.vy *= decay;
					body.y += body.vy;
				}
			}
		}
	}

	fn apply_springs(&mut self, alpha: f64) {
		for spring in &self.springs {
			let (s, t) = (&self.bodies[spring.source], &self.bodies[spring.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.random.jiggle();
			}
			if y == 0.0 {
				y = self.random.jiggle();
			}
			let distance = (x * x + y * y).sqrt();
			let l = (distance - self.link_length) / distance * alpha * self.link_strength;
			let (x, y) = (x * l, y * l);

			let target = &mut self.bodies[spring.target];
			target.vx -= x * spring.bias;
			target.vy -= y * spring.bias;
			let source = &mut self.bodies[spring.source];
			source.vx += x * (1.0 - spring.bias);
			source.vy += y * (1.0 - spring.bias);
		}
	}

	fn apply_many_body(&mut self, alpha: f64) {
		let count = self.bodies.len();
		for i in 0..count {
			let (xi, yi) = (self.bodies[i].x, self.bodies[i].y);
			let (mut dvx, mut dvy) = (0.0, 0.0);
			for j in 0..count {
				if i == j {
					continue;
				}
				let mut x = self.bodies[j].x - xi;
				let mut y = self.bodies[j].y - yi;
				let mut l = x * x + y * y;
				if x == 0.0 {
					x = self.random.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.random.jiggle();
					l += y * y;
				}
				if l < DISTANCE_MIN2 {
					l = (DISTANCE_MIN2 * l).sqrt();
				}
				let w = self.gravity * alpha / l;
				dvx += x * w;
				dvy += y * w;
			}
			self.bodies[i].vx += dvx;
			self.bodies[i].vy += dvy;
		}
	}

	fn apply_centering(&mut self, alpha: f64) {
		let (cx, cy) = self.center;
		for body in &mut self.bodies {
			body.vx += (cx - body.x) * CENTER_STRENGTH * alpha;
			body.vy += (cy - body.y) * CENTER_STRENGTH * alpha;
		}
	}
}
