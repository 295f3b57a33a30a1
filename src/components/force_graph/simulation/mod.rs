//! Force Layout Engine.
//!
//! A velocity-Verlet style simulation cooled by an `alpha` schedule: every
//! tick moves `alpha` toward `alpha_target`, applies the forces scaled by
//! `alpha`, then integrates velocities with friction. The engine goes idle
//! once `alpha` drops below `alpha_min`; dragging raises `alpha_target` to
//! keep it warm.
//!
//! Forces run in a fixed order: links, charge, centring, collision, axis
//! springs.

mod forces;
mod quadtree;

use std::f64::consts::PI;

pub use quadtree::Point;

use crate::config::WidgetConfig;

/// Alpha assumed by `alpha_decay` to reach `alpha_min` in about 300 ticks.
const DEFAULT_ALPHA_MIN: f64 = 0.001;
/// Fraction of velocity lost per tick.
const DEFAULT_VELOCITY_DECAY: f64 = 0.4;
/// Seed spiral spacing for nodes without a position.
const INITIAL_RADIUS: f64 = 10.0;

/// Per-node simulation state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimNode {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned coordinates. A pinned node ignores forces.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

impl SimNode {
	/// Node with a starting position and no pin.
	pub fn at(x: f64, y: f64) -> Self {
		Self {
			x,
			y,
			..Self::default()
		}
	}

	/// Whether either coordinate is pinned.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// A resolved link with its degree-derived spring settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimLink {
	pub source: usize,
	pub target: usize,
	pub strength: f64,
	/// Share of the correction applied to the target.
	pub bias: f64,
}

/// Tunables for the composed forces.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceParams {
	/// Rest length of every link.
	pub link_distance: f64,
	/// Many-body strength; negative repels.
	pub charge_strength: f64,
	/// Barnes–Hut opening angle.
	pub theta: f64,
	/// Layout centre, usually the middle of the viewport.
	pub center: Point,
	pub collision_radius: f64,
	pub collision_strength: f64,
	/// Strength of the springs toward the centre lines.
	pub axis_strength: f64,
}

impl ForceParams {
	/// Parameters for a viewport of `width` x `height`.
	pub fn for_viewport(config: &WidgetConfig, width: f64, height: f64) -> Self {
		Self {
			link_distance: config.link_distance(),
			charge_strength: -500.0,
			theta: 0.9,
			center: Point::new(width / 2.0, height / 2.0),
			collision_radius: config.collision_radius(),
			collision_strength: 1.0,
			axis_strength: 0.05,
		}
	}
}

/// The layout solver. One per widget.
#[derive(Clone, Debug)]
pub struct Simulation {
	nodes: Vec<SimNode>,
	links: Vec<SimLink>,
	params: ForceParams,
	alpha: f64,
	alpha_min: f64,
	alpha_decay: f64,
	alpha_target: f64,
	velocity_decay: f64,
	running: bool,
}

impl Simulation {
	/// An empty, stopped simulation at full energy.
	pub fn new(params: ForceParams) -> Self {
		Self {
			nodes: Vec::new(),
			links: Vec::new(),
			params,
			alpha: 1.0,
			alpha_min: DEFAULT_ALPHA_MIN,
			alpha_decay: 1.0 - DEFAULT_ALPHA_MIN.powf(1.0 / 300.0),
			alpha_target: 0.0,
			velocity_decay: DEFAULT_VELOCITY_DECAY,
			running: false,
		}
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn node(&self, index: usize) -> Option<&SimNode> {
		self.nodes.get(index)
	}

	pub fn links(&self) -> &[SimLink] {
		&self.links
	}

	/// Replace the node set. Nodes at the origin with no explicit position
	/// are spread on a spiral around the layout centre.
	pub fn set_nodes(&mut self, nodes: Vec<SimNode>, seeded: &[bool]) {
		let center = self.params.center;
		self.nodes = nodes;
		for (i, node) in self.nodes.iter_mut().enumerate() {
			if !seeded.get(i).copied().unwrap_or(false) {
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * PI * (3.0 - 5f64.sqrt());
				node.x = center.x + radius * angle.cos();
				node.y = center.y + radius * angle.sin();
			}
			if let Some(fx) = node.fx {
				node.x = fx;
			}
			if let Some(fy) = node.fy {
				node.y = fy;
			}
		}
		// Links index into the old node set.
		self.links.clear();
	}

	/// Replace the links. Indices must be valid for the current nodes.
	pub fn set_links(&mut self, pairs: &[(usize, usize)]) {
		let mut degree = vec![0usize; self.nodes.len()];
		for &(s, t) in pairs {
			degree[s] += 1;
			degree[t] += 1;
		}
		self.links = pairs
			.iter()
			.map(|&(source, target)| {
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				SimLink {
					source,
					target,
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn set_alpha(&mut self, alpha: f64) {
		self.alpha = alpha.clamp(0.0, 1.0);
	}

	/// Alpha below which the engine stops on its own.
	pub fn alpha_min(&self) -> f64 {
		self.alpha_min
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Resume ticking. Does not touch `alpha`.
	pub fn restart(&mut self) {
		self.running = true;
	}

	/// Stop ticking. Positions and `alpha` are kept.
	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Stop, drop all nodes and links, and zero the energy.
	pub fn clear(&mut self) {
		self.running = false;
		self.nodes.clear();
		self.links.clear();
		self.alpha = 0.0;
		self.alpha_target = 0.0;
	}

	/// Pin a node at the given position.
	pub fn pin(&mut self, index: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fx = Some(x);
			node.fy = Some(y);
		}
	}

	/// Pin a node where it currently is.
	pub fn pin_in_place(&mut self, index: usize) {
		if let Some(&SimNode { x, y, .. }) = self.nodes.get(index) {
			self.pin(index, x, y);
		}
	}

	/// Let a pinned node move freely again.
	pub fn release(&mut self, index: usize) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fx = None;
			node.fy = None;
		}
	}

	/// Advance one frame if running. Returns whether anything moved; the
	/// engine stops itself once cooled below `alpha_min`.
	pub fn step(&mut self) -> bool {
		if !self.running {
			return false;
		}
		self.tick();
		if self.alpha < self.alpha_min {
			self.running = false;
		}
		true
	}

	/// One unconditional iteration.
	pub fn tick(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		let alpha = self.alpha;
		let p = &self.params;

		forces::apply_links(&mut self.nodes, &self.links, p.link_distance, alpha);
		forces::apply_charge(&mut self.nodes, p.charge_strength, p.theta, alpha);
		forces::apply_center(&mut self.nodes, p.center);
		forces::apply_collision(&mut self.nodes, p.collision_radius, p.collision_strength);
		forces::apply_axis_springs(&mut self.nodes, p.center, p.axis_strength, alpha);

		let keep = 1.0 - self.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= keep;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= keep;
					node.y += node.vy;
				}
			}
		}
	}
}
