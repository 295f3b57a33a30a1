//! The individual forces, each nudging node velocities (or, for centring,
//! positions) once per tick.

use std::f64::consts::TAU;

use super::quadtree::{Point, QuadNode};
use super::{SimLink, SimNode};

/// Squared distance below which charge stops growing.
const DISTANCE_MIN_SQ: f64 = 1.0;

/// Deterministic tiny offset for coincident nodes.
fn jiggle(seed: usize) -> f64 {
	let angle = (seed as f64 * 0.618_034 + 0.37) * TAU;
	angle.cos() * 1e-6
}

/// Springs along every link, pulling endpoints toward `distance` apart.
///
/// Strength and bias follow node degree so hubs are not yanked around by
/// their many leaves.
pub(super) fn apply_links(nodes: &mut [SimNode], links: &[SimLink], distance: f64, alpha: f64) {
	for (i, link) in links.iter().enumerate() {
		let (s, t) = (link.source, link.target);
		let source = nodes[s];
		let target = nodes[t];

		let mut x = target.x + target.vx - source.x - source.vx;
		let mut y = target.y + target.vy - source.y - source.vy;
		if x == 0.0 {
			x = jiggle(i);
		}
		if y == 0.0 {
			y = jiggle(i + 1);
		}
		let l = (x * x + y * y).sqrt();
		let scale = (l - distance) / l * alpha * link.strength;
		x *= scale;
		y *= scale;

		nodes[t].vx -= x * link.bias;
		nodes[t].vy -= y * link.bias;
		nodes[s].vx += x * (1.0 - link.bias);
		nodes[s].vy += y * (1.0 - link.bias);
	}
}

/// Many-body charge. Negative `strength` repels.
pub(super) fn apply_charge(nodes: &mut [SimNode], strength: f64, theta: f64, alpha: f64) {
	let points: Vec<Point> = nodes.iter().map(|n| Point::new(n.x, n.y)).collect();
	let Some(tree) = QuadNode::build(&points) else {
		return;
	};
	let theta_sq = theta * theta;

	for (i, node) in nodes.iter_mut().enumerate() {
		let (dvx, dvy) = charge_on(&tree, i, &points, strength, theta_sq, alpha);
		node.vx += dvx;
		node.vy += dvy;
	}
}

fn charge_on(
	cell: &QuadNode,
	index: usize,
	points: &[Point],
	strength: f64,
	theta_sq: f64,
	alpha: f64,
) -> (f64, f64) {
	let p = points[index];
	let pull = |dx: f64, dy: f64, weight: f64| {
		let mut l = dx * dx + dy * dy;
		if l < DISTANCE_MIN_SQ {
			l = (DISTANCE_MIN_SQ * l).sqrt().max(f64::EPSILON);
		}
		(dx * weight * alpha / l, dy * weight * alpha / l)
	};

	if cell.is_leaf() {
		let (mut vx, mut vy) = (0.0, 0.0);
		for &other in &cell.indices {
			if other == index {
				continue;
			}
			let mut dx = points[other].x - p.x;
			let mut dy = points[other].y - p.y;
			if dx == 0.0 {
				dx = jiggle(index + other);
			}
			if dy == 0.0 {
				dy = jiggle(index * 3 + other);
			}
			let (ax, ay) = pull(dx, dy, strength);
			vx += ax;
			vy += ay;
		}
		return (vx, vy);
	}

	let dx = cell.centroid.x - p.x;
	let dy = cell.centroid.y - p.y;
	let w = cell.bounds.width();
	let far = w * w / theta_sq < dx * dx + dy * dy;
	if far {
		return pull(dx, dy, strength * cell.count as f64);
	}

	cell.children
		.iter()
		.flatten()
		.map(|child| charge_on(child, index, points, strength, theta_sq, alpha))
		.fold((0.0, 0.0), |acc, v| (acc.0 + v.0, acc.1 + v.1))
}

/// Translate the whole layout so its mean sits on `center`.
pub(super) fn apply_center(nodes: &mut [SimNode], center: Point) {
	if nodes.is_empty() {
		return;
	}
	let n = nodes.len() as f64;
	let (sx, sy) = nodes
		.iter()
		.fold((0.0, 0.0), |acc, node| (acc.0 + node.x, acc.1 + node.y));
	let (shift_x, shift_y) = (sx / n - center.x, sy / n - center.y);
	for node in nodes {
		node.x -= shift_x;
		node.y -= shift_y;
	}
}

/// Push apart nodes whose circles of `radius` overlap, using positions
/// predicted one step ahead.
pub(super) fn apply_collision(nodes: &mut [SimNode], radius: f64, strength: f64) {
	let predicted: Vec<Point> = nodes
		.iter()
		.map(|n| Point::new(n.x + n.vx, n.y + n.vy))
		.collect();
	let Some(tree) = QuadNode::build(&predicted) else {
		return;
	};
	let reach = radius * 2.0;

	for i in 0..nodes.len() {
		let mut neighbours = Vec::new();
		tree.for_each_near(predicted[i], reach, &mut |j| {
			if j > i {
				neighbours.push(j);
			}
		});

		for j in neighbours {
			let mut x = predicted[i].x - predicted[j].x;
			let mut y = predicted[i].y - predicted[j].y;
			let mut l = x * x + y * y;
			if l >= reach * reach {
				continue;
			}
			if x == 0.0 {
				x = jiggle(i + j);
				l += x * x;
			}
			if y == 0.0 {
				y = jiggle(i * 7 + j);
				l += y * y;
			}
			let l = l.sqrt();
			let push = (reach - l) / l * strength;
			// Equal radii split the correction evenly.
			let (px, py) = (x * push * 0.5, y * push * 0.5);
			nodes[i].vx += px;
			nodes[i].vy += py;
			nodes[j].vx -= px;
			nodes[j].vy -= py;
		}
	}
}

/// Weak spring toward the vertical and horizontal centre lines.
pub(super) fn apply_axis_springs(nodes: &mut [SimNode], center: Point, strength: f64, alpha: f64) {
	for node in nodes {
		node.vx += (center.x - node.x) * strength * alpha;
		node.vy += (center.y - node.y) * strength * alpha;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(x: f64, y: f64) -> SimNode {
		SimNode {
			x,
			y,
			..SimNode::default()
		}
	}

	#[test]
	fn stretched_link_pulls_endpoints_together() {
		let mut nodes = vec![node(0.0, 0.0), node(300.0, 0.0)];
		let links = [SimLink {
			source: 0,
			target: 1,
			strength: 1.0,
			bias: 0.5,
		}];
		apply_links(&mut nodes, &links, 140.0, 1.0);
		assert!(nodes[0].vx > 0.0);
		assert!(nodes[1].vx < 0.0);
		assert!((nodes[0].vx + nodes[1].vx).abs() < 1e-9);
	}

	#[test]
	fn compressed_link_pushes_endpoints_apart() {
		let mut nodes = vec![node(0.0, 0.0), node(10.0, 0.0)];
		let links = [SimLink {
			source: 0,
			target: 1,
			strength: 1.0,
			bias: 0.5,
		}];
		apply_links(&mut nodes, &links, 140.0, 1.0);
		assert!(nodes[0].vx < 0.0);
		assert!(nodes[1].vx > 0.0);
	}

	#[test]
	fn negative_charge_repels() {
		let mut nodes = vec![node(-10.0, 0.0), node(10.0, 0.0)];
		apply_charge(&mut nodes, -500.0, 0.9, 1.0);
		assert!(nodes[0].vx < 0.0);
		assert!(nodes[1].vx > 0.0);
	}

	#[test]
	fn charge_approximation_matches_direction_for_far_clusters() {
		let mut nodes: Vec<SimNode> = (0..20).map(|i| node(1000.0 + i as f64, 0.0)).collect();
		nodes.push(node(0.0, 0.0));
		apply_charge(&mut nodes, -500.0, 0.9, 1.0);
		let lone = nodes.last().unwrap();
		assert!(lone.vx < 0.0, "lone node should be pushed away from the cluster");
	}

	#[test]
	fn centering_moves_mean_onto_center() {
		let mut nodes = vec![node(0.0, 0.0), node(10.0, 20.0)];
		apply_center(&mut nodes, Point::new(100.0, 100.0));
		let mean_x = (nodes[0].x + nodes[1].x) / 2.0;
		let mean_y = (nodes[0].y + nodes[1].y) / 2.0;
		assert!((mean_x - 100.0).abs() < 1e-9);
		assert!((mean_y - 100.0).abs() < 1e-9);
		assert_eq!(nodes[1].x - nodes[0].x, 10.0);
	}

	#[test]
	fn overlapping_nodes_are_separated() {
		let mut nodes = vec![node(0.0, 0.0), node(5.0, 0.0)];
		apply_collision(&mut nodes, 52.5, 1.0);
		assert!(nodes[0].vx < 0.0);
		assert!(nodes[1].vx > 0.0);
	}

	#[test]
	fn distant_nodes_do_not_collide() {
		let mut nodes = vec![node(0.0, 0.0), node(500.0, 0.0)];
		apply_collision(&mut nodes, 52.5, 1.0);
		assert_eq!(nodes[0].vx, 0.0);
		assert_eq!(nodes[1].vx, 0.0);
	}

	#[test]
	fn axis_springs_pull_toward_center() {
		let mut nodes = vec![node(0.0, 200.0)];
		apply_axis_springs(&mut nodes, Point::new(100.0, 100.0), 0.05, 1.0);
		assert!((nodes[0].vx - 5.0).abs() < 1e-9);
		assert!((nodes[0].vy + 5.0).abs() < 1e-9);
	}
}
