//! Barnes–Hut quadtree over node positions.
//!
//! Built fresh every tick. Internal cells carry the count and centroid of the
//! points below them, which is all the uniform-strength charge force needs.

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// A 2D point in layout space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Axis-aligned square cell.
#[derive(Clone, Copy, Debug)]
pub(super) struct Bounds {
	pub(super) center: Point,
	pub(super) half_extent: f64,
}

impl Bounds {
	fn enclosing(points: &[Point]) -> Option<Self> {
		let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
		let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for p in points {
			min_x = min_x.min(p.x);
			min_y = min_y.min(p.y);
			max_x = max_x.max(p.x);
			max_y = max_y.max(p.y);
		}
		if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
			return None;
		}

		let span = (max_x - min_x).max(max_y - min_y).max(1.0);
		Some(Self {
			center: Point::new((min_x + max_x) * 0.5, (min_y + max_y) * 0.5),
			half_extent: span * 0.5 + 1.0,
		})
	}

	pub(super) fn width(self) -> f64 {
		self.half_extent * 2.0
	}

	fn child(self, quadrant: usize) -> Self {
		let quarter = self.half_extent * 0.5;
		let (ox, oy) = match quadrant {
			0 => (-quarter, -quarter),
			1 => (quarter, -quarter),
			2 => (-quarter, quarter),
			_ => (quarter, quarter),
		};
		Self {
			center: Point::new(self.center.x + ox, self.center.y + oy),
			half_extent: quarter,
		}
	}

	fn quadrant_for(self, p: Point) -> usize {
		match (p.x >= self.center.x, p.y >= self.center.y) {
			(false, false) => 0,
			(true, false) => 1,
			(false, true) => 2,
			(true, true) => 3,
		}
	}

	/// Squared distance from `p` to the nearest point of the cell.
	fn distance_sq_to(self, p: Point) -> f64 {
		let dx = ((p.x - self.center.x).abs() - self.half_extent).max(0.0);
		let dy = ((p.y - self.center.y).abs() - self.half_extent).max(0.0);
		dx * dx + dy * dy
	}
}

pub(super) struct QuadNode {
	pub(super) bounds: Bounds,
	pub(super) centroid: Point,
	/// Number of points in this subtree.
	pub(super) count: usize,
	/// Point indices; only populated on leaves.
	pub(super) indices: Vec<usize>,
	pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
	pub(super) fn build(points: &[Point]) -> Option<Self> {
		let bounds = Bounds::enclosing(points)?;
		Some(Self::build_node(bounds, (0..points.len()).collect(), points, 0))
	}

	fn build_node(bounds: Bounds, indices: Vec<usize>, points: &[Point], depth: usize) -> Self {
		let count = indices.len();
		let mut centroid = Point::default();
		for &i in &indices {
			centroid.x += points[i].x;
			centroid.y += points[i].y;
		}
		if count > 0 {
			centroid.x /= count as f64;
			centroid.y /= count as f64;
		}

		let mut node = Self {
			bounds,
			centroid,
			count,
			indices,
			children: std::array::from_fn(|_| None),
		};
		if depth >= MAX_DEPTH || count <= LEAF_CAPACITY {
			return node;
		}

		let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
		for &i in &node.indices {
			buckets[bounds.quadrant_for(points[i])].push(i);
		}
		// All points in one quadrant means they are (nearly) coincident.
		if buckets.iter().filter(|b| !b.is_empty()).count() <= 1 {
			return node;
		}

		for (quadrant, bucket) in buckets.into_iter().enumerate() {
			if bucket.is_empty() {
				continue;
			}
			node.children[quadrant] = Some(Box::new(Self::build_node(
				bounds.child(quadrant),
				bucket,
				points,
				depth + 1,
			)));
		}
		node.indices.clear();
		node
	}

	pub(super) fn is_leaf(&self) -> bool {
		self.children.iter().all(Option::is_none)
	}

	/// Calls `visit` with every point index whose cell lies within `radius`
	/// of `p`. Callers still filter by exact distance.
	pub(super) fn for_each_near(&self, p: Point, radius: f64, visit: &mut impl FnMut(usize)) {
		if self.bounds.distance_sq_to(p) > radius * radius {
			return;
		}
		if self.is_leaf() {
			for &i in &self.indices {
				visit(i);
			}
			return;
		}
		for child in self.children.iter().flatten() {
			child.for_each_near(p, radius, visit);
		}
	}
}
