//! Where an edge meets a node's icon.
//!
//! Icons come in three families. Square icons (`rect-`) are clipped with a
//! ray/box intersection from the centre; circular ones (`norm-`, `rnd-`) use a
//! fixed radial offset.

use serde::Deserialize;

/// Smallest direction component used when dividing, so axis-aligned rays do
/// not blow up.
const MIN_COMPONENT: f64 = 0.0001;

/// Icon family, named after the image file prefix.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub enum IconShape {
	#[default]
	#[serde(rename = "rect-")]
	Rect,
	#[serde(rename = "norm-")]
	Normal,
	#[serde(rename = "rnd-")]
	Round,
}

impl IconShape {
	/// File-name prefix of the icon image.
	pub fn prefix(self) -> &'static str {
		match self {
			IconShape::Rect => "rect-",
			IconShape::Normal => "norm-",
			IconShape::Round => "rnd-",
		}
	}

	fn is_circular(self) -> bool {
		matches!(self, IconShape::Normal | IconShape::Round)
	}
}

/// Offset from a node's centre to its outline along `angle` (radians).
///
/// `extent` is the radius for circular shapes and the half side length for
/// square ones.
pub fn shape_intersection(angle: f64, extent: f64, shape: IconShape) -> (f64, f64) {
	let (dx, dy) = (angle.cos(), angle.sin());
	if shape.is_circular() {
		return (extent * dx, extent * dy);
	}

	let abs_dx = dx.abs().max(MIN_COMPONENT);
	let abs_dy = dy.abs().max(MIN_COMPONENT);
	let t = (extent / abs_dx).min(extent / abs_dy);
	(t * dx, t * dy)
}

/// Point where a line from `source` to `target` enters the target's outline.
///
/// Coincident endpoints return the target centre unchanged.
pub fn clipped_endpoint(
	source: (f64, f64),
	target: (f64, f64),
	extent: f64,
	shape: IconShape,
) -> (f64, f64) {
	let (dx, dy) = (target.0 - source.0, target.1 - source.1);
	if dx == 0.0 && dy == 0.0 {
		return target;
	}
	let (ox, oy) = shape_intersection(dy.atan2(dx), extent, shape);
	(target.0 - ox, target.1 - oy)
}
