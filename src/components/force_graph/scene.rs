//! Pure render model.
//!
//! Every frame the widget state is flattened into a [`Scene`]: one primitive
//! per node and one per edge, already in screen-ready coordinates inside the
//! content group. The SVG layer only copies these numbers onto elements,
//! matching them up with [`KeyedJoin`] so repeated loads update elements in
//! place.

use std::collections::HashMap;
use std::hash::Hash;

use super::shape::clipped_endpoint;
use super::simulation::SimNode;
use super::types::GraphDocument;
use crate::config::WidgetConfig;

/// Growth factor of the selected node's icon.
pub const SELECTED_SCALE: f64 = 1.2;

/// An icon image for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodePrimitive {
	pub id: String,
	pub href: String,
	/// Top-left corner of the image.
	pub x: f64,
	pub y: f64,
	/// Edge length of the square image.
	pub size: f64,
	pub selected: bool,
}

/// A line, its label path and its label for one edge.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkPrimitive {
	/// Position of the edge in the document.
	pub key: usize,
	pub source: String,
	pub target: String,
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
	/// Path data (`M x y L x y`) the label text follows.
	pub path: String,
	pub label: Option<String>,
}

/// Everything drawn for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub nodes: Vec<NodePrimitive>,
	pub links: Vec<LinkPrimitive>,
}

impl Scene {
	/// Flatten a bound document and its simulated positions.
	///
	/// `positions` must be index-aligned with `document.nodes` and `links`
	/// with `document.edges`.
	pub fn build(
		document: &GraphDocument,
		positions: &[SimNode],
		links: &[(usize, usize)],
		selected: Option<&str>,
		config: &WidgetConfig,
	) -> Self {
		let nodes = document
			.nodes
			.iter()
			.zip(positions)
			.map(|(node, pos)| {
				let is_selected = selected == Some(node.id.as_str());
				let size = if is_selected {
					config.icon_size * SELECTED_SCALE
				} else {
					config.icon_size
				};
				NodePrimitive {
					id: node.id.clone(),
					href: config.icon_href(&node.icon),
					x: pos.x - size / 2.0,
					y: pos.y - size / 2.0,
					size,
					selected: is_selected,
				}
			})
			.collect();

		let links = document
			.edges
			.iter()
			.zip(links)
			.enumerate()
			.filter_map(|(key, (edge, &(s, t)))| {
				let (source, target) = (positions.get(s)?, positions.get(t)?);
				// Selected icons are drawn larger, so the arrow stops earlier.
				let extent = if selected == Some(edge.target.as_str()) {
					config.icon_size * SELECTED_SCALE / 2.0
				} else {
					config.icon_size / 2.0
				};
				let (x2, y2) = clipped_endpoint(
					(source.x, source.y),
					(target.x, target.y),
					extent,
					config.shape,
				);
				Some(LinkPrimitive {
					key,
					source: edge.source.clone(),
					target: edge.target.clone(),
					x1: source.x,
					y1: source.y,
					x2,
					y2,
					path: format!("M {} {} L {} {}", source.x, source.y, x2, y2),
					label: edge.name.clone(),
				})
			})
			.collect();

		Self { nodes, links }
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.links.is_empty()
	}
}

/// What a [`KeyedJoin::join`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JoinStats {
	pub entered: usize,
	pub updated: usize,
	pub exited: usize,
}

/// Keeps one element per key across repeated joins.
///
/// New keys create an element, known keys keep theirs, vanished keys are
/// handed back for removal.
#[derive(Debug)]
pub struct KeyedJoin<K, E> {
	entries: HashMap<K, E>,
}

impl<K, E> Default for KeyedJoin<K, E> {
	fn default() -> Self {
		Self {
			entries: HashMap::new(),
		}
	}
}

impl<K: Eq + Hash + Clone, E> KeyedJoin<K, E> {
	/// Match the current elements against `keys`.
	///
	/// If `enter` fails, nothing is removed and the error is returned.
	pub fn join<X>(
		&mut self,
		keys: impl IntoIterator<Item = K>,
		mut enter: impl FnMut(&K) -> Result<E, X>,
		mut exit: impl FnMut(E),
	) -> Result<JoinStats, X> {
		let mut stats = JoinStats::default();
		let mut next = HashMap::with_capacity(self.entries.len());
		for key in keys {
			if next.contains_key(&key) {
				continue;
			}
			let element = match self.entries.remove(&key) {
				Some(existing) => {
					stats.updated += 1;
					existing
				}
				None => match enter(&key) {
					Ok(created) => {
						stats.entered += 1;
						created
					}
					Err(e) => {
						self.entries.extend(next);
						return Err(e);
					}
				},
			};
			next.insert(key, element);
		}
		for (_, stale) in self.entries.drain() {
			stats.exited += 1;
			exit(stale);
		}
		self.entries = next;
		Ok(stats)
	}

	/// Remove everything.
	pub fn clear(&mut self, mut exit: impl FnMut(E)) -> usize {
		let removed = self.entries.len();
		for (_, element) in self.entries.drain() {
			exit(element);
		}
		removed
	}

	pub fn get(&self, key: &K) -> Option<&E> {
		self.entries.get(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&K, &E)> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn document() -> GraphDocument {
		GraphDocument::from_value(json!({
			"nodes": [{"id": "n1", "icon": "server"}, {"id": "n2", "icon": "user"}],
			"edges": [{"source": "n1", "target": "n2", "name": "uses"}]
		}))
		.unwrap()
	}

	fn positions() -> Vec<SimNode> {
		vec![SimNode::at(100.0, 100.0), SimNode::at(300.0, 100.0)]
	}

	#[test]
	fn one_primitive_per_node_and_edge() {
		let config = WidgetConfig::default();
		let scene = Scene::build(&document(), &positions(), &[(0, 1)], None, &config);
		assert_eq!(scene.nodes.len(), 2);
		assert_eq!(scene.links.len(), 1);
		assert_eq!(scene.links[0].label.as_deref(), Some("uses"));
		assert_eq!(scene.nodes[0].href, config.icon_href("server"));
	}

	#[test]
	fn images_are_centred_on_nodes() {
		let config = WidgetConfig::default();
		let scene = Scene::build(&document(), &positions(), &[(0, 1)], None, &config);
		let node = &scene.nodes[0];
		assert_eq!(node.x + node.size / 2.0, 100.0);
		assert_eq!(node.y + node.size / 2.0, 100.0);
	}

	#[test]
	fn selected_node_grows() {
		let config = WidgetConfig::default();
		let scene = Scene::build(&document(), &positions(), &[(0, 1)], Some("n2"), &config);
		assert!(!scene.nodes[0].selected);
		assert!(scene.nodes[1].selected);
		assert!((scene.nodes[1].size - config.icon_size * SELECTED_SCALE).abs() < 1e-9);
		assert!((scene.nodes[1].x + scene.nodes[1].size / 2.0 - 300.0).abs() < 1e-9);
	}

	#[test]
	fn links_stop_at_target_outline() {
		let config = WidgetConfig::default();
		let scene = Scene::build(&document(), &positions(), &[(0, 1)], None, &config);
		let link = &scene.links[0];
		assert_eq!((link.x1, link.y1), (100.0, 100.0));
		assert!((link.x2 - (300.0 - config.icon_size / 2.0)).abs() < 1e-9);
		assert!((link.y2 - 100.0).abs() < 1e-9);
		assert!(link.path.starts_with("M 100 100 L "));
	}

	#[test]
	fn links_stop_at_enlarged_selected_target() {
		let config = WidgetConfig::default();
		let scene = Scene::build(&document(), &positions(), &[(0, 1)], Some("n2"), &config);
		let link = &scene.links[0];
		let edge = 300.0 - config.icon_size * SELECTED_SCALE / 2.0;
		assert!((link.x2 - edge).abs() < 1e-9);

		// Selecting the source leaves the arrow where it was.
		let scene = Scene::build(&document(), &positions(), &[(0, 1)], Some("n1"), &config);
		assert!((scene.links[0].x2 - (300.0 - config.icon_size / 2.0)).abs() < 1e-9);
	}

	#[test]
	fn join_reuses_known_keys() {
		let mut join: KeyedJoin<String, u32> = KeyedJoin::default();
		let mut created = 0;
		let mut removed = Vec::new();

		let first = join
			.join(
				["a".to_string(), "b".to_string()],
				|_| {
					created += 1;
					Ok::<_, ()>(created)
				},
				|e| removed.push(e),
			)
			.unwrap();
		assert_eq!(
			first,
			JoinStats {
				entered: 2,
				updated: 0,
				exited: 0
			}
		);

		let second = join
			.join(
				["b".to_string(), "c".to_string()],
				|_| {
					created += 1;
					Ok::<_, ()>(created)
				},
				|e| removed.push(e),
			)
			.unwrap();
		assert_eq!(
			second,
			JoinStats {
				entered: 1,
				updated: 1,
				exited: 1
			}
		);
		assert_eq!(join.len(), 2);
		assert_eq!(removed, vec![1]);
		assert_eq!(join.get(&"b".to_string()), Some(&2));
	}

	#[test]
	fn repeated_join_with_same_keys_creates_nothing() {
		let mut join: KeyedJoin<usize, ()> = KeyedJoin::default();
		join.join(0..5, |_| Ok::<_, ()>(()), |_| ()).unwrap();
		let again = join
			.join(0..5, |_| -> Result<(), ()> { panic!("must not re-create") }, |_| ())
			.unwrap();
		assert_eq!(again.updated, 5);
		assert_eq!(join.len(), 5);
	}

	#[test]
	fn failed_enter_keeps_existing_entries() {
		let mut join: KeyedJoin<usize, usize> = KeyedJoin::default();
		join.join(0..3, |k| Ok::<_, ()>(*k), |_| ()).unwrap();
		let mut removed = 0;
		let result = join.join(
			0..5,
			|k| if *k == 4 { Err("boom") } else { Ok(*k) },
			|_| removed += 1,
		);
		assert_eq!(result, Err("boom"));
		assert_eq!(removed, 0);
		assert_eq!(join.len(), 4);
	}

	#[test]
	fn clear_hands_back_everything() {
		let mut join: KeyedJoin<usize, usize> = KeyedJoin::default();
		join.join(0..3, |k| Ok::<_, ()>(*k), |_| ()).unwrap();
		let mut gone = Vec::new();
		assert_eq!(join.clear(|e| gone.push(e)), 3);
		gone.sort_unstable();
		assert_eq!(gone, vec![0, 1, 2]);
		assert!(join.is_empty());
	}
}
