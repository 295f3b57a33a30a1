//! Widget state and interaction tracking.
//!
//! Wraps the layout simulation with the currently bound document, the
//! selection, the drag and pan state machines, the zoom transform and the
//! tooltip. Created once per mounted widget and mutated by pointer events,
//! load results and the animation loop; the renderer reads it back through
//! [`WidgetState::scene`].
//!
//! Loads are tagged with a generation number. `begin_load` and `clear` both
//! start a new generation, so results of anything started earlier are
//! recognisably stale and dropped.

use std::collections::HashMap;

use log::{debug, info, warn};
use serde_json::{Value, json};

use super::scene::Scene;
use super::simulation::{ForceParams, Point, SimNode, Simulation};
use super::tooltip::syntax_highlight;
use super::types::GraphDocument;
use crate::config::WidgetConfig;
use crate::error::{Result, WidgetError};

/// Monotonic load counter.
pub type Generation = u64;

/// Zoom scale bounds.
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// Energy target while a node is being dragged.
const DRAG_ALPHA_TARGET: f64 = 0.3;
/// Energy injected when a pinned node is released.
const RELEASE_ALPHA: f64 = 0.3;
/// Tooltip sits this far below the pointer.
const TOOLTIP_OFFSET_Y: f64 = 10.0;
const TOOLTIP_FADE_IN_MS: u32 = 300;
const TOOLTIP_FADE_OUT_MS: u32 = 100;

/// Where the current load stands.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadStatus {
	/// Nothing requested yet.
	Idle,
	/// Waiting for a response for this generation.
	Loading { generation: Generation },
	/// A document is bound.
	Ready,
	/// The last load failed; the message is shown to the user.
	Failed(String),
	/// Emptied by `clear`.
	Cleared,
}

/// Pan and zoom applied on top of the fixed margin translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to 0.1..10.0).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

/// Tracks an in-progress node drag.
#[derive(Clone, Copy, Debug, Default)]
struct DragState {
	node: Option<usize>,
	moved: bool,
}

/// Tracks an in-progress canvas pan.
#[derive(Clone, Copy, Debug, Default)]
struct PanState {
	active: bool,
	moved: bool,
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
}

/// What the shared tooltip should currently show.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TooltipState {
	pub visible: bool,
	/// Highlighted JSON of the hovered node.
	pub html: String,
	/// Page coordinates in pixels.
	pub left: f64,
	pub top: f64,
	/// Bumped on every change so the DOM is only touched when needed.
	pub revision: u64,
}

impl TooltipState {
	/// Opacity transition time for the current direction.
	pub fn fade_ms(&self) -> u32 {
		if self.visible {
			TOOLTIP_FADE_IN_MS
		} else {
			TOOLTIP_FADE_OUT_MS
		}
	}
}

/// All mutable state of one widget.
pub struct WidgetState {
	config: WidgetConfig,
	simulation: Simulation,
	document: GraphDocument,
	links: Vec<(usize, usize)>,
	index: HashMap<String, usize>,
	selection: Option<String>,
	drag: DragState,
	pan: PanState,
	suppress_click: bool,
	transform: ViewTransform,
	tooltip: TooltipState,
	status: LoadStatus,
	generation: Generation,
	scene_revision: u64,
}

impl WidgetState {
	pub fn new(config: WidgetConfig, width: f64, height: f64) -> Self {
		let simulation = Simulation::new(ForceParams::for_viewport(&config, width, height));
		Self {
			config,
			simulation,
			document: GraphDocument::default(),
			links: Vec::new(),
			index: HashMap::new(),
			selection: None,
			drag: DragState::default(),
			pan: PanState::default(),
			suppress_click: false,
			transform: ViewTransform::default(),
			tooltip: TooltipState::default(),
			status: LoadStatus::Idle,
			generation: 0,
			scene_revision: 0,
		}
	}

	pub fn config(&self) -> &WidgetConfig {
		&self.config
	}

	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	pub fn document(&self) -> &GraphDocument {
		&self.document
	}

	pub fn selection(&self) -> Option<&str> {
		self.selection.as_deref()
	}

	pub fn status(&self) -> &LoadStatus {
		&self.status
	}

	pub fn generation(&self) -> Generation {
		self.generation
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn tooltip(&self) -> &TooltipState {
		&self.tooltip
	}

	/// Bumped whenever the scene would render differently.
	pub fn scene_revision(&self) -> u64 {
		self.scene_revision
	}

	/// Flatten the current state for rendering.
	pub fn scene(&self) -> Scene {
		Scene::build(
			&self.document,
			self.simulation.nodes(),
			&self.links,
			self.selection.as_deref(),
			&self.config,
		)
	}

	/// Drop the rendered graph, stop the engine and open a new generation.
	/// The engine keeps its energy so the next bind resumes it.
	pub fn begin_load(&mut self) -> Generation {
		self.simulation.stop();
		self.strip();
		self.generation += 1;
		self.status = LoadStatus::Loading {
			generation: self.generation,
		};
		info!("incident-viz: load #{} started", self.generation);
		self.generation
	}

	/// Stop and empty the engine, drop the graph and hide the tooltip.
	/// Anything still in flight is invalidated.
	pub fn clear(&mut self) {
		self.simulation.clear();
		self.strip();
		self.generation += 1;
		self.status = LoadStatus::Cleared;
		info!("incident-viz: data and visualization cleared");
	}

	fn strip(&mut self) {
		self.document = GraphDocument::default();
		self.links.clear();
		self.index.clear();
		self.selection = None;
		self.drag = DragState::default();
		self.suppress_click = false;
		self.hide_tooltip();
		self.scene_revision += 1;
	}

	/// Whether a result tagged `generation` may still be applied.
	pub fn is_current(&self, generation: Generation) -> bool {
		generation == self.generation && self.status != LoadStatus::Cleared
	}

	/// Bind a freshly received document.
	///
	/// Returns `Ok(false)` if the result is stale. Invalid documents are
	/// rejected before anything changes.
	pub fn bind(&mut self, generation: Generation, document: GraphDocument) -> Result<bool> {
		if !self.is_current(generation) {
			debug!("incident-viz: discarding stale document for load #{generation}");
			return Ok(false);
		}
		let links = document.resolve()?;

		let mut seeded = Vec::with_capacity(document.nodes.len());
		let nodes: Vec<SimNode> = document
			.nodes
			.iter()
			.map(|node| {
				// Duplicate deliveries keep the layout where it was.
				let previous = self
					.index
					.get(&node.id)
					.and_then(|&i| self.simulation.node(i))
					.copied();
				let mut sim = previous.unwrap_or_default();
				if let (Some(x), Some(y)) = (node.x, node.y) {
					sim.x = x;
					sim.y = y;
				}
				if node.fx.is_some() || node.fy.is_some() {
					sim.fx = node.fx;
					sim.fy = node.fy;
				}
				seeded.push(previous.is_some() || (node.x.is_some() && node.y.is_some()));
				sim
			})
			.collect();

		self.index = document
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.id.clone(), i))
			.collect();
		if let Some(selected) = &self.selection {
			if !self.index.contains_key(selected) {
				self.selection = None;
			}
		}
		self.drag = DragState::default();

		self.simulation.set_nodes(nodes, &seeded);
		self.simulation.set_links(&links);
		self.links = links;
		self.document = document;

		// A cooled layout counts as idle, so new nodes get a full run.
		if self.simulation.alpha() < self.simulation.alpha_min() {
			info!("incident-viz: restarting simulation after data load");
			self.simulation.set_alpha(1.0);
		}
		self.simulation.restart();

		self.status = LoadStatus::Ready;
		self.scene_revision += 1;
		info!(
			"incident-viz: bound {} nodes, {} edges",
			self.document.nodes.len(),
			self.document.edges.len()
		);
		Ok(true)
	}

	/// Record a failed load. Returns `false` for stale failures.
	pub fn fail(&mut self, generation: Generation, error: &WidgetError) -> bool {
		if !self.is_current(generation) {
			debug!("incident-viz: ignoring stale failure for load #{generation}: {error}");
			return false;
		}
		warn!("incident-viz: load #{generation} failed: {error}");
		self.status = LoadStatus::Failed(error.to_string());
		true
	}

	/// Whether load `generation` is still waiting for data.
	pub fn is_pending(&self, generation: Generation) -> bool {
		self.status == LoadStatus::Loading { generation }
	}

	/// Advance the layout one frame.
	pub fn tick(&mut self) -> bool {
		let moved = self.simulation.step();
		if moved {
			self.scene_revision += 1;
		}
		moved
	}

	fn node_index(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Toggle selection of a node; another selected node is deselected.
	pub fn click_node(&mut self, id: &str) {
		if std::mem::take(&mut self.suppress_click) {
			return;
		}
		if self.node_index(id).is_none() {
			return;
		}
		if self.selection.as_deref() == Some(id) {
			self.selection = None;
		} else {
			self.selection = Some(id.to_string());
		}
		debug!("incident-viz: node selected: {:?}", self.selection);
		self.scene_revision += 1;
	}

	/// Click on empty canvas clears the selection.
	pub fn click_background(&mut self) {
		if std::mem::take(&mut self.suppress_click) {
			return;
		}
		if self.selection.take().is_some() {
			self.scene_revision += 1;
		}
	}

	/// Unpin a node and let the layout pick it up again.
	pub fn double_click_node(&mut self, id: &str) {
		let Some(index) = self.node_index(id) else {
			return;
		};
		self.simulation.release(index);
		self.simulation.set_alpha(RELEASE_ALPHA);
		self.simulation.restart();
		debug!("incident-viz: node unfixed: {id}");
	}

	/// Pointer went down on a node: warm the engine and pin the node.
	pub fn drag_start(&mut self, id: &str) {
		let Some(index) = self.node_index(id) else {
			return;
		};
		if self.drag.node.is_none() {
			self.simulation.set_alpha_target(DRAG_ALPHA_TARGET);
			self.simulation.restart();
		}
		self.simulation.pin_in_place(index);
		self.drag = DragState {
			node: Some(index),
			moved: false,
		};
	}

	/// Move the dragged node to `at` (layout coordinates).
	pub fn drag_move(&mut self, at: Point) {
		if let Some(index) = self.drag.node {
			self.simulation.pin(index, at.x, at.y);
			self.drag.moved = true;
		}
	}

	/// Pointer released: cool the engine. The node stays pinned.
	pub fn drag_end(&mut self) {
		let Some(index) = self.drag.node.take() else {
			return;
		};
		self.simulation.set_alpha_target(0.0);
		if self.drag.moved {
			self.suppress_click = true;
		}
		self.drag.moved = false;
		if let Some(node) = self.simulation.node(index) {
			debug!(
				"incident-viz: node fixed at position: {:?} {:?}",
				node.fx, node.fy
			);
		}
	}

	pub fn is_dragging(&self) -> bool {
		self.drag.node.is_some()
	}

	/// Pointer went down on empty canvas at `at` (SVG coordinates).
	pub fn pan_start(&mut self, at: Point) {
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: at.x,
			start_y: at.y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_move(&mut self, at: Point) {
		if !self.pan.active {
			return;
		}
		self.transform.x = self.pan.transform_start_x + (at.x - self.pan.start_x);
		self.transform.y = self.pan.transform_start_y + (at.y - self.pan.start_y);
		self.pan.moved = true;
		self.scene_revision += 1;
	}

	pub fn pan_end(&mut self) {
		if self.pan.active && self.pan.moved {
			self.suppress_click = true;
		}
		self.pan = PanState::default();
	}

	pub fn is_panning(&self) -> bool {
		self.pan.active
	}

	/// Scale by `factor` keeping the layout point under `at` (SVG
	/// coordinates) fixed.
	pub fn zoom_at(&mut self, at: Point, factor: f64) {
		let margin = self.config.margin;
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		let (px, py) = (at.x - margin.left, at.y - margin.top);
		self.transform.x = px - (px - self.transform.x) * ratio;
		self.transform.y = py - (py - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.scene_revision += 1;
	}

	/// SVG `transform` for the content group: margin first, then pan/zoom.
	pub fn content_transform(&self) -> String {
		let margin = self.config.margin;
		format!(
			"translate({},{}) translate({},{}) scale({})",
			margin.left, margin.top, self.transform.x, self.transform.y, self.transform.k
		)
	}

	/// Convert SVG coordinates into layout coordinates.
	pub fn to_layout(&self, at: Point) -> Point {
		let margin = self.config.margin;
		Point::new(
			(at.x - margin.left - self.transform.x) / self.transform.k,
			(at.y - margin.top - self.transform.y) / self.transform.k,
		)
	}

	/// Full record of a node: payload fields plus live layout fields.
	pub fn node_datum(&self, id: &str) -> Option<Value> {
		let index = self.node_index(id)?;
		let node = self.document.nodes.get(index)?;
		let sim = self.simulation.node(index)?;
		let mut datum = serde_json::to_value(node).ok()?;
		if let Value::Object(map) = &mut datum {
			map.insert("index".into(), json!(index));
			map.insert("x".into(), json!(sim.x));
			map.insert("y".into(), json!(sim.y));
			map.insert("vx".into(), json!(sim.vx));
			map.insert("vy".into(), json!(sim.vy));
			map.insert("fx".into(), json!(sim.fx));
			map.insert("fy".into(), json!(sim.fy));
		}
		Some(datum)
	}

	/// Pointer entered a node at page coordinates (`page_x`, `page_y`).
	pub fn hover(&mut self, id: &str, page_x: f64, page_y: f64) {
		let Some(datum) = self.node_datum(id) else {
			return;
		};
		self.tooltip.visible = true;
		self.tooltip.html = syntax_highlight(&datum);
		self.tooltip.left = page_x;
		self.tooltip.top = page_y + TOOLTIP_OFFSET_Y;
		self.tooltip.revision += 1;
	}

	/// Keep a visible tooltip next to the pointer.
	pub fn pointer_move(&mut self, page_x: f64, page_y: f64) {
		if !self.tooltip.visible {
			return;
		}
		self.tooltip.left = page_x;
		self.tooltip.top = page_y + TOOLTIP_OFFSET_Y;
		self.tooltip.revision += 1;
	}

	/// Pointer left a node.
	pub fn hover_end(&mut self) {
		self.hide_tooltip();
	}

	fn hide_tooltip(&mut self) {
		if self.tooltip.visible {
			self.tooltip.visible = false;
			self.tooltip.revision += 1;
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn state() -> WidgetState {
		WidgetState::new(WidgetConfig::default(), 800.0, 600.0)
	}

	fn fixture() -> GraphDocument {
		GraphDocument::from_value(json!({
			"nodes": [
				{"id": "a", "icon": "server"},
				{"id": "b", "icon": "user"},
				{"id": "c", "icon": "user"}
			],
			"edges": [{"source": "a", "target": "b", "name": "uses"}]
		}))
		.unwrap()
	}

	fn loaded() -> WidgetState {
		let mut state = state();
		let generation = state.begin_load();
		assert!(state.bind(generation, fixture()).unwrap());
		state
	}

	#[test]
	fn bind_populates_scene_and_starts_engine() {
		let state = loaded();
		let scene = state.scene();
		assert_eq!(scene.nodes.len(), 3);
		assert_eq!(scene.links.len(), 1);
		assert!(state.simulation().is_running());
		assert_eq!(state.status(), &LoadStatus::Ready);
	}

	#[test]
	fn stale_generation_is_discarded() {
		let mut state = state();
		let old = state.begin_load();
		let new = state.begin_load();
		assert!(!state.bind(old, fixture()).unwrap());
		assert!(state.document().nodes.is_empty());
		assert!(state.bind(new, fixture()).unwrap());
	}

	#[test]
	fn nothing_binds_after_clear() {
		let mut state = state();
		let generation = state.begin_load();
		state.clear();
		assert!(!state.bind(generation, fixture()).unwrap());
		assert!(!state.bind(state.generation(), fixture()).unwrap());
		assert!(state.scene().is_empty());
	}

	#[test]
	fn invalid_document_leaves_state_untouched() {
		let mut state = loaded();
		let mut bad = fixture();
		bad.edges[0].target = "ghost".into();
		let generation = state.generation();
		assert!(state.bind(generation, bad).is_err());
		assert_eq!(state.scene().nodes.len(), 3);
	}

	#[test]
	fn payload_positions_seed_and_pin_nodes() {
		let mut state = state();
		let generation = state.begin_load();
		let document = GraphDocument::from_value(json!({
			"nodes": [
				{"id": "a", "icon": "server", "x": 11, "y": 22},
				{"id": "b", "icon": "user", "fx": 5}
			],
			"edges": []
		}))
		.unwrap();
		assert!(state.bind(generation, document).unwrap());
		let a = state.simulation().nodes()[0];
		assert_eq!((a.x, a.y), (11.0, 22.0));
		assert_eq!((a.fx, a.fy), (None, None));
		let b = state.simulation().nodes()[1];
		assert_eq!((b.fx, b.fy), (Some(5.0), None));

		state.tick();
		assert_eq!(state.simulation().nodes()[1].x, 5.0);
	}

	#[test]
	fn rebind_without_selected_node_clears_selection() {
		let mut state = loaded();
		state.click_node("c");
		assert_eq!(state.selection(), Some("c"));
		let mut smaller = fixture();
		smaller.nodes.retain(|n| n.id != "c");
		let generation = state.generation();
		assert!(state.bind(generation, smaller).unwrap());
		assert_eq!(state.selection(), None);

		state.click_node("a");
		let generation = state.generation();
		assert!(state.bind(generation, fixture()).unwrap());
		assert_eq!(state.selection(), Some("a"));
	}

	#[test]
	fn reload_after_settling_runs_full_layout() {
		let mut state = loaded();
		while state.simulation().is_running() {
			state.tick();
		}
		assert!(state.simulation().alpha() < state.simulation().alpha_min());
		let generation = state.begin_load();
		assert!(state.bind(generation, fixture()).unwrap());
		assert_eq!(state.simulation().alpha(), 1.0);
		assert!(state.simulation().is_running());
	}

	#[test]
	fn selection_is_exclusive_and_toggles() {
		let mut state = loaded();
		state.click_node("a");
		state.click_node("b");
		assert_eq!(state.selection(), Some("b"));
		let scene = state.scene();
		assert_eq!(scene.nodes.iter().filter(|n| n.selected).count(), 1);
		state.click_node("b");
		assert_eq!(state.selection(), None);
	}

	#[test]
	fn background_click_deselects() {
		let mut state = loaded();
		state.click_node("a");
		state.click_background();
		assert_eq!(state.selection(), None);
	}

	#[test]
	fn reload_clears_selection() {
		let mut state = loaded();
		state.click_node("a");
		state.begin_load();
		assert_eq!(state.selection(), None);
	}

	#[test]
	fn drag_pins_and_double_click_releases() {
		let mut state = loaded();
		state.drag_start("a");
		assert!((state.simulation().alpha_target() - 0.3).abs() < 1e-12);
		state.drag_move(Point::new(42.0, 24.0));
		state.drag_end();
		assert_eq!(state.simulation().alpha_target(), 0.0);
		let node = state.simulation().nodes()[0];
		assert_eq!((node.fx, node.fy), (Some(42.0), Some(24.0)));

		// The click that ends a drag does not select.
		state.click_node("a");
		assert_eq!(state.selection(), None);

		state.simulation.set_alpha(0.0);
		state.simulation.stop();
		state.double_click_node("a");
		let node = state.simulation().nodes()[0];
		assert_eq!((node.fx, node.fy), (None, None));
		assert!(state.simulation().alpha() > 0.0);
		assert!(state.simulation().is_running());
	}

	#[test]
	fn pinned_node_survives_ticks() {
		let mut state = loaded();
		state.drag_start("b");
		state.drag_move(Point::new(10.0, 10.0));
		state.drag_end();
		for _ in 0..20 {
			state.tick();
		}
		let node = state.simulation().nodes()[1];
		assert_eq!((node.x, node.y), (10.0, 10.0));
	}

	#[test]
	fn press_without_move_still_selects() {
		let mut state = loaded();
		state.drag_start("c");
		state.drag_end();
		state.click_node("c");
		assert_eq!(state.selection(), Some("c"));
	}

	#[test]
	fn zoom_is_clamped_and_keeps_pointer_fixed() {
		let mut state = loaded();
		let pointer = Point::new(200.0, 150.0);
		let before = state.to_layout(pointer);
		state.zoom_at(pointer, 2.0);
		let after = state.to_layout(pointer);
		assert!((before.x - after.x).abs() < 1e-9);
		assert!((before.y - after.y).abs() < 1e-9);

		for _ in 0..50 {
			state.zoom_at(pointer, 2.0);
		}
		assert_eq!(state.transform().k, MAX_ZOOM);
		for _ in 0..100 {
			state.zoom_at(pointer, 0.5);
		}
		assert_eq!(state.transform().k, MIN_ZOOM);
	}

	#[test]
	fn content_transform_keeps_margin_first() {
		let mut state = loaded();
		assert_eq!(
			state.content_transform(),
			"translate(30,30) translate(0,0) scale(1)"
		);
		state.pan_start(Point::new(0.0, 0.0));
		state.pan_move(Point::new(5.0, 7.0));
		state.pan_end();
		assert!(state.content_transform().starts_with("translate(30,30) translate(5,7)"));
	}

	#[test]
	fn pan_release_does_not_deselect() {
		let mut state = loaded();
		state.click_node("a");
		state.pan_start(Point::new(0.0, 0.0));
		state.pan_move(Point::new(50.0, 0.0));
		state.pan_end();
		state.click_background();
		assert_eq!(state.selection(), Some("a"));
	}

	#[test]
	fn hover_shows_full_datum_below_pointer() {
		let mut state = loaded();
		state.hover("a", 100.0, 50.0);
		let tooltip = state.tooltip();
		assert!(tooltip.visible);
		assert_eq!((tooltip.left, tooltip.top), (100.0, 60.0));
		assert_eq!(tooltip.fade_ms(), 300);
		assert!(tooltip.html.contains(r#"<span class="string">"server"</span>"#));
		assert!(tooltip.html.contains(r#"<span class="key">"vx":</span>"#));

		state.hover_end();
		assert!(!state.tooltip().visible);
		assert_eq!(state.tooltip().fade_ms(), 100);
	}

	#[test]
	fn clear_hides_tooltip_and_zeroes_engine() {
		let mut state = loaded();
		state.hover("a", 1.0, 1.0);
		state.clear();
		assert!(!state.tooltip().visible);
		assert_eq!(state.simulation().alpha(), 0.0);
		assert!(state.simulation().nodes().is_empty());
		assert!(!state.simulation().is_running());
	}

	#[test]
	fn load_after_clear_reheats_engine() {
		let mut state = loaded();
		state.clear();
		let generation = state.begin_load();
		assert!(state.bind(generation, fixture()).unwrap());
		assert_eq!(state.simulation().alpha(), 1.0);
		assert!(state.simulation().is_running());
	}

	#[test]
	fn duplicate_delivery_keeps_layout() {
		let mut state = loaded();
		for _ in 0..10 {
			state.tick();
		}
		let before = state.simulation().nodes().to_vec();
		let generation = state.generation();
		assert!(state.bind(generation, fixture()).unwrap());
		let after = state.simulation().nodes();
		assert_eq!(before[0].x, after[0].x);
		assert_eq!(before[2].y, after[2].y);
	}

	#[test]
	fn failures_are_recorded_only_for_current_load() {
		let mut state = state();
		let old = state.begin_load();
		let new = state.begin_load();
		assert!(!state.fail(old, &WidgetError::MissingData));
		assert!(state.is_pending(new));
		assert!(state.fail(new, &WidgetError::Http { status: 500 }));
		assert_eq!(
			state.status(),
			&LoadStatus::Failed("HTTP error! status: 500".into())
		);
		assert!(!state.is_pending(new));
	}
}
