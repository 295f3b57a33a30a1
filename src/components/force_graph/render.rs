//! SVG synchronisation.
//!
//! The SVG shell (root, marker definition, content group and layer groups)
//! is built once per widget. Each frame, if the state changed, the current
//! [`Scene`] is joined against the existing elements by key: node id for
//! images, edge position for lines, label paths and labels. Elements are
//! only created for new keys and only removed for vanished ones, so repeated
//! loads never duplicate anything and `reload` leaves the shell intact.

use log::debug;
use web_sys::{Document, Element};

use super::scene::{KeyedJoin, LinkPrimitive, NodePrimitive, Scene};
use super::state::{LoadStatus, WidgetState};
use super::theme::Theme;
use crate::config::WidgetConfig;
use crate::error::Result;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Attribute carrying a node id on its image, used for event delegation.
pub const NODE_ID_ATTRIBUTE: &str = "data-node-id";

const OVERLAY_STYLE: &str = "position: absolute; top: 50%; left: 50%; \
	transform: translate(-50%, -50%); background: rgba(255,255,255,0.95); \
	padding: 20px 30px; border-radius: 8px; box-shadow: 0 4px 16px rgba(0,0,0,0.3); \
	z-index: 1000; font-size: 16px; font-weight: bold; color: #d32f2f; \
	border: 2px solid #d32f2f; text-align: center; min-width: 200px;";

/// A label and the `<textPath>` inside it.
struct Label {
	text: Element,
	path: Element,
}

/// The SVG drawing of one widget.
pub struct SvgLayer {
	document: Document,
	theme: Theme,
	icon_size: f64,
	edge_font_size: f64,
	edge_font_family: String,
	/// Per-widget prefix for element ids referenced by `url(#..)`.
	uid: String,
	svg: Element,
	content: Element,
	link_layer: Element,
	path_layer: Element,
	label_layer: Element,
	node_layer: Element,
	overlay: Element,
	lines: KeyedJoin<usize, Element>,
	paths: KeyedJoin<usize, Element>,
	labels: KeyedJoin<usize, Label>,
	images: KeyedJoin<String, Element>,
	scene_revision: Option<u64>,
	status: Option<LoadStatus>,
}

fn svg_element(document: &Document, tag: &str) -> Result<Element> {
	Ok(document.create_element_ns(Some(SVG_NS), tag)?)
}

fn set_attrs(element: &Element, attrs: &[(&str, &str)]) -> Result<()> {
	for (name, value) in attrs {
		element.set_attribute(name, value)?;
	}
	Ok(())
}

impl SvgLayer {
	/// Build the shell inside `stage`.
	pub fn create(
		document: &Document,
		stage: &Element,
		config: &WidgetConfig,
		theme: Theme,
		uid: &str,
		width: f64,
		height: f64,
	) -> Result<Self> {
		let svg = svg_element(document, "svg")?;
		set_attrs(
			&svg,
			&[
				("width", &width.to_string()),
				("height", &height.to_string()),
				("class", "incident-viz-svg"),
			],
		)?;

		let defs = svg_element(document, "defs")?;
		let marker = svg_element(document, "marker")?;
		let marker_id = format!("arrowhead-{uid}");
		set_attrs(
			&marker,
			&[
				("id", &marker_id),
				("viewBox", "-0 -5 10 10"),
				("refX", "10"),
				("refY", "0"),
				("orient", "auto"),
				("markerWidth", &theme.marker.width.to_string()),
				("markerHeight", &theme.marker.height.to_string()),
				("xoverflow", "visible"),
			],
		)?;
		let tip = svg_element(document, "path")?;
		set_attrs(
			&tip,
			&[
				("d", "M 0,-5 L 10 ,0 L 0,5"),
				("fill", &theme.marker.fill.to_css()),
				("style", "stroke: none"),
			],
		)?;
		marker.append_child(&tip)?;
		defs.append_child(&marker)?;
		svg.append_child(&defs)?;

		let content = svg_element(document, "g")?;
		let margin = config.margin;
		content.set_attribute(
			"transform",
			&format!("translate({},{})", margin.left, margin.top),
		)?;
		svg.append_child(&content)?;

		let layer = |class: &str| -> Result<Element> {
			let g = svg_element(document, "g")?;
			g.set_attribute("class", class)?;
			content.append_child(&g)?;
			Ok(g)
		};
		let link_layer = layer("link-layer")?;
		let path_layer = layer("edgepath-layer")?;
		let label_layer = layer("edgelabel-layer")?;
		let node_layer = layer("node-layer")?;

		let overlay = document.create_element("div")?;
		set_attrs(
			&overlay,
			&[("class", "error-message"), ("style", OVERLAY_STYLE), ("hidden", "")],
		)?;

		stage.append_child(&svg)?;
		stage.append_child(&overlay)?;

		Ok(Self {
			document: document.clone(),
			theme,
			icon_size: config.icon_size,
			edge_font_size: config.edge_font_size,
			edge_font_family: config.edge_font_family.clone(),
			uid: uid.to_string(),
			svg,
			content,
			link_layer,
			path_layer,
			label_layer,
			node_layer,
			overlay,
			lines: KeyedJoin::default(),
			paths: KeyedJoin::default(),
			labels: KeyedJoin::default(),
			images: KeyedJoin::default(),
			scene_revision: None,
			status: None,
		})
	}

	/// Bring the DOM in line with `state`. Cheap when nothing changed.
	pub fn sync(&mut self, state: &WidgetState) -> Result<()> {
		if self.status.as_ref() != Some(state.status()) {
			self.sync_overlay(state.status())?;
			self.status = Some(state.status().clone());
		}
		if self.scene_revision == Some(state.scene_revision()) {
			return Ok(());
		}
		self.scene_revision = Some(state.scene_revision());
		self.content.set_attribute("transform", &state.content_transform())?;
		self.draw(&state.scene())
	}

	fn sync_overlay(&self, status: &LoadStatus) -> Result<()> {
		match status {
			LoadStatus::Failed(message) => {
				self.overlay.set_text_content(Some(message));
				self.overlay.remove_attribute("hidden")?;
			}
			_ => self.overlay.set_attribute("hidden", "")?,
		}
		Ok(())
	}

	fn draw(&mut self, scene: &Scene) -> Result<()> {
		let document = &self.document;
		let marker = format!("url(#arrowhead-{})", self.uid);
		let edge = &self.theme.edge;

		let (link_layer, path_layer, label_layer, node_layer) = (
			&self.link_layer,
			&self.path_layer,
			&self.label_layer,
			&self.node_layer,
		);

		let keys = || scene.links.iter().map(|l| l.key);
		let stats = self.lines.join(
			keys(),
			|_| -> Result<Element> {
				let line = svg_element(document, "line")?;
				set_attrs(
					&line,
					&[
						("class", "links"),
						("stroke", &edge.color.to_css()),
						("stroke-width", &edge.width.to_string()),
						("marker-end", &marker),
						("style", "pointer-events: none; user-select: none"),
					],
				)?;
				link_layer.append_child(&line)?;
				Ok(line)
			},
			|line| line.remove(),
		)?;

		let uid = &self.uid;
		self.paths.join(
			keys(),
			|key| -> Result<Element> {
				let path = svg_element(document, "path")?;
				set_attrs(
					&path,
					&[
						("class", "edgepath"),
						("id", &format!("edgepath-{uid}-{key}")),
						("fill-opacity", "0"),
						("stroke-opacity", "0"),
						("style", "pointer-events: none; user-select: none"),
					],
				)?;
				path_layer.append_child(&path)?;
				Ok(path)
			},
			|path| path.remove(),
		)?;

		let (font_size, font_family) = (self.edge_font_size.to_string(), &self.edge_font_family);
		self.labels.join(
			keys(),
			|key| -> Result<Label> {
				let text = svg_element(document, "text")?;
				set_attrs(
					&text,
					&[
						("class", "edgelabel"),
						("id", &format!("edgelabel-{uid}-{key}")),
						("dy", &edge.label_dy.to_string()),
						("font-size", &font_size),
						("font-family", font_family),
						("font-weight", edge.label_weight),
						("fill", &edge.label_color.to_css()),
						("style", "pointer-events: none; user-select: none"),
					],
				)?;
				let path = svg_element(document, "textPath")?;
				set_attrs(
					&path,
					&[
						("href", &format!("#edgepath-{uid}-{key}")),
						("startOffset", "50%"),
						("style", "text-anchor: middle; pointer-events: none; user-select: none"),
					],
				)?;
				text.append_child(&path)?;
				label_layer.append_child(&text)?;
				Ok(Label { text, path })
			},
			|label| label.text.remove(),
		)?;

		let icon_size = self.icon_size.to_string();
		let images = self.images.join(
			scene.nodes.iter().map(|n| n.id.clone()),
			|id| -> Result<Element> {
				let image = svg_element(document, "image")?;
				set_attrs(
					&image,
					&[
						("class", "nodes node-image"),
						(NODE_ID_ATTRIBUTE, id),
						("width", &icon_size),
						("height", &icon_size),
						("style", "cursor: pointer"),
					],
				)?;
				node_layer.append_child(&image)?;
				Ok(image)
			},
			|image| image.remove(),
		)?;

		if stats.entered + stats.exited + images.entered + images.exited > 0 {
			debug!(
				"incident-viz: links {stats:?}, nodes {images:?} ({} labels)",
				self.labels.len()
			);
		}

		for link in &scene.links {
			self.update_link(link)?;
		}
		for node in &scene.nodes {
			self.update_node(node)?;
		}
		Ok(())
	}

	fn update_link(&self, link: &LinkPrimitive) -> Result<()> {
		if let Some(line) = self.lines.get(&link.key) {
			set_attrs(
				line,
				&[
					("source", &link.source),
					("target", &link.target),
					("x1", &link.x1.to_string()),
					("y1", &link.y1.to_string()),
					("x2", &link.x2.to_string()),
					("y2", &link.y2.to_string()),
				],
			)?;
		}
		if let Some(path) = self.paths.get(&link.key) {
			path.set_attribute("d", &link.path)?;
		}
		if let Some(label) = self.labels.get(&link.key) {
			let text = link.label.as_deref().unwrap_or_default();
			if label.path.text_content().as_deref() != Some(text) {
				label.path.set_text_content(Some(text));
			}
		}
		Ok(())
	}

	fn update_node(&self, node: &NodePrimitive) -> Result<()> {
		let Some(image) = self.images.get(&node.id) else {
			return Ok(());
		};
		let size = node.size.to_string();
		set_attrs(
			image,
			&[
				("href", &node.href),
				("x", &node.x.to_string()),
				("y", &node.y.to_string()),
				("width", &size),
				("height", &size),
			],
		)?;
		let style = if node.selected {
			let selection = &self.theme.selection;
			format!(
				"cursor: pointer; filter: {}; stroke: {}; stroke-width: {}px",
				selection.filter(),
				selection.stroke.to_css(),
				selection.stroke_width
			)
		} else {
			"cursor: pointer".to_string()
		};
		image.set_attribute("style", &style)?;
		Ok(())
	}

	/// Remove the whole drawing from the page.
	pub fn remove(&mut self) {
		self.lines.clear(|e| e.remove());
		self.paths.clear(|e| e.remove());
		self.labels.clear(|l| l.text.remove());
		self.images.clear(|e| e.remove());
		self.svg.remove();
		self.overlay.remove();
	}
}
