//! Widget configuration.
//!
//! Defaults are compiled in and can be overridden per host element with a JSON
//! `data-config` attribute. Values that depend on the page URL (local mode,
//! timeout override) live in [`crate::loader::PageLocation`] and are re-read on
//! every load.

use log::warn;
use serde::Deserialize;

use crate::components::force_graph::shape::IconShape;

/// Attribute holding per-instance JSON overrides.
pub const CONFIG_ATTRIBUTE: &str = "data-config";

/// Space reserved around the drawing area.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Margin {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

impl Default for Margin {
	fn default() -> Self {
		Self {
			top: 30.0,
			right: 80.0,
			bottom: 30.0,
			left: 30.0,
		}
	}
}

/// Request timeouts in milliseconds.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
	/// Used when the page is served from `localhost`/`127.0.0.1`.
	pub local_ms: u32,
	/// Used everywhere else.
	pub production_ms: u32,
}

impl Default for TimeoutConfig {
	fn default() -> Self {
		Self {
			local_ms: 5_000,
			production_ms: 30_000,
		}
	}
}

/// Everything a widget instance needs to know up front.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WidgetConfig {
	/// Base URL the icon images are served from.
	pub icon_prefix: String,
	/// Icon family; also decides where edges stop on a node.
	pub shape: IconShape,
	pub margin: Margin,
	/// Fallback canvas size when the host element has no layout size.
	pub width: f64,
	pub height: f64,
	/// Rendered icon edge length in pixels.
	pub icon_size: f64,
	pub edge_font_size: f64,
	pub edge_font_family: String,
	/// Origin of the local-mode API.
	pub api_base_url: String,
	/// Path of the graph document, shared by both transports.
	pub data_url: String,
	/// Topic used on the cross-window channel.
	pub event_name: String,
	/// Logical id of the requested document.
	pub request_id: String,
	pub timeouts: TimeoutConfig,
}

impl Default for WidgetConfig {
	fn default() -> Self {
		Self {
			icon_prefix: "https://raw.githubusercontent.com/os-threat/images/main/img/".into(),
			shape: IconShape::Rect,
			margin: Margin::default(),
			width: 1200.0,
			height: 1000.0,
			icon_size: 35.0,
			edge_font_size: 12.0,
			edge_font_family: "Arial, sans-serif".into(),
			api_base_url: "http://localhost:8111".into(),
			data_url: "/viz-data/overview-default-incident".into(),
			event_name: "embed-viz-event-payload-data-overview-default-incident".into(),
			request_id: "overview-default-incident".into(),
			timeouts: TimeoutConfig::default(),
		}
	}
}

impl WidgetConfig {
	/// Defaults overlaid with the JSON found in a host element's
	/// `data-config` attribute. Bad JSON is logged and ignored.
	pub fn from_attribute(raw: Option<&str>) -> Self {
		let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
			return Self::default();
		};
		match serde_json::from_str::<WidgetConfig>(raw) {
			Ok(config) => config,
			Err(e) => {
				warn!("incident-viz: ignoring invalid {CONFIG_ATTRIBUTE}: {e}");
				Self::default()
			}
		}
	}

	/// Full URL of the local-mode endpoint.
	pub fn api_url(&self) -> String {
		format!(
			"{}{}",
			self.api_base_url.trim_end_matches('/'),
			self.data_url
		)
	}

	/// Image URL for an icon key, e.g. `server` -> `.../rect-server.svg`.
	pub fn icon_href(&self, icon: &str) -> String {
		format!("{}{}{}.svg", self.icon_prefix, self.shape.prefix(), icon)
	}

	/// Link rest length: four icons apart.
	pub fn link_distance(&self) -> f64 {
		4.0 * self.icon_size
	}

	/// Collision radius per node.
	pub fn collision_radius(&self) -> f64 {
		1.5 * self.icon_size
	}
}
