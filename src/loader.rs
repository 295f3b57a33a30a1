//! Data Loader: picks a transport for every load.
//!
//! The decision depends only on the page URL, which is read again on each
//! call because `reload()` can run without a navigation.

use log::{debug, info};

use crate::components::force_graph::types::GraphDocument;
use crate::config::{TimeoutConfig, WidgetConfig};
use crate::error::{Result, WidgetError};
use crate::messaging::{OutboundEnvelope, ResponseBody};

/// Query parameter switching to direct HTTP.
pub const LOCAL_PARAM: &str = "local";
/// Query parameter overriding the timeout, in milliseconds.
pub const TIMEOUT_PARAM: &str = "test_timeout";

/// The bits of `window.location` the loader cares about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageLocation {
	pub hostname: String,
	params: Vec<(String, String)>,
}

impl PageLocation {
	/// Build from `location.search` (leading `?` optional) and
	/// `location.hostname`.
	pub fn parse(search: &str, hostname: &str) -> Self {
		let params = search
			.trim_start_matches('?')
			.split('&')
			.filter(|pair| !pair.is_empty())
			.map(|pair| {
				let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
				(decode_component(key), decode_component(value))
			})
			.collect();
		Self {
			hostname: hostname.to_string(),
			params,
		}
	}

	/// First value of a query parameter.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	/// True iff `local=true` is in the query string.
	pub fn is_local_mode(&self) -> bool {
		self.param(LOCAL_PARAM) == Some("true")
	}

	/// Served from a development host.
	pub fn is_local_host(&self) -> bool {
		matches!(self.hostname.as_str(), "localhost" | "127.0.0.1")
	}

	/// How long to wait for data: the URL override if it parses, otherwise
	/// the development or production default.
	pub fn timeout_ms(&self, timeouts: &TimeoutConfig) -> u32 {
		if let Some(ms) = self.param(TIMEOUT_PARAM).and_then(|v| v.trim().parse().ok()) {
			debug!("incident-viz: using timeout from URL parameter: {ms}ms");
			return ms;
		}
		if self.is_local_host() {
			timeouts.local_ms
		} else {
			timeouts.production_ms
		}
	}
}

/// Minimal `application/x-www-form-urlencoded` decoding.
fn decode_component(raw: &str) -> String {
	let bytes = raw.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		match bytes[i] {
			b'+' => out.push(b' '),
			b'%' if i + 2 < bytes.len() => {
				let hex = |b: u8| (b as char).to_digit(16);
				match (hex(bytes[i + 1]), hex(bytes[i + 2])) {
					(Some(hi), Some(lo)) => {
						out.push((hi * 16 + lo) as u8);
						i += 2;
					}
					_ => out.push(b'%'),
				}
			}
			other => out.push(other),
		}
		i += 1;
	}
	String::from_utf8_lossy(&out).into_owned()
}

/// How one load is carried out.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadPlan {
	/// GET the document directly.
	Http { url: String },
	/// Ask the parent window.
	Message(OutboundEnvelope),
}

impl LoadPlan {
	/// Choose the transport for `location`.
	pub fn choose(location: &PageLocation, config: &WidgetConfig) -> Self {
		if location.is_local_mode() {
			let url = config.api_url();
			info!("incident-viz: local mode, loading data from API: {url}");
			LoadPlan::Http { url }
		} else {
			info!("incident-viz: widget mode, requesting data via event: {}", config.event_name);
			LoadPlan::Message(OutboundEnvelope::load_request(config))
		}
	}
}

/// Parse an HTTP response body.
pub fn document_from_text(text: &str) -> Result<GraphDocument> {
	let value = serde_json::from_str(text)?;
	GraphDocument::from_value(value)
}

/// Turn a matched parent response into a document or the matching error.
pub fn document_from_response(body: ResponseBody) -> Result<GraphDocument> {
	match body {
		ResponseBody::Data(value) => GraphDocument::from_value(value),
		ResponseBody::Error(message) => Err(WidgetError::Protocol(message)),
		ResponseBody::Missing => Err(WidgetError::MissingData),
	}
}
