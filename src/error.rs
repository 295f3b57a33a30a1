//! Error taxonomy for loading, messaging and DOM work.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Everything that can go wrong between asking for a graph and drawing it.
#[derive(Debug, Error)]
pub enum WidgetError {
	/// Local-mode endpoint answered outside the 2xx range.
	#[error("HTTP error! status: {status}")]
	Http { status: u16 },
	/// The fetch itself failed or the body could not be read.
	#[error("network error: {0}")]
	Network(String),
	/// Payload was not the JSON we expected.
	#[error("malformed graph payload: {0}")]
	Json(#[from] serde_json::Error),
	/// Parent page answered with an `error` field.
	#[error("parent application error: {0}")]
	Protocol(String),
	/// Parent page answered with neither `data` nor `error`.
	#[error("no graph data available from parent application")]
	MissingData,
	/// Nobody answered within the configured window.
	#[error("timed out after {waited_ms}ms waiting for graph data")]
	Timeout { waited_ms: u32 },
	/// An edge names a node that is not in the document.
	#[error("edge {index} references unknown node '{endpoint}'")]
	DanglingEdge { index: usize, endpoint: String },
	/// Two nodes share an id.
	#[error("duplicate node id '{0}'")]
	DuplicateNode(String),
	/// A browser API call failed.
	#[error("browser error: {0}")]
	Dom(String),
}

impl From<JsValue> for WidgetError {
	fn from(value: JsValue) -> Self {
		WidgetError::Dom(
			value
				.as_string()
				.unwrap_or_else(|| format!("{value:?}")),
		)
	}
}

/// Shorthand used across the crate.
pub type Result<T, E = WidgetError> = std::result::Result<T, E>;
