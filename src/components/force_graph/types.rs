//! Graph data structures received from either transport.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, WidgetError};

/// A node in the incident graph.
///
/// Fields other than the ones named here are kept verbatim so the tooltip can
/// show the full record.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GraphNode {
	/// Unique identifier. Edges refer to nodes by this id.
	pub id: String,
	/// Icon key, resolved to an image URL by the widget config.
	#[serde(default)]
	pub icon: String,
	/// Optional starting position.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub y: Option<f64>,
	/// Optional pinned position.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fx: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fy: Option<f64>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// A directed edge between two nodes.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GraphEdge {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Label drawn along the edge.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// One complete graph. Every load replaces the previous one wholesale.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct GraphDocument {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

impl GraphDocument {
	/// Parse a document from a JSON value.
	pub fn from_value(value: Value) -> Result<Self> {
		Ok(serde_json::from_value(value)?)
	}

	/// Check referential integrity and turn edges into node index pairs.
	///
	/// Rejects duplicate node ids and edges whose endpoints are not in
	/// `nodes`, so nothing is ever half rendered.
	pub fn resolve(&self) -> Result<Vec<(usize, usize)>> {
		let mut index = HashMap::with_capacity(self.nodes.len());
		for (i, node) in self.nodes.iter().enumerate() {
			if index.insert(node.id.as_str(), i).is_some() {
				return Err(WidgetError::DuplicateNode(node.id.clone()));
			}
		}

		self.edges
			.iter()
			.enumerate()
			.map(|(i, edge)| {
				let lookup = |endpoint: &str| {
					index
						.get(endpoint)
						.copied()
						.ok_or_else(|| WidgetError::DanglingEdge {
							index: i,
							endpoint: endpoint.to_string(),
						})
				};
				Ok((lookup(&edge.source)?, lookup(&edge.target)?))
			})
			.collect()
	}
}
