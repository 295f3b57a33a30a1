//! Cross-window request/response protocol.
//!
//! Outbound, a widget posts one [`OutboundEnvelope`] to its parent asking
//! for the graph. Inbound, every window message is classified once into an
//! [`InboundMessage`]; matching against the widget's subscription is
//! deliberately loose (topic, topic list or expected action) because parent
//! pages differ in what they echo back.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::components::force_graph::state::Generation;
use crate::config::WidgetConfig;

/// Envelope action of a data request.
pub const DATA_REQUEST: &str = "DATA_REQUEST";
/// Payload action of a data request, also accepted as a response action.
pub const LOAD_DATA: &str = "load_data";
/// Parent asks every widget to reload.
pub const DATA_REFRESH: &str = "DATA_REFRESH";
/// Parent asks every widget to empty itself.
pub const CLEAR_DATA: &str = "CLEAR_DATA";

/// Key tying a request to its response.
pub fn component_id(config: &WidgetConfig) -> String {
	format!("{}-{}-{}", config.request_id, config.event_name, LOAD_DATA)
}

/// Body of a data request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestPayload {
	pub action: String,
	pub id: String,
	#[serde(rename = "type")]
	pub kind: String,
	pub endpoint: String,
}

/// What is posted to the parent window.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEnvelope {
	#[serde(rename = "type")]
	pub kind: String,
	pub action: String,
	pub payload: RequestPayload,
	pub component_id: String,
	pub config: String,
}

impl OutboundEnvelope {
	/// The `load_data` request for `config`.
	pub fn load_request(config: &WidgetConfig) -> Self {
		Self {
			kind: config.event_name.clone(),
			action: DATA_REQUEST.into(),
			payload: RequestPayload {
				action: LOAD_DATA.into(),
				id: config.request_id.clone(),
				kind: "load".into(),
				endpoint: config.data_url.clone(),
			},
			component_id: component_id(config),
			config: String::new(),
		}
	}

	pub fn to_value(&self) -> Value {
		// Plain strings only, serialisation cannot fail.
		serde_json::to_value(self).unwrap_or(Value::Null)
	}
}

/// Commands a parent can push at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
	Refresh,
	Clear,
}

/// What a matched response carried.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
	Data(Value),
	Error(String),
	/// Neither `data` nor `error`.
	Missing,
}

/// An inbound window message, classified.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
	Control(ControlCommand),
	Response {
		component_id: Option<String>,
		body: ResponseBody,
	},
	/// One of our own requests seen on the way past.
	Echo,
	/// Anything else; logged and dropped.
	Unrecognized,
}

/// Which messages a widget listens to.
#[derive(Clone, Debug, PartialEq)]
pub struct Subscription {
	pub event_name: String,
	pub topics: Vec<String>,
	pub expected_action: String,
}

impl Subscription {
	pub fn for_config(config: &WidgetConfig) -> Self {
		Self {
			event_name: config.event_name.clone(),
			topics: vec![config.event_name.clone()],
			expected_action: LOAD_DATA.into(),
		}
	}

	fn matches(&self, topic: Option<&str>, action: Option<&str>) -> bool {
		topic.is_some_and(|t| t == self.event_name || self.topics.iter().any(|x| x == t))
			|| action == Some(self.expected_action.as_str())
	}
}

/// Normalise raw `MessageEvent.data`: objects pass through, strings are
/// parsed as JSON, everything else is dropped.
pub fn normalize(raw: Value) -> Option<Value> {
	match raw {
		Value::Object(_) => Some(raw),
		Value::String(text) => match serde_json::from_str::<Value>(&text) {
			Ok(value @ Value::Object(_)) => Some(value),
			_ => {
				debug!("incident-viz: ignoring non-JSON string message");
				None
			}
		},
		_ => None,
	}
}

fn field<'a>(message: &'a Value, name: &str) -> Option<&'a Value> {
	message.get(name).filter(|v| !v.is_null())
}

fn text_field<'a>(message: &'a Value, name: &str) -> Option<&'a str> {
	message.get(name).and_then(Value::as_str)
}

/// Classify one message against `subscription`.
///
/// Control actions are honoured whatever the topic or component id.
pub fn classify(message: &Value, subscription: &Subscription) -> InboundMessage {
	if !message.is_object() {
		return InboundMessage::Unrecognized;
	}
	let action = text_field(message, "action");
	match action {
		Some(DATA_REFRESH) => return InboundMessage::Control(ControlCommand::Refresh),
		Some(CLEAR_DATA) => return InboundMessage::Control(ControlCommand::Clear),
		_ => {}
	}

	let topic = text_field(message, "type").or_else(|| text_field(message, "topicName"));
	if !subscription.matches(topic, action) {
		return InboundMessage::Unrecognized;
	}
	if action == Some(DATA_REQUEST) && field(message, "payload").is_some() {
		return InboundMessage::Echo;
	}

	let body = if let Some(data) = field(message, "data") {
		ResponseBody::Data(data.clone())
	} else if let Some(error) = field(message, "error") {
		ResponseBody::Error(match error {
			Value::String(s) => s.clone(),
			other => other.to_string(),
		})
	} else {
		ResponseBody::Missing
	};
	InboundMessage::Response {
		component_id: text_field(message, "componentId").map(str::to_string),
		body,
	}
}

/// A request awaiting its response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
	/// Load the latest request belongs to.
	pub generation: Generation,
}

/// Per-widget registry of outstanding requests, keyed by component id.
///
/// A key is registered on its first request; later requests with the same
/// key only move it to the newer generation.
#[derive(Debug)]
pub struct Gateway {
	subscription: Subscription,
	component_id: String,
	listeners: HashMap<String, PendingRequest>,
}

impl Gateway {
	pub fn new(config: &WidgetConfig) -> Self {
		Self {
			subscription: Subscription::for_config(config),
			component_id: component_id(config),
			listeners: HashMap::new(),
		}
	}

	pub fn subscription(&self) -> &Subscription {
		&self.subscription
	}

	/// Record a request for `generation`. Returns `true` when this is the
	/// first request under the key, i.e. a listener was registered.
	pub fn register(&mut self, generation: Generation) -> bool {
		let mut registered = false;
		let entry = self
			.listeners
			.entry(self.component_id.clone())
			.or_insert_with(|| {
				registered = true;
				PendingRequest { generation }
			});
		entry.generation = generation;
		if registered {
			debug!("incident-viz: listener registered for {}", self.component_id);
		}
		registered
	}

	pub fn pending(&self) -> Option<&PendingRequest> {
		self.listeners.get(&self.component_id)
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	/// Generation a matched response belongs to, if this widget ever asked.
	pub fn route(&self) -> Option<Generation> {
		self.pending().map(|p| p.generation)
	}

	/// Forget all requests.
	pub fn reset(&mut self) {
		self.listeners.clear();
	}
}
