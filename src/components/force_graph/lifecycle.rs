//! Widget Lifecycle Controller.
//!
//! [`WidgetHandle`] is the typed handle a mount gets back: `init`, `reload`,
//! `clear`, `destroy` and `handle_message`. Everything that touches the
//! browser goes through the [`Host`] trait, so the whole load and message
//! cycle also runs natively against a recording host.
//!
//! Callbacks handed to the host hold only a weak reference to the widget and
//! carry the generation they were issued for. No `RefCell` borrow is held
//! across a host call; a host is free to invoke callbacks synchronously.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, error, info, warn};
use serde_json::Value;

use super::state::{Generation, WidgetState};
use super::types::GraphDocument;
use crate::config::WidgetConfig;
use crate::error::{Result, WidgetError};
use crate::loader::{LoadPlan, PageLocation, document_from_response, document_from_text};
use crate::messaging::{ControlCommand, Gateway, InboundMessage, classify, normalize};

/// Completion callback of [`Host::fetch_text`].
pub type FetchCallback = Box<dyn FnOnce(Result<String>)>;
/// Callback of [`Host::set_timeout`].
pub type TimerCallback = Box<dyn FnOnce()>;

/// Browser side effects a widget needs.
pub trait Host {
	/// Current page location, read fresh on every call.
	fn location(&self) -> PageLocation;
	/// Post `message` to the parent window.
	fn post_to_parent(&self, message: &Value) -> Result<()>;
	/// GET `url` and hand the body (or the failure) to `done`. Non-2xx
	/// answers are reported as [`WidgetError::Http`].
	fn fetch_text(&self, url: &str, done: FetchCallback);
	/// Run `callback` once after `ms` milliseconds.
	fn set_timeout(&self, ms: u32, callback: TimerCallback);
}

struct Shared {
	host: Rc<dyn Host>,
	state: RefCell<WidgetState>,
	gateway: RefCell<Gateway>,
	initialized: Cell<bool>,
	destroyed: Cell<bool>,
	teardown: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Handle to one mounted widget. Cloning shares the widget.
#[derive(Clone)]
pub struct WidgetHandle(Rc<Shared>);

impl WidgetHandle {
	pub fn new(host: Rc<dyn Host>, config: WidgetConfig, width: f64, height: f64) -> Self {
		let gateway = Gateway::new(&config);
		Self(Rc::new(Shared {
			host,
			state: RefCell::new(WidgetState::new(config, width, height)),
			gateway: RefCell::new(gateway),
			initialized: Cell::new(false),
			destroyed: Cell::new(false),
			teardown: RefCell::new(Vec::new()),
		}))
	}

	fn downgrade(&self) -> Weak<Shared> {
		Rc::downgrade(&self.0)
	}

	fn upgrade(weak: &Weak<Shared>) -> Option<Self> {
		weak.upgrade().map(Self)
	}

	/// Run the first load. Later calls do nothing and return `false`.
	pub fn init(&self) -> bool {
		if self.0.initialized.replace(true) || self.is_destroyed() {
			return false;
		}
		info!("incident-viz: widget init");
		self.reload();
		true
	}

	pub fn is_initialized(&self) -> bool {
		self.0.initialized.get()
	}

	pub fn is_destroyed(&self) -> bool {
		self.0.destroyed.get()
	}

	/// Drop the rendered graph and load it again with a freshly chosen
	/// transport.
	pub fn reload(&self) {
		if self.is_destroyed() {
			return;
		}
		let generation = self.0.state.borrow_mut().begin_load();
		self.load(generation);
	}

	/// Stop the engine and empty the widget without reloading.
	pub fn clear(&self) {
		if self.is_destroyed() {
			return;
		}
		self.0.state.borrow_mut().clear();
	}

	/// Register work to run once on [`WidgetHandle::destroy`].
	pub fn on_destroy(&self, teardown: impl FnOnce() + 'static) {
		if self.is_destroyed() {
			teardown();
			return;
		}
		self.0.teardown.borrow_mut().push(Box::new(teardown));
	}

	/// Stop everything and run the registered teardown. Idempotent.
	pub fn destroy(&self) {
		if self.0.destroyed.replace(true) {
			return;
		}
		self.0.state.borrow_mut().clear();
		self.0.gateway.borrow_mut().reset();
		let teardown = std::mem::take(&mut *self.0.teardown.borrow_mut());
		for step in teardown {
			step();
		}
		info!("incident-viz: widget destroyed");
	}

	/// Feed one raw window message (the `data` of a `MessageEvent`).
	pub fn handle_message(&self, raw: Value) {
		if self.is_destroyed() {
			return;
		}
		let Some(message) = normalize(raw) else {
			return;
		};
		let classified = classify(&message, self.0.gateway.borrow().subscription());
		match classified {
			InboundMessage::Control(ControlCommand::Refresh) => {
				info!("incident-viz: DATA_REFRESH received, reloading data");
				self.reload();
			}
			InboundMessage::Control(ControlCommand::Clear) => {
				info!("incident-viz: CLEAR_DATA received, clearing visualization");
				self.clear();
			}
			InboundMessage::Response { component_id, body } => {
				let route = self.0.gateway.borrow().route();
				let Some(generation) = route else {
					debug!("incident-viz: response for {component_id:?} but nothing was requested");
					return;
				};
				debug!("incident-viz: data received from parent for load #{generation}");
				self.deliver(generation, document_from_response(body));
			}
			InboundMessage::Echo => debug!("incident-viz: ignoring own data request"),
			InboundMessage::Unrecognized => debug!("incident-viz: ignoring unrelated message"),
		}
	}

	/// Advance the layout one frame.
	pub fn tick(&self) -> bool {
		if self.is_destroyed() {
			return false;
		}
		self.0.state.borrow_mut().tick()
	}

	pub fn with_state<R>(&self, f: impl FnOnce(&WidgetState) -> R) -> R {
		f(&self.0.state.borrow())
	}

	pub fn with_state_mut<R>(&self, f: impl FnOnce(&mut WidgetState) -> R) -> R {
		f(&mut self.0.state.borrow_mut())
	}

	fn load(&self, generation: Generation) {
		let host = Rc::clone(&self.0.host);
		let location = host.location();
		let config = self.0.state.borrow().config().clone();
		let timeout_ms = location.timeout_ms(&config.timeouts);

		match LoadPlan::choose(&location, &config) {
			LoadPlan::Http { url } => {
				let weak = self.downgrade();
				host.fetch_text(
					&url,
					Box::new(move |result| {
						if let Some(widget) = Self::upgrade(&weak) {
							widget.deliver(generation, result.and_then(|text| document_from_text(&text)));
						}
					}),
				);
			}
			LoadPlan::Message(envelope) => {
				self.0.gateway.borrow_mut().register(generation);
				if let Err(e) = host.post_to_parent(&envelope.to_value()) {
					self.deliver(generation, Err(e));
				}
			}
		}

		let weak = self.downgrade();
		host.set_timeout(
			timeout_ms,
			Box::new(move || {
				if let Some(widget) = Self::upgrade(&weak) {
					widget.expire(generation, timeout_ms);
				}
			}),
		);
	}

	fn deliver(&self, generation: Generation, result: Result<GraphDocument>) {
		if self.is_destroyed() {
			return;
		}
		let mut state = self.0.state.borrow_mut();
		let error = match result {
			Ok(document) => match state.bind(generation, document) {
				Ok(_) => return,
				Err(e) => e,
			},
			Err(e) => e,
		};
		if state.fail(generation, &error) {
			error!("incident-viz: error loading data: {error}");
		}
	}

	fn expire(&self, generation: Generation, waited_ms: u32) {
		if self.is_destroyed() {
			return;
		}
		let mut state = self.0.state.borrow_mut();
		if state.is_pending(generation) {
			warn!("incident-viz: timeout waiting for graph data after {waited_ms}ms");
			state.fail(generation, &WidgetError::Timeout { waited_ms });
		}
	}
}
