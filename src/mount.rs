//! Mount contract and page-wide wiring.
//!
//! A widget activates on every element carrying `component="graphviz"`.
//! Activation marks the element, so scanning the same element again does
//! nothing. The [`AppContext`] owns what all widgets of a page share: the
//! single inbound `message` listener, the tooltip and the registry that
//! fans messages and `reload()` out to every live widget.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use log::{debug, info, warn};
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, MessageEvent, MutationObserver, MutationObserverInit};

use crate::components::force_graph::{
	BrowserHost, Host, IncidentGraph, Theme, TooltipElement, WidgetHandle, from_js,
	tooltip::SharedSlot,
};
use crate::config::{CONFIG_ATTRIBUTE, WidgetConfig};
use crate::error::{Result, WidgetError};

/// Selector of elements a widget mounts into.
pub const COMPONENT_SELECTOR: &str = r#"[component="graphviz"]"#;
/// Set on an element once a widget lives in it.
pub const INITIALIZED_ATTRIBUTE: &str = "data-widget-initialized";

/// Live widgets of a page, by mount id.
#[derive(Default)]
pub struct WidgetRegistry {
	widgets: RefCell<Vec<(u32, WidgetHandle)>>,
	next_id: Cell<u32>,
}

impl WidgetRegistry {
	/// Add a widget and return its mount id.
	pub fn insert(&self, handle: WidgetHandle) -> u32 {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		self.widgets.borrow_mut().push((id, handle));
		id
	}

	pub fn remove(&self, id: u32) -> Option<WidgetHandle> {
		let mut widgets = self.widgets.borrow_mut();
		let position = widgets.iter().position(|(key, _)| *key == id)?;
		Some(widgets.remove(position).1)
	}

	pub fn get(&self, id: u32) -> Option<WidgetHandle> {
		self.widgets
			.borrow()
			.iter()
			.find(|(key, _)| *key == id)
			.map(|(_, handle)| handle.clone())
	}

	pub fn len(&self) -> usize {
		self.widgets.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.widgets.borrow().is_empty()
	}

	/// Snapshot, so widgets may unregister while being visited.
	fn handles(&self) -> Vec<WidgetHandle> {
		self.widgets.borrow().iter().map(|(_, h)| h.clone()).collect()
	}

	/// Hand one inbound message to every widget.
	pub fn broadcast(&self, message: &Value) {
		for handle in self.handles() {
			handle.handle_message(message.clone());
		}
	}

	/// Reload every widget.
	pub fn reload_all(&self) {
		let handles = self.handles();
		info!("incident-viz: reload requested for {} widget(s)", handles.len());
		for handle in handles {
			handle.reload();
		}
	}
}

/// Everything a page's widgets share.
pub struct AppContext {
	document: Document,
	host: Rc<BrowserHost>,
	registry: Rc<WidgetRegistry>,
	tooltip: SharedSlot<TooltipElement>,
	hosts: RefCell<HashMap<u32, HtmlElement>>,
	listener: RefCell<Option<Closure<dyn FnMut(MessageEvent)>>>,
	observer: RefCell<Option<(MutationObserver, Closure<dyn FnMut()>)>>,
}

impl AppContext {
	pub fn new() -> Result<Rc<Self>> {
		let host = BrowserHost::new()?;
		let document = web_sys::window()
			.and_then(|w| w.document())
			.ok_or_else(|| WidgetError::Dom("no document".into()))?;
		Ok(Rc::new(Self {
			document,
			host: Rc::new(host),
			registry: Rc::new(WidgetRegistry::default()),
			tooltip: SharedSlot::default(),
			hosts: RefCell::new(HashMap::new()),
			listener: RefCell::new(None),
			observer: RefCell::new(None),
		}))
	}

	pub fn registry(&self) -> &WidgetRegistry {
		&self.registry
	}

	/// Install the page-wide `message` listener. Must run before the first
	/// mount so no response can slip past.
	pub fn listen(self: &Rc<Self>) -> Result<()> {
		if self.listener.borrow().is_some() {
			return Ok(());
		}
		let registry = Rc::downgrade(&self.registry);
		let callback = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
			let Some(registry) = registry.upgrade() else {
				return;
			};
			match from_js(&ev.data()) {
				Some(message) => registry.broadcast(&message),
				None => debug!("incident-viz: dropping message without JSON data"),
			}
		});
		let window = web_sys::window().ok_or_else(|| WidgetError::Dom("no window".into()))?;
		window.add_event_listener_with_callback("message", callback.as_ref().unchecked_ref())?;
		*self.listener.borrow_mut() = Some(callback);
		Ok(())
	}

	/// Mount into every marked element that has no widget yet.
	pub fn scan(self: &Rc<Self>) -> Result<usize> {
		let found = self.document.query_selector_all(COMPONENT_SELECTOR)?;
		let mut mounted = 0;
		for i in 0..found.length() {
			let Some(element) = found.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) else {
				continue;
			};
			if element.has_attribute(INITIALIZED_ATTRIBUTE) {
				continue;
			}
			match self.mount(element) {
				Ok(_) => mounted += 1,
				Err(e) => warn!("incident-viz: mount failed: {e}"),
			}
		}
		Ok(mounted)
	}

	/// Destroy widgets whose element left the document.
	fn sweep(&self) {
		let gone: Vec<u32> = self
			.hosts
			.borrow()
			.iter()
			.filter(|(_, element)| !element.is_connected())
			.map(|(id, _)| *id)
			.collect();
		for id in gone {
			if let Some(handle) = self.registry.get(id) {
				handle.destroy();
			}
		}
	}

	/// Mount one widget into `element`.
	pub fn mount(self: &Rc<Self>, element: HtmlElement) -> Result<WidgetHandle> {
		element.set_attribute(INITIALIZED_ATTRIBUTE, "true")?;

		let config = WidgetConfig::from_attribute(element.get_attribute(CONFIG_ATTRIBUTE).as_deref());
		let width = match element.client_width() {
			w if w > 0 => w as f64,
			_ => config.width,
		};
		let height = match element.client_height() {
			h if h > 0 => h as f64,
			_ => config.height,
		};

		let document = self.document.clone();
		let tooltip = self
			.tooltip
			.acquire(|| TooltipElement::create(&document, &Theme::default()))?;

		let host: Rc<dyn Host> = self.host.clone();
		let handle = WidgetHandle::new(host, config, width, height);
		let id = self.registry.insert(handle.clone());
		self.hosts.borrow_mut().insert(id, element.clone());
		info!("incident-viz: mounting widget #{id} ({width}x{height})");

		let (view_handle, uid) = (handle.clone(), format!("w{id}"));
		let unmount = leptos::mount::mount_to(element.clone(), move || {
			view! {
				<IncidentGraph
					handle=view_handle
					tooltip=tooltip
					uid=uid
					width=width
					height=height
				/>
			}
		});

		let context: Weak<Self> = Rc::downgrade(self);
		handle.on_destroy(move || {
			drop(unmount);
			let _ = element.remove_attribute(INITIALIZED_ATTRIBUTE);
			if let Some(context) = context.upgrade() {
				context.registry.remove(id);
				context.hosts.borrow_mut().remove(&id);
			}
		});

		handle.init();
		Ok(handle)
	}

	/// Mount into marked elements added later, and destroy widgets whose
	/// element is removed.
	pub fn watch(self: &Rc<Self>) -> Result<()> {
		if self.observer.borrow().is_some() {
			return Ok(());
		}
		let context = Rc::downgrade(self);
		let callback = Closure::<dyn FnMut()>::new(move || {
			let Some(context) = context.upgrade() else {
				return;
			};
			context.sweep();
			if let Err(e) = context.scan() {
				warn!("incident-viz: rescan failed: {e}");
			}
		});
		let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
		let options = MutationObserverInit::new();
		options.set_child_list(true);
		options.set_subtree(true);
		let root = self
			.document
			.body()
			.ok_or_else(|| WidgetError::Dom("document has no body".into()))?;
		observer.observe_with_options(&root, &options)?;
		*self.observer.borrow_mut() = Some((observer, callback));
		Ok(())
	}
}
