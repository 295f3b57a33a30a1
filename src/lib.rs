//! incident-viz: embeddable force-directed incident graph.
//!
//! The widget mounts into every `component="graphviz"` element of a page and
//! gets its graph either straight from a local HTTP endpoint (`?local=true`)
//! or by asking the parent window over `postMessage`.

use std::cell::RefCell;
use std::rc::Rc;

use log::{Level, info, warn};
use wasm_bindgen::prelude::*;

pub mod components;
pub mod config;
pub mod error;
pub mod loader;
pub mod messaging;
pub mod mount;

pub use components::force_graph::{GraphDocument, GraphEdge, GraphNode, Host, WidgetHandle};
pub use config::WidgetConfig;
pub use error::{Result, WidgetError};
pub use mount::AppContext;

thread_local! {
	static APP: RefCell<Option<Rc<AppContext>>> = const { RefCell::new(None) };
}

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("incident-viz: logging initialized");
}

/// Install the message listener, mount every widget on the page and keep
/// watching for new ones. Calling it again is harmless.
pub fn start() -> Result<()> {
	if APP.with(|app| app.borrow().is_some()) {
		return Ok(());
	}
	let app = AppContext::new()?;
	app.listen()?;
	let mounted = app.scan()?;
	app.watch()?;
	expose_reload()?;
	info!("incident-viz: started, {mounted} widget(s) mounted");
	APP.with(|slot| *slot.borrow_mut() = Some(app));
	Ok(())
}

/// Publish [`reload`] as `window.Widgets.Widget.reload` for page scripts
/// that do not import the module.
fn expose_reload() -> Result<()> {
	let window = web_sys::window().ok_or_else(|| WidgetError::Dom("no window".into()))?;
	let widgets = js_sys::Reflect::get(&window, &JsValue::from_str("Widgets"))?;
	let widgets = if widgets.is_object() {
		widgets
	} else {
		let created = js_sys::Object::new().into();
		js_sys::Reflect::set(&window, &JsValue::from_str("Widgets"), &created)?;
		created
	};
	let widget = js_sys::Object::new();
	// Lives as long as the page.
	let callback = Closure::<dyn Fn()>::new(reload).into_js_value();
	js_sys::Reflect::set(&widget, &JsValue::from_str("reload"), &callback)?;
	js_sys::Reflect::set(&widgets, &JsValue::from_str("Widget"), &widget)?;
	Ok(())
}

/// Reload every widget on the page.
#[wasm_bindgen]
pub fn reload() {
	let app = APP.with(|app| app.borrow().clone());
	match app {
		Some(app) => app.registry().reload_all(),
		None => warn!("incident-viz: reload() called before start()"),
	}
}
