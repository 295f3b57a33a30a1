//! [`Host`] implementation backed by the browser window.

use log::debug;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Request, RequestInit, RequestMode, Response, Window};

use super::lifecycle::{FetchCallback, Host, TimerCallback};
use crate::error::{Result, WidgetError};
use crate::loader::PageLocation;

/// The real window.
pub struct BrowserHost {
	window: Window,
}

impl BrowserHost {
	pub fn new() -> Result<Self> {
		let window = web_sys::window().ok_or_else(|| WidgetError::Dom("no window".into()))?;
		Ok(Self { window })
	}
}

impl Host for BrowserHost {
	fn location(&self) -> PageLocation {
		let location = self.window.location();
		PageLocation::parse(
			&location.search().unwrap_or_default(),
			&location.hostname().unwrap_or_default(),
		)
	}

	fn post_to_parent(&self, message: &Value) -> Result<()> {
		// Unframed pages are their own parent.
		let target = self.window.parent()?.unwrap_or_else(|| self.window.clone());
		target.post_message(&to_js(message)?, "*")?;
		debug!("incident-viz: posted {} to parent", message["action"]);
		Ok(())
	}

	fn fetch_text(&self, url: &str, done: FetchCallback) {
		let window = self.window.clone();
		let url = url.to_string();
		spawn_local(async move {
			done(fetch_text(&window, &url).await);
		});
	}

	fn set_timeout(&self, ms: u32, callback: TimerCallback) {
		let callback = Closure::once_into_js(move || callback());
		let scheduled = self
			.window
			.set_timeout_with_callback_and_timeout_and_arguments_0(
				callback.unchecked_ref(),
				i32::try_from(ms).unwrap_or(i32::MAX),
			);
		if let Err(e) = scheduled {
			debug!("incident-viz: setTimeout failed: {e:?}");
		}
	}
}

fn network(error: JsValue) -> WidgetError {
	WidgetError::Network(error.as_string().unwrap_or_else(|| format!("{error:?}")))
}

async fn fetch_text(window: &Window, url: &str) -> Result<String> {
	let init = RequestInit::new();
	init.set_method("GET");
	init.set_mode(RequestMode::Cors);
	let request = Request::new_with_str_and_init(url, &init)?;

	let response: Response = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(network)?
		.dyn_into()?;
	if !response.ok() {
		return Err(WidgetError::Http {
			status: response.status(),
		});
	}
	let body = JsFuture::from(response.text()?).await.map_err(network)?;
	body.as_string()
		.ok_or_else(|| WidgetError::Network("response body is not text".into()))
}

/// Rust JSON into a JS object, via the JSON text form.
pub fn to_js(value: &Value) -> Result<JsValue> {
	let text = serde_json::to_string(value)?;
	Ok(js_sys::JSON::parse(&text)?)
}

/// `MessageEvent.data` into JSON. Strings stay strings; values that do not
/// survive `JSON.stringify` come back as `None`.
pub fn from_js(value: &JsValue) -> Option<Value> {
	if let Some(text) = value.as_string() {
		return Some(Value::String(text));
	}
	let text: String = js_sys::JSON::stringify(value).ok()?.into();
	serde_json::from_str(&text).ok()
}
