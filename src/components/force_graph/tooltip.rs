//! Hover tooltip: JSON syntax highlighting and the page-wide tooltip element.
//!
//! All widgets on a page share one floating tooltip. The page context keeps
//! only a weak reference in a [`SharedSlot`]; each mounted widget holds a
//! strong one, so the element disappears with the last widget.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use web_sys::{Document, HtmlElement};
use wasm_bindgen::JsCast;

use super::state::TooltipState;
use super::theme::Theme;
use crate::error::{Result, WidgetError};

/// DOM id of the shared tooltip.
pub const TOOLTIP_ID: &str = "widget-tooltip";
const TOOLTIP_CLASS: &str = "tooltip incident-viz-tooltip";

static JSON_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(
		r#"("(\\u[a-zA-Z0-9]{4}|\\[^u]|[^\\"])*"(\s*:)?|\b(true|false|null)\b|-?\d+(?:\.\d*)?(?:[eE][+\-]?\d+)?)"#,
	)
	.unwrap()
});

/// Pretty-print `value` as HTML with each token wrapped in a
/// `<span class="key|string|number|boolean|null">`.
pub fn syntax_highlight(value: &Value) -> String {
	let Ok(json) = serde_json::to_string_pretty(value) else {
		return String::new();
	};
	let escaped = json
		.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;");

	JSON_TOKEN_RE
		.replace_all(&escaped, |caps: &Captures| {
			let token = &caps[0];
			let class = if token.starts_with('"') {
				if token.ends_with(':') { "key" } else { "string" }
			} else if token == "true" || token == "false" {
				"boolean"
			} else if token == "null" {
				"null"
			} else {
				"number"
			};
			format!(r#"<span class="{class}">{token}</span>"#)
		})
		.into_owned()
}

/// Lazily created, reference-counted shared resource.
pub struct SharedSlot<T> {
	slot: RefCell<Weak<T>>,
}

impl<T> Default for SharedSlot<T> {
	fn default() -> Self {
		Self {
			slot: RefCell::new(Weak::new()),
		}
	}
}

impl<T> SharedSlot<T> {
	/// The live instance, or a new one from `create`.
	pub fn acquire(&self, create: impl FnOnce() -> Result<T>) -> Result<Rc<T>> {
		if let Some(existing) = self.slot.borrow().upgrade() {
			return Ok(existing);
		}
		let fresh = Rc::new(create()?);
		*self.slot.borrow_mut() = Rc::downgrade(&fresh);
		Ok(fresh)
	}

	/// Number of holders of the live instance.
	pub fn holders(&self) -> usize {
		self.slot.borrow().strong_count()
	}
}

/// The floating tooltip `<div>` plus its highlight stylesheet.
pub struct TooltipElement {
	element: HtmlElement,
	stylesheet: HtmlElement,
}

impl TooltipElement {
	/// Create the tooltip and append it to `<body>`.
	pub fn create(document: &Document, theme: &Theme) -> Result<Self> {
		let body = document
			.body()
			.ok_or_else(|| WidgetError::Dom("document has no body".into()))?;

		let element: HtmlElement = document.create_element("div")?.unchecked_into();
		element.set_id(TOOLTIP_ID);
		element.set_class_name(TOOLTIP_CLASS);
		let tooltip = &theme.tooltip;
		let style = element.style();
		for (name, value) in [
			("display", "block"),
			("position", "absolute"),
			("z-index", "10"),
			("pointer-events", "none"),
			("background-color", tooltip.fill.as_str()),
			("border", "solid"),
			("border-width", tooltip.border_width.as_str()),
			("border-color", tooltip.border_color.as_str()),
			("border-radius", tooltip.corner.as_str()),
			("color", tooltip.text_color.as_str()),
			("font-size", tooltip.text_size.as_str()),
			("padding", tooltip.padding.as_str()),
			("max-width", tooltip.max_width.as_str()),
			("overflow-x", "auto"),
			("opacity", "0"),
		] {
			style.set_property(name, value)?;
		}

		let stylesheet: HtmlElement = document.create_element("style")?.unchecked_into();
		stylesheet.set_text_content(Some(&theme.highlight_css(".incident-viz-tooltip")));

		body.append_child(&stylesheet)?;
		body.append_child(&element)?;
		Ok(Self { element, stylesheet })
	}

	/// Bring the element in line with `state`, fading over the state's
	/// transition time.
	pub fn apply(&self, state: &TooltipState) -> Result<()> {
		let style = self.element.style();
		style.set_property("transition", &format!("opacity {}ms", state.fade_ms()))?;
		if state.visible {
			self.element.set_inner_html(&format!("<pre>{}</pre>", state.html));
			style.set_property("left", &format!("{}px", state.left))?;
			style.set_property("top", &format!("{}px", state.top))?;
			style.set_property("opacity", "0.8")?;
		} else {
			style.set_property("opacity", "0")?;
		}
		Ok(())
	}
}

impl Drop for TooltipElement {
	fn drop(&mut self) {
		self.element.remove();
		self.stylesheet.remove();
	}
}
