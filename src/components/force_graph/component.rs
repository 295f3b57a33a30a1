//! Leptos component hosting one widget.
//!
//! The component renders a stage `<div>`; once it is in the DOM an effect
//! builds the SVG shell inside it and starts a `requestAnimationFrame` loop
//! that ticks the layout and syncs the SVG and the shared tooltip. Pointer
//! events are delegated on the stage and resolved to nodes through the
//! `data-node-id` attribute of the node images.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent, WheelEvent};

use super::lifecycle::WidgetHandle;
use super::render::{NODE_ID_ATTRIBUTE, SvgLayer};
use super::simulation::Point;
use super::theme::Theme;
use super::tooltip::TooltipElement;

/// Wheel step, per notch.
const ZOOM_STEP_IN: f64 = 1.1;
const ZOOM_STEP_OUT: f64 = 0.9;
/// Background double-click zoom.
const DOUBLE_CLICK_ZOOM: f64 = 2.0;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Node id under the event target, if the target is a node image.
fn node_id(ev: &MouseEvent) -> Option<String> {
	ev.target()
		.and_then(|t| t.dyn_into::<Element>().ok())
		.and_then(|e| e.get_attribute(NODE_ID_ATTRIBUTE))
}

/// Pointer position relative to the stage's top-left corner.
fn local_point(stage: &Element, ev: &MouseEvent) -> Point {
	let rect = stage.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn page_point(ev: &MouseEvent) -> (f64, f64) {
	(ev.page_x() as f64, ev.page_y() as f64)
}

/// Zoom factor for a wheel step; `None` for purely horizontal scrolls.
fn wheel_factor(delta_y: f64) -> Option<f64> {
	if delta_y > 0.0 {
		Some(ZOOM_STEP_OUT)
	} else if delta_y < 0.0 {
		Some(ZOOM_STEP_IN)
	} else {
		None
	}
}

/// One interactive incident graph.
#[component]
pub fn IncidentGraph(
	handle: WidgetHandle,
	tooltip: Rc<TooltipElement>,
	/// Prefix for element ids inside this widget's SVG.
	#[prop(into)]
	uid: String,
	width: f64,
	height: f64,
) -> impl IntoView {
	let stage_ref = NodeRef::<leptos::html::Div>::new();
	let layer: Rc<RefCell<Option<SvgLayer>>> = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let frame_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));

	let (handle_init, layer_init) = (handle.clone(), layer.clone());
	Effect::new(move |_| {
		if layer_init.borrow().is_some() {
			return;
		}
		let Some(stage) = stage_ref.get() else {
			return;
		};
		let stage: Element = stage.into();
		let Some(document) = web_sys::window().and_then(|w| w.document()) else {
			return;
		};
		let config = handle_init.with_state(|s| s.config().clone());
		match SvgLayer::create(&document, &stage, &config, Theme::default(), &uid, width, height) {
			Ok(svg) => *layer_init.borrow_mut() = Some(svg),
			Err(e) => {
				warn!("incident-viz: failed to build SVG: {e}");
				return;
			}
		}

		let (handle_anim, layer_anim, tooltip_anim) =
			(handle_init.clone(), layer_init.clone(), tooltip.clone());
		let (animate_inner, frame_inner) = (Rc::downgrade(&animate), frame_id.clone());
		let tooltip_revision = Cell::new(u64::MAX);
		*animate.borrow_mut() = Some(Closure::new(move || {
			frame_inner.set(None);
			if handle_anim.is_destroyed() {
				return;
			}
			handle_anim.tick();
			if let Some(ref mut svg) = *layer_anim.borrow_mut() {
				if let Err(e) = handle_anim.with_state(|s| svg.sync(s)) {
					warn!("incident-viz: render failed: {e}");
				}
			}
			handle_anim.with_state(|s| {
				let state = s.tooltip();
				if tooltip_revision.replace(state.revision) != state.revision {
					if let Err(e) = tooltip_anim.apply(state) {
						warn!("incident-viz: tooltip update failed: {e}");
					}
				}
			});
			let Some(animate) = animate_inner.upgrade() else {
				return;
			};
			if let (Some(window), Some(cb)) = (web_sys::window(), animate.borrow().as_ref()) {
				frame_inner.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let (Some(window), Some(cb)) = (web_sys::window(), animate.borrow().as_ref()) {
			frame_id.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}

		// The handle owns the loop from here; destroy cancels and drops it.
		let (animate_owned, frame_owned, layer_owned) =
			(animate.clone(), frame_id.clone(), layer_init.clone());
		handle_init.on_destroy(move || {
			if let (Some(window), Some(id)) = (web_sys::window(), frame_owned.take()) {
				let _ = window.cancel_animation_frame(id);
			}
			animate_owned.borrow_mut().take();
			if let Some(mut svg) = layer_owned.borrow_mut().take() {
				svg.remove();
			}
		});
	});

	let stage_point = move |ev: &MouseEvent| -> Option<Point> {
		let stage: Element = stage_ref.get()?.into();
		Some(local_point(&stage, ev))
	};

	let handle_md = handle.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(at) = stage_point(&ev) else {
			return;
		};
		handle_md.with_state_mut(|s| match node_id(&ev) {
			Some(id) => {
				// Keep the browser from starting a native image drag.
				ev.prevent_default();
				s.drag_start(&id);
			}
			None => s.pan_start(at),
		});
	};

	let handle_mm = handle.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let at = stage_point(&ev);
		let (page_x, page_y) = page_point(&ev);
		handle_mm.with_state_mut(|s| {
			if let Some(at) = at {
				if s.is_dragging() {
					let to = s.to_layout(at);
					s.drag_move(to);
				} else if s.is_panning() {
					s.pan_move(at);
				}
			}
			s.pointer_move(page_x, page_y);
		});
	};

	let handle_mu = handle.clone();
	let on_mouseup = move |_: MouseEvent| {
		handle_mu.with_state_mut(|s| {
			s.drag_end();
			s.pan_end();
		});
	};

	let handle_ml = handle.clone();
	let on_mouseleave = move |_: MouseEvent| {
		handle_ml.with_state_mut(|s| {
			s.drag_end();
			s.pan_end();
			s.hover_end();
		});
	};

	let handle_click = handle.clone();
	let on_click = move |ev: MouseEvent| {
		handle_click.with_state_mut(|s| match node_id(&ev) {
			Some(id) => s.click_node(&id),
			None => s.click_background(),
		});
	};

	let handle_dbl = handle.clone();
	let on_dblclick = move |ev: MouseEvent| {
		ev.prevent_default();
		match node_id(&ev) {
			Some(id) => handle_dbl.with_state_mut(|s| s.double_click_node(&id)),
			None => {
				if let Some(at) = stage_point(&ev) {
					handle_dbl.with_state_mut(|s| s.zoom_at(at, DOUBLE_CLICK_ZOOM));
				}
			}
		}
	};

	let handle_over = handle.clone();
	let on_mouseover = move |ev: MouseEvent| {
		if let Some(id) = node_id(&ev) {
			let (page_x, page_y) = page_point(&ev);
			handle_over.with_state_mut(|s| s.hover(&id, page_x, page_y));
		}
	};

	let handle_out = handle.clone();
	let on_mouseout = move |ev: MouseEvent| {
		if node_id(&ev).is_some() {
			handle_out.with_state_mut(|s| s.hover_end());
		}
	};

	let handle_wh = handle;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(at) = stage_point(&ev) else {
			return;
		};
		let Some(factor) = wheel_factor(ev.delta_y()) else {
			return;
		};
		handle_wh.with_state_mut(|s| s.zoom_at(at, factor));
	};

	view! {
		<div
			node_ref=stage_ref
			class="incident-viz-stage"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:click=on_click
			on:dblclick=on_dblclick
			on:mouseover=on_mouseover
			on:mouseout=on_mouseout
			on:wheel=on_wheel
			style="position: relative; width: 100%; height: 100%;"
		/>
	}
}
