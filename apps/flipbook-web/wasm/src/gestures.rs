//! Touch input translation and the page-level pinch-zoom guard

use crate::events::EventListener;
use flipbook_core::{TouchPoint, ViewerBounds};
use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, HtmlElement, TouchEvent, TouchList, WheelEvent};

/// Client-space coordinates of every touch in `list`
pub fn touch_points(list: &TouchList) -> Vec<TouchPoint> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|touch| TouchPoint::new(touch.client_x() as f64, touch.client_y() as f64))
        .collect()
}

pub fn viewer_bounds(element: &HtmlElement) -> ViewerBounds {
    let rect = element.get_bounding_client_rect();
    ViewerBounds {
        left: rect.left(),
        top: rect.top(),
        width: rect.width(),
        height: rect.height(),
    }
}

/// Safari's `gesturestart` carries a single client point
fn gesture_point(event: &Event) -> Option<TouchPoint> {
    let x = Reflect::get(event, &JsValue::from_str("clientX")).ok()?.as_f64()?;
    let y = Reflect::get(event, &JsValue::from_str("clientY")).ok()?.as_f64()?;
    Some(TouchPoint::new(x, y))
}

/// Keep the browser's own pinch-zoom away from everything outside the viewer.
///
/// Inside the viewer the gesture controller handles touch pinches, so those
/// events are left alone here.
pub fn install_native_zoom_guard(
    document: &Document,
    viewer: &HtmlElement,
) -> Result<Vec<EventListener>, JsValue> {
    let target: &web_sys::EventTarget = document.as_ref();
    let mut listeners = Vec::with_capacity(4);

    for event_name in ["touchstart", "touchmove"] {
        let viewer = viewer.clone();
        listeners.push(EventListener::active(target, event_name, move |event| {
            let Some(touch) = event.dyn_ref::<TouchEvent>() else {
                return;
            };
            let points = touch_points(&touch.touches());
            if viewer_bounds(&viewer).blocks_native_zoom(&points, false) {
                event.prevent_default();
            }
        })?);
    }

    let gesture_viewer = viewer.clone();
    listeners.push(EventListener::active(target, "gesturestart", move |event| {
        let points: Vec<TouchPoint> = gesture_point(&event).into_iter().collect();
        if viewer_bounds(&gesture_viewer).blocks_native_zoom(&points, true) {
            event.prevent_default();
        }
    })?);

    let wheel_viewer = viewer.clone();
    listeners.push(EventListener::active(target, "wheel", move |event| {
        let Some(wheel) = event.dyn_ref::<WheelEvent>() else {
            return;
        };
        if !wheel.ctrl_key() {
            return;
        }
        let point = TouchPoint::new(wheel.client_x() as f64, wheel.client_y() as f64);
        if viewer_bounds(&wheel_viewer).blocks_native_zoom(&[point], true) {
            event.prevent_default();
        }
    })?);

    Ok(listeners)
}
