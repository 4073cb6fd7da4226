//! DOM event plumbing

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

/// An event listener that is removed again when dropped
pub struct EventListener {
    target: EventTarget,
    event: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    /// Plain bubbling listener
    pub fn new<F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self, JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        Self::with_options(target, event, false, true, handler)
    }

    /// Capture-phase listener that may call `preventDefault`
    pub fn capture<F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self, JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        Self::with_options(target, event, true, false, handler)
    }

    /// Bubbling listener that may call `preventDefault`
    pub fn active<F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self, JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        Self::with_options(target, event, false, false, handler)
    }

    fn with_options<F>(
        target: &EventTarget,
        event: &'static str,
        capture: bool,
        passive: bool,
        handler: F,
    ) -> Result<Self, JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);

        let options = AddEventListenerOptions::new();
        options.set_capture(capture);
        options.set_passive(passive);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;

        Ok(Self {
            target: target.clone(),
            event,
            capture,
            callback,
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.event,
            self.callback.as_ref().unchecked_ref(),
            self.capture,
        );
    }
}

/// Run `f` once after `delay_ms`
pub fn set_timeout<F>(delay_ms: i32, f: F) -> Result<i32, JsValue>
where
    F: FnOnce() + 'static,
{
    let window = web_sys::window().ok_or("No window")?;
    let callback = Closure::once_into_js(f);
    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        delay_ms,
    )
}
