//! Fullscreen toggle for the viewer wrapper

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{console, Document, HtmlElement};

pub fn is_fullscreen(document: &Document) -> bool {
    document.fullscreen_element().is_some()
}

async fn await_if_promise(value: JsValue) -> Result<(), JsValue> {
    if let Ok(promise) = value.dyn_into::<js_sys::Promise>() {
        JsFuture::from(promise).await?;
    }
    Ok(())
}

async fn toggle(document: &Document, target: &HtmlElement) -> Result<(), JsValue> {
    if is_fullscreen(document) {
        let exit = js_sys::Reflect::get(document, &JsValue::from_str("exitFullscreen"))?
            .dyn_into::<js_sys::Function>()?;
        await_if_promise(exit.call0(document)?).await
    } else {
        let request = js_sys::Reflect::get(target, &JsValue::from_str("requestFullscreen"))?
            .dyn_into::<js_sys::Function>()?;
        await_if_promise(request.call0(target)?).await
    }
}

/// Enter or leave fullscreen. Failures are logged and otherwise ignored.
pub async fn toggle_fullscreen(document: &Document, target: &HtmlElement) {
    if let Err(e) = toggle(document, target).await {
        console::warn_2(&JsValue::from_str("Fullscreen not available:"), &e);
    }
}
