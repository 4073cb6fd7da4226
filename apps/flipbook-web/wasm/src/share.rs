//! Share button: native share sheet, then clipboard, then a visible link

use flipbook_core::{ShareConfig, ShareOutcome, SharePlan, ShareStep};
use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{console, Window};

fn method(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}

fn clipboard(window: &Window) -> Option<JsValue> {
    Reflect::get(&window.navigator(), &JsValue::from_str("clipboard"))
        .ok()
        .filter(|value| value.is_object())
}

async fn call_promise(target: &JsValue, function: &Function, arg: &JsValue) -> Result<(), JsValue> {
    let result = function.call1(target, arg)?;
    let promise: Promise = result.dyn_into()?;
    JsFuture::from(promise).await?;
    Ok(())
}

async fn native_share(window: &Window, config: &ShareConfig, url: &str) -> Result<(), JsValue> {
    let navigator: JsValue = window.navigator().into();
    let share = method(&navigator, "share").ok_or("navigator.share unavailable")?;

    let title = window
        .document()
        .map(|d| d.title())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| config.title.clone());

    let data = Object::new();
    Reflect::set(&data, &JsValue::from_str("title"), &JsValue::from_str(&title))?;
    Reflect::set(&data, &JsValue::from_str("text"), &JsValue::from_str(&config.text))?;
    Reflect::set(&data, &JsValue::from_str("url"), &JsValue::from_str(url))?;

    call_promise(&navigator, &share, &data).await
}

async fn copy_link(window: &Window, url: &str) -> Result<(), JsValue> {
    let clipboard = clipboard(window).ok_or("Clipboard unavailable")?;
    let write_text = method(&clipboard, "writeText").ok_or("clipboard.writeText unavailable")?;
    call_promise(&clipboard, &write_text, &JsValue::from_str(url)).await
}

/// Walk the fallback chain until one step works
pub async fn share_page(config: &ShareConfig) -> ShareOutcome {
    let Some(window) = web_sys::window() else {
        return ShareOutcome::LinkShown;
    };
    let url = window.location().href().unwrap_or_default();

    let navigator: JsValue = window.navigator().into();
    let plan = SharePlan::new(
        method(&navigator, "share").is_some(),
        clipboard(&window).is_some(),
    );

    for step in plan.steps() {
        let result = match step {
            ShareStep::Native => native_share(&window, config, &url).await,
            ShareStep::Clipboard => copy_link(&window, &url).await,
            ShareStep::ShowLink => {
                let _ = window.prompt_with_message_and_default("Copy this link:", &url);
                Ok(())
            }
        };

        match result {
            Ok(()) => return step.outcome(),
            Err(e) => {
                console::warn_2(&JsValue::from_str("Share failed:"), &e);
            }
        }
    }

    ShareOutcome::LinkShown
}
