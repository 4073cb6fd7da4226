//! Browser bindings for the PDF flipbook
//!
//! Pages are rasterized with pdf.js, cut and padded by `flipbook-core`, and
//! handed to St.PageFlip for the page-turn animation.

pub mod canvas;
pub mod events;
pub mod fullscreen;
pub mod gestures;
pub mod page_flip;
pub mod pdf_bridge;
pub mod share;
pub mod ui;
pub mod viewer;

use flipbook_core::{BookLayout, DocumentOutline, FlipbookConfig};
use wasm_bindgen::prelude::*;

pub use viewer::FlipbookViewer;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"Flipbook WASM initialized".into());
}

/// Point pdf.js at its worker before the first `load()`.
/// Uses the pinned CDN worker when `worker_src` is omitted.
#[wasm_bindgen(js_name = initPdfJs)]
pub fn init_pdf_js_with_worker(worker_src: Option<String>) {
    let src = worker_src
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| pdf_bridge::DEFAULT_WORKER_SRC.to_string());
    pdf_bridge::init_pdf_js(&src);
}

/// Predict the book layout (display sequence, split pages) of a PDF from its
/// bytes, without rendering anything
#[wasm_bindgen(js_name = planLayout)]
pub fn plan_layout(bytes: &[u8], config_json: Option<String>) -> Result<JsValue, JsValue> {
    let config = match config_json.as_deref() {
        Some(json) if !json.trim().is_empty() => FlipbookConfig::from_json(json),
        _ => Ok(FlipbookConfig::default()),
    }
    .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let outline = DocumentOutline::from_bytes(bytes).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let layout = BookLayout::plan(&outline, &config.layout);

    serde_wasm_bindgen::to_value(&layout)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Get version information
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
