//! PDF.js integration for loading and rasterizing pages in the browser

use flipbook_core::{FlipbookError, PageSize};
use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

// External JavaScript functions from flipbook-bridge.js
#[wasm_bindgen(module = "/www/js/flipbook-bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = initPdfJs)]
    fn init_pdf_js_internal(worker_src: &str);

    #[wasm_bindgen(js_name = openDocument, catch)]
    async fn open_document_internal(url: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = documentPageCount)]
    fn document_page_count(doc: &JsValue) -> u32;

    #[wasm_bindgen(js_name = getPage, catch)]
    async fn get_page_internal(doc: &JsValue, page_num: u32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = pageViewport)]
    fn page_viewport_internal(page: &JsValue, scale: f64) -> JsValue;

    #[wasm_bindgen(js_name = renderPage, catch)]
    async fn render_page_internal(
        page: &JsValue,
        context: &CanvasRenderingContext2d,
        scale: f64,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = cleanupPage)]
    fn cleanup_page_internal(page: &JsValue);

    #[wasm_bindgen(js_name = destroyDocument)]
    fn destroy_document_internal(doc: &JsValue);
}

/// Default pdf.js worker location
pub const DEFAULT_WORKER_SRC: &str =
    "https://cdn.jsdelivr.net/npm/pdfjs-dist@4.10.38/build/pdf.worker.min.js";

/// Point pdf.js at its worker script. Must run before the first open.
pub fn init_pdf_js(worker_src: &str) {
    init_pdf_js_internal(worker_src);
}

/// Best-effort text for a rejected JS promise
pub fn describe_js_error(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    if let Ok(message) = Reflect::get(err, &JsValue::from_str("message")) {
        if let Some(text) = message.as_string() {
            return text;
        }
    }
    format!("{:?}", err)
}

/// An open pdf.js document proxy
#[derive(Clone)]
pub struct PdfDocument {
    proxy: JsValue,
    page_count: u32,
}

impl PdfDocument {
    /// Fetch and decode the document at `url`
    pub async fn open(url: &str) -> Result<Self, FlipbookError> {
        // Let pdf.js fetch and parse the document
        let proxy = open_document_internal(url)
            .await
            .map_err(|e| FlipbookError::DocumentOpen(describe_js_error(&e)))?;

        if proxy.is_undefined() || proxy.is_null() {
            return Err(FlipbookError::DocumentOpen(
                "pdf.js returned no document".to_string(),
            ));
        }

        // An empty document has nothing to show
        let page_count = document_page_count(&proxy);
        if page_count == 0 {
            return Err(FlipbookError::DocumentOpen("PDF has no pages".to_string()));
        }

        Ok(Self { proxy, page_count })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Load page `page_num` (1-indexed)
    pub async fn page(&self, page_num: u32) -> Result<PdfPage, FlipbookError> {
        // Reject out-of-range pages before asking pdf.js
        if page_num < 1 || page_num > self.page_count {
            return Err(FlipbookError::InvalidPage {
                page: page_num,
                total: self.page_count,
            });
        }

        let proxy = get_page_internal(&self.proxy, page_num)
            .await
            .map_err(|e| FlipbookError::PageRender {
                page: page_num,
                reason: describe_js_error(&e),
            })?;

        Ok(PdfPage { proxy, page_num })
    }

    /// Release worker-side resources
    pub fn destroy(&self) {
        destroy_document_internal(&self.proxy);
    }
}

/// A loaded page. Its pdf.js resources are released on drop.
pub struct PdfPage {
    proxy: JsValue,
    page_num: u32,
}

impl PdfPage {
    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    /// Page size at scale 1.0, with the page's own rotation applied
    pub fn native_size(&self) -> Result<PageSize, FlipbookError> {
        // Viewport at scale 1 carries the size in PDF points
        let viewport = page_viewport_internal(&self.proxy, 1.0);
        serde_wasm_bindgen::from_value::<PageSize>(viewport).map_err(|e| {
            FlipbookError::PageRender {
                page: self.page_num,
                reason: format!("Unreadable viewport: {}", e),
            }
        })
    }

    /// Draw the page into `context` at `scale`
    pub async fn render(
        &self,
        context: &CanvasRenderingContext2d,
        scale: f64,
    ) -> Result<(), FlipbookError> {
        // Resolves once pdf.js has finished painting
        render_page_internal(&self.proxy, context, scale)
            .await
            .map(|_| ())
            .map_err(|e| FlipbookError::PageRender {
                page: self.page_num,
                reason: describe_js_error(&e),
            })
    }
}

impl Drop for PdfPage {
    fn drop(&mut self) {
        cleanup_page_internal(&self.proxy);
    }
}
