//! Handles to the viewer's page elements

use flipbook_core::{PageStatus, Transform};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlAnchorElement, HtmlElement};

pub const FULLSCREEN_ENTER_ICON: &str = "⛶";
pub const FULLSCREEN_EXIT_ICON: &str = "🞬";

/// Id of the container the live flip widget is mounted in
pub const BOOK_ID: &str = "book";

/// Every element the viewer reads or writes, looked up once by id.
///
/// `#book` is not cached: it is replaced on every rebuild.
#[derive(Clone)]
pub struct Ui {
    pub document: Document,
    pub status: HtmlElement,
    pub book_wrap: HtmlElement,
    pub prev_btn: HtmlElement,
    pub next_btn: HtmlElement,
    pub zoom_in_btn: HtmlElement,
    pub zoom_out_btn: HtmlElement,
    pub fullscreen_btn: HtmlElement,
    pub share_btn: HtmlElement,
    pub download_btn: HtmlAnchorElement,
    pub page_now: HtmlElement,
    pub page_total: HtmlElement,
}

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element #{}", id)))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Element #{} has the wrong type", id)))
}

impl Ui {
    pub fn from_document(document: &Document) -> Result<Self, JsValue> {
        Ok(Self {
            document: document.clone(),
            status: element(document, "status")?,
            book_wrap: element(document, "bookWrap")?,
            prev_btn: element(document, "prevBtn")?,
            next_btn: element(document, "nextBtn")?,
            zoom_in_btn: element(document, "zoomInBtn")?,
            zoom_out_btn: element(document, "zoomOutBtn")?,
            fullscreen_btn: element(document, "fullscreenBtn")?,
            share_btn: element(document, "shareBtn")?,
            download_btn: element(document, "downloadBtn")?,
            page_now: element(document, "pageNow")?,
            page_total: element(document, "pageTotal")?,
        })
    }

    /// Show `message` in place of the book
    pub fn set_status(&self, message: &str) {
        self.status.set_text_content(Some(message));
        self.status.set_hidden(false);
        self.book_wrap.set_hidden(true);
    }

    pub fn show_book(&self) {
        self.status.set_hidden(true);
        self.book_wrap.set_hidden(false);
    }

    fn controls(&self) -> [&HtmlElement; 7] {
        [
            &self.prev_btn,
            &self.next_btn,
            &self.zoom_in_btn,
            &self.zoom_out_btn,
            &self.fullscreen_btn,
            &self.share_btn,
            &*self.download_btn,
        ]
    }

    pub fn set_controls_enabled(&self, enabled: bool) {
        for control in self.controls() {
            let _ = if enabled {
                control.remove_attribute("disabled")
            } else {
                control.set_attribute("disabled", "")
            };
            let _ = control.set_attribute("aria-disabled", if enabled { "false" } else { "true" });
        }
    }

    pub fn set_page_status(&self, status: &PageStatus) {
        self.page_now.set_text_content(Some(&status.page.to_string()));
        self.page_total.set_text_content(Some(&status.total.to_string()));
    }

    pub fn set_fullscreen_icon(&self, is_fullscreen: bool) {
        let icon = if is_fullscreen {
            FULLSCREEN_EXIT_ICON
        } else {
            FULLSCREEN_ENTER_ICON
        };
        self.fullscreen_btn.set_text_content(Some(icon));
    }

    pub fn set_download_href(&self, url: &str) {
        self.download_btn.set_href(url);
    }

    /// The container holding the live flip widget, if there is one
    pub fn book_container(&self) -> Option<HtmlElement> {
        element(&self.document, BOOK_ID).ok()
    }

    /// Empty container next to `#book` that a replacement widget is built in
    pub fn create_book_stage(&self) -> Result<HtmlElement, JsValue> {
        let stage: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        stage.set_class_name("book");
        self.book_wrap.append_child(&stage)?;
        Ok(stage)
    }

    /// Make `stage` the new `#book`, removing the container it replaces
    pub fn promote_book_stage(&self, stage: &HtmlElement) {
        if let Some(previous) = self.book_container() {
            if previous != *stage {
                previous.remove();
            }
        }
        stage.set_id(BOOK_ID);
    }

    /// Throw away a stage whose widget could not be built
    pub fn discard_book_stage(&self, stage: &HtmlElement) {
        stage.remove();
    }

    /// Drop whatever the flip widget left inside `#book`
    pub fn clear_book(&self) {
        if let Some(book) = self.book_container() {
            book.set_inner_html("");
        }
    }

    /// The pinch/pan transform goes on the wrapper so the flip widget's own
    /// layout math is unaffected
    pub fn apply_transform(&self, transform: &Transform) -> Result<(), JsValue> {
        let style = self.book_wrap.style();
        if transform.is_identity() {
            style.remove_property("transform")?;
        } else {
            style.set_property("transform-origin", "center center")?;
            style.set_property("transform", &transform.to_css())?;
        }
        Ok(())
    }

    /// Layout size of the wrapper, ignoring any transform on it
    pub fn container_size(&self) -> (f64, f64) {
        (
            self.book_wrap.offset_width() as f64,
            self.book_wrap.offset_height() as f64,
        )
    }
}
