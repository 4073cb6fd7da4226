//! Canvas surfaces for rendered pages and split halves

use crate::pdf_bridge::PdfPage;
use flipbook_core::{split_rects, DisplayPage, FlipbookError, PageSize, RenderPlan};
use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement};

const PAGE_CANVAS_CLASS: &str = "pageCanvas";

fn to_render_error(page: u32) -> impl Fn(JsValue) -> FlipbookError {
    move |e| FlipbookError::PageRender {
        page,
        reason: crate::pdf_bridge::describe_js_error(&e),
    }
}

/// Opaque canvas of the given pixel size, with its 2D context
pub fn create_canvas(
    document: &Document,
    width: u32,
    height: u32,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue> {
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    canvas.set_class_name(PAGE_CANVAS_CLASS);
    canvas.set_width(width.max(1));
    canvas.set_height(height.max(1));

    // Request an opaque 2D context
    let options = Object::new();
    Reflect::set(&options, &JsValue::from_str("alpha"), &JsValue::FALSE)?;
    let context: CanvasRenderingContext2d = canvas
        .get_context_with_context_options("2d", &options)?
        .ok_or("2D canvas context unavailable")?
        .dyn_into()?;

    Ok((canvas, context))
}

/// Rasterize `page` according to `plan` onto a fresh canvas
pub async fn render_to_canvas(
    document: &Document,
    page: &PdfPage,
    plan: &RenderPlan,
    background: &str,
) -> Result<HtmlCanvasElement, FlipbookError> {
    let page_num = page.page_num();
    let (canvas, context) = create_canvas(document, plan.pixel_width, plan.pixel_height)
        .map_err(to_render_error(page_num))?;

    // Fill the background before pdf.js draws over it
    context.set_fill_style_str(background);
    context.fill_rect(0.0, 0.0, plan.pixel_width as f64, plan.pixel_height as f64);

    page.render(&context, plan.render_scale).await?;
    Ok(canvas)
}

/// Cut a rendered spread into its left and right halves.
///
/// Each half keeps the full height; the display size of a half is its share
/// of the full page's display width.
pub fn split_canvas(
    document: &Document,
    page_num: u32,
    source: &HtmlCanvasElement,
    display: PageSize,
) -> Result<[(HtmlCanvasElement, PageSize); 2], FlipbookError> {
    let width = source.width();
    let height = source.height();
    let rects = split_rects(width, height);

    let half = |rect: &flipbook_core::SliceRect| -> Result<(HtmlCanvasElement, PageSize), JsValue> {
        // Copy this half's source rectangle onto its own canvas
        let (canvas, context) = create_canvas(document, rect.width, rect.height)?;
        context.draw_image_with_html_canvas_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
            source,
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
            0.0,
            0.0,
            rect.width as f64,
            rect.height as f64,
        )?;
        // Display width shrinks by the same fraction as the bitmap
        let size = PageSize::new(
            display.width * rect.width as f64 / width.max(1) as f64,
            display.height,
        );
        Ok((canvas, size))
    };

    let left = half(&rects[0]).map_err(to_render_error(page_num))?;
    let right = half(&rects[1]).map_err(to_render_error(page_num))?;
    Ok([left, right])
}

/// Wrap a display page in the element the flip widget consumes
pub fn page_element(
    document: &Document,
    page: &DisplayPage<HtmlCanvasElement>,
) -> Result<Element, JsValue> {
    let wrapper = document.create_element("div")?;
    match page {
        DisplayPage::Rendered {
            page_num, surface, ..
        } => {
            wrapper.set_class_name("page");
            // Keep the PDF page number on the element for styling and debugging
            wrapper.set_attribute("data-page", &page_num.to_string())?;
            wrapper.append_child(surface)?;
        }
        DisplayPage::Blank => {
            wrapper.set_class_name("page page-blank");
        }
    }
    Ok(wrapper)
}
