//! The flipbook controller exported to JavaScript
//!
//! `FlipbookViewer` owns the session, the open document, the flip widget and
//! every DOM listener. Event closures hold weak references back to it, and no
//! `RefCell` borrow is held across an await or a call into the flip widget
//! (which can fire a `flip` event synchronously).

use crate::canvas::{page_element, render_to_canvas, split_canvas};
use crate::events::{set_timeout, EventListener};
use crate::fullscreen::{is_fullscreen, toggle_fullscreen};
use crate::gestures::{install_native_zoom_guard, touch_points};
use crate::page_flip::{flip_event_index, PageFlip, WidgetSettings};
use crate::pdf_bridge::PdfDocument;
use crate::share::share_page;
use crate::ui::Ui;
use flipbook_core::{
    density_factor, plan_render, target_height, AssembledBook, BookLayout, BookSummary,
    FlipbookConfig, FlipbookError, FlipbookSession, PageAssembler, PageLayout, PointerKind,
    RebuildTicket, RebuildTrigger, ResizeAction, SharePlan, TouchPoint, TouchResponse,
};
use js_sys::Array;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{console, Event, HtmlCanvasElement, HtmlElement, KeyboardEvent, TouchEvent, Window};

struct ViewerState {
    session: FlipbookSession,
    document: Option<PdfDocument>,
    flip: Option<PageFlip>,
    flip_listener: Option<Closure<dyn FnMut(JsValue)>>,
}

struct Inner {
    window: Window,
    ui: Ui,
    state: RefCell<ViewerState>,
    listeners: RefCell<Vec<EventListener>>,
}

#[derive(Clone, Copy)]
enum Direction {
    Prev,
    Next,
}

#[derive(Clone, Copy)]
enum TouchStage {
    Start,
    Move,
    End,
}

/// PDF flipbook bound to the page's viewer elements
#[wasm_bindgen]
pub struct FlipbookViewer {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl FlipbookViewer {
    /// Bind to the current page. `config_json` may override any default.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<FlipbookViewer, JsValue> {
        let config = match config_json.as_deref() {
            Some(json) if !json.trim().is_empty() => {
                FlipbookConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?
            }
            _ => FlipbookConfig::default(),
        };

        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        let ui = Ui::from_document(&document)?;

        let inner = Rc::new(Inner {
            window,
            ui,
            state: RefCell::new(ViewerState {
                session: FlipbookSession::new(config),
                document: None,
                flip: None,
                flip_listener: None,
            }),
            listeners: RefCell::new(Vec::new()),
        });

        inner.bind_controls()?;
        inner
            .ui
            .set_fullscreen_icon(is_fullscreen(&inner.ui.document));

        Ok(FlipbookViewer { inner })
    }

    /// Open the configured PDF and build the book. Resolves once the book is
    /// on screen or the failure message is shown.
    pub fn load(&self) -> js_sys::Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.rebuild(RebuildTrigger::InitialLoad).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = flipNext)]
    pub fn flip_next(&self) {
        self.inner.navigate(Direction::Next);
    }

    #[wasm_bindgen(js_name = flipPrev)]
    pub fn flip_prev(&self) {
        self.inner.navigate(Direction::Prev);
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) {
        self.inner.change_zoom(true);
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) {
        self.inner.change_zoom(false);
    }

    /// Current manual zoom level
    pub fn zoom(&self) -> f64 {
        self.inner.state.borrow().session.zoom()
    }

    /// Whether a load or rebuild is in flight
    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.inner.state.borrow().session.is_busy()
    }

    /// Display index the flip widget is showing
    #[wasm_bindgen(js_name = currentIndex)]
    pub fn current_index(&self) -> usize {
        self.inner.state.borrow().session.current_index()
    }

    /// Display-index → physical page map of the current book, or `null`
    #[wasm_bindgen(js_name = indexMap)]
    pub fn index_map(&self) -> Result<JsValue, JsValue> {
        let state = self.inner.state.borrow();
        match state.session.book() {
            Some(book) => serde_wasm_bindgen::to_value(book.index_map.entries())
                .map_err(|e| JsValue::from_str(&e.to_string())),
            None => Ok(JsValue::NULL),
        }
    }

    /// Ask the flip widget to re-measure its container
    #[wasm_bindgen(js_name = refreshLayout)]
    pub fn refresh_layout(&self) {
        self.inner.refresh_layout();
    }

    /// Remove every listener, tear down the widget and release the document
    pub fn destroy(&self) {
        self.inner.destroy();
    }
}

impl Inner {
    fn weak(self: &Rc<Self>) -> Weak<Self> {
        Rc::downgrade(self)
    }

    fn listen<F>(self: &Rc<Self>, target: &web_sys::EventTarget, event: &'static str, handler: F)
        -> Result<(), JsValue>
    where
        F: Fn(&Rc<Inner>, Event) + 'static,
    {
        let weak = self.weak();
        let listener = EventListener::new(target, event, move |event| {
            if let Some(inner) = weak.upgrade() {
                handler(&inner, event);
            }
        })?;
        self.listeners.borrow_mut().push(listener);
        Ok(())
    }

    fn bind_controls(self: &Rc<Self>) -> Result<(), JsValue> {
        let ui = &self.ui;

        self.listen(&ui.prev_btn, "click", |inner, _| inner.navigate(Direction::Prev))?;
        self.listen(&ui.next_btn, "click", |inner, _| inner.navigate(Direction::Next))?;
        self.listen(&ui.zoom_in_btn, "click", |inner, _| inner.change_zoom(true))?;
        self.listen(&ui.zoom_out_btn, "click", |inner, _| inner.change_zoom(false))?;

        self.listen(&ui.fullscreen_btn, "click", |inner, _| {
            if !inner.state.borrow().session.controls_enabled() {
                return;
            }
            let inner = inner.clone();
            spawn_local(async move {
                toggle_fullscreen(&inner.ui.document, &inner.ui.book_wrap).await;
            });
        })?;

        self.listen(&ui.document, "fullscreenchange", |inner, _| {
            inner
                .ui
                .set_fullscreen_icon(is_fullscreen(&inner.ui.document));
            inner.refresh_layout();
        })?;

        self.listen(&ui.share_btn, "click", |inner, _| inner.share())?;

        self.listen(&ui.download_btn, "click", |inner, event| {
            event.stop_propagation();
            if !inner.state.borrow().session.controls_enabled() {
                event.prevent_default();
            }
        })?;

        self.listen(&self.window, "keydown", |inner, event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>().map(|k| k.key()) else {
                return;
            };
            match key.as_str() {
                "ArrowLeft" => inner.navigate(Direction::Prev),
                "ArrowRight" => inner.navigate(Direction::Next),
                _ => {}
            }
        })?;

        self.listen(&self.window, "resize", |inner, _| inner.schedule_resize())?;
        self.listen(&self.window, "orientationchange", |inner, _| {
            inner.schedule_orientation_refresh()
        })?;

        self.bind_gestures()
    }

    fn bind_gestures(self: &Rc<Self>) -> Result<(), JsValue> {
        if !self.state.borrow().session.config().gesture.enabled {
            return Ok(());
        }

        let target: &web_sys::EventTarget = self.ui.book_wrap.as_ref();
        let stages = [
            ("touchstart", TouchStage::Start),
            ("touchmove", TouchStage::Move),
            ("touchend", TouchStage::End),
            ("touchcancel", TouchStage::End),
        ];

        let mut listeners = Vec::with_capacity(stages.len() + 4);
        for (event_name, stage) in stages {
            let weak = self.weak();
            listeners.push(EventListener::capture(target, event_name, move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_touch(stage, &event);
                }
            })?);
        }
        listeners.extend(install_native_zoom_guard(
            &self.ui.document,
            &self.ui.book_wrap,
        )?);

        self.listeners.borrow_mut().extend(listeners);
        Ok(())
    }

    fn on_touch(&self, stage: TouchStage, event: &Event) {
        let Some(touch) = event.dyn_ref::<TouchEvent>() else {
            return;
        };
        let points: Vec<TouchPoint> = touch_points(&touch.touches());

        let (response, transform) = {
            let mut state = self.state.borrow_mut();
            if state.session.is_busy() {
                return;
            }
            let gesture = state.session.gesture_mut();
            let response: TouchResponse = match stage {
                TouchStage::Start => {
                    let (width, height) = self.ui.container_size();
                    gesture.set_container_size(width, height);
                    gesture.touch_start(&points)
                }
                TouchStage::Move => gesture.touch_move(&points),
                TouchStage::End => gesture.touch_end(&points),
            };
            (response, gesture.transform())
        };

        if response.consumed {
            event.prevent_default();
            event.stop_propagation();
        }
        if response.changed {
            if let Err(e) = self.ui.apply_transform(&transform) {
                console::warn_2(&JsValue::from_str("Failed to apply transform:"), &e);
            }
        }
    }

    fn flip(&self) -> Option<PageFlip> {
        self.state.borrow().flip.clone()
    }

    fn navigate(&self, direction: Direction) {
        if !self.state.borrow().session.can_navigate() {
            return;
        }
        let Some(flip) = self.flip() else {
            return;
        };
        match direction {
            Direction::Prev => flip.flip_prev(),
            Direction::Next => flip.flip_next(),
        }
    }

    fn change_zoom(self: &Rc<Self>, zoom_in: bool) {
        let ticket = {
            let mut state = self.state.borrow_mut();
            if zoom_in {
                state.session.zoom_in()
            } else {
                state.session.zoom_out()
            }
        };
        if let Some(ticket) = ticket {
            let inner = self.clone();
            spawn_local(async move { inner.execute(ticket).await });
        }
    }

    fn on_flip_event(&self, event: JsValue) {
        let Some(index) = flip_event_index(&event) else {
            return;
        };
        let status = self.state.borrow_mut().session.on_flip(index);
        if let Some(status) = status {
            self.ui.set_page_status(&status);
        }
    }

    fn schedule_resize(self: &Rc<Self>) {
        let (token, delay) = {
            let mut state = self.state.borrow_mut();
            let delay = state.session.config().timing.resize_debounce_ms;
            (state.session.schedule_resize(), delay)
        };

        let weak = self.weak();
        let scheduled = set_timeout(delay, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let action = inner.state.borrow().session.resize_fired(token);
            inner.apply_resize(action, RebuildTrigger::Resize);
        });
        if let Err(e) = scheduled {
            console::warn_2(&JsValue::from_str("Failed to schedule resize:"), &e);
        }
    }

    /// Orientation changes settle late on some devices, so the layout is
    /// refreshed at each configured delay and only the last one may rebuild.
    fn schedule_orientation_refresh(self: &Rc<Self>) {
        let (token, delays) = {
            let mut state = self.state.borrow_mut();
            let delays = state.session.config().timing.orientation_refresh_ms.clone();
            (state.session.schedule_resize(), delays)
        };

        let last = delays.len().saturating_sub(1);
        for (i, delay) in delays.into_iter().enumerate() {
            let weak = self.weak();
            let scheduled = set_timeout(delay, move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let action = inner.state.borrow().session.resize_fired(token);
                if i == last {
                    inner.apply_resize(action, RebuildTrigger::OrientationChange);
                } else if action.is_some() {
                    inner.refresh_layout();
                }
            });
            if let Err(e) = scheduled {
                console::warn_2(&JsValue::from_str("Failed to schedule orientation refresh:"), &e);
            }
        }
    }

    fn apply_resize(self: &Rc<Self>, action: Option<ResizeAction>, trigger: RebuildTrigger) {
        match action {
            Some(ResizeAction::Rebuild) => {
                let inner = self.clone();
                spawn_local(async move { inner.rebuild(trigger).await });
            }
            Some(ResizeAction::RefreshLayout) => self.refresh_layout(),
            None => {}
        }
    }

    fn refresh_layout(&self) {
        let use_portrait = {
            let state = self.state.borrow();
            state.session.config().flip.use_portrait(self.viewport_width())
        };

        let (width, height) = self.ui.container_size();
        self.state
            .borrow_mut()
            .session
            .gesture_mut()
            .set_container_size(width, height);

        let Some(flip) = self.flip() else {
            return;
        };
        if let Err(e) = flip.refresh_layout(use_portrait) {
            console::warn_2(&JsValue::from_str("Layout refresh failed:"), &e);
        }
    }

    fn share(self: &Rc<Self>) {
        let (config, toast_ms) = {
            let state = self.state.borrow();
            if !state.session.controls_enabled() {
                return;
            }
            let config = state.session.config();
            (config.share.clone(), config.timing.share_toast_ms)
        };

        let inner = self.clone();
        spawn_local(async move {
            let outcome = share_page(&config).await;
            let Some(toast) = SharePlan::toast(outcome) else {
                return;
            };
            inner.ui.set_status(toast);

            let weak = inner.weak();
            let hidden = set_timeout(toast_ms, move || {
                if let Some(inner) = weak.upgrade() {
                    if inner.state.borrow().session.book().is_some() {
                        inner.ui.show_book();
                    }
                }
            });
            if let Err(e) = hidden {
                console::warn_2(&JsValue::from_str("Failed to schedule toast:"), &e);
            }
        });
    }

    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(0.0)
    }

    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|h| h.as_f64())
            .unwrap_or(0.0)
    }

    fn pointer_kind(&self) -> PointerKind {
        let coarse = self
            .window
            .match_media("(pointer: coarse)")
            .ok()
            .flatten()
            .map(|query| query.matches())
            .unwrap_or(false);
        if coarse {
            PointerKind::Coarse
        } else {
            PointerKind::Fine
        }
    }

    async fn rebuild(self: Rc<Self>, trigger: RebuildTrigger) {
        let ticket = self.state.borrow_mut().session.request_rebuild(trigger);
        if let Some(ticket) = ticket {
            self.execute(ticket).await;
        }
    }

    /// Run one accepted rebuild to completion or failure
    async fn execute(self: Rc<Self>, ticket: RebuildTicket) {
        self.ui.set_controls_enabled(false);

        if let Err(err) = self.run_rebuild(&ticket).await {
            console::error_1(&JsValue::from_str(&err.to_string()));
            let (message, has_book) = {
                let mut state = self.state.borrow_mut();
                let message = state.session.fail_rebuild(&ticket, &err);
                (message, state.session.book().is_some() && state.flip.is_some())
            };
            // Keep the previous book on screen if there is one
            if has_book {
                self.ui.show_book();
            } else {
                self.ui.set_status(&message);
            }
        }

        self.ui.set_controls_enabled(true);
    }

    async fn open_document(&self) -> Result<PdfDocument, FlipbookError> {
        if let Some(document) = self.state.borrow().document.clone() {
            return Ok(document);
        }

        let (message, url) = {
            let state = self.state.borrow();
            (state.session.loading_message(), state.session.config().pdf_url.clone())
        };
        self.ui.set_status(&message);

        // Open once, then reuse the handle for every rebuild
        let document = PdfDocument::open(&url).await?;
        self.ui.set_download_href(&url);
        console::log_1(&JsValue::from_str(&format!(
            "Opened {} ({} pages)",
            url,
            document.page_count()
        )));

        self.state.borrow_mut().document = Some(document.clone());
        Ok(document)
    }

    async fn run_rebuild(self: &Rc<Self>, ticket: &RebuildTicket) -> Result<(), FlipbookError> {
        let document = self.open_document().await?;
        let total = document.page_count();

        let config = {
            let mut state = self.state.borrow_mut();
            state.session.document_opened(total);
            state.session.config().clone()
        };

        // Target height follows the viewport, density only adds backing pixels
        let height = target_height(self.viewport_height(), ticket.zoom, &config.raster);
        let density = density_factor(
            self.window.device_pixel_ratio(),
            self.pointer_kind(),
            &config.raster,
        );

        let mut assembler: PageAssembler<HtmlCanvasElement> = PageAssembler::new(&config.layout);
        for page_num in 1..=total {
            // Report progress before each page
            let status = self.state.borrow_mut().session.page_progress(page_num, total);
            self.ui.set_status(&status);

            let page = document.page(page_num).await?;
            let native = page.native_size()?;
            let plan = plan_render(native, height, density);
            let canvas =
                render_to_canvas(&self.ui.document, &page, &plan, &config.raster.background)
                    .await?;

            // Landscape inner pages become two leaves
            match BookLayout::layout_for(page_num, total, native, &config.layout) {
                PageLayout::Single => assembler.push_page(page_num, canvas, plan.display),
                PageLayout::Spread => {
                    let [left, right] =
                        split_canvas(&self.ui.document, page_num, &canvas, plan.display)?;
                    assembler.push_spread(page_num, left, right);
                }
            }
        }

        let book = assembler.finish();
        let summary = BookSummary::from(&book);
        let start = FlipbookSession::start_index(ticket, summary.display_count());

        // The session only adopts the new book once its widget is on screen
        self.install(book, start, &config)
            .map_err(|e| FlipbookError::Layout(crate::pdf_bridge::describe_js_error(&e)))?;
        self.state
            .borrow_mut()
            .session
            .complete_rebuild(ticket, summary)?;

        self.sync_transform();
        if let Some(status) = self.state.borrow().session.status() {
            self.ui.set_page_status(&status);
        }
        Ok(())
    }

    /// Build a flip widget showing `book` and swap it in for the current one.
    ///
    /// The new widget is built in a staging container first. If that fails
    /// the stage is dropped and the current widget stays as it was.
    fn install(
        self: &Rc<Self>,
        book: AssembledBook<HtmlCanvasElement>,
        start: usize,
        config: &FlipbookConfig,
    ) -> Result<(), JsValue> {
        // The widget measures its container, so the wrapper must be visible
        self.ui.show_book();
        let stage = self.ui.create_book_stage()?;

        let flip = match self.build_flip(&stage, &book, start, config) {
            Ok(flip) => flip,
            Err(e) => {
                self.ui.discard_book_stage(&stage);
                return Err(e);
            }
        };

        let weak = self.weak();
        let listener = Closure::wrap(Box::new(move |event: JsValue| {
            if let Some(inner) = weak.upgrade() {
                inner.on_flip_event(event);
            }
        }) as Box<dyn FnMut(JsValue)>);
        flip.on_flip(&listener);

        // Retire the old widget only now that its replacement exists
        self.teardown_flip();
        self.ui.promote_book_stage(&stage);

        let mut state = self.state.borrow_mut();
        state.flip = Some(flip);
        state.flip_listener = Some(listener);
        Ok(())
    }

    fn build_flip(
        &self,
        stage: &HtmlElement,
        book: &AssembledBook<HtmlCanvasElement>,
        start: usize,
        config: &FlipbookConfig,
    ) -> Result<PageFlip, JsValue> {
        // One wrapper element per leaf, in display order
        let items = Array::new();
        for page in &book.pages {
            let element = page_element(&self.ui.document, page)?;
            stage.append_child(&element)?;
            items.push(&element);
        }

        let settings =
            WidgetSettings::new(&config.flip, book.page_size, start, self.viewport_width());
        PageFlip::create(stage, &settings, &items)
    }

    /// Push the container size into the gesture controller and re-apply its transform
    fn sync_transform(&self) {
        let (width, height) = self.ui.container_size();
        let transform = {
            let mut state = self.state.borrow_mut();
            let gesture = state.session.gesture_mut();
            gesture.set_container_size(width, height);
            gesture.transform()
        };
        if let Err(e) = self.ui.apply_transform(&transform) {
            console::warn_2(&JsValue::from_str("Failed to apply transform:"), &e);
        }
    }

    fn teardown_flip(&self) {
        // Take both out first: destroy() may call back into the viewer
        let (flip, listener) = {
            let mut state = self.state.borrow_mut();
            (state.flip.take(), state.flip_listener.take())
        };
        if let Some(flip) = flip {
            if let Err(e) = flip.teardown() {
                console::warn_2(&JsValue::from_str("Flip widget teardown failed:"), &e);
            }
        }
        drop(listener);
    }

    fn destroy(&self) {
        self.listeners.borrow_mut().clear();
        self.state.borrow_mut().session.cancel_scheduled_resize();
        self.teardown_flip();
        self.ui.clear_book();
        if let Some(document) = self.state.borrow_mut().document.take() {
            document.destroy();
        }
    }
}
