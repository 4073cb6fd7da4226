//! Load and rebuild orchestration
//!
//! `FlipbookSession` owns everything that outlives a single render pass: the
//! manual zoom level, the gesture transform, the last assembled book and the
//! busy flag. The host drives it through explicit calls (request a rebuild,
//! report progress, complete or fail) while it does the actual awaiting.
//!
//! A rebuild requested while another one is in flight is dropped, not queued.

use crate::assembler::{AssembledBook, PageIndexMap, PageStatus};
use crate::config::{FlipbookConfig, SizeMode};
use crate::debounce::Debounce;
use crate::error::FlipbookError;
use crate::gesture::GestureController;
use crate::raster::PageSize;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadPhase {
    Idle,
    Loading,
    Rendering { current: u32, total: u32 },
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RebuildTrigger {
    InitialLoad,
    ZoomChanged,
    Resize,
    OrientationChange,
}

/// What a debounced resize or orientation change should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResizeAction {
    /// Rasterize again at the new size and rebuild the flip widget
    Rebuild,
    /// Ask the flip widget to re-measure; bitmaps stay as they are
    RefreshLayout,
}

/// Permission to run one rebuild pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RebuildTicket {
    pub id: u64,
    pub trigger: RebuildTrigger,
    /// Manual zoom level to render at
    pub zoom: f64,
    /// Display index to return to once the new book is up
    pub restore_index: usize,
}

/// The parts of an assembled book the session keeps after the surfaces are
/// handed to the flip widget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    pub index_map: PageIndexMap,
    pub page_size: Option<PageSize>,
    pub physical_pages: u32,
}

impl BookSummary {
    pub fn display_count(&self) -> usize {
        self.index_map.len()
    }

    pub fn status_for(&self, display_index: usize) -> Option<PageStatus> {
        self.index_map.resolve(display_index).map(|page| PageStatus {
            page,
            total: self.physical_pages,
        })
    }
}

impl<T> From<&AssembledBook<T>> for BookSummary {
    fn from(book: &AssembledBook<T>) -> Self {
        Self {
            index_map: book.index_map.clone(),
            page_size: book.page_size,
            physical_pages: book.physical_pages,
        }
    }
}

#[derive(Debug)]
pub struct FlipbookSession {
    config: FlipbookConfig,
    phase: LoadPhase,
    busy: bool,
    zoom: f64,
    gesture: GestureController,
    book: Option<BookSummary>,
    current_index: usize,
    has_document: bool,
    viewer_generation: u64,
    next_ticket: u64,
    active_ticket: Option<u64>,
    resize: Debounce,
}

impl FlipbookSession {
    pub fn new(config: FlipbookConfig) -> Self {
        let zoom = config.zoom.initial;
        let gesture = GestureController::new(config.gesture.clone());
        Self {
            config,
            phase: LoadPhase::Idle,
            busy: false,
            zoom,
            gesture,
            book: None,
            current_index: 0,
            has_document: false,
            viewer_generation: 0,
            next_ticket: 0,
            active_ticket: None,
            resize: Debounce::new(),
        }
    }

    pub fn config(&self) -> &FlipbookConfig {
        &self.config
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Buttons are disabled for the whole load/render pass
    pub fn controls_enabled(&self) -> bool {
        !self.busy
    }

    /// Page turns need a built book and no rebuild in flight
    pub fn can_navigate(&self) -> bool {
        !self.busy && self.book.is_some()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn gesture(&self) -> &GestureController {
        &self.gesture
    }

    pub fn gesture_mut(&mut self) -> &mut GestureController {
        &mut self.gesture
    }

    pub fn book(&self) -> Option<&BookSummary> {
        self.book.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn has_document(&self) -> bool {
        self.has_document
    }

    /// Bumped every time a new flip widget replaces the old one
    pub fn viewer_generation(&self) -> u64 {
        self.viewer_generation
    }

    /// Start a rebuild pass, or `None` if one is already running.
    ///
    /// Anything other than the initial load also needs a document that has
    /// already been opened.
    pub fn request_rebuild(&mut self, trigger: RebuildTrigger) -> Option<RebuildTicket> {
        self.start_rebuild(trigger, self.zoom)
    }

    fn start_rebuild(&mut self, trigger: RebuildTrigger, zoom: f64) -> Option<RebuildTicket> {
        if self.busy {
            debug!(?trigger, "rebuild dropped: session busy");
            return None;
        }
        if trigger != RebuildTrigger::InitialLoad && !self.has_document {
            debug!(?trigger, "rebuild dropped: no document");
            return None;
        }

        self.next_ticket += 1;
        let ticket = RebuildTicket {
            id: self.next_ticket,
            trigger,
            zoom,
            restore_index: self.current_index,
        };

        self.busy = true;
        self.active_ticket = Some(ticket.id);
        self.phase = if trigger == RebuildTrigger::InitialLoad {
            LoadPhase::Loading
        } else {
            LoadPhase::Rendering {
                current: 0,
                total: self.book.as_ref().map_or(0, |b| b.physical_pages),
            }
        };

        info!(id = ticket.id, ?trigger, zoom = ticket.zoom, "rebuild started");
        Some(ticket)
    }

    /// The document handle is available
    pub fn document_opened(&mut self, page_count: u32) {
        self.has_document = true;
        self.phase = LoadPhase::Rendering {
            current: 0,
            total: page_count,
        };
    }

    /// Record that page `current` of `total` is being rendered; returns the status line
    pub fn page_progress(&mut self, current: u32, total: u32) -> String {
        self.phase = LoadPhase::Rendering { current, total };
        format!("Rendering page {} / {}…", current, total)
    }

    /// Display index a widget built for `ticket` should open at, given the
    /// number of display entries in the new book.
    pub fn start_index(ticket: &RebuildTicket, display_count: usize) -> usize {
        if display_count == 0 {
            0
        } else {
            ticket.restore_index.min(display_count - 1)
        }
    }

    /// Commit a freshly assembled book once it is on screen.
    ///
    /// Adopts the ticket's zoom level, resets the gesture transform and
    /// returns the display index the new flip widget opened at.
    pub fn complete_rebuild(
        &mut self,
        ticket: &RebuildTicket,
        summary: BookSummary,
    ) -> Result<usize, FlipbookError> {
        self.check_ticket(ticket)?;

        let restore = Self::start_index(ticket, summary.display_count());

        self.gesture.reset();
        self.book = Some(summary);
        self.current_index = restore;
        self.zoom = ticket.zoom;
        self.viewer_generation += 1;
        self.busy = false;
        self.active_ticket = None;
        self.phase = LoadPhase::Ready;

        info!(
            id = ticket.id,
            generation = self.viewer_generation,
            restore,
            "rebuild complete"
        );
        Ok(restore)
    }

    /// Abandon a rebuild. Whatever was on screen before stays there, and so
    /// does the zoom level it was rendered at. Returns the status line to show.
    pub fn fail_rebuild(&mut self, ticket: &RebuildTicket, error: &FlipbookError) -> String {
        warn!(id = ticket.id, %error, "rebuild failed");

        if self.active_ticket == Some(ticket.id) {
            self.busy = false;
            self.active_ticket = None;
        }
        self.phase = if self.book.is_some() {
            LoadPhase::Ready
        } else {
            LoadPhase::Failed
        };
        self.failure_message()
    }

    fn check_ticket(&self, ticket: &RebuildTicket) -> Result<(), FlipbookError> {
        if self.active_ticket != Some(ticket.id) {
            return Err(FlipbookError::Layout(format!(
                "rebuild {} is not the active rebuild",
                ticket.id
            )));
        }
        Ok(())
    }

    /// The flip widget turned to `display_index`
    pub fn on_flip(&mut self, display_index: usize) -> Option<PageStatus> {
        self.current_index = display_index;
        self.status()
    }

    pub fn status(&self) -> Option<PageStatus> {
        self.book
            .as_ref()
            .and_then(|book| book.status_for(self.current_index))
    }

    pub fn zoom_in(&mut self) -> Option<RebuildTicket> {
        self.change_zoom(self.zoom + self.config.zoom.step)
    }

    pub fn zoom_out(&mut self) -> Option<RebuildTicket> {
        self.change_zoom(self.zoom - self.config.zoom.step)
    }

    fn change_zoom(&mut self, requested: f64) -> Option<RebuildTicket> {
        if self.busy || !self.has_document {
            return None;
        }
        // Rounded so repeated steps land exactly on the range ends
        let clamped = (self.config.zoom.clamp(requested) * 1e6).round() / 1e6;
        if (clamped - self.zoom).abs() < 1e-9 {
            return None;
        }
        self.start_rebuild(RebuildTrigger::ZoomChanged, clamped)
    }

    /// Fixed-size widgets need new bitmaps; stretching ones only re-measure
    pub fn resize_action(&self) -> ResizeAction {
        match self.config.flip.size {
            SizeMode::Fixed => ResizeAction::Rebuild,
            SizeMode::Stretch => ResizeAction::RefreshLayout,
        }
    }

    /// A resize event arrived; returns the token the delayed callback must present
    pub fn schedule_resize(&mut self) -> u64 {
        self.resize.schedule()
    }

    /// Invalidate every resize or orientation callback still waiting to fire
    pub fn cancel_scheduled_resize(&mut self) {
        self.resize.cancel();
    }

    /// The debounce delay for `token` elapsed
    pub fn resize_fired(&self, token: u64) -> Option<ResizeAction> {
        if !self.resize.is_current(token) {
            return None;
        }
        Some(self.resize_action())
    }

    pub fn loading_message(&self) -> String {
        "Loading magazine…".to_string()
    }

    pub fn failure_message(&self) -> String {
        format!(
            "Could not load the PDF. Make sure {} exists (case-sensitive) and is a valid PDF.",
            self.config.pdf_url
        )
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Request(RebuildTrigger),
        Complete(usize),
        Fail,
        Flip(usize),
        ZoomIn,
        ZoomOut,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            prop_oneof![
                Just(RebuildTrigger::InitialLoad),
                Just(RebuildTrigger::ZoomChanged),
                Just(RebuildTrigger::Resize),
                Just(RebuildTrigger::OrientationChange),
            ]
            .prop_map(Op::Request),
            (1usize..12).prop_map(Op::Complete),
            Just(Op::Fail),
            (0usize..20).prop_map(Op::Flip),
            Just(Op::ZoomIn),
            Just(Op::ZoomOut),
        ]
    }

    proptest! {
        /// Property: at most one rebuild is ever in flight, the busy flag tracks it,
        /// and the zoom level only moves when a rebuild completes
        #[test]
        fn single_rebuild_in_flight(ops in proptest::collection::vec(op(), 1..60)) {
            let mut session = FlipbookSession::new(FlipbookConfig::default());
            let mut in_flight: Option<RebuildTicket> = None;
            let mut committed_zoom = session.zoom();

            for op in ops {
                match op {
                    Op::Request(trigger) => {
                        let generation = session.viewer_generation();
                        let ticket = session.request_rebuild(trigger);
                        if in_flight.is_some() {
                            prop_assert!(ticket.is_none());
                            prop_assert_eq!(session.viewer_generation(), generation);
                        } else if let Some(ticket) = ticket {
                            if trigger == RebuildTrigger::InitialLoad {
                                session.document_opened(4);
                            }
                            in_flight = Some(ticket);
                        }
                    }
                    Op::ZoomIn | Op::ZoomOut => {
                        let ticket = if matches!(op, Op::ZoomIn) {
                            session.zoom_in()
                        } else {
                            session.zoom_out()
                        };
                        if in_flight.is_some() {
                            prop_assert!(ticket.is_none());
                        } else if let Some(ticket) = ticket {
                            in_flight = Some(ticket);
                        }
                    }
                    Op::Complete(len) => {
                        if let Some(ticket) = in_flight.take() {
                            let entries: Vec<u32> = (1..=len as u32).collect();
                            let restore = session
                                .complete_rebuild(
                                    &ticket,
                                    BookSummary {
                                        index_map: PageIndexMap::new(entries),
                                        page_size: None,
                                        physical_pages: len as u32,
                                    },
                                )
                                .unwrap();
                            prop_assert!(restore < len);
                            committed_zoom = ticket.zoom;
                        }
                    }
                    Op::Fail => {
                        if let Some(ticket) = in_flight.take() {
                            session.fail_rebuild(&ticket, &FlipbookError::Layout("x".to_string()));
                        }
                    }
                    Op::Flip(index) => {
                        session.on_flip(index);
                    }
                }
                prop_assert_eq!(session.is_busy(), in_flight.is_some());
                let zoom = session.zoom();
                prop_assert!((0.75..=1.75).contains(&zoom));
                prop_assert_eq!(zoom, committed_zoom);
            }
        }
    }
}
