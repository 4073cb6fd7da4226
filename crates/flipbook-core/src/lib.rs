//! Flipbook core
//!
//! Toolkit-independent logic behind the PDF flipbook viewer: how big pages are
//! rendered, which pages are cut into two halves, how the display sequence and
//! its page-number map are assembled, the pinch/pan state machine and the
//! load/rebuild session. The browser crate only translates events and draws.

pub mod assembler;
pub mod config;
pub mod debounce;
pub mod error;
pub mod gesture;
pub mod layout;
pub mod outline;
pub mod raster;
pub mod session;
pub mod share;
pub mod split;

pub use assembler::{AssembledBook, DisplayPage, PageAssembler, PageIndexMap, PageStatus};
pub use config::{
    FlipSettings, FlipbookConfig, GestureConfig, LayoutConfig, RasterConfig, ShareConfig,
    SizeMode, TimingConfig, ZoomConfig,
};
pub use debounce::Debounce;
pub use error::FlipbookError;
pub use gesture::{GestureController, GesturePhase, TouchPoint, TouchResponse, Transform, ViewerBounds};
pub use layout::BookLayout;
pub use outline::{DocumentOutline, PageOutline};
pub use raster::{density_factor, plan_render, target_height, PageSize, PointerKind, RenderPlan};
pub use session::{BookSummary, FlipbookSession, LoadPhase, RebuildTicket, RebuildTrigger, ResizeAction};
pub use share::{ShareOutcome, SharePlan, ShareStep};
pub use split::{classify_page, split_rects, split_widths, PageLayout, SliceRect, SplitWidths};
