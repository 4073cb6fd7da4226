use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlipbookError {
    #[error("Failed to open document: {0}")]
    DocumentOpen(String),

    #[error("Failed to render page {page}: {reason}")]
    PageRender { page: u32, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Page {page} is out of range (1-{total})")]
    InvalidPage { page: u32, total: u32 },

    #[error("Layout error: {0}")]
    Layout(String),
}
