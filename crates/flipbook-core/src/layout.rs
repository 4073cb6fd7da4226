//! Book layout prediction
//!
//! Runs the same split and padding rules the renderer uses, over page sizes
//! only, so the final display sequence is known before any page is drawn.

use crate::assembler::{PageAssembler, PageIndexMap};
use crate::config::LayoutConfig;
use crate::outline::DocumentOutline;
use crate::raster::PageSize;
use crate::split::{classify_page, PageLayout};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookLayout {
    pub index_map: PageIndexMap,
    /// Page numbers that will be shown as two halves
    pub spreads: Vec<u32>,
    pub physical_pages: u32,
}

impl BookLayout {
    /// Decide how a page is laid out under `layout`
    pub fn layout_for(page_num: u32, total: u32, size: PageSize, layout: &LayoutConfig) -> PageLayout {
        if !layout.split_landscape {
            return PageLayout::Single;
        }
        classify_page(page_num, total, size, layout.landscape_threshold)
    }

    pub fn plan(outline: &DocumentOutline, layout: &LayoutConfig) -> Self {
        let total = outline.page_count();
        let mut assembler = PageAssembler::new(layout);
        let mut spreads = Vec::new();

        for page in &outline.pages {
            let size = page.effective_size();
            match Self::layout_for(page.page_num, total, size, layout) {
                PageLayout::Single => assembler.push_page(page.page_num, (), size),
                PageLayout::Spread => {
                    let half = PageSize::new(size.width / 2.0, size.height);
                    assembler.push_spread(page.page_num, ((), half), ((), half));
                    spreads.push(page.page_num);
                }
            }
        }

        let book = assembler.finish();
        Self {
            index_map: book.index_map,
            spreads,
            physical_pages: book.physical_pages,
        }
    }

    pub fn display_count(&self) -> usize {
        self.index_map.len()
    }
}
