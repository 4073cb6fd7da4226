//! Display sequence assembly
//!
//! Collects rendered pages (and spread halves) into the ordered list the flip
//! widget consumes, inserting blank leaves so the book opens on a cover and
//! never ends on a dangling single page. A parallel index map remembers which
//! PDF page each display entry came from.

use crate::config::LayoutConfig;
use crate::raster::PageSize;
use serde::Serialize;
use std::fmt;

/// One entry in the display sequence
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayPage<T> {
    Rendered {
        page_num: u32,
        surface: T,
        size: PageSize,
    },
    Blank,
}

impl<T> DisplayPage<T> {
    pub fn is_blank(&self) -> bool {
        matches!(self, DisplayPage::Blank)
    }

    pub fn page_num(&self) -> u32 {
        match self {
            DisplayPage::Rendered { page_num, .. } => *page_num,
            DisplayPage::Blank => 0,
        }
    }
}

/// Display index → PDF page number, 0 for leaves without a page of their own.
///
/// Blank leaves and the right half of a split spread map to 0, so the non-zero
/// entries are exactly `1..=physical_pages` in strictly increasing order. The
/// right half reports its page through the backward scan in `resolve`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageIndexMap(Vec<u32>);

impl PageIndexMap {
    pub fn new(entries: Vec<u32>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[u32] {
        &self.0
    }

    pub fn get(&self, display_index: usize) -> Option<u32> {
        self.0.get(display_index).copied()
    }

    /// Page number to report for a display index.
    ///
    /// Blank leaves borrow the nearest real page, looking backward first and
    /// then forward. Out-of-range indices are clamped to the last entry.
    pub fn resolve(&self, display_index: usize) -> Option<u32> {
        if self.0.is_empty() {
            return None;
        }
        let index = display_index.min(self.0.len() - 1);

        if self.0[index] != 0 {
            return Some(self.0[index]);
        }

        let before = self.0[..index].iter().rev().find(|&&p| p != 0);
        let after = self.0[index + 1..].iter().find(|&&p| p != 0);
        before.or(after).copied()
    }
}

/// "Page p / N" label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageStatus {
    pub page: u32,
    pub total: u32,
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {} / {}", self.page, self.total)
    }
}

/// Finished display sequence
#[derive(Debug, Clone)]
pub struct AssembledBook<T> {
    pub pages: Vec<DisplayPage<T>>,
    pub index_map: PageIndexMap,
    /// Size of the first rendered entry; every leaf is shown at this size
    pub page_size: Option<PageSize>,
    pub physical_pages: u32,
}

impl<T> AssembledBook<T> {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn status_for(&self, display_index: usize) -> Option<PageStatus> {
        self.index_map.resolve(display_index).map(|page| PageStatus {
            page,
            total: self.physical_pages,
        })
    }
}

/// Accumulates display entries while pages are rendered one at a time
#[derive(Debug)]
pub struct PageAssembler<T> {
    pages: Vec<DisplayPage<T>>,
    index: Vec<u32>,
    pad_to_even: bool,
    physical_pages: u32,
}

impl<T> PageAssembler<T> {
    pub fn new(layout: &LayoutConfig) -> Self {
        let mut assembler = Self {
            pages: Vec::new(),
            index: Vec::new(),
            pad_to_even: layout.pad_to_even,
            physical_pages: 0,
        };
        if layout.leading_cover_blank {
            assembler.push_blank();
        }
        assembler
    }

    fn push_blank(&mut self) {
        self.pages.push(DisplayPage::Blank);
        self.index.push(0);
    }

    fn push_entry(&mut self, page_num: u32, surface: T, size: PageSize, mapped: bool) {
        self.pages.push(DisplayPage::Rendered {
            page_num,
            surface,
            size,
        });
        self.index.push(if mapped { page_num } else { 0 });
        self.physical_pages = self.physical_pages.max(page_num);
    }

    /// Add a page shown whole
    pub fn push_page(&mut self, page_num: u32, surface: T, size: PageSize) {
        self.push_entry(page_num, surface, size, true);
    }

    /// Add both halves of a split spread. Only the left half carries the page
    /// number in the index map.
    pub fn push_spread(
        &mut self,
        page_num: u32,
        left: (T, PageSize),
        right: (T, PageSize),
    ) {
        self.push_entry(page_num, left.0, left.1, true);
        self.push_entry(page_num, right.0, right.1, false);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Close the sequence, padding it to an even length if configured
    pub fn finish(mut self) -> AssembledBook<T> {
        if self.pad_to_even && self.pages.len() % 2 == 1 {
            self.push_blank();
        }

        let page_size = self.pages.iter().find_map(|p| match p {
            DisplayPage::Rendered { size, .. } => Some(*size),
            DisplayPage::Blank => None,
        });

        AssembledBook {
            pages: self.pages,
            index_map: PageIndexMap::new(self.index),
            page_size,
            physical_pages: self.physical_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn size(w: f64, h: f64) -> PageSize {
        PageSize::new(w, h)
    }

    fn padded() -> LayoutConfig {
        LayoutConfig::default()
    }

    fn plain() -> LayoutConfig {
        LayoutConfig {
            leading_cover_blank: false,
            pad_to_even: false,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn test_single_page_padded() {
        let mut assembler = PageAssembler::new(&padded());
        assembler.push_page(1, "p1", size(600.0, 800.0));
        let book = assembler.finish();

        assert_eq!(book.len(), 2);
        assert!(book.pages[0].is_blank());
        assert_eq!(book.index_map.entries(), &[0, 1]);
        assert_eq!(book.status_for(0).unwrap().to_string(), "Page 1 / 1");
        assert_eq!(book.status_for(1).unwrap().to_string(), "Page 1 / 1");
    }

    #[test]
    fn test_single_page_plain() {
        let mut assembler = PageAssembler::new(&plain());
        assembler.push_page(1, "p1", size(600.0, 800.0));
        let book = assembler.finish();

        assert_eq!(book.len(), 1);
        assert_eq!(book.index_map.entries(), &[1]);
    }

    #[test]
    fn test_spread_in_middle() {
        let mut assembler = PageAssembler::new(&padded());
        assembler.push_page(1, "p1", size(600.0, 800.0));
        assembler.push_spread(2, ("p2l", size(600.0, 800.0)), ("p2r", size(600.0, 800.0)));
        assembler.push_page(3, "p3", size(600.0, 800.0));
        let book = assembler.finish();

        assert_eq!(book.len(), 6);
        assert_eq!(book.index_map.entries(), &[0, 1, 2, 0, 3, 0]);
        assert!(book.pages[5].is_blank());
        assert!(!book.pages[3].is_blank());
        assert_eq!(book.pages[3].page_num(), 2);
        assert_eq!(book.physical_pages, 3);
        assert_eq!(book.status_for(3).unwrap().to_string(), "Page 2 / 3");
    }

    #[test]
    fn test_page_size_comes_from_first_rendered_entry() {
        let mut assembler = PageAssembler::new(&padded());
        assembler.push_page(1, (), size(500.0, 700.0));
        assembler.push_page(2, (), size(900.0, 700.0));
        let book = assembler.finish();

        assert_eq!(book.page_size, Some(size(500.0, 700.0)));
    }

    #[test]
    fn test_empty_assembler() {
        let book = PageAssembler::<()>::new(&plain()).finish();
        assert!(book.is_empty());
        assert_eq!(book.page_size, None);
        assert_eq!(book.status_for(0), None);
    }

    #[test]
    fn test_resolve_blank_prefers_backward() {
        let map = PageIndexMap::new(vec![0, 1, 2, 3, 0]);
        assert_eq!(map.resolve(0), Some(1));
        assert_eq!(map.resolve(2), Some(2));
        assert_eq!(map.resolve(4), Some(3));
        assert_eq!(map.resolve(99), Some(3));
    }

    #[test]
    fn test_resolve_all_blank() {
        let map = PageIndexMap::new(vec![0, 0]);
        assert_eq!(map.resolve(1), None);
    }

    #[test]
    fn test_resolve_right_half_of_spread() {
        let map = PageIndexMap::new(vec![0, 1, 2, 0, 3, 0]);
        assert_eq!(map.get(3), Some(0));
        assert_eq!(map.resolve(3), Some(2));
        assert_eq!(map.resolve(5), Some(3));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the index map lines up with the sequence and names every page exactly once, in order
        #[test]
        fn index_map_covers_all_pages(
            spreads in proptest::collection::vec(any::<bool>(), 1..60),
            cover in any::<bool>(),
            pad in any::<bool>(),
        ) {
            let layout = LayoutConfig {
                leading_cover_blank: cover,
                pad_to_even: pad,
                ..LayoutConfig::default()
            };
            let mut assembler = PageAssembler::new(&layout);
            let page_size = PageSize::new(600.0, 800.0);
            for (i, &spread) in spreads.iter().enumerate() {
                let page_num = i as u32 + 1;
                if spread {
                    assembler.push_spread(page_num, ((), page_size), ((), page_size));
                } else {
                    assembler.push_page(page_num, (), page_size);
                }
            }
            let book = assembler.finish();

            prop_assert_eq!(book.index_map.len(), book.pages.len());

            let mapped: Vec<u32> = book.index_map.entries().iter().copied().filter(|&p| p != 0).collect();
            prop_assert!(mapped.windows(2).all(|w| w[0] < w[1]));
            let expected: Vec<u32> = (1..=spreads.len() as u32).collect();
            prop_assert_eq!(mapped, expected);

            if pad {
                prop_assert_eq!(book.pages.len() % 2, 0);
            }
        }

        /// Property: every display index resolves to a real page
        #[test]
        fn every_index_resolves(pages in 1u32..40, index in 0usize..100) {
            let mut assembler = PageAssembler::new(&LayoutConfig::default());
            for page_num in 1..=pages {
                assembler.push_page(page_num, (), PageSize::new(1.0, 1.0));
            }
            let book = assembler.finish();
            let status = book.status_for(index).unwrap();
            prop_assert!(status.page >= 1 && status.page <= pages);
            prop_assert_eq!(status.total, pages);
        }
    }
}
