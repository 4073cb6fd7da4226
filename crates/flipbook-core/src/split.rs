//! Landscape spread splitting
//!
//! A landscape inner page is usually a two-page spread that was exported as a
//! single sheet. It is cut at the horizontal midpoint so the flip widget can
//! show each half as its own leaf.

use crate::raster::PageSize;
use serde::Serialize;

/// Pixel widths of the two halves of a split bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitWidths {
    pub left: u32,
    pub right: u32,
}

/// Source rectangle of one half, in bitmap pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SliceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// How one source page is laid out in the display sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageLayout {
    Single,
    Spread,
}

impl PageLayout {
    /// Number of display entries this page produces
    pub fn display_count(self) -> usize {
        match self {
            PageLayout::Single => 1,
            PageLayout::Spread => 2,
        }
    }
}

/// Odd widths give the extra column to the right half
pub fn split_widths(width: u32) -> SplitWidths {
    let left = width / 2;
    SplitWidths {
        left,
        right: width - left,
    }
}

/// Left and right source rectangles covering a `width` × `height` bitmap
pub fn split_rects(width: u32, height: u32) -> [SliceRect; 2] {
    let widths = split_widths(width);
    [
        SliceRect {
            x: 0,
            y: 0,
            width: widths.left,
            height,
        },
        SliceRect {
            x: widths.left,
            y: 0,
            width: widths.right,
            height,
        },
    ]
}

/// Decide whether page `page_num` of `total` is shown whole or as a spread.
/// The first and last pages are covers and always stay whole.
pub fn classify_page(page_num: u32, total: u32, native: PageSize, threshold: f64) -> PageLayout {
    if page_num <= 1 || page_num >= total {
        return PageLayout::Single;
    }
    if native.aspect_ratio() > threshold {
        PageLayout::Spread
    } else {
        PageLayout::Single
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 1.05;

    #[test]
    fn test_even_width_splits_evenly() {
        assert_eq!(split_widths(1000), SplitWidths { left: 500, right: 500 });
    }

    #[test]
    fn test_odd_width_extra_column_goes_right() {
        assert_eq!(split_widths(1001), SplitWidths { left: 500, right: 501 });
        assert_eq!(split_widths(1), SplitWidths { left: 0, right: 1 });
    }

    #[test]
    fn test_rects_are_adjacent() {
        let [left, right] = split_rects(1001, 700);
        assert_eq!(left, SliceRect { x: 0, y: 0, width: 500, height: 700 });
        assert_eq!(right, SliceRect { x: 500, y: 0, width: 501, height: 700 });
    }

    #[test]
    fn test_inner_landscape_page_is_spread() {
        let spread = PageSize::new(1224.0, 792.0);
        assert_eq!(classify_page(2, 3, spread, THRESHOLD), PageLayout::Spread);
    }

    #[test]
    fn test_covers_never_split() {
        let spread = PageSize::new(1224.0, 792.0);
        assert_eq!(classify_page(1, 3, spread, THRESHOLD), PageLayout::Single);
        assert_eq!(classify_page(3, 3, spread, THRESHOLD), PageLayout::Single);
        assert_eq!(classify_page(1, 1, spread, THRESHOLD), PageLayout::Single);
    }

    #[test]
    fn test_near_square_page_stays_whole() {
        let nearly_square = PageSize::new(1040.0, 1000.0);
        assert_eq!(classify_page(2, 4, nearly_square, THRESHOLD), PageLayout::Single);
        let portrait = PageSize::new(612.0, 792.0);
        assert_eq!(classify_page(2, 4, portrait, THRESHOLD), PageLayout::Single);
    }

    #[test]
    fn test_display_count() {
        assert_eq!(PageLayout::Single.display_count(), 1);
        assert_eq!(PageLayout::Spread.display_count(), 2);
    }
}
