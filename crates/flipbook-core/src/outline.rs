//! Page geometry read straight from PDF bytes
//!
//! The browser renders through pdf.js, but page sizes are cheap to read with
//! lopdf. That is enough to predict the book layout before anything is drawn.

use crate::error::FlipbookError;
use crate::raster::PageSize;
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;

const LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Geometry of one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageOutline {
    /// Page number (1-indexed)
    pub page_num: u32,
    /// MediaBox size in points, before rotation
    pub media: PageSize,
    /// Rotation in degrees (0, 90, 180, 270)
    pub rotation: i32,
}

impl PageOutline {
    /// Size as displayed, with a quarter-turn rotation swapping the axes
    pub fn effective_size(&self) -> PageSize {
        if self.rotation == 90 || self.rotation == 270 {
            PageSize::new(self.media.height, self.media.width)
        } else {
            self.media
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentOutline {
    pub pages: Vec<PageOutline>,
}

impl DocumentOutline {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FlipbookError> {
        if !bytes.starts_with(b"%PDF-") {
            return Err(FlipbookError::DocumentOpen(
                "Not a valid PDF file (missing %PDF- header)".to_string(),
            ));
        }
        let doc = Document::load_mem(bytes)
            .map_err(|e| FlipbookError::DocumentOpen(format!("Failed to parse PDF: {}", e)))?;
        Self::from_document(&doc)
    }

    pub fn from_document(doc: &Document) -> Result<Self, FlipbookError> {
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(FlipbookError::DocumentOpen("PDF has no pages".to_string()));
        }

        let mut outlines = Vec::with_capacity(pages.len());
        for (&page_num, &page_id) in &pages {
            let dict = doc
                .get_object(page_id)
                .and_then(Object::as_dict)
                .map_err(|e| FlipbookError::DocumentOpen(format!(
                    "Page {} is not readable: {}",
                    page_num, e
                )))?;

            let rect = inherited(doc, dict, b"MediaBox")
                .map(|obj| parse_rect(doc, obj))
                .transpose()?
                .unwrap_or(LETTER);
            let rotation = inherited(doc, dict, b"Rotate")
                .and_then(|obj| number(doc, obj).ok())
                .map(|r| (r as i32).rem_euclid(360))
                .unwrap_or(0);

            outlines.push(PageOutline {
                page_num,
                media: PageSize::new(rect[2] - rect[0], rect[3] - rect[1]),
                rotation,
            });
        }

        Ok(Self { pages: outlines })
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn page(&self, page_num: u32) -> Result<&PageOutline, FlipbookError> {
        self.pages
            .iter()
            .find(|p| p.page_num == page_num)
            .ok_or(FlipbookError::InvalidPage {
                page: page_num,
                total: self.page_count(),
            })
    }
}

/// Look a key up on the page, then up the Pages tree
fn inherited<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = dict;
    // Guards against Parent cycles in broken files
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent_id: ObjectId = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_object(parent_id).ok()?.as_dict().ok()?;
    }
    None
}

/// `[x1 y1 x2 y2]`, possibly behind a reference
fn parse_rect(doc: &Document, obj: &Object) -> Result<[f64; 4], FlipbookError> {
    let arr = match obj {
        Object::Array(a) => a,
        Object::Reference(id) => doc
            .get_object(*id)
            .and_then(Object::as_array)
            .map_err(|e| FlipbookError::DocumentOpen(format!("Bad MediaBox reference: {}", e)))?,
        _ => {
            return Err(FlipbookError::DocumentOpen(
                "MediaBox is not an array".to_string(),
            ))
        }
    };

    if arr.len() != 4 {
        return Err(FlipbookError::DocumentOpen(format!(
            "MediaBox has {} elements, expected 4",
            arr.len()
        )));
    }

    let mut values = [0.0f64; 4];
    for (i, obj) in arr.iter().enumerate() {
        values[i] = number(doc, obj)?;
    }
    Ok(values)
}

fn number(doc: &Document, obj: &Object) -> Result<f64, FlipbookError> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(r) => Ok(*r as f64),
        Object::Reference(id) => {
            let resolved = doc
                .get_object(*id)
                .map_err(|e| FlipbookError::DocumentOpen(format!("Failed to resolve: {}", e)))?;
            number(doc, resolved)
        }
        _ => Err(FlipbookError::DocumentOpen(
            "Expected number in rectangle".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn build(pages: &[(i64, i64, Option<i64>)], parent_box: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for &(w, h, rotate) in pages {
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
            };
            if !parent_box {
                page.set("MediaBox", vec![0.into(), 0.into(), w.into(), h.into()]);
            }
            if let Some(r) = rotate {
                page.set("Rotate", r);
            }
            kids.push(doc.add_object(page).into());
        }

        let mut pages_dict = dictionary! {
            "Type" => "Pages",
            "Count" => pages.len() as i64,
            "Kids" => kids,
        };
        if parent_box {
            pages_dict.set("MediaBox", vec![0.into(), 0.into(), 595.into(), 842.into()]);
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_reads_page_boxes() {
        let bytes = build(&[(612, 792, None), (1224, 792, None)], false);
        let outline = DocumentOutline::from_bytes(&bytes).unwrap();

        assert_eq!(outline.page_count(), 2);
        assert_eq!(outline.pages[0].media, PageSize::new(612.0, 792.0));
        assert_eq!(outline.pages[1].media, PageSize::new(1224.0, 792.0));
    }

    #[test]
    fn test_inherits_parent_box() {
        let bytes = build(&[(0, 0, None)], true);
        let outline = DocumentOutline::from_bytes(&bytes).unwrap();
        assert_eq!(outline.pages[0].media, PageSize::new(595.0, 842.0));
    }

    #[test]
    fn test_rotation_swaps_axes() {
        let bytes = build(&[(612, 792, Some(90)), (612, 792, Some(-180))], false);
        let outline = DocumentOutline::from_bytes(&bytes).unwrap();

        assert_eq!(outline.pages[0].rotation, 90);
        assert_eq!(outline.pages[0].effective_size(), PageSize::new(792.0, 612.0));
        assert_eq!(outline.pages[1].rotation, 180);
        assert_eq!(outline.pages[1].effective_size(), PageSize::new(612.0, 792.0));
    }

    #[test]
    fn test_rejects_non_pdf() {
        let result = DocumentOutline::from_bytes(b"hello world");
        assert!(matches!(result, Err(FlipbookError::DocumentOpen(_))));
    }

    #[test]
    fn test_page_lookup() {
        let bytes = build(&[(612, 792, None)], false);
        let outline = DocumentOutline::from_bytes(&bytes).unwrap();
        assert!(outline.page(1).is_ok());
        assert_eq!(
            outline.page(2).unwrap_err(),
            FlipbookError::InvalidPage { page: 2, total: 1 }
        );
    }

    #[test]
    fn test_number_extraction() {
        let doc = Document::with_version("1.5");
        assert_eq!(number(&doc, &Object::Integer(42)).unwrap(), 42.0);
        assert!((number(&doc, &Object::Real(1.5)).unwrap() - 1.5).abs() < 1e-6);
        assert!(number(&doc, &Object::Boolean(true)).is_err());
    }
}
