//! Page tree access, inherited attributes, outlines
//!
//! The page tree hangs off Trailer -> Root -> Pages. Interior nodes
//! carry Kids arrays; MediaBox, Resources and Rotate are inherited
//! through Parent links. The document builds a flat page list once, by
//! in-order traversal, and indexes it by page number.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::object::{Dict, Name, ObjRef, Object};
use log::warn;
use std::collections::HashSet;

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub const LETTER: Rect = Rect {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Swap edges so x0 <= x1 and y0 <= y1
    pub fn normalize(self) -> Self {
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// A 2D affine transform, row-major [a b c d e f]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn scale(sx: f64, sy: f64) -> Self {
        Matrix {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }
}

/// A loaded page: the resolved dictionary plus inherited attributes
#[derive(Debug, Clone)]
pub struct Page {
    /// 0-based page index
    pub index: usize,
    pub obj_ref: ObjRef,
    pub dict: Dict,
    pub media_box: Rect,
    /// Rotation normalized to 0, 90, 180 or 270
    pub rotate: i32,
    pub resources: Object,
}

/// The boundary to the content interpreter. `run_page` hands a fully
/// resolved page and its decoded content bytes across; everything past
/// that (drawing commands, rasterization) lives outside this crate.
pub trait Device {
    fn run_page(&mut self, page: &Page, contents: &[u8], ctm: Matrix) -> Result<()>;
}

/// One outline (bookmark) entry
#[derive(Debug, Clone, Default)]
pub struct OutlineItem {
    pub title: Option<String>,
    /// The Dest value, or the A action dictionary's D entry
    pub dest: Object,
    pub children: Vec<OutlineItem>,
}

impl Document {
    /// Build the flat page list once
    fn load_page_tree(&mut self) -> Result<()> {
        if self.pages.is_some() {
            return Ok(());
        }

        let root = self
            .trailer
            .get(&Name::new("Root"))
            .cloned()
            .ok_or_else(|| Error::syntax("document has no Root"))?;
        let catalog = self.resolve_obj(&root)?;
        let pages_ref = catalog
            .get("Pages")
            .and_then(|o| o.as_ref_id())
            .ok_or_else(|| Error::syntax("catalog has no Pages tree"))?;

        let mut list = Vec::new();
        let mut visited: HashSet<i32> = HashSet::new();
        let mut stack = vec![pages_ref];

        while let Some(node_ref) = stack.pop() {
            if !visited.insert(node_ref.num) {
                warn!("page tree cycle at object {}", node_ref.num);
                continue;
            }
            let node = self.resolve_ref(node_ref)?;
            match node.type_name() {
                Some("Pages") => {
                    let kids = self.resolve_obj(node.get("Kids").unwrap_or(&Object::Null))?;
                    let Some(kids) = kids.as_array() else {
                        warn!("Pages node {} has no Kids array", node_ref.num);
                        continue;
                    };
                    for kid in kids.iter().rev() {
                        match kid.as_ref_id() {
                            Some(r) => stack.push(r),
                            None => warn!("ignoring non-reference entry in Kids"),
                        }
                    }
                }
                Some("Page") => list.push(node_ref),
                other => warn!(
                    "object {} in page tree has type {:?}, ignoring",
                    node_ref.num, other
                ),
            }
        }

        self.pages = Some(list);
        Ok(())
    }

    /// Number of pages in the document
    pub fn page_count(&mut self) -> Result<usize> {
        self.load_page_tree()?;
        Ok(self.pages.as_ref().map(|p| p.len()).unwrap_or(0))
    }

    /// References of all pages in order (0-based indexing)
    pub(crate) fn page_refs(&mut self) -> Result<Vec<ObjRef>> {
        self.load_page_tree()?;
        Ok(self.pages.clone().unwrap_or_default())
    }

    /// Load one page with its inherited attributes resolved
    pub fn load_page(&mut self, index: usize) -> Result<Page> {
        self.load_page_tree()?;
        let obj_ref = *self
            .pages
            .as_ref()
            .and_then(|p| p.get(index))
            .ok_or_else(|| Error::syntax(format!("page {} out of range", index)))?;

        let dict = match self.resolve_ref(obj_ref)? {
            Object::Dict(d) => d,
            _ => return Err(Error::syntax(format!("page object {} is not a dictionary", obj_ref.num))),
        };

        let media_box = match self.inherited(&dict, "MediaBox")? {
            Object::Array(a) if a.len() == 4 => self.rect_from_array(&a)?,
            _ => {
                warn!("page {} has no MediaBox, using letter", index);
                Rect::LETTER
            }
        };

        let mut rotate = self
            .inherited(&dict, "Rotate")?
            .as_int()
            .unwrap_or(0)
            .rem_euclid(360) as i32;
        rotate = (rotate / 90) * 90;

        let resources = self.inherited(&dict, "Resources")?;
        if resources.is_null() {
            warn!("page {} has no Resources", index);
        }

        Ok(Page {
            index,
            obj_ref,
            dict,
            media_box: media_box.normalize(),
            rotate,
            resources,
        })
    }

    /// The page's bounding box after rotation
    pub fn bound_page(&mut self, index: usize) -> Result<Rect> {
        let page = self.load_page(index)?;
        let mb = page.media_box;
        if page.rotate == 90 || page.rotate == 270 {
            Ok(Rect::new(0.0, 0.0, mb.height(), mb.width()))
        } else {
            Ok(Rect::new(0.0, 0.0, mb.width(), mb.height()))
        }
    }

    /// Look up an attribute on the page or any ancestor
    fn inherited(&mut self, dict: &Dict, key: &str) -> Result<Object> {
        let key = Name::new(key);
        let mut current = dict.clone();
        let mut visited: HashSet<i32> = HashSet::new();
        loop {
            if let Some(value) = current.get(&key) {
                return self.resolve_obj(&value.clone());
            }
            let Some(parent) = current.get(&Name::new("Parent")).and_then(|o| o.as_ref_id()) else {
                return Ok(Object::Null);
            };
            if !visited.insert(parent.num) {
                return Ok(Object::Null);
            }
            current = match self.resolve_ref(parent)? {
                Object::Dict(d) => d,
                _ => return Ok(Object::Null),
            };
        }
    }

    fn rect_from_array(&mut self, arr: &[Object]) -> Result<Rect> {
        let mut vals = [0.0f64; 4];
        for (i, item) in arr.iter().take(4).enumerate() {
            vals[i] = self.resolve_obj(item)?.as_real().unwrap_or(0.0);
        }
        Ok(Rect::new(vals[0], vals[1], vals[2], vals[3]))
    }

    /// Decoded, concatenated content streams of a page
    pub fn page_contents(&mut self, page: &Page) -> Result<Vec<u8>> {
        let contents = page.dict.get(&Name::new("Contents")).cloned().unwrap_or(Object::Null);
        let mut out = Vec::new();
        match contents {
            Object::Ref(r) => out = self.load_stream(r.num, r.generation)?,
            Object::Array(parts) => {
                for part in parts {
                    match part.as_ref_id() {
                        Some(r) => {
                            out.extend_from_slice(&self.load_stream(r.num, r.generation)?);
                            // Content operators may not straddle stream
                            // boundaries without a separator
                            out.push(b'\n');
                        }
                        None => warn!("ignoring non-reference Contents entry"),
                    }
                }
            }
            Object::Null => {}
            _ => warn!("page {} Contents is neither reference nor array", page.index),
        }
        Ok(out)
    }

    /// Hand a resolved page and its decoded content to a device
    pub fn run_page(&mut self, index: usize, device: &mut dyn Device, ctm: Matrix) -> Result<()> {
        let page = self.load_page(index)?;
        let contents = self.page_contents(&page)?;
        device.run_page(&page, &contents, ctm)
    }

    /// Load the outline (bookmark) tree, if any
    pub fn load_outline(&mut self) -> Result<Vec<OutlineItem>> {
        let root = self.trailer.get(&Name::new("Root")).cloned().unwrap_or(Object::Null);
        let catalog = self.resolve_obj(&root)?;
        let outlines = self.resolve_obj(catalog.get("Outlines").unwrap_or(&Object::Null))?;
        let first = outlines.get("First").cloned();
        match first {
            Some(Object::Ref(r)) => {
                let mut visited = HashSet::new();
                self.load_outline_list(r, &mut visited)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Walk a First/Next sibling chain, recursing into children
    fn load_outline_list(
        &mut self,
        first: ObjRef,
        visited: &mut HashSet<i32>,
    ) -> Result<Vec<OutlineItem>> {
        let mut items = Vec::new();
        let mut cursor = Some(first);

        while let Some(node_ref) = cursor {
            if !visited.insert(node_ref.num) {
                warn!("outline cycle at object {}", node_ref.num);
                break;
            }
            let node = self.resolve_ref(node_ref)?;

            let title = node
                .get("Title")
                .and_then(|o| o.as_string())
                .map(|s| String::from_utf8_lossy(s.as_bytes()).into_owned());

            // Prefer Dest; fall back to the GoTo action's D entry
            let mut dest = node.get("Dest").cloned().unwrap_or(Object::Null);
            if dest.is_null() {
                let action = self.resolve_obj(node.get("A").unwrap_or(&Object::Null))?;
                dest = action.get("D").cloned().unwrap_or(Object::Null);
            }

            let children = match node.get("First").and_then(|o| o.as_ref_id()) {
                Some(child) => self.load_outline_list(child, visited)?,
                None => Vec::new(),
            };

            items.push(OutlineItem {
                title,
                dest,
                children,
            });

            cursor = node.get("Next").and_then(|o| o.as_ref_id());
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::testutil::build_pdf;

    fn two_page_doc() -> Document {
        let data = build_pdf(
            &[
                (1, b"<< /Type /Catalog /Pages 2 0 R /Outlines 6 0 R >>"),
                (
                    2,
                    b"<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [0 0 612 792] >>",
                ),
                (3, b"<< /Type /Page /Parent 2 0 R /Contents 5 0 R >>"),
                (4, b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] /Rotate 90 >>"),
                (5, b"<< /Length 9 >>\nstream\nBT ET q Q\nendstream"),
                (6, b"<< /Type /Outlines /First 7 0 R >>"),
                (7, b"<< /Title (Chapter 1) /Dest [3 0 R /Fit] >>"),
            ],
            "/Root 1 0 R",
        );
        Document::from_bytes(data).unwrap()
    }

    #[test]
    fn test_page_count() {
        let mut doc = two_page_doc();
        assert_eq!(doc.page_count().unwrap(), 2);
    }

    #[test]
    fn test_inherited_media_box() {
        let mut doc = two_page_doc();
        let page = doc.load_page(0).unwrap();
        assert_eq!(page.media_box, Rect::new(0.0, 0.0, 612.0, 792.0));
        // Page 2 overrides the inherited box
        let page = doc.load_page(1).unwrap();
        assert_eq!(page.media_box, Rect::new(0.0, 0.0, 200.0, 100.0));
    }

    #[test]
    fn test_bound_page_rotation() {
        let mut doc = two_page_doc();
        let bounds = doc.bound_page(1).unwrap();
        // 200x100 box rotated 90 degrees presents as 100x200
        assert_eq!(bounds, Rect::new(0.0, 0.0, 100.0, 200.0));
    }

    #[test]
    fn test_page_out_of_range() {
        let mut doc = two_page_doc();
        assert!(doc.load_page(2).is_err());
    }

    #[test]
    fn test_page_contents() {
        let mut doc = two_page_doc();
        let page = doc.load_page(0).unwrap();
        assert_eq!(doc.page_contents(&page).unwrap(), b"BT ET q Q");
    }

    #[test]
    fn test_load_outline() {
        let mut doc = two_page_doc();
        let outline = doc.load_outline().unwrap();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].title.as_deref(), Some("Chapter 1"));
        assert!(!outline[0].dest.is_null());
    }

    #[test]
    fn test_run_page_device_boundary() {
        struct Recorder {
            ran: bool,
            bytes: usize,
        }
        impl Device for Recorder {
            fn run_page(&mut self, page: &Page, contents: &[u8], _ctm: Matrix) -> Result<()> {
                self.ran = true;
                self.bytes = contents.len();
                assert_eq!(page.index, 0);
                Ok(())
            }
        }

        let mut doc = two_page_doc();
        let mut device = Recorder { ran: false, bytes: 0 };
        doc.run_page(0, &mut device, Matrix::IDENTITY).unwrap();
        assert!(device.ran);
        assert_eq!(device.bytes, 9);
    }

    #[test]
    fn test_page_tree_cycle_is_safe() {
        // A Pages node whose Kids point back at it must not hang
        let data = build_pdf(
            &[
                (1, b"<< /Type /Catalog /Pages 2 0 R >>"),
                (2, b"<< /Type /Pages /Kids [2 0 R 3 0 R] /Count 1 >>"),
                (3, b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 10 10] >>"),
            ],
            "/Root 1 0 R",
        );
        let mut doc = Document::from_bytes(data).unwrap();
        assert_eq!(doc.page_count().unwrap(), 1);
    }
}
