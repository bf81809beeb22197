//! pdfwash - PDF object store and syntax washer
//!
//! Parses a PDF's indirect-object graph through its cross-reference
//! index, resolves and caches objects on demand, decodes stream filters
//! (under encryption when the document carries a security handler), and
//! rewrites a garbage-collected, optionally deduplicated and compacted
//! copy of the file.
//!
//! ```no_run
//! use pdfwash::{clean, CleanOptions, Document};
//!
//! let mut doc = Document::open("in.pdf")?;
//! let out = std::fs::File::create("out.pdf")?;
//! let opts = CleanOptions { garbage: 2, ..Default::default() };
//! clean(&mut doc, out, &opts)?;
//! # Ok::<(), pdfwash::Error>(())
//! ```

pub mod clean;
pub mod crypt;
pub mod document;
pub mod error;
pub mod filter;
pub mod lexer;
pub mod object;
pub mod page;
pub mod parser;
pub mod write;
pub mod xref;

pub use clean::{CleanOptions, EXPAND_ALL, EXPAND_FONTS, EXPAND_IMAGES, clean};
pub use document::Document;
pub use error::{Error, Result};
pub use object::{Array, Dict, Name, ObjRef, Object, PdfString};
pub use page::{Device, Matrix, OutlineItem, Page, Rect};

/// The capability surface a document back end offers to a host. PDF is
/// the only back end living in this crate; hosts with other formats
/// implement the same trait and dispatch over it.
pub trait DocumentLike {
    fn needs_password(&self) -> bool;
    fn authenticate(&mut self, password: &str) -> bool;
    fn page_count(&mut self) -> Result<usize>;
    fn load_page(&mut self, index: usize) -> Result<Page>;
    fn bound_page(&mut self, index: usize) -> Result<Rect>;
    fn run_page(&mut self, index: usize, device: &mut dyn Device, ctm: Matrix) -> Result<()>;
}

impl DocumentLike for Document {
    fn needs_password(&self) -> bool {
        Document::needs_password(self)
    }

    fn authenticate(&mut self, password: &str) -> bool {
        Document::authenticate(self, password)
    }

    fn page_count(&mut self) -> Result<usize> {
        Document::page_count(self)
    }

    fn load_page(&mut self, index: usize) -> Result<Page> {
        Document::load_page(self, index)
    }

    fn bound_page(&mut self, index: usize) -> Result<Rect> {
        Document::bound_page(self, index)
    }

    fn run_page(&mut self, index: usize, device: &mut dyn Device, ctm: Matrix) -> Result<()> {
        Document::run_page(self, index, device, ctm)
    }
}
