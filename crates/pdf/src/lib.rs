//! Geometry extraction and layout reconstruction for court-filed memoranda.
//!
//! A [`Document`] streams [`Page`]s of positioned glyphs out of a PDF;
//! [`layout::reconstruct`] folds them into a [`Token`] stream of paragraphs
//! and headings; [`render::MarkupEmitter`] turns the stream into an HTML
//! fragment.

use std::collections::btree_map;
use std::path::Path;

use thiserror::Error;

use parser::backend::{LopdfBackend, PageId, PdfBackend};

pub mod layout;
pub mod parser;
pub mod render;
pub mod types;

pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// An opened PDF whose pages are extracted on demand.
pub struct Document {
    backend: LopdfBackend,
}

impl Document {
    /// Open and parse the PDF at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let path = path.as_ref();
        log::debug!("opening {}", path.display());
        Ok(Document {
            backend: LopdfBackend::load_path(path)?,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        Ok(Document {
            backend: LopdfBackend::load_bytes(bytes)?,
        })
    }

    pub fn page_count(&self) -> usize {
        self.backend.page_count()
    }

    /// Pages in document order, extracted one at a time as the iterator is
    /// advanced.
    pub fn pages(&self) -> Pages<'_> {
        Pages {
            backend: &self.backend,
            ids: self.backend.pages().into_iter(),
        }
    }
}

/// Streaming page iterator returned by [`Document::pages`].
pub struct Pages<'a> {
    backend: &'a dyn PdfBackend,
    ids: btree_map::IntoIter<u32, PageId>,
}

impl Iterator for Pages<'_> {
    type Item = Result<Page, PdfError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (number, page_id) = self.ids.next()?;
        let page = parser::extract::extract_page(self.backend, number as usize, page_id);
        if let Ok(page) = &page {
            log::debug!("page {}: extracted {} lines", page.number, page.lines.len());
        }
        Some(page)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}
