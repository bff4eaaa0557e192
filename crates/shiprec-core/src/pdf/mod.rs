//! Invoice document sources: PDF files and pre-extracted text.

mod extractor;

pub use extractor::PdfExtractor;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PdfError;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Page separator in plain-text extractions.
pub const PAGE_BREAK: char = '\x0c';

/// A rectangle on the page in points, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRegion {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl PageRegion {
    pub const fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self { x0, top, x1, bottom }
    }

    /// Whether a vertical position lies inside the band `[top, bottom]`.
    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.top && y <= self.bottom
    }

    pub fn is_valid(&self) -> bool {
        self.x0 < self.x1 && self.top < self.bottom && self.top >= 0.0
    }
}

/// Anything that can hand out invoice text page by page.
pub trait DocumentSource {
    /// Number of pages. Pages are numbered from 1.
    fn page_count(&self) -> u32;

    /// Text lines of `page` that fall inside `region`.
    fn lines_in_region(&self, page: u32, region: PageRegion) -> Result<Vec<String>>;

    /// All text of the document, used for carrier detection.
    fn full_text(&self) -> Result<String>;
}

/// Already-extracted text, pages separated by form feeds.
///
/// The text carries no coordinates, so regions are not applied.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    pages: Vec<String>,
}

impl TextDocument {
    pub fn new(text: &str) -> Self {
        let pages = text
            .split(PAGE_BREAK)
            .map(str::to_string)
            .collect();
        Self { pages }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| PdfError::TextExtraction(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(&text))
    }
}

impl DocumentSource for TextDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn lines_in_region(&self, page: u32, _region: PageRegion) -> Result<Vec<String>> {
        let text = page
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .ok_or(PdfError::InvalidPage(page))?;
        Ok(text.lines().map(str::to_string).collect())
    }

    fn full_text(&self) -> Result<String> {
        Ok(self.pages.join("\n"))
    }
}

/// Open a document by extension: `.pdf` goes through the PDF extractor,
/// anything else is read as text.
pub fn open_document(path: &Path) -> Result<Box<dyn DocumentSource>> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let data = fs::read(path)
            .map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
        let mut extractor = PdfExtractor::new();
        extractor.load(&data)?;
        Ok(Box::new(extractor))
    } else {
        Ok(Box::new(TextDocument::from_file(path)?))
    }
}
