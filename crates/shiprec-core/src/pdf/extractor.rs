//! PDF text extraction using lopdf and pdf-extract.

use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{DocumentSource, PageRegion, Result};
use crate::error::PdfError;

/// US Letter height, used when a page has no readable MediaBox.
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// PDF text extractor.
///
/// lopdf yields page text without positions, so a region is applied as a
/// vertical band: each line is placed at its proportional height on the page
/// and kept when that height lies between the region's top and bottom.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Load a PDF from bytes, decrypting empty-password files.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads the bytes again, so keep the decrypted copy.
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document()?
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Page height from the MediaBox, following `Parent` links for inherited boxes.
    fn page_height(&self, doc: &Document, node_id: ObjectId) -> Option<f32> {
        let dict = doc.get_object(node_id).ok()?.as_dict().ok()?;

        if let Ok(media_box) = dict.get(b"MediaBox") {
            let (_, media_box) = doc.dereference(media_box).ok()?;
            let coords: Vec<f32> = media_box
                .as_array()
                .ok()?
                .iter()
                .filter_map(|o| o.as_float().ok())
                .collect();
            if let [_, y0, _, y1] = coords[..] {
                return Some((y1 - y0).abs());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_height(doc, *parent_id),
            _ => None,
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the lines whose proportional position falls inside `region`.
fn band(lines: Vec<String>, page_height: f32, region: PageRegion) -> Vec<String> {
    let count = lines.len() as f32;
    lines
        .into_iter()
        .enumerate()
        .filter(|(i, _)| region.contains_y((*i as f32 + 0.5) / count * page_height))
        .map(|(_, line)| line)
        .collect()
}

impl DocumentSource for PdfExtractor {
    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn lines_in_region(&self, page: u32, region: PageRegion) -> Result<Vec<String>> {
        let doc = self.document()?;
        let page_id = self.page_id(page)?;

        let text = doc
            .extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        let lines: Vec<String> = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();

        let height = self.page_height(doc, page_id).unwrap_or(DEFAULT_PAGE_HEIGHT);
        let kept = band(lines, height, region);
        trace!("Page {}: {} lines inside {:?}", page, kept.len(), region);
        Ok(kept)
    }

    fn full_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}
