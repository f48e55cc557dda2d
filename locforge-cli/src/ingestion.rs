//! Document collaborator interface.
//!
//! The pipeline never touches a PDF library directly; it goes through
//! an injected [`DocumentBackend`] so the extraction strategy choice
//! can be exercised with fake documents in tests. The pdfium-backed
//! implementation lives in [`pdf`].

use mime::Mime;

use crate::error::DocumentError;

pub mod pdf;

/// An in-memory encoded render of one document page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-indexed page number, for logging and batch bookkeeping.
    pub page_number: usize,
    pub data: Vec<u8>,
    pub mime: Mime,
}

/// Rendering parameters for [`LoadedDocument::render_page`].
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub scale: f32,
    pub jpeg_quality: u8,
}

/// Opens documents from raw bytes.
pub trait DocumentBackend {
    type Doc<'a>: LoadedDocument
    where
        Self: 'a;

    fn open(&self, bytes: Vec<u8>) -> Result<Self::Doc<'_>, DocumentError>;
}

/// An opened document, scoped to one pipeline run.
pub trait LoadedDocument {
    fn page_count(&self) -> usize;

    /// Text runs on the given 0-indexed page, in content-stream order,
    /// untrimmed.
    fn page_text_runs(&self, page_index: usize) -> Result<Vec<String>, DocumentError>;

    /// Render the given 0-indexed page to an encoded image.
    fn render_page(
        &self,
        page_index: usize,
        options: RenderOptions,
    ) -> Result<PageImage, DocumentError>;
}

/// Collect the unique candidate UI strings from a document's text layer.
///
/// Runs are trimmed and anything of one character or less is dropped;
/// membership is by exact string value.
pub fn collect_unique_strings(
    document: &impl LoadedDocument,
) -> Result<Vec<String>, DocumentError> {
    let mut seen = std::collections::HashSet::new();
    let mut strings = Vec::new();

    for page_index in 0..document.page_count() {
        for run in document.page_text_runs(page_index)? {
            let trimmed = run.trim();
            if trimmed.chars().count() <= 1 {
                continue;
            }
            if seen.insert(trimmed.to_string()) {
                strings.push(trimmed.to_string());
            }
        }
    }

    Ok(strings)
}
