//! pdfium-backed document backend.

use image::codecs::jpeg::JpegEncoder;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::DocumentError;

use super::{DocumentBackend, LoadedDocument, PageImage, RenderOptions};

fn create_pdfium() -> Result<Pdfium, DocumentError> {
    // Try local paths first, then system
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "./vendor/pdfium/lib/",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| DocumentError::Load {
            source: Box::new(std::io::Error::other(format!(
                "Failed to load PDFium library. Install libpdfium or place it next to the binary: {:?}",
                e
            ))),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Document backend over a process-wide pdfium binding.
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    pub fn new() -> Result<Self, DocumentError> {
        Ok(Self {
            pdfium: create_pdfium()?,
        })
    }
}

pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl DocumentBackend for PdfiumBackend {
    type Doc<'a>
        = PdfiumDocument<'a>
    where
        Self: 'a;

    fn open(&self, bytes: Vec<u8>) -> Result<Self::Doc<'_>, DocumentError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(|e| DocumentError::Load {
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Failed to load PDF: {:?}", e),
                )),
            })?;

        debug!(pages = document.pages().len(), "PDF opened");

        Ok(PdfiumDocument { document })
    }
}

impl LoadedDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text_runs(&self, page_index: usize) -> Result<Vec<String>, DocumentError> {
        let page_num = page_index + 1;
        let page = self
            .document
            .pages()
            .get(page_index as u16)
            .map_err(|e| DocumentError::PageText {
                page: page_num,
                source: Box::new(std::io::Error::other(format!(
                    "Failed to get page {}: {:?}",
                    page_num, e
                ))),
            })?;

        let mut runs = Vec::new();
        for object in page.objects().iter() {
            if let Some(text_object) = object.as_text_object() {
                runs.push(text_object.text());
            }
        }

        Ok(runs)
    }

    fn render_page(
        &self,
        page_index: usize,
        options: RenderOptions,
    ) -> Result<PageImage, DocumentError> {
        let page_num = page_index + 1;
        let page = self
            .document
            .pages()
            .get(page_index as u16)
            .map_err(|e| DocumentError::Render {
                page: page_num,
                source: Box::new(std::io::Error::other(format!(
                    "Failed to get page {}: {:?}",
                    page_num, e
                ))),
            })?;

        let config = PdfRenderConfig::new().scale_page_by_factor(options.scale);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| DocumentError::Render {
                page: page_num,
                source: Box::new(std::io::Error::other(format!(
                    "Failed to render page: {:?}",
                    e
                ))),
            })?;

        // JPEG has no alpha channel
        let rgb = bitmap.as_image().to_rgb8();

        let mut data = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut data, options.jpeg_quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| DocumentError::Render {
                page: page_num,
                source: Box::new(e),
            })?;

        let image = PageImage {
            page_number: page_num,
            data,
            mime: mime::IMAGE_JPEG,
        };

        debug!(
            page = page_num,
            width = rgb.width(),
            height = rgb.height(),
            bytes = image.data.len(),
            mime = %image.mime,
            "Page rendered"
        );

        Ok(image)
    }
}
