//! Per-page recognition batches.
//!
//! Pages are processed in fixed-size batches to bound in-flight request
//! pressure: batches run sequentially, pages within a batch
//! concurrently. A critical backend failure resolves the batch join
//! early and aborts the run; any other per-page failure drops that
//! page's contribution and the run continues.

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::ingestion::PageImage;
use crate::ollama::{TranslationBackend, TranslationInput};
use crate::translation::TranslationRecord;

use super::progress::{self, ProgressReporter, band_position};

pub async fn translate_pages<T: TranslationBackend>(
    translator: &T,
    pages: &[PageImage],
    batch_size: usize,
    progress: &mut ProgressReporter<'_>,
) -> PipelineResult<Vec<TranslationRecord>> {
    let total = pages.len();
    let batch_size = batch_size.max(1);
    let mut records = Vec::new();
    let mut pages_done = 0;

    for batch in pages.chunks(batch_size) {
        let batch_results = try_join_all(batch.iter().map(|page| translate_page(translator, page)))
            .await?;

        for page_records in batch_results {
            records.extend(page_records);
        }

        pages_done += batch.len();
        progress.report(
            format!("Recognized {pages_done}/{total} pages"),
            band_position(progress::RASTER_END, progress::OCR_END, pages_done, total),
        );
    }

    Ok(records)
}

async fn translate_page<T: TranslationBackend>(
    translator: &T,
    page: &PageImage,
) -> PipelineResult<Vec<TranslationRecord>> {
    match translator
        .request_translations(TranslationInput::Page(page))
        .await
    {
        Ok(records) => {
            debug!(
                page = page.page_number,
                records = records.len(),
                "Page recognized"
            );
            Ok(records)
        }
        Err(e) if e.is_critical() => Err(PipelineError::CriticalService { source: e }),
        Err(e) => {
            warn!(page = page.page_number, error = %e, "Page recognition failed, skipping page");
            Ok(Vec::new())
        }
    }
}
