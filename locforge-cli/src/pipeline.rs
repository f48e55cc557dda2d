//! Pipeline controller: strategy choice, sequencing, and progress.
//!
//! A run moves through extraction, one of the two translation paths,
//! consolidation, and materialization. The text layer is trusted only
//! when it yields more unique strings than the configured threshold;
//! otherwise the document is treated as flattened artwork and every
//! page goes through image recognition.

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::ingestion::{
    DocumentBackend, LoadedDocument, PageImage, RenderOptions, collect_unique_strings,
};
use crate::materialize::{GeneratedFile, materialize};
use crate::ollama::{TranslationBackend, TranslationInput};
use crate::translation::consolidate;

pub mod ocr;
pub mod progress;

use self::progress::{ProgressEvent, ProgressReporter, band_position};

pub struct LocalizationPipeline<'a, D, T> {
    documents: &'a D,
    translator: &'a T,
    config: &'a PipelineConfig,
}

impl<'a, D, T> LocalizationPipeline<'a, D, T>
where
    D: DocumentBackend,
    T: TranslationBackend,
{
    pub fn new(documents: &'a D, translator: &'a T, config: &'a PipelineConfig) -> Self {
        Self {
            documents,
            translator,
            config,
        }
    }

    /// Run the full pipeline over one PDF.
    ///
    /// Success yields exactly the four resource files; any fatal
    /// condition returns a single error and no files.
    pub async fn run(
        &self,
        pdf_bytes: Vec<u8>,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> PipelineResult<Vec<GeneratedFile>> {
        let mut progress = ProgressReporter::new(on_progress);
        progress.report("Reading PDF document", 0);

        let document = self.documents.open(pdf_bytes)?;

        let strings = collect_unique_strings(&document)?;
        progress.report(
            format!("Found {} unique text items", strings.len()),
            progress::EXTRACT_DONE,
        );

        let records = if strings.len() > self.config.direct_text_threshold {
            info!(
                count = strings.len(),
                "Text layer present, translating extracted strings"
            );
            progress.report("Translating extracted text", progress::DIRECT_TRANSLATE);
            self.translator
                .request_translations(TranslationInput::Strings(&strings))
                .await
                .map_err(|e| e.into_fatal())?
        } else {
            info!(
                count = strings.len(),
                "Sparse text layer, recognizing page images instead"
            );
            let images = self.rasterize(&document, &mut progress)?;
            ocr::translate_pages(
                self.translator,
                &images,
                self.config.ocr_batch_size,
                &mut progress,
            )
            .await?
        };

        progress.report("Consolidating translations", progress::CONSOLIDATE);
        let consolidated = consolidate(records);
        if consolidated.is_empty() {
            return Err(PipelineError::NoLocalizableText);
        }
        info!(records = consolidated.len(), "Translations consolidated");

        progress.report("Writing resource files", progress::MATERIALIZE);
        let files = materialize(&consolidated);

        progress.report("Localization resources ready", progress::DONE);
        Ok(files)
    }

    fn rasterize(
        &self,
        document: &impl LoadedDocument,
        progress: &mut ProgressReporter<'_>,
    ) -> PipelineResult<Vec<PageImage>> {
        let total = document.page_count();
        let options = RenderOptions {
            scale: self.config.render_scale,
            jpeg_quality: self.config.jpeg_quality,
        };

        let mut images = Vec::with_capacity(total);
        for page_index in 0..total {
            images.push(document.render_page(page_index, options)?);
            progress.report(
                format!("Rendering page {}/{}", page_index + 1, total),
                band_position(progress::EXTRACT_DONE, progress::RASTER_END, page_index + 1, total),
            );
        }

        Ok(images)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeOutcome, FakeTranslator};
    use super::*;
    use crate::ingestion::testing::FakeBackend;
    use crate::materialize;
    use crate::translation::TranslationRecord;

    fn record(key: &str, en: &str, ar: &str) -> TranslationRecord {
        TranslationRecord {
            key: key.to_string(),
            en_text: en.to_string(),
            ar_text: ar.to_string(),
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            direct_text_threshold: 5,
            ocr_batch_size: 5,
            render_scale: 2.0,
            jpeg_quality: 90,
        }
    }

    fn backend_with_runs(runs: Vec<&str>) -> FakeBackend {
        FakeBackend {
            pages: vec![runs.into_iter().map(String::from).collect()],
            renderable: true,
        }
    }

    fn submit_records() -> FakeOutcome {
        FakeOutcome::Records(vec![record("submit", "Submit", "إرسال")])
    }

    #[tokio::test]
    async fn test_six_unique_strings_take_the_direct_path() {
        let documents = backend_with_runs(vec!["One", "Two", "Three", "Four", "Five", "Six"]);
        let translator = FakeTranslator::new(submit_records());
        let cfg = config();
        let pipeline = LocalizationPipeline::new(&documents, &translator, &cfg);

        let mut sink = |_event: progress::ProgressEvent| {};
        let files = pipeline.run(Vec::new(), &mut sink).await.unwrap();

        assert_eq!(files.len(), 4);
        assert_eq!(translator.call_log(), vec!["strings:6".to_string()]);
    }

    #[tokio::test]
    async fn test_five_unique_strings_fall_back_to_page_recognition() {
        let documents = backend_with_runs(vec!["One", "Two", "Three", "Four", "Five"]);
        let translator = FakeTranslator::new(submit_records());
        let cfg = config();
        let pipeline = LocalizationPipeline::new(&documents, &translator, &cfg);

        let mut sink = |_event: progress::ProgressEvent| {};
        pipeline.run(Vec::new(), &mut sink).await.unwrap();

        assert_eq!(translator.call_log(), vec!["page:1".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_heavy_text_layer_uses_page_recognition() {
        // A text layer exists, but only 2 items survive dedup and the
        // length filter.
        let documents = backend_with_runs(vec!["Hello", "Hello", "Submit"]);
        let translator = FakeTranslator::new(submit_records());
        let cfg = config();
        let pipeline = LocalizationPipeline::new(&documents, &translator, &cfg);

        let mut sink = |_event: progress::ProgressEvent| {};
        pipeline.run(Vec::new(), &mut sink).await.unwrap();

        assert_eq!(translator.call_log(), vec!["page:1".to_string()]);
    }

    #[tokio::test]
    async fn test_service_503_aborts_with_critical_error_and_no_files() {
        let documents = backend_with_runs(vec!["One", "Two", "Three", "Four", "Five", "Six"]);
        let translator = FakeTranslator::new(FakeOutcome::Status(503));
        let cfg = config();
        let pipeline = LocalizationPipeline::new(&documents, &translator, &cfg);

        let mut sink = |_event: progress::ProgressEvent| {};
        let result = pipeline.run(Vec::new(), &mut sink).await;

        assert!(matches!(
            result,
            Err(PipelineError::CriticalService { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_direct_response_is_fatal() {
        let documents = backend_with_runs(vec!["One", "Two", "Three", "Four", "Five", "Six"]);
        let translator = FakeTranslator::new(FakeOutcome::Malformed);
        let cfg = config();
        let pipeline = LocalizationPipeline::new(&documents, &translator, &cfg);

        let mut sink = |_event: progress::ProgressEvent| {};
        let result = pipeline.run(Vec::new(), &mut sink).await;

        assert!(matches!(
            result,
            Err(PipelineError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_consolidated_set_fails_distinctly() {
        let documents = backend_with_runs(vec!["Hi"]);
        let translator = FakeTranslator::new(FakeOutcome::Records(vec![]));
        let cfg = config();
        let pipeline = LocalizationPipeline::new(&documents, &translator, &cfg);

        let mut sink = |_event: progress::ProgressEvent| {};
        let result = pipeline.run(Vec::new(), &mut sink).await;

        assert!(matches!(result, Err(PipelineError::NoLocalizableText)));
    }

    #[tokio::test]
    async fn test_render_failure_is_fatal() {
        let documents = FakeBackend {
            pages: vec![vec!["Hi".to_string()]],
            renderable: false,
        };
        let translator = FakeTranslator::new(submit_records());
        let cfg = config();
        let pipeline = LocalizationPipeline::new(&documents, &translator, &cfg);

        let mut sink = |_event: progress::ProgressEvent| {};
        let result = pipeline.run(Vec::new(), &mut sink).await;

        assert!(matches!(
            result,
            Err(PipelineError::RenderSurface { page: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_cross_page_variants_consolidate_to_one_record() {
        let documents = FakeBackend {
            pages: vec![vec![], vec![]],
            renderable: true,
        };
        let translator = FakeTranslator::new(FakeOutcome::Records(vec![]))
            .with_page(
                1,
                FakeOutcome::Records(vec![record("submit", "Submit", "إرسال")]),
            )
            .with_page(
                2,
                FakeOutcome::Records(vec![record("submit_button", " submit ", "أرسل")]),
            );
        let cfg = config();
        let pipeline = LocalizationPipeline::new(&documents, &translator, &cfg);

        let mut sink = |_event: progress::ProgressEvent| {};
        let files = pipeline.run(Vec::new(), &mut sink).await.unwrap();

        let en = files
            .iter()
            .find(|f| f.filename == materialize::EN_JSON)
            .unwrap();
        let map: std::collections::BTreeMap<String, String> =
            serde_json::from_str(&en.content).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("submit"), Some(&"Submit".to_string()));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_completes() {
        let documents = FakeBackend {
            pages: vec![vec![], vec![], vec![]],
            renderable: true,
        };
        let translator = FakeTranslator::new(submit_records());
        let cfg = config();
        let pipeline = LocalizationPipeline::new(&documents, &translator, &cfg);

        let mut percentages = Vec::new();
        let mut sink =
            |event: progress::ProgressEvent| percentages.push(event.percentage);
        pipeline.run(Vec::new(), &mut sink).await.unwrap();

        assert!(percentages.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(*percentages.last().unwrap(), 100);
    }
}
