//! Static configuration loaded once at startup from an optional config
//! file plus `LOCFORGE__`-prefixed environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{PipelineError, PipelineResult};

/// Static configuration loaded at startup
#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    #[serde(default = "default_ollama")]
    pub ollama: OllamaConfig,

    #[serde(default = "default_pipeline")]
    pub pipeline: PipelineConfig,

    #[serde(default = "default_output")]
    pub output: OutputConfig,
}

/// Ollama LLM configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Multimodal model used for both text batches and page images.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Pipeline policy knobs
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Minimum unique-string count (exclusive) for trusting the text
    /// layer; at or below this the run falls back to per-page OCR.
    #[serde(default = "default_direct_text_threshold")]
    pub direct_text_threshold: usize,

    /// Pages per OCR batch; bounds concurrent in-flight requests.
    #[serde(default = "default_ocr_batch_size")]
    pub ocr_batch_size: usize,

    /// Page render scale factor for OCR legibility.
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,

    /// JPEG quality (1-100) for rendered pages.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the four resource files are written into.
    #[serde(default = "default_lang_dir")]
    pub lang_dir: PathBuf,
}

impl StaticConfig {
    /// Load configuration from an optional `config` file and the environment.
    pub fn load() -> PipelineResult<Self> {
        Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("LOCFORGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| PipelineError::Config {
                message: e.to_string(),
            })
    }
}

// ==================== Default Value Functions ====================

fn default_ollama() -> OllamaConfig {
    OllamaConfig {
        base_url: default_ollama_url(),
        model: default_model(),
        temperature: default_temperature(),
        request_timeout_secs: default_request_timeout_secs(),
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen2.5vl".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_pipeline() -> PipelineConfig {
    PipelineConfig {
        direct_text_threshold: default_direct_text_threshold(),
        ocr_batch_size: default_ocr_batch_size(),
        render_scale: default_render_scale(),
        jpeg_quality: default_jpeg_quality(),
    }
}

fn default_direct_text_threshold() -> usize {
    5
}

fn default_ocr_batch_size() -> usize {
    5
}

fn default_render_scale() -> f32 {
    2.0
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_output() -> OutputConfig {
    OutputConfig {
        lang_dir: default_lang_dir(),
    }
}

fn default_lang_dir() -> PathBuf {
    PathBuf::from("./lang")
}
