use thiserror::Error;

/// Main pipeline error type.
///
/// Every fatal condition surfaces to the caller as exactly one of these
/// variants; no partial output is produced on a fatal path.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Could not read the PDF document")]
    DocumentLoad {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not render page {page} to an image")]
    RenderSurface {
        page: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Translation service unavailable; check API access, quota, and billing")]
    CriticalService {
        #[source]
        source: TranslateError,
    },

    #[error("Translation service returned a response that does not match the expected schema")]
    MalformedResponse {
        #[source]
        source: TranslateError,
    },

    #[error("Translation request failed")]
    Translation {
        #[source]
        source: TranslateError,
    },

    #[error("The document contains no localizable text")]
    NoLocalizableText,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

/// Translation backend errors.
///
/// Classification is structural: criticality is decided from the
/// transport layer and the HTTP status code, never from substrings of
/// a human-readable message.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("Connection failed to translation backend at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Generation failed (status {status}): {message}")]
    Generation { status: u16, message: String },

    #[error("Invalid response from translation backend")]
    InvalidResponse {
        #[source]
        source: serde_json::Error,
    },
}

impl TranslateError {
    /// Whether this failure aborts the whole run rather than the current item.
    ///
    /// Transport failures and auth/billing/quota/server statuses are
    /// critical; anything else can be retried or dropped per item.
    pub fn is_critical(&self) -> bool {
        match self {
            TranslateError::Connection { .. } => true,
            TranslateError::Generation { status, .. } => {
                *status >= 500 || matches!(status, 401 | 402 | 403 | 429)
            }
            TranslateError::ModelNotFound { .. } => false,
            TranslateError::InvalidResponse { .. } => false,
        }
    }

    /// Escalate into the pipeline-level classification used on paths
    /// where any failure is fatal.
    pub fn into_fatal(self) -> PipelineError {
        if self.is_critical() {
            PipelineError::CriticalService { source: self }
        } else if matches!(self, TranslateError::InvalidResponse { .. }) {
            PipelineError::MalformedResponse { source: self }
        } else {
            PipelineError::Translation { source: self }
        }
    }
}

/// Document collaborator errors.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to load PDF document")]
    Load {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to extract text from page {page}")]
    PageText {
        page: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to render page {page}")]
    Render {
        page: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<DocumentError> for PipelineError {
    fn from(error: DocumentError) -> Self {
        match error {
            DocumentError::Load { source } => PipelineError::DocumentLoad { source },
            DocumentError::PageText { page, source } => PipelineError::DocumentLoad {
                source: Box::new(std::io::Error::other(format!(
                    "text extraction failed on page {page}: {source}"
                ))),
            },
            DocumentError::Render { page, source } => {
                PipelineError::RenderSurface { page, source }
            }
        }
    }
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Render an error and its source chain as a single line for terminal output.
pub fn format_error_chain(error: &dyn std::error::Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
