//! Ollama API client for translation requests.
//!
//! Both request shapes (a batch of extracted strings, a single rendered
//! page image) share one chat call whose output is constrained to the
//! translation-record schema via Ollama's structured `format` field.

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OllamaConfig;
use crate::error::TranslateError;
use crate::ingestion::PageImage;
use crate::translation::TranslationRecord;

/// Shared rules embedded in every prompt. Any change here must keep
/// the three-part contract: one concise snake_case key per unique
/// item, per-item language detection with English/Arabic pairing, and
/// consolidation of equivalent items within the response.
const TRANSLATION_RULES: &str = "\
For every text item:\n\
1. Generate exactly one concise snake_case key; keys must be unique within your response.\n\
2. Detect the item's language. If it is English, put it in en_text verbatim and translate it \
into Arabic for ar_text. If it is Arabic, put it in ar_text verbatim and translate it into \
English for en_text. For any other language, translate it into both English and Arabic.\n\
3. If several items have equivalent meaning, consolidate them under a single key.\n\
Respond with a JSON array of objects, each with exactly the string fields \"key\", \
\"en_text\", and \"ar_text\".";

/// What a single translation request carries.
pub enum TranslationInput<'a> {
    /// Extracted UI strings from the document's text layer.
    Strings(&'a [String]),
    /// One rendered page, for text recognition plus translation.
    Page(&'a PageImage),
}

/// Generative-text collaborator boundary.
pub trait TranslationBackend: Send + Sync {
    fn request_translations(
        &self,
        input: TranslationInput<'_>,
    ) -> impl Future<Output = Result<Vec<TranslationRecord>, TranslateError>> + Send;
}

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: OllamaConfig) -> Result<Self, TranslateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TranslateError::Connection {
                url: config.base_url.clone(),
                source: e,
            })?;

        Ok(Self { client, config })
    }

    async fn chat(&self, message: ChatMessage) -> Result<Vec<TranslationRecord>, TranslateError> {
        let url = format!("{}/api/chat", self.config.base_url);

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: vec![message],
            stream: false,
            format: translation_schema(),
            options: Some(OllamaOptions {
                temperature: Some(self.config.temperature),
            }),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslateError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();

            // Ollama answers 404 for a model that is not pulled; the
            // body is kept for display only, never for classification.
            if status == 404 {
                return Err(TranslateError::ModelNotFound {
                    model: self.config.model.clone(),
                });
            }

            let message = response.text().await.unwrap_or_default();
            return Err(TranslateError::Generation { status, message });
        }

        let chat_response: OllamaChatResponse =
            response
                .json()
                .await
                .map_err(|e| TranslateError::InvalidResponse {
                    source: serde_json::Error::io(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        e.to_string(),
                    )),
                })?;

        parse_records(&chat_response.message.content)
    }
}

impl TranslationBackend for OllamaClient {
    async fn request_translations(
        &self,
        input: TranslationInput<'_>,
    ) -> Result<Vec<TranslationRecord>, TranslateError> {
        let message = match input {
            TranslationInput::Strings(strings) => {
                let items = strings
                    .iter()
                    .map(|s| format!("- {s}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                ChatMessage::user(format!(
                    "These are UI text items extracted from a mobile app design PDF:\n\n{items}\n\n{TRANSLATION_RULES}"
                ))
            }
            TranslationInput::Page(page) => {
                let image_base64 =
                    base64::engine::general_purpose::STANDARD.encode(&page.data);
                ChatMessage::user_with_image(
                    format!(
                        "This image is one page of a mobile app design. Read every piece of \
                        user-facing UI text on it.\n\n{TRANSLATION_RULES}"
                    ),
                    image_base64,
                )
            }
        };

        self.chat(message).await
    }
}

/// Parse a structured-output chat response body into translation records.
pub fn parse_records(content: &str) -> Result<Vec<TranslationRecord>, TranslateError> {
    serde_json::from_str(content).map_err(|e| TranslateError::InvalidResponse { source: e })
}

/// JSON schema constraining the model's output to an array of
/// three-field string records.
pub fn translation_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "key": { "type": "string" },
                "en_text": { "type": "string" },
                "ar_text": { "type": "string" }
            },
            "required": ["key", "en_text", "ar_text"]
        }
    })
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    /// Base64-encoded images for vision models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            images: None,
        }
    }

    /// Create a user message with an image for vision models
    pub fn user_with_image(content: impl Into<String>, image_base64: String) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            images: Some(vec![image_base64]),
        }
    }
}

// Internal Ollama API types

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    format: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_accepts_schema_shaped_output() {
        let content = r#"[
            {"key": "submit", "en_text": "Submit", "ar_text": "إرسال"},
            {"key": "welcome_message", "en_text": "Welcome back", "ar_text": "مرحباً بعودتك"}
        ]"#;

        let records = parse_records(content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "submit");
        assert_eq!(records[1].ar_text, "مرحباً بعودتك");
    }

    #[test]
    fn test_parse_records_rejects_missing_fields() {
        let content = r#"[{"key": "submit", "en_text": "Submit"}]"#;
        assert!(matches!(
            parse_records(content),
            Err(TranslateError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_parse_records_rejects_non_array_output() {
        let content = r#"{"records": []}"#;
        assert!(matches!(
            parse_records(content),
            Err(TranslateError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_schema_requires_all_three_fields() {
        let schema = translation_schema();
        let required = schema["items"]["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
        for field in ["key", "en_text", "ar_text"] {
            assert!(required.iter().any(|v| v == field));
        }
    }

    #[test]
    fn test_image_message_carries_base64_payload() {
        let message = ChatMessage::user_with_image("describe", "aGVsbG8=".to_string());
        assert_eq!(message.role, "user");
        assert_eq!(message.images.unwrap(), vec!["aGVsbG8=".to_string()]);
    }
}
