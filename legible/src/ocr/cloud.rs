//! OCR.Space client.
//!
//! The service accepts a multipart upload capped at roughly 1 MB on the free
//! tier, so images are re-encoded through [`fit_payload`] before sending.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tracing::{debug, warn};

use super::payload::fit_payload;
use super::{Engine, RecognitionHints, RecognitionSpan, Recognizer};
use crate::config::CloudOcrConfig;
use crate::error::{LegibleError, Result};

/// Language codes OCR.Space accepts.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "ara", "bul", "chs", "cht", "hrv", "cze", "dan", "dut", "eng", "fin", "fre", "ger", "gre",
    "hun", "kor", "ita", "jpn", "pol", "por", "rus", "slv", "spa", "swe", "tur",
];

/// Pick the language to send: the requested code when OCR.Space supports it,
/// otherwise `default`.
pub fn resolve_language<'a>(requested: Option<&'a str>, default: &'a str) -> &'a str {
    match requested.map(str::trim).filter(|code| !code.is_empty()) {
        Some(code) if SUPPORTED_LANGUAGES.contains(&code) => code,
        Some(code) => {
            warn!(requested = code, fallback = default, "Unsupported OCR language, using default");
            default
        }
        None => default,
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    One(String),
    Many(Vec<String>),
}

impl ErrorField {
    fn first(self) -> Option<String> {
        match self {
            ErrorField::One(message) => Some(message),
            ErrorField::Many(messages) => messages.into_iter().next(),
        }
        .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<ErrorField>,
    #[serde(default)]
    error_details: Option<ErrorField>,
}

impl OcrSpaceResponse {
    fn error_text(self) -> Option<String> {
        self.error_message
            .and_then(ErrorField::first)
            .or_else(|| self.error_details.and_then(ErrorField::first))
    }
}

/// Best-effort error message from an error body, falling back to the raw text.
fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<OcrSpaceResponse>(body)
        .ok()
        .and_then(OcrSpaceResponse::error_text)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

#[derive(Debug, Clone)]
pub struct OcrSpaceClient {
    client: Client,
    config: CloudOcrConfig,
}

impl OcrSpaceClient {
    pub fn new(config: &CloudOcrConfig) -> Result<Self> {
        if config.api_key.is_none() {
            return Err(LegibleError::RecognizerUnavailable(
                "OCR.Space API key not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LegibleError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Send an already encoded JPEG and return the text of every parsed page.
    pub async fn recognize_jpeg(&self, jpeg: Vec<u8>, language: &str) -> Result<Vec<String>> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            LegibleError::RecognizerUnavailable("OCR.Space API key not configured".to_string())
        })?;

        let file_part = multipart::Part::bytes(jpeg)
            .file_name("image.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| LegibleError::Internal(format!("Invalid MIME type: {e}")))?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("apikey", api_key.to_string())
            .text("language", language.to_string())
            .text("isOverlayRequired", "false")
            .text("OCREngine", self.config.engine.to_string())
            .text("scale", "true")
            .text("detectOrientation", "true");

        debug!(url = %self.config.base_url, language, "Sending OCR.Space request");

        let response = self
            .client
            .post(&self.config.base_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LegibleError::RemoteTransport("Request timeout".to_string())
                } else {
                    LegibleError::RemoteTransport(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        debug!(%status, "OCR.Space response status");

        let body = response
            .text()
            .await
            .map_err(|e| LegibleError::RemoteTransport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(LegibleError::RemoteHttp {
                status: status.as_u16(),
                message: error_message_from_body(&body),
            });
        }

        let parsed: OcrSpaceResponse = serde_json::from_str(&body).map_err(|e| {
            LegibleError::RemoteProcessing(format!("Unreadable OCR.Space response: {e}"))
        })?;

        if parsed.is_errored_on_processing {
            let message = parsed
                .error_text()
                .unwrap_or_else(|| "OCR.Space reported a processing error".to_string());
            return Err(LegibleError::RemoteProcessing(message));
        }

        Ok(parsed
            .parsed_results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|result| result.parsed_text)
            .filter(|text| !text.trim().is_empty())
            .collect())
    }
}

#[async_trait]
impl Recognizer for OcrSpaceClient {
    fn engine(&self) -> Engine {
        Engine::Cloud
    }

    async fn recognize(
        &self,
        image: Arc<DynamicImage>,
        hints: &RecognitionHints,
    ) -> Result<Vec<RecognitionSpan>> {
        let language =
            resolve_language(hints.language.as_deref(), &self.config.default_language).to_string();

        let max_dimension = self.config.max_dimension;
        let max_bytes = self.config.max_payload_bytes;
        let jpeg =
            tokio::task::spawn_blocking(move || fit_payload(&image, max_dimension, max_bytes))
                .await??;
        debug!(bytes = jpeg.len(), "Cloud payload ready");

        let pages = self.recognize_jpeg(jpeg, &language).await?;
        Ok(pages
            .into_iter()
            .map(|text| RecognitionSpan::new(text.trim(), 1.0))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_language() {
        assert_eq!(resolve_language(Some("eng"), "spa"), "eng");
        assert_eq!(resolve_language(Some("xx"), "spa"), "spa");
        assert_eq!(resolve_language(Some("  "), "spa"), "spa");
        assert_eq!(resolve_language(None, "spa"), "spa");
    }

    #[test]
    fn test_missing_key_is_unavailable() {
        let config = CloudOcrConfig {
            api_key: None,
            ..Default::default()
        };
        assert!(matches!(
            OcrSpaceClient::new(&config),
            Err(LegibleError::RecognizerUnavailable(_))
        ));
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message_from_body(r#"{"ErrorMessage":["E101: Timed out","second"]}"#),
            "E101: Timed out"
        );
        assert_eq!(
            error_message_from_body(r#"{"ErrorMessage":"","ErrorDetails":"bad key"}"#),
            "bad key"
        );
        assert_eq!(error_message_from_body("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message_from_body(""), "empty response body");
    }
}
