use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ocr::Engine;
use crate::services::{CloudExtraction, Extraction};

/// Which path produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OcrSource {
    /// Local neural and classical engines, merged.
    Local,
    /// OCR.Space.
    Cloud,
}

impl From<Engine> for OcrSource {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Cloud => Self::Cloud,
            Engine::Neural | Engine::Classical => Self::Local,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OcrResponse {
    /// Cleaned text.
    pub text: String,
    /// Declared content type of the upload.
    pub mime: String,
    /// RFC 3339 UTC completion time.
    pub timestamp: String,
    pub source: OcrSource,
}

impl From<Extraction> for OcrResponse {
    fn from(extraction: Extraction) -> Self {
        Self {
            text: extraction.text,
            mime: extraction.mime,
            timestamp: extraction.timestamp,
            source: OcrSource::Local,
        }
    }
}

impl OcrResponse {
    /// Wrap a cloud result, stamping it with the declared MIME and the
    /// current time.
    pub fn from_cloud(result: CloudExtraction, mime: impl Into<String>) -> Self {
        Self {
            text: result.text,
            mime: mime.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            source: OcrSource::Cloud,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_serializes_source_lowercase() {
        let resp = OcrResponse {
            text: "Hola".to_string(),
            mime: "image/png".to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            source: OcrSource::from(Engine::Cloud),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["source"], "cloud");
        assert_eq!(json["mime"], "image/png");
    }
}
