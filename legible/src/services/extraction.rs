use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{CloudOcrConfig, Config, OcrConfig, PreprocessConfig};
use crate::error::{LegibleError, Result};
use crate::imaging::{decode_image, downscale_to_fit, preprocess_image};
use crate::ocr::{RecognitionHints, RecognitionSpan, Recognizer, RecognizerSet};
use crate::text::{clean_merged, merge_engine_outputs};

/// Result of a local extraction.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub text: String,
    pub mime: String,
    /// ISO-8601 UTC completion time.
    pub timestamp: String,
}

/// Result of a cloud extraction.
#[derive(Debug, Clone, Serialize)]
pub struct CloudExtraction {
    pub text: String,
}

/// Accept only `image/*` MIME types. Returns the trimmed type.
pub fn validate_mime(mime: Option<&str>) -> Result<String> {
    let mime = mime.map(str::trim).unwrap_or_default();
    if mime.to_ascii_lowercase().starts_with("image/") {
        Ok(mime.to_string())
    } else if mime.is_empty() {
        Err(LegibleError::InvalidInput(
            "Missing content type; an image is required".to_string(),
        ))
    } else {
        Err(LegibleError::InvalidInput(format!(
            "Unsupported content type '{mime}'; an image is required"
        )))
    }
}

fn completion_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Runs preprocessing, both local engines and the cleaning chain.
#[derive(Clone)]
pub struct ExtractionService {
    engines: RecognizerSet,
    ocr: OcrConfig,
    cloud: CloudOcrConfig,
    preprocess: PreprocessConfig,
}

impl ExtractionService {
    pub fn new(engines: RecognizerSet, config: &Config) -> Self {
        Self {
            engines,
            ocr: config.ocr.clone(),
            cloud: config.cloud.clone(),
            preprocess: config.preprocess.clone(),
        }
    }

    pub fn engines(&self) -> &RecognizerSet {
        &self.engines
    }

    /// Local extraction: preprocess, run the neural and classical engines
    /// concurrently, merge neural-first and clean.
    #[instrument(skip(self, bytes), fields(input_len = bytes.len()))]
    pub async fn extract(&self, bytes: Vec<u8>, mime: Option<&str>) -> Result<Extraction> {
        let mime = validate_mime(mime)?;

        let preprocess = self.preprocess.clone();
        let max_dimension = self.ocr.recognition_max_dimension;
        let image = tokio::task::spawn_blocking(move || {
            let grid = preprocess_image(&bytes, &preprocess)?;
            Ok::<_, LegibleError>(DynamicImage::ImageLuma8(downscale_to_fit(
                &grid,
                max_dimension,
            )))
        })
        .await??;
        let image = Arc::new(image);

        let hints = RecognitionHints::default();
        let (neural, classical) = tokio::join!(
            self.run_engine(self.engines.neural.as_ref(), Arc::clone(&image), &hints),
            self.run_engine(self.engines.classical.as_ref(), image, &hints),
        );

        let merged = merge_engine_outputs(&neural, &classical);
        if merged.trim().is_empty() {
            info!("No engine produced text");
            return Err(LegibleError::NoTextDetected);
        }

        let text = clean_merged(&merged);
        if text.is_empty() {
            info!(raw_len = merged.len(), "Cleaning removed all recognized text");
            return Err(LegibleError::NoTextDetected);
        }

        info!(
            neural_spans = neural.len(),
            classical_spans = classical.len(),
            chars = text.chars().count(),
            "Extraction complete"
        );
        Ok(Extraction {
            text,
            mime,
            timestamp: completion_timestamp(),
        })
    }

    /// Run one engine, degrading any failure or timeout to no output.
    async fn run_engine(
        &self,
        recognizer: &dyn Recognizer,
        image: Arc<DynamicImage>,
        hints: &RecognitionHints,
    ) -> Vec<RecognitionSpan> {
        let engine = recognizer.engine();
        let limit = Duration::from_secs(self.ocr.timeout_secs);

        let spans = match tokio::time::timeout(limit, recognizer.recognize(image, hints)).await {
            Ok(Ok(spans)) => spans,
            Ok(Err(LegibleError::RecognizerUnavailable(reason))) => {
                debug!(%engine, %reason, "Engine unavailable, skipping");
                return Vec::new();
            }
            Ok(Err(e)) => {
                warn!(%engine, error = %e, "Engine failed, continuing without it");
                return Vec::new();
            }
            Err(_) => {
                warn!(%engine, timeout_secs = self.ocr.timeout_secs, "Engine timed out");
                return Vec::new();
            }
        };

        match self.ocr.min_confidence {
            Some(min) => {
                let before = spans.len();
                let kept: Vec<_> = spans.into_iter().filter(|s| s.confidence >= min).collect();
                debug!(%engine, before, after = kept.len(), min, "Applied confidence filter");
                kept
            }
            None => spans,
        }
    }

    /// Cloud extraction on the original image.
    #[instrument(skip(self, bytes), fields(input_len = bytes.len()))]
    pub async fn extract_cloud(
        &self,
        bytes: Vec<u8>,
        mime: Option<&str>,
        language: Option<&str>,
    ) -> Result<CloudExtraction> {
        validate_mime(mime)?;

        let image = tokio::task::spawn_blocking(move || decode_image(&bytes)).await??;
        let hints = RecognitionHints::with_language(language);
        let spans = self.engines.cloud.recognize(Arc::new(image), &hints).await?;

        let text = spans
            .iter()
            .map(|span| span.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() && self.cloud.require_text {
            return Err(LegibleError::NoTextDetected);
        }

        info!(chars = text.chars().count(), "Cloud extraction complete");
        Ok(CloudExtraction { text })
    }
}
