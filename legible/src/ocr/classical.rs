use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use leptess::LepTess;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{Engine, RecognitionHints, RecognitionSpan, Recognizer};
use crate::error::{LegibleError, Result};

/// Tesseract via leptess. The handle needs exclusive access, so calls are
/// serialized behind a mutex.
pub struct TesseractRecognizer {
    tesseract: Arc<Mutex<LepTess>>,
}

impl TesseractRecognizer {
    pub fn new(languages: &str) -> Result<Self> {
        let tesseract = LepTess::new(None, languages).map_err(|e| {
            LegibleError::RecognizerUnavailable(format!("Tesseract not available: {e}"))
        })?;
        info!(languages = %languages, "Tesseract OCR initialized");

        Ok(Self {
            tesseract: Arc::new(Mutex::new(tesseract)),
        })
    }
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| LegibleError::Internal(format!("Failed to encode image: {e}")))?;
    Ok(output)
}

#[async_trait]
impl Recognizer for TesseractRecognizer {
    fn engine(&self) -> Engine {
        Engine::Classical
    }

    async fn recognize(
        &self,
        image: Arc<DynamicImage>,
        _hints: &RecognitionHints,
    ) -> Result<Vec<RecognitionSpan>> {
        let tesseract = Arc::clone(&self.tesseract);

        let (text, confidence) = tokio::task::spawn_blocking(move || {
            let png = encode_png(&image)?;
            let mut lt = tesseract.blocking_lock();
            lt.set_image_from_mem(&png)
                .map_err(|e| LegibleError::Internal(format!("Failed to set image: {e}")))?;
            let text = lt
                .get_utf8_text()
                .map_err(|e| LegibleError::Internal(format!("Failed to extract text: {e}")))?;
            let confidence = lt.mean_text_conf();
            Ok::<_, LegibleError>((text, confidence))
        })
        .await??;

        let text = text.trim();
        debug!(chars = text.len(), confidence, "Tesseract recognition complete");
        if text.is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![RecognitionSpan::new(text, confidence as f32 / 100.0)])
    }
}
