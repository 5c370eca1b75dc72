//! Local neural recognizer backed by `ocrs`.
//!
//! Needs two `.rten` model files in the configured directory:
//! `text-detection.rten` and `text-recognition.rten`. Running `ocrs-cli` once
//! downloads both into `~/.cache/ocrs`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use rten::Model;
use tracing::{debug, info};

use super::{BoundingBox, Engine, RecognitionHints, RecognitionSpan, Recognizer};
use crate::config::GroupingMode;
use crate::error::{LegibleError, Result};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Images smaller than this on either side produce no detections.
const MIN_SIDE: u32 = 8;

/// Lines separated by more than this many line heights start a new paragraph.
const PARAGRAPH_GAP_RATIO: f32 = 0.75;

pub struct NeuralRecognizer {
    engine: Arc<OcrsEngine>,
    grouping: GroupingMode,
}

fn load_model(path: &Path, kind: &str) -> Result<Model> {
    if !path.exists() {
        return Err(LegibleError::RecognizerUnavailable(format!(
            "{kind} model not found at {}",
            path.display()
        )));
    }
    info!(path = %path.display(), "Loading OCR {} model", kind);
    Model::load_file(path).map_err(|e| {
        LegibleError::RecognizerUnavailable(format!(
            "failed to load {kind} model from {}: {e}",
            path.display()
        ))
    })
}

impl NeuralRecognizer {
    /// Load both models from `model_dir`. Blocking and slow; call once at
    /// start-up.
    pub fn load(model_dir: &Path, grouping: GroupingMode) -> Result<Self> {
        let detection_path: PathBuf = model_dir.join(DETECTION_MODEL_FILENAME);
        let recognition_path: PathBuf = model_dir.join(RECOGNITION_MODEL_FILENAME);

        let detection_model = load_model(&detection_path, "detection")?;
        let recognition_model = load_model(&recognition_path, "recognition")?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| {
            LegibleError::RecognizerUnavailable(format!("failed to initialise OCR engine: {e}"))
        })?;

        Ok(Self {
            engine: Arc::new(engine),
            grouping,
        })
    }
}

fn recognize_lines(engine: &OcrsEngine, image: &DynamicImage) -> Result<Vec<RecognitionSpan>> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width < MIN_SIDE || height < MIN_SIDE {
        debug!(width, height, "Image too small for text detection");
        return Ok(Vec::new());
    }

    let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|e| {
        LegibleError::Internal(format!(
            "failed to create image source ({width}x{height}): {e}"
        ))
    })?;
    let input = engine
        .prepare_input(source)
        .map_err(|e| LegibleError::Internal(format!("OCR input preparation failed: {e}")))?;

    let words = engine
        .detect_words(&input)
        .map_err(|e| LegibleError::Internal(format!("word detection failed: {e}")))?;
    let lines = engine.find_text_lines(&input, &words);
    debug!(words = words.len(), lines = lines.len(), "Text lines found");

    let recognized = engine
        .recognize_text(&input, &lines)
        .map_err(|e| LegibleError::Internal(format!("line recognition failed: {e}")))?;

    let spans = recognized
        .iter()
        .flatten()
        .filter_map(|line| {
            let text = line.to_string();
            if text.trim().is_empty() {
                return None;
            }
            let rect = line.bounding_rect();
            let bounds =
                BoundingBox::from_edges(rect.left(), rect.top(), rect.right(), rect.bottom());
            Some(RecognitionSpan::new(text.trim(), 1.0).with_bounds(bounds))
        })
        .collect();

    Ok(spans)
}

/// Merge vertically adjacent lines into paragraph spans.
///
/// A line joins the current paragraph when it starts below it, overlaps it
/// horizontally, and the vertical gap is at most
/// [`PARAGRAPH_GAP_RATIO`] line heights. Texts are joined with a space,
/// boxes are unioned and the lowest confidence wins.
pub fn group_paragraphs(lines: Vec<RecognitionSpan>) -> Vec<RecognitionSpan> {
    let mut paragraphs: Vec<RecognitionSpan> = Vec::new();

    for line in lines {
        let joins = match (paragraphs.last(), line.bounds) {
            (Some(RecognitionSpan { bounds: Some(para), .. }), Some(next)) => {
                let gap = next.top - para.bottom();
                let line_height = next.height.max(1) as f32;
                next.top > para.top
                    && gap as f32 <= PARAGRAPH_GAP_RATIO * line_height
                    && para.overlaps_horizontally(&next)
            }
            _ => false,
        };

        match paragraphs.last_mut() {
            Some(para) if joins => {
                para.text.push(' ');
                para.text.push_str(&line.text);
                para.confidence = para.confidence.min(line.confidence);
                if let (Some(a), Some(b)) = (para.bounds, line.bounds) {
                    para.bounds = Some(a.union(&b));
                }
            }
            _ => paragraphs.push(line),
        }
    }

    paragraphs
}

#[async_trait]
impl Recognizer for NeuralRecognizer {
    fn engine(&self) -> Engine {
        Engine::Neural
    }

    async fn recognize(
        &self,
        image: Arc<DynamicImage>,
        _hints: &RecognitionHints,
    ) -> Result<Vec<RecognitionSpan>> {
        let engine = Arc::clone(&self.engine);
        let lines = tokio::task::spawn_blocking(move || recognize_lines(&engine, &image)).await??;

        let spans = match self.grouping {
            GroupingMode::Paragraph => group_paragraphs(lines),
            GroupingMode::Line => lines,
        };
        debug!(spans = spans.len(), grouping = ?self.grouping, "Neural recognition complete");
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, left: i32, top: i32, right: i32, bottom: i32) -> RecognitionSpan {
        RecognitionSpan::new(text, 1.0).with_bounds(BoundingBox::from_edges(left, top, right, bottom))
    }

    #[test]
    fn test_close_lines_form_a_paragraph() {
        let lines = vec![
            line("Querida abuela,", 10, 10, 200, 30),
            line("te escribo desde", 12, 34, 190, 54),
            line("la costa.", 10, 58, 120, 78),
            line("Un abrazo", 10, 150, 110, 170),
        ];

        let paragraphs = group_paragraphs(lines);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(
            paragraphs[0].text,
            "Querida abuela, te escribo desde la costa."
        );
        assert_eq!(
            paragraphs[0].bounds,
            Some(BoundingBox::from_edges(10, 10, 200, 78))
        );
        assert_eq!(paragraphs[1].text, "Un abrazo");
    }

    #[test]
    fn test_side_by_side_columns_stay_apart() {
        let lines = vec![
            line("izquierda", 0, 0, 100, 20),
            line("derecha", 300, 24, 400, 44),
        ];
        assert_eq!(group_paragraphs(lines).len(), 2);
    }

    #[test]
    fn test_lines_without_bounds_are_not_merged() {
        let lines = vec![
            RecognitionSpan::new("uno", 1.0),
            RecognitionSpan::new("dos", 1.0),
        ];
        assert_eq!(group_paragraphs(lines).len(), 2);
    }

    #[test]
    fn test_paragraph_takes_lowest_confidence() {
        let mut second = line("b", 0, 22, 50, 42);
        second.confidence = 0.4;
        let paragraphs = group_paragraphs(vec![line("a", 0, 0, 50, 20), second]);
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].confidence, 0.4);
    }

    #[test]
    fn test_missing_models_are_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        match NeuralRecognizer::load(dir.path(), GroupingMode::Paragraph) {
            Err(LegibleError::RecognizerUnavailable(reason)) => {
                assert!(reason.contains(DETECTION_MODEL_FILENAME), "{reason}")
            }
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("loading from an empty directory should fail"),
        }
    }
}
