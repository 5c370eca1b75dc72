//! Text recognition engines.
//!
//! Every engine implements [`Recognizer`]: the `ocrs` neural engine and
//! Tesseract run locally on the preprocessed grid, OCR.Space receives the
//! original image. [`RecognizerSet::load`] brings all three up and swaps any
//! engine that fails to initialise for an [`UnavailableRecognizer`].

mod classical;
mod cloud;
mod neural;
pub mod payload;
mod provider;
mod recognizer;
mod span;

pub use classical::TesseractRecognizer;
pub use cloud::{resolve_language, OcrSpaceClient, SUPPORTED_LANGUAGES};
pub use neural::{group_paragraphs, NeuralRecognizer};
pub use payload::{fit_payload, fit_payload_bytes, JPEG_QUALITIES};
pub use provider::{EngineAvailability, RecognizerSet};
pub use recognizer::{Engine, Recognizer, UnavailableRecognizer};
pub use span::{BoundingBox, RecognitionHints, RecognitionSpan};
