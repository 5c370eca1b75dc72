use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::classical::TesseractRecognizer;
use super::cloud::OcrSpaceClient;
use super::neural::NeuralRecognizer;
use super::{Engine, Recognizer, UnavailableRecognizer};
use crate::config::Config;
use crate::error::Result;

/// Which engines came up at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineAvailability {
    pub neural: bool,
    pub classical: bool,
    pub cloud: bool,
}

/// The three recognizers a deployment runs. Engines that fail to initialise
/// are replaced by an [`UnavailableRecognizer`] so the process still starts.
#[derive(Clone)]
pub struct RecognizerSet {
    pub neural: Arc<dyn Recognizer>,
    pub classical: Arc<dyn Recognizer>,
    pub cloud: Arc<dyn Recognizer>,
}

fn available_or_stub<R>(engine: Engine, result: Result<R>) -> Arc<dyn Recognizer>
where
    R: Recognizer + 'static,
{
    match result {
        Ok(recognizer) => {
            info!(%engine, "OCR engine initialized");
            Arc::new(recognizer)
        }
        Err(e) => {
            let reason = e.to_string();
            warn!(%engine, "OCR engine unavailable: {}", reason);
            Arc::new(UnavailableRecognizer::new(engine, reason))
        }
    }
}

impl RecognizerSet {
    pub fn new(
        neural: Arc<dyn Recognizer>,
        classical: Arc<dyn Recognizer>,
        cloud: Arc<dyn Recognizer>,
    ) -> Self {
        Self {
            neural,
            classical,
            cloud,
        }
    }

    /// Initialise every engine from configuration. Never fails; missing
    /// models, language data or API keys leave that engine unavailable.
    pub async fn load(config: &Config) -> Self {
        let model_dir = config.ocr.neural_model_dir.clone();
        let grouping = config.ocr.grouping;
        let neural =
            match tokio::task::spawn_blocking(move || NeuralRecognizer::load(&model_dir, grouping))
                .await
            {
                Ok(result) => result,
                Err(e) => Err(e.into()),
            };

        let classical = TesseractRecognizer::new(&config.ocr.languages);
        let cloud = OcrSpaceClient::new(&config.cloud);

        Self {
            neural: available_or_stub(Engine::Neural, neural),
            classical: available_or_stub(Engine::Classical, classical),
            cloud: available_or_stub(Engine::Cloud, cloud),
        }
    }

    pub fn availability(&self) -> EngineAvailability {
        EngineAvailability {
            neural: self.neural.is_available(),
            classical: self.classical.is_available(),
            cloud: self.cloud.is_available(),
        }
    }
}
