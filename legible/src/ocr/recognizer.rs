use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use serde::Serialize;

use super::{RecognitionHints, RecognitionSpan};
use crate::error::{LegibleError, Result};

/// The engines a deployment can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Neural,
    Classical,
    Cloud,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Neural => write!(f, "neural"),
            Engine::Classical => write!(f, "classical"),
            Engine::Cloud => write!(f, "cloud"),
        }
    }
}

/// A text recognition engine.
///
/// Implementations own any model state they need; `recognize` may be called
/// concurrently from many requests.
#[async_trait]
pub trait Recognizer: Send + Sync {
    fn engine(&self) -> Engine;

    fn is_available(&self) -> bool {
        true
    }

    async fn recognize(
        &self,
        image: Arc<DynamicImage>,
        hints: &RecognitionHints,
    ) -> Result<Vec<RecognitionSpan>>;
}

/// Stand-in for an engine that could not be initialised.
#[derive(Debug, Clone)]
pub struct UnavailableRecognizer {
    engine: Engine,
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(engine: Engine, reason: impl Into<String>) -> Self {
        Self {
            engine,
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[async_trait]
impl Recognizer for UnavailableRecognizer {
    fn engine(&self) -> Engine {
        self.engine
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn recognize(
        &self,
        _image: Arc<DynamicImage>,
        _hints: &RecognitionHints,
    ) -> Result<Vec<RecognitionSpan>> {
        Err(LegibleError::RecognizerUnavailable(self.reason.clone()))
    }
}
