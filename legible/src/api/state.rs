use std::sync::Arc;

use crate::config::Config;
use crate::ocr::RecognizerSet;
use crate::services::ExtractionService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub extraction: ExtractionService,
}

impl AppState {
    pub fn new(config: Config, engines: RecognizerSet) -> Self {
        let extraction = ExtractionService::new(engines, &config);
        Self {
            config: Arc::new(config),
            extraction,
        }
    }
}
