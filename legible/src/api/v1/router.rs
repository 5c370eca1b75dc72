use axum::{
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;

pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .route("/ocr", post(handlers::ocr::extract_text))
        .route("/ocr:cloud", post(handlers::ocr::extract_text_cloud))
}
