use axum::Json;
use utoipa::OpenApi;

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Legible API",
        version = "1.0.0",
        description = "Image preprocessing and multi-engine OCR.",
    ),
    paths(
        handlers::health::health_check,
        handlers::ocr::extract_text,
        handlers::ocr::extract_text_cloud,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        // OCR
        dto::ocr::OcrSource,
        dto::ocr::OcrResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::EnginesStatus,
    )),
    tags(
        (name = "health", description = "Health check and engine availability"),
        (name = "ocr", description = "Text extraction from images"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
