//! v1 OCR handlers.
//!
//! Both endpoints take a multipart upload with a `file` field. The declared
//! part content type is the MIME the service validates; when a client sends
//! none (or a generic `application/octet-stream`), it is guessed from the
//! file name.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::api::v1::dto::OcrResponse;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;

const GENERIC_MIME: &str = "application/octet-stream";

struct Upload {
    bytes: Vec<u8>,
    mime: Option<String>,
    language: Option<String>,
}

fn declared_mime(content_type: Option<&str>, file_name: Option<&str>) -> Option<String> {
    match content_type.map(str::trim) {
        Some(ct) if !ct.is_empty() && !ct.eq_ignore_ascii_case(GENERIC_MIME) => {
            Some(ct.to_string())
        }
        _ => file_name
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|mime| mime.essence_str().to_string())
            .or_else(|| content_type.map(str::to_string)),
    }
}

async fn read_upload<T: Serialize>(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<Upload, ApiResponse<T>> {
    let mut bytes: Option<Vec<u8>> = None;
    let mut mime: Option<String> = None;
    let mut language: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ApiResponse::error(
                    ErrorCode::PayloadTooLarge,
                    format!("Upload exceeds {max_bytes} bytes"),
                ));
            }
            Err(e) => {
                return Err(ApiResponse::error(
                    ErrorCode::InvalidRequest,
                    format!("Malformed multipart body: {}", e.body_text()),
                ));
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                mime = declared_mime(field.content_type(), field.file_name());

                let data = match field.bytes().await {
                    Ok(b) => b,
                    Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                        return Err(ApiResponse::error(
                            ErrorCode::PayloadTooLarge,
                            format!("Upload exceeds {max_bytes} bytes"),
                        ));
                    }
                    Err(e) => {
                        return Err(ApiResponse::error(
                            ErrorCode::InvalidRequest,
                            format!("Failed to read file: {}", e.body_text()),
                        ));
                    }
                };

                if data.len() > max_bytes {
                    return Err(ApiResponse::error(
                        ErrorCode::PayloadTooLarge,
                        format!(
                            "File too large: {} bytes (max {} bytes)",
                            data.len(),
                            max_bytes
                        ),
                    ));
                }

                bytes = Some(data.to_vec());
            }
            "language" | "lang" => {
                language = match field.text().await {
                    Ok(t) if !t.trim().is_empty() => Some(t.trim().to_string()),
                    Ok(_) => None,
                    Err(e) => {
                        return Err(ApiResponse::error(
                            ErrorCode::InvalidRequest,
                            format!("Invalid language: {}", e.body_text()),
                        ));
                    }
                };
            }
            _ => {}
        }
    }

    let Some(bytes) = bytes else {
        return Err(ApiResponse::error(
            ErrorCode::InvalidRequest,
            "Missing required 'file' field",
        ));
    };
    if bytes.is_empty() {
        return Err(ApiResponse::error(
            ErrorCode::InvalidRequest,
            "Uploaded file is empty",
        ));
    }

    debug!(bytes = bytes.len(), mime = ?mime, "Received upload");
    Ok(Upload {
        bytes,
        mime,
        language,
    })
}

/// `POST /api/v1/ocr`
///
/// Runs the preprocessing pipeline and both local engines, then returns the
/// merged, cleaned text.
#[utoipa::path(
    post,
    path = "/api/v1/ocr",
    tag = "ocr",
    operation_id = "ocr.extract",
    request_body(content_type = "multipart/form-data", content = String, description = "Multipart form with an image in the `file` field"),
    responses(
        (status = 200, description = "Text extracted", body = OcrResponse),
        (status = 400, description = "Missing file, non-image content type or undecodable image", body = ApiError),
        (status = 413, description = "Upload too large", body = ApiError),
        (status = 422, description = "No text detected", body = ApiError),
    )
)]
pub async fn extract_text(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResponse<OcrResponse> {
    let upload = match read_upload(&mut multipart, state.config.server.max_upload_bytes).await {
        Ok(upload) => upload,
        Err(resp) => return resp,
    };

    match state
        .extraction
        .extract(upload.bytes, upload.mime.as_deref())
        .await
    {
        Ok(extraction) => ApiResponse::success(OcrResponse::from(extraction)),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/ocr:cloud`
///
/// Sends the original image to OCR.Space. An optional `language` field picks
/// the OCR.Space language code; unsupported codes fall back to the
/// configured default.
#[utoipa::path(
    post,
    path = "/api/v1/ocr:cloud",
    tag = "ocr",
    operation_id = "ocr.extractCloud",
    request_body(content_type = "multipart/form-data", content = String, description = "Multipart form with an image in the `file` field and an optional `language` field"),
    responses(
        (status = 200, description = "Text extracted", body = OcrResponse),
        (status = 400, description = "Missing file, non-image content type or undecodable image", body = ApiError),
        (status = 413, description = "Upload or compressed payload too large", body = ApiError),
        (status = 422, description = "No text detected or image rejected by OCR.Space", body = ApiError),
        (status = 501, description = "Cloud OCR not configured", body = ApiError),
        (status = 502, description = "OCR.Space unreachable or returned an HTTP error", body = ApiError),
    )
)]
pub async fn extract_text_cloud(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResponse<OcrResponse> {
    let upload = match read_upload(&mut multipart, state.config.server.max_upload_bytes).await {
        Ok(upload) => upload,
        Err(resp) => return resp,
    };

    let mime = upload.mime.clone().unwrap_or_default();
    match state
        .extraction
        .extract_cloud(
            upload.bytes,
            upload.mime.as_deref(),
            upload.language.as_deref(),
        )
        .await
    {
        Ok(result) => ApiResponse::success(OcrResponse::from_cloud(result, mime)),
        Err(e) => e.into(),
    }
}
