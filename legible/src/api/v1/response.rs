//! # V1 API Response Envelope & Error Contract
//!
//! Every v1 endpoint returns an [`ApiResponse<T>`] envelope:
//!
//! ```json
//! {
//!   "data": { ... },                                       // on success
//!   "error": { "code": "no_text_detected", "message": "..." }  // on error
//! }
//! ```
//!
//! Exactly one of the two fields is present.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::LegibleError;

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing file, non-image content type or undecodable image. HTTP 400.
    InvalidRequest,
    /// Upload or cloud payload exceeds its size limit. HTTP 413.
    PayloadTooLarge,
    /// The image was processed but no usable text survived. HTTP 422.
    NoTextDetected,
    /// The cloud service accepted the request but could not process the
    /// image. HTTP 422.
    RemoteRejected,
    /// The cloud service was unreachable or answered with an HTTP error.
    /// HTTP 502.
    UpstreamError,
    /// An unexpected server-side error occurred. Internal details are never
    /// leaked to the client. HTTP 500.
    InternalError,
    /// The engine behind this endpoint is not configured. HTTP 501.
    NotImplemented,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NoTextDetected | Self::RemoteRejected => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UpstreamError => StatusCode::BAD_GATEWAY,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::PayloadTooLarge => write!(f, "payload_too_large"),
            Self::NoTextDetected => write!(f, "no_text_detected"),
            Self::RemoteRejected => write!(f, "remote_rejected"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::InternalError => write!(f, "internal_error"),
            Self::NotImplemented => write!(f, "not_implemented"),
        }
    }
}

/// Structured error payload within the API envelope.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<LegibleError> for ApiResponse<T> {
    /// Convert a [`LegibleError`] into a v1 [`ApiResponse`].
    ///
    /// Internal error details are **never** leaked to the client. For
    /// `internal_error` responses, a generic message is returned and the
    /// real error is logged via `tracing::error!`.
    fn from(err: LegibleError) -> Self {
        match err {
            LegibleError::InvalidInput(msg) => ApiResponse::error(ErrorCode::InvalidRequest, msg),

            LegibleError::Decode(msg) => ApiResponse::error(
                ErrorCode::InvalidRequest,
                format!("Could not decode image: {msg}"),
            ),

            ref e @ LegibleError::NoTextDetected => {
                ApiResponse::error(ErrorCode::NoTextDetected, e.to_string())
            }

            ref e @ LegibleError::PayloadTooLarge { .. } => {
                ApiResponse::error(ErrorCode::PayloadTooLarge, e.to_string())
            }

            LegibleError::RemoteProcessing(msg) => {
                tracing::warn!(message = %msg, "Cloud OCR rejected the image");
                ApiResponse::error(ErrorCode::RemoteRejected, msg)
            }

            ref e @ (LegibleError::RemoteHttp { .. } | LegibleError::RemoteTransport(_)) => {
                tracing::warn!(error = %e, "Cloud OCR request failed");
                ApiResponse::error(ErrorCode::UpstreamError, e.to_string())
            }

            LegibleError::RecognizerUnavailable(msg) => {
                ApiResponse::error(ErrorCode::NotImplemented, msg)
            }

            ref internal @ (LegibleError::Internal(_)
            | LegibleError::Io(_)
            | LegibleError::Json(_)
            | LegibleError::Http(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(err: LegibleError) -> ErrorCode {
        let resp: ApiResponse<()> = err.into();
        resp.error.expect("error").code
    }

    #[test]
    fn success_response_serializes_without_error() {
        let resp = ApiResponse::success("hello");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["data"], "hello");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn error_response_serializes_without_data() {
        let resp = ApiResponse::<()>::error(ErrorCode::NoTextDetected, "nothing");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "no_text_detected");
        assert_eq!(json["error"]["message"], "nothing");
    }

    #[test]
    fn error_code_status_mapping() {
        assert_eq!(ErrorCode::InvalidRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ErrorCode::NoTextDetected.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::RemoteRejected.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ErrorCode::UpstreamError.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorCode::NotImplemented.status(),
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn error_code_display_matches_wire_format() {
        for code in [
            ErrorCode::InvalidRequest,
            ErrorCode::PayloadTooLarge,
            ErrorCode::NoTextDetected,
            ErrorCode::RemoteRejected,
            ErrorCode::UpstreamError,
            ErrorCode::InternalError,
            ErrorCode::NotImplemented,
        ] {
            let json = serde_json::to_value(&code).expect("serialize");
            assert_eq!(json, code.to_string());
        }
    }

    #[test]
    fn legible_errors_map_to_codes() {
        assert_eq!(
            code_of(LegibleError::InvalidInput("pdf".into())),
            ErrorCode::InvalidRequest
        );
        assert_eq!(
            code_of(LegibleError::Decode("bad".into())),
            ErrorCode::InvalidRequest
        );
        assert_eq!(code_of(LegibleError::NoTextDetected), ErrorCode::NoTextDetected);
        assert_eq!(
            code_of(LegibleError::PayloadTooLarge {
                size: 2_000_000,
                limit: 1_500_000
            }),
            ErrorCode::PayloadTooLarge
        );
        assert_eq!(
            code_of(LegibleError::RemoteProcessing("E500".into())),
            ErrorCode::RemoteRejected
        );
        assert_eq!(
            code_of(LegibleError::RemoteHttp {
                status: 403,
                message: "bad key".into()
            }),
            ErrorCode::UpstreamError
        );
        assert_eq!(
            code_of(LegibleError::RemoteTransport("Request timeout".into())),
            ErrorCode::UpstreamError
        );
        assert_eq!(
            code_of(LegibleError::RecognizerUnavailable("no key".into())),
            ErrorCode::NotImplemented
        );
    }

    #[test]
    fn internal_error_does_not_leak() {
        let resp: ApiResponse<()> = LegibleError::Internal("secret debug info".into()).into();
        let err = resp.error.as_ref().expect("error");
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "An internal error occurred");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
