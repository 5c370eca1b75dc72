pub mod dto;
pub mod handlers;
pub mod openapi;
pub mod response;
pub mod router;

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use image::{DynamicImage, ImageFormat};
    use tower::ServiceExt;
    use serial_test::serial;

    use crate::api::routes::create_router;
    use crate::api::state::AppState;
    use crate::config::Config;
    use crate::error::Result;
    use crate::ocr::{
        Engine, RecognitionHints, RecognitionSpan, Recognizer, RecognizerSet,
        UnavailableRecognizer,
    };

    const BOUNDARY: &str = "legible-test-boundary";

    struct Fixed(Engine, Vec<&'static str>);

    #[async_trait]
    impl Recognizer for Fixed {
        fn engine(&self) -> Engine {
            self.0
        }

        async fn recognize(
            &self,
            _image: Arc<DynamicImage>,
            _hints: &RecognitionHints,
        ) -> Result<Vec<RecognitionSpan>> {
            Ok(self.1.iter().map(|t| RecognitionSpan::new(*t, 0.9)).collect())
        }
    }

    fn test_state(neural: Vec<&'static str>, classical: Vec<&'static str>) -> AppState {
        let engines = RecognizerSet::new(
            Arc::new(Fixed(Engine::Neural, neural)),
            Arc::new(Fixed(Engine::Classical, classical)),
            Arc::new(UnavailableRecognizer::new(
                Engine::Cloud,
                "OCR.Space API key not configured",
            )),
        );
        AppState::new(Config::default(), engines)
    }

    fn png_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::new_luma8(64, 48)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn multipart_request(uri: &str, content_type: &str, file: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn health_reports_engine_availability() {
        let app = create_router(test_state(vec![], vec![]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["engines"]["neural"], "available");
        assert_eq!(json["data"]["engines"]["cloud"], "unavailable");
    }

    #[tokio::test]
    #[serial]
    async fn pdf_upload_is_rejected() {
        let app = create_router(test_state(vec!["texto"], vec![]));

        let response = app
            .oneshot(multipart_request(
                "/api/v1/ocr",
                "application/pdf",
                b"%PDF-1.7",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "invalid_request");
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    #[serial]
    async fn image_upload_returns_cleaned_text() {
        let app = create_router(test_state(
            vec!["Hola   mundo"],
            vec!["»» Segunda línea"],
        ));

        let response = app
            .oneshot(multipart_request("/api/v1/ocr", "image/png", &png_bytes()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["text"], "Hola mundo\nSegunda línea");
        assert_eq!(json["data"]["mime"], "image/png");
        assert_eq!(json["data"]["source"], "local");
    }

    #[tokio::test]
    #[serial]
    async fn empty_engines_are_unprocessable() {
        let app = create_router(test_state(vec![], vec![]));

        let response = app
            .oneshot(multipart_request("/api/v1/ocr", "image/png", &png_bytes()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "no_text_detected");
    }

    #[tokio::test]
    #[serial]
    async fn cloud_without_key_is_not_implemented() {
        let app = create_router(test_state(vec![], vec![]));

        let response = app
            .oneshot(multipart_request(
                "/api/v1/ocr:cloud",
                "image/png",
                &png_bytes(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "not_implemented");
    }

    #[tokio::test]
    #[serial]
    async fn missing_file_field_is_invalid() {
        let app = create_router(test_state(vec![], vec![]));
        let body = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\nspa\r\n--{BOUNDARY}--\r\n");

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/ocr")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Missing required 'file' field");
    }

    #[tokio::test]
    #[serial]
    async fn openapi_lists_ocr_paths() {
        let app = create_router(test_state(vec![], vec![]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["paths"].get("/api/v1/ocr").is_some());
        assert!(json["paths"].get("/api/v1/ocr:cloud").is_some());
    }
}
