//! Sending the selected image to the upload endpoint.

use super::error::ClientError;
use super::selection::SelectedImage;
use crate::api::UploadResponse;
use crate::error::ErrorBody;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

/// Fallback when a failed response carries no usable `error` field
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed";

/// Transport for one upload; the session drives it once per submit
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, image: &SelectedImage) -> Result<UploadResponse, ClientError>;
}

/// Multipart POST to `{server}/api/upload`
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploader {
    pub fn new(server_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/upload", server_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, image: &SelectedImage) -> Result<UploadResponse, ClientError> {
        let part = Part::bytes(image.data().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.mime_type())?;
        let form = Form::new().part("file", part);

        tracing::debug!(
            "Uploading {} ({} bytes) to {}",
            image.file_name(),
            image.size(),
            self.endpoint
        );

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: server_error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

fn server_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| UPLOAD_FAILED_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn png() -> SelectedImage {
        SelectedImage::new("sign.png", "image/png", b"\x89PNG\r\n\x1a\n".to_vec())
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let uploader = HttpUploader::new("http://localhost:9292/");
        assert_eq!(uploader.endpoint(), "http://localhost:9292/api/upload");
    }

    #[test]
    fn test_server_error_message_fallback() {
        assert_eq!(
            server_error_message(r#"{"error":"No file uploaded"}"#),
            "No file uploaded"
        );
        assert_eq!(server_error_message("<html>oops</html>"), UPLOAD_FAILED_MESSAGE);
        assert_eq!(server_error_message(r#"{"error":""}"#), UPLOAD_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_sends_file_field_and_decodes_success() {
        let router = Router::new().route(
            "/api/upload",
            post(|mut multipart: Multipart| async move {
                let field = multipart.next_field().await.unwrap().unwrap();
                assert_eq!(field.name(), Some("file"));
                assert_eq!(field.file_name(), Some("sign.png"));
                assert_eq!(field.content_type(), Some("image/png"));
                Json(json!({
                    "success": true,
                    "noTextFound": true,
                    "message": "nothing here",
                    "quickStop": true
                }))
            }),
        );
        let base = spawn(router).await;

        let response = HttpUploader::new(&base).upload(&png()).await.unwrap();
        assert!(response.success);
        assert!(response.no_text_found);
        assert!(response.quick_stop);
    }

    #[tokio::test]
    async fn test_non_success_surfaces_server_error() {
        let router = Router::new().route(
            "/api/upload",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Please upload an image file" })),
                )
            }),
        );
        let base = spawn(router).await;

        let err = HttpUploader::new(&base).upload(&png()).await.unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 400, .. }));
        assert_eq!(err.to_string(), "Please upload an image file");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let uploader = HttpUploader::new("http://127.0.0.1:1");
        let err = uploader.upload(&png()).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
