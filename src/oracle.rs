use crate::upload::UploadedImage;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

/// Failures while consulting the oracle. Callers collapse these into one
/// generic "analysis failed" outcome; the detail only reaches the logs.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Oracle API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Oracle returned no text")]
    EmptyAnswer,

    #[error("Oracle call timed out after {0}s")]
    Timeout(u64),
}

/// Image payload encoded for transport (base64 text)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn encode(image: &UploadedImage) -> Self {
        Self {
            mime_type: image.mime_type().to_string(),
            data: STANDARD.encode(image.data()),
        }
    }
}

/// Which of the two per-request questions a query asks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Does the image contain readable text at all
    QuickCheck,
    /// Full section-labelled extraction
    Extraction,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuickCheck => "quick-check",
            Self::Extraction => "extraction",
        }
    }

    /// Output budget requested from the model.
    ///
    /// Reasoning models spend hidden tokens out of this budget, so the quick
    /// check keeps room beyond its one-word answer.
    pub fn max_output_tokens(&self) -> u32 {
        match self {
            Self::QuickCheck => 256,
            Self::Extraction => 8192,
        }
    }
}

/// Prompt plus image, built fresh for each call
#[derive(Debug, Clone)]
pub struct OracleQuery {
    pub kind: QueryKind,
    pub prompt: String,
    pub image: InlineImage,
}

impl OracleQuery {
    pub fn new(kind: QueryKind, prompt: impl Into<String>, image: InlineImage) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            image,
        }
    }
}

/// External multimodal model answering a prompt about an image
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Identifier for logs and `/info` (e.g., "gemini-1.5-flash")
    fn name(&self) -> &str;

    /// Ask the model and return its free-text answer
    async fn evaluate(&self, query: &OracleQuery) -> Result<String, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    #[test]
    fn test_inline_image_is_base64() {
        let image = UploadedImage::new(Bytes::from_static(b"\x89PNG\r\n"), "image/png");
        let inline = InlineImage::encode(&image);
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "iVBORw0K");
    }

    #[test]
    fn test_quick_check_budget_leaves_room_for_reasoning() {
        assert_eq!(QueryKind::QuickCheck.max_output_tokens(), 256);
        assert!(
            QueryKind::Extraction.max_output_tokens() > QueryKind::QuickCheck.max_output_tokens()
        );
    }
}
