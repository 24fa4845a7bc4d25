use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Faults surfaced by the upload endpoint. Every variant renders as `{ error, code }`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("No file uploaded")]
    MissingFile,

    #[error("Please upload a valid image file")]
    NotAnImage { mime_type: String },

    #[error("File size too large. Please upload an image under {}", format_limit(.max))]
    ImageTooLarge {
        size: usize,
        max: usize,
        client_fault: bool,
    },

    #[error("Failed to analyze image with AI. Please try again.")]
    AnalysisFailed,

    #[error("Internal server error. Please try again.")]
    Internal(String),
}

/// Human size for the limit: `10MB`, `5.5MB`, `512KB`, `900 bytes`
fn format_limit(bytes: &usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;

    let (unit_size, unit) = match *bytes {
        b if b >= MIB => (MIB, "MB"),
        b if b >= KIB => (KIB, "KB"),
        b => return format!("{} bytes", b),
    };
    if bytes % unit_size == 0 {
        format!("{}{}", bytes / unit_size, unit)
    } else {
        format!("{:.1}{}", *bytes as f64 / unit_size as f64, unit)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MissingFile => StatusCode::BAD_REQUEST,
            ApiError::NotAnImage { .. } => StatusCode::BAD_REQUEST,
            ApiError::ImageTooLarge {
                client_fault: true, ..
            } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ImageTooLarge { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::AnalysisFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingApiKey => "API_KEY_MISSING",
            ApiError::MissingFile => "MISSING_FILE",
            ApiError::NotAnImage { .. } => "INVALID_FILE_TYPE",
            ApiError::ImageTooLarge { .. } => "IMAGE_TOO_LARGE",
            ApiError::AnalysisFailed => "ANALYSIS_FAILED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::Internal(detail) => tracing::error!("Request failed: {}", detail),
            ApiError::MissingApiKey => tracing::error!("GEMINI_API_KEY not configured"),
            other => tracing::warn!("Rejected upload: {}", other),
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
            code: Some(self.code().to_string()),
        });

        (status, body).into_response()
    }
}
