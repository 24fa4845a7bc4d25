//! JSON bodies exchanged between the upload endpoint and its clients.

use crate::analysis::AnalysisOutcome;
use crate::parser::ParsedResult;
use serde::{Deserialize, Serialize};

/// Message returned when the quick check finds nothing to read
pub const NO_TEXT_MESSAGE: &str =
    "No readable text was detected in the image. Please try with a clearer image containing text.";

/// Success body of `POST /api/upload`.
///
/// Either `{ success, noTextFound, message, quickStop }` or `{ success, data }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_text_found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub quick_stop: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ParsedResult>,
}

impl UploadResponse {
    pub fn no_text() -> Self {
        Self {
            success: true,
            no_text_found: true,
            message: Some(NO_TEXT_MESSAGE.to_string()),
            quick_stop: true,
            data: None,
        }
    }

    pub fn analysis(result: ParsedResult) -> Self {
        Self {
            success: true,
            no_text_found: false,
            message: None,
            quick_stop: false,
            data: Some(result),
        }
    }
}

impl From<AnalysisOutcome> for UploadResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        match outcome {
            AnalysisOutcome::NoText => Self::no_text(),
            AnalysisOutcome::Complete(result) => Self::analysis(result),
        }
    }
}

/// `GET /health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `GET /info`
#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub version: String,
    pub model: Option<String>,
    pub oracle_configured: bool,
    pub target_script: String,
    pub max_file_size_bytes: usize,
    pub accepted_mime_prefix: String,
}
