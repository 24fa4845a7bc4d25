//! Oracle implementations
//!
//! Only Gemini is wired up today. Tests substitute their own `Oracle`.

pub mod gemini;

use crate::config::OracleSettings;
use crate::oracle::{Oracle, OracleError};
use std::sync::Arc;

/// Build the configured oracle, or `None` when the credential is absent.
///
/// A missing credential is not a startup failure: the server still starts and
/// answers each upload with a configuration error.
pub fn from_settings(settings: &OracleSettings) -> Result<Option<Arc<dyn Oracle>>, OracleError> {
    match gemini::GeminiOracle::from_settings(settings)? {
        Some(oracle) => {
            tracing::info!("Using Gemini oracle (model: {})", settings.model);
            Ok(Some(Arc::new(oracle)))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY is not set; uploads will fail until it is configured");
            Ok(None)
        }
    }
}
