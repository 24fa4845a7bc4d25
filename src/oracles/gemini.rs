//! Google Gemini oracle.
//!
//! Sends the prompt and the inline image to `models/{model}:generateContent`
//! and returns the concatenated text of the first candidate.

use crate::config::OracleSettings;
use crate::oracle::{Oracle, OracleError, OracleQuery};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub struct GeminiOracle {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Option<Duration>,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart<'a> {
    Text { text: &'a str },
    InlineData { inline_data: GeminiInlineData<'a> },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiOracle {
    /// Returns `None` when no API key is configured.
    pub fn from_settings(settings: &OracleSettings) -> Result<Option<Self>, OracleError> {
        let Some(api_key) = settings.api_key.clone() else {
            return Ok(None);
        };

        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Some(Self {
            client: builder.build()?,
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            timeout: settings.timeout,
        }))
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    fn name(&self) -> &str {
        &self.model
    }

    async fn evaluate(&self, query: &OracleQuery) -> Result<String, OracleError> {
        let start = Instant::now();

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::Text {
                        text: &query.prompt,
                    },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: &query.image.mime_type,
                            data: &query.image.data,
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: query.kind.max_output_tokens(),
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(self.timeout.map(|t| t.as_secs()).unwrap_or_default())
                } else {
                    OracleError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let gemini_response: GeminiResponse = response.json().await?;

        if let Some(error) = gemini_response.error {
            return Err(OracleError::Api {
                status: status.as_u16(),
                message: error.message,
            });
        }

        let text: String = gemini_response
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        tracing::debug!(
            "Gemini {} call finished in {}ms ({} chars)",
            query.kind.as_str(),
            start.elapsed().as_millis(),
            text.len()
        );

        if text.trim().is_empty() {
            return Err(OracleError::EmptyAnswer);
        }

        Ok(text)
    }
}
