use crate::analysis::Analyzer;
use crate::api::{HealthResponse, InfoResponse, UploadResponse};
use crate::config::Config;
use crate::error::ApiError;
use crate::oracles;
use crate::upload::{UploadLimits, UploadedImage, FALLBACK_MIME_TYPE, IMAGE_MIME_PREFIX};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// `None` while no oracle credential is configured
    pub analyzer: Option<Arc<Analyzer>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, analyzer: Option<Arc<Analyzer>>) -> Self {
        Self {
            analyzer,
            config: Arc::new(config),
        }
    }

    /// Build the oracle described by the configuration
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let analyzer = oracles::from_settings(&config.oracle)?
            .map(|oracle| Arc::new(Analyzer::new(oracle, config.target_script)));
        Ok(Self::new(config, analyzer))
    }

    fn limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size: self.config.max_file_size,
            oversize_status: self.config.oversize_status,
        }
    }
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .route("/api/upload", post(handle_upload))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_body_size)),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let state = AppState::from_config(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle image uploads
async fn handle_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let start = Instant::now();

    // Credential is checked before the body is touched
    let analyzer = state.analyzer.clone().ok_or(ApiError::MissingApiKey)?;

    let mut multipart = multipart
        .map_err(|e| ApiError::Internal(format!("Failed to parse multipart: {}", e)))?;
    let limits = state.limits();
    let image = read_image_field(&mut multipart)
        .await
        .map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                // Body cap tripped while the form was being read
                let size = content_length(&headers).unwrap_or(state.config.max_body_size + 1);
                limits.too_large(size)
            } else {
                ApiError::Internal(format!("Failed to read multipart body: {}", e))
            }
        })?
        .ok_or(ApiError::MissingFile)?;

    limits.validate(&image)?;

    tracing::info!(
        "Starting analysis of {} upload ({} bytes)",
        image.mime_type(),
        image.size()
    );

    let outcome = analyzer.analyze(&image).await.map_err(|e| {
        tracing::error!("Oracle analysis failed: {}", e);
        ApiError::AnalysisFailed
    })?;

    tracing::info!("Upload handled in {}ms", start.elapsed().as_millis());

    Ok(Json(outcome.into()))
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Pull the `file` field out of the form, ignoring anything else
async fn read_image_field(
    multipart: &mut Multipart,
) -> Result<Option<UploadedImage>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let mime_type = field
            .content_type()
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();
        let data = field.bytes().await?;

        return Ok(Some(UploadedImage::new(data, mime_type)));
    }

    Ok(None)
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state
            .analyzer
            .as_ref()
            .map(|analyzer| analyzer.oracle_name().to_string()),
        oracle_configured: state.analyzer.is_some(),
        target_script: state.config.target_script.to_string(),
        max_file_size_bytes: state.config.max_file_size,
        accepted_mime_prefix: IMAGE_MIME_PREFIX.to_string(),
    })
}
