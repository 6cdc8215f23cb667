use crate::config::Config;
use crate::error::ApiError;
use crate::preprocessing::{
    NormalizationResult, Pipeline, PipelineOptions, ResampleFilter, StepTiming, MODEL_INPUT_SIZE,
};
use crate::raster::{BoundingBox, RasterImage};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Formats the decoder accepts for uploads
const SUPPORTED_FORMATS: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/bmp",
    "image/webp",
    "image/tiff",
];

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

/// Normalization response
#[derive(Serialize)]
pub struct NormalizeResponse {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub pixels: Vec<u8>,
    pub bounding_box: BoundingBox,
    pub filter: ResampleFilter,
    pub processing_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

impl From<NormalizationResult> for NormalizeResponse {
    fn from(result: NormalizationResult) -> Self {
        Self {
            width: result.buffer.width(),
            height: result.buffer.height(),
            stride: result.buffer.stride(),
            pixels: result.buffer.into_bytes(),
            bounding_box: result.bounding_box,
            filter: result.filter,
            processing_time_ms: result.total_time_ms,
            steps: result.steps,
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub supported_formats: Vec<String>,
    pub input_width: u32,
    pub input_height: u32,
    pub default_filter: ResampleFilter,
    pub available_filters: Vec<ResampleFilter>,
    pub max_file_size_bytes: usize,
}

/// Build the router, separate from `run` so tests can drive it directly
pub fn router(config: Config) -> Router {
    let max_file_size = config.max_file_size;
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/normalize", post(handle_normalize))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_file_size)),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle normalization requests
async fn handle_normalize(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<NormalizeResponse>, ApiError> {
    let start = Instant::now();

    let mut file_data: Option<Bytes> = None;
    let mut filter = state.config.filter;

    // Parse multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                if let Some(mime) = field.content_type() {
                    if !SUPPORTED_FORMATS.contains(&mime) {
                        tracing::warn!("Received file with content type: {}", mime);
                    }
                }
                file_data = Some(field.bytes().await.map_err(|e| {
                    ApiError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            "filter" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::InvalidRequest(format!("Invalid filter: {}", e))
                })?;
                filter = ResampleFilter::from_str(value.trim()).ok_or_else(|| {
                    ApiError::InvalidRequest(format!("Unknown filter: {}", value))
                })?;
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or(ApiError::MissingFile)?;

    if data.len() > state.config.max_file_size {
        return Err(ApiError::ImageTooLarge {
            size: data.len(),
            max: state.config.max_file_size,
        });
    }

    // Decoding and resampling are CPU bound
    let result = tokio::task::spawn_blocking(move || -> Result<NormalizationResult, ApiError> {
        let decoded =
            image::load_from_memory(&data).map_err(|e| ApiError::Decode(e.to_string()))?;
        let capture = RasterImage::from_dynamic(&decoded)?;
        let pipeline = Pipeline::new(PipelineOptions { filter });
        Ok(pipeline.process(&capture)?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Normalization task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Normalized capture in {}ms (pipeline {}ms), ink box {:?}",
        processing_time_ms,
        result.total_time_ms,
        result.bounding_box
    );

    let mut response = NormalizeResponse::from(result);
    response.processing_time_ms = processing_time_ms;
    Ok(Json(response))
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
        supported_formats: SUPPORTED_FORMATS.iter().map(|s| s.to_string()).collect(),
        input_width: MODEL_INPUT_SIZE,
        input_height: MODEL_INPUT_SIZE,
        default_filter: state.config.filter,
        available_filters: ResampleFilter::ALL.to_vec(),
        max_file_size_bytes: state.config.max_file_size,
    })
}
