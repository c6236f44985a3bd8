use crate::analytics::DatasetOverview;
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics::{CLASSIFICATION_DURATION_SECONDS, CLASSIFICATION_REQUESTS_TOTAL};
use crate::ml::CategoryPrediction;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        categories: state.pipeline.category_names().len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub categories: usize,
}

/// Classify the `query` parameter
pub async fn classify_query(
    State(state): State<AppState>,
    Query(params): Query<ClassifyQuery>,
) -> Result<Json<CategoryPrediction>> {
    let request = ClassifyRequest {
        message: params.query,
    };
    classify(&state, request).map(Json)
}

/// Classify a JSON message body
pub async fn classify_message(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<CategoryPrediction>> {
    classify(&state, request).map(Json)
}

#[derive(Debug, Deserialize)]
pub struct ClassifyQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClassifyRequest {
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

fn classify(state: &AppState, request: ClassifyRequest) -> Result<CategoryPrediction> {
    if let Err(e) = request.validate() {
        CLASSIFICATION_REQUESTS_TOTAL
            .with_label_values(&["invalid"])
            .inc();
        return Err(AppError::from(e));
    }

    let timer = CLASSIFICATION_DURATION_SECONDS.start_timer();
    let result = state.pipeline.classify(&request.message);
    timer.observe_duration();

    let status = if result.is_ok() { "success" } else { "error" };
    CLASSIFICATION_REQUESTS_TOTAL
        .with_label_values(&[status])
        .inc();

    let prediction = result?;
    tracing::debug!(positive = ?prediction.positive, "Classified message");
    Ok(prediction)
}

/// Dataset overview (genre and category counts)
pub async fn overview(State(state): State<AppState>) -> Json<DatasetOverview> {
    Json(state.overview.as_ref().clone())
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    if !state.prometheus_enabled {
        return (StatusCode::NOT_FOUND, String::new());
    }
    (StatusCode::OK, crate::metrics::gather_metrics())
}
