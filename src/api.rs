use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::feedback::{InsightRecord, PipelineError, Summarizer};
use crate::present::{interleave_by_source, DISPLAY_LIMIT, DISPLAY_SOURCES};
use crate::sources::{collect_feedback, FeedbackSource};

#[derive(Clone)]
pub struct AppState {
    pub summarizer: Summarizer,
    pub sources: Arc<Vec<Box<dyn FeedbackSource>>>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/insights/summarize", post(summarize))
        .route("/insights/collect", post(collect))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct SummarizeReq {
    /// Raw JSON so a non-collection payload surfaces as an input-shape error.
    #[serde(default)]
    items: serde_json::Value,
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Deserialize)]
struct CollectReq {
    #[serde(default)]
    prompt: Option<String>,
}

pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::InputShape { .. } | PipelineError::MissingProvenance { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PipelineError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        };
        tracing::warn!(error = %self.0, status = status.as_u16(), "insights request failed");
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

async fn summarize(
    State(state): State<AppState>,
    Json(body): Json<SummarizeReq>,
) -> Result<Json<Vec<InsightRecord>>, ApiError> {
    let out = state
        .summarizer
        .summarize_value(body.items, body.prompt.as_deref())
        .await?;
    Ok(Json(out))
}

async fn collect(
    State(state): State<AppState>,
    Json(body): Json<CollectReq>,
) -> Result<Json<Vec<InsightRecord>>, ApiError> {
    let items = collect_feedback(&state.sources).await;
    let insights = state
        .summarizer
        .summarize(&items, body.prompt.as_deref())
        .await?;
    Ok(Json(interleave_by_source(
        &insights,
        &DISPLAY_SOURCES,
        DISPLAY_LIMIT,
    )))
}
