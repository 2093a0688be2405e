use anyhow::Result;
use axum::{extract::State, http::{HeaderValue, StatusCode}, routing::{get, post}, Json, Router};
use rag_core::{EngineConfig, QaEngine, QaResponse, RagError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MIN_QUESTION_CHARS: usize = 3;
const MAX_QUESTION_CHARS: usize = 1000;

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub documents_indexed: usize,
    pub chunks_indexed: usize,
    pub vocabulary_size: usize,
    pub index_loaded: bool,
    pub status: &'static str,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "detail": detail.into() })))
}

#[derive(Clone)]
pub struct AppState {
    /// `None` when no index was found at startup; /ask then answers 503.
    pub engine: Option<Arc<QaEngine>>,
}

/// Load the index once and build the router around it. A missing index still serves
/// /health and /stats; any other load failure is fatal.
pub fn build_app(index_dir: String) -> Result<Router> {
    let engine = match QaEngine::open(&index_dir, EngineConfig::from_env()) {
        Ok(engine) => Some(Arc::new(engine)),
        Err(RagError::IndexNotFound { path }) => {
            tracing::warn!(path = %path.display(), "index not found; /ask will be unavailable");
            None
        }
        Err(e) => return Err(e.into()),
    };
    Ok(router(AppState { engine }))
}

/// Origins from CORS_ALLOW_ORIGIN; any origin when it is unset or holds nothing parseable.
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    let allow = if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) };
    CorsLayer::new().allow_origin(allow).allow_methods(Any).allow_headers(Any)
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(|| async { Json(serde_json::json!({ "status": "healthy" })) }))
        .route("/stats", get(stats_handler))
        .route("/ask", post(ask_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "name": "Filing QA API", "version": env!("CARGO_PKG_VERSION") }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let resp = match &state.engine {
        Some(engine) => {
            let stats = engine.stats();
            StatsResponse {
                documents_indexed: stats.document_count,
                chunks_indexed: stats.chunk_count,
                vocabulary_size: stats.vocabulary_size,
                index_loaded: true,
                status: "ready",
            }
        }
        None => StatsResponse { documents_indexed: 0, chunks_indexed: 0, vocabulary_size: 0, index_loaded: false, status: "no_index" },
    };
    Json(resp)
}

pub async fn ask_handler(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Result<Json<QaResponse>, ApiError> {
    let question = req.question.trim();
    let len = question.chars().count();
    if !(MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&len) {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("question must be {MIN_QUESTION_CHARS}-{MAX_QUESTION_CHARS} characters"),
        ));
    }
    let engine = state
        .engine
        .as_ref()
        .ok_or_else(|| api_error(StatusCode::SERVICE_UNAVAILABLE, "index not loaded; run the indexer first"))?;
    match engine.synthesize(question) {
        Ok(resp) => Ok(Json(resp)),
        Err(e) => {
            tracing::error!(error = %e, "ask failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
