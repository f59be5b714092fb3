// src/api.rs
//! HTTP surface: a fixed routing table over the summary aggregator, with the
//! frontend's static files as fallback.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    handler::HandlerWithoutStateExt,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::error;

use crate::config::AppConfig;
use crate::metrics::record_request;
use crate::summary::{self, SummaryError};

pub const MSG_NO_SUMMARIES: &str = "no summaries found";
pub const MSG_NO_FOLDERS: &str = "no dated folders found";
pub const MSG_NOT_FOUND: &str = "not found";

const ALLOW_METHODS: &str = "GET, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Internal(String),
}

impl From<SummaryError> for ApiError {
    fn from(e: SummaryError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(msg) => {
                error!(error = %msg, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// Build the application router. Every response carries allow-all CORS headers.
pub fn router(state: AppState) -> Router {
    router_with(state, Router::new())
}

/// Same as [`router`], with `extra` routes (e.g. `/metrics`) behind the same layers.
pub fn router_with(state: AppState, extra: Router<AppState>) -> Router {
    let static_files =
        ServeDir::new(&state.config.frontend_dir).not_found_service(not_found.into_service());

    Router::new()
        .merge(extra)
        .route("/get_article_summary", get(get_article_summary))
        .route("/get_latest_folder", get(get_latest_folder))
        .route("/health", get(health))
        .fallback_service(static_files)
        .layer(middleware::from_fn(bare_options))
        .layer(cors_layer())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// `OPTIONS` without CORS request headers still answers 200 with no body.
/// Real preflights are answered by the CORS layer before reaching here.
async fn bare_options(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(req).await
}

async fn not_found() -> ApiError {
    ApiError::NotFound(MSG_NOT_FOUND)
}

/// Run filesystem work off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("worker failed: {e}")))
}

fn outcome_label<T>(res: &Result<T, ApiError>) -> &'static str {
    match res {
        Ok(_) => "ok",
        Err(ApiError::NotFound(_)) => "not_found",
        Err(ApiError::Internal(_)) => "error",
    }
}

async fn get_article_summary(State(state): State<AppState>) -> Result<String, ApiError> {
    let dirs = state.config.source_paths();
    let res = blocking(move || summary::aggregate(&dirs))
        .await
        .and_then(|r| r.map_err(ApiError::from))
        .and_then(|text| text.ok_or(ApiError::NotFound(MSG_NO_SUMMARIES)));
    record_request("get_article_summary", outcome_label(&res));
    res
}

#[derive(Debug, Serialize)]
struct LatestFolderOut {
    folder: String,
}

async fn get_latest_folder(
    State(state): State<AppState>,
) -> Result<Json<LatestFolderOut>, ApiError> {
    let dirs = state.config.source_paths();
    let res = blocking(move || summary::latest_across(&dirs))
        .await
        .and_then(|p| p.ok_or(ApiError::NotFound(MSG_NO_FOLDERS)))
        .map(|p| {
            Json(LatestFolderOut {
                folder: p.to_string_lossy().into_owned(),
            })
        });
    record_request("get_latest_folder", outcome_label(&res));
    res
}

#[derive(Debug, Serialize)]
struct SourceHealth {
    name: String,
    path: String,
    exists: bool,
}

#[derive(Debug, Serialize)]
struct HealthOut {
    status: &'static str,
    environment: &'static str,
    sources: Vec<SourceHealth>,
}

/// Configuration sanity only; never looks at summary content.
async fn health(State(state): State<AppState>) -> Json<HealthOut> {
    let sources = state
        .config
        .sources
        .iter()
        .map(|s| SourceHealth {
            name: s.name.clone(),
            path: s.path.to_string_lossy().into_owned(),
            exists: s.path.exists(),
        })
        .collect();
    record_request("health", "ok");
    Json(HealthOut {
        status: "healthy",
        environment: state.config.environment.as_str(),
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_mapping() {
        let nf = ApiError::NotFound(MSG_NO_SUMMARIES).into_response();
        assert_eq!(nf.status(), StatusCode::NOT_FOUND);
        let ie = ApiError::Internal("boom".into()).into_response();
        assert_eq!(ie.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(outcome_label::<()>(&Ok(())), "ok");
        assert_eq!(outcome_label::<()>(&Err(ApiError::NotFound("x"))), "not_found");
        assert_eq!(outcome_label::<()>(&Err(ApiError::Internal("x".into()))), "error");
    }
}
