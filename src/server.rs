//! HTTP API for course discovery.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/courses` | Merged, filtered, sorted catalog listing (or search with `q`) |
//! | `GET`  | `/courses/{slug}` | One course by slug or id |
//! | `POST` | `/search` | Full ranked search, or `{"action": "sync"}` to refresh external courses |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "E_VALIDATION", "message": "q is required" } }
//! ```
//!
//! Error codes: `E_METHOD` (405), `E_VALIDATION` (400), `E_NOT_FOUND` (404),
//! `E_INTERNAL` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use course_discovery_core::models::lenient;
use course_discovery_core::search::SortOrder;
use course_discovery_core::{Course, DiscoveryError, Page, ScoredCourse, SearchFilters};

use crate::config::Config;
use crate::service::{CourseService, ListRequest, SearchRequest};

#[derive(Clone)]
struct AppState {
    service: Arc<CourseService>,
    require_query: bool,
}

/// Starts the HTTP server on `[server].bind`. Runs until the process is
/// terminated.
pub async fn run_server(config: &Config, service: Arc<CourseService>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(service, config.server.require_query);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind = %bind_addr, "course discovery server listening");
    println!("Course discovery server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// The application router, without binding a socket.
pub fn router(service: Arc<CourseService>, require_query: bool) -> Router {
    let state = AppState {
        service,
        require_query,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/courses",
            get(handle_list_courses).fallback(method_not_allowed),
        )
        .route(
            "/courses/{slug}",
            get(handle_get_course).fallback(method_not_allowed),
        )
        .route("/search", post(handle_search).fallback(method_not_allowed))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "E_VALIDATION",
        message: message.into(),
    }
}

impl From<DiscoveryError> for AppError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::Validation(message) => bad_request(message),
            DiscoveryError::NotFound(message) => AppError {
                status: StatusCode::NOT_FOUND,
                code: "E_NOT_FOUND",
                message,
            },
            other => {
                error!(code = other.code(), error = %other, "request failed");
                AppError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "E_INTERNAL",
                    message: other.to_string(),
                }
            }
        }
    }
}

async fn method_not_allowed() -> AppError {
    AppError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        code: "E_METHOD",
        message: "method not allowed".to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /courses ============

/// Query string for `GET /courses`. Everything arrives as text so bad
/// values produce the standard error envelope.
#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    q: Option<String>,
    category: Option<String>,
    level: Option<String>,
    price: Option<String>,
    sort: Option<String>,
    page: Option<String>,
    per_page: Option<String>,
}

fn parse_count(name: &str, value: Option<&str>) -> Result<usize, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(0),
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| bad_request(format!("{} must be a positive integer, got '{}'", name, v))),
    }
}

fn parse_price(value: Option<&str>) -> Result<Option<bool>, AppError> {
    match value.map(str::trim).unwrap_or("") {
        "" => Ok(None),
        "free" => Ok(Some(true)),
        "paid" => Ok(Some(false)),
        other => Err(bad_request(format!(
            "price must be 'free' or 'paid', got '{}'",
            other
        ))),
    }
}

impl ListQuery {
    fn into_request(self) -> Result<ListRequest, AppError> {
        let sort: SortOrder = self.sort.as_deref().unwrap_or("").parse()?;
        Ok(ListRequest {
            search: SearchRequest {
                q: self.q.unwrap_or_default(),
                filters: SearchFilters {
                    category: self.category,
                    level: self.level,
                    is_free: parse_price(self.price.as_deref())?,
                },
                page: parse_count("page", self.page.as_deref())?,
                per_page: parse_count("per_page", self.per_page.as_deref())?,
                free_boost: None,
            },
            sort,
        })
    }
}

async fn handle_list_courses(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<ScoredCourse>>, AppError> {
    let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
    let request = query.into_request()?;
    let page = state.service.list(&request).await?;
    Ok(Json(page))
}

// ============ GET /courses/{slug} ============

async fn handle_get_course(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(state.service.get_course(&slug).await?))
}

// ============ POST /search ============

#[derive(Debug, Default, Deserialize)]
struct SearchBody {
    #[serde(default, deserialize_with = "lenient::string")]
    q: String,
    #[serde(default)]
    filters: Option<SearchFilters>,
    #[serde(default, deserialize_with = "lenient::count")]
    page: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    per_page: u64,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    free_boost: Option<f64>,
    #[serde(default)]
    action: Option<String>,
}

#[derive(Serialize)]
struct SyncResponse {
    success: bool,
    message: String,
    count: usize,
}

async fn handle_search(
    State(state): State<AppState>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = body.map_err(|e| bad_request(e.body_text()))?;

    match body.action.as_deref().map(str::trim) {
        None | Some("") => {}
        Some("sync") => {
            let outcome = state.service.sync().await;
            let response = SyncResponse {
                success: true,
                message: outcome.message(),
                count: outcome.count,
            };
            return Ok(Json(response).into_response());
        }
        Some(other) => return Err(bad_request(format!("unknown action '{}'", other))),
    }

    if state.require_query && body.q.trim().is_empty() {
        return Err(bad_request("q is required"));
    }

    let request = SearchRequest {
        q: body.q,
        filters: body.filters.unwrap_or_default(),
        page: usize::try_from(body.page).unwrap_or(usize::MAX),
        per_page: usize::try_from(body.per_page).unwrap_or(usize::MAX),
        free_boost: body.free_boost,
    };
    let page = state.service.search(&request).await?;
    Ok(Json(page).into_response())
}
