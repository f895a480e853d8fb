use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::header::{
    STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

use crate::error::QueryError;
use crate::interface::CatalogInterface;
use crate::query::{DEFAULT_LIMIT, DEFAULT_PAGE, Page, SearchResult};

/// Paging parameters arrive as text so that junk like `?page=abc` falls back
/// to the default instead of rejecting the request.
#[derive(Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub books_loaded: usize,
}

pub struct ApiError(QueryError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_fault() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        warn!(error = %self.0, code = %status.as_u16(), "query error");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(interface: Arc<CatalogInterface>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    Router::new()
        .route("/all", get(all_books))
        .route("/search", get(search_books))
        .route("/health", get(health))
        .route("/reload", post(reload))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .with_state(interface)
}

fn int_or(value: Option<&str>, default: i64) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

async fn all_books(
    State(iface): State<Arc<CatalogInterface>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page>, ApiError> {
    let started = Instant::now();
    let page = int_or(params.page.as_deref(), DEFAULT_PAGE);
    let limit = int_or(params.limit.as_deref(), DEFAULT_LIMIT);
    let result = iface.list_page(page, limit).map_err(ApiError)?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(ms = elapsed_ms, page = result.page, limit = result.limit, rows = result.books.len(), "page served");
    Ok(Json(result))
}

// a repeated key keeps its first value, the rest are ignored
fn first_per_key(pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    pairs
        .into_iter()
        .filter(|(key, _)| seen.insert(key.clone()))
        .collect()
}

async fn search_books(
    State(iface): State<Arc<CatalogInterface>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResult>, ApiError> {
    let started = Instant::now();
    let criteria = first_per_key(pairs);
    let result = iface.search(&criteria).map_err(ApiError)?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(ms = elapsed_ms, criteria = criteria.len(), rows = result.total, "search complete");
    Ok(Json(result))
}

async fn health(State(iface): State<Arc<CatalogInterface>>) -> Json<HealthResponse> {
    let health = iface.health();
    Json(HealthResponse {
        status: if health.healthy { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        books_loaded: health.records_loaded,
    })
}

async fn reload(State(iface): State<Arc<CatalogInterface>>) -> impl IntoResponse {
    match iface.reload().await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({ "reloaded": true, "books_loaded": outcome.records_loaded })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "reloaded": false, "error": e.to_string() })),
        ),
    }
}
