//! Web search handler.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::services::{SearchRequest, SearchResponse};

/// Create search routes
pub fn search_routes() -> Router<AppState> {
    Router::new().route("/search", post(search))
}

/// Search the web through the grounded model
#[utoipa::path(
    post,
    path = "/gemini/search",
    tag = "Search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Query is required"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Search failed", body = SearchResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn search(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SearchRequest>,
) -> (StatusCode, Json<SearchResponse>) {
    let response = state
        .search_service
        .search(&payload.query, payload.context)
        .await;

    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(response))
}
