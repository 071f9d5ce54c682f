//! Doctor performance statistics.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Json,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{CalendarFilter, PerformancePeriod, PeriodMetrics};
use crate::errors::{AppError, AppResult};
use crate::services::DailyBreakdown;

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub date: Option<String>,
}

/// Create performance routes
pub fn performance_routes() -> Router<AppState> {
    Router::new()
        .route("/stats/:period", get(performance_stats))
        .route("/daily", get(daily_performance))
}

/// Consultation counts grouped by week, month or year
#[utoipa::path(
    get,
    path = "/api/performance/stats/{period}",
    tag = "Performance",
    params(
        ("period" = String, Path, description = "weekly, monthly or yearly"),
        ("year" = Option<i32>, Query, description = "Calendar year"),
        ("month" = Option<u32>, Query, description = "Month 1-12, requires year"),
        ("week" = Option<u32>, Query, description = "Sunday-based week of the year, requires year")
    ),
    responses(
        (status = 200, description = "Per-period statistics", body = Vec<PeriodMetrics>),
        (status = 400, description = "Invalid period or calendar filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn performance_stats(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(period): Path<String>,
    filter: Result<Query<CalendarFilter>, QueryRejection>,
) -> AppResult<Json<Vec<PeriodMetrics>>> {
    let period: PerformancePeriod = period.parse()?;
    let Query(filter) = filter.map_err(|e| AppError::bad_request(e.body_text()))?;

    let stats = state
        .consultation_service
        .performance(&current_user.username, period, filter)
        .await?;
    Ok(Json(stats))
}

/// Hour-by-hour counters for one day
#[utoipa::path(
    get,
    path = "/api/performance/daily",
    tag = "Performance",
    params(("date" = Option<String>, Query, description = "YYYY-MM-DD, defaults to today (UTC)")),
    responses(
        (status = 200, description = "Hourly breakdown", body = DailyBreakdown),
        (status = 400, description = "Invalid date format. Use YYYY-MM-DD"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn daily_performance(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<DailyQuery>,
) -> AppResult<Json<DailyBreakdown>> {
    let daily = state
        .consultation_service
        .daily_breakdown(&current_user.username, query.date)
        .await?;
    Ok(Json(daily))
}
