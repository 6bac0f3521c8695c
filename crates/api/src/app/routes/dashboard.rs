use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Utc};

use salesdesk_engine::{Services, StatsFilter};

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/stats", get(stats))
}

pub async fn stats(
    Extension(services): Extension<Arc<Services>>,
    Query(query): Query<dto::StatsQuery>,
) -> axum::response::Response {
    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_month",
                "month must be between 1 and 12",
            );
        }
    }
    let filter = StatsFilter {
        month: query.month,
        year: query.year.unwrap_or_else(|| Utc::now().year()),
    };
    match services.dashboard_stats(filter).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
