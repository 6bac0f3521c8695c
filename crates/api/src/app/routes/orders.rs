use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use salesdesk_core::OrderId;
use salesdesk_engine::Services;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route(
            "/:id",
            get(get_order).patch(update_order).delete(delete_order),
        )
}

pub async fn create_order(
    Extension(services): Extension<Arc<Services>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    match services.create_order(body.customer_id, &body.product_ids).await {
        Ok(detail) => (StatusCode::CREATED, Json(dto::order_detail_to_json(&detail))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<Services>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    match services.list_orders(query.page()).await {
        Ok(orders) => {
            let items: Vec<_> = orders.iter().map(dto::order_to_json).collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };
    match services.order_detail(id).await {
        Ok(detail) => (StatusCode::OK, Json(dto::order_detail_to_json(&detail))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// Item replacement runs before the status change, in one transaction, so a
/// single PATCH can fix a draft's items and confirm it; if the transition is
/// rejected, the replacement rolls back with it.
pub async fn update_order(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderRequest>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };

    if body.product_ids.is_some() || body.status.is_some() {
        if let Err(e) = services
            .update_order(id, body.product_ids.as_deref(), body.status)
            .await
        {
            return errors::engine_error_to_response(e);
        }
    }

    match services.order_detail(id).await {
        Ok(detail) => (StatusCode::OK, Json(dto::order_detail_to_json(&detail))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };
    match services.delete_order(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
