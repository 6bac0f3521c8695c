use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use salesdesk_catalog::{NewProduct, ProductPatch};
use salesdesk_core::ProductId;
use salesdesk_engine::Services;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

pub async fn create_product(
    Extension(services): Extension<Arc<Services>>,
    Json(body): Json<NewProduct>,
) -> axum::response::Response {
    match services.create_product(body).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<Services>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    match services.list_products(query.page()).await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    match services.get_product(id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
    Json(body): Json<ProductPatch>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    match services.update_product(id, body).await {
        Ok(outcome) => (StatusCode::OK, Json(dto::product_update_to_json(&outcome))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    match services.delete_product(id).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "id": id,
                "action": outcome.action,
                "affected_draft_order_ids": outcome.affected_draft_orders,
            })),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
