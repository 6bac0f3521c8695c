use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use salesdesk_core::CustomerId;
use salesdesk_customers::{CustomerPatch, NewCustomer};
use salesdesk_engine::Services;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route(
            "/:id",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
}

pub async fn create_customer(
    Extension(services): Extension<Arc<Services>>,
    Json(body): Json<NewCustomer>,
) -> axum::response::Response {
    match services.create_customer(body).await {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn list_customers(
    Extension(services): Extension<Arc<Services>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    match services.list_customers(query.page()).await {
        Ok(customers) => (StatusCode::OK, Json(customers)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };
    match services.customer_detail(id).await {
        Ok(detail) => (StatusCode::OK, Json(dto::customer_detail_to_json(&detail))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
    Json(body): Json<CustomerPatch>,
) -> axum::response::Response {
    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };
    match services.update_customer(id, body).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };
    match services.delete_customer(id).await {
        Ok(customer) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("Customer {} deleted successfully", customer.company_name),
                "id": customer.id,
            })),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
