use axum::Router;

pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod system;

/// Router for all `/api` endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/api/customers", customers::router())
        .nest("/api/products", products::router())
        .nest("/api/orders", orders::router())
        .nest("/api/dashboard", dashboard::router())
}
