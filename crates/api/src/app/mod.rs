//! HTTP application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use salesdesk_engine::Services;
use salesdesk_store::Store;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router over the given store (public entrypoint used
/// by `main.rs` and the black-box tests).
pub fn build_app(store: Arc<dyn Store>) -> Router {
    let services = Arc::new(Services::new(store));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
}
