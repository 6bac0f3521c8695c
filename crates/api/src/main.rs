use std::sync::Arc;

use salesdesk_store::{InMemoryStore, PgStore, Store};

#[tokio::main]
async fn main() {
    salesdesk_observability::init();

    let store: Arc<dyn Store> = match std::env::var("DATABASE_URL") {
        Ok(url) => match PgStore::connect(&url).await {
            Ok(store) => Arc::new(store),
            Err(err) => {
                tracing::error!(error = %err, "failed to connect to DATABASE_URL");
                std::process::exit(1);
            }
        },
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using volatile in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let app = salesdesk_api::app::build_app(store);

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
