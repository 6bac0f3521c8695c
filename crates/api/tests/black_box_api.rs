//! Black-box HTTP tests: the production router over an in-memory store,
//! bound to an ephemeral port, exercised with a real HTTP client.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use salesdesk_store::{InMemoryStore, Store};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let app = salesdesk_api::app::build_app(store);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn post_json(
    client: &reqwest::Client,
    url: String,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let res = client.post(url).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn create_customer(client: &reqwest::Client, srv: &TestServer, email: &str) -> String {
    let (status, body) = post_json(
        client,
        format!("{}/api/customers", srv.base_url),
        json!({
            "company_name": "Acme Corp",
            "industry": "Technology",
            "name": "Jane",
            "last_name": "Doe",
            "email": email,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn create_product(
    client: &reqwest::Client,
    srv: &TestServer,
    name: &str,
    price: &str,
) -> String {
    let (status, body) = post_json(
        client,
        format!("{}/api/products", srv.base_url),
        json!({
            "name": name,
            "service_line": "Audit",
            "description": null,
            "price": price,
            "is_active": true,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn full_engagement_flow() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let customer_id = create_customer(&client, &srv, "ops@acme.com").await;
    let audit_id = create_product(&client, &srv, "IT Security Audit", "15000.00").await;
    let tax_id = create_product(&client, &srv, "Tax Review", "4500.00").await;

    // Create a draft with both products.
    let (status, order) = post_json(
        &client,
        format!("{}/api/orders", srv.base_url),
        json!({ "customer_id": customer_id, "product_ids": [audit_id, tax_id] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "draft");
    assert_eq!(order["total_amount"], "19500.00");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    let order_id = order["id"].as_str().unwrap().to_string();

    // A later price change must not alter the order.
    let res = client
        .patch(format!("{}/api/products/{}", srv.base_url, audit_id))
        .json(&json!({ "price": "99999.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let detail: serde_json::Value = client
        .get(format!("{}/api/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["total_amount"], "19500.00");
    assert_eq!(detail["customer"]["email"], "ops@acme.com");

    // Confirm, then complete.
    let res = client
        .patch(format!("{}/api/orders/{}", srv.base_url, order_id))
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .patch(format!("{}/api/orders/{}", srv.base_url, order_id))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "completed");

    // Completed orders cannot be deleted.
    let res = client
        .delete(format!("{}/api/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn illegal_transition_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let customer_id = create_customer(&client, &srv, "ops@acme.com").await;
    let product_id = create_product(&client, &srv, "Audit", "100.00").await;

    let (_, order) = post_json(
        &client,
        format!("{}/api/orders", srv.base_url),
        json!({ "customer_id": customer_id, "product_ids": [product_id] }),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let res = client
        .patch(format!("{}/api/orders/{}", srv.base_url, order_id))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn combined_patch_rolls_back_item_changes_on_rejected_transition() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let customer_id = create_customer(&client, &srv, "ops@acme.com").await;
    let audit_id = create_product(&client, &srv, "Audit", "100.00").await;
    let tax_id = create_product(&client, &srv, "Tax", "50.00").await;

    let (_, order) = post_json(
        &client,
        format!("{}/api/orders", srv.base_url),
        json!({ "customer_id": customer_id, "product_ids": [audit_id] }),
    )
    .await;
    let order_id = order["id"].as_str().unwrap().to_string();

    // Replacement plus an illegal draft -> completed jump in one PATCH:
    // nothing of it may stick.
    let res = client
        .patch(format!("{}/api/orders/{}", srv.base_url, order_id))
        .json(&json!({ "product_ids": [tax_id], "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let detail: serde_json::Value = client
        .get(format!("{}/api/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["status"], "draft");
    assert_eq!(detail["total_amount"], "100.00");
    assert_eq!(detail["items"][0]["product_id"], audit_id);
}

#[tokio::test]
async fn deleting_a_product_reconciles_drafts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let customer_id = create_customer(&client, &srv, "ops@acme.com").await;
    let audit_id = create_product(&client, &srv, "Audit", "100.00").await;
    let tax_id = create_product(&client, &srv, "Tax", "50.00").await;

    let (_, order) = post_json(
        &client,
        format!("{}/api/orders", srv.base_url),
        json!({ "customer_id": customer_id, "product_ids": [audit_id, tax_id] }),
    )
    .await;
    let order_id = order["id"].as_str().unwrap().to_string();

    // No finalized history: hard delete, and the draft loses the item.
    let res = client
        .delete(format!("{}/api/products/{}", srv.base_url, tax_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["action"], "deleted");
    assert_eq!(body["affected_draft_order_ids"][0], order_id);

    let detail: serde_json::Value = client
        .get(format!("{}/api/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["items"].as_array().unwrap().len(), 1);
    assert_eq!(detail["total_amount"], "100.00");

    let res = client
        .get(format!("{}/api/products/{}", srv.base_url, tax_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn conflicts_map_to_409() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let customer_id = create_customer(&client, &srv, "dup@acme.com").await;
    let (status, body) = post_json(
        &client,
        format!("{}/api/customers", srv.base_url),
        json!({
            "company_name": "Other Corp",
            "industry": "Finance",
            "name": "John",
            "last_name": "Smith",
            "email": "dup@acme.com",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // A customer with an order cannot be deleted.
    let product_id = create_product(&client, &srv, "Audit", "100.00").await;
    post_json(
        &client,
        format!("{}/api/orders", srv.base_url),
        json!({ "customer_id": customer_id, "product_ids": [product_id] }),
    )
    .await;
    let res = client
        .delete(format!("{}/api/customers/{}", srv.base_url, customer_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn dashboard_aggregates_engagements() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let customer_id = create_customer(&client, &srv, "ops@acme.com").await;
    let product_id = create_product(&client, &srv, "Audit", "1500.00").await;

    let (_, order) = post_json(
        &client,
        format!("{}/api/orders", srv.base_url),
        json!({ "customer_id": customer_id, "product_ids": [product_id] }),
    )
    .await;
    client
        .patch(format!("{}/api/orders/{}", srv.base_url, order["id"].as_str().unwrap()))
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .unwrap();

    let stats: serde_json::Value = client
        .get(format!("{}/api/dashboard/stats", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(stats["kpi_cards"]["active_engagements"], 1);
    assert_eq!(stats["kpi_cards"]["inactive_engagements"], 0);
    assert_eq!(stats["kpi_cards"]["total_contract_value"], 1500.0);
    assert_eq!(stats["revenue_by_industry"][0]["name"], "Technology");
    assert_eq!(stats["annual_trends"].as_array().unwrap().len(), 12);

    // Out-of-range month is rejected.
    let res = client
        .get(format!("{}/api/dashboard/stats?month=13", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["customers", "products", "orders"] {
        let res = client
            .get(format!("{}/api/{}/not-a-uuid", srv.base_url, path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "invalid_id");
    }
}
