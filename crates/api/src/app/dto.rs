//! Request DTOs and JSON mapping helpers.
//!
//! Create/patch bodies for customers and products deserialize straight into
//! the domain input types; only orders and queries need API-side shapes.

use serde::Deserialize;
use serde_json::{json, Value};

use salesdesk_core::{CustomerId, ProductId};
use salesdesk_customers::Customer;
use salesdesk_engine::{CustomerDetail, OrderDetail, ProductUpdateOutcome};
use salesdesk_orders::{Order, OrderItem, OrderStatus};
use salesdesk_store::Page;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub product_ids: Vec<ProductId>,
}

/// Partial order update: replace the item set and/or move the status.
/// Items are applied before the status change.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub product_ids: Option<Vec<ProductId>>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    10
}

impl ListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

pub fn order_to_json(order: &Order) -> Value {
    json!({
        "id": order.id,
        "customer_id": order.customer_id,
        "status": order.status,
        "total_amount": order.total_amount,
        "created_at": order.created_at,
    })
}

pub fn item_to_json(item: &OrderItem) -> Value {
    json!({
        "id": item.id,
        "order_id": item.order_id,
        "product_id": item.product_id,
        "unit_price": item.unit_price,
        "created_at": item.created_at,
    })
}

pub fn order_detail_to_json(detail: &OrderDetail) -> Value {
    json!({
        "id": detail.order.id,
        "customer_id": detail.order.customer_id,
        "status": detail.order.status,
        "total_amount": detail.order.total_amount,
        "created_at": detail.order.created_at,
        "items": detail.items.iter().map(item_to_json).collect::<Vec<_>>(),
        "customer": detail.customer,
    })
}

pub fn customer_detail_to_json(detail: &CustomerDetail) -> Value {
    let Customer {
        id,
        company_name,
        industry,
        name,
        last_name,
        email,
        created_at,
    } = &detail.customer;
    json!({
        "id": id,
        "company_name": company_name,
        "industry": industry,
        "name": name,
        "last_name": last_name,
        "email": email,
        "created_at": created_at,
        "orders": detail.orders.iter().map(order_to_json).collect::<Vec<_>>(),
    })
}

pub fn product_update_to_json(outcome: &ProductUpdateOutcome) -> Value {
    let p = &outcome.product;
    json!({
        "id": p.id,
        "name": p.name,
        "service_line": p.service_line,
        "description": p.description,
        "price": p.price,
        "is_active": p.is_active,
        "created_at": p.created_at,
        "affected_draft_order_ids": outcome.affected_draft_orders,
    })
}
