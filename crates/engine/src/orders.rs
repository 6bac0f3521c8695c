//! Order lifecycle engine: creation with frozen pricing, whole-order item
//! replacement, the status state machine and draft deletion.

use chrono::Utc;
use serde::Serialize;

use salesdesk_core::{CustomerId, DomainError, OrderId, ProductId};
use salesdesk_customers::Customer;
use salesdesk_orders::{total_of, Order, OrderItem, OrderStatus};
use salesdesk_store::{Page, StoreTx};

use crate::{EngineResult, Services};

/// An order with its item snapshots (and customer, when fetched for detail).
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: Option<Customer>,
}

impl Services {
    /// Create an order in Draft, freezing each product's current price into
    /// its item. All-or-nothing: any validation failure persists nothing.
    pub async fn create_order(
        &self,
        customer_id: CustomerId,
        product_ids: &[ProductId],
    ) -> EngineResult<OrderDetail> {
        let mut tx = self.store().begin().await?;

        if product_ids.is_empty() {
            return Err(DomainError::invalid_state(
                "an order must contain at least one item",
            )
            .into());
        }

        let customer = tx
            .customer_by_id(customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {customer_id} not found")))?;

        let now = Utc::now();
        let order_id = OrderId::new();
        let items = snapshot_items(tx.as_mut(), order_id, product_ids).await?;

        let order = Order::new(order_id, customer.id, total_of(&items), now);
        tx.insert_order(&order).await?;
        for item in &items {
            tx.insert_order_item(item).await?;
        }
        tx.commit().await?;

        tracing::info!(order_id = %order.id, customer_id = %customer.id, total = %order.total_amount, "order created");
        Ok(OrderDetail {
            order,
            items,
            customer: Some(customer),
        })
    }

    /// Apply a partial update: optionally replace the whole item set,
    /// optionally move the status, in one transaction. Replacement runs
    /// before the transition, and a rejected transition rolls the new items
    /// back with it.
    pub async fn update_order(
        &self,
        order_id: OrderId,
        new_items: Option<&[ProductId]>,
        target: Option<OrderStatus>,
    ) -> EngineResult<OrderDetail> {
        let mut tx = self.store().begin().await?;

        let mut order = tx
            .order_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("order {order_id} not found")))?;

        let mut items = tx.items_for_order(order_id).await?;

        if let Some(product_ids) = new_items {
            if !order.is_modifiable() {
                return Err(DomainError::invalid_state(format!(
                    "cannot edit items of order with status '{}'; only draft orders can have items modified",
                    order.status
                ))
                .into());
            }
            if product_ids.is_empty() {
                return Err(DomainError::invalid_state(
                    "an order must contain at least one item",
                )
                .into());
            }
            tx.delete_items_for_order(order_id).await?;
            items = snapshot_items(tx.as_mut(), order_id, product_ids).await?;
            for item in &items {
                tx.insert_order_item(item).await?;
            }
            order.total_amount = total_of(&items);
        }

        if let Some(target) = target {
            order.status.ensure_transition_to(target)?;
            // Confirmation re-checks the catalog: every referenced product
            // must be active *at this moment*, not just at creation time.
            if order.status == OrderStatus::Draft && target == OrderStatus::Confirmed {
                let mut inactive = Vec::new();
                for item in &items {
                    match tx.product_by_id(item.product_id).await? {
                        Some(product) if product.is_active => {}
                        Some(product) => inactive.push(product.name),
                        None => inactive.push(item.product_id.to_string()),
                    }
                }
                if !inactive.is_empty() {
                    return Err(DomainError::invalid_state(format!(
                        "cannot confirm order with inactive products: {}; remove these items before confirming",
                        inactive.join(", ")
                    ))
                    .into());
                }
            }
            order.status = target;
        }

        tx.update_order(&order).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, status = %order.status, total = %order.total_amount, "order updated");
        Ok(OrderDetail {
            order,
            items,
            customer: None,
        })
    }

    /// Replace the whole item set of a Draft order, re-snapshotting prices
    /// and recomputing the total.
    pub async fn replace_items(
        &self,
        order_id: OrderId,
        product_ids: &[ProductId],
    ) -> EngineResult<OrderDetail> {
        self.update_order(order_id, Some(product_ids), None).await
    }

    /// Move an order along draft -> confirmed -> completed.
    pub async fn transition_status(
        &self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> EngineResult<Order> {
        Ok(self.update_order(order_id, None, Some(target)).await?.order)
    }

    /// Delete a Draft order together with its items.
    pub async fn delete_order(&self, order_id: OrderId) -> EngineResult<()> {
        let mut tx = self.store().begin().await?;

        let order = tx
            .order_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("order {order_id} not found")))?;

        if !order.is_modifiable() {
            return Err(DomainError::invalid_state(format!(
                "cannot delete order with status '{}'; only draft orders can be deleted",
                order.status
            ))
            .into());
        }

        tx.delete_items_for_order(order_id).await?;
        tx.delete_order(order_id).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, "order deleted");
        Ok(())
    }

    pub async fn order_detail(&self, order_id: OrderId) -> EngineResult<OrderDetail> {
        let order = self
            .store()
            .order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("order {order_id} not found")))?;
        let items = self.store().order_items(order_id).await?;
        let customer = self.store().customer(order.customer_id).await?;
        Ok(OrderDetail {
            order,
            items,
            customer,
        })
    }

    pub async fn list_orders(&self, page: Page) -> EngineResult<Vec<Order>> {
        Ok(self.store().orders(page).await?)
    }
}

/// Validate each requested product (exists + active) and freeze its current
/// price into a new item. The snapshot is the only place the live price is
/// ever read.
async fn snapshot_items(
    tx: &mut dyn StoreTx,
    order_id: OrderId,
    product_ids: &[ProductId],
) -> EngineResult<Vec<OrderItem>> {
    let now = Utc::now();
    let mut items = Vec::with_capacity(product_ids.len());
    for product_id in product_ids {
        let product = tx
            .product_by_id(*product_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {product_id} not found")))?;
        if !product.is_active {
            return Err(DomainError::invalid_state(format!(
                "product '{}' is inactive and cannot be ordered",
                product.name
            ))
            .into());
        }
        items.push(OrderItem::new(order_id, product.id, product.price, now));
    }
    Ok(items)
}
