//! Catalog service and the catalog-consistency reconciler.
//!
//! Deactivating a product purges it from every Draft order inside the same
//! transaction that flips the flag, so a draft can never sit confirmable
//! while pointing at an inactive product. Deletion is hybrid: products with
//! finalized sales history are only ever deactivated; the rest are removed.

use chrono::Utc;
use serde::Serialize;

use salesdesk_catalog::{NewProduct, Product, ProductPatch};
use salesdesk_core::{DomainError, OrderId, ProductId};
use salesdesk_orders::total_of;
use salesdesk_store::{Page, StoreTx};

use crate::{EngineResult, Services};

/// Result of a product update, with the draft orders the reconciler touched
/// (empty unless the update deactivated the product).
#[derive(Debug, Clone, Serialize)]
pub struct ProductUpdateOutcome {
    pub product: Product,
    pub affected_draft_orders: Vec<OrderId>,
}

/// What `delete_product` decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteAction {
    /// The product participated in a finalized sale: row kept, flag cleared.
    Deactivated,
    /// No finalized history: row removed.
    Deleted,
}

/// Result of a product deletion.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDeleteOutcome {
    pub action: DeleteAction,
    pub affected_draft_orders: Vec<OrderId>,
}

impl Services {
    pub async fn create_product(&self, input: NewProduct) -> EngineResult<Product> {
        let mut tx = self.store().begin().await?;

        if tx.product_by_name(&input.name).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "a product with name '{}' already exists",
                input.name
            ))
            .into());
        }

        let product = Product::create(ProductId::new(), input, Utc::now())?;
        tx.insert_product(&product).await?;
        tx.commit().await?;

        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Update a product. When the update flips `is_active` from true to
    /// false, the reconciler runs first, in the same transaction.
    pub async fn update_product(
        &self,
        product_id: ProductId,
        patch: ProductPatch,
    ) -> EngineResult<ProductUpdateOutcome> {
        let mut tx = self.store().begin().await?;

        let mut product = tx
            .product_by_id(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {product_id} not found")))?;

        if let Some(new_name) = patch.name.as_deref() {
            if new_name != product.name && tx.product_by_name(new_name).await?.is_some() {
                return Err(DomainError::conflict(format!(
                    "a product with name '{new_name}' already exists"
                ))
                .into());
            }
        }

        let was_active = product.is_active;
        product.apply_patch(patch)?;

        let affected = if was_active && !product.is_active {
            reconcile_product_deactivation(tx.as_mut(), product_id).await?
        } else {
            Vec::new()
        };

        tx.update_product(&product).await?;
        tx.commit().await?;

        if !affected.is_empty() {
            tracing::info!(
                product_id = %product.id,
                affected = affected.len(),
                "product deactivated; draft orders reconciled"
            );
        }
        Ok(ProductUpdateOutcome {
            product,
            affected_draft_orders: affected,
        })
    }

    /// Hybrid delete. Always reconciles drafts first (idempotent when the
    /// product was already inactive), then either deactivates (finalized
    /// history exists) or hard-deletes the row.
    pub async fn delete_product(&self, product_id: ProductId) -> EngineResult<ProductDeleteOutcome> {
        let mut tx = self.store().begin().await?;

        let mut product = tx
            .product_by_id(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {product_id} not found")))?;

        let affected = reconcile_product_deactivation(tx.as_mut(), product_id).await?;

        let action = if tx.product_has_finalized_orders(product_id).await? {
            product.is_active = false;
            tx.update_product(&product).await?;
            DeleteAction::Deactivated
        } else {
            tx.delete_product(product_id).await?;
            DeleteAction::Deleted
        };
        tx.commit().await?;

        tracing::info!(product_id = %product_id, action = ?action, "product deleted");
        Ok(ProductDeleteOutcome {
            action,
            affected_draft_orders: affected,
        })
    }

    pub async fn get_product(&self, product_id: ProductId) -> EngineResult<Product> {
        Ok(self
            .store()
            .product(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {product_id} not found")))?)
    }

    pub async fn list_products(&self, page: Page) -> EngineResult<Vec<Product>> {
        Ok(self.store().products(page).await?)
    }
}

/// Purge a product from every Draft order: drop the referencing items,
/// recompute the remaining total, and delete drafts that end up empty.
/// Confirmed/Completed orders keep their frozen snapshots untouched.
///
/// Runs inside the caller's transaction so the purge commits together with
/// the deactivation (or deletion) that triggered it. Returns the affected
/// order ids for observability.
pub async fn reconcile_product_deactivation(
    tx: &mut dyn StoreTx,
    product_id: ProductId,
) -> EngineResult<Vec<OrderId>> {
    let drafts = tx.draft_orders_containing(product_id).await?;
    let mut affected = Vec::with_capacity(drafts.len());

    for mut order in drafts {
        tx.delete_items_for_product(order.id, product_id).await?;
        let remaining = tx.items_for_order(order.id).await?;
        if remaining.is_empty() {
            tx.delete_order(order.id).await?;
            tracing::debug!(order_id = %order.id, "empty draft order removed");
        } else {
            order.total_amount = total_of(&remaining);
            tx.update_order(&order).await?;
            tracing::debug!(order_id = %order.id, total = %order.total_amount, "draft order total recomputed");
        }
        affected.push(order.id);
    }

    Ok(affected)
}
