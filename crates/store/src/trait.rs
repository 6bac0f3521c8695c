//! The store contract consumed by the engine.
//!
//! Mutating operations run inside a [`StoreTx`]: everything between
//! [`Store::begin`] and [`StoreTx::commit`] is atomic, and dropping an
//! uncommitted transaction rolls it back. Plain reads (listing, detail
//! fetches, analytics snapshots) go through [`Store`] directly and only need
//! read-committed semantics.

use async_trait::async_trait;

use salesdesk_catalog::Product;
use salesdesk_core::{CustomerId, OrderId, ProductId};
use salesdesk_customers::Customer;
use salesdesk_orders::{Order, OrderItem};

use crate::error::StoreResult;

/// Offset/limit pagination for list reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 10 }
    }
}

impl Page {
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }
}

/// Handle to a store backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction covering one engine operation.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    // ---- read-only queries (outside any transaction) ----

    async fn customer(&self, id: CustomerId) -> StoreResult<Option<Customer>>;
    async fn customers(&self, page: Page) -> StoreResult<Vec<Customer>>;
    async fn orders_for_customer(&self, id: CustomerId) -> StoreResult<Vec<Order>>;

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    async fn products(&self, page: Page) -> StoreResult<Vec<Product>>;

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;
    async fn orders(&self, page: Page) -> StoreResult<Vec<Order>>;
    async fn order_items(&self, id: OrderId) -> StoreResult<Vec<OrderItem>>;

    // ---- analytics snapshot reads (full-table, read-only) ----

    async fn all_customers(&self) -> StoreResult<Vec<Customer>>;
    async fn all_products(&self) -> StoreResult<Vec<Product>>;
    async fn all_orders(&self) -> StoreResult<Vec<Order>>;
    async fn all_order_items(&self) -> StoreResult<Vec<OrderItem>>;
}

/// One open transaction. All methods observe the transaction's own writes.
#[async_trait]
pub trait StoreTx: Send {
    // ---- customers ----

    async fn customer_by_id(&mut self, id: CustomerId) -> StoreResult<Option<Customer>>;
    async fn customer_by_email(&mut self, email: &str) -> StoreResult<Option<Customer>>;
    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<()>;
    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<()>;
    async fn delete_customer(&mut self, id: CustomerId) -> StoreResult<()>;
    async fn count_orders_for_customer(&mut self, id: CustomerId) -> StoreResult<u64>;

    // ---- products ----

    async fn product_by_id(&mut self, id: ProductId) -> StoreResult<Option<Product>>;
    async fn product_by_name(&mut self, name: &str) -> StoreResult<Option<Product>>;
    async fn insert_product(&mut self, product: &Product) -> StoreResult<()>;
    async fn update_product(&mut self, product: &Product) -> StoreResult<()>;
    async fn delete_product(&mut self, id: ProductId) -> StoreResult<()>;

    // ---- orders & items ----

    async fn order_by_id(&mut self, id: OrderId) -> StoreResult<Option<Order>>;
    async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;
    async fn update_order(&mut self, order: &Order) -> StoreResult<()>;
    /// Deletes the order and any items still attached to it.
    async fn delete_order(&mut self, id: OrderId) -> StoreResult<()>;

    async fn items_for_order(&mut self, id: OrderId) -> StoreResult<Vec<OrderItem>>;
    async fn insert_order_item(&mut self, item: &OrderItem) -> StoreResult<()>;
    async fn delete_items_for_order(&mut self, id: OrderId) -> StoreResult<()>;
    /// Remove the items of one order that reference the given product.
    async fn delete_items_for_product(
        &mut self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> StoreResult<()>;

    // ---- reconciler queries (backed by the product_id/status indexes) ----

    /// All Draft orders holding at least one item for the product.
    async fn draft_orders_containing(&mut self, product_id: ProductId)
        -> StoreResult<Vec<Order>>;
    /// Whether any Confirmed/Completed order holds an item for the product.
    async fn product_has_finalized_orders(&mut self, product_id: ProductId) -> StoreResult<bool>;

    /// Commit every write made through this transaction.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
