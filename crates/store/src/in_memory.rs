//! In-memory store backend.
//!
//! Intended for tests/dev. Transactions serialize on a single async mutex;
//! rollback restores the state snapshot taken at `begin`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use salesdesk_catalog::Product;
use salesdesk_core::{CustomerId, OrderId, OrderItemId, ProductId};
use salesdesk_customers::Customer;
use salesdesk_orders::{Order, OrderItem, OrderStatus};

use crate::error::{StoreError, StoreResult};
use crate::r#trait::{Page, Store, StoreTx};

#[derive(Debug, Clone, Default)]
struct MemState {
    customers: HashMap<CustomerId, Customer>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    items: HashMap<OrderItemId, OrderItem>,
}

impl MemState {
    fn customers_sorted(&self) -> Vec<Customer> {
        let mut rows: Vec<_> = self.customers.values().cloned().collect();
        rows.sort_by_key(|c| (c.created_at, *c.id.as_uuid()));
        rows
    }

    fn products_sorted(&self) -> Vec<Product> {
        let mut rows: Vec<_> = self.products.values().cloned().collect();
        rows.sort_by_key(|p| (p.created_at, *p.id.as_uuid()));
        rows
    }

    fn orders_sorted(&self) -> Vec<Order> {
        let mut rows: Vec<_> = self.orders.values().cloned().collect();
        rows.sort_by_key(|o| (o.created_at, *o.id.as_uuid()));
        rows
    }

    fn items_of(&self, order_id: OrderId) -> Vec<OrderItem> {
        let mut rows: Vec<_> = self
            .items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| (i.created_at, *i.id.as_uuid()));
        rows
    }
}

fn paginate<T>(rows: Vec<T>, page: Page) -> Vec<T> {
    rows.into_iter()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .collect()
}

/// In-memory [`Store`] implementation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(InMemoryTx {
            guard,
            snapshot: Some(snapshot),
        }))
    }

    async fn customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        Ok(self.state.lock().await.customers.get(&id).cloned())
    }

    async fn customers(&self, page: Page) -> StoreResult<Vec<Customer>> {
        Ok(paginate(self.state.lock().await.customers_sorted(), page))
    }

    async fn orders_for_customer(&self, id: CustomerId) -> StoreResult<Vec<Order>> {
        Ok(self
            .state
            .lock()
            .await
            .orders_sorted()
            .into_iter()
            .filter(|o| o.customer_id == id)
            .collect())
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn products(&self, page: Page) -> StoreResult<Vec<Product>> {
        Ok(paginate(self.state.lock().await.products_sorted(), page))
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn orders(&self, page: Page) -> StoreResult<Vec<Order>> {
        Ok(paginate(self.state.lock().await.orders_sorted(), page))
    }

    async fn order_items(&self, id: OrderId) -> StoreResult<Vec<OrderItem>> {
        Ok(self.state.lock().await.items_of(id))
    }

    async fn all_customers(&self) -> StoreResult<Vec<Customer>> {
        Ok(self.state.lock().await.customers_sorted())
    }

    async fn all_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.state.lock().await.products_sorted())
    }

    async fn all_orders(&self) -> StoreResult<Vec<Order>> {
        Ok(self.state.lock().await.orders_sorted())
    }

    async fn all_order_items(&self) -> StoreResult<Vec<OrderItem>> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state.items.values().cloned().collect();
        rows.sort_by_key(|i| (i.created_at, *i.id.as_uuid()));
        Ok(rows)
    }
}

/// One open in-memory transaction.
///
/// Holds the store mutex for its whole lifetime, so concurrent transactions
/// serialize rather than conflict. Dropping without commit restores the
/// snapshot.
struct InMemoryTx {
    guard: OwnedMutexGuard<MemState>,
    snapshot: Option<MemState>,
}

impl Drop for InMemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn customer_by_id(&mut self, id: CustomerId) -> StoreResult<Option<Customer>> {
        Ok(self.guard.customers.get(&id).cloned())
    }

    async fn customer_by_email(&mut self, email: &str) -> StoreResult<Option<Customer>> {
        Ok(self
            .guard
            .customers
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<()> {
        if self
            .guard
            .customers
            .values()
            .any(|c| c.email == customer.email)
        {
            return Err(StoreError::conflict(format!(
                "customers.email duplicate: {}",
                customer.email
            )));
        }
        self.guard.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<()> {
        if self
            .guard
            .customers
            .values()
            .any(|c| c.id != customer.id && c.email == customer.email)
        {
            return Err(StoreError::conflict(format!(
                "customers.email duplicate: {}",
                customer.email
            )));
        }
        self.guard.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn delete_customer(&mut self, id: CustomerId) -> StoreResult<()> {
        self.guard.customers.remove(&id);
        Ok(())
    }

    async fn count_orders_for_customer(&mut self, id: CustomerId) -> StoreResult<u64> {
        Ok(self
            .guard
            .orders
            .values()
            .filter(|o| o.customer_id == id)
            .count() as u64)
    }

    async fn product_by_id(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.guard.products.get(&id).cloned())
    }

    async fn product_by_name(&mut self, name: &str) -> StoreResult<Option<Product>> {
        Ok(self
            .guard
            .products
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
        if self.guard.products.values().any(|p| p.name == product.name) {
            return Err(StoreError::conflict(format!(
                "products.name duplicate: {}",
                product.name
            )));
        }
        self.guard.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> StoreResult<()> {
        if self
            .guard
            .products
            .values()
            .any(|p| p.id != product.id && p.name == product.name)
        {
            return Err(StoreError::conflict(format!(
                "products.name duplicate: {}",
                product.name
            )));
        }
        self.guard.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete_product(&mut self, id: ProductId) -> StoreResult<()> {
        if self.guard.items.values().any(|i| i.product_id == id) {
            // RESTRICT semantics, like the foreign key in Postgres.
            return Err(StoreError::conflict(format!(
                "order_items still reference product {id}"
            )));
        }
        self.guard.products.remove(&id);
        Ok(())
    }

    async fn order_by_id(&mut self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.guard.orders.get(&id).cloned())
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        self.guard.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> StoreResult<()> {
        self.guard.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> StoreResult<()> {
        self.guard.items.retain(|_, item| item.order_id != id);
        self.guard.orders.remove(&id);
        Ok(())
    }

    async fn items_for_order(&mut self, id: OrderId) -> StoreResult<Vec<OrderItem>> {
        Ok(self.guard.items_of(id))
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> StoreResult<()> {
        self.guard.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn delete_items_for_order(&mut self, id: OrderId) -> StoreResult<()> {
        self.guard.items.retain(|_, item| item.order_id != id);
        Ok(())
    }

    async fn delete_items_for_product(
        &mut self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> StoreResult<()> {
        self.guard
            .items
            .retain(|_, item| !(item.order_id == order_id && item.product_id == product_id));
        Ok(())
    }

    async fn draft_orders_containing(
        &mut self,
        product_id: ProductId,
    ) -> StoreResult<Vec<Order>> {
        let order_ids: std::collections::HashSet<OrderId> = self
            .guard
            .items
            .values()
            .filter(|i| i.product_id == product_id)
            .map(|i| i.order_id)
            .collect();
        Ok(self
            .guard
            .orders_sorted()
            .into_iter()
            .filter(|o| o.status == OrderStatus::Draft && order_ids.contains(&o.id))
            .collect())
    }

    async fn product_has_finalized_orders(&mut self, product_id: ProductId) -> StoreResult<bool> {
        Ok(self.guard.items.values().any(|item| {
            item.product_id == product_id
                && self
                    .guard
                    .orders
                    .get(&item.order_id)
                    .is_some_and(|o| o.is_finalized())
        }))
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        // Forget the snapshot so Drop keeps the mutated state.
        self.snapshot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use salesdesk_catalog::NewProduct;
    use salesdesk_customers::NewCustomer;

    fn customer(email: &str) -> Customer {
        Customer::create(
            CustomerId::new(),
            NewCustomer {
                company_name: "Acme Corp".to_string(),
                industry: "Technology".to_string(),
                name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: email.to_string(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn product(name: &str, price: i64) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                name: name.to_string(),
                service_line: "Audit".to_string(),
                description: None,
                price: Decimal::new(price, 2),
                is_active: true,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn commit_makes_writes_visible() {
        let store = InMemoryStore::new();
        let alice = customer("alice@acme.com");

        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&alice).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.customer(alice.id).await.unwrap(), Some(alice));
    }

    #[tokio::test]
    async fn dropping_a_transaction_rolls_back() {
        let store = InMemoryStore::new();
        let alice = customer("alice@acme.com");

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_customer(&alice).await.unwrap();
            // No commit: dropped here.
        }

        assert_eq!(store.customer(alice.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rollback_discards_partial_multi_write() {
        let store = InMemoryStore::new();
        let alice = customer("alice@acme.com");
        let audit = product("Audit", 10_000);

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_customer(&alice).await.unwrap();
            tx.insert_product(&audit).await.unwrap();
            let order = Order::new(OrderId::new(), alice.id, audit.price, Utc::now());
            tx.insert_order(&order).await.unwrap();
        }

        assert!(store.all_customers().await.unwrap().is_empty());
        assert!(store.all_products().await.unwrap().is_empty());
        assert!(store.all_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&customer("dup@acme.com")).await.unwrap();
        let err = tx
            .insert_customer(&customer("dup@acme.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn draft_orders_containing_filters_by_status_and_product() {
        let store = InMemoryStore::new();
        let alice = customer("alice@acme.com");
        let audit = product("Audit", 10_000);
        let tax = product("Tax", 5_000);

        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&alice).await.unwrap();
        tx.insert_product(&audit).await.unwrap();
        tx.insert_product(&tax).await.unwrap();

        let draft = Order::new(OrderId::new(), alice.id, audit.price, Utc::now());
        tx.insert_order(&draft).await.unwrap();
        tx.insert_order_item(&OrderItem::new(draft.id, audit.id, audit.price, Utc::now()))
            .await
            .unwrap();

        let mut confirmed = Order::new(OrderId::new(), alice.id, audit.price, Utc::now());
        confirmed.status = OrderStatus::Confirmed;
        tx.insert_order(&confirmed).await.unwrap();
        tx.insert_order_item(&OrderItem::new(
            confirmed.id,
            audit.id,
            audit.price,
            Utc::now(),
        ))
        .await
        .unwrap();

        let tax_only = Order::new(OrderId::new(), alice.id, tax.price, Utc::now());
        tx.insert_order(&tax_only).await.unwrap();
        tx.insert_order_item(&OrderItem::new(tax_only.id, tax.id, tax.price, Utc::now()))
            .await
            .unwrap();

        let drafts = tx.draft_orders_containing(audit.id).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, draft.id);

        assert!(tx.product_has_finalized_orders(audit.id).await.unwrap());
        assert!(!tx.product_has_finalized_orders(tax.id).await.unwrap());
    }
}
