//! Postgres-backed store implementation.
//!
//! One sqlx transaction per [`Store::begin`]; the engine commits explicitly
//! and sqlx rolls back automatically when a transaction is dropped.
//!
//! ## Error Mapping
//!
//! | PostgreSQL error code | StoreError  | Scenario                               |
//! |-----------------------|-------------|----------------------------------------|
//! | `40001`, `40P01`      | `Transient` | Serialization failure / deadlock       |
//! | `23505`               | `Conflict`  | Unique index (email, product name)     |
//! | `23503`               | `Conflict`  | Foreign key (RESTRICT on order_items)  |
//! | anything else         | `Backend`   | Connection loss, corrupt rows, ...     |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use salesdesk_catalog::Product;
use salesdesk_core::{CustomerId, OrderId, OrderItemId, ProductId};
use salesdesk_customers::Customer;
use salesdesk_orders::{Order, OrderItem, OrderStatus};

use crate::error::{StoreError, StoreResult};
use crate::r#trait::{Page, Store, StoreTx};

/// Postgres [`Store`] implementation over a sqlx connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply pending migrations.
    #[instrument(skip(url))]
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::backend(format!("migration failed: {e}")))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(&format!("{CUSTOMER_SELECT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("customer", e))?;
        row.map(customer_from_row).transpose()
    }

    async fn customers(&self, page: Page) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query(&format!(
            "{CUSTOMER_SELECT} ORDER BY created_at, id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit as i64)
        .bind(page.skip as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("customers", e))?;
        rows.into_iter().map(customer_from_row).collect()
    }

    async fn orders_for_customer(&self, id: CustomerId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "{ORDER_SELECT} WHERE customer_id = $1 ORDER BY created_at, id"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_customer", e))?;
        rows.into_iter().map(order_from_row).collect()
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("{PRODUCT_SELECT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product", e))?;
        row.map(product_from_row).transpose()
    }

    async fn products(&self, page: Page) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "{PRODUCT_SELECT} ORDER BY created_at, id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit as i64)
        .bind(page.skip as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("products", e))?;
        rows.into_iter().map(product_from_row).collect()
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!("{ORDER_SELECT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order", e))?;
        row.map(order_from_row).transpose()
    }

    async fn orders(&self, page: Page) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "{ORDER_SELECT} ORDER BY created_at, id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit as i64)
        .bind(page.skip as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders", e))?;
        rows.into_iter().map(order_from_row).collect()
    }

    async fn order_items(&self, id: OrderId) -> StoreResult<Vec<OrderItem>> {
        let rows = sqlx::query(&format!(
            "{ITEM_SELECT} WHERE order_id = $1 ORDER BY created_at, id"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("order_items", e))?;
        rows.into_iter().map(item_from_row).collect()
    }

    async fn all_customers(&self) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query(&format!("{CUSTOMER_SELECT} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("all_customers", e))?;
        rows.into_iter().map(customer_from_row).collect()
    }

    async fn all_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!("{PRODUCT_SELECT} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("all_products", e))?;
        rows.into_iter().map(product_from_row).collect()
    }

    async fn all_orders(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!("{ORDER_SELECT} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("all_orders", e))?;
        rows.into_iter().map(order_from_row).collect()
    }

    async fn all_order_items(&self) -> StoreResult<Vec<OrderItem>> {
        let rows = sqlx::query(&format!("{ITEM_SELECT} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("all_order_items", e))?;
        rows.into_iter().map(item_from_row).collect()
    }
}

/// One open Postgres transaction.
struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn customer_by_id(&mut self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(&format!("{CUSTOMER_SELECT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("customer_by_id", e))?;
        row.map(customer_from_row).transpose()
    }

    async fn customer_by_email(&mut self, email: &str) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(&format!("{CUSTOMER_SELECT} WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("customer_by_email", e))?;
        row.map(customer_from_row).transpose()
    }

    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, company_name, industry, name, last_name, email, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.company_name)
        .bind(&customer.industry)
        .bind(&customer.name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(customer.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_customer", e))?;
        Ok(())
    }

    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE customers
            SET company_name = $2, industry = $3, name = $4, last_name = $5, email = $6
            WHERE id = $1
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.company_name)
        .bind(&customer.industry)
        .bind(&customer.name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_customer", e))?;
        Ok(())
    }

    async fn delete_customer(&mut self, id: CustomerId) -> StoreResult<()> {
        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_customer", e))?;
        Ok(())
    }

    async fn count_orders_for_customer(&mut self, id: CustomerId) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM orders WHERE customer_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("count_orders_for_customer", e))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::backend(format!("failed to read count: {e}")))?;
        Ok(n as u64)
    }

    async fn product_by_id(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("{PRODUCT_SELECT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("product_by_id", e))?;
        row.map(product_from_row).transpose()
    }

    async fn product_by_name(&mut self, name: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("{PRODUCT_SELECT} WHERE name = $1"))
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("product_by_name", e))?;
        row.map(product_from_row).transpose()
    }

    async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, service_line, description, price, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.service_line)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET name = $2, service_line = $3, description = $4, price = $5, is_active = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.service_line)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.is_active)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        Ok(())
    }

    async fn delete_product(&mut self, id: ProductId) -> StoreResult<()> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(())
    }

    async fn order_by_id(&mut self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!("{ORDER_SELECT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("order_by_id", e))?;
        row.map(order_from_row).transpose()
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, total_amount, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.total_amount)
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> StoreResult<()> {
        sqlx::query("UPDATE orders SET status = $2, total_amount = $3 WHERE id = $1")
            .bind(order.id.as_uuid())
            .bind(order.status.as_str())
            .bind(order.total_amount)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_order", e))?;
        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> StoreResult<()> {
        // ON DELETE CASCADE removes the items.
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        Ok(())
    }

    async fn items_for_order(&mut self, id: OrderId) -> StoreResult<Vec<OrderItem>> {
        let rows = sqlx::query(&format!(
            "{ITEM_SELECT} WHERE order_id = $1 ORDER BY created_at, id"
        ))
        .bind(id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("items_for_order", e))?;
        rows.into_iter().map(item_from_row).collect()
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, unit_price, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.order_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.unit_price)
        .bind(item.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order_item", e))?;
        Ok(())
    }

    async fn delete_items_for_order(&mut self, id: OrderId) -> StoreResult<()> {
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_items_for_order", e))?;
        Ok(())
    }

    async fn delete_items_for_product(
        &mut self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> StoreResult<()> {
        sqlx::query("DELETE FROM order_items WHERE order_id = $1 AND product_id = $2")
            .bind(order_id.as_uuid())
            .bind(product_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_items_for_product", e))?;
        Ok(())
    }

    async fn draft_orders_containing(
        &mut self,
        product_id: ProductId,
    ) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT o.id, o.customer_id, o.status, o.total_amount, o.created_at
            FROM orders o
            JOIN order_items i ON i.order_id = o.id
            WHERE i.product_id = $1 AND o.status = 'draft'
            ORDER BY o.created_at, o.id
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("draft_orders_containing", e))?;
        rows.into_iter().map(order_from_row).collect()
    }

    async fn product_has_finalized_orders(&mut self, product_id: ProductId) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM order_items i
                JOIN orders o ON o.id = i.order_id
                WHERE i.product_id = $1 AND o.status IN ('confirmed', 'completed')
            ) AS found
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("product_has_finalized_orders", e))?;
        row.try_get("found")
            .map_err(|e| StoreError::backend(format!("failed to read exists flag: {e}")))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}

// Column lists shared between pool- and transaction-scoped queries.
const CUSTOMER_SELECT: &str =
    "SELECT id, company_name, industry, name, last_name, email, created_at FROM customers";
const PRODUCT_SELECT: &str =
    "SELECT id, name, service_line, description, price, is_active, created_at FROM products";
const ORDER_SELECT: &str =
    "SELECT id, customer_id, status, total_amount, created_at FROM orders";
const ITEM_SELECT: &str =
    "SELECT id, order_id, product_id, unit_price, created_at FROM order_items";

fn customer_from_row(row: PgRow) -> StoreResult<Customer> {
    Ok(Customer {
        id: CustomerId::from_uuid(get(&row, "id")?),
        company_name: get(&row, "company_name")?,
        industry: get(&row, "industry")?,
        name: get(&row, "name")?,
        last_name: get(&row, "last_name")?,
        email: get(&row, "email")?,
        created_at: get::<DateTime<Utc>>(&row, "created_at")?,
    })
}

fn product_from_row(row: PgRow) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::from_uuid(get(&row, "id")?),
        name: get(&row, "name")?,
        service_line: get(&row, "service_line")?,
        description: get::<Option<String>>(&row, "description")?,
        price: get::<Decimal>(&row, "price")?,
        is_active: get(&row, "is_active")?,
        created_at: get::<DateTime<Utc>>(&row, "created_at")?,
    })
}

fn order_from_row(row: PgRow) -> StoreResult<Order> {
    let status: String = get(&row, "status")?;
    Ok(Order {
        id: OrderId::from_uuid(get(&row, "id")?),
        customer_id: CustomerId::from_uuid(get(&row, "customer_id")?),
        status: status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::backend(format!("corrupt order status: {e}")))?,
        total_amount: get::<Decimal>(&row, "total_amount")?,
        created_at: get::<DateTime<Utc>>(&row, "created_at")?,
    })
}

fn item_from_row(row: PgRow) -> StoreResult<OrderItem> {
    Ok(OrderItem {
        id: OrderItemId::from_uuid(get(&row, "id")?),
        order_id: OrderId::from_uuid(get(&row, "order_id")?),
        product_id: ProductId::from_uuid(get(&row, "product_id")?),
        unit_price: get::<Decimal>(&row, "unit_price")?,
        created_at: get::<DateTime<Utc>>(&row, "created_at")?,
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::backend(format!("failed to decode column {column}: {e}")))
}

/// Map sqlx errors to the store taxonomy.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Serialization failure / deadlock: whole-operation retry is safe.
                Some("40001") | Some("40P01") => StoreError::Transient(msg),
                // Unique or foreign key violation.
                Some("23505") | Some("23503") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Transient(format!("connection pool timed out in {operation}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}
