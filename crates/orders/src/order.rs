use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use salesdesk_core::{CustomerId, OrderId, OrderItemId, ProductId};

use crate::status::OrderStatus;

/// An order (engagement): a sold service bundle for one customer.
///
/// `total_amount` is derived state and must equal the sum of the item
/// snapshots after every mutation; the engine recomputes it via [`total_of`]
/// whenever the item set changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Immutable after creation.
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One line of an order, referencing a catalog product.
///
/// `unit_price` is the price snapshot frozen when the item was added. It is
/// never re-read from the live product, so historical totals survive catalog
/// price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: OrderId,
        customer_id: CustomerId,
        total_amount: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            status: OrderStatus::Draft,
            total_amount,
            created_at: now,
        }
    }

    /// Item edits (replacement and reconciliation) are only legal in Draft.
    pub fn is_modifiable(&self) -> bool {
        self.status == OrderStatus::Draft
    }

    /// Finalized orders pin their products against hard deletion.
    pub fn is_finalized(&self) -> bool {
        matches!(self.status, OrderStatus::Confirmed | OrderStatus::Completed)
    }
}

impl OrderItem {
    pub fn new(
        order_id: OrderId,
        product_id: ProductId,
        unit_price: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderItemId::new(),
            order_id,
            product_id,
            unit_price,
            created_at: now,
        }
    }
}

/// Sum of the frozen item snapshots: the one place order totals come from.
pub fn total_of(items: &[OrderItem]) -> Decimal {
    items.iter().map(|item| item.unit_price).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(price: &str) -> OrderItem {
        OrderItem::new(OrderId::new(), ProductId::new(), dec(price), Utc::now())
    }

    #[test]
    fn new_orders_start_in_draft() {
        let order = Order::new(OrderId::new(), CustomerId::new(), dec("0.00"), Utc::now());
        assert_eq!(order.status, OrderStatus::Draft);
        assert!(order.is_modifiable());
        assert!(!order.is_finalized());
    }

    #[test]
    fn total_is_the_sum_of_snapshots() {
        let items = vec![item("120.50"), item("79.50")];
        assert_eq!(total_of(&items), dec("200.00"));
        assert_eq!(total_of(&[]), Decimal::ZERO);
    }

    #[test]
    fn confirmed_and_completed_are_finalized() {
        let mut order = Order::new(OrderId::new(), CustomerId::new(), dec("10.00"), Utc::now());
        order.status = OrderStatus::Confirmed;
        assert!(order.is_finalized());
        assert!(!order.is_modifiable());
        order.status = OrderStatus::Completed;
        assert!(order.is_finalized());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: removing one item reduces the total by exactly that
            /// item's frozen price (the reconciler relies on this).
            #[test]
            fn removing_an_item_subtracts_its_snapshot(
                cents in proptest::collection::vec(1u64..10_000_000, 1..20),
                pick in any::<proptest::sample::Index>(),
            ) {
                let items: Vec<OrderItem> = cents
                    .iter()
                    .map(|c| OrderItem::new(
                        OrderId::new(),
                        ProductId::new(),
                        Decimal::new(*c as i64, 2),
                        Utc::now(),
                    ))
                    .collect();
                let idx = pick.index(items.len());
                let removed = items[idx].unit_price;
                let mut remaining = items.clone();
                remaining.remove(idx);

                prop_assert_eq!(total_of(&items) - removed, total_of(&remaining));
            }

            /// Property: totals are order-independent.
            #[test]
            fn total_is_permutation_invariant(
                cents in proptest::collection::vec(1u64..10_000_000, 0..20),
            ) {
                let items: Vec<OrderItem> = cents
                    .iter()
                    .map(|c| OrderItem::new(
                        OrderId::new(),
                        ProductId::new(),
                        Decimal::new(*c as i64, 2),
                        Utc::now(),
                    ))
                    .collect();
                let mut reversed = items.clone();
                reversed.reverse();
                prop_assert_eq!(total_of(&items), total_of(&reversed));
            }
        }
    }
}
