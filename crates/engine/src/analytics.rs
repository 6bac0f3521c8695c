//! Dashboard analytics rollup.
//!
//! Pure aggregation over full-table snapshot reads. The month filter applies
//! to KPI cards and the industry/service-line breakdowns; the annual trend
//! always covers the full selected year, one entry per month.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use salesdesk_catalog::Product;
use salesdesk_customers::Customer;
use salesdesk_orders::{Order, OrderItem, OrderStatus};

use crate::{EngineResult, Services};

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Temporal scope for the dashboard. `month` is 1..=12 when present.
#[derive(Debug, Clone, Copy)]
pub struct StatsFilter {
    pub month: Option<u32>,
    pub year: i32,
}

/// One named aggregate (industry or service line).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue<T> {
    pub name: String,
    pub value: T,
}

/// Headline counters for the selected period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCards {
    /// Confirmed + completed orders.
    pub active_engagements: u64,
    /// Sum of order totals, every status included.
    pub total_contract_value: f64,
    /// Draft orders.
    pub inactive_engagements: u64,
}

/// One month of the annual trend: the month label plus a revenue figure per
/// service line (every known service line present, zero-filled).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTrend {
    pub month: &'static str,
    #[serde(flatten)]
    pub by_service_line: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub kpi_cards: KpiCards,
    pub revenue_by_industry: Vec<NamedValue<f64>>,
    pub share_by_industry: Vec<NamedValue<u64>>,
    pub revenue_by_service_line: Vec<NamedValue<f64>>,
    pub share_by_service_line: Vec<NamedValue<u64>>,
    pub annual_trends: Vec<MonthTrend>,
}

impl Services {
    pub async fn dashboard_stats(&self, filter: StatsFilter) -> EngineResult<DashboardStats> {
        let customers = self.store().all_customers().await?;
        let products = self.store().all_products().await?;
        let orders = self.store().all_orders().await?;
        let items = self.store().all_order_items().await?;
        Ok(compute_dashboard_stats(
            filter, &customers, &products, &orders, &items,
        ))
    }
}

/// Aggregate the snapshot into the dashboard payload.
pub fn compute_dashboard_stats(
    filter: StatsFilter,
    customers: &[Customer],
    products: &[Product],
    orders: &[Order],
    items: &[OrderItem],
) -> DashboardStats {
    let in_period = |ts: chrono::DateTime<chrono::Utc>| {
        ts.year() == filter.year && filter.month.is_none_or(|m| ts.month() == m)
    };

    let industry_of: BTreeMap<_, _> = customers
        .iter()
        .map(|c| (c.id, c.industry.as_str()))
        .collect();
    let service_line_of: BTreeMap<_, _> = products
        .iter()
        .map(|p| (p.id, p.service_line.as_str()))
        .collect();

    // KPI cards + industry breakdowns walk the orders once.
    let mut active = 0u64;
    let mut inactive = 0u64;
    let mut contract_value = Decimal::ZERO;
    let mut industry_revenue: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut industry_share: BTreeMap<&str, u64> = BTreeMap::new();
    for order in orders.iter().filter(|o| in_period(o.created_at)) {
        match order.status {
            OrderStatus::Confirmed | OrderStatus::Completed => active += 1,
            OrderStatus::Draft => inactive += 1,
        }
        contract_value += order.total_amount;
        if let Some(industry) = industry_of.get(&order.customer_id) {
            *industry_revenue.entry(industry).or_default() += order.total_amount;
            *industry_share.entry(industry).or_default() += 1;
        }
    }

    // Service-line breakdowns walk the item snapshots.
    let mut line_revenue: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut line_share: BTreeMap<&str, u64> = BTreeMap::new();
    for item in items.iter().filter(|i| in_period(i.created_at)) {
        if let Some(line) = service_line_of.get(&item.product_id) {
            *line_revenue.entry(line).or_default() += item.unit_price;
            *line_share.entry(line).or_default() += 1;
        }
    }

    // Annual trend: year filter only, all twelve months, every service line
    // present in the catalog zero-filled.
    let all_lines: BTreeSet<&str> = products.iter().map(|p| p.service_line.as_str()).collect();
    let mut trends: Vec<MonthTrend> = MONTH_ABBR
        .iter()
        .map(|&month| MonthTrend {
            month,
            by_service_line: all_lines
                .iter()
                .map(|&line| (line.to_string(), 0.0))
                .collect(),
        })
        .collect();
    for item in items.iter().filter(|i| i.created_at.year() == filter.year) {
        let Some(line) = service_line_of.get(&item.product_id) else {
            continue;
        };
        let idx = item.created_at.month0() as usize;
        if let Some(slot) = trends[idx].by_service_line.get_mut(*line) {
            *slot += to_f64(item.unit_price);
        }
    }

    DashboardStats {
        kpi_cards: KpiCards {
            active_engagements: active,
            total_contract_value: to_f64(contract_value),
            inactive_engagements: inactive,
        },
        revenue_by_industry: named(industry_revenue, to_f64),
        share_by_industry: named(industry_share, |v| v),
        revenue_by_service_line: named(line_revenue, to_f64),
        share_by_service_line: named(line_share, |v| v),
        annual_trends: trends,
    }
}

fn named<V, T>(map: BTreeMap<&str, V>, convert: impl Fn(V) -> T) -> Vec<NamedValue<T>> {
    map.into_iter()
        .map(|(name, value)| NamedValue {
            name: name.to_string(),
            value: convert(value),
        })
        .collect()
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use salesdesk_core::{CustomerId, OrderId, ProductId};
    use salesdesk_customers::NewCustomer;
    use salesdesk_catalog::NewProduct;

    use super::*;

    fn at(year: i32, month: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, 15, 12, 0, 0).unwrap()
    }

    fn customer(industry: &str, at: DateTime<Utc>) -> Customer {
        Customer::create(
            CustomerId::new(),
            NewCustomer {
                company_name: format!("{industry} Co"),
                industry: industry.to_string(),
                name: "Contact".to_string(),
                last_name: "Person".to_string(),
                email: format!("{}@{industry}.com", CustomerId::new()),
            },
            at,
        )
        .unwrap()
    }

    fn product(name: &str, line: &str, price: Decimal, at: DateTime<Utc>) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                name: name.to_string(),
                service_line: line.to_string(),
                description: None,
                price,
                is_active: true,
            },
            at,
        )
        .unwrap()
    }

    fn order_with_items(
        customer: &Customer,
        products: &[&Product],
        status: OrderStatus,
        ts: DateTime<Utc>,
    ) -> (Order, Vec<OrderItem>) {
        let order_id = OrderId::new();
        let items: Vec<OrderItem> = products
            .iter()
            .map(|p| OrderItem::new(order_id, p.id, p.price, ts))
            .collect();
        let mut order = Order::new(order_id, customer.id, salesdesk_orders::total_of(&items), ts);
        order.status = status;
        (order, items)
    }

    #[test]
    fn kpi_cards_split_statuses_and_sum_totals() {
        let cust = customer("Technology", at(2026, 1));
        let prod = product("Audit", "Consulting", Decimal::new(150000, 2), at(2026, 1));

        let (draft, mut items) = order_with_items(&cust, &[&prod], OrderStatus::Draft, at(2026, 3));
        let (confirmed, more) =
            order_with_items(&cust, &[&prod], OrderStatus::Confirmed, at(2026, 4));
        items.extend(more);

        let stats = compute_dashboard_stats(
            StatsFilter { month: None, year: 2026 },
            &[cust],
            &[prod],
            &[draft, confirmed],
            &items,
        );
        assert_eq!(stats.kpi_cards.active_engagements, 1);
        assert_eq!(stats.kpi_cards.inactive_engagements, 1);
        assert_eq!(stats.kpi_cards.total_contract_value, 3000.0);
    }

    #[test]
    fn month_filter_scopes_everything_except_annual_trends() {
        let cust = customer("Finance", at(2026, 1));
        let prod = product("Retainer", "Advisory", Decimal::new(50000, 2), at(2026, 1));

        let (march, mut items) =
            order_with_items(&cust, &[&prod], OrderStatus::Confirmed, at(2026, 3));
        let (june, more) = order_with_items(&cust, &[&prod], OrderStatus::Confirmed, at(2026, 6));
        items.extend(more);

        let stats = compute_dashboard_stats(
            StatsFilter { month: Some(3), year: 2026 },
            &[cust],
            &[prod],
            &[march, june],
            &items,
        );
        assert_eq!(stats.kpi_cards.active_engagements, 1);
        assert_eq!(stats.revenue_by_industry.len(), 1);
        assert_eq!(stats.revenue_by_industry[0].value, 500.0);
        assert_eq!(stats.share_by_service_line[0].value, 1);

        // The trend still carries both months of the year.
        assert_eq!(stats.annual_trends.len(), 12);
        assert_eq!(stats.annual_trends[2].by_service_line["Advisory"], 500.0);
        assert_eq!(stats.annual_trends[5].by_service_line["Advisory"], 500.0);
    }

    #[test]
    fn other_years_are_excluded() {
        let cust = customer("Retail", at(2025, 1));
        let prod = product("Rollout", "Implementation", Decimal::new(20000, 2), at(2025, 1));

        let (old, items) = order_with_items(&cust, &[&prod], OrderStatus::Completed, at(2025, 8));

        let stats = compute_dashboard_stats(
            StatsFilter { month: None, year: 2026 },
            &[cust],
            &[prod],
            &[old],
            &items,
        );
        assert_eq!(stats.kpi_cards.active_engagements, 0);
        assert_eq!(stats.kpi_cards.total_contract_value, 0.0);
        assert!(stats.revenue_by_industry.is_empty());
        assert_eq!(stats.annual_trends[7].by_service_line["Implementation"], 0.0);
    }

    #[test]
    fn trend_months_zero_fill_every_service_line() {
        let prod_a = product("Audit", "Consulting", Decimal::new(10000, 2), at(2026, 1));
        let prod_b = product("Helpdesk", "Support", Decimal::new(5000, 2), at(2026, 1));

        let stats = compute_dashboard_stats(
            StatsFilter { month: None, year: 2026 },
            &[],
            &[prod_a, prod_b],
            &[],
            &[],
        );
        assert_eq!(stats.annual_trends[0].month, "Jan");
        assert_eq!(stats.annual_trends[11].month, "Dec");
        for entry in &stats.annual_trends {
            assert_eq!(entry.by_service_line.len(), 2);
            assert_eq!(entry.by_service_line["Consulting"], 0.0);
            assert_eq!(entry.by_service_line["Support"], 0.0);
        }
    }
}
