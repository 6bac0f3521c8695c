use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use salesdesk_core::{DomainError, DomainResult, ProductId};

/// A catalog product: one sellable service.
///
/// `price` is the *live* catalog price. Orders never read it after creation;
/// they carry their own frozen snapshot on each item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Unique across the catalog.
    pub name: String,
    /// Categorical tag used for analytics grouping (e.g. Audit, Tax).
    pub service_line: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub service_line: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Products default to active when the field is omitted.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub service_line: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl Product {
    /// Build a new product record from validated input.
    pub fn create(id: ProductId, input: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id,
            name: input.name,
            service_line: input.service_line,
            description: input.description,
            price: input.price,
            is_active: input.is_active,
            created_at: now,
        })
    }

    /// Apply a partial update in place, re-validating the result.
    pub fn apply_patch(&mut self, patch: ProductPatch) -> DomainResult<()> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(service_line) = patch.service_line {
            self.service_line = service_line;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        if self.service_line.trim().is_empty() {
            return Err(DomainError::validation("service_line must not be empty"));
        }
        ensure_price(self.price)
    }
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        if self.service_line.trim().is_empty() {
            return Err(DomainError::validation("service_line must not be empty"));
        }
        ensure_price(self.price)
    }
}

/// Prices are strictly positive with at most two fractional digits.
pub fn ensure_price(price: Decimal) -> DomainResult<()> {
    if price <= Decimal::ZERO {
        return Err(DomainError::validation("price must be positive"));
    }
    if price.round_dp(2) != price {
        return Err(DomainError::validation(
            "price must have at most two fractional digits",
        ));
    }
    Ok(())
}
