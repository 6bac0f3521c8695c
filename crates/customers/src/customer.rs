use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salesdesk_core::{CustomerId, DomainError, DomainResult};

/// A customer company and its primary contact.
///
/// The email is unique across all customers; the store enforces it with a
/// unique index and the engine pre-checks it to report a readable conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub company_name: String,
    pub industry: String,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Validated input for registering a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub company_name: String,
    pub industry: String,
    pub name: String,
    pub last_name: String,
    pub email: String,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPatch {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl Customer {
    /// Build a new customer record from validated input.
    pub fn create(id: CustomerId, input: NewCustomer, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id,
            company_name: input.company_name,
            industry: input.industry,
            name: input.name,
            last_name: input.last_name,
            email: input.email,
            created_at: now,
        })
    }

    /// Apply a partial update in place, re-validating the result.
    pub fn apply_patch(&mut self, patch: CustomerPatch) -> DomainResult<()> {
        if let Some(company_name) = patch.company_name {
            self.company_name = company_name;
        }
        if let Some(industry) = patch.industry {
            self.industry = industry;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        NewCustomer {
            company_name: self.company_name.clone(),
            industry: self.industry.clone(),
            name: self.name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
        .validate()
    }
}

impl NewCustomer {
    pub fn validate(&self) -> DomainResult<()> {
        ensure_non_empty("company_name", &self.company_name)?;
        ensure_non_empty("industry", &self.industry)?;
        ensure_non_empty("name", &self.name)?;
        ensure_non_empty("last_name", &self.last_name)?;
        ensure_email(&self.email)
    }
}

fn ensure_non_empty(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Lightweight structural check; full mailbox validation is out of scope.
fn ensure_email(value: &str) -> DomainResult<()> {
    let Some((local, domain)) = value.split_once('@') else {
        return Err(DomainError::validation("email must contain '@'"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(DomainError::validation(format!("'{value}' is not a valid email")));
    }
    Ok(())
}
