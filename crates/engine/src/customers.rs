//! Customer account service.

use chrono::Utc;
use serde::Serialize;

use salesdesk_core::{CustomerId, DomainError};
use salesdesk_customers::{Customer, CustomerPatch, NewCustomer};
use salesdesk_orders::Order;
use salesdesk_store::Page;

use crate::{EngineResult, Services};

/// A customer together with their full order history.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    pub customer: Customer,
    pub orders: Vec<Order>,
}

impl Services {
    pub async fn create_customer(&self, input: NewCustomer) -> EngineResult<Customer> {
        let mut tx = self.store().begin().await?;

        if tx.customer_by_email(&input.email).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "a customer with email '{}' already exists",
                input.email
            ))
            .into());
        }

        let customer = Customer::create(CustomerId::new(), input, Utc::now())?;
        tx.insert_customer(&customer).await?;
        tx.commit().await?;

        tracing::info!(customer_id = %customer.id, company = %customer.company_name, "customer created");
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        customer_id: CustomerId,
        patch: CustomerPatch,
    ) -> EngineResult<Customer> {
        let mut tx = self.store().begin().await?;

        let mut customer = tx
            .customer_by_id(customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {customer_id} not found")))?;

        if let Some(new_email) = patch.email.as_deref() {
            if new_email != customer.email && tx.customer_by_email(new_email).await?.is_some() {
                return Err(DomainError::conflict(format!(
                    "a customer with email '{new_email}' already exists"
                ))
                .into());
            }
        }

        customer.apply_patch(patch)?;
        tx.update_customer(&customer).await?;
        tx.commit().await?;

        tracing::info!(customer_id = %customer.id, "customer updated");
        Ok(customer)
    }

    /// Delete a customer. Customers with any orders, in any status, are
    /// protected: the caller must dispose of the orders first.
    pub async fn delete_customer(&self, customer_id: CustomerId) -> EngineResult<Customer> {
        let mut tx = self.store().begin().await?;

        let customer = tx
            .customer_by_id(customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {customer_id} not found")))?;

        let order_count = tx.count_orders_for_customer(customer_id).await?;
        if order_count > 0 {
            return Err(DomainError::conflict(format!(
                "customer has {order_count} associated order(s) and cannot be deleted"
            ))
            .into());
        }

        tx.delete_customer(customer_id).await?;
        tx.commit().await?;

        tracing::info!(customer_id = %customer_id, "customer deleted");
        Ok(customer)
    }

    pub async fn customer_detail(&self, customer_id: CustomerId) -> EngineResult<CustomerDetail> {
        let customer = self
            .store()
            .customer(customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {customer_id} not found")))?;
        let orders = self.store().orders_for_customer(customer_id).await?;
        Ok(CustomerDetail { customer, orders })
    }

    pub async fn list_customers(&self, page: Page) -> EngineResult<Vec<Customer>> {
        Ok(self.store().customers(page).await?)
    }
}
