//! `salesdesk-engine` — application services over the relational store.
//!
//! Each mutating operation opens exactly one store transaction, validates
//! every business rule before writing, and commits only when the whole
//! operation succeeded. Reads (listing, details, analytics) go through the
//! store's plain read methods.

use std::sync::Arc;

use thiserror::Error;

use salesdesk_core::DomainError;
use salesdesk_store::{Store, StoreError};

pub mod analytics;
pub mod catalog;
pub mod customers;
pub mod orders;

pub use analytics::{DashboardStats, StatsFilter};
pub use catalog::{reconcile_product_deactivation, DeleteAction, ProductDeleteOutcome, ProductUpdateOutcome};
pub use customers::CustomerDetail;
pub use orders::OrderDetail;

/// Result type used across the engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error: a rejected business rule or a store failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The engine's service facade, shared by the HTTP layer.
///
/// Holds the store handle; the operation implementations live in the
/// per-domain modules ([`orders`], [`catalog`], [`customers`],
/// [`analytics`]).
#[derive(Clone)]
pub struct Services {
    store: Arc<dyn Store>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
