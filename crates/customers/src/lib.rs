//! `salesdesk-customers` — customer (company) entity and input validation.

pub mod customer;

pub use customer::{Customer, CustomerPatch, NewCustomer};
