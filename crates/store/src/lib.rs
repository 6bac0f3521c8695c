//! `salesdesk-store` — the relational store behind the engine.
//!
//! Two implementations of the same [`Store`]/[`StoreTx`] contract:
//! - [`InMemoryStore`]: tests/dev, transaction semantics emulated with a
//!   state snapshot restored on rollback.
//! - [`PgStore`]: Postgres via sqlx, one database transaction per
//!   [`Store::begin`].

pub mod error;
pub mod in_memory;
pub mod postgres;
mod r#trait;

pub use error::{StoreError, StoreResult};
pub use in_memory::InMemoryStore;
pub use postgres::PgStore;
pub use r#trait::{Page, Store, StoreTx};
