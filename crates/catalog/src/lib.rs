//! `salesdesk-catalog` — product (service) entity and pricing rules.

pub mod product;

pub use product::{ensure_price, NewProduct, Product, ProductPatch};
