//! `salesdesk-orders` — order (engagement) entities and the status state machine.

pub mod order;
pub mod status;

pub use order::{total_of, Order, OrderItem};
pub use status::OrderStatus;
