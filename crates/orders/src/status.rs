use core::str::FromStr;
use serde::{Deserialize, Serialize};

use salesdesk_core::{DomainError, DomainResult};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Draft,
    Confirmed,
    Completed,
}

/// The full set of legal transitions. Monotonic: no reverse edges, no
/// skipping, no self-loops. Adding a state means adding rows here, nothing
/// else.
const ALLOWED_TRANSITIONS: &[(OrderStatus, OrderStatus)] = &[
    (OrderStatus::Draft, OrderStatus::Confirmed),
    (OrderStatus::Confirmed, OrderStatus::Completed),
];

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        ALLOWED_TRANSITIONS.contains(&(self, target))
    }

    /// Validate a requested transition, or explain why it is illegal.
    pub fn ensure_transition_to(self, target: OrderStatus) -> DomainResult<()> {
        if self.can_transition_to(target) {
            return Ok(());
        }
        Err(DomainError::invalid_state(format!(
            "invalid status transition {} -> {}; allowed: draft -> confirmed -> completed",
            self.as_str(),
            target.as_str()
        )))
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(OrderStatus::Draft),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'; expected draft, confirmed or completed"
            ))),
        }
    }
}
