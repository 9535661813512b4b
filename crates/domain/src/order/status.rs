//! Order status and the log of status transitions.

use serde::{Deserialize, Serialize};

/// The status of an order.
///
/// Any status can be set from any other one; the aggregate only records
/// the transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Awaiting payment.
    #[default]
    Pending,

    /// Awaiting manual confirmation (e.g. bank transfer).
    OnHold,

    /// Paid, being fulfilled.
    Processing,

    /// Fulfilled.
    Completed,

    /// Cancelled by the customer or an administrator.
    Cancelled,

    /// Payment returned to the customer.
    Refunded,
}

impl OrderStatus {
    /// Every status, in display order.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::OnHold,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    /// Returns the persisted name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::OnHold => "on-hold",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub message: String,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_display_matches_persisted_name() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
        assert_eq!(OrderStatus::OnHold.to_string(), "on-hold");
    }

    #[test]
    fn test_status_change_serialization() {
        let change = StatusChange {
            message: "Payment received".to_string(),
            old_status: OrderStatus::Pending,
            new_status: OrderStatus::Processing,
        };
        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(value["old_status"], "pending");
        assert_eq!(value["new_status"], "processing");
    }
}
