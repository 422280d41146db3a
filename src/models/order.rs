use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::proof::ProofOfDelivery;

/// Shipment lifecycle. `Delivered`, `Cancelled` and `Returned` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Created,
    Pending,
    Assigned,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Returned
        )
    }

    /// Customer-facing label used on the public tracking page.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::Pending => "Pending",
            OrderStatus::Assigned => "Assigned to courier",
            OrderStatus::PickedUp => "Picked up",
            OrderStatus::InTransit => "In transit",
            OrderStatus::OutForDelivery => "Out for delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Returned => "Returned",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zone: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub description: String,
    pub weight_kg: f64,
    pub dimensions: Option<Dimensions>,
}

/// Monetary fields are supplied by the pricing service at creation time and
/// stored verbatim; the core never recomputes them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Financials {
    pub declared_value: f64,
    pub shipping_cost: f64,
    pub cod_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Tenant-unique, customer-facing identifier. Immutable after creation.
    pub tracking_number: String,
    pub tenant_id: Uuid,
    pub recipient: Recipient,
    pub package: Package,
    pub financials: Financials,
    pub status: OrderStatus,
    pub courier_id: Option<Uuid>,
    /// Bumped on every committed mutation; optimistic-concurrency token.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, on the transition into `Delivered`.
    pub delivered_at: Option<DateTime<Utc>>,
    pub proof_of_delivery: Option<ProofOfDelivery>,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus;

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Returned.is_terminal());
        assert!(!OrderStatus::OutForDelivery.is_terminal());
        assert!(!OrderStatus::Created.is_terminal());
    }
}
