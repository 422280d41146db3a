//! Read-only tracking projections. Never blocks writers; a reader may see
//! the pre- or post-commit state of an in-flight transition, but never a
//! partially applied one. History comes back newest-first for display;
//! storage stays in insertion order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::history::OrderHistoryEvent;
use crate::models::order::Order;
use crate::state::AppState;

/// Tenant-scoped projection: the full order plus its trail.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub history: Vec<OrderHistoryEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicHistoryEntry {
    pub status: &'static str,
    pub recorded_at: DateTime<Utc>,
}

/// Anonymous projection for the customer-facing tracking page. Redacts the
/// courier identity, all financial fields, and internal notes.
#[derive(Debug, Clone, Serialize)]
pub struct PublicOrderView {
    pub tracking_number: String,
    pub status: &'static str,
    pub recipient_city: String,
    pub recipient_zone: String,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub history: Vec<PublicHistoryEntry>,
}

fn lookup(state: &AppState, tracking_number: &str) -> Result<Order, AppError> {
    let order_id = state
        .tracking_index
        .get(tracking_number)
        .map(|entry| *entry)
        .ok_or_else(|| AppError::NotFound(format!("tracking number {tracking_number} not found")))?;

    state
        .orders
        .get(&order_id)
        .map(|order| order.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("tracking number {tracking_number} not found")))
}

fn history_desc(state: &AppState, order_id: Uuid) -> Vec<OrderHistoryEvent> {
    let mut events = state.history.events_for(order_id);
    events.reverse();
    events
}

/// Authenticated lookup. A miss and a cross-tenant hit are indistinguishable
/// to the caller.
pub fn tenant_view(
    state: &AppState,
    tenant_id: Uuid,
    is_super_admin: bool,
    tracking_number: &str,
) -> Result<OrderView, AppError> {
    let order = lookup(state, tracking_number)?;

    if !is_super_admin && order.tenant_id != tenant_id {
        return Err(AppError::NotFound(format!(
            "tracking number {tracking_number} not found"
        )));
    }

    let history = history_desc(state, order.id);
    Ok(OrderView { order, history })
}

/// Anonymous lookup for the public tracking page.
pub fn public_view(state: &AppState, tracking_number: &str) -> Result<PublicOrderView, AppError> {
    let order = lookup(state, tracking_number)?;
    let history = history_desc(state, order.id)
        .into_iter()
        .map(|event| PublicHistoryEntry {
            status: event.status_to.label(),
            recorded_at: event.recorded_at,
        })
        .collect();

    Ok(PublicOrderView {
        tracking_number: order.tracking_number,
        status: order.status.label(),
        recipient_city: order.recipient.city,
        recipient_zone: order.recipient.zone,
        created_at: order.created_at,
        delivered_at: order.delivered_at,
        history,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{public_view, tenant_view};
    use crate::error::AppError;
    use crate::lifecycle::aggregate::{self, NewOrder, TransitionRequest};
    use crate::models::actor::{Actor, ActorRole};
    use crate::models::order::{Financials, OrderStatus, Package, Recipient};
    use crate::state::AppState;

    const TENANT: u128 = 7;

    fn merchant() -> Actor {
        Actor {
            id: Uuid::from_u128(101),
            name: "Layla".to_string(),
            role: ActorRole::Merchant,
            tenant_id: Uuid::from_u128(TENANT),
        }
    }

    fn seed_order(state: &AppState) -> (Uuid, String) {
        let order = aggregate::create(
            state,
            &merchant(),
            NewOrder {
                recipient: Recipient {
                    name: "Nadia Hassan".to_string(),
                    phone: "+20100000000".to_string(),
                    address: "12 Nile St".to_string(),
                    city: "Cairo".to_string(),
                    zone: "Zamalek".to_string(),
                },
                package: Package {
                    description: "documents".to_string(),
                    weight_kg: 0.4,
                    dimensions: None,
                },
                financials: Financials {
                    declared_value: 100.0,
                    shipping_cost: 20.0,
                    cod_amount: 0.0,
                },
            },
        )
        .unwrap();
        (order.id, order.tracking_number)
    }

    fn transition(state: &AppState, order_id: Uuid, to: OrderStatus) {
        aggregate::apply(
            state,
            order_id,
            TransitionRequest {
                to,
                actor: Actor {
                    id: Uuid::from_u128(100),
                    name: "Omar".to_string(),
                    role: ActorRole::Admin,
                    tenant_id: Uuid::from_u128(TENANT),
                },
                evidence: None,
                courier_id: None,
                location: None,
                notes: Some("internal: fragile, call before arrival".to_string()),
                expected_version: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn tenant_view_includes_full_history_newest_first() {
        let state = AppState::new(16, 100);
        let (order_id, tracking) = seed_order(&state);
        transition(&state, order_id, OrderStatus::Pending);
        transition(&state, order_id, OrderStatus::Cancelled);

        let view = tenant_view(&state, Uuid::from_u128(TENANT), false, &tracking).unwrap();
        assert_eq!(view.history.len(), 2);
        assert_eq!(view.history[0].status_to, OrderStatus::Cancelled);
        assert_eq!(view.history[1].status_to, OrderStatus::Pending);
    }

    #[test]
    fn cross_tenant_lookup_reads_as_not_found() {
        let state = AppState::new(16, 100);
        let (_, tracking) = seed_order(&state);

        let result = tenant_view(&state, Uuid::from_u128(99), false, &tracking);
        assert!(matches!(result, Err(AppError::NotFound(_))));

        // Super admins see across tenants.
        assert!(tenant_view(&state, Uuid::from_u128(99), true, &tracking).is_ok());
    }

    #[test]
    fn public_view_redacts_internal_fields() {
        let state = AppState::new(16, 100);
        let (order_id, tracking) = seed_order(&state);
        transition(&state, order_id, OrderStatus::Pending);

        let view = public_view(&state, &tracking).unwrap();
        assert_eq!(view.status, "Pending");
        assert_eq!(view.recipient_city, "Cairo");
        assert_eq!(view.history.len(), 1);

        let json = serde_json::to_value(&view).unwrap();
        let raw = json.to_string();
        assert!(!raw.contains("courier"));
        assert!(!raw.contains("declared_value"));
        assert!(!raw.contains("notes"));
        assert!(!raw.contains("internal"));
    }

    #[test]
    fn unknown_tracking_number_is_not_found() {
        let state = AppState::new(16, 100);
        let result = public_view(&state, "PF-DOESNOTEXIST");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
