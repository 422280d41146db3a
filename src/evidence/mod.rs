//! Proof-of-delivery capture. Capturing evidence validates and parks the
//! payload; it never mutates order state. Only the subsequent validated
//! `Delivered` transition consumes it, so a client can upload evidence and
//! retry the transition independently. Abandoned payloads have no effect.

use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::actor::{Actor, ActorRole};
use crate::models::proof::{GeoPoint, ProofOfDelivery};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct EvidencePayload {
    pub photo_refs: Vec<String>,
    pub coordinates: GeoPoint,
    pub signature_ref: Option<String>,
    pub notes: Option<String>,
}

pub fn capture(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    payload: EvidencePayload,
) -> Result<ProofOfDelivery, AppError> {
    let order = state
        .orders
        .get(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if !actor.can_access_tenant(order.tenant_id) {
        return Err(AppError::Forbidden(format!(
            "order {order_id} belongs to another tenant"
        )));
    }

    if actor.role == ActorRole::Courier && order.courier_id != Some(actor.id) {
        return Err(AppError::Forbidden(format!(
            "courier {} is not assigned to order {order_id}",
            actor.id
        )));
    }
    drop(order);

    let mut builder = ProofOfDelivery::builder()
        .photos(payload.photo_refs)
        .coordinates(payload.coordinates);
    if let Some(signature) = payload.signature_ref {
        builder = builder.signature(signature);
    }
    if let Some(notes) = payload.notes {
        builder = builder.notes(notes);
    }
    let proof = builder.build()?;

    state.pending_evidence.insert(order_id, proof.clone());
    Ok(proof)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{capture, EvidencePayload};
    use crate::error::AppError;
    use crate::lifecycle::aggregate::{self, NewOrder};
    use crate::models::actor::{Actor, ActorRole};
    use crate::models::order::{Financials, OrderStatus, Package, Recipient};
    use crate::models::proof::GeoPoint;
    use crate::state::AppState;

    fn merchant() -> Actor {
        Actor {
            id: Uuid::from_u128(101),
            name: "Layla".to_string(),
            role: ActorRole::Merchant,
            tenant_id: Uuid::from_u128(7),
        }
    }

    fn payload() -> EvidencePayload {
        EvidencePayload {
            photo_refs: vec!["s3://pod/door.jpg".to_string()],
            coordinates: GeoPoint { lat: 30.04, lng: 31.23 },
            signature_ref: None,
            notes: None,
        }
    }

    fn create_order(state: &AppState) -> Uuid {
        aggregate::create(
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
        .unwrap()
        .id
    }

    #[test]
    fn capture_parks_evidence_without_touching_the_order() {
        let state = AppState::new(16, 100);
        let order_id = create_order(&state);

        capture(&state, &merchant(), order_id, payload()).unwrap();

        assert!(state.pending_evidence.get(&order_id).is_some());
        assert_eq!(
            state.orders.get(&order_id).unwrap().status,
            OrderStatus::Created
        );
        assert!(state.history.events_for(order_id).is_empty());
    }

    #[test]
    fn capture_rejects_missing_photos() {
        let state = AppState::new(16, 100);
        let order_id = create_order(&state);

        let mut empty = payload();
        empty.photo_refs.clear();

        let result = capture(&state, &merchant(), order_id, empty);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(state.pending_evidence.get(&order_id).is_none());
    }

    #[test]
    fn capture_rejects_unassigned_courier() {
        let state = AppState::new(16, 100);
        let order_id = create_order(&state);

        let stranger = Actor {
            id: Uuid::new_v4(),
            name: "Karim".to_string(),
            role: ActorRole::Courier,
            tenant_id: Uuid::from_u128(7),
        };
        let result = capture(&state, &stranger, order_id, payload());
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn capture_unknown_order_is_not_found() {
        let state = AppState::new(16, 100);
        let result = capture(&state, &merchant(), Uuid::new_v4(), payload());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
