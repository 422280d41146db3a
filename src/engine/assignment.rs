//! Courier assignment. Single-order and multi-order assignment share this
//! one path: a single order is a batch of size one, executed through the
//! bulk executor so per-item isolation and result shapes stay identical.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::engine::bulk::{self, BulkOperation, BulkOperationResult};
use crate::error::AppError;
use crate::lifecycle::aggregate::{self, TransitionRequest};
use crate::models::actor::Actor;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

/// Binds one order to a courier through the aggregate, which writes the
/// history event itself; no duplicate audit entry is produced here. An order
/// that is already moving keeps its current status and goes through the
/// aggregate's reassignment path instead.
pub fn assign_one(
    state: &AppState,
    order_id: Uuid,
    courier_id: Uuid,
    actor: &Actor,
    reason: Option<String>,
) -> Result<Order, AppError> {
    let current = state
        .orders
        .get(&order_id)
        .map(|order| order.status)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    let to = if matches!(
        current,
        OrderStatus::PickedUp | OrderStatus::InTransit | OrderStatus::OutForDelivery
    ) {
        current
    } else {
        OrderStatus::Assigned
    };

    aggregate::apply(
        state,
        order_id,
        TransitionRequest {
            to,
            actor: actor.clone(),
            evidence: None,
            courier_id: Some(courier_id),
            location: None,
            notes: reason,
            expected_version: None,
        },
    )
}

/// Assigns a batch of orders to one courier. Courier-level preconditions are
/// checked once up front; per-order outcomes are isolated. Availability is
/// advisory: an unavailable courier is assignable but the result carries a
/// warning.
pub async fn assign(
    state: Arc<AppState>,
    order_ids: Vec<Uuid>,
    courier_id: Uuid,
    actor: Actor,
    reason: Option<String>,
) -> Result<BulkOperationResult, AppError> {
    if !actor.role.is_admin() {
        return Err(AppError::Forbidden(
            "only admins may assign couriers".to_string(),
        ));
    }

    bulk::check_batch(&state, &order_ids)?;

    let mut warnings = Vec::new();
    {
        let courier = state
            .couriers
            .get(&courier_id)
            .ok_or_else(|| AppError::NotFound(format!("courier {courier_id} not found")))?;

        if !actor.can_access_tenant(courier.tenant_id) {
            return Err(AppError::Forbidden(format!(
                "courier {courier_id} belongs to another tenant"
            )));
        }
        if !courier.active {
            return Err(AppError::Validation(format!(
                "courier {} is inactive",
                courier.name
            )));
        }
        if !courier.available {
            warn!(courier_id = %courier_id, "assigning an unavailable courier");
            warnings.push(format!(
                "courier {} is marked unavailable",
                courier.name
            ));
        }
    }

    let result = bulk::execute(
        state,
        order_ids,
        BulkOperation::Assign { courier_id, reason },
        actor,
    )
    .await?;

    Ok(result.with_warnings(warnings))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use super::assign;
    use crate::error::AppError;
    use crate::lifecycle::aggregate::{self, NewOrder};
    use crate::models::actor::{Actor, ActorRole};
    use crate::models::courier::Courier;
    use crate::models::order::{Financials, OrderStatus, Package, Recipient};
    use crate::state::AppState;

    const TENANT: u128 = 7;

    fn admin() -> Actor {
        Actor {
            id: Uuid::from_u128(100),
            name: "Omar".to_string(),
            role: ActorRole::Admin,
            tenant_id: Uuid::from_u128(TENANT),
        }
    }

    fn merchant() -> Actor {
        Actor {
            id: Uuid::from_u128(101),
            name: "Layla".to_string(),
            role: ActorRole::Merchant,
            tenant_id: Uuid::from_u128(TENANT),
        }
    }

    fn new_order() -> NewOrder {
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
        }
    }

    fn register_courier(state: &AppState, active: bool, available: bool) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        state.couriers.insert(
            id,
            Courier {
                id,
                tenant_id: Uuid::from_u128(TENANT),
                name: "Karim".to_string(),
                phone: "+20101111111".to_string(),
                active,
                available,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    #[tokio::test]
    async fn bulk_assign_with_one_unknown_id() {
        let state = Arc::new(AppState::new(16, 100));
        let courier_id = register_courier(&state, true, true);

        let a = aggregate::create(&state, &merchant(), new_order()).unwrap().id;
        let b = aggregate::create(&state, &merchant(), new_order()).unwrap().id;
        let ghost = Uuid::new_v4();

        let result = assign(state.clone(), vec![a, ghost, b], courier_id, admin(), None)
            .await
            .unwrap();

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.items[1].order_id, ghost);

        for id in [a, b] {
            let order = state.orders.get(&id).unwrap();
            assert_eq!(order.status, OrderStatus::Assigned);
            assert_eq!(order.courier_id, Some(courier_id));
        }
    }

    #[tokio::test]
    async fn unknown_courier_fails_the_whole_call() {
        let state = Arc::new(AppState::new(16, 100));
        let id = aggregate::create(&state, &merchant(), new_order()).unwrap().id;

        let result = assign(state, vec![id], Uuid::new_v4(), admin(), None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn inactive_courier_is_rejected() {
        let state = Arc::new(AppState::new(16, 100));
        let courier_id = register_courier(&state, false, true);
        let id = aggregate::create(&state, &merchant(), new_order()).unwrap().id;

        let result = assign(state, vec![id], courier_id, admin(), None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn unavailable_courier_is_assigned_with_a_warning() {
        let state = Arc::new(AppState::new(16, 100));
        let courier_id = register_courier(&state, true, false);
        let id = aggregate::create(&state, &merchant(), new_order()).unwrap().id;

        let result = assign(state.clone(), vec![id], courier_id, admin(), None)
            .await
            .unwrap();

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(
            state.orders.get(&id).unwrap().courier_id,
            Some(courier_id)
        );
    }

    #[tokio::test]
    async fn non_admins_may_not_assign() {
        let state = Arc::new(AppState::new(16, 100));
        let courier_id = register_courier(&state, true, true);
        let id = aggregate::create(&state, &merchant(), new_order()).unwrap().id;

        let result = assign(state, vec![id], courier_id, merchant(), None).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
