//! The order aggregate: sole writer-of-record for orders. Every mutation
//! goes through `apply`, which validates, appends the audit event, and only
//! then touches the order, all while holding the store entry lock. A failed
//! audit append therefore leaves the order exactly as it was.

use std::time::Instant;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::lifecycle::validator;
use crate::models::actor::{Actor, ActorRole};
use crate::models::history::OrderHistoryEvent;
use crate::models::order::{Financials, Order, OrderStatus, Package, Recipient};
use crate::models::proof::{GeoPoint, ProofOfDelivery};
use crate::state::{AppState, TransitionNotice};

const TRACKING_PREFIX: &str = "PF";

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub recipient: Recipient,
    pub package: Package,
    pub financials: Financials,
}

#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub to: OrderStatus,
    pub actor: Actor,
    pub evidence: Option<ProofOfDelivery>,
    pub courier_id: Option<Uuid>,
    pub location: Option<GeoPoint>,
    pub notes: Option<String>,
    pub expected_version: Option<u64>,
}

enum Applied {
    Committed(Order),
    NoOp(Order),
}

/// Creates an order in `Created` for the actor's tenant. Creation is not a
/// transition, so the history trail starts empty.
pub fn create(state: &AppState, actor: &Actor, input: NewOrder) -> Result<Order, AppError> {
    if actor.role == ActorRole::Courier {
        return Err(AppError::Forbidden(
            "couriers cannot create orders".to_string(),
        ));
    }

    validate_new_order(&input)?;

    let id = Uuid::new_v4();
    let tracking_number = claim_tracking_number(state, id);
    let now = Utc::now();

    let order = Order {
        id,
        tracking_number,
        tenant_id: actor.tenant_id,
        recipient: input.recipient,
        package: input.package,
        financials: input.financials,
        status: OrderStatus::Created,
        courier_id: None,
        version: 0,
        created_at: now,
        updated_at: now,
        delivered_at: None,
        proof_of_delivery: None,
    };

    state.orders.insert(id, order.clone());
    info!(
        order_id = %id,
        tracking_number = %order.tracking_number,
        tenant_id = %order.tenant_id,
        "order created"
    );

    Ok(order)
}

/// Applies one validated transition and returns the updated order. A
/// same-status retry returns the current order unchanged.
pub fn apply(
    state: &AppState,
    order_id: Uuid,
    request: TransitionRequest,
) -> Result<Order, AppError> {
    let start = Instant::now();
    let result = apply_locked(state, order_id, &request);

    let elapsed = start.elapsed().as_secs_f64();
    match &result {
        Ok(Applied::Committed(order)) => {
            state
                .metrics
                .transitions_total
                .with_label_values(&["success"])
                .inc();
            state
                .metrics
                .transition_latency_seconds
                .with_label_values(&["success"])
                .observe(elapsed);

            // Fire-and-forget fact for the notification dispatcher; emitted
            // only after the commit, with the entry lock already released.
            let _ = state.transition_events_tx.send(TransitionNotice {
                order_id: order.id,
                tracking_number: order.tracking_number.clone(),
                status: order.status,
                occurred_at: order.updated_at,
            });

            info!(
                order_id = %order.id,
                status = ?order.status,
                actor_role = request.actor.role.as_str(),
                "order transitioned"
            );
        }
        Ok(Applied::NoOp(_)) => {
            state
                .metrics
                .transitions_total
                .with_label_values(&["noop"])
                .inc();
        }
        Err(err) => {
            state
                .metrics
                .transitions_total
                .with_label_values(&[err.code()])
                .inc();
            state
                .metrics
                .transition_latency_seconds
                .with_label_values(&["error"])
                .observe(elapsed);
        }
    }

    result.map(|applied| match applied {
        Applied::Committed(order) | Applied::NoOp(order) => order,
    })
}

fn apply_locked(
    state: &AppState,
    order_id: Uuid,
    request: &TransitionRequest,
) -> Result<Applied, AppError> {
    let mut entry = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
    let order = entry.value_mut();

    if !request.actor.can_access_tenant(order.tenant_id) {
        return Err(AppError::Forbidden(format!(
            "order {order_id} belongs to another tenant"
        )));
    }

    if let Some(expected) = request.expected_version {
        if expected != order.version {
            return Err(AppError::ConcurrentModification(format!(
                "order {order_id} is at version {}, request expected {expected}",
                order.version
            )));
        }
    }

    // A same-status request with a different courier is a reassignment and
    // must still produce an audit event; without one it is a retried request
    // and a no-op.
    if request.to == order.status {
        if let Some(new_courier) = request.courier_id {
            if Some(new_courier) != order.courier_id && reassignable(order.status) {
                return reassign(state, order, new_courier, request);
            }
        }
        return Ok(Applied::NoOp(order.clone()));
    }

    let evidence = if request.to == OrderStatus::Delivered {
        request
            .evidence
            .clone()
            .or_else(|| {
                state
                    .pending_evidence
                    .get(&order_id)
                    .map(|parked| parked.value().clone())
            })
    } else {
        None
    };

    validator::validate(order, request.to, &request.actor, evidence.as_ref())?;

    let courier_id = match request.to {
        OrderStatus::Assigned => {
            let courier_id = request.courier_id.or(order.courier_id).ok_or_else(|| {
                AppError::Validation("courier_id is required to assign an order".to_string())
            })?;
            if !state.couriers.contains_key(&courier_id) {
                return Err(AppError::Validation(format!(
                    "courier {courier_id} is not registered"
                )));
            }
            Some(courier_id)
        }
        // Cancelled and Returned retain the prior courier for audit.
        _ => order.courier_id,
    };

    let now = Utc::now();
    let event = OrderHistoryEvent {
        id: Uuid::new_v4(),
        order_id,
        status_from: order.status,
        status_to: request.to,
        actor_id: request.actor.id,
        actor_name: request.actor.name.clone(),
        actor_role: request.actor.role,
        recorded_at: now,
        location: request.location,
        notes: request.notes.clone(),
        proof: evidence.clone(),
    };

    // The append precedes the mutation: if the history store is down the
    // order is left untouched and the caller sees an infrastructure error.
    state
        .history
        .append(event)
        .map_err(|err| AppError::Internal(err.to_string()))?;
    state.metrics.history_events_total.inc();

    order.status = request.to;
    order.courier_id = courier_id;
    order.version += 1;
    order.updated_at = now;

    if request.to == OrderStatus::Delivered {
        if order.delivered_at.is_none() {
            order.delivered_at = Some(now);
        }
        order.proof_of_delivery = evidence;
        state.pending_evidence.remove(&order_id);
    }

    Ok(Applied::Committed(order.clone()))
}

fn reassignable(status: OrderStatus) -> bool {
    matches!(
        status,
        OrderStatus::Assigned
            | OrderStatus::PickedUp
            | OrderStatus::InTransit
            | OrderStatus::OutForDelivery
    )
}

/// Moves an order to a different courier without changing its status.
/// Reassigning an order that is already moving is an emergency override and
/// requires an explicit reason.
fn reassign(
    state: &AppState,
    order: &mut Order,
    new_courier: Uuid,
    request: &TransitionRequest,
) -> Result<Applied, AppError> {
    if !request.actor.role.is_admin() {
        return Err(AppError::Forbidden(
            "only admins may reassign an order".to_string(),
        ));
    }

    let in_flight = matches!(
        order.status,
        OrderStatus::PickedUp | OrderStatus::InTransit | OrderStatus::OutForDelivery
    );
    if in_flight
        && request
            .notes
            .as_deref()
            .map_or(true, |notes| notes.trim().is_empty())
    {
        return Err(AppError::Validation(
            "reassigning an in-flight order requires a reason".to_string(),
        ));
    }

    if !state.couriers.contains_key(&new_courier) {
        return Err(AppError::Validation(format!(
            "courier {new_courier} is not registered"
        )));
    }

    let now = Utc::now();
    let previous = order.courier_id;
    let notes = request.notes.clone().or_else(|| {
        previous.map(|prev| format!("reassigned from courier {prev} to {new_courier}"))
    });

    let event = OrderHistoryEvent {
        id: Uuid::new_v4(),
        order_id: order.id,
        status_from: order.status,
        status_to: order.status,
        actor_id: request.actor.id,
        actor_name: request.actor.name.clone(),
        actor_role: request.actor.role,
        recorded_at: now,
        location: request.location,
        notes,
        proof: None,
    };

    state
        .history
        .append(event)
        .map_err(|err| AppError::Internal(err.to_string()))?;
    state.metrics.history_events_total.inc();

    order.courier_id = Some(new_courier);
    order.version += 1;
    order.updated_at = now;

    warn!(
        order_id = %order.id,
        previous_courier = ?previous,
        new_courier = %new_courier,
        status = ?order.status,
        "order reassigned"
    );

    Ok(Applied::Committed(order.clone()))
}

fn validate_new_order(input: &NewOrder) -> Result<(), AppError> {
    let recipient = &input.recipient;
    let required = [
        ("recipient name", &recipient.name),
        ("recipient phone", &recipient.phone),
        ("recipient address", &recipient.address),
        ("recipient city", &recipient.city),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} cannot be empty")));
        }
    }

    if input.package.weight_kg <= 0.0 {
        return Err(AppError::Validation(
            "package weight must be positive".to_string(),
        ));
    }

    let financials = &input.financials;
    if financials.cod_amount < 0.0 {
        return Err(AppError::Validation(
            "cod amount cannot be negative".to_string(),
        ));
    }
    if financials.declared_value < 0.0 {
        return Err(AppError::Validation(
            "declared value cannot be negative".to_string(),
        ));
    }
    if financials.shipping_cost < 0.0 {
        return Err(AppError::Validation(
            "shipping cost cannot be negative".to_string(),
        ));
    }

    Ok(())
}

fn claim_tracking_number(state: &AppState, order_id: Uuid) -> String {
    loop {
        let raw = Uuid::new_v4().simple().to_string();
        let candidate = format!("{TRACKING_PREFIX}-{}", raw[..12].to_uppercase());

        match state.tracking_index.entry(candidate.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(order_id);
                return candidate;
            }
            Entry::Occupied(_) => continue,
        }
    }
}
