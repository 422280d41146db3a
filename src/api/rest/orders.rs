use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::identity::Identity;
use crate::engine::assignment;
use crate::engine::bulk::BulkOperationResult;
use crate::error::AppError;
use crate::evidence::{self, EvidencePayload};
use crate::lifecycle::aggregate::{self, NewOrder, TransitionRequest};
use crate::models::history::OrderHistoryEvent;
use crate::models::order::{Financials, Order, OrderStatus, Package, Recipient};
use crate::models::proof::{GeoPoint, ProofOfDelivery};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/history", get(get_history))
        .route("/orders/:id/transition", post(transition_order))
        .route("/orders/:id/evidence", post(capture_evidence))
        .route("/orders/assign", post(assign_orders))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub recipient: Recipient,
    pub package: Package,
    pub financials: Financials,
}

#[derive(Deserialize)]
pub struct TransitionBody {
    pub to: OrderStatus,
    pub evidence: Option<ProofOfDelivery>,
    pub location: Option<GeoPoint>,
    pub notes: Option<String>,
    pub courier_id: Option<Uuid>,
    pub expected_version: Option<u64>,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub order_ids: Vec<Uuid>,
    pub courier_id: Uuid,
    pub reason: Option<String>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = aggregate::create(
        &state,
        &actor,
        NewOrder {
            recipient: payload.recipient,
            package: payload.package,
            financials: payload.financials,
        },
    )?;

    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    if !actor.can_access_tenant(order.tenant_id) {
        return Err(AppError::NotFound(format!("order {id} not found")));
    }

    Ok(Json(order.value().clone()))
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<OrderHistoryEvent>>, AppError> {
    let tenant_id = state
        .orders
        .get(&id)
        .map(|order| order.tenant_id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    if !actor.can_access_tenant(tenant_id) {
        return Err(AppError::NotFound(format!("order {id} not found")));
    }

    let mut events = state.history.events_for(id);
    events.reverse();
    Ok(Json(events))
}

async fn transition_order(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionBody>,
) -> Result<Json<Order>, AppError> {
    let order = aggregate::apply(
        &state,
        id,
        TransitionRequest {
            to: payload.to,
            actor,
            evidence: payload.evidence,
            courier_id: payload.courier_id,
            location: payload.location,
            notes: payload.notes,
            expected_version: payload.expected_version,
        },
    )?;

    Ok(Json(order))
}

async fn capture_evidence(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<EvidencePayload>,
) -> Result<Json<ProofOfDelivery>, AppError> {
    let proof = evidence::capture(&state, &actor, id, payload)?;
    Ok(Json(proof))
}

async fn assign_orders(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<BulkOperationResult>, AppError> {
    let result = assignment::assign(
        state,
        payload.order_ids,
        payload.courier_id,
        actor,
        payload.reason,
    )
    .await?;

    Ok(Json(result))
}
