use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::identity::Identity;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::courier::Courier;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers", post(create_courier).get(list_couriers))
        .route("/couriers/:id/availability", patch(update_availability))
}

#[derive(Deserialize)]
pub struct CreateCourierRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub available: Option<bool>,
    pub active: Option<bool>,
}

fn require_admin(actor: &Actor) -> Result<(), AppError> {
    if !actor.role.is_admin() {
        return Err(AppError::Forbidden(
            "courier management requires an admin role".to_string(),
        ));
    }
    Ok(())
}

async fn create_courier(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
    Json(payload): Json<CreateCourierRequest>,
) -> Result<Json<Courier>, AppError> {
    require_admin(&actor)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if payload.phone.trim().is_empty() {
        return Err(AppError::Validation("phone cannot be empty".to_string()));
    }

    let now = Utc::now();
    let courier = Courier {
        id: Uuid::new_v4(),
        tenant_id: actor.tenant_id,
        name: payload.name,
        phone: payload.phone,
        active: true,
        available: true,
        created_at: now,
        updated_at: now,
    };

    state.couriers.insert(courier.id, courier.clone());
    Ok(Json(courier))
}

async fn list_couriers(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
) -> Result<Json<Vec<Courier>>, AppError> {
    require_admin(&actor)?;

    let couriers = state
        .couriers
        .iter()
        .filter(|entry| actor.can_access_tenant(entry.value().tenant_id))
        .map(|entry| entry.value().clone())
        .collect();
    Ok(Json(couriers))
}

async fn update_availability(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Courier>, AppError> {
    require_admin(&actor)?;

    let mut courier = state
        .couriers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("courier {id} not found")))?;

    if !actor.can_access_tenant(courier.tenant_id) {
        return Err(AppError::NotFound(format!("courier {id} not found")));
    }

    if let Some(available) = payload.available {
        courier.available = available;
    }
    if let Some(active) = payload.active {
        courier.active = active;
    }
    courier.updated_at = Utc::now();

    Ok(Json(courier.clone()))
}
