use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::api::identity::Identity;
use crate::error::AppError;
use crate::models::actor::ActorRole;
use crate::state::AppState;
use crate::tracking::{self, OrderView, PublicOrderView};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tracking/:number", get(public_tracking))
        .route("/orders/by-tracking/:number", get(tenant_tracking))
}

/// Anonymous, customer-facing lookup. No identity headers, redacted view.
async fn public_tracking(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
) -> Result<Json<PublicOrderView>, AppError> {
    let view = tracking::public_view(&state, &number)?;
    Ok(Json(view))
}

async fn tenant_tracking(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
    Path(number): Path<String>,
) -> Result<Json<OrderView>, AppError> {
    let view = tracking::tenant_view(
        &state,
        actor.tenant_id,
        actor.role == ActorRole::SuperAdmin,
        &number,
    )?;
    Ok(Json(view))
}
