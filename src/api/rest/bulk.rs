use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::identity::Identity;
use crate::engine::assignment;
use crate::engine::bulk::{self, BulkOperation, BulkOperationResult};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/bulk", post(execute_bulk))
}

#[derive(Deserialize)]
pub struct BulkRequest {
    pub order_ids: Vec<Uuid>,
    pub operation: BulkOperation,
}

/// Always answers 200 once the batch was processed; per-item outcomes live
/// in the body.
async fn execute_bulk(
    State(state): State<Arc<AppState>>,
    Identity(actor): Identity,
    Json(payload): Json<BulkRequest>,
) -> Result<Json<BulkOperationResult>, AppError> {
    let result = match payload.operation {
        BulkOperation::Assign { courier_id, reason } => {
            assignment::assign(state, payload.order_ids, courier_id, actor, reason).await?
        }
        operation => bulk::execute(state, payload.order_ids, operation, actor).await?,
    };

    Ok(Json(result))
}
