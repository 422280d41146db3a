//! Bulk operation executor: applies one operation to many order ids with
//! per-item isolation. There is deliberately no batch transaction; one
//! item's failure never blocks the others, and results come back in input
//! order so callers can correlate rows without a lookup.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::engine::assignment;
use crate::error::AppError;
use crate::lifecycle::aggregate::{self, TransitionRequest};
use crate::models::actor::Actor;
use crate::models::order::OrderStatus;
use crate::models::proof::GeoPoint;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BulkOperation {
    StatusChange {
        to: OrderStatus,
        location: Option<GeoPoint>,
        notes: Option<String>,
    },
    Assign {
        courier_id: Uuid,
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Succeeded { status: OrderStatus },
    Failed { code: &'static str, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkItemResult {
    pub order_id: Uuid,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Per-item outcomes plus aggregate counts. Never a single pass/fail flag
/// for the whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOperationResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub warnings: Vec<String>,
    pub items: Vec<BulkItemResult>,
}

impl BulkOperationResult {
    fn from_items(items: Vec<BulkItemResult>) -> Self {
        let succeeded = items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Succeeded { .. }))
            .count();
        Self {
            total: items.len(),
            succeeded,
            failed: items.len() - succeeded,
            warnings: Vec::new(),
            items,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

pub fn check_batch(state: &AppState, order_ids: &[Uuid]) -> Result<(), AppError> {
    if order_ids.is_empty() {
        return Err(AppError::Validation(
            "order_ids must not be empty".to_string(),
        ));
    }
    if order_ids.len() > state.bulk_max_items {
        return Err(AppError::Validation(format!(
            "batch of {} exceeds the limit of {} items",
            order_ids.len(),
            state.bulk_max_items
        )));
    }
    Ok(())
}

/// Runs one operation per order id. Items execute in parallel (distinct
/// orders are independent; commits to the same order serialize on the store
/// entry lock) and are reported in input order.
pub async fn execute(
    state: Arc<AppState>,
    order_ids: Vec<Uuid>,
    operation: BulkOperation,
    actor: Actor,
) -> Result<BulkOperationResult, AppError> {
    check_batch(&state, &order_ids)?;

    let mut handles = Vec::with_capacity(order_ids.len());
    for order_id in order_ids {
        let state = state.clone();
        let operation = operation.clone();
        let actor = actor.clone();

        handles.push(tokio::spawn(async move {
            let result = apply_one(&state, order_id, operation, actor);
            to_item(&state, order_id, result)
        }));
    }

    let mut items = Vec::with_capacity(handles.len());
    for joined in join_all(handles).await {
        match joined {
            Ok(item) => items.push(item),
            Err(err) => {
                error!(error = %err, "bulk item task panicked");
                return Err(AppError::Internal(format!("bulk item task failed: {err}")));
            }
        }
    }

    Ok(BulkOperationResult::from_items(items))
}

fn apply_one(
    state: &AppState,
    order_id: Uuid,
    operation: BulkOperation,
    actor: Actor,
) -> Result<OrderStatus, AppError> {
    match operation {
        BulkOperation::StatusChange { to, location, notes } => {
            let order = aggregate::apply(
                state,
                order_id,
                TransitionRequest {
                    to,
                    actor,
                    evidence: None,
                    courier_id: None,
                    location,
                    notes,
                    expected_version: None,
                },
            )?;
            Ok(order.status)
        }
        BulkOperation::Assign { courier_id, reason } => {
            let order = assignment::assign_one(state, order_id, courier_id, &actor, reason)?;
            Ok(order.status)
        }
    }
}

fn to_item(
    state: &AppState,
    order_id: Uuid,
    result: Result<OrderStatus, AppError>,
) -> BulkItemResult {
    let outcome = match result {
        Ok(status) => {
            state
                .metrics
                .bulk_items_total
                .with_label_values(&["succeeded"])
                .inc();
            ItemOutcome::Succeeded { status }
        }
        Err(err) => {
            state
                .metrics
                .bulk_items_total
                .with_label_values(&[err.code()])
                .inc();
            ItemOutcome::Failed {
                code: err.code(),
                message: err.to_string(),
            }
        }
    };

    BulkItemResult { order_id, outcome }
}
