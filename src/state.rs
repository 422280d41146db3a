use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::audit::{HistoryRecorder, InMemoryHistory};
use crate::models::courier::Courier;
use crate::models::order::{Order, OrderStatus};
use crate::models::proof::ProofOfDelivery;
use crate::observability::metrics::Metrics;

/// Fire-and-forget fact published after every committed transition. Delivery
/// beyond the channel (push, email, SMS) belongs to the notification
/// dispatcher, not the core.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionNotice {
    pub order_id: Uuid,
    pub tracking_number: String,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

pub struct AppState {
    pub orders: DashMap<Uuid, Order>,
    /// tracking number -> order id. Numbers are generated globally unique,
    /// which trivially satisfies per-tenant uniqueness and lets the public
    /// tracking endpoint resolve without a tenant.
    pub tracking_index: DashMap<String, Uuid>,
    pub couriers: DashMap<Uuid, Courier>,
    /// Evidence captured ahead of the Delivered transition, keyed by order.
    /// Parking a payload here never mutates order state.
    pub pending_evidence: DashMap<Uuid, ProofOfDelivery>,
    pub history: Arc<dyn HistoryRecorder>,
    pub transition_events_tx: broadcast::Sender<TransitionNotice>,
    pub bulk_max_items: usize,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize, bulk_max_items: usize) -> Self {
        Self::with_recorder(
            Arc::new(InMemoryHistory::default()),
            event_buffer_size,
            bulk_max_items,
        )
    }

    /// Tests substitute a failing recorder here to exercise commit rollback.
    pub fn with_recorder(
        history: Arc<dyn HistoryRecorder>,
        event_buffer_size: usize,
        bulk_max_items: usize,
    ) -> Self {
        let (transition_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            orders: DashMap::new(),
            tracking_index: DashMap::new(),
            couriers: DashMap::new(),
            pending_evidence: DashMap::new(),
            history,
            transition_events_tx,
            bulk_max_items,
            metrics: Metrics::new(),
        }
    }
}
