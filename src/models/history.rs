use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::actor::ActorRole;
use crate::models::order::OrderStatus;
use crate::models::proof::{GeoPoint, ProofOfDelivery};

/// Append-only audit record of one committed order mutation. Written only by
/// the history recorder, never updated or deleted. Stored separately from the
/// order so the trail survives archival of the order record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderHistoryEvent {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status_from: OrderStatus,
    pub status_to: OrderStatus,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub actor_role: ActorRole,
    pub recorded_at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub notes: Option<String>,
    pub proof: Option<ProofOfDelivery>,
}
