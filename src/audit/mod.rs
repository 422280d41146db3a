use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::history::OrderHistoryEvent;
use crate::models::order::OrderStatus;

/// Infrastructure failure of the history store. Surfaced to callers as an
/// internal error; the order aggregate aborts the commit when it sees one.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("history store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only sink for order history. There is deliberately no update or
/// delete in this contract. Storage order is insertion order (ascending);
/// readers that want newest-first reverse at read time.
pub trait HistoryRecorder: Send + Sync {
    fn append(&self, event: OrderHistoryEvent) -> Result<(), AuditError>;

    /// Events for one order in insertion order.
    fn events_for(&self, order_id: Uuid) -> Vec<OrderHistoryEvent>;

    fn total_events(&self) -> usize;
}

#[derive(Default)]
pub struct InMemoryHistory {
    events: DashMap<Uuid, Vec<OrderHistoryEvent>>,
}

impl HistoryRecorder for InMemoryHistory {
    fn append(&self, event: OrderHistoryEvent) -> Result<(), AuditError> {
        self.events.entry(event.order_id).or_default().push(event);
        Ok(())
    }

    fn events_for(&self, order_id: Uuid) -> Vec<OrderHistoryEvent> {
        self.events
            .get(&order_id)
            .map(|events| events.value().clone())
            .unwrap_or_default()
    }

    fn total_events(&self) -> usize {
        self.events.iter().map(|entry| entry.value().len()).sum()
    }
}

/// Replays a trail against a starting status and returns the resulting
/// status, or `None` if the chain is broken (an event's `status_from` does
/// not match the status reached so far).
pub fn replay_status(initial: OrderStatus, events: &[OrderHistoryEvent]) -> Option<OrderStatus> {
    let mut current = initial;
    for event in events {
        if event.status_from != current {
            return None;
        }
        current = event.status_to;
    }
    Some(current)
}
