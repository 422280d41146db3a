//! The legal-transition table and role capabilities. This is the single
//! source of truth for lifecycle legality; everything else (validator,
//! aggregate, bulk executor) defers to it. The table is compile-time
//! immutable and shared process-wide without locking.

use crate::models::actor::ActorRole;
use crate::models::order::OrderStatus;

/// Legal successor states, as an adjacency list. Terminal states have none.
pub fn successors(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;

    match from {
        Created => &[Pending, Assigned, Cancelled, Returned],
        Pending => &[Assigned, Cancelled, Returned],
        Assigned => &[PickedUp, Cancelled, Returned],
        PickedUp => &[InTransit, Cancelled, Returned],
        InTransit => &[OutForDelivery, Cancelled, Returned],
        OutForDelivery => &[Delivered, Cancelled, Returned],
        Delivered | Cancelled | Returned => &[],
    }
}

pub fn is_legal(from: OrderStatus, to: OrderStatus) -> bool {
    successors(from).contains(&to)
}

/// Role capability for a transition, independent of ownership. Courier
/// ownership (the actor must be the assigned courier) is checked by the
/// validator on top of this.
pub fn can_transition(role: ActorRole, from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    match role {
        ActorRole::Admin | ActorRole::SuperAdmin => true,
        ActorRole::Courier => matches!(to, PickedUp | InTransit | OutForDelivery | Delivered),
        ActorRole::Merchant => to == Cancelled && matches!(from, Created | Pending),
    }
}
