//! Pure transition validation: no I/O, no clock, no store access. The
//! aggregate consults this before committing anything, so a denial is
//! guaranteed side-effect-free.

use crate::error::AppError;
use crate::lifecycle::transitions;
use crate::models::actor::{Actor, ActorRole};
use crate::models::order::{Order, OrderStatus};
use crate::models::proof::ProofOfDelivery;

/// Outcome of a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Transition is legal and must be committed.
    Allow,
    /// Requested status equals the current status: a retried request. The
    /// caller reports success without committing or appending history.
    NoOp,
}

pub fn validate(
    order: &Order,
    to: OrderStatus,
    actor: &Actor,
    evidence: Option<&ProofOfDelivery>,
) -> Result<Validation, AppError> {
    // Retried requests are tolerated even in terminal states.
    if to == order.status {
        return Ok(Validation::NoOp);
    }

    if !transitions::is_legal(order.status, to) {
        return Err(AppError::IllegalTransition {
            from: order.status,
            to,
        });
    }

    if !transitions::can_transition(actor.role, order.status, to) {
        return Err(AppError::Forbidden(format!(
            "role {} may not move an order from {:?} to {:?}",
            actor.role.as_str(),
            order.status,
            to
        )));
    }

    // A courier may only advance orders assigned to them.
    if actor.role == ActorRole::Courier && order.courier_id != Some(actor.id) {
        return Err(AppError::Forbidden(format!(
            "courier {} is not assigned to order {}",
            actor.id, order.id
        )));
    }

    if to == OrderStatus::Delivered {
        check_evidence(evidence)?;
    }

    Ok(Validation::Allow)
}

fn check_evidence(evidence: Option<&ProofOfDelivery>) -> Result<(), AppError> {
    let proof = evidence.ok_or_else(|| {
        AppError::MissingProofOfDelivery("no proof of delivery supplied".to_string())
    })?;

    if proof.photo_refs.is_empty() {
        return Err(AppError::MissingProofOfDelivery(
            "at least one photo reference is required".to_string(),
        ));
    }

    if !proof.coordinates.is_plausible() {
        return Err(AppError::Validation(format!(
            "gps coordinates out of range: lat={}, lng={}",
            proof.coordinates.lat, proof.coordinates.lng
        )));
    }

    Ok(())
}
