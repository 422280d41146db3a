//! Identity extraction. The platform sits behind a gateway that
//! authenticates every request and forwards the principal as headers; the
//! core trusts these as-is and never inspects credentials itself.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::actor::{Actor, ActorRole};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Extractor wrapping the authenticated principal of the request.
#[derive(Debug, Clone)]
pub struct Identity(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_uuid(parts, ACTOR_ID_HEADER)?;
        let tenant_id = header_uuid(parts, TENANT_ID_HEADER)?;
        let role = parse_role(&header_str(parts, ACTOR_ROLE_HEADER)?)?;
        let name = parts
            .headers
            .get(ACTOR_NAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Ok(Identity(Actor {
            id,
            name,
            role,
            tenant_id,
        }))
    }
}

fn header_str(parts: &Parts, name: &str) -> Result<String, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("missing {name} header")))
}

fn header_uuid(parts: &Parts, name: &str) -> Result<Uuid, AppError> {
    header_str(parts, name)?
        .parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("{name} header is not a valid uuid")))
}

fn parse_role(raw: &str) -> Result<ActorRole, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "merchant" => Ok(ActorRole::Merchant),
        "courier" => Ok(ActorRole::Courier),
        "admin" => Ok(ActorRole::Admin),
        "super_admin" | "superadmin" => Ok(ActorRole::SuperAdmin),
        other => Err(AppError::Validation(format!("unknown actor role: {other}"))),
    }
}
