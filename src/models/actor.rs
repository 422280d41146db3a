use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of the authenticated principal behind a request. Supplied by the
/// upstream identity provider and trusted as-is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActorRole {
    Merchant,
    Courier,
    Admin,
    SuperAdmin,
}

impl ActorRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, ActorRole::Admin | ActorRole::SuperAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Merchant => "merchant",
            ActorRole::Courier => "courier",
            ActorRole::Admin => "admin",
            ActorRole::SuperAdmin => "super_admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub role: ActorRole,
    pub tenant_id: Uuid,
}

impl Actor {
    /// Whether this actor may touch records of `tenant_id`. Super admins
    /// operate across tenants.
    pub fn can_access_tenant(&self, tenant_id: Uuid) -> bool {
        self.role == ActorRole::SuperAdmin || self.tenant_id == tenant_id
    }
}
