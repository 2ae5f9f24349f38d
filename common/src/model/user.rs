use serde::{Deserialize, Serialize};

/// Capabilities a requester may hold. Lookups are gated per registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// `users.can_request_pix`: Pix lookups by document or by key.
    RequestPix,
    /// `users.can_request_ccs`: CCS lookups by document.
    RequestCcs,
}

/// The authenticated staff member on whose behalf a request is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl UserRef {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}
