use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::FamilyRoleKind;

use crate::storage::Document;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRole {
    pub family_id: String,
    pub role: FamilyRoleKind,
    pub family_name: String,
}

impl FamilyRole {
    pub fn parent(family_id: &str, family_name: &str) -> Self {
        Self {
            family_id: family_id.to_string(),
            role: FamilyRoleKind::Parent,
            family_name: family_name.to_string(),
        }
    }

    pub fn kid(family_id: &str, family_name: &str) -> Self {
        Self {
            family_id: family_id.to_string(),
            role: FamilyRoleKind::Kid,
            family_name: family_name.to_string(),
        }
    }

    /// Same family and role; the cached family name is ignored
    pub fn same_membership(&self, other: &FamilyRole) -> bool {
        self.family_id == other.family_id && self.role == other.role
    }
}

/// Profile of a signed-in account, keyed by the identity provider's uid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub is_system_admin: bool,
    #[serde(default)]
    pub family_roles: Vec<FamilyRole>,
    pub active_family_role: Option<FamilyRole>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn has_role(&self, family_id: &str, role: FamilyRoleKind) -> bool {
        self.family_roles
            .iter()
            .any(|r| r.family_id == family_id && r.role == role)
    }

    /// Add a membership unless it is already present
    pub fn add_role(&mut self, role: FamilyRole) -> bool {
        if self.family_roles.iter().any(|r| r.same_membership(&role)) {
            return false;
        }
        self.family_roles.push(role);
        true
    }

    /// Name to show for this user, falling back to the email's local part
    pub fn label(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("User")
            .to_string()
    }
}

impl Document for UserProfile {
    fn id(&self) -> &str {
        &self.uid
    }
}
