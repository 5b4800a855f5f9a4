//! Session roles, view selection and authorization checks.

use shared::{FamilyRoleKind, SessionView};

use super::error::{ChoreError, ChoreResult};
use super::models::{Kid, UserProfile};

/// The capacity a signed-in user is currently acting in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Parent { family_id: String },
    Kid { family_id: String, kid_id: String },
}

impl Role {
    /// Resolve the active role of a profile. `linked_kid_id` is the kid
    /// profile linked to the user in the active family, if any.
    pub fn from_profile(profile: &UserProfile, linked_kid_id: Option<&str>) -> Option<Role> {
        match &profile.active_family_role {
            None if profile.is_system_admin => Some(Role::Admin),
            None => None,
            Some(active) => match active.role {
                FamilyRoleKind::Parent => Some(Role::Parent {
                    family_id: active.family_id.clone(),
                }),
                FamilyRoleKind::Kid => linked_kid_id.map(|kid_id| Role::Kid {
                    family_id: active.family_id.clone(),
                    kid_id: kid_id.to_string(),
                }),
            },
        }
    }

    pub fn family_id(&self) -> Option<&str> {
        match self {
            Role::Admin => None,
            Role::Parent { family_id } | Role::Kid { family_id, .. } => Some(family_id),
        }
    }
}

/// Pick the screen for a session
pub fn select_view(profile: Option<&UserProfile>, linked_kid_id: Option<&str>) -> SessionView {
    let Some(profile) = profile else {
        return SessionView::SignedOut;
    };

    match Role::from_profile(profile, linked_kid_id) {
        Some(Role::Admin) => SessionView::AdminDashboard,
        Some(Role::Parent { family_id }) => SessionView::ParentDashboard { family_id },
        Some(Role::Kid { family_id, kid_id }) => SessionView::KidDashboard { family_id, kid_id },
        None => match &profile.active_family_role {
            Some(active) => SessionView::KidProfileMissing {
                family_id: active.family_id.clone(),
            },
            None => SessionView::NoFamily,
        },
    }
}

/// Identity behind a request, checked against family memberships
#[derive(Debug, Clone)]
pub struct Actor {
    profile: UserProfile,
}

impl Actor {
    pub fn new(profile: UserProfile) -> Self {
        Self { profile }
    }

    pub fn uid(&self) -> &str {
        &self.profile.uid
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn is_admin(&self) -> bool {
        self.profile.is_system_admin
    }

    pub fn require_admin(&self) -> ChoreResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ChoreError::Forbidden("administrator access required".to_string()))
        }
    }

    pub fn is_parent_of(&self, family_id: &str) -> bool {
        self.is_admin() || self.profile.has_role(family_id, FamilyRoleKind::Parent)
    }

    pub fn require_parent(&self, family_id: &str) -> ChoreResult<()> {
        if self.is_parent_of(family_id) {
            Ok(())
        } else {
            Err(ChoreError::Forbidden(format!(
                "parent access to family {} required",
                family_id
            )))
        }
    }

    /// Any member of the family (or an administrator)
    pub fn require_member(&self, family_id: &str) -> ChoreResult<()> {
        if self.is_admin() || self.profile.family_roles.iter().any(|r| r.family_id == family_id) {
            Ok(())
        } else {
            Err(ChoreError::Forbidden(format!("not a member of family {}", family_id)))
        }
    }

    /// The kid themself, a parent of the kid's family, or an administrator
    pub fn require_kid_access(&self, kid: &Kid) -> ChoreResult<()> {
        if self.is_parent_of(&kid.family_id) || kid.auth_uid.as_deref() == Some(self.uid()) {
            Ok(())
        } else {
            Err(ChoreError::Forbidden(format!("no access to kid {}", kid.id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::FamilyRole;
    use chrono::Utc;

    fn profile(admin: bool, roles: Vec<FamilyRole>, active: Option<FamilyRole>) -> UserProfile {
        UserProfile {
            uid: "u1".to_string(),
            email: Some("u1@example.com".to_string()),
            display_name: Some("Pat".to_string()),
            is_system_admin: admin,
            family_roles: roles,
            active_family_role: active,
            created_at: Utc::now(),
            last_login_at: Utc::now(),
        }
    }

    fn kid(family_id: &str, auth_uid: Option<&str>) -> Kid {
        Kid {
            id: "k1".to_string(),
            family_id: family_id.to_string(),
            name: "Sam".to_string(),
            email: None,
            auth_uid: auth_uid.map(str::to_string),
            points: 0,
            total_earned_points: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_select_view() {
        assert_eq!(select_view(None, None), SessionView::SignedOut);

        let admin = profile(true, vec![], None);
        assert_eq!(select_view(Some(&admin), None), SessionView::AdminDashboard);

        let nobody = profile(false, vec![], None);
        assert_eq!(select_view(Some(&nobody), None), SessionView::NoFamily);

        let parent_role = FamilyRole::parent("f1", "Smiths");
        let parent = profile(false, vec![parent_role.clone()], Some(parent_role));
        assert_eq!(
            select_view(Some(&parent), None),
            SessionView::ParentDashboard { family_id: "f1".to_string() }
        );

        let kid_role = FamilyRole::kid("f1", "Smiths");
        let kid_user = profile(false, vec![kid_role.clone()], Some(kid_role));
        assert_eq!(
            select_view(Some(&kid_user), Some("k1")),
            SessionView::KidDashboard { family_id: "f1".to_string(), kid_id: "k1".to_string() }
        );
        assert_eq!(
            select_view(Some(&kid_user), None),
            SessionView::KidProfileMissing { family_id: "f1".to_string() }
        );
    }

    #[test]
    fn test_admin_with_active_parent_role_sees_parent_view() {
        let role = FamilyRole::parent("f2", "Admins");
        let admin = profile(true, vec![role.clone()], Some(role));
        assert_eq!(
            Role::from_profile(&admin, None),
            Some(Role::Parent { family_id: "f2".to_string() })
        );
    }

    #[test]
    fn test_actor_checks() {
        let actor = Actor::new(profile(false, vec![FamilyRole::parent("f1", "Smiths")], None));
        assert!(actor.require_parent("f1").is_ok());
        assert!(actor.require_parent("f2").is_err());
        assert!(actor.require_member("f1").is_ok());
        assert!(actor.require_admin().is_err());
        assert!(actor.require_kid_access(&kid("f1", None)).is_ok());
        assert!(actor.require_kid_access(&kid("f2", None)).is_err());

        let kid_actor = Actor::new(profile(false, vec![FamilyRole::kid("f2", "Joneses")], None));
        assert!(kid_actor.require_parent("f2").is_err());
        assert!(kid_actor.require_member("f2").is_ok());
        assert!(kid_actor.require_kid_access(&kid("f2", Some("u1"))).is_ok());
        assert!(kid_actor.require_kid_access(&kid("f2", Some("other"))).is_err());

        let admin = Actor::new(profile(true, vec![], None));
        assert!(admin.require_parent("anything").is_ok());
        assert!(admin.require_kid_access(&kid("f9", None)).is_ok());
    }
}
