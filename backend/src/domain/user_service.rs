use std::sync::Arc;

use serde_json::json;
use shared::{FamilyRoleKind, HighscoreScope, SessionView};
use tracing::{debug, info, warn};

use crate::storage::{field_value, WriteBatch};

use super::clock::Clock;
use super::collections::Collections;
use super::commands::session::{SessionResult, SignInCommand, SwitchRoleCommand};
use super::error::{ChoreError, ChoreResult};
use super::models::{Family, FamilyRole, Kid, UserProfile};
use super::session::{select_view, Actor};

/// Resolves identities into profiles, roles and the screen to show
#[derive(Clone)]
pub struct UserService {
    collections: Collections,
    clock: Arc<dyn Clock>,
    admin_emails: Arc<Vec<String>>,
}

impl UserService {
    /// `admin_emails` must already be trimmed and lower-cased
    pub fn new(collections: Collections, clock: Arc<dyn Clock>, admin_emails: Vec<String>) -> Self {
        Self {
            collections,
            clock,
            admin_emails: Arc::new(admin_emails),
        }
    }

    fn is_admin_email(&self, email: Option<&str>) -> bool {
        email.is_some_and(|e| self.admin_emails.iter().any(|a| a == e))
    }

    /// Create or refresh the profile behind an identity and pick its view
    pub async fn sign_in(&self, command: SignInCommand) -> ChoreResult<SessionResult> {
        if command.is_anonymous {
            debug!("Anonymous session {}", command.uid);
            return Ok(SessionResult {
                profile: None,
                view: SessionView::SignedOut,
            });
        }
        info!("Signing in {}", command.uid);

        let now = self.clock.now();
        let email = command
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        let is_admin = self.is_admin_email(email.as_deref());

        let users = self.collections.users();
        let mut profile = match users.get(&command.uid).await? {
            Some(existing) => existing,
            None => {
                info!("Creating profile for {}", command.uid);
                UserProfile {
                    uid: command.uid.clone(),
                    email: None,
                    display_name: None,
                    is_system_admin: false,
                    family_roles: Vec::new(),
                    active_family_role: None,
                    created_at: now,
                    last_login_at: now,
                }
            }
        };
        profile.email = email;
        if command.display_name.is_some() {
            profile.display_name = command.display_name;
        }
        profile.is_system_admin = is_admin;
        profile.last_login_at = now;

        let mut batch = WriteBatch::new();

        let has_parent_role = profile
            .family_roles
            .iter()
            .any(|r| r.role == FamilyRoleKind::Parent);
        if is_admin && !has_parent_role {
            let owner = profile
                .display_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or("Admin");
            let family = Family {
                id: Family::generate_id(),
                name: Family::default_name_for(owner),
                highscore_scope: HighscoreScope::Disabled,
                highscore_group_id: None,
                created_at: now,
            };
            info!("Creating default family {} for administrator {}", family.id, profile.uid);
            self.collections.families().create_in(&mut batch, &family)?;
            let role = FamilyRole::parent(&family.id, &family.name);
            profile.add_role(role.clone());
            profile.active_family_role = Some(role);
        }

        self.refresh_role_names(&mut profile).await?;
        self.settle_active_role(&mut profile);

        if !is_admin && profile.family_roles.is_empty() {
            if let Some(email) = profile.email.clone() {
                self.link_kid_profile(&mut batch, &mut profile, &email).await?;
            }
        }

        users.set_in(&mut batch, &profile)?;
        self.collections.commit(batch).await?;

        let view = self.view_for(&profile).await?;
        info!("Signed in {} ({:?})", profile.uid, view);
        Ok(SessionResult {
            profile: Some(profile),
            view,
        })
    }

    /// Change the role a user acts in. Without a family an administrator
    /// returns to the admin view.
    pub async fn switch_active_role(&self, command: SwitchRoleCommand) -> ChoreResult<SessionResult> {
        info!("Switching active role of {} to {:?}", command.uid, command.family_id);

        let mut profile = self.get_profile(&command.uid).await?;
        profile.active_family_role = match command.family_id.as_deref() {
            None if profile.is_system_admin => None,
            None => {
                return Err(ChoreError::Forbidden(
                    "only administrators can leave the family view".to_string(),
                ))
            }
            Some(family_id) => {
                let mut candidates = profile
                    .family_roles
                    .iter()
                    .filter(|r| r.family_id == family_id)
                    .filter(|r| command.role.map_or(true, |kind| r.role == kind));
                // Parent first when both roles are held and none was asked for
                let first = candidates.next().cloned();
                let parent = candidates.find(|r| r.role == FamilyRoleKind::Parent).cloned();
                let chosen = match (first, parent) {
                    (Some(first), _) if first.role == FamilyRoleKind::Parent => Some(first),
                    (Some(_), Some(parent)) => Some(parent),
                    (first, _) => first,
                };
                Some(chosen.ok_or_else(|| {
                    ChoreError::Forbidden(format!("no role in family {}", family_id))
                })?)
            }
        };

        self.collections.users().save(&profile).await?;
        let view = self.view_for(&profile).await?;
        Ok(SessionResult {
            profile: Some(profile),
            view,
        })
    }

    pub async fn get_profile(&self, uid: &str) -> ChoreResult<UserProfile> {
        self.collections
            .users()
            .get(uid)
            .await?
            .ok_or_else(|| ChoreError::not_found("User", uid))
    }

    /// The actor behind a request. Unknown accounts are refused.
    pub async fn resolve_actor(&self, uid: &str) -> ChoreResult<Actor> {
        match self.collections.users().get(uid).await? {
            Some(profile) => Ok(Actor::new(profile)),
            None => {
                warn!("Request from unknown account {}", uid);
                Err(ChoreError::Forbidden("unknown account".to_string()))
            }
        }
    }

    /// Current session view of a stored profile
    pub async fn session(&self, uid: &str) -> ChoreResult<SessionResult> {
        let profile = self.get_profile(uid).await?;
        let view = self.view_for(&profile).await?;
        Ok(SessionResult {
            profile: Some(profile),
            view,
        })
    }

    async fn view_for(&self, profile: &UserProfile) -> ChoreResult<SessionView> {
        let linked_kid = match &profile.active_family_role {
            Some(active) if active.role == FamilyRoleKind::Kid => self
                .collections
                .kids(&active.family_id)
                .list()
                .await?
                .into_iter()
                .find(|k| k.auth_uid.as_deref() == Some(profile.uid.as_str())),
            _ => None,
        };
        Ok(select_view(Some(profile), linked_kid.as_ref().map(|k| k.id.as_str())))
    }

    /// Fill in family names missing from cached roles
    async fn refresh_role_names(&self, profile: &mut UserProfile) -> ChoreResult<()> {
        let families = self.collections.families();
        for role in profile.family_roles.iter_mut() {
            if !role.family_name.trim().is_empty() {
                continue;
            }
            role.family_name = match families.get(&role.family_id).await? {
                Some(family) => family.name,
                None => {
                    warn!("Role of {} points at missing family {}", profile.uid, role.family_id);
                    "Unknown Family".to_string()
                }
            };
        }
        Ok(())
    }

    /// Keep the active role when it is still held, otherwise fall back to the
    /// first role. An administrator may stay on the admin view.
    fn settle_active_role(&self, profile: &mut UserProfile) {
        let current = profile.active_family_role.as_ref().and_then(|active| {
            profile
                .family_roles
                .iter()
                .find(|r| r.same_membership(active))
                .cloned()
        });
        profile.active_family_role = match current {
            Some(role) => Some(role),
            None if profile.is_system_admin && profile.active_family_role.is_none() => None,
            None => profile.family_roles.first().cloned(),
        };
    }

    /// Link an account without roles to the first kid profile carrying its
    /// email and make that kid role active.
    async fn link_kid_profile(
        &self,
        batch: &mut WriteBatch,
        profile: &mut UserProfile,
        email: &str,
    ) -> ChoreResult<()> {
        for family in self.collections.families().list().await? {
            let kids = self.collections.kids(&family.id);
            let found: Option<Kid> = kids
                .list()
                .await?
                .into_iter()
                .find(|k| k.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)));
            let Some(kid) = found else {
                continue;
            };

            info!("Linking account {} to kid {} in family {}", profile.uid, kid.id, family.id);
            if kid.auth_uid.as_deref() != Some(profile.uid.as_str()) {
                batch.update(kids.path(&kid.id), json!({ "auth_uid": field_value(&profile.uid)? }));
            }
            let role = FamilyRole::kid(&family.id, &family.name);
            profile.add_role(role.clone());
            profile.active_family_role = Some(role);
            return Ok(());
        }
        debug!("No kid profile found for {}", email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::*;
    use crate::domain::ApprovalService;

    const ADMIN_EMAIL: &str = "admin@example.com";

    async fn setup_test() -> (Collections, UserService) {
        let collections = setup_collections().await;
        let service = UserService::new(
            collections.clone(),
            clock_on(monday()),
            vec![ADMIN_EMAIL.to_string()],
        );
        (collections, service)
    }

    fn sign_in(uid: &str, email: &str, name: Option<&str>) -> SignInCommand {
        SignInCommand {
            uid: uid.to_string(),
            email: Some(email.to_string()),
            display_name: name.map(str::to_string),
            is_anonymous: false,
        }
    }

    #[tokio::test]
    async fn test_anonymous_session_is_signed_out() {
        let (collections, service) = setup_test().await;

        let result = service
            .sign_in(SignInCommand {
                uid: "anon".to_string(),
                email: None,
                display_name: None,
                is_anonymous: true,
            })
            .await
            .unwrap();

        assert!(result.profile.is_none());
        assert_eq!(result.view, SessionView::SignedOut);
        assert!(collections.users().get("anon").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_admin_gets_default_family() {
        let (collections, service) = setup_test().await;

        let result = service
            .sign_in(sign_in("a1", "Admin@Example.com", Some("Robin")))
            .await
            .unwrap();
        let profile = result.profile.unwrap();

        assert!(profile.is_system_admin);
        assert_eq!(profile.family_roles.len(), 1);
        let role = &profile.family_roles[0];
        assert_eq!(role.family_name, "Robin's Default Family");
        assert_eq!(
            result.view,
            SessionView::ParentDashboard {
                family_id: role.family_id.clone()
            }
        );
        assert!(collections.families().get(&role.family_id).await.unwrap().is_some());

        // A second sign-in does not create another family
        let again = service.sign_in(sign_in("a1", ADMIN_EMAIL, None)).await.unwrap();
        assert_eq!(again.profile.unwrap().family_roles.len(), 1);
        assert_eq!(collections.families().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_new_user_without_roles_has_no_family() {
        let (_, service) = setup_test().await;

        let result = service.sign_in(sign_in("u1", "pat@example.com", Some("Pat"))).await.unwrap();

        let profile = result.profile.unwrap();
        assert!(!profile.is_system_admin);
        assert!(profile.active_family_role.is_none());
        assert_eq!(result.view, SessionView::NoFamily);
    }

    #[tokio::test]
    async fn test_sign_in_links_kid_by_email() {
        let (collections, service) = setup_test().await;
        seed_family(&collections, FAMILY_ID, "Smiths").await;
        let mut kid = seed_kid(&collections, FAMILY_ID, "k1", 0).await;
        kid.email = Some("sam@example.com".to_string());
        collections.kids(FAMILY_ID).save(&kid).await.unwrap();

        let result = service.sign_in(sign_in("u-sam", "SAM@example.com", None)).await.unwrap();

        assert_eq!(
            result.view,
            SessionView::KidDashboard {
                family_id: FAMILY_ID.to_string(),
                kid_id: "k1".to_string()
            }
        );
        let kid = collections.kids(FAMILY_ID).get("k1").await.unwrap().unwrap();
        assert_eq!(kid.auth_uid.as_deref(), Some("u-sam"));
        let profile = service.get_profile("u-sam").await.unwrap();
        assert!(profile.has_role(FAMILY_ID, FamilyRoleKind::Kid));
    }

    #[tokio::test]
    async fn test_linking_keeps_credit_committed_meanwhile() {
        let (direct, interleaved, store) = setup_interleaved().await;
        seed_family(&direct, FAMILY_ID, "Smiths").await;
        let mut kid = seed_kid(&direct, FAMILY_ID, "k1", 0).await;
        kid.email = Some("sam@example.com".to_string());
        direct.kids(FAMILY_ID).save(&kid).await.unwrap();
        let completed = pending_daily_submission(&direct, "k1").await;

        let approvals = ApprovalService::new(direct.clone(), clock_on(monday()));
        store.arm(async move {
            approvals.approve(approve_command(&completed.id)).await.unwrap();
        });

        let service = UserService::new(interleaved, clock_on(monday()), Vec::new());
        service.sign_in(sign_in("u-sam", "sam@example.com", None)).await.unwrap();

        let kid = direct.kids(FAMILY_ID).get("k1").await.unwrap().unwrap();
        assert_eq!(kid.auth_uid.as_deref(), Some("u-sam"));
        assert_eq!(kid.points, 5);
        assert_eq!(kid.total_earned_points, 5);
    }

    #[tokio::test]
    async fn test_kid_role_without_linked_profile() {
        let (collections, service) = setup_test().await;
        seed_family(&collections, FAMILY_ID, "Smiths").await;
        let mut user = seed_user(&collections, "u1", "pat@example.com").await;
        user.family_roles.push(FamilyRole::kid(FAMILY_ID, ""));
        collections.users().save(&user).await.unwrap();

        let result = service.sign_in(sign_in("u1", "pat@example.com", None)).await.unwrap();

        assert_eq!(
            result.view,
            SessionView::KidProfileMissing {
                family_id: FAMILY_ID.to_string()
            }
        );
        // The missing family name was filled in
        let profile = result.profile.unwrap();
        assert_eq!(profile.family_roles[0].family_name, "Smiths");
        assert_eq!(profile.active_family_role.unwrap().family_name, "Smiths");
    }

    #[tokio::test]
    async fn test_switch_active_role() {
        let (collections, service) = setup_test().await;
        seed_family(&collections, FAMILY_ID, "Smiths").await;
        let admin = service.sign_in(sign_in("a1", ADMIN_EMAIL, Some("Robin"))).await.unwrap();
        let mut profile = admin.profile.unwrap();
        profile.add_role(FamilyRole::parent(FAMILY_ID, "Smiths"));
        collections.users().save(&profile).await.unwrap();

        let switched = service
            .switch_active_role(SwitchRoleCommand {
                uid: "a1".to_string(),
                family_id: Some(FAMILY_ID.to_string()),
                role: None,
            })
            .await
            .unwrap();
        assert_eq!(
            switched.view,
            SessionView::ParentDashboard {
                family_id: FAMILY_ID.to_string()
            }
        );

        let admin_view = service
            .switch_active_role(SwitchRoleCommand {
                uid: "a1".to_string(),
                family_id: None,
                role: None,
            })
            .await
            .unwrap();
        assert_eq!(admin_view.view, SessionView::AdminDashboard);

        // The admin view survives the next sign-in
        let again = service.sign_in(sign_in("a1", ADMIN_EMAIL, None)).await.unwrap();
        assert_eq!(again.view, SessionView::AdminDashboard);

        let err = service
            .switch_active_role(SwitchRoleCommand {
                uid: "a1".to_string(),
                family_id: Some("other".to_string()),
                role: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_resolve_actor() {
        let (collections, service) = setup_test().await;
        seed_user(&collections, "u1", "pat@example.com").await;

        let actor = service.resolve_actor("u1").await.unwrap();
        assert_eq!(actor.uid(), "u1");
        assert!(!actor.is_admin());

        let err = service.resolve_actor("ghost").await.unwrap_err();
        assert!(matches!(err, ChoreError::Forbidden(_)));
    }
}
