use std::sync::Arc;

use shared::HighscoreScope;
use tracing::{info, warn};

use crate::storage::{DocumentPath, WriteBatch};

use super::clock::Clock;
use super::collections::Collections;
use super::commands::family::{AddParentResult, FamilyCommand};
use super::error::{normalize_email, validate_name, ChoreError, ChoreResult, ValidationError};
use super::models::{Family, FamilyRole, HighscoreGroup};

/// Administration of families, their parents and highscore groups
#[derive(Clone)]
pub struct FamilyService {
    collections: Collections,
    clock: Arc<dyn Clock>,
}

impl FamilyService {
    pub fn new(collections: Collections, clock: Arc<dyn Clock>) -> Self {
        Self { collections, clock }
    }

    pub async fn create_family(&self, command: FamilyCommand) -> ChoreResult<Family> {
        info!("Creating family '{}'", command.name);

        let (scope, group_id) = self.validate_scope(&command).await?;
        let family = Family {
            id: Family::generate_id(),
            name: validate_name(&command.name)?,
            highscore_scope: scope,
            highscore_group_id: group_id,
            created_at: self.clock.now(),
        };
        self.collections.families().save(&family).await?;

        info!("Created family {}", family.id);
        Ok(family)
    }

    /// Update a family. A rename is pushed into the cached family name of
    /// every member's roles in the same batch.
    pub async fn update_family(&self, family_id: &str, command: FamilyCommand) -> ChoreResult<Family> {
        info!("Updating family {}", family_id);

        let mut family = self.get_family(family_id).await?;
        let name = validate_name(&command.name)?;
        let (scope, group_id) = self.validate_scope(&command).await?;
        let renamed = family.name != name;

        family.name = name;
        family.highscore_scope = scope;
        family.highscore_group_id = group_id;

        let mut batch = WriteBatch::new();
        self.collections.families().set_in(&mut batch, &family)?;
        if renamed {
            self.queue_role_name_refresh(&mut batch, &family).await?;
        }
        self.collections.commit(batch).await?;
        Ok(family)
    }

    /// Delete a family with everything it owns and drop it from every
    /// member's roles.
    pub async fn delete_family(&self, family_id: &str) -> ChoreResult<()> {
        info!("Deleting family {}", family_id);

        let family = self.get_family(family_id).await?;
        let mut batch = WriteBatch::new();

        let owned = self.owned_documents(family_id).await?;
        info!("Removing {} documents owned by family {}", owned.len(), family_id);
        for path in owned {
            batch.delete(path);
        }

        let users = self.collections.users();
        for mut user in users.list().await? {
            let before = user.family_roles.len();
            user.family_roles.retain(|r| r.family_id != family.id);
            let was_active = user
                .active_family_role
                .as_ref()
                .is_some_and(|r| r.family_id == family.id);
            if was_active {
                user.active_family_role = user.family_roles.first().cloned();
            }
            if before != user.family_roles.len() || was_active {
                users.set_in(&mut batch, &user)?;
            }
        }

        batch.delete(self.collections.families().path(&family.id));
        self.collections.commit(batch).await?;
        Ok(())
    }

    pub async fn get_family(&self, family_id: &str) -> ChoreResult<Family> {
        self.collections
            .families()
            .get(family_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Family", family_id))
    }

    /// All families ordered by name
    pub async fn list_families(&self) -> ChoreResult<Vec<Family>> {
        let mut families = self.collections.families().list().await?;
        families.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(families)
    }

    /// Give an existing account a parent role in a family. Adding someone who
    /// is already a parent there is not an error.
    pub async fn add_parent_by_email(&self, family_id: &str, email: &str) -> ChoreResult<AddParentResult> {
        info!("Adding parent {} to family {}", email, family_id);

        let family = self.get_family(family_id).await?;
        let email = normalize_email(Some(email))?
            .ok_or_else(|| ValidationError::InvalidEmail(email.to_string()))?;
        let mut user = self.collections.user_by_email(&email).await?.ok_or_else(|| {
            warn!("No account with email {}", email);
            ChoreError::not_found("User", email.clone())
        })?;

        if !user.add_role(FamilyRole::parent(&family.id, &family.name)) {
            return Ok(AddParentResult {
                added: false,
                message: format!("{} is already a parent in {}", email, family.name),
            });
        }
        if user.active_family_role.is_none() && !user.is_system_admin {
            user.active_family_role = Some(FamilyRole::parent(&family.id, &family.name));
        }
        self.collections.users().save(&user).await?;

        info!("Account {} is now a parent of family {}", user.uid, family.id);
        Ok(AddParentResult {
            added: true,
            message: format!("{} added as a parent to {}", email, family.name),
        })
    }

    pub async fn create_highscore_group(&self, name: &str) -> ChoreResult<HighscoreGroup> {
        info!("Creating highscore group '{}'", name);

        let group = HighscoreGroup {
            id: HighscoreGroup::generate_id(),
            name: validate_name(name)?,
            created_at: self.clock.now(),
        };
        self.collections.highscore_groups().save(&group).await?;
        Ok(group)
    }

    pub async fn rename_highscore_group(&self, group_id: &str, name: &str) -> ChoreResult<HighscoreGroup> {
        info!("Renaming highscore group {}", group_id);

        let mut group = self.get_highscore_group(group_id).await?;
        group.name = validate_name(name)?;
        self.collections.highscore_groups().save(&group).await?;
        Ok(group)
    }

    /// Delete a group. Families assigned to it fall back to an internal
    /// leaderboard until they are reassigned.
    pub async fn delete_highscore_group(&self, group_id: &str) -> ChoreResult<()> {
        info!("Deleting highscore group {}", group_id);

        let group = self.get_highscore_group(group_id).await?;
        let families = self.collections.families();
        let mut batch = WriteBatch::new();

        for mut family in families.list().await? {
            if family.highscore_group_id.as_deref() == Some(group.id.as_str()) {
                warn!("Family {} loses highscore group {}", family.id, group.id);
                family.highscore_group_id = None;
                if family.highscore_scope == HighscoreScope::Group {
                    family.highscore_scope = HighscoreScope::Internal;
                }
                families.set_in(&mut batch, &family)?;
            }
        }

        batch.delete(self.collections.highscore_groups().path(&group.id));
        self.collections.commit(batch).await?;
        Ok(())
    }

    pub async fn get_highscore_group(&self, group_id: &str) -> ChoreResult<HighscoreGroup> {
        self.collections
            .highscore_groups()
            .get(group_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Highscore group", group_id))
    }

    pub async fn list_highscore_groups(&self) -> ChoreResult<Vec<HighscoreGroup>> {
        let mut groups = self.collections.highscore_groups().list().await?;
        groups.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(groups)
    }

    /// Group scope needs an existing group; any other scope clears it
    async fn validate_scope(&self, command: &FamilyCommand) -> ChoreResult<(HighscoreScope, Option<String>)> {
        if command.highscore_scope != HighscoreScope::Group {
            return Ok((command.highscore_scope, None));
        }
        let group_id = command
            .highscore_group_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingHighscoreGroup)?;
        let group = self.get_highscore_group(group_id).await?;
        Ok((HighscoreScope::Group, Some(group.id)))
    }

    async fn queue_role_name_refresh(&self, batch: &mut WriteBatch, family: &Family) -> ChoreResult<()> {
        let users = self.collections.users();
        for mut user in users.list().await? {
            let mut changed = false;
            for role in user.family_roles.iter_mut().filter(|r| r.family_id == family.id) {
                role.family_name = family.name.clone();
                changed = true;
            }
            if let Some(active) = user.active_family_role.as_mut().filter(|r| r.family_id == family.id) {
                active.family_name = family.name.clone();
                changed = true;
            }
            if changed {
                users.set_in(batch, &user)?;
            }
        }
        Ok(())
    }

    async fn owned_documents(&self, family_id: &str) -> ChoreResult<Vec<DocumentPath>> {
        let c = &self.collections;
        let mut paths = Vec::new();
        paths.extend(c.kids(family_id).list().await?.iter().map(|d| c.kids(family_id).path(&d.id)));
        paths.extend(c.tasks(family_id).list().await?.iter().map(|d| c.tasks(family_id).path(&d.id)));
        paths.extend(c.rewards(family_id).list().await?.iter().map(|d| c.rewards(family_id).path(&d.id)));
        paths.extend(
            c.completed_tasks(family_id)
                .list()
                .await?
                .iter()
                .map(|d| c.completed_tasks(family_id).path(&d.id)),
        );
        paths.extend(
            c.redeemed_rewards(family_id)
                .list()
                .await?
                .iter()
                .map(|d| c.redeemed_rewards(family_id).path(&d.id)),
        );
        Ok(paths)
    }
}
