use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::storage::{field_value, WriteBatch};

use super::clock::Clock;
use super::collections::Collections;
use super::commands::kid::KidCommand;
use super::error::{normalize_email, validate_name, ChoreError, ChoreResult};
use super::models::{Family, FamilyRole, Kid};

#[derive(Clone)]
pub struct KidService {
    collections: Collections,
    clock: Arc<dyn Clock>,
}

impl KidService {
    pub fn new(collections: Collections, clock: Arc<dyn Clock>) -> Self {
        Self { collections, clock }
    }

    pub async fn create_kid(&self, family_id: &str, command: KidCommand) -> ChoreResult<Kid> {
        info!("Creating kid '{}' in family {}", command.name, family_id);

        let family = self.get_family(family_id).await?;
        let name = validate_name(&command.name)?;
        let email = normalize_email(command.email.as_deref())?;

        let kid = Kid {
            id: Kid::generate_id(),
            family_id: family_id.to_string(),
            name,
            email,
            auth_uid: None,
            points: 0,
            total_earned_points: 0,
            created_at: self.clock.now(),
        };
        let mut batch = WriteBatch::new();
        let kid = self.link_account(&mut batch, &family, kid).await?;
        self.collections.kids(family_id).create_in(&mut batch, &kid)?;
        self.collections.commit(batch).await?;

        info!("Created kid {} (linked: {})", kid.id, kid.auth_uid.is_some());
        Ok(kid)
    }

    /// Rename a kid or change their email. Only the profile fields are
    /// written, so balances moved by concurrent approvals or redemptions stay.
    pub async fn update_kid(
        &self,
        family_id: &str,
        kid_id: &str,
        command: KidCommand,
    ) -> ChoreResult<Kid> {
        info!("Updating kid {} in family {}", kid_id, family_id);

        let family = self.get_family(family_id).await?;
        let mut kid = self.get_kid(family_id, kid_id).await?;
        let email = normalize_email(command.email.as_deref())?;

        kid.name = validate_name(&command.name)?;
        if kid.email != email {
            kid.email = email;
            kid.auth_uid = None;
        }

        let mut batch = WriteBatch::new();
        let kid = self.link_account(&mut batch, &family, kid).await?;
        batch.update(self.collections.kids(family_id).path(&kid.id), profile_fields(&kid)?);
        self.collections.commit(batch).await?;

        self.get_kid(family_id, kid_id).await
    }

    /// Delete a kid. Their submissions and redemptions stay as history.
    pub async fn delete_kid(&self, family_id: &str, kid_id: &str) -> ChoreResult<()> {
        info!("Deleting kid {} in family {}", kid_id, family_id);

        let kid = self.get_kid(family_id, kid_id).await?;
        self.collections.kids(family_id).delete(&kid.id).await?;
        Ok(())
    }

    pub async fn get_kid(&self, family_id: &str, kid_id: &str) -> ChoreResult<Kid> {
        self.collections
            .kids(family_id)
            .get(kid_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Kid", kid_id))
    }

    /// Kids of a family ordered by name
    pub async fn list_kids(&self, family_id: &str) -> ChoreResult<Vec<Kid>> {
        let mut kids = self.collections.kids(family_id).list().await?;
        kids.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(kids)
    }

    /// Kid profile in `family_id` linked to the account `uid`
    pub async fn find_linked_kid(&self, family_id: &str, uid: &str) -> ChoreResult<Option<Kid>> {
        let kids = self.collections.kids(family_id).list().await?;
        Ok(kids.into_iter().find(|k| k.auth_uid.as_deref() == Some(uid)))
    }

    /// Link the kid to an existing account with the same email, queueing the
    /// account's new kid role into `batch`
    async fn link_account(&self, batch: &mut WriteBatch, family: &Family, mut kid: Kid) -> ChoreResult<Kid> {
        if kid.auth_uid.is_some() {
            return Ok(kid);
        }
        let user = match kid.email.as_deref() {
            Some(email) => self.collections.user_by_email(email).await?,
            None => None,
        };
        if let Some(mut user) = user {
            info!("Linking kid {} to account {}", kid.id, user.uid);
            kid.auth_uid = Some(user.uid.clone());
            if user.add_role(FamilyRole::kid(&family.id, &family.name)) {
                self.collections.users().set_in(batch, &user)?;
            }
        }
        Ok(kid)
    }

    async fn get_family(&self, family_id: &str) -> ChoreResult<Family> {
        self.collections
            .families()
            .get(family_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Family", family_id))
    }
}

/// Fields a profile edit may change; balances are owned by the ledger
fn profile_fields(kid: &Kid) -> ChoreResult<Value> {
    Ok(json!({
        "name": field_value(&kid.name)?,
        "email": field_value(&kid.email)?,
        "auth_uid": field_value(&kid.auth_uid)?,
    }))
}
