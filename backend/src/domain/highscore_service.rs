use shared::{HighscoreEntry, HighscoreScope, LeaderboardResponse};
use tracing::debug;

use super::collections::Collections;
use super::error::{ChoreError, ChoreResult};
use super::models::{Family, Kid};

/// Leaderboards ranked by lifetime earned points
#[derive(Clone)]
pub struct HighscoreService {
    collections: Collections,
}

impl HighscoreService {
    pub fn new(collections: Collections) -> Self {
        Self { collections }
    }

    /// Leaderboard as seen from `family_id`. `current_kid_id` marks the
    /// viewer's own entry.
    pub async fn leaderboard(
        &self,
        family_id: &str,
        current_kid_id: Option<&str>,
    ) -> ChoreResult<LeaderboardResponse> {
        let family = self
            .collections
            .families()
            .get(family_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Family", family_id))?;

        let participants = match (family.highscore_scope, family.highscore_group_id.as_deref()) {
            (HighscoreScope::Internal, _) => vec![family.clone()],
            (HighscoreScope::Group, Some(group_id)) => self
                .collections
                .families()
                .list()
                .await?
                .into_iter()
                .filter(|f| {
                    f.highscore_scope == HighscoreScope::Group
                        && f.highscore_group_id.as_deref() == Some(group_id)
                })
                .collect(),
            _ => Vec::new(),
        };
        debug!(
            "Leaderboard for family {} spans {} families",
            family.id,
            participants.len()
        );

        let mut entries = Vec::new();
        for participant in &participants {
            let kids = self.collections.kids(&participant.id).list().await?;
            entries.extend(
                kids.iter()
                    .map(|kid| entry(kid, participant, family_id, current_kid_id)),
            );
        }
        entries.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));

        Ok(LeaderboardResponse {
            scope: family.highscore_scope,
            entries,
        })
    }
}

fn entry(kid: &Kid, family: &Family, viewer_family_id: &str, current_kid_id: Option<&str>) -> HighscoreEntry {
    HighscoreEntry {
        kid_id: kid.id.clone(),
        name: kid.name.clone(),
        family_name: family.name.clone(),
        points: kid.total_earned_points,
        is_current: family.id == viewer_family_id && current_kid_id == Some(kid.id.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::*;

    async fn seed_scoped_family(
        collections: &Collections,
        id: &str,
        scope: HighscoreScope,
        group: Option<&str>,
    ) {
        let mut family = seed_family(collections, id, &format!("Family {}", id)).await;
        family.highscore_scope = scope;
        family.highscore_group_id = group.map(str::to_string);
        collections.families().save(&family).await.unwrap();
    }

    #[tokio::test]
    async fn test_internal_leaderboard_ranks_by_total_earned() {
        let collections = setup_collections().await;
        seed_family(&collections, FAMILY_ID, "Smiths").await;
        seed_kid(&collections, FAMILY_ID, "k1", 10).await;
        let mut spender = seed_kid(&collections, FAMILY_ID, "k2", 0).await;
        // Spent points do not lower the ranking
        spender.total_earned_points = 50;
        collections.kids(FAMILY_ID).save(&spender).await.unwrap();

        let service = HighscoreService::new(collections);
        let board = service.leaderboard(FAMILY_ID, Some("k1")).await.unwrap();

        assert_eq!(board.scope, HighscoreScope::Internal);
        let ids: Vec<&str> = board.entries.iter().map(|e| e.kid_id.as_str()).collect();
        assert_eq!(ids, vec!["k2", "k1"]);
        assert_eq!(board.entries[0].points, 50);
        assert!(board.entries[1].is_current);
        assert!(!board.entries[0].is_current);
        assert_eq!(board.entries[0].family_name, "Smiths");
    }

    #[tokio::test]
    async fn test_disabled_leaderboard_is_empty() {
        let collections = setup_collections().await;
        seed_scoped_family(&collections, "f1", HighscoreScope::Disabled, None).await;
        seed_kid(&collections, "f1", "k1", 10).await;

        let board = HighscoreService::new(collections).leaderboard("f1", None).await.unwrap();
        assert_eq!(board.scope, HighscoreScope::Disabled);
        assert!(board.entries.is_empty());
    }

    #[tokio::test]
    async fn test_group_leaderboard_spans_opted_in_families() {
        let collections = setup_collections().await;
        seed_scoped_family(&collections, "f1", HighscoreScope::Group, Some("g1")).await;
        seed_scoped_family(&collections, "f2", HighscoreScope::Group, Some("g1")).await;
        seed_scoped_family(&collections, "f3", HighscoreScope::Group, Some("g2")).await;
        // Same group id but not opted in to group scope
        seed_scoped_family(&collections, "f4", HighscoreScope::Internal, Some("g1")).await;
        seed_kid(&collections, "f1", "a", 5).await;
        seed_kid(&collections, "f2", "b", 30).await;
        seed_kid(&collections, "f3", "c", 100).await;
        seed_kid(&collections, "f4", "d", 100).await;

        let board = HighscoreService::new(collections).leaderboard("f1", Some("a")).await.unwrap();

        let ids: Vec<&str> = board.entries.iter().map(|e| e.kid_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(board.entries[0].family_name, "Family f2");
        assert!(board.entries[1].is_current);
    }
}
