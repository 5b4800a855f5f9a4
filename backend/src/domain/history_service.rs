use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use shared::{CompletionStatus, FamilyOverview, HistoryPeriod, PointSummary, RedemptionStatus};

use super::clock::Clock;
use super::collections::Collections;
use super::error::{ChoreError, ChoreResult};
use super::models::{CompletedTask, RedeemedReward};
use super::task_view::{end_of_week, start_of_week};

/// A kid's submissions and redemptions within a period, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct KidHistory {
    pub completed_tasks: Vec<CompletedTask>,
    pub redeemed_rewards: Vec<RedeemedReward>,
}

/// Whether `day` falls inside `period` as seen on `today`. Weeks run
/// Monday to Sunday.
pub fn in_period(period: HistoryPeriod, day: NaiveDate, today: NaiveDate) -> bool {
    match period {
        HistoryPeriod::All => true,
        HistoryPeriod::Today => day == today,
        HistoryPeriod::Week => day >= start_of_week(today) && day <= end_of_week(today),
        HistoryPeriod::Month => day.year() == today.year() && day.month() == today.month(),
    }
}

#[derive(Clone)]
pub struct HistoryService {
    collections: Collections,
    clock: Arc<dyn Clock>,
}

impl HistoryService {
    pub fn new(collections: Collections, clock: Arc<dyn Clock>) -> Self {
        Self { collections, clock }
    }

    /// Submissions filtered by submission day and redemptions by redemption
    /// day
    pub async fn kid_history(
        &self,
        family_id: &str,
        kid_id: &str,
        period: HistoryPeriod,
    ) -> ChoreResult<KidHistory> {
        self.require_kid(family_id, kid_id).await?;
        let today = self.clock.today();

        let mut completed_tasks: Vec<CompletedTask> = self
            .kid_completions(family_id, kid_id)
            .await?
            .into_iter()
            .filter(|c| in_period(period, self.clock.date_of(c.date_submitted), today))
            .collect();
        completed_tasks.sort_by(|a, b| b.date_submitted.cmp(&a.date_submitted));

        let mut redeemed_rewards: Vec<RedeemedReward> = self
            .collections
            .redeemed_rewards(family_id)
            .list()
            .await?
            .into_iter()
            .filter(|r| r.kid_id == kid_id)
            .filter(|r| in_period(period, self.clock.date_of(r.date_redeemed), today))
            .collect();
        redeemed_rewards.sort_by(|a, b| b.date_redeemed.cmp(&a.date_redeemed));

        Ok(KidHistory {
            completed_tasks,
            redeemed_rewards,
        })
    }

    /// Points approved today, this week and this month, plus the points
    /// still waiting for approval
    pub async fn point_summary(&self, family_id: &str, kid_id: &str) -> ChoreResult<PointSummary> {
        self.require_kid(family_id, kid_id).await?;
        let today = self.clock.today();
        let completions = self.kid_completions(family_id, kid_id).await?;

        let approved_in = |period: HistoryPeriod| -> u64 {
            completions
                .iter()
                .filter(|c| c.status == CompletionStatus::Approved)
                .filter_map(|c| {
                    let day = self.clock.date_of(c.date_approved_or_rejected?);
                    in_period(period, day, today).then_some(u64::from(c.points_awarded.unwrap_or(0)))
                })
                .sum()
        };
        let pending = completions
            .iter()
            .filter(|c| c.status == CompletionStatus::PendingApproval)
            .map(|c| u64::from(c.task_points))
            .sum();

        Ok(PointSummary {
            today: approved_in(HistoryPeriod::Today),
            this_week: approved_in(HistoryPeriod::Week),
            this_month: approved_in(HistoryPeriod::Month),
            pending,
        })
    }

    /// Counts shown on the parent dashboard
    pub async fn family_overview(&self, family_id: &str) -> ChoreResult<FamilyOverview> {
        let pending_approvals = self
            .collections
            .completed_tasks(family_id)
            .list()
            .await?
            .iter()
            .filter(|c| c.status == CompletionStatus::PendingApproval)
            .count();
        let pending_fulfillments = self
            .collections
            .redeemed_rewards(family_id)
            .list()
            .await?
            .iter()
            .filter(|r| r.status == RedemptionStatus::PendingFulfillment)
            .count();

        Ok(FamilyOverview {
            pending_approvals,
            pending_fulfillments,
        })
    }

    async fn kid_completions(&self, family_id: &str, kid_id: &str) -> ChoreResult<Vec<CompletedTask>> {
        Ok(self
            .collections
            .completed_tasks(family_id)
            .list()
            .await?
            .into_iter()
            .filter(|c| c.kid_id == kid_id)
            .collect())
    }

    async fn require_kid(&self, family_id: &str, kid_id: &str) -> ChoreResult<()> {
        match self.collections.kids(family_id).get(kid_id).await? {
            Some(_) => Ok(()),
            None => Err(ChoreError::not_found("Kid", kid_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::*;
    use chrono::{DateTime, NaiveTime, Utc};

    fn at(day: NaiveDate) -> DateTime<Utc> {
        day.and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap()).and_utc()
    }

    fn completion(id: &str, kid_id: &str, submitted: NaiveDate, status: CompletionStatus, points: u32) -> CompletedTask {
        let processed = status != CompletionStatus::PendingApproval;
        CompletedTask {
            id: id.to_string(),
            family_id: FAMILY_ID.to_string(),
            kid_id: kid_id.to_string(),
            kid_name: "Sam".to_string(),
            task_id: format!("task-{}", id),
            task_name: "Dishes".to_string(),
            task_points: points,
            task_due_date: submitted,
            date_submitted: at(submitted),
            status,
            date_approved_or_rejected: processed.then(|| at(submitted)),
            points_awarded: processed.then_some(if status == CompletionStatus::Approved { points } else { 0 }),
            approval_note: None,
            processed_by: None,
        }
    }

    fn redemption(id: &str, kid_id: &str, redeemed: NaiveDate, status: RedemptionStatus) -> RedeemedReward {
        RedeemedReward {
            id: id.to_string(),
            family_id: FAMILY_ID.to_string(),
            kid_id: kid_id.to_string(),
            kid_name: "Sam".to_string(),
            reward_id: "r1".to_string(),
            reward_name: "Ice cream".to_string(),
            points_spent: 10,
            date_redeemed: at(redeemed),
            status,
            date_fulfilled: None,
            date_cancelled: None,
            cancellation_note: None,
            fulfilled_by: None,
            cancelled_by: None,
        }
    }

    #[test]
    fn test_in_period() {
        // Wednesday 2024-01-10
        let today = date(2024, 1, 10);
        assert!(in_period(HistoryPeriod::All, date(2020, 1, 1), today));
        assert!(in_period(HistoryPeriod::Today, today, today));
        assert!(!in_period(HistoryPeriod::Today, date(2024, 1, 9), today));
        assert!(in_period(HistoryPeriod::Week, monday(), today));
        assert!(in_period(HistoryPeriod::Week, date(2024, 1, 14), today));
        assert!(!in_period(HistoryPeriod::Week, date(2024, 1, 7), today));
        assert!(in_period(HistoryPeriod::Month, date(2024, 1, 31), today));
        assert!(!in_period(HistoryPeriod::Month, date(2023, 1, 10), today));
    }

    #[tokio::test]
    async fn test_kid_history_filters_and_orders() {
        let collections = setup_collections().await;
        seed_kid(&collections, FAMILY_ID, "k1", 0).await;
        let completions = collections.completed_tasks(FAMILY_ID);
        completions
            .save(&completion("c1", "k1", date(2024, 1, 2), CompletionStatus::Approved, 5))
            .await
            .unwrap();
        completions
            .save(&completion("c2", "k1", date(2024, 1, 9), CompletionStatus::Approved, 5))
            .await
            .unwrap();
        completions
            .save(&completion("c3", "k1", date(2024, 1, 10), CompletionStatus::PendingApproval, 5))
            .await
            .unwrap();
        completions
            .save(&completion("other", "k2", date(2024, 1, 10), CompletionStatus::Approved, 5))
            .await
            .unwrap();
        collections
            .redeemed_rewards(FAMILY_ID)
            .save(&redemption("rr1", "k1", date(2023, 12, 30), RedemptionStatus::Fulfilled))
            .await
            .unwrap();

        let service = HistoryService::new(collections, clock_on(date(2024, 1, 10)));

        let all = service.kid_history(FAMILY_ID, "k1", HistoryPeriod::All).await.unwrap();
        let ids: Vec<&str> = all.completed_tasks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c2", "c1"]);
        assert_eq!(all.redeemed_rewards.len(), 1);

        let week = service.kid_history(FAMILY_ID, "k1", HistoryPeriod::Week).await.unwrap();
        let ids: Vec<&str> = week.completed_tasks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c2"]);
        assert!(week.redeemed_rewards.is_empty());

        let today = service.kid_history(FAMILY_ID, "k1", HistoryPeriod::Today).await.unwrap();
        assert_eq!(today.completed_tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_point_summary() {
        let collections = setup_collections().await;
        seed_kid(&collections, FAMILY_ID, "k1", 0).await;
        let completions = collections.completed_tasks(FAMILY_ID);
        for (id, day, status, points) in [
            ("c1", date(2024, 1, 10), CompletionStatus::Approved, 3),
            ("c2", date(2024, 1, 8), CompletionStatus::Approved, 4),
            ("c3", date(2024, 1, 2), CompletionStatus::Approved, 5),
            ("c4", date(2023, 12, 31), CompletionStatus::Approved, 6),
            ("c5", date(2024, 1, 10), CompletionStatus::Rejected, 7),
            ("c6", date(2024, 1, 10), CompletionStatus::PendingApproval, 8),
        ] {
            completions.save(&completion(id, "k1", day, status, points)).await.unwrap();
        }

        let service = HistoryService::new(collections, clock_on(date(2024, 1, 10)));
        let summary = service.point_summary(FAMILY_ID, "k1").await.unwrap();

        assert_eq!(
            summary,
            PointSummary {
                today: 3,
                this_week: 7,
                this_month: 12,
                pending: 8,
            }
        );
    }

    #[tokio::test]
    async fn test_family_overview_counts_pending_items() {
        let collections = setup_collections().await;
        let completions = collections.completed_tasks(FAMILY_ID);
        completions
            .save(&completion("c1", "k1", monday(), CompletionStatus::PendingApproval, 5))
            .await
            .unwrap();
        completions
            .save(&completion("c2", "k2", monday(), CompletionStatus::PendingApproval, 5))
            .await
            .unwrap();
        completions
            .save(&completion("c3", "k1", monday(), CompletionStatus::Approved, 5))
            .await
            .unwrap();
        let redemptions = collections.redeemed_rewards(FAMILY_ID);
        redemptions
            .save(&redemption("rr1", "k1", monday(), RedemptionStatus::PendingFulfillment))
            .await
            .unwrap();
        redemptions
            .save(&redemption("rr2", "k1", monday(), RedemptionStatus::CancelledByParent))
            .await
            .unwrap();

        let service = HistoryService::new(collections, clock_on(monday()));
        let overview = service.family_overview(FAMILY_ID).await.unwrap();

        assert_eq!(overview.pending_approvals, 2);
        assert_eq!(overview.pending_fulfillments, 1);
    }
}
