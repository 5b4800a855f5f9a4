use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde_json::json;
use shared::{CompletionStatus, RecurrenceType};
use tracing::{info, warn};

use crate::storage::{field_value, WriteBatch};

use super::clock::Clock;
use super::collections::Collections;
use super::commands::task::{ApproveTaskCommand, ApproveTaskResult, RejectTaskCommand};
use super::due_date::compute_next_due_date;
use super::error::{ChoreError, ChoreResult};
use super::models::kid::{POINTS_FIELD, TOTAL_EARNED_FIELD};
use super::models::{CompletedTask, Task, STATUS_FIELD};
use super::task_service::pending_guard_error;

/// Parent side of the submission lifecycle: approve or reject
#[derive(Clone)]
pub struct ApprovalService {
    collections: Collections,
    clock: Arc<dyn Clock>,
}

impl ApprovalService {
    pub fn new(collections: Collections, clock: Arc<dyn Clock>) -> Self {
        Self { collections, clock }
    }

    pub async fn get_completion(
        &self,
        family_id: &str,
        completed_task_id: &str,
    ) -> ChoreResult<CompletedTask> {
        self.collections
            .completed_tasks(family_id)
            .get(completed_task_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Submission", completed_task_id))
    }

    /// Submissions waiting for approval, oldest first
    pub async fn list_pending(&self, family_id: &str) -> ChoreResult<Vec<CompletedTask>> {
        let mut pending: Vec<CompletedTask> = self
            .collections
            .completed_tasks(family_id)
            .list()
            .await?
            .into_iter()
            .filter(|c| c.status == CompletionStatus::PendingApproval)
            .collect();
        pending.sort_by_key(|c| c.date_submitted);
        Ok(pending)
    }

    /// Approve a pending submission.
    ///
    /// Credits the kid, closes the submission and moves the task to its next
    /// occurrence (or re-lists an `immediately` task) in one atomic batch.
    pub async fn approve(&self, command: ApproveTaskCommand) -> ChoreResult<ApproveTaskResult> {
        info!(
            "Approving submission {} in family {}",
            command.completed_task_id, command.family_id
        );

        let family_id = command.family_id.as_str();
        let completions = self.collections.completed_tasks(family_id);
        let kids = self.collections.kids(family_id);
        let tasks = self.collections.tasks(family_id);

        let mut completed = self.get_completion(family_id, &command.completed_task_id).await?;
        require_pending(&completed, "approve")?;
        let kid = kids
            .get(&completed.kid_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Kid", completed.kid_id.clone()))?;
        let task = tasks.get(&completed.task_id).await?;

        let awarded = command.points_awarded.unwrap_or(completed.task_points);
        completed.status = CompletionStatus::Approved;
        completed.date_approved_or_rejected = Some(self.clock.now());
        completed.points_awarded = Some(awarded);
        completed.approval_note = clean_note(command.note);
        completed.processed_by = Some(command.approver);

        let completion_path = completions.path(&completed.id);
        let kid_path = kids.path(&kid.id);
        let mut batch = WriteBatch::new();
        batch.assert_equals(
            completion_path,
            STATUS_FIELD,
            field_value(&CompletionStatus::PendingApproval)?,
        );
        completions.set_in(&mut batch, &completed)?;
        batch
            .increment(kid_path.clone(), POINTS_FIELD, i64::from(awarded))
            .increment(kid_path, TOTAL_EARNED_FIELD, i64::from(awarded));

        let mut next_due_date = None;
        let mut cloned_task = None;
        match task {
            Some(task) if task.recurrence_type.is_recurring() => {
                // Schedule from the day after the approved occurrence so it
                // never lands on itself
                let as_of = completed
                    .task_due_date
                    .checked_add_days(Days::new(1))
                    .unwrap_or(completed.task_due_date);
                next_due_date = compute_next_due_date(&task, as_of);
                match next_due_date {
                    Some(next) => {
                        batch.update(tasks.path(&task.id), json!({ "next_due_date": field_value(&next)? }));
                    }
                    None => warn!("Task {} could not be rescheduled after approval", task.id),
                }
            }
            Some(task) if task.recurrence_type == RecurrenceType::Immediately => {
                let clone = relist_immediate_task(&task, self.clock.today(), self.clock.now());
                tasks.create_in(&mut batch, &clone)?;
                cloned_task = Some(clone);
            }
            Some(_) => {}
            None => warn!(
                "Task {} no longer exists, approving submission {} without rescheduling",
                completed.task_id, completed.id
            ),
        }

        self.collections
            .commit(batch)
            .await
            .map_err(|e| pending_guard_error(e, &completed.id, "approve"))?;

        let kid = kids
            .get(&kid.id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Kid", kid.id.clone()))?;

        info!(
            "Approved submission {}: kid {} +{} points (balance {})",
            completed.id, kid.id, awarded, kid.points
        );
        Ok(ApproveTaskResult {
            completed_task: completed,
            kid,
            next_due_date,
            cloned_task,
        })
    }

    /// Reject a pending submission. With `reopen` the submission is deleted so
    /// the kid can submit the same occurrence again; otherwise it is kept as
    /// rejected and the occurrence stays closed. Balances never change.
    pub async fn reject(&self, command: RejectTaskCommand) -> ChoreResult<Option<CompletedTask>> {
        info!(
            "Rejecting submission {} in family {} (reopen={})",
            command.completed_task_id, command.family_id, command.reopen
        );

        let completions = self.collections.completed_tasks(&command.family_id);
        let mut completed = self
            .get_completion(&command.family_id, &command.completed_task_id)
            .await?;
        require_pending(&completed, "reject")?;

        let path = completions.path(&completed.id);
        let mut batch = WriteBatch::new();
        batch.assert_equals(
            path.clone(),
            STATUS_FIELD,
            field_value(&CompletionStatus::PendingApproval)?,
        );

        let result = if command.reopen {
            batch.delete(path);
            None
        } else {
            completed.status = CompletionStatus::Rejected;
            completed.date_approved_or_rejected = Some(self.clock.now());
            completed.points_awarded = Some(0);
            completed.approval_note = clean_note(command.note);
            completed.processed_by = Some(command.approver);
            completions.set_in(&mut batch, &completed)?;
            Some(completed.clone())
        };

        self.collections
            .commit(batch)
            .await
            .map_err(|e| pending_guard_error(e, &completed.id, "reject"))?;

        Ok(result)
    }
}

fn require_pending(completed: &CompletedTask, action: &'static str) -> ChoreResult<()> {
    if completed.status == CompletionStatus::PendingApproval {
        Ok(())
    } else {
        Err(ChoreError::InvalidTransition {
            id: completed.id.clone(),
            status: completed.status.to_string(),
            action,
        })
    }
}

pub(crate) fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Copy an `immediately` task so it reappears starting `today`, keeping the
/// original gap between start date and due date.
fn relist_immediate_task(task: &Task, today: NaiveDate, now: chrono::DateTime<chrono::Utc>) -> Task {
    let start = task.start_date.unwrap_or(today);
    let due = task.custom_due_date.unwrap_or(start);
    let offset = (due - start).num_days().max(0) as u64;
    let new_due = today.checked_add_days(Days::new(offset)).unwrap_or(today);

    let mut clone = task.clone();
    clone.id = Task::generate_id();
    clone.start_date = Some(today);
    clone.custom_due_date = Some(new_due);
    clone.next_due_date = None;
    clone.next_due_date = compute_next_due_date(&clone, new_due);
    clone.created_at = now;
    clone
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::task::SubmitTaskCommand;
    use crate::domain::test_support::*;
    use crate::domain::TaskService;

    struct Fixture {
        collections: Collections,
        tasks: TaskService,
        approvals: ApprovalService,
    }

    async fn setup_test(today: NaiveDate) -> Fixture {
        let collections = setup_collections().await;
        seed_family(&collections, FAMILY_ID, "Smiths").await;
        seed_kid(&collections, FAMILY_ID, "k1", 0).await;
        seed_kid(&collections, FAMILY_ID, "k2", 7).await;
        let clock = clock_on(today);
        Fixture {
            tasks: TaskService::new(collections.clone(), clock.clone()),
            approvals: ApprovalService::new(collections.clone(), clock),
            collections,
        }
    }

    async fn create_and_submit(fixture: &Fixture, recurrence: RecurrenceType, start: &str, due: Option<&str>) -> CompletedTask {
        let task = fixture
            .tasks
            .create_task(FAMILY_ID, task_command(recurrence, start, due))
            .await
            .unwrap();
        fixture
            .tasks
            .submit_task(SubmitTaskCommand {
                family_id: FAMILY_ID.to_string(),
                kid_id: "k1".to_string(),
                task_id: task.id,
            })
            .await
            .unwrap()
    }

    fn approve(id: &str, points: Option<u32>) -> ApproveTaskCommand {
        ApproveTaskCommand {
            family_id: FAMILY_ID.to_string(),
            completed_task_id: id.to_string(),
            points_awarded: points,
            note: Some("  Nice job ".to_string()),
            approver: "Parent".to_string(),
        }
    }

    fn reject(id: &str, reopen: bool) -> RejectTaskCommand {
        RejectTaskCommand {
            family_id: FAMILY_ID.to_string(),
            completed_task_id: id.to_string(),
            reopen,
            note: None,
            approver: "Parent".to_string(),
        }
    }

    #[tokio::test]
    async fn test_daily_approval_end_to_end() {
        let fixture = setup_test(monday()).await;
        let completed = create_and_submit(&fixture, RecurrenceType::Daily, "2024-01-08", None).await;

        let pending = fixture.approvals.list_pending(FAMILY_ID).await.unwrap();
        assert_eq!(pending.len(), 1);

        let result = fixture.approvals.approve(approve(&completed.id, None)).await.unwrap();
        assert_eq!(result.kid.points, 5);
        assert_eq!(result.kid.total_earned_points, 5);
        assert_eq!(result.next_due_date, Some(date(2024, 1, 9)));
        assert_eq!(result.completed_task.status, CompletionStatus::Approved);
        assert_eq!(result.completed_task.points_awarded, Some(5));
        assert_eq!(result.completed_task.approval_note.as_deref(), Some("Nice job"));
        assert_eq!(result.completed_task.processed_by.as_deref(), Some("Parent"));

        let task = fixture.tasks.get_task(FAMILY_ID, &completed.task_id).await.unwrap();
        assert_eq!(task.next_due_date, Some(date(2024, 1, 9)));

        // other kids untouched
        let other = fixture.collections.kids(FAMILY_ID).get("k2").await.unwrap().unwrap();
        assert_eq!(other.points, 7);
        assert_eq!(other.total_earned_points, 7);
        assert!(fixture.approvals.list_pending(FAMILY_ID).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_approval_with_point_override() {
        let fixture = setup_test(monday()).await;
        let completed = create_and_submit(&fixture, RecurrenceType::Daily, "2024-01-08", None).await;

        let result = fixture.approvals.approve(approve(&completed.id, Some(8))).await.unwrap();
        assert_eq!(result.kid.points, 8);
        assert_eq!(result.kid.total_earned_points, 8);
        // snapshot stays as submitted
        assert_eq!(result.completed_task.task_points, 5);
    }

    #[tokio::test]
    async fn test_weekly_approval_moves_to_next_selected_day() {
        let fixture = setup_test(monday()).await;
        let completed = create_and_submit(&fixture, RecurrenceType::Weekly, "2024-01-08", None).await;
        assert_eq!(completed.task_due_date, monday());

        let result = fixture.approvals.approve(approve(&completed.id, None)).await.unwrap();
        assert_eq!(result.next_due_date, Some(date(2024, 1, 10)));
    }

    #[tokio::test]
    async fn test_immediately_task_is_relisted_with_same_offset() {
        let fixture = setup_test(date(2024, 1, 12)).await;
        let completed = create_and_submit(
            &fixture,
            RecurrenceType::Immediately,
            "2024-01-08",
            Some("2024-01-10"),
        )
        .await;

        let result = fixture.approvals.approve(approve(&completed.id, None)).await.unwrap();
        assert_eq!(result.next_due_date, None);
        let clone = result.cloned_task.unwrap();
        assert_ne!(clone.id, completed.task_id);
        assert_eq!(clone.start_date, Some(date(2024, 1, 12)));
        assert_eq!(clone.custom_due_date, Some(date(2024, 1, 14)));
        assert_eq!(clone.next_due_date, Some(date(2024, 1, 14)));
        assert_eq!(clone.name, "Make the bed");

        let stored = fixture.tasks.get_task(FAMILY_ID, &clone.id).await.unwrap();
        assert_eq!(stored, clone);
        assert_eq!(fixture.tasks.list_tasks(FAMILY_ID).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cannot_approve_twice() {
        let fixture = setup_test(monday()).await;
        let completed = create_and_submit(&fixture, RecurrenceType::Daily, "2024-01-08", None).await;

        fixture.approvals.approve(approve(&completed.id, None)).await.unwrap();
        let again = fixture.approvals.approve(approve(&completed.id, None)).await;
        assert!(matches!(again, Err(ChoreError::InvalidTransition { action: "approve", .. })));

        let kid = fixture.collections.kids(FAMILY_ID).get("k1").await.unwrap().unwrap();
        assert_eq!(kid.points, 5);
    }

    #[tokio::test]
    async fn test_reject_and_reopen_allows_resubmission() {
        let fixture = setup_test(monday()).await;
        let completed = create_and_submit(&fixture, RecurrenceType::Daily, "2024-01-08", None).await;

        let result = fixture.approvals.reject(reject(&completed.id, true)).await.unwrap();
        assert!(result.is_none());
        assert!(fixture.approvals.get_completion(FAMILY_ID, &completed.id).await.is_err());

        let resubmitted = fixture
            .tasks
            .submit_task(SubmitTaskCommand {
                family_id: FAMILY_ID.to_string(),
                kid_id: "k1".to_string(),
                task_id: completed.task_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(resubmitted.task_due_date, completed.task_due_date);
    }

    #[tokio::test]
    async fn test_reject_without_reopen_keeps_record() {
        let fixture = setup_test(monday()).await;
        let completed = create_and_submit(&fixture, RecurrenceType::Daily, "2024-01-08", None).await;

        let rejected = fixture
            .approvals
            .reject(reject(&completed.id, false))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rejected.status, CompletionStatus::Rejected);
        assert_eq!(rejected.points_awarded, Some(0));

        let kid = fixture.collections.kids(FAMILY_ID).get("k1").await.unwrap().unwrap();
        assert_eq!(kid.points, 0);
        let task = fixture.tasks.get_task(FAMILY_ID, &completed.task_id).await.unwrap();
        assert_eq!(task.next_due_date, Some(monday()));

        let again = fixture.approvals.reject(reject(&completed.id, false)).await;
        assert!(matches!(again, Err(ChoreError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_approval_survives_deleted_task() {
        let fixture = setup_test(monday()).await;
        let completed = create_and_submit(&fixture, RecurrenceType::Daily, "2024-01-08", None).await;
        fixture.tasks.delete_task(FAMILY_ID, &completed.task_id).await.unwrap();

        let result = fixture.approvals.approve(approve(&completed.id, None)).await.unwrap();
        assert_eq!(result.kid.points, 5);
        assert_eq!(result.next_due_date, None);
    }
}
