use std::sync::Arc;

use serde_json::json;
use shared::{CompletionStatus, RecurrenceType, TaskViewPeriod};
use tracing::{info, warn};

use crate::storage::{field_value, StoreError, WriteBatch};

use super::clock::Clock;
use super::collections::Collections;
use super::commands::task::{SubmitTaskCommand, TaskCommand};
use super::due_date::{compute_next_due_date, current_occurrence, parse_optional_day};
use super::error::{validate_name, ChoreError, ChoreResult, ValidationError};
use super::models::{CompletedTask, Kid, Task, STATUS_FIELD};
use super::task_view::{kid_task_view, KidTaskEntry};

/// Task definitions, the kid task list and submissions
#[derive(Clone)]
pub struct TaskService {
    collections: Collections,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(collections: Collections, clock: Arc<dyn Clock>) -> Self {
        Self { collections, clock }
    }

    pub async fn create_task(&self, family_id: &str, command: TaskCommand) -> ChoreResult<Task> {
        info!("Creating task '{}' in family {}", command.name, family_id);

        self.require_family(family_id).await?;

        let mut task = Task {
            id: Task::generate_id(),
            family_id: family_id.to_string(),
            name: String::new(),
            points: 0,
            recurrence_type: RecurrenceType::None,
            days_of_week: Vec::new(),
            start_date: None,
            custom_due_date: None,
            next_due_date: None,
            assigned_kid_id: None,
            is_active: true,
            created_at: self.clock.now(),
        };
        apply_definition(&mut task, command)?;
        self.require_assignee(family_id, &task).await?;

        self.collections.tasks(family_id).save(&task).await?;

        info!(
            "Created task {} ({}), next due {:?}",
            task.id, task.recurrence_type, task.next_due_date
        );
        Ok(task)
    }

    pub async fn update_task(
        &self,
        family_id: &str,
        task_id: &str,
        command: TaskCommand,
    ) -> ChoreResult<Task> {
        info!("Updating task {} in family {}", task_id, family_id);

        let mut task = self.get_task(family_id, task_id).await?;
        apply_definition(&mut task, command)?;
        self.require_assignee(family_id, &task).await?;

        self.collections.tasks(family_id).save(&task).await?;
        Ok(task)
    }

    pub async fn set_task_active(
        &self,
        family_id: &str,
        task_id: &str,
        is_active: bool,
    ) -> ChoreResult<Task> {
        info!("Setting task {} active={}", task_id, is_active);

        let mut task = self.get_task(family_id, task_id).await?;
        self.collections
            .tasks(family_id)
            .update_field(task_id, "is_active", json!(is_active))
            .await?;
        task.is_active = is_active;
        Ok(task)
    }

    /// Delete a task definition. Submissions for it stay as history.
    pub async fn delete_task(&self, family_id: &str, task_id: &str) -> ChoreResult<()> {
        info!("Deleting task {} in family {}", task_id, family_id);

        let task = self.get_task(family_id, task_id).await?;
        self.collections.tasks(family_id).delete(&task.id).await?;
        Ok(())
    }

    pub async fn get_task(&self, family_id: &str, task_id: &str) -> ChoreResult<Task> {
        self.collections
            .tasks(family_id)
            .get(task_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Task", task_id))
    }

    /// All tasks of the family, earliest upcoming first
    pub async fn list_tasks(&self, family_id: &str) -> ChoreResult<Vec<Task>> {
        let mut tasks = self.collections.tasks(family_id).list().await?;
        tasks.sort_by(|a, b| {
            let key = |t: &Task| current_occurrence(t).or(t.start_date);
            key(a)
                .is_none()
                .cmp(&key(b).is_none())
                .then_with(|| key(a).cmp(&key(b)))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(tasks)
    }

    pub async fn kid_tasks(
        &self,
        family_id: &str,
        kid_id: &str,
        period: TaskViewPeriod,
    ) -> ChoreResult<Vec<KidTaskEntry>> {
        self.get_kid(family_id, kid_id).await?;

        let tasks = self.collections.tasks(family_id).list().await?;
        let completions: Vec<CompletedTask> = self
            .collections
            .completed_tasks(family_id)
            .list()
            .await?
            .into_iter()
            .filter(|c| c.kid_id == kid_id)
            .collect();

        Ok(kid_task_view(&tasks, &completions, kid_id, period, self.clock.today()))
    }

    /// Submit the task's current occurrence for approval
    pub async fn submit_task(&self, command: SubmitTaskCommand) -> ChoreResult<CompletedTask> {
        info!(
            "Kid {} submitting task {} in family {}",
            command.kid_id, command.task_id, command.family_id
        );

        let kid = self.get_kid(&command.family_id, &command.kid_id).await?;
        let task = self.get_task(&command.family_id, &command.task_id).await?;

        if !task.is_active {
            return Err(ChoreError::TaskInactive { task_id: task.id });
        }
        if !task.is_assignable_to(&kid.id) {
            return Err(ChoreError::NotAssigned { task_id: task.id });
        }
        let due_date = current_occurrence(&task)
            .ok_or_else(|| ChoreError::Unschedulable { task_id: task.id.clone() })?;

        let completions = self.collections.completed_tasks(&command.family_id);
        let id = CompletedTask::occurrence_id(&task.id, &kid.id, due_date);
        if let Some(existing) = completions.get(&id).await? {
            warn!("Duplicate submission for task {} on {}", task.id, due_date);
            return Err(occurrence_taken(&existing));
        }

        let completed = CompletedTask {
            id,
            family_id: command.family_id.clone(),
            kid_id: kid.id.clone(),
            kid_name: kid.name.clone(),
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            task_points: task.points,
            task_due_date: due_date,
            date_submitted: self.clock.now(),
            status: CompletionStatus::PendingApproval,
            date_approved_or_rejected: None,
            points_awarded: None,
            approval_note: None,
            processed_by: None,
        };

        let mut batch = WriteBatch::new();
        completions.create_in(&mut batch, &completed)?;
        self.collections.commit(batch).await.map_err(|e| match e {
            StoreError::AlreadyExists(_) => ChoreError::AlreadySubmitted {
                task_id: task.id.clone(),
                due_date,
            },
            other => other.into(),
        })?;

        info!("Created submission {} for {}", completed.id, due_date);
        Ok(completed)
    }

    /// Delete a submission that is still waiting for approval
    pub async fn withdraw_submission(
        &self,
        family_id: &str,
        completed_task_id: &str,
    ) -> ChoreResult<CompletedTask> {
        info!("Withdrawing submission {} in family {}", completed_task_id, family_id);

        let completions = self.collections.completed_tasks(family_id);
        let completed = completions
            .get(completed_task_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Submission", completed_task_id))?;
        if completed.status != CompletionStatus::PendingApproval {
            return Err(ChoreError::InvalidTransition {
                id: completed.id,
                status: completed.status.to_string(),
                action: "withdraw",
            });
        }

        let path = completions.path(&completed.id);
        let mut batch = WriteBatch::new();
        batch
            .assert_equals(path.clone(), STATUS_FIELD, field_value(&CompletionStatus::PendingApproval)?)
            .delete(path);
        self.collections
            .commit(batch)
            .await
            .map_err(|e| pending_guard_error(e, &completed.id, "withdraw"))?;

        Ok(completed)
    }

    async fn require_family(&self, family_id: &str) -> ChoreResult<()> {
        match self.collections.families().get(family_id).await? {
            Some(_) => Ok(()),
            None => Err(ChoreError::not_found("Family", family_id)),
        }
    }

    async fn get_kid(&self, family_id: &str, kid_id: &str) -> ChoreResult<Kid> {
        self.collections
            .kids(family_id)
            .get(kid_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Kid", kid_id))
    }

    async fn require_assignee(&self, family_id: &str, task: &Task) -> ChoreResult<()> {
        match task.assigned_kid_id.as_deref() {
            Some(kid_id) => self.get_kid(family_id, kid_id).await.map(|_| ()),
            None => Ok(()),
        }
    }
}

/// Validate a task definition and write it onto `task`, recomputing the
/// cached next due date.
fn apply_definition(task: &mut Task, command: TaskCommand) -> Result<(), ValidationError> {
    let name = validate_name(&command.name)?;
    if command.points == 0 {
        return Err(ValidationError::NonPositivePoints);
    }

    let start_date = parse_optional_day(command.start_date.as_deref())?
        .ok_or(ValidationError::MissingStartDate)?;
    let custom_due_date = parse_optional_day(command.custom_due_date.as_deref())?;
    let recurring = command.recurrence_type.is_recurring();

    if command.recurrence_type == RecurrenceType::Weekly && command.days_of_week.is_empty() {
        return Err(ValidationError::EmptyWeekdays);
    }
    if !recurring && custom_due_date.is_none() {
        return Err(ValidationError::MissingDueDate);
    }
    if custom_due_date.is_some_and(|due| due < start_date) {
        return Err(ValidationError::DueBeforeStart);
    }

    let mut days_of_week = if command.recurrence_type == RecurrenceType::Weekly {
        command.days_of_week
    } else {
        Vec::new()
    };
    days_of_week.sort();
    days_of_week.dedup();

    task.name = name;
    task.points = command.points;
    task.recurrence_type = command.recurrence_type;
    task.days_of_week = days_of_week;
    task.start_date = Some(start_date);
    task.custom_due_date = custom_due_date;
    task.assigned_kid_id = command.assigned_kid_id.filter(|id| !id.trim().is_empty());
    task.next_due_date = None;
    task.next_due_date = match custom_due_date {
        Some(due) => Some(due),
        None => compute_next_due_date(task, start_date),
    };
    Ok(())
}

fn occurrence_taken(existing: &CompletedTask) -> ChoreError {
    if existing.status.holds_occurrence() {
        ChoreError::AlreadySubmitted {
            task_id: existing.task_id.clone(),
            due_date: existing.task_due_date,
        }
    } else {
        ChoreError::OccurrenceClosed {
            task_id: existing.task_id.clone(),
            due_date: existing.task_due_date,
        }
    }
}

/// A failed "still pending" precondition means someone else processed the
/// record first.
pub(crate) fn pending_guard_error(error: StoreError, id: &str, action: &'static str) -> ChoreError {
    match error {
        StoreError::PreconditionFailed { .. } | StoreError::NotFound(_) => {
            ChoreError::InvalidTransition {
                id: id.to_string(),
                status: "already processed".to_string(),
                action,
            }
        }
        other => other.into(),
    }
}
