use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::CompletionStatus;

use crate::storage::Document;

/// A kid's submission for one occurrence of a task.
///
/// Name and points are copied from the task when submitted so later edits to
/// the task do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub id: String,
    pub family_id: String,
    pub kid_id: String,
    pub kid_name: String,
    pub task_id: String,
    pub task_name: String,
    pub task_points: u32,
    /// Due date of the occurrence this submission fulfils
    pub task_due_date: NaiveDate,
    pub date_submitted: DateTime<Utc>,
    pub status: CompletionStatus,
    pub date_approved_or_rejected: Option<DateTime<Utc>>,
    pub points_awarded: Option<u32>,
    pub approval_note: Option<String>,
    pub processed_by: Option<String>,
}

impl CompletedTask {
    /// One document per (task, kid, occurrence): the id doubles as the
    /// no-double-submit key.
    pub fn occurrence_id(task_id: &str, kid_id: &str, due_date: NaiveDate) -> String {
        format!("{}_{}_{}", task_id, kid_id, due_date.format("%Y%m%d"))
    }

    pub fn is_for_occurrence(&self, task_id: &str, kid_id: &str, due_date: NaiveDate) -> bool {
        self.task_id == task_id && self.kid_id == kid_id && self.task_due_date == due_date
    }
}

impl Document for CompletedTask {
    fn id(&self) -> &str {
        &self.id
    }
}
