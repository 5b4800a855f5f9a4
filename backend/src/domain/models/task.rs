use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{DayOfWeek, RecurrenceType};

use crate::storage::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub points: u32,
    pub recurrence_type: RecurrenceType,
    #[serde(default)]
    pub days_of_week: Vec<DayOfWeek>,
    pub start_date: Option<NaiveDate>,
    pub custom_due_date: Option<NaiveDate>,
    /// Cached due date of the current occurrence, maintained by the calculator
    pub next_due_date: Option<NaiveDate>,
    /// `None` means any kid of the family may do the task
    pub assigned_kid_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn generate_id() -> String {
        format!("task::{}", uuid::Uuid::new_v4())
    }

    pub fn is_assignable_to(&self, kid_id: &str) -> bool {
        match self.assigned_kid_id.as_deref() {
            None | Some("") => true,
            Some(assigned) => assigned == kid_id,
        }
    }
}

impl Document for Task {
    fn id(&self) -> &str {
        &self.id
    }
}
