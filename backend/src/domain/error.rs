use chrono::NaiveDate;
use thiserror::Error;

use crate::storage::StoreError;

pub const MAX_NAME_LENGTH: usize = 100;

/// Input rejected before anything is written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Name is too long (max {MAX_NAME_LENGTH} characters)")]
    NameTooLong,
    #[error("Points must be greater than zero")]
    NonPositivePoints,
    #[error("Point cost must be greater than zero")]
    NonPositiveCost,
    #[error("Weekly tasks need at least one day of the week")]
    EmptyWeekdays,
    #[error("Start date is required")]
    MissingStartDate,
    #[error("Due date is required for one-off tasks")]
    MissingDueDate,
    #[error("Due date cannot be before the start date")]
    DueBeforeStart,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("A highscore group must be selected for group scope")]
    MissingHighscoreGroup,
}

/// Errors returned by the domain services
#[derive(Debug, Error)]
pub enum ChoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Not enough points: balance is {balance}, cost is {cost}")]
    InsufficientPoints { balance: u64, cost: u32 },

    #[error("Task {task_id} was already submitted for {due_date}")]
    AlreadySubmitted { task_id: String, due_date: NaiveDate },

    #[error("Task {task_id} was rejected for {due_date} and cannot be resubmitted")]
    OccurrenceClosed { task_id: String, due_date: NaiveDate },

    #[error("Task {task_id} is not active")]
    TaskInactive { task_id: String },

    #[error("Task {task_id} is assigned to another kid")]
    NotAssigned { task_id: String },

    #[error("Task {task_id} has no schedulable due date")]
    Unschedulable { task_id: String },

    #[error("Reward {reward_id} was already redeemed")]
    AlreadyRedeemed { reward_id: String },

    #[error("Reward {reward_id} is not available")]
    Unavailable { reward_id: String },

    #[error("Cannot {action} {id}: status is {status}")]
    InvalidTransition {
        id: String,
        status: String,
        action: &'static str,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ChoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ChoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type ChoreResult<T> = Result<T, ChoreError>;

/// Trimmed, non-empty, bounded name
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    Ok(trimmed.to_string())
}

/// Normalize an optional email: blank means none, otherwise lower-cased and
/// checked for a plausible `local@domain.tld` shape.
pub fn normalize_email(email: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    let lowered = raw.to_lowercase();
    let valid = match lowered.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !lowered.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
                    .unwrap_or(false)
        }
        None => false,
    };
    if valid {
        Ok(Some(lowered))
    } else {
        Err(ValidationError::InvalidEmail(raw.to_string()))
    }
}
