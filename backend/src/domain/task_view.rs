//! What a kid sees on their task list.

use chrono::{Datelike, Days, NaiveDate};
use shared::{CompletionStatus, DueStatus, TaskViewPeriod};

use super::due_date::current_occurrence;
use super::models::{CompletedTask, Task};

/// Days ahead still shown as "N days left" rather than "later"
const DAYS_LEFT_WINDOW: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct KidTaskEntry {
    pub task: Task,
    pub due_date: Option<NaiveDate>,
    pub due_status: DueStatus,
    /// Kid's pending submission for this occurrence, which can be withdrawn
    pub pending_submission_id: Option<String>,
}

/// Monday of the week containing `day`
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    let back = u64::from(day.weekday().num_days_from_monday());
    day.checked_sub_days(Days::new(back)).unwrap_or(day)
}

/// Sunday of the week containing `day`
pub fn end_of_week(day: NaiveDate) -> NaiveDate {
    let start = start_of_week(day);
    start.checked_add_days(Days::new(6)).unwrap_or(start)
}

pub fn due_status(due_date: Option<NaiveDate>, today: NaiveDate) -> DueStatus {
    let Some(due) = due_date else {
        return DueStatus::Unscheduled;
    };
    let days = (due - today).num_days();
    match days {
        d if d < 0 => DueStatus::Overdue,
        0 => DueStatus::DueToday,
        d if d < DAYS_LEFT_WINDOW => DueStatus::DaysLeft { days: d as u32 },
        _ => DueStatus::Later,
    }
}

/// Tasks visible to `kid_id` for the chosen period, earliest first.
///
/// Inactive tasks, tasks assigned to another kid and occurrences the kid
/// already had approved are hidden. Overdue occurrences are always shown.
pub fn kid_task_view(
    tasks: &[Task],
    completions: &[CompletedTask],
    kid_id: &str,
    period: TaskViewPeriod,
    today: NaiveDate,
) -> Vec<KidTaskEntry> {
    let week_end = end_of_week(today);

    let mut entries: Vec<(NaiveDate, KidTaskEntry)> = tasks
        .iter()
        .filter(|task| task.is_active && task.is_assignable_to(kid_id))
        .filter_map(|task| {
            let occurrence = current_occurrence(task);

            let Some(due) = occurrence else {
                // Recurring task that has not started yet
                let upcoming_start = task
                    .start_date
                    .filter(|start| task.recurrence_type.is_recurring() && *start > today);
                return match (period, upcoming_start) {
                    (TaskViewPeriod::AllUpcoming, Some(start)) => Some((
                        start,
                        KidTaskEntry {
                            task: task.clone(),
                            due_date: None,
                            due_status: DueStatus::Unscheduled,
                            pending_submission_id: None,
                        },
                    )),
                    _ => None,
                };
            };

            let mut pending_submission_id = None;
            for completion in completions
                .iter()
                .filter(|c| c.is_for_occurrence(&task.id, kid_id, due))
            {
                match completion.status {
                    CompletionStatus::Approved => return None,
                    CompletionStatus::PendingApproval => {
                        pending_submission_id = Some(completion.id.clone())
                    }
                    CompletionStatus::Rejected => {}
                }
            }

            let visible = match period {
                TaskViewPeriod::AllUpcoming => true,
                TaskViewPeriod::Today => {
                    let starts_today = task.recurrence_type.is_recurring()
                        && task.start_date == Some(today);
                    due <= today || starts_today
                }
                TaskViewPeriod::Week => due <= week_end,
            };
            if !visible {
                return None;
            }

            Some((
                due,
                KidTaskEntry {
                    task: task.clone(),
                    due_date: Some(due),
                    due_status: due_status(Some(due), today),
                    pending_submission_id,
                },
            ))
        })
        .collect();

    entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.task.name.cmp(&b.1.task.name)));
    entries.into_iter().map(|(_, entry)| entry).collect()
}
