//! Recurring due-date calculator.
//!
//! Works on calendar days only: `NaiveDate` carries no time of day, and
//! [`parse_day`] strips any time component at the boundary.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime};
use shared::{DayOfWeek, RecurrenceType};

use super::error::ValidationError;
use super::models::Task;

/// Upper bound on weeks scanned for a weekly task
const MAX_WEEKLY_ITERATIONS: u32 = 14;
/// Upper bound on months scanned for a monthly task
const MAX_MONTHLY_ITERATIONS: u32 = 48;

/// Parse a calendar day from `YYYY-MM-DD`, an RFC 3339 timestamp or a naive
/// `YYYY-MM-DDTHH:MM:SS` timestamp. Time of day is discarded.
pub fn parse_day(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(timestamp.date());
    }
    Err(ValidationError::InvalidDate(trimmed.to_string()))
}

pub fn parse_optional_day(input: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => parse_day(value).map(Some),
        None => Ok(None),
    }
}

/// Due date of the next occurrence on or after `max(as_of, start_date)`.
///
/// One-off (`none`, `immediately`) tasks return their fixed due date.
/// Recurring tasks return `None` when they cannot be scheduled: no start date,
/// a weekly task with no weekdays, or no match within the search bound.
/// A cached `next_due_date` that is already on or after the floor is used as
/// the starting candidate.
pub fn compute_next_due_date(task: &Task, as_of: NaiveDate) -> Option<NaiveDate> {
    match task.recurrence_type {
        RecurrenceType::None | RecurrenceType::Immediately => task.custom_due_date,
        RecurrenceType::Daily | RecurrenceType::Weekly | RecurrenceType::Monthly => {
            let start = task.start_date?;
            let floor = as_of.max(start);
            let candidate = match task.next_due_date {
                Some(cached) if cached >= floor => cached,
                _ => floor,
            };

            match task.recurrence_type {
                RecurrenceType::Daily => Some(candidate),
                RecurrenceType::Weekly => next_selected_weekday(&task.days_of_week, candidate),
                _ => next_day_of_month(start.day(), candidate),
            }
        }
    }
}

/// Due date of the occurrence a kid would submit right now
pub fn current_occurrence(task: &Task) -> Option<NaiveDate> {
    if task.recurrence_type.is_recurring() {
        task.next_due_date
            .or_else(|| task.start_date.and_then(|start| compute_next_due_date(task, start)))
    } else {
        task.custom_due_date
    }
}

fn next_selected_weekday(days: &[DayOfWeek], from: NaiveDate) -> Option<NaiveDate> {
    if days.is_empty() {
        return None;
    }

    let mut week_start = from;
    for _ in 0..MAX_WEEKLY_ITERATIONS {
        for offset in 0..7 {
            let day = week_start.checked_add_days(Days::new(offset))?;
            let index = day.weekday().num_days_from_sunday();
            if days.iter().any(|d| d.index() == index) {
                return Some(day);
            }
        }
        week_start = week_start.checked_add_days(Days::new(7))?;
    }
    None
}

/// First date on or after `from` whose day of month is `target_day`.
/// Months without that day are skipped rather than clamped to month end.
fn next_day_of_month(target_day: u32, from: NaiveDate) -> Option<NaiveDate> {
    let mut month_start = from.with_day(1)?;
    for _ in 0..MAX_MONTHLY_ITERATIONS {
        if let Some(date) = month_start.with_day(target_day) {
            if date >= from {
                return Some(date);
            }
        }
        month_start = month_start.checked_add_months(Months::new(1))?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(recurrence_type: RecurrenceType, start: Option<NaiveDate>) -> Task {
        Task {
            id: "task-1".to_string(),
            family_id: "fam".to_string(),
            name: "Feed the cat".to_string(),
            points: 5,
            recurrence_type,
            days_of_week: Vec::new(),
            start_date: start,
            custom_due_date: None,
            next_due_date: None,
            assigned_kid_id: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_day_strips_time() {
        assert_eq!(parse_day("2024-03-05").unwrap(), date(2024, 3, 5));
        assert_eq!(parse_day("2024-03-05T23:59:59Z").unwrap(), date(2024, 3, 5));
        assert_eq!(parse_day("2024-03-05T08:00:00+02:00").unwrap(), date(2024, 3, 5));
        assert_eq!(parse_day("2024-03-05T10:30:00").unwrap(), date(2024, 3, 5));
        assert!(parse_day("05/03/2024").is_err());
        assert_eq!(parse_optional_day(Some(" ")).unwrap(), None);
    }

    #[test]
    fn test_one_off_tasks_return_custom_due_date() {
        let mut t = task(RecurrenceType::None, Some(date(2024, 1, 1)));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 10)), None);

        t.custom_due_date = Some(date(2024, 1, 5));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 10)), Some(date(2024, 1, 5)));

        t.recurrence_type = RecurrenceType::Immediately;
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 1)), Some(date(2024, 1, 5)));
    }

    #[test]
    fn test_recurring_without_start_date_is_unschedulable() {
        let t = task(RecurrenceType::Daily, None);
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 1)), None);
    }

    #[test]
    fn test_daily_never_before_start_or_as_of() {
        let t = task(RecurrenceType::Daily, Some(date(2024, 1, 8)));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 1)), Some(date(2024, 1, 8)));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 9)), Some(date(2024, 1, 9)));
    }

    #[test]
    fn test_daily_prefers_cached_date_when_still_valid() {
        let mut t = task(RecurrenceType::Daily, Some(date(2024, 1, 1)));
        t.next_due_date = Some(date(2024, 1, 12));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 10)), Some(date(2024, 1, 12)));

        // stale cache is ignored
        t.next_due_date = Some(date(2024, 1, 3));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 10)), Some(date(2024, 1, 10)));
    }

    #[test]
    fn test_weekly_mon_wed() {
        // 2024-01-08 is a Monday
        let mut t = task(RecurrenceType::Weekly, Some(date(2024, 1, 8)));
        t.days_of_week = vec![DayOfWeek::Mon, DayOfWeek::Wed];

        assert_eq!(compute_next_due_date(&t, date(2024, 1, 8)), Some(date(2024, 1, 8)));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 9)), Some(date(2024, 1, 10)));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 11)), Some(date(2024, 1, 15)));
        // before start: first selected day on or after start
        assert_eq!(compute_next_due_date(&t, date(2023, 12, 1)), Some(date(2024, 1, 8)));
    }

    #[test]
    fn test_weekly_with_no_days_is_unschedulable() {
        let t = task(RecurrenceType::Weekly, Some(date(2024, 1, 8)));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 8)), None);
    }

    #[test]
    fn test_monthly_skips_months_without_target_day() {
        let t = task(RecurrenceType::Monthly, Some(date(2024, 1, 31)));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 31)), Some(date(2024, 1, 31)));
        assert_eq!(compute_next_due_date(&t, date(2024, 2, 1)), Some(date(2024, 3, 31)));
        assert_eq!(compute_next_due_date(&t, date(2024, 4, 1)), Some(date(2024, 5, 31)));
    }

    #[test]
    fn test_monthly_regular_day() {
        let t = task(RecurrenceType::Monthly, Some(date(2024, 1, 15)));
        assert_eq!(compute_next_due_date(&t, date(2024, 1, 16)), Some(date(2024, 2, 15)));
        assert_eq!(compute_next_due_date(&t, date(2024, 12, 20)), Some(date(2025, 1, 15)));
    }

    #[test]
    fn test_result_is_at_least_floor_and_idempotent() {
        let start = date(2024, 2, 29);
        let mut weekly = task(RecurrenceType::Weekly, Some(start));
        weekly.days_of_week = vec![DayOfWeek::Sat];
        let kinds = [
            task(RecurrenceType::Daily, Some(start)),
            weekly,
            task(RecurrenceType::Monthly, Some(start)),
        ];

        let mut as_of = date(2024, 1, 1);
        while as_of < date(2025, 1, 1) {
            for t in &kinds {
                let first = compute_next_due_date(t, as_of).unwrap();
                assert!(first >= as_of.max(start));
                assert_eq!(compute_next_due_date(t, as_of), Some(first));
            }
            as_of = as_of.checked_add_days(Days::new(5)).unwrap();
        }
    }

    #[test]
    fn test_current_occurrence() {
        let mut t = task(RecurrenceType::Daily, Some(date(2024, 1, 8)));
        assert_eq!(current_occurrence(&t), Some(date(2024, 1, 8)));
        t.next_due_date = Some(date(2024, 1, 11));
        assert_eq!(current_occurrence(&t), Some(date(2024, 1, 11)));

        let mut one_off = task(RecurrenceType::None, None);
        assert_eq!(current_occurrence(&one_off), None);
        one_off.custom_due_date = Some(date(2024, 2, 1));
        assert_eq!(current_occurrence(&one_off), Some(date(2024, 2, 1)));
    }
}
