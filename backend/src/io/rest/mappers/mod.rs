pub mod family_mapper;
pub mod kid_mapper;
pub mod reward_mapper;
pub mod task_mapper;

use chrono::{DateTime, NaiveDate, Utc};

pub use family_mapper::FamilyMapper;
pub use kid_mapper::KidMapper;
pub use reward_mapper::RewardMapper;
pub use task_mapper::TaskMapper;

/// Calendar dates travel as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}
