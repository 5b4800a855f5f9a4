use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};

/// Source of "now" and "today" for the services
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;

    /// The household's current calendar day
    fn today(&self) -> NaiveDate;

    /// Calendar day a timestamp falls on, in the household's time zone
    fn date_of(&self, timestamp: DateTime<Utc>) -> NaiveDate;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn date_of(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        timestamp.with_timezone(&Local).date_naive()
    }
}

/// Clock pinned to noon UTC of a given day; calendar days are taken in UTC
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn on(day: NaiveDate) -> Self {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
        Self {
            now: day.and_time(noon).and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    fn date_of(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        timestamp.date_naive()
    }
}
