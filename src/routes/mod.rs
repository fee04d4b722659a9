pub mod cycle;
pub mod journal;
pub mod medication_logs;
pub mod schedule;

use chrono::{NaiveDate, Utc};

/// The requested date, or today's UTC date when none was given.
pub(crate) fn reference_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Utc::now().date_naive())
}
