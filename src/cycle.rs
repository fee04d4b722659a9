//! Cycle day, phase and medication applicability.
//!
//! Everything here is a pure function of its arguments. The reference date is
//! always passed in; nothing in this module reads the clock.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::models::CycleRecord;

pub const DEFAULT_CYCLE_LENGTH: u32 = 28;

const MENSTRUAL_LAST_DAY: u32 = 5;
const FOLLICULAR_LAST_DAY: u32 = 13;
const OVULATION_LAST_DAY: u32 = 15;

pub const NO_CYCLE_LABEL: &str = "Track your cycle to see phase info";

/// Anything that falls on a calendar date.
///
/// Day differences are taken between calendar dates, so the time of day of a
/// timestamp never moves the cycle day.
pub trait CalendarDate {
    fn calendar_date(&self) -> NaiveDate;
}

impl CalendarDate for NaiveDate {
    fn calendar_date(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDate for NaiveDateTime {
    fn calendar_date(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDate for DateTime<Tz> {
    fn calendar_date(&self) -> NaiveDate {
        self.date_naive()
    }
}

impl CycleRecord {
    /// Recorded cycle length, falling back to 28 when absent or non-positive.
    pub fn effective_cycle_length(&self) -> u32 {
        self.cycle_length
            .and_then(|len| u32::try_from(len).ok())
            .filter(|len| *len > 0)
            .unwrap_or(DEFAULT_CYCLE_LENGTH)
    }
}

/// 1-based day within the cycle for `reference`, or `None` when no cycle is
/// tracked or `reference` falls before the recorded start.
pub fn cycle_day_for<D: CalendarDate>(reference: &D, record: Option<&CycleRecord>) -> Option<u32> {
    let record = record?;
    let days_since_start = (reference.calendar_date() - record.period_start_date).num_days();
    if days_since_start < 0 {
        return None;
    }

    let cycle_length = i64::from(record.effective_cycle_length());
    u32::try_from(days_since_start % cycle_length + 1).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl CyclePhase {
    /// Fixed day cutoffs. They do not scale with the recorded cycle length.
    pub fn from_cycle_day(day: u32) -> Self {
        if day <= MENSTRUAL_LAST_DAY {
            Self::Menstrual
        } else if day <= FOLLICULAR_LAST_DAY {
            Self::Follicular
        } else if day <= OVULATION_LAST_DAY {
            Self::Ovulation
        } else {
            Self::Luteal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Menstrual => "Menstrual",
            Self::Follicular => "Follicular",
            Self::Ovulation => "Ovulation",
            Self::Luteal => "Luteal",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn phase_for(cycle_day: Option<u32>) -> Option<CyclePhase> {
    cycle_day.map(CyclePhase::from_cycle_day)
}

pub fn phase_label(cycle_day: Option<u32>) -> String {
    match cycle_day {
        Some(day) => format!("{} Phase - Day {}", CyclePhase::from_cycle_day(day), day),
        None => NO_CYCLE_LABEL.to_string(),
    }
}

/// How often a medication is meant to be taken.
///
/// Unknown tags are kept verbatim in `Other` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    EveryOtherDay,
    Weekly,
    AsNeeded,
    CycleDays1To14,
    CycleDays15To28,
    DuringPeriod,
    Custom,
    Other(String),
}

impl Frequency {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "daily" => Self::Daily,
            "every-other-day" => Self::EveryOtherDay,
            "weekly" => Self::Weekly,
            "as-needed" => Self::AsNeeded,
            "cycle-days-1-14" => Self::CycleDays1To14,
            "cycle-days-15-28" => Self::CycleDays15To28,
            "during-period" => Self::DuringPeriod,
            "custom" => Self::Custom,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_cycle_sensitive(&self) -> bool {
        matches!(
            self,
            Self::CycleDays1To14 | Self::CycleDays15To28 | Self::DuringPeriod
        )
    }

    /// Whether a dose is due on a day with the given cycle day.
    ///
    /// `every-other-day` and `weekly` are not checked against elapsed time and
    /// are always due, same as `daily`.
    pub fn is_due(&self, cycle_day: Option<u32>) -> bool {
        let Some(day) = cycle_day else {
            return true;
        };

        match self {
            Self::CycleDays1To14 => day <= 14,
            Self::CycleDays15To28 => day > 14,
            Self::DuringPeriod => day <= MENSTRUAL_LAST_DAY,
            _ => true,
        }
    }
}

pub fn should_take(frequency: &str, cycle_day: Option<u32>) -> bool {
    Frequency::parse(frequency).is_due(cycle_day)
}

/// Cycle day, phase and display label for one reference date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleStatus {
    pub cycle_day: Option<u32>,
    pub phase: Option<CyclePhase>,
    pub label: String,
}

impl CycleStatus {
    pub fn for_date<D: CalendarDate>(reference: &D, record: Option<&CycleRecord>) -> Self {
        let cycle_day = cycle_day_for(reference, record);
        Self {
            cycle_day,
            phase: phase_for(cycle_day),
            label: phase_label(cycle_day),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime, Utc};

    const ALL_TAGS: [&str; 9] = [
        "daily",
        "every-other-day",
        "weekly",
        "as-needed",
        "cycle-days-1-14",
        "cycle-days-15-28",
        "during-period",
        "custom",
        "unknown-tag",
    ];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(start: NaiveDate, cycle_length: Option<i32>) -> CycleRecord {
        CycleRecord {
            period_start_date: start,
            cycle_length,
        }
    }

    #[test]
    fn start_date_is_day_one() {
        let start = date(2024, 3, 1);
        assert_eq!(cycle_day_for(&start, Some(&record(start, Some(28)))), Some(1));
    }

    #[test]
    fn day_wraps_at_cycle_length() {
        let start = date(2024, 3, 1);
        let rec = record(start, Some(28));
        assert_eq!(cycle_day_for(&(start + Duration::days(27)), Some(&rec)), Some(28));
        assert_eq!(cycle_day_for(&(start + Duration::days(28)), Some(&rec)), Some(1));
        assert_eq!(cycle_day_for(&(start + Duration::days(60)), Some(&rec)), Some(5));
    }

    #[test]
    fn missing_record_has_no_day() {
        assert_eq!(cycle_day_for(&date(2024, 3, 1), None), None);
    }

    #[test]
    fn reference_before_start_has_no_day() {
        let rec = record(date(2024, 3, 10), Some(28));
        assert_eq!(cycle_day_for(&date(2024, 3, 9), Some(&rec)), None);
    }

    #[test]
    fn absent_or_non_positive_length_defaults_to_28() {
        let start = date(2024, 1, 1);
        let reference = start + Duration::days(28);
        for len in [None, Some(0), Some(-3)] {
            let rec = record(start, len);
            assert_eq!(rec.effective_cycle_length(), 28);
            assert_eq!(cycle_day_for(&reference, Some(&rec)), Some(1));
        }
    }

    #[test]
    fn custom_cycle_length_is_respected() {
        let start = date(2024, 1, 1);
        let rec = record(start, Some(35));
        assert_eq!(cycle_day_for(&(start + Duration::days(30)), Some(&rec)), Some(31));
        assert_eq!(cycle_day_for(&(start + Duration::days(35)), Some(&rec)), Some(1));
    }

    #[test]
    fn day_stays_within_cycle_length() {
        let start = date(2023, 12, 20);
        for len in 1..=45 {
            let rec = record(start, Some(len));
            for offset in 0..200 {
                let day = cycle_day_for(&(start + Duration::days(offset)), Some(&rec)).unwrap();
                assert!((1..=len as u32).contains(&day), "len={len} offset={offset} day={day}");
            }
        }
    }

    #[test]
    fn repeated_calls_agree() {
        let rec = record(date(2024, 2, 2), Some(30));
        let reference = date(2024, 5, 17);
        let first = cycle_day_for(&reference, Some(&rec));
        for _ in 0..10 {
            assert_eq!(cycle_day_for(&reference, Some(&rec)), first);
        }
    }

    #[test]
    fn time_of_day_does_not_shift_the_day() {
        let start = date(2024, 4, 1);
        let rec = record(start, Some(28));
        let early = date(2024, 4, 11).and_time(NaiveTime::from_hms_opt(0, 5, 0).unwrap());
        let late = date(2024, 4, 11).and_time(NaiveTime::from_hms_opt(23, 55, 0).unwrap());
        assert_eq!(cycle_day_for(&early, Some(&rec)), Some(11));
        assert_eq!(cycle_day_for(&late, Some(&rec)), Some(11));
        assert_eq!(cycle_day_for(&late.and_utc(), Some(&rec)), Some(11));
    }

    #[test]
    fn phase_boundaries() {
        assert_eq!(phase_for(Some(1)), Some(CyclePhase::Menstrual));
        assert_eq!(phase_for(Some(5)), Some(CyclePhase::Menstrual));
        assert_eq!(phase_for(Some(6)), Some(CyclePhase::Follicular));
        assert_eq!(phase_for(Some(13)), Some(CyclePhase::Follicular));
        assert_eq!(phase_for(Some(14)), Some(CyclePhase::Ovulation));
        assert_eq!(phase_for(Some(15)), Some(CyclePhase::Ovulation));
        assert_eq!(phase_for(Some(16)), Some(CyclePhase::Luteal));
        assert_eq!(phase_for(Some(40)), Some(CyclePhase::Luteal));
        assert_eq!(phase_for(None), None);
    }

    #[test]
    fn labels() {
        assert_eq!(phase_label(Some(11)), "Follicular Phase - Day 11");
        assert_eq!(phase_label(Some(3)), "Menstrual Phase - Day 3");
        assert_eq!(phase_label(None), NO_CYCLE_LABEL);
    }

    #[test]
    fn phase_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CyclePhase::Ovulation).unwrap(),
            "\"ovulation\""
        );
    }

    #[test]
    fn cycle_sensitive_tags() {
        assert!(should_take("cycle-days-1-14", Some(14)));
        assert!(!should_take("cycle-days-1-14", Some(15)));
        assert!(should_take("cycle-days-15-28", Some(15)));
        assert!(!should_take("cycle-days-15-28", Some(14)));
        assert!(should_take("during-period", Some(5)));
        assert!(!should_take("during-period", Some(6)));
    }

    #[test]
    fn other_tags_are_always_due() {
        assert!(should_take("daily", Some(1)));
        assert!(should_take("unknown-tag", Some(20)));
        for tag in ["weekly", "every-other-day", "as-needed", "custom"] {
            for day in 1..=28 {
                assert!(should_take(tag, Some(day)), "{tag} on day {day}");
            }
        }
    }

    #[test]
    fn everything_is_due_without_cycle_data() {
        for tag in ALL_TAGS {
            assert!(should_take(tag, None), "{tag}");
        }
    }

    #[test]
    fn frequency_parsing_keeps_unknown_tags() {
        assert_eq!(Frequency::parse("weekly"), Frequency::Weekly);
        assert_eq!(
            Frequency::parse("twice-daily"),
            Frequency::Other("twice-daily".into())
        );
        assert!(Frequency::parse("during-period").is_cycle_sensitive());
        assert!(!Frequency::parse("daily").is_cycle_sensitive());
    }

    #[test]
    fn cycle_started_ten_days_ago() {
        let today = Utc::now().date_naive();
        let rec = record(today - Duration::days(10), Some(28));

        let day = cycle_day_for(&today, Some(&rec));
        assert_eq!(day, Some(11));
        assert_eq!(phase_for(day), Some(CyclePhase::Follicular));
        assert!(!should_take("during-period", day));
        assert!(should_take("cycle-days-1-14", day));
    }

    #[test]
    fn nothing_tracked() {
        let status = CycleStatus::for_date(&date(2024, 6, 1), None);
        assert_eq!(status.cycle_day, None);
        assert_eq!(status.phase, None);
        assert_eq!(status.label, NO_CYCLE_LABEL);
        for tag in ALL_TAGS {
            assert!(should_take(tag, status.cycle_day));
        }
    }
}
