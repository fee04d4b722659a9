//! Daily and monthly medication schedules built on top of the cycle calculator.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::cycle::{cycle_day_for, phase_for, should_take, CyclePhase, CycleStatus, Frequency};
use crate::models::{CycleRecord, Medication, MedicationLog};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid month {0}, expected 1-12")]
    InvalidMonth(u32),
    #[error("year {0} is out of range")]
    InvalidYear(i32),
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledMedication {
    pub medication: Medication,
    /// Due only on part of the cycle.
    pub cycle_sensitive: bool,
    pub taken: bool,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySchedule {
    pub date: NaiveDate,
    pub cycle: CycleStatus,
    pub medications: Vec<ScheduledMedication>,
    pub taken: usize,
    pub remaining: usize,
}

impl DailySchedule {
    /// Medications due on `date`, each paired with its log for that day.
    ///
    /// Logs dated on other days are ignored. When a medication has several logs
    /// for the day, the first one in `logs` counts.
    pub fn build(
        date: NaiveDate,
        cycle: Option<&CycleRecord>,
        medications: Vec<Medication>,
        logs: &[MedicationLog],
    ) -> Self {
        let status = CycleStatus::for_date(&date, cycle);

        let mut logs_today: HashMap<Uuid, &MedicationLog> = HashMap::new();
        for log in logs.iter().filter(|log| log.date == date) {
            logs_today.entry(log.medication_id).or_insert(log);
        }

        let scheduled: Vec<ScheduledMedication> = medications
            .into_iter()
            .filter(|med| should_take(&med.frequency, status.cycle_day))
            .map(|medication| {
                let log = logs_today.get(&medication.id);
                ScheduledMedication {
                    cycle_sensitive: Frequency::parse(&medication.frequency).is_cycle_sensitive(),
                    taken: log.is_some_and(|l| l.taken),
                    skipped: log.is_some_and(|l| l.skipped),
                    skip_reason: log.and_then(|l| l.skip_reason.clone()),
                    medication,
                }
            })
            .collect();

        let taken = scheduled.iter().filter(|s| s.taken).count();
        let remaining = scheduled.len().saturating_sub(taken);

        Self {
            date,
            cycle: status,
            medications: scheduled,
            taken,
            remaining,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub cycle_day: Option<u32>,
    pub phase: Option<CyclePhase>,
    pub due_medications: usize,
    pub any_taken: bool,
    pub any_skipped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

impl CalendarMonth {
    pub fn build(
        year: i32,
        month: u32,
        cycle: Option<&CycleRecord>,
        medications: &[Medication],
        logs: &[MedicationLog],
    ) -> Result<Self, ScheduleError> {
        let (first, last) = month_bounds(year, month)?;

        let mut logs_by_day: HashMap<NaiveDate, Vec<&MedicationLog>> = HashMap::new();
        for log in logs {
            logs_by_day.entry(log.date).or_default().push(log);
        }

        let days = first
            .iter_days()
            .take_while(|d| *d <= last)
            .map(|date| {
                let cycle_day = cycle_day_for(&date, cycle);
                let day_logs = logs_by_day.get(&date).map(Vec::as_slice).unwrap_or_default();
                CalendarDay {
                    date,
                    cycle_day,
                    phase: phase_for(cycle_day),
                    due_medications: medications
                        .iter()
                        .filter(|m| should_take(&m.frequency, cycle_day))
                        .count(),
                    any_taken: day_logs.iter().any(|l| l.taken),
                    any_skipped: day_logs.iter().any(|l| l.skipped),
                }
            })
            .collect();

        Ok(Self { year, month, days })
    }
}

/// First and last calendar date of a month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ScheduleError> {
    if !(1..=12).contains(&month) {
        return Err(ScheduleError::InvalidMonth(month));
    }

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(ScheduleError::InvalidYear(year))?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(ScheduleError::InvalidYear(year))?;
    let last = next_first.pred_opt().ok_or(ScheduleError::InvalidYear(year))?;

    debug_assert_eq!(last.month(), month);
    Ok((first, last))
}
