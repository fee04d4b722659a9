use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Most recently recorded period start for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CycleRecord {
    pub period_start_date: NaiveDate,
    pub cycle_length: Option<i32>,
}

/// A row of `cycle_tracking` as returned after an insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StoredCycle {
    pub id: Uuid,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: CycleRecord,
    pub period_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewCycle {
    pub user_id: Uuid,
    pub period_start_date: NaiveDate,
    pub period_end_date: Option<NaiveDate>,
    pub cycle_length: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub strength: String,
    pub dosage: String,
    pub frequency: String,
    pub time_of_day: Option<String>,
    pub category: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

/// One adherence record. `date` is the calendar day the log applies to.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MedicationLog {
    pub id: Uuid,
    pub medication_id: Uuid,
    pub date: NaiveDate,
    pub taken: bool,
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub notes: Option<String>,
}

/// Taken/skipped state for one medication on one day.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMedicationLog {
    pub user_id: Uuid,
    pub medication_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub taken: bool,
    #[serde(default)]
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub mood: Option<String>,
    pub symptoms: Json<Vec<String>>,
    pub notes: Option<String>,
    pub cycle_day: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJournalEntry {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub mood: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub notes: Option<String>,
}

/// Result of a write that updates the row for a day if one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert<T> {
    Created(T),
    Updated(T),
}

impl<T> Upsert<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Created(v) | Self::Updated(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UserDateQuery {
    pub user_id: Uuid,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub user_id: Uuid,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct JournalListQuery {
    pub user_id: Uuid,
    pub limit: Option<i64>,
}
