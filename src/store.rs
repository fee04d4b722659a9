//! Access to the host application's tables.
//!
//! The tables are owned and migrated elsewhere. Their ids are `varchar`
//! columns holding UUID text and their timestamps carry no time zone, so ids
//! are bound as strings and cast back with `::uuid`, and dates are cast with
//! `::date`.

use std::future::Future;

use chrono::NaiveDate;
use sqlx::error::ErrorKind;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::cycle::DEFAULT_CYCLE_LENGTH;
use crate::models::{
    CycleRecord, JournalEntry, Medication, MedicationLog, NewCycle, NewJournalEntry,
    NewMedicationLog, StoredCycle, Upsert,
};

const DEFAULT_CYCLE_LENGTH_COLUMN: i32 = DEFAULT_CYCLE_LENGTH as i32;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("medication {0} not found")]
    MedicationNotFound(Uuid),
}

impl StoreError {
    /// Whether the database rejected the write because of a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Database(e) => e
                .as_database_error()
                .is_some_and(|db| !matches!(db.kind(), ErrorKind::Other)),
            Self::MedicationNotFound(_) => false,
        }
    }
}

pub trait HealthStore: Clone + Send + Sync + 'static {
    /// Most recent cycle record by period start date.
    fn latest_cycle(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<CycleRecord>, StoreError>> + Send;

    /// Cycle length defaults to 28 when not given.
    fn create_cycle(
        &self,
        cycle: &NewCycle,
    ) -> impl Future<Output = Result<StoredCycle, StoreError>> + Send;

    /// Active medications in creation order.
    fn active_medications(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Medication>, StoreError>> + Send;

    /// Logs dated within `[from, to]`, oldest first.
    fn medication_logs(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = Result<Vec<MedicationLog>, StoreError>> + Send;

    /// Updates the first log for the medication on that day, or inserts one.
    fn upsert_medication_log(
        &self,
        log: &NewMedicationLog,
    ) -> impl Future<Output = Result<Upsert<MedicationLog>, StoreError>> + Send;

    /// Newest first.
    fn journal_entries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<JournalEntry>, StoreError>> + Send;

    fn journal_entry_on(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<JournalEntry>, StoreError>> + Send;

    /// Updates the first entry on that day, or inserts one.
    fn upsert_journal_entry(
        &self,
        entry: &NewJournalEntry,
        cycle_day: Option<i32>,
    ) -> impl Future<Output = Result<Upsert<JournalEntry>, StoreError>> + Send;
}

const CYCLE_COLUMNS: &str = "id::uuid AS id, period_start_date::date AS period_start_date, \
     cycle_length, period_end_date::date AS period_end_date, notes";

const MEDICATION_COLUMNS: &str = "id::uuid AS id, user_id::uuid AS user_id, name, brand, \
     strength, dosage, frequency, time_of_day, category, created_at";

const LOG_COLUMNS: &str = "id::uuid AS id, medication_id::uuid AS medication_id, \
     date::date AS date, COALESCE(taken, FALSE) AS taken, \
     COALESCE(skipped, FALSE) AS skipped, skip_reason, notes";

const JOURNAL_COLUMNS: &str = "id::uuid AS id, date::date AS date, mood, \
     COALESCE(symptoms, '[]'::jsonb) AS symptoms, notes, cycle_day";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl HealthStore for PgStore {
    async fn latest_cycle(&self, user_id: Uuid) -> Result<Option<CycleRecord>, StoreError> {
        let cycle = sqlx::query_as::<_, CycleRecord>(
            "SELECT period_start_date::date AS period_start_date, cycle_length
             FROM cycle_tracking
             WHERE user_id = $1
             ORDER BY cycle_tracking.period_start_date DESC
             LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(cycle)
    }

    async fn create_cycle(&self, cycle: &NewCycle) -> Result<StoredCycle, StoreError> {
        let sql = format!(
            "INSERT INTO cycle_tracking
                 (id, user_id, period_start_date, period_end_date, cycle_length, notes)
             VALUES ($1, $2, $3::date::timestamp, $4::date::timestamp, COALESCE($5, $6), $7)
             RETURNING {CYCLE_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, StoredCycle>(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(cycle.user_id.to_string())
            .bind(cycle.period_start_date)
            .bind(cycle.period_end_date)
            .bind(cycle.cycle_length)
            .bind(DEFAULT_CYCLE_LENGTH_COLUMN)
            .bind(&cycle.notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(stored)
    }

    async fn active_medications(&self, user_id: Uuid) -> Result<Vec<Medication>, StoreError> {
        let sql = format!(
            "SELECT {MEDICATION_COLUMNS}
             FROM medications
             WHERE user_id = $1 AND is_active = TRUE
             ORDER BY created_at ASC NULLS LAST"
        );
        let meds = sqlx::query_as::<_, Medication>(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        Ok(meds)
    }

    async fn medication_logs(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MedicationLog>, StoreError> {
        let sql = format!(
            "SELECT {LOG_COLUMNS}
             FROM medication_logs
             WHERE user_id = $1 AND medication_logs.date::date BETWEEN $2 AND $3
             ORDER BY medication_logs.date ASC, medication_logs.id ASC"
        );
        let logs = sqlx::query_as::<_, MedicationLog>(&sql)
            .bind(user_id.to_string())
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(logs)
    }

    async fn upsert_medication_log(
        &self,
        log: &NewMedicationLog,
    ) -> Result<Upsert<MedicationLog>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM medications WHERE id = $1 AND user_id = $2")
                .bind(log.medication_id.to_string())
                .bind(log.user_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Err(StoreError::MedicationNotFound(log.medication_id));
        }

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM medication_logs
             WHERE user_id = $1 AND medication_id = $2 AND date::date = $3
             ORDER BY date ASC, id ASC
             LIMIT 1
             FOR UPDATE",
        )
        .bind(log.user_id.to_string())
        .bind(log.medication_id.to_string())
        .bind(log.date)
        .fetch_optional(&mut *tx)
        .await?;

        let saved = match existing {
            Some(id) => {
                let sql = format!(
                    "UPDATE medication_logs
                     SET taken = $2, skipped = $3, skip_reason = $4, notes = COALESCE($5, notes)
                     WHERE id = $1
                     RETURNING {LOG_COLUMNS}"
                );
                let row = sqlx::query_as::<_, MedicationLog>(&sql)
                    .bind(id)
                    .bind(log.taken)
                    .bind(log.skipped)
                    .bind(&log.skip_reason)
                    .bind(&log.notes)
                    .fetch_one(&mut *tx)
                    .await?;
                Upsert::Updated(row)
            }
            None => {
                let sql = format!(
                    "INSERT INTO medication_logs
                         (id, user_id, medication_id, date, taken, skipped, skip_reason, notes)
                     VALUES ($1, $2, $3, $4::date::timestamp, $5, $6, $7, $8)
                     RETURNING {LOG_COLUMNS}"
                );
                let row = sqlx::query_as::<_, MedicationLog>(&sql)
                    .bind(Uuid::new_v4().to_string())
                    .bind(log.user_id.to_string())
                    .bind(log.medication_id.to_string())
                    .bind(log.date)
                    .bind(log.taken)
                    .bind(log.skipped)
                    .bind(&log.skip_reason)
                    .bind(&log.notes)
                    .fetch_one(&mut *tx)
                    .await?;
                Upsert::Created(row)
            }
        };

        tx.commit().await?;
        Ok(saved)
    }

    async fn journal_entries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let sql = format!(
            "SELECT {JOURNAL_COLUMNS}
             FROM journal_entries
             WHERE user_id = $1
             ORDER BY journal_entries.date DESC
             LIMIT $2"
        );
        let entries = sqlx::query_as::<_, JournalEntry>(&sql)
            .bind(user_id.to_string())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn journal_entry_on(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<JournalEntry>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let entry = first_journal_entry_on(&mut tx, user_id, date, false).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn upsert_journal_entry(
        &self,
        entry: &NewJournalEntry,
        cycle_day: Option<i32>,
    ) -> Result<Upsert<JournalEntry>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let saved = match first_journal_entry_on(&mut tx, entry.user_id, entry.date, true).await? {
            Some(existing) => {
                let sql = format!(
                    "UPDATE journal_entries
                     SET mood = $2, symptoms = $3, notes = $4, cycle_day = $5
                     WHERE id = $1
                     RETURNING {JOURNAL_COLUMNS}"
                );
                let row = sqlx::query_as::<_, JournalEntry>(&sql)
                    .bind(existing.id.to_string())
                    .bind(&entry.mood)
                    .bind(Json(&entry.symptoms))
                    .bind(&entry.notes)
                    .bind(cycle_day)
                    .fetch_one(&mut *tx)
                    .await?;
                Upsert::Updated(row)
            }
            None => {
                let sql = format!(
                    "INSERT INTO journal_entries (id, user_id, date, mood, symptoms, notes, cycle_day)
                     VALUES ($1, $2, $3::date::timestamp, $4, $5, $6, $7)
                     RETURNING {JOURNAL_COLUMNS}"
                );
                let row = sqlx::query_as::<_, JournalEntry>(&sql)
                    .bind(Uuid::new_v4().to_string())
                    .bind(entry.user_id.to_string())
                    .bind(entry.date)
                    .bind(&entry.mood)
                    .bind(Json(&entry.symptoms))
                    .bind(&entry.notes)
                    .bind(cycle_day)
                    .fetch_one(&mut *tx)
                    .await?;
                Upsert::Created(row)
            }
        };

        tx.commit().await?;
        Ok(saved)
    }
}

async fn first_journal_entry_on(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    date: NaiveDate,
    lock: bool,
) -> Result<Option<JournalEntry>, StoreError> {
    let sql = format!(
        "SELECT {JOURNAL_COLUMNS}
         FROM journal_entries
         WHERE user_id = $1 AND journal_entries.date::date = $2
         ORDER BY journal_entries.date ASC, journal_entries.id ASC
         LIMIT 1{}",
        if lock { " FOR UPDATE" } else { "" }
    );
    let entry = sqlx::query_as::<_, JournalEntry>(&sql)
        .bind(user_id.to_string())
        .bind(date)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(entry)
}
