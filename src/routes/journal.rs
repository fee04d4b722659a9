use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;

use crate::cycle::cycle_day_for;
use crate::error::AppError;
use crate::models::{JournalEntry, JournalListQuery, NewJournalEntry, UserQuery};
use crate::store::HealthStore;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

pub fn routes<S: HealthStore>(store: S) -> Router {
    Router::new()
        .route("/journal-entries", get(list_entries::<S>).post(save_entry::<S>))
        .route("/journal-entries/date/:date", get(get_entry_on::<S>))
        .with_state(store)
}

async fn list_entries<S: HealthStore>(
    State(store): State<S>,
    Query(params): Query<JournalListQuery>,
) -> Result<Json<Vec<JournalEntry>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!("limit must be between 1 and {MAX_LIMIT}")));
    }

    let entries = store.journal_entries(params.user_id, limit).await?;
    Ok(Json(entries))
}

/// `null` rather than 404 when the day has no entry.
async fn get_entry_on<S: HealthStore>(
    State(store): State<S>,
    Path(date): Path<NaiveDate>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Option<JournalEntry>>, AppError> {
    let entry = store.journal_entry_on(params.user_id, date).await?;
    Ok(Json(entry))
}

/// Saves the entry for its day, stamping the cycle day from the latest cycle.
async fn save_entry<S: HealthStore>(
    State(store): State<S>,
    Json(body): Json<NewJournalEntry>,
) -> Result<(StatusCode, Json<JournalEntry>), AppError> {
    let cycle = store.latest_cycle(body.user_id).await?;
    let cycle_day = cycle_day_for(&body.date, cycle.as_ref()).and_then(|d| i32::try_from(d).ok());

    let saved = store.upsert_journal_entry(&body, cycle_day).await?;
    let status = if saved.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(saved.into_inner())))
}
