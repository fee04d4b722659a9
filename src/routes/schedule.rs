use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::error::AppError;
use crate::models::{CalendarQuery, UserDateQuery};
use crate::schedule::{month_bounds, CalendarMonth, DailySchedule};
use crate::store::HealthStore;

use super::reference_date;

pub fn routes<S: HealthStore>(store: S) -> Router {
    Router::new()
        .route("/schedule/today", get(get_daily_schedule::<S>))
        .route("/schedule/calendar", get(get_calendar::<S>))
        .with_state(store)
}

async fn get_daily_schedule<S: HealthStore>(
    State(store): State<S>,
    Query(params): Query<UserDateQuery>,
) -> Result<Json<DailySchedule>, AppError> {
    let date = reference_date(params.date);

    let cycle = store.latest_cycle(params.user_id).await?;
    let medications = store.active_medications(params.user_id).await?;
    let logs = store.medication_logs(params.user_id, date, date).await?;

    let schedule = DailySchedule::build(date, cycle.as_ref(), medications, &logs);
    tracing::debug!(
        user_id = %params.user_id,
        %date,
        due = schedule.medications.len(),
        taken = schedule.taken,
        "daily schedule"
    );

    Ok(Json(schedule))
}

async fn get_calendar<S: HealthStore>(
    State(store): State<S>,
    Query(params): Query<CalendarQuery>,
) -> Result<Json<CalendarMonth>, AppError> {
    let (first, last) = month_bounds(params.year, params.month)?;

    let cycle = store.latest_cycle(params.user_id).await?;
    let medications = store.active_medications(params.user_id).await?;
    let logs = store.medication_logs(params.user_id, first, last).await?;

    let month = CalendarMonth::build(params.year, params.month, cycle.as_ref(), &medications, &logs)?;
    Ok(Json(month))
}
