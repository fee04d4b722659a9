use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::cycle::CycleStatus;
use crate::error::AppError;
use crate::models::{CycleRecord, NewCycle, StoredCycle, UserDateQuery};
use crate::store::HealthStore;

use super::reference_date;

#[derive(Debug, Serialize)]
pub struct CurrentCycleResponse {
    pub cycle: Option<CycleRecord>,
    pub status: CycleStatus,
}

pub fn routes<S: HealthStore>(store: S) -> Router {
    Router::new()
        .route("/cycle", post(create_cycle::<S>))
        .route("/cycle/current", get(get_current_cycle::<S>))
        .with_state(store)
}

async fn create_cycle<S: HealthStore>(
    State(store): State<S>,
    Json(body): Json<NewCycle>,
) -> Result<(StatusCode, Json<StoredCycle>), AppError> {
    if body.cycle_length.is_some_and(|len| len <= 0) {
        return Err(AppError::BadRequest("cycle_length must be positive".into()));
    }
    if body.period_end_date.is_some_and(|end| end < body.period_start_date) {
        return Err(AppError::BadRequest(
            "period_end_date is before period_start_date".into(),
        ));
    }

    let cycle = store.create_cycle(&body).await?;
    tracing::info!(user_id = %body.user_id, start = %cycle.record.period_start_date, "🩸 cycle recorded");

    Ok((StatusCode::CREATED, Json(cycle)))
}

async fn get_current_cycle<S: HealthStore>(
    State(store): State<S>,
    Query(params): Query<UserDateQuery>,
) -> Result<Json<CurrentCycleResponse>, AppError> {
    let date = reference_date(params.date);
    let cycle = store.latest_cycle(params.user_id).await?;
    let status = CycleStatus::for_date(&date, cycle.as_ref());

    Ok(Json(CurrentCycleResponse { cycle, status }))
}
