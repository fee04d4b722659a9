use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::error::AppError;
use crate::models::{MedicationLog, NewMedicationLog, UserDateQuery};
use crate::store::HealthStore;

use super::reference_date;

pub fn routes<S: HealthStore>(store: S) -> Router {
    Router::new()
        .route(
            "/medication-logs",
            get(get_medication_logs::<S>).post(record_medication::<S>),
        )
        .with_state(store)
}

/// Logs for one day, today by default.
async fn get_medication_logs<S: HealthStore>(
    State(store): State<S>,
    Query(params): Query<UserDateQuery>,
) -> Result<Json<Vec<MedicationLog>>, AppError> {
    let date = reference_date(params.date);
    let logs = store.medication_logs(params.user_id, date, date).await?;
    Ok(Json(logs))
}

/// Marks a medication taken or skipped for a day. A second call for the same
/// medication and day overwrites the first.
async fn record_medication<S: HealthStore>(
    State(store): State<S>,
    Json(mut body): Json<NewMedicationLog>,
) -> Result<(StatusCode, Json<MedicationLog>), AppError> {
    if body.taken && body.skipped {
        return Err(AppError::BadRequest(
            "a dose cannot be both taken and skipped".into(),
        ));
    }
    if !body.skipped {
        body.skip_reason = None;
    }

    let saved = store.upsert_medication_log(&body).await?;
    let status = if saved.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let log = saved.into_inner();
    tracing::info!(
        user_id = %body.user_id,
        medication_id = %log.medication_id,
        date = %log.date,
        taken = log.taken,
        skipped = log.skipped,
        "💊 dose recorded"
    );

    Ok((status, Json(log)))
}
