use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::schedule::ScheduleError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Store(StoreError::MedicationNotFound(_)) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Store(e) if e.is_constraint_violation() => {
                if let StoreError::Database(sqlx_err) = e {
                    if let Some(db_err) = sqlx_err.as_database_error() {
                        tracing::error!("❌ DB write failed: {}", db_err.message());
                        if let Some(code) = db_err.code() {
                            tracing::info!("ℹ️ SQLSTATE code: {}", code);
                        }
                        if let Some(constraint) = db_err.constraint() {
                            tracing::info!("🔒 Constraint violated: {}", constraint);
                        }
                    }
                }
                (StatusCode::UNPROCESSABLE_ENTITY, "Constraint violated".to_string())
            }
            Self::Store(e) => {
                tracing::error!("❌ DB error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "DB error".to_string())
            }
            Self::Schedule(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
