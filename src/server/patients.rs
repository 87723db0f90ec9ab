use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::{error_response, run_blocking, ServerState};
use crate::db::models::CreatePatientInput;
use crate::db::repos::patients as repo;
use crate::error::AppError;

/// GET /api/patients
pub async fn list(State(state): State<Arc<ServerState>>) -> Response {
    let pool = state.pool.clone();
    match run_blocking(move || repo::get_all(&pool)).await {
        Ok(patients) => Json(patients).into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch patients: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch patients")
        }
    }
}

/// GET /api/patients/{id}
pub async fn get_one(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Response {
    let pool = state.pool.clone();
    match run_blocking(move || repo::get_by_id(&pool, &id)).await {
        Ok(patient) => Json(patient).into_response(),
        Err(AppError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "Patient not found"),
        Err(e) => {
            tracing::error!("Failed to fetch patient: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch patient")
        }
    }
}

/// POST /api/patients
pub async fn create(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<CreatePatientInput>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let pool = state.pool.clone();
    match run_blocking(move || repo::create(&pool, input)).await {
        Ok(patient) => {
            tracing::info!(patient_id = %patient.id, "Patient created");
            (StatusCode::CREATED, Json(patient)).into_response()
        }
        Err(e @ AppError::Validation(_)) => e.into_response(),
        Err(e) => {
            tracing::error!("Failed to create patient: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create patient")
        }
    }
}
