//! `/api/settings` handlers over the flat key/value store.
//!
//! - `GET`  returns every stored pair as one flat object.
//! - `POST` upserts a flat object of pairs in one transaction.
//! - `PUT`  upserts a single `{ key, value }` pair and echoes the stored row.
//!
//! Values of any JSON type are stringified before they are stored; the
//! original type is not recoverable on read.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::{error_response, run_blocking, ServerState};
use crate::db::repos::settings as repo;
use crate::error::AppError;

const FETCH_FAILED: &str = "Failed to fetch settings";
const SAVE_FAILED: &str = "Failed to save settings";
const UPDATE_FAILED: &str = "Failed to update setting";

/// GET /api/settings
pub async fn read_all(State(state): State<Arc<ServerState>>) -> Response {
    let pool = state.pool.clone();
    match run_blocking(move || repo::get_all(&pool)).await {
        Ok(map) => Json(map).into_response(),
        Err(e) => {
            tracing::error!("{}: {}", FETCH_FAILED, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED)
        }
    }
}

/// POST /api/settings
pub async fn write_many(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let Value::Object(fields) = body else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Settings body must be a JSON object",
        );
    };

    let entries: Vec<(String, String)> = fields
        .into_iter()
        .map(|(key, value)| {
            let value = stringify_value(&value);
            (key, value)
        })
        .collect();
    let count = entries.len();

    let pool = state.pool.clone();
    match run_blocking(move || repo::set_many(&pool, entries)).await {
        Ok(_) => {
            tracing::info!(count, "Settings saved");
            Json(serde_json::json!({ "success": true })).into_response()
        }
        Err(AppError::Validation(msg)) => error_response(StatusCode::BAD_REQUEST, msg),
        Err(e) => {
            tracing::error!("{}: {}", SAVE_FAILED, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED)
        }
    }
}

/// PUT /api/settings
pub async fn write_one(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let Some(key) = body.get("key").and_then(Value::as_str) else {
        return error_response(StatusCode::BAD_REQUEST, "key must be a string");
    };
    let Some(value) = body.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "value is required");
    };

    let key = key.to_string();
    let value = stringify_value(value);

    let pool = state.pool.clone();
    match run_blocking(move || repo::set(&pool, &key, &value)).await {
        Ok(setting) => {
            tracing::info!(key = %setting.key, "Setting updated");
            Json(setting).into_response()
        }
        Err(AppError::Validation(msg)) => error_response(StatusCode::BAD_REQUEST, msg),
        Err(e) => {
            tracing::error!("{}: {}", UPDATE_FAILED, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, UPDATE_FAILED)
        }
    }
}

/// Textual form of an arbitrary JSON value as stored in `app_settings`.
///
/// Integral floats below 1e21 drop their fractional part so `1.0` and `1`
/// store identically.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => {
                        format!("{f:.0}")
                    }
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".into(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
