//! Unified API response envelope
//!
//! Every gateway response carries a stable code string ("OK" on success,
//! a `LedgerError::code()` value on failure), a short message, and the data
//! payload when successful.

use crate::error::LedgerError;
use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: &'static str,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: "OK",
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: &'static str, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Error half of every handler's return type.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Map a ledger error onto the response envelope.
pub fn reject(e: LedgerError) -> ApiError {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiResponse::<()>::error(e.code(), e.to_string())))
}

/// 400 with the validation code, for malformed request fields.
pub fn bad_request(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("VALIDATION_ERROR", msg)),
    )
}
