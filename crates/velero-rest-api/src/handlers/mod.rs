//! Request handlers
//!
//! Successful replies use the `{status, data}` or `{status, message}` envelope.

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

pub mod backup;
pub mod restore;

/// `{status: 200, data}`
pub(crate) fn data_reply(data: Value) -> Json<Value> {
    Json(json!({ "status": StatusCode::OK.as_u16(), "data": data }))
}

/// `{status: 200, message}`
pub(crate) fn message_reply(message: impl Into<Value>) -> Json<Value> {
    Json(json!({ "status": StatusCode::OK.as_u16(), "message": message.into() }))
}
