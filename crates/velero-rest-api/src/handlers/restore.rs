//! Restore endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use velero_rest_backup::restore::{self, CreateRestoreRequest};
use velero_rest_common::Error;

use super::{data_reply, message_reply};
use crate::error::ApiError;
use crate::server::AppState;

/// `GET /k8s/restore/{name}`
pub async fn get_restore(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let client = state.clients.client().await?;
    let found = restore::get_restore(client.as_ref(), &state.config.velero_namespace, &name).await?;
    let data = serde_json::to_value(&found).map_err(Error::from)?;
    Ok(data_reply(data))
}

/// `POST /k8s/restore/{backup}`: restore everything in the named backup
pub async fn create_restore(
    State(state): State<AppState>,
    Path(backup_name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let client = state.clients.client().await?;
    let request = CreateRestoreRequest::new(backup_name);
    let restore_name = request.restore_name().to_string();
    restore::create_restore(client.as_ref(), &state.config.velero_namespace, request).await?;

    info!(restore = %restore_name, "Restore submitted");
    Ok(message_reply(json!({ "restore_name": restore_name })))
}
