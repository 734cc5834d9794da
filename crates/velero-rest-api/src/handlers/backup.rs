//! Backup endpoints

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use velero_rest_backup::backup::{self, CREATE_BACKUP_MESSAGE, DELETE_BACKUP_MESSAGE};
use velero_rest_backup::{CreateBackupRequest, DeleteBackupCommand};

use super::{data_reply, message_reply};
use crate::error::ApiError;
use crate::server::AppState;

/// `GET /k8s/backup/`
pub async fn list_backups(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let client = state.clients.client().await?;
    let data = backup::list_backups(client.as_ref(), &state.config.velero_namespace).await?;
    Ok(data_reply(data))
}

/// `GET /k8s/backup/{name}`
///
/// Every failure here is a 404, including an unreachable cluster.
pub async fn get_backup(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let client = state.clients.client().await.map_err(ApiError::not_found)?;
    let detail = backup::get_backup(client.as_ref(), &state.config.velero_namespace, &name)
        .await
        .map_err(ApiError::not_found)?;

    let data = serde_json::to_value(&detail.backup)
        .map_err(|e| ApiError::not_found(e.into()))?;
    Ok(Json(json!({
        "status": StatusCode::OK.as_u16(),
        "data": data,
        "podVolume": detail.pod_volume_json(),
    })))
}

/// `POST /k8s/backup/{name}` with `{"namespace": ...}`
pub async fn create_backup(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request = CreateBackupRequest::from_body(name, &body)?;
    let client = state.clients.client().await?;
    let created = backup::create_backup(
        client.as_ref(),
        &state.config.velero_namespace,
        request,
        &state.config.retry,
    )
    .await?;

    info!(backup = ?created.metadata.name, "Backup submitted");
    Ok(message_reply(CREATE_BACKUP_MESSAGE))
}

/// `DELETE /k8s/backup/{name}`
pub async fn delete_backup(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let client = state.clients.client().await?;
    backup::delete_backup(
        client.as_ref(),
        &state.config.velero_namespace,
        DeleteBackupCommand::new(name),
    )
    .await?;
    Ok(message_reply(DELETE_BACKUP_MESSAGE))
}
