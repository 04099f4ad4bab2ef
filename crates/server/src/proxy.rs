//! Thin proxy endpoints under `/api`. Each handler validates required input
//! locally, forwards to one fixed upstream path, and relays the JSON response
//! with the upstream status mirrored.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::{Forwarded, ProxyError};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::errors::ApiError;
use crate::routes::ServerState;

/// Mirror a successful upstream response: same status, body relayed as-is.
fn relay(fwd: Forwarded) -> Response {
    let status = StatusCode::from_u16(fwd.status).unwrap_or(StatusCode::OK);
    (status, Json(fwd.body)).into_response()
}

/// `GET /api/files` — list the configured user's projects.
pub async fn list_files(State(state): State<ServerState>) -> Result<Response, ApiError> {
    let fwd = state
        .upstream
        .get_json(&format!("project/get_projects/{}", state.user_id))
        .await?;
    Ok(relay(fwd))
}

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
}

impl ProjectQuery {
    fn require(self) -> Result<String, ProxyError> {
        match self.project_id {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(ProxyError::Validation("Project ID is required".to_string())),
        }
    }
}

/// `GET /api/files/data?projectId=` — full dataset for one project.
pub async fn project_data(
    State(state): State<ServerState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Response, ApiError> {
    let project_id = query.require()?;
    let fwd = state
        .upstream
        .get_json(&format!("project/get_project_data/{project_id}"))
        .await?;
    Ok(relay(fwd))
}

/// `GET /api/headers/column_headers?projectId=` — column names for a project.
pub async fn column_headers(
    State(state): State<ServerState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Response, ApiError> {
    let project_id = query.require()?;
    let fwd = state
        .upstream
        .get_json(&format!("dataset/get_column_names?project_id={project_id}"))
        .await?;
    Ok(relay(fwd))
}

struct UploadFields {
    file_name: String,
    file_bytes: Vec<u8>,
    content_type: Option<String>,
    name: String,
    user_id: String,
}

async fn collect_upload(mut multipart: Multipart) -> Result<UploadFields, ProxyError> {
    let mut file: Option<(String, Vec<u8>, Option<String>)> = None;
    let mut name: Option<String> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ProxyError::Validation(e.to_string()))?
    {
        // Owned copy: reading the field body consumes it.
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(|c| c.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ProxyError::Validation(e.to_string()))?;
                file = Some((file_name, bytes.to_vec(), content_type));
            }
            Some("name") => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ProxyError::Validation(e.to_string()))?,
                );
            }
            Some("user_id") => {
                user_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ProxyError::Validation(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    match (file, name, user_id) {
        (Some((file_name, file_bytes, content_type)), Some(name), Some(user_id)) => {
            Ok(UploadFields { file_name, file_bytes, content_type, name, user_id })
        }
        _ => Err(ProxyError::Validation("missing required upload field".to_string())),
    }
}

/// `POST /api/files` — dataset upload. Required multipart fields: `file`,
/// `name`, `user_id`. Validated fields are re-packed into a fresh multipart
/// body before forwarding; nothing reaches upstream when a field is missing.
pub async fn upload_dataset(
    State(state): State<ServerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart =
        multipart.map_err(|e| ProxyError::Validation(e.body_text()))?;
    let fields = collect_upload(multipart).await?;

    info!(name = %fields.name, user_id = %fields.user_id, file = %fields.file_name, "forwarding dataset upload");

    let mut part = reqwest::multipart::Part::bytes(fields.file_bytes)
        .file_name(fields.file_name);
    if let Some(content_type) = &fields.content_type {
        part = part
            .mime_str(content_type)
            .map_err(|e| ProxyError::Validation(e.to_string()))?;
    }
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("name", fields.name)
        .text("user_id", fields.user_id);

    let fwd = state.upstream.post_multipart("project/upload_dataset", form).await?;
    Ok(relay(fwd))
}

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    /// Kept as a raw value: callers send both string and numeric ids.
    #[serde(rename = "projectID")]
    pub project_id: Value,
}

impl DeleteFileRequest {
    fn id_segment(&self) -> Result<String, ProxyError> {
        let id = match &self.project_id {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        if id.is_empty() {
            return Err(ProxyError::Validation("projectID is required".to_string()));
        }
        Ok(id)
    }
}

/// `DELETE /api/files` — delete a project by id taken from the JSON body.
/// Success is always the fixed `{success: true, message: "delete file"}`
/// envelope; the proxy adds no idempotence of its own.
pub async fn delete_file(
    State(state): State<ServerState>,
    body: Result<Json<DeleteFileRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| ProxyError::Validation(e.body_text()))?;
    let id = request.id_segment()?;
    state
        .upstream
        .delete(&format!("project/delete_project/{id}"))
        .await?;
    info!(project_id = %id, "project deleted");
    let outcome = common::types::DeleteOutcome::file_deleted();
    Ok((StatusCode::OK, Json(outcome)).into_response())
}
