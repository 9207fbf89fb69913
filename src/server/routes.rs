use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::registry::{required, ArtifactFile, ModelRecord, ModelRegistry, RegistryError};
use super::types::{
    ApiError,
    ApiResponse,
    CreateModelRequest,
    CreateModelResponse,
    SaveCapturesRequest,
    UploadFilesResponse,
};

type Registry = State<Arc<ModelRegistry>>;

/// Returns a health check response
pub async fn health_check() -> &'static str {
    info!("Health check endpoint called");
    "modelhub is running"
}

/// Registers a new model.
pub async fn create_model(
    State(registry): Registry,
    Json(request): Json<CreateModelRequest>,
) -> Result<Json<ApiResponse<CreateModelResponse>>, ApiError> {
    info!("Create model endpoint called");

    let name = required("name", request.name)?;
    let record = registry.create(&name)?;

    Ok(Json(ApiResponse::success(CreateModelResponse {
        id: record.id,
        name: record.name,
    })))
}

/// Returns every registered model, oldest first.
pub async fn list_models(
    State(registry): Registry,
) -> Result<Json<ApiResponse<Vec<ModelRecord>>>, ApiError> {
    info!("List models endpoint called");
    let models = registry.list()?;
    info!("Listing {} models", models.len());
    Ok(Json(ApiResponse::success(models)))
}

/// Returns a single model with its captures and file names.
pub async fn get_model(
    State(registry): Registry,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ModelRecord>>, ApiError> {
    info!("Get model endpoint called for {}", id);
    Ok(Json(ApiResponse::success(registry.get(&id)?)))
}

/// Replaces the captures of a model.
pub async fn save_captures(
    State(registry): Registry,
    Json(request): Json<SaveCapturesRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = required("id", request.id)?;
    info!("Save captures endpoint called for {}", id);

    // a JSON null deserializes to None and is reported as missing
    let data = match required("data", request.data)? {
        Value::Array(items) => items,
        _ => return Err(RegistryError::validation("data must be an array").into()),
    };

    registry.attach_captures(&id, data)?;
    Ok(Json(ApiResponse::message("Captures saved")))
}

/// Stores every file part of a multipart upload under a model.
///
/// Parts without a file name (plain form fields) are ignored.
pub async fn upload_files(
    State(registry): Registry,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadFilesResponse>>, ApiError> {
    info!("Upload files endpoint called for {}", id);

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content = field.bytes().await?;
        files.push(ArtifactFile::new(name, content.to_vec()));
    }

    let file_names = registry.attach_files(&id, files)?;
    Ok(Json(
        ApiResponse::success(UploadFilesResponse { file_names })
            .with_message(format!("Files saved to model {}", id)),
    ))
}

/// Serves the stored content of an uploaded artifact.
pub async fn get_file(
    State(registry): Registry,
    Path((id, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Get file endpoint called for {}/{}", id, name);

    let content = registry.read_file(&id, &name)?;
    let content_type = if name.to_lowercase().ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    };

    Ok(([(header::CONTENT_TYPE, content_type)], Bytes::from(content)))
}
