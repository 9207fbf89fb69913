use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::registry::{ErrorKind, RegistryError};

/// Generic API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Request to register a new model
#[derive(Deserialize)]
pub struct CreateModelRequest {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
}

/// Response after registering a model
#[derive(Serialize)]
pub struct CreateModelResponse {
    pub id: String,
    pub name: String,
}

/// Request to replace a model's captures
#[derive(Deserialize)]
pub struct SaveCapturesRequest {
    #[serde(alias = "modeloId")]
    pub id: Option<String>,
    pub data: Option<Value>,
}

/// Response after uploading artifact files
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFilesResponse {
    pub file_names: Vec<String>,
}

/// Failure of a request, rendered as an error envelope
#[derive(Debug)]
pub enum ApiError {
    Registry(RegistryError),
    /// Undecodable or oversized multipart upload
    Multipart(MultipartError),
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::Multipart(e)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Multipart(e) => e.status(),
            Self::Registry(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Multipart(e) => e.body_text(),
            Self::Registry(e) => e.to_string(),
        };

        if status.is_server_error() {
            error!("Request failed: {}", message);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), message);
        }

        (status, Json(ApiResponse::error(message))).into_response()
    }
}
