/// Error types for Blog Service
///
/// Every fallible operation in the service returns [`AppError`]. The HTTP mapping lives in
/// the `ResponseError` impl so handlers can simply propagate with `?`: authorization
/// failures become redirects, unknown resources render the not-found page.
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::render::{JsonRenderer, Renderer, NOT_FOUND_TEMPLATE};

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Field-level validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for err in field_errors {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                out.add(&field, message);
            }
        }
        out
    }
}

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown id, slug or username
    #[error("Not found: {0}")]
    NotFound(String),

    /// Acting user may not touch the resource; answered with a redirect to a safe page
    #[error("Forbidden, redirecting to {location}")]
    Forbidden { location: String },

    /// Anonymous caller attempted an authenticated action
    #[error("Authentication required, redirecting to {location}")]
    RequireAuth { location: String },

    /// Submitted fields failed validation; nothing was written
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    /// Persistence layer failure
    #[error("Database error: {0}")]
    Database(String),

    /// Page cache failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Template collaborator failure
    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden { .. } | AppError::RequireAuth { .. } => StatusCode::FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Render(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::Forbidden { location } | AppError::RequireAuth { location } => {
                HttpResponse::Found()
                    .insert_header((header::LOCATION, location.as_str()))
                    .finish()
            }
            AppError::NotFound(what) => {
                let context = serde_json::json!({ "error": what });
                match JsonRenderer.render(NOT_FOUND_TEMPLATE, &context) {
                    Ok(body) => HttpResponse::NotFound()
                        .content_type(JsonRenderer::CONTENT_TYPE)
                        .body(body),
                    Err(_) => HttpResponse::NotFound().finish(),
                }
            }
            AppError::Validation(errors) => HttpResponse::build(status).json(serde_json::json!({
                "error": "validation failed",
                "fields": errors,
                "status": status.as_u16(),
            })),
            _ => HttpResponse::build(status).json(serde_json::json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            })),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Render(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.into())
    }
}
