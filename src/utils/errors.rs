//! Sistema de manejo de errores
//!
//! Este módulo define los errores de la API y su conversión a respuestas
//! HTTP. Cada variante corresponde a un código de estado estable.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: &'static str,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Database(sqlx::Error::RowNotFound) => "NOT_FOUND",
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Jwt(_) => "JWT_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Unprocessable(_) => "UNPROCESSABLE",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Configuration(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let (error, message, details) = match &self {
            AppError::Database(sqlx::Error::RowNotFound) => {
                ("Not Found".to_string(), "Resource not found".to_string(), None)
            }
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                (
                    "Database Error".to_string(),
                    "An error occurred while accessing the database".to_string(),
                    Some(json!({ "sql_error": e.to_string() })),
                )
            }
            AppError::Validation(e) => {
                tracing::debug!("Validation error: {}", e);
                (
                    "Validation Error".to_string(),
                    "The provided data is invalid".to_string(),
                    Some(json!(e)),
                )
            }
            AppError::Jwt(e) => {
                tracing::warn!("JWT error: {}", e);
                ("JWT Error".to_string(), "Invalid or expired token".to_string(), None)
            }
            AppError::Configuration(msg) | AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                (
                    "Internal Server Error".to_string(),
                    "An unexpected error occurred".to_string(),
                    Some(json!({ "internal_error": msg })),
                )
            }
            AppError::Unauthorized(msg) => ("Unauthorized".to_string(), msg.clone(), None),
            AppError::Forbidden(msg) => ("Forbidden".to_string(), msg.clone(), None),
            AppError::NotFound(msg) => ("Not Found".to_string(), msg.clone(), None),
            AppError::Conflict(msg) => ("Conflict".to_string(), msg.clone(), None),
            AppError::Unprocessable(msg) => ("Unprocessable".to_string(), msg.clone(), None),
            AppError::BadRequest(msg) => ("Bad Request".to_string(), msg.clone(), None),
        };

        let body = ErrorResponse {
            success: false,
            error,
            message,
            details,
            code,
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Error de validación asociado a un único campo
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.message = Some(message.into());

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

/// Convierte violaciones de unicidad de Postgres en `Conflict`
pub fn map_unique_violation(error: sqlx::Error, message: &str) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_variants() {
        assert_eq!(
            AppError::Unprocessable("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            forbidden_error("delete post", "not owner").status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn validation_error_is_field_scoped() {
        match validation_error("final_amount", "does not match") {
            AppError::Validation(errors) => {
                assert!(errors.field_errors().contains_key("final_amount"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
