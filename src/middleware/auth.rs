//! Autenticación JWT
//!
//! `AuthenticatedUser` es un extractor: los handlers que lo reciben como
//! argumento exigen un token `Bearer` válido.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{validate_token, UserRole};

/// Usuario autenticado que se inyecta en los handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Extrae el token del header `Authorization: Bearer <token>`
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

        let claims = validate_token(token, &state.config.jwt_secret)?;
        tracing::debug!(user_id = %claims.sub, "🔐 Token validado");

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
