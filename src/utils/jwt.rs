//! Utilidades JWT
//!
//! Los tokens los emite el servicio de autenticación; aquí solo se firman
//! (para herramientas y tests) y se validan.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Rol del usuario dentro del marketplace
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Agency,
    Admin,
}

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

/// Generar JWT token para un usuario
pub fn generate_token(
    user_id: Uuid,
    role: UserRole,
    secret: &str,
    ttl: Duration,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        role,
        exp: (now + ttl).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Validar firma y expiración
pub fn validate_token(token: &str, secret: &str) -> Result<JwtClaims, AppError> {
    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let user = Uuid::new_v4();
        let token = generate_token(user, UserRole::Agency, "secret", Duration::hours(1)).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, UserRole::Agency);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_token(Uuid::new_v4(), UserRole::Client, "secret", Duration::hours(1)).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AppError::Jwt(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = generate_token(Uuid::new_v4(), UserRole::Client, "secret", Duration::hours(-2)).unwrap();
        assert!(validate_token(&token, "secret").is_err());
    }
}
