//! Configuración de variables de entorno
//!
//! Este módulo lee la configuración del proceso. Las variables obligatorias
//! ausentes o mal formadas se reportan como error en lugar de abortar.

use std::env;
use std::str::FromStr;

use crate::utils::errors::AppError;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    /// Tamaño de página por defecto del listado de posts
    pub listings_per_page: u32,
    /// Umbral de vistas usado cuando `popular=true` no trae un número
    pub popular_min_views: i32,
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000)?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or_default(),
            listings_per_page: parse_or("LISTINGS_PER_PAGE", 12)?,
            popular_min_views: parse_or("POPULAR_MIN_VIEWS", 100)?,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::Configuration(format!("{} must be set", key)))
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} must be a valid number", key))),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_empty_entries_dropped() {
        let origins = split_origins(" http://a.test, ,http://b.test ");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn server_url_joins_host_and_port() {
        let config = EnvironmentConfig {
            environment: "test".into(),
            host: "127.0.0.1".into(),
            port: 8080,
            database_url: "postgres://localhost/rental".into(),
            jwt_secret: "secret".into(),
            cors_origins: vec![],
            listings_per_page: 12,
            popular_min_views: 100,
        };
        assert_eq!(config.server_url(), "127.0.0.1:8080");
        assert!(!config.is_development());
    }
}
