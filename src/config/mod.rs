//! Configuración del proyecto
//!
//! Configuración de base de datos y variables de entorno.

pub mod database;
pub mod environment;

pub use database::DatabaseConfig;
pub use environment::EnvironmentConfig;
