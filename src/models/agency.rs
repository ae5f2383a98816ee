use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Agencia de alquiler. `agency_coordinates` se guarda tal cual llega del
/// formulario (JSON, "[lat,lng]", ...) y se normaliza al leerla.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Agency {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub agency_coordinates: Option<String>,
    pub logo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}
