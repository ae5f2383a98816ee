use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Comentario de un cliente sobre un post, con valoración opcional (1-5).
/// Se borra de forma lógica con `deleted_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: Option<String>,
    pub rating: Option<i32>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
