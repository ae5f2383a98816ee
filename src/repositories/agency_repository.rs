use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Agency;
use crate::utils::errors::AppError;

pub struct AgencyRepository {
    pool: PgPool,
}

impl AgencyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Agency>, AppError> {
        let agency = sqlx::query_as::<_, Agency>("SELECT * FROM agencies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(agency)
    }

    /// Agencia gestionada por un usuario
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Agency>, AppError> {
        let agency = sqlx::query_as::<_, Agency>("SELECT * FROM agencies WHERE user_id = $1 LIMIT 1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(agency)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Agency>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let agencies = sqlx::query_as::<_, Agency>("SELECT * FROM agencies WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(agencies)
    }
}
