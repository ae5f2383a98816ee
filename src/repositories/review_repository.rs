//! Repositorio de comentarios (reviews)
//!
//! Toda mutación recalcula el resumen de valoraciones del post dentro de la
//! misma transacción, a partir de los comentarios no borrados.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{RatingSummary, Review};
use crate::utils::errors::{map_unique_violation, not_found_error, AppError};

pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Comentarios vigentes de un post, más recientes primero
    pub async fn find_for_post(&self, post_id: Uuid) -> Result<Vec<Review>, AppError> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT * FROM comments
            WHERE post_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT * FROM comments WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    pub async fn create(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: Option<String>,
        rating: Option<i32>,
    ) -> Result<(Review, RatingSummary), AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO comments (id, post_id, user_id, content, rating, deleted_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NULL, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .bind(rating)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "You have already reviewed this listing"))?;

        let summary = recompute_rating_summary(&mut tx, post_id).await?;
        tx.commit().await?;

        Ok((review, summary))
    }

    pub async fn update(
        &self,
        current: Review,
        content: Option<String>,
        rating: Option<i32>,
    ) -> Result<(Review, RatingSummary), AppError> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE comments
            SET content = $2, rating = $3, updated_at = $4
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(current.id)
        .bind(content.or(current.content))
        .bind(rating.or(current.rating))
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let summary = recompute_rating_summary(&mut tx, review.post_id).await?;
        tx.commit().await?;

        Ok((review, summary))
    }

    /// Borrado lógico: el comentario deja de contar en el resumen
    pub async fn soft_delete(&self, review: &Review) -> Result<RatingSummary, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE comments SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
            .bind(review.id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        let summary = recompute_rating_summary(&mut tx, review.post_id).await?;
        tx.commit().await?;

        Ok(summary)
    }
}

const LOCK_POST_SQL: &str = "SELECT id FROM posts WHERE id = $1 FOR UPDATE";

/// Recalcula desde cero el resumen de valoraciones del post y lo guarda.
/// El post queda bloqueado hasta el commit, de modo que dos mutaciones sobre
/// el mismo post se serializan y la segunda lee los comentarios de la primera.
pub async fn recompute_rating_summary(
    conn: &mut PgConnection,
    post_id: Uuid,
) -> Result<RatingSummary, AppError> {
    sqlx::query_scalar::<_, Uuid>(LOCK_POST_SQL)
        .bind(post_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found_error("Post", &post_id.to_string()))?;

    let ratings: Vec<i32> = sqlx::query_scalar(
        r#"
        SELECT rating FROM comments
        WHERE post_id = $1 AND deleted_at IS NULL AND rating IS NOT NULL
        "#,
    )
    .bind(post_id)
    .fetch_all(&mut *conn)
    .await?;

    let summary = RatingSummary::from_ratings(&ratings);

    sqlx::query(
        r#"
        UPDATE posts
        SET average_rating = $2, total_reviews = $3, rating_distribution = $4
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .bind(summary.average)
    .bind(i32::try_from(summary.total).unwrap_or(i32::MAX))
    .bind(summary.stored_distribution().map(Json))
    .execute(&mut *conn)
    .await?;

    tracing::debug!(%post_id, total = summary.total, average = %summary.average, "⭐ Resumen de valoraciones recalculado");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_recompute_locks_the_post_row() {
        assert!(LOCK_POST_SQL.contains("FROM posts WHERE id = $1"));
        assert!(LOCK_POST_SQL.ends_with("FOR UPDATE"));
    }
}
