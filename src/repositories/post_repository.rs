//! Repositorio de posts
//!
//! El listado público se construye con `ListingQuery`; el resto son
//! consultas fijas sobre la tabla `posts`.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{DeliveryOption, Post, PostStatus, ReservationStatus};
use crate::repositories::vehicle_repository::lock_vehicle;
use crate::services::listing_query::ListingQuery;
use crate::utils::errors::{map_unique_violation, AppError};
use crate::utils::slug::post_slug;

/// Valores de un post nuevo ya validados
#[derive(Debug, Clone)]
pub struct NewPost {
    pub agency_id: Uuid,
    pub vehicle_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: PostStatus,
    pub delivery_options: Vec<DeliveryOption>,
    pub min_driver_age: i32,
    pub min_license_years: i32,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

/// Cambios parciales; `None` conserva el valor actual
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub vehicle_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<PostStatus>,
    pub delivery_options: Option<Vec<DeliveryOption>>,
    pub min_driver_age: Option<i32>,
    pub min_license_years: Option<i32>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ejecuta el listado filtrado: total de coincidencias y la página pedida
    pub async fn search(&self, query: &ListingQuery) -> Result<(Vec<Post>, i64), AppError> {
        let (total,): (i64,) = query
            .count_query()
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let posts = query
            .select_query()
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(total, returned = posts.len(), "🔎 Listado de posts");
        Ok((posts, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    pub async fn find_published_by_vehicle(&self, vehicle_id: Uuid) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE vehicle_id = $1 AND status = $2 LIMIT 1",
        )
        .bind(vehicle_id)
        .bind(PostStatus::Published)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Suma una vista y devuelve el post con el contador ya actualizado
    pub async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn find_by_agency(&self, agency_id: Uuid) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE agency_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(agency_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    pub async fn create(&self, new_post: NewPost) -> Result<Post, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let slug = post_slug(&new_post.title, id);

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (
                id, agency_id, vehicle_id, title, description, status, delivery_options,
                min_driver_age, min_license_years, view_count, rental_count,
                average_rating, total_reviews, rating_distribution, slug,
                meta_title, meta_description, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, 0, 0, 0, NULL, $10, $11, $12, $13, $13)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_post.agency_id)
        .bind(new_post.vehicle_id)
        .bind(new_post.title)
        .bind(new_post.description)
        .bind(new_post.status)
        .bind(Json(new_post.delivery_options))
        .bind(new_post.min_driver_age)
        .bind(new_post.min_license_years)
        .bind(slug)
        .bind(new_post.meta_title)
        .bind(new_post.meta_description)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "This vehicle already has a listing"))?;

        Ok(post)
    }

    pub async fn update(&self, current: Post, changes: PostChanges) -> Result<Post, AppError> {
        let slug = match &changes.title {
            Some(title) if *title != current.title => post_slug(title, current.id),
            _ => current.slug.clone(),
        };

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET vehicle_id = $2, title = $3, description = $4, status = $5,
                delivery_options = $6, min_driver_age = $7, min_license_years = $8,
                slug = $9, meta_title = $10, meta_description = $11, updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(current.id)
        .bind(changes.vehicle_id.unwrap_or(current.vehicle_id))
        .bind(changes.title.unwrap_or(current.title))
        .bind(changes.description.unwrap_or(current.description))
        .bind(changes.status.unwrap_or(current.status))
        .bind(changes.delivery_options.map(Json).unwrap_or(current.delivery_options))
        .bind(changes.min_driver_age.unwrap_or(current.min_driver_age))
        .bind(changes.min_license_years.unwrap_or(current.min_license_years))
        .bind(slug)
        .bind(changes.meta_title.or(current.meta_title))
        .bind(changes.meta_description.or(current.meta_description))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "This vehicle already has a listing"))?;

        Ok(post)
    }

    /// Borra el post y sus comentarios si el vehículo no tiene reservas en curso.
    /// El vehículo queda bloqueado hasta el commit: una reserva concurrente
    /// espera y no puede colarse entre la comprobación y el borrado.
    pub async fn delete_unreserved(&self, post: &Post) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        lock_vehicle(&mut tx, post.vehicle_id).await?;

        let statuses: Vec<ReservationStatus> = sqlx::query_scalar(
            "SELECT DISTINCT status FROM reservations WHERE vehicle_id = $1",
        )
        .bind(post.vehicle_id)
        .fetch_all(&mut *tx)
        .await?;

        ensure_listing_removable(&statuses)?;

        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Rechaza el borrado si alguna reserva del vehículo sigue pendiente,
/// confirmada o activa
pub fn ensure_listing_removable(statuses: &[ReservationStatus]) -> Result<(), AppError> {
    if statuses.iter().any(ReservationStatus::blocks_listing_removal) {
        return Err(AppError::Unprocessable(
            "Cannot delete a listing whose vehicle has pending, confirmed or active reservations"
                .to_string(),
        ));
    }
    Ok(())
}
