use chrono::{Datelike, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::dto::post_dto::{CreatePostRequest, PostDetailResponse, PostResponse, UpdatePostRequest};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::{Agency, Post, PostStatus};
use crate::repositories::post_repository::{NewPost, PostChanges};
use crate::repositories::{AgencyRepository, PostRepository, ReviewRepository, VehicleRepository};
use crate::services::listing_query::{ListingDefaults, ListingParams, ListingQuery};
use crate::services::pagination::Paginated;
use crate::utils::errors::{forbidden_error, not_found_error, AppError};

const DEFAULT_MIN_DRIVER_AGE: i32 = 21;
const DEFAULT_MIN_LICENSE_YEARS: i32 = 2;

pub struct PostController {
    posts: PostRepository,
    vehicles: VehicleRepository,
    agencies: AgencyRepository,
    reviews: ReviewRepository,
}

impl PostController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            posts: PostRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            agencies: AgencyRepository::new(pool.clone()),
            reviews: ReviewRepository::new(pool),
        }
    }

    /// Listado público filtrado, ordenado y paginado
    pub async fn list(
        &self,
        params: ListingParams,
        defaults: &ListingDefaults,
    ) -> Result<Paginated<PostResponse>, AppError> {
        let query = ListingQuery::published(&params, defaults, Utc::now().year());
        let (posts, total) = self.posts.search(&query).await?;
        let data = self.attach_relations(posts).await?;

        Ok(Paginated::new(data, total, &query.page))
    }

    /// Detalle de un post: suma una vista e incluye los comentarios vigentes
    pub async fn show(&self, id: Uuid) -> Result<PostDetailResponse, AppError> {
        let post = self
            .posts
            .increment_views(id)
            .await?
            .ok_or_else(|| not_found_error("Post", &id.to_string()))?;

        let vehicle = self.vehicles.find_by_id(post.vehicle_id).await?;
        let agency = self.agencies.find_by_id(post.agency_id).await?;
        let comments = self.reviews.find_for_post(post.id).await?;

        Ok(PostDetailResponse {
            post: PostResponse::build(post, vehicle, agency),
            comments,
        })
    }

    pub async fn list_by_agency(&self, agency_id: Uuid) -> Result<Vec<PostResponse>, AppError> {
        let posts = self.posts.find_by_agency(agency_id).await?;
        self.attach_relations(posts).await
    }

    pub async fn create(
        &self,
        user: AuthenticatedUser,
        request: CreatePostRequest,
    ) -> Result<ApiResponse<PostResponse>, AppError> {
        request.validate()?;

        let agency = self.agency_of(user).await?;
        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &request.vehicle_id.to_string()))?;

        if vehicle.agency_id != agency.id {
            return Err(forbidden_error("publish vehicle", "it belongs to another agency"));
        }

        let post = self
            .posts
            .create(NewPost {
                agency_id: agency.id,
                vehicle_id: vehicle.id,
                title: request.title,
                description: request.description,
                status: request.status.unwrap_or(PostStatus::Draft),
                delivery_options: request.delivery_options,
                min_driver_age: request.min_driver_age.unwrap_or(DEFAULT_MIN_DRIVER_AGE),
                min_license_years: request.min_license_years.unwrap_or(DEFAULT_MIN_LICENSE_YEARS),
                meta_title: request.meta_title,
                meta_description: request.meta_description,
            })
            .await?;

        tracing::info!(post_id = %post.id, agency_id = %agency.id, "📝 Post creado");
        Ok(ApiResponse::success_with_message(
            PostResponse::build(post, Some(vehicle), Some(agency)),
            "Post created successfully",
        ))
    }

    pub async fn update(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
        request: UpdatePostRequest,
    ) -> Result<ApiResponse<PostResponse>, AppError> {
        request.validate()?;

        let (current, agency) = self.owned_post(user, id, "update post").await?;

        if let Some(vehicle_id) = request.vehicle_id {
            let vehicle = self
                .vehicles
                .find_by_id(vehicle_id)
                .await?
                .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;
            if vehicle.agency_id != agency.id {
                return Err(forbidden_error("update post", "the vehicle belongs to another agency"));
            }
        }

        let post = self
            .posts
            .update(
                current,
                PostChanges {
                    vehicle_id: request.vehicle_id,
                    title: request.title,
                    description: request.description,
                    status: request.status,
                    delivery_options: request.delivery_options,
                    min_driver_age: request.min_driver_age,
                    min_license_years: request.min_license_years,
                    meta_title: request.meta_title,
                    meta_description: request.meta_description,
                },
            )
            .await?;

        let vehicle = self.vehicles.find_by_id(post.vehicle_id).await?;
        Ok(ApiResponse::success_with_message(
            PostResponse::build(post, vehicle, Some(agency)),
            "Post updated successfully",
        ))
    }

    pub async fn delete(&self, user: AuthenticatedUser, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        let (post, _) = self.owned_post(user, id, "delete post").await?;
        self.posts.delete_unreserved(&post).await?;

        tracing::info!(post_id = %id, "🗑️ Post eliminado");
        Ok(ApiResponse::message("Post deleted successfully"))
    }

    async fn agency_of(&self, user: AuthenticatedUser) -> Result<Agency, AppError> {
        self.agencies
            .find_by_user(user.user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Only agencies can manage listings".to_string()))
    }

    async fn owned_post(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
        operation: &str,
    ) -> Result<(Post, Agency), AppError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Post", &id.to_string()))?;

        let agency = self.agency_of(user).await?;
        if post.agency_id != agency.id {
            return Err(forbidden_error(operation, "you do not own this listing"));
        }

        Ok((post, agency))
    }

    /// Adjunta vehículo y agencia a cada post con dos consultas en bloque
    async fn attach_relations(&self, posts: Vec<Post>) -> Result<Vec<PostResponse>, AppError> {
        let vehicle_ids: Vec<Uuid> = posts.iter().map(|p| p.vehicle_id).collect();
        let mut agency_ids: Vec<Uuid> = posts.iter().map(|p| p.agency_id).collect();
        agency_ids.sort();
        agency_ids.dedup();

        let mut vehicles: HashMap<Uuid, _> = self
            .vehicles
            .find_by_ids(&vehicle_ids)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();
        let agencies: HashMap<Uuid, _> = self
            .agencies
            .find_by_ids(&agency_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        Ok(posts
            .into_iter()
            .map(|post| {
                let vehicle = vehicles.remove(&post.vehicle_id);
                let agency = agencies.get(&post.agency_id).cloned();
                PostResponse::build(post, vehicle, agency)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use crate::models::ReservationStatus;
    use crate::repositories::post_repository::ensure_listing_removable;

    #[test]
    fn delete_is_refused_while_a_reservation_is_in_flight() {
        for status in [
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
            ReservationStatus::Active,
        ] {
            let error = ensure_listing_removable(&[ReservationStatus::Completed, status]).unwrap_err();
            assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(error.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn finished_reservations_do_not_block_delete() {
        assert!(ensure_listing_removable(&[]).is_ok());
        assert!(ensure_listing_removable(&[
            ReservationStatus::Paid,
            ReservationStatus::Completed,
            ReservationStatus::Cancelled,
        ])
        .is_ok());
    }
}
