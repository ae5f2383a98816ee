use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::review_dto::{CreateReviewRequest, ReviewResponse, UpdateReviewRequest};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::{RatingBreakdown, Review};
use crate::repositories::{PostRepository, ReviewRepository};
use crate::utils::errors::{forbidden_error, not_found_error, AppError};

pub struct ReviewController {
    reviews: ReviewRepository,
    posts: PostRepository,
}

impl ReviewController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            reviews: ReviewRepository::new(pool.clone()),
            posts: PostRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        user: AuthenticatedUser,
        post_id: Uuid,
        request: CreateReviewRequest,
    ) -> Result<ApiResponse<ReviewResponse>, AppError> {
        request.validate()?;

        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| not_found_error("Post", &post_id.to_string()))?;

        let (review, summary) = self
            .reviews
            .create(post_id, user.user_id, request.content, request.rating)
            .await?;

        Ok(ApiResponse::success_with_message(
            ReviewResponse {
                review,
                post_rating: summary.breakdown(),
            },
            "Review added successfully",
        ))
    }

    pub async fn update(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
        request: UpdateReviewRequest,
    ) -> Result<ApiResponse<ReviewResponse>, AppError> {
        request.validate()?;

        let current = self.authored_review(user, id, "update review").await?;
        let (review, summary) = self
            .reviews
            .update(current, request.content, request.rating)
            .await?;

        Ok(ApiResponse::success_with_message(
            ReviewResponse {
                review,
                post_rating: summary.breakdown(),
            },
            "Review updated successfully",
        ))
    }

    pub async fn delete(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
    ) -> Result<ApiResponse<RatingBreakdown>, AppError> {
        let review = self.authored_review(user, id, "delete review").await?;
        let summary = self.reviews.soft_delete(&review).await?;

        Ok(ApiResponse::success_with_message(
            summary.breakdown(),
            "Review deleted successfully",
        ))
    }

    async fn authored_review(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
        operation: &str,
    ) -> Result<Review, AppError> {
        let review = self
            .reviews
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Review", &id.to_string()))?;

        if review.user_id != user.user_id {
            return Err(forbidden_error(operation, "you are not the author"));
        }
        Ok(review)
    }
}
