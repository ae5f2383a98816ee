use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::ReviewController;
use crate::dto::review_dto::{ReviewResponse, UpdateReviewRequest};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::RatingBreakdown;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_review_router() -> Router<AppState> {
    Router::new().route("/:id", put(update_review).delete(delete_review))
}

async fn update_review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReviewRequest>,
) -> Result<Json<ApiResponse<ReviewResponse>>, AppError> {
    let controller = ReviewController::new(state.pool.clone());
    let response = controller.update(user, id, request).await?;
    Ok(Json(response))
}

async fn delete_review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RatingBreakdown>>, AppError> {
    let controller = ReviewController::new(state.pool.clone());
    let response = controller.delete(user, id).await?;
    Ok(Json(response))
}
