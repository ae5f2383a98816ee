use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::{PostController, ReviewController};
use crate::dto::post_dto::{CreatePostRequest, PostDetailResponse, PostResponse, UpdatePostRequest};
use crate::dto::review_dto::{CreateReviewRequest, ReviewResponse};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::services::listing_query::ListingParams;
use crate::services::pagination::Paginated;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_post_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/agency/:agency_id", get(list_agency_posts))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/:id/reviews", post(create_review))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Paginated<PostResponse>>, AppError> {
    let controller = PostController::new(state.pool.clone());
    let response = controller.list(params, &state.listing_defaults()).await?;
    Ok(Json(response))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PostDetailResponse>>, AppError> {
    let controller = PostController::new(state.pool.clone());
    let response = controller.show(id).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn list_agency_posts(
    State(state): State<AppState>,
    Path(agency_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PostResponse>>>, AppError> {
    let controller = PostController::new(state.pool.clone());
    let response = controller.list_by_agency(agency_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<ApiResponse<PostResponse>>, AppError> {
    let controller = PostController::new(state.pool.clone());
    let response = controller.create(user, request).await?;
    Ok(Json(response))
}

async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<ApiResponse<PostResponse>>, AppError> {
    let controller = PostController::new(state.pool.clone());
    let response = controller.update(user, id, request).await?;
    Ok(Json(response))
}

async fn delete_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = PostController::new(state.pool.clone());
    let response = controller.delete(user, id).await?;
    Ok(Json(response))
}

async fn create_review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<ApiResponse<ReviewResponse>>, AppError> {
    let controller = ReviewController::new(state.pool.clone());
    let response = controller.create(user, id, request).await?;
    Ok(Json(response))
}
