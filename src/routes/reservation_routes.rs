use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::ReservationController;
use crate::dto::reservation_dto::{CreateReservationRequest, ReservationResponse};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::Reservation;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_reservation_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reservations).post(create_reservation))
        .route("/:id", get(get_reservation))
}

async fn create_reservation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReservationResponse>>), AppError> {
    let controller = ReservationController::new(state.pool.clone());
    let response = controller.create(user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_reservations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, AppError> {
    let controller = ReservationController::new(state.pool.clone());
    let response = controller.list_mine(user).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn get_reservation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReservationResponse>>, AppError> {
    let controller = ReservationController::new(state.pool.clone());
    let response = controller.show(user, id).await?;
    Ok(Json(ApiResponse::success(response)))
}
