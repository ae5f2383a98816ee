use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::controllers::PaymentController;
use crate::dto::payment_dto::{CreatePaymentRequest, PaymentResponse, UpdatePaymentStatusRequest};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::Payment;
use crate::services::pagination::Paginated;
use crate::state::AppState;
use crate::utils::errors::AppError;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub fn create_payment_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route("/agency", get(list_agency_payments))
        .route("/:id", get(get_payment).delete(delete_payment))
        .route("/:id/status", patch(update_payment_status))
}

async fn create_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), AppError> {
    let controller = PaymentController::new(state.pool.clone());
    let response = controller.create(user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_payments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Payment>>, AppError> {
    let controller = PaymentController::new(state.pool.clone());
    let response = controller.list(user, query.page.as_deref()).await?;
    Ok(Json(response))
}

async fn list_agency_payments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Payment>>>, AppError> {
    let controller = PaymentController::new(state.pool.clone());
    let response = controller.list_for_agency(user).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn get_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Payment>>, AppError> {
    let controller = PaymentController::new(state.pool.clone());
    let response = controller.show(user, id).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn delete_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let controller = PaymentController::new(state.pool.clone());
    controller.delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_payment_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<ApiResponse<PaymentResponse>>, AppError> {
    let controller = PaymentController::new(state.pool.clone());
    let response = controller.update_status(user, id, request).await?;
    Ok(Json(response))
}
