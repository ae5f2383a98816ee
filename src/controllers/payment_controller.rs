use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::payment_dto::{CreatePaymentRequest, PaymentResponse, UpdatePaymentStatusRequest};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::Payment;
use crate::repositories::{AgencyRepository, PaymentRepository};
use crate::services::pagination::{PageRequest, Paginated};
use crate::utils::errors::{not_found_error, AppError};

pub const PAYMENTS_PER_PAGE: u32 = 10;

pub struct PaymentController {
    payments: PaymentRepository,
    agencies: AgencyRepository,
}

impl PaymentController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            payments: PaymentRepository::new(pool.clone()),
            agencies: AgencyRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        user: AuthenticatedUser,
        request: CreatePaymentRequest,
    ) -> Result<ApiResponse<PaymentResponse>, AppError> {
        request.validate()?;

        let (payment, reservation) = self.payments.create(user.user_id, request).await?;
        Ok(ApiResponse::success_with_message(
            PaymentResponse { payment, reservation },
            "Payment recorded successfully",
        ))
    }

    pub async fn update_status(
        &self,
        user: AuthenticatedUser,
        id: Uuid,
        request: UpdatePaymentStatusRequest,
    ) -> Result<ApiResponse<PaymentResponse>, AppError> {
        request.validate()?;

        let (payment, reservation) = self.payments.update_status(id, user.user_id, request).await?;
        tracing::info!(payment_id = %id, reservation = %reservation.reservation_number, "💳 Estado de pago actualizado");

        Ok(ApiResponse::success_with_message(
            PaymentResponse { payment, reservation },
            "Payment status updated successfully",
        ))
    }

    pub async fn show(&self, user: AuthenticatedUser, id: Uuid) -> Result<Payment, AppError> {
        let agency_id = self.agencies.find_by_user(user.user_id).await?.map(|a| a.id);

        self.payments
            .find_visible(id, user.user_id, agency_id)
            .await?
            .ok_or_else(|| not_found_error("Payment", &id.to_string()))
    }

    pub async fn delete(&self, user: AuthenticatedUser, id: Uuid) -> Result<(), AppError> {
        if !self.payments.delete_owned(id, user.user_id).await? {
            return Err(not_found_error("Payment", &id.to_string()));
        }

        tracing::info!(payment_id = %id, user_id = %user.user_id, "🗑️ Pago eliminado");
        Ok(())
    }

    pub async fn list(
        &self,
        user: AuthenticatedUser,
        page: Option<&str>,
    ) -> Result<Paginated<Payment>, AppError> {
        let request = PageRequest::from_params(page, None, PAYMENTS_PER_PAGE);
        let (payments, total) = self.payments.list_for_user(user.user_id, &request).await?;

        Ok(Paginated::new(payments, total, &request))
    }

    pub async fn list_for_agency(&self, user: AuthenticatedUser) -> Result<Vec<Payment>, AppError> {
        let agency = self
            .agencies
            .find_by_user(user.user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Only agencies can list agency payments".to_string()))?;

        self.payments.list_for_agency(agency.id).await
    }
}
