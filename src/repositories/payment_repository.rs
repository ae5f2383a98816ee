//! Repositorio de pagos
//!
//! Crear un pago o cambiar su estado mueve la reserva asociada en la misma
//! transacción. Si cualquier paso falla la transacción se descarta sin commit.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::payment_dto::{CreatePaymentRequest, UpdatePaymentStatusRequest};
use crate::models::payment::{reservation_status_on_create, reservation_status_on_update};
use crate::models::{Payment, Reservation};
use crate::repositories::reservation_repository::{lock_reservation, set_reservation_status};
use crate::services::pagination::PageRequest;
use crate::utils::errors::{not_found_error, AppError};

pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registra el pago y aplica la transición de la reserva.
    /// `owner` restringe la operación a reservas de ese usuario.
    pub async fn create(
        &self,
        owner: Uuid,
        request: CreatePaymentRequest,
    ) -> Result<(Payment, Reservation), AppError> {
        let mut tx = self.pool.begin().await?;

        let reservation = lock_reservation(&mut tx, request.reservation_id)
            .await?
            .filter(|r| r.user_id == owner)
            .ok_or_else(|| not_found_error("Reservation", &request.reservation_id.to_string()))?;

        let now = Utc::now();
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                id, reservation_id, payment_method, amount, currency, status,
                transaction_id, details, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(reservation.id)
        .bind(request.payment_method)
        .bind(request.amount)
        .bind(request.currency.to_uppercase())
        .bind(request.status)
        .bind(request.transaction_id)
        .bind(request.details.map(Json))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let reservation = match reservation_status_on_create(payment.payment_method, payment.status) {
            Some(next) => set_reservation_status(&mut tx, reservation.id, next).await?,
            None => reservation,
        };

        tx.commit().await?;
        tracing::info!(
            payment_id = %payment.id,
            reservation = %reservation.reservation_number,
            status = reservation.status.as_str(),
            "💳 Pago registrado"
        );

        Ok((payment, reservation))
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        owner: Uuid,
        request: UpdatePaymentStatusRequest,
    ) -> Result<(Payment, Reservation), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found_error("Payment", &id.to_string()))?;

        let reservation = lock_reservation(&mut tx, current.reservation_id)
            .await?
            .filter(|r| r.user_id == owner)
            .ok_or_else(|| not_found_error("Payment", &id.to_string()))?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = $2, details = COALESCE($3, details), updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.status)
        .bind(request.details.map(Json))
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let reservation = match reservation_status_on_update(payment.status) {
            Some(next) => set_reservation_status(&mut tx, reservation.id, next).await?,
            None => reservation,
        };

        tx.commit().await?;
        Ok((payment, reservation))
    }

    /// Pago visible para el usuario (dueño de la reserva) o para la agencia
    pub async fn find_visible(
        &self,
        id: Uuid,
        user_id: Uuid,
        agency_id: Option<Uuid>,
    ) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.* FROM payments p
            JOIN reservations r ON r.id = p.reservation_id
            WHERE p.id = $1 AND (r.user_id = $2 OR r.agency_id = $3)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(agency_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Borra un pago de una reserva del usuario; `false` si no existe o no es suyo
    pub async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM payments p
            USING reservations r
            WHERE p.id = $1 AND r.id = p.reservation_id AND r.user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Pagos de las reservas del usuario, paginados
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<(Vec<Payment>, i64), AppError> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM payments p
            JOIN reservations r ON r.id = p.reservation_id
            WHERE r.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.* FROM payments p
            JOIN reservations r ON r.id = p.reservation_id
            WHERE r.user_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((payments, total))
    }

    pub async fn list_for_agency(&self, agency_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.* FROM payments p
            JOIN reservations r ON r.id = p.reservation_id
            WHERE r.agency_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(agency_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}
