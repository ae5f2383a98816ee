use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{PickupType, PostStatus, Reservation, ReservationStatus};
use crate::repositories::vehicle_repository::lock_vehicle;
use crate::utils::errors::{not_found_error, AppError};

/// Reserva lista para insertar, con importes ya conciliados
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub reservation_number: String,
    pub user_id: Uuid,
    pub agency_id: Uuid,
    pub vehicle_id: Uuid,
    pub pickup_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub pickup_type: PickupType,
    pub delivery_coordinates: Option<String>,
    pub delivery_distance_km: Option<Decimal>,
    pub daily_rate: Decimal,
    pub total_amount: Decimal,
    pub delivery_fee: Decimal,
    pub discount_amount: Decimal,
    pub equipment_cost: Decimal,
    pub final_amount: Decimal,
}

pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserta la reserva con el vehículo bloqueado; el post publicado se
    /// vuelve a comprobar bajo el bloqueo por si se borró entretanto.
    pub async fn create(&self, new: NewReservation) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        lock_vehicle(&mut tx, new.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &new.vehicle_id.to_string()))?;

        let (listed,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE vehicle_id = $1 AND status = $2)",
        )
        .bind(new.vehicle_id)
        .bind(PostStatus::Published)
        .fetch_one(&mut *tx)
        .await?;

        if !listed {
            return Err(not_found_error("Listing for vehicle", &new.vehicle_id.to_string()));
        }

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (
                id, reservation_number, user_id, agency_id, vehicle_id, pickup_date, return_date,
                pickup_type, delivery_coordinates, delivery_distance_km, daily_rate, total_amount,
                delivery_fee, discount_amount, equipment_cost, final_amount, status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $18)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.reservation_number)
        .bind(new.user_id)
        .bind(new.agency_id)
        .bind(new.vehicle_id)
        .bind(new.pickup_date)
        .bind(new.return_date)
        .bind(new.pickup_type)
        .bind(new.delivery_coordinates)
        .bind(new.delivery_distance_km)
        .bind(new.daily_rate)
        .bind(new.total_amount)
        .bind(new.delivery_fee)
        .bind(new.discount_amount)
        .bind(new.equipment_cost)
        .bind(new.final_amount)
        .bind(ReservationStatus::Pending)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(reservation)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, AppError> {
        let reservation = sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(reservation)
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, AppError> {
        let reservations = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }
}

/// Bloquea la reserva para el resto de la transacción
pub async fn lock_reservation(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Reservation>, AppError> {
    let reservation = sqlx::query_as::<_, Reservation>(
        "SELECT * FROM reservations WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(reservation)
}

pub async fn set_reservation_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: ReservationStatus,
) -> Result<Reservation, AppError> {
    let reservation = sqlx::query_as::<_, Reservation>(
        "UPDATE reservations SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(reservation)
}
