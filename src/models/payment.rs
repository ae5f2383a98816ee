//! Modelo de Payment
//!
//! Cada pago puede mover su reserva a otro estado; la regla vive aquí para
//! que la creación y la actualización la apliquen igual.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::reservation::ReservationStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
    Cash,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Created,
    Completed,
    Approved,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Approved)
    }
}

/// Estado al que pasa la reserva al registrar un pago nuevo.
///
/// Efectivo: la reserva queda confirmada a la espera del cobro en la recogida.
/// Pago online completado o aprobado: la reserva queda pagada.
pub fn reservation_status_on_create(
    method: PaymentMethod,
    status: PaymentStatus,
) -> Option<ReservationStatus> {
    if method == PaymentMethod::Cash {
        Some(ReservationStatus::Confirmed)
    } else if status.is_settled() {
        Some(ReservationStatus::Paid)
    } else {
        None
    }
}

/// Estado al que pasa la reserva al actualizar el estado de un pago
pub fn reservation_status_on_update(status: PaymentStatus) -> Option<ReservationStatus> {
    status.is_settled().then_some(ReservationStatus::Paid)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub details: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
