//! Modelo de Reservation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de la reserva - mapea al ENUM reservation_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "reservation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Active,
    Paid,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    /// Estados que impiden borrar el post del vehículo
    pub const BLOCKING: [ReservationStatus; 3] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::Active,
    ];

    pub fn blocks_listing_removal(&self) -> bool {
        Self::BLOCKING.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Active => "active",
            ReservationStatus::Paid => "paid",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

/// Modalidad de recogida - mapea al ENUM pickup_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "pickup_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PickupType {
    Pickup,
    Delivery,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: Uuid,
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
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
