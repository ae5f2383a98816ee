use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::payment_dto::validate_non_negative;
use crate::models::{PickupType, Reservation};
use crate::services::pricing::PriceQuote;

// Request para crear una reserva; el desglose de precio lo calcula el
// cliente y el servidor lo vuelve a comprobar
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReservationRequest {
    pub agency_id: Uuid,
    pub vehicle_id: Uuid,
    pub pickup_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub pickup_type: PickupType,
    /// Cualquier forma aceptada por la normalización de coordenadas
    pub delivery_coordinates: Option<serde_json::Value>,
    /// Distancia por ruta ya en km, si el mapa llegó a calcularla
    pub delivery_distance_km: Option<f64>,
    pub daily_rate: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub delivery_fee: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub final_amount: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub discount_amount: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub equipment_cost: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub quote: Option<PriceQuote>,
}
