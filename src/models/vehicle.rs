//! Modelo de Vehicle
//!
//! Los vehículos pertenecen a una agencia; cada post publica exactamente uno.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use std::str::FromStr;
use uuid::Uuid;

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Rented => "rented",
            VehicleStatus::Maintenance => "maintenance",
        }
    }
}

impl FromStr for VehicleStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(VehicleStatus::Available),
            "rented" => Ok(VehicleStatus::Rented),
            "maintenance" => Ok(VehicleStatus::Maintenance),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub mileage: i32,
    pub price_per_day: Decimal,
    pub delivery_fee_per_km: Decimal,
    pub status: VehicleStatus,
    pub images: Option<Json<Vec<String>>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Available".parse::<VehicleStatus>(), Ok(VehicleStatus::Available));
        assert_eq!(" rented ".parse::<VehicleStatus>(), Ok(VehicleStatus::Rented));
        assert!("sold".parse::<VehicleStatus>().is_err());
    }
}
