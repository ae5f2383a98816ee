//! Modelo de Post
//!
//! Un post es la oferta de alquiler de una agencia para un único vehículo.
//! Lleva contadores de vistas/alquileres y un resumen de valoraciones
//! cacheado que se recalcula en cada cambio de sus comentarios.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use std::str::FromStr;
use uuid::Uuid;

use super::rating::{RatingBreakdown, RatingDistribution, RatingSummary};

/// Estado de publicación - mapea al ENUM post_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Modalidad de entrega ofrecida por un post
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DeliveryOption {
    #[serde(rename = "agency pickup")]
    AgencyPickup,
    #[serde(rename = "delivery")]
    Delivery,
}

impl DeliveryOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOption::AgencyPickup => "agency pickup",
            DeliveryOption::Delivery => "delivery",
        }
    }
}

impl FromStr for DeliveryOption {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agency pickup" => Ok(DeliveryOption::AgencyPickup),
            "delivery" => Ok(DeliveryOption::Delivery),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub vehicle_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: PostStatus,
    pub delivery_options: Json<Vec<DeliveryOption>>,
    pub min_driver_age: i32,
    pub min_license_years: i32,
    pub view_count: i32,
    pub rental_count: i32,
    pub average_rating: Decimal,
    pub total_reviews: i32,
    pub rating_distribution: Option<Json<RatingDistribution>>,
    pub slug: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn offers(&self, option: DeliveryOption) -> bool {
        self.delivery_options.0.contains(&option)
    }

    pub fn rating_summary(&self) -> RatingSummary {
        RatingSummary {
            average: self.average_rating,
            total: i64::from(self.total_reviews),
            distribution: self
                .rating_distribution
                .as_ref()
                .map(|d| d.0)
                .unwrap_or_default(),
        }
    }

    pub fn rating_breakdown(&self) -> RatingBreakdown {
        self.rating_summary().breakdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_option_uses_wire_names() {
        let json = serde_json::to_string(&vec![DeliveryOption::AgencyPickup, DeliveryOption::Delivery])
            .unwrap();
        assert_eq!(json, r#"["agency pickup","delivery"]"#);
        assert_eq!("Delivery".parse::<DeliveryOption>(), Ok(DeliveryOption::Delivery));
        assert!("drone".parse::<DeliveryOption>().is_err());
    }
}
