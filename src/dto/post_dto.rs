use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    Agency, DeliveryOption, Post, PostStatus, RatingBreakdown, Review, Vehicle,
};

fn validate_delivery_options(options: &Vec<DeliveryOption>) -> Result<(), ValidationError> {
    if options.is_empty() {
        let mut error = ValidationError::new("delivery_options");
        error.message = Some("at least one delivery option is required".into());
        return Err(error);
    }
    Ok(())
}

// Request para crear un post
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    pub vehicle_id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(min = 1))]
    pub description: String,

    pub status: Option<PostStatus>,

    #[validate(custom = "validate_delivery_options")]
    pub delivery_options: Vec<DeliveryOption>,

    #[validate(range(min = 18, max = 99))]
    pub min_driver_age: Option<i32>,

    #[validate(range(min = 1, max = 50))]
    pub min_license_years: Option<i32>,

    #[validate(length(max = 255))]
    pub meta_title: Option<String>,

    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
}

// Request para actualizar un post; los campos ausentes no cambian
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostRequest {
    pub vehicle_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub description: Option<String>,

    pub status: Option<PostStatus>,

    #[validate(custom = "validate_delivery_options")]
    pub delivery_options: Option<Vec<DeliveryOption>>,

    #[validate(range(min = 18, max = 99))]
    pub min_driver_age: Option<i32>,

    #[validate(range(min = 1, max = 50))]
    pub min_license_years: Option<i32>,

    #[validate(length(max = 255))]
    pub meta_title: Option<String>,

    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VehicleSummary {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub mileage: i32,
    pub price_per_day: Decimal,
    pub delivery_fee_per_km: Decimal,
    pub status: String,
    pub images: Vec<String>,
}

impl From<Vehicle> for VehicleSummary {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            brand: vehicle.brand,
            model: vehicle.model,
            year: vehicle.year,
            mileage: vehicle.mileage,
            price_per_day: vehicle.price_per_day,
            delivery_fee_per_km: vehicle.delivery_fee_per_km,
            status: vehicle.status.as_str().to_string(),
            images: vehicle
                .images
                .map(|images| images.0.into_iter().filter(|p| !p.trim().is_empty()).collect())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AgencySummary {
    pub id: Uuid,
    pub name: String,
    pub agency_coordinates: Option<String>,
    pub logo_path: Option<String>,
}

impl From<Agency> for AgencySummary {
    fn from(agency: Agency) -> Self {
        Self {
            id: agency.id,
            name: agency.name,
            agency_coordinates: agency.agency_coordinates,
            logo_path: agency.logo_path,
        }
    }
}

// Response de post con su vehículo y agencia
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub agency_id: Uuid,
    pub vehicle_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: PostStatus,
    pub delivery_options: Vec<DeliveryOption>,
    pub min_driver_age: i32,
    pub min_license_years: i32,
    pub view_count: i32,
    pub rental_count: i32,
    pub average_rating: Decimal,
    pub total_reviews: i32,
    pub rating_breakdown: RatingBreakdown,
    pub slug: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub vehicle: Option<VehicleSummary>,
    pub agency: Option<AgencySummary>,
}

impl PostResponse {
    pub fn build(post: Post, vehicle: Option<Vehicle>, agency: Option<Agency>) -> Self {
        let rating_breakdown = post.rating_breakdown();
        Self {
            id: post.id,
            agency_id: post.agency_id,
            vehicle_id: post.vehicle_id,
            title: post.title,
            description: post.description,
            status: post.status,
            delivery_options: post.delivery_options.0,
            min_driver_age: post.min_driver_age,
            min_license_years: post.min_license_years,
            view_count: post.view_count,
            rental_count: post.rental_count,
            average_rating: post.average_rating,
            total_reviews: post.total_reviews,
            rating_breakdown,
            slug: post.slug,
            meta_title: post.meta_title,
            meta_description: post.meta_description,
            created_at: post.created_at,
            updated_at: post.updated_at,
            vehicle: vehicle.map(VehicleSummary::from),
            agency: agency.map(AgencySummary::from),
        }
    }
}

// Response de detalle: post + comentarios vigentes
#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub comments: Vec<Review>,
}
