//! Controlador de reservas
//!
//! El cliente envía su propio desglose de precio. Aquí se recalcula con los
//! datos del vehículo y se rechaza si el importe final no coincide.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::reservation_dto::{CreateReservationRequest, ReservationResponse};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::{Agency, DeliveryOption, PickupType, Post, Reservation, Vehicle};
use crate::repositories::reservation_repository::NewReservation;
use crate::repositories::{AgencyRepository, PostRepository, ReservationRepository, VehicleRepository};
use crate::services::geo::{self, Coordinates};
use crate::services::pricing::{rental_days, PriceQuote};
use crate::utils::errors::{not_found_error, validation_error, AppError};

/// Resultado de conciliar la petición con los datos del servidor
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledPrice {
    pub quote: PriceQuote,
    pub delivery_point: Option<Coordinates>,
}

/// Recalcula el precio de la reserva.
///
/// La distancia por ruta del cliente se acepta si está en rango; si no, se usa
/// la distancia haversine entre la agencia y el punto de entrega.
pub fn reconcile_price(
    request: &CreateReservationRequest,
    vehicle: &Vehicle,
    agency: &Agency,
    post: &Post,
) -> Result<ReconciledPrice, AppError> {
    let days = rental_days(request.pickup_date, request.return_date);
    if days <= 0 {
        return Err(validation_error("return_date", "Return date must be after the pickup date"));
    }

    let mut delivery_point = None;
    let delivery = match request.pickup_type {
        PickupType::Pickup => None,
        PickupType::Delivery => {
            if !post.offers(DeliveryOption::Delivery) {
                return Err(validation_error("pickup_type", "This listing does not offer delivery"));
            }

            let point = request
                .delivery_coordinates
                .as_ref()
                .and_then(Coordinates::from_value)
                .ok_or_else(|| {
                    validation_error("delivery_coordinates", "A delivery location is required")
                })?;

            let km = match request.delivery_distance_km.map(geo::validate_routed_distance) {
                Some(Ok(routed)) => routed,
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "📏 Distancia por ruta descartada, se usa haversine");
                    haversine_from_agency(agency, point)
                }
                None => haversine_from_agency(agency, point),
            };

            if km <= 0.0 {
                return Err(validation_error(
                    "delivery_distance_km",
                    "Delivery distance could not be determined",
                ));
            }

            delivery_point = Some(point);
            Some((km, vehicle.delivery_fee_per_km))
        }
    };

    let quote = PriceQuote::compute(days, vehicle.price_per_day, delivery);
    let client_total = request.final_amount + request.discount_amount - request.equipment_cost;
    if !quote.agrees_with(client_total) {
        tracing::warn!(
            expected = %quote.total,
            received = %client_total,
            "💰 Importe de la reserva no coincide"
        );
        return Err(validation_error(
            "final_amount",
            "The amount does not match the current price of this vehicle",
        ));
    }

    Ok(ReconciledPrice {
        quote,
        delivery_point,
    })
}

fn haversine_from_agency(agency: &Agency, point: Coordinates) -> f64 {
    let origin = geo::normalize_text(agency.agency_coordinates.as_deref());
    geo::round_one_decimal(geo::haversine_km(origin, point))
}

/// Número legible de reserva: `RES-AAAAMMDD-XXXXXX`
pub fn generate_reservation_number() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("RES-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

pub struct ReservationController {
    reservations: ReservationRepository,
    vehicles: VehicleRepository,
    agencies: AgencyRepository,
    posts: PostRepository,
}

impl ReservationController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            reservations: ReservationRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            agencies: AgencyRepository::new(pool.clone()),
            posts: PostRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        user: AuthenticatedUser,
        request: CreateReservationRequest,
    ) -> Result<ApiResponse<ReservationResponse>, AppError> {
        request.validate()?;

        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &request.vehicle_id.to_string()))?;
        if vehicle.agency_id != request.agency_id {
            return Err(validation_error("vehicle_id", "The vehicle does not belong to this agency"));
        }

        let agency = self
            .agencies
            .find_by_id(request.agency_id)
            .await?
            .ok_or_else(|| not_found_error("Agency", &request.agency_id.to_string()))?;
        let post = self
            .posts
            .find_published_by_vehicle(vehicle.id)
            .await?
            .ok_or_else(|| AppError::NotFound("This vehicle is not listed for rent".to_string()))?;

        let reconciled = reconcile_price(&request, &vehicle, &agency, &post)?;
        let delivery_coordinates = reconciled
            .delivery_point
            .map(|point| serde_json::to_string(&point))
            .transpose()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let quote = reconciled.quote;

        let reservation = self
            .reservations
            .create(NewReservation {
                reservation_number: generate_reservation_number(),
                user_id: user.user_id,
                agency_id: agency.id,
                vehicle_id: vehicle.id,
                pickup_date: request.pickup_date,
                return_date: request.return_date,
                pickup_type: request.pickup_type,
                delivery_coordinates,
                delivery_distance_km: quote.delivery_distance_km,
                daily_rate: quote.daily_rate,
                total_amount: quote.total,
                delivery_fee: quote.delivery_fee,
                discount_amount: request.discount_amount,
                equipment_cost: request.equipment_cost,
                final_amount: final_amount(&quote, &request),
            })
            .await?;

        tracing::info!(
            reservation = %reservation.reservation_number,
            days = quote.days,
            total = %quote.total,
            "🚗 Reserva creada"
        );

        Ok(ApiResponse::success_with_message(
            ReservationResponse {
                reservation,
                quote: Some(quote),
            },
            "Reservation created successfully",
        ))
    }

    pub async fn list_mine(&self, user: AuthenticatedUser) -> Result<Vec<Reservation>, AppError> {
        self.reservations.find_by_user(user.user_id).await
    }

    pub async fn show(&self, user: AuthenticatedUser, id: Uuid) -> Result<ReservationResponse, AppError> {
        let reservation = self
            .reservations
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Reservation", &id.to_string()))?;

        if reservation.user_id != user.user_id {
            return Err(AppError::Forbidden("You cannot view this reservation".to_string()));
        }

        Ok(ReservationResponse {
            reservation,
            quote: None,
        })
    }
}

fn final_amount(quote: &PriceQuote, request: &CreateReservationRequest) -> Decimal {
    quote.total + request.equipment_cost - request.discount_amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostStatus, VehicleStatus};
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use sqlx::types::Json;

    fn vehicle(agency_id: Uuid) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            agency_id,
            brand: "Dacia".into(),
            model: "Logan".into(),
            year: 2022,
            mileage: 30_000,
            price_per_day: Decimal::from(40),
            delivery_fee_per_km: Decimal::new(15, 1),
            status: VehicleStatus::Available,
            images: None,
            created_at: Utc::now(),
        }
    }

    fn agency() -> Agency {
        Agency {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Atlas Cars".into(),
            agency_coordinates: Some("[33.5731, -7.5898]".into()),
            logo_path: None,
            created_at: Utc::now(),
        }
    }

    fn post(agency: &Agency, vehicle: &Vehicle, options: Vec<DeliveryOption>) -> Post {
        Post {
            id: Uuid::new_v4(),
            agency_id: agency.id,
            vehicle_id: vehicle.id,
            title: "Logan".into(),
            description: "Clean".into(),
            status: PostStatus::Published,
            delivery_options: Json(options),
            min_driver_age: 21,
            min_license_years: 2,
            view_count: 0,
            rental_count: 0,
            average_rating: Decimal::ZERO,
            total_reviews: 0,
            rating_distribution: None,
            slug: "logan".into(),
            meta_title: None,
            meta_description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(agency: &Agency, vehicle: &Vehicle) -> CreateReservationRequest {
        let pickup = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        CreateReservationRequest {
            agency_id: agency.id,
            vehicle_id: vehicle.id,
            pickup_date: pickup,
            return_date: pickup + Duration::days(3),
            pickup_type: PickupType::Pickup,
            delivery_coordinates: None,
            delivery_distance_km: None,
            daily_rate: None,
            total_amount: None,
            delivery_fee: None,
            final_amount: Decimal::from(120),
            discount_amount: Decimal::ZERO,
            equipment_cost: Decimal::ZERO,
        }
    }

    #[test]
    fn agency_pickup_is_days_times_rate() {
        let agency = agency();
        let vehicle = vehicle(agency.id);
        let post = post(&agency, &vehicle, vec![DeliveryOption::AgencyPickup]);

        let reconciled = reconcile_price(&request(&agency, &vehicle), &vehicle, &agency, &post).unwrap();
        assert_eq!(reconciled.quote.total, Decimal::from(120));
        assert_eq!(reconciled.delivery_point, None);
    }

    #[test]
    fn routed_distance_is_trusted_when_in_range() {
        let agency = agency();
        let vehicle = vehicle(agency.id);
        let post = post(&agency, &vehicle, vec![DeliveryOption::Delivery]);
        let mut req = request(&agency, &vehicle);
        req.pickup_type = PickupType::Delivery;
        req.delivery_coordinates = Some(json!({"lat": 33.6, "lng": -7.5}));
        req.delivery_distance_km = Some(12.4);
        req.final_amount = Decimal::new(13860, 2);

        let reconciled = reconcile_price(&req, &vehicle, &agency, &post).unwrap();
        assert_eq!(reconciled.quote.delivery_distance_km, Some(Decimal::new(124, 1)));
        assert_eq!(reconciled.quote.delivery_fee, Decimal::new(1860, 2));
    }

    #[test]
    fn out_of_range_distance_falls_back_to_haversine() {
        let agency = agency();
        let vehicle = vehicle(agency.id);
        let post = post(&agency, &vehicle, vec![DeliveryOption::Delivery]);
        let point = Coordinates::new(-6.8498, 34.0209);
        let km = haversine_from_agency(&agency, point);
        let quote = PriceQuote::compute(3, vehicle.price_per_day, Some((km, vehicle.delivery_fee_per_km)));

        let mut req = request(&agency, &vehicle);
        req.pickup_type = PickupType::Delivery;
        req.delivery_coordinates = Some(json!([34.0209, -6.8498]));
        req.delivery_distance_km = Some(25_000.0);
        req.final_amount = quote.total;

        let reconciled = reconcile_price(&req, &vehicle, &agency, &post).unwrap();
        assert_eq!(reconciled.quote, quote);
        assert_eq!(reconciled.delivery_point, Some(point));
    }

    #[test]
    fn mismatched_amount_is_rejected_on_final_amount() {
        let agency = agency();
        let vehicle = vehicle(agency.id);
        let post = post(&agency, &vehicle, vec![DeliveryOption::AgencyPickup]);
        let mut req = request(&agency, &vehicle);
        req.final_amount = Decimal::from(100);

        match reconcile_price(&req, &vehicle, &agency, &post) {
            Err(AppError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("final_amount"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn delivery_needs_listing_support_and_location() {
        let agency = agency();
        let vehicle = vehicle(agency.id);
        let mut req = request(&agency, &vehicle);
        req.pickup_type = PickupType::Delivery;

        let pickup_only = post(&agency, &vehicle, vec![DeliveryOption::AgencyPickup]);
        assert!(reconcile_price(&req, &vehicle, &agency, &pickup_only).is_err());

        let delivering = post(&agency, &vehicle, vec![DeliveryOption::Delivery]);
        match reconcile_price(&req, &vehicle, &agency, &delivering) {
            Err(AppError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("delivery_coordinates"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let agency = agency();
        let vehicle = vehicle(agency.id);
        let post = post(&agency, &vehicle, vec![DeliveryOption::AgencyPickup]);
        let mut req = request(&agency, &vehicle);
        req.return_date = req.pickup_date;

        assert!(reconcile_price(&req, &vehicle, &agency, &post).is_err());
    }

    #[test]
    fn reservation_numbers_have_date_and_suffix() {
        let number = generate_reservation_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "RES");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
