//! Sesión de entrega a domicilio en el lado cliente
//!
//! Al elegir entrega se pide la ubicación del usuario. Con la ubicación la
//! distancia haversine queda como provisional y empieza la espera de la
//! distancia por ruta. El primero de los dos eventos (ruta calculada o fin de
//! la espera) fija la distancia; el segundo se ignora. Mover el punto de
//! entrega vuelve a abrir la espera.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::dto::reservation_dto::CreateReservationRequest;
use crate::models::PickupType;
use crate::services::geo::{self, Coordinates};
use crate::services::pricing::{rental_days, PriceQuote};

/// Espera por defecto de la distancia por ruta
pub const DEFAULT_FALLBACK: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Geolocation is not supported by your browser")]
    Unsupported,

    #[error("Unable to retrieve your location")]
    Unavailable,
}

/// Fuente de la ubicación del usuario (GPS, navegador, fija en tests)
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> Result<Coordinates, LocationError>;
}

/// Cómo quedó fijada la distancia
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceOutcome {
    /// Distancia por ruta válida, ya redondeada
    Routed(f64),
    /// Distancia haversine usada al vencer la espera
    Fallback(f64),
    /// Distancia por ruta fuera de rango; bloquea la reserva
    Rejected(f64),
}

impl DistanceOutcome {
    /// Distancia facturable; 0 si fue rechazada
    pub fn km(&self) -> f64 {
        match self {
            DistanceOutcome::Routed(km) | DistanceOutcome::Fallback(km) => *km,
            DistanceOutcome::Rejected(_) => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceLatch {
    Pending { provisional_km: f64 },
    Committed(DistanceOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    AgencyPickup,
    Delivery,
}

/// Motivo por el que no se puede reservar todavía
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutBlock {
    #[error("Please select rental dates")]
    MissingDates,

    #[error("End date must be after start date")]
    InvalidDates,

    #[error("Please select a delivery location")]
    MissingLocation,

    #[error("Calculating delivery distance...")]
    DistancePending,

    #[error("Delivery distance could not be calculated, please move the delivery point")]
    DistanceRejected,
}

#[derive(Debug, Clone)]
pub struct DeliverySession {
    agency: Coordinates,
    daily_rate: Decimal,
    fee_per_km: Decimal,
    mode: DeliveryMode,
    user_location: Option<Coordinates>,
    delivery_point: Option<Coordinates>,
    latch: Option<DistanceLatch>,
    location_error: Option<LocationError>,
    pickup: Option<DateTime<Utc>>,
    return_at: Option<DateTime<Utc>>,
}

impl DeliverySession {
    /// `agency_coordinates` es el texto libre guardado en la agencia
    pub fn new(agency_coordinates: Option<&str>, daily_rate: Decimal, fee_per_km: Decimal) -> Self {
        Self {
            agency: geo::normalize_text(agency_coordinates),
            daily_rate,
            fee_per_km,
            mode: DeliveryMode::AgencyPickup,
            user_location: None,
            delivery_point: None,
            latch: None,
            location_error: None,
            pickup: None,
            return_at: None,
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub fn agency(&self) -> Coordinates {
        self.agency
    }

    pub fn latch(&self) -> Option<DistanceLatch> {
        self.latch
    }

    pub fn delivery_point(&self) -> Option<Coordinates> {
        self.delivery_point
    }

    pub fn location_error(&self) -> Option<LocationError> {
        self.location_error
    }

    pub fn set_dates(&mut self, pickup: Option<DateTime<Utc>>, return_at: Option<DateTime<Utc>>) {
        self.pickup = pickup;
        self.return_at = return_at;
    }

    /// Vuelve a recogida en agencia: la distancia pasa a 0
    pub fn select_pickup(&mut self) {
        self.mode = DeliveryMode::AgencyPickup;
        self.delivery_point = None;
        self.latch = None;
    }

    /// Activa la entrega. Devuelve `true` si hace falta pedir la ubicación.
    pub fn select_delivery(&mut self) -> bool {
        self.mode = DeliveryMode::Delivery;
        match self.user_location {
            Some(location) => {
                let point = self.delivery_point.unwrap_or(location);
                self.open_latch(point);
                false
            }
            None => true,
        }
    }

    /// Pide la ubicación al proveedor. Un fallo queda registrado y se puede
    /// reintentar llamando de nuevo.
    pub async fn request_location<P>(&mut self, provider: &P) -> Result<(), LocationError>
    where
        P: LocationProvider + ?Sized,
    {
        match provider.current_location().await {
            Ok(location) => {
                self.location_acquired(location);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "📍 Ubicación no disponible");
                self.location_error = Some(err);
                Err(err)
            }
        }
    }

    pub fn location_acquired(&mut self, location: Coordinates) {
        self.location_error = None;
        self.user_location = Some(location);
        if self.mode == DeliveryMode::Delivery {
            let point = self.delivery_point.unwrap_or(location);
            self.open_latch(point);
        }
    }

    /// El usuario movió el punto de entrega en el mapa
    pub fn delivery_point_moved(&mut self, point: Coordinates) {
        if self.mode == DeliveryMode::Delivery {
            self.open_latch(point);
        }
    }

    fn open_latch(&mut self, point: Coordinates) {
        self.delivery_point = Some(point);
        self.latch = Some(DistanceLatch::Pending {
            provisional_km: geo::haversine_km(self.agency, point),
        });
    }

    /// Distancia por ruta (ya en km). Devuelve `true` si fijó la distancia.
    pub fn route_calculated(&mut self, km: f64) -> bool {
        match self.latch {
            Some(DistanceLatch::Pending { .. }) => {
                let outcome = match geo::validate_routed_distance(km) {
                    Ok(routed) => DistanceOutcome::Routed(routed),
                    Err(err) => {
                        tracing::warn!(error = %err, "📏 Distancia por ruta inválida");
                        DistanceOutcome::Rejected(km)
                    }
                };
                self.latch = Some(DistanceLatch::Committed(outcome));
                true
            }
            _ => false,
        }
    }

    /// Venció la espera: se fija la distancia haversine provisional
    pub fn fallback_elapsed(&mut self) -> bool {
        match self.latch {
            Some(DistanceLatch::Pending { provisional_km }) => {
                let km = geo::round_one_decimal(provisional_km);
                tracing::debug!(km, "⚠️ Usando distancia haversine");
                self.latch = Some(DistanceLatch::Committed(DistanceOutcome::Fallback(km)));
                true
            }
            _ => false,
        }
    }

    /// Resuelve la carrera entre la distancia por ruta y la espera.
    /// Si el emisor de la ruta desaparece se espera igualmente al vencimiento.
    pub async fn settle(
        &mut self,
        routed: oneshot::Receiver<f64>,
        fallback_after: Duration,
    ) -> Option<DistanceOutcome> {
        if let Some(DistanceLatch::Pending { .. }) = self.latch {
            let timer = tokio::time::sleep(fallback_after);
            tokio::pin!(timer);

            tokio::select! {
                Ok(km) = routed => {
                    self.route_calculated(km);
                }
                _ = &mut timer => {
                    self.fallback_elapsed();
                }
            }
        }

        self.committed()
    }

    pub fn committed(&self) -> Option<DistanceOutcome> {
        match self.latch {
            Some(DistanceLatch::Committed(outcome)) => Some(outcome),
            _ => None,
        }
    }

    /// Distancia que se factura ahora mismo (0 mientras no esté fijada)
    pub fn distance_km(&self) -> f64 {
        match self.mode {
            DeliveryMode::AgencyPickup => 0.0,
            DeliveryMode::Delivery => self.committed().map(|o| o.km()).unwrap_or(0.0),
        }
    }

    /// Comprueba si se puede reservar y devuelve el presupuesto
    pub fn checkout(&self) -> Result<PriceQuote, CheckoutBlock> {
        let (pickup, return_at) = match (self.pickup, self.return_at) {
            (Some(pickup), Some(return_at)) => (pickup, return_at),
            _ => return Err(CheckoutBlock::MissingDates),
        };

        let days = rental_days(pickup, return_at);
        if days <= 0 {
            return Err(CheckoutBlock::InvalidDates);
        }

        let delivery = match self.mode {
            DeliveryMode::AgencyPickup => None,
            DeliveryMode::Delivery => {
                if self.delivery_point.is_none() {
                    return Err(CheckoutBlock::MissingLocation);
                }
                match self.committed() {
                    None => return Err(CheckoutBlock::DistancePending),
                    Some(DistanceOutcome::Rejected(_)) => return Err(CheckoutBlock::DistanceRejected),
                    Some(outcome) if outcome.km() <= 0.0 => return Err(CheckoutBlock::DistancePending),
                    Some(outcome) => Some((outcome.km(), self.fee_per_km)),
                }
            }
        };

        Ok(PriceQuote::compute(days, self.daily_rate, delivery))
    }

    /// Petición de reserva con el desglose calculado en cliente
    pub fn reservation_request(
        &self,
        agency_id: Uuid,
        vehicle_id: Uuid,
    ) -> Result<CreateReservationRequest, CheckoutBlock> {
        let quote = self.checkout()?;
        let (pickup_date, return_date) = match (self.pickup, self.return_at) {
            (Some(p), Some(r)) => (p, r),
            _ => return Err(CheckoutBlock::MissingDates),
        };

        let (pickup_type, delivery_coordinates, delivery_distance_km) = match self.mode {
            DeliveryMode::AgencyPickup => (PickupType::Pickup, None, None),
            DeliveryMode::Delivery => (
                PickupType::Delivery,
                self.delivery_point.and_then(|p| serde_json::to_value(p).ok()),
                Some(self.distance_km()),
            ),
        };

        Ok(CreateReservationRequest {
            agency_id,
            vehicle_id,
            pickup_date,
            return_date,
            pickup_type,
            delivery_coordinates,
            delivery_distance_km,
            daily_rate: Some(quote.daily_rate),
            total_amount: Some(quote.total),
            delivery_fee: Some(quote.delivery_fee),
            final_amount: quote.total,
            discount_amount: Decimal::ZERO,
            equipment_cost: Decimal::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session() -> DeliverySession {
        DeliverySession::new(Some("[33.5731, -7.5898]"), Decimal::from(40), Decimal::new(15, 1))
    }

    fn with_dates(mut session: DeliverySession) -> DeliverySession {
        let pickup = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        session.set_dates(Some(pickup), Some(pickup + chrono::Duration::days(2)));
        session
    }

    struct Denied;

    #[async_trait]
    impl LocationProvider for Denied {
        async fn current_location(&self) -> Result<Coordinates, LocationError> {
            Err(LocationError::Unavailable)
        }
    }

    struct Fixed(Coordinates);

    #[async_trait]
    impl LocationProvider for Fixed {
        async fn current_location(&self) -> Result<Coordinates, LocationError> {
            Ok(self.0)
        }
    }

    #[test]
    fn second_event_is_ignored() {
        let mut s = session();
        s.select_delivery();
        s.location_acquired(Coordinates::new(-7.5, 33.6));

        assert!(s.route_calculated(12.44));
        assert!(!s.fallback_elapsed());
        assert_eq!(s.committed(), Some(DistanceOutcome::Routed(12.4)));
    }

    #[test]
    fn moving_the_point_reopens_the_latch() {
        let mut s = session();
        s.select_delivery();
        s.location_acquired(Coordinates::new(-7.5, 33.6));
        s.fallback_elapsed();
        assert!(s.committed().is_some());

        s.delivery_point_moved(Coordinates::new(-7.4, 33.7));
        assert!(matches!(s.latch(), Some(DistanceLatch::Pending { .. })));
        assert!(s.route_calculated(20.0));
        assert_eq!(s.distance_km(), 20.0);
    }

    #[test]
    fn agency_pickup_resets_distance() {
        let mut s = session();
        s.select_delivery();
        s.location_acquired(Coordinates::new(-7.5, 33.6));
        s.route_calculated(12.4);

        s.select_pickup();
        assert_eq!(s.distance_km(), 0.0);
        assert_eq!(s.latch(), None);
    }

    #[test]
    fn rejected_route_blocks_checkout() {
        let mut s = with_dates(session());
        s.select_delivery();
        s.location_acquired(Coordinates::new(-7.5, 33.6));
        s.route_calculated(12_000.0);

        assert_eq!(s.checkout(), Err(CheckoutBlock::DistanceRejected));
    }

    #[test]
    fn checkout_gate_messages() {
        let mut s = session();
        assert_eq!(s.checkout(), Err(CheckoutBlock::MissingDates));

        let pickup = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        s.set_dates(Some(pickup), Some(pickup));
        assert_eq!(s.checkout(), Err(CheckoutBlock::InvalidDates));

        let mut s = with_dates(session());
        assert!(s.select_delivery());
        assert_eq!(s.checkout(), Err(CheckoutBlock::MissingLocation));

        s.location_acquired(Coordinates::new(-7.5, 33.6));
        assert_eq!(s.checkout(), Err(CheckoutBlock::DistancePending));
        assert_eq!(
            CheckoutBlock::DistancePending.to_string(),
            "Calculating delivery distance..."
        );

        s.route_calculated(12.4);
        let quote = s.checkout().unwrap();
        assert_eq!(quote.total, Decimal::new(9860, 2));
    }

    #[tokio::test]
    async fn denied_location_is_retryable() {
        let mut s = session();
        s.select_delivery();

        assert_eq!(s.request_location(&Denied).await, Err(LocationError::Unavailable));
        assert_eq!(s.location_error(), Some(LocationError::Unavailable));
        assert_eq!(s.latch(), None);

        let here = Coordinates::new(-7.5, 33.6);
        assert_eq!(s.request_location(&Fixed(here)).await, Ok(()));
        assert_eq!(s.location_error(), None);
        assert_eq!(s.delivery_point(), Some(here));
    }

    #[test]
    fn reservation_request_carries_the_quote() {
        let mut s = with_dates(session());
        s.select_delivery();
        s.location_acquired(Coordinates::new(-7.5, 33.6));
        s.route_calculated(12.4);

        let request = s.reservation_request(Uuid::nil(), Uuid::nil()).unwrap();
        assert_eq!(request.pickup_type, PickupType::Delivery);
        assert_eq!(request.delivery_distance_km, Some(12.4));
        assert_eq!(request.final_amount, Decimal::new(9860, 2));
        assert_eq!(
            request.delivery_coordinates,
            Some(serde_json::json!({"lng": -7.5, "lat": 33.6}))
        );
    }
}
