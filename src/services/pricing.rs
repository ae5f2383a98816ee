//! Cálculo del precio de una reserva
//!
//! total = días × tarifa diaria + (entrega ? distancia × tarifa por km : 0)

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Días facturables: la diferencia redondeada hacia arriba a días completos.
/// Cero si la devolución no es posterior a la recogida.
pub fn rental_days(pickup: DateTime<Utc>, return_at: DateTime<Utc>) -> i64 {
    let millis = (return_at - pickup).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }
}

/// Distancia en km con un decimal, como la muestra el frontend
pub fn distance_decimal(km: f64) -> Decimal {
    Decimal::from_f64(km)
        .unwrap_or_default()
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub days: i64,
    pub daily_rate: Decimal,
    pub base_price: Decimal,
    pub delivery_distance_km: Option<Decimal>,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

impl PriceQuote {
    /// `delivery` es `(distancia_km, tarifa_por_km)` cuando hay entrega a domicilio
    pub fn compute(days: i64, daily_rate: Decimal, delivery: Option<(f64, Decimal)>) -> Self {
        let base_price = if days > 0 {
            money(Decimal::from(days) * daily_rate)
        } else {
            Decimal::ZERO
        };

        let (delivery_distance_km, delivery_fee) = match delivery {
            Some((km, fee_per_km)) if km > 0.0 => {
                let distance = distance_decimal(km);
                (Some(distance), money(distance * fee_per_km))
            }
            _ => (None, Decimal::ZERO),
        };

        Self {
            days,
            daily_rate,
            base_price,
            delivery_distance_km,
            delivery_fee,
            total: base_price + delivery_fee,
        }
    }

    /// Compara un importe calculado por el cliente con tolerancia de un céntimo
    pub fn agrees_with(&self, client_total: Decimal) -> bool {
        (self.total - client_total).abs() <= Decimal::new(1, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn partial_days_round_up() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(rental_days(start, start + Duration::hours(24)), 1);
        assert_eq!(rental_days(start, start + Duration::hours(25)), 2);
        assert_eq!(rental_days(start, start), 0);
        assert_eq!(rental_days(start, start - Duration::hours(3)), 0);
    }

    #[test]
    fn quote_with_delivery() {
        let quote = PriceQuote::compute(3, Decimal::from(40), Some((12.44, Decimal::new(15, 1))));
        assert_eq!(quote.base_price, Decimal::from(120));
        assert_eq!(quote.delivery_distance_km, Some(Decimal::new(124, 1)));
        assert_eq!(quote.delivery_fee, Decimal::new(1860, 2));
        assert_eq!(quote.total, Decimal::new(13860, 2));
        assert!(quote.agrees_with(Decimal::new(13860, 2)));
        assert!(!quote.agrees_with(Decimal::from(120)));
    }

    #[test]
    fn quote_without_delivery() {
        let quote = PriceQuote::compute(2, Decimal::new(3550, 2), None);
        assert_eq!(quote.total, Decimal::from(71));
        assert_eq!(quote.delivery_fee, Decimal::ZERO);
        assert_eq!(quote.delivery_distance_km, None);
    }
}
