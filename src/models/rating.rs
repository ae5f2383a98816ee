//! Resumen de valoraciones de un post
//!
//! El resumen se calcula siempre desde cero a partir de las valoraciones
//! vigentes; nunca se ajusta de forma incremental.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Histograma de estrellas, serializado como `{"5":n,"4":n,...,"1":n}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDistribution {
    #[serde(rename = "5", default)]
    pub five: i64,
    #[serde(rename = "4", default)]
    pub four: i64,
    #[serde(rename = "3", default)]
    pub three: i64,
    #[serde(rename = "2", default)]
    pub two: i64,
    #[serde(rename = "1", default)]
    pub one: i64,
}

impl RatingDistribution {
    pub fn count(&self, stars: u8) -> i64 {
        match stars {
            5 => self.five,
            4 => self.four,
            3 => self.three,
            2 => self.two,
            1 => self.one,
            _ => 0,
        }
    }

    fn bump(&mut self, stars: i32) {
        match stars {
            5 => self.five += 1,
            4 => self.four += 1,
            3 => self.three += 1,
            2 => self.two += 1,
            1 => self.one += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingSummary {
    pub average: Decimal,
    pub total: i64,
    pub distribution: RatingDistribution,
}

impl RatingSummary {
    pub fn empty() -> Self {
        Self {
            average: Decimal::ZERO,
            total: 0,
            distribution: RatingDistribution::default(),
        }
    }

    /// Agrega las valoraciones vigentes. Los valores fuera de 1..=5 se descartan.
    pub fn from_ratings(ratings: &[i32]) -> Self {
        let valid: Vec<i32> = ratings.iter().copied().filter(|r| (1..=5).contains(r)).collect();
        if valid.is_empty() {
            return Self::empty();
        }

        let mut distribution = RatingDistribution::default();
        for rating in &valid {
            distribution.bump(*rating);
        }

        let sum: i64 = valid.iter().map(|r| i64::from(*r)).sum();
        let total = valid.len() as i64;
        let average = (Decimal::from(sum) / Decimal::from(total))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Self {
            average,
            total,
            distribution,
        }
    }

    /// La columna `rating_distribution` queda a NULL cuando no hay valoraciones
    pub fn stored_distribution(&self) -> Option<RatingDistribution> {
        (self.total > 0).then_some(self.distribution)
    }

    pub fn breakdown(&self) -> RatingBreakdown {
        let stars = [5u8, 4, 3, 2, 1].map(|s| StarCount {
            stars: s,
            count: self.distribution.count(s),
            percentage: if self.total == 0 {
                0.0
            } else {
                let pct = self.distribution.count(s) as f64 / self.total as f64 * 100.0;
                (pct * 10.0).round() / 10.0
            },
        });

        RatingBreakdown {
            average: self.average.to_f64().unwrap_or(0.0),
            total: self.total,
            stars: stars.to_vec(),
        }
    }
}

/// Vista del resumen para el frontend (barras de porcentaje por estrella)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBreakdown {
    pub average: f64,
    pub total: i64,
    pub stars: Vec<StarCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StarCount {
    pub stars: u8,
    pub count: i64,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn summary_of_mixed_ratings() {
        let summary = RatingSummary::from_ratings(&[5, 4, 4]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.average, Decimal::from_str("4.33").unwrap());
        assert_eq!(summary.distribution.five, 1);
        assert_eq!(summary.distribution.four, 2);
        assert_eq!(summary.distribution.one, 0);
    }

    #[test]
    fn average_rounds_half_away_from_zero() {
        // 4.125 -> 4.13
        let summary = RatingSummary::from_ratings(&[5, 4, 4, 4, 4, 4, 4, 4]);
        assert_eq!(summary.average, Decimal::from_str("4.13").unwrap());
    }

    #[test]
    fn empty_and_out_of_range_ratings_give_empty_summary() {
        assert_eq!(RatingSummary::from_ratings(&[]), RatingSummary::empty());
        let summary = RatingSummary::from_ratings(&[0, 7]);
        assert_eq!(summary.total, 0);
        assert!(summary.stored_distribution().is_none());
    }

    #[test]
    fn breakdown_percentages() {
        let breakdown = RatingSummary::from_ratings(&[5, 5, 1]).breakdown();
        assert_eq!(breakdown.stars[0].stars, 5);
        assert_eq!(breakdown.stars[0].percentage, 66.7);
        assert_eq!(breakdown.stars[4].percentage, 33.3);
        assert_eq!(breakdown.stars[2].percentage, 0.0);
    }

    #[test]
    fn distribution_serializes_with_star_keys() {
        let summary = RatingSummary::from_ratings(&[3]);
        let json = serde_json::to_value(summary.distribution).unwrap();
        assert_eq!(json["3"], 1);
        assert_eq!(json["5"], 0);
    }
}
