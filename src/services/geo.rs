//! Coordenadas y distancias
//!
//! Las coordenadas llegan en formatos heterogéneos (JSON serializado,
//! "lat,lng" entre corchetes, pares ordenados u objetos `{lat,lng}`). Aquí se
//! normalizan a un único tipo `Coordinates` (longitud, latitud) y se calcula
//! la distancia de círculo máximo.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Radio medio de la Tierra en kilómetros
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Límite superior (exclusivo) aceptado para una distancia por ruta
pub const MAX_ROUTED_DISTANCE_KM: f64 = 10_000.0;

/// Coordenada usada cuando la entrada no se puede interpretar
pub const DEFAULT_COORDINATES: Coordinates = Coordinates {
    longitude: -7.0926,
    latitude: 31.7917,
};

/// Punto normalizado, siempre en orden (longitud, latitud).
///
/// Se serializa como objeto `{"lng":..,"lat":..}` para que volver a
/// normalizarlo no dependa de inferir el orden de los ejes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lng")]
    pub longitude: f64,
    #[serde(rename = "lat")]
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    /// Interpreta un valor JSON; `None` si no tiene forma de coordenada
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Self::from_text(text),
            Value::Array(items) if items.len() == 2 => {
                let first = number(&items[0])?;
                let second = number(&items[1])?;
                Some(Self::from_ordered_pair(first, second))
            }
            Value::Object(map) => {
                let lat = map.get("lat").or_else(|| map.get("latitude")).and_then(number)?;
                let lng = map
                    .get("lng")
                    .or_else(|| map.get("lon"))
                    .or_else(|| map.get("longitude"))
                    .and_then(number)?;
                Some(Self::new(lng, lat))
            }
            _ => None,
        }
    }

    /// Interpreta texto libre: JSON serializado o `"lat,lng"` con o sin corchetes
    pub fn from_text(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
                return Self::from_value(&parsed);
            }
        }

        let cleaned: String = trimmed.chars().filter(|c| *c != '[' && *c != ']').collect();
        let parts: Vec<&str> = cleaned.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat = parse_finite(parts[0])?;
        let lng = parse_finite(parts[1])?;
        Some(Self::new(lng, lat))
    }

    /// Infere el orden de los ejes por magnitud: solo la latitud cabe en ±90.
    /// Si ambos valores caben se asume `[lat, lng]`.
    fn from_ordered_pair(first: f64, second: f64) -> Self {
        if first.abs() > 90.0 {
            Self::new(first, second)
        } else {
            Self::new(second, first)
        }
    }
}

/// Normaliza un valor JSON arbitrario; devuelve la coordenada por defecto si no
/// se puede interpretar.
pub fn normalize_value(value: &Value) -> Coordinates {
    Coordinates::from_value(value).unwrap_or(DEFAULT_COORDINATES)
}

/// Normaliza el texto guardado en base de datos (p. ej. `agency_coordinates`)
pub fn normalize_text(text: Option<&str>) -> Coordinates {
    text.and_then(Coordinates::from_text)
        .unwrap_or(DEFAULT_COORDINATES)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_finite(s),
        _ => None,
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Distancia haversine en kilómetros
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let h = ((d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lng / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DistanceError {
    #[error("delivery distance {0} km is out of range")]
    OutOfRange(f64),
}

/// Valida una distancia por ruta (ya en km): se redondea a un decimal y debe
/// quedar en el intervalo abierto (0, 10000).
pub fn validate_routed_distance(km: f64) -> Result<f64, DistanceError> {
    if !km.is_finite() {
        return Err(DistanceError::OutOfRange(km));
    }
    let rounded = round_one_decimal(km);
    if rounded > 0.0 && rounded < MAX_ROUTED_DISTANCE_KM {
        Ok(rounded)
    } else {
        Err(DistanceError::OutOfRange(rounded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bracketed_string_is_lat_lng() {
        let c = Coordinates::from_text("[31.63, -8.00]").unwrap();
        assert_eq!(c, Coordinates::new(-8.00, 31.63));
    }

    #[test]
    fn json_string_is_parsed_recursively() {
        let c = normalize_value(&json!("{\"latitude\": \"33.5\", \"longitude\": \"-7.6\"}"));
        assert_eq!(c, Coordinates::new(-7.6, 33.5));
    }

    #[test]
    fn pair_axis_inference() {
        // |second| > 90: second is the longitude
        assert_eq!(normalize_value(&json!([45.0, 120.0])), Coordinates::new(120.0, 45.0));
        // |first| > 90: already [lng, lat]
        assert_eq!(normalize_value(&json!([-120.0, 45.0])), Coordinates::new(-120.0, 45.0));
        // ambiguous: assume [lat, lng]
        assert_eq!(normalize_value(&json!(["31.6", "-8"])), Coordinates::new(-8.0, 31.6));
    }

    #[test]
    fn garbage_yields_default() {
        assert_eq!(normalize_value(&json!(null)), DEFAULT_COORDINATES);
        assert_eq!(normalize_value(&json!([1, 2, 3])), DEFAULT_COORDINATES);
        assert_eq!(normalize_value(&json!({"lat": 1})), DEFAULT_COORDINATES);
        assert_eq!(normalize_text(Some("somewhere")), DEFAULT_COORDINATES);
        assert_eq!(normalize_text(None), DEFAULT_COORDINATES);
    }

    #[test]
    fn haversine_known_distance() {
        // Casablanca -> Rabat, ~85 km
        let casablanca = Coordinates::new(-7.5898, 33.5731);
        let rabat = Coordinates::new(-6.8498, 34.0209);
        let km = haversine_km(casablanca, rabat);
        assert!((km - 84.6).abs() < 0.1, "got {}", km);
    }

    #[test]
    fn routed_distance_bounds() {
        assert_eq!(validate_routed_distance(12.44), Ok(12.4));
        assert!(validate_routed_distance(0.04).is_err());
        assert!(validate_routed_distance(10_000.0).is_err());
        assert!(validate_routed_distance(f64::NAN).is_err());
    }
}
