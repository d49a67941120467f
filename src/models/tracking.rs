//! Modelo de TrackingLog
//!
//! Muestras GPS enviadas por el conductor durante un viaje activo.
//! La tabla es de solo inserción; la posición actual es la muestra con
//! mayor `recorded_at`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::trip::TripStatus;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrackingLog {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub driver_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

/// Última posición de un viaje en curso, para el mapa de flota
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActiveTripPosition {
    pub trip_id: Uuid,
    pub trip_number: String,
    pub status: TripStatus,
    pub driver_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

/// Errores de una muestra GPS
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("latitude must be between -90 and 90")]
    Latitude,
    #[error("longitude must be between -180 and 180")]
    Longitude,
    #[error("speed must be a non-negative number")]
    Speed,
    #[error("heading must be in [0, 360)")]
    Heading,
}

/// Valida una muestra antes de persistirla
pub fn validate_sample(
    latitude: f64,
    longitude: f64,
    speed: Option<f64>,
    heading: Option<f64>,
) -> Result<(), CoordinateError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(CoordinateError::Latitude);
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(CoordinateError::Longitude);
    }
    if let Some(speed) = speed {
        if !speed.is_finite() || speed < 0.0 {
            return Err(CoordinateError::Speed);
        }
    }
    if let Some(heading) = heading {
        if !heading.is_finite() || !(0.0..360.0).contains(&heading) {
            return Err(CoordinateError::Heading);
        }
    }
    Ok(())
}

/// Muestra más reciente por `recorded_at`, sin importar el orden de llegada
pub fn latest(points: &[TrackingLog]) -> Option<&TrackingLog> {
    points.iter().max_by_key(|p| p.recorded_at)
}

/// Distancia de círculo máximo entre dos puntos, en km
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Longitud total de un recorrido ordenado cronológicamente
pub fn track_distance_km(points: &[TrackingLog]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_km(w[0].latitude, w[0].longitude, w[1].latitude, w[1].longitude))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(lat: f64, lng: f64, minutes: i64) -> TrackingLog {
        TrackingLog {
            id: Uuid::new_v4(),
            trip_id: Uuid::nil(),
            driver_id: Uuid::nil(),
            latitude: lat,
            longitude: lng,
            speed: None,
            heading: None,
            recorded_at: Utc.timestamp_opt(minutes * 60, 0).unwrap(),
        }
    }

    #[test]
    fn test_validate_sample_bounds() {
        assert!(validate_sample(24.7136, 46.6753, Some(80.0), Some(359.9)).is_ok());
        assert!(validate_sample(-90.0, 180.0, None, Some(0.0)).is_ok());
        assert_eq!(validate_sample(90.1, 0.0, None, None), Err(CoordinateError::Latitude));
        assert_eq!(validate_sample(0.0, -180.5, None, None), Err(CoordinateError::Longitude));
        assert_eq!(validate_sample(0.0, 0.0, Some(-1.0), None), Err(CoordinateError::Speed));
        assert_eq!(validate_sample(0.0, 0.0, None, Some(360.0)), Err(CoordinateError::Heading));
        assert_eq!(validate_sample(f64::NAN, 0.0, None, None), Err(CoordinateError::Latitude));
    }

    #[test]
    fn test_latest_uses_timestamp_not_order() {
        let points = vec![point(1.0, 1.0, 10), point(3.0, 3.0, 30), point(2.0, 2.0, 20)];
        let current = latest(&points).unwrap();
        assert_eq!(current.latitude, 3.0);
        assert!(latest(&[]).is_none());
    }

    #[test]
    fn test_haversine_riyadh_jeddah() {
        // Riyadh -> Jeddah, ~850 km en línea recta
        let d = haversine_km(24.7136, 46.6753, 21.4858, 39.1925);
        assert!((d - 850.0).abs() < 15.0, "distance was {}", d);
        assert_eq!(haversine_km(10.0, 10.0, 10.0, 10.0), 0.0);
    }

    #[test]
    fn test_track_distance() {
        let points = vec![point(0.0, 0.0, 0), point(0.0, 1.0, 1), point(0.0, 2.0, 2)];
        let d = track_distance_km(&points);
        assert!((d - 222.4).abs() < 1.0, "distance was {}", d);
        assert_eq!(track_distance_km(&points[..1]), 0.0);
    }
}
