//! Datos de referencia: ciudades, vehículos y ajustes de temperatura

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub name_ar: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate_number: String,
    pub vehicle_type: String,
    pub capacity_kg: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Rango de temperatura para cargas refrigeradas
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TemperatureSetting {
    pub id: Uuid,
    pub label: String,
    pub min_celsius: Decimal,
    pub max_celsius: Decimal,
}

impl TemperatureSetting {
    pub fn is_valid_range(min: Decimal, max: Decimal) -> bool {
        min <= max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_range() {
        assert!(TemperatureSetting::is_valid_range(Decimal::from(-18), Decimal::from(-15)));
        assert!(TemperatureSetting::is_valid_range(Decimal::from(4), Decimal::from(4)));
        assert!(!TemperatureSetting::is_valid_range(Decimal::from(8), Decimal::from(2)));
    }
}
