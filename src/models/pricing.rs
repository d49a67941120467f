//! Modelo de Pricing
//!
//! Tabla de tarifas indexada por (ciudad origen, ciudad destino, vehículo).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Pricing {
    pub id: Uuid,
    pub from_city_id: Uuid,
    pub to_city_id: Uuid,
    pub vehicle_id: Uuid,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tarifa con nombres resueltos, para listados y exportación
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PricingView {
    pub id: Uuid,
    pub from_city_id: Uuid,
    pub from_city: String,
    pub to_city_id: Uuid,
    pub to_city: String,
    pub vehicle_id: Uuid,
    pub vehicle_plate: String,
    pub vehicle_type: String,
    pub price: Decimal,
    pub updated_at: DateTime<Utc>,
}
