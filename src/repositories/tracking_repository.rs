use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::tracking::{ActiveTripPosition, TrackingLog};
use crate::utils::errors::AppError;

/// Muestra GPS ya validada
pub struct NewTrackingPoint {
    pub trip_id: Uuid,
    pub driver_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

pub struct TrackingRepository {
    pool: PgPool,
}

impl TrackingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, point: NewTrackingPoint) -> Result<TrackingLog, AppError> {
        let log = sqlx::query_as::<_, TrackingLog>(
            r#"
            INSERT INTO tracking_logs (id, trip_id, driver_id, latitude, longitude, speed, heading, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(point.trip_id)
        .bind(point.driver_id)
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(point.speed)
        .bind(point.heading)
        .bind(point.recorded_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(log)
    }

    /// Las `limit` muestras más recientes, en orden cronológico
    pub async fn history(&self, trip_id: Uuid, limit: i64) -> Result<Vec<TrackingLog>, AppError> {
        let logs = sqlx::query_as::<_, TrackingLog>(
            r#"
            SELECT * FROM (
                SELECT * FROM tracking_logs WHERE trip_id = $1 ORDER BY recorded_at DESC LIMIT $2
            ) recent
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(trip_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    /// Última muestra de cada viaje en estado activo
    pub async fn latest_for_active_trips(&self) -> Result<Vec<ActiveTripPosition>, AppError> {
        let positions = sqlx::query_as::<_, ActiveTripPosition>(
            r#"
            SELECT DISTINCT ON (l.trip_id)
                   l.trip_id, t.trip_number, t.status, l.driver_id, l.latitude, l.longitude,
                   l.speed, l.heading, l.recorded_at
            FROM tracking_logs l
            JOIN trips t ON t.id = l.trip_id
            WHERE t.status IN ('ASSIGNED', 'IN_PROGRESS', 'EN_ROUTE', 'AT_DESTINATION')
            ORDER BY l.trip_id, l.recorded_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(positions)
    }
}
