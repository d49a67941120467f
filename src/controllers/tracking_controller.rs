use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::dto::tracking_dto::{HistoryQuery, TrackingHistoryResponse, TrackingPointRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::tracking::{self, ActiveTripPosition, TrackingLog};
use crate::repositories::tracking_repository::{NewTrackingPoint, TrackingRepository};
use crate::repositories::trip_repository::TripRepository;
use crate::services::metrics::Metrics;
use crate::utils::errors::{not_found_error, AppError};

pub struct TrackingController {
    repository: TrackingRepository,
    trips: TripRepository,
    metrics: Arc<Metrics>,
}

impl TrackingController {
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self {
            repository: TrackingRepository::new(pool.clone()),
            trips: TripRepository::new(pool),
            metrics,
        }
    }

    /// Registra una muestra GPS del conductor asignado a un viaje activo
    pub async fn record(&self, driver_id: Uuid, request: TrackingPointRequest) -> Result<TrackingLog, AppError> {
        tracking::validate_sample(request.latitude, request.longitude, request.speed, request.heading)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let trip = self
            .trips
            .find_by_id(request.trip_id)
            .await?
            .filter(|trip| trip.driver_id == Some(driver_id))
            .ok_or_else(|| not_found_error("Trip", &request.trip_id.to_string()))?;

        if !trip.status.is_active() {
            return Err(AppError::Conflict(format!(
                "Trip {} is {} and does not accept tracking",
                trip.trip_number, trip.status
            )));
        }

        let log = self
            .repository
            .insert(NewTrackingPoint {
                trip_id: trip.id,
                driver_id,
                latitude: request.latitude,
                longitude: request.longitude,
                speed: request.speed,
                heading: request.heading,
                recorded_at: request.timestamp.unwrap_or_else(Utc::now),
            })
            .await?;

        self.metrics.tracking_points.inc();
        debug!("📍 {} ({:.5}, {:.5})", trip.trip_number, log.latitude, log.longitude);
        Ok(log)
    }

    pub async fn history(
        &self,
        user: &AuthenticatedUser,
        trip_id: Uuid,
        query: HistoryQuery,
    ) -> Result<TrackingHistoryResponse, AppError> {
        let trip = self
            .trips
            .find_by_id(trip_id)
            .await?
            .filter(|trip| user.is_admin() || trip.involves(user.user_id))
            .ok_or_else(|| not_found_error("Trip", &trip_id.to_string()))?;

        let history = self.repository.history(trip.id, query.effective_limit()).await?;
        Ok(TrackingHistoryResponse {
            trip_id: trip.id,
            current: tracking::latest(&history).cloned(),
            distance_km: tracking::track_distance_km(&history),
            history,
        })
    }

    pub async fn active_positions(&self) -> Result<Vec<ActiveTripPosition>, AppError> {
        self.repository.latest_for_active_trips().await
    }
}
