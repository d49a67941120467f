use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::tracking_controller::TrackingController;
use crate::dto::api_response::ApiResponse;
use crate::dto::tracking_dto::{HistoryQuery, TrackingHistoryResponse, TrackingPointRequest};
use crate::middleware::auth::{require_roles, AuthenticatedUser, ANY_ROLE, DRIVER_ONLY};
use crate::models::tracking::TrackingLog;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// El conductor publica posiciones; la consulta queda abierta a cualquier
/// rol y se filtra por participación en el viaje
pub fn create_tracking_router(state: &AppState) -> Router<AppState> {
    let ingest = Router::new()
        .route("/", post(record_point))
        .route_layer(middleware::from_fn_with_state((state.clone(), DRIVER_ONLY), require_roles));

    Router::new()
        .route("/:trip_id", get(trip_history))
        .route_layer(middleware::from_fn_with_state((state.clone(), ANY_ROLE), require_roles))
        .merge(ingest)
}

async fn record_point(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<TrackingPointRequest>,
) -> Result<Json<ApiResponse<TrackingLog>>, AppError> {
    let controller = TrackingController::new(state.pool.clone(), state.metrics.clone());
    Ok(Json(ApiResponse::success(controller.record(user.user_id, request).await?)))
}

async fn trip_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(trip_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<TrackingHistoryResponse>>, AppError> {
    let controller = TrackingController::new(state.pool.clone(), state.metrics.clone());
    Ok(Json(ApiResponse::success(controller.history(&user, trip_id, query).await?)))
}
