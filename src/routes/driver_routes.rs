use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::dashboard_controller::DashboardController;
use crate::controllers::trip_controller::TripController;
use crate::dto::api_response::ApiResponse;
use crate::dto::dashboard_dto::DriverDashboard;
use crate::dto::trip_dto::{TripListQuery, UpdateTripStatusRequest};
use crate::middleware::auth::{require_roles, AuthenticatedUser, DRIVER_ONLY};
use crate::models::trip::{Trip, TripView};
use crate::repositories::trip_repository::TripFilter;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips))
        .route("/trips/available", get(available_trips))
        .route("/trips/:id/request", post(request_trip))
        .route("/trips/:id/status", post(set_status))
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state((state.clone(), DRIVER_ONLY), require_roles))
}

async fn list_trips(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<TripListQuery>,
) -> Result<Json<ApiResponse<Vec<TripView>>>, AppError> {
    let controller = TripController::new(&state);
    let filter = TripFilter {
        status: query.status,
        driver_id: Some(user.user_id),
        ..Default::default()
    };
    Ok(Json(ApiResponse::success(controller.list(filter).await?)))
}

async fn available_trips(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<TripView>>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(ApiResponse::success(controller.list_available().await?)))
}

async fn request_trip(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(controller.request(user.user_id, id).await?))
}

async fn set_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTripStatusRequest>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(controller.driver_set_status(user.user_id, id, request.status).await?))
}

async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<DriverDashboard>>, AppError> {
    let controller = DashboardController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.driver(user.user_id).await?)))
}
