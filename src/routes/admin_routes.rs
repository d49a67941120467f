use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Response,
    routing::{get, patch, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::catalog_controller::CatalogController;
use crate::controllers::dashboard_controller::DashboardController;
use crate::controllers::pricing_controller::PricingController;
use crate::controllers::tracking_controller::TrackingController;
use crate::controllers::trip_controller::TripController;
use crate::controllers::user_controller::UserController;
use crate::dto::api_response::ApiResponse;
use crate::dto::catalog_dto::{
    CreateCityRequest, CreateTemperatureSettingRequest, CreateVehicleRequest, UpdateCityRequest,
    UpdateVehicleRequest,
};
use crate::dto::dashboard_dto::AdminDashboard;
use crate::dto::pricing_dto::{CreatePricingRequest, ImportSummary, UpdatePricingRequest};
use crate::dto::trip_dto::{
    AdminCreateTripRequest, AssignCustomsBrokerRequest, AssignDriverRequest, CancelTripRequest,
    CancelTripResponse, TripListQuery, UpdateTripStatusRequest,
};
use crate::dto::user_dto::{CreateUserRequest, UpdateUserStatusRequest, UserListQuery};
use crate::middleware::auth::{require_roles, AuthenticatedUser, ADMIN_ONLY};
use crate::models::catalog::{City, TemperatureSetting, Vehicle};
use crate::models::pricing::{Pricing, PricingView};
use crate::models::tracking::ActiveTripPosition;
use crate::models::trip::{Trip, TripView};
use crate::models::user::{AvailableDriver, UserResponse};
use crate::repositories::trip_repository::TripFilter;
use crate::routes::{csv_attachment, OptionalJson};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_admin_router(state: &AppState) -> Router<AppState> {
    Router::new()
        // Usuarios
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id/status", patch(set_user_status))
        .route("/drivers/available", get(available_drivers))
        // Catálogo
        .route("/cities", get(list_cities).post(create_city))
        .route("/cities/:id", put(update_city))
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/:id", put(update_vehicle))
        .route("/temperature-settings", get(list_temperature_settings).post(create_temperature_setting))
        // Tarifas
        .route("/pricing", get(list_pricing).post(create_pricing))
        .route("/pricing/import", post(import_pricing))
        .route("/pricing/export", get(export_pricing))
        .route("/pricing/:id", put(update_pricing).delete(delete_pricing))
        // Viajes
        .route("/trips", get(list_trips).post(create_trip))
        .route("/trips/:id", get(get_trip))
        .route("/trips/:id/assign", post(assign_driver))
        .route("/trips/:id/reject-request", post(reject_request))
        .route("/trips/:id/status", post(set_trip_status))
        .route("/trips/:id/customs-broker", post(set_customs_broker))
        .route("/trips/:id/cancel", post(cancel_trip))
        // Seguimiento y panel
        .route("/tracking/active", get(active_positions))
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state((state.clone(), ADMIN_ONLY), require_roles))
}

// Usuarios

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, AppError> {
    let controller = UserController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.list(query.role).await?)))
}

async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone());
    Ok(Json(controller.create(request).await?))
}

async fn set_user_status(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserStatusRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone());
    let user = controller.set_status(admin.user_id, id, request.is_active).await?;
    Ok(Json(ApiResponse::success(user)))
}

async fn available_drivers(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<AvailableDriver>>>, AppError> {
    let controller = UserController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.available_drivers().await?)))
}

// Catálogo

async fn list_cities(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<City>>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.list_cities(false).await?)))
}

async fn create_city(
    State(state): State<AppState>,
    Json(request): Json<CreateCityRequest>,
) -> Result<Json<ApiResponse<City>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(controller.create_city(request).await?))
}

async fn update_city(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCityRequest>,
) -> Result<Json<ApiResponse<City>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(controller.update_city(id, request).await?))
}

async fn list_vehicles(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Vehicle>>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.list_vehicles(false).await?)))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(controller.create_vehicle(request).await?))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(controller.update_vehicle(id, request).await?))
}

async fn list_temperature_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TemperatureSetting>>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.list_temperature_settings().await?)))
}

async fn create_temperature_setting(
    State(state): State<AppState>,
    Json(request): Json<CreateTemperatureSettingRequest>,
) -> Result<Json<ApiResponse<TemperatureSetting>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(controller.create_temperature_setting(request).await?))
}

// Tarifas

async fn list_pricing(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<PricingView>>>, AppError> {
    let controller = PricingController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.list().await?)))
}

async fn create_pricing(
    State(state): State<AppState>,
    Json(request): Json<CreatePricingRequest>,
) -> Result<Json<ApiResponse<Pricing>>, AppError> {
    let controller = PricingController::new(state.pool.clone());
    Ok(Json(controller.create(request).await?))
}

async fn update_pricing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePricingRequest>,
) -> Result<Json<ApiResponse<Pricing>>, AppError> {
    let controller = PricingController::new(state.pool.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_pricing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = PricingController::new(state.pool.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Price deleted successfully")))
}

/// Cuerpo `text/csv` con la cabecera `from_city,to_city,vehicle,price`
async fn import_pricing(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ApiResponse<ImportSummary>>, AppError> {
    let controller = PricingController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.import(&body).await?)))
}

async fn export_pricing(State(state): State<AppState>) -> Result<Response, AppError> {
    let controller = PricingController::new(state.pool.clone());
    let content = controller.export().await?;
    Ok(csv_attachment("pricing.csv", content))
}

// Viajes

async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<TripListQuery>,
) -> Result<Json<ApiResponse<Vec<TripView>>>, AppError> {
    let controller = TripController::new(&state);
    let filter = TripFilter {
        status: query.status,
        ..Default::default()
    };
    Ok(Json(ApiResponse::success(controller.list(filter).await?)))
}

async fn create_trip(
    State(state): State<AppState>,
    Json(request): Json<AdminCreateTripRequest>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(controller.admin_create(request).await?))
}

async fn get_trip(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripView>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(ApiResponse::success(controller.get(&admin, id).await?)))
}

async fn assign_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignDriverRequest>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(controller.assign_driver(id, request.driver_id).await?))
}

async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(controller.reject_request(id).await?))
}

async fn set_trip_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTripStatusRequest>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(controller.admin_set_status(id, request.status).await?))
}

async fn set_customs_broker(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignCustomsBrokerRequest>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(controller.set_customs_broker(id, request.customs_broker_id).await?))
}

async fn cancel_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<CancelTripRequest>,
) -> Result<Json<ApiResponse<CancelTripResponse>>, AppError> {
    let controller = TripController::new(&state);
    let response = controller.cancel_by_admin(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Trip cancelled")))
}

// Seguimiento y panel

async fn active_positions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ActiveTripPosition>>>, AppError> {
    let controller = TrackingController::new(state.pool.clone(), state.metrics.clone());
    Ok(Json(ApiResponse::success(controller.active_positions().await?)))
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<ApiResponse<AdminDashboard>>, AppError> {
    let controller = DashboardController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.admin().await?)))
}
