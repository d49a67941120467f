use axum::{
    extract::{Query, State},
    middleware,
    routing::get,
    Json, Router,
};

use crate::controllers::catalog_controller::CatalogController;
use crate::controllers::pricing_controller::PricingController;
use crate::dto::api_response::ApiResponse;
use crate::dto::pricing_dto::{QuoteQuery, QuoteResponse};
use crate::middleware::auth::{require_roles, ANY_ROLE};
use crate::models::catalog::{City, TemperatureSetting, Vehicle};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Datos de referencia activos para los formularios de reserva
pub fn create_catalog_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/cities", get(list_cities))
        .route("/vehicles", get(list_vehicles))
        .route("/temperature-settings", get(list_temperature_settings))
        .route("/pricing/quote", get(quote))
        .route_layer(middleware::from_fn_with_state((state.clone(), ANY_ROLE), require_roles))
}

async fn list_cities(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<City>>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.list_cities(true).await?)))
}

async fn list_vehicles(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Vehicle>>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.list_vehicles(true).await?)))
}

async fn list_temperature_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TemperatureSetting>>>, AppError> {
    let controller = CatalogController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.list_temperature_settings().await?)))
}

async fn quote(
    State(state): State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<ApiResponse<QuoteResponse>>, AppError> {
    let controller = PricingController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.quote(query).await?)))
}
