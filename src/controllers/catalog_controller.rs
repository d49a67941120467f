use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::catalog_dto::{
    CreateCityRequest, CreateTemperatureSettingRequest, CreateVehicleRequest, UpdateCityRequest,
    UpdateVehicleRequest,
};
use crate::models::catalog::{City, TemperatureSetting, Vehicle};
use crate::repositories::catalog_repository::CatalogRepository;
use crate::utils::errors::{not_found_error, AppError};

pub struct CatalogController {
    repository: CatalogRepository,
}

impl CatalogController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: CatalogRepository::new(pool),
        }
    }

    // Ciudades

    pub async fn list_cities(&self, active_only: bool) -> Result<Vec<City>, AppError> {
        self.repository.list_cities(active_only).await
    }

    pub async fn create_city(&self, request: CreateCityRequest) -> Result<ApiResponse<City>, AppError> {
        request.validate()?;
        let city = self.repository.create_city(request).await?;
        info!("🏙️ Ciudad creada: {}", city.name);
        Ok(ApiResponse::success_with_message(city, "City created successfully"))
    }

    pub async fn update_city(&self, id: Uuid, request: UpdateCityRequest) -> Result<ApiResponse<City>, AppError> {
        request.validate()?;
        let city = self
            .repository
            .update_city(id, request)
            .await?
            .ok_or_else(|| not_found_error("City", &id.to_string()))?;
        Ok(ApiResponse::success_with_message(city, "City updated successfully"))
    }

    // Vehículos

    pub async fn list_vehicles(&self, active_only: bool) -> Result<Vec<Vehicle>, AppError> {
        self.repository.list_vehicles(active_only).await
    }

    pub async fn create_vehicle(&self, request: CreateVehicleRequest) -> Result<ApiResponse<Vehicle>, AppError> {
        request.validate()?;
        let vehicle = self.repository.create_vehicle(request).await?;
        info!("🚚 Vehículo creado: {} ({})", vehicle.plate_number, vehicle.vehicle_type);
        Ok(ApiResponse::success_with_message(vehicle, "Vehicle created successfully"))
    }

    pub async fn update_vehicle(
        &self,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        request.validate()?;
        let vehicle = self
            .repository
            .update_vehicle(id, request)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;
        Ok(ApiResponse::success_with_message(vehicle, "Vehicle updated successfully"))
    }

    // Rangos de temperatura

    pub async fn list_temperature_settings(&self) -> Result<Vec<TemperatureSetting>, AppError> {
        self.repository.list_temperature_settings().await
    }

    pub async fn create_temperature_setting(
        &self,
        request: CreateTemperatureSettingRequest,
    ) -> Result<ApiResponse<TemperatureSetting>, AppError> {
        request.validate()?;
        let setting = self.repository.create_temperature_setting(request).await?;
        info!(
            "🌡️ Rango de temperatura '{}' ({}..{} °C)",
            setting.label, setting.min_celsius, setting.max_celsius
        );
        Ok(ApiResponse::success_with_message(setting, "Temperature setting created successfully"))
    }
}
