use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::catalog_dto::{
    CreateCityRequest, CreateTemperatureSettingRequest, CreateVehicleRequest, UpdateCityRequest, UpdateVehicleRequest,
};
use crate::models::catalog::{City, TemperatureSetting, Vehicle};
use crate::utils::errors::{map_unique_violation, AppError};

/// Ciudades, vehículos y ajustes de temperatura
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- Ciudades ---

    pub async fn list_cities(&self, active_only: bool) -> Result<Vec<City>, AppError> {
        let cities = sqlx::query_as::<_, City>("SELECT * FROM cities WHERE (NOT $1 OR is_active) ORDER BY name")
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(cities)
    }

    pub async fn find_city(&self, id: Uuid) -> Result<Option<City>, AppError> {
        let city = sqlx::query_as::<_, City>("SELECT * FROM cities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(city)
    }

    pub async fn find_city_by_name(&self, name: &str) -> Result<Option<City>, AppError> {
        let city = sqlx::query_as::<_, City>("SELECT * FROM cities WHERE LOWER(name) = LOWER($1)")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(city)
    }

    pub async fn create_city(&self, request: CreateCityRequest) -> Result<City, AppError> {
        sqlx::query_as::<_, City>("INSERT INTO cities (id, name, name_ar) VALUES ($1, $2, $3) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(request.name.trim())
            .bind(request.name_ar)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "A city with this name already exists"))
    }

    pub async fn update_city(&self, id: Uuid, request: UpdateCityRequest) -> Result<Option<City>, AppError> {
        sqlx::query_as::<_, City>(
            r#"
            UPDATE cities
            SET name = COALESCE($2, name), name_ar = COALESCE($3, name_ar), is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name.map(|n| n.trim().to_string()))
        .bind(request.name_ar)
        .bind(request.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A city with this name already exists"))
    }

    // --- Vehículos ---

    pub async fn list_vehicles(&self, active_only: bool) -> Result<Vec<Vehicle>, AppError> {
        let vehicles =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE (NOT $1 OR is_active) ORDER BY plate_number")
                .bind(active_only)
                .fetch_all(&self.pool)
                .await?;
        Ok(vehicles)
    }

    pub async fn find_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    /// Resuelve un vehículo por matrícula o, en su defecto, por tipo
    pub async fn find_vehicle_by_plate_or_type(&self, key: &str) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE LOWER(plate_number) = LOWER($1)
               OR (LOWER(vehicle_type) = LOWER($1) AND is_active)
            ORDER BY (LOWER(plate_number) = LOWER($1)) DESC, created_at
            LIMIT 1
            "#,
        )
        .bind(key.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(vehicle)
    }

    pub async fn create_vehicle(&self, request: CreateVehicleRequest) -> Result<Vehicle, AppError> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, plate_number, vehicle_type, capacity_kg)
            VALUES ($1, UPPER($2), $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.plate_number.trim())
        .bind(request.vehicle_type.trim())
        .bind(request.capacity_kg)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A vehicle with this plate number already exists"))
    }

    pub async fn update_vehicle(&self, id: Uuid, request: UpdateVehicleRequest) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET vehicle_type = COALESCE($2, vehicle_type),
                capacity_kg = COALESCE($3, capacity_kg),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.vehicle_type)
        .bind(request.capacity_kg)
        .bind(request.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vehicle)
    }

    // --- Temperaturas ---

    pub async fn list_temperature_settings(&self) -> Result<Vec<TemperatureSetting>, AppError> {
        let settings =
            sqlx::query_as::<_, TemperatureSetting>("SELECT * FROM temperature_settings ORDER BY min_celsius")
                .fetch_all(&self.pool)
                .await?;
        Ok(settings)
    }

    pub async fn find_temperature_setting(&self, id: Uuid) -> Result<Option<TemperatureSetting>, AppError> {
        let setting = sqlx::query_as::<_, TemperatureSetting>("SELECT * FROM temperature_settings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(setting)
    }

    pub async fn create_temperature_setting(
        &self,
        request: CreateTemperatureSettingRequest,
    ) -> Result<TemperatureSetting, AppError> {
        let setting = sqlx::query_as::<_, TemperatureSetting>(
            "INSERT INTO temperature_settings (id, label, min_celsius, max_celsius) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(request.label.trim())
        .bind(request.min_celsius)
        .bind(request.max_celsius)
        .fetch_one(&self.pool)
        .await?;
        Ok(setting)
    }
}
