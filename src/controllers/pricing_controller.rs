use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::pricing_dto::{CreatePricingRequest, ImportSummary, QuoteQuery, QuoteResponse, UpdatePricingRequest};
use crate::models::pricing::{Pricing, PricingView};
use crate::repositories::catalog_repository::CatalogRepository;
use crate::repositories::pricing_repository::PricingRepository;
use crate::services::pricing_import::{self, RowError};
use crate::utils::csv;
use crate::utils::errors::{not_found_error, AppError};

const EXPORT_HEADER: [&str; 5] = ["from_city", "to_city", "vehicle", "vehicle_type", "price"];

pub struct PricingController {
    repository: PricingRepository,
    catalog: CatalogRepository,
}

impl PricingController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PricingRepository::new(pool.clone()),
            catalog: CatalogRepository::new(pool),
        }
    }

    pub async fn list(&self) -> Result<Vec<PricingView>, AppError> {
        self.repository.list().await
    }

    pub async fn create(&self, request: CreatePricingRequest) -> Result<ApiResponse<Pricing>, AppError> {
        request.validate()?;

        if self.catalog.find_city(request.from_city_id).await?.is_none()
            || self.catalog.find_city(request.to_city_id).await?.is_none()
        {
            return Err(AppError::BadRequest("Unknown city".to_string()));
        }
        if self.catalog.find_vehicle(request.vehicle_id).await?.is_none() {
            return Err(AppError::BadRequest("Unknown vehicle".to_string()));
        }

        let pricing = self
            .repository
            .create(request.from_city_id, request.to_city_id, request.vehicle_id, request.price)
            .await?;
        info!("💰 Tarifa creada: {} SAR", pricing.price);
        Ok(ApiResponse::success_with_message(pricing, "Price created successfully"))
    }

    pub async fn update(&self, id: Uuid, request: UpdatePricingRequest) -> Result<ApiResponse<Pricing>, AppError> {
        request.validate()?;
        let pricing = self
            .repository
            .update_price(id, request.price)
            .await?
            .ok_or_else(|| not_found_error("Price", &id.to_string()))?;
        Ok(ApiResponse::success_with_message(pricing, "Price updated successfully"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repository.delete(id).await? {
            return Err(not_found_error("Price", &id.to_string()));
        }
        info!("🗑️ Tarifa {} eliminada", id);
        Ok(())
    }

    pub async fn quote(&self, query: QuoteQuery) -> Result<QuoteResponse, AppError> {
        let price = self
            .repository
            .find_price(query.from_city_id, query.to_city_id, query.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No price defined for this route and vehicle".to_string()))?;

        Ok(QuoteResponse {
            from_city_id: query.from_city_id,
            to_city_id: query.to_city_id,
            vehicle_id: query.vehicle_id,
            price,
        })
    }

    /// Importa un CSV de tarifas fila a fila; las filas con error no abortan el resto
    pub async fn import(&self, content: &str) -> Result<ImportSummary, AppError> {
        let parsed = pricing_import::parse(content).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let mut summary = ImportSummary {
            errors: parsed.errors,
            ..Default::default()
        };

        for row in parsed.rows {
            let from = self.catalog.find_city_by_name(&row.from_city).await?;
            let to = self.catalog.find_city_by_name(&row.to_city).await?;
            let vehicle = self.catalog.find_vehicle_by_plate_or_type(&row.vehicle).await?;

            let (from, to, vehicle) = match (from, to, vehicle) {
                (Some(from), Some(to), Some(vehicle)) => (from, to, vehicle),
                (None, _, _) => {
                    summary.errors.push(RowError::new(row.line, format!("unknown city '{}'", row.from_city)));
                    continue;
                }
                (_, None, _) => {
                    summary.errors.push(RowError::new(row.line, format!("unknown city '{}'", row.to_city)));
                    continue;
                }
                (_, _, None) => {
                    summary.errors.push(RowError::new(row.line, format!("unknown vehicle '{}'", row.vehicle)));
                    continue;
                }
            };

            if self.repository.upsert(from.id, to.id, vehicle.id, row.price).await? {
                summary.imported += 1;
            } else {
                summary.updated += 1;
            }
        }

        summary.errors.sort_by_key(|e| e.line);
        if summary.errors.is_empty() {
            info!("📥 Importación de tarifas: {} nuevas, {} actualizadas", summary.imported, summary.updated);
        } else {
            warn!(
                "📥 Importación de tarifas: {} nuevas, {} actualizadas, {} filas con error",
                summary.imported,
                summary.updated,
                summary.errors.len()
            );
        }
        Ok(summary)
    }

    pub async fn export(&self) -> Result<String, AppError> {
        let rows: Vec<Vec<String>> = self
            .repository
            .list()
            .await?
            .into_iter()
            .map(|p| vec![p.from_city, p.to_city, p.vehicle_plate, p.vehicle_type, p.price.to_string()])
            .collect();
        Ok(csv::write_document(&EXPORT_HEADER, &rows))
    }
}
