use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::pricing::{Pricing, PricingView};
use crate::utils::errors::{map_unique_violation, AppError};

const VIEW_SELECT: &str = r#"
    SELECT p.id, p.from_city_id, fc.name AS from_city, p.to_city_id, tc.name AS to_city,
           p.vehicle_id, v.plate_number AS vehicle_plate, v.vehicle_type, p.price, p.updated_at
    FROM pricing p
    JOIN cities fc ON fc.id = p.from_city_id
    JOIN cities tc ON tc.id = p.to_city_id
    JOIN vehicles v ON v.id = p.vehicle_id
"#;

pub struct PricingRepository {
    pool: PgPool,
}

impl PricingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<PricingView>, AppError> {
        let rows = sqlx::query_as::<_, PricingView>(&format!("{} ORDER BY fc.name, tc.name, v.plate_number", VIEW_SELECT))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create(
        &self,
        from_city_id: Uuid,
        to_city_id: Uuid,
        vehicle_id: Uuid,
        price: Decimal,
    ) -> Result<Pricing, AppError> {
        sqlx::query_as::<_, Pricing>(
            r#"
            INSERT INTO pricing (id, from_city_id, to_city_id, vehicle_id, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(from_city_id)
        .bind(to_city_id)
        .bind(vehicle_id)
        .bind(price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A price for this route and vehicle already exists"))
    }

    pub async fn update_price(&self, id: Uuid, price: Decimal) -> Result<Option<Pricing>, AppError> {
        let pricing = sqlx::query_as::<_, Pricing>(
            "UPDATE pricing SET price = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(price)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pricing)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM pricing WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_price(
        &self,
        from_city_id: Uuid,
        to_city_id: Uuid,
        vehicle_id: Uuid,
    ) -> Result<Option<Decimal>, AppError> {
        let price: Option<(Decimal,)> = sqlx::query_as(
            "SELECT price FROM pricing WHERE from_city_id = $1 AND to_city_id = $2 AND vehicle_id = $3",
        )
        .bind(from_city_id)
        .bind(to_city_id)
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(price.map(|(p,)| p))
    }

    /// Inserta o actualiza una tarifa; devuelve `true` si la fila es nueva
    pub async fn upsert(
        &self,
        from_city_id: Uuid,
        to_city_id: Uuid,
        vehicle_id: Uuid,
        price: Decimal,
    ) -> Result<bool, AppError> {
        let (inserted,): (bool,) = sqlx::query_as(
            r#"
            INSERT INTO pricing (id, from_city_id, to_city_id, vehicle_id, price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (from_city_id, to_city_id, vehicle_id)
            DO UPDATE SET price = EXCLUDED.price, updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(from_city_id)
        .bind(to_city_id)
        .bind(vehicle_id)
        .bind(price)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }
}
