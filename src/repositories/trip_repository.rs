use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::dashboard_dto::StatusCount;
use crate::models::trip::{Trip, TripStatus, TripView};
use crate::utils::errors::{map_unique_violation, AppError};

const VIEW_SELECT: &str = r#"
    SELECT t.id, t.trip_number, t.customer_id, c.full_name AS customer_name,
           t.driver_id, d.full_name AS driver_name, t.vehicle_id, v.plate_number AS vehicle_plate,
           fc.name AS from_city, tc.name AS to_city, ts.label AS temperature_label,
           t.customs_broker_id, t.status, t.price, t.cancellation_fee, t.scheduled_date,
           t.actual_start_date, t.delivered_date, t.created_at
    FROM trips t
    JOIN users c ON c.id = t.customer_id
    LEFT JOIN users d ON d.id = t.driver_id
    JOIN vehicles v ON v.id = t.vehicle_id
    JOIN cities fc ON fc.id = t.from_city_id
    JOIN cities tc ON tc.id = t.to_city_id
    LEFT JOIN temperature_settings ts ON ts.id = t.temperature_setting_id
"#;

/// Datos de un viaje nuevo
pub struct NewTrip {
    pub trip_number: String,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub from_city_id: Uuid,
    pub to_city_id: Uuid,
    pub temperature_setting_id: Option<Uuid>,
    pub scheduled_date: DateTime<Utc>,
    pub price: Decimal,
    pub notes: Option<String>,
}

/// Filtros de listado; `None` no filtra
#[derive(Debug, Default, Clone, Copy)]
pub struct TripFilter {
    pub status: Option<TripStatus>,
    pub customer_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}

pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, trip: NewTrip) -> Result<Trip, AppError> {
        sqlx::query_as::<_, Trip>(
            r#"
            INSERT INTO trips (id, trip_number, customer_id, vehicle_id, from_city_id, to_city_id,
                               temperature_setting_id, scheduled_date, price, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&trip.trip_number)
        .bind(trip.customer_id)
        .bind(trip.vehicle_id)
        .bind(trip.from_city_id)
        .bind(trip.to_city_id)
        .bind(trip.temperature_setting_id)
        .bind(trip.scheduled_date)
        .bind(trip.price)
        .bind(&trip.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Trip number collision, please retry"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(trip)
    }

    pub async fn find_view(&self, id: Uuid) -> Result<Option<TripView>, AppError> {
        let trip = sqlx::query_as::<_, TripView>(&format!("{} WHERE t.id = $1", VIEW_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(trip)
    }

    pub async fn list_views(&self, filter: TripFilter) -> Result<Vec<TripView>, AppError> {
        let trips = sqlx::query_as::<_, TripView>(&format!(
            r#"{}
            WHERE ($1::trip_status IS NULL OR t.status = $1)
              AND ($2::uuid IS NULL OR t.customer_id = $2)
              AND ($3::uuid IS NULL OR t.driver_id = $3)
            ORDER BY t.created_at DESC"#,
            VIEW_SELECT
        ))
        .bind(filter.status)
        .bind(filter.customer_id)
        .bind(filter.driver_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(trips)
    }

    /// Viajes pendientes sin conductor, los más próximos primero
    pub async fn list_available(&self) -> Result<Vec<TripView>, AppError> {
        let trips = sqlx::query_as::<_, TripView>(&format!(
            "{} WHERE t.status = 'PENDING' AND t.driver_id IS NULL ORDER BY t.scheduled_date",
            VIEW_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(trips)
    }

    pub async fn current_for_driver(&self, driver_id: Uuid) -> Result<Option<TripView>, AppError> {
        let trip = sqlx::query_as::<_, TripView>(&format!(
            r#"{}
            WHERE t.driver_id = $1 AND t.status IN ('ASSIGNED', 'IN_PROGRESS', 'EN_ROUTE', 'AT_DESTINATION')
            ORDER BY t.status DESC, t.scheduled_date
            LIMIT 1"#,
            VIEW_SELECT
        ))
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(trip)
    }

    /// Cambio de estado condicionado al estado actual.
    /// Devuelve `None` si el viaje ya no estaba en `from`.
    pub async fn transition(&self, id: Uuid, from: TripStatus, to: TripStatus) -> Result<Option<Trip>, AppError> {
        let mut tx = self.pool.begin().await?;

        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips
            SET status = $3::trip_status,
                actual_start_date = CASE WHEN $3::trip_status = 'IN_PROGRESS' THEN NOW() ELSE actual_start_date END,
                delivered_date = CASE WHEN $3::trip_status = 'DELIVERED' THEN NOW() ELSE delivered_date END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(trip) = &trip {
            if to == TripStatus::Delivered {
                if let Some(driver_id) = trip.driver_id {
                    sqlx::query("UPDATE driver_profiles SET is_available = TRUE WHERE user_id = $1")
                        .bind(driver_id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(trip)
    }

    /// PENDING -> DRIVER_REQUESTED con el conductor solicitante
    pub async fn request_by_driver(&self, id: Uuid, driver_id: Uuid) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips SET status = 'DRIVER_REQUESTED', driver_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING' AND driver_id IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(trip)
    }

    /// DRIVER_REQUESTED -> PENDING, liberando al solicitante
    pub async fn reject_request(&self, id: Uuid) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips SET status = 'PENDING', driver_id = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'DRIVER_REQUESTED'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(trip)
    }

    /// Asigna conductor y lo marca como no disponible
    pub async fn assign_driver(&self, id: Uuid, driver_id: Uuid) -> Result<Option<Trip>, AppError> {
        let mut tx = self.pool.begin().await?;

        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips SET status = 'ASSIGNED', driver_id = $2, updated_at = NOW()
            WHERE id = $1 AND status IN ('PENDING', 'DRIVER_REQUESTED')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(driver_id)
        .fetch_optional(&mut *tx)
        .await?;

        if trip.is_some() {
            sqlx::query("UPDATE driver_profiles SET is_available = FALSE WHERE user_id = $1")
                .bind(driver_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(trip)
    }

    /// Cancela el viaje, libera al conductor asignado, suelta al conductor que
    /// sólo lo había solicitado y anula la factura sin pagos
    pub async fn cancel(
        &self,
        id: Uuid,
        from: TripStatus,
        fee: Decimal,
        reason: Option<String>,
    ) -> Result<Option<Trip>, AppError> {
        let mut tx = self.pool.begin().await?;

        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips
            SET status = 'CANCELLED', cancelled_at = NOW(), cancellation_fee = $3,
                cancellation_reason = $4,
                driver_id = CASE WHEN $5 THEN NULL ELSE driver_id END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(fee)
        .bind(reason)
        .bind(from.driver_is_tentative())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(trip) = &trip {
            if let (TripStatus::Assigned, Some(driver_id)) = (from, trip.driver_id) {
                sqlx::query("UPDATE driver_profiles SET is_available = TRUE WHERE user_id = $1")
                    .bind(driver_id)
                    .execute(&mut *tx)
                    .await?;
            }
            sqlx::query(
                r#"
                UPDATE invoices SET payment_status = 'CANCELLED', updated_at = NOW()
                WHERE trip_id = $1 AND amount_paid = 0 AND payment_status NOT IN ('PAID', 'CANCELLED')
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(trip)
    }

    pub async fn set_customs_broker(&self, id: Uuid, customs_broker_id: Uuid) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips SET customs_broker_id = $2, updated_at = NOW()
            WHERE id = $1 AND status <> 'CANCELLED'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(customs_broker_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(trip)
    }

    pub async fn counts_by_status(&self, filter: TripFilter) -> Result<Vec<StatusCount>, AppError> {
        let counts = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM trips
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::uuid IS NULL OR driver_id = $2)
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(filter.customer_id)
        .bind(filter.driver_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }
}
