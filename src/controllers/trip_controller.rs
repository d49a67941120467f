//! Ciclo de vida de los viajes
//!
//! Todas las transiciones pasan por [`TripStatus::can_transition_to`] y se
//! aplican en base de datos condicionadas al estado leído, de modo que dos
//! cambios concurrentes no pueden pisarse.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::controllers::invoice_controller::InvoiceController;
use crate::dto::api_response::ApiResponse;
use crate::dto::trip_dto::{AdminCreateTripRequest, CancelTripRequest, CancelTripResponse, CreateTripRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::trip::{Trip, TripStatus, TripView};
use crate::models::user::{Role, User};
use crate::repositories::catalog_repository::CatalogRepository;
use crate::repositories::pricing_repository::PricingRepository;
use crate::repositories::trip_repository::{NewTrip, TripFilter, TripRepository};
use crate::repositories::user_repository::UserRepository;
use crate::services::cancellation::CancellationPolicy;
use crate::services::mailer::{notify_after_commit, Mailer, Notification};
use crate::services::metrics::Metrics;
use crate::services::numbering::{document_number, TRIP_PREFIX};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError};

/// Datos comunes a una reserva, venga del cliente o de un admin
struct Booking {
    customer_id: Uuid,
    vehicle_id: Uuid,
    from_city_id: Uuid,
    to_city_id: Uuid,
    temperature_setting_id: Option<Uuid>,
    scheduled_date: chrono::DateTime<Utc>,
    notes: Option<String>,
    price_override: Option<Decimal>,
}

pub struct TripController {
    repository: TripRepository,
    catalog: CatalogRepository,
    pricing: PricingRepository,
    users: UserRepository,
    invoices: InvoiceController,
    cancellation: CancellationPolicy,
    mailer: Arc<dyn Mailer>,
    metrics: Arc<Metrics>,
}

impl TripController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: TripRepository::new(state.pool.clone()),
            catalog: CatalogRepository::new(state.pool.clone()),
            pricing: PricingRepository::new(state.pool.clone()),
            users: UserRepository::new(state.pool.clone()),
            invoices: InvoiceController::new(state),
            cancellation: state.cancellation_policy(),
            mailer: state.mailer.clone(),
            metrics: state.metrics.clone(),
        }
    }

    // Reservas

    pub async fn book(&self, customer_id: Uuid, request: CreateTripRequest) -> Result<ApiResponse<Trip>, AppError> {
        request.validate()?;
        let trip = self
            .create_trip(Booking {
                customer_id,
                vehicle_id: request.vehicle_id,
                from_city_id: request.from_city_id,
                to_city_id: request.to_city_id,
                temperature_setting_id: request.temperature_setting_id,
                scheduled_date: request.scheduled_date,
                notes: request.notes,
                price_override: None,
            })
            .await?;
        Ok(ApiResponse::success_with_message(trip, "Trip booked successfully"))
    }

    pub async fn admin_create(&self, request: AdminCreateTripRequest) -> Result<ApiResponse<Trip>, AppError> {
        request.validate()?;

        match self.users.find_by_id(request.customer_id).await? {
            Some(user) if user.role == Role::Customer && user.is_active => {}
            _ => return Err(AppError::BadRequest("customer_id must reference an active customer".to_string())),
        }

        let trip = self
            .create_trip(Booking {
                customer_id: request.customer_id,
                vehicle_id: request.vehicle_id,
                from_city_id: request.from_city_id,
                to_city_id: request.to_city_id,
                temperature_setting_id: request.temperature_setting_id,
                scheduled_date: request.scheduled_date,
                notes: request.notes,
                price_override: request.price,
            })
            .await?;
        Ok(ApiResponse::success_with_message(trip, "Trip created successfully"))
    }

    async fn create_trip(&self, booking: Booking) -> Result<Trip, AppError> {
        match self.catalog.find_vehicle(booking.vehicle_id).await? {
            Some(vehicle) if vehicle.is_active => {}
            _ => return Err(AppError::BadRequest("Unknown or inactive vehicle".to_string())),
        }
        for city_id in [booking.from_city_id, booking.to_city_id] {
            match self.catalog.find_city(city_id).await? {
                Some(city) if city.is_active => {}
                _ => return Err(AppError::BadRequest("Unknown or inactive city".to_string())),
            }
        }
        if let Some(setting_id) = booking.temperature_setting_id {
            if self.catalog.find_temperature_setting(setting_id).await?.is_none() {
                return Err(AppError::BadRequest("Unknown temperature setting".to_string()));
            }
        }

        let price = match booking.price_override {
            Some(price) => price,
            None => self
                .pricing
                .find_price(booking.from_city_id, booking.to_city_id, booking.vehicle_id)
                .await?
                .ok_or_else(|| AppError::BadRequest("No price defined for this route and vehicle".to_string()))?,
        };

        let trip = self
            .repository
            .create(NewTrip {
                trip_number: document_number(TRIP_PREFIX, Utc::now()),
                customer_id: booking.customer_id,
                vehicle_id: booking.vehicle_id,
                from_city_id: booking.from_city_id,
                to_city_id: booking.to_city_id,
                temperature_setting_id: booking.temperature_setting_id,
                scheduled_date: booking.scheduled_date,
                price,
                notes: booking.notes,
            })
            .await?;

        self.metrics.trips_created.inc();
        info!("📦 Viaje {} creado: {} SAR", trip.trip_number, trip.price);
        Ok(trip)
    }

    // Consultas

    pub async fn list(&self, filter: TripFilter) -> Result<Vec<TripView>, AppError> {
        self.repository.list_views(filter).await
    }

    pub async fn list_available(&self) -> Result<Vec<TripView>, AppError> {
        self.repository.list_available().await
    }

    /// Admin ve cualquier viaje; el resto sólo aquellos en los que participa
    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<TripView, AppError> {
        let trip = self.visible_trip(user, id).await?;
        self.repository
            .find_view(trip.id)
            .await?
            .ok_or_else(|| not_found_error("Trip", &id.to_string()))
    }

    pub async fn visible_trip(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Trip, AppError> {
        let trip = self.find(id).await?;
        if user.is_admin() || trip.involves(user.user_id) {
            Ok(trip)
        } else {
            Err(not_found_error("Trip", &id.to_string()))
        }
    }

    async fn find(&self, id: Uuid) -> Result<Trip, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Trip", &id.to_string()))
    }

    // Cancelación

    /// Cancelación por el cliente, con cargo fuera de la ventana gratuita
    pub async fn cancel_by_customer(
        &self,
        customer_id: Uuid,
        id: Uuid,
        request: CancelTripRequest,
    ) -> Result<CancelTripResponse, AppError> {
        request.validate()?;
        let trip = self.find(id).await?;
        if trip.customer_id != customer_id {
            return Err(not_found_error("Trip", &id.to_string()));
        }

        let quote = self.cancellation.evaluate(trip.price, trip.created_at, Utc::now());
        self.cancel(trip, quote.cancellation_fee, request.reason).await
    }

    /// Cancelación administrativa, nunca se cobra
    pub async fn cancel_by_admin(&self, id: Uuid, request: CancelTripRequest) -> Result<CancelTripResponse, AppError> {
        request.validate()?;
        let trip = self.find(id).await?;
        self.cancel(trip, Decimal::ZERO, request.reason).await
    }

    async fn cancel(&self, trip: Trip, fee: Decimal, reason: Option<String>) -> Result<CancelTripResponse, AppError> {
        if !trip.status.is_cancellable() {
            return Err(AppError::InvalidTransition(format!(
                "Trip {} cannot be cancelled from {}",
                trip.trip_number, trip.status
            )));
        }

        let cancelled = self
            .repository
            .cancel(trip.id, trip.status, fee, reason)
            .await?
            .ok_or_else(|| concurrent_change(&trip))?;

        self.metrics.record_transition(TripStatus::Cancelled.as_str());
        warn!("🚫 Viaje {} cancelado (cargo {} SAR)", cancelled.trip_number, fee);
        Ok(CancelTripResponse {
            trip: cancelled,
            free_cancellation: fee.is_zero(),
            cancellation_fee: fee,
        })
    }

    // Asignación

    pub async fn assign_driver(&self, id: Uuid, driver_id: Uuid) -> Result<ApiResponse<Trip>, AppError> {
        let driver = self.active_user_with_role(driver_id, Role::Driver, "driver_id").await?;
        let trip = self.find(id).await?;
        if !trip.status.can_transition_to(TripStatus::Assigned) {
            return Err(invalid_transition(&trip, TripStatus::Assigned));
        }

        let assigned = self
            .repository
            .assign_driver(id, driver.id)
            .await?
            .ok_or_else(|| concurrent_change(&trip))?;
        self.metrics.record_transition(TripStatus::Assigned.as_str());

        let message = async {
            let view = self.repository.find_view(id).await?;
            Ok::<_, AppError>(view.map(|view| {
                let route = format!("{} → {}", view.from_city, view.to_city);
                Notification::trip_assigned(&driver.email, &driver.full_name, &assigned.trip_number, &route)
            }))
        };
        notify_after_commit(self.mailer.as_ref(), message).await;

        info!("🚛 Viaje {} asignado a {}", assigned.trip_number, driver.email);
        Ok(ApiResponse::success_with_message(assigned, "Driver assigned"))
    }

    /// DRIVER_REQUESTED -> PENDING
    pub async fn reject_request(&self, id: Uuid) -> Result<ApiResponse<Trip>, AppError> {
        let trip = self.find(id).await?;
        if trip.status != TripStatus::DriverRequested {
            return Err(invalid_transition(&trip, TripStatus::Pending));
        }

        let pending = self
            .repository
            .reject_request(id)
            .await?
            .ok_or_else(|| concurrent_change(&trip))?;
        self.metrics.record_transition(TripStatus::Pending.as_str());
        info!("↩️ Solicitud rechazada en el viaje {}", pending.trip_number);
        Ok(ApiResponse::success_with_message(pending, "Driver request rejected"))
    }

    /// Cambio de estado genérico del admin; los estados con efectos propios
    /// se delegan en su operación dedicada
    pub async fn admin_set_status(&self, id: Uuid, status: TripStatus) -> Result<ApiResponse<Trip>, AppError> {
        let trip = self.find(id).await?;

        match (trip.status, status) {
            (_, TripStatus::Cancelled) => {
                let response = self.cancel_by_admin(id, CancelTripRequest::default()).await?;
                Ok(ApiResponse::success_with_message(response.trip, "Trip cancelled"))
            }
            (TripStatus::DriverRequested, TripStatus::Pending) => self.reject_request(id).await,
            (TripStatus::DriverRequested, TripStatus::Assigned) => match trip.driver_id {
                Some(driver_id) => self.assign_driver(id, driver_id).await,
                None => Err(invalid_transition(&trip, status)),
            },
            (_, TripStatus::Assigned) => Err(AppError::BadRequest(
                "Use the assign operation to choose a driver".to_string(),
            )),
            (_, TripStatus::DriverRequested) => Err(AppError::BadRequest(
                "Only a driver can request a trip".to_string(),
            )),
            _ => {
                let updated = self.apply_transition(trip, status).await?;
                Ok(ApiResponse::success_with_message(updated, "Trip status updated"))
            }
        }
    }

    pub async fn set_customs_broker(&self, id: Uuid, broker_id: Uuid) -> Result<ApiResponse<Trip>, AppError> {
        self.active_user_with_role(broker_id, Role::CustomsBroker, "customs_broker_id")
            .await?;
        let trip = self.find(id).await?;

        let updated = self
            .repository
            .set_customs_broker(id, broker_id)
            .await?
            .ok_or_else(|| AppError::InvalidTransition(format!("Trip {} is cancelled", trip.trip_number)))?;
        info!("🛃 Agente de aduanas asignado al viaje {}", updated.trip_number);
        Ok(ApiResponse::success_with_message(updated, "Customs broker assigned"))
    }

    // Conductor

    pub async fn request(&self, driver_id: Uuid, id: Uuid) -> Result<ApiResponse<Trip>, AppError> {
        let trip = self.find(id).await?;
        if trip.status != TripStatus::Pending || trip.driver_id.is_some() {
            return Err(invalid_transition(&trip, TripStatus::DriverRequested));
        }

        let requested = self
            .repository
            .request_by_driver(id, driver_id)
            .await?
            .ok_or_else(|| concurrent_change(&trip))?;
        self.metrics.record_transition(TripStatus::DriverRequested.as_str());
        info!("🙋 Conductor {} solicita el viaje {}", driver_id, requested.trip_number);
        Ok(ApiResponse::success_with_message(requested, "Trip requested"))
    }

    pub async fn driver_set_status(
        &self,
        driver_id: Uuid,
        id: Uuid,
        status: TripStatus,
    ) -> Result<ApiResponse<Trip>, AppError> {
        if !status.is_driver_settable() {
            return Err(AppError::BadRequest(format!("Drivers cannot set status {}", status)));
        }

        let trip = self.find(id).await?;
        if trip.driver_id != Some(driver_id) {
            return Err(not_found_error("Trip", &id.to_string()));
        }

        let updated = self.apply_transition(trip, status).await?;
        Ok(ApiResponse::success_with_message(updated, "Trip status updated"))
    }

    pub async fn current_for_driver(&self, driver_id: Uuid) -> Result<Option<TripView>, AppError> {
        self.repository.current_for_driver(driver_id).await
    }

    /// Aplica una transición simple y sus efectos posteriores
    async fn apply_transition(&self, trip: Trip, to: TripStatus) -> Result<Trip, AppError> {
        if !trip.status.can_transition_to(to) {
            return Err(invalid_transition(&trip, to));
        }

        let updated = self
            .repository
            .transition(trip.id, trip.status, to)
            .await?
            .ok_or_else(|| concurrent_change(&trip))?;
        self.metrics.record_transition(to.as_str());
        info!("🔄 Viaje {}: {} → {}", updated.trip_number, trip.status, to);

        if to == TripStatus::Delivered {
            match self.invoices.generate_on_delivery(&updated).await {
                Ok(Some(invoice)) => info!("🧾 Factura automática {}", invoice.invoice_number),
                Ok(None) => {}
                Err(e) => error!("❌ No se pudo facturar el viaje {}: {}", updated.trip_number, e),
            }
        }
        Ok(updated)
    }

    async fn active_user_with_role(&self, id: Uuid, role: Role, field: &str) -> Result<User, AppError> {
        match self.users.find_by_id(id).await? {
            Some(user) if user.role == role && user.is_active => Ok(user),
            _ => Err(AppError::BadRequest(format!(
                "{} must reference an active {}",
                field,
                role.as_str()
            ))),
        }
    }
}

fn invalid_transition(trip: &Trip, to: TripStatus) -> AppError {
    AppError::InvalidTransition(format!(
        "Trip {} cannot move from {} to {}",
        trip.trip_number, trip.status, to
    ))
}

fn concurrent_change(trip: &Trip) -> AppError {
    AppError::InvalidTransition(format!(
        "Trip {} changed while processing the request, please retry",
        trip.trip_number
    ))
}
