use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::trip::{Trip, TripStatus};
use crate::utils::validation::{validate_not_in_past, validate_positive_amount};

/// Reserva de un viaje por parte del cliente
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_booking_route"))]
pub struct CreateTripRequest {
    pub vehicle_id: Uuid,
    pub from_city_id: Uuid,
    pub to_city_id: Uuid,

    #[validate(custom = "validate_not_in_past")]
    pub scheduled_date: DateTime<Utc>,

    pub temperature_setting_id: Option<Uuid>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

fn validate_booking_route(request: &CreateTripRequest) -> Result<(), ValidationError> {
    distinct_cities(request.from_city_id, request.to_city_id)
}

/// Viaje creado por un administrador en nombre de un cliente
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_admin_route"))]
pub struct AdminCreateTripRequest {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub from_city_id: Uuid,
    pub to_city_id: Uuid,

    #[validate(custom = "validate_not_in_past")]
    pub scheduled_date: DateTime<Utc>,

    pub temperature_setting_id: Option<Uuid>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    /// Sustituye a la tarifa de la tabla de precios
    #[validate(custom = "validate_positive_amount")]
    pub price: Option<Decimal>,
}

fn validate_admin_route(request: &AdminCreateTripRequest) -> Result<(), ValidationError> {
    distinct_cities(request.from_city_id, request.to_city_id)
}

fn distinct_cities(from: Uuid, to: Uuid) -> Result<(), ValidationError> {
    if from == to {
        let mut error = ValidationError::new("same_city");
        error.message = Some("origin and destination must differ".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct TripListQuery {
    pub status: Option<TripStatus>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelTripRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CancelTripResponse {
    pub trip: Trip,
    pub free_cancellation: bool,
    pub cancellation_fee: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTripStatusRequest {
    pub status: TripStatus,
}

#[derive(Debug, Deserialize)]
pub struct AssignCustomsBrokerRequest {
    pub customs_broker_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn booking(scheduled: DateTime<Utc>, same_city: bool) -> CreateTripRequest {
        let from = Uuid::new_v4();
        CreateTripRequest {
            vehicle_id: Uuid::new_v4(),
            from_city_id: from,
            to_city_id: if same_city { from } else { Uuid::new_v4() },
            scheduled_date: scheduled,
            temperature_setting_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_booking_in_future_is_valid() {
        assert!(booking(Utc::now() + Duration::days(2), false).validate().is_ok());
    }

    #[test]
    fn test_booking_in_past_rejected() {
        let errors = booking(Utc::now() - Duration::days(1), false).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("scheduled_date"));
    }

    #[test]
    fn test_booking_same_city_rejected() {
        assert!(booking(Utc::now() + Duration::days(1), true).validate().is_err());
    }

    #[test]
    fn test_status_body_uses_wire_names() {
        let body: UpdateTripStatusRequest = serde_json::from_str(r#"{"status":"EN_ROUTE"}"#).unwrap();
        assert_eq!(body.status, TripStatus::EnRoute);
    }
}
