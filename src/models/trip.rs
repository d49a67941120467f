//! Modelo de Trip
//!
//! Un viaje es un envío de una ciudad origen a una ciudad destino para un
//! cliente, con vehículo y, opcionalmente, conductor y agente de aduanas.
//! Mapea exactamente a la tabla `trips`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del viaje - mapea al ENUM trip_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "trip_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Pending,
    DriverRequested,
    Assigned,
    InProgress,
    EnRoute,
    AtDestination,
    Delivered,
    Cancelled,
}

impl TripStatus {
    pub const ALL: [TripStatus; 8] = [
        TripStatus::Pending,
        TripStatus::DriverRequested,
        TripStatus::Assigned,
        TripStatus::InProgress,
        TripStatus::EnRoute,
        TripStatus::AtDestination,
        TripStatus::Delivered,
        TripStatus::Cancelled,
    ];

    /// Transiciones permitidas desde este estado
    pub fn next_states(&self) -> &'static [TripStatus] {
        use TripStatus::*;
        match self {
            Pending => &[DriverRequested, Assigned, Cancelled],
            DriverRequested => &[Assigned, Pending, Cancelled],
            Assigned => &[InProgress, Cancelled],
            InProgress => &[EnRoute],
            EnRoute => &[AtDestination],
            AtDestination => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        self.next_states().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Delivered | TripStatus::Cancelled)
    }

    /// Estados tempranos en los que el viaje aún puede cancelarse
    pub fn is_cancellable(&self) -> bool {
        self.can_transition_to(TripStatus::Cancelled)
    }

    /// El conductor sólo lo ha solicitado; no queda ligado al viaje si éste
    /// vuelve a PENDING o se cancela
    pub fn driver_is_tentative(&self) -> bool {
        matches!(self, TripStatus::DriverRequested)
    }

    /// Estados en los que el conductor reporta posición
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TripStatus::Assigned | TripStatus::InProgress | TripStatus::EnRoute | TripStatus::AtDestination
        )
    }

    /// Estados que el conductor puede fijar por sí mismo
    pub fn is_driver_settable(&self) -> bool {
        matches!(
            self,
            TripStatus::InProgress | TripStatus::EnRoute | TripStatus::AtDestination | TripStatus::Delivered
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Pending => "PENDING",
            TripStatus::DriverRequested => "DRIVER_REQUESTED",
            TripStatus::Assigned => "ASSIGNED",
            TripStatus::InProgress => "IN_PROGRESS",
            TripStatus::EnRoute => "EN_ROUTE",
            TripStatus::AtDestination => "AT_DESTINATION",
            TripStatus::Delivered => "DELIVERED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip principal - mapea exactamente a la tabla trips
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub trip_number: String,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Uuid,
    pub from_city_id: Uuid,
    pub to_city_id: Uuid,
    pub temperature_setting_id: Option<Uuid>,
    pub customs_broker_id: Option<Uuid>,
    pub status: TripStatus,
    pub price: Decimal,
    pub cancellation_fee: Option<Decimal>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub scheduled_date: DateTime<Utc>,
    pub actual_start_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Comprueba si el usuario participa en el viaje
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.customer_id == user_id
            || self.driver_id == Some(user_id)
            || self.customs_broker_id == Some(user_id)
    }
}

/// Viaje con nombres de ciudades y vehículo, para listados
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TripView {
    pub id: Uuid,
    pub trip_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub driver_id: Option<Uuid>,
    pub driver_name: Option<String>,
    pub vehicle_id: Uuid,
    pub vehicle_plate: String,
    pub from_city: String,
    pub to_city: String,
    pub temperature_label: Option<String>,
    pub customs_broker_id: Option<Uuid>,
    pub status: TripStatus,
    pub price: Decimal,
    pub cancellation_fee: Option<Decimal>,
    pub scheduled_date: DateTime<Utc>,
    pub actual_start_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_have_no_exit() {
        for next in TripStatus::ALL {
            assert!(!TripStatus::Delivered.can_transition_to(next));
            assert!(!TripStatus::Cancelled.can_transition_to(next));
        }
        assert!(TripStatus::Delivered.is_terminal());
        assert!(TripStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_linear_progression() {
        assert!(TripStatus::Pending.can_transition_to(TripStatus::DriverRequested));
        assert!(TripStatus::DriverRequested.can_transition_to(TripStatus::Assigned));
        assert!(TripStatus::Assigned.can_transition_to(TripStatus::InProgress));
        assert!(TripStatus::InProgress.can_transition_to(TripStatus::EnRoute));
        assert!(TripStatus::EnRoute.can_transition_to(TripStatus::AtDestination));
        assert!(TripStatus::AtDestination.can_transition_to(TripStatus::Delivered));
    }

    #[test]
    fn test_no_skipping_ahead() {
        assert!(!TripStatus::Pending.can_transition_to(TripStatus::InProgress));
        assert!(!TripStatus::Assigned.can_transition_to(TripStatus::Delivered));
        assert!(!TripStatus::InProgress.can_transition_to(TripStatus::Delivered));
        assert!(!TripStatus::EnRoute.can_transition_to(TripStatus::Pending));
    }

    #[test]
    fn test_cancellable_only_early() {
        let cancellable: Vec<_> = TripStatus::ALL.into_iter().filter(|s| s.is_cancellable()).collect();
        assert_eq!(
            cancellable,
            vec![TripStatus::Pending, TripStatus::DriverRequested, TripStatus::Assigned]
        );
    }

    #[test]
    fn test_only_requested_driver_is_tentative() {
        let tentative: Vec<_> = TripStatus::ALL.into_iter().filter(|s| s.driver_is_tentative()).collect();
        assert_eq!(tentative, vec![TripStatus::DriverRequested]);
    }

    #[test]
    fn test_driver_settable() {
        assert!(TripStatus::Delivered.is_driver_settable());
        assert!(!TripStatus::Assigned.is_driver_settable());
        assert!(!TripStatus::Cancelled.is_driver_settable());
    }

    #[test]
    fn test_serde_uses_screaming_case() {
        let json = serde_json::to_string(&TripStatus::DriverRequested).unwrap();
        assert_eq!(json, "\"DRIVER_REQUESTED\"");
        let parsed: TripStatus = serde_json::from_str("\"AT_DESTINATION\"").unwrap();
        assert_eq!(parsed, TripStatus::AtDestination);
    }
}
