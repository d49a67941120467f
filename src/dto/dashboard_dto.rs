use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::models::trip::{TripStatus, TripView};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatusCount {
    pub status: TripStatus,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub trips_by_status: Vec<StatusCount>,
    pub active_drivers: i64,
    pub available_drivers: i64,
    pub revenue_invoiced: Decimal,
    pub revenue_collected: Decimal,
    pub overdue_invoices: i64,
}

#[derive(Debug, Serialize)]
pub struct DriverDashboard {
    pub trips_by_status: Vec<StatusCount>,
    pub current_trip: Option<TripView>,
}

#[derive(Debug, Serialize)]
pub struct CustomerDashboard {
    pub trips_by_status: Vec<StatusCount>,
    pub outstanding_balance: Decimal,
}
