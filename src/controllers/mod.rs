pub mod auth_controller;
pub mod catalog_controller;
pub mod customs_controller;
pub mod dashboard_controller;
pub mod invoice_controller;
pub mod pricing_controller;
pub mod tracking_controller;
pub mod trip_controller;
pub mod user_controller;
