//! DTOs de entrada y salida de la API

pub mod api_response;
pub mod auth_dto;
pub mod catalog_dto;
pub mod customs_dto;
pub mod dashboard_dto;
pub mod invoice_dto;
pub mod pricing_dto;
pub mod tracking_dto;
pub mod trip_dto;
pub mod user_dto;

pub use api_response::ApiResponse;
