//! Acceso a datos (PostgreSQL)

pub mod catalog_repository;
pub mod customs_repository;
pub mod invoice_repository;
pub mod pricing_repository;
pub mod tracking_repository;
pub mod trip_repository;
pub mod user_repository;
