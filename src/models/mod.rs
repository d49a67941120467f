//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL con las convenciones estándar.

pub mod catalog;
pub mod customs;
pub mod invoice;
pub mod pricing;
pub mod tracking;
pub mod trip;
pub mod user;
