//! Servicios de negocio
//!
//! Reglas puras (facturación, cancelación, numeración) y servicios de
//! infraestructura (JWT, correo, métricas, barrido periódico).

pub mod billing;
pub mod cancellation;
pub mod invoice_document;
pub mod jwt_service;
pub mod mailer;
pub mod metrics;
pub mod numbering;
pub mod password;
pub mod pricing_import;
pub mod scheduler;
