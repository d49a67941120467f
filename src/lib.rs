//! PRO FLEET - backend de logística de cadena de frío
//!
//! API REST para reservas de viajes, asignación de conductores, seguimiento
//! GPS, facturación con cuotas y despacho aduanero.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
