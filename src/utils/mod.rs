//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! y exportación CSV.

pub mod csv;
pub mod errors;
pub mod validation;
