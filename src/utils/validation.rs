//! Utilidades de validación
//!
//! Funciones helper usadas por los `#[validate(custom = ...)]` de los DTOs.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

lazy_static! {
    /// Teléfono internacional: `+` opcional y entre 9 y 15 dígitos
    pub static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{9,15}$").unwrap();
    /// Matrícula: letras, dígitos, espacios y guiones
    pub static ref PLATE_RE: Regex = Regex::new(r"^[A-Za-z0-9\- ]{3,32}$").unwrap();
}

/// Decimales que admiten las columnas `NUMERIC(12,2)`
pub const MONEY_SCALE: u32 = 2;

/// Un importe cabe en la columna sin que Postgres lo redondee
pub fn has_money_scale(value: &Decimal) -> bool {
    value.normalize().scale() <= MONEY_SCALE
}

fn money_scale_error(value: &Decimal) -> ValidationError {
    let mut error = ValidationError::new("money_scale");
    error.message = Some("amount must have at most two decimal places".into());
    error.add_param("value".into(), &value.to_string());
    error
}

/// Validar que un importe sea estrictamente positivo
pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if !has_money_scale(value) {
        return Err(money_scale_error(value));
    }
    if *value <= Decimal::ZERO {
        let mut error = ValidationError::new("positive_amount");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un importe no sea negativo
pub fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if !has_money_scale(value) {
        return Err(money_scale_error(value));
    }
    if *value < Decimal::ZERO {
        let mut error = ValidationError::new("non_negative_amount");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que una fecha no esté en el pasado
pub fn validate_not_in_past(value: &DateTime<Utc>) -> Result<(), ValidationError> {
    // margen de un minuto para relojes de cliente desfasados
    if *value < Utc::now() - chrono::Duration::minutes(1) {
        let mut error = ValidationError::new("not_in_past");
        error.add_param("value".into(), &value.to_rfc3339());
        return Err(error);
    }
    Ok(())
}

/// Validar que un string no esté vacío
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// Redondeo monetario a dos decimales (half-up, como en caja)
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_phone_regex() {
        assert!(PHONE_RE.is_match("+966501234567"));
        assert!(PHONE_RE.is_match("0501234567"));
        assert!(!PHONE_RE.is_match("12-34"));
        assert!(!PHONE_RE.is_match("abc123456789"));
    }

    #[test]
    fn test_plate_regex() {
        assert!(PLATE_RE.is_match("ABC-1234"));
        assert!(!PLATE_RE.is_match("A"));
        assert!(!PLATE_RE.is_match("ABC#1234"));
    }

    #[test]
    fn test_amount_validators() {
        assert!(validate_positive_amount(&Decimal::from(10)).is_ok());
        assert!(validate_positive_amount(&Decimal::ZERO).is_err());
        assert!(validate_non_negative_amount(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative_amount(&Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_amounts_limited_to_cents() {
        let dec = |s: &str| Decimal::from_str(s).unwrap();
        assert!(validate_positive_amount(&dec("99.99")).is_ok());
        // ceros a la derecha no cuentan
        assert!(validate_positive_amount(&dec("100.500")).is_ok());

        let error = validate_positive_amount(&dec("99.995")).unwrap_err();
        assert_eq!(error.code, "money_scale");
        assert!(validate_positive_amount(&dec("0.004")).is_err());
        assert!(validate_non_negative_amount(&dec("0.001")).is_err());
        assert!(!has_money_scale(&dec("12.345")));
    }

    #[test]
    fn test_not_in_past() {
        assert!(validate_not_in_past(&(Utc::now() + chrono::Duration::hours(2))).is_ok());
        assert!(validate_not_in_past(&(Utc::now() - chrono::Duration::days(1))).is_err());
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(Decimal::from_str("10.005").unwrap()), Decimal::from_str("10.01").unwrap());
        assert_eq!(round_money(Decimal::from_str("10.004").unwrap()), Decimal::from_str("10.00").unwrap());
    }
}
