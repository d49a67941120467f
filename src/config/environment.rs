//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno, la política de negocio
//! (cancelaciones, impuestos, vencimientos) y el correo saliente.

use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Errores al leer la configuración
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Política de negocio configurable
#[derive(Debug, Clone)]
pub struct BusinessPolicy {
    pub free_cancellation_hours: i64,
    pub cancellation_fee_percentage: Decimal,
    pub tax_rate: Decimal,
    pub invoice_due_days: i64,
    pub overdue_sweep_interval_secs: u64,
}

impl Default for BusinessPolicy {
    fn default() -> Self {
        Self {
            free_cancellation_hours: 24,
            cancellation_fee_percentage: Decimal::new(10, 2),
            tax_rate: Decimal::new(15, 2),
            invoice_due_days: 30,
            overdue_sweep_interval_secs: 3600,
        }
    }
}

/// Configuración SMTP (opcional)
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,
    pub smtp: Option<SmtpConfig>,
    pub policy: BusinessPolicy,
}

impl EnvironmentConfig {
    /// Leer la configuración desde las variables de entorno
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda;
    /// separado de `from_env` para poder probarlo sin tocar el entorno real
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let smtp = match lookup("SMTP_HOST") {
            Some(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host,
                port: parse("SMTP_PORT", &or_default("SMTP_PORT", "587"))?,
                username: or_default("SMTP_USERNAME", ""),
                password: or_default("SMTP_PASSWORD", ""),
                from: or_default("MAIL_FROM", "PRO FLEET <no-reply@profleet.local>"),
            }),
            _ => None,
        };

        let defaults = BusinessPolicy::default();
        let policy = BusinessPolicy {
            free_cancellation_hours: parse_or(&lookup, "FREE_CANCELLATION_HOURS", defaults.free_cancellation_hours)?,
            cancellation_fee_percentage: parse_or(
                &lookup,
                "CANCELLATION_FEE_PERCENTAGE",
                defaults.cancellation_fee_percentage,
            )?,
            tax_rate: parse_or(&lookup, "TAX_RATE", defaults.tax_rate)?,
            invoice_due_days: parse_or(&lookup, "INVOICE_DUE_DAYS", defaults.invoice_due_days)?,
            overdue_sweep_interval_secs: parse_or(
                &lookup,
                "OVERDUE_SWEEP_INTERVAL_SECS",
                defaults.overdue_sweep_interval_secs,
            )?,
        };

        if policy.cancellation_fee_percentage < Decimal::ZERO || policy.cancellation_fee_percentage > Decimal::ONE {
            return Err(ConfigError::Invalid {
                name: "CANCELLATION_FEE_PERCENTAGE",
                value: policy.cancellation_fee_percentage.to_string(),
            });
        }

        Ok(Self {
            environment: or_default("ENVIRONMENT", "development"),
            port: parse("PORT", &or_default("PORT", "3000"))?,
            host: or_default("HOST", "0.0.0.0"),
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration: parse("JWT_EXPIRATION", &or_default("JWT_EXPIRATION", "86400"))?,
            cors_origins: lookup("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_requests: parse("RATE_LIMIT_REQUESTS", &or_default("RATE_LIMIT_REQUESTS", "60"))?,
            rate_limit_window: parse("RATE_LIMIT_WINDOW", &or_default("RATE_LIMIT_WINDOW", "60"))?,
            smtp,
            policy,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_or<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => parse(name, &value),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = EnvironmentConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/profleet"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert!(config.is_development());
        assert!(config.smtp.is_none());
        assert_eq!(config.policy.free_cancellation_hours, 24);
        assert_eq!(config.policy.tax_rate, Decimal::new(15, 2));
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn test_missing_required() {
        let err = EnvironmentConfig::from_lookup(lookup_from(&[("JWT_SECRET", "secret")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_invalid_number() {
        let err = EnvironmentConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/profleet"),
            ("JWT_SECRET", "secret"),
            ("PORT", "abc"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_policy_overrides_and_smtp() {
        let config = EnvironmentConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/profleet"),
            ("JWT_SECRET", "secret"),
            ("FREE_CANCELLATION_HOURS", "48"),
            ("CANCELLATION_FEE_PERCENTAGE", "0.25"),
            ("SMTP_HOST", "smtp.example.com"),
            ("CORS_ORIGINS", "https://a.com, https://b.com"),
        ]))
        .unwrap();

        assert_eq!(config.policy.free_cancellation_hours, 48);
        assert_eq!(config.policy.cancellation_fee_percentage, Decimal::new(25, 2));
        assert_eq!(config.smtp.unwrap().port, 587);
        assert_eq!(config.cors_origins, vec!["https://a.com", "https://b.com"]);
    }

    #[test]
    fn test_fee_percentage_out_of_range() {
        let err = EnvironmentConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/profleet"),
            ("JWT_SECRET", "secret"),
            ("CANCELLATION_FEE_PERCENTAGE", "1.5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CANCELLATION_FEE_PERCENTAGE", .. }));
    }
}
