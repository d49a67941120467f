//! Política de cancelación de viajes
//!
//! Cancelación gratuita dentro de una ventana desde la creación del viaje;
//! fuera de ella se cobra un porcentaje del precio.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::BusinessPolicy;
use crate::utils::validation::round_money;

#[derive(Debug, Clone)]
pub struct CancellationPolicy {
    pub free_window: Duration,
    pub fee_percentage: Decimal,
}

/// Resultado de evaluar una cancelación
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancellationQuote {
    pub free_cancellation: bool,
    pub cancellation_fee: Decimal,
}

impl CancellationPolicy {
    pub fn new(free_window: Duration, fee_percentage: Decimal) -> Self {
        Self { free_window, fee_percentage }
    }

    /// Evalúa la cancelación de un viaje creado en `created_at`.
    /// El límite de la ventana es inclusivo.
    pub fn evaluate(&self, price: Decimal, created_at: DateTime<Utc>, now: DateTime<Utc>) -> CancellationQuote {
        if now - created_at <= self.free_window {
            CancellationQuote {
                free_cancellation: true,
                cancellation_fee: Decimal::ZERO,
            }
        } else {
            CancellationQuote {
                free_cancellation: false,
                cancellation_fee: round_money(price * self.fee_percentage),
            }
        }
    }
}

impl From<&BusinessPolicy> for CancellationPolicy {
    fn from(policy: &BusinessPolicy) -> Self {
        Self::new(
            Duration::hours(policy.free_cancellation_hours),
            policy.cancellation_fee_percentage,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn policy() -> CancellationPolicy {
        CancellationPolicy::new(Duration::hours(24), Decimal::from_str("0.10").unwrap())
    }

    #[test]
    fn test_free_inside_window() {
        let created = Utc::now();
        let quote = policy().evaluate(Decimal::from(1500), created, created + Duration::hours(23));
        assert!(quote.free_cancellation);
        assert_eq!(quote.cancellation_fee, Decimal::ZERO);
    }

    #[test]
    fn test_boundary_is_free() {
        let created = Utc::now();
        let quote = policy().evaluate(Decimal::from(1500), created, created + Duration::hours(24));
        assert!(quote.free_cancellation);
    }

    #[test]
    fn test_fee_after_window() {
        let created = Utc::now();
        let quote = policy().evaluate(
            Decimal::from_str("1234.55").unwrap(),
            created,
            created + Duration::hours(24) + Duration::seconds(1),
        );
        assert!(!quote.free_cancellation);
        assert_eq!(quote.cancellation_fee, Decimal::from_str("123.46").unwrap());
    }

    #[test]
    fn test_from_business_policy() {
        let p = CancellationPolicy::from(&BusinessPolicy::default());
        assert_eq!(p.free_window, Duration::hours(24));
        assert_eq!(p.fee_percentage, Decimal::new(10, 2));
    }
}
