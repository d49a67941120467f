//! Métricas Prometheus del negocio
//!
//! Registro propio (no el global) para que cada `AppState` de test tenga
//! contadores independientes.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::utils::errors::AppError;

pub struct Metrics {
    registry: Registry,
    pub trips_created: IntCounter,
    pub trip_transitions: IntCounterVec,
    pub tracking_points: IntCounter,
    pub payments_recorded: IntCounter,
    pub invoices_generated: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("profleet".to_string()), None)?;

        let trips_created = IntCounter::new("trips_created_total", "Trips booked")?;
        let trip_transitions = IntCounterVec::new(
            Opts::new("trip_status_transitions_total", "Trip status changes by target status"),
            &["status"],
        )?;
        let tracking_points = IntCounter::new("tracking_points_total", "GPS samples ingested")?;
        let payments_recorded = IntCounter::new("payments_recorded_total", "Payments recorded")?;
        let invoices_generated = IntCounter::new("invoices_generated_total", "Invoices generated")?;

        registry.register(Box::new(trips_created.clone()))?;
        registry.register(Box::new(trip_transitions.clone()))?;
        registry.register(Box::new(tracking_points.clone()))?;
        registry.register(Box::new(payments_recorded.clone()))?;
        registry.register(Box::new(invoices_generated.clone()))?;

        Ok(Self {
            registry,
            trips_created,
            trip_transitions,
            tracking_points,
            payments_recorded,
            invoices_generated,
        })
    }

    pub fn record_transition(&self, status: &str) {
        self.trip_transitions.with_label_values(&[status]).inc();
    }

    /// Exposición en formato texto para `/metrics`
    pub fn render(&self) -> Result<String, AppError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| AppError::Internal(format!("metrics encoding failed: {}", e)))?;
        String::from_utf8(buffer).map_err(|e| AppError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.trips_created.inc();
        metrics.record_transition("DELIVERED");

        let text = metrics.render().unwrap();
        assert!(text.contains("profleet_trips_created_total 1"));
        assert!(text.contains("profleet_trip_status_transitions_total{status=\"DELIVERED\"} 1"));
    }
}
