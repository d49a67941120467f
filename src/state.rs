//! Estado compartido de la aplicación
//!
//! Se clona en cada request a través del router de Axum.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::EnvironmentConfig;
use crate::middleware::rate_limit::RateLimitState;
use crate::services::cancellation::CancellationPolicy;
use crate::services::jwt_service::JwtService;
use crate::services::mailer::{build_mailer, Mailer};
use crate::services::metrics::Metrics;
use crate::utils::errors::AppError;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub jwt: Arc<JwtService>,
    pub mailer: Arc<dyn Mailer>,
    pub metrics: Arc<Metrics>,
    pub rate_limit: RateLimitState,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Result<Self, AppError> {
        let mailer = build_mailer(config.smtp.as_ref())?;
        Self::with_mailer(pool, config, mailer)
    }

    pub fn with_mailer(pool: PgPool, config: EnvironmentConfig, mailer: Arc<dyn Mailer>) -> Result<Self, AppError> {
        let metrics = Metrics::new().map_err(|e| AppError::Internal(format!("metrics registry: {}", e)))?;

        Ok(Self {
            jwt: Arc::new(JwtService::new(&config.jwt_secret, config.jwt_expiration)),
            rate_limit: RateLimitState::from_config(&config),
            metrics: Arc::new(metrics),
            mailer,
            pool,
            config,
        })
    }

    pub fn cancellation_policy(&self) -> CancellationPolicy {
        CancellationPolicy::from(&self.config.policy)
    }
}
