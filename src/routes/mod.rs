//! Router principal de la API
//!
//! Cada grupo de rutas aplica su propia guardia de roles.

pub mod accountant_routes;
pub mod admin_routes;
pub mod auth_routes;
pub mod catalog_routes;
pub mod customer_routes;
pub mod customs_routes;
pub mod driver_routes;
pub mod tracking_routes;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::error;

use crate::database::connection::ping;
use crate::middleware::cors::cors_layer;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .nest("/api/auth", auth_routes::create_auth_router(&state))
        .nest("/api/admin", admin_routes::create_admin_router(&state))
        .nest("/api/customer", customer_routes::create_customer_router(&state))
        .nest("/api/driver", driver_routes::create_driver_router(&state))
        .nest("/api/accountant", accountant_routes::create_accountant_router(&state))
        .nest("/api/customs", customs_routes::create_customs_router(&state))
        .nest("/api/tracking", tracking_routes::create_tracking_router(&state))
        .nest("/api/catalog", catalog_routes::create_catalog_router(&state))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Response {
    match ping(&state.pool).await {
        Ok(()) => Json(json!({
            "status": "ok",
            "database": "up",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
        .into_response(),
        Err(e) => {
            error!("❌ Health check: base de datos no disponible: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "down" })),
            )
                .into_response()
        }
    }
}

async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}

/// Respuesta descargable con `Content-Disposition: attachment`
pub fn attachment(content_type: &'static str, file_name: &str, body: String) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', ""));
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

pub fn csv_attachment(file_name: &str, body: String) -> Response {
    attachment("text/csv; charset=utf-8", file_name, body)
}

pub fn html_attachment(file_name: &str, body: String) -> Response {
    attachment("text/html; charset=utf-8", file_name, body)
}

/// Cuerpo JSON opcional: vacío equivale a `T::default()`
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))
    }
}
