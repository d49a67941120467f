//! Barrido periódico de vencimientos
//!
//! Marca facturas vencidas y documentos de aduana caducados. Corre en una
//! tarea de fondo y también puede dispararse a mano desde contabilidad.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::repositories::customs_repository::CustomsRepository;
use crate::repositories::invoice_repository::InvoiceRepository;
use crate::utils::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub invoices_marked_overdue: u64,
    pub documents_expired: u64,
}

/// Ejecuta un barrido para la fecha `today`
pub async fn run_sweep(pool: &PgPool, today: NaiveDate) -> Result<SweepReport, AppError> {
    let invoices_marked_overdue = InvoiceRepository::new(pool.clone()).mark_overdue(today).await?;
    let documents_expired = CustomsRepository::new(pool.clone()).expire_documents(today).await?;

    let report = SweepReport {
        invoices_marked_overdue,
        documents_expired,
    };
    info!(
        "🧹 Barrido {}: {} facturas vencidas, {} documentos caducados",
        today, report.invoices_marked_overdue, report.documents_expired
    );
    Ok(report)
}

/// Lanza el barrido cada `interval_secs` segundos
pub fn spawn_sweeper(pool: PgPool, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            if let Err(e) = run_sweep(&pool, Utc::now().date_naive()).await {
                error!("❌ Error en el barrido de vencimientos: {}", e);
            }
        }
    })
}
