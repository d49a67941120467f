use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::BusinessPolicy;
use crate::dto::api_response::ApiResponse;
use crate::dto::invoice_dto::{GenerateInvoiceRequest, InstallmentPlanRequest, PaymentRecordedResponse, RecordPaymentRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::invoice::{Invoice, Payment, PaymentStatus, ReceivablesSummary};
use crate::models::trip::{Trip, TripStatus};
use crate::models::user::Role;
use crate::repositories::invoice_repository::{InvoiceRepository, NewInvoice, NewPayment};
use crate::repositories::trip_repository::TripRepository;
use crate::services::billing::InvoiceAmounts;
use crate::services::invoice_document;
use crate::services::mailer::{notify_after_commit, Mailer, Notification};
use crate::services::metrics::Metrics;
use crate::services::numbering::{document_number, INVOICE_PREFIX};
use crate::services::scheduler::{self, SweepReport};
use crate::state::AppState;
use crate::utils::csv;
use crate::utils::errors::{not_found_error, AppError};

const EXPORT_HEADER: [&str; 11] = [
    "invoice_number",
    "trip_number",
    "customer",
    "route",
    "subtotal",
    "tax_amount",
    "customs_fees",
    "total_amount",
    "amount_paid",
    "remaining_amount",
    "status",
];

/// Documento descargable: nombre de archivo y contenido HTML
pub struct InvoiceDocument {
    pub file_name: String,
    pub html: String,
}

pub struct InvoiceController {
    pool: PgPool,
    repository: InvoiceRepository,
    trips: TripRepository,
    policy: BusinessPolicy,
    mailer: Arc<dyn Mailer>,
    metrics: Arc<Metrics>,
}

impl InvoiceController {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            repository: InvoiceRepository::new(state.pool.clone()),
            trips: TripRepository::new(state.pool.clone()),
            policy: state.config.policy.clone(),
            mailer: state.mailer.clone(),
            metrics: state.metrics.clone(),
        }
    }

    pub async fn generate(&self, request: GenerateInvoiceRequest) -> Result<ApiResponse<Invoice>, AppError> {
        request.validate()?;

        let trip = self
            .trips
            .find_by_id(request.trip_id)
            .await?
            .ok_or_else(|| not_found_error("Trip", &request.trip_id.to_string()))?;
        if trip.status == TripStatus::Cancelled {
            return Err(AppError::BadRequest("Cannot invoice a cancelled trip".to_string()));
        }

        let invoice = self
            .create_for_trip(
                &trip,
                request.customs_fees.unwrap_or(Decimal::ZERO),
                request.due_days.unwrap_or(self.policy.invoice_due_days),
            )
            .await?;
        Ok(ApiResponse::success_with_message(invoice, "Invoice generated successfully"))
    }

    /// Factura automática al entregar: sólo si el viaje aún no tiene una
    pub async fn generate_on_delivery(&self, trip: &Trip) -> Result<Option<Invoice>, AppError> {
        if self.repository.find_by_trip(trip.id).await?.is_some() {
            return Ok(None);
        }
        let invoice = self
            .create_for_trip(trip, Decimal::ZERO, self.policy.invoice_due_days)
            .await?;
        Ok(Some(invoice))
    }

    async fn create_for_trip(&self, trip: &Trip, customs_fees: Decimal, due_days: i64) -> Result<Invoice, AppError> {
        let now = Utc::now();
        let invoice = self
            .repository
            .create(NewInvoice {
                invoice_number: document_number(INVOICE_PREFIX, now),
                trip_id: trip.id,
                customer_id: trip.customer_id,
                amounts: InvoiceAmounts::compute(trip.price, customs_fees, self.policy.tax_rate),
                due_date: (now + Duration::days(due_days)).date_naive(),
            })
            .await?;

        self.metrics.invoices_generated.inc();
        info!(
            "🧾 Factura {} generada para el viaje {}: {} SAR",
            invoice.invoice_number, trip.trip_number, invoice.total_amount
        );
        Ok(invoice)
    }

    /// Contabilidad y admin ven todas; un cliente sólo las suyas
    pub async fn list(&self, user: &AuthenticatedUser, status: Option<PaymentStatus>) -> Result<Vec<Invoice>, AppError> {
        let customer_id = (user.role == Role::Customer).then_some(user.user_id);
        self.repository.list(status, customer_id).await
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Invoice, AppError> {
        let invoice = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Invoice", &id.to_string()))?;

        if user.role == Role::Customer && invoice.customer_id != user.user_id {
            return Err(not_found_error("Invoice", &id.to_string()));
        }
        Ok(invoice)
    }

    pub async fn payments(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Vec<Payment>, AppError> {
        let invoice = self.get(user, id).await?;
        self.repository.payments(invoice.id).await
    }

    /// PENDING -> SENT y aviso por correo al cliente
    pub async fn send(&self, id: Uuid) -> Result<ApiResponse<Invoice>, AppError> {
        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Invoice", &id.to_string()))?;

        let invoice = self.repository.mark_sent(id).await?.ok_or_else(|| {
            AppError::InvalidTransition(format!(
                "Only PENDING invoices can be sent (current: {})",
                current.payment_status.as_str()
            ))
        })?;

        let message = async {
            let view = self.repository.find_view(id).await?;
            Ok::<_, AppError>(view.map(|view| {
                Notification::invoice_sent(
                    &view.customer_email,
                    &view.customer_name,
                    &view.invoice_number,
                    &view.total_amount.to_string(),
                    &view.due_date.to_string(),
                )
            }))
        };
        notify_after_commit(self.mailer.as_ref(), message).await;

        info!("📨 Factura {} enviada", invoice.invoice_number);
        Ok(ApiResponse::success_with_message(invoice, "Invoice sent"))
    }

    pub async fn record_payment(
        &self,
        recorded_by: Uuid,
        id: Uuid,
        request: RecordPaymentRequest,
    ) -> Result<ApiResponse<PaymentRecordedResponse>, AppError> {
        request.validate()?;

        let (invoice, payment) = self
            .repository
            .record_payment(
                id,
                NewPayment {
                    amount: request.amount,
                    method: request.method,
                    reference: request.reference,
                    notes: request.notes,
                    payment_date: request.payment_date.unwrap_or_else(Utc::now),
                    recorded_by,
                },
            )
            .await?
            .ok_or_else(|| not_found_error("Invoice", &id.to_string()))?;

        self.metrics.payments_recorded.inc();
        info!(
            "💵 Pago de {} SAR en {}: estado {} (pendiente {})",
            payment.amount,
            invoice.invoice_number,
            invoice.payment_status.as_str(),
            invoice.remaining_amount
        );
        Ok(ApiResponse::success_with_message(
            PaymentRecordedResponse { invoice, payment },
            "Payment recorded",
        ))
    }

    pub async fn set_installments(&self, id: Uuid, request: InstallmentPlanRequest) -> Result<ApiResponse<Invoice>, AppError> {
        request.validate()?;
        let invoice = self
            .repository
            .set_installment_plan(id, request.count, request.first_due_date)
            .await?
            .ok_or_else(|| not_found_error("Invoice", &id.to_string()))?;

        info!(
            "📆 Factura {} en {} cuotas de {} SAR",
            invoice.invoice_number,
            request.count,
            invoice.installment_amount.unwrap_or_default()
        );
        Ok(ApiResponse::success_with_message(invoice, "Installment plan created"))
    }

    pub async fn cancel(&self, id: Uuid) -> Result<ApiResponse<Invoice>, AppError> {
        let invoice = self
            .repository
            .cancel(id)
            .await?
            .ok_or_else(|| not_found_error("Invoice", &id.to_string()))?;
        warn!("🚫 Factura {} cancelada", invoice.invoice_number);
        Ok(ApiResponse::success_with_message(invoice, "Invoice cancelled"))
    }

    pub async fn document(&self, user: &AuthenticatedUser, id: Uuid) -> Result<InvoiceDocument, AppError> {
        let invoice = self.get(user, id).await?;
        let view = self
            .repository
            .find_view(invoice.id)
            .await?
            .ok_or_else(|| not_found_error("Invoice", &id.to_string()))?;
        let payments = self.repository.payments(invoice.id).await?;

        Ok(InvoiceDocument {
            file_name: invoice_document::file_name(&view),
            html: invoice_document::render(&view, &payments)?,
        })
    }

    pub async fn export(&self, status: Option<PaymentStatus>) -> Result<String, AppError> {
        let rows: Vec<Vec<String>> = self
            .repository
            .list_views(status)
            .await?
            .into_iter()
            .map(|v| {
                vec![
                    v.invoice_number,
                    v.trip_number,
                    v.customer_name,
                    format!("{} - {}", v.from_city, v.to_city),
                    v.subtotal.to_string(),
                    v.tax_amount.to_string(),
                    v.customs_fees.to_string(),
                    v.total_amount.to_string(),
                    v.amount_paid.to_string(),
                    v.remaining_amount.to_string(),
                    v.payment_status.as_str().to_string(),
                ]
            })
            .collect();
        Ok(csv::write_document(&EXPORT_HEADER, &rows))
    }

    pub async fn summary(&self) -> Result<ReceivablesSummary, AppError> {
        self.repository.summary(None).await
    }

    pub async fn sweep(&self) -> Result<SweepReport, AppError> {
        scheduler::run_sweep(&self.pool, Utc::now().date_naive()).await
    }
}
