//! Modelos de Invoice y Payment
//!
//! Una factura por viaje; los pagos son filas de un libro de solo inserción.
//! Los totales se recalculan en cada escritura (ver `services::billing`).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de cobro - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Sent,
    Partial,
    Installment,
    Paid,
    Overdue,
    Cancelled,
}

impl PaymentStatus {
    /// Ya no admite pagos ni cambios de plan
    pub fn is_closed(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Sent => "SENT",
            PaymentStatus::Partial => "PARTIAL",
            PaymentStatus::Installment => "INSTALLMENT",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Overdue => "OVERDUE",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Medio de pago - mapea al ENUM payment_method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Cheque,
}

/// Invoice principal - mapea exactamente a la tabla invoices
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub trip_id: Uuid,
    pub customer_id: Uuid,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub customs_fees: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub remaining_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub due_date: NaiveDate,
    pub installment_count: Option<i32>,
    pub installments_paid: i32,
    pub installment_amount: Option<Decimal>,
    pub next_installment_date: Option<NaiveDate>,
    pub sent_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pago registrado contra una factura
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Datos de factura para el documento y la exportación
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceView {
    pub id: Uuid,
    pub invoice_number: String,
    pub trip_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub company_name: Option<String>,
    pub from_city: String,
    pub to_city: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub customs_fees: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub remaining_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Resumen de cartera para contabilidad
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReceivablesSummary {
    pub invoice_count: i64,
    pub total_invoiced: Decimal,
    pub total_collected: Decimal,
    pub total_outstanding: Decimal,
    pub overdue_count: i64,
}
