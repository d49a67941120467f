//! Documento de factura en HTML
//!
//! Se renderiza con la plantilla `templates/invoice.html` y se entrega como
//! adjunto descargable.

use askama::Template;

use crate::models::invoice::{InvoiceView, Payment, PaymentMethod};
use crate::utils::errors::AppError;

/// Línea de pago ya formateada para la plantilla
pub struct PaymentLine {
    pub date: String,
    pub method: &'static str,
    pub reference: String,
    pub amount: String,
}

impl From<&Payment> for PaymentLine {
    fn from(payment: &Payment) -> Self {
        Self {
            date: payment.payment_date.format("%Y-%m-%d").to_string(),
            method: method_label(payment.method),
            reference: payment.reference.clone().unwrap_or_default(),
            amount: payment.amount.to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "invoice.html")]
struct InvoiceTemplate<'a> {
    invoice: &'a InvoiceView,
    company: &'a str,
    issued_on: String,
    status: &'static str,
    payments: Vec<PaymentLine>,
}

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Cash",
        PaymentMethod::BankTransfer => "Bank transfer",
        PaymentMethod::Card => "Card",
        PaymentMethod::Cheque => "Cheque",
    }
}

/// Renderiza la factura completa con su historial de pagos
pub fn render(invoice: &InvoiceView, payments: &[Payment]) -> Result<String, AppError> {
    InvoiceTemplate {
        invoice,
        company: invoice.company_name.as_deref().unwrap_or(""),
        issued_on: invoice.created_at.format("%Y-%m-%d").to_string(),
        status: invoice.payment_status.as_str(),
        payments: payments.iter().map(PaymentLine::from).collect(),
    }
    .render()
    .map_err(|e| AppError::Internal(format!("invoice template failed: {}", e)))
}

/// Nombre de archivo para `Content-Disposition`
pub fn file_name(invoice: &InvoiceView) -> String {
    format!("{}.html", invoice.invoice_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::PaymentStatus;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn view() -> InvoiceView {
        InvoiceView {
            id: Uuid::new_v4(),
            invoice_number: "INV-20260101-ABC123".to_string(),
            trip_number: "TRP-20251230-XYZ789".to_string(),
            customer_name: "Sara <Admin>".to_string(),
            customer_email: "sara@example.com".to_string(),
            company_name: Some("Cold Chain Co".to_string()),
            from_city: "Riyadh".to_string(),
            to_city: "Jeddah".to_string(),
            subtotal: Decimal::new(100000, 2),
            tax_amount: Decimal::new(15000, 2),
            customs_fees: Decimal::ZERO,
            total_amount: Decimal::new(115000, 2),
            amount_paid: Decimal::new(50000, 2),
            remaining_amount: Decimal::new(65000, 2),
            payment_status: PaymentStatus::Partial,
            due_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_contains_amounts_and_escapes() {
        let invoice = view();
        let payment = Payment {
            id: Uuid::new_v4(),
            invoice_id: invoice.id,
            amount: Decimal::new(50000, 2),
            method: PaymentMethod::BankTransfer,
            payment_date: Utc::now(),
            reference: Some("TX-1".to_string()),
            notes: None,
            recorded_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let html = render(&invoice, &[payment]).unwrap();
        assert!(html.contains("INV-20260101-ABC123"));
        assert!(html.contains("1150.00"));
        assert!(html.contains("650.00"));
        assert!(html.contains("Bank transfer"));
        assert!(html.contains("Cold Chain Co"));
        assert!(html.contains("PARTIAL"));
        assert!(!html.contains("<Admin>"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(&view()), "INV-20260101-ABC123.html");
    }
}
