use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::invoice::{Invoice, Payment, PaymentMethod, PaymentStatus};
use crate::utils::validation::{validate_non_negative_amount, validate_positive_amount};

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateInvoiceRequest {
    pub trip_id: Uuid,

    #[validate(custom = "validate_non_negative_amount")]
    pub customs_fees: Option<Decimal>,

    #[validate(range(min = 0, max = 365))]
    pub due_days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListQuery {
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(custom = "validate_positive_amount")]
    pub amount: Decimal,

    pub method: PaymentMethod,

    #[validate(length(max = 128))]
    pub reference: Option<String>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,

    pub payment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InstallmentPlanRequest {
    #[validate(range(min = 2, max = 24, message = "count must be between 2 and 24"))]
    pub count: i32,
    pub first_due_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct PaymentRecordedResponse {
    pub invoice: Invoice,
    pub payment: Payment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_amount_must_be_positive() {
        let request: RecordPaymentRequest =
            serde_json::from_str(r#"{"amount":"0","method":"CASH"}"#).unwrap();
        assert!(request.validate().is_err());

        let request: RecordPaymentRequest =
            serde_json::from_str(r#"{"amount":"250.50","method":"BANK_TRANSFER","reference":"TX-9"}"#).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_payment_amount_beyond_cents_rejected() {
        for amount in ["99.995", "0.004"] {
            let body = format!(r#"{{"amount":"{}","method":"CASH"}}"#, amount);
            let request: RecordPaymentRequest = serde_json::from_str(&body).unwrap();
            let errors = request.validate().unwrap_err();
            assert!(errors.field_errors().contains_key("amount"));
        }
    }

    #[test]
    fn test_installment_count_range() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(InstallmentPlanRequest { count: 1, first_due_date: date }.validate().is_err());
        assert!(InstallmentPlanRequest { count: 25, first_due_date: date }.validate().is_err());
        assert!(InstallmentPlanRequest { count: 12, first_due_date: date }.validate().is_ok());
    }
}
