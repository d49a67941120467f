use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::customs::DocumentStatus;
use crate::utils::validation::{validate_non_negative_amount, validate_not_blank};

#[derive(Debug, Deserialize, Validate)]
pub struct OpenClearanceRequest {
    pub trip_id: Uuid,

    /// Sólo para administradores; un agente siempre abre a su nombre
    pub customs_broker_id: Option<Uuid>,

    #[validate(custom = "validate_non_negative_amount")]
    pub customs_fees: Option<Decimal>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UploadDocumentRequest {
    #[validate(length(min = 2, max = 64), custom = "validate_not_blank")]
    pub document_type: String,

    #[validate(length(max = 64))]
    pub document_number: Option<String>,

    #[validate(length(min = 1, max = 2048))]
    pub file_url: String,

    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewDocumentRequest {
    pub status: DocumentStatus,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResubmitDocumentRequest {
    #[validate(length(min = 1, max = 2048))]
    pub file_url: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectClearanceRequest {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BillClearanceRequest {
    #[validate(custom = "validate_non_negative_amount")]
    pub customs_duties: Decimal,

    #[validate(custom = "validate_non_negative_amount")]
    pub broker_fees: Decimal,

    #[validate(range(min = 0, max = 365))]
    pub due_days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bill_rejects_negative_amounts() {
        let request = BillClearanceRequest {
            customs_duties: Decimal::from(-1),
            broker_fees: Decimal::from(100),
            due_days: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_document_requires_type_and_file() {
        let request = UploadDocumentRequest {
            document_type: "  ".to_string(),
            document_number: None,
            file_url: String::new(),
            expiry_date: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("document_type"));
        assert!(errors.field_errors().contains_key("file_url"));
    }
}
