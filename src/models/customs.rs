//! Modelos de despacho aduanero
//!
//! Un despacho por viaje, gestionado por un agente de aduanas, con sus
//! documentos y su factura propia.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::invoice::PaymentStatus;

/// Estado del despacho - mapea al ENUM clearance_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "clearance_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClearanceStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl ClearanceStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, ClearanceStatus::Pending | ClearanceStatus::InProgress)
    }
}

/// Estado de un documento - mapea al ENUM document_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "document_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Expired,
}

impl DocumentStatus {
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (Pending, Expired)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (UnderReview, Expired)
                | (Rejected, Pending)
                | (Approved, Expired)
        )
    }

    /// Estados que puede fijar un revisor
    pub fn is_review_outcome(&self) -> bool {
        matches!(
            self,
            DocumentStatus::UnderReview | DocumentStatus::Approved | DocumentStatus::Rejected
        )
    }
}

/// Un despacho puede completarse cuando tiene documentos vigentes y todos
/// están aprobados
pub fn documents_allow_completion(statuses: &[DocumentStatus]) -> bool {
    let live: Vec<_> = statuses.iter().filter(|s| **s != DocumentStatus::Expired).collect();
    !live.is_empty() && live.iter().all(|s| **s == DocumentStatus::Approved)
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomsClearance {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub customs_broker_id: Uuid,
    pub clearance_number: String,
    pub status: ClearanceStatus,
    pub customs_fees: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomsDocument {
    pub id: Uuid,
    pub clearance_id: Uuid,
    pub document_type: String,
    pub document_number: Option<String>,
    pub file_url: String,
    pub status: DocumentStatus,
    pub expiry_date: Option<NaiveDate>,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomsClearanceInvoice {
    pub id: Uuid,
    pub clearance_id: Uuid,
    pub invoice_number: String,
    pub customs_duties: Decimal,
    pub broker_fees: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Despacho con sus documentos
#[derive(Debug, Clone, Serialize)]
pub struct ClearanceDetail {
    #[serde(flatten)]
    pub clearance: CustomsClearance,
    pub documents: Vec<CustomsDocument>,
    pub invoice: Option<CustomsClearanceInvoice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use DocumentStatus::*;

    #[test]
    fn test_document_transitions() {
        assert!(Pending.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Approved));
        assert!(UnderReview.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(Pending));
        assert!(Approved.can_transition_to(Expired));

        assert!(!Pending.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Expired.can_transition_to(Pending));
        assert!(!Expired.can_transition_to(Approved));
    }

    #[test]
    fn test_review_outcomes() {
        assert!(Approved.is_review_outcome());
        assert!(!Expired.is_review_outcome());
        assert!(!Pending.is_review_outcome());
    }

    #[test]
    fn test_completion_rules() {
        assert!(!documents_allow_completion(&[]));
        assert!(documents_allow_completion(&[Approved, Approved]));
        assert!(documents_allow_completion(&[Approved, Expired]));
        assert!(!documents_allow_completion(&[Expired]));
        assert!(!documents_allow_completion(&[Approved, UnderReview]));
        assert!(!documents_allow_completion(&[Approved, Rejected]));
    }
}
