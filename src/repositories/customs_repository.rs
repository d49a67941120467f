use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::customs_dto::UploadDocumentRequest;
use crate::models::customs::{
    documents_allow_completion, ClearanceStatus, CustomsClearance, CustomsClearanceInvoice, CustomsDocument,
    DocumentStatus,
};
use crate::models::invoice::Invoice;
use crate::repositories::invoice_repository::apply_customs_fees;
use crate::services::billing::ClearanceAmounts;
use crate::utils::errors::{map_unique_violation, AppError};

pub struct NewClearance {
    pub trip_id: Uuid,
    pub customs_broker_id: Uuid,
    pub clearance_number: String,
    pub customs_fees: Decimal,
    pub notes: Option<String>,
}

pub struct NewClearanceInvoice {
    pub invoice_number: String,
    pub amounts: ClearanceAmounts,
    pub due_date: NaiveDate,
}

pub struct CustomsRepository {
    pool: PgPool,
}

impl CustomsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_clearance(&self, clearance: NewClearance) -> Result<CustomsClearance, AppError> {
        sqlx::query_as::<_, CustomsClearance>(
            r#"
            INSERT INTO customs_clearances (id, trip_id, customs_broker_id, clearance_number, customs_fees, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(clearance.trip_id)
        .bind(clearance.customs_broker_id)
        .bind(&clearance.clearance_number)
        .bind(clearance.customs_fees)
        .bind(&clearance.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A customs clearance already exists for this trip"))
    }

    pub async fn find_clearance(&self, id: Uuid) -> Result<Option<CustomsClearance>, AppError> {
        let clearance = sqlx::query_as::<_, CustomsClearance>("SELECT * FROM customs_clearances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(clearance)
    }

    pub async fn list_clearances(&self, broker_id: Option<Uuid>) -> Result<Vec<CustomsClearance>, AppError> {
        let clearances = sqlx::query_as::<_, CustomsClearance>(
            "SELECT * FROM customs_clearances WHERE ($1::uuid IS NULL OR customs_broker_id = $1) ORDER BY created_at DESC",
        )
        .bind(broker_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(clearances)
    }

    pub async fn documents(&self, clearance_id: Uuid) -> Result<Vec<CustomsDocument>, AppError> {
        let documents = sqlx::query_as::<_, CustomsDocument>(
            "SELECT * FROM customs_documents WHERE clearance_id = $1 ORDER BY created_at",
        )
        .bind(clearance_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(documents)
    }

    pub async fn clearance_invoice(&self, clearance_id: Uuid) -> Result<Option<CustomsClearanceInvoice>, AppError> {
        let invoice = sqlx::query_as::<_, CustomsClearanceInvoice>(
            "SELECT * FROM customs_clearance_invoices WHERE clearance_id = $1",
        )
        .bind(clearance_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invoice)
    }

    /// Registra un documento; el primer documento pone el despacho en curso
    pub async fn add_document(
        &self,
        clearance_id: Uuid,
        request: UploadDocumentRequest,
    ) -> Result<CustomsDocument, AppError> {
        let mut tx = self.pool.begin().await?;

        let document = sqlx::query_as::<_, CustomsDocument>(
            r#"
            INSERT INTO customs_documents (id, clearance_id, document_type, document_number, file_url, expiry_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(clearance_id)
        .bind(request.document_type.trim())
        .bind(request.document_number)
        .bind(request.file_url)
        .bind(request.expiry_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE customs_clearances SET status = 'IN_PROGRESS', updated_at = NOW() WHERE id = $1 AND status = 'PENDING'",
        )
        .bind(clearance_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(document)
    }

    pub async fn find_document(&self, id: Uuid) -> Result<Option<CustomsDocument>, AppError> {
        let document = sqlx::query_as::<_, CustomsDocument>("SELECT * FROM customs_documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(document)
    }

    /// Cambio de estado de revisión condicionado al estado actual
    pub async fn review_document(
        &self,
        id: Uuid,
        from: DocumentStatus,
        to: DocumentStatus,
        notes: Option<String>,
        reviewer_id: Uuid,
    ) -> Result<Option<CustomsDocument>, AppError> {
        let document = sqlx::query_as::<_, CustomsDocument>(
            r#"
            UPDATE customs_documents
            SET status = $3, review_notes = COALESCE($4, review_notes), reviewed_by = $5, reviewed_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(notes)
        .bind(reviewer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(document)
    }

    /// REJECTED -> PENDING con un archivo nuevo
    pub async fn resubmit_document(&self, id: Uuid, file_url: &str) -> Result<Option<CustomsDocument>, AppError> {
        let document = sqlx::query_as::<_, CustomsDocument>(
            r#"
            UPDATE customs_documents
            SET status = 'PENDING', file_url = $2, reviewed_by = NULL, reviewed_at = NULL
            WHERE id = $1 AND status = 'REJECTED'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(file_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(document)
    }

    /// Completa el despacho y traslada sus gastos a la factura del viaje
    pub async fn complete_clearance(
        &self,
        id: Uuid,
        tax_rate: Decimal,
    ) -> Result<Option<(CustomsClearance, Option<Invoice>)>, AppError> {
        let mut tx = self.pool.begin().await?;

        let clearance =
            sqlx::query_as::<_, CustomsClearance>("SELECT * FROM customs_clearances WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let clearance = match clearance {
            Some(clearance) => clearance,
            None => return Ok(None),
        };
        if !clearance.status.is_open() {
            return Err(AppError::InvalidTransition(format!(
                "clearance {} is already closed",
                clearance.clearance_number
            )));
        }

        let statuses: Vec<DocumentStatus> =
            sqlx::query_scalar("SELECT status FROM customs_documents WHERE clearance_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        if !documents_allow_completion(&statuses) {
            return Err(AppError::InvalidTransition(
                "all non-expired documents must be approved before completing the clearance".to_string(),
            ));
        }

        let completed = sqlx::query_as::<_, CustomsClearance>(
            r#"
            UPDATE customs_clearances SET status = 'COMPLETED', completed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let invoice = apply_customs_fees(&mut *tx, completed.trip_id, completed.customs_fees, tax_rate).await?;

        tx.commit().await?;
        Ok(Some((completed, invoice)))
    }

    pub async fn reject_clearance(&self, id: Uuid, notes: Option<String>) -> Result<Option<CustomsClearance>, AppError> {
        let clearance = sqlx::query_as::<_, CustomsClearance>(
            r#"
            UPDATE customs_clearances
            SET status = 'REJECTED', notes = COALESCE($2, notes), updated_at = NOW()
            WHERE id = $1 AND status IN ('PENDING', 'IN_PROGRESS')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(clearance)
    }

    /// Emite la factura del despacho; sus importes pasan a ser los gastos de
    /// aduana del viaje
    pub async fn bill_clearance(
        &self,
        clearance: &CustomsClearance,
        invoice: NewClearanceInvoice,
        tax_rate: Decimal,
    ) -> Result<CustomsClearanceInvoice, AppError> {
        let mut tx = self.pool.begin().await?;
        let amounts = invoice.amounts;

        let created = sqlx::query_as::<_, CustomsClearanceInvoice>(
            r#"
            INSERT INTO customs_clearance_invoices
                (id, clearance_id, invoice_number, customs_duties, broker_fees, tax_amount, total_amount, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(clearance.id)
        .bind(&invoice.invoice_number)
        .bind(amounts.customs_duties)
        .bind(amounts.broker_fees)
        .bind(amounts.tax_amount)
        .bind(amounts.total_amount)
        .bind(invoice.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "This clearance has already been billed"))?;

        sqlx::query("UPDATE customs_clearances SET customs_fees = $2, updated_at = NOW() WHERE id = $1")
            .bind(clearance.id)
            .bind(amounts.total_amount)
            .execute(&mut *tx)
            .await?;

        if clearance.status == ClearanceStatus::Completed {
            apply_customs_fees(&mut *tx, clearance.trip_id, amounts.total_amount, tax_rate).await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Marca como vencidos los documentos con `expiry_date` pasada
    pub async fn expire_documents(&self, today: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE customs_documents SET status = 'EXPIRED'
            WHERE expiry_date < $1 AND status IN ('PENDING', 'UNDER_REVIEW', 'APPROVED')
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
