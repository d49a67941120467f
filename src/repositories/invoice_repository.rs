use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::invoice::{Invoice, InvoiceView, Payment, PaymentMethod, PaymentStatus, ReceivablesSummary};
use crate::services::billing::{self, InvoiceAmounts, InvoiceBalance};
use crate::utils::errors::{map_unique_violation, AppError};

const VIEW_SELECT: &str = r#"
    SELECT i.id, i.invoice_number, t.trip_number, u.full_name AS customer_name, u.email AS customer_email,
           cp.company_name, fc.name AS from_city, tc.name AS to_city,
           i.subtotal, i.tax_amount, i.customs_fees, i.total_amount, i.amount_paid, i.remaining_amount,
           i.payment_status, i.due_date, i.created_at
    FROM invoices i
    JOIN trips t ON t.id = i.trip_id
    JOIN users u ON u.id = i.customer_id
    LEFT JOIN customer_profiles cp ON cp.user_id = u.id
    JOIN cities fc ON fc.id = t.from_city_id
    JOIN cities tc ON tc.id = t.to_city_id
"#;

pub struct NewInvoice {
    pub invoice_number: String,
    pub trip_id: Uuid,
    pub customer_id: Uuid,
    pub amounts: InvoiceAmounts,
    pub due_date: NaiveDate,
}

pub struct NewPayment {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub payment_date: DateTime<Utc>,
    pub recorded_by: Uuid,
}

pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, invoice: NewInvoice) -> Result<Invoice, AppError> {
        let amounts = invoice.amounts;
        sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (id, invoice_number, trip_id, customer_id, subtotal, tax_amount,
                                  customs_fees, total_amount, amount_paid, remaining_amount, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&invoice.invoice_number)
        .bind(invoice.trip_id)
        .bind(invoice.customer_id)
        .bind(amounts.subtotal)
        .bind(amounts.tax_amount)
        .bind(amounts.customs_fees)
        .bind(amounts.total_amount)
        .bind(invoice.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "An invoice already exists for this trip"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invoice)
    }

    pub async fn find_by_trip(&self, trip_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE trip_id = $1")
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invoice)
    }

    pub async fn list(&self, status: Option<PaymentStatus>, customer_id: Option<Uuid>) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT * FROM invoices
            WHERE ($1::payment_status IS NULL OR payment_status = $1)
              AND ($2::uuid IS NULL OR customer_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invoices)
    }

    pub async fn find_view(&self, id: Uuid) -> Result<Option<InvoiceView>, AppError> {
        let view = sqlx::query_as::<_, InvoiceView>(&format!("{} WHERE i.id = $1", VIEW_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(view)
    }

    pub async fn list_views(&self, status: Option<PaymentStatus>) -> Result<Vec<InvoiceView>, AppError> {
        let views = sqlx::query_as::<_, InvoiceView>(&format!(
            "{} WHERE ($1::payment_status IS NULL OR i.payment_status = $1) ORDER BY i.created_at DESC",
            VIEW_SELECT
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(views)
    }

    pub async fn payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE invoice_id = $1 ORDER BY payment_date, created_at",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    /// PENDING -> SENT
    pub async fn mark_sent(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices SET payment_status = 'SENT', sent_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND payment_status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invoice)
    }

    /// Inserta el pago y recalcula la factura bajo bloqueo de fila
    pub async fn record_payment(&self, id: Uuid, payment: NewPayment) -> Result<Option<(Invoice, Payment)>, AppError> {
        let mut tx = self.pool.begin().await?;

        let invoice = match lock(&mut *tx, id).await? {
            Some(invoice) => invoice,
            None => return Ok(None),
        };
        let outcome = billing::apply_payment(&InvoiceBalance::from(&invoice), payment.amount)?;

        let recorded = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (id, invoice_id, amount, method, payment_date, reference, notes, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(payment.payment_date)
        .bind(&payment.reference)
        .bind(&payment.notes)
        .bind(payment.recorded_by)
        .fetch_one(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET amount_paid = $2, remaining_amount = $3, payment_status = $4::payment_status,
                installments_paid = $5, next_installment_date = $6,
                paid_at = CASE WHEN $4::payment_status = 'PAID' THEN NOW() ELSE paid_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(outcome.amount_paid)
        .bind(outcome.remaining_amount)
        .bind(outcome.status)
        .bind(outcome.installments_paid)
        .bind(outcome.next_installment_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((updated, recorded)))
    }

    pub async fn set_installment_plan(
        &self,
        id: Uuid,
        count: i32,
        first_due_date: NaiveDate,
    ) -> Result<Option<Invoice>, AppError> {
        let mut tx = self.pool.begin().await?;

        let invoice = match lock(&mut *tx, id).await? {
            Some(invoice) => invoice,
            None => return Ok(None),
        };
        let plan = billing::plan_installments(&InvoiceBalance::from(&invoice), count, first_due_date)?;

        let updated = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET payment_status = 'INSTALLMENT', installment_count = $2, installments_paid = 0,
                installment_amount = $3, next_installment_date = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(plan.installment_count)
        .bind(plan.installment_amount)
        .bind(plan.next_installment_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    pub async fn cancel(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let mut tx = self.pool.begin().await?;

        let invoice = match lock(&mut *tx, id).await? {
            Some(invoice) => invoice,
            None => return Ok(None),
        };
        billing::ensure_cancellable(&InvoiceBalance::from(&invoice))?;

        let updated = sqlx::query_as::<_, Invoice>(
            "UPDATE invoices SET payment_status = 'CANCELLED', updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Marca como vencidas las facturas fuera de plazo; devuelve cuántas
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<u64, AppError> {
        let candidates: Vec<(Uuid, PaymentStatus, NaiveDate, Option<NaiveDate>)> = sqlx::query_as(
            r#"
            SELECT id, payment_status, due_date, next_installment_date
            FROM invoices
            WHERE payment_status IN ('PENDING', 'SENT', 'PARTIAL', 'INSTALLMENT')
              AND (due_date < $1 OR next_installment_date < $1)
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = candidates
            .into_iter()
            .filter(|(_, status, due, next)| billing::is_overdue(*status, *due, *next, today))
            .map(|(id, ..)| id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        // el filtro por estado evita pisar un pago registrado entre ambas consultas
        let result = sqlx::query(
            r#"
            UPDATE invoices SET payment_status = 'OVERDUE', updated_at = NOW()
            WHERE id = ANY($1) AND payment_status IN ('PENDING', 'SENT', 'PARTIAL', 'INSTALLMENT')
            "#,
        )
        .bind(&ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn summary(&self, customer_id: Option<Uuid>) -> Result<ReceivablesSummary, AppError> {
        let summary = sqlx::query_as::<_, ReceivablesSummary>(
            r#"
            SELECT COUNT(*) AS invoice_count,
                   COALESCE(SUM(total_amount), 0) AS total_invoiced,
                   COALESCE(SUM(amount_paid), 0) AS total_collected,
                   COALESCE(SUM(remaining_amount), 0) AS total_outstanding,
                   COUNT(*) FILTER (WHERE payment_status = 'OVERDUE') AS overdue_count
            FROM invoices
            WHERE payment_status <> 'CANCELLED'
              AND ($1::uuid IS NULL OR customer_id = $1)
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }
}

async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<Invoice>, AppError> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(invoice)
}

/// Traslada los gastos de aduana a la factura del viaje, si existe y sigue abierta.
/// Un total por debajo de lo ya cobrado es un conflicto.
pub(crate) async fn apply_customs_fees(
    conn: &mut PgConnection,
    trip_id: Uuid,
    customs_fees: Decimal,
    tax_rate: Decimal,
) -> Result<Option<Invoice>, AppError> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE trip_id = $1 FOR UPDATE")
        .bind(trip_id)
        .fetch_optional(&mut *conn)
        .await?;

    let invoice = match invoice {
        Some(invoice) if !invoice.payment_status.is_closed() => invoice,
        _ => return Ok(None),
    };

    let amounts = InvoiceAmounts::compute(invoice.subtotal, customs_fees, tax_rate);
    let repriced = billing::reprice(&InvoiceBalance::from(&invoice), amounts.total_amount)?;

    let updated = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
        SET customs_fees = $2, tax_amount = $3, total_amount = $4, remaining_amount = $5,
            payment_status = $6::payment_status,
            paid_at = CASE WHEN $6::payment_status = 'PAID' THEN NOW() ELSE paid_at END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(invoice.id)
    .bind(amounts.customs_fees)
    .bind(amounts.tax_amount)
    .bind(amounts.total_amount)
    .bind(repriced.remaining_amount)
    .bind(repriced.status)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Some(updated))
}
