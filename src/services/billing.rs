//! Reglas de facturación
//!
//! Aritmética pura sobre importes de factura: totales, aplicación de pagos,
//! planes de cuotas y vencimientos. Los repositorios persisten el resultado;
//! aquí no hay acceso a base de datos.
//!
//! Invariantes que mantiene cada función:
//! - `total = subtotal + tax + customs_fees`
//! - `remaining = total - amount_paid`, nunca negativo

use chrono::{Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::invoice::{Invoice, PaymentStatus};
use crate::utils::errors::AppError;
use crate::utils::validation::{has_money_scale, round_money};

pub const MIN_INSTALLMENTS: i32 = 2;
pub const MAX_INSTALLMENTS: i32 = 24;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BillingError {
    #[error("payment amount must be greater than zero")]
    NonPositiveAmount,

    #[error("amount {0} has more than two decimal places")]
    TooPrecise(Decimal),

    #[error("payment of {amount} exceeds the remaining balance of {remaining}")]
    Overpayment { amount: Decimal, remaining: Decimal },

    #[error("invoice is {0} and accepts no further changes")]
    Closed(&'static str),

    #[error("installment count must be between 2 and 24")]
    InvalidInstallmentCount,

    #[error("invoice has no outstanding balance")]
    NothingOutstanding,

    #[error("invoice with payments cannot be cancelled")]
    HasPayments,

    #[error("new total {total} is below the {paid} already paid")]
    TotalBelowPaid { total: Decimal, paid: Decimal },
}

impl From<BillingError> for AppError {
    fn from(e: BillingError) -> Self {
        match e {
            BillingError::Closed(_) | BillingError::HasPayments | BillingError::TotalBelowPaid { .. } => {
                AppError::Conflict(e.to_string())
            }
            _ => AppError::BadRequest(e.to_string()),
        }
    }
}

/// Importes calculados de una factura
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InvoiceAmounts {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub customs_fees: Decimal,
    pub total_amount: Decimal,
}

impl InvoiceAmounts {
    pub fn compute(subtotal: Decimal, customs_fees: Decimal, tax_rate: Decimal) -> Self {
        let subtotal = round_money(subtotal);
        let customs_fees = round_money(customs_fees);
        let tax_amount = round_money(subtotal * tax_rate);
        Self {
            subtotal,
            tax_amount,
            customs_fees,
            total_amount: subtotal + tax_amount + customs_fees,
        }
    }
}

/// Importes de la factura de un despacho aduanero; el IVA sólo grava los
/// honorarios del agente
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClearanceAmounts {
    pub customs_duties: Decimal,
    pub broker_fees: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

impl ClearanceAmounts {
    pub fn compute(customs_duties: Decimal, broker_fees: Decimal, tax_rate: Decimal) -> Self {
        let customs_duties = round_money(customs_duties);
        let broker_fees = round_money(broker_fees);
        let tax_amount = round_money(broker_fees * tax_rate);
        Self {
            customs_duties,
            broker_fees,
            tax_amount,
            total_amount: customs_duties + broker_fees + tax_amount,
        }
    }
}

/// Estado de cobro relevante para aplicar un pago
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceBalance {
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub status: PaymentStatus,
    pub installment_count: Option<i32>,
    pub installments_paid: i32,
    pub installment_amount: Option<Decimal>,
    pub next_installment_date: Option<NaiveDate>,
}

impl InvoiceBalance {
    pub fn remaining(&self) -> Decimal {
        (self.total_amount - self.amount_paid).max(Decimal::ZERO)
    }

    fn has_plan(&self) -> bool {
        self.installment_count.is_some() && self.installment_amount.is_some()
    }
}

impl From<&Invoice> for InvoiceBalance {
    fn from(invoice: &Invoice) -> Self {
        Self {
            total_amount: invoice.total_amount,
            amount_paid: invoice.amount_paid,
            status: invoice.payment_status,
            installment_count: invoice.installment_count,
            installments_paid: invoice.installments_paid,
            installment_amount: invoice.installment_amount,
            next_installment_date: invoice.next_installment_date,
        }
    }
}

/// Resultado de aplicar un pago
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentOutcome {
    pub amount_paid: Decimal,
    pub remaining_amount: Decimal,
    pub status: PaymentStatus,
    pub installments_paid: i32,
    pub next_installment_date: Option<NaiveDate>,
}

impl PaymentOutcome {
    pub fn is_fully_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

fn ensure_open(status: PaymentStatus) -> Result<(), BillingError> {
    if status.is_closed() {
        return Err(BillingError::Closed(status.as_str()));
    }
    Ok(())
}

/// Aplica un pago y devuelve el nuevo estado de la factura
pub fn apply_payment(balance: &InvoiceBalance, amount: Decimal) -> Result<PaymentOutcome, BillingError> {
    ensure_open(balance.status)?;
    if amount <= Decimal::ZERO {
        return Err(BillingError::NonPositiveAmount);
    }
    if !has_money_scale(&amount) {
        return Err(BillingError::TooPrecise(amount));
    }
    let remaining = balance.remaining();
    if amount > remaining {
        return Err(BillingError::Overpayment { amount, remaining });
    }

    let amount_paid = balance.amount_paid + amount;
    let remaining_amount = remaining - amount;

    if remaining_amount.is_zero() {
        return Ok(PaymentOutcome {
            amount_paid,
            remaining_amount,
            status: PaymentStatus::Paid,
            installments_paid: balance.installment_count.unwrap_or(balance.installments_paid),
            next_installment_date: None,
        });
    }

    match (balance.has_plan(), balance.installment_count, balance.installment_amount) {
        (true, Some(count), Some(per_installment)) => {
            let pending = (count - balance.installments_paid).max(0);
            let covered = installments_covered(amount, per_installment).min(pending);
            let next_installment_date = balance
                .next_installment_date
                .and_then(|date| date.checked_add_months(Months::new(covered as u32)));

            Ok(PaymentOutcome {
                amount_paid,
                remaining_amount,
                status: PaymentStatus::Installment,
                installments_paid: balance.installments_paid + covered,
                next_installment_date,
            })
        }
        _ => Ok(PaymentOutcome {
            amount_paid,
            remaining_amount,
            status: PaymentStatus::Partial,
            installments_paid: balance.installments_paid,
            next_installment_date: balance.next_installment_date,
        }),
    }
}

/// Cuántas cuotas cubre un pago (al menos una)
fn installments_covered(amount: Decimal, per_installment: Decimal) -> i32 {
    if per_installment <= Decimal::ZERO {
        return 1;
    }
    (amount / per_installment).floor().to_i32().unwrap_or(i32::MAX).max(1)
}

/// Plan de cuotas calculado
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallmentPlan {
    pub installment_count: i32,
    pub installment_amount: Decimal,
    pub next_installment_date: NaiveDate,
}

/// Divide el saldo pendiente en `count` cuotas mensuales
pub fn plan_installments(
    balance: &InvoiceBalance,
    count: i32,
    first_due_date: NaiveDate,
) -> Result<InstallmentPlan, BillingError> {
    ensure_open(balance.status)?;
    if !(MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&count) {
        return Err(BillingError::InvalidInstallmentCount);
    }
    let remaining = balance.remaining();
    if remaining.is_zero() {
        return Err(BillingError::NothingOutstanding);
    }

    Ok(InstallmentPlan {
        installment_count: count,
        installment_amount: round_money(remaining / Decimal::from(count)),
        next_installment_date: first_due_date,
    })
}

/// Saldo y estado de una factura abierta tras cambiar su total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Repricing {
    pub remaining_amount: Decimal,
    pub status: PaymentStatus,
}

/// Recalcula el saldo para un total nuevo; lo ya cobrado no puede quedar
/// por encima del total
pub fn reprice(balance: &InvoiceBalance, new_total: Decimal) -> Result<Repricing, BillingError> {
    ensure_open(balance.status)?;
    if new_total < balance.amount_paid {
        return Err(BillingError::TotalBelowPaid {
            total: new_total,
            paid: balance.amount_paid,
        });
    }
    let remaining_amount = new_total - balance.amount_paid;
    let status = if remaining_amount.is_zero() { PaymentStatus::Paid } else { balance.status };
    Ok(Repricing { remaining_amount, status })
}

/// Una factura sin pagos puede cancelarse mientras no esté cerrada
pub fn ensure_cancellable(balance: &InvoiceBalance) -> Result<(), BillingError> {
    ensure_open(balance.status)?;
    if balance.amount_paid > Decimal::ZERO {
        return Err(BillingError::HasPayments);
    }
    Ok(())
}

/// Decide si una factura debe marcarse como vencida en `today`
pub fn is_overdue(
    status: PaymentStatus,
    due_date: NaiveDate,
    next_installment_date: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    match status {
        PaymentStatus::Pending | PaymentStatus::Sent | PaymentStatus::Partial => due_date < today,
        PaymentStatus::Installment => next_installment_date.map_or(false, |d| d < today),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn balance(total: &str, paid: &str, status: PaymentStatus) -> InvoiceBalance {
        InvoiceBalance {
            total_amount: dec(total),
            amount_paid: dec(paid),
            status,
            installment_count: None,
            installments_paid: 0,
            installment_amount: None,
            next_installment_date: None,
        }
    }

    #[test]
    fn test_total_is_sum_of_parts() {
        for (subtotal, fees) in [("1000", "0"), ("1234.56", "250"), ("0.01", "0.01"), ("99999.99", "12.5")] {
            let amounts = InvoiceAmounts::compute(dec(subtotal), dec(fees), dec("0.15"));
            assert_eq!(
                amounts.total_amount,
                amounts.subtotal + amounts.tax_amount + amounts.customs_fees
            );
        }
    }

    #[test]
    fn test_tax_rounded_to_cents() {
        let amounts = InvoiceAmounts::compute(dec("1234.56"), Decimal::ZERO, dec("0.15"));
        assert_eq!(amounts.tax_amount, dec("185.18"));
        assert_eq!(amounts.total_amount, dec("1419.74"));
    }

    #[test]
    fn test_partial_then_paid() {
        let b = balance("1150", "0", PaymentStatus::Sent);
        let first = apply_payment(&b, dec("500")).unwrap();
        assert_eq!(first.status, PaymentStatus::Partial);
        assert_eq!(first.remaining_amount, dec("650"));
        assert_eq!(first.amount_paid + first.remaining_amount, dec("1150"));

        let b = InvoiceBalance { amount_paid: first.amount_paid, status: first.status, ..b };
        let second = apply_payment(&b, dec("650")).unwrap();
        assert!(second.is_fully_paid());
        assert_eq!(second.remaining_amount, Decimal::ZERO);
    }

    #[test]
    fn test_overpayment_rejected() {
        let b = balance("100", "60", PaymentStatus::Partial);
        assert_eq!(
            apply_payment(&b, dec("40.01")),
            Err(BillingError::Overpayment { amount: dec("40.01"), remaining: dec("40") })
        );
    }

    #[test]
    fn test_non_positive_rejected() {
        let b = balance("100", "0", PaymentStatus::Pending);
        assert_eq!(apply_payment(&b, Decimal::ZERO), Err(BillingError::NonPositiveAmount));
        assert_eq!(apply_payment(&b, dec("-5")), Err(BillingError::NonPositiveAmount));
    }

    #[test]
    fn test_sub_cent_payments_rejected() {
        let b = balance("100.00", "0", PaymentStatus::Sent);
        assert_eq!(apply_payment(&b, dec("99.995")), Err(BillingError::TooPrecise(dec("99.995"))));
        assert_eq!(apply_payment(&b, dec("0.004")), Err(BillingError::TooPrecise(dec("0.004"))));

        // un pago a céntimos deja el saldo exactamente liquidable
        let first = apply_payment(&b, dec("99.99")).unwrap();
        assert_eq!(first.remaining_amount, dec("0.01"));
        let b = InvoiceBalance { amount_paid: first.amount_paid, status: first.status, ..b };
        let last = apply_payment(&b, dec("0.01")).unwrap();
        assert!(last.is_fully_paid());
        assert_eq!(last.amount_paid, b.total_amount);
    }

    #[test]
    fn test_closed_invoice_rejects_payment() {
        assert_eq!(
            apply_payment(&balance("100", "100", PaymentStatus::Paid), dec("1")),
            Err(BillingError::Closed("PAID"))
        );
        assert_eq!(
            apply_payment(&balance("100", "0", PaymentStatus::Cancelled), dec("1")),
            Err(BillingError::Closed("CANCELLED"))
        );
    }

    #[test]
    fn test_overdue_invoice_accepts_payment() {
        let outcome = apply_payment(&balance("100", "0", PaymentStatus::Overdue), dec("30")).unwrap();
        assert_eq!(outcome.status, PaymentStatus::Partial);
    }

    #[test]
    fn test_installment_plan_and_payments() {
        let b = balance("1000", "0", PaymentStatus::Sent);
        let plan = plan_installments(&b, 3, date(2026, 1, 31)).unwrap();
        assert_eq!(plan.installment_amount, dec("333.33"));

        let b = InvoiceBalance {
            status: PaymentStatus::Installment,
            installment_count: Some(plan.installment_count),
            installment_amount: Some(plan.installment_amount),
            next_installment_date: Some(plan.next_installment_date),
            ..b
        };

        let first = apply_payment(&b, dec("333.33")).unwrap();
        assert_eq!(first.status, PaymentStatus::Installment);
        assert_eq!(first.installments_paid, 1);
        // fin de mes se ajusta al último día de febrero
        assert_eq!(first.next_installment_date, Some(date(2026, 2, 28)));

        let b = InvoiceBalance {
            amount_paid: first.amount_paid,
            installments_paid: first.installments_paid,
            next_installment_date: first.next_installment_date,
            ..b
        };
        let last = apply_payment(&b, dec("666.67")).unwrap();
        assert!(last.is_fully_paid());
        assert_eq!(last.installments_paid, 3);
        assert_eq!(last.next_installment_date, None);
    }

    #[test]
    fn test_double_installment_payment_advances_two_months() {
        let b = InvoiceBalance {
            status: PaymentStatus::Installment,
            installment_count: Some(4),
            installment_amount: Some(dec("250")),
            next_installment_date: Some(date(2026, 3, 10)),
            ..balance("1000", "0", PaymentStatus::Installment)
        };
        let outcome = apply_payment(&b, dec("500")).unwrap();
        assert_eq!(outcome.installments_paid, 2);
        assert_eq!(outcome.next_installment_date, Some(date(2026, 5, 10)));

        let small = apply_payment(&b, dec("10")).unwrap();
        assert_eq!(small.installments_paid, 1);
    }

    #[test]
    fn test_installment_count_bounds() {
        let b = balance("1000", "0", PaymentStatus::Pending);
        assert_eq!(plan_installments(&b, 1, date(2026, 1, 1)), Err(BillingError::InvalidInstallmentCount));
        assert_eq!(plan_installments(&b, 25, date(2026, 1, 1)), Err(BillingError::InvalidInstallmentCount));
        assert!(plan_installments(&b, 24, date(2026, 1, 1)).is_ok());

        let settled = balance("1000", "1000", PaymentStatus::Partial);
        assert_eq!(plan_installments(&settled, 2, date(2026, 1, 1)), Err(BillingError::NothingOutstanding));
    }

    #[test]
    fn test_reprice_keeps_remaining_consistent() {
        let b = balance("1650", "1149", PaymentStatus::Partial);
        let raised = reprice(&b, dec("1700")).unwrap();
        assert_eq!(raised.remaining_amount, dec("551"));
        assert_eq!(raised.status, PaymentStatus::Partial);

        let settled = reprice(&b, dec("1149")).unwrap();
        assert_eq!(settled.remaining_amount, Decimal::ZERO);
        assert_eq!(settled.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_reprice_below_amount_paid_rejected() {
        let b = balance("1650", "1649", PaymentStatus::Partial);
        let err = reprice(&b, dec("1265")).unwrap_err();
        assert_eq!(err, BillingError::TotalBelowPaid { total: dec("1265"), paid: dec("1649") });
        assert_eq!(AppError::from(err).status_code(), axum::http::StatusCode::CONFLICT);

        assert_eq!(
            reprice(&balance("100", "100", PaymentStatus::Paid), dec("120")),
            Err(BillingError::Closed("PAID"))
        );
    }

    #[test]
    fn test_cancellation_rules() {
        assert!(ensure_cancellable(&balance("100", "0", PaymentStatus::Sent)).is_ok());
        assert_eq!(
            ensure_cancellable(&balance("100", "10", PaymentStatus::Partial)),
            Err(BillingError::HasPayments)
        );
        assert_eq!(
            ensure_cancellable(&balance("100", "100", PaymentStatus::Paid)),
            Err(BillingError::Closed("PAID"))
        );
    }

    #[test]
    fn test_clearance_tax_only_on_broker_fees() {
        let amounts = ClearanceAmounts::compute(dec("2000"), dec("300"), dec("0.15"));
        assert_eq!(amounts.tax_amount, dec("45.00"));
        assert_eq!(amounts.total_amount, dec("2345.00"));
    }

    #[test]
    fn test_billing_errors_map_to_http() {
        use axum::http::StatusCode;
        assert_eq!(AppError::from(BillingError::NonPositiveAmount).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(BillingError::Closed("PAID")).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::from(BillingError::HasPayments).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_overdue_detection() {
        let today = date(2026, 6, 1);
        assert!(is_overdue(PaymentStatus::Sent, date(2026, 5, 31), None, today));
        assert!(!is_overdue(PaymentStatus::Sent, date(2026, 6, 1), None, today));
        assert!(is_overdue(PaymentStatus::Partial, date(2026, 1, 1), None, today));
        assert!(!is_overdue(PaymentStatus::Paid, date(2026, 1, 1), None, today));
        assert!(!is_overdue(PaymentStatus::Overdue, date(2026, 1, 1), None, today));
        assert!(is_overdue(PaymentStatus::Installment, date(2027, 1, 1), Some(date(2026, 5, 1)), today));
        assert!(!is_overdue(PaymentStatus::Installment, date(2020, 1, 1), Some(date(2026, 7, 1)), today));
    }
}
