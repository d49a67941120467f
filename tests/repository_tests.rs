//! Pruebas de repositorio contra PostgreSQL real
//!
//! Cada prueba recibe una base de datos nueva con las migraciones aplicadas.
//! Necesitan `DATABASE_URL`; se ejecutan con `cargo test -- --ignored`.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use pro_fleet::dto::catalog_dto::{CreateCityRequest, CreateVehicleRequest};
use pro_fleet::dto::customs_dto::UploadDocumentRequest;
use pro_fleet::models::customs::{ClearanceStatus, DocumentStatus};
use pro_fleet::models::invoice::{Invoice, PaymentMethod, PaymentStatus};
use pro_fleet::models::trip::{Trip, TripStatus};
use pro_fleet::models::user::Role;
use pro_fleet::repositories::catalog_repository::CatalogRepository;
use pro_fleet::repositories::customs_repository::{CustomsRepository, NewClearance, NewClearanceInvoice};
use pro_fleet::repositories::invoice_repository::{InvoiceRepository, NewInvoice, NewPayment};
use pro_fleet::repositories::pricing_repository::PricingRepository;
use pro_fleet::repositories::trip_repository::{NewTrip, TripRepository};
use pro_fleet::repositories::user_repository::{NewProfile, NewUser, UserRepository};
use pro_fleet::services::billing::{ClearanceAmounts, InvoiceAmounts};
use pro_fleet::services::numbering::{
    document_number, CLEARANCE_PREFIX, CUSTOMS_INVOICE_PREFIX, INVOICE_PREFIX, TRIP_PREFIX,
};
use pro_fleet::utils::errors::AppError;

fn money(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn tax_rate() -> Decimal {
    money("0.15")
}

struct Fixture {
    admin_id: Uuid,
    customer_id: Uuid,
    vehicle_id: Uuid,
    from_city_id: Uuid,
    to_city_id: Uuid,
}

async fn user(pool: &PgPool, role: Role, profile: NewProfile) -> Uuid {
    UserRepository::new(pool.clone())
        .create(
            NewUser {
                email: format!("{}@profleet.test", Uuid::new_v4()),
                password_hash: "not-a-real-hash".to_string(),
                full_name: "Test User".to_string(),
                phone: None,
                role,
            },
            profile,
        )
        .await
        .unwrap()
        .id
}

async fn driver(pool: &PgPool) -> Uuid {
    user(
        pool,
        Role::Driver,
        NewProfile::Driver {
            license_number: format!("LIC-{}", Uuid::new_v4()),
            license_expiry: None,
            nationality: None,
        },
    )
    .await
}

async fn fixture(pool: &PgPool) -> Fixture {
    let catalog = CatalogRepository::new(pool.clone());
    let from = catalog
        .create_city(CreateCityRequest {
            name: "Riyadh".to_string(),
            name_ar: None,
        })
        .await
        .unwrap();
    let to = catalog
        .create_city(CreateCityRequest {
            name: "Dammam".to_string(),
            name_ar: None,
        })
        .await
        .unwrap();
    let vehicle = catalog
        .create_vehicle(CreateVehicleRequest {
            plate_number: "ABC-1234".to_string(),
            vehicle_type: "REEFER_TRUCK".to_string(),
            capacity_kg: Some(money("12000")),
        })
        .await
        .unwrap();

    Fixture {
        admin_id: user(pool, Role::Admin, NewProfile::None).await,
        customer_id: user(
            pool,
            Role::Customer,
            NewProfile::Customer {
                company_name: Some("Cold Goods Co".to_string()),
                address: None,
                tax_number: None,
            },
        )
        .await,
        vehicle_id: vehicle.id,
        from_city_id: from.id,
        to_city_id: to.id,
    }
}

async fn trip(pool: &PgPool, fx: &Fixture) -> Trip {
    TripRepository::new(pool.clone())
        .create(NewTrip {
            trip_number: document_number(TRIP_PREFIX, Utc::now()),
            customer_id: fx.customer_id,
            vehicle_id: fx.vehicle_id,
            from_city_id: fx.from_city_id,
            to_city_id: fx.to_city_id,
            temperature_setting_id: None,
            scheduled_date: Utc::now() + Duration::days(1),
            price: money("1000"),
            notes: None,
        })
        .await
        .unwrap()
}

async fn invoice(pool: &PgPool, fx: &Fixture, trip_id: Uuid, due_date: NaiveDate) -> Invoice {
    InvoiceRepository::new(pool.clone())
        .create(NewInvoice {
            invoice_number: document_number(INVOICE_PREFIX, Utc::now()),
            trip_id,
            customer_id: fx.customer_id,
            amounts: InvoiceAmounts::compute(money("1000"), Decimal::ZERO, tax_rate()),
            due_date,
        })
        .await
        .unwrap()
}

fn payment(amount: Decimal, recorded_by: Uuid) -> NewPayment {
    NewPayment {
        amount,
        method: PaymentMethod::BankTransfer,
        reference: None,
        notes: None,
        payment_date: Utc::now(),
        recorded_by,
    }
}

async fn set_status(pool: &PgPool, invoice_id: Uuid, status: &str) {
    sqlx::query("UPDATE invoices SET payment_status = $2::payment_status WHERE id = $1")
        .bind(invoice_id)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_record_payment_recomputes_balance(pool: PgPool) {
    let fx = fixture(&pool).await;
    let trip = trip(&pool, &fx).await;
    let created = invoice(&pool, &fx, trip.id, today() + Duration::days(30)).await;
    let repo = InvoiceRepository::new(pool.clone());
    assert_eq!(created.total_amount, money("1150.00"));

    let (partial, _) = repo
        .record_payment(created.id, payment(money("400"), fx.admin_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(partial.amount_paid, money("400"));
    assert_eq!(partial.remaining_amount, money("750"));
    assert_eq!(partial.payment_status, PaymentStatus::Partial);
    assert!(partial.paid_at.is_none());

    let overpay = repo.record_payment(created.id, payment(money("750.01"), fx.admin_id)).await;
    assert!(matches!(overpay, Err(AppError::BadRequest(_))));

    let (paid, _) = repo
        .record_payment(created.id, payment(money("750"), fx.admin_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid.amount_paid, paid.total_amount);
    assert_eq!(paid.remaining_amount, Decimal::ZERO);
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert!(paid.paid_at.is_some());

    // El pago rechazado no dejó fila
    assert_eq!(repo.payments(created.id).await.unwrap().len(), 2);

    let closed = repo.record_payment(created.id, payment(money("1"), fx.admin_id)).await;
    assert!(closed.is_err());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_mark_overdue_only_touches_open_past_due(pool: PgPool) {
    let fx = fixture(&pool).await;
    let repo = InvoiceRepository::new(pool.clone());

    let late = invoice(&pool, &fx, trip(&pool, &fx).await.id, today() - Duration::days(3)).await;
    set_status(&pool, late.id, "SENT").await;
    let current = invoice(&pool, &fx, trip(&pool, &fx).await.id, today() + Duration::days(3)).await;
    set_status(&pool, current.id, "SENT").await;
    let settled = invoice(&pool, &fx, trip(&pool, &fx).await.id, today() - Duration::days(3)).await;
    repo.record_payment(settled.id, payment(settled.total_amount, fx.admin_id))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(repo.mark_overdue(today()).await.unwrap(), 1);
    // Segunda pasada: nada nuevo que marcar
    assert_eq!(repo.mark_overdue(today()).await.unwrap(), 0);

    let late = repo.find_by_id(late.id).await.unwrap().unwrap();
    assert_eq!(late.payment_status, PaymentStatus::Overdue);
    let current = repo.find_by_id(current.id).await.unwrap().unwrap();
    assert_eq!(current.payment_status, PaymentStatus::Sent);
    let settled = repo.find_by_id(settled.id).await.unwrap().unwrap();
    assert_eq!(settled.payment_status, PaymentStatus::Paid);

    // Una factura vencida sigue aceptando pagos
    let (partial, _) = repo
        .record_payment(late.id, payment(money("100"), fx.admin_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(partial.payment_status, PaymentStatus::Partial);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_cancel_assigned_trip_frees_driver_and_voids_invoice(pool: PgPool) {
    let fx = fixture(&pool).await;
    let driver_id = driver(&pool).await;
    let trips = TripRepository::new(pool.clone());
    let created = trip(&pool, &fx).await;
    let unpaid = invoice(&pool, &fx, created.id, today() + Duration::days(30)).await;

    let assigned = trips.assign_driver(created.id, driver_id).await.unwrap().unwrap();
    assert_eq!(assigned.status, TripStatus::Assigned);
    let available: bool = sqlx::query_scalar("SELECT is_available FROM driver_profiles WHERE user_id = $1")
        .bind(driver_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!available);

    let cancelled = trips
        .cancel(created.id, TripStatus::Assigned, money("50"), Some("customer request".to_string()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);
    assert_eq!(cancelled.driver_id, Some(driver_id));
    assert!(cancelled.cancelled_at.is_some());

    let available: bool = sqlx::query_scalar("SELECT is_available FROM driver_profiles WHERE user_id = $1")
        .bind(driver_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(available);

    let voided = InvoiceRepository::new(pool.clone()).find_by_id(unpaid.id).await.unwrap().unwrap();
    assert_eq!(voided.payment_status, PaymentStatus::Cancelled);

    // Estado de partida ya no coincide
    let again = trips.cancel(created.id, TripStatus::Assigned, money("0"), None).await.unwrap();
    assert!(again.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_cancel_keeps_invoice_with_payments(pool: PgPool) {
    let fx = fixture(&pool).await;
    let trips = TripRepository::new(pool.clone());
    let invoices = InvoiceRepository::new(pool.clone());
    let created = trip(&pool, &fx).await;
    let billed = invoice(&pool, &fx, created.id, today() + Duration::days(30)).await;
    invoices
        .record_payment(billed.id, payment(money("200"), fx.admin_id))
        .await
        .unwrap()
        .unwrap();

    trips.cancel(created.id, TripStatus::Pending, money("0"), None).await.unwrap().unwrap();

    let kept = invoices.find_by_id(billed.id).await.unwrap().unwrap();
    assert_eq!(kept.payment_status, PaymentStatus::Partial);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_cancel_requested_trip_releases_requesting_driver(pool: PgPool) {
    let fx = fixture(&pool).await;
    let driver_id = driver(&pool).await;
    let trips = TripRepository::new(pool.clone());
    let created = trip(&pool, &fx).await;

    let requested = trips.request_by_driver(created.id, driver_id).await.unwrap().unwrap();
    assert_eq!(requested.status, TripStatus::DriverRequested);
    assert_eq!(requested.driver_id, Some(driver_id));

    let cancelled = trips
        .cancel(created.id, TripStatus::DriverRequested, money("0"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);
    assert_eq!(cancelled.driver_id, None);

    let stored = trips.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored.driver_id, None);
}

async fn completed_clearance(pool: &PgPool, fx: &Fixture, trip_id: Uuid, fees: Decimal) -> Uuid {
    let broker_id = user(
        pool,
        Role::CustomsBroker,
        NewProfile::CustomsBroker {
            license_number: format!("BRK-{}", Uuid::new_v4()),
            company_name: None,
        },
    )
    .await;
    let customs = CustomsRepository::new(pool.clone());
    let clearance = customs
        .create_clearance(NewClearance {
            trip_id,
            customs_broker_id: broker_id,
            clearance_number: document_number(CLEARANCE_PREFIX, Utc::now()),
            customs_fees: fees,
            notes: None,
        })
        .await
        .unwrap();
    let document = customs
        .add_document(
            clearance.id,
            UploadDocumentRequest {
                document_type: "BILL_OF_LADING".to_string(),
                document_number: Some("BL-001".to_string()),
                file_url: "https://files.profleet.test/bl-001.pdf".to_string(),
                expiry_date: None,
            },
        )
        .await
        .unwrap();

    // Sin documentos aprobados no se puede completar
    let early = customs.complete_clearance(clearance.id, tax_rate()).await;
    assert!(matches!(early, Err(AppError::InvalidTransition(_))));

    customs
        .review_document(document.id, DocumentStatus::Pending, DocumentStatus::UnderReview, None, fx.admin_id)
        .await
        .unwrap()
        .unwrap();
    customs
        .review_document(document.id, DocumentStatus::UnderReview, DocumentStatus::Approved, None, fx.admin_id)
        .await
        .unwrap()
        .unwrap();

    let (completed, _) = customs.complete_clearance(clearance.id, tax_rate()).await.unwrap().unwrap();
    assert_eq!(completed.status, ClearanceStatus::Completed);
    completed.id
}

fn clearance_invoice(duties: Decimal) -> NewClearanceInvoice {
    NewClearanceInvoice {
        invoice_number: document_number(CUSTOMS_INVOICE_PREFIX, Utc::now()),
        amounts: ClearanceAmounts::compute(duties, Decimal::ZERO, Decimal::ZERO),
        due_date: today() + Duration::days(30),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_complete_clearance_adds_fees_to_trip_invoice(pool: PgPool) {
    let fx = fixture(&pool).await;
    let created = trip(&pool, &fx).await;
    let billed = invoice(&pool, &fx, created.id, today() + Duration::days(30)).await;

    completed_clearance(&pool, &fx, created.id, money("500")).await;

    let updated = InvoiceRepository::new(pool.clone()).find_by_trip(created.id).await.unwrap().unwrap();
    assert_eq!(updated.id, billed.id);
    assert_eq!(updated.customs_fees, money("500"));
    assert_eq!(updated.subtotal, money("1000"));
    assert_eq!(updated.total_amount, updated.subtotal + updated.tax_amount + updated.customs_fees);
    assert_eq!(updated.remaining_amount, updated.total_amount - updated.amount_paid);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_lowering_fees_below_amount_paid_is_rejected(pool: PgPool) {
    let fx = fixture(&pool).await;
    let created = trip(&pool, &fx).await;
    let billed = invoice(&pool, &fx, created.id, today() + Duration::days(30)).await;
    let clearance_id = completed_clearance(&pool, &fx, created.id, money("500")).await;
    let invoices = InvoiceRepository::new(pool.clone());
    let customs = CustomsRepository::new(pool.clone());

    let before = invoices.find_by_id(billed.id).await.unwrap().unwrap();
    let paid = before.total_amount - money("1");
    invoices
        .record_payment(billed.id, payment(paid, fx.admin_id))
        .await
        .unwrap()
        .unwrap();

    let clearance = customs.find_clearance(clearance_id).await.unwrap().unwrap();
    let result = customs.bill_clearance(&clearance, clearance_invoice(money("100")), tax_rate()).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // Toda la transacción se deshizo
    let after = invoices.find_by_id(billed.id).await.unwrap().unwrap();
    assert_eq!(after.total_amount, before.total_amount);
    assert_eq!(after.amount_paid, paid);
    assert_eq!(after.remaining_amount, money("1"));
    assert!(customs.clearance_invoice(clearance_id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_fees_matching_amount_paid_settle_invoice(pool: PgPool) {
    let fx = fixture(&pool).await;
    let created = trip(&pool, &fx).await;
    let billed = invoice(&pool, &fx, created.id, today() + Duration::days(30)).await;
    let clearance_id = completed_clearance(&pool, &fx, created.id, money("500")).await;
    let invoices = InvoiceRepository::new(pool.clone());
    let customs = CustomsRepository::new(pool.clone());

    // 1150 de la factura original más 100 de la factura de aduana
    invoices
        .record_payment(billed.id, payment(money("1250"), fx.admin_id))
        .await
        .unwrap()
        .unwrap();

    let clearance = customs.find_clearance(clearance_id).await.unwrap().unwrap();
    customs
        .bill_clearance(&clearance, clearance_invoice(money("100")), tax_rate())
        .await
        .unwrap();

    let settled = invoices.find_by_id(billed.id).await.unwrap().unwrap();
    assert_eq!(settled.customs_fees, money("100"));
    assert_eq!(settled.total_amount, money("1250"));
    assert_eq!(settled.remaining_amount, Decimal::ZERO);
    assert_eq!(settled.payment_status, PaymentStatus::Paid);
    assert!(settled.paid_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_pricing_upsert_reports_insert_then_update(pool: PgPool) {
    let fx = fixture(&pool).await;
    let pricing = PricingRepository::new(pool.clone());

    let inserted = pricing
        .upsert(fx.from_city_id, fx.to_city_id, fx.vehicle_id, money("1500"))
        .await
        .unwrap();
    assert!(inserted);

    let inserted = pricing
        .upsert(fx.from_city_id, fx.to_city_id, fx.vehicle_id, money("1750.50"))
        .await
        .unwrap();
    assert!(!inserted);

    let price = pricing
        .find_price(fx.from_city_id, fx.to_city_id, fx.vehicle_id)
        .await
        .unwrap();
    assert_eq!(price, Some(money("1750.50")));

    // La ruta inversa es otra tarifa
    let inserted = pricing
        .upsert(fx.to_city_id, fx.from_city_id, fx.vehicle_id, money("1500"))
        .await
        .unwrap();
    assert!(inserted);
}
