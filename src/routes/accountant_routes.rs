use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::invoice_controller::InvoiceController;
use crate::dto::api_response::ApiResponse;
use crate::dto::invoice_dto::{
    GenerateInvoiceRequest, InstallmentPlanRequest, InvoiceListQuery, PaymentRecordedResponse, RecordPaymentRequest,
};
use crate::middleware::auth::{require_roles, AuthenticatedUser, ACCOUNTING};
use crate::models::invoice::{Invoice, Payment, ReceivablesSummary};
use crate::routes::{csv_attachment, html_attachment};
use crate::services::scheduler::SweepReport;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Facturación y cobros; accesible a ADMIN y ACCOUNTANT
pub fn create_accountant_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(generate_invoice))
        .route("/invoices/export", get(export_invoices))
        .route("/invoices/mark-overdue", post(mark_overdue))
        .route("/invoices/:id", get(get_invoice))
        .route("/invoices/:id/send", post(send_invoice))
        .route("/invoices/:id/payments", get(list_payments).post(record_payment))
        .route("/invoices/:id/installments", post(set_installments))
        .route("/invoices/:id/cancel", post(cancel_invoice))
        .route("/invoices/:id/document", get(invoice_document))
        .route("/summary", get(summary))
        .route_layer(middleware::from_fn_with_state((state.clone(), ACCOUNTING), require_roles))
}

async fn generate_invoice(
    State(state): State<AppState>,
    Json(request): Json<GenerateInvoiceRequest>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(controller.generate(request).await?))
}

async fn list_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<ApiResponse<Vec<Invoice>>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(ApiResponse::success(controller.list(&user, query.status).await?)))
}

async fn get_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(ApiResponse::success(controller.get(&user, id).await?)))
}

async fn send_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(controller.send(id).await?))
}

async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(ApiResponse::success(controller.payments(&user, id).await?)))
}

async fn record_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<ApiResponse<PaymentRecordedResponse>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(controller.record_payment(user.user_id, id, request).await?))
}

async fn set_installments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<InstallmentPlanRequest>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(controller.set_installments(id, request).await?))
}

async fn cancel_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(controller.cancel(id).await?))
}

async fn invoice_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let controller = InvoiceController::new(&state);
    let document = controller.document(&user, id).await?;
    Ok(html_attachment(&document.file_name, document.html))
}

async fn export_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Response, AppError> {
    let controller = InvoiceController::new(&state);
    let content = controller.export(query.status).await?;
    Ok(csv_attachment("invoices.csv", content))
}

async fn mark_overdue(State(state): State<AppState>) -> Result<Json<ApiResponse<SweepReport>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(ApiResponse::success(controller.sweep().await?)))
}

async fn summary(State(state): State<AppState>) -> Result<Json<ApiResponse<ReceivablesSummary>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(ApiResponse::success(controller.summary().await?)))
}
