use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::dashboard_controller::DashboardController;
use crate::controllers::invoice_controller::InvoiceController;
use crate::controllers::trip_controller::TripController;
use crate::dto::api_response::ApiResponse;
use crate::dto::dashboard_dto::CustomerDashboard;
use crate::dto::invoice_dto::InvoiceListQuery;
use crate::dto::trip_dto::{CancelTripRequest, CancelTripResponse, CreateTripRequest, TripListQuery};
use crate::middleware::auth::{require_roles, AuthenticatedUser, CUSTOMER_ONLY};
use crate::models::invoice::{Invoice, Payment};
use crate::models::trip::{Trip, TripView};
use crate::repositories::trip_repository::TripFilter;
use crate::routes::{html_attachment, OptionalJson};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_customer_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips).post(book_trip))
        .route("/trips/:id", get(get_trip))
        .route("/trips/:id/cancel", post(cancel_trip))
        .route("/invoices", get(list_invoices))
        .route("/invoices/:id", get(get_invoice))
        .route("/invoices/:id/payments", get(list_payments))
        .route("/invoices/:id/document", get(invoice_document))
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state((state.clone(), CUSTOMER_ONLY), require_roles))
}

async fn book_trip(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateTripRequest>,
) -> Result<Json<ApiResponse<Trip>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(controller.book(user.user_id, request).await?))
}

async fn list_trips(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<TripListQuery>,
) -> Result<Json<ApiResponse<Vec<TripView>>>, AppError> {
    let controller = TripController::new(&state);
    let filter = TripFilter {
        status: query.status,
        customer_id: Some(user.user_id),
        ..Default::default()
    };
    Ok(Json(ApiResponse::success(controller.list(filter).await?)))
}

async fn get_trip(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripView>>, AppError> {
    let controller = TripController::new(&state);
    Ok(Json(ApiResponse::success(controller.get(&user, id).await?)))
}

async fn cancel_trip(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<CancelTripRequest>,
) -> Result<Json<ApiResponse<CancelTripResponse>>, AppError> {
    let controller = TripController::new(&state);
    let response = controller.cancel_by_customer(user.user_id, id, request).await?;
    let message = if response.free_cancellation {
        "Trip cancelled free of charge".to_string()
    } else {
        format!("Trip cancelled with a fee of {} SAR", response.cancellation_fee)
    };
    Ok(Json(ApiResponse::success_with_message(response, message)))
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

async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(ApiResponse::success(controller.payments(&user, id).await?)))
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

async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<CustomerDashboard>>, AppError> {
    let controller = DashboardController::new(state.pool.clone());
    Ok(Json(ApiResponse::success(controller.customer(user.user_id).await?)))
}
