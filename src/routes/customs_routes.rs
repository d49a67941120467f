use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::customs_controller::CustomsController;
use crate::dto::api_response::ApiResponse;
use crate::dto::customs_dto::{
    BillClearanceRequest, OpenClearanceRequest, RejectClearanceRequest, ResubmitDocumentRequest,
    ReviewDocumentRequest, UploadDocumentRequest,
};
use crate::middleware::auth::{require_roles, AuthenticatedUser, ADMIN_ONLY, CUSTOMS};
use crate::models::customs::{ClearanceDetail, CustomsClearance, CustomsClearanceInvoice, CustomsDocument};
use crate::routes::OptionalJson;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Despachos de aduana. La revisión de documentos y el rechazo de un
/// despacho quedan reservados al administrador.
pub fn create_customs_router(state: &AppState) -> Router<AppState> {
    let admin_only = Router::new()
        .route("/documents/:id/review", post(review_document))
        .route("/clearances/:id/reject", post(reject_clearance))
        .route_layer(middleware::from_fn_with_state((state.clone(), ADMIN_ONLY), require_roles));

    Router::new()
        .route("/clearances", get(list_clearances).post(open_clearance))
        .route("/clearances/:id", get(get_clearance))
        .route("/clearances/:id/documents", post(upload_document))
        .route("/clearances/:id/complete", post(complete_clearance))
        .route("/clearances/:id/invoice", post(bill_clearance))
        .route("/documents/:id/resubmit", post(resubmit_document))
        .route_layer(middleware::from_fn_with_state((state.clone(), CUSTOMS), require_roles))
        .merge(admin_only)
}

async fn open_clearance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<OpenClearanceRequest>,
) -> Result<Json<ApiResponse<CustomsClearance>>, AppError> {
    let controller = CustomsController::new(&state);
    Ok(Json(controller.open(&user, request).await?))
}

async fn list_clearances(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<CustomsClearance>>>, AppError> {
    let controller = CustomsController::new(&state);
    Ok(Json(ApiResponse::success(controller.list(&user).await?)))
}

async fn get_clearance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ClearanceDetail>>, AppError> {
    let controller = CustomsController::new(&state);
    Ok(Json(ApiResponse::success(controller.get(&user, id).await?)))
}

async fn upload_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UploadDocumentRequest>,
) -> Result<Json<ApiResponse<CustomsDocument>>, AppError> {
    let controller = CustomsController::new(&state);
    Ok(Json(controller.upload_document(&user, id, request).await?))
}

async fn review_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewDocumentRequest>,
) -> Result<Json<ApiResponse<CustomsDocument>>, AppError> {
    let controller = CustomsController::new(&state);
    Ok(Json(controller.review_document(user.user_id, id, request).await?))
}

async fn resubmit_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResubmitDocumentRequest>,
) -> Result<Json<ApiResponse<CustomsDocument>>, AppError> {
    let controller = CustomsController::new(&state);
    Ok(Json(controller.resubmit_document(&user, id, request).await?))
}

async fn complete_clearance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CustomsClearance>>, AppError> {
    let controller = CustomsController::new(&state);
    Ok(Json(controller.complete(&user, id).await?))
}

async fn reject_clearance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<RejectClearanceRequest>,
) -> Result<Json<ApiResponse<CustomsClearance>>, AppError> {
    let controller = CustomsController::new(&state);
    Ok(Json(controller.reject(id, request).await?))
}

async fn bill_clearance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<BillClearanceRequest>,
) -> Result<Json<ApiResponse<CustomsClearanceInvoice>>, AppError> {
    let controller = CustomsController::new(&state);
    Ok(Json(controller.bill(&user, id, request).await?))
}
