use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::BusinessPolicy;
use crate::dto::api_response::ApiResponse;
use crate::dto::customs_dto::{
    BillClearanceRequest, OpenClearanceRequest, RejectClearanceRequest, ResubmitDocumentRequest,
    ReviewDocumentRequest, UploadDocumentRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::customs::{
    ClearanceDetail, ClearanceStatus, CustomsClearance, CustomsClearanceInvoice, CustomsDocument, DocumentStatus,
};
use crate::models::trip::TripStatus;
use crate::models::user::Role;
use crate::repositories::customs_repository::{CustomsRepository, NewClearance, NewClearanceInvoice};
use crate::repositories::trip_repository::TripRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::billing::ClearanceAmounts;
use crate::services::mailer::{notify_after_commit, Mailer, Notification};
use crate::services::numbering::{document_number, CLEARANCE_PREFIX, CUSTOMS_INVOICE_PREFIX};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError};

pub struct CustomsController {
    repository: CustomsRepository,
    trips: TripRepository,
    users: UserRepository,
    policy: BusinessPolicy,
    mailer: Arc<dyn Mailer>,
}

impl CustomsController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: CustomsRepository::new(state.pool.clone()),
            trips: TripRepository::new(state.pool.clone()),
            users: UserRepository::new(state.pool.clone()),
            policy: state.config.policy.clone(),
            mailer: state.mailer.clone(),
        }
    }

    /// Abre el despacho de un viaje. Un agente sólo puede hacerlo sobre
    /// viajes que tiene asignados.
    pub async fn open(
        &self,
        user: &AuthenticatedUser,
        request: OpenClearanceRequest,
    ) -> Result<ApiResponse<CustomsClearance>, AppError> {
        request.validate()?;

        let trip = self
            .trips
            .find_by_id(request.trip_id)
            .await?
            .filter(|trip| user.is_admin() || trip.customs_broker_id == Some(user.user_id))
            .ok_or_else(|| not_found_error("Trip", &request.trip_id.to_string()))?;
        if trip.status == TripStatus::Cancelled {
            return Err(AppError::BadRequest("Cannot open a clearance for a cancelled trip".to_string()));
        }

        let broker_id = if user.is_admin() {
            let broker_id = request
                .customs_broker_id
                .or(trip.customs_broker_id)
                .ok_or_else(|| AppError::BadRequest("customs_broker_id is required".to_string()))?;
            match self.users.find_by_id(broker_id).await? {
                Some(broker) if broker.role == Role::CustomsBroker && broker.is_active => broker.id,
                _ => {
                    return Err(AppError::BadRequest(
                        "customs_broker_id must reference an active CUSTOMS_BROKER".to_string(),
                    ))
                }
            }
        } else {
            user.user_id
        };

        let clearance = self
            .repository
            .create_clearance(NewClearance {
                trip_id: trip.id,
                customs_broker_id: broker_id,
                clearance_number: document_number(CLEARANCE_PREFIX, Utc::now()),
                customs_fees: request.customs_fees.unwrap_or(Decimal::ZERO),
                notes: request.notes,
            })
            .await?;

        info!("🛃 Despacho {} abierto para el viaje {}", clearance.clearance_number, trip.trip_number);
        Ok(ApiResponse::success_with_message(clearance, "Clearance opened"))
    }

    pub async fn list(&self, user: &AuthenticatedUser) -> Result<Vec<CustomsClearance>, AppError> {
        let broker = (!user.is_admin()).then_some(user.user_id);
        self.repository.list_clearances(broker).await
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ClearanceDetail, AppError> {
        let clearance = self.visible_clearance(user, id).await?;
        let documents = self.repository.documents(clearance.id).await?;
        let invoice = self.repository.clearance_invoice(clearance.id).await?;
        Ok(ClearanceDetail {
            clearance,
            documents,
            invoice,
        })
    }

    pub async fn upload_document(
        &self,
        user: &AuthenticatedUser,
        clearance_id: Uuid,
        request: UploadDocumentRequest,
    ) -> Result<ApiResponse<CustomsDocument>, AppError> {
        request.validate()?;
        let clearance = self.visible_clearance(user, clearance_id).await?;
        if !clearance.status.is_open() {
            return Err(closed(&clearance));
        }

        let document = self.repository.add_document(clearance.id, request).await?;
        info!("📄 Documento {} añadido a {}", document.document_type, clearance.clearance_number);
        Ok(ApiResponse::success_with_message(document, "Document uploaded"))
    }

    /// Revisión administrativa; se avisa al agente del resultado
    pub async fn review_document(
        &self,
        reviewer_id: Uuid,
        id: Uuid,
        request: ReviewDocumentRequest,
    ) -> Result<ApiResponse<CustomsDocument>, AppError> {
        request.validate()?;
        if !request.status.is_review_outcome() {
            return Err(AppError::BadRequest(
                "Review status must be UNDER_REVIEW, APPROVED or REJECTED".to_string(),
            ));
        }

        let document = self
            .repository
            .find_document(id)
            .await?
            .ok_or_else(|| not_found_error("Document", &id.to_string()))?;
        if !document.status.can_transition_to(request.status) {
            return Err(AppError::InvalidTransition(format!(
                "Document cannot move from {:?} to {:?}",
                document.status, request.status
            )));
        }

        let reviewed = self
            .repository
            .review_document(id, document.status, request.status, request.notes, reviewer_id)
            .await?
            .ok_or_else(|| AppError::InvalidTransition("Document changed concurrently, please retry".to_string()))?;

        if matches!(reviewed.status, DocumentStatus::Approved | DocumentStatus::Rejected) {
            notify_after_commit(self.mailer.as_ref(), self.broker_notification(&reviewed)).await;
        }

        info!("🔎 Documento {} revisado: {:?}", reviewed.id, reviewed.status);
        Ok(ApiResponse::success_with_message(reviewed, "Document reviewed"))
    }

    async fn broker_notification(&self, document: &CustomsDocument) -> Result<Option<Notification>, AppError> {
        let Some(clearance) = self.repository.find_clearance(document.clearance_id).await? else {
            return Ok(None);
        };
        let broker = self.users.find_by_id(clearance.customs_broker_id).await?;
        let status = if document.status == DocumentStatus::Approved { "APPROVED" } else { "REJECTED" };
        Ok(broker.map(|broker| {
            Notification::document_reviewed(
                &broker.email,
                &document.document_type,
                status,
                document.review_notes.as_deref(),
            )
        }))
    }

    /// REJECTED -> PENDING con un archivo nuevo
    pub async fn resubmit_document(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: ResubmitDocumentRequest,
    ) -> Result<ApiResponse<CustomsDocument>, AppError> {
        request.validate()?;
        let document = self
            .repository
            .find_document(id)
            .await?
            .ok_or_else(|| not_found_error("Document", &id.to_string()))?;
        self.visible_clearance(user, document.clearance_id).await?;

        if document.status != DocumentStatus::Rejected {
            return Err(AppError::InvalidTransition(
                "Only rejected documents can be resubmitted".to_string(),
            ));
        }

        let resubmitted = self
            .repository
            .resubmit_document(id, request.file_url.trim())
            .await?
            .ok_or_else(|| AppError::InvalidTransition("Document changed concurrently, please retry".to_string()))?;
        Ok(ApiResponse::success_with_message(resubmitted, "Document resubmitted"))
    }

    pub async fn complete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ApiResponse<CustomsClearance>, AppError> {
        self.visible_clearance(user, id).await?;

        let (clearance, invoice) = self
            .repository
            .complete_clearance(id, self.policy.tax_rate)
            .await?
            .ok_or_else(|| not_found_error("Clearance", &id.to_string()))?;

        match invoice {
            Some(invoice) => info!(
                "✅ Despacho {} completado; factura {} actualizada a {} SAR",
                clearance.clearance_number, invoice.invoice_number, invoice.total_amount
            ),
            None => info!("✅ Despacho {} completado", clearance.clearance_number),
        }
        Ok(ApiResponse::success_with_message(clearance, "Clearance completed"))
    }

    pub async fn reject(&self, id: Uuid, request: RejectClearanceRequest) -> Result<ApiResponse<CustomsClearance>, AppError> {
        request.validate()?;
        let current = self
            .repository
            .find_clearance(id)
            .await?
            .ok_or_else(|| not_found_error("Clearance", &id.to_string()))?;

        let clearance = self
            .repository
            .reject_clearance(id, request.notes)
            .await?
            .ok_or_else(|| closed(&current))?;
        warn!("⛔ Despacho {} rechazado", clearance.clearance_number);
        Ok(ApiResponse::success_with_message(clearance, "Clearance rejected"))
    }

    pub async fn bill(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: BillClearanceRequest,
    ) -> Result<ApiResponse<CustomsClearanceInvoice>, AppError> {
        request.validate()?;
        let clearance = self.visible_clearance(user, id).await?;
        if clearance.status == ClearanceStatus::Rejected {
            return Err(closed(&clearance));
        }

        let now = Utc::now();
        let due_days = request.due_days.unwrap_or(self.policy.invoice_due_days);
        let invoice = self
            .repository
            .bill_clearance(
                &clearance,
                NewClearanceInvoice {
                    invoice_number: document_number(CUSTOMS_INVOICE_PREFIX, now),
                    amounts: ClearanceAmounts::compute(request.customs_duties, request.broker_fees, self.policy.tax_rate),
                    due_date: (now + Duration::days(due_days)).date_naive(),
                },
                self.policy.tax_rate,
            )
            .await?;

        info!(
            "🧾 Factura de aduanas {} para {}: {} SAR",
            invoice.invoice_number, clearance.clearance_number, invoice.total_amount
        );
        Ok(ApiResponse::success_with_message(invoice, "Clearance billed"))
    }

    /// Admin ve cualquier despacho; un agente sólo los suyos
    async fn visible_clearance(&self, user: &AuthenticatedUser, id: Uuid) -> Result<CustomsClearance, AppError> {
        self.repository
            .find_clearance(id)
            .await?
            .filter(|clearance| user.is_admin() || clearance.customs_broker_id == user.user_id)
            .ok_or_else(|| not_found_error("Clearance", &id.to_string()))
    }
}

fn closed(clearance: &CustomsClearance) -> AppError {
    AppError::InvalidTransition(format!(
        "Clearance {} is {:?} and cannot be changed",
        clearance.clearance_number, clearance.status
    ))
}
