// ============================================================================
// ROUTES : PORTAIL CLIENT (/api/client)
// ============================================================================
//
// Toutes les routes exigent un JWT d'un compte CLIENT / CLIENT_USER.
// Un client ne voit que ses propres contacts, propositions et contrats.
//
// ============================================================================

use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::contact::{CancelConsultationRequest, ContactListQuery, CreateContactRequest, MessageRequest};
use crate::models::dto::contract::ContractListQuery;
use crate::models::dto::document::PresignedUrlQuery;
use crate::models::dto::proposal::ClientProposalListQuery;
use crate::services::contact_detail_service::ContactDetailService;
use crate::services::contact_service::ContactService;
use crate::services::contract_service::ContractService;
use crate::services::dashboard_service::DashboardService;
use crate::services::document_service::DocumentService;
use crate::services::proposal_list_service::ProposalListService;
use crate::services::s3_service::S3Service;

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

// ---- Contacts ----

#[get("/contacts")]
pub async fn list_contacts(
    user: AuthUser,
    query: web::Query<ContactListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let response = ContactService::list_client_contacts(db.get_ref(), user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/contacts")]
pub async fn create_contact(
    user: AuthUser,
    body: web::Json<CreateContactRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let response = ContactService::create_client_contact(db.get_ref(), user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[get("/contacts/{id}")]
pub async fn contact_detail(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let detail = ContactDetailService::get_detail(db.get_ref(), user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[post("/contacts/{id}/logs")]
pub async fn add_log(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<MessageRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let log = ContactDetailService::add_communication_log(db.get_ref(), user.user_id, path.into_inner(), &body.message)
        .await?;
    Ok(HttpResponse::Created().json(log))
}

#[post("/contacts/{id}/proposal/comments")]
pub async fn add_proposal_comment(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<MessageRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let response =
        ContactDetailService::add_proposal_comment(db.get_ref(), user.user_id, path.into_inner(), &body.message).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/contacts/{id}/proposal/approve")]
pub async fn approve_proposal(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let response = ContactDetailService::approve_proposal(db.get_ref(), user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/contacts/{id}/cancel")]
pub async fn cancel_consultation(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<CancelConsultationRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let response =
        ContactDetailService::cancel_consultation(db.get_ref(), user.user_id, path.into_inner(), &body.reason).await?;
    Ok(HttpResponse::Ok().json(response))
}

// ---- Propositions / contrats ----

#[get("/proposals")]
pub async fn list_proposals(
    user: AuthUser,
    query: web::Query<ClientProposalListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let response = ProposalListService::list_for_client(db.get_ref(), user.user_id, &query).await;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/contracts")]
pub async fn list_contracts(
    user: AuthUser,
    query: web::Query<ContractListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let response = ContractService::list_for_client(db.get_ref(), user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /client/contracts/{ref} - ref = MSA-2025-001 ou SOW-2025-004
#[get("/contracts/{contract_ref}")]
pub async fn contract_detail(
    user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let detail = ContractService::get_for_client(db.get_ref(), user.user_id, &path).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// POST /client/contracts/{ref}/approve
#[post("/contracts/{contract_ref}/approve")]
pub async fn approve_contract(
    user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let response = ContractService::approve_for_client(db.get_ref(), user.user_id, &path).await?;
    Ok(HttpResponse::Ok().json(response))
}

// ---- Tableau de bord ----

#[get("/dashboard/summary")]
pub async fn dashboard_summary(
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let summary = DashboardService::client_summary(db.get_ref(), user.user_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/dashboard/activities")]
pub async fn dashboard_activities(
    user: AuthUser,
    query: web::Query<LimitQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let response = DashboardService::recent_activities(db.get_ref(), user.user_id, query.limit).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/dashboard/alerts")]
pub async fn dashboard_alerts(
    user: AuthUser,
    query: web::Query<LimitQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_client()?;
    let response = DashboardService::alerts(db.get_ref(), user.user_id, query.limit).await?;
    Ok(HttpResponse::Ok().json(response))
}

// ---- Documents ----

#[get("/documents/presigned-url")]
pub async fn document_url(
    user: AuthUser,
    query: web::Query<PresignedUrlQuery>,
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    let response = DocumentService::client_download_url(db.get_ref(), s3.get_ref(), &user, &query.s3_key).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn client_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/client")
            .service(list_contacts)
            .service(create_contact)
            .service(contact_detail)
            .service(add_log)
            .service(add_proposal_comment)
            .service(approve_proposal)
            .service(cancel_consultation)
            .service(list_proposals)
            .service(list_contracts)
            .service(contract_detail)
            .service(approve_contract)
            .service(dashboard_summary)
            .service(dashboard_activities)
            .service(dashboard_alerts)
            .service(document_url)
    );
}
