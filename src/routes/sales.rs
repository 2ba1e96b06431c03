// ============================================================================
// ROUTES : BACK-OFFICE SALES (/api/sales)
// ============================================================================
//
// Réservé aux rôles SALES_MANAGER et SALES_REP (sauf /auth/login).
// Les restrictions propres aux SALES_REP (contacts assignés, opportunités
// créées ou assignées) sont appliquées dans les services.
//
// ============================================================================

use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::auth::LoginRequest;
use crate::models::dto::common::MessageResponse;
use crate::models::dto::contact::{MessageRequest, SalesContactListQuery, UpdateSalesContactRequest};
use crate::models::dto::contract::{ContractListQuery, ContractReviewRequest, MsaContractRequest, SowContractRequest};
use crate::models::dto::document::{PresignedUrlQuery, UploadUrlRequest};
use crate::models::dto::opportunity::{OpportunityListQuery, UpdateOpportunityRequest};
use crate::models::dto::proposal::{
    AssignReviewerRequest, CreateProposalRequest, SubmitReviewRequest, UpdateProposalRequest,
};
use crate::services::auth_service::{AuthService, Portal};
use crate::services::contract_service::ContractService;
use crate::services::dashboard_service::DashboardService;
use crate::services::document_service::DocumentService;
use crate::services::opportunity_service::OpportunityService;
use crate::services::s3_service::S3Service;
use crate::services::sales_contact_service::SalesContactService;
use crate::services::sales_contract_service::SalesContractService;
use crate::services::sales_proposal_service::SalesProposalService;

/// POST /sales/auth/login (PUBLIC)
#[post("/auth/login")]
pub async fn sales_login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let response = AuthService::login(db.get_ref(), config.get_ref(), Portal::Sales, &body).await?;
    Ok(HttpResponse::Ok().json(response))
}

// ---- Contacts ----

#[get("/contacts")]
pub async fn list_contacts(
    user: AuthUser,
    query: web::Query<SalesContactListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let response = SalesContactService::list(db.get_ref(), &user, &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/contacts/{id}")]
pub async fn contact_detail(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let detail = SalesContactService::get_detail(db.get_ref(), &user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[put("/contacts/{id}")]
pub async fn update_contact(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<UpdateSalesContactRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let detail = SalesContactService::update(db.get_ref(), &user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[post("/contacts/{id}/logs")]
pub async fn add_contact_log(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<MessageRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let log = SalesContactService::add_communication_log(db.get_ref(), &user, path.into_inner(), &body.message).await?;
    Ok(HttpResponse::Created().json(log))
}

/// POST /sales/contacts/{id}/opportunity - Convertit le contact en opportunité
#[post("/contacts/{id}/opportunity")]
pub async fn create_opportunity(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let detail = OpportunityService::create_from_contact(db.get_ref(), &user, path.into_inner()).await?;
    Ok(HttpResponse::Created().json(detail))
}

// ---- Opportunités ----

#[get("/opportunities")]
pub async fn list_opportunities(
    user: AuthUser,
    query: web::Query<OpportunityListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let response = OpportunityService::list(db.get_ref(), &user, &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /sales/opportunities/{id} - id numérique ou code OP-YYYY-NN
#[get("/opportunities/{id}")]
pub async fn opportunity_detail(
    user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let detail = OpportunityService::get(db.get_ref(), &user, &path).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[put("/opportunities/{id}")]
pub async fn update_opportunity(
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateOpportunityRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let detail = OpportunityService::update(db.get_ref(), &user, &path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[post("/opportunities/{id}/lost")]
pub async fn mark_lost(
    user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let detail = OpportunityService::mark_lost(db.get_ref(), &user, &path).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[post("/opportunities/{id}/convert-to-contract")]
pub async fn convert_to_contract(
    user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let response = OpportunityService::convert_to_contract(db.get_ref(), &user, &path).await?;
    Ok(HttpResponse::Ok().json(response))
}

// ---- Propositions ----

#[post("/opportunities/{id}/proposals")]
pub async fn create_proposal(
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<CreateProposalRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let proposal = SalesProposalService::create(db.get_ref(), &user, &path, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(proposal))
}

#[put("/proposals/{id}")]
pub async fn update_proposal(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<UpdateProposalRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let proposal = SalesProposalService::update(db.get_ref(), &user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(proposal))
}

#[post("/proposals/{id}/reviewer")]
pub async fn assign_reviewer(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<AssignReviewerRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let proposal =
        SalesProposalService::assign_reviewer(db.get_ref(), &user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(proposal))
}

#[post("/proposals/{id}/review")]
pub async fn submit_review(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<SubmitReviewRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let proposal = SalesProposalService::submit_review(db.get_ref(), &user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(proposal))
}

// ---- Contrats ----

#[get("/contracts")]
pub async fn list_contracts(
    user: AuthUser,
    query: web::Query<ContractListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let response = ContractService::list_for_sales(db.get_ref(), &user, &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/contracts/msa")]
pub async fn create_msa(
    user: AuthUser,
    body: web::Json<MsaContractRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let response = SalesContractService::create_msa(db.get_ref(), &user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[get("/contracts/msa/{id}")]
pub async fn msa_detail(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let detail = SalesContractService::get_msa(db.get_ref(), &user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[put("/contracts/msa/{id}")]
pub async fn update_msa(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<MsaContractRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let response = SalesContractService::update_msa(db.get_ref(), &user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /sales/contracts/msa/{id}/review - SALES_MANAGER uniquement
#[post("/contracts/msa/{id}/review")]
pub async fn review_msa(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<ContractReviewRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let response = SalesContractService::review_msa(db.get_ref(), &user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/contracts/sow")]
pub async fn create_sow(
    user: AuthUser,
    body: web::Json<SowContractRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let response = SalesContractService::create_sow(db.get_ref(), &user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[get("/contracts/sow/{id}")]
pub async fn sow_detail(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let detail = SalesContractService::get_sow(db.get_ref(), &user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[put("/contracts/sow/{id}")]
pub async fn update_sow(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<SowContractRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let response = SalesContractService::update_sow(db.get_ref(), &user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/contracts/sow/{id}/review")]
pub async fn review_sow(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<ContractReviewRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let response = SalesContractService::review_sow(db.get_ref(), &user, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

// ---- Tableau de bord ----

#[get("/dashboard/summary")]
pub async fn dashboard_summary(
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let summary = DashboardService::sales_summary(db.get_ref(), &user).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// GET /sales/dashboard/approvals - en attente d'une réponse du client
#[get("/dashboard/approvals")]
pub async fn dashboard_approvals(
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let response = DashboardService::sales_approvals(db.get_ref(), &user).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/dashboard/activities")]
pub async fn dashboard_activities(
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    let response = DashboardService::sales_activities(db.get_ref(), &user).await?;
    Ok(HttpResponse::Ok().json(response))
}

// ---- Documents ----

#[post("/documents/upload-url")]
pub async fn document_upload_url(
    user: AuthUser,
    body: web::Json<UploadUrlRequest>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    let response = DocumentService::sales_upload_url(s3.get_ref(), &user, &body)?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/documents/presigned-url")]
pub async fn document_url(
    user: AuthUser,
    query: web::Query<PresignedUrlQuery>,
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    let response = DocumentService::sales_download_url(db.get_ref(), s3.get_ref(), &user, &query.s3_key).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /sales/documents?s3Key=... (la clé contient des '/')
#[delete("/documents")]
pub async fn delete_document(
    user: AuthUser,
    query: web::Query<PresignedUrlQuery>,
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    user.require_sales()?;
    DocumentService::sales_delete(db.get_ref(), s3.get_ref(), &user, &query.s3_key).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("Document deleted")))
}

pub fn sales_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sales")
            .service(sales_login)
            .service(list_contacts)
            .service(contact_detail)
            .service(update_contact)
            .service(add_contact_log)
            .service(create_opportunity)
            .service(list_opportunities)
            .service(opportunity_detail)
            .service(update_opportunity)
            .service(mark_lost)
            .service(convert_to_contract)
            .service(create_proposal)
            .service(update_proposal)
            .service(assign_reviewer)
            .service(submit_review)
            .service(list_contracts)
            .service(create_msa)
            .service(msa_detail)
            .service(update_msa)
            .service(review_msa)
            .service(create_sow)
            .service(sow_detail)
            .service(update_sow)
            .service(review_sow)
            .service(dashboard_summary)
            .service(dashboard_approvals)
            .service(dashboard_activities)
            .service(document_upload_url)
            .service(document_url)
            .service(delete_document)
    );
}
