// ============================================================================
// ROUTES : BACK-OFFICE ADMIN (/api/admin)
// ============================================================================
//
// Réservé au rôle ADMIN (sauf /auth/login): tableau de bord, comptes
// utilisateurs, catalogue d'ingénieurs et données de référence.
//
// ============================================================================

use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::admin::{
    AdminUserListQuery, CreateUserRequest, MasterDataQuery, ProjectTypeRequest, SkillRequest, SubSkillRequest,
    UpdateUserRequest,
};
use crate::models::dto::auth::LoginRequest;
use crate::models::dto::common::MessageResponse;
use crate::models::dto::document::UploadUrlRequest;
use crate::models::dto::engineer::{AdminEngineerListQuery, EngineerRequest};
use crate::services::admin_engineer_service::AdminEngineerService;
use crate::services::admin_master_data_service::AdminMasterDataService;
use crate::services::admin_user_service::AdminUserService;
use crate::services::auth_service::{AuthService, Portal};
use crate::services::dashboard_service::DashboardService;
use crate::services::email_service::EmailSender;
use crate::services::engineer_service::EngineerService;
use crate::services::s3_service::S3Service;

/// POST /admin/auth/login (PUBLIC)
#[post("/auth/login")]
pub async fn admin_login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let response = AuthService::login(db.get_ref(), config.get_ref(), Portal::Admin, &body).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/dashboard/summary")]
pub async fn dashboard_summary(
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let summary = DashboardService::admin_summary(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

// ---- Utilisateurs ----

#[get("/users")]
pub async fn list_users(
    user: AuthUser,
    query: web::Query<AdminUserListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let response = AdminUserService::list(db.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/users/{id}")]
pub async fn get_user(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let response = AdminUserService::get(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/users")]
pub async fn create_user(
    user: AuthUser,
    body: web::Json<CreateUserRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<dyn EmailSender>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let response =
        AdminUserService::create(db.get_ref(), config.get_ref(), mailer.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[put("/users/{id}")]
pub async fn update_user(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<UpdateUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let response = AdminUserService::update(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /admin/users/{id} - désactivation (soft delete)
#[delete("/users/{id}")]
pub async fn delete_user(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    AdminUserService::delete(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("User deleted successfully")))
}

// ---- Ingénieurs ----

#[get("/engineers")]
pub async fn list_engineers(
    user: AuthUser,
    query: web::Query<AdminEngineerListQuery>,
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let response = AdminEngineerService::list(db.get_ref(), s3.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/engineers/upload-image")]
pub async fn engineer_image_url(
    user: AuthUser,
    body: web::Json<UploadUrlRequest>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let response = AdminEngineerService::image_upload_url(s3.get_ref(), &body)?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/engineers/{id}")]
pub async fn get_engineer(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let detail = EngineerService::get_detail(db.get_ref(), s3.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[post("/engineers")]
pub async fn create_engineer(
    user: AuthUser,
    body: web::Json<EngineerRequest>,
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let profile = AdminEngineerService::create(db.get_ref(), s3.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

#[put("/engineers/{id}")]
pub async fn update_engineer(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<EngineerRequest>,
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let profile =
        AdminEngineerService::update(db.get_ref(), s3.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[delete("/engineers/{id}")]
pub async fn delete_engineer(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    AdminEngineerService::delete(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("Engineer deleted successfully")))
}

// ---- Données de référence: compétences ----

#[get("/master-data/skills")]
pub async fn list_skills(
    user: AuthUser,
    query: web::Query<MasterDataQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let response = AdminMasterDataService::list_skills(db.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/master-data/skills/{id}/sub-skills")]
pub async fn list_sub_skills(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let response = AdminMasterDataService::list_sub_skills(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/master-data/skills")]
pub async fn create_skill(
    user: AuthUser,
    body: web::Json<SkillRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let skill = AdminMasterDataService::create_skill(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(skill))
}

#[post("/master-data/skills/{id}/sub-skills")]
pub async fn create_sub_skill(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<SubSkillRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let skill = AdminMasterDataService::create_sub_skill(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(skill))
}

#[put("/master-data/skills/sub-skills/{id}")]
pub async fn update_sub_skill(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<SubSkillRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let skill = AdminMasterDataService::update_sub_skill(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(skill))
}

#[put("/master-data/skills/{id}")]
pub async fn update_skill(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<SkillRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let skill = AdminMasterDataService::update_skill(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(skill))
}

#[delete("/master-data/skills/sub-skills/{id}")]
pub async fn delete_sub_skill(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    AdminMasterDataService::delete_sub_skill(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("Sub-skill deleted successfully")))
}

#[delete("/master-data/skills/{id}")]
pub async fn delete_skill(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    AdminMasterDataService::delete_skill(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("Skill deleted successfully")))
}

// ---- Données de référence: types de projet ----

#[get("/master-data/project-types")]
pub async fn list_project_types(
    user: AuthUser,
    query: web::Query<MasterDataQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let response = AdminMasterDataService::list_project_types(db.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/master-data/project-types")]
pub async fn create_project_type(
    user: AuthUser,
    body: web::Json<ProjectTypeRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let project_type = AdminMasterDataService::create_project_type(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(project_type))
}

#[put("/master-data/project-types/{id}")]
pub async fn update_project_type(
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<ProjectTypeRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    let project_type =
        AdminMasterDataService::update_project_type(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project_type))
}

#[delete("/master-data/project-types/{id}")]
pub async fn delete_project_type(
    user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    user.require_admin()?;
    AdminMasterDataService::delete_project_type(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("Project type deleted successfully")))
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(admin_login)
            .service(dashboard_summary)
            .service(list_users)
            .service(get_user)
            .service(create_user)
            .service(update_user)
            .service(delete_user)
            .service(list_engineers)
            .service(engineer_image_url)
            .service(get_engineer)
            .service(create_engineer)
            .service(update_engineer)
            .service(delete_engineer)
            .service(list_skills)
            .service(list_sub_skills)
            .service(create_skill)
            .service(create_sub_skill)
            .service(update_sub_skill)
            .service(update_skill)
            .service(delete_sub_skill)
            .service(delete_skill)
            .service(list_project_types)
            .service(create_project_type)
            .service(update_project_type)
            .service(delete_project_type)
    );
}
