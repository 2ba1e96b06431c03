// Routes publiques: page d'accueil, catalogue d'ingénieurs, formulaire de contact

use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::dto::contact::ContactFormRequest;
use crate::models::dto::engineer::EngineerSearchQuery;
use crate::services::contact_service::ContactService;
use crate::services::email_service::EmailSender;
use crate::services::engineer_service::{EngineerService, FilterKind};
use crate::services::s3_service::S3Service;

#[get("/homepage/statistics")]
pub async fn homepage_statistics(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let stats = EngineerService::homepage_statistics(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/homepage/engineers")]
pub async fn featured_engineers(
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    let engineers = EngineerService::featured(db.get_ref(), s3.get_ref()).await?;
    Ok(HttpResponse::Ok().json(engineers))
}

#[get("/homepage/engineers/{category}")]
pub async fn engineers_by_category(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    let engineers = EngineerService::by_category(db.get_ref(), s3.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(engineers))
}

/// GET /public/engineers/search - doit rester avant /engineers/{id}
#[get("/engineers/search")]
pub async fn search_engineers(
    query: web::Query<EngineerSearchQuery>,
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    let response = EngineerService::search(db.get_ref(), s3.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/engineers/filters/{kind}")]
pub async fn filter_values(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let kind = FilterKind::parse(&path)
        .ok_or_else(|| AppError::bad_request(format!("Unknown filter: {}", path.as_str())))?;
    let values = EngineerService::filter_values(db.get_ref(), kind).await?;
    Ok(HttpResponse::Ok().json(values))
}

#[get("/engineers/{id}")]
pub async fn engineer_detail(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    s3: web::Data<S3Service>,
) -> Result<HttpResponse, AppError> {
    let detail = EngineerService::get_detail(db.get_ref(), s3.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// POST /public/contact - Formulaire de contact (crée le compte client si besoin)
#[post("/contact")]
pub async fn submit_contact(
    body: web::Json<ContactFormRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<dyn EmailSender>,
) -> Result<HttpResponse, AppError> {
    let response = ContactService::submit_contact_form(
        db.get_ref(),
        config.get_ref(),
        mailer.get_ref(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn public_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/public")
            .service(homepage_statistics)
            .service(featured_engineers)
            .service(engineers_by_category)
            .service(search_engineers)
            .service(filter_values)
            .service(engineer_detail)
            .service(submit_contact)
    );
}
