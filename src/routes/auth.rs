use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::auth::{ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest};
use crate::models::dto::common::MessageResponse;
use crate::services::auth_service::{AuthService, Portal};
use crate::services::email_service::EmailSender;

/// POST /auth/login - Connexion au portail client (PUBLIC)
#[post("/login")]
pub async fn client_login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let response = AuthService::login(db.get_ref(), config.get_ref(), Portal::Client, &body).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /auth/me - Utilisateur courant (PROTÉGÉ)
#[get("/me")]
pub async fn me(
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let info = AuthService::current_user(db.get_ref(), user.user_id).await?;
    Ok(HttpResponse::Ok().json(info))
}

/// POST /auth/change-password (PROTÉGÉ)
#[post("/change-password")]
pub async fn change_password(
    user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    AuthService::change_password(db.get_ref(), user.user_id, &body).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("Password changed successfully")))
}

/// POST /auth/forgot-password (PUBLIC)
/// Réponse identique que l'email existe ou non
#[post("/forgot-password")]
pub async fn forgot_password(
    body: web::Json<ForgotPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<dyn EmailSender>,
) -> Result<HttpResponse, AppError> {
    AuthService::forgot_password(db.get_ref(), config.get_ref(), mailer.get_ref(), &body.email, None).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok(
        "If the email exists, a password reset link has been sent",
    )))
}

/// POST /auth/reset-password (PUBLIC)
#[post("/reset-password")]
pub async fn reset_password(
    body: web::Json<ResetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    AuthService::reset_password(db.get_ref(), &body).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("Password has been reset successfully")))
}

/// POST /auth/logout - Le JWT est sans état, le client supprime son token
#[post("/logout")]
pub async fn logout(user: AuthUser) -> HttpResponse {
    tracing::info!(user_id = user.user_id, "User logged out");
    HttpResponse::Ok().json(MessageResponse::ok("Logged out successfully"))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(client_login)
            .service(me)
            .service(change_password)
            .service(forgot_password)
            .service(reset_password)
            .service(logout)
    );
}
