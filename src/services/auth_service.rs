use chrono::Duration;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::models::dto::auth::{ChangePasswordRequest, LoginRequest, LoginResponse, ResetPasswordRequest, UserInfo};
use crate::models::users::{ROLE_ADMIN, ROLE_CLIENT, ROLE_SALES_MANAGER, ROLE_SALES_REP};
use crate::models::{password_reset_tokens, users};
use crate::services::email_service::{self, EmailSender};
use crate::utils::{jwt, password, time};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INACTIVE_ACCOUNT: &str = "Your account is inactive. Please contact support";
const MIN_PASSWORD_LENGTH: usize = 8;

/// Portail depuis lequel l'utilisateur se connecte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Portal {
    Client,
    Sales,
    Admin,
}

impl Portal {
    pub fn label(&self) -> &'static str {
        match self {
            Portal::Client => "client",
            Portal::Sales => "sales",
            Portal::Admin => "admin",
        }
    }

    fn allows(&self, role: &str) -> bool {
        match self {
            Portal::Client => role == ROLE_CLIENT,
            Portal::Sales => role == ROLE_SALES_MANAGER || role == ROLE_SALES_REP,
            Portal::Admin => role == ROLE_ADMIN,
        }
    }

    /// Portail par défaut selon le rôle (pour les liens envoyés par email)
    pub fn for_role(role: &str) -> Self {
        match role {
            ROLE_SALES_MANAGER | ROLE_SALES_REP => Portal::Sales,
            ROLE_ADMIN => Portal::Admin,
            _ => Portal::Client,
        }
    }

    /// Lien de réinitialisation: {base}/{portail}/reset-password?token=...
    pub fn reset_link(&self, base_url: &str, token: &str) -> String {
        format!(
            "{}/{}/reset-password?token={}",
            base_url.trim_end_matches('/'),
            self.label(),
            token
        )
    }

    pub fn login_link(&self, base_url: &str) -> String {
        format!("{}/{}/login", base_url.trim_end_matches('/'), self.label())
    }
}

pub struct AuthService;

impl AuthService {
    /// Connexion sur un portail: vérifie mot de passe, rôle puis statut
    pub async fn login(
        db: &DatabaseConnection,
        config: &AppConfig,
        portal: Portal,
        request: &LoginRequest,
    ) -> AppResult<LoginResponse> {
        // 1. Trouver l'utilisateur
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(request.email.trim()))
            .one(db)
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

        // 2. Vérifier le mot de passe
        let hash = user
            .password
            .as_deref()
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;
        let is_valid = password::verify_password(&request.password, hash).unwrap_or_else(|e| {
            tracing::warn!(user_id = user.id, error = %e, "Stored password hash is unreadable");
            false
        });
        if !is_valid {
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        // 3. Vérifier le rôle et le statut
        let role = user.role_or_default();
        if !portal.allows(role) {
            return Err(AppError::forbidden(format!(
                "Access denied. This account does not have {} permissions",
                portal.label()
            )));
        }
        if !user.is_active {
            return Err(AppError::forbidden(INACTIVE_ACCOUNT));
        }

        // 4. Générer le JWT
        let token = jwt::generate_token(&config.jwt, user.id, &user.email, role).map_err(AppError::internal)?;

        tracing::info!(user_id = user.id, portal = portal.label(), "User logged in");

        Ok(LoginResponse {
            token,
            user: UserInfo::from(&user),
        })
    }

    pub async fn current_user(db: &DatabaseConnection, user_id: i32) -> AppResult<UserInfo> {
        let user = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(UserInfo::from(&user))
    }

    pub async fn change_password(
        db: &DatabaseConnection,
        user_id: i32,
        request: &ChangePasswordRequest,
    ) -> AppResult<()> {
        // 1. Récupérer l'utilisateur
        let user = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !user.is_active {
            return Err(AppError::forbidden(INACTIVE_ACCOUNT));
        }

        // 2. Vérifier l'ancien mot de passe
        let current_ok = match user.password.as_deref() {
            Some(hash) => password::verify_password(&request.current_password, hash).unwrap_or(false),
            None => false,
        };
        if !current_ok {
            return Err(AppError::bad_request("Current password is incorrect"));
        }
        if request.current_password == request.new_password {
            return Err(AppError::bad_request("New password must be different from current password"));
        }
        check_new_password(&request.new_password)?;

        // 3. Enregistrer le nouveau hash
        let new_hash = password::hash_password(&request.new_password).map_err(AppError::internal)?;
        let mut active: users::ActiveModel = user.into();
        active.password = Set(Some(new_hash));
        active.updated_at = Set(Some(time::now_jst()));
        active.update(db).await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Demande de réinitialisation. Réussit silencieusement pour un email inconnu ou inactif.
    pub async fn forgot_password(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &dyn EmailSender,
        email: &str,
        portal: Option<Portal>,
    ) -> AppResult<()> {
        // 1. Trouver l'utilisateur
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim()))
            .one(db)
            .await?;

        let user = match user {
            Some(user) if user.is_active => user,
            _ => {
                tracing::info!("Password reset requested for unknown or inactive email");
                return Ok(());
            }
        };

        // 2. Invalider les anciens tokens
        password_reset_tokens::Entity::update_many()
            .col_expr(password_reset_tokens::Column::Used, Expr::value(true))
            .filter(password_reset_tokens::Column::UserId.eq(user.id))
            .filter(password_reset_tokens::Column::Used.eq(false))
            .exec(db)
            .await?;

        // 3. Créer le nouveau token
        let now = time::now_jst();
        let token = uuid::Uuid::new_v4().to_string();
        let ttl = config.app.reset_token_ttl_seconds;
        password_reset_tokens::ActiveModel {
            user_id: Set(user.id),
            token: Set(token.clone()),
            expires_at: Set(now + Duration::seconds(ttl)),
            used: Set(false),
            created_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(db)
        .await?;

        // 4. Envoyer l'email (un échec n'annule pas la demande)
        let portal = portal.unwrap_or_else(|| Portal::for_role(user.role_or_default()));
        let link = portal.reset_link(&config.app.base_url, &token);
        let name = user.full_name.clone().unwrap_or_else(|| user.email.clone());
        email_service::send_quietly(
            mailer,
            email_service::password_reset_email(&user.email, &name, &link, ttl / 60),
        )
        .await;

        Ok(())
    }

    pub async fn reset_password(db: &DatabaseConnection, request: &ResetPasswordRequest) -> AppResult<()> {
        let invalid = || AppError::bad_request("Invalid or expired reset token");

        // 1. Vérifier le token
        let token = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Token.eq(request.token.trim()))
            .one(db)
            .await?
            .ok_or_else(invalid)?;
        if !token.is_valid_at(time::now_jst()) {
            return Err(invalid());
        }

        // 2. Vérifier l'utilisateur
        let user = users::Entity::find_by_id(token.user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if !user.is_active {
            return Err(AppError::forbidden(INACTIVE_ACCOUNT));
        }
        check_new_password(&request.new_password)?;

        // 3. Mettre à jour le mot de passe et consommer le token
        let new_hash = password::hash_password(&request.new_password).map_err(AppError::internal)?;
        let txn = db.begin().await?;

        let user_id = user.id;
        let mut active_user: users::ActiveModel = user.into();
        active_user.password = Set(Some(new_hash));
        active_user.updated_at = Set(Some(time::now_jst()));
        active_user.update(&txn).await?;

        let mut active_token: password_reset_tokens::ActiveModel = token.into();
        active_token.used = Set(true);
        active_token.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(user_id, "Password reset completed");
        Ok(())
    }
}

fn check_new_password(value: &str) -> AppResult<()> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
