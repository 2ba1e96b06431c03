use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::users::{self, ROLE_ADMIN, ROLE_CLIENT, ROLE_CLIENT_USER, ROLE_SALES_MANAGER, ROLE_SALES_REP};
use crate::utils::jwt;

const AUTH_REQUIRED: &str = "Authentication required";

/// Structure qui contient les infos de l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
}

impl AuthUser {
    pub fn is_client(&self) -> bool {
        self.role == ROLE_CLIENT || self.role == ROLE_CLIENT_USER
    }

    pub fn is_sales(&self) -> bool {
        self.role == ROLE_SALES_MANAGER || self.role == ROLE_SALES_REP
    }

    pub fn is_sales_manager(&self) -> bool {
        self.role == ROLE_SALES_MANAGER
    }

    pub fn is_sales_rep(&self) -> bool {
        self.role == ROLE_SALES_REP
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn require_client(&self) -> Result<(), AppError> {
        if self.is_client() {
            Ok(())
        } else {
            Err(AppError::forbidden("Access denied. Client role required"))
        }
    }

    pub fn require_sales(&self) -> Result<(), AppError> {
        if self.is_sales() {
            Ok(())
        } else {
            Err(AppError::forbidden("Access denied. Sales role required"))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Access denied. Admin role required"))
        }
    }

    /// Nom affiché dans les historiques
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}

impl From<&users::Model> for AuthUser {
    fn from(user: &users::Model) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role_or_default().to_string(),
        }
    }
}

/// Extrait le token du header "Authorization: Bearer <token>"
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Vérifie le token puis recharge l'utilisateur (doit exister, être actif et correspondre au sujet)
pub async fn authenticate(
    db: &DatabaseConnection,
    config: &AppConfig,
    token: &str,
) -> Result<AuthUser, String> {
    // 1. Signature + expiration
    let claims = jwt::verify_token(&config.jwt, token)?;

    // 2. Recharger l'utilisateur par email (sujet du token)
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(&claims.sub))
        .one(db)
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("User not found: {}", claims.sub))?;

    // 3. Vérifications
    if !user.is_active {
        return Err(format!("User is inactive: {}", user.email));
    }
    if user.email != claims.sub || user.id != claims.user_id {
        return Err("Token subject does not match user".to_string());
    }

    Ok(AuthUser::from(&user))
}

/// Implémentation de FromRequest pour AuthUser
/// Cela permet à Actix-Web d'extraire automatiquement AuthUser des requêtes
impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let db = req.app_data::<web::Data<DatabaseConnection>>().cloned();
        let config = req.app_data::<web::Data<AppConfig>>().cloned();

        Box::pin(async move {
            let (Some(token), Some(db), Some(config)) = (token, db, config) else {
                tracing::debug!("Missing bearer token or application state");
                return Err(AppError::unauthorized(AUTH_REQUIRED));
            };

            authenticate(db.get_ref(), config.get_ref(), &token)
                .await
                .map_err(|reason| {
                    tracing::debug!(%reason, "JWT authentication failed");
                    AppError::unauthorized(AUTH_REQUIRED)
                })
        })
    }
}
