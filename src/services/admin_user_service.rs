// ============================================================================
// SERVICE : UTILISATEURS (back-office admin)
// ============================================================================
//
// Workflow de création:
//   1. Valider la requête (email, nom, rôle)
//   2. Refuser un email déjà utilisé (409)
//   3. Générer un mot de passe aléatoire, créer l'utilisateur actif
//   4. Envoyer l'email de bienvenue (échec seulement logué)
//
// Suppression: logique (is_active = false).
// Sans filtre de rôle, la liste ne montre que les comptes sales.
//
// ============================================================================

use sea_orm::*;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::models::dto::admin::{
    AdminUserDto, AdminUserListQuery, AdminUserListResponse, CreateUserRequest, UpdateUserRequest,
};
use crate::models::dto::common::{clean_search, PageInfo, Paging};
use crate::models::users::{self, ROLE_ADMIN, ROLE_CLIENT, ROLE_CLIENT_USER, ROLE_SALES_MANAGER, ROLE_SALES_REP};
use crate::services::auth_service::Portal;
use crate::services::email_service::{self, EmailSender};
use crate::utils::password;
use crate::utils::query::ci_contains;
use crate::utils::validation::validate_request;
use crate::utils::time;

const KNOWN_ROLES: [&str; 5] = [ROLE_ADMIN, ROLE_SALES_MANAGER, ROLE_SALES_REP, ROLE_CLIENT, ROLE_CLIENT_USER];
const DUPLICATE_EMAIL: &str = "Email already exists. Please use a different email.";

pub struct AdminUserService;

impl AdminUserService {
    pub async fn list(db: &DatabaseConnection, query: &AdminUserListQuery) -> AppResult<AdminUserListResponse> {
        let paging = Paging::new(query.page, query.size);
        let mut select = users::Entity::find();

        // 1. Statut: active | deleted
        match query.status.as_deref().map(str::to_lowercase).as_deref() {
            Some("active") => select = select.filter(users::Column::IsActive.eq(true)),
            Some("deleted") => select = select.filter(users::Column::IsActive.eq(false)),
            _ => {}
        }

        // 2. Rôle (comptes sales par défaut)
        select = match clean_search(query.role.as_deref()) {
            Some(role) => select.filter(users::Column::Role.eq(role)),
            None => select.filter(users::Column::Role.is_in([ROLE_SALES_MANAGER, ROLE_SALES_REP])),
        };

        // 3. Recherche nom / email
        if let Some(search) = clean_search(query.search.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(ci_contains((users::Entity, users::Column::FullName), &search))
                    .add(ci_contains((users::Entity, users::Column::Email), &search)),
            );
        }

        let paginator = select
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .paginate(db, paging.size);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(paging.page).await?;

        Ok(AdminUserListResponse {
            users: rows.into_iter().map(AdminUserDto::from).collect(),
            page: PageInfo {
                total_elements: totals.number_of_items,
                total_pages: totals.number_of_pages,
                number: paging.page,
                size: paging.size,
            },
        })
    }

    pub async fn get(db: &DatabaseConnection, id: i32) -> AppResult<AdminUserDto> {
        Ok(find_user(db, id).await?.into())
    }

    pub async fn create(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &dyn EmailSender,
        request: CreateUserRequest,
    ) -> AppResult<AdminUserDto> {
        // 1. Validation
        validate_request(&request)?;
        let role = check_role(&request.role)?;
        let email = request.email.trim().to_lowercase();

        // 2. Unicité de l'email
        let exists = users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .count(db)
            .await?;
        if exists > 0 {
            tracing::warn!(email = %email, "Email already exists");
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        // 3. Création
        let plain = password::generate_random_password();
        let hash = password::hash_password(&plain).map_err(AppError::internal)?;
        let now = time::now_jst();

        let user = users::ActiveModel {
            email: Set(email),
            password: Set(Some(hash)),
            full_name: Set(Some(request.full_name.trim().to_string())),
            phone: Set(request.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())),
            role: Set(Some(role.to_string())),
            is_active: Set(true),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        tracing::info!(user_id = user.id, role, "User created");

        // 4. Email de bienvenue
        let login_link = Portal::for_role(role).login_link(&config.app.base_url);
        email_service::send_quietly(
            mailer,
            email_service::welcome_email(
                &user.email,
                user.full_name.as_deref().unwrap_or(&user.email),
                &plain,
                &login_link,
            ),
        )
        .await;

        Ok(user.into())
    }

    /// Met à jour nom, rôle et téléphone (jamais l'email ni le mot de passe)
    pub async fn update(db: &DatabaseConnection, id: i32, request: UpdateUserRequest) -> AppResult<AdminUserDto> {
        validate_request(&request)?;
        let role = request.role.as_deref().map(check_role).transpose()?;
        let user = find_user(db, id).await?;

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = request.full_name {
            active.full_name = Set(Some(name.trim().to_string()));
        }
        if let Some(role) = role {
            active.role = Set(Some(role.to_string()));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone.trim().to_string()).filter(|p| !p.is_empty()));
        }
        active.updated_at = Set(Some(time::now_jst()));
        let user = active.update(db).await?;

        tracing::info!(user_id = user.id, "User updated");
        Ok(user.into())
    }

    pub async fn delete(db: &DatabaseConnection, id: i32) -> AppResult<()> {
        let user = find_user(db, id).await?;
        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(time::now_jst()));
        active.update(db).await?;

        tracing::info!(user_id = id, "User deactivated");
        Ok(())
    }
}

async fn find_user(db: &DatabaseConnection, id: i32) -> AppResult<users::Model> {
    users::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

fn check_role(role: &str) -> AppResult<&'static str> {
    let role = role.trim().to_uppercase();
    KNOWN_ROLES
        .into_iter()
        .find(|known| *known == role)
        .ok_or_else(|| AppError::Validation(format!("Invalid role: {}", role)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email_service::testing::RecordingSender;
    use std::collections::BTreeMap;

    fn request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            full_name: "Hanako Sato".to_string(),
            role: "SALES_REP".to_string(),
            phone: None,
        }
    }

    fn count_row(n: i64) -> Vec<BTreeMap<&'static str, Value>> {
        vec![BTreeMap::from([("num_items", Value::BigInt(Some(n)))])]
    }

    #[test]
    fn test_check_role() {
        assert_eq!(check_role("sales_manager").unwrap(), ROLE_SALES_MANAGER);
        assert!(matches!(check_role("ROOT"), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(1)])
            .into_connection();
        let mailer = RecordingSender::default();

        let err = AdminUserService::create(&db, &AppConfig::default(), &mailer, request("Sato@SkillBridge.jp"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == DUPLICATE_EMAIL));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mailer = RecordingSender::default();

        let err = AdminUserService::create(&db, &AppConfig::default(), &mailer, request("not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Email should be valid"));
    }

    #[tokio::test]
    async fn test_created_user_gets_welcome_mail_even_if_mail_fails() {
        let created = users::Model {
            id: 21,
            email: "sato@skillbridge.jp".to_string(),
            password: None,
            full_name: Some("Hanako Sato".to_string()),
            company_name: None,
            phone: None,
            role: Some(ROLE_SALES_REP.to_string()),
            is_active: true,
            created_at: None,
            updated_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(0)])
            .append_query_results([vec![created]])
            .into_connection();
        let mailer = RecordingSender {
            fail: true,
            ..Default::default()
        };

        let user = AdminUserService::create(&db, &AppConfig::default(), &mailer, request("sato@skillbridge.jp"))
            .await
            .unwrap();
        assert_eq!(user.id, 21);
        assert_eq!(user.role, ROLE_SALES_REP);
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let err = AdminUserService::delete(&db, 404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "User not found"));
    }
}
