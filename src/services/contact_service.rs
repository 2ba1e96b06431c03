// ============================================================================
// SERVICE : CONTACTS (formulaire public + liste du portail client)
// ============================================================================
//
// Workflow du formulaire public:
//   1. Valider le formulaire
//   2. Créer ou mettre à jour le client (par email)
//      - nouveau client: mot de passe généré, rôle CLIENT, actif
//   3. Créer le contact (statut New, priorité Medium, AutoReply)
//   4. Historiser Guest -> New
//   5. Emails: confirmation au client (+ identifiants), notification au sales manager
//
// ============================================================================

use sea_orm::*;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::models::dto::common::{clean_search, Paging};
use crate::models::dto::contact::{
    ClientContactListItem, ClientContactListResponse, ContactFormRequest, ContactFormResponse,
    ContactListQuery, CreateContactRequest, CreateContactResponse,
};
use crate::models::users::ROLE_CLIENT;
use crate::models::{contact_status_history, contacts, users};
use crate::services::auth_service::Portal;
use crate::services::email_service::{self, EmailSender};
use crate::utils::format::format_date;
use crate::utils::identifiers::contact_display_id;
use crate::utils::query::ci_contains;
use crate::utils::validation::validate_contact_form;
use crate::utils::password;
use crate::utils::time;

pub const DEFAULT_REQUEST_TYPE: &str = "General Inquiry";
pub const DEFAULT_PRIORITY: &str = "Medium";
pub const DEFAULT_PROGRESS: &str = "AutoReply";
pub const DEFAULT_PROPOSAL_STATUS: &str = "Pending";

pub struct ContactService;

impl ContactService {
    /// Formulaire de contact public
    pub async fn submit_contact_form(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &dyn EmailSender,
        form: ContactFormRequest,
    ) -> AppResult<ContactFormResponse> {
        // 1. Validation
        validate_contact_form(&form)?;

        let now = time::now_jst();
        let email = form.email.trim().to_lowercase();
        let name = form.name.trim().to_string();
        let txn = db.begin().await?;

        // 2. Créer ou mettre à jour le client
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .one(&txn)
            .await?;

        let (user, generated_password) = match existing {
            Some(user) => {
                let mut active: users::ActiveModel = user.into();
                active.full_name = Set(Some(name.clone()));
                active.company_name = Set(Some(form.company_name.trim().to_string()));
                active.phone = Set(Some(form.phone.trim().to_string()));
                active.updated_at = Set(Some(now));
                (active.update(&txn).await?, None)
            }
            None => {
                let plain = password::generate_random_password();
                let hash = password::hash_password(&plain).map_err(AppError::internal)?;
                let user = users::ActiveModel {
                    email: Set(email.clone()),
                    password: Set(Some(hash)),
                    full_name: Set(Some(name.clone())),
                    company_name: Set(Some(form.company_name.trim().to_string())),
                    phone: Set(Some(form.phone.trim().to_string())),
                    role: Set(Some(ROLE_CLIENT.to_string())),
                    is_active: Set(true),
                    created_at: Set(Some(now)),
                    updated_at: Set(Some(now)),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                (user, Some(plain))
            }
        };

        // 3. Créer le contact
        let title = form
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Contact Request from {}", name));

        let contact = contacts::ActiveModel {
            client_user_id: Set(Some(user.id)),
            title: Set(Some(title.clone())),
            description: Set(Some(form.message.trim().to_string())),
            status: Set(Some(contacts::STATUS_NEW.to_string())),
            request_type: Set(Some(DEFAULT_REQUEST_TYPE.to_string())),
            priority: Set(Some(DEFAULT_PRIORITY.to_string())),
            communication_progress: Set(Some(DEFAULT_PROGRESS.to_string())),
            proposal_status: Set(Some(DEFAULT_PROPOSAL_STATUS.to_string())),
            created_by: Set(Some(user.id)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 4. Historique
        record_status_change(&txn, contact.id, Some("Guest"), contacts::STATUS_NEW, Some(user.id)).await?;

        txn.commit().await?;
        tracing::info!(contact_id = contact.id, user_id = user.id, new_user = generated_password.is_some(), "Contact form submitted");

        // 5. Emails
        let login_link = Portal::Client.login_link(&config.app.base_url);
        email_service::send_quietly(
            mailer,
            email_service::contact_confirmation_email(&email, &name, &title, generated_password.as_deref(), &login_link),
        )
        .await;

        if let Some(manager) = &config.app.sales_manager_email {
            email_service::send_quietly(
                mailer,
                email_service::sales_notification_email(manager, &name, form.company_name.trim(), &title, contact.id),
            )
            .await;
        }

        Ok(ContactFormResponse {
            success: true,
            message: "Contact submitted successfully".to_string(),
            contact_id: contact.id,
        })
    }

    /// Liste paginée des contacts du client connecté
    pub async fn list_client_contacts(
        db: &DatabaseConnection,
        client_user_id: i32,
        query: &ContactListQuery,
    ) -> AppResult<ClientContactListResponse> {
        let paging = Paging::new(query.page, query.size);

        let mut select = contacts::Entity::find().filter(contacts::Column::ClientUserId.eq(client_user_id));

        if let Some(search) = clean_search(query.search.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(ci_contains((contacts::Entity, contacts::Column::Title), &search))
                    .add(ci_contains((contacts::Entity, contacts::Column::Description), &search)),
            );
        }
        if let Some(status) = clean_search(query.status.as_deref()).filter(|s| s != "All") {
            select = select.filter(contacts::Column::Status.eq(status));
        }

        let paginator = select
            .order_by_desc(contacts::Column::CreatedAt)
            .order_by_desc(contacts::Column::Id)
            .paginate(db, paging.size);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(paging.page).await?;

        let contacts = rows
            .into_iter()
            .enumerate()
            .map(|(i, c)| ClientContactListItem {
                no: paging.row_number(i),
                contact_id: contact_display_id(Some(c.id), c.client_user_id, c.created_at),
                created_on: format_date(c.created_at),
                id: c.id,
                title: c.title,
                description: c.description,
                status: c.status,
            })
            .collect();

        Ok(ClientContactListResponse {
            contacts,
            page: paging.page,
            page_size: paging.size,
            total_pages: totals.number_of_pages,
            total: totals.number_of_items,
        })
    }

    /// Nouveau contact depuis le portail client
    pub async fn create_client_contact(
        db: &DatabaseConnection,
        client_user_id: i32,
        request: CreateContactRequest,
    ) -> AppResult<CreateContactResponse> {
        let title = clean_search(request.title.as_deref())
            .ok_or_else(|| AppError::Validation("Title is required".to_string()))?;

        let now = time::now_jst();
        let txn = db.begin().await?;

        let contact = contacts::ActiveModel {
            client_user_id: Set(Some(client_user_id)),
            title: Set(Some(title)),
            description: Set(request.description.map(|d| d.trim().to_string())),
            status: Set(Some(contacts::STATUS_NEW.to_string())),
            request_type: Set(Some(DEFAULT_REQUEST_TYPE.to_string())),
            priority: Set(Some(DEFAULT_PRIORITY.to_string())),
            communication_progress: Set(Some(DEFAULT_PROGRESS.to_string())),
            proposal_status: Set(Some(DEFAULT_PROPOSAL_STATUS.to_string())),
            created_by: Set(Some(client_user_id)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        record_status_change(&txn, contact.id, None, contacts::STATUS_NEW, Some(client_user_id)).await?;
        txn.commit().await?;

        Ok(CreateContactResponse {
            success: true,
            message: "Contact created successfully".to_string(),
            contact_id: contact.id,
        })
    }
}

/// Ajoute une ligne à l'historique des statuts d'un contact
pub async fn record_status_change<C: ConnectionTrait>(
    conn: &C,
    contact_id: i32,
    from_status: Option<&str>,
    to_status: &str,
    changed_by: Option<i32>,
) -> Result<(), DbErr> {
    contact_status_history::ActiveModel {
        contact_id: Set(contact_id),
        from_status: Set(from_status.map(str::to_string)),
        to_status: Set(to_status.to_string()),
        changed_by: Set(changed_by),
        created_at: Set(Some(time::now_jst())),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email_service::testing::RecordingSender;

    fn form() -> ContactFormRequest {
        ContactFormRequest {
            name: "Taro Yamada".to_string(),
            company_name: "Acme KK".to_string(),
            phone: "03-1234-5678".to_string(),
            email: "Taro@Acme.jp".to_string(),
            title: None,
            message: "We need three Java engineers.".to_string(),
        }
    }

    fn contact(id: i32, user_id: i32) -> contacts::Model {
        contacts::Model {
            id,
            client_user_id: Some(user_id),
            assignee_user_id: None,
            reviewer_id: None,
            title: Some("Contact Request from Taro Yamada".to_string()),
            description: Some("We need three Java engineers.".to_string()),
            status: Some("New".to_string()),
            request_type: Some(DEFAULT_REQUEST_TYPE.to_string()),
            priority: Some(DEFAULT_PRIORITY.to_string()),
            internal_note: None,
            online_mtg_link: None,
            online_mtg_date: None,
            communication_progress: Some(DEFAULT_PROGRESS.to_string()),
            created_by: Some(user_id),
            proposal_link: None,
            proposal_status: Some(DEFAULT_PROPOSAL_STATUS.to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    fn history(contact_id: i32) -> contact_status_history::Model {
        contact_status_history::Model {
            id: 1,
            contact_id,
            from_status: Some("Guest".to_string()),
            to_status: "New".to_string(),
            changed_by: Some(5),
            created_at: None,
        }
    }

    fn client(id: i32) -> users::Model {
        users::Model {
            id,
            email: "taro@acme.jp".to_string(),
            password: None,
            full_name: Some("Taro Yamada".to_string()),
            company_name: Some("Acme KK".to_string()),
            phone: None,
            role: Some(ROLE_CLIENT.to_string()),
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_invalid_form_is_rejected_before_db() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mailer = RecordingSender::default();
        let mut f = form();
        f.email = "nope".to_string();

        let err = ContactService::submit_contact_form(&db, &AppConfig::default(), &mailer, f)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_new_client_receives_credentials() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .append_query_results([vec![client(5)]])
            .append_query_results([vec![contact(10, 5)]])
            .append_query_results([vec![history(10)]])
            .into_connection();
        let mailer = RecordingSender::default();
        let mut config = AppConfig::default();
        config.app.sales_manager_email = Some("manager@skillbridge.jp".to_string());

        let response = ContactService::submit_contact_form(&db, &config, &mailer, form())
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.contact_id, 10);
        assert_eq!(response.message, "Contact submitted successfully");

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "taro@acme.jp");
        assert!(sent[0].text.contains("Temporary password"));
        assert_eq!(sent[1].to, "manager@skillbridge.jp");
    }

    #[tokio::test]
    async fn test_create_client_contact_requires_title() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = ContactService::create_client_contact(&db, 5, CreateContactRequest {
            title: Some("   ".to_string()),
            description: None,
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Title is required"));
    }
}
