// ============================================================================
// SERVICE : CONTACTS CÔTÉ SALES
// ============================================================================
//
// Règles d'accès:
//   - SALES_REP     : uniquement les contacts qui lui sont assignés
//   - SALES_MANAGER : tous les contacts, filtre optionnel par assignee
//
// Les statuts sont exposés en codes (NEW, INPROGRESS, ...) et stockés en
// libellés (New, Inprogress, ...).
//
// ============================================================================

use std::collections::HashMap;

use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::dto::common::{clean_search, split_list, Paging};
use crate::models::dto::contact::{
    CommunicationLogDto, SalesContactDetailResponse, SalesContactListItem, SalesContactListQuery,
    SalesContactListResponse, UpdateSalesContactRequest,
};
use crate::models::{contacts, opportunities, users};
use crate::services::contact_detail_service::{insert_log, ContactDetailService};
use crate::services::contact_service::record_status_change;
use crate::utils::format::{format_date, format_received_at};
use crate::utils::identifiers::contact_display_id;
use crate::utils::query::ci_contains;
use crate::utils::status::{contact_code_to_status, contact_status_to_code};
use crate::utils::time;

pub struct SalesContactService;

impl SalesContactService {
    pub async fn list(
        db: &DatabaseConnection,
        user: &AuthUser,
        query: &SalesContactListQuery,
    ) -> AppResult<SalesContactListResponse> {
        user.require_sales()?;
        let paging = Paging::new(query.page, query.size);

        let mut select = contacts::Entity::find().find_also_related(users::Entity);

        // 1. Périmètre selon le rôle
        if user.is_sales_rep() {
            select = select.filter(contacts::Column::AssigneeUserId.eq(user.user_id));
        } else if let Some(assignee) = query.assignee_user_id {
            select = select.filter(contacts::Column::AssigneeUserId.eq(assignee));
        }

        // 2. Filtres
        let statuses: Vec<String> = split_list(query.status.as_deref())
            .iter()
            .map(|code| contact_code_to_status(code))
            .collect();
        if !statuses.is_empty() {
            select = select.filter(contacts::Column::Status.is_in(statuses));
        }
        if let Some(search) = clean_search(query.search.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(ci_contains((contacts::Entity, contacts::Column::Title), &search))
                    .add(ci_contains((contacts::Entity, contacts::Column::Description), &search))
                    .add(ci_contains((users::Entity, users::Column::FullName), &search))
                    .add(ci_contains((users::Entity, users::Column::Email), &search))
                    .add(ci_contains((users::Entity, users::Column::CompanyName), &search)),
            );
        }

        // 3. Pagination
        let paginator = select
            .order_by_desc(contacts::Column::CreatedAt)
            .order_by_desc(contacts::Column::Id)
            .paginate(db, paging.size);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(paging.page).await?;

        // 4. Noms des assignees
        let assignee_ids: Vec<i32> = rows.iter().filter_map(|(c, _)| c.assignee_user_id).collect();
        let names = user_names(db, assignee_ids).await?;

        let contacts = rows
            .into_iter()
            .enumerate()
            .map(|(i, (contact, client))| SalesContactListItem {
                no: paging.row_number(i),
                contact_id: contact_display_id(Some(contact.id), contact.client_user_id, contact.created_at),
                internal_id: contact.id,
                client_name: client.as_ref().and_then(|c| c.full_name.clone()).unwrap_or_default(),
                client_email: client.as_ref().map(|c| c.email.clone()).unwrap_or_default(),
                company: client.and_then(|c| c.company_name).unwrap_or_default(),
                status: contact_status_to_code(contact.status.as_deref().unwrap_or(contacts::STATUS_NEW)),
                assignee_name: contact.assignee_user_id.and_then(|id| names.get(&id).cloned()),
                assignee_user_id: contact.assignee_user_id,
                created_on: format_date(contact.created_at),
                title: contact.title,
                priority: contact.priority,
            })
            .collect();

        Ok(SalesContactListResponse {
            contacts,
            page: paging.page,
            page_size: paging.size,
            total_pages: totals.number_of_pages,
            total: totals.number_of_items,
        })
    }

    pub async fn get_detail(
        db: &DatabaseConnection,
        user: &AuthUser,
        contact_id: i32,
    ) -> AppResult<SalesContactDetailResponse> {
        let contact = Self::find_accessible(db, user, contact_id).await?;
        Self::to_detail(db, contact).await
    }

    pub async fn update(
        db: &DatabaseConnection,
        user: &AuthUser,
        contact_id: i32,
        request: UpdateSalesContactRequest,
    ) -> AppResult<SalesContactDetailResponse> {
        let txn = db.begin().await?;
        let contact = Self::find_accessible(&txn, user, contact_id).await?;

        // Seul un manager peut réassigner
        if request.assignee_user_id.is_some()
            && request.assignee_user_id != contact.assignee_user_id
            && !user.is_sales_manager()
        {
            return Err(AppError::forbidden("Access denied. Only Sales Manager can reassign contacts"));
        }

        let previous_status = contact.status.clone();
        let new_status = request.status.as_deref().map(contact_code_to_status);

        let mut active: contacts::ActiveModel = contact.into();
        if let Some(assignee) = request.assignee_user_id {
            active.assignee_user_id = Set(Some(assignee));
        }
        if let Some(reviewer) = request.reviewer_id {
            active.reviewer_id = Set(Some(reviewer));
        }
        if let Some(status) = &new_status {
            active.status = Set(Some(status.clone()));
        }
        if let Some(priority) = request.priority {
            active.priority = Set(Some(priority));
        }
        if let Some(note) = request.internal_note {
            active.internal_note = Set(Some(note));
        }
        if let Some(link) = request.online_mtg_link {
            active.online_mtg_link = Set(Some(link));
        }
        if let Some(date) = request.online_mtg_date {
            active.online_mtg_date = Set(Some(date));
        }
        active.updated_at = Set(Some(time::now_jst()));
        let contact = active.update(&txn).await?;

        if let Some(status) = new_status.filter(|s| previous_status.as_deref() != Some(s.as_str())) {
            record_status_change(&txn, contact.id, previous_status.as_deref(), &status, Some(user.user_id)).await?;
        }

        txn.commit().await?;
        tracing::info!(contact_id = contact.id, user_id = user.user_id, "Contact updated by sales");
        Self::to_detail(db, contact).await
    }

    pub async fn add_communication_log(
        db: &DatabaseConnection,
        user: &AuthUser,
        contact_id: i32,
        message: &str,
    ) -> AppResult<CommunicationLogDto> {
        let contact = Self::find_accessible(db, user, contact_id).await?;
        insert_log(db, contact.id, user.user_id, message).await
    }

    /// Contact visible par l'utilisateur sales (404 si absent, 403 hors périmètre)
    pub async fn find_accessible<C: ConnectionTrait>(
        conn: &C,
        user: &AuthUser,
        contact_id: i32,
    ) -> AppResult<contacts::Model> {
        user.require_sales()?;
        let contact = contacts::Entity::find_by_id(contact_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::not_found("Contact not found"))?;

        if user.is_sales_rep() && contact.assignee_user_id != Some(user.user_id) {
            return Err(AppError::forbidden("Access denied. You can only access contacts assigned to you"));
        }
        Ok(contact)
    }

    async fn to_detail(db: &DatabaseConnection, contact: contacts::Model) -> AppResult<SalesContactDetailResponse> {
        let client = match contact.client_user_id {
            Some(id) => users::Entity::find_by_id(id).one(db).await?,
            None => None,
        };
        let logs = ContactDetailService::logs_for(db, contact.id).await?;
        let opportunity = opportunities::Entity::find()
            .filter(opportunities::Column::ContactId.eq(contact.id))
            .order_by_desc(opportunities::Column::Id)
            .one(db)
            .await?;

        Ok(SalesContactDetailResponse {
            id: contact.id,
            contact_id: contact_display_id(Some(contact.id), contact.client_user_id, contact.created_at),
            client_user_id: contact.client_user_id,
            client_name: client.as_ref().and_then(|c| c.full_name.clone()).unwrap_or_default(),
            client_email: client.as_ref().map(|c| c.email.clone()).unwrap_or_default(),
            phone: client.as_ref().and_then(|c| c.phone.clone()).unwrap_or_default(),
            company: client.and_then(|c| c.company_name).unwrap_or_default(),
            status: contact_status_to_code(contact.status.as_deref().unwrap_or(contacts::STATUS_NEW)),
            date_received: format_received_at(contact.created_at),
            online_mtg_date: contact.online_mtg_date.map(|d| format_received_at(Some(d))),
            title: contact.title,
            description: contact.description,
            request_type: contact.request_type,
            priority: contact.priority,
            internal_note: contact.internal_note,
            online_mtg_link: contact.online_mtg_link,
            assignee_user_id: contact.assignee_user_id,
            reviewer_id: contact.reviewer_id,
            communication_progress: contact.communication_progress,
            communication_logs: logs,
            opportunity_id: opportunity.map(|o| o.opportunity_id),
        })
    }
}

/// id -> nom affiché (nom complet, sinon email)
pub async fn user_names<C: ConnectionTrait>(conn: &C, ids: Vec<i32>) -> Result<HashMap<i32, String>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(conn)
        .await?;

    Ok(users
        .into_iter()
        .map(|u| (u.id, u.full_name.unwrap_or(u.email)))
        .collect())
}
