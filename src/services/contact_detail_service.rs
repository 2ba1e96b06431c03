// Détail d'un contact côté client et actions associées
// (journal, commentaire sur la proposition, annulation, approbation).

use sea_orm::*;
use sea_orm::sea_query::NullOrdering;

use crate::error::{AppError, AppResult};
use crate::models::communication_logs::MAX_MESSAGE_LENGTH;
use crate::models::dto::common::MessageResponse;
use crate::models::dto::contact::{CommunicationLogDto, ContactDetailResponse, ContactProposalDto};
use crate::models::{
    communication_logs, consultation_cancellations, contacts, opportunities, proposal_comments, proposals, users,
};
use crate::services::contact_service::record_status_change;
use crate::utils::format::{format_date, format_received_at};
use crate::utils::identifiers::contact_display_id;
use crate::utils::status::{proposal_status_to_contact_label, OpportunityStatus, ProposalStatus};
use crate::utils::time;

pub struct ContactDetailService;

impl ContactDetailService {
    /// Charge un contact appartenant au client, 404 sinon
    pub async fn find_owned_contact<C: ConnectionTrait>(
        conn: &C,
        client_user_id: i32,
        contact_id: i32,
    ) -> AppResult<contacts::Model> {
        contacts::Entity::find_by_id(contact_id)
            .filter(contacts::Column::ClientUserId.eq(client_user_id))
            .one(conn)
            .await?
            .ok_or_else(|| AppError::not_found("Contact not found"))
    }

    pub async fn get_detail(
        db: &DatabaseConnection,
        client_user_id: i32,
        contact_id: i32,
    ) -> AppResult<ContactDetailResponse> {
        // 1. Contact + client
        let contact = Self::find_owned_contact(db, client_user_id, contact_id).await?;
        let client = users::Entity::find_by_id(client_user_id).one(db).await?;

        // 2. Journal (plus récent d'abord)
        let logs = Self::logs_for(db, contact.id).await?;

        // 3. Propositions visibles par le client
        let proposals = proposals::Entity::find()
            .filter(proposals::Column::ContactId.eq(contact.id))
            .filter(proposals::Column::Status.is_in(ProposalStatus::client_visible()))
            .order_by_desc(proposals::Column::Version)
            .all(db)
            .await?;

        // 4. Dernier commentaire
        let latest_comment = proposal_comments::Entity::find()
            .filter(proposal_comments::Column::ContactId.eq(contact.id))
            .order_by_desc(proposal_comments::Column::Id)
            .one(db)
            .await?
            .map(|c| c.message);

        let proposal_status = proposals
            .iter()
            .find(|p| p.is_current)
            .map(|p| proposal_status_to_contact_label(&p.status).to_string())
            .or_else(|| contact.proposal_status.clone())
            .unwrap_or_else(|| "Pending".to_string());

        let dash = |value: Option<&String>| value.cloned().unwrap_or_else(|| "-".to_string());

        Ok(ContactDetailResponse {
            id: contact.id,
            contact_id: contact_display_id(Some(contact.id), contact.client_user_id, contact.created_at),
            client_name: dash(client.as_ref().and_then(|c| c.full_name.as_ref())),
            phone: dash(client.as_ref().and_then(|c| c.phone.as_ref())),
            email: dash(client.as_ref().map(|c| &c.email)),
            client_company: dash(client.as_ref().and_then(|c| c.company_name.as_ref())),
            date_received: format_received_at(contact.created_at),
            online_mtg_date: contact.online_mtg_date.map(|d| format_received_at(Some(d))),
            title: contact.title,
            description: contact.description,
            status: contact.status,
            online_mtg_link: contact.online_mtg_link,
            proposal_link: contact.proposal_link,
            proposal_status,
            communication_logs: logs,
            proposals: proposals
                .into_iter()
                .map(|p| ContactProposalDto {
                    attachments: p.attachment_keys(),
                    status: proposal_status_to_contact_label(&p.status).to_string(),
                    created_at: format_date(p.created_at),
                    id: p.id,
                    title: p.title,
                    version: p.version,
                    link: p.link,
                    is_current: p.is_current,
                })
                .collect(),
            latest_comment,
        })
    }

    pub async fn logs_for<C: ConnectionTrait>(conn: &C, contact_id: i32) -> AppResult<Vec<CommunicationLogDto>> {
        let logs = communication_logs::Entity::find()
            .filter(communication_logs::Column::ContactId.eq(contact_id))
            .order_by_desc(communication_logs::Column::CreatedAt)
            .order_by_desc(communication_logs::Column::Id)
            .all(conn)
            .await?;

        Ok(logs.into_iter().map(log_to_dto).collect())
    }

    pub async fn add_communication_log(
        db: &DatabaseConnection,
        client_user_id: i32,
        contact_id: i32,
        message: &str,
    ) -> AppResult<CommunicationLogDto> {
        let contact = Self::find_owned_contact(db, client_user_id, contact_id).await?;
        insert_log(db, contact.id, client_user_id, message).await
    }

    /// Commentaire du client: la proposition courante passe en revision_requested
    pub async fn add_proposal_comment(
        db: &DatabaseConnection,
        client_user_id: i32,
        contact_id: i32,
        message: &str,
    ) -> AppResult<MessageResponse> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("Message is required".to_string()));
        }

        let txn = db.begin().await?;
        let contact = Self::find_owned_contact(&txn, client_user_id, contact_id).await?;
        let now = time::now_jst();

        // 1. Enregistrer le commentaire
        proposal_comments::ActiveModel {
            contact_id: Set(contact.id),
            message: Set(message.to_string()),
            created_by: Set(Some(client_user_id)),
            created_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 2. Proposition courante -> demande de révision
        let (opportunity, current) = current_proposal_for_contact(&txn, contact.id).await?;
        if let Some(proposal) = current {
            let mut active: proposals::ActiveModel = proposal.into();
            active.client_feedback = Set(Some(message.to_string()));
            active.status = Set(ProposalStatus::RevisionRequested.to_string());
            active.updated_at = Set(Some(now));
            active.update(&txn).await?;
        }
        if let Some(opportunity) = opportunity {
            let mut active: opportunities::ActiveModel = opportunity.into();
            active.status = Set(OpportunityStatus::Revision.to_string());
            active.updated_at = Set(Some(now));
            active.update(&txn).await?;
        }

        // 3. Contact
        let mut active: contacts::ActiveModel = contact.into();
        active.proposal_status = Set(Some("Request for Change".to_string()));
        active.updated_at = Set(Some(now));
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(MessageResponse::ok("Comment added successfully"))
    }

    /// Annulation de la consultation: raison enregistrée, contact fermé
    pub async fn cancel_consultation(
        db: &DatabaseConnection,
        client_user_id: i32,
        contact_id: i32,
        reason: &str,
    ) -> AppResult<MessageResponse> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("Reason is required".to_string()));
        }

        let txn = db.begin().await?;
        let contact = Self::find_owned_contact(&txn, client_user_id, contact_id).await?;
        let now = time::now_jst();

        consultation_cancellations::ActiveModel {
            contact_id: Set(contact.id),
            reason: Set(reason.to_string()),
            cancelled_by: Set(Some(client_user_id)),
            created_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let previous = contact.status.clone();
        let mut active: contacts::ActiveModel = contact.into();
        active.status = Set(Some(contacts::STATUS_CLOSED.to_string()));
        active.updated_at = Set(Some(now));
        let contact = active.update(&txn).await?;

        record_status_change(&txn, contact.id, previous.as_deref(), contacts::STATUS_CLOSED, Some(client_user_id)).await?;

        txn.commit().await?;
        tracing::info!(contact_id = contact.id, "Consultation cancelled by client");
        Ok(MessageResponse::ok("Consultation cancelled successfully"))
    }

    /// Approbation de la proposition envoyée au client
    pub async fn approve_proposal(
        db: &DatabaseConnection,
        client_user_id: i32,
        contact_id: i32,
    ) -> AppResult<MessageResponse> {
        let txn = db.begin().await?;
        let contact = Self::find_owned_contact(&txn, client_user_id, contact_id).await?;
        let now = time::now_jst();

        // 1. Proposition courante via l'opportunité, sinon dernière proposition révisable du contact
        let (opportunity, current) = current_proposal_for_contact(&txn, contact.id).await?;
        let proposal = match current.filter(|p| p.status == ProposalStatus::SentToClient.as_str()) {
            Some(p) => Some(p),
            None => latest_reviewable_proposal(contact.id).one(&txn).await?,
        };
        let proposal = proposal.ok_or_else(|| AppError::bad_request("No reviewable proposal found to approve"))?;

        // 2. Proposition approuvée, opportunité gagnée
        let mut active: proposals::ActiveModel = proposal.into();
        active.status = Set(ProposalStatus::Approved.to_string());
        active.updated_at = Set(Some(now));
        active.update(&txn).await?;

        if let Some(opportunity) = opportunity {
            let mut active: opportunities::ActiveModel = opportunity.into();
            active.status = Set(OpportunityStatus::Won.to_string());
            active.updated_at = Set(Some(now));
            active.update(&txn).await?;
        }

        let mut active: contacts::ActiveModel = contact.into();
        active.proposal_status = Set(Some("Approved".to_string()));
        active.updated_at = Set(Some(now));
        active.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(contact_id, "Proposal approved by client");
        Ok(MessageResponse::ok("Proposal approved successfully"))
    }
}

/// Opportunité du contact et sa proposition courante
pub async fn current_proposal_for_contact<C: ConnectionTrait>(
    conn: &C,
    contact_id: i32,
) -> Result<(Option<opportunities::Model>, Option<proposals::Model>), DbErr> {
    let opportunity = opportunities::Entity::find()
        .filter(opportunities::Column::ContactId.eq(contact_id))
        .order_by_desc(opportunities::Column::Id)
        .one(conn)
        .await?;

    let current = match &opportunity {
        Some(opp) => {
            proposals::Entity::find()
                .filter(proposals::Column::OpportunityId.eq(opp.id))
                .filter(proposals::Column::IsCurrent.eq(true))
                .one(conn)
                .await?
        }
        None => {
            proposals::Entity::find()
                .filter(proposals::Column::ContactId.eq(contact_id))
                .filter(proposals::Column::IsCurrent.eq(true))
                .one(conn)
                .await?
        }
    };

    Ok((opportunity, current))
}

/// Ajoute une entrée au journal (message obligatoire, 500 caractères max)
pub async fn insert_log<C: ConnectionTrait>(
    conn: &C,
    contact_id: i32,
    author_id: i32,
    message: &str,
) -> AppResult<CommunicationLogDto> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::Validation(format!(
            "Message must not exceed {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }

    let log = communication_logs::ActiveModel {
        contact_id: Set(contact_id),
        message: Set(message.to_string()),
        created_by: Set(Some(author_id)),
        created_at: Set(Some(time::now_jst())),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(log_to_dto(log))
}

fn log_to_dto(log: communication_logs::Model) -> CommunicationLogDto {
    CommunicationLogDto {
        id: log.id,
        date_time: format_received_at(log.created_at),
        message: log.message,
        created_by: log.created_by,
    }
}

/// Dernière proposition du contact encore approuvable (dates manquantes en dernier)
fn latest_reviewable_proposal(contact_id: i32) -> Select<proposals::Entity> {
    proposals::Entity::find()
        .filter(proposals::Column::ContactId.eq(contact_id))
        .filter(proposals::Column::Status.is_in([
            ProposalStatus::SentToClient.as_str(),
            ProposalStatus::RevisionRequested.as_str(),
        ]))
        .order_by_with_nulls(proposals::Column::CreatedAt, Order::Desc, NullOrdering::Last)
        .order_by_desc(proposals::Column::Id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> contacts::Model {
        contacts::Model {
            id: 3,
            client_user_id: Some(5),
            assignee_user_id: Some(8),
            reviewer_id: None,
            title: Some("Need Java devs".to_string()),
            description: None,
            status: Some("Inprogress".to_string()),
            request_type: None,
            priority: None,
            internal_note: None,
            online_mtg_link: None,
            online_mtg_date: None,
            communication_progress: None,
            created_by: Some(5),
            proposal_link: None,
            proposal_status: Some("Pending".to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_latest_reviewable_proposal_puts_undated_rows_last() {
        let sql = latest_reviewable_proposal(3).build(DbBackend::Postgres).to_string();
        assert!(sql.contains(r#"ORDER BY "proposals"."created_at" DESC NULLS LAST, "proposals"."id" DESC"#));
        assert!(sql.contains("'sent_to_client'"));
    }

    #[tokio::test]
    async fn test_contact_of_another_client_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<contacts::Model>::new()])
            .into_connection();

        let err = ContactDetailService::get_detail(&db, 99, 3).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_log_message_too_long() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![contact()]])
            .into_connection();

        let err = ContactDetailService::add_communication_log(&db, 5, 3, &"x".repeat(501))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Message must not exceed 500 characters"));
    }

    #[tokio::test]
    async fn test_approve_without_reviewable_proposal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![contact()]])
            .append_query_results([Vec::<opportunities::Model>::new()])
            .append_query_results([Vec::<proposals::Model>::new()])
            .append_query_results([Vec::<proposals::Model>::new()])
            .into_connection();

        let err = ContactDetailService::approve_proposal(&db, 5, 3).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "No reviewable proposal found to approve"));
    }
}
