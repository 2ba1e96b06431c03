// ============================================================================
// SERVICE : PROPOSITIONS (back-office sales)
// ============================================================================
//
// Workflow:
//   1. create         : version = max + 1, ancienne version non courante
//                       draft, ou internal_review si un reviewer est désigné
//   2. update         : uniquement un brouillon non soumis
//   3. assign_reviewer: passage en internal_review
//   4. submit_review  : reviewer désigné uniquement
//        APPROVE          -> sent_to_client
//        REQUEST_REVISION -> revision_requested
//        REJECT           -> rejected
//
// Pièces jointes:
//   - PDF uniquement, déjà déposées via une URL pré-signée (PUT)
//   - une ligne document_metadata par fichier (rôles sales autorisés)
//
// ============================================================================

use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::dto::proposal::{
    AssignReviewerRequest, AttachmentRef, CreateProposalRequest, ProposalDto, SubmitReviewRequest,
    UpdateProposalRequest,
};
use crate::models::users::ROLE_SALES_MANAGER;
use crate::models::{contacts, document_metadata, opportunities, proposals, users};
use crate::services::opportunity_service::{record_history, OpportunityService};
use crate::utils::status::{proposal_status_to_contact_label, OpportunityStatus, ProposalStatus};
use crate::utils::validation::is_pdf_file_name;
use crate::utils::time;

pub const SALES_DOCUMENT_ROLES: [&str; 2] = ["SALES_MANAGER", "SALES_REP"];

/// Décision de revue interne
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    RequestRevision,
    Reject,
}

impl ReviewAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "APPROVE" => Some(ReviewAction::Approve),
            "REQUEST_REVISION" => Some(ReviewAction::RequestRevision),
            "REJECT" => Some(ReviewAction::Reject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "APPROVE",
            ReviewAction::RequestRevision => "REQUEST_REVISION",
            ReviewAction::Reject => "REJECT",
        }
    }

    pub fn resulting_status(&self) -> ProposalStatus {
        match self {
            ReviewAction::Approve => ProposalStatus::SentToClient,
            ReviewAction::RequestRevision => ProposalStatus::RevisionRequested,
            ReviewAction::Reject => ProposalStatus::Rejected,
        }
    }
}

pub struct SalesProposalService;

impl SalesProposalService {
    pub async fn create(
        db: &DatabaseConnection,
        user: &AuthUser,
        opportunity_ref: &str,
        request: CreateProposalRequest,
    ) -> AppResult<ProposalDto> {
        // 1. Vérifications (droits, reviewer, pièces jointes)
        let opportunity = OpportunityService::find_accessible(db, user, opportunity_ref).await?;
        if let Some(reviewer_id) = request.reviewer_id {
            ensure_sales_manager(db, reviewer_id).await?;
        }
        check_attachments(&request.attachments)?;

        let now = time::now_jst();
        let txn = db.begin().await?;

        // 2. Nouvelle version courante
        let latest = proposals::Entity::find()
            .filter(proposals::Column::OpportunityId.eq(opportunity.id))
            .order_by_desc(proposals::Column::Version)
            .one(&txn)
            .await?;
        let version = latest.map(|p| p.version + 1).unwrap_or(1);

        proposals::Entity::update_many()
            .col_expr(proposals::Column::IsCurrent, Expr::value(false))
            .filter(proposals::Column::OpportunityId.eq(opportunity.id))
            .filter(proposals::Column::IsCurrent.eq(true))
            .exec(&txn)
            .await?;

        let status = if request.reviewer_id.is_some() {
            ProposalStatus::InternalReview
        } else {
            ProposalStatus::Draft
        };
        let keys: Vec<String> = request.attachments.iter().map(|a| a.s3_key.clone()).collect();

        let proposal = proposals::ActiveModel {
            contact_id: Set(opportunity.contact_id),
            opportunity_id: Set(Some(opportunity.id)),
            version: Set(version),
            is_current: Set(true),
            title: Set(Some(
                request
                    .title
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| format!("Proposal v{}", version)),
            )),
            status: Set(status.to_string()),
            reviewer_id: Set(request.reviewer_id),
            review_submitted_at: Set(request.reviewer_id.map(|_| now)),
            link: Set(request.link.clone()),
            attachments_manifest: Set(manifest(&keys)),
            created_by: Set(Some(user.user_id)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 3. Métadonnées des pièces jointes
        for attachment in &request.attachments {
            insert_metadata(&txn, user.user_id, proposal.id, attachment).await?;
        }

        // 4. Opportunité + historique
        let mut active: opportunities::ActiveModel = opportunity.clone().into();
        active.status = Set(OpportunityStatus::ProposalDrafting.to_string());
        active.updated_at = Set(Some(now));
        active.update(&txn).await?;

        record_history(
            &txn,
            opportunity.id,
            Some(proposal.id),
            "PROPOSAL_CREATED",
            &format!("Proposal Draft v{} created by {}", version, user.display_name()),
            keys.first().cloned().or(request.link),
            user.user_id,
        )
        .await?;

        txn.commit().await?;
        tracing::info!(proposal_id = proposal.id, opportunity_id = %opportunity.opportunity_id, version, "Proposal created");
        Ok(ProposalDto::from(proposal))
    }

    pub async fn update(
        db: &DatabaseConnection,
        user: &AuthUser,
        proposal_id: i32,
        request: UpdateProposalRequest,
    ) -> AppResult<ProposalDto> {
        let proposal = find_proposal(db, proposal_id).await?;
        let opportunity = opportunity_of(db, user, &proposal).await?;

        if !proposal.can_edit() {
            return Err(AppError::bad_request(
                "Only draft proposals that have not been submitted for review can be edited",
            ));
        }
        if let Some(attachments) = &request.attachments {
            check_attachments(attachments)?;
        }

        let now = time::now_jst();
        let txn = db.begin().await?;
        let previous_keys = proposal.attachment_keys();

        let mut active: proposals::ActiveModel = proposal.into();
        if let Some(title) = request.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            active.title = Set(Some(title));
        }
        if let Some(link) = request.link {
            active.link = Set(Some(link));
        }
        if let Some(attachments) = &request.attachments {
            let keys: Vec<String> = attachments.iter().map(|a| a.s3_key.clone()).collect();
            active.attachments_manifest = Set(manifest(&keys));
        }
        active.updated_at = Set(Some(now));
        let proposal = active.update(&txn).await?;

        // Nouvelles pièces jointes uniquement
        for attachment in request.attachments.iter().flatten() {
            if !previous_keys.contains(&attachment.s3_key) {
                insert_metadata(&txn, user.user_id, proposal.id, attachment).await?;
            }
        }

        record_history(
            &txn,
            opportunity.id,
            Some(proposal.id),
            "PROPOSAL_UPDATED",
            &format!("Proposal Draft v{} updated by {}", proposal.version, user.display_name()),
            None,
            user.user_id,
        )
        .await?;

        txn.commit().await?;
        Ok(ProposalDto::from(proposal))
    }

    pub async fn assign_reviewer(
        db: &DatabaseConnection,
        user: &AuthUser,
        proposal_id: i32,
        request: AssignReviewerRequest,
    ) -> AppResult<ProposalDto> {
        let proposal = find_proposal(db, proposal_id).await?;
        let opportunity = opportunity_of(db, user, &proposal).await?;
        let reviewer = ensure_sales_manager(db, request.reviewer_id).await?;

        let status = proposal.status.parse::<ProposalStatus>().map_err(AppError::internal)?;
        if !matches!(status, ProposalStatus::Draft | ProposalStatus::InternalReview) {
            return Err(AppError::bad_request("Reviewer can only be assigned to a draft proposal"));
        }

        let now = time::now_jst();
        let txn = db.begin().await?;

        let mut active: proposals::ActiveModel = proposal.into();
        active.reviewer_id = Set(Some(reviewer.id));
        active.status = Set(ProposalStatus::InternalReview.to_string());
        active.review_submitted_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let proposal = active.update(&txn).await?;

        record_history(
            &txn,
            opportunity.id,
            Some(proposal.id),
            "REVIEW_REQUESTED",
            &format!(
                "Proposal v{} submitted for review to {}",
                proposal.version,
                reviewer.full_name.as_deref().unwrap_or(&reviewer.email)
            ),
            None,
            user.user_id,
        )
        .await?;

        txn.commit().await?;
        Ok(ProposalDto::from(proposal))
    }

    pub async fn submit_review(
        db: &DatabaseConnection,
        user: &AuthUser,
        proposal_id: i32,
        request: SubmitReviewRequest,
    ) -> AppResult<ProposalDto> {
        user.require_sales()?;
        let proposal = find_proposal(db, proposal_id).await?;

        // 1. Reviewer désigné uniquement
        if proposal.reviewer_id != Some(user.user_id) {
            return Err(AppError::forbidden("Access denied. Only assigned reviewer can submit review"));
        }
        if proposal.status != ProposalStatus::InternalReview.as_str() {
            return Err(AppError::bad_request("Proposal is not under internal review"));
        }
        let action = ReviewAction::parse(&request.action).ok_or_else(|| {
            AppError::bad_request("Invalid review action. Must be APPROVE, REQUEST_REVISION or REJECT")
        })?;

        let now = time::now_jst();
        let new_status = action.resulting_status();
        let txn = db.begin().await?;

        // 2. Proposition
        let mut active: proposals::ActiveModel = proposal.into();
        active.status = Set(new_status.to_string());
        active.review_action = Set(Some(action.as_str().to_string()));
        active.review_notes = Set(request.notes.clone());
        active.review_submitted_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let proposal = active.update(&txn).await?;

        // 3. Opportunité et contact suivent la proposition courante
        if let Some(opportunity_id) = proposal.opportunity_id.filter(|_| action != ReviewAction::Reject) {
            if let Some(opportunity) = opportunities::Entity::find_by_id(opportunity_id).one(&txn).await? {
                let mut active: opportunities::ActiveModel = opportunity.into();
                active.status = Set(OpportunityStatus::from_current_proposal(Some(new_status.as_str())).to_string());
                active.updated_at = Set(Some(now));
                active.update(&txn).await?;
            }
        }
        if action == ReviewAction::Approve {
            if let Some(contact) = match proposal.contact_id {
                Some(id) => contacts::Entity::find_by_id(id).one(&txn).await?,
                None => None,
            } {
                let mut active: contacts::ActiveModel = contact.into();
                active.proposal_link = Set(proposal.link.clone().or_else(|| proposal.attachment_keys().into_iter().next()));
                active.proposal_status = Set(Some(proposal_status_to_contact_label(new_status.as_str()).to_string()));
                active.updated_at = Set(Some(now));
                active.update(&txn).await?;
            }
        }

        if let Some(opportunity_id) = proposal.opportunity_id {
            record_history(
                &txn,
                opportunity_id,
                Some(proposal.id),
                "REVIEW_SUBMITTED",
                &format!(
                    "Proposal v{} reviewed by {}: {}",
                    proposal.version,
                    user.display_name(),
                    action.as_str()
                ),
                None,
                user.user_id,
            )
            .await?;
        }

        txn.commit().await?;
        tracing::info!(proposal_id = proposal.id, action = action.as_str(), "Proposal review submitted");
        Ok(ProposalDto::from(proposal))
    }
}

async fn find_proposal(db: &DatabaseConnection, proposal_id: i32) -> AppResult<proposals::Model> {
    proposals::Entity::find_by_id(proposal_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Proposal not found"))
}

async fn opportunity_of(
    db: &DatabaseConnection,
    user: &AuthUser,
    proposal: &proposals::Model,
) -> AppResult<opportunities::Model> {
    let opportunity_id = proposal
        .opportunity_id
        .ok_or_else(|| AppError::bad_request("Proposal is not linked to an opportunity"))?;
    OpportunityService::find_accessible(db, user, &opportunity_id.to_string()).await
}

async fn ensure_sales_manager(db: &DatabaseConnection, reviewer_id: i32) -> AppResult<users::Model> {
    users::Entity::find_by_id(reviewer_id)
        .one(db)
        .await?
        .filter(|u| u.is_active && u.role.as_deref() == Some(ROLE_SALES_MANAGER))
        .ok_or_else(|| AppError::bad_request("Reviewer must be a Sales Manager"))
}

fn check_attachments(attachments: &[AttachmentRef]) -> AppResult<()> {
    if let Some(bad) = attachments.iter().find(|a| !is_pdf_file_name(&a.file_name)) {
        return Err(AppError::bad_request(format!(
            "Only PDF files are allowed: {}",
            bad.file_name
        )));
    }
    Ok(())
}

fn manifest(keys: &[String]) -> Option<String> {
    if keys.is_empty() {
        None
    } else {
        serde_json::to_string(keys).ok()
    }
}

async fn insert_metadata<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
    proposal_id: i32,
    attachment: &AttachmentRef,
) -> Result<(), DbErr> {
    let now = time::now_jst();
    document_metadata::ActiveModel {
        s3_key: Set(attachment.s3_key.clone()),
        owner_id: Set(Some(owner_id)),
        document_type: Set(Some("proposal".to_string())),
        entity_id: Set(Some(proposal_id)),
        entity_type: Set(Some("proposal".to_string())),
        allowed_roles: Set(serde_json::to_string(&SALES_DOCUMENT_ROLES).ok()),
        allowed_users: Set(None),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::ROLE_SALES_REP;

    fn manager(id: i32) -> AuthUser {
        AuthUser {
            user_id: id,
            email: "manager@skillbridge.jp".to_string(),
            full_name: Some("Hanako Sato".to_string()),
            role: ROLE_SALES_MANAGER.to_string(),
        }
    }

    fn proposal(status: &str, reviewer: Option<i32>) -> proposals::Model {
        proposals::Model {
            id: 11,
            contact_id: Some(3),
            opportunity_id: Some(7),
            version: 2,
            is_current: true,
            title: Some("Proposal v2".to_string()),
            status: status.to_string(),
            reviewer_id: reviewer,
            review_notes: None,
            review_action: None,
            review_submitted_at: None,
            link: None,
            attachments_manifest: None,
            client_feedback: None,
            created_by: Some(8),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_review_action_mapping() {
        assert_eq!(ReviewAction::parse("approve"), Some(ReviewAction::Approve));
        assert_eq!(ReviewAction::Approve.resulting_status(), ProposalStatus::SentToClient);
        assert_eq!(ReviewAction::RequestRevision.resulting_status(), ProposalStatus::RevisionRequested);
        assert_eq!(ReviewAction::Reject.resulting_status(), ProposalStatus::Rejected);
        assert_eq!(ReviewAction::parse("LGTM"), None);
    }

    #[test]
    fn test_only_pdf_attachments() {
        let ok = AttachmentRef {
            s3_key: "proposals/a.pdf".to_string(),
            file_name: "Proposal.PDF".to_string(),
        };
        let bad = AttachmentRef {
            s3_key: "proposals/b.docx".to_string(),
            file_name: "notes.docx".to_string(),
        };
        assert!(check_attachments(&[ok.clone()]).is_ok());
        assert!(matches!(check_attachments(&[ok, bad]), Err(AppError::BadRequest(msg)) if msg.contains("notes.docx")));
    }

    #[test]
    fn test_manifest() {
        assert_eq!(manifest(&[]), None);
        assert_eq!(manifest(&["proposals/a.pdf".to_string()]).as_deref(), Some(r#"["proposals/a.pdf"]"#));
    }

    #[tokio::test]
    async fn test_review_by_non_reviewer_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![proposal("internal_review", Some(2))]])
            .into_connection();

        let request = SubmitReviewRequest {
            action: "APPROVE".to_string(),
            notes: None,
        };
        let err = SalesProposalService::submit_review(&db, &manager(1), 11, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg == "Access denied. Only assigned reviewer can submit review"));
    }

    #[tokio::test]
    async fn test_review_needs_internal_review_status() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![proposal("draft", Some(1))]])
            .into_connection();

        let request = SubmitReviewRequest {
            action: "APPROVE".to_string(),
            notes: None,
        };
        let err = SalesProposalService::submit_review(&db, &manager(1), 11, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_reviewer_must_be_manager() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![users::Model {
                id: 4,
                email: "rep@skillbridge.jp".to_string(),
                password: None,
                full_name: None,
                company_name: None,
                phone: None,
                role: Some(ROLE_SALES_REP.to_string()),
                is_active: true,
                created_at: None,
                updated_at: None,
            }]])
            .into_connection();

        let err = ensure_sales_manager(&db, 4).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Reviewer must be a Sales Manager"));
    }
}
