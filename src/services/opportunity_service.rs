// ============================================================================
// SERVICE : OPPORTUNITÉS
// ============================================================================
//
// Workflow:
//   contact -> create_from_contact (OP-YYYY-NN, NEW, 0 JPY)
//           -> propositions (voir sales_proposal_service)
//           -> convert_to_contract (WON + MSA en Draft)
//           ou mark_lost (LOST)
//
// Accès:
//   - SALES_REP     : opportunités qu'il a créées ou qui lui sont assignées
//   - SALES_MANAGER : toutes
//
// ============================================================================

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::contract_status::ContractStatus;
use crate::models::dto::common::{clean_search, split_list, Paging};
use crate::models::dto::opportunity::{
    ConvertToContractResponse, OpportunityDetail, OpportunityListItem, OpportunityListQuery,
    OpportunityListResponse, UpdateOpportunityRequest,
};
use crate::models::dto::proposal::{ProposalDto, ProposalHistoryDto};
use crate::models::{contacts, msa_contracts, opportunities, proposal_history, proposals, users};
use crate::services::contact_service::record_status_change;
use crate::utils::format::{format_date, format_received_at};
use crate::utils::identifiers::{msa_display_id, opportunity_id};
use crate::utils::query::ci_contains;
use crate::utils::status::{opportunity_stage, OpportunityStatus, ProposalStatus};
use crate::utils::validation::validate_opportunity;
use crate::utils::time;

pub const DEFAULT_CURRENCY: &str = "JPY";
pub const REVIEW_ACTION_APPROVE: &str = "APPROVE";

pub struct OpportunityService;

impl OpportunityService {
    pub async fn list(
        db: &DatabaseConnection,
        user: &AuthUser,
        query: &OpportunityListQuery,
    ) -> AppResult<OpportunityListResponse> {
        user.require_sales()?;
        let paging = Paging::new(query.page, query.size);

        let mut select = opportunities::Entity::find();

        // 1. Périmètre
        if user.is_sales_rep() {
            select = select.filter(
                Condition::any()
                    .add(opportunities::Column::CreatedBy.eq(user.user_id))
                    .add(opportunities::Column::AssigneeUserId.eq(user.user_id)),
            );
        } else {
            if let Some(created_by) = query.created_by {
                select = select.filter(opportunities::Column::CreatedBy.eq(created_by));
            }
            if let Some(assignee) = query.assignee_user_id {
                select = select.filter(opportunities::Column::AssigneeUserId.eq(assignee));
            }
        }

        // 2. Filtres
        let statuses: Vec<String> = split_list(query.status.as_deref())
            .into_iter()
            .map(|s| s.to_uppercase())
            .collect();
        if !statuses.is_empty() {
            select = select.filter(opportunities::Column::Status.is_in(statuses));
        }
        if let Some(search) = clean_search(query.search.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(ci_contains((opportunities::Entity, opportunities::Column::OpportunityId), &search))
                    .add(ci_contains((opportunities::Entity, opportunities::Column::ClientName), &search))
                    .add(ci_contains((opportunities::Entity, opportunities::Column::ClientEmail), &search)),
            );
        }

        let paginator = select
            .order_by_desc(opportunities::Column::CreatedAt)
            .order_by_desc(opportunities::Column::Id)
            .paginate(db, paging.size);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(paging.page).await?;

        let opportunities = rows
            .into_iter()
            .enumerate()
            .map(|(i, o)| OpportunityListItem {
                no: paging.row_number(i),
                stage: opportunity_stage(&o.status).to_string(),
                created_on: format_date(o.created_at),
                id: o.id,
                opportunity_id: o.opportunity_id,
                client_name: o.client_name,
                client_email: o.client_email,
                client_company: o.client_company,
                est_value: o.est_value,
                currency: o.currency,
                probability: o.probability,
                status: o.status,
                assignee_user_id: o.assignee_user_id,
                created_by: o.created_by,
            })
            .collect();

        Ok(OpportunityListResponse {
            opportunities,
            page: paging.page,
            page_size: paging.size,
            total_pages: totals.number_of_pages,
            total: totals.number_of_items,
        })
    }

    /// Convertit un contact en opportunité
    pub async fn create_from_contact(
        db: &DatabaseConnection,
        user: &AuthUser,
        contact_id: i32,
    ) -> AppResult<OpportunityDetail> {
        user.require_sales()?;
        let txn = db.begin().await?;

        // 1. Contact + droits
        let contact = contacts::Entity::find_by_id(contact_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Contact not found"))?;
        if user.is_sales_rep() && contact.assignee_user_id != Some(user.user_id) {
            return Err(AppError::forbidden(
                "Access denied. Only the assigned Sales Rep can convert this contact",
            ));
        }

        let existing = opportunities::Entity::find()
            .filter(opportunities::Column::ContactId.eq(contact.id))
            .count(&txn)
            .await?;
        if existing > 0 {
            return Err(AppError::Conflict("An opportunity already exists for this contact".to_string()));
        }

        // 2. Identifiant OP-YYYY-NN
        let now = time::now_jst();
        let year = now.year();
        let created_this_year = count_created_in_year(&txn, year).await?;
        let code = opportunity_id(year, created_this_year);

        // 3. Données client recopiées depuis le compte
        let client = match contact.client_user_id {
            Some(id) => users::Entity::find_by_id(id).one(&txn).await?,
            None => None,
        };

        let opportunity = opportunities::ActiveModel {
            opportunity_id: Set(code.clone()),
            contact_id: Set(Some(contact.id)),
            est_value: Set(Decimal::ZERO),
            currency: Set(DEFAULT_CURRENCY.to_string()),
            probability: Set(0),
            client_email: Set(client.as_ref().map(|c| c.email.clone())),
            client_name: Set(client.as_ref().and_then(|c| c.full_name.clone())),
            client_company: Set(client.and_then(|c| c.company_name)),
            status: Set(OpportunityStatus::New.to_string()),
            assignee_user_id: Set(contact.assignee_user_id.or(Some(user.user_id))),
            created_by: Set(Some(user.user_id)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 4. Contact converti
        let previous = contact.status.clone();
        let mut active: contacts::ActiveModel = contact.into();
        active.status = Set(Some(contacts::STATUS_CONVERTED.to_string()));
        active.updated_at = Set(Some(now));
        let contact = active.update(&txn).await?;
        record_status_change(&txn, contact.id, previous.as_deref(), contacts::STATUS_CONVERTED, Some(user.user_id))
            .await?;

        record_history(
            &txn,
            opportunity.id,
            None,
            "OPPORTUNITY_CREATED",
            &format!("Opportunity {} created by {}", code, user.display_name()),
            None,
            user.user_id,
        )
        .await?;

        txn.commit().await?;
        tracing::info!(opportunity_id = %code, contact_id, "Opportunity created from contact");
        Self::to_detail(db, opportunity).await
    }

    /// Accepte l'id numérique ou le code OP-YYYY-NN
    pub async fn get(db: &DatabaseConnection, user: &AuthUser, id_or_code: &str) -> AppResult<OpportunityDetail> {
        let opportunity = Self::find_accessible(db, user, id_or_code).await?;
        Self::to_detail(db, opportunity).await
    }

    pub async fn update(
        db: &DatabaseConnection,
        user: &AuthUser,
        id_or_code: &str,
        request: UpdateOpportunityRequest,
    ) -> AppResult<OpportunityDetail> {
        validate_opportunity(&request)?;
        let opportunity = Self::find_accessible(db, user, id_or_code).await?;

        if request.assignee_user_id.is_some()
            && request.assignee_user_id != opportunity.assignee_user_id
            && !user.is_sales_manager()
        {
            return Err(AppError::forbidden("Access denied. Only Sales Manager can reassign opportunities"));
        }

        let mut active: opportunities::ActiveModel = opportunity.into();
        active.client_name = Set(Some(request.client_name.trim().to_string()));
        active.client_company = Set(request.client_company.map(|c| c.trim().to_string()));
        active.client_email = Set(Some(request.client_email.trim().to_string()));
        active.probability = Set(request.probability);
        active.est_value = Set(request.est_value);
        active.currency = Set(request.currency);
        if let Some(assignee) = request.assignee_user_id {
            active.assignee_user_id = Set(Some(assignee));
        }
        active.updated_at = Set(Some(time::now_jst()));
        let opportunity = active.update(db).await?;

        Self::to_detail(db, opportunity).await
    }

    pub async fn mark_lost(db: &DatabaseConnection, user: &AuthUser, id_or_code: &str) -> AppResult<OpportunityDetail> {
        let opportunity = Self::find_accessible(db, user, id_or_code).await?;
        if opportunity.status == OpportunityStatus::Won.as_str() {
            return Err(AppError::bad_request("A won opportunity cannot be marked as lost"));
        }

        let txn = db.begin().await?;
        let mut active: opportunities::ActiveModel = opportunity.into();
        active.status = Set(OpportunityStatus::Lost.to_string());
        active.updated_at = Set(Some(time::now_jst()));
        let opportunity = active.update(&txn).await?;

        record_history(
            &txn,
            opportunity.id,
            None,
            "OPPORTUNITY_LOST",
            &format!("Opportunity marked as lost by {}", user.display_name()),
            None,
            user.user_id,
        )
        .await?;
        txn.commit().await?;

        Self::to_detail(db, opportunity).await
    }

    /// Opportunité gagnée -> contrat MSA en brouillon
    pub async fn convert_to_contract(
        db: &DatabaseConnection,
        user: &AuthUser,
        id_or_code: &str,
    ) -> AppResult<ConvertToContractResponse> {
        let txn = db.begin().await?;
        let opportunity = Self::find_accessible(&txn, user, id_or_code).await?;

        // 1. Proposition approuvée par le client après revue APPROVE
        let proposal = proposals::Entity::find()
            .filter(proposals::Column::OpportunityId.eq(opportunity.id))
            .filter(proposals::Column::Status.eq(ProposalStatus::Approved.as_str()))
            .filter(proposals::Column::ReviewAction.eq(REVIEW_ACTION_APPROVE))
            .order_by_desc(proposals::Column::Version)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::bad_request("No approved proposal found. Cannot convert to contract"))?;

        // 2. Client du contrat
        let contact = match opportunity.contact_id {
            Some(id) => contacts::Entity::find_by_id(id).one(&txn).await?,
            None => None,
        };
        let client_id = contact
            .and_then(|c| c.client_user_id)
            .ok_or_else(|| AppError::bad_request("Opportunity has no client account"))?;

        let now = time::now_jst();

        // 3. Statuts
        let mut active: proposals::ActiveModel = proposal.into();
        active.status = Set(ProposalStatus::ConvertedToContract.to_string());
        active.updated_at = Set(Some(now));
        let proposal = active.update(&txn).await?;

        let contract_name = format!(
            "MSA - {}",
            opportunity
                .client_company
                .clone()
                .or_else(|| opportunity.client_name.clone())
                .unwrap_or_else(|| opportunity.opportunity_id.clone())
        );
        let code = opportunity.opportunity_id.clone();
        let mut active: opportunities::ActiveModel = opportunity.into();
        active.status = Set(OpportunityStatus::Won.to_string());
        active.updated_at = Set(Some(now));
        let opportunity = active.update(&txn).await?;

        // 4. Contrat cadre
        let msa = msa_contracts::ActiveModel {
            client_id: Set(client_id),
            opportunity_id: Set(Some(opportunity.id)),
            contract_name: Set(contract_name),
            status: Set(ContractStatus::Draft),
            value: Set(Some(opportunity.est_value)),
            currency: Set(Some(opportunity.currency.clone())),
            assignee_user_id: Set(opportunity.assignee_user_id),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        let contract_id = msa_display_id(msa.id, msa.created_at);

        record_history(
            &txn,
            opportunity.id,
            Some(proposal.id),
            "CONVERTED_TO_CONTRACT",
            &format!("Converted to contract {} by {}", contract_id, user.display_name()),
            None,
            user.user_id,
        )
        .await?;

        txn.commit().await?;
        tracing::info!(opportunity_id = %code, msa_id = msa.id, "Opportunity converted to contract");

        Ok(ConvertToContractResponse {
            success: true,
            message: "Opportunity converted to contract successfully".to_string(),
            opportunity_id: code,
            msa_contract_id: msa.id,
            contract_id,
        })
    }

    /// Opportunité visible par l'utilisateur sales
    pub async fn find_accessible<C: ConnectionTrait>(
        conn: &C,
        user: &AuthUser,
        id_or_code: &str,
    ) -> AppResult<opportunities::Model> {
        user.require_sales()?;
        let id_or_code = id_or_code.trim();
        let select = match id_or_code.parse::<i32>() {
            Ok(id) => opportunities::Entity::find_by_id(id),
            Err(_) => opportunities::Entity::find().filter(opportunities::Column::OpportunityId.eq(id_or_code)),
        };
        let opportunity = select
            .one(conn)
            .await?
            .ok_or_else(|| AppError::not_found("Opportunity not found"))?;

        if user.is_sales_rep()
            && opportunity.created_by != Some(user.user_id)
            && opportunity.assignee_user_id != Some(user.user_id)
        {
            return Err(AppError::forbidden("Access denied. You can only access your own opportunities"));
        }
        Ok(opportunity)
    }

    async fn to_detail(db: &DatabaseConnection, opportunity: opportunities::Model) -> AppResult<OpportunityDetail> {
        let proposals: Vec<ProposalDto> = proposals::Entity::find()
            .filter(proposals::Column::OpportunityId.eq(opportunity.id))
            .order_by_desc(proposals::Column::Version)
            .all(db)
            .await?
            .into_iter()
            .map(ProposalDto::from)
            .collect();

        let history = proposal_history::Entity::find()
            .filter(proposal_history::Column::OpportunityId.eq(opportunity.id))
            .order_by_desc(proposal_history::Column::CreatedAt)
            .order_by_desc(proposal_history::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|h| ProposalHistoryDto {
                id: h.id,
                proposal_id: h.proposal_id,
                activity_type: h.activity_type,
                activity_description: h.activity_description,
                file_link: h.file_link,
                created_by: h.created_by,
                date: format_received_at(h.created_at),
            })
            .collect();

        let (current, proposals): (Vec<ProposalDto>, Vec<ProposalDto>) =
            proposals.into_iter().partition(|p| p.is_current);

        Ok(OpportunityDetail {
            stage: opportunity_stage(&opportunity.status).to_string(),
            id: opportunity.id,
            opportunity_id: opportunity.opportunity_id,
            contact_id: opportunity.contact_id,
            client_name: opportunity.client_name,
            client_email: opportunity.client_email,
            client_company: opportunity.client_company,
            est_value: opportunity.est_value,
            currency: opportunity.currency,
            probability: opportunity.probability,
            status: opportunity.status,
            assignee_user_id: opportunity.assignee_user_id,
            created_by: opportunity.created_by,
            created_at: opportunity.created_at,
            current_proposal: current.into_iter().next(),
            proposals,
            history,
        })
    }
}

async fn count_created_in_year<C: ConnectionTrait>(conn: &C, year: i32) -> Result<u64, DbErr> {
    let (Some(start), Some(end)) = (NaiveDate::from_ymd_opt(year, 1, 1), NaiveDate::from_ymd_opt(year + 1, 1, 1))
    else {
        return Ok(0);
    };
    opportunities::Entity::find()
        .filter(opportunities::Column::CreatedAt.gte(start.and_time(Default::default())))
        .filter(opportunities::Column::CreatedAt.lt(end.and_time(Default::default())))
        .count(conn)
        .await
}

/// Ajoute une entrée à l'historique de l'opportunité
pub async fn record_history<C: ConnectionTrait>(
    conn: &C,
    opportunity_id: i32,
    proposal_id: Option<i32>,
    activity_type: &str,
    description: &str,
    file_link: Option<String>,
    created_by: i32,
) -> Result<(), DbErr> {
    proposal_history::ActiveModel {
        opportunity_id: Set(opportunity_id),
        proposal_id: Set(proposal_id),
        activity_type: Set(activity_type.to_string()),
        activity_description: Set(description.to_string()),
        file_link: Set(file_link),
        created_by: Set(Some(created_by)),
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
    use crate::models::users::{ROLE_SALES_MANAGER, ROLE_SALES_REP};

    fn sales(id: i32, role: &str) -> AuthUser {
        AuthUser {
            user_id: id,
            email: format!("user{}@skillbridge.jp", id),
            full_name: None,
            role: role.to_string(),
        }
    }

    fn opportunity(created_by: i32, assignee: Option<i32>, status: &str) -> opportunities::Model {
        opportunities::Model {
            id: 7,
            opportunity_id: "OP-2025-03".to_string(),
            contact_id: Some(3),
            est_value: Decimal::new(1_500_000, 0),
            currency: "JPY".to_string(),
            probability: 40,
            client_email: Some("taro@acme.jp".to_string()),
            client_name: Some("Taro Yamada".to_string()),
            client_company: Some("Acme KK".to_string()),
            status: status.to_string(),
            assignee_user_id: assignee,
            created_by: Some(created_by),
            created_at: None,
            updated_at: None,
        }
    }

    fn update_request(currency: &str) -> UpdateOpportunityRequest {
        UpdateOpportunityRequest {
            client_name: "Taro Yamada".to_string(),
            client_company: Some("Acme KK".to_string()),
            client_email: "taro@acme.jp".to_string(),
            probability: 50,
            est_value: Decimal::new(2_000_000, 0),
            currency: currency.to_string(),
            assignee_user_id: None,
        }
    }

    #[tokio::test]
    async fn test_rep_cannot_open_foreign_opportunity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![opportunity(2, Some(3), "NEW")]])
            .into_connection();

        let err = OpportunityService::get(&db, &sales(8, ROLE_SALES_REP), "OP-2025-03")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_unknown_opportunity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<opportunities::Model>::new()])
            .into_connection();

        let err = OpportunityService::get(&db, &sales(1, ROLE_SALES_MANAGER), "42")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Opportunity not found"));
    }

    #[tokio::test]
    async fn test_update_rejects_lowercase_currency() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = OpportunityService::update(&db, &sales(1, ROLE_SALES_MANAGER), "7", update_request("jpy"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Currency")));
    }

    #[tokio::test]
    async fn test_convert_requires_approved_proposal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![opportunity(1, Some(1), "CLIENT_UNDER_REVIEW")]])
            .append_query_results([Vec::<proposals::Model>::new()])
            .into_connection();

        let err = OpportunityService::convert_to_contract(&db, &sales(1, ROLE_SALES_MANAGER), "7")
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::BadRequest(msg) if msg == "No approved proposal found. Cannot convert to contract")
        );
    }

    #[tokio::test]
    async fn test_won_opportunity_cannot_be_lost() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![opportunity(1, None, "WON")]])
            .into_connection();

        let err = OpportunityService::mark_lost(&db, &sales(1, ROLE_SALES_MANAGER), "7")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
