// ============================================================================
// SERVICE : CONTRATS CÔTÉ SALES (MSA + SOW)
// ============================================================================
//
// Cycle de vie:
//   Draft --(revue APPROVE)--> Under_Review --(signature client)--> Active
//         <--(REQUEST_REVISION)--
//   Request_for_Change (demande du client) se corrige comme un Draft.
//
// Accès:
//   - SALES_REP     : contrats qui lui sont assignés
//   - SALES_MANAGER : tous, et seul à pouvoir faire la revue interne
//
// Un SOW hérite du client et de la devise de son MSA parent, qui doit
// être Active ou Under_Review.
//
// ============================================================================

use chrono::NaiveDate;
use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::contract_status::ContractStatus;
use crate::models::dto::contract::{
    ContractDetail, ContractReviewRequest, MsaContractRequest, SalesContractDetail, SalesContractResponse, SowContractRequest,
};
use crate::models::{change_requests, msa_contracts, opportunities, proposals, sow_contracts, users};
use crate::services::contract_service::{msa_detail, sow_detail};
use crate::services::opportunity_service::{DEFAULT_CURRENCY, REVIEW_ACTION_APPROVE};
use crate::utils::identifiers::{msa_display_id, sow_display_id};
use crate::utils::status::ProposalStatus;
use crate::utils::time;
use crate::utils::validation::is_currency_code;

pub const REVIEW_ACTION_REQUEST_REVISION: &str = "REQUEST_REVISION";
pub const ENGAGEMENT_FIXED_PRICE: &str = "Fixed Price";
pub const ENGAGEMENT_RETAINER: &str = "Retainer";

const CONTRACT_NOT_FOUND: &str = "Contract not found";

pub struct SalesContractService;

impl SalesContractService {
    // ---- MSA ----

    pub async fn create_msa(
        db: &DatabaseConnection,
        user: &AuthUser,
        request: MsaContractRequest,
    ) -> AppResult<SalesContractResponse> {
        user.require_sales()?;
        check_period(request.effective_start, request.effective_end)?;
        let currency = check_currency(request.currency.as_deref())?;

        // 1. Client, nom du contrat et responsable
        let parties = resolve_msa_parties(db, &request).await?;
        check_assignee(db, request.assignee_user_id).await?;

        // 2. Toujours créé en Draft
        let now = time::now_jst();
        let msa = msa_contracts::ActiveModel {
            client_id: Set(parties.client_id),
            opportunity_id: Set(parties.opportunity_id),
            contract_name: Set(parties.contract_name),
            status: Set(ContractStatus::Draft),
            period_start: Set(Some(request.effective_start)),
            period_end: Set(Some(request.effective_end)),
            value: Set(request.value),
            currency: Set(Some(currency)),
            assignee_user_id: Set(Some(request.assignee_user_id)),
            link: Set(request.link),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(user_id = user.user_id, msa_id = msa.id, "MSA contract created");
        Ok(msa_response(&msa))
    }

    pub async fn get_msa(db: &DatabaseConnection, user: &AuthUser, id: i32) -> AppResult<SalesContractDetail> {
        let msa = find_msa(db, user, id, "view").await?;
        let client = users::Entity::find_by_id(msa.client_id).one(db).await?;
        let opportunity_code = match msa.opportunity_id {
            Some(opportunity_id) => opportunities::Entity::find_by_id(opportunity_id)
                .one(db)
                .await?
                .map(|o| o.opportunity_id),
            None => None,
        };
        let crs = change_requests::Entity::find()
            .filter(change_requests::Column::MsaContractId.eq(msa.id))
            .order_by_desc(change_requests::Column::CreatedAt)
            .all(db)
            .await?;

        let (client_id, period_start, period_end) = (msa.client_id, msa.period_start, msa.period_end);
        Ok(detail(msa_detail(msa, crs), client_id, client, opportunity_code, period_start, period_end))
    }

    /// Modifiable seulement en Draft ou Request_for_Change
    pub async fn update_msa(
        db: &DatabaseConnection,
        user: &AuthUser,
        id: i32,
        request: MsaContractRequest,
    ) -> AppResult<SalesContractResponse> {
        let msa = find_msa(db, user, id, "update").await?;
        check_editable(msa.status)?;
        check_period(request.effective_start, request.effective_end)?;
        let currency = check_currency(request.currency.as_deref())?;

        let parties = resolve_msa_parties(db, &request).await?;
        check_assignee(db, request.assignee_user_id).await?;

        let mut active: msa_contracts::ActiveModel = msa.into();
        active.client_id = Set(parties.client_id);
        active.opportunity_id = Set(parties.opportunity_id);
        active.contract_name = Set(parties.contract_name);
        active.period_start = Set(Some(request.effective_start));
        active.period_end = Set(Some(request.effective_end));
        active.value = Set(request.value);
        active.currency = Set(Some(currency));
        active.assignee_user_id = Set(Some(request.assignee_user_id));
        if request.link.is_some() {
            active.link = Set(request.link);
        }
        active.updated_at = Set(Some(time::now_jst()));
        let msa = active.update(db).await?;

        Ok(msa_response(&msa))
    }

    pub async fn review_msa(
        db: &DatabaseConnection,
        user: &AuthUser,
        id: i32,
        request: ContractReviewRequest,
    ) -> AppResult<SalesContractResponse> {
        require_reviewer(user)?;
        let msa = find_msa(db, user, id, "review").await?;
        let next = review_transition(msa.status, &request.action)?;

        let mut active: msa_contracts::ActiveModel = msa.into();
        active.status = Set(next);
        active.updated_at = Set(Some(time::now_jst()));
        let msa = active.update(db).await?;

        tracing::info!(
            reviewer_id = user.user_id,
            msa_id = msa.id,
            action = %request.action,
            notes = request.review_notes.as_deref().unwrap_or(""),
            "MSA contract reviewed"
        );
        Ok(msa_response(&msa))
    }

    // ---- SOW ----

    pub async fn create_sow(
        db: &DatabaseConnection,
        user: &AuthUser,
        request: SowContractRequest,
    ) -> AppResult<SalesContractResponse> {
        user.require_sales()?;
        check_period(request.effective_start, request.effective_end)?;
        check_engagement_type(&request.engagement_type)?;

        // 1. MSA parent signé ou chez le client
        let parent = msa_contracts::Entity::find_by_id(request.parent_msa_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Parent MSA not found"))?;
        if !matches!(parent.status, ContractStatus::Active | ContractStatus::UnderReview) {
            return Err(AppError::bad_request(format!(
                "Parent MSA must be Active or Under Review. Current status: {}",
                parent.status.label()
            )));
        }
        check_assignee(db, request.assignee_user_id).await?;

        // 2. Draft rattaché au MSA
        let now = time::now_jst();
        let sow = sow_contracts::ActiveModel {
            client_id: Set(parent.client_id),
            parent_msa_id: Set(Some(parent.id)),
            contract_name: Set(sow_name(request.project_name.as_deref())),
            engagement_type: Set(Some(request.engagement_type)),
            status: Set(ContractStatus::Draft),
            period_start: Set(Some(request.effective_start)),
            period_end: Set(Some(request.effective_end)),
            value: Set(request.value),
            currency: Set(parent.currency.or_else(|| Some(DEFAULT_CURRENCY.to_string()))),
            assignee_user_id: Set(Some(request.assignee_user_id)),
            link: Set(request.link),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(user_id = user.user_id, sow_id = sow.id, msa_id = parent.id, "SOW contract created");
        Ok(sow_response(&sow))
    }

    pub async fn get_sow(db: &DatabaseConnection, user: &AuthUser, id: i32) -> AppResult<SalesContractDetail> {
        let sow = find_sow(db, user, id, "view").await?;
        let client = users::Entity::find_by_id(sow.client_id).one(db).await?;
        let crs = change_requests::Entity::find()
            .filter(change_requests::Column::SowContractId.eq(sow.id))
            .order_by_desc(change_requests::Column::CreatedAt)
            .all(db)
            .await?;

        let (client_id, period_start, period_end) = (sow.client_id, sow.period_start, sow.period_end);
        Ok(detail(sow_detail(sow, crs), client_id, client, None, period_start, period_end))
    }

    /// Le MSA parent et le client ne changent pas
    pub async fn update_sow(
        db: &DatabaseConnection,
        user: &AuthUser,
        id: i32,
        request: SowContractRequest,
    ) -> AppResult<SalesContractResponse> {
        let sow = find_sow(db, user, id, "update").await?;
        check_editable(sow.status)?;
        check_period(request.effective_start, request.effective_end)?;
        check_engagement_type(&request.engagement_type)?;
        if sow.parent_msa_id != Some(request.parent_msa_id) {
            return Err(AppError::bad_request("Parent MSA cannot be changed"));
        }
        check_assignee(db, request.assignee_user_id).await?;

        let mut active: sow_contracts::ActiveModel = sow.into();
        if request.project_name.is_some() {
            active.contract_name = Set(sow_name(request.project_name.as_deref()));
        }
        active.engagement_type = Set(Some(request.engagement_type));
        active.period_start = Set(Some(request.effective_start));
        active.period_end = Set(Some(request.effective_end));
        active.value = Set(request.value);
        active.assignee_user_id = Set(Some(request.assignee_user_id));
        if request.link.is_some() {
            active.link = Set(request.link);
        }
        active.updated_at = Set(Some(time::now_jst()));
        let sow = active.update(db).await?;

        Ok(sow_response(&sow))
    }

    pub async fn review_sow(
        db: &DatabaseConnection,
        user: &AuthUser,
        id: i32,
        request: ContractReviewRequest,
    ) -> AppResult<SalesContractResponse> {
        require_reviewer(user)?;
        let sow = find_sow(db, user, id, "review").await?;
        let next = review_transition(sow.status, &request.action)?;

        let mut active: sow_contracts::ActiveModel = sow.into();
        active.status = Set(next);
        active.updated_at = Set(Some(time::now_jst()));
        let sow = active.update(db).await?;

        tracing::info!(
            reviewer_id = user.user_id,
            sow_id = sow.id,
            action = %request.action,
            notes = request.review_notes.as_deref().unwrap_or(""),
            "SOW contract reviewed"
        );
        Ok(sow_response(&sow))
    }
}

/// Statut après la revue interne
pub fn review_transition(current: ContractStatus, action: &str) -> AppResult<ContractStatus> {
    let action = action.trim();
    if !matches!(
        current,
        ContractStatus::Draft | ContractStatus::UnderReview | ContractStatus::RequestForChange
    ) {
        return Err(AppError::bad_request(format!(
            "Contract cannot be reviewed in status {}",
            current.label()
        )));
    }

    if action.eq_ignore_ascii_case(REVIEW_ACTION_APPROVE) {
        Ok(ContractStatus::UnderReview)
    } else if action.eq_ignore_ascii_case(REVIEW_ACTION_REQUEST_REVISION) {
        Ok(ContractStatus::Draft)
    } else {
        Err(AppError::bad_request(format!("Invalid review action: {}", action)))
    }
}

struct MsaParties {
    client_id: i32,
    opportunity_id: Option<i32>,
    contract_name: String,
}

/// Opportunité (avec proposition approuvée) puis compte client
async fn resolve_msa_parties(db: &DatabaseConnection, request: &MsaContractRequest) -> AppResult<MsaParties> {
    let opportunity = match request.opportunity_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(code) => {
            let opportunity = opportunities::Entity::find()
                .filter(opportunities::Column::OpportunityId.eq(code))
                .one(db)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Opportunity not found: {}", code)))?;
            let approved = proposals::Entity::find()
                .filter(proposals::Column::OpportunityId.eq(opportunity.id))
                .filter(proposals::Column::Status.eq(ProposalStatus::Approved.as_str()))
                .filter(proposals::Column::ReviewAction.eq(REVIEW_ACTION_APPROVE))
                .count(db)
                .await?;
            if approved == 0 {
                return Err(AppError::bad_request("Opportunity must have an approved proposal to create MSA"));
            }
            Some(opportunity)
        }
        None => None,
    };

    // Sans client_id, le compte est retrouvé par l'email de l'opportunité
    let client = match (request.client_id, opportunity.as_ref().and_then(|o| o.client_email.as_deref())) {
        (Some(id), _) => users::Entity::find_by_id(id).one(db).await?,
        (None, Some(email)) => users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?,
        (None, None) => return Err(AppError::bad_request("Client ID is required")),
    };
    let client = client.ok_or_else(|| AppError::bad_request("Client not found"))?;

    let party = opportunity
        .as_ref()
        .and_then(|o| o.client_name.clone())
        .or_else(|| client.full_name.clone())
        .unwrap_or_else(|| client.email.clone());

    Ok(MsaParties {
        client_id: client.id,
        opportunity_id: opportunity.map(|o| o.id),
        contract_name: format!("MSA Contract - {}", party),
    })
}

async fn find_msa(db: &DatabaseConnection, user: &AuthUser, id: i32, verb: &str) -> AppResult<msa_contracts::Model> {
    user.require_sales()?;
    let msa = msa_contracts::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(CONTRACT_NOT_FOUND))?;
    check_assigned(user, msa.assignee_user_id, verb)?;
    Ok(msa)
}

async fn find_sow(db: &DatabaseConnection, user: &AuthUser, id: i32, verb: &str) -> AppResult<sow_contracts::Model> {
    user.require_sales()?;
    let sow = sow_contracts::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(CONTRACT_NOT_FOUND))?;
    check_assigned(user, sow.assignee_user_id, verb)?;
    Ok(sow)
}

fn check_assigned(user: &AuthUser, assignee_user_id: Option<i32>, verb: &str) -> AppResult<()> {
    if user.is_sales_rep() && assignee_user_id != Some(user.user_id) {
        return Err(AppError::forbidden(format!(
            "Access denied: You can only {} contracts assigned to you",
            verb
        )));
    }
    Ok(())
}

fn require_reviewer(user: &AuthUser) -> AppResult<()> {
    if user.is_sales_manager() {
        Ok(())
    } else {
        Err(AppError::forbidden("Only Sales Managers can submit reviews"))
    }
}

fn check_editable(status: ContractStatus) -> AppResult<()> {
    match status {
        ContractStatus::Draft | ContractStatus::RequestForChange => Ok(()),
        other => Err(AppError::bad_request(format!(
            "Contract can only be updated when status is Draft or Request for Change. Current status: {}",
            other.label()
        ))),
    }
}

fn check_period(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if end < start {
        return Err(AppError::Validation(
            "Effective End date must be on or after Effective Start date".to_string(),
        ));
    }
    Ok(())
}

fn check_currency(currency: Option<&str>) -> AppResult<String> {
    match currency.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(DEFAULT_CURRENCY.to_string()),
        Some(c) if is_currency_code(c) => Ok(c.to_string()),
        Some(_) => Err(AppError::Validation("Currency must be a 3-letter uppercase code".to_string())),
    }
}

fn check_engagement_type(engagement_type: &str) -> AppResult<()> {
    if engagement_type == ENGAGEMENT_FIXED_PRICE || engagement_type == ENGAGEMENT_RETAINER {
        Ok(())
    } else {
        Err(AppError::Validation("Engagement type must be Fixed Price or Retainer".to_string()))
    }
}

async fn check_assignee(db: &DatabaseConnection, assignee_user_id: i32) -> AppResult<()> {
    let assignee = users::Entity::find_by_id(assignee_user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::bad_request("Assignee not found"))?;
    if !matches!(assignee.role_or_default(), users::ROLE_SALES_MANAGER | users::ROLE_SALES_REP) {
        return Err(AppError::bad_request("Assignee must be a sales user"));
    }
    Ok(())
}

fn sow_name(project_name: Option<&str>) -> String {
    let project = project_name.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("SOW Project");
    format!("SOW Contract - {}", project)
}

fn msa_response(msa: &msa_contracts::Model) -> SalesContractResponse {
    SalesContractResponse {
        id: msa.id,
        contract_id: msa_display_id(msa.id, msa.created_at),
        contract_name: msa.contract_name.clone(),
        status: msa.status.label().to_string(),
    }
}

fn sow_response(sow: &sow_contracts::Model) -> SalesContractResponse {
    SalesContractResponse {
        id: sow.id,
        contract_id: sow_display_id(sow.id, sow.created_at),
        contract_name: sow.contract_name.clone(),
        status: sow.status.label().to_string(),
    }
}

fn detail(
    contract: ContractDetail,
    client_id: i32,
    client: Option<users::Model>,
    opportunity_id: Option<String>,
    period_start: Option<NaiveDate>,
    period_end: Option<NaiveDate>,
) -> SalesContractDetail {
    let (client_name, client_email) = match client {
        Some(c) => (c.full_name.unwrap_or_else(|| "-".to_string()), c.email),
        None => ("-".to_string(), "-".to_string()),
    };
    SalesContractDetail {
        contract,
        client_id,
        client_name,
        client_email,
        opportunity_id,
        period_start,
        period_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{ROLE_CLIENT, ROLE_SALES_MANAGER, ROLE_SALES_REP};
    use rust_decimal::Decimal;

    fn manager() -> AuthUser {
        AuthUser {
            user_id: 2,
            email: "manager@skillbridge.jp".to_string(),
            full_name: Some("Hanako".to_string()),
            role: ROLE_SALES_MANAGER.to_string(),
        }
    }

    fn rep(id: i32) -> AuthUser {
        AuthUser {
            user_id: id,
            email: format!("rep{}@skillbridge.jp", id),
            full_name: None,
            role: ROLE_SALES_REP.to_string(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user(id: i32, role: &str, name: Option<&str>) -> users::Model {
        users::Model {
            id,
            email: format!("user{}@acme.jp", id),
            password: None,
            full_name: name.map(str::to_string),
            company_name: Some("Acme".to_string()),
            phone: None,
            role: Some(role.to_string()),
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn msa(id: i32, status: ContractStatus, assignee: Option<i32>) -> msa_contracts::Model {
        msa_contracts::Model {
            id,
            client_id: 5,
            opportunity_id: None,
            contract_name: "MSA Contract - Taro".to_string(),
            status,
            period_start: Some(day(2025, 4, 1)),
            period_end: Some(day(2026, 3, 31)),
            value: Some(Decimal::new(5_000_000, 0)),
            currency: Some("JPY".to_string()),
            assignee_user_id: assignee,
            link: None,
            created_at: NaiveDate::from_ymd_opt(2025, 3, 20).and_then(|d| d.and_hms_opt(10, 0, 0)),
            updated_at: None,
        }
    }

    fn sow(id: i32, status: ContractStatus) -> sow_contracts::Model {
        sow_contracts::Model {
            id,
            client_id: 5,
            parent_msa_id: Some(1),
            contract_name: "SOW Contract - Mobile app".to_string(),
            engagement_type: Some(ENGAGEMENT_RETAINER.to_string()),
            status,
            period_start: Some(day(2025, 5, 1)),
            period_end: Some(day(2025, 10, 31)),
            value: None,
            currency: Some("JPY".to_string()),
            assignee_user_id: Some(8),
            link: None,
            created_at: NaiveDate::from_ymd_opt(2025, 4, 2).and_then(|d| d.and_hms_opt(10, 0, 0)),
            updated_at: None,
        }
    }

    fn msa_request() -> MsaContractRequest {
        MsaContractRequest {
            opportunity_id: None,
            client_id: Some(5),
            effective_start: day(2025, 4, 1),
            effective_end: day(2026, 3, 31),
            assignee_user_id: 8,
            value: Some(Decimal::new(5_000_000, 0)),
            currency: None,
            link: None,
        }
    }

    fn sow_request() -> SowContractRequest {
        SowContractRequest {
            parent_msa_id: 1,
            project_name: Some("Mobile app".to_string()),
            engagement_type: ENGAGEMENT_RETAINER.to_string(),
            effective_start: day(2025, 5, 1),
            effective_end: day(2025, 10, 31),
            assignee_user_id: 8,
            value: None,
            link: None,
        }
    }

    fn review(action: &str) -> ContractReviewRequest {
        ContractReviewRequest {
            action: action.to_string(),
            review_notes: Some("Looks good".to_string()),
        }
    }

    #[test]
    fn test_review_transitions() {
        assert_eq!(review_transition(ContractStatus::Draft, "APPROVE").unwrap(), ContractStatus::UnderReview);
        assert_eq!(
            review_transition(ContractStatus::RequestForChange, "approve").unwrap(),
            ContractStatus::UnderReview
        );
        assert_eq!(
            review_transition(ContractStatus::UnderReview, "REQUEST_REVISION").unwrap(),
            ContractStatus::Draft
        );
        assert!(matches!(
            review_transition(ContractStatus::Active, "APPROVE"),
            Err(AppError::BadRequest(msg)) if msg == "Contract cannot be reviewed in status Active"
        ));
        assert!(matches!(review_transition(ContractStatus::Draft, "REJECT"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_period_currency_and_engagement_checks() {
        assert!(check_period(day(2025, 4, 1), day(2025, 4, 1)).is_ok());
        assert!(matches!(
            check_period(day(2025, 4, 2), day(2025, 4, 1)),
            Err(AppError::Validation(msg)) if msg == "Effective End date must be on or after Effective Start date"
        ));
        assert_eq!(check_currency(None).unwrap(), "JPY");
        assert_eq!(check_currency(Some(" USD ")).unwrap(), "USD");
        assert!(check_currency(Some("yen")).is_err());
        assert!(check_engagement_type("Retainer").is_ok());
        assert!(check_engagement_type("Time and Material").is_err());
        assert_eq!(sow_name(Some("  ")), "SOW Contract - SOW Project");
    }

    #[tokio::test]
    async fn test_create_msa_starts_as_draft() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(5, ROLE_CLIENT, Some("Taro"))]])
            .append_query_results([vec![user(8, ROLE_SALES_REP, Some("Jiro"))]])
            .append_query_results([vec![msa(11, ContractStatus::Draft, Some(8))]])
            .into_connection();

        let response = SalesContractService::create_msa(&db, &manager(), msa_request()).await.unwrap();
        assert_eq!(response.contract_id, "MSA-2025-011");
        assert_eq!(response.contract_name, "MSA Contract - Taro");
        assert_eq!(response.status, "Draft");
    }

    #[tokio::test]
    async fn test_create_msa_requires_approved_proposal() {
        let opportunity = opportunities::Model {
            id: 4,
            opportunity_id: "OP-2025-04".to_string(),
            contact_id: Some(3),
            est_value: Decimal::ZERO,
            currency: "JPY".to_string(),
            probability: 0,
            client_email: Some("user5@acme.jp".to_string()),
            client_name: Some("Taro".to_string()),
            client_company: None,
            status: "PROPOSAL_SENT".to_string(),
            assignee_user_id: Some(8),
            created_by: Some(8),
            created_at: None,
            updated_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![opportunity]])
            .append_query_results([vec![std::collections::BTreeMap::from([(
                "num_items",
                Value::BigInt(Some(0)),
            )])]])
            .into_connection();

        let mut request = msa_request();
        request.opportunity_id = Some("OP-2025-04".to_string());
        let err = SalesContractService::create_msa(&db, &manager(), request).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Opportunity must have an approved proposal to create MSA"));
    }

    #[tokio::test]
    async fn test_assignee_must_be_sales_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(5, ROLE_CLIENT, Some("Taro"))]])
            .append_query_results([vec![user(6, ROLE_CLIENT, None)]])
            .into_connection();

        let mut request = msa_request();
        request.assignee_user_id = 6;
        let err = SalesContractService::create_msa(&db, &manager(), request).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Assignee must be a sales user"));
    }

    #[tokio::test]
    async fn test_rep_cannot_view_unassigned_msa() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(11, ContractStatus::Draft, Some(9))]])
            .into_connection();

        let err = SalesContractService::get_msa(&db, &rep(8), 11).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg == "Access denied: You can only view contracts assigned to you"));
    }

    #[tokio::test]
    async fn test_get_msa_detail_with_client() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(11, ContractStatus::UnderReview, Some(8))]])
            .append_query_results([vec![user(5, ROLE_CLIENT, Some("Taro"))]])
            .append_query_results([Vec::<change_requests::Model>::new()])
            .into_connection();

        let detail = SalesContractService::get_msa(&db, &rep(8), 11).await.unwrap();
        assert_eq!(detail.contract.id, "MSA-2025-011");
        assert_eq!(detail.contract.status, "Under Review");
        assert_eq!((detail.client_name.as_str(), detail.client_email.as_str()), ("Taro", "user5@acme.jp"));
        assert_eq!(detail.period_end, Some(day(2026, 3, 31)));
    }

    #[tokio::test]
    async fn test_active_msa_is_not_editable() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(11, ContractStatus::Active, Some(8))]])
            .into_connection();

        let err = SalesContractService::update_msa(&db, &manager(), 11, msa_request()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.ends_with("Current status: Active")));
    }

    #[tokio::test]
    async fn test_manager_review_sends_msa_to_client() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(11, ContractStatus::Draft, Some(8))]])
            .append_query_results([vec![msa(11, ContractStatus::UnderReview, Some(8))]])
            .into_connection();

        let response = SalesContractService::review_msa(&db, &manager(), 11, review("APPROVE")).await.unwrap();
        assert_eq!(response.status, "Under Review");
    }

    #[tokio::test]
    async fn test_rep_cannot_review() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = SalesContractService::review_sow(&db, &rep(8), 3, review("APPROVE")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg == "Only Sales Managers can submit reviews"));
    }

    #[tokio::test]
    async fn test_sow_needs_signed_or_reviewed_parent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(1, ContractStatus::Draft, Some(8))]])
            .into_connection();

        let err = SalesContractService::create_sow(&db, &manager(), sow_request()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Parent MSA must be Active or Under Review. Current status: Draft"));
    }

    #[tokio::test]
    async fn test_create_sow_under_active_msa() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(1, ContractStatus::Active, Some(8))]])
            .append_query_results([vec![user(8, ROLE_SALES_REP, Some("Jiro"))]])
            .append_query_results([vec![sow(3, ContractStatus::Draft)]])
            .into_connection();

        let response = SalesContractService::create_sow(&db, &manager(), sow_request()).await.unwrap();
        assert_eq!(response.contract_id, "SOW-2025-003");
        assert_eq!(response.contract_name, "SOW Contract - Mobile app");
        assert_eq!(response.status, "Draft");
    }

    #[tokio::test]
    async fn test_sow_parent_cannot_move() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sow(3, ContractStatus::Draft)]])
            .into_connection();

        let mut request = sow_request();
        request.parent_msa_id = 2;
        let err = SalesContractService::update_sow(&db, &rep(8), 3, request).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Parent MSA cannot be changed"));
    }
}
