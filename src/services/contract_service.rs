// ============================================================================
// SERVICE : CONTRATS (MSA + SOW)
// ============================================================================
//
// Les deux tables sont fusionnées en une seule liste triée par date de
// création (plus récent d'abord) puis paginée en mémoire.
//
// Portail client:
//   - uniquement ses contrats (client_id)
//   - statuts visibles: Active, Pending, Under Review, Request for Change,
//     Completed, Terminated (jamais Draft)
//
// ============================================================================

use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::contract_status::ContractStatus;
use crate::models::dto::common::{clean_search, MessageResponse, Paging};
use crate::models::dto::contract::{
    ChangeRequestDto, ContractDetail, ContractListItem, ContractListQuery, ContractListResponse,
};
use crate::models::{change_requests, msa_contracts, sow_contracts};
use crate::utils::format::{format_date, format_period, format_yen};
use crate::utils::identifiers::{msa_display_id, parse_contract_display_id, sow_display_id};
use crate::utils::time;

const TYPE_MSA: &str = "MSA";
const TYPE_SOW: &str = "SOW";

/// Périmètre de la liste
#[derive(Clone, Copy)]
enum Scope {
    Client(i32),
    Assignee(i32),
    All,
}

pub struct ContractService;

impl ContractService {
    pub async fn list_for_client(
        db: &DatabaseConnection,
        client_id: i32,
        query: &ContractListQuery,
    ) -> AppResult<ContractListResponse> {
        list(db, Scope::Client(client_id), query, &ContractStatus::client_visible()).await
    }

    /// Liste côté sales (REP: contrats assignés)
    pub async fn list_for_sales(
        db: &DatabaseConnection,
        user: &AuthUser,
        query: &ContractListQuery,
    ) -> AppResult<ContractListResponse> {
        user.require_sales()?;
        let scope = if user.is_sales_rep() {
            Scope::Assignee(user.user_id)
        } else {
            Scope::All
        };
        let all: Vec<ContractStatus> = <ContractStatus as Iterable>::iter().collect();
        list(db, scope, query, &all).await
    }

    /// Détail par identifiant affiché (MSA-YYYY-NNN / SOW-YYYY-NNN)
    pub async fn get_for_client(db: &DatabaseConnection, client_id: i32, contract_ref: &str) -> AppResult<ContractDetail> {
        let not_found = || AppError::not_found("Contract not found");
        let (kind, id) = parse_contract_display_id(contract_ref.trim()).ok_or_else(not_found)?;

        let detail = match kind {
            TYPE_MSA => {
                let msa = msa_contracts::Entity::find_by_id(id)
                    .filter(msa_contracts::Column::ClientId.eq(client_id))
                    .one(db)
                    .await?
                    .filter(|c| ContractStatus::client_visible().contains(&c.status))
                    .ok_or_else(not_found)?;
                let crs = change_requests::Entity::find()
                    .filter(change_requests::Column::MsaContractId.eq(msa.id))
                    .order_by_desc(change_requests::Column::CreatedAt)
                    .all(db)
                    .await?;
                msa_detail(msa, crs)
            }
            _ => {
                let sow = sow_contracts::Entity::find_by_id(id)
                    .filter(sow_contracts::Column::ClientId.eq(client_id))
                    .one(db)
                    .await?
                    .filter(|c| ContractStatus::client_visible().contains(&c.status))
                    .ok_or_else(not_found)?;
                let crs = change_requests::Entity::find()
                    .filter(change_requests::Column::SowContractId.eq(sow.id))
                    .order_by_desc(change_requests::Column::CreatedAt)
                    .all(db)
                    .await?;
                sow_detail(sow, crs)
            }
        };
        Ok(detail)
    }

    /// Signature du client: le contrat en revue passe en Active
    pub async fn approve_for_client(
        db: &DatabaseConnection,
        client_id: i32,
        contract_ref: &str,
    ) -> AppResult<MessageResponse> {
        let not_found = || AppError::not_found("Contract not found");
        let (kind, id) = parse_contract_display_id(contract_ref.trim()).ok_or_else(not_found)?;
        let now = time::now_jst();

        match kind {
            TYPE_MSA => {
                let msa = msa_contracts::Entity::find_by_id(id)
                    .filter(msa_contracts::Column::ClientId.eq(client_id))
                    .one(db)
                    .await?
                    .filter(|c| ContractStatus::client_visible().contains(&c.status))
                    .ok_or_else(not_found)?;
                check_client_approvable(msa.status)?;

                let mut active: msa_contracts::ActiveModel = msa.into();
                active.status = Set(ContractStatus::Active);
                active.updated_at = Set(Some(now));
                active.update(db).await?;
            }
            _ => {
                let sow = sow_contracts::Entity::find_by_id(id)
                    .filter(sow_contracts::Column::ClientId.eq(client_id))
                    .one(db)
                    .await?
                    .filter(|c| ContractStatus::client_visible().contains(&c.status))
                    .ok_or_else(not_found)?;
                check_client_approvable(sow.status)?;

                let mut active: sow_contracts::ActiveModel = sow.into();
                active.status = Set(ContractStatus::Active);
                active.updated_at = Set(Some(now));
                active.update(db).await?;
            }
        }

        tracing::info!(client_id, contract_ref, "Contract approved by client");
        Ok(MessageResponse::ok("Contract approved successfully"))
    }
}

fn check_client_approvable(status: ContractStatus) -> AppResult<()> {
    match status {
        ContractStatus::Active => Err(AppError::bad_request("Contract is already approved")),
        ContractStatus::Completed | ContractStatus::Terminated => {
            Err(AppError::bad_request("Contract cannot be approved in current status"))
        }
        _ => Ok(()),
    }
}

async fn list(
    db: &DatabaseConnection,
    scope: Scope,
    query: &ContractListQuery,
    allowed: &[ContractStatus],
) -> AppResult<ContractListResponse> {
    let paging = Paging::new(query.page, query.size);

    // 1. Statuts demandés (restreints aux statuts autorisés)
    let statuses: Vec<ContractStatus> = match clean_search(query.status.as_deref()).filter(|s| s != "All") {
        Some(label) => ContractStatus::from_label(&label)
            .filter(|s| allowed.contains(s))
            .into_iter()
            .collect(),
        None => allowed.to_vec(),
    };
    let contract_type = clean_search(query.contract_type.as_deref())
        .map(|t| t.to_uppercase())
        .filter(|t| t != "ALL");
    let search = clean_search(query.search.as_deref());

    let mut items: Vec<ContractListItem> = Vec::new();
    if statuses.is_empty() {
        return Ok(empty_page(paging));
    }

    // 2. MSA
    if contract_type.as_deref().is_none_or(|t| t == TYPE_MSA) {
        let mut select = msa_contracts::Entity::find().filter(msa_contracts::Column::Status.is_in(statuses.clone()));
        select = match scope {
            Scope::Client(id) => select.filter(msa_contracts::Column::ClientId.eq(id)),
            Scope::Assignee(id) => select.filter(msa_contracts::Column::AssigneeUserId.eq(id)),
            Scope::All => select,
        };
        let rows = select.all(db).await?;
        items.extend(rows.into_iter().map(|c| {
            list_item(
                c.id,
                msa_display_id(c.id, c.created_at),
                c.contract_name,
                TYPE_MSA,
                c.status,
                format_period(c.period_start, c.period_end),
                c.value,
                c.assignee_user_id,
                c.created_at,
            )
        }));
    }

    // 3. SOW
    if contract_type.as_deref().is_none_or(|t| t == TYPE_SOW) {
        let mut select = sow_contracts::Entity::find().filter(sow_contracts::Column::Status.is_in(statuses));
        select = match scope {
            Scope::Client(id) => select.filter(sow_contracts::Column::ClientId.eq(id)),
            Scope::Assignee(id) => select.filter(sow_contracts::Column::AssigneeUserId.eq(id)),
            Scope::All => select,
        };
        let rows = select.all(db).await?;
        items.extend(rows.into_iter().map(|c| {
            list_item(
                c.id,
                sow_display_id(c.id, c.created_at),
                c.contract_name,
                TYPE_SOW,
                c.status,
                format_period(c.period_start, c.period_end),
                c.value,
                c.assignee_user_id,
                c.created_at,
            )
        }));
    }

    // 4. Recherche (nom ou identifiant affiché), tri, pagination
    if let Some(search) = search.map(|s| s.to_lowercase()) {
        items.retain(|c| c.contract_name.to_lowercase().contains(&search) || c.id.to_lowercase().contains(&search));
    }
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.internal_id.cmp(&a.internal_id)));

    let total = items.len() as u64;
    let contracts = paging
        .slice(items)
        .into_iter()
        .enumerate()
        .map(|(i, mut c)| {
            c.no = paging.row_number(i);
            c
        })
        .collect();

    Ok(ContractListResponse {
        contracts,
        page: paging.page,
        page_size: paging.size,
        total_pages: paging.total_pages(total),
        total,
    })
}

fn empty_page(paging: Paging) -> ContractListResponse {
    ContractListResponse {
        contracts: Vec::new(),
        page: paging.page,
        page_size: paging.size,
        total_pages: 0,
        total: 0,
    }
}

#[allow(clippy::too_many_arguments)]
fn list_item(
    internal_id: i32,
    id: String,
    contract_name: String,
    contract_type: &str,
    status: ContractStatus,
    period: String,
    value: Option<rust_decimal::Decimal>,
    assignee_user_id: Option<i32>,
    created_at: Option<chrono::NaiveDateTime>,
) -> ContractListItem {
    ContractListItem {
        no: 0,
        internal_id,
        id,
        contract_name,
        contract_type: contract_type.to_string(),
        status: status.label().to_string(),
        period,
        value: format_yen(value),
        assignee_user_id,
        created_at,
    }
}

fn change_request_dto(cr: change_requests::Model) -> ChangeRequestDto {
    ChangeRequestDto {
        change_request_id: cr.display_id(),
        created_on: format_date(cr.created_at),
        id: cr.id,
        title: cr.title,
        request_type: cr.request_type,
        status: cr.status,
        description: cr.description,
    }
}

pub(crate) fn msa_detail(c: msa_contracts::Model, crs: Vec<change_requests::Model>) -> ContractDetail {
    ContractDetail {
        internal_id: c.id,
        id: msa_display_id(c.id, c.created_at),
        contract_type: TYPE_MSA.to_string(),
        status: c.status.label().to_string(),
        period: format_period(c.period_start, c.period_end),
        value: format_yen(c.value),
        created_on: format_date(c.created_at),
        contract_name: c.contract_name,
        currency: c.currency,
        engagement_type: None,
        parent_msa_id: None,
        link: c.link,
        assignee_user_id: c.assignee_user_id,
        change_requests: crs.into_iter().map(change_request_dto).collect(),
    }
}

pub(crate) fn sow_detail(c: sow_contracts::Model, crs: Vec<change_requests::Model>) -> ContractDetail {
    ContractDetail {
        internal_id: c.id,
        id: sow_display_id(c.id, c.created_at),
        contract_type: TYPE_SOW.to_string(),
        status: c.status.label().to_string(),
        period: format_period(c.period_start, c.period_end),
        value: format_yen(c.value),
        created_on: format_date(c.created_at),
        contract_name: c.contract_name,
        currency: c.currency,
        engagement_type: c.engagement_type,
        parent_msa_id: c.parent_msa_id,
        link: c.link,
        assignee_user_id: c.assignee_user_id,
        change_requests: crs.into_iter().map(change_request_dto).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn at(y: i32, m: u32, d: u32) -> Option<chrono::NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(9, 0, 0))
    }

    fn msa(id: i32, created: Option<chrono::NaiveDateTime>, status: ContractStatus) -> msa_contracts::Model {
        msa_contracts::Model {
            id,
            client_id: 5,
            opportunity_id: None,
            contract_name: format!("MSA Acme {}", id),
            status,
            period_start: NaiveDate::from_ymd_opt(2025, 1, 1),
            period_end: NaiveDate::from_ymd_opt(2025, 12, 31),
            value: Some(Decimal::new(1_234_567, 0)),
            currency: Some("JPY".to_string()),
            assignee_user_id: None,
            link: None,
            created_at: created,
            updated_at: None,
        }
    }

    fn sow(id: i32, created: Option<chrono::NaiveDateTime>) -> sow_contracts::Model {
        sow_contracts::Model {
            id,
            client_id: 5,
            parent_msa_id: Some(1),
            contract_name: format!("SOW Mobile {}", id),
            engagement_type: Some("Fixed Price".to_string()),
            status: ContractStatus::Active,
            period_start: None,
            period_end: None,
            value: None,
            currency: None,
            assignee_user_id: None,
            link: None,
            created_at: created,
            updated_at: None,
        }
    }

    fn query(contract_type: Option<&str>) -> ContractListQuery {
        ContractListQuery {
            search: None,
            status: None,
            contract_type: contract_type.map(str::to_string),
            page: None,
            size: None,
        }
    }

    #[tokio::test]
    async fn test_merged_newest_first() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(1, at(2025, 1, 10), ContractStatus::Active)]])
            .append_query_results([vec![sow(2, at(2025, 3, 1))]])
            .into_connection();

        let response = ContractService::list_for_client(&db, 5, &query(None)).await.unwrap();

        assert_eq!(response.total, 2);
        assert_eq!(response.contracts[0].id, "SOW-2025-002");
        assert_eq!(response.contracts[0].period, "-");
        assert_eq!(response.contracts[1].id, "MSA-2025-001");
        assert_eq!(response.contracts[1].value, "¥1,234,567");
        assert_eq!(response.contracts[1].period, "2025/01/01-2025/12/31");
        assert_eq!(response.contracts[1].no, 2);
    }

    #[tokio::test]
    async fn test_type_filter_skips_other_table() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sow(2, at(2025, 3, 1))]])
            .into_connection();

        let response = ContractService::list_for_client(&db, 5, &query(Some("SOW"))).await.unwrap();
        assert_eq!(response.contracts.len(), 1);
        assert_eq!(response.contracts[0].contract_type, "SOW");
    }

    #[tokio::test]
    async fn test_draft_filter_is_empty_for_clients() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut q = query(None);
        q.status = Some("Draft".to_string());

        let response = ContractService::list_for_client(&db, 5, &q).await.unwrap();
        assert_eq!(response.total, 0);
    }

    #[tokio::test]
    async fn test_unknown_reference_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = ContractService::get_for_client(&db, 5, "CR-2025-001").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_client_approval_activates_contract() {
        let mut approved = msa(1, at(2025, 1, 10), ContractStatus::Active);
        approved.updated_at = at(2025, 2, 1);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(1, at(2025, 1, 10), ContractStatus::UnderReview)]])
            .append_query_results([vec![approved]])
            .into_connection();

        let response = ContractService::approve_for_client(&db, 5, "MSA-2025-001").await.unwrap();
        assert_eq!(response.message, "Contract approved successfully");
    }

    #[tokio::test]
    async fn test_active_contract_cannot_be_approved_twice() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sow(2, at(2025, 3, 1))]])
            .into_connection();

        let err = ContractService::approve_for_client(&db, 5, "SOW-2025-002").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Contract is already approved"));
    }

    #[tokio::test]
    async fn test_draft_msa_is_hidden_from_client() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(1, at(2025, 1, 10), ContractStatus::Draft)]])
            .into_connection();

        let err = ContractService::get_for_client(&db, 5, "MSA-2025-001").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
