// Tableaux de bord: portail client (résumé, activités, alertes), sales
// (compteurs, validations en attente, activité des clients) et admin (compteurs).

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::*;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::contract_status::ContractStatus;
use crate::models::dto::dashboard::{
    ActiveInactive, ActivitiesResponse, ActivityDto, AdminDashboardSummary, AlertDto, AlertsResponse, AllNew,
    AllUnderReview, ApprovalItem, ApprovalsResponse, ChangeRequestSummary, ContactSummary, ContractSummary,
    DashboardSummary, ProposalSummary, RevenueItem, SalesActivitiesResponse, SalesActivityItem,
    SalesDashboardSummary, Total,
};
use crate::models::{
    change_requests, contacts, engineers, msa_contracts, opportunities, project_types, proposals, skills,
    sow_contracts, users,
};
use crate::utils::format::format_date;
use crate::utils::identifiers::{msa_display_id, sow_display_id};
use crate::utils::status::{OpportunityStatus, ProposalStatus};
use crate::utils::time;

pub const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 50;

const UNKNOWN_CLIENT: &str = "Unknown";
/// Demandes de changement encore ouvertes côté sales
const OPEN_CHANGE_REQUEST_STATUSES: [&str; 3] = ["Under Review", "Client Under Review", "Pending"];

pub struct DashboardService;

impl DashboardService {
    pub async fn client_summary(db: &DatabaseConnection, client_id: i32) -> AppResult<DashboardSummary> {
        // 1. Contacts
        let contacts_with = |status: &'static str| {
            contacts::Entity::find()
                .filter(contacts::Column::ClientUserId.eq(client_id))
                .filter(contacts::Column::Status.eq(status))
                .count(db)
        };
        let in_progress = contacts_with(contacts::STATUS_IN_PROGRESS).await?;
        let waiting_response = contacts_with(contacts::STATUS_NEW).await?;

        // 2. Propositions visibles par le client
        let proposals_in = |statuses: Vec<&'static str>| {
            proposals::Entity::find()
                .inner_join(contacts::Entity)
                .filter(contacts::Column::ClientUserId.eq(client_id))
                .filter(proposals::Column::Status.is_in(statuses))
                .count(db)
        };
        let under_review = proposals_in(vec![ProposalStatus::SentToClient.as_str()]).await?;
        let reviewed = proposals_in(vec![
            ProposalStatus::RevisionRequested.as_str(),
            ProposalStatus::Approved.as_str(),
        ])
        .await?;

        // 3. Contrats
        let (msas, sows) = client_contracts(db, client_id).await?;
        let count_status = |status: ContractStatus| {
            (msas.iter().filter(|c| c.status == status).count() + sows.iter().filter(|c| c.status == status).count())
                as u64
        };

        // 4. Demandes de changement
        let crs = change_requests_for(db, &msas, &sows).await?;
        let count_cr = |status: &str| crs.iter().filter(|cr| cr.status.eq_ignore_ascii_case(status)).count() as u64;

        Ok(DashboardSummary {
            contacts: ContactSummary {
                in_progress,
                waiting_response,
            },
            proposals: ProposalSummary { under_review, reviewed },
            contracts: ContractSummary {
                active: count_status(ContractStatus::Active),
                draft: count_status(ContractStatus::Draft),
            },
            change_requests: ChangeRequestSummary {
                under_review: count_cr(change_requests::STATUS_UNDER_REVIEW),
                approved: count_cr(change_requests::STATUS_APPROVED),
            },
        })
    }

    /// Activités récentes (plus récentes d'abord)
    pub async fn recent_activities(
        db: &DatabaseConnection,
        client_id: i32,
        limit: Option<u64>,
    ) -> AppResult<ActivitiesResponse> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;
        let mut activities = Vec::new();

        // 1. Contacts
        let contacts = contacts::Entity::find()
            .filter(contacts::Column::ClientUserId.eq(client_id))
            .all(db)
            .await?;
        for c in &contacts {
            activities.push(activity(
                c.id,
                "CONTACT",
                "Contact",
                format!("Contact {} created", c.title.as_deref().unwrap_or("request")),
                c.created_at,
            ));
        }

        // 2. Propositions envoyées
        let contact_ids: Vec<i32> = contacts.iter().map(|c| c.id).collect();
        if !contact_ids.is_empty() {
            let sent = proposals::Entity::find()
                .filter(proposals::Column::ContactId.is_in(contact_ids))
                .filter(proposals::Column::Status.is_in(ProposalStatus::client_visible()))
                .all(db)
                .await?;
            for p in sent {
                let project = p
                    .contact_id
                    .and_then(|id| contacts.iter().find(|c| c.id == id))
                    .and_then(|c| c.title.clone())
                    .unwrap_or_else(|| "project".to_string());
                let name = p.title.clone().unwrap_or_else(|| format!("v{}", p.version));
                activities.push(activity(
                    p.id,
                    "PROPOSAL",
                    "Proposal",
                    format!("Proposal {} sent for {}.", name, project),
                    p.created_at,
                ));
            }
        }

        // 3. Contrats et demandes de changement
        let (msas, sows) = client_contracts(db, client_id).await?;
        let visible = ContractStatus::client_visible();
        for c in msas.iter().filter(|c| visible.contains(&c.status)) {
            activities.push(activity(
                c.id,
                "CONTRACT",
                "Contract",
                format!("Contract {} signed by client.", c.contract_name),
                c.created_at,
            ));
        }
        for c in sows.iter().filter(|c| visible.contains(&c.status)) {
            activities.push(activity(
                c.id,
                "CONTRACT",
                "Contract",
                format!("Contract {} signed by client.", c.contract_name),
                c.created_at,
            ));
        }
        for cr in change_requests_for(db, &msas, &sows).await? {
            activities.push(activity(
                cr.id,
                "CHANGE_REQUEST",
                "Change Request",
                format!("CR-{} created ({}) - {}.", cr.display_id(), cr.title, cr.status),
                cr.created_at,
            ));
        }

        // 4. Tri + limite (les entrées sans date en dernier)
        activities.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
        activities.truncate(limit);

        Ok(ActivitiesResponse {
            total: activities.len(),
            activities,
        })
    }

    /// Demandes de changement en attente d'une décision du client
    pub async fn alerts(db: &DatabaseConnection, client_id: i32, limit: Option<u64>) -> AppResult<AlertsResponse> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;
        let (msas, sows) = client_contracts(db, client_id).await?;

        let alerts: Vec<AlertDto> = change_requests_for(db, &msas, &sows)
            .await?
            .into_iter()
            .filter(|cr| cr.status.eq_ignore_ascii_case(change_requests::STATUS_UNDER_REVIEW))
            .take(limit)
            .map(|cr| AlertDto {
                id: cr.id,
                message: format!("CR-{} needs client decision.", cr.display_id()),
                priority: "HIGH".to_string(),
                alert_type: "CHANGE_REQUEST_DECISION".to_string(),
                date: format_date(cr.created_at),
            })
            .collect();

        Ok(AlertsResponse {
            total: alerts.len(),
            alerts,
        })
    }

    // ---- Sales ----

    /// Compteurs du portail sales. Le CA mensuel n'est calculé que pour un SALES_MANAGER.
    pub async fn sales_summary(db: &DatabaseConnection, user: &AuthUser) -> AppResult<SalesDashboardSummary> {
        user.require_sales()?;
        let scope = SalesScope::of(user);

        // 1. Contacts
        let contacts = AllNew {
            all: scope.contacts().count(db).await?,
            new_count: scope
                .contacts()
                .filter(contacts::Column::Status.eq(contacts::STATUS_NEW))
                .count(db)
                .await?,
        };

        // 2. Opportunités en cours de proposition
        let opportunities = AllUnderReview {
            all: scope.opportunities().count(db).await?,
            under_review: scope
                .opportunities()
                .filter(opportunities::Column::Status.is_in([
                    OpportunityStatus::ProposalDrafting.as_str(),
                    OpportunityStatus::ProposalSent.as_str(),
                    OpportunityStatus::Revision.as_str(),
                ]))
                .count(db)
                .await?,
        };

        // 3. Propositions chez le client
        let proposals = AllUnderReview {
            all: scope.proposals().count(db).await?,
            under_review: scope
                .proposals()
                .filter(proposals::Column::Status.is_in(awaiting_client()))
                .count(db)
                .await?,
        };

        // 4. Contrats et demandes de changement
        let msas = scope.msa_contracts().all(db).await?;
        let sows = scope.sow_contracts().all(db).await?;
        let in_review = |status: &ContractStatus| {
            matches!(status, ContractStatus::UnderReview | ContractStatus::RequestForChange)
        };
        let contracts = AllUnderReview {
            all: (msas.len() + sows.len()) as u64,
            under_review: (msas.iter().filter(|c| in_review(&c.status)).count()
                + sows.iter().filter(|c| in_review(&c.status)).count()) as u64,
        };

        let crs = change_requests_for(db, &msas, &sows).await?;
        let change_requests = AllUnderReview {
            all: crs.len() as u64,
            under_review: crs
                .iter()
                .filter(|cr| OPEN_CHANGE_REQUEST_STATUSES.iter().any(|s| cr.status.eq_ignore_ascii_case(s)))
                .count() as u64,
        };

        // 5. CA du mois courant et du suivant
        let revenue = user.is_sales_manager().then(|| {
            let this_month = first_of_month(time::now_jst().date());
            vec![
                monthly_revenue(&msas, &sows, this_month),
                monthly_revenue(&msas, &sows, next_month(this_month)),
            ]
        });

        Ok(SalesDashboardSummary {
            contacts,
            opportunities,
            proposals,
            contracts,
            change_requests,
            revenue,
        })
    }

    /// Propositions et contrats en attente d'une réponse du client (10 plus récents)
    pub async fn sales_approvals(db: &DatabaseConnection, user: &AuthUser) -> AppResult<ApprovalsResponse> {
        user.require_sales()?;
        let scope = SalesScope::of(user);

        // 1. Données
        let proposals = scope
            .proposals()
            .filter(proposals::Column::Status.is_in(awaiting_client()))
            .find_also_related(contacts::Entity)
            .all(db)
            .await?;
        let msas = scope
            .msa_contracts()
            .filter(msa_contracts::Column::Status.eq(ContractStatus::UnderReview))
            .all(db)
            .await?;
        let sows = scope
            .sow_contracts()
            .filter(sow_contracts::Column::Status.eq(ContractStatus::UnderReview))
            .all(db)
            .await?;

        let client_ids = proposals
            .iter()
            .filter_map(|(_, contact)| contact.as_ref().and_then(|c| c.client_user_id))
            .chain(msas.iter().map(|c| c.client_id))
            .chain(sows.iter().map(|c| c.client_id))
            .collect();
        let clients = client_names(db, client_ids).await?;
        let client_name = |id: Option<i32>| {
            id.and_then(|id| clients.get(&id).cloned())
                .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
        };

        // 2. Lignes
        let mut approvals = Vec::new();
        for (p, contact) in proposals {
            let number = format!("P-{}", p.id);
            let client = client_name(contact.and_then(|c| c.client_user_id));
            let sent = p.created_at.map(|d| d.format("%d %b").to_string()).unwrap_or_default();
            approvals.push(ApprovalItem {
                id: p.id,
                entity_type: "PROPOSAL".to_string(),
                description: format!("Proposal #{} - {} (Sent {})", number, client, sent),
                entity_number: number,
                entity_id: p.id,
                client_name: client,
                status: "Sent".to_string(),
                sent_date: iso_date(p.created_at),
                sort_key: p.created_at,
            });
        }
        for c in msas {
            let number = msa_display_id(c.id, c.created_at);
            approvals.push(contract_approval("MSA", c.id, number, client_name(Some(c.client_id)), c.created_at));
        }
        for c in sows {
            let number = sow_display_id(c.id, c.created_at);
            approvals.push(contract_approval("SOW", c.id, number, client_name(Some(c.client_id)), c.created_at));
        }

        // 3. Plus récents d'abord (sans date en dernier)
        approvals.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
        approvals.truncate(DEFAULT_LIMIT as usize);

        Ok(ApprovalsResponse {
            total: approvals.len(),
            approvals,
        })
    }

    /// Demandes de changement soumises par les clients (10 plus récentes)
    pub async fn sales_activities(db: &DatabaseConnection, user: &AuthUser) -> AppResult<SalesActivitiesResponse> {
        user.require_sales()?;
        let scope = SalesScope::of(user);

        let msas = scope.msa_contracts().all(db).await?;
        let sows = scope.sow_contracts().all(db).await?;
        let crs: Vec<change_requests::Model> = change_requests_for(db, &msas, &sows)
            .await?
            .into_iter()
            .filter(|cr| cr.created_at.is_some())
            .take(DEFAULT_LIMIT as usize)
            .collect();

        // Client du contrat (SOW en priorité)
        let client_of = |cr: &change_requests::Model| {
            cr.sow_contract_id
                .and_then(|id| sows.iter().find(|c| c.id == id).map(|c| c.client_id))
                .or_else(|| cr.msa_contract_id.and_then(|id| msas.iter().find(|c| c.id == id).map(|c| c.client_id)))
        };
        let clients = client_names(db, crs.iter().filter_map(client_of).collect()).await?;

        let now = time::now_jst();
        let activities: Vec<SalesActivityItem> = crs
            .iter()
            .map(|cr| {
                let client = client_of(cr)
                    .and_then(|id| clients.get(&id).cloned())
                    .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
                SalesActivityItem {
                    id: cr.id,
                    description: format!("CR-{} submitted by {}", cr.display_id(), client),
                    time_ago: cr.created_at.map(|at| time_ago(at, now)).unwrap_or_default(),
                    timestamp: cr.created_at.map(|at| at.format("%Y-%m-%dT%H:%M:%S").to_string()).unwrap_or_default(),
                    entity_type: "CHANGE_REQUEST".to_string(),
                    entity_id: cr.id,
                    client_name: client,
                }
            })
            .collect();

        Ok(SalesActivitiesResponse {
            total: activities.len(),
            activities,
        })
    }

    pub async fn admin_summary(db: &DatabaseConnection) -> AppResult<AdminDashboardSummary> {
        let available = engineers::Entity::find()
            .filter(engineers::Column::Status.eq(engineers::STATUS_AVAILABLE))
            .count(db)
            .await?;
        let total_engineers = engineers::Entity::find().count(db).await?;
        let active_users = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .count(db)
            .await?;
        let inactive_users = users::Entity::find()
            .filter(users::Column::IsActive.eq(false))
            .count(db)
            .await?;

        Ok(AdminDashboardSummary {
            engineers: ActiveInactive {
                active: available,
                inactive: total_engineers.saturating_sub(available),
            },
            system_users: ActiveInactive {
                active: active_users,
                inactive: inactive_users,
            },
            skills: Total {
                total: skills::Entity::find().count(db).await?,
            },
            project_types: Total {
                total: project_types::Entity::find().count(db).await?,
            },
        })
    }
}

fn activity(
    id: i32,
    activity_type: &str,
    title: &str,
    description: String,
    created_at: Option<chrono::NaiveDateTime>,
) -> ActivityDto {
    ActivityDto {
        id,
        activity_type: activity_type.to_string(),
        title: title.to_string(),
        description,
        date: format_date(created_at),
        sort_key: created_at,
    }
}

async fn client_contracts(
    db: &DatabaseConnection,
    client_id: i32,
) -> Result<(Vec<msa_contracts::Model>, Vec<sow_contracts::Model>), DbErr> {
    let msas = msa_contracts::Entity::find()
        .filter(msa_contracts::Column::ClientId.eq(client_id))
        .all(db)
        .await?;
    let sows = sow_contracts::Entity::find()
        .filter(sow_contracts::Column::ClientId.eq(client_id))
        .all(db)
        .await?;
    Ok((msas, sows))
}

async fn change_requests_for(
    db: &DatabaseConnection,
    msas: &[msa_contracts::Model],
    sows: &[sow_contracts::Model],
) -> Result<Vec<change_requests::Model>, DbErr> {
    if msas.is_empty() && sows.is_empty() {
        return Ok(Vec::new());
    }
    let msa_ids: Vec<i32> = msas.iter().map(|c| c.id).collect();
    let sow_ids: Vec<i32> = sows.iter().map(|c| c.id).collect();

    change_requests::Entity::find()
        .filter(
            Condition::any()
                .add(change_requests::Column::MsaContractId.is_in(msa_ids))
                .add(change_requests::Column::SowContractId.is_in(sow_ids)),
        )
        .order_by_desc(change_requests::Column::CreatedAt)
        .all(db)
        .await
}

/// Périmètre sales: tout pour un SALES_MANAGER, ses affectations pour un SALES_REP
#[derive(Clone, Copy)]
struct SalesScope(Option<i32>);

impl SalesScope {
    fn of(user: &AuthUser) -> Self {
        SalesScope((!user.is_sales_manager()).then_some(user.user_id))
    }

    fn contacts(self) -> Select<contacts::Entity> {
        contacts::Entity::find().apply_if(self.0, |q, id| q.filter(contacts::Column::AssigneeUserId.eq(id)))
    }

    fn opportunities(self) -> Select<opportunities::Entity> {
        opportunities::Entity::find()
            .apply_if(self.0, |q, id| q.filter(opportunities::Column::AssigneeUserId.eq(id)))
    }

    /// Les propositions suivent l'affectation de leur opportunité
    fn proposals(self) -> Select<proposals::Entity> {
        proposals::Entity::find().apply_if(self.0, |q, id| {
            q.filter(
                proposals::Column::OpportunityId.in_subquery(
                    opportunities::Entity::find()
                        .select_only()
                        .column(opportunities::Column::Id)
                        .filter(opportunities::Column::AssigneeUserId.eq(id))
                        .into_query(),
                ),
            )
        })
    }

    fn msa_contracts(self) -> Select<msa_contracts::Entity> {
        msa_contracts::Entity::find()
            .apply_if(self.0, |q, id| q.filter(msa_contracts::Column::AssigneeUserId.eq(id)))
    }

    fn sow_contracts(self) -> Select<sow_contracts::Entity> {
        sow_contracts::Entity::find()
            .apply_if(self.0, |q, id| q.filter(sow_contracts::Column::AssigneeUserId.eq(id)))
    }
}

fn awaiting_client() -> [&'static str; 2] {
    [ProposalStatus::SentToClient.as_str(), ProposalStatus::RevisionRequested.as_str()]
}

/// Nom affiché des clients (nom complet, sinon email)
async fn client_names(db: &DatabaseConnection, mut ids: Vec<i32>) -> Result<HashMap<i32, String>, DbErr> {
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let clients = users::Entity::find().filter(users::Column::Id.is_in(ids)).all(db).await?;
    Ok(clients
        .into_iter()
        .map(|u| (u.id, u.full_name.unwrap_or(u.email)))
        .collect())
}

fn contract_approval(
    entity_type: &str,
    id: i32,
    number: String,
    client: String,
    created_at: Option<NaiveDateTime>,
) -> ApprovalItem {
    ApprovalItem {
        id,
        entity_type: entity_type.to_string(),
        description: format!("{} #{} - {} (Client Review)", entity_type, number, client),
        entity_number: number,
        entity_id: id,
        client_name: client,
        status: "Client Review".to_string(),
        sent_date: iso_date(created_at),
        sort_key: created_at,
    }
}

fn iso_date(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(|d| d.format("%Y-%m-%d").to_string())
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn next_month(month_start: NaiveDate) -> NaiveDate {
    month_start.checked_add_months(Months::new(1)).unwrap_or(month_start)
}

/// Somme des contrats actifs dont la période recouvre le mois
pub fn monthly_revenue(
    msas: &[msa_contracts::Model],
    sows: &[sow_contracts::Model],
    month_start: NaiveDate,
) -> RevenueItem {
    let month_end = next_month(month_start).pred_opt().unwrap_or(month_start);
    let billed = |status: &ContractStatus, value: Option<Decimal>, start: Option<NaiveDate>, end: Option<NaiveDate>| {
        match (status, value, start, end) {
            (ContractStatus::Active, Some(v), Some(s), Some(e)) if s <= month_end && e >= month_start => Some(v),
            _ => None,
        }
    };

    let total: Decimal = msas
        .iter()
        .filter_map(|c| billed(&c.status, c.value, c.period_start, c.period_end))
        .chain(
            sows.iter()
                .filter_map(|c| billed(&c.status, c.value, c.period_start, c.period_end)),
        )
        .sum();

    RevenueItem {
        month: month_start.format("%Y/%m").to_string(),
        amount: total.trunc().to_i64().unwrap_or(i64::MAX),
    }
}

/// "just now", "5 min ago", "2 hours ago", "3 days ago"
pub fn time_ago(at: NaiveDateTime, now: NaiveDateTime) -> String {
    let elapsed = now.signed_duration_since(at);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();
    let plural = |n: i64| if n > 1 { "s" } else { "" };

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{} min ago", minutes)
    } else if hours < 24 {
        format!("{} hour{} ago", hours, plural(hours))
    } else {
        format!("{} day{} ago", days, plural(days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn count_row(n: i64) -> Vec<BTreeMap<&'static str, Value>> {
        vec![BTreeMap::from([("num_items", Value::BigInt(Some(n)))])]
    }

    fn msa(id: i32) -> msa_contracts::Model {
        msa_contracts::Model {
            id,
            client_id: 5,
            opportunity_id: None,
            contract_name: "MSA Acme".to_string(),
            status: ContractStatus::Active,
            period_start: None,
            period_end: None,
            value: None,
            currency: None,
            assignee_user_id: None,
            link: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn cr(id: i32, status: &str) -> change_requests::Model {
        change_requests::Model {
            id,
            change_request_id: None,
            msa_contract_id: Some(1),
            sow_contract_id: None,
            title: "Add two engineers".to_string(),
            request_type: None,
            status: status.to_string(),
            description: None,
            created_by: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_admin_summary_counts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(6)])
            .append_query_results([count_row(10)])
            .append_query_results([count_row(8)])
            .append_query_results([count_row(2)])
            .append_query_results([count_row(15)])
            .append_query_results([count_row(5)])
            .into_connection();

        let summary = DashboardService::admin_summary(&db).await.unwrap();
        assert_eq!((summary.engineers.active, summary.engineers.inactive), (6, 4));
        assert_eq!((summary.system_users.active, summary.system_users.inactive), (8, 2));
        assert_eq!(summary.skills.total, 15);
        assert_eq!(summary.project_types.total, 5);
    }

    #[tokio::test]
    async fn test_alerts_for_change_requests_under_review() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(1)]])
            .append_query_results([Vec::<sow_contracts::Model>::new()])
            .append_query_results([vec![cr(4, "Under Review"), cr(5, "Approved")]])
            .into_connection();

        let response = DashboardService::alerts(&db, 5, None).await.unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.alerts[0].message, "CR-4 needs client decision.");
        assert_eq!(response.alerts[0].priority, "HIGH");
    }

    #[tokio::test]
    async fn test_no_contracts_no_alerts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<msa_contracts::Model>::new()])
            .append_query_results([Vec::<sow_contracts::Model>::new()])
            .into_connection();

        let response = DashboardService::alerts(&db, 5, Some(3)).await.unwrap();
        assert!(response.alerts.is_empty());
    }

    // ---- Sales ----

    use crate::error::AppError;
    use crate::models::users::{ROLE_CLIENT, ROLE_SALES_MANAGER, ROLE_SALES_REP};

    fn sales_user(id: i32, role: &str) -> AuthUser {
        AuthUser {
            user_id: id,
            email: format!("sales{}@skillbridge.jp", id),
            full_name: None,
            role: role.to_string(),
        }
    }

    fn at(y: i32, m: u32, d: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|day| day.and_hms_opt(9, 30, 0))
    }

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn contract(id: i32, status: ContractStatus, value: i64, start: Option<NaiveDate>, end: Option<NaiveDate>) -> msa_contracts::Model {
        msa_contracts::Model {
            status,
            value: Some(Decimal::new(value, 0)),
            period_start: start,
            period_end: end,
            created_at: at(2025, 2, 1),
            ..msa(id)
        }
    }

    fn sow(id: i32, value: i64, start: Option<NaiveDate>, end: Option<NaiveDate>) -> sow_contracts::Model {
        sow_contracts::Model {
            id,
            client_id: 5,
            parent_msa_id: Some(1),
            contract_name: "SOW Acme".to_string(),
            engagement_type: Some("Retainer".to_string()),
            status: ContractStatus::Active,
            period_start: start,
            period_end: end,
            value: Some(Decimal::new(value, 0)),
            currency: Some("JPY".to_string()),
            assignee_user_id: None,
            link: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn client(id: i32, name: &str) -> users::Model {
        users::Model {
            id,
            email: format!("client{}@acme.jp", id),
            password: None,
            full_name: Some(name.to_string()),
            company_name: None,
            phone: None,
            role: Some(ROLE_CLIENT.to_string()),
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn sent_proposal(id: i32, status: &str, created_at: Option<NaiveDateTime>) -> proposals::Model {
        proposals::Model {
            id,
            contact_id: Some(7),
            opportunity_id: Some(3),
            version: 1,
            is_current: true,
            title: None,
            status: status.to_string(),
            reviewer_id: None,
            review_notes: None,
            review_action: None,
            review_submitted_at: None,
            link: None,
            attachments_manifest: None,
            client_feedback: None,
            created_by: None,
            created_at,
            updated_at: None,
        }
    }

    fn client_contact(id: i32, client_user_id: i32) -> contacts::Model {
        contacts::Model {
            id,
            client_user_id: Some(client_user_id),
            assignee_user_id: None,
            reviewer_id: None,
            title: None,
            description: None,
            status: Some(contacts::STATUS_CONVERTED.to_string()),
            request_type: None,
            priority: None,
            internal_note: None,
            online_mtg_link: None,
            online_mtg_date: None,
            communication_progress: None,
            created_by: None,
            proposal_link: None,
            proposal_status: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_time_ago_buckets() {
        let now = at(2025, 3, 10).unwrap();
        let before = |minutes: i64| now - chrono::Duration::minutes(minutes);
        assert_eq!(time_ago(before(0), now), "just now");
        assert_eq!(time_ago(before(5), now), "5 min ago");
        assert_eq!(time_ago(before(60), now), "1 hour ago");
        assert_eq!(time_ago(before(23 * 60 + 59), now), "23 hours ago");
        assert_eq!(time_ago(before(3 * 24 * 60), now), "3 days ago");
    }

    #[test]
    fn test_monthly_revenue_counts_active_contracts_overlapping_the_month() {
        let msas = vec![
            contract(1, ContractStatus::Active, 1_000_000, day(2025, 3, 15), day(2025, 6, 30)),
            contract(2, ContractStatus::Draft, 9_000_000, day(2025, 1, 1), day(2025, 12, 31)),
            contract(3, ContractStatus::Active, 2_000_000, None, day(2025, 12, 31)),
        ];
        let sows = vec![sow(1, 500_000, day(2025, 4, 1), day(2025, 4, 30))];

        let april = monthly_revenue(&msas, &sows, day(2025, 4, 1).unwrap());
        assert_eq!((april.month.as_str(), april.amount), ("2025/04", 1_500_000));
        assert_eq!(monthly_revenue(&msas, &sows, day(2025, 3, 1).unwrap()).amount, 1_000_000);
        assert_eq!(monthly_revenue(&msas, &sows, day(2025, 7, 1).unwrap()).amount, 0);
        assert_eq!(next_month(day(2025, 12, 1).unwrap()), day(2026, 1, 1).unwrap());
    }

    #[tokio::test]
    async fn test_sales_summary_for_rep_is_scoped_and_has_no_revenue() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(3)])
            .append_query_results([count_row(1)])
            .append_query_results([count_row(4)])
            .append_query_results([count_row(2)])
            .append_query_results([count_row(5)])
            .append_query_results([count_row(2)])
            .append_query_results([vec![msa(1), contract(2, ContractStatus::UnderReview, 0, None, None)]])
            .append_query_results([Vec::<sow_contracts::Model>::new()])
            .append_query_results([vec![cr(4, "Under Review"), cr(5, "Approved"), cr(6, "pending")]])
            .into_connection();

        let summary = DashboardService::sales_summary(&db, &sales_user(8, ROLE_SALES_REP)).await.unwrap();
        assert_eq!((summary.contacts.all, summary.contacts.new_count), (3, 1));
        assert_eq!((summary.opportunities.all, summary.opportunities.under_review), (4, 2));
        assert_eq!((summary.proposals.all, summary.proposals.under_review), (5, 2));
        assert_eq!((summary.contracts.all, summary.contracts.under_review), (2, 1));
        assert_eq!((summary.change_requests.all, summary.change_requests.under_review), (3, 2));
        assert!(summary.revenue.is_none());

        // Propositions filtrées par l'affectation de l'opportunité
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("IN (SELECT"));
        assert!(log.contains("assignee_user_id"));
    }

    #[tokio::test]
    async fn test_sales_summary_for_manager_has_two_revenue_months() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(0)])
            .append_query_results([count_row(0)])
            .append_query_results([count_row(0)])
            .append_query_results([count_row(0)])
            .append_query_results([count_row(0)])
            .append_query_results([count_row(0)])
            .append_query_results([vec![contract(1, ContractStatus::Active, 300_000, day(2000, 1, 1), day(2099, 12, 31))]])
            .append_query_results([Vec::<sow_contracts::Model>::new()])
            .append_query_results([Vec::<change_requests::Model>::new()])
            .into_connection();

        let summary = DashboardService::sales_summary(&db, &sales_user(2, ROLE_SALES_MANAGER)).await.unwrap();
        let revenue = summary.revenue.unwrap();
        assert_eq!(revenue.len(), 2);
        assert!(revenue.iter().all(|r| r.amount == 300_000));
        assert_ne!(revenue[0].month, revenue[1].month);
    }

    #[tokio::test]
    async fn test_sales_approvals_newest_first_with_client_names() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                (sent_proposal(12, "sent_to_client", at(2025, 3, 10)), Some(client_contact(7, 5))),
                (sent_proposal(13, "revision_requested", at(2025, 1, 5)), None),
            ]])
            .append_query_results([vec![contract(2, ContractStatus::UnderReview, 0, None, None)]])
            .append_query_results([Vec::<sow_contracts::Model>::new()])
            .append_query_results([vec![client(5, "Taro")]])
            .into_connection();

        let response = DashboardService::sales_approvals(&db, &sales_user(2, ROLE_SALES_MANAGER)).await.unwrap();
        assert_eq!(response.total, 3);
        let numbers: Vec<&str> = response.approvals.iter().map(|a| a.entity_number.as_str()).collect();
        assert_eq!(numbers, ["P-12", "MSA-2025-002", "P-13"]);

        let first = &response.approvals[0];
        assert_eq!(first.description, "Proposal #P-12 - Taro (Sent 10 Mar)");
        assert_eq!(first.sent_date.as_deref(), Some("2025-03-10"));
        assert_eq!(response.approvals[1].description, "MSA #MSA-2025-002 - Taro (Client Review)");
        assert_eq!(response.approvals[2].client_name, "Unknown");
    }

    #[tokio::test]
    async fn test_sales_activities_name_the_submitting_client() {
        let undated = cr(5, "Approved");
        let submitted = change_requests::Model {
            created_at: at(2025, 3, 1),
            ..cr(4, "Under Review")
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![msa(1)]])
            .append_query_results([Vec::<sow_contracts::Model>::new()])
            .append_query_results([vec![submitted, undated]])
            .append_query_results([vec![client(5, "Taro")]])
            .into_connection();

        let response = DashboardService::sales_activities(&db, &sales_user(8, ROLE_SALES_REP)).await.unwrap();
        assert_eq!(response.total, 1);
        let item = &response.activities[0];
        assert_eq!(item.description, "CR-4 submitted by Taro");
        assert_eq!(item.timestamp, "2025-03-01T09:30:00");
        assert_eq!(item.entity_type, "CHANGE_REQUEST");
        assert!(item.time_ago.ends_with("ago"));
    }

    #[tokio::test]
    async fn test_client_cannot_read_sales_dashboard() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = DashboardService::sales_summary(&db, &sales_user(5, ROLE_CLIENT)).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
