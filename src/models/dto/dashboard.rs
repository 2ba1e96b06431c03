use serde::Serialize;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub in_progress: u64,
    pub waiting_response: u64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummary {
    pub under_review: u64,
    pub reviewed: u64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSummary {
    pub active: u64,
    pub draft: u64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestSummary {
    pub under_review: u64,
    pub approved: u64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub contacts: ContactSummary,
    pub proposals: ProposalSummary,
    pub contracts: ContractSummary,
    pub change_requests: ChangeRequestSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    pub id: i32,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub title: String,
    pub description: String,
    pub date: String,
    #[serde(skip)]
    pub sort_key: Option<chrono::NaiveDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDto {
    pub id: i32,
    pub message: String,
    pub priority: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityDto>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertDto>,
    pub total: usize,
}

// ---- Admin ----

#[derive(Debug, Default, Serialize)]
pub struct ActiveInactive {
    pub active: u64,
    pub inactive: u64,
}

#[derive(Debug, Default, Serialize)]
pub struct Total {
    pub total: u64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardSummary {
    pub engineers: ActiveInactive,
    pub system_users: ActiveInactive,
    pub skills: Total,
    pub project_types: Total,
}

// ---- Sales ----

#[derive(Debug, Default, Serialize)]
pub struct AllNew {
    pub all: u64,
    #[serde(rename = "new")]
    pub new_count: u64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllUnderReview {
    pub all: u64,
    pub under_review: u64,
}

/// Chiffre d'affaires d'un mois (yyyy/MM, en yens)
#[derive(Debug, Serialize)]
pub struct RevenueItem {
    pub month: String,
    pub amount: i64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesDashboardSummary {
    pub contacts: AllNew,
    pub opportunities: AllUnderReview,
    pub proposals: AllUnderReview,
    pub contracts: AllUnderReview,
    pub change_requests: AllUnderReview,
    /// SALES_MANAGER uniquement
    pub revenue: Option<Vec<RevenueItem>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalItem {
    pub id: i32,
    /// PROPOSAL | MSA | SOW
    pub entity_type: String,
    pub entity_number: String,
    pub entity_id: i32,
    pub client_name: String,
    pub status: String,
    /// yyyy-MM-dd
    pub sent_date: Option<String>,
    pub description: String,
    #[serde(skip)]
    pub sort_key: Option<chrono::NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct ApprovalsResponse {
    pub approvals: Vec<ApprovalItem>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesActivityItem {
    pub id: i32,
    pub description: String,
    pub time_ago: String,
    pub timestamp: String,
    pub entity_type: String,
    pub entity_id: i32,
    pub client_name: String,
}

#[derive(Debug, Serialize)]
pub struct SalesActivitiesResponse {
    pub activities: Vec<SalesActivityItem>,
    pub total: usize,
}
