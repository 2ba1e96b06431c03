use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ContractListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    /// All | MSA | SOW
    #[serde(rename = "type")]
    pub contract_type: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractListItem {
    pub no: u64,
    pub internal_id: i32,
    pub id: String,
    pub contract_name: String,
    #[serde(rename = "type")]
    pub contract_type: String,
    pub status: String,
    pub period: String,
    pub value: String,
    pub assignee_user_id: Option<i32>,
    #[serde(skip)]
    pub created_at: Option<chrono::NaiveDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractListResponse {
    pub contracts: Vec<ContractListItem>,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestDto {
    pub id: i32,
    pub change_request_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub request_type: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub created_on: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDetail {
    pub internal_id: i32,
    pub id: String,
    pub contract_name: String,
    #[serde(rename = "type")]
    pub contract_type: String,
    pub status: String,
    pub period: String,
    pub value: String,
    pub currency: Option<String>,
    pub engagement_type: Option<String>,
    pub parent_msa_id: Option<i32>,
    pub link: Option<String>,
    pub assignee_user_id: Option<i32>,
    pub created_on: String,
    pub change_requests: Vec<ChangeRequestDto>,
}

// ---- Back-office sales ----

/// Création / modification d'un MSA
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsaContractRequest {
    /// Code OP-YYYY-NN de l'opportunité d'origine
    pub opportunity_id: Option<String>,
    /// Facultatif si l'opportunité permet de retrouver le compte client
    pub client_id: Option<i32>,
    pub effective_start: NaiveDate,
    pub effective_end: NaiveDate,
    pub assignee_user_id: i32,
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SowContractRequest {
    pub parent_msa_id: i32,
    pub project_name: Option<String>,
    /// Fixed Price | Retainer
    pub engagement_type: String,
    pub effective_start: NaiveDate,
    pub effective_end: NaiveDate,
    pub assignee_user_id: i32,
    pub value: Option<Decimal>,
    pub link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractReviewRequest {
    /// APPROVE | REQUEST_REVISION
    pub action: String,
    pub review_notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesContractResponse {
    pub id: i32,
    pub contract_id: String,
    pub contract_name: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesContractDetail {
    #[serde(flatten)]
    pub contract: ContractDetail,
    pub client_id: i32,
    pub client_name: String,
    pub client_email: String,
    pub opportunity_id: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}
