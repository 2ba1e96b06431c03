use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::proposal::{ProposalDto, ProposalHistoryDto};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityListQuery {
    pub search: Option<String>,
    /// Liste séparée par des virgules: NEW,REVISION
    pub status: Option<String>,
    pub created_by: Option<i32>,
    pub assignee_user_id: Option<i32>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityListItem {
    pub no: u64,
    pub id: i32,
    pub opportunity_id: String,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_company: Option<String>,
    pub est_value: Decimal,
    pub currency: String,
    pub probability: i32,
    pub status: String,
    pub stage: String,
    pub assignee_user_id: Option<i32>,
    pub created_by: Option<i32>,
    pub created_on: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityListResponse {
    pub opportunities: Vec<OpportunityListItem>,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityDetail {
    pub id: i32,
    pub opportunity_id: String,
    pub contact_id: Option<i32>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_company: Option<String>,
    pub est_value: Decimal,
    pub currency: String,
    pub probability: i32,
    pub status: String,
    pub stage: String,
    pub assignee_user_id: Option<i32>,
    pub created_by: Option<i32>,
    pub created_at: Option<chrono::NaiveDateTime>,
    pub current_proposal: Option<ProposalDto>,
    pub proposals: Vec<ProposalDto>,
    pub history: Vec<ProposalHistoryDto>,
}

// Mise à jour par un sales (validée avant écriture)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOpportunityRequest {
    #[validate(length(min = 2, max = 255, message = "Client name must be between 2 and 255 characters"))]
    pub client_name: String,
    #[validate(length(min = 2, max = 255, message = "Company name must be between 2 and 255 characters"))]
    pub client_company: Option<String>,
    #[validate(length(max = 255, message = "Email must not exceed 255 characters"))]
    pub client_email: String,
    #[validate(range(min = 0, max = 100, message = "Probability must be between 0 and 100"))]
    pub probability: i32,
    pub est_value: Decimal,
    #[validate(length(max = 10, message = "Currency must not exceed 10 characters"))]
    pub currency: String,
    pub assignee_user_id: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertToContractResponse {
    pub success: bool,
    pub message: String,
    pub opportunity_id: String,
    pub msa_contract_id: i32,
    pub contract_id: String,
}
