use serde::{Deserialize, Serialize};

// ---- Formulaire public ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormRequest {
    pub name: String,
    pub company_name: String,
    pub phone: String,
    pub email: String,
    pub title: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormResponse {
    pub success: bool,
    pub message: String,
    pub contact_id: i32,
}

// ---- Portail client ----

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContactListItem {
    pub no: u64,
    pub id: i32,
    pub contact_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub created_on: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContactListResponse {
    pub contacts: Vec<ClientContactListItem>,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactResponse {
    pub success: bool,
    pub message: String,
    pub contact_id: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationLogDto {
    pub id: i32,
    pub message: String,
    pub created_by: Option<i32>,
    pub date_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactProposalDto {
    pub id: i32,
    pub title: Option<String>,
    pub version: i32,
    pub status: String,
    pub link: Option<String>,
    pub attachments: Vec<String>,
    pub is_current: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetailResponse {
    pub id: i32,
    pub contact_id: String,
    pub client_name: String,
    pub phone: String,
    pub email: String,
    pub client_company: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub date_received: String,
    pub online_mtg_link: Option<String>,
    pub online_mtg_date: Option<String>,
    pub proposal_link: Option<String>,
    pub proposal_status: String,
    pub communication_logs: Vec<CommunicationLogDto>,
    pub proposals: Vec<ContactProposalDto>,
    pub latest_comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelConsultationRequest {
    pub reason: String,
}

// ---- Back-office sales ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesContactListQuery {
    pub search: Option<String>,
    /// Liste séparée par des virgules: NEW,INPROGRESS
    pub status: Option<String>,
    pub assignee_user_id: Option<i32>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesContactListItem {
    pub no: u64,
    pub contact_id: String,
    pub internal_id: i32,
    pub client_name: String,
    pub client_email: String,
    pub company: String,
    pub title: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub assignee_user_id: Option<i32>,
    pub assignee_name: Option<String>,
    pub created_on: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesContactListResponse {
    pub contacts: Vec<SalesContactListItem>,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesContactDetailResponse {
    pub id: i32,
    pub contact_id: String,
    pub client_user_id: Option<i32>,
    pub client_name: String,
    pub client_email: String,
    pub phone: String,
    pub company: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub request_type: Option<String>,
    pub priority: Option<String>,
    pub internal_note: Option<String>,
    pub online_mtg_link: Option<String>,
    pub online_mtg_date: Option<String>,
    pub assignee_user_id: Option<i32>,
    pub reviewer_id: Option<i32>,
    pub communication_progress: Option<String>,
    pub date_received: String,
    pub communication_logs: Vec<CommunicationLogDto>,
    pub opportunity_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSalesContactRequest {
    pub assignee_user_id: Option<i32>,
    pub reviewer_id: Option<i32>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub internal_note: Option<String>,
    pub online_mtg_link: Option<String>,
    pub online_mtg_date: Option<chrono::NaiveDateTime>,
}
