use serde::{Deserialize, Serialize};

use crate::models::proposals;

// ---- Portail client ----

#[derive(Debug, Deserialize)]
pub struct ClientProposalListQuery {
    pub search: Option<String>,
    /// All | Under review | Request for change | Approved
    pub status: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProposalListItem {
    pub no: u64,
    pub internal_id: i32,
    pub proposal_id: String,
    pub contact_id: String,
    pub contact_description: Option<String>,
    pub title: Option<String>,
    pub status: String,
    pub date: String,
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProposalListResponse {
    pub proposals: Vec<ClientProposalListItem>,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total: u64,
}

impl ClientProposalListResponse {
    /// Réponse vide renvoyée quand la liste ne peut pas être chargée
    pub fn empty(page: u64, page_size: u64) -> Self {
        Self {
            proposals: Vec::new(),
            page,
            page_size,
            total_pages: 0,
            total: 0,
        }
    }
}

// ---- Back-office sales ----

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    pub s3_key: String,
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalRequest {
    pub title: Option<String>,
    pub link: Option<String>,
    pub reviewer_id: Option<i32>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProposalRequest {
    pub title: Option<String>,
    pub link: Option<String>,
    pub attachments: Option<Vec<AttachmentRef>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignReviewerRequest {
    pub reviewer_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    /// APPROVE | REQUEST_REVISION | REJECT
    pub action: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDto {
    pub id: i32,
    pub opportunity_id: Option<i32>,
    pub contact_id: Option<i32>,
    pub version: i32,
    pub is_current: bool,
    pub title: Option<String>,
    pub status: String,
    pub reviewer_id: Option<i32>,
    pub review_notes: Option<String>,
    pub review_action: Option<String>,
    pub review_submitted_at: Option<chrono::NaiveDateTime>,
    pub link: Option<String>,
    pub attachments: Vec<String>,
    pub client_feedback: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: Option<chrono::NaiveDateTime>,
    pub can_edit: bool,
}

impl From<proposals::Model> for ProposalDto {
    fn from(p: proposals::Model) -> Self {
        Self {
            attachments: p.attachment_keys(),
            can_edit: p.can_edit(),
            id: p.id,
            opportunity_id: p.opportunity_id,
            contact_id: p.contact_id,
            version: p.version,
            is_current: p.is_current,
            title: p.title,
            status: p.status,
            reviewer_id: p.reviewer_id,
            review_notes: p.review_notes,
            review_action: p.review_action,
            review_submitted_at: p.review_submitted_at,
            link: p.link,
            client_feedback: p.client_feedback,
            created_by: p.created_by,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalHistoryDto {
    pub id: i32,
    pub proposal_id: Option<i32>,
    pub activity_type: String,
    pub activity_description: String,
    pub file_link: Option<String>,
    pub created_by: Option<i32>,
    pub date: String,
}
