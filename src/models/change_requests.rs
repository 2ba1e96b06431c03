use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_UNDER_REVIEW: &str = "Under Review";
pub const STATUS_APPROVED: &str = "Approved";

// Demande de changement sur un contrat MSA ou SOW
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "change_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub change_request_id: Option<String>,
    pub msa_contract_id: Option<i32>,
    pub sow_contract_id: Option<i32>,
    pub title: String,
    pub request_type: Option<String>,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: Option<DateTime>,
}

impl Model {
    /// Identifiant affiché (CR-xxx) avec repli sur l'id numérique
    pub fn display_id(&self) -> String {
        self.change_request_id
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
