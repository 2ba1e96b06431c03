// ============================================================================
// MODÈLE : CONTACTS
// ============================================================================
//
// Description:
//   Demande entrante d'un client (formulaire public ou portail client).
//   Point de départ du pipeline: Contact -> Opportunity -> Proposal -> Contrat.
//
// Statuts (texte):
//   New, Inprogress, Completed, Closed, Converted to Opportunity
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_NEW: &str = "New";
pub const STATUS_IN_PROGRESS: &str = "Inprogress";
pub const STATUS_CLOSED: &str = "Closed";
pub const STATUS_CONVERTED: &str = "Converted to Opportunity";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub client_user_id: Option<i32>,
    pub assignee_user_id: Option<i32>,
    pub reviewer_id: Option<i32>,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: Option<String>,
    pub request_type: Option<String>,
    pub priority: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub internal_note: Option<String>,
    pub online_mtg_link: Option<String>,
    pub online_mtg_date: Option<DateTime>,
    pub communication_progress: Option<String>,
    pub created_by: Option<i32>,
    pub proposal_link: Option<String>,
    pub proposal_status: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ClientUserId",
        to = "super::users::Column::Id"
    )]
    ClientUser,

    #[sea_orm(has_many = "super::communication_logs::Entity")]
    CommunicationLogs,

    #[sea_orm(has_many = "super::proposals::Entity")]
    Proposals,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientUser.def()
    }
}

impl Related<super::communication_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommunicationLogs.def()
    }
}

impl Related<super::proposals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Proposals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
