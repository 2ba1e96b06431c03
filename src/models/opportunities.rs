// ============================================================================
// MODÈLE : OPPORTUNITIES
// ============================================================================
//
// Description:
//   Entrée du pipeline commercial, créée depuis un contact par un sales.
//   opportunity_id est l'identifiant lisible OP-YYYY-NN.
//
// Statuts:
//   NEW, PROPOSAL_DRAFTING, PROPOSAL_SENT, CLIENT_UNDER_REVIEW, REVISION, WON, LOST
//
// ============================================================================

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "opportunities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub opportunity_id: String,
    pub contact_id: Option<i32>,
    pub est_value: Decimal,
    pub currency: String,
    pub probability: i32,
    pub client_email: Option<String>,
    pub client_name: Option<String>,
    pub client_company: Option<String>,
    pub status: String,
    pub assignee_user_id: Option<i32>,
    pub created_by: Option<i32>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contacts::Entity",
        from = "Column::ContactId",
        to = "super::contacts::Column::Id"
    )]
    Contact,
}

impl Related<super::contacts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contact.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
