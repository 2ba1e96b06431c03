use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::contract_status::ContractStatus;

// Bon de commande (Statement of Work) rattaché à un MSA
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sow_contracts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub client_id: i32,
    pub parent_msa_id: Option<i32>,
    pub contract_name: String,
    pub engagement_type: Option<String>, // Fixed Price | Retainer
    pub status: ContractStatus,
    pub period_start: Option<Date>,
    pub period_end: Option<Date>,
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub assignee_user_id: Option<i32>,
    pub link: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::msa_contracts::Entity",
        from = "Column::ParentMsaId",
        to = "super::msa_contracts::Column::Id"
    )]
    MsaContract,
}

impl Related<super::msa_contracts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MsaContract.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
