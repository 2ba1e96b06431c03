use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// Journal des actions sur les propositions d'une opportunité
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proposal_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub opportunity_id: i32,
    pub proposal_id: Option<i32>,
    pub activity_type: String,
    #[sea_orm(column_type = "Text")]
    pub activity_description: String,
    pub file_link: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
