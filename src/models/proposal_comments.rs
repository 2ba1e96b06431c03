use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// Commentaires du client sur la proposition en cours (demande de changement)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proposal_comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub contact_id: i32,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub created_by: Option<i32>,
    pub created_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
