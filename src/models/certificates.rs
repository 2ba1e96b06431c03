use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub engineer_id: i32,
    pub name: String,
    pub issued_by: Option<String>,
    pub issued_date: Option<Date>,
    pub expiry_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::engineers::Entity",
        from = "Column::EngineerId",
        to = "super::engineers::Column::Id"
    )]
    Engineer,
}

impl Related<super::engineers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Engineer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
