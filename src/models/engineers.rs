// ============================================================================
// MODÈLE : ENGINEERS
// ============================================================================
//
// Description:
//   Catalogue des ingénieurs proposés aux clients (recherche publique,
//   page d'accueil, administration).
//
// Points d'attention:
//   - status = "AVAILABLE" pour les ingénieurs disponibles
//   - profile_image_url peut être une URL http(s) ou une clé S3
//
// ============================================================================

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_AVAILABLE: &str = "AVAILABLE";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "engineers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub full_name: String,
    pub years_experience: Option<i32>,
    pub seniority: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub introduction: Option<String>,
    pub location: Option<String>,
    pub language_summary: Option<String>,
    pub status: Option<String>,
    pub profile_image_url: Option<String>,
    pub salary_expectation: Option<Decimal>,
    pub primary_skill: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<Date>,
    pub interested_in_japan: Option<bool>,
    pub project_type_experience: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::certificates::Entity")]
    Certificates,

    #[sea_orm(has_many = "super::engineer_skills::Entity")]
    EngineerSkills,
}

impl Related<super::certificates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certificates.def()
    }
}

impl Related<super::engineer_skills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EngineerSkills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
