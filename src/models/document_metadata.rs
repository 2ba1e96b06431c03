// ============================================================================
// MODÈLE : DOCUMENT METADATA
// ============================================================================
//
// Description:
//   Métadonnées de chaque objet S3 servant au contrôle d'accès.
//
// Colonnes notables:
//   - allowed_roles : liste JSON de rôles, ex: ["SALES_MANAGER","SALES_REP"]
//   - allowed_users : liste JSON d'ids, ex: [3, 12]
//   - entity_type   : proposal | msa_contract | sow_contract | ...
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document_metadata")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub s3_key: String,
    pub owner_id: Option<i32>,
    pub document_type: Option<String>,
    pub entity_id: Option<i32>,
    pub entity_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub allowed_roles: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub allowed_users: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

impl Model {
    pub fn allowed_role_list(&self) -> Vec<String> {
        self.allowed_roles
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    pub fn allowed_user_list(&self) -> Vec<i32> {
        self.allowed_users
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
