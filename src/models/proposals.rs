// ============================================================================
// MODÈLE : PROPOSALS
// ============================================================================
//
// Description:
//   Proposition commerciale versionnée. Une seule version est "courante"
//   (is_current = true) par opportunité.
//
// Statuts:
//   draft -> internal_review -> sent_to_client -> approved -> converted_to_contract
//                                              -> revision_requested
//                            -> rejected
//
// Points d'attention:
//   - attachments_manifest est une liste JSON de clés S3 (texte)
//   - le client ne voit que sent_to_client, revision_requested et approved
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proposals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub contact_id: Option<i32>,
    pub opportunity_id: Option<i32>,
    pub version: i32,
    pub is_current: bool,
    pub title: Option<String>,
    pub status: String,
    pub reviewer_id: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub review_notes: Option<String>,
    pub review_action: Option<String>,
    pub review_submitted_at: Option<DateTime>,
    pub link: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub attachments_manifest: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub client_feedback: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

impl Model {
    /// Clés S3 listées dans le manifeste (liste JSON), vide si illisible
    pub fn attachment_keys(&self) -> Vec<String> {
        self.attachments_manifest
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default()
    }

    /// Une proposition est modifiable tant qu'elle est en brouillon non soumis
    pub fn can_edit(&self) -> bool {
        self.status == "draft" && self.review_submitted_at.is_none()
    }
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
