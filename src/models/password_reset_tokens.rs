// ============================================================================
// MODÈLE : PASSWORD RESET TOKENS
// ============================================================================
//
// Description:
//   Tokens de réinitialisation de mot de passe, partagés par les trois
//   portails (client, sales, admin).
//
// Colonnes de la table password_reset_tokens:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - user_id (INTEGER, NOT NULL, FK vers users)
//   - token (VARCHAR, UNIQUE, NOT NULL) - UUID v4
//   - expires_at (TIMESTAMP, NOT NULL) - created_at + 1 heure
//   - used (BOOLEAN, DEFAULT FALSE, NOT NULL)
//   - created_at (TIMESTAMP, DEFAULT CURRENT_TIMESTAMP)
//
// Workflow:
//   1. User demande reset via POST /api/auth/forgot-password (avec son portail)
//   2. Les anciens tokens non utilisés du user sont invalidés (used = true)
//   3. Backend génère un token UUID v4 et l'insère dans cette table
//   4. Backend envoie un email avec {base_url}/{portail}/reset-password?token=...
//   5. Frontend envoie POST /api/auth/reset-password avec token + nouveau password
//   6. Backend vérifie: token existe, not expired, not used, user actif
//   7. Backend change le password et met used = true
//
// Points d'attention:
//   - Un token ne peut être utilisé qu'une fois (used = true)
//   - Token expire après RESET_TOKEN_TTL_SECONDS (3600 par défaut)
//   - Token est un UUID v4 (très difficile à deviner)
//   - ON DELETE CASCADE: si user supprimé, tokens supprimés aussi
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    #[sea_orm(unique)]
    pub token: String,

    pub expires_at: DateTime,

    pub used: bool,

    pub created_at: Option<DateTime>,
}

impl Model {
    /// Un token est valide s'il n'a pas servi et n'a pas expiré
    pub fn is_valid_at(&self, now: DateTime) -> bool {
        !self.used && self.expires_at > now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}