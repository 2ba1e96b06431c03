use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

/// Rôles stockés en texte dans users.role
pub const ROLE_CLIENT: &str = "CLIENT";
pub const ROLE_CLIENT_USER: &str = "CLIENT_USER";
pub const ROLE_SALES_MANAGER: &str = "SALES_MANAGER";
pub const ROLE_SALES_REP: &str = "SALES_REP";
pub const ROLE_ADMIN: &str = "ADMIN";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Option<String>, // Format: BCrypt $2a$10$...
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_active: bool,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

impl Model {
    /// Rôle effectif (CLIENT si vide)
    pub fn role_or_default(&self) -> &str {
        match self.role.as_deref() {
            Some(role) if !role.trim().is_empty() => role,
            _ => ROLE_CLIENT,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::password_reset_tokens::Entity")]
    PasswordResetTokens,
}

impl Related<super::password_reset_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PasswordResetTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
