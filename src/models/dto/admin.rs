use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::PageInfo;
use crate::models::{project_types, skills, users};

#[derive(Debug, Deserialize)]
pub struct AdminUserListQuery {
    pub role: Option<String>,
    /// active | deleted
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserDto {
    pub id: i32,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: Option<chrono::NaiveDateTime>,
}

impl From<users::Model> for AdminUserDto {
    fn from(user: users::Model) -> Self {
        Self {
            role: user.role_or_default().to_string(),
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminUserListResponse {
    pub users: Vec<AdminUserDto>,
    pub page: PageInfo,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "Email should be valid"))]
    pub email: String,
    #[validate(length(min = 2, max = 255, message = "Full name must be between 2 and 255 characters"))]
    pub full_name: String,
    pub role: String,
    #[validate(length(max = 50, message = "Phone must not exceed 50 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 255, message = "Full name must be between 2 and 255 characters"))]
    pub full_name: Option<String>,
    pub role: Option<String>,
    #[validate(length(max = 50, message = "Phone must not exceed 50 characters"))]
    pub phone: Option<String>,
}

// ---- Données de référence ----

#[derive(Debug, Deserialize)]
pub struct MasterDataQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    #[validate(length(min = 1, max = 100, message = "Skill name must be between 1 and 100 characters"))]
    pub name: String,
    pub description: Option<String>,
    /// Sous-compétences créées avec la compétence
    #[serde(default)]
    pub sub_skills: Vec<SubSkillRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubSkillRequest {
    #[validate(length(min = 1, max = 100, message = "Sub-skill name must be between 1 and 100 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub parent_skill_id: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_skills: Vec<SkillDto>,
}

impl From<skills::Model> for SkillDto {
    fn from(skill: skills::Model) -> Self {
        Self {
            id: skill.id,
            name: skill.name,
            description: skill.description,
            parent_skill_id: skill.parent_skill_id,
            sub_skills: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkillListResponse {
    pub content: Vec<SkillDto>,
    pub page: PageInfo,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectTypeRequest {
    #[validate(length(min = 1, max = 100, message = "Project type name must be between 1 and 100 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectTypeDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<project_types::Model> for ProjectTypeDto {
    fn from(p: project_types::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectTypeListResponse {
    pub content: Vec<ProjectTypeDto>,
    pub page: PageInfo,
}
