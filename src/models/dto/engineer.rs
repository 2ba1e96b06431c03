use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerSearchQuery {
    pub query: Option<String>,
    /// Liste séparée par des virgules, comparée à la compétence principale
    pub skills: Option<String>,
    pub experience_min: Option<i32>,
    pub experience_max: Option<i32>,
    pub seniority: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub availability: Option<bool>,
    /// experience (défaut) | seniority | salary
    pub sort_by: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerProfile {
    pub id: i32,
    pub full_name: String,
    pub years_experience: Option<i32>,
    pub seniority: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub primary_skill: Option<String>,
    pub salary_expectation: Option<Decimal>,
    pub status: Option<String>,
    pub profile_image_url: Option<String>,
    pub language_summary: Option<String>,
    /// web | game | ai-ml (déduit de la compétence principale)
    pub category: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerSearchResponse {
    pub results: Vec<EngineerProfile>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerSkillDto {
    pub skill_id: i32,
    pub name: String,
    pub level: Option<String>,
    pub years: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDto {
    pub id: i32,
    pub name: String,
    pub issued_by: Option<String>,
    pub issued_date: Option<chrono::NaiveDate>,
    pub expiry_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerDetail {
    #[serde(flatten)]
    pub profile: EngineerProfile,
    pub introduction: Option<String>,
    pub project_type_experience: Option<String>,
    pub interested_in_japan: Option<bool>,
    pub skills: Vec<EngineerSkillDto>,
    pub certificates: Vec<CertificateDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageStatistics {
    pub total_engineers: u64,
    pub total_customers: u64,
}

// ---- Admin ----

#[derive(Debug, Deserialize)]
pub struct AdminEngineerListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AdminEngineerListResponse {
    pub engineers: Vec<EngineerProfile>,
    pub page: super::common::PageInfo,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EngineerRequest {
    #[validate(length(min = 2, max = 255, message = "Full name must be between 2 and 255 characters"))]
    pub full_name: String,
    #[validate(range(min = 0, max = 60, message = "Years of experience must be between 0 and 60"))]
    pub years_experience: Option<i32>,
    pub seniority: Option<String>,
    pub summary: Option<String>,
    pub introduction: Option<String>,
    pub location: Option<String>,
    pub language_summary: Option<String>,
    pub status: Option<String>,
    pub profile_image_url: Option<String>,
    pub salary_expectation: Option<Decimal>,
    pub primary_skill: Option<String>,
    #[validate(email(message = "Email should be valid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub interested_in_japan: Option<bool>,
    pub project_type_experience: Option<String>,
}
