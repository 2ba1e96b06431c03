// ============================================================================
// SERVICE : INGÉNIEURS (recherche publique + page d'accueil)
// ============================================================================
//
// Recherche:
//   - texte libre sur nom, compétence principale, résumé et localisation
//   - filtres: compétences, expérience, séniorité, localisation, salaire,
//     disponibilité (AVAILABLE)
//   - tri: experience (défaut, desc), seniority (asc), salary (desc)
//   - résumé tronqué à 200 caractères, photos S3 pré-signées 24h
//
// Page d'accueil:
//   - 9 ingénieurs disponibles mis en avant
//   - 3 par catégorie (web / game / ai-ml), catégorie inconnue -> web
//
// ============================================================================

use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::models::dto::common::{clean_search, split_list, Paging};
use crate::models::dto::engineer::{
    CertificateDto, EngineerDetail, EngineerProfile, EngineerSearchQuery, EngineerSearchResponse,
    EngineerSkillDto, HomepageStatistics,
};
use crate::models::{certificates, contacts, engineer_skills, engineers, skills};
use crate::services::s3_service::S3Service;
use crate::utils::format::truncate_summary;
use crate::utils::query::ci_contains;

pub const SUMMARY_MAX_CHARS: usize = 200;
pub const FEATURED_COUNT: u64 = 9;
pub const PER_CATEGORY_COUNT: u64 = 3;

/// Catégorie de la page d'accueil
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Web,
    Game,
    AiMl,
}

impl Category {
    /// Catégorie demandée dans l'URL (inconnue -> Web)
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "game" => Category::Game,
            "ai-ml" | "aiml" => Category::AiMl,
            _ => Category::Web,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Web => "web",
            Category::Game => "game",
            Category::AiMl => "ai-ml",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Web => &["web", "frontend", "backend", "react", "angular", "vue"],
            Category::Game => &["game", "unity", "unreal", "godot"],
            Category::AiMl => &["ai", "ml", "machine learning", "deep learning", "data science"],
        }
    }

    /// Catégorie déduite de la compétence principale
    pub fn of_skill(primary_skill: Option<&str>) -> Self {
        let Some(skill) = primary_skill.map(str::to_lowercase) else {
            return Category::Web;
        };
        [Category::Web, Category::Game, Category::AiMl]
            .into_iter()
            .find(|c| c.keywords().iter().any(|k| skill.contains(k)))
            .unwrap_or(Category::Web)
    }
}

/// Filtres disponibles pour la recherche publique
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Skills,
    Locations,
    Seniorities,
}

impl FilterKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "skills" => Some(FilterKind::Skills),
            "locations" => Some(FilterKind::Locations),
            "seniorities" => Some(FilterKind::Seniorities),
            _ => None,
        }
    }
}

pub struct EngineerService;

impl EngineerService {
    pub async fn search(
        db: &DatabaseConnection,
        s3: &S3Service,
        query: &EngineerSearchQuery,
    ) -> AppResult<EngineerSearchResponse> {
        let paging = Paging::new(query.page, query.size);
        let mut select = engineers::Entity::find();

        // 1. Texte libre
        if let Some(text) = clean_search(query.query.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(ci_contains((engineers::Entity, engineers::Column::FullName), &text))
                    .add(ci_contains((engineers::Entity, engineers::Column::PrimarySkill), &text))
                    .add(ci_contains((engineers::Entity, engineers::Column::Summary), &text))
                    .add(ci_contains((engineers::Entity, engineers::Column::Location), &text)),
            );
        }

        // 2. Filtres
        let wanted_skills = split_list(query.skills.as_deref());
        if !wanted_skills.is_empty() {
            let condition = wanted_skills.iter().fold(Condition::any(), |cond, skill| {
                cond.add(ci_contains((engineers::Entity, engineers::Column::PrimarySkill), skill))
            });
            select = select.filter(condition);
        }
        if let Some(min) = query.experience_min {
            select = select.filter(engineers::Column::YearsExperience.gte(min));
        }
        if let Some(max) = query.experience_max {
            select = select.filter(engineers::Column::YearsExperience.lte(max));
        }
        let seniorities = split_list(query.seniority.as_deref());
        if !seniorities.is_empty() {
            select = select.filter(engineers::Column::Seniority.is_in(seniorities));
        }
        let locations = split_list(query.location.as_deref());
        if !locations.is_empty() {
            select = select.filter(engineers::Column::Location.is_in(locations));
        }
        if let Some(min) = query.salary_min {
            select = select.filter(engineers::Column::SalaryExpectation.gte(min));
        }
        if let Some(max) = query.salary_max {
            select = select.filter(engineers::Column::SalaryExpectation.lte(max));
        }
        if query.availability == Some(true) {
            select = select.filter(engineers::Column::Status.eq(engineers::STATUS_AVAILABLE));
        }

        // 3. Tri
        select = match query.sort_by.as_deref().map(str::to_lowercase).as_deref() {
            Some("seniority") => select.order_by_asc(engineers::Column::Seniority),
            Some("salary") => select.order_by_desc(engineers::Column::SalaryExpectation),
            _ => select.order_by_desc(engineers::Column::YearsExperience),
        };

        // 4. Pagination
        let paginator = select.order_by_asc(engineers::Column::Id).paginate(db, paging.size);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(paging.page).await?;

        Ok(EngineerSearchResponse {
            results: rows.into_iter().map(|e| to_profile(s3, e)).collect(),
            total: totals.number_of_items,
            page: paging.page,
            size: paging.size,
            total_pages: totals.number_of_pages,
        })
    }

    /// Valeurs proposées dans les filtres de recherche (triées, sans doublon)
    pub async fn filter_values(db: &DatabaseConnection, kind: FilterKind) -> AppResult<Vec<String>> {
        let values: Vec<Option<String>> = match kind {
            FilterKind::Skills => {
                skills::Entity::find()
                    .select_only()
                    .column(skills::Column::Name)
                    .filter(skills::Column::ParentSkillId.is_null())
                    .distinct()
                    .order_by_asc(skills::Column::Name)
                    .into_tuple::<Option<String>>()
                    .all(db)
                    .await?
            }
            FilterKind::Locations => {
                engineers::Entity::find()
                    .select_only()
                    .column(engineers::Column::Location)
                    .filter(engineers::Column::Location.is_not_null())
                    .distinct()
                    .order_by_asc(engineers::Column::Location)
                    .into_tuple::<Option<String>>()
                    .all(db)
                    .await?
            }
            FilterKind::Seniorities => {
                engineers::Entity::find()
                    .select_only()
                    .column(engineers::Column::Seniority)
                    .filter(engineers::Column::Seniority.is_not_null())
                    .distinct()
                    .order_by_asc(engineers::Column::Seniority)
                    .into_tuple::<Option<String>>()
                    .all(db)
                    .await?
            }
        };

        Ok(values
            .into_iter()
            .flatten()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect())
    }

    pub async fn get_detail(db: &DatabaseConnection, s3: &S3Service, id: i32) -> AppResult<EngineerDetail> {
        let engineer = engineers::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Engineer not found"))?;

        let skills = engineer_skills::Entity::find()
            .find_also_related(skills::Entity)
            .filter(engineer_skills::Column::EngineerId.eq(engineer.id))
            .all(db)
            .await?
            .into_iter()
            .map(|(link, skill)| EngineerSkillDto {
                skill_id: link.skill_id,
                name: skill.map(|s| s.name).unwrap_or_default(),
                level: link.level,
                years: link.years,
            })
            .collect();

        let certificates = certificates::Entity::find()
            .filter(certificates::Column::EngineerId.eq(engineer.id))
            .order_by_desc(certificates::Column::IssuedDate)
            .all(db)
            .await?
            .into_iter()
            .map(|c| CertificateDto {
                id: c.id,
                name: c.name,
                issued_by: c.issued_by,
                issued_date: c.issued_date,
                expiry_date: c.expiry_date,
            })
            .collect();

        Ok(to_detail(s3, engineer, skills, certificates))
    }

    /// Ingénieurs disponibles et clients ayant au moins un contact
    pub async fn homepage_statistics(db: &DatabaseConnection) -> AppResult<HomepageStatistics> {
        let total_engineers = engineers::Entity::find()
            .filter(engineers::Column::Status.eq(engineers::STATUS_AVAILABLE))
            .count(db)
            .await?;
        let total_customers = contacts::Entity::find()
            .select_only()
            .column(contacts::Column::ClientUserId)
            .filter(contacts::Column::ClientUserId.is_not_null())
            .distinct()
            .count(db)
            .await?;

        Ok(HomepageStatistics {
            total_engineers,
            total_customers,
        })
    }

    pub async fn featured(db: &DatabaseConnection, s3: &S3Service) -> AppResult<Vec<EngineerProfile>> {
        let rows = engineers::Entity::find()
            .filter(engineers::Column::Status.eq(engineers::STATUS_AVAILABLE))
            .order_by_desc(engineers::Column::CreatedAt)
            .limit(FEATURED_COUNT)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|e| to_profile(s3, e)).collect())
    }

    pub async fn by_category(db: &DatabaseConnection, s3: &S3Service, category: &str) -> AppResult<Vec<EngineerProfile>> {
        let category = Category::parse(category);
        let condition = category.keywords().iter().fold(Condition::any(), |cond, keyword| {
            cond.add(ci_contains((engineers::Entity, engineers::Column::PrimarySkill), keyword))
        });

        let rows = engineers::Entity::find()
            .filter(engineers::Column::Status.eq(engineers::STATUS_AVAILABLE))
            .filter(condition)
            .order_by_desc(engineers::Column::CreatedAt)
            .limit(PER_CATEGORY_COUNT)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|e| to_profile(s3, e)).collect())
    }
}

pub fn to_profile(s3: &S3Service, engineer: engineers::Model) -> EngineerProfile {
    EngineerProfile {
        summary: engineer.summary.as_deref().map(|s| truncate_summary(s, SUMMARY_MAX_CHARS)),
        profile_image_url: s3.image_url(engineer.profile_image_url.as_deref()),
        category: Category::of_skill(engineer.primary_skill.as_deref()).as_str().to_string(),
        id: engineer.id,
        full_name: engineer.full_name,
        years_experience: engineer.years_experience,
        seniority: engineer.seniority,
        location: engineer.location,
        primary_skill: engineer.primary_skill,
        salary_expectation: engineer.salary_expectation,
        status: engineer.status,
        language_summary: engineer.language_summary,
    }
}

pub fn to_detail(
    s3: &S3Service,
    engineer: engineers::Model,
    skills: Vec<EngineerSkillDto>,
    certificates: Vec<CertificateDto>,
) -> EngineerDetail {
    let introduction = engineer.introduction.clone();
    let project_type_experience = engineer.project_type_experience.clone();
    let interested_in_japan = engineer.interested_in_japan;
    let full_summary = engineer.summary.clone();

    let mut profile = to_profile(s3, engineer);
    profile.summary = full_summary;

    EngineerDetail {
        profile,
        introduction,
        project_type_experience,
        interested_in_japan,
        skills,
        certificates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::S3Config;

    fn engineer(summary: &str, image: Option<&str>) -> engineers::Model {
        engineers::Model {
            id: 1,
            full_name: "Nguyen Van A".to_string(),
            years_experience: Some(5),
            seniority: Some("Senior".to_string()),
            summary: Some(summary.to_string()),
            introduction: None,
            location: Some("Hanoi".to_string()),
            language_summary: Some("JLPT N2".to_string()),
            status: Some("AVAILABLE".to_string()),
            profile_image_url: image.map(str::to_string),
            salary_expectation: None,
            primary_skill: Some("Unity Game Developer".to_string()),
            email: None,
            phone: None,
            gender: None,
            date_of_birth: None,
            interested_in_japan: Some(true),
            project_type_experience: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_category_parse_and_mapping() {
        assert_eq!(Category::parse("AI-ML"), Category::AiMl);
        assert_eq!(Category::parse("mobile"), Category::Web);
        assert_eq!(Category::of_skill(Some("React Frontend")), Category::Web);
        assert_eq!(Category::of_skill(Some("Unreal Engine")), Category::Game);
        assert_eq!(Category::of_skill(Some("Data Science")), Category::AiMl);
        assert_eq!(Category::of_skill(None), Category::Web);
    }

    #[test]
    fn test_profile_truncates_summary_and_keeps_http_images() {
        let s3 = S3Service::new(S3Config::default());
        let profile = to_profile(&s3, engineer(&"a".repeat(250), Some("https://cdn.example.com/a.png")));

        assert_eq!(profile.summary.as_deref().map(str::len), Some(203));
        assert!(profile.summary.unwrap().ends_with("..."));
        assert_eq!(profile.profile_image_url.as_deref(), Some("https://cdn.example.com/a.png"));
        assert_eq!(profile.category, "game");
    }

    #[test]
    fn test_s3_key_image_without_storage_is_dropped() {
        let s3 = S3Service::new(S3Config::default());
        let profile = to_profile(&s3, engineer("short", Some("engineers/1.png")));
        assert_eq!(profile.profile_image_url, None);
    }

    #[test]
    fn test_detail_keeps_full_summary() {
        let s3 = S3Service::new(S3Config::default());
        let detail = to_detail(&s3, engineer(&"b".repeat(250), None), vec![], vec![]);
        assert_eq!(detail.profile.summary.map(|s| s.len()), Some(250));
    }

    #[test]
    fn test_filter_kind() {
        assert_eq!(FilterKind::parse("locations"), Some(FilterKind::Locations));
        assert_eq!(FilterKind::parse("salary"), None);
    }

    #[tokio::test]
    async fn test_unknown_engineer() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<engineers::Model>::new()])
            .into_connection();
        let s3 = S3Service::new(S3Config::default());

        let err = EngineerService::get_detail(&db, &s3, 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Engineer not found"));
    }
}
