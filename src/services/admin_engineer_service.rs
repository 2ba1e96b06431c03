// ============================================================================
// SERVICE : INGÉNIEURS (admin)
// ============================================================================
//
// Liste paginée (recherche nom / email / compétence, filtre statut),
// création, mise à jour, suppression et URL d'envoi des photos.
//
// Points d'attention:
//   - statut par défaut: AVAILABLE
//   - la suppression retire aussi compétences et certificats (transaction)
//   - les photos sont envoyées sous "engineers/" via une URL PUT pré-signée
//
// ============================================================================

use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::models::dto::common::{clean_search, PageInfo, Paging};
use crate::models::dto::document::{UploadUrlRequest, UploadUrlResponse};
use crate::models::dto::engineer::{AdminEngineerListQuery, AdminEngineerListResponse, EngineerProfile, EngineerRequest};
use crate::models::{certificates, engineer_skills, engineers};
use crate::services::engineer_service::to_profile;
use crate::services::s3_service::{build_upload_key, S3Service};
use crate::utils::query::ci_contains;
use crate::utils::validation::validate_request;
use crate::utils::time;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

pub struct AdminEngineerService;

impl AdminEngineerService {
    pub async fn list(
        db: &DatabaseConnection,
        s3: &S3Service,
        query: &AdminEngineerListQuery,
    ) -> AppResult<AdminEngineerListResponse> {
        let paging = Paging::new(query.page, query.size);
        let mut select = engineers::Entity::find();

        if let Some(status) = clean_search(query.status.as_deref()) {
            select = select.filter(engineers::Column::Status.eq(status.to_uppercase()));
        }
        if let Some(search) = clean_search(query.search.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(ci_contains((engineers::Entity, engineers::Column::FullName), &search))
                    .add(ci_contains((engineers::Entity, engineers::Column::Email), &search))
                    .add(ci_contains((engineers::Entity, engineers::Column::PrimarySkill), &search)),
            );
        }

        let paginator = select
            .order_by_desc(engineers::Column::CreatedAt)
            .order_by_desc(engineers::Column::Id)
            .paginate(db, paging.size);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(paging.page).await?;

        Ok(AdminEngineerListResponse {
            engineers: rows.into_iter().map(|e| to_profile(s3, e)).collect(),
            page: PageInfo {
                total_elements: totals.number_of_items,
                total_pages: totals.number_of_pages,
                number: paging.page,
                size: paging.size,
            },
        })
    }

    pub async fn create(db: &DatabaseConnection, s3: &S3Service, request: EngineerRequest) -> AppResult<EngineerProfile> {
        validate_request(&request)?;
        let now = time::now_jst();

        let mut active = engineers::ActiveModel {
            created_at: Set(Some(now)),
            ..Default::default()
        };
        apply(&mut active, request);
        active.updated_at = Set(Some(now));

        let engineer = active.insert(db).await?;
        tracing::info!(engineer_id = engineer.id, "Engineer created");
        Ok(to_profile(s3, engineer))
    }

    pub async fn update(
        db: &DatabaseConnection,
        s3: &S3Service,
        id: i32,
        request: EngineerRequest,
    ) -> AppResult<EngineerProfile> {
        validate_request(&request)?;
        let engineer = find_engineer(db, id).await?;

        let mut active: engineers::ActiveModel = engineer.into();
        apply(&mut active, request);
        active.updated_at = Set(Some(time::now_jst()));

        let engineer = active.update(db).await?;
        tracing::info!(engineer_id = id, "Engineer updated");
        Ok(to_profile(s3, engineer))
    }

    pub async fn delete(db: &DatabaseConnection, id: i32) -> AppResult<()> {
        find_engineer(db, id).await?;

        let txn = db.begin().await?;
        engineer_skills::Entity::delete_many()
            .filter(engineer_skills::Column::EngineerId.eq(id))
            .exec(&txn)
            .await?;
        certificates::Entity::delete_many()
            .filter(certificates::Column::EngineerId.eq(id))
            .exec(&txn)
            .await?;
        engineers::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(engineer_id = id, "Engineer deleted");
        Ok(())
    }

    /// URL PUT pour la photo; la clé retournée se stocke dans profileImageUrl
    pub fn image_upload_url(s3: &S3Service, request: &UploadUrlRequest) -> AppResult<UploadUrlResponse> {
        if !is_image_file_name(&request.file_name) {
            return Err(AppError::bad_request("Only image files are allowed (png, jpg, jpeg, webp)"));
        }

        let key = build_upload_key("engineers", &request.file_name);
        let expiration_minutes = s3.default_expiration_minutes();
        let upload_url = s3.presigned_put_url(&key, expiration_minutes)?;

        Ok(UploadUrlResponse {
            upload_url,
            s3_key: key,
            expiration_minutes,
        })
    }
}

async fn find_engineer(db: &DatabaseConnection, id: i32) -> AppResult<engineers::Model> {
    engineers::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Engineer not found"))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Recopie le formulaire dans le modèle actif
fn apply(active: &mut engineers::ActiveModel, request: EngineerRequest) {
    let status = trimmed(request.status)
        .map(|s| s.to_uppercase())
        .unwrap_or_else(|| engineers::STATUS_AVAILABLE.to_string());

    active.full_name = Set(request.full_name.trim().to_string());
    active.years_experience = Set(request.years_experience);
    active.seniority = Set(trimmed(request.seniority));
    active.summary = Set(trimmed(request.summary));
    active.introduction = Set(trimmed(request.introduction));
    active.location = Set(trimmed(request.location));
    active.language_summary = Set(trimmed(request.language_summary));
    active.status = Set(Some(status));
    active.profile_image_url = Set(trimmed(request.profile_image_url));
    active.salary_expectation = Set(request.salary_expectation);
    active.primary_skill = Set(trimmed(request.primary_skill));
    active.email = Set(trimmed(request.email));
    active.phone = Set(trimmed(request.phone));
    active.gender = Set(trimmed(request.gender));
    active.date_of_birth = Set(request.date_of_birth);
    active.interested_in_japan = Set(request.interested_in_japan);
    active.project_type_experience = Set(trimmed(request.project_type_experience));
}

fn is_image_file_name(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::S3Config;

    fn request(name: &str) -> EngineerRequest {
        EngineerRequest {
            full_name: name.to_string(),
            years_experience: Some(4),
            seniority: Some(" Middle ".to_string()),
            summary: None,
            introduction: None,
            location: Some("Da Nang".to_string()),
            language_summary: None,
            status: None,
            profile_image_url: Some("  ".to_string()),
            salary_expectation: None,
            primary_skill: Some("React".to_string()),
            email: None,
            phone: None,
            gender: None,
            date_of_birth: None,
            interested_in_japan: Some(true),
            project_type_experience: None,
        }
    }

    #[test]
    fn test_apply_defaults_and_trims() {
        let mut active = <engineers::ActiveModel as Default>::default();
        apply(&mut active, request("Tran Thi B"));

        assert_eq!(active.status, Set(Some(engineers::STATUS_AVAILABLE.to_string())));
        assert_eq!(active.seniority, Set(Some("Middle".to_string())));
        assert_eq!(active.profile_image_url, Set(None));
    }

    #[test]
    fn test_image_file_names() {
        assert!(is_image_file_name("me.JPG"));
        assert!(is_image_file_name("avatar.webp"));
        assert!(!is_image_file_name("cv.pdf"));
        assert!(!is_image_file_name("noext"));
    }

    #[test]
    fn test_upload_url_rejects_pdf() {
        let s3 = S3Service::new(S3Config::default());
        let err = AdminEngineerService::image_upload_url(&s3, &UploadUrlRequest {
            file_name: "cv.pdf".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_short_name_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let s3 = S3Service::new(S3Config::default());

        let err = AdminEngineerService::create(&db, &s3, request("A")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Full name must be between 2 and 255 characters"));
    }

    #[tokio::test]
    async fn test_delete_unknown_engineer() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<engineers::Model>::new()])
            .into_connection();

        let err = AdminEngineerService::delete(&db, 9).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Engineer not found"));
    }
}
