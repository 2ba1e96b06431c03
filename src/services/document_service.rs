// ============================================================================
// SERVICE : DOCUMENTS (contrôle d'accès + URL pré-signées)
// ============================================================================
//
// Règles d'accès à une clé S3:
//   1. Métadonnée présente:
//      - propriétaire, ADMIN, rôle listé dans allowed_roles, id listé dans
//        allowed_users
//      - client propriétaire de l'entité liée (proposal via son contact,
//        msa_contract, sow_contract)
//   2. Pas de métadonnée et clé sous "proposals/": client dont une
//      proposition pointe vers la clé (lien ou manifeste des pièces jointes)
//   3. Sinon refus
//
// Suppression: ADMIN ou propriétaire uniquement.
//
// ============================================================================

use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::dto::document::{PresignedUrlResponse, UploadUrlRequest, UploadUrlResponse};
use crate::models::{contacts, document_metadata, msa_contracts, proposals, sow_contracts};
use crate::services::s3_service::{build_upload_key, S3Service};
use crate::utils::validation::is_pdf_file_name;

pub const DOWNLOAD_EXPIRATION_MINUTES: u64 = 10;
const ACCESS_DENIED: &str = "Access denied. You do not have permission to access this document";

pub const ENTITY_PROPOSAL: &str = "proposal";
pub const ENTITY_MSA_CONTRACT: &str = "msa_contract";
pub const ENTITY_SOW_CONTRACT: &str = "sow_contract";

pub struct DocumentService;

impl DocumentService {
    pub async fn has_permission(db: &DatabaseConnection, user: &AuthUser, s3_key: &str) -> Result<bool, DbErr> {
        let metadata = find_metadata(db, s3_key).await?;

        match metadata {
            Some(meta) => {
                if metadata_grants(user, &meta) {
                    return Ok(true);
                }
                if !user.is_client() {
                    return Ok(false);
                }
                client_owns_entity(db, user.user_id, &meta).await
            }
            None if s3_key.contains("proposals/") && user.is_client() => {
                client_proposal_references(db, user.user_id, s3_key).await
            }
            None => Ok(false),
        }
    }

    pub async fn can_delete(db: &DatabaseConnection, user: &AuthUser, s3_key: &str) -> Result<bool, DbErr> {
        if user.is_admin() {
            return Ok(true);
        }
        let metadata = find_metadata(db, s3_key).await?;
        Ok(metadata.and_then(|m| m.owner_id) == Some(user.user_id))
    }

    /// URL de lecture pour le portail client
    pub async fn client_download_url(
        db: &DatabaseConnection,
        s3: &S3Service,
        user: &AuthUser,
        s3_key: &str,
    ) -> AppResult<PresignedUrlResponse> {
        user.require_client()?;
        Self::download_url(db, s3, user, s3_key).await
    }

    /// URL de lecture pour le back-office sales
    pub async fn sales_download_url(
        db: &DatabaseConnection,
        s3: &S3Service,
        user: &AuthUser,
        s3_key: &str,
    ) -> AppResult<PresignedUrlResponse> {
        user.require_sales()?;
        Self::download_url(db, s3, user, s3_key).await
    }

    async fn download_url(
        db: &DatabaseConnection,
        s3: &S3Service,
        user: &AuthUser,
        s3_key: &str,
    ) -> AppResult<PresignedUrlResponse> {
        if !Self::has_permission(db, user, s3_key).await? {
            tracing::debug!(user_id = user.user_id, s3_key, "Document access denied");
            return Err(AppError::forbidden(ACCESS_DENIED));
        }

        let presigned_url = s3
            .presigned_get_url(s3_key, DOWNLOAD_EXPIRATION_MINUTES)
            .map_err(|e| AppError::internal(format!("Failed to generate presigned URL: {}", e)))?;

        Ok(PresignedUrlResponse {
            presigned_url,
            s3_key: s3_key.to_string(),
            expiration_minutes: DOWNLOAD_EXPIRATION_MINUTES,
        })
    }

    /// URL PUT pour une pièce jointe de proposition (PDF uniquement)
    pub fn sales_upload_url(s3: &S3Service, user: &AuthUser, request: &UploadUrlRequest) -> AppResult<UploadUrlResponse> {
        user.require_sales()?;
        if !is_pdf_file_name(&request.file_name) {
            return Err(AppError::bad_request(format!("Only PDF files are allowed: {}", request.file_name)));
        }

        let key = build_upload_key("proposals", &request.file_name);
        let expiration_minutes = s3.default_expiration_minutes();
        let upload_url = s3
            .presigned_put_url(&key, expiration_minutes)
            .map_err(|e| AppError::internal(format!("Failed to generate presigned URL: {}", e)))?;

        tracing::info!(user_id = user.user_id, s3_key = %key, "Upload URL issued");
        Ok(UploadUrlResponse {
            upload_url,
            s3_key: key,
            expiration_minutes,
        })
    }

    /// Supprime l'objet et sa métadonnée
    pub async fn sales_delete(db: &DatabaseConnection, s3: &S3Service, user: &AuthUser, s3_key: &str) -> AppResult<()> {
        user.require_sales()?;
        if !Self::can_delete(db, user, s3_key).await? {
            return Err(AppError::forbidden("Access denied. Only admin or owner can delete documents"));
        }

        s3.delete_object(s3_key).await;
        document_metadata::Entity::delete_many()
            .filter(document_metadata::Column::S3Key.eq(s3_key))
            .exec(db)
            .await?;

        tracing::info!(user_id = user.user_id, s3_key, "Document deleted");
        Ok(())
    }
}

async fn find_metadata(db: &DatabaseConnection, s3_key: &str) -> Result<Option<document_metadata::Model>, DbErr> {
    document_metadata::Entity::find()
        .filter(document_metadata::Column::S3Key.eq(s3_key))
        .one(db)
        .await
}

/// Règles ne dépendant que de la métadonnée
fn metadata_grants(user: &AuthUser, meta: &document_metadata::Model) -> bool {
    meta.owner_id == Some(user.user_id)
        || user.is_admin()
        || meta.allowed_role_list().iter().any(|role| *role == user.role)
        || meta.allowed_user_list().contains(&user.user_id)
}

async fn client_owns_entity(db: &DatabaseConnection, client_id: i32, meta: &document_metadata::Model) -> Result<bool, DbErr> {
    let Some(entity_id) = meta.entity_id else {
        return Ok(false);
    };

    match meta.entity_type.as_deref() {
        Some(ENTITY_PROPOSAL) => {
            let count = proposals::Entity::find()
                .inner_join(contacts::Entity)
                .filter(proposals::Column::Id.eq(entity_id))
                .filter(contacts::Column::ClientUserId.eq(client_id))
                .count(db)
                .await?;
            Ok(count > 0)
        }
        Some(ENTITY_MSA_CONTRACT) => {
            let msa = msa_contracts::Entity::find_by_id(entity_id).one(db).await?;
            Ok(msa.is_some_and(|m| m.client_id == client_id))
        }
        Some(ENTITY_SOW_CONTRACT) => {
            let sow = sow_contracts::Entity::find_by_id(entity_id).one(db).await?;
            Ok(sow.is_some_and(|s| s.client_id == client_id))
        }
        _ => Ok(false),
    }
}

/// Propositions des contacts du client qui référencent la clé
async fn client_proposal_references(db: &DatabaseConnection, client_id: i32, s3_key: &str) -> Result<bool, DbErr> {
    let rows = proposals::Entity::find()
        .inner_join(contacts::Entity)
        .filter(contacts::Column::ClientUserId.eq(client_id))
        .all(db)
        .await?;

    Ok(rows
        .iter()
        .any(|p| p.link.as_deref() == Some(s3_key) || p.attachment_keys().iter().any(|k| k == s3_key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::S3Config;
    use crate::models::users::{ROLE_ADMIN, ROLE_CLIENT, ROLE_SALES_MANAGER, ROLE_SALES_REP};
    use std::collections::BTreeMap;

    fn user(id: i32, role: &str) -> AuthUser {
        AuthUser {
            user_id: id,
            email: format!("user{}@skillbridge.jp", id),
            full_name: None,
            role: role.to_string(),
        }
    }

    fn meta(owner: Option<i32>, roles: Option<&str>, users: Option<&str>) -> document_metadata::Model {
        document_metadata::Model {
            id: 1,
            s3_key: "proposals/a.pdf".to_string(),
            owner_id: owner,
            document_type: Some("proposal".to_string()),
            entity_id: Some(7),
            entity_type: Some(ENTITY_PROPOSAL.to_string()),
            allowed_roles: roles.map(str::to_string),
            allowed_users: users.map(str::to_string),
            created_at: None,
            updated_at: None,
        }
    }

    fn proposal(link: Option<&str>, manifest: Option<&str>) -> proposals::Model {
        proposals::Model {
            id: 7,
            contact_id: Some(3),
            opportunity_id: None,
            version: 1,
            is_current: true,
            title: None,
            status: "sent_to_client".to_string(),
            reviewer_id: None,
            review_notes: None,
            review_action: None,
            review_submitted_at: None,
            link: link.map(str::to_string),
            attachments_manifest: manifest.map(str::to_string),
            client_feedback: None,
            created_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_metadata_rules() {
        let roles = meta(Some(2), Some(r#"["SALES_MANAGER","SALES_REP"]"#), Some("[9]"));

        assert!(metadata_grants(&user(2, ROLE_CLIENT), &roles));
        assert!(metadata_grants(&user(50, ROLE_ADMIN), &roles));
        assert!(metadata_grants(&user(51, ROLE_SALES_REP), &roles));
        assert!(metadata_grants(&user(9, ROLE_CLIENT), &roles));
        assert!(!metadata_grants(&user(10, ROLE_CLIENT), &roles));

        // listes illisibles = vides
        let broken = meta(None, Some("not json"), Some("[oops"));
        assert!(!metadata_grants(&user(51, ROLE_SALES_MANAGER), &broken));
    }

    #[tokio::test]
    async fn test_client_owning_linked_proposal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![meta(Some(2), None, None)]])
            .append_query_results([vec![BTreeMap::from([("num_items", Value::BigInt(Some(1)))])]])
            .into_connection();

        assert!(DocumentService::has_permission(&db, &user(4, ROLE_CLIENT), "proposals/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_sales_without_role_grant_is_denied() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![meta(Some(2), Some(r#"["ADMIN"]"#), None)]])
            .into_connection();

        assert!(!DocumentService::has_permission(&db, &user(5, ROLE_SALES_REP), "proposals/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_manifest_reference_without_metadata() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<document_metadata::Model>::new()])
            .append_query_results([vec![
                proposal(Some("proposals/other.pdf"), None),
                proposal(None, Some(r#"["proposals/a.pdf"]"#)),
            ]])
            .into_connection();

        assert!(DocumentService::has_permission(&db, &user(4, ROLE_CLIENT), "proposals/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_key_outside_proposals_is_denied() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<document_metadata::Model>::new()])
            .into_connection();

        assert!(!DocumentService::has_permission(&db, &user(4, ROLE_CLIENT), "contracts/x.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_client_download_denied_message() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<document_metadata::Model>::new()])
            .into_connection();
        let s3 = S3Service::new(S3Config::default());

        let err = DocumentService::client_download_url(&db, &s3, &user(4, ROLE_CLIENT), "contracts/x.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg == ACCESS_DENIED));
    }

    #[tokio::test]
    async fn test_sales_cannot_use_client_endpoint() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let s3 = S3Service::new(S3Config::default());

        let err = DocumentService::client_download_url(&db, &s3, &user(5, ROLE_SALES_REP), "proposals/a.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_disabled_storage_is_internal_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![meta(Some(4), None, None)]])
            .into_connection();
        let s3 = S3Service::new(S3Config::default());

        let err = DocumentService::client_download_url(&db, &s3, &user(4, ROLE_CLIENT), "proposals/a.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(msg) if msg.starts_with("Failed to generate presigned URL")));
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_can_delete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![meta(Some(2), None, None)]])
            .append_query_results([vec![meta(Some(2), None, None)]])
            .into_connection();

        assert!(DocumentService::can_delete(&db, &user(99, ROLE_ADMIN), "proposals/a.pdf").await.unwrap());
        assert!(DocumentService::can_delete(&db, &user(2, ROLE_SALES_REP), "proposals/a.pdf").await.unwrap());
        assert!(!DocumentService::can_delete(&db, &user(3, ROLE_SALES_REP), "proposals/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_client_owner_cannot_delete_through_sales() {
        // aucune requête attendue: refus avant la lecture de la métadonnée
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let s3 = S3Service::new(S3Config::default());

        let err = DocumentService::sales_delete(&db, &s3, &user(2, ROLE_CLIENT), "proposals/a.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg == "Access denied. Sales role required"));
        assert!(db.into_transaction_log().is_empty());
    }

    #[test]
    fn test_upload_requires_pdf() {
        let s3 = S3Service::new(S3Config::default());
        let err = DocumentService::sales_upload_url(&s3, &user(5, ROLE_SALES_REP), &UploadUrlRequest {
            file_name: "notes.docx".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Only PDF files are allowed: notes.docx"));
    }
}
