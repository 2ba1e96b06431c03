// ============================================================================
// SERVICE : S3 (URL pré-signées)
// ============================================================================
//
// Description:
//   Génère les URL pré-signées de lecture/écriture des documents (propositions,
//   contrats, photos d'ingénieurs) et supprime les objets.
//
// Points d'attention:
//   - Sans S3_ENDPOINT: URL virtual-host https://{bucket}.s3.{region}.amazonaws.com/{key}
//   - Avec S3_ENDPOINT (MinIO...): URL path-style {endpoint}/{bucket}/{key}
//   - Un échec de suppression est seulement logué
//
// ============================================================================

use std::path::Path;

use chrono::Utc;

use crate::config::S3Config;
use crate::error::AppError;
use crate::utils::sigv4::{self, Credentials, PresignParams, SignableRequest};

/// Durée de validité des photos d'ingénieurs (24h)
pub const IMAGE_EXPIRATION_MINUTES: u64 = 24 * 60;

/// Durée max autorisée par SigV4 (7 jours)
const MAX_EXPIRATION_SECS: u64 = 7 * 24 * 3600;

#[derive(Clone)]
pub struct S3Service {
    config: S3Config,
    client: reqwest::Client,
}

struct ObjectLocation {
    scheme: String,
    host: String,
    path: String,
}

impl S3Service {
    pub fn new(config: S3Config) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn default_expiration_minutes(&self) -> u64 {
        self.config.presigned_expiration_minutes
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            access_key: self.config.access_key.clone(),
            secret_key: self.config.secret_key.clone(),
            session_token: self.config.session_token.clone(),
        }
    }

    fn ensure_enabled(&self) -> Result<(), AppError> {
        if self.config.enabled {
            Ok(())
        } else {
            Err(AppError::internal("S3 storage is not enabled"))
        }
    }

    fn locate(&self, key: &str) -> ObjectLocation {
        let key = key.trim_start_matches('/');
        match &self.config.endpoint {
            Some(endpoint) => {
                let (scheme, host) = endpoint
                    .split_once("://")
                    .unwrap_or(("https", endpoint.as_str()));
                ObjectLocation {
                    scheme: scheme.to_string(),
                    host: host.trim_end_matches('/').to_string(),
                    path: format!("/{}/{}", self.config.bucket, key),
                }
            }
            None => ObjectLocation {
                scheme: "https".to_string(),
                host: format!("{}.s3.{}.amazonaws.com", self.config.bucket, self.config.region),
                path: format!("/{}", key),
            },
        }
    }

    fn presign(&self, method: &str, key: &str, expiration_minutes: u64) -> Result<String, AppError> {
        self.ensure_enabled()?;
        if key.trim().is_empty() {
            return Err(AppError::bad_request("S3 key is required"));
        }

        let location = self.locate(key);
        let expires_secs = (expiration_minutes * 60).clamp(1, MAX_EXPIRATION_SECS);

        Ok(sigv4::presign_url(&self.credentials(), &PresignParams {
            method,
            scheme: &location.scheme,
            host: &location.host,
            path: &location.path,
            region: &self.config.region,
            service: "s3",
            expires_secs,
            now: Utc::now(),
        }))
    }

    /// URL de lecture valable `expiration_minutes`
    pub fn presigned_get_url(&self, key: &str, expiration_minutes: u64) -> Result<String, AppError> {
        self.presign("GET", key, expiration_minutes)
    }

    /// URL d'envoi (PUT) valable `expiration_minutes`
    pub fn presigned_put_url(&self, key: &str, expiration_minutes: u64) -> Result<String, AppError> {
        self.presign("PUT", key, expiration_minutes)
    }

    /// URL affichable pour une photo: les URL http(s) sont gardées telles quelles
    pub fn image_url(&self, value: Option<&str>) -> Option<String> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        if value.starts_with("http://") || value.starts_with("https://") {
            return Some(value.to_string());
        }
        match self.presigned_get_url(value, IMAGE_EXPIRATION_MINUTES) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(key = value, error = %e, "Could not presign engineer image");
                None
            }
        }
    }

    /// Supprime un objet; les erreurs sont seulement loguées
    pub async fn delete_object(&self, key: &str) {
        if !self.config.enabled {
            tracing::warn!(key, "S3 disabled, object not deleted");
            return;
        }

        let location = self.locate(key);
        let payload_hash = sigv4::sha256_hex(b"");
        let signed = sigv4::sign_request(&self.credentials(), &SignableRequest {
            method: "DELETE",
            host: &location.host,
            path: &location.path,
            query: &[],
            headers: &[("x-amz-content-sha256", payload_hash.as_str())],
            payload: b"",
            region: &self.config.region,
            service: "s3",
            now: Utc::now(),
        });

        let url = format!(
            "{}://{}{}",
            location.scheme,
            location.host,
            sigv4::uri_encode(&location.path, false)
        );
        let mut request = self
            .client
            .delete(&url)
            .header("x-amz-content-sha256", payload_hash.as_str());
        for (name, value) in signed {
            request = request.header(name, value);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(key, "S3 object deleted");
            }
            Ok(response) => {
                tracing::warn!(key, status = %response.status(), "S3 delete failed");
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "S3 delete failed");
            }
        }
    }
}

/// Clé d'upload: {folder}/{uuid}{.ext}
pub fn build_upload_key(folder: &str, file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    format!("{}/{}{}", folder.trim_matches('/'), uuid::Uuid::new_v4(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(endpoint: Option<&str>) -> S3Service {
        S3Service::new(S3Config {
            enabled: true,
            access_key: "AK".to_string(),
            secret_key: "SK".to_string(),
            endpoint: endpoint.map(str::to_string),
            ..Default::default()
        })
    }

    #[test]
    fn test_virtual_host_url() {
        let url = service(None).presigned_get_url("proposals/a.pdf", 10).unwrap();
        assert!(url.starts_with("https://skillbridge-proposals.s3.ap-northeast-1.amazonaws.com/proposals/a.pdf?"));
        assert!(url.contains("X-Amz-Expires=600"));
    }

    #[test]
    fn test_custom_endpoint_is_path_style() {
        let url = service(Some("http://localhost:9000/")).presigned_put_url("proposals/a.pdf", 5).unwrap();
        assert!(url.starts_with("http://localhost:9000/skillbridge-proposals/proposals/a.pdf?"));
        assert!(url.contains("X-Amz-Expires=300"));
    }

    #[test]
    fn test_disabled_storage() {
        let s3 = S3Service::new(S3Config::default());
        assert!(matches!(s3.presigned_get_url("a.pdf", 10), Err(AppError::Internal(_))));
        assert_eq!(s3.image_url(Some("engineers/1.png")), None);
    }

    #[test]
    fn test_image_url_keeps_http() {
        let s3 = S3Service::new(S3Config::default());
        assert_eq!(s3.image_url(Some("https://cdn.example.com/a.png")).as_deref(), Some("https://cdn.example.com/a.png"));
        assert_eq!(s3.image_url(Some("  ")), None);
    }

    #[test]
    fn test_upload_key() {
        let key = build_upload_key("proposals", "Proposal v2.PDF");
        assert!(key.starts_with("proposals/"));
        assert!(key.ends_with(".pdf"));
        assert_eq!(key.len(), "proposals/".len() + 36 + 4);
        assert!(!build_upload_key("/images/", "noext").contains('.'));
    }
}
