// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Description:
//   Configuration de l'application lue depuis le fichier .env puis les
//   variables d'environnement. Chaque section a des valeurs par défaut,
//   sauf DATABASE_URL qui est obligatoire.
//
// Variables:
//   - SERVER_HOST / SERVER_PORT
//   - DATABASE_URL
//   - JWT_SECRET / JWT_EXPIRATION_MS
//   - S3_ENABLED / S3_BUCKET / S3_REGION / S3_ACCESS_KEY / S3_SECRET_KEY
//     S3_SESSION_TOKEN / S3_ENDPOINT / S3_PRESIGNED_EXPIRATION_MINUTES
//   - MAIL_ENABLED / MAIL_FROM / MAIL_REGION / MAIL_ACCESS_KEY / MAIL_SECRET_KEY
//   - APP_BASE_URL / RESET_TOKEN_TTL_SECONDS / SALES_MANAGER_EMAIL
//
// ============================================================================

use std::env;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_JWT_SECRET: &str =
    "skillbridge-secret-key-change-in-production-very-long-secret-key-for-security";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Durée de validité en millisecondes (24h par défaut)
    pub expiration_ms: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_JWT_SECRET.to_string(),
            expiration_ms: 86_400_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub enabled: bool,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
    /// Endpoint personnalisé (MinIO, localstack). Path-style si défini.
    pub endpoint: Option<String>,
    pub presigned_expiration_minutes: u64,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            enabled: false,
            bucket: "skillbridge-proposals".to_string(),
            region: "ap-northeast-1".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            session_token: None,
            endpoint: None,
            presigned_expiration_minutes: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub enabled: bool,
    pub from: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from: "no-reply@skillbridge.local".to_string(),
            region: "ap-northeast-1".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub base_url: String,
    pub reset_token_ttl_seconds: i64,
    pub sales_manager_email: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            reset_token_ttl_seconds: 3600,
            sales_manager_email: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub s3: S3Config,
    pub mail: MailConfig,
    pub app: AppSettings,
}

impl AppConfig {
    /// Charge la configuration depuis l'environnement
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let mut config = AppConfig {
            database_url,
            ..Default::default()
        };

        // 1. Serveur
        config.server.host = var_or("SERVER_HOST", config.server.host);
        config.server.port = parse_or("SERVER_PORT", config.server.port);

        // 2. JWT
        config.jwt.secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not found in environment, using default (INSECURE)");
                config.jwt.secret
            }
        };
        config.jwt.expiration_ms = parse_or("JWT_EXPIRATION_MS", config.jwt.expiration_ms);

        // 3. S3
        config.s3.enabled = parse_or("S3_ENABLED", config.s3.enabled);
        config.s3.bucket = var_or("S3_BUCKET", config.s3.bucket);
        config.s3.region = var_or("S3_REGION", config.s3.region);
        config.s3.access_key = var_or("S3_ACCESS_KEY", config.s3.access_key);
        config.s3.secret_key = var_or("S3_SECRET_KEY", config.s3.secret_key);
        config.s3.session_token = optional_var("S3_SESSION_TOKEN");
        config.s3.endpoint = optional_var("S3_ENDPOINT");
        config.s3.presigned_expiration_minutes =
            parse_or("S3_PRESIGNED_EXPIRATION_MINUTES", config.s3.presigned_expiration_minutes);

        // 4. Mail
        config.mail.enabled = parse_or("MAIL_ENABLED", config.mail.enabled);
        config.mail.from = var_or("MAIL_FROM", config.mail.from);
        config.mail.region = var_or("MAIL_REGION", config.mail.region);
        config.mail.access_key = var_or("MAIL_ACCESS_KEY", config.mail.access_key);
        config.mail.secret_key = var_or("MAIL_SECRET_KEY", config.mail.secret_key);

        // 5. Application
        config.app.base_url = var_or("APP_BASE_URL", config.app.base_url);
        config.app.reset_token_ttl_seconds =
            parse_or("RESET_TOKEN_TTL_SECONDS", config.app.reset_token_ttl_seconds);
        config.app.sales_manager_email = optional_var("SALES_MANAGER_EMAIL");

        Ok(config)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(key: &str, default: String) -> String {
    optional_var(key).unwrap_or(default)
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match optional_var(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value in environment, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.jwt.expiration_ms, 86_400_000);
        assert_eq!(config.s3.bucket, "skillbridge-proposals");
        assert_eq!(config.s3.presigned_expiration_minutes, 10);
        assert_eq!(config.app.base_url, "http://localhost:3000");
        assert_eq!(config.app.reset_token_ttl_seconds, 3600);
        assert!(!config.mail.enabled);
    }

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        // Variable propre à ce test pour ne pas interférer avec les autres
        unsafe { env::set_var("SKILLBRIDGE_TEST_PORT", "not-a-number") };
        assert_eq!(parse_or("SKILLBRIDGE_TEST_PORT", 8080u16), 8080);
        unsafe { env::set_var("SKILLBRIDGE_TEST_PORT", "9090") };
        assert_eq!(parse_or("SKILLBRIDGE_TEST_PORT", 8080u16), 9090);
        unsafe { env::remove_var("SKILLBRIDGE_TEST_PORT") };
    }
}
