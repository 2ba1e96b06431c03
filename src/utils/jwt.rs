use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};

use crate::config::JwtConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,     // email
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,        // expiration timestamp
}

/// Génère un JWT token pour un utilisateur
pub fn generate_token(config: &JwtConfig, user_id: i32, email: &str, role: &str) -> Result<String, String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::milliseconds(config.expiration_ms))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: email.to_string(),
        user_id,
        email: email.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: expiration,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_ref()),
    )
        .map_err(|e| format!("Failed to generate token: {}", e))
}

/// Vérifie (signature + expiration) et décode un JWT token
pub fn verify_token(config: &JwtConfig, token: &str) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_ref()),
        &validation,
    )
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid token: {}", e))
}
