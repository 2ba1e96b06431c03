// ============================================================================
// SERVICE : EMAIL
// ============================================================================
//
// Description:
//   Envoi des emails transactionnels (reset password, bienvenue, confirmation
//   de contact, notification du sales manager).
//
//   - SesEmailSender : API SES v2 (SendEmail) signée SigV4 via reqwest
//   - LogEmailSender : log seulement (MAIL_ENABLED=false, dev)
//
// Points d'attention:
//   - Les services n'échouent jamais à cause d'un email: voir send_quietly
//
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::config::MailConfig;
use crate::utils::sigv4::{self, Credentials, SignableRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), String>;
}

/// Envoie un email et logue l'échec sans le propager
pub async fn send_quietly(sender: &dyn EmailSender, message: EmailMessage) {
    match sender.send(&message).await {
        Ok(()) => tracing::info!(to = %message.to, subject = %message.subject, "Email sent"),
        Err(e) => tracing::warn!(to = %message.to, error = %e, "Failed to send email"),
    }
}

pub fn build_email_sender(config: &MailConfig) -> Arc<dyn EmailSender> {
    if config.enabled {
        Arc::new(SesEmailSender::new(config.clone()))
    } else {
        tracing::info!("Mail disabled, emails will only be logged");
        Arc::new(LogEmailSender)
    }
}

pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), String> {
        tracing::info!(to = %message.to, subject = %message.subject, body = %message.text, "Email (not sent)");
        Ok(())
    }
}

pub struct SesEmailSender {
    config: MailConfig,
    client: reqwest::Client,
}

impl SesEmailSender {
    pub fn new(config: MailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailSender for SesEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), String> {
        let host = format!("email.{}.amazonaws.com", self.config.region);
        let path = "/v2/email/outbound-emails";
        let body = json!({
            "FromEmailAddress": self.config.from,
            "Destination": { "ToAddresses": [message.to] },
            "Content": {
                "Simple": {
                    "Subject": { "Data": message.subject, "Charset": "UTF-8" },
                    "Body": { "Text": { "Data": message.text, "Charset": "UTF-8" } }
                }
            }
        })
        .to_string();

        let credentials = Credentials {
            access_key: self.config.access_key.clone(),
            secret_key: self.config.secret_key.clone(),
            session_token: None,
        };
        let signed = sigv4::sign_request(&credentials, &SignableRequest {
            method: "POST",
            host: &host,
            path,
            query: &[],
            headers: &[("content-type", "application/json")],
            payload: body.as_bytes(),
            region: &self.config.region,
            service: "ses",
            now: Utc::now(),
        });

        let mut request = self
            .client
            .post(format!("https://{}{}", host, path))
            .header("content-type", "application/json")
            .body(body);
        for (name, value) in signed {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| format!("SES request failed: {}", e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            Err(format!("SES returned {}: {}", status, detail))
        }
    }
}

// ---- Modèles d'emails ----

pub fn password_reset_email(to: &str, name: &str, reset_link: &str, expiry_minutes: i64) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "[SkillBridge] Password reset request".to_string(),
        text: format!(
            "Hello {name},\n\n\
             We received a request to reset your password.\n\
             Open the link below to choose a new one:\n\n{reset_link}\n\n\
             This link expires in {expiry_minutes} minutes.\n\
             If you did not request a reset, you can ignore this email.\n\n\
             SkillBridge"
        ),
    }
}

pub fn welcome_email(to: &str, name: &str, password: &str, login_url: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "[SkillBridge] Your account has been created".to_string(),
        text: format!(
            "Hello {name},\n\n\
             An account has been created for you.\n\n\
             Email: {to}\nTemporary password: {password}\n\n\
             Sign in at {login_url} and change your password.\n\n\
             SkillBridge"
        ),
    }
}

pub fn contact_confirmation_email(to: &str, name: &str, title: &str, new_password: Option<&str>, login_url: &str) -> EmailMessage {
    let credentials = match new_password {
        Some(password) => format!(
            "\nWe created a client account so you can follow your request:\n\
             Email: {to}\nTemporary password: {password}\nSign in at {login_url}\n"
        ),
        None => format!("\nYou can follow your request from the client portal: {login_url}\n"),
    };

    EmailMessage {
        to: to.to_string(),
        subject: "[SkillBridge] We received your inquiry".to_string(),
        text: format!(
            "Hello {name},\n\n\
             Thank you for contacting SkillBridge. We received your request \"{title}\"\n\
             and a sales representative will get back to you shortly.\n\
             {credentials}\nSkillBridge"
        ),
    }
}

pub fn sales_notification_email(to: &str, client_name: &str, company: &str, title: &str, contact_id: i32) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("[SkillBridge] New contact #{}: {}", contact_id, title),
        text: format!(
            "A new contact request was submitted.\n\n\
             Client: {client_name}\nCompany: {company}\nTitle: {title}\nContact ID: {contact_id}\n"
        ),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSender;
    use super::*;

    #[test]
    fn test_reset_email_contains_link_and_expiry() {
        let mail = password_reset_email("a@b.jp", "Taro", "http://x/client/reset-password?token=t", 60);
        assert!(mail.text.contains("http://x/client/reset-password?token=t"));
        assert!(mail.text.contains("60 minutes"));
    }

    #[test]
    fn test_contact_confirmation_with_credentials() {
        let mail = contact_confirmation_email("a@b.jp", "Taro", "Need devs", Some("Xy1!abcdefgh"), "http://x/client/login");
        assert!(mail.text.contains("Temporary password: Xy1!abcdefgh"));

        let mail = contact_confirmation_email("a@b.jp", "Taro", "Need devs", None, "http://x/client/login");
        assert!(!mail.text.contains("Temporary password"));
    }

    #[tokio::test]
    async fn test_send_quietly_swallows_errors() {
        let sender = RecordingSender { fail: true, ..Default::default() };
        send_quietly(&sender, welcome_email("a@b.jp", "A", "pw", "http://x")).await;
        assert!(sender.sent.lock().unwrap().is_empty());

        let sender = RecordingSender::default();
        send_quietly(&sender, welcome_email("a@b.jp", "A", "pw", "http://x")).await;
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }
}
