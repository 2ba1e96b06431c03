// Règles de validation des formulaires.
// Les formulaires renvoient le premier message d'erreur rencontré.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;
use crate::models::dto::contact::ContactFormRequest;
use crate::models::dto::opportunity::UpdateOpportunityRequest;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\-\+\(\)\s]+$").expect("valid phone regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static CURRENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Convertit les erreurs du crate validator en un message unique (champ le plus petit en ordre alphabétique)
pub fn first_error_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().collect();
    fields.sort();

    fields
        .first()
        .and_then(|field| {
            field_errors.get(*field).and_then(|list| list.first()).map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .unwrap_or_else(|| "Invalid request".to_string())
}

/// Lance la validation dérivée et la convertit en AppError::Validation
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|errors| AppError::Validation(first_error_message(&errors)))
}

fn check_length(value: &str, label: &str, min: usize, max: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", label));
    }
    let len = trimmed.chars().count();
    if len < min {
        return Err(format!("{} must be at least {} characters", label, min));
    }
    if len > max {
        return Err(format!("{} must not exceed {} characters", label, max));
    }
    Ok(())
}

/// Formulaire de contact public, champ par champ dans l'ordre d'affichage
pub fn validate_contact_form(form: &ContactFormRequest) -> Result<(), AppError> {
    let check = || -> Result<(), String> {
        check_length(&form.name, "Name", 2, 100)?;
        check_length(&form.company_name, "Company name", 2, 100)?;

        if form.phone.trim().is_empty() {
            return Err("Phone is required".to_string());
        }
        if !PHONE_RE.is_match(form.phone.trim()) {
            return Err("Phone number format is invalid".to_string());
        }

        if form.email.trim().is_empty() {
            return Err("Email is required".to_string());
        }
        if !is_valid_email(form.email.trim()) {
            return Err("Email format is invalid".to_string());
        }

        if let Some(title) = form.title.as_deref().filter(|t| !t.trim().is_empty()) {
            check_length(title, "Title", 2, 255)?;
        }

        check_length(&form.message, "Message", 10, 1000)
    };

    check().map_err(AppError::Validation)
}

/// Règles propres aux opportunités en plus des attributs #[validate]
pub fn validate_opportunity(request: &UpdateOpportunityRequest) -> Result<(), AppError> {
    validate_request(request)?;

    if !is_valid_email(request.client_email.trim()) {
        return Err(AppError::Validation("Email format is invalid".to_string()));
    }
    if request.est_value < Decimal::ZERO {
        return Err(AppError::Validation("Estimated value must be greater than or equal to 0".to_string()));
    }
    if !is_currency_code(&request.currency) {
        return Err(AppError::Validation("Currency must be a 3-letter uppercase code".to_string()));
    }
    Ok(())
}

/// Code devise ISO sur trois majuscules (JPY, USD...)
pub fn is_currency_code(value: &str) -> bool {
    CURRENCY_RE.is_match(value)
}

/// Seuls les PDF sont acceptés en pièce jointe de proposition
pub fn is_pdf_file_name(file_name: &str) -> bool {
    file_name.to_lowercase().ends_with(".pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ContactFormRequest {
        ContactFormRequest {
            name: "Taro Yamada".to_string(),
            company_name: "Acme KK".to_string(),
            phone: "+81 (3) 1234-5678".to_string(),
            email: "taro@acme.jp".to_string(),
            title: None,
            message: "We need three Java engineers.".to_string(),
        }
    }

    fn message_of(result: Result<(), AppError>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_form() {
        assert!(validate_contact_form(&form()).is_ok());
    }

    #[test]
    fn test_name_rules() {
        let mut f = form();
        f.name = " ".to_string();
        assert_eq!(message_of(validate_contact_form(&f)), "Name is required");
        f.name = "A".to_string();
        assert_eq!(message_of(validate_contact_form(&f)), "Name must be at least 2 characters");
        f.name = "A".repeat(101);
        assert_eq!(message_of(validate_contact_form(&f)), "Name must not exceed 100 characters");
    }

    #[test]
    fn test_phone_and_email_format() {
        let mut f = form();
        f.phone = "call me".to_string();
        assert_eq!(message_of(validate_contact_form(&f)), "Phone number format is invalid");

        let mut f = form();
        f.email = "taro@acme".to_string();
        assert_eq!(message_of(validate_contact_form(&f)), "Email format is invalid");
    }

    #[test]
    fn test_message_length() {
        let mut f = form();
        f.message = "too short".to_string();
        assert_eq!(message_of(validate_contact_form(&f)), "Message must be at least 10 characters");
        f.message = "x".repeat(1001);
        assert_eq!(message_of(validate_contact_form(&f)), "Message must not exceed 1000 characters");
    }

    #[test]
    fn test_optional_title() {
        let mut f = form();
        f.title = Some("X".to_string());
        assert_eq!(message_of(validate_contact_form(&f)), "Title must be at least 2 characters");
        f.title = Some(String::new());
        assert!(validate_contact_form(&f).is_ok());
    }

    fn opportunity() -> UpdateOpportunityRequest {
        UpdateOpportunityRequest {
            client_name: "Acme".to_string(),
            client_company: None,
            client_email: "buyer@acme.jp".to_string(),
            probability: 40,
            est_value: Decimal::from(1_000_000),
            currency: "JPY".to_string(),
            assignee_user_id: None,
        }
    }

    #[test]
    fn test_opportunity_rules() {
        assert!(validate_opportunity(&opportunity()).is_ok());

        let mut o = opportunity();
        o.probability = 120;
        assert_eq!(message_of(validate_opportunity(&o)), "Probability must be between 0 and 100");

        let mut o = opportunity();
        o.currency = "jpy".to_string();
        assert_eq!(message_of(validate_opportunity(&o)), "Currency must be a 3-letter uppercase code");

        let mut o = opportunity();
        o.est_value = Decimal::from(-1);
        assert!(validate_opportunity(&o).is_err());

        let mut o = opportunity();
        o.client_company = Some("A".to_string());
        assert_eq!(message_of(validate_opportunity(&o)), "Company name must be between 2 and 255 characters");
    }

    #[test]
    fn test_pdf_only() {
        assert!(is_pdf_file_name("Proposal_v2.PDF"));
        assert!(!is_pdf_file_name("proposal.docx"));
    }
}
