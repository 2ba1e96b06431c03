// Identifiants lisibles affichés dans les portails.
// Les compteurs (séquence annuelle) sont calculés par les services en base,
// ces fonctions ne font que le formatage et les replis.

use chrono::{Datelike, NaiveDateTime};

/// P-YYYY-NN ; `sequence` = nombre de propositions de l'année avec id <= celui-ci
pub fn proposal_display_id(id: Option<i32>, created_at: Option<NaiveDateTime>, sequence: u64) -> String {
    match (id, created_at) {
        (Some(_), Some(created_at)) => format!("P-{}-{:02}", created_at.year(), sequence),
        (Some(id), None) => format!("P-0000-{:02}", id),
        (None, _) => "P-0000-00".to_string(),
    }
}

/// CT-yyyy-MM-dd-{clientUserId}-{id}
pub fn contact_display_id(id: Option<i32>, client_user_id: Option<i32>, created_at: Option<NaiveDateTime>) -> String {
    match (id, client_user_id, created_at) {
        (Some(id), Some(client_user_id), Some(created_at)) => format!(
            "CT-{}-{}-{}",
            created_at.format("%Y-%m-%d"),
            client_user_id,
            id
        ),
        (Some(id), _, _) => format!("CT-0000-00-00-0-{}", id),
        (None, _, _) => "CT-0000-00-00-0-0".to_string(),
    }
}

/// Repli quand le contact référencé n'existe plus
pub fn missing_contact_display_id(contact_id: i32) -> String {
    format!("CT-{}", contact_id)
}

/// OP-YYYY-NN ; `existing_this_year` = opportunités déjà créées dans l'année
pub fn opportunity_id(year: i32, existing_this_year: u64) -> String {
    format!("OP-{}-{:02}", year, existing_this_year + 1)
}

pub fn msa_display_id(id: i32, created_at: Option<NaiveDateTime>) -> String {
    format!("MSA-{}-{:03}", year_or_zero(created_at), id)
}

pub fn sow_display_id(id: i32, created_at: Option<NaiveDateTime>) -> String {
    format!("SOW-{}-{:03}", year_or_zero(created_at), id)
}

fn year_or_zero(created_at: Option<NaiveDateTime>) -> String {
    created_at
        .map(|d| d.year().to_string())
        .unwrap_or_else(|| "0000".to_string())
}

/// Parse "MSA-2025-007" / "SOW-2025-012" -> (type, id)
pub fn parse_contract_display_id(value: &str) -> Option<(&'static str, i32)> {
    let (kind, rest) = if let Some(rest) = value.strip_prefix("MSA-") {
        ("MSA", rest)
    } else if let Some(rest) = value.strip_prefix("SOW-") {
        ("SOW", rest)
    } else {
        return None;
    };

    let id = rest.rsplit('-').next()?.parse().ok()?;
    Some((kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(10, 30, 0).unwrap()
    }

    #[test]
    fn test_proposal_display_id() {
        assert_eq!(proposal_display_id(Some(42), Some(at(2025, 3, 1)), 3), "P-2025-03");
        assert_eq!(proposal_display_id(Some(42), Some(at(2025, 3, 1)), 120), "P-2025-120");
        assert_eq!(proposal_display_id(Some(7), None, 0), "P-0000-07");
        assert_eq!(proposal_display_id(None, None, 0), "P-0000-00");
    }

    #[test]
    fn test_contact_display_id() {
        assert_eq!(contact_display_id(Some(42), Some(7), Some(at(2025, 1, 15))), "CT-2025-01-15-7-42");
        assert_eq!(contact_display_id(Some(42), None, Some(at(2025, 1, 15))), "CT-0000-00-00-0-42");
        assert_eq!(contact_display_id(Some(9), Some(7), None), "CT-0000-00-00-0-9");
        assert_eq!(contact_display_id(None, None, None), "CT-0000-00-00-0-0");
        assert_eq!(missing_contact_display_id(5), "CT-5");
    }

    #[test]
    fn test_opportunity_and_contract_ids() {
        assert_eq!(opportunity_id(2025, 0), "OP-2025-01");
        assert_eq!(opportunity_id(2025, 11), "OP-2025-12");
        assert_eq!(msa_display_id(7, Some(at(2024, 6, 1))), "MSA-2024-007");
        assert_eq!(sow_display_id(12, None), "SOW-0000-012");
    }

    #[test]
    fn test_parse_contract_display_id() {
        assert_eq!(parse_contract_display_id("MSA-2024-007"), Some(("MSA", 7)));
        assert_eq!(parse_contract_display_id("SOW-2025-112"), Some(("SOW", 112)));
        assert_eq!(parse_contract_display_id("OP-2025-01"), None);
        assert_eq!(parse_contract_display_id("MSA-2024-x"), None);
    }
}
