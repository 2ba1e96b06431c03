// Formats d'affichage communs (dates, périodes, montants)

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub fn format_date(value: Option<NaiveDateTime>) -> String {
    value
        .map(|d| d.format("%Y/%m/%d").to_string())
        .unwrap_or_default()
}

pub fn format_day(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%Y/%m/%d").to_string())
        .unwrap_or_default()
}

/// "2025/01/15 14:30 JST" (valeur déjà en heure du Japon, voir utils::time)
pub fn format_received_at(value: Option<NaiveDateTime>) -> String {
    value
        .map(|d| format!("{} JST", d.format("%Y/%m/%d %H:%M")))
        .unwrap_or_default()
}

/// "2025/01/01-2025/12/31", ou "-" si aucune borne
pub fn format_period(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    match (start, end) {
        (None, None) => "-".to_string(),
        (start, end) => format!("{}-{}", format_day(start), format_day(end)),
    }
}

/// "¥1,234,567" (arrondi au yen)
pub fn format_yen(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };

    let amount = value.round().to_i64().unwrap_or(0);
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if amount < 0 {
        format!("-¥{}", grouped)
    } else {
        format!("¥{}", grouped)
    }
}

/// Tronque à `max` caractères en ajoutant "..."
pub fn truncate_summary(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut)
}
