// Horloge métier: les horodatages sont stockés en heure du Japon (UTC+9, sans DST)

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

const JST_OFFSET_HOURS: i64 = 9;

/// Convertit un instant UTC en date-heure locale japonaise
pub fn to_jst(instant: DateTime<Utc>) -> NaiveDateTime {
    instant.naive_utc() + Duration::hours(JST_OFFSET_HOURS)
}

/// Maintenant, en heure du Japon (valeur écrite dans les colonnes created_at/updated_at)
pub fn now_jst() -> NaiveDateTime {
    to_jst(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_evening_utc_is_next_morning_in_japan() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 15, 20, 0, 0).unwrap();
        let local = to_jst(instant);
        assert_eq!((local.day(), local.hour(), local.minute()), (16, 5, 0));
        assert_eq!(
            crate::utils::format::format_received_at(Some(local)),
            "2025/01/16 05:00 JST"
        );
    }

    #[test]
    fn test_year_changes_at_japan_midnight() {
        let instant = Utc.with_ymd_and_hms(2024, 12, 31, 15, 30, 0).unwrap();
        assert_eq!(to_jst(instant).year(), 2025);

        let instant = Utc.with_ymd_and_hms(2024, 12, 31, 14, 59, 0).unwrap();
        assert_eq!(to_jst(instant).year(), 2024);
    }
}
