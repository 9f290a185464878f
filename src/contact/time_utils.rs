//! Time Utilities
//!
//! Reformatting of ADIF date/time values into the ISO 8601 text the
//! contacts table stores.

use chrono::{DateTime, Utc};

/// Current UTC date as ADIF YYYYMMDD
pub fn adif_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

/// Current UTC time as ADIF HHMMSS
pub fn adif_time(now: DateTime<Utc>) -> String {
    now.format("%H%M%S").to_string()
}

/// Convert an ADIF date to YYYY-MM-DD
///
/// Only exactly 8 characters are reformatted; anything else is passed
/// through unchanged.
pub fn format_qso_date(date_str: &str) -> String {
    let chars: Vec<char> = date_str.chars().collect();
    if chars.len() != 8 {
        return date_str.to_string();
    }

    format!(
        "{}-{}-{}",
        collect(&chars[..4]),
        collect(&chars[4..6]),
        collect(&chars[6..8])
    )
}

/// Convert an ADIF time to HH:MM:SS
///
/// * HHMMSS or longer → first six characters with colons
/// * HHMM → seconds set to "00"
/// * anything else → passed through unchanged
pub fn format_time_on(time_str: &str) -> String {
    let chars: Vec<char> = time_str.chars().collect();
    if chars.len() >= 6 {
        format!(
            "{}:{}:{}",
            collect(&chars[..2]),
            collect(&chars[2..4]),
            collect(&chars[4..6])
        )
    } else if chars.len() == 4 {
        format!("{}:{}:00", collect(&chars[..2]), collect(&chars[2..4]))
    } else {
        time_str.to_string()
    }
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_qso_date() {
        assert_eq!(format_qso_date("20240115"), "2024-01-15");
        assert_eq!(format_qso_date("2024-01-15"), "2024-01-15");
        assert_eq!(format_qso_date("202401"), "202401");
        assert_eq!(format_qso_date(""), "");
    }

    #[test]
    fn test_format_time_on() {
        assert_eq!(format_time_on("123045"), "12:30:45");
        assert_eq!(format_time_on("1230"), "12:30:00");
        assert_eq!(format_time_on("12304599"), "12:30:45");
        assert_eq!(format_time_on("12345"), "12345");
        assert_eq!(format_time_on("12"), "12");
    }

    #[test]
    fn test_format_non_ascii_does_not_panic() {
        assert_eq!(format_time_on("ü2é0"), "ü2:é0:00");
        assert_eq!(format_qso_date("ééééééé"), "ééééééé");
    }

    #[test]
    fn test_adif_date_time_from_clock() {
        let now = Utc.with_ymd_and_hms(2026, 1, 3, 15, 26, 7).unwrap();
        assert_eq!(adif_date(now), "20260103");
        assert_eq!(adif_time(now), "152607");
    }
}
