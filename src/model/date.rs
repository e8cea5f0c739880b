//! Calendar date helpers shared by the store, the remote API payloads and spreadsheet import.

use chrono::{Days, Local, NaiveDate};

/// The first day of the spreadsheet serial day count (serial `0`).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Returns the current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses a calendar date from the formats we encounter in the wild:
/// - `YYYY-MM-DD`, optionally followed by a time (`2024-03-15T08:00:00Z`, `2024-03-15 08:00`)
/// - `YYYY/MM/DD`
/// - `DD/MM/YYYY`
///
/// Returns `None` if nothing matches.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    // Date-time strings: keep the calendar part only.
    if let Some(prefix) = trimmed.get(..10) {
        let rest = &trimmed[10..];
        if rest.starts_with('T') || rest.starts_with(' ') {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return Some(date);
            }
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}

/// Converts a spreadsheet serial day number (days since 1899-12-30) into a date. Any fractional
/// part, which represents the time of day, is dropped.
pub fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial.trunc() as u64))
}

/// Formats a date the way it is shown to the user, `DD/MM/YYYY`.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-15"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date(" 2024-03-15 "), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15T10:20:30Z"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15 10:20:30"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("2024/03/15"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("15/03/2024"), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("2024-03-15junk"), None);
    }

    #[test]
    fn test_from_serial() {
        // 45366 is 2024-03-15 in spreadsheet serial days.
        assert_eq!(from_serial(45366.0), Some(ymd(2024, 3, 15)));
        assert_eq!(from_serial(45366.75), Some(ymd(2024, 3, 15)));
        assert_eq!(from_serial(-1.0), None);
        assert_eq!(from_serial(f64::NAN), None);
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date(ymd(2024, 3, 5)), "05/03/2024");
    }
}
