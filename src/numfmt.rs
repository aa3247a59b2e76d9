//! Number format tables and spreadsheet serial dates.
//!
//! Only what the container layer needs: the built-in format table (ids
//! 0-49), date-format detection, and serial number <-> date-time conversion
//! for both the 1900 and 1904 date systems.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// First id available to custom number formats.
pub const FIRST_CUSTOM_FORMAT_ID: u32 = 164;

/// Built-in number format IDs (0-49 are predefined by Excel)
/// See: ECMA-376 Part 1, Section 18.8.30
pub const fn get_builtin_format(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("General"),
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        11 => Some("0.00E+00"),
        12 => Some("# ?/?"),
        13 => Some("# ??/??"),
        14 => Some("mm-dd-yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        37 => Some("#,##0 ;(#,##0)"),
        38 => Some("#,##0 ;[Red](#,##0)"),
        39 => Some("#,##0.00;(#,##0.00)"),
        40 => Some("#,##0.00;[Red](#,##0.00)"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        48 => Some("##0.0E+0"),
        49 => Some("@"),
        _ => None,
    }
}

/// Reverse lookup into the built-in table.
pub fn builtin_format_id(code: &str) -> Option<u32> {
    (0..50).find(|&id| get_builtin_format(id) == Some(code))
}

/// Built-in ids that are dates even though the table above leaves their
/// (locale-dependent) code out.
const fn is_builtin_date_id(id: u32) -> bool {
    matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58)
}

/// Check if a format code is a date/time format
pub fn is_date_format(format_code: &str) -> bool {
    let lower = format_code.to_lowercase();

    // Skip text in quotes and brackets. Elapsed-time brackets like [h]
    // still count as time tokens.
    let mut in_quotes = false;
    let mut escaped = false;
    let mut bracket: Option<String> = None;
    let mut cleaned = String::new();

    for c in lower.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        if let Some(ref mut content) = bracket {
            if c == ']' {
                if !content.is_empty() && content.chars().all(|b| matches!(b, 'h' | 'm' | 's')) {
                    cleaned.push_str(content);
                }
                bracket = None;
            } else {
                content.push(c);
            }
            continue;
        }
        match c {
            '\\' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => bracket = Some(String::new()),
            _ if !in_quotes => cleaned.push(c),
            _ => {}
        }
    }

    if cleaned == "general" {
        return false;
    }

    cleaned.contains('y')
        || (cleaned.contains('m') && !cleaned.contains('#') && !cleaned.contains('0'))
        || cleaned.contains('d')
        || cleaned.contains('h')
        || (cleaned.contains('s') && cleaned.contains(':'))
}

/// Whether a cell format (by id and, for custom ids, code) holds dates.
pub fn is_date_format_id(id: u32, custom_code: Option<&str>) -> bool {
    if is_builtin_date_id(id) {
        return true;
    }
    custom_code.is_some_and(is_date_format)
}

fn epoch(date1904: bool) -> Option<NaiveDateTime> {
    let date = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert a serial date to a date-time, rounded to the nearest second.
///
/// In the 1900 system serials below 60 are shifted by one day to undo the
/// fictitious 1900-02-29.
#[allow(clippy::cast_possible_truncation)]
pub fn serial_to_datetime(serial: f64, date1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_466.0 {
        return None;
    }
    let adjusted = if !date1904 && serial < 60.0 {
        serial + 1.0
    } else {
        serial
    };
    let seconds = (adjusted * 86_400.0).round() as i64;
    epoch(date1904)?.checked_add_signed(Duration::seconds(seconds))
}

/// Inverse of [`serial_to_datetime`].
#[allow(clippy::cast_precision_loss)]
pub fn datetime_to_serial(dt: NaiveDateTime, date1904: bool) -> Option<f64> {
    let seconds = dt.signed_duration_since(epoch(date1904)?).num_seconds();
    let serial = seconds as f64 / 86_400.0;
    if serial < 0.0 {
        return None;
    }
    if !date1904 && serial < 61.0 {
        Some(serial - 1.0)
    } else {
        Some(serial)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("yyyy-mm-dd", true)]
    #[test_case("m/d/yy h:mm", true)]
    #[test_case("[h]:mm:ss", true)]
    #[test_case("mm:ss", true)]
    #[test_case("[$-409]mmmm d, yyyy", true)]
    #[test_case("General", false)]
    #[test_case("0.00%", false)]
    #[test_case("#,##0.00", false)]
    #[test_case(r#"0.00" days""#, false)]
    #[test_case("[Red]0.00", false)]
    #[test_case("[White]#,##0", false)]
    #[test_case("@", false)]
    fn test_is_date_format(code: &str, expected: bool) {
        assert_eq!(is_date_format(code), expected);
    }

    #[test]
    fn test_builtin_ids() {
        assert!(is_date_format_id(14, None));
        assert!(is_date_format_id(22, None));
        assert!(!is_date_format_id(2, None));
        assert!(is_date_format_id(164, Some("dd/mm/yyyy")));
        assert!(!is_date_format_id(165, Some("0.000")));
        assert_eq!(builtin_format_id("0.00%"), Some(10));
        assert_eq!(builtin_format_id("0.000"), None);
    }

    #[test]
    fn test_serial_dates() {
        let dt = serial_to_datetime(45_292.5, false).unwrap();
        assert_eq!(dt.to_string(), "2024-01-01 12:00:00");
        assert_eq!(datetime_to_serial(dt, false), Some(45_292.5));

        let d1904 = serial_to_datetime(0.0, true).unwrap();
        assert_eq!(d1904.to_string(), "1904-01-01 00:00:00");

        assert_eq!(
            serial_to_datetime(1.0, false).unwrap().to_string(),
            "1900-01-01 00:00:00"
        );
        assert_eq!(
            serial_to_datetime(61.0, false).unwrap().to_string(),
            "1900-03-01 00:00:00"
        );
        assert!(serial_to_datetime(f64::NAN, false).is_none());
        assert!(serial_to_datetime(-1.0, false).is_none());
    }
}
