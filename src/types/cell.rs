use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Style;

/// ISO-8601 layout used for temporal values in text form.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A cell's value.
///
/// Serialized untagged: JSON `null`, booleans, numbers and strings map
/// directly. Strings in `YYYY-MM-DDTHH:MM:SS` form deserialize as temporal
/// values.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    DateTime(NaiveDateTime),
    String(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text shown for the value: numbers in shortest form, booleans as
    /// `true`/`false`, temporal values as ISO-8601, null as empty.
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Self::String(s) => s.clone(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

/// Format a number the way spreadsheets show raw values: integers without a
/// fractional part, everything else in shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Covers -0.0 as well.
        return "0".to_string();
    }
    n.to_string()
}

/// Parse an ISO-8601 date or date-time (`2024-01-31` or `2024-01-31T08:00:00`).
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A single cell in the sparse model.
///
/// `formula`, when present, always carries its leading `=`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(default)]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// A formula cell. A missing leading `=` is added.
    pub fn formula(formula: &str) -> Self {
        Self {
            formula: Some(canonical_formula(formula)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style.non_empty();
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    #[must_use]
    pub fn with_formula(mut self, formula: &str) -> Self {
        self.formula = Some(canonical_formula(formula));
        self
    }

    /// A cell with nothing in it. Such cells are never stored in a sheet.
    pub fn is_blank(&self) -> bool {
        self.value.is_null()
            && self.formula.is_none()
            && self.style.is_none()
            && self.comment.is_none()
    }

    /// Formula text without its leading `=`, as the grid and file encodings store it.
    pub fn bare_formula(&self) -> Option<&str> {
        self.formula.as_deref().map(strip_formula_prefix)
    }
}

/// Prefix `=` unless already present.
pub fn canonical_formula(formula: &str) -> String {
    if formula.starts_with('=') {
        formula.to_string()
    } else {
        format!("={formula}")
    }
}

/// Drop one leading `=`, if any.
pub fn strip_formula_prefix(formula: &str) -> &str {
    formula.strip_prefix('=').unwrap_or(formula)
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

    #[test]
    fn test_value_json_forms() {
        let values: Vec<CellValue> =
            serde_json::from_str(r#"[null, true, 4.5, "2024-03-01T10:30:00", "hi"]"#).unwrap();
        assert_eq!(values[0], CellValue::Null);
        assert_eq!(values[1], CellValue::Boolean(true));
        assert_eq!(values[2], CellValue::Number(4.5));
        assert_eq!(
            values[3],
            CellValue::DateTime(parse_datetime("2024-03-01T10:30:00").unwrap())
        );
        assert_eq!(values[4], CellValue::String("hi".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Number(30.0).display(), "30");
        assert_eq!(CellValue::Number(1.25).display(), "1.25");
        assert_eq!(CellValue::Number(-0.0).display(), "0");
        assert_eq!(CellValue::Boolean(false).display(), "false");
        assert_eq!(CellValue::Null.display(), "");
        let dt = parse_datetime("2024-01-31").unwrap();
        assert_eq!(CellValue::DateTime(dt).display(), "2024-01-31T00:00:00");
    }

    #[test]
    fn test_formula_prefix() {
        assert_eq!(canonical_formula("A1+A2"), "=A1+A2");
        assert_eq!(canonical_formula("=A1+A2"), "=A1+A2");
        assert_eq!(strip_formula_prefix("=SUM(A1:A3)"), "SUM(A1:A3)");
        assert_eq!(strip_formula_prefix("SUM(A1:A3)"), "SUM(A1:A3)");
        let cell = Cell::formula("A1*2");
        assert_eq!(cell.formula.as_deref(), Some("=A1*2"));
        assert_eq!(cell.bare_formula(), Some("A1*2"));
    }

    #[test]
    fn test_blank() {
        assert!(Cell::default().is_blank());
        assert!(Cell::default().with_style(Style::default()).is_blank());
        assert!(!Cell::new(0.0).is_blank());
        assert!(!Cell::default().with_comment("note").is_blank());
    }

    #[test]
    fn test_cell_serialization() {
        let cell = Cell::new(42.0).with_formula("B1*2");
        let json = serde_json::to_value(&cell).unwrap();
        assert_eq!(json, serde_json::json!({"value": 42.0, "formula": "=B1*2"}));
    }
}
