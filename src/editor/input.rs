//! Interpreting user-typed cell text.

use crate::engine::CellInput;
use crate::types::CellValue;

/// Infer a value from typed text: `true`/`false` in any case, then numbers,
/// otherwise the text as typed. Empty text clears the cell.
pub fn detect_input(value: &str) -> CellValue {
    if value.is_empty() {
        return CellValue::Null;
    }

    // Boolean
    if value.eq_ignore_ascii_case("true") {
        return CellValue::Boolean(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return CellValue::Boolean(false);
    }

    // Number
    if let Ok(n) = value.trim().parse::<f64>() {
        if n.is_finite() {
            return CellValue::Number(n);
        }
    }

    CellValue::String(value.to_string())
}

/// Typed text as engine input: a leading `=` makes a formula, anything else
/// goes through [`detect_input`].
pub(crate) fn text_to_cell_input(text: &str) -> CellInput {
    if text.starts_with('=') {
        CellInput::Formula(text.to_string())
    } else {
        CellInput::Value(detect_input(text))
    }
}

/// A string value starting with `=` is a formula.
pub(crate) fn to_cell_input(value: CellValue) -> CellInput {
    match value {
        CellValue::String(s) if s.starts_with('=') => CellInput::Formula(s),
        other => CellInput::Value(other),
    }
}
