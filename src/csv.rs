//! Minimal CSV/TSV reader and writer, plus conversion between string grids
//! and sheets.

use serde::{Deserialize, Serialize};

use crate::types::{Cell, CellValue, Sheet};

/// Delimiter and quoting for CSV text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CsvOptions {
    pub delimiter: char,
    pub quote: char,
    /// First row holds column headers; header cells are kept as text.
    pub headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            headers: false,
        }
    }
}

impl CsvOptions {
    /// Tab-separated values.
    pub fn tsv() -> Self {
        Self {
            delimiter: '\t',
            ..Self::default()
        }
    }
}

/// Split CSV text into rows of fields.
///
/// Quoted fields may contain delimiters and line breaks; a doubled quote
/// inside quotes is a literal quote. Rows end at `\n` or `\r\n`; a stray
/// `\r` outside quotes is dropped. The final row is kept when non-empty.
pub fn read_csv(text: &str, options: &CsvOptions) -> Vec<Vec<String>> {
    let sep = options.delimiter;
    let quote = options.quote;

    let mut rows = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == quote {
                if chars.peek() == Some(&quote) {
                    // Escaped quote
                    current.push(quote);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == quote {
            in_quotes = true;
        } else if ch == sep {
            current_row.push(std::mem::take(&mut current));
        } else if ch == '\n' {
            current_row.push(std::mem::take(&mut current));
            rows.push(std::mem::take(&mut current_row));
        } else if ch != '\r' {
            current.push(ch);
        }
    }

    if !current.is_empty() || !current_row.is_empty() {
        current_row.push(current);
        rows.push(current_row);
    }
    rows
}

fn escape_field(field: &str, options: &CsvOptions) -> String {
    let needs_quotes = field.contains(options.delimiter)
        || field.contains(options.quote)
        || field.contains('\n')
        || field.contains('\r');
    if !needs_quotes {
        return field.to_string();
    }
    let quote = options.quote;
    let doubled: String = [quote, quote].iter().collect();
    let mut out = String::with_capacity(field.len() + 2);
    out.push(quote);
    out.push_str(&field.replace(quote, &doubled));
    out.push(quote);
    out
}

/// Join rows into CSV text. Rows are separated by `\n` with no trailing newline.
pub fn write_csv(rows: &[Vec<String>], options: &CsvOptions) -> String {
    let sep = options.delimiter.to_string();
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|field| escape_field(field, options))
                .collect::<Vec<_>>()
                .join(&sep)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Infer a value from CSV text: finite numbers, then `true`/`false` in any
/// case, else the text itself.
pub fn infer_value(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return CellValue::Boolean(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return CellValue::Boolean(false);
    }
    CellValue::String(raw.to_string())
}

/// Build a sheet from a string grid. Empty fields are skipped.
pub fn csv_to_sheet(rows: &[Vec<String>], name: &str) -> Sheet {
    csv_to_sheet_with(rows, name, &CsvOptions::default())
}

/// [`csv_to_sheet`] honoring [`CsvOptions::headers`].
#[allow(clippy::cast_possible_truncation)]
pub fn csv_to_sheet_with(rows: &[Vec<String>], name: &str, options: &CsvOptions) -> Sheet {
    let mut sheet = Sheet::new(name);
    for (r, row) in rows.iter().enumerate() {
        for (c, raw) in row.iter().enumerate() {
            if raw.is_empty() {
                continue;
            }
            let value = if options.headers && r == 0 {
                CellValue::String(raw.clone())
            } else {
                infer_value(raw)
            };
            sheet.set_cell(r as u32, c as u32, Cell::new(value));
        }
    }
    sheet
}

/// Dense string grid covering every stored cell, starting at A1.
pub fn sheet_to_csv(sheet: &Sheet) -> Vec<Vec<String>> {
    let Some(used) = sheet.used_range() else {
        return Vec::new();
    };
    (0..=used.end_row)
        .map(|r| {
            (0..=used.end_col)
                .map(|c| sheet.cell(r, c).map(|cell| cell.value.display()).unwrap_or_default())
                .collect()
        })
        .collect()
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

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn test_read_csv_basic() {
        let rows = read_csv("Name,Age,City\r\nAlice,30,NYC\nBob,25,LA", &CsvOptions::default());
        assert_eq!(
            rows,
            grid(&[
                &["Name", "Age", "City"],
                &["Alice", "30", "NYC"],
                &["Bob", "25", "LA"]
            ])
        );
    }

    #[test]
    fn test_read_quoted() {
        let text = "\"Hello, World\",42\n\"She said \"\"hi\"\"\",\"two\nlines\"\n";
        let rows = read_csv(text, &CsvOptions::default());
        assert_eq!(
            rows,
            grid(&[&["Hello, World", "42"], &["She said \"hi\"", "two\nlines"]])
        );
    }

    #[test]
    fn test_read_tsv_and_blank_lines() {
        let rows = read_csv("A\tB\n\n1\t2", &CsvOptions::tsv());
        assert_eq!(rows, grid(&[&["A", "B"], &[""], &["1", "2"]]));
        assert!(read_csv("", &CsvOptions::default()).is_empty());
    }

    #[test]
    fn test_write_csv_quoting() {
        let rows = grid(&[&["plain", "a,b", "say \"x\""], &["line\nbreak", ""]]);
        let text = write_csv(&rows, &CsvOptions::default());
        assert_eq!(text, "plain,\"a,b\",\"say \"\"x\"\"\"\n\"line\nbreak\",");
        assert_eq!(read_csv(&text, &CsvOptions::default()), rows);
    }

    #[test]
    fn test_custom_quote() {
        let options = CsvOptions {
            delimiter: ';',
            quote: '\'',
            headers: false,
        };
        let rows = grid(&[&["it's", "x;y"]]);
        let text = write_csv(&rows, &options);
        assert_eq!(text, "'it''s';'x;y'");
        assert_eq!(read_csv(&text, &options), rows);
    }

    #[test_case("42", CellValue::Number(42.0))]
    #[test_case("2.5", CellValue::Number(2.5))]
    #[test_case("-100", CellValue::Number(-100.0))]
    #[test_case("0", CellValue::Number(0.0))]
    #[test_case("TRUE", CellValue::Boolean(true))]
    #[test_case("false", CellValue::Boolean(false))]
    #[test_case("NaN", CellValue::String("NaN".into()))]
    #[test_case("inf", CellValue::String("inf".into()))]
    #[test_case("abc", CellValue::String("abc".into()))]
    fn test_infer_value(raw: &str, expected: CellValue) {
        assert_eq!(infer_value(raw), expected);
    }

    #[test]
    fn test_csv_to_sheet_inference() {
        let rows = grid(&[
            &["Name", "Age", "Active"],
            &["Alice", "30", "true"],
            &["", "25", ""],
        ]);
        let sheet = csv_to_sheet(&rows, "People");
        assert_eq!(sheet.name, "People");
        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::from("Name"));
        assert_eq!(sheet.cell(1, 1).unwrap().value, CellValue::Number(30.0));
        assert_eq!(sheet.cell(1, 2).unwrap().value, CellValue::Boolean(true));
        assert!(sheet.cell(2, 0).is_none());
        assert_eq!(sheet.cells.len(), 7);
    }

    #[test]
    fn test_headers_stay_text() {
        let rows = grid(&[&["2024", "true"], &["2024", "true"]]);
        let options = CsvOptions {
            headers: true,
            ..CsvOptions::default()
        };
        let sheet = csv_to_sheet_with(&rows, "S", &options);
        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::from("2024"));
        assert_eq!(sheet.cell(1, 0).unwrap().value, CellValue::Number(2024.0));
    }

    #[test]
    fn test_sheet_to_csv_sparse() {
        let sheet = csv_to_sheet(&grid(&[&["A1", "", "C1"], &["", "3", ""]]), "S");
        assert_eq!(
            sheet_to_csv(&sheet),
            grid(&[&["A1", "", "C1"], &["", "3", ""]])
        );
        assert!(sheet_to_csv(&Sheet::new("Empty")).is_empty());
    }
}
