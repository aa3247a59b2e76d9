//! Utilities for converting Excel-style cell references, zero-based positions
//! and `"row,col"` positional keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, XlgridError};

/// Number of rows in a worksheet.
pub const MAX_ROWS: u32 = 1_048_576;
/// Number of columns in a worksheet (column `XFD`).
pub const MAX_COLS: u32 = 16_384;

/// Zero-based cell position. Orders row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CellPos {
    pub row: u32,
    pub col: u32,
}

impl CellPos {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Letter-number form, e.g. `"C4"` for row 3, col 2.
    pub fn to_a1(self) -> String {
        indices_to_cell_ref(self.row, self.col)
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl FromStr for CellPos {
    type Err = XlgridError;

    /// Parses a `"row,col"` key. Letter-number references (`"B3"`) are accepted too.
    fn from_str(s: &str) -> Result<Self> {
        let Some((row, col)) = s.split_once(',') else {
            return cell_ref_to_indices(s);
        };
        let invalid = || XlgridError::InvalidAddress(s.to_string());
        let row = row.trim().parse::<u32>().map_err(|_| invalid())?;
        let col = col.trim().parse::<u32>().map_err(|_| invalid())?;
        Ok(Self { row, col })
    }
}

impl Serialize for CellPos {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellPos {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive, zero-based rectangle. Constructors normalize so start <= end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl CellRange {
    /// Build a range spanning both corners in any order.
    pub fn new(a: CellPos, b: CellPos) -> Self {
        Self {
            start_row: a.row.min(b.row),
            start_col: a.col.min(b.col),
            end_row: a.row.max(b.row),
            end_col: a.col.max(b.col),
        }
    }

    pub fn single(pos: CellPos) -> Self {
        Self::new(pos, pos)
    }

    pub fn start(&self) -> CellPos {
        CellPos::new(self.start_row, self.start_col)
    }

    pub fn end(&self) -> CellPos {
        CellPos::new(self.end_row, self.end_col)
    }

    pub fn is_single(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }

    pub fn row_count(&self) -> u32 {
        self.end_row.saturating_sub(self.start_row).saturating_add(1)
    }

    pub fn col_count(&self) -> u32 {
        self.end_col.saturating_sub(self.start_col).saturating_add(1)
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        (self.start_row..=self.end_row).contains(&pos.row)
            && (self.start_col..=self.end_col).contains(&pos.col)
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        self.start_row <= other.end_row
            && other.start_row <= self.end_row
            && self.start_col <= other.end_col
            && other.start_col <= self.end_col
    }

    /// Every position in the range, row by row.
    pub fn positions(&self) -> impl Iterator<Item = CellPos> {
        let (start_col, end_col) = (self.start_col, self.end_col);
        (self.start_row..=self.end_row)
            .flat_map(move |row| (start_col..=end_col).map(move |col| CellPos::new(row, col)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&range_to_range_ref(self))
    }
}

/// Parse a letter-number reference like `"A1"` into a zero-based position.
///
/// The reference must be one or more ASCII letters (any case) immediately
/// followed by a row number >= 1. Letters are bijective base-26 (A=1, Z=26,
/// AA=27). Columns `A..=XFD` and rows `1..=1048576` are accepted, the
/// bounds of an XLSX sheet; anything past them fails with `InvalidAddress`.
/// Engines may apply tighter limits to what can be written.
pub fn cell_ref_to_indices(cell_ref: &str) -> Result<CellPos> {
    let invalid = || XlgridError::InvalidAddress(cell_ref.to_string());
    let bytes = cell_ref.as_bytes();

    let split = bytes
        .iter()
        .position(|b| !b.is_ascii_alphabetic())
        .ok_or_else(invalid)?;
    if split == 0 {
        return Err(invalid());
    }
    let (letters, digits) = bytes.split_at(split);
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }

    let col = letters
        .iter()
        .try_fold(0u32, |acc, &b| {
            acc.checked_mul(26)?
                .checked_add(u32::from(b.to_ascii_uppercase() - b'A') + 1)
        })
        .ok_or_else(invalid)?;
    let row = digits
        .iter()
        .try_fold(0u32, |acc, &b| {
            acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
        })
        .ok_or_else(invalid)?;

    if row == 0 || row > MAX_ROWS || col > MAX_COLS {
        return Err(invalid());
    }

    Ok(CellPos::new(row - 1, col - 1))
}

/// Convert a zero-based column index to its letters (0 -> "A", 26 -> "AA").
pub fn col_to_letters(col: u32) -> String {
    let mut n = u64::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = u8::try_from((n - 1) % 26).unwrap_or(0);
        letters.push(char::from(b'A' + rem));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Exact inverse of [`cell_ref_to_indices`].
pub fn indices_to_cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letters(col), u64::from(row) + 1)
}

/// Parse `"A1"` or `"A1:C3"` into a normalized range. Returns `None` if malformed.
pub fn range_ref_to_range(range: &str) -> Option<CellRange> {
    match range.split_once(':') {
        Some((start, end)) => {
            let start = cell_ref_to_indices(start).ok()?;
            let end = cell_ref_to_indices(end).ok()?;
            Some(CellRange::new(start, end))
        }
        None => cell_ref_to_indices(range).ok().map(CellRange::single),
    }
}

/// Like [`range_ref_to_range`] but reports the malformed input.
pub fn parse_range(range: &str) -> Result<CellRange> {
    range_ref_to_range(range).ok_or_else(|| XlgridError::InvalidAddress(range.to_string()))
}

/// Format a range, collapsing to a single reference when start == end.
pub fn range_to_range_ref(range: &CellRange) -> String {
    let start = indices_to_cell_ref(range.start_row, range.start_col);
    if range.is_single() {
        start
    } else {
        format!(
            "{start}:{}",
            indices_to_cell_ref(range.end_row, range.end_col)
        )
    }
}

/// Parse a cell reference from raw XML attribute bytes.
///
/// Lenient: `$` anchors are skipped and arithmetic saturates. Used for package
/// XML where references are machine-written.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<CellPos> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            let upper = b.to_ascii_uppercase();
            col = col
                .saturating_mul(26)
                .saturating_add(u32::from(upper - b'A') + 1);
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.saturating_mul(10).saturating_add(u32::from(b - b'0'));
            saw_row = true;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some(CellPos::new(row - 1, col.saturating_sub(1)))
}

/// Lenient range parser for `ref` attributes such as `mergeCell` and `dimension`.
pub fn parse_ref_range_bytes(range: &[u8]) -> Option<CellRange> {
    match range.iter().position(|&b| b == b':') {
        Some(idx) => {
            let (start, end) = range.split_at(idx);
            let start = parse_cell_ref_bytes(start)?;
            let end = parse_cell_ref_bytes(end.get(1..)?)?;
            Some(CellRange::new(start, end))
        }
        None => parse_cell_ref_bytes(range).map(CellRange::single),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A1", 0, 0)]
    #[test_case("B3", 2, 1)]
    #[test_case("z10", 9, 25)]
    #[test_case("AA1", 0, 26)]
    #[test_case("AZ7", 6, 51)]
    #[test_case("XFD1048576", 1_048_575, 16_383)]
    fn test_cell_ref_to_indices(input: &str, row: u32, col: u32) {
        assert_eq!(cell_ref_to_indices(input).unwrap(), CellPos::new(row, col));
    }

    #[test_case(""; "empty")]
    #[test_case("A"; "no row")]
    #[test_case("12"; "no letters")]
    #[test_case("A0"; "row zero")]
    #[test_case("1A"; "digits first")]
    #[test_case("A1B"; "trailing letters")]
    #[test_case("$A$1"; "anchors")]
    #[test_case(" A1"; "leading space")]
    #[test_case("XFE1"; "column past limit")]
    #[test_case("A1048577"; "row past limit")]
    #[test_case("AAAAAAAAAAAAAAAA1"; "column overflow")]
    fn test_cell_ref_rejects(input: &str) {
        assert!(matches!(
            cell_ref_to_indices(input),
            Err(XlgridError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_col_to_letters() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(702), "AAA");
        assert_eq!(indices_to_cell_ref(3, 2), "C4");
    }

    #[test]
    fn test_range_normalizes() {
        let range = range_ref_to_range("C5:A1").unwrap();
        assert_eq!(
            range,
            CellRange {
                start_row: 0,
                start_col: 0,
                end_row: 4,
                end_col: 2
            }
        );
        assert_eq!(range_to_range_ref(&range), "A1:C5");

        let mixed = range_ref_to_range("A3:C1").unwrap();
        assert_eq!(range_to_range_ref(&mixed), "A1:C3");
    }

    #[test]
    fn test_single_range_collapses() {
        let range = range_ref_to_range("b2").unwrap();
        assert!(range.is_single());
        assert_eq!(range_to_range_ref(&range), "B2");
        assert_eq!(range_to_range_ref(&range_ref_to_range("B2:B2").unwrap()), "B2");
    }

    #[test]
    fn test_range_rejects() {
        assert!(range_ref_to_range("A1:").is_none());
        assert!(range_ref_to_range("A1:B2:C3").is_none());
        assert!(range_ref_to_range("foo").is_none());
        assert!(matches!(
            parse_range("1:2"),
            Err(XlgridError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_positional_key() {
        let pos = CellPos::new(12, 3);
        assert_eq!(pos.to_string(), "12,3");
        assert_eq!("12,3".parse::<CellPos>().unwrap(), pos);
        assert_eq!("D13".parse::<CellPos>().unwrap(), pos);
        assert!("12;3".parse::<CellPos>().is_err());
        assert!("-1,3".parse::<CellPos>().is_err());
    }

    #[test]
    fn test_positional_key_serde() {
        let json = serde_json::to_string(&CellPos::new(0, 5)).unwrap();
        assert_eq!(json, "\"0,5\"");
        let back: CellPos = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CellPos::new(0, 5));
    }

    #[test]
    fn test_positions_row_major() {
        let range = range_ref_to_range("A1:B2").unwrap();
        let all: Vec<String> = range.positions().map(CellPos::to_a1).collect();
        assert_eq!(all, vec!["A1", "B1", "A2", "B2"]);
        assert_eq!(range.row_count(), 2);
        assert_eq!(range.col_count(), 2);
        assert!(range.contains(CellPos::new(1, 1)));
        assert!(!range.contains(CellPos::new(2, 0)));
    }

    #[test]
    fn test_parse_cell_ref_bytes() {
        assert_eq!(parse_cell_ref_bytes(b"$B$3"), Some(CellPos::new(2, 1)));
        assert_eq!(parse_cell_ref_bytes(b"A0"), None);
        assert_eq!(parse_cell_ref_bytes(b""), None);
        assert_eq!(
            parse_ref_range_bytes(b"A1:C2"),
            Some(CellRange {
                start_row: 0,
                start_col: 0,
                end_row: 1,
                end_col: 2
            })
        );
        assert_eq!(
            parse_ref_range_bytes(b"D4"),
            Some(CellRange::single(CellPos::new(3, 3)))
        );
    }
}
