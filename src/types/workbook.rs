use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Cell, CellPos, CellRange, Chart};
use crate::id::generate_id;

/// Title given to workbooks that do not carry one.
pub const DEFAULT_TITLE: &str = "Untitled Spreadsheet";

/// A workbook in the sparse model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    pub id: String,
    pub title: String,
    pub sheets: Vec<Sheet>,
    /// Index into `sheets`; 0 when `sheets` is empty.
    #[serde(default)]
    pub active_sheet: usize,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

impl Workbook {
    /// An empty workbook with a fresh id.
    pub fn new(title: &str) -> Self {
        Self {
            id: generate_id(),
            title: title.to_string(),
            sheets: Vec::new(),
            active_sheet: 0,
        }
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// The active sheet, if any.
    pub fn active(&self) -> Option<&Sheet> {
        self.sheets.get(self.active_sheet)
    }

    /// `active_sheet` clamped into range.
    pub fn active_index(&self) -> usize {
        if self.active_sheet < self.sheets.len() {
            self.active_sheet
        } else {
            0
        }
    }
}

/// A worksheet in the sparse model.
///
/// `cells` only holds non-blank cells; use [`Sheet::set_cell`] to keep it
/// that way.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cells: BTreeMap<CellPos, Cell>,
    /// Row index -> height.
    #[serde(default)]
    pub row_heights: BTreeMap<u32, f64>,
    /// Column index -> width.
    #[serde(default)]
    pub col_widths: BTreeMap<u32, f64>,
    #[serde(default)]
    pub merges: Vec<CellRange>,
    #[serde(default)]
    pub charts: Vec<Chart>,
    #[serde(default)]
    pub frozen_rows: u32,
    #[serde(default)]
    pub frozen_cols: u32,
}

impl Sheet {
    /// An empty sheet with a fresh id.
    pub fn new(name: &str) -> Self {
        Self::with_id(&generate_id(), name)
    }

    pub fn with_id(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            cells: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            col_widths: BTreeMap::new(),
            merges: Vec::new(),
            charts: Vec::new(),
            frozen_rows: 0,
            frozen_cols: 0,
        }
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&CellPos::new(row, col))
    }

    /// Store a cell, or remove the entry when the cell is blank.
    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        let pos = CellPos::new(row, col);
        if cell.is_blank() {
            self.cells.remove(&pos);
        } else {
            self.cells.insert(pos, cell);
        }
    }

    /// Smallest rectangle containing every stored cell.
    pub fn used_range(&self) -> Option<CellRange> {
        let mut iter = self.cells.keys();
        let first = *iter.next()?;
        let mut range = CellRange::single(first);
        for pos in iter {
            range.start_row = range.start_row.min(pos.row);
            range.start_col = range.start_col.min(pos.col);
            range.end_row = range.end_row.max(pos.row);
            range.end_col = range.end_col.max(pos.col);
        }
        Some(range)
    }

    /// Add a merge region. Rejected (returns false) if it overlaps an existing one.
    pub fn add_merge(&mut self, merge: CellRange) -> bool {
        if self.merges.iter().any(|m| m.intersects(&merge)) {
            return false;
        }
        self.merges.push(merge);
        true
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
    use crate::types::CellValue;

    #[test]
    fn test_set_cell_drops_blank() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_cell(0, 0, Cell::new("a"));
        assert_eq!(sheet.cells.len(), 1);
        sheet.set_cell(0, 0, Cell::default());
        assert!(sheet.cells.is_empty());
    }

    #[test]
    fn test_used_range() {
        let mut sheet = Sheet::new("Sheet1");
        assert_eq!(sheet.used_range(), None);
        sheet.set_cell(3, 1, Cell::new(1.0));
        sheet.set_cell(1, 4, Cell::new(2.0));
        assert_eq!(
            sheet.used_range(),
            Some(CellRange {
                start_row: 1,
                start_col: 1,
                end_row: 3,
                end_col: 4
            })
        );
    }

    #[test]
    fn test_overlapping_merge_rejected() {
        let mut sheet = Sheet::new("Sheet1");
        let a = CellRange::new(CellPos::new(0, 0), CellPos::new(1, 1));
        let b = CellRange::new(CellPos::new(1, 1), CellPos::new(2, 2));
        let c = CellRange::new(CellPos::new(3, 0), CellPos::new(3, 3));
        assert!(sheet.add_merge(a));
        assert!(!sheet.add_merge(b));
        assert!(sheet.add_merge(c));
        assert_eq!(sheet.merges.len(), 2);
    }

    #[test]
    fn test_sheet_json_shape() {
        let mut sheet = Sheet::with_id("s1", "Data");
        sheet.set_cell(0, 1, Cell::new(CellValue::Boolean(true)));
        sheet.row_heights.insert(2, 30.0);
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json["cells"]["0,1"]["value"], serde_json::json!(true));
        assert_eq!(json["rowHeights"]["2"], serde_json::json!(30.0));
        assert_eq!(json["frozenRows"], serde_json::json!(0));

        let back: Sheet = serde_json::from_value(json).unwrap();
        assert_eq!(back, sheet);
    }

    #[test]
    fn test_active_index_clamped() {
        let mut wb = Workbook::new("T");
        wb.sheets.push(Sheet::new("A"));
        wb.active_sheet = 5;
        assert_eq!(wb.active_index(), 0);
        assert_eq!(Workbook::default().title, DEFAULT_TITLE);
    }
}
