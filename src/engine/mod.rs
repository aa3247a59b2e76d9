//! The grid engine the editor drives.
//!
//! Everything the editor does to a sheet goes through [`GridEngine`], which
//! speaks the engine's own sheet shape ([`EngineSheet`]). [`MemoryEngine`]
//! is the in-process implementation.

mod memory;

pub use memory::MemoryEngine;

use serde::{Deserialize, Serialize};

use crate::cell_ref::range_to_range_ref;
use crate::error::{Result, XlgridError};
use crate::types::engine::{BorderCell, EngineCell, EngineSheet};
use crate::types::{CellRange, CellValue, HAlign, VAlign};

/// Largest dense grid an edit may grow a sheet to.
///
/// The grid always starts at A1, so a write at a far address costs the
/// whole rectangle up to it. Grids loaded through `replace_sheets` are
/// not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridLimits {
    pub max_rows: u32,
    pub max_cols: u32,
    /// Bound on `rows * cols`.
    pub max_cells: u64,
}

impl Default for GridLimits {
    fn default() -> Self {
        Self {
            max_rows: 65_536,
            max_cols: 1_024,
            max_cells: 1 << 20,
        }
    }
}

impl GridLimits {
    fn fits(&self, rows: u32, cols: u32) -> bool {
        rows <= self.max_rows
            && cols <= self.max_cols
            && u64::from(rows) * u64::from(cols) <= self.max_cells
    }

    fn describe(&self) -> String {
        format!(
            "at most {} rows, {} columns and {} cells",
            self.max_rows, self.max_cols, self.max_cells
        )
    }

    /// Fails with `GridLimit` when a `rows` x `cols` grid does not fit.
    pub fn check(&self, rows: u32, cols: u32) -> Result<()> {
        if self.fits(rows, cols) {
            return Ok(());
        }
        Err(XlgridError::GridLimit(format!(
            "{rows} x {cols} grid ({})",
            self.describe()
        )))
    }

    /// Fails when the grid from A1 through the end of `range` does not fit.
    pub fn check_range(&self, range: &CellRange) -> Result<()> {
        if self.fits(
            range.end_row.saturating_add(1),
            range.end_col.saturating_add(1),
        ) {
            return Ok(());
        }
        Err(XlgridError::GridLimit(format!(
            "{} ({})",
            range_to_range_ref(range),
            self.describe()
        )))
    }
}

/// What gets written into a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    Value(CellValue),
    /// Formula text, with or without the leading `=`.
    Formula(String),
}

impl From<CellValue> for CellInput {
    fn from(value: CellValue) -> Self {
        Self::Value(value)
    }
}

/// One formatting attribute of a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatAttr {
    Bold(bool),
    Italic(bool),
    Underline(bool),
    Strikethrough(bool),
    FontFamily(String),
    FontSize(f64),
    FontColor(String),
    Background(String),
    HorizontalAlign(HAlign),
    VerticalAlign(VAlign),
    NumberFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

/// Side of `start` that new rows or columns are inserted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertAnchor {
    /// New lines take `start`'s place; existing ones move down or right.
    #[default]
    Before,
    /// New lines go right after `start`.
    After,
}

/// Identity of one engine sheet, in tab order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetHandle {
    pub id: String,
    pub name: String,
    pub active: bool,
}

/// Capability interface of a grid engine. Sheets are addressed by id; an
/// unknown id fails with `SheetNotFound`.
pub trait GridEngine {
    /// Bounds that edits are held to.
    fn limits(&self) -> GridLimits {
        GridLimits::default()
    }

    /// All sheets in tab order, with `celldata` populated.
    fn sheets(&self) -> Vec<EngineSheet>;

    /// Replace every sheet. Exactly one sheet ends up active when any exist.
    fn replace_sheets(&mut self, sheets: Vec<EngineSheet>);

    /// Ids and names without copying cell data.
    fn sheet_handles(&self) -> Vec<SheetHandle> {
        self.sheets()
            .into_iter()
            .map(|s| SheetHandle {
                active: s.is_active(),
                id: s.id,
                name: s.name,
            })
            .collect()
    }

    fn cell(&self, sheet_id: &str, row: u32, col: u32) -> Result<Option<EngineCell>>;

    /// Per-cell border entry, if one exists.
    fn border(&self, sheet_id: &str, row: u32, col: u32) -> Result<Option<BorderCell>>;

    /// Replace the value or formula of a cell, keeping its formatting.
    fn set_cell_value(&mut self, sheet_id: &str, row: u32, col: u32, input: CellInput)
        -> Result<()>;

    /// Fill `range` row by row from `values`. Values outside the range are
    /// ignored, range cells without a value are left alone.
    fn set_range_values(
        &mut self,
        sheet_id: &str,
        range: &CellRange,
        values: Vec<Vec<CellInput>>,
    ) -> Result<()>;

    fn set_cell_format(&mut self, sheet_id: &str, row: u32, col: u32, attr: FormatAttr)
        -> Result<()>;

    /// `None` removes the comment.
    fn set_cell_comment(
        &mut self,
        sheet_id: &str,
        row: u32,
        col: u32,
        comment: Option<&str>,
    ) -> Result<()>;

    /// Replace the cell's border entry; `None` removes it.
    fn set_border(
        &mut self,
        sheet_id: &str,
        row: u32,
        col: u32,
        border: Option<BorderCell>,
    ) -> Result<()>;

    /// Append an empty, inactive sheet.
    fn add_sheet(&mut self, id: &str, name: &str) -> Result<()>;

    fn delete_sheet(&mut self, id: &str) -> Result<()>;

    fn rename_sheet(&mut self, id: &str, name: &str) -> Result<()>;

    fn activate_sheet(&mut self, id: &str) -> Result<()>;

    fn active_sheet_id(&self) -> Option<String>;

    /// Insert `count` empty rows or columns next to `start`. Cells, merges,
    /// sizes and borders past the insertion point shift along.
    fn insert_row_or_column(
        &mut self,
        sheet_id: &str,
        axis: Axis,
        start: u32,
        count: u32,
        anchor: InsertAnchor,
    ) -> Result<()>;

    /// Delete rows or columns `start..=end`, shifting what follows back.
    fn delete_row_or_column(&mut self, sheet_id: &str, axis: Axis, start: u32, end: u32)
        -> Result<()>;
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
    use crate::types::CellPos;
    use test_case::test_case;

    #[test_case(65_536, 16, true; "tall and narrow")]
    #[test_case(1_024, 1_024, true; "square at the cell cap")]
    #[test_case(65_537, 1, false; "too many rows")]
    #[test_case(1, 1_025, false; "too many columns")]
    #[test_case(65_536, 26, false; "too many cells")]
    fn test_default_limits(rows: u32, cols: u32, fits: bool) {
        assert_eq!(GridLimits::default().check(rows, cols).is_ok(), fits);
    }

    #[test]
    fn test_check_range_measures_from_a1() {
        let limits = GridLimits {
            max_rows: 10,
            max_cols: 5,
            max_cells: 50,
        };
        let inside = CellRange::new(CellPos::new(9, 4), CellPos::new(9, 4));
        assert!(limits.check_range(&inside).is_ok());

        let past = CellRange::new(CellPos::new(5, 0), CellPos::new(10, 0));
        let err = limits.check_range(&past).unwrap_err();
        assert!(matches!(err, XlgridError::GridLimit(_)));
        assert!(err.to_string().contains("A6:A11"));
    }

    #[test]
    fn test_limits_deserialize_with_defaults() {
        let limits: GridLimits = serde_json::from_str(r#"{"maxRows": 500}"#).unwrap();
        assert_eq!(limits.max_rows, 500);
        assert_eq!(limits.max_cols, GridLimits::default().max_cols);
    }
}
