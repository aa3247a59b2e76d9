//! Translation between the sparse workbook model and the grid engine's
//! dense sheet shape.

mod sheet;
mod workbook;

pub use sheet::{
    cell_to_engine, empty_engine_sheet, engine_format_to_sheet, engine_to_cell,
    sheet_to_engine_format, sheet_to_engine_format_with,
};
pub use workbook::{
    engine_format_to_workbook, workbook_to_engine_format, workbook_to_engine_format_with,
};

use serde::{Deserialize, Serialize};

/// Minimum dense matrix size handed to the engine.
pub const DEFAULT_MIN_ROWS: u32 = 100;
pub const DEFAULT_MIN_COLS: u32 = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdapterOptions {
    pub min_rows: u32,
    pub min_cols: u32,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            min_rows: DEFAULT_MIN_ROWS,
            min_cols: DEFAULT_MIN_COLS,
        }
    }
}
