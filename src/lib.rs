//! xlgrid - cell-grid adapter for spreadsheet editors
//!
//! Moves workbook content between three shapes without losing it:
//! - a sparse workbook model (cells addressed by position, nested styles)
//! - the dense sheet shape of a grid engine (cell arrays, numeric flags)
//! - XLSX packages and CSV text
//!
//! On top sit an editing facade over a [`GridEngine`] and a JSON command
//! layer that answers typed commands with structured responses.
//!
//! # Usage
//!
//! ```no_run
//! use xlgrid::{CellValue, SpreadsheetEditor};
//!
//! let mut editor: SpreadsheetEditor = SpreadsheetEditor::default();
//! editor.set_cell_value(0, 0, 0, CellValue::from("Revenue"))?;
//! let bytes = editor.export_xlsx(&xlgrid::XlsxOptions::default())?;
//! # Ok::<(), xlgrid::XlgridError>(())
//! ```

// Model and addressing
pub mod cell_ref;
pub mod error;
pub mod id;
pub mod numfmt;
pub mod types;

// Conversion between model and engine shapes
pub mod adapter;
pub mod matrix;
pub mod style_codec;

// File formats
pub mod csv;
pub mod export;
pub mod parser;
pub mod xlsx;
pub mod xml_helpers;

// Editing surface
pub mod commands;
pub mod editor;
pub mod engine;

pub use adapter::{
    engine_format_to_sheet, engine_format_to_workbook, sheet_to_engine_format,
    workbook_to_engine_format, AdapterOptions,
};
pub use commands::{Command, CommandError, CommandExecutor, CommandResponse, ErrorCode};
pub use editor::{detect_input, SpreadsheetEditor};
pub use engine::{GridEngine, GridLimits, MemoryEngine};
pub use error::{Result, XlgridError};
pub use xlsx::{read_xlsx, write_xlsx, XlsxOptions};

pub use types::*;

/// Get the library version
#[must_use]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
