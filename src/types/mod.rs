//! Data types: the sparse workbook model, the grid-engine sheet shape and the
//! XLSX file records.

mod cell;
mod chart;
pub mod engine;
mod style;
mod workbook;
pub mod xlsx;

pub use cell::*;
pub use chart::*;
pub use style::*;
pub use workbook::*;

pub use crate::cell_ref::{CellPos, CellRange};

/// Helper function for serde skip_serializing_if
#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) fn is_false(b: &bool) -> bool {
    !b
}
