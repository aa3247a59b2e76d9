//! Common test utilities and assertion helpers.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::io::{Cursor, Read};

use serde_json::Value;
use xlgrid::cell_ref::cell_ref_to_indices;
use xlgrid::{
    BorderEdge, BorderKind, Cell, CellRange, CellValue, Command, CommandExecutor,
    CommandResponse, HAlign, Sheet, SpreadsheetEditor, Style, Workbook, XlsxOptions,
};

// ============================================================================
// Workbook Helpers
// ============================================================================

/// Read XLSX bytes with default options; panics on failure.
#[must_use]
pub fn read(data: &[u8]) -> Workbook {
    xlgrid::read_xlsx(data, &XlsxOptions::default()).expect("Failed to read workbook")
}

/// Write a workbook with default options; panics on failure.
#[must_use]
pub fn write(workbook: &Workbook) -> Vec<u8> {
    xlgrid::write_xlsx(workbook, &XlsxOptions::default()).expect("Failed to write workbook")
}

/// Cell at an A1 address, if stored.
#[must_use]
pub fn cell_at<'a>(workbook: &'a Workbook, sheet: usize, cell_ref: &str) -> Option<&'a Cell> {
    let pos = cell_ref_to_indices(cell_ref).expect("valid cell reference");
    workbook.sheets[sheet].cell(pos.row, pos.col)
}

/// Value at an A1 address; `Null` when the cell is not stored.
#[must_use]
pub fn value_at(workbook: &Workbook, sheet: usize, cell_ref: &str) -> CellValue {
    cell_at(workbook, sheet, cell_ref)
        .map(|c| c.value.clone())
        .unwrap_or_default()
}

/// Style at an A1 address; panics when the cell has none.
#[must_use]
pub fn style_at<'a>(workbook: &'a Workbook, sheet: usize, cell_ref: &str) -> &'a Style {
    cell_at(workbook, sheet, cell_ref)
        .and_then(|c| c.style.as_ref())
        .unwrap_or_else(|| panic!("no style at {cell_ref}"))
}

pub fn assert_value(workbook: &Workbook, sheet: usize, cell_ref: &str, expected: CellValue) {
    assert_eq!(
        value_at(workbook, sheet, cell_ref),
        expected,
        "value mismatch at sheet {sheet} {cell_ref}"
    );
}

/// A workbook touching every feature the model carries.
#[must_use]
pub fn sample_workbook() -> Workbook {
    let mut workbook = Workbook::new("Quarterly Report");

    let mut summary = Sheet::new("Summary");
    summary.set_cell(
        0,
        0,
        Cell::new("Region").with_style(Style {
            bold: true,
            background_color: Some("#DDEBF7".into()),
            horizontal_align: Some(HAlign::Center),
            border_bottom: Some(BorderEdge::new(BorderKind::Medium, "#1F4E78")),
            ..Style::default()
        }),
    );
    summary.set_cell(0, 1, Cell::new("Sales"));
    summary.set_cell(1, 0, Cell::new("North"));
    summary.set_cell(
        1,
        1,
        Cell::new(1250.5).with_style(Style {
            number_format: Some("#,##0.00".into()),
            ..Style::default()
        }),
    );
    summary.set_cell(2, 0, Cell::new("South").with_comment("Estimated"));
    summary.set_cell(2, 1, Cell::new(980.0));
    summary.set_cell(3, 1, Cell::new(2230.5).with_formula("=SUM(B2:B3)"));
    summary.set_cell(4, 0, Cell::new(true));
    summary.merges.push(CellRange::new(
        xlgrid::CellPos::new(5, 0),
        xlgrid::CellPos::new(5, 2),
    ));
    summary.col_widths.insert(0, 124.0);
    summary.row_heights.insert(0, 28.0);
    summary.frozen_rows = 1;

    let mut notes = Sheet::new("Notes");
    notes.set_cell(0, 0, Cell::new("Owner: Finance & Ops"));
    notes.set_cell(
        1,
        0,
        Cell::new(xlgrid::parse_datetime("2024-03-31").unwrap()).with_style(Style {
            number_format: Some("yyyy-mm-dd".into()),
            ..Style::default()
        }),
    );

    workbook.sheets = vec![summary, notes];
    workbook
}

// ============================================================================
// Package Helpers
// ============================================================================

/// Text of one package part, if present.
#[must_use]
pub fn zip_part(data: &[u8], path: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("valid zip");
    let mut file = archive.by_name(path).ok()?;
    let mut text = String::new();
    file.read_to_string(&mut text).expect("utf-8 part");
    Some(text)
}

/// Names of every part in the package.
#[must_use]
pub fn part_names(data: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(data)).expect("valid zip");
    archive.file_names().map(ToString::to_string).collect()
}

// ============================================================================
// Command Helpers
// ============================================================================

/// Run one command against an editor.
pub fn run(editor: &mut SpreadsheetEditor, kind: &str, payload: Value) -> CommandResponse {
    CommandExecutor::execute(Some(editor), &Command::new("test", kind, payload))
}

/// Run one command and return its result; panics on failure.
pub fn run_ok(editor: &mut SpreadsheetEditor, kind: &str, payload: Value) -> Value {
    let response = run(editor, kind, payload);
    assert!(
        response.success,
        "{kind} failed: {:?}",
        response.error.map(|e| e.message)
    );
    response.result.expect("result on success")
}
