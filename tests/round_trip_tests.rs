//! Workbook -> XLSX -> workbook and workbook -> engine -> workbook.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::{cell_at, part_names, read, sample_workbook, value_at, write, zip_part};
use xlgrid::{
    engine_format_to_workbook, read_xlsx, workbook_to_engine_format, write_xlsx, Cell, CellValue,
    Sheet, Workbook, XlgridError, XlsxOptions,
};

fn assert_same_content(a: &Workbook, b: &Workbook) {
    assert_eq!(a.title, b.title);
    assert_eq!(a.sheets.len(), b.sheets.len());
    for (left, right) in a.sheets.iter().zip(&b.sheets) {
        assert_eq!(left.name, right.name);
        assert_eq!(left.cells, right.cells, "cells differ on {}", left.name);
        assert_eq!(left.merges, right.merges);
        assert_eq!(left.row_heights, right.row_heights);
        assert_eq!(left.col_widths, right.col_widths);
        assert_eq!(left.frozen_rows, right.frozen_rows);
        assert_eq!(left.frozen_cols, right.frozen_cols);
    }
}

// ============================================================================
// XLSX
// ============================================================================

#[test]
fn test_xlsx_round_trip_is_lossless() {
    let original = sample_workbook();
    let back = read(&write(&original));
    assert_same_content(&original, &back);
}

#[test]
fn test_xlsx_round_trip_twice_is_stable() {
    let once = read(&write(&sample_workbook()));
    let twice = read(&write(&once));
    assert_same_content(&once, &twice);
}

#[test]
fn test_package_layout() {
    let bytes = write(&sample_workbook());
    let names = part_names(&bytes);
    for expected in [
        "[Content_Types].xml",
        "_rels/.rels",
        "docProps/core.xml",
        "xl/workbook.xml",
        "xl/_rels/workbook.xml.rels",
        "xl/styles.xml",
        "xl/worksheets/sheet1.xml",
        "xl/worksheets/sheet2.xml",
        "xl/comments1.xml",
        "xl/drawings/vmlDrawing1.vml",
        "xl/worksheets/_rels/sheet1.xml.rels",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing part {expected}");
    }
    // Only the first sheet carries a note
    assert!(!names.iter().any(|n| n == "xl/comments2.xml"));

    let workbook = zip_part(&bytes, "xl/workbook.xml").unwrap();
    assert!(workbook.contains(r#"name="Summary""#));
    assert!(workbook.contains(r#"name="Notes""#));

    let sheet = zip_part(&bytes, "xl/worksheets/sheet1.xml").unwrap();
    assert!(sheet.contains("<f>SUM(B2:B3)</f>"));
    assert!(sheet.contains(r#"state="frozen""#));
    assert!(sheet.contains(r#"<mergeCell ref="A6:C6"/>"#));

    let core = zip_part(&bytes, "docProps/core.xml").unwrap();
    assert!(core.contains("Quarterly Report"));
}

#[test]
fn test_special_characters_survive() {
    let mut workbook = Workbook::new("Q&A <draft>");
    let mut sheet = Sheet::new("R&D");
    sheet.set_cell(0, 0, Cell::new("a < b && c > \"d\""));
    sheet.set_cell(1, 0, Cell::new("  padded  "));
    sheet.set_cell(2, 0, Cell::new("line one\nline two"));
    sheet.set_cell(3, 0, Cell::new("日本語"));
    workbook.sheets.push(sheet);

    let back = read(&write(&workbook));
    assert_eq!(back.title, "Q&A <draft>");
    assert_eq!(back.sheets[0].name, "R&D");
    assert_eq!(
        value_at(&back, 0, "A1"),
        CellValue::from("a < b && c > \"d\"")
    );
    assert_eq!(value_at(&back, 0, "A2"), CellValue::from("  padded  "));
    assert_eq!(value_at(&back, 0, "A3"), CellValue::from("line one\nline two"));
    assert_eq!(value_at(&back, 0, "A4"), CellValue::from("日本語"));
}

#[test]
fn test_control_characters_survive() {
    let mut workbook = Workbook::new("Controls");
    let mut sheet = Sheet::new("Raw");
    sheet.set_cell(0, 0, Cell::new("a\u{1}b\u{1f}"));
    sheet.set_cell(1, 0, Cell::new("tag_x0041_"));
    sheet.set_cell(2, 0, Cell::new("ok").with_comment("bell\u{7}"));
    workbook.sheets.push(sheet);

    let bytes = write(&workbook);
    let xml = zip_part(&bytes, "xl/worksheets/sheet1.xml").unwrap();
    assert!(xml.contains("a_x0001_b_x001F_"));
    assert!(!xml.contains('\u{1}'));
    let comments = zip_part(&bytes, "xl/comments1.xml").unwrap();
    assert!(comments.contains("bell_x0007_"));

    let back = read(&bytes);
    assert_eq!(value_at(&back, 0, "A1"), CellValue::from("a\u{1}b\u{1f}"));
    assert_eq!(value_at(&back, 0, "A2"), CellValue::from("tag_x0041_"));
    assert_eq!(
        cell_at(&back, 0, "A3").unwrap().comment.as_deref(),
        Some("bell\u{7}")
    );
}

#[test]
fn test_export_without_styles() {
    let options = XlsxOptions {
        include_styles: false,
        ..XlsxOptions::default()
    };
    let bytes = write_xlsx(&sample_workbook(), &options).unwrap();
    let back = read(&bytes);
    assert!(back
        .sheets
        .iter()
        .flat_map(|s| s.cells.values())
        .all(|c| c.style.is_none()));
    assert_eq!(value_at(&back, 0, "B2"), CellValue::Number(1250.5));
    assert_eq!(
        cell_at(&back, 0, "A3").unwrap().comment.as_deref(),
        Some("Estimated")
    );
}

#[test]
fn test_export_single_sheet() {
    let options = XlsxOptions {
        sheet_name: Some("Notes".into()),
        title: Some("Notes only".into()),
        ..XlsxOptions::default()
    };
    let back = read(&write_xlsx(&sample_workbook(), &options).unwrap());
    assert_eq!(back.title, "Notes only");
    assert_eq!(back.sheets.len(), 1);
    assert_eq!(back.sheets[0].name, "Notes");

    let missing = write_xlsx(
        &sample_workbook(),
        &XlsxOptions {
            sheet_name: Some("Missing".into()),
            ..XlsxOptions::default()
        },
    );
    assert!(matches!(missing, Err(XlgridError::SheetNotFound(_))));
}

#[test]
fn test_empty_workbook_writes_readable_package() {
    let mut workbook = Workbook::new("Blank");
    workbook.sheets.push(Sheet::new("Sheet1"));
    let back = read_xlsx(&write(&workbook), &XlsxOptions::default()).unwrap();
    assert_eq!(back.sheets.len(), 1);
    assert!(back.sheets[0].cells.is_empty());
}

// ============================================================================
// Engine
// ============================================================================

#[test]
fn test_engine_round_trip_is_lossless() {
    let original = sample_workbook();
    let engine = workbook_to_engine_format(&original);
    assert_eq!(engine.len(), 2);
    assert!(engine[0].is_active());
    assert!(!engine[1].is_active());

    let back = engine_format_to_workbook(&engine, Some(&original.title));
    assert_same_content(&original, &back);
    for (left, right) in original.sheets.iter().zip(&back.sheets) {
        assert_eq!(left.id, right.id);
    }
}

#[test]
fn test_engine_through_json() {
    let original = sample_workbook();
    let json = serde_json::to_string(&workbook_to_engine_format(&original)).unwrap();
    let sheets: Vec<xlgrid::types::engine::EngineSheet> = serde_json::from_str(&json).unwrap();
    let back = engine_format_to_workbook(&sheets, Some(&original.title));
    assert_same_content(&original, &back);
}

#[test]
fn test_xlsx_then_engine() {
    let from_file = read(&write(&sample_workbook()));
    let back = engine_format_to_workbook(
        &workbook_to_engine_format(&from_file),
        Some(&from_file.title),
    );
    assert_same_content(&from_file, &back);
}
