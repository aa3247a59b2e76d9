//! Reading XLSX packages produced by other applications.
//!
//! Packages come from the in-memory fixtures builder, which writes shared
//! strings, a full style sheet and relationship parts.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;
mod fixtures;

use common::{assert_value, cell_at, read, style_at, value_at};
use fixtures::{BorderSide, CellValue as Fx, SheetBuilder, StyleBuilder, XlsxBuilder};
use xlgrid::{
    parse_datetime, BorderKind, CellPos, CellRange, CellValue, HAlign, VAlign, XlgridError,
    XlsxOptions, DEFAULT_TITLE,
};

// ============================================================================
// Values
// ============================================================================

#[test]
fn test_value_types() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Data")
                .cell("A1", "shared text", None)
                .cell("B1", 42, None)
                .cell("C1", -0.25, None)
                .cell("D1", true, None)
                .cell("E1", Fx::InlineString("inline text".into()), None)
                .cell("F1", Fx::Error("#DIV/0!".into()), None),
        )
        .build();

    let wb = read(&xlsx);
    assert_eq!(wb.sheets.len(), 1);
    assert_eq!(wb.sheets[0].name, "Data");
    assert_value(&wb, 0, "A1", CellValue::from("shared text"));
    assert_value(&wb, 0, "B1", CellValue::Number(42.0));
    assert_value(&wb, 0, "C1", CellValue::Number(-0.25));
    assert_value(&wb, 0, "D1", CellValue::Boolean(true));
    assert_value(&wb, 0, "E1", CellValue::from("inline text"));
    // Error literals carry no value and nothing else, so no cell is kept
    assert!(cell_at(&wb, 0, "F1").is_none());
}

#[test]
fn test_shared_strings_reused() {
    let xlsx = XlsxBuilder::new()
        .add_sheet("S")
        .add_cell("A1", "same", None)
        .add_cell("A2", "same", None)
        .add_cell("A3", "Tom & Jerry <3", None)
        .build();

    let wb = read(&xlsx);
    assert_value(&wb, 0, "A1", CellValue::from("same"));
    assert_value(&wb, 0, "A2", CellValue::from("same"));
    assert_value(&wb, 0, "A3", CellValue::from("Tom & Jerry <3"));
}

#[test]
fn test_date_serials_use_number_format() {
    let date = StyleBuilder::new().number_format("yyyy-mm-dd");
    let builtin = StyleBuilder::new().number_format("mm-dd-yy");
    let xlsx = XlsxBuilder::new()
        .add_sheet("Dates")
        .add_cell("A1", 45292, Some(date))
        .add_cell("A2", 45292.5, Some(builtin))
        .add_cell("A3", 45292, None)
        .build();

    let wb = read(&xlsx);
    assert_value(
        &wb,
        0,
        "A1",
        CellValue::DateTime(parse_datetime("2024-01-01").unwrap()),
    );
    assert_value(
        &wb,
        0,
        "A2",
        CellValue::DateTime(parse_datetime("2024-01-01T12:00:00").unwrap()),
    );
    assert_value(&wb, 0, "A3", CellValue::Number(45292.0));
    assert_eq!(
        style_at(&wb, 0, "A1").number_format.as_deref(),
        Some("yyyy-mm-dd")
    );
}

#[test]
fn test_date1904_epoch() {
    let xlsx = XlsxBuilder::new()
        .date1904()
        .add_sheet("Dates")
        .add_cell("A1", 0, Some(StyleBuilder::new().number_format("yyyy-mm-dd")))
        .build();

    let wb = read(&xlsx);
    assert_value(
        &wb,
        0,
        "A1",
        CellValue::DateTime(parse_datetime("1904-01-01").unwrap()),
    );
}

#[test]
fn test_formulas_keep_cached_value() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Calc")
                .cell("A1", 2, None)
                .cell("A2", 3, None)
                .formula("A3", "SUM(A1:A2)", Some(5.0))
                .formula("B1", "NOW()", None),
        )
        .build();

    let wb = read(&xlsx);
    let sum = cell_at(&wb, 0, "A3").unwrap();
    assert_eq!(sum.formula.as_deref(), Some("=SUM(A1:A2)"));
    assert_eq!(sum.value, CellValue::Number(5.0));

    let now = cell_at(&wb, 0, "B1").unwrap();
    assert_eq!(now.formula.as_deref(), Some("=NOW()"));
    assert_eq!(now.value, CellValue::Null);
}

// ============================================================================
// Styles
// ============================================================================

#[test]
fn test_font_fill_and_alignment() {
    let style = StyleBuilder::new()
        .bold()
        .italic()
        .underline()
        .font_name("Arial")
        .font_size(14.0)
        .font_color("#C00000")
        .bg_color("FFFFFF00")
        .align_horizontal("right")
        .align_vertical("center");
    let xlsx = XlsxBuilder::new()
        .add_sheet("S")
        .add_cell("B2", "styled", Some(style))
        .build();

    let wb = read(&xlsx);
    let style = style_at(&wb, 0, "B2");
    assert!(style.bold);
    assert!(style.italic);
    assert!(style.underline);
    assert!(!style.strikethrough);
    assert_eq!(style.font_family.as_deref(), Some("Arial"));
    assert_eq!(style.font_size, Some(14.0));
    assert_eq!(style.font_color.as_deref(), Some("#C00000"));
    assert_eq!(style.background_color.as_deref(), Some("#FFFF00"));
    assert_eq!(style.horizontal_align, Some(HAlign::Right));
    assert_eq!(style.vertical_align, Some(VAlign::Middle));
}

#[test]
fn test_borders() {
    let style = StyleBuilder::new()
        .border_top(BorderSide::new("thick").color("#FF0000"))
        .border_bottom(BorderSide::new("dotted"));
    let xlsx = XlsxBuilder::new()
        .add_sheet("S")
        .add_cell("A1", "boxed", Some(style))
        .build();

    let wb = read(&xlsx);
    let style = style_at(&wb, 0, "A1");
    let top = style.border_top.as_ref().unwrap();
    assert_eq!(top.style, BorderKind::Thick);
    assert_eq!(top.color, "#FF0000");
    let bottom = style.border_bottom.as_ref().unwrap();
    assert_eq!(bottom.style, BorderKind::Dotted);
    assert_eq!(bottom.color, "#000000");
    assert!(style.border_left.is_none());
    assert!(style.border_right.is_none());
}

#[test]
fn test_boxed_cells_across_sheets() {
    let boxed = StyleBuilder::new()
        .strikethrough()
        .border_all("thin", Some("#00B050"));
    let xlsx = XlsxBuilder::new()
        .add_sheet("First")
        .add_cell("A1", "old", Some(boxed))
        .add_merge("A1:B1")
        .done()
        .add_sheet("Second")
        .add_cell("A1", 1, None)
        .build();

    let wb = read(&xlsx);
    assert_eq!(wb.sheets.len(), 2);
    let style = style_at(&wb, 0, "A1");
    assert!(style.strikethrough);
    for edge in [
        &style.border_top,
        &style.border_right,
        &style.border_bottom,
        &style.border_left,
    ] {
        let edge = edge.as_ref().unwrap();
        assert_eq!(edge.style, BorderKind::Thin);
        assert_eq!(edge.color, "#00B050");
    }
    assert_eq!(
        wb.sheets[0].merges,
        vec![CellRange::new(CellPos::new(0, 0), CellPos::new(0, 1))]
    );
    assert_value(&wb, 1, "A1", CellValue::Number(1.0));
}

#[test]
fn test_theme_font_color_dropped() {
    let xlsx = XlsxBuilder::new()
        .add_sheet("S")
        .add_cell("A1", "themed", Some(StyleBuilder::new().bold().font_theme(4)))
        .build();

    let wb = read(&xlsx);
    let style = style_at(&wb, 0, "A1");
    assert!(style.bold);
    assert!(style.font_color.is_none());
}

#[test]
fn test_style_only_cell() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("S")
                .cell("A1", "x", None)
                .styled_cell("C3", StyleBuilder::new().bg_color("#92D050")),
        )
        .build();

    let wb = read(&xlsx);
    let cell = cell_at(&wb, 0, "C3").unwrap();
    assert_eq!(cell.value, CellValue::Null);
    assert_eq!(
        cell.style.as_ref().unwrap().background_color.as_deref(),
        Some("#92D050")
    );
}

#[test]
fn test_styles_skipped_when_disabled() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("S")
                .cell("A1", "bold", Some(StyleBuilder::new().bold()))
                .styled_cell("B1", StyleBuilder::new().bg_color("#FF0000")),
        )
        .build();

    let options = XlsxOptions {
        include_styles: false,
        ..XlsxOptions::default()
    };
    let wb = xlgrid::read_xlsx(&xlsx, &options).unwrap();
    assert!(cell_at(&wb, 0, "A1").unwrap().style.is_none());
    assert!(cell_at(&wb, 0, "B1").is_none());
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_merges_sizes_and_frozen_panes() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Layout")
                .cell("A1", "Title", None)
                .merge("A1:C1")
                .merge("B3:B5")
                .col_width(1, 2, 20.0)
                .row_height(1, 32.0)
                .freeze_panes(1, 2),
        )
        .build();

    let wb = read(&xlsx);
    let sheet = &wb.sheets[0];
    assert_eq!(
        sheet.merges,
        vec![
            CellRange::new(CellPos::new(0, 0), CellPos::new(0, 2)),
            CellRange::new(CellPos::new(2, 1), CellPos::new(4, 1)),
        ]
    );
    // 20 characters at 7px plus 5px padding
    assert_eq!(sheet.col_widths.get(&0), Some(&145.0));
    assert_eq!(sheet.col_widths.get(&1), Some(&145.0));
    assert_eq!(sheet.col_widths.get(&2), None);
    assert_eq!(sheet.row_heights.get(&0), Some(&32.0));
    assert_eq!(sheet.frozen_rows, 1);
    assert_eq!(sheet.frozen_cols, 2);
}

#[test]
fn test_dimension_limits_cells() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("S")
                .cell("A1", 1, None)
                .cell("B2", 2, None)
                .cell("D9", 3, None)
                .dimension("A1:B2"),
        )
        .build();

    let wb = read(&xlsx);
    assert_value(&wb, 0, "B2", CellValue::Number(2.0));
    assert!(cell_at(&wb, 0, "D9").is_none());
}

// ============================================================================
// Workbook
// ============================================================================

#[test]
fn test_sheet_order_and_names() {
    let xlsx = XlsxBuilder::new()
        .sheet(SheetBuilder::new("First").cell("A1", 1, None))
        .sheet(SheetBuilder::new("Second & More").cell("A1", 2, None))
        .sheet(SheetBuilder::new("Empty"))
        .build();

    let wb = read(&xlsx);
    let names: Vec<&str> = wb.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["First", "Second & More", "Empty"]);
    assert!(wb.sheets[2].cells.is_empty());
    assert_value(&wb, 1, "A1", CellValue::Number(2.0));
}

#[test]
fn test_title_from_core_properties() {
    let titled = XlsxBuilder::new().title("Budget 2024").add_sheet("S").build();
    assert_eq!(read(&titled).title, "Budget 2024");

    let untitled = XlsxBuilder::new().add_sheet("S").build();
    assert_eq!(read(&untitled).title, DEFAULT_TITLE);

    let overridden = xlgrid::read_xlsx(
        &titled,
        &XlsxOptions {
            title: Some("Renamed".into()),
            ..XlsxOptions::default()
        },
    )
    .unwrap();
    assert_eq!(overridden.title, "Renamed");
}

#[test]
fn test_comments_attach_to_cells() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Review")
                .cell("A1", "checked", None)
                .comment("A1", "Ann", "Looks right")
                .comment("C4", "Bo", "Fill this in"),
        )
        .build();

    let wb = read(&xlsx);
    let a1 = cell_at(&wb, 0, "A1").unwrap();
    assert_eq!(a1.value, CellValue::from("checked"));
    assert_eq!(a1.comment.as_deref(), Some("Ann:Looks right"));

    // Comments on empty cells still produce a cell
    let c4 = cell_at(&wb, 0, "C4").unwrap();
    assert_eq!(c4.value, CellValue::Null);
    assert_eq!(c4.comment.as_deref(), Some("Bo:Fill this in"));
}

#[test]
fn test_comment_outside_dimension_kept() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Notes")
                .cell("A1", 1, None)
                .cell("F9", 2, None)
                .comment("C4", "Bo", "outside")
                .dimension("A1:A1"),
        )
        .build();

    let wb = read(&xlsx);
    let c4 = cell_at(&wb, 0, "C4").unwrap();
    assert_eq!(c4.comment.as_deref(), Some("Bo:outside"));
    assert_value(&wb, 0, "A1", CellValue::Number(1.0));
    // The widened marker reaches C4 only
    assert!(cell_at(&wb, 0, "F9").is_none());
}

#[test]
fn test_sheet_name_filter() {
    let xlsx = XlsxBuilder::new()
        .sheet(SheetBuilder::new("Keep").cell("A1", "k", None))
        .sheet(SheetBuilder::new("Skip").cell("A1", "s", None))
        .build();

    let only = xlgrid::read_xlsx(
        &xlsx,
        &XlsxOptions {
            sheet_name: Some("Keep".into()),
            ..XlsxOptions::default()
        },
    )
    .unwrap();
    assert_eq!(only.sheets.len(), 1);
    assert_eq!(value_at(&only, 0, "A1"), CellValue::from("k"));

    let missing = xlgrid::read_xlsx(
        &xlsx,
        &XlsxOptions {
            sheet_name: Some("Nope".into()),
            ..XlsxOptions::default()
        },
    );
    assert!(matches!(missing, Err(XlgridError::SheetNotFound(ref n)) if n == "Nope"));
}

#[test]
fn test_invalid_package() {
    assert!(xlgrid::read_xlsx(b"not a zip file", &XlsxOptions::default()).is_err());
}
