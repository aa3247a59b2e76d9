//! Translation between file-format records and the sparse workbook model,
//! plus the byte-level entry points that wrap the container reader and writer.

use serde::{Deserialize, Serialize};

use crate::cell_ref::{cell_ref_to_indices, range_ref_to_range, range_to_range_ref};
use crate::error::{Result, XlgridError};
use crate::export::write_book;
use crate::parser::{parse_with_options, ParseOptions};
use crate::style_codec::{file_to_style, style_to_file};
use crate::types::xlsx::{XlsxBook, XlsxCell, XlsxCellType, XlsxRawValue, XlsxSheet};
use crate::types::{
    canonical_formula, parse_datetime, Cell, CellPos, CellRange, CellValue, Sheet, Workbook,
    DEFAULT_TITLE,
};

/// Options for reading and writing XLSX workbooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XlsxOptions {
    /// Carry cell styles across. When false, imported cells are unstyled.
    pub include_styles: bool,
    /// Overrides the workbook title.
    pub title: Option<String>,
    /// Restricts import to the named sheet, or selects the single sheet to export.
    pub sheet_name: Option<String>,
}

impl Default for XlsxOptions {
    fn default() -> Self {
        Self {
            include_styles: true,
            title: None,
            sheet_name: None,
        }
    }
}

/// Read XLSX bytes into a workbook.
pub fn read_xlsx(data: &[u8], options: &XlsxOptions) -> Result<Workbook> {
    let parse_options = ParseOptions {
        include_styles: options.include_styles,
        sheet_name: options.sheet_name.clone(),
    };
    let book = parse_with_options(data, &parse_options)?;
    if let Some(ref name) = options.sheet_name {
        if book.sheets.is_empty() {
            return Err(XlgridError::SheetNotFound(name.clone()));
        }
    }
    let mut workbook = import_book_with(&book, options.include_styles);
    if let Some(ref title) = options.title {
        workbook.title.clone_from(title);
    }
    Ok(workbook)
}

/// Write a workbook as XLSX bytes.
pub fn write_xlsx(workbook: &Workbook, options: &XlsxOptions) -> Result<Vec<u8>> {
    let mut book = export_book(workbook);
    if let Some(ref name) = options.sheet_name {
        book.sheets.retain(|s| &s.name == name);
        if book.sheets.is_empty() {
            return Err(XlgridError::SheetNotFound(name.clone()));
        }
    }
    if !options.include_styles {
        for cell in book.sheets.iter_mut().flat_map(|s| s.cells.values_mut()) {
            cell.s = None;
        }
        // Cells that only carried a style are gone too
        for sheet in &mut book.sheets {
            sheet
                .cells
                .retain(|_, c| c.v.is_some() || c.f.is_some() || !c.c.is_empty());
        }
    }
    if let Some(ref title) = options.title {
        book.title = Some(title.clone());
    }
    write_book(&book)
}

/// Convert file records to a workbook, styles included.
pub fn import_book(book: &XlsxBook) -> Workbook {
    import_book_with(book, true)
}

fn import_book_with(book: &XlsxBook, include_styles: bool) -> Workbook {
    let mut workbook = Workbook::new(book.title.as_deref().unwrap_or(DEFAULT_TITLE));
    workbook.sheets = book
        .sheets
        .iter()
        .map(|sheet| import_sheet(sheet, include_styles))
        .collect();
    workbook
}

/// Used range of a sheet: the range marker if it parses, else the bounding
/// box of every addressed entry.
fn used_range(sheet: &XlsxSheet) -> Option<CellRange> {
    if let Some(range) = sheet.range.as_deref().and_then(range_ref_to_range) {
        return Some(range);
    }
    log::debug!(
        "sheet {}: range marker {:?} unusable, scanning cell addresses",
        sheet.name,
        sheet.range
    );
    let mut positions = sheet
        .cells
        .keys()
        .filter_map(|addr| cell_ref_to_indices(addr).ok());
    let first = positions.next()?;
    Some(positions.fold(CellRange::single(first), |mut range, pos| {
        range.start_row = range.start_row.min(pos.row);
        range.start_col = range.start_col.min(pos.col);
        range.end_row = range.end_row.max(pos.row);
        range.end_col = range.end_col.max(pos.col);
        range
    }))
}

fn import_value(cell: &XlsxCell) -> CellValue {
    match (cell.t, cell.v.as_ref()) {
        (_, None) | (XlsxCellType::Blank | XlsxCellType::Error, _) => CellValue::Null,
        (XlsxCellType::Number, Some(XlsxRawValue::Text(s))) => s
            .trim()
            .parse::<f64>()
            .map_or_else(|_| CellValue::String(s.clone()), CellValue::Number),
        (XlsxCellType::Date, Some(XlsxRawValue::Text(s))) => {
            parse_datetime(s).map_or_else(|| CellValue::String(s.clone()), CellValue::DateTime)
        }
        (_, Some(XlsxRawValue::Number(n))) => CellValue::Number(*n),
        (_, Some(XlsxRawValue::Bool(b))) => CellValue::Boolean(*b),
        (_, Some(XlsxRawValue::Date(dt))) => CellValue::DateTime(*dt),
        (_, Some(XlsxRawValue::Text(s))) => CellValue::String(s.clone()),
    }
}

fn import_sheet(file: &XlsxSheet, include_styles: bool) -> Sheet {
    let mut sheet = Sheet::new(&file.name);

    if let Some(range) = used_range(file) {
        for (addr, record) in &file.cells {
            let Ok(pos) = cell_ref_to_indices(addr) else {
                log::warn!("sheet {}: skipping unresolvable address {addr}", file.name);
                continue;
            };
            if !range.contains(pos) {
                continue;
            }
            let cell = Cell {
                value: import_value(record),
                formula: record.f.as_deref().map(canonical_formula),
                style: if include_styles {
                    record.s.as_ref().and_then(file_to_style)
                } else {
                    None
                },
                comment: if record.c.is_empty() {
                    None
                } else {
                    Some(record.c.join("\n"))
                },
            };
            sheet.set_cell(pos.row, pos.col, cell);
        }
    }

    for merge in &file.merges {
        if !sheet.add_merge(*merge) {
            log::debug!("sheet {}: overlapping merge {merge} dropped", file.name);
        }
    }
    sheet.row_heights = file.rows.clone();
    sheet.col_widths = file.cols.clone();
    sheet.frozen_rows = file.frozen_rows;
    sheet.frozen_cols = file.frozen_cols;
    sheet
}

fn export_cell(cell: &Cell) -> XlsxCell {
    let (t, v) = match cell.value {
        CellValue::Null => (XlsxCellType::Blank, None),
        CellValue::Number(n) => (XlsxCellType::Number, Some(XlsxRawValue::Number(n))),
        CellValue::Boolean(b) => (XlsxCellType::Boolean, Some(XlsxRawValue::Bool(b))),
        CellValue::DateTime(dt) => (XlsxCellType::Date, Some(XlsxRawValue::Date(dt))),
        CellValue::String(ref s) => (XlsxCellType::String, Some(XlsxRawValue::Text(s.clone()))),
    };
    XlsxCell {
        t,
        v,
        f: cell.bare_formula().map(ToString::to_string),
        s: cell.style.as_ref().and_then(style_to_file),
        c: cell.comment.iter().cloned().collect(),
    }
}

fn export_sheet(sheet: &Sheet) -> XlsxSheet {
    let range = sheet.used_range().map(|used| {
        range_to_range_ref(&CellRange::new(
            CellPos::new(0, 0),
            CellPos::new(used.end_row, used.end_col),
        ))
    });
    XlsxSheet {
        name: sheet.name.clone(),
        range,
        cells: sheet
            .cells
            .iter()
            .map(|(pos, cell)| (pos.to_a1(), export_cell(cell)))
            .collect(),
        merges: sheet.merges.clone(),
        rows: sheet.row_heights.clone(),
        cols: sheet.col_widths.clone(),
        frozen_rows: sheet.frozen_rows,
        frozen_cols: sheet.frozen_cols,
    }
}

/// Convert a workbook to file records.
pub fn export_book(workbook: &Workbook) -> XlsxBook {
    XlsxBook {
        title: Some(workbook.title.clone()),
        sheets: workbook.sheets.iter().map(export_sheet).collect(),
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
    use crate::types::Style;

    fn record(t: XlsxCellType, v: XlsxRawValue) -> XlsxCell {
        XlsxCell {
            t,
            v: Some(v),
            ..XlsxCell::default()
        }
    }

    #[test]
    fn test_used_range_fallback() {
        let mut file = XlsxSheet {
            name: "Data".into(),
            range: None,
            ..XlsxSheet::default()
        };
        file.cells.insert(
            "B2".into(),
            record(XlsxCellType::Number, XlsxRawValue::Number(1.0)),
        );
        file.cells.insert(
            "D4".into(),
            record(XlsxCellType::String, XlsxRawValue::Text("x".into())),
        );
        assert_eq!(
            used_range(&file),
            Some(CellRange::new(CellPos::new(1, 1), CellPos::new(3, 3)))
        );

        file.range = Some("not a range".into());
        let sheet = import_sheet(&file, true);
        assert_eq!(sheet.cells.len(), 2);
        assert_eq!(sheet.cell(1, 1).unwrap().value, CellValue::Number(1.0));
        assert_eq!(sheet.cell(3, 3).unwrap().value, CellValue::from("x"));
    }

    #[test]
    fn test_range_marker_limits_import() {
        let mut file = XlsxSheet {
            name: "Data".into(),
            range: Some("A1:B2".into()),
            ..XlsxSheet::default()
        };
        file.cells.insert(
            "A1".into(),
            record(XlsxCellType::Number, XlsxRawValue::Number(1.0)),
        );
        file.cells.insert(
            "C3".into(),
            record(XlsxCellType::Number, XlsxRawValue::Number(2.0)),
        );
        let sheet = import_sheet(&file, true);
        assert_eq!(sheet.cells.len(), 1);
    }

    #[test]
    fn test_formula_convention() {
        let mut file = XlsxSheet {
            name: "S".into(),
            ..XlsxSheet::default()
        };
        let mut sum = record(XlsxCellType::Number, XlsxRawValue::Number(3.0));
        sum.f = Some("A1+A2".into());
        file.cells.insert("A3".into(), sum);

        let sheet = import_sheet(&file, true);
        assert_eq!(sheet.cell(2, 0).unwrap().formula.as_deref(), Some("=A1+A2"));

        let exported = export_sheet(&sheet);
        assert_eq!(exported.cells["A3"].f.as_deref(), Some("A1+A2"));
        assert_eq!(exported.range.as_deref(), Some("A1:A3"));
    }

    #[test]
    fn test_error_and_blank_cells() {
        let mut file = XlsxSheet {
            name: "S".into(),
            ..XlsxSheet::default()
        };
        file.cells.insert(
            "A1".into(),
            record(XlsxCellType::Error, XlsxRawValue::Text("#REF!".into())),
        );
        let mut noted = XlsxCell {
            t: XlsxCellType::Blank,
            c: vec!["one".into(), "two".into()],
            ..XlsxCell::default()
        };
        noted.v = None;
        file.cells.insert("B1".into(), noted);

        let sheet = import_sheet(&file, true);
        // An error with nothing else attached is not materialized
        assert!(sheet.cell(0, 0).is_none());
        let b1 = sheet.cell(0, 1).unwrap();
        assert_eq!(b1.value, CellValue::Null);
        assert_eq!(b1.comment.as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_export_types_and_styles() {
        let mut sheet = Sheet::new("S");
        let style = Style {
            bold: true,
            ..Style::default()
        };
        sheet.set_cell(0, 0, Cell::new(true));
        sheet.set_cell(0, 1, Cell::default().with_style(style.clone()));
        sheet.set_cell(1, 0, Cell::new(parse_datetime("2024-05-01").unwrap()));

        let file = export_sheet(&sheet);
        assert_eq!(file.cells["A1"].t, XlsxCellType::Boolean);
        assert_eq!(file.cells["B1"].t, XlsxCellType::Blank);
        assert!(file.cells["B1"].s.as_ref().unwrap().font.as_ref().unwrap().bold);
        assert_eq!(file.cells["A2"].t, XlsxCellType::Date);

        let back = import_sheet(&file, true);
        assert_eq!(back.cell(0, 1).unwrap().style, Some(style));
        assert!(import_sheet(&file, false).cell(0, 1).is_none());
    }
}
