//! Generates worksheet XML from file-format sheet records.
//!
//! Strings are written inline (`t="inlineStr"`) so no shared string table
//! is needed, and temporal values as ISO-8601 text (`t="d"`).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::cell_ref::{cell_ref_to_indices, col_to_letters, range_to_range_ref};
use crate::parser::{COLUMN_PADDING_PX, DIGIT_WIDTH_PX};
use crate::types::xlsx::{XlsxCell, XlsxCellType, XlsxRawValue, XlsxSheet};
use crate::types::{CellPos, DATETIME_FORMAT};
use crate::xml_helpers::{xml_escape, xml_escape_text};

use super::styles_writer::StyleRegistry;

/// A rendered worksheet plus the comments that go into its comments part.
pub(crate) struct WrittenSheet {
    pub xml: String,
    pub comments: Vec<(CellPos, String)>,
}

/// Column width in pixels back to characters.
pub(crate) fn width_px_to_chars(px: f64) -> f64 {
    ((px - COLUMN_PADDING_PX) / DIGIT_WIDTH_PX).max(0.0)
}

/// Order cells row-major; keys that are not addresses are dropped.
fn positioned_cells(sheet: &XlsxSheet) -> BTreeMap<CellPos, &XlsxCell> {
    let mut cells = BTreeMap::new();
    for (addr, cell) in &sheet.cells {
        match cell_ref_to_indices(addr) {
            Ok(pos) => {
                cells.insert(pos, cell);
            }
            Err(_) => log::warn!("skipping cell with unresolvable reference {addr}"),
        }
    }
    cells
}

/// Write a complete worksheet XML string.
pub(crate) fn write_sheet_xml(sheet: &XlsxSheet, styles: &mut StyleRegistry) -> WrittenSheet {
    let cells = positioned_cells(sheet);
    let comments: Vec<(CellPos, String)> = cells
        .iter()
        .filter(|(_, cell)| !cell.c.is_empty())
        .map(|(pos, cell)| (*pos, cell.c.join("\n")))
        .collect();

    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    );
    out.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    out.push('\n');

    // <dimension>
    if let Some(ref range) = sheet.range {
        let _ = writeln!(out, "<dimension ref=\"{}\"/>", xml_escape(range));
    }

    // <sheetViews> with frozen panes
    if sheet.frozen_rows > 0 || sheet.frozen_cols > 0 {
        out.push_str("<sheetViews><sheetView tabSelected=\"1\" workbookViewId=\"0\">");
        let top_left = format!(
            "{}{}",
            col_to_letters(sheet.frozen_cols),
            sheet.frozen_rows.saturating_add(1)
        );
        let active_pane = match (sheet.frozen_rows > 0, sheet.frozen_cols > 0) {
            (true, true) => "bottomRight",
            (true, false) => "bottomLeft",
            _ => "topRight",
        };
        out.push_str("<pane");
        if sheet.frozen_cols > 0 {
            let _ = write!(out, " xSplit=\"{}\"", sheet.frozen_cols);
        }
        if sheet.frozen_rows > 0 {
            let _ = write!(out, " ySplit=\"{}\"", sheet.frozen_rows);
        }
        let _ = write!(
            out,
            " topLeftCell=\"{top_left}\" activePane=\"{active_pane}\" state=\"frozen\"/>"
        );
        out.push_str("</sheetView></sheetViews>\n");
    }

    out.push_str("<sheetFormatPr defaultRowHeight=\"15\"/>\n");

    // <cols>
    if !sheet.cols.is_empty() {
        out.push_str("<cols>\n");
        for (&col, &px) in &sheet.cols {
            let col1 = col.saturating_add(1); // XLSX is 1-based
            let _ = writeln!(
                out,
                "<col min=\"{col1}\" max=\"{col1}\" width=\"{:.4}\" customWidth=\"1\"/>",
                width_px_to_chars(px)
            );
        }
        out.push_str("</cols>\n");
    }

    // <sheetData>
    out.push_str("<sheetData>\n");
    write_sheet_data(&mut out, sheet, &cells, styles);
    out.push_str("</sheetData>\n");

    // <mergeCells>
    if !sheet.merges.is_empty() {
        let _ = writeln!(out, "<mergeCells count=\"{}\">", sheet.merges.len());
        for merge in &sheet.merges {
            let _ = writeln!(out, "<mergeCell ref=\"{}\"/>", range_to_range_ref(merge));
        }
        out.push_str("</mergeCells>\n");
    }

    if !comments.is_empty() {
        // rId2 of the sheet relationships is the VML drawing
        out.push_str("<legacyDrawing r:id=\"rId2\"/>\n");
    }

    out.push_str("</worksheet>");
    WrittenSheet { xml: out, comments }
}

/// Write all cell rows into `<sheetData>`. Rows with a custom height are
/// written even when they hold no cells.
fn write_sheet_data(
    out: &mut String,
    sheet: &XlsxSheet,
    cells: &BTreeMap<CellPos, &XlsxCell>,
    styles: &mut StyleRegistry,
) {
    let rows: BTreeSet<u32> = cells
        .keys()
        .map(|pos| pos.row)
        .chain(sheet.rows.keys().copied())
        .collect();

    for row in rows {
        let _ = write!(out, "<row r=\"{}\"", row.saturating_add(1));
        if let Some(ht) = sheet.rows.get(&row) {
            let _ = write!(out, " ht=\"{ht}\" customHeight=\"1\"");
        }
        out.push('>');

        let start = CellPos::new(row, 0);
        let end = CellPos::new(row, u32::MAX);
        for (pos, cell) in cells.range(start..=end) {
            write_cell(out, *pos, cell, styles);
        }

        out.push_str("</row>\n");
    }
}

fn write_formula(out: &mut String, cell: &XlsxCell) {
    if let Some(ref f) = cell.f {
        out.push_str("<f>");
        out.push_str(&xml_escape(f));
        out.push_str("</f>");
    }
}

/// Write a single `<c>` element.
fn write_cell(out: &mut String, pos: CellPos, cell: &XlsxCell, styles: &mut StyleRegistry) {
    let _ = write!(out, "<c r=\"{}\"", pos.to_a1());

    let style_idx = cell.s.as_ref().map_or(0, |s| styles.register(s));
    if style_idx != 0 {
        let _ = write!(out, " s=\"{style_idx}\"");
    }

    match (cell.t, cell.v.as_ref()) {
        (_, None) | (XlsxCellType::Blank, _) => {
            if cell.f.is_none() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            write_formula(out, cell);
        }
        (_, Some(XlsxRawValue::Number(n))) if n.is_finite() => {
            out.push('>');
            write_formula(out, cell);
            let _ = write!(out, "<v>{n}</v>");
        }
        (_, Some(XlsxRawValue::Number(_))) => {
            out.push_str(" t=\"e\">");
            write_formula(out, cell);
            out.push_str("<v>#NUM!</v>");
        }
        (_, Some(XlsxRawValue::Bool(b))) => {
            out.push_str(" t=\"b\">");
            write_formula(out, cell);
            let _ = write!(out, "<v>{}</v>", u8::from(*b));
        }
        (_, Some(XlsxRawValue::Date(dt))) => {
            out.push_str(" t=\"d\">");
            write_formula(out, cell);
            let _ = write!(out, "<v>{}</v>", dt.format(DATETIME_FORMAT));
        }
        (XlsxCellType::Error, Some(XlsxRawValue::Text(s))) => {
            out.push_str(" t=\"e\">");
            write_formula(out, cell);
            let _ = write!(out, "<v>{}</v>", xml_escape(s));
        }
        (_, Some(XlsxRawValue::Text(s))) => {
            if cell.f.is_some() {
                // Formula results are cached as plain strings
                out.push_str(" t=\"str\">");
                write_formula(out, cell);
                let _ = write!(out, "<v>{}</v>", xml_escape_text(s));
            } else {
                let _ = write!(
                    out,
                    " t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is>",
                    xml_escape_text(s)
                );
            }
        }
    }

    out.push_str("</c>");
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
    use crate::types::parse_datetime;
    use crate::types::CellRange;

    fn cell(t: XlsxCellType, v: Option<XlsxRawValue>) -> XlsxCell {
        XlsxCell {
            t,
            v,
            ..XlsxCell::default()
        }
    }

    #[test]
    fn test_cells_in_row_order() {
        let mut sheet = XlsxSheet {
            name: "S".into(),
            range: Some("A1:B10".into()),
            ..XlsxSheet::default()
        };
        sheet.cells.insert(
            "A10".into(),
            cell(XlsxCellType::Number, Some(XlsxRawValue::Number(10.0))),
        );
        sheet.cells.insert(
            "A2".into(),
            cell(XlsxCellType::String, Some(XlsxRawValue::Text("a&b".into()))),
        );
        sheet.cells.insert(
            "B2".into(),
            cell(XlsxCellType::Boolean, Some(XlsxRawValue::Bool(true))),
        );
        sheet.rows.insert(4, 30.0);

        let written = write_sheet_xml(&sheet, &mut StyleRegistry::new());
        let xml = written.xml;
        let a2 = xml.find(r#"<c r="A2""#).unwrap();
        let a10 = xml.find(r#"<c r="A10""#).unwrap();
        assert!(a2 < a10);
        assert!(xml.contains(r#"<is><t xml:space="preserve">a&amp;b</t></is>"#));
        assert!(xml.contains(r#"<c r="B2" t="b"><v>1</v></c>"#));
        assert!(xml.contains(r#"<row r="5" ht="30" customHeight="1"></row>"#));
        assert!(written.comments.is_empty());
    }

    #[test]
    fn test_formula_date_and_layout() {
        let mut sheet = XlsxSheet {
            name: "S".into(),
            frozen_rows: 1,
            frozen_cols: 2,
            ..XlsxSheet::default()
        };
        let mut formula = cell(XlsxCellType::Number, Some(XlsxRawValue::Number(3.0)));
        formula.f = Some("A1+A2".into());
        sheet.cells.insert("A3".into(), formula);
        let dt = parse_datetime("2024-02-29T08:15:00").unwrap();
        let mut dated = cell(XlsxCellType::Date, Some(XlsxRawValue::Date(dt)));
        dated.c = vec!["first".into(), "second".into()];
        sheet.cells.insert("B1".into(), dated);
        sheet.cols.insert(0, 92.5);
        sheet.merges.push(CellRange::new(CellPos::new(4, 0), CellPos::new(5, 2)));

        let written = write_sheet_xml(&sheet, &mut StyleRegistry::new());
        let xml = written.xml;
        assert!(xml.contains(r#"<c r="A3"><f>A1+A2</f><v>3</v></c>"#));
        assert!(xml.contains(r#"<c r="B1" t="d"><v>2024-02-29T08:15:00</v></c>"#));
        assert!(xml.contains(r#"xSplit="2" ySplit="1" topLeftCell="C2""#));
        assert!(xml.contains(r#"<col min="1" max="1" width="12.5000" customWidth="1"/>"#));
        assert!(xml.contains(r#"<mergeCell ref="A5:C6"/>"#));
        assert!(xml.contains("<legacyDrawing"));
        assert_eq!(
            written.comments,
            vec![(CellPos::new(0, 1), "first\nsecond".to_string())]
        );
    }

    #[test]
    fn test_width_px_to_chars() {
        assert_eq!(width_px_to_chars(92.5), 12.5);
        assert_eq!(width_px_to_chars(2.0), 0.0);
    }
}
