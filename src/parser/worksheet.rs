//! Worksheet parsing - turns one sheet part into address-keyed records.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::{parse_cell_ref_bytes, parse_ref_range_bytes, range_to_range_ref};
use crate::error::Result;
use crate::numfmt::serial_to_datetime;
use crate::types::parse_datetime;
use crate::types::xlsx::{XlsxCell, XlsxCellType, XlsxRawValue, XlsxSheet};
use crate::types::CellPos;
use crate::xml_helpers::{attr_f64, attr_string, decode_xstring};

use super::relationships::SheetInfo;
use super::styles::StyleTable;

/// Pixel width of the default font's maximum digit.
pub(crate) const DIGIT_WIDTH_PX: f64 = 7.0;
/// Padding added to column widths on conversion to pixels.
pub(crate) const COLUMN_PADDING_PX: f64 = 5.0;
/// Upper bound on how many columns one `<col>` span may expand to.
const MAX_COL_SPAN: u32 = 256;

/// Workbook-wide lookups shared by every sheet.
pub(super) struct SheetContext<'a> {
    pub shared_strings: &'a [String],
    pub styles: &'a StyleTable,
    pub date1904: bool,
    pub include_styles: bool,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// Column width in characters to pixels, rounded to two decimals.
pub(crate) fn width_chars_to_px(width: f64) -> f64 {
    ((width * DIGIT_WIDTH_PX + COLUMN_PADDING_PX) * 100.0).round() / 100.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn split_count(e: &BytesStart, key: &[u8]) -> u32 {
    attr_f64(e, key)
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(0, |v| v.round().min(f64::from(u32::MAX)) as u32)
}

/// A `<c>` element while its children are being read.
struct PendingCell {
    pos: CellPos,
    tag: CellTypeTag,
    xf: u32,
    value: Option<String>,
    formula: Option<String>,
}

impl PendingCell {
    fn push_value(&mut self, text: &str) {
        self.value.get_or_insert_with(String::new).push_str(text);
    }
}

/// Resolve a raw `<v>` string against the cell's type tag and format.
fn resolve_value(
    raw: Option<&str>,
    tag: CellTypeTag,
    xf: u32,
    ctx: &SheetContext<'_>,
) -> (XlsxCellType, Option<XlsxRawValue>) {
    let Some(raw) = raw else {
        return (XlsxCellType::Blank, None);
    };
    match tag {
        CellTypeTag::Shared => {
            let text = parse_u32_bytes(raw.trim().as_bytes())
                .and_then(|idx| ctx.shared_strings.get(idx as usize));
            match text {
                Some(text) => (XlsxCellType::String, Some(XlsxRawValue::Text(text.clone()))),
                None => {
                    log::warn!("shared string index {raw} out of range");
                    (XlsxCellType::Blank, None)
                }
            }
        }
        CellTypeTag::Inline | CellTypeTag::Str => {
            (XlsxCellType::String, Some(XlsxRawValue::Text(raw.to_string())))
        }
        CellTypeTag::Bool => (
            XlsxCellType::Boolean,
            Some(XlsxRawValue::Bool(matches!(raw.trim(), "1" | "true" | "TRUE"))),
        ),
        CellTypeTag::Error => (XlsxCellType::Error, Some(XlsxRawValue::Text(raw.to_string()))),
        CellTypeTag::Date => match parse_datetime(raw) {
            Some(dt) => (XlsxCellType::Date, Some(XlsxRawValue::Date(dt))),
            None => (XlsxCellType::String, Some(XlsxRawValue::Text(raw.to_string()))),
        },
        CellTypeTag::Default => {
            let Ok(number) = raw.trim().parse::<f64>() else {
                return (XlsxCellType::String, Some(XlsxRawValue::Text(raw.to_string())));
            };
            if ctx.styles.is_date(xf) {
                if let Some(dt) = serial_to_datetime(number, ctx.date1904) {
                    return (XlsxCellType::Date, Some(XlsxRawValue::Date(dt)));
                }
            }
            (XlsxCellType::Number, Some(XlsxRawValue::Number(number)))
        }
    }
}

fn finish_cell(sheet: &mut XlsxSheet, cell: PendingCell, ctx: &SheetContext<'_>) {
    let (t, v) = resolve_value(cell.value.as_deref(), cell.tag, cell.xf, ctx);
    let s = if ctx.include_styles {
        ctx.styles.style(cell.xf).cloned()
    } else {
        None
    };
    if v.is_none() && cell.formula.is_none() && s.is_none() {
        return;
    }
    sheet.cells.insert(
        cell.pos.to_a1(),
        XlsxCell {
            t,
            v,
            f: cell.formula,
            s,
            c: Vec::new(),
        },
    );
}

/// Parse a single worksheet
#[allow(clippy::too_many_lines)]
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    ctx: &SheetContext<'_>,
) -> Result<XlsxSheet> {
    let file = archive.by_name(&info.path)?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut sheet = XlsxSheet {
        name: info.name.clone(),
        ..XlsxSheet::default()
    };

    let mut buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut seen_pane = false;

    let mut pending: Option<PendingCell> = None;
    let mut in_v = false;
    let mut in_f = false;
    let mut in_is = false;
    let mut in_inline_t = false;
    let mut in_phonetic = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"dimension" => {
                        if let Some(raw) = attr_string(e, b"ref") {
                            // Keep unusable markers verbatim; import falls back to a scan.
                            sheet.range = Some(
                                parse_ref_range_bytes(raw.as_bytes())
                                    .map_or(raw, |range| range_to_range_ref(&range)),
                            );
                        }
                    }
                    b"pane" if !seen_pane => {
                        // Only the first sheetView's pane counts
                        seen_pane = true;
                        let state = attr_string(e, b"state").unwrap_or_default();
                        if state == "frozen" || state == "frozenSplit" {
                            sheet.frozen_cols = split_count(e, b"xSplit");
                            sheet.frozen_rows = split_count(e, b"ySplit");
                        }
                    }
                    b"col" => {
                        let min = attr_string(e, b"min")
                            .and_then(|s| parse_u32_bytes(s.as_bytes()))
                            .unwrap_or(1)
                            .max(1);
                        let max = attr_string(e, b"max")
                            .and_then(|s| parse_u32_bytes(s.as_bytes()))
                            .unwrap_or(min)
                            .max(min);
                        if let Some(width) = attr_f64(e, b"width").filter(|w| *w > 0.0) {
                            let capped = max.min(min.saturating_add(MAX_COL_SPAN - 1));
                            if capped < max {
                                log::debug!("column span {min}:{max} truncated to {min}:{capped}");
                            }
                            let px = width_chars_to_px(width);
                            for col in min..=capped {
                                sheet.cols.insert(col - 1, px);
                            }
                        }
                    }
                    b"row" => {
                        current_row = attr_string(e, b"r")
                            .and_then(|s| parse_u32_bytes(s.as_bytes()))
                            .and_then(|r| r.checked_sub(1))
                            .unwrap_or(current_row);
                        next_col = 0;
                        if let Some(ht) = attr_f64(e, b"ht").filter(|h| *h > 0.0) {
                            sheet.rows.insert(current_row, ht);
                        }
                    }
                    b"c" => {
                        let mut pos = CellPos::new(current_row, next_col);
                        let mut tag = CellTypeTag::Default;
                        let mut xf = 0;
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => match parse_cell_ref_bytes(&attr.value) {
                                    Some(p) => pos = p,
                                    None => log::warn!(
                                        "unresolvable cell reference {:?} in {}",
                                        String::from_utf8_lossy(&attr.value),
                                        info.name
                                    ),
                                },
                                b"t" => tag = parse_cell_type_tag(&attr.value),
                                b"s" => xf = parse_u32_bytes(&attr.value).unwrap_or(0),
                                _ => {}
                            }
                        }
                        next_col = pos.col.saturating_add(1);
                        let cell = PendingCell {
                            pos,
                            tag,
                            xf,
                            value: None,
                            formula: None,
                        };
                        if is_start_event {
                            pending = Some(cell);
                        } else {
                            finish_cell(&mut sheet, cell, ctx);
                        }
                    }
                    b"v" if is_start_event && pending.is_some() => in_v = true,
                    b"f" if is_start_event => {
                        if let Some(cell) = pending.as_mut() {
                            in_f = true;
                            cell.formula = Some(String::new());
                        }
                    }
                    b"is" if is_start_event => in_is = true,
                    b"rPh" if is_start_event => in_phonetic = true,
                    b"t" if is_start_event && in_is && !in_phonetic => in_inline_t = true,
                    b"mergeCell" => {
                        if let Some(range) = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"ref")
                            .and_then(|a| parse_ref_range_bytes(&a.value))
                        {
                            sheet.merges.push(range);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) if in_v || in_f || in_inline_t => {
                if let (Some(cell), Ok(text)) = (pending.as_mut(), e.unescape()) {
                    if in_f {
                        if let Some(f) = cell.formula.as_mut() {
                            f.push_str(&text);
                        }
                    } else {
                        cell.push_value(&decode_xstring(&text));
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(cell) = pending.take() {
                        finish_cell(&mut sheet, cell, ctx);
                    }
                    in_v = false;
                    in_f = false;
                    in_is = false;
                    in_inline_t = false;
                }
                b"v" => in_v = false,
                b"f" => {
                    in_f = false;
                    // Shared-formula followers carry no text of their own
                    if let Some(cell) = pending.as_mut() {
                        if cell.formula.as_deref().is_some_and(str::is_empty) {
                            cell.formula = None;
                        }
                    }
                }
                b"is" => {
                    in_is = false;
                    // An empty inline string is still a string
                    if let Some(cell) = pending.as_mut() {
                        cell.value.get_or_insert_with(String::new);
                    }
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_inline_t = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheet)
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
    use crate::parser::styles::parse_styles;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2"><font><sz val="11"/></font><font><b/><sz val="11"/></font></fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="1"><border/></borders>
<cellXfs count="3">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
<xf numFmtId="14" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
<xf numFmtId="0" fontId="1" fillId="0" borderId="0" applyFont="1"/>
</cellXfs>
</styleSheet>"#;

    fn parse(sheet_xml: &str, shared: &[String]) -> XlsxSheet {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("xl/worksheets/sheet1.xml", FileOptions::default())
            .unwrap();
        zip.write_all(sheet_xml.as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let styles = parse_styles(STYLES.as_bytes());
        let ctx = SheetContext {
            shared_strings: shared,
            styles: &styles,
            date1904: false,
            include_styles: true,
        };
        let info = SheetInfo {
            name: "Sheet1".into(),
            path: "xl/worksheets/sheet1.xml".into(),
        };
        parse_sheet(&mut archive, &info, &ctx).unwrap()
    }

    #[test]
    fn test_cell_types() {
        let xml = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<dimension ref="A1:$G$1"/>
<sheetData>
<row r="1">
<c r="A1" t="s"><v>0</v></c>
<c r="B1"><v>42.5</v></c>
<c r="C1" t="b"><v>1</v></c>
<c r="D1" t="inlineStr"><is><r><t>in</t></r><r><t>line</t></r></is></c>
<c r="E1" t="e"><v>#DIV/0!</v></c>
<c r="F1" s="1"><v>45292</v></c>
<c r="G1" t="d"><v>2024-03-05T10:30:00</v></c>
</row>
</sheetData>
</worksheet>"#;
        let sheet = parse(xml, &["hello".to_string()]);
        assert_eq!(sheet.range.as_deref(), Some("A1:G1"));
        assert_eq!(sheet.cells["A1"].v, Some(XlsxRawValue::Text("hello".into())));
        assert_eq!(sheet.cells["B1"].t, XlsxCellType::Number);
        assert_eq!(sheet.cells["B1"].v, Some(XlsxRawValue::Number(42.5)));
        assert_eq!(sheet.cells["C1"].v, Some(XlsxRawValue::Bool(true)));
        assert_eq!(sheet.cells["D1"].v, Some(XlsxRawValue::Text("inline".into())));
        assert_eq!(sheet.cells["E1"].t, XlsxCellType::Error);
        assert_eq!(sheet.cells["F1"].t, XlsxCellType::Date);
        assert_eq!(
            sheet.cells["F1"].v,
            Some(XlsxRawValue::Date(parse_datetime("2024-01-01").unwrap()))
        );
        assert_eq!(
            sheet.cells["G1"].v,
            Some(XlsxRawValue::Date(parse_datetime("2024-03-05T10:30:00").unwrap()))
        );
    }

    #[test]
    fn test_formulas_styles_and_layout() {
        let xml = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetViews><sheetView workbookViewId="0"><pane xSplit="2" ySplit="1" topLeftCell="C2" state="frozen"/></sheetView></sheetViews>
<cols><col min="1" max="2" width="12.5" customWidth="1"/></cols>
<sheetData>
<row r="1" ht="30" customHeight="1">
<c r="A1"><f>SUM(B1:C1)</f><v>3</v></c>
<c r="B1" s="2"/>
<c r="C1"/>
</row>
<row r="3"><c t="str"><f t="shared" si="0" ref="A3:A4">B3&amp;"x"</f><v>x</v></c></row>
</sheetData>
<mergeCells count="1"><mergeCell ref="A5:C6"/></mergeCells>
</worksheet>"#;
        let sheet = parse(xml, &[]);
        assert_eq!(sheet.frozen_rows, 1);
        assert_eq!(sheet.frozen_cols, 2);
        assert_eq!(sheet.cols[&0], 92.5);
        assert_eq!(sheet.cols[&1], 92.5);
        assert_eq!(sheet.rows[&0], 30.0);

        assert_eq!(sheet.cells["A1"].f.as_deref(), Some("SUM(B1:C1)"));
        assert_eq!(sheet.cells["A1"].v, Some(XlsxRawValue::Number(3.0)));

        let b1 = &sheet.cells["B1"];
        assert_eq!(b1.t, XlsxCellType::Blank);
        assert!(b1.s.as_ref().unwrap().font.as_ref().unwrap().bold);
        assert!(!sheet.cells.contains_key("C1"));

        // Missing r attribute falls back to the row position
        assert_eq!(sheet.cells["A3"].f.as_deref(), Some(r#"B3&"x""#));
        assert_eq!(sheet.range, None);

        assert_eq!(sheet.merges.len(), 1);
        assert_eq!(range_to_range_ref(&sheet.merges[0]), "A5:C6");
    }

    #[test]
    fn test_width_conversion() {
        assert_eq!(width_chars_to_px(8.43), 64.01);
        assert_eq!(width_chars_to_px(0.0), 5.0);
    }
}
