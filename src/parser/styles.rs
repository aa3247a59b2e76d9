//! Parsing of xl/styles.xml into one nested style per cell format (xf).

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::BufRead;

use crate::numfmt::{get_builtin_format, is_date_format_id};
use crate::types::xlsx::{
    XlsxAlignment, XlsxBorder, XlsxBorderEdge, XlsxColor, XlsxFill, XlsxFont, XlsxStyle,
};
use crate::xml_helpers::{attr_string, attr_u32, attr_val, attr_val_f64, color_rgb, toggle_on};

/// Resolved cell formats, indexed by the `s` attribute of worksheet cells.
#[derive(Debug, Default)]
pub(crate) struct StyleTable {
    /// `None` for xf 0 and for formats that only reference defaults.
    styles: Vec<Option<XlsxStyle>>,
    /// Whether the format's number format displays dates.
    dates: Vec<bool>,
}

impl StyleTable {
    pub(crate) fn style(&self, xf: u32) -> Option<&XlsxStyle> {
        self.styles.get(xf as usize).and_then(Option::as_ref)
    }

    pub(crate) fn is_date(&self, xf: u32) -> bool {
        self.dates.get(xf as usize).copied().unwrap_or(false)
    }

    pub(crate) fn len(&self) -> usize {
        self.styles.len()
    }
}

#[derive(Debug, Default)]
struct RawXf {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Option<XlsxAlignment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "top" => Some(Self::Top),
            "right" => Some(Self::Right),
            "bottom" => Some(Self::Bottom),
            "left" => Some(Self::Left),
            _ => None,
        }
    }
}

fn set_edge(border: &mut XlsxBorder, edge: Edge, value: XlsxBorderEdge) {
    let slot = match edge {
        Edge::Top => &mut border.top,
        Edge::Right => &mut border.right,
        Edge::Bottom => &mut border.bottom,
        Edge::Left => &mut border.left,
    };
    *slot = Some(value);
}

/// Parse styles.xml content
#[allow(clippy::too_many_lines)]
pub(crate) fn parse_styles<R: BufRead>(reader: R) -> StyleTable {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut buf = Vec::new();

    let mut num_fmts: HashMap<u32, String> = HashMap::new();
    let mut fonts: Vec<XlsxFont> = Vec::new();
    let mut fills: Vec<Option<XlsxFill>> = Vec::new();
    let mut borders: Vec<XlsxBorder> = Vec::new();
    let mut xfs: Vec<RawXf> = Vec::new();

    // State tracking
    let mut in_num_fmts = false;
    let mut in_fonts = false;
    let mut in_fills = false;
    let mut in_borders = false;
    let mut in_cell_xfs = false;

    let mut current_font: Option<XlsxFont> = None;
    let mut current_fill: Option<XlsxFill> = None;
    let mut current_border: Option<XlsxBorder> = None;
    let mut current_edge: Option<(Edge, XlsxBorderEdge)> = None;
    let mut current_xf: Option<RawXf> = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.local_name();
                let name_str = std::str::from_utf8(name.as_ref()).unwrap_or("");

                match name_str {
                    "numFmts" => in_num_fmts = !is_empty,
                    "fonts" => in_fonts = !is_empty,
                    "fills" => in_fills = !is_empty,
                    "borders" => in_borders = !is_empty,
                    "cellXfs" => in_cell_xfs = !is_empty,

                    "numFmt" if in_num_fmts => {
                        if let (Some(id), Some(code)) =
                            (attr_u32(e, b"numFmtId"), attr_string(e, b"formatCode"))
                        {
                            num_fmts.insert(id, code);
                        }
                    }

                    "font" if in_fonts => {
                        if is_empty {
                            fonts.push(XlsxFont::default());
                        } else {
                            current_font = Some(XlsxFont::default());
                        }
                    }
                    "b" => {
                        if let Some(ref mut font) = current_font {
                            font.bold = toggle_on(e);
                        }
                    }
                    "i" => {
                        if let Some(ref mut font) = current_font {
                            font.italic = toggle_on(e);
                        }
                    }
                    "strike" => {
                        if let Some(ref mut font) = current_font {
                            font.strike = toggle_on(e);
                        }
                    }
                    "u" => {
                        if let Some(ref mut font) = current_font {
                            font.underline = attr_val(e).map_or(true, |v| v != "none");
                        }
                    }
                    "sz" => {
                        if let Some(ref mut font) = current_font {
                            font.sz = attr_val_f64(e);
                        }
                    }
                    "name" => {
                        if let Some(ref mut font) = current_font {
                            font.name = attr_val(e);
                        }
                    }

                    "fill" if in_fills => {
                        if is_empty {
                            fills.push(None);
                        } else {
                            current_fill = Some(XlsxFill::default());
                        }
                    }
                    "patternFill" => {
                        if let Some(ref mut fill) = current_fill {
                            fill.pattern_type = attr_string(e, b"patternType");
                        }
                    }
                    "fgColor" => {
                        if let Some(ref mut fill) = current_fill {
                            fill.fg_color = color_rgb(e).map(|rgb| XlsxColor { rgb });
                        }
                    }

                    "border" if in_borders => {
                        if is_empty {
                            borders.push(XlsxBorder::default());
                        } else {
                            current_border = Some(XlsxBorder::default());
                        }
                    }
                    "color" => {
                        let rgb = color_rgb(e);
                        if let Some((_, ref mut edge)) = current_edge {
                            edge.color = rgb.map(|rgb| XlsxColor { rgb });
                        } else if let Some(ref mut font) = current_font {
                            font.color = rgb.map(|rgb| XlsxColor { rgb });
                        }
                    }

                    edge_name if current_border.is_some() => {
                        // An edge without a style draws nothing.
                        let style = attr_string(e, b"style").filter(|s| s != "none");
                        if let (Some(edge), Some(style)) = (Edge::from_name(edge_name), style) {
                            let value = XlsxBorderEdge {
                                style: Some(style),
                                color: None,
                            };
                            match current_border {
                                Some(ref mut border) if is_empty => set_edge(border, edge, value),
                                _ => current_edge = Some((edge, value)),
                            }
                        }
                    }

                    "xf" if in_cell_xfs => {
                        let xf = RawXf {
                            num_fmt_id: attr_u32(e, b"numFmtId").unwrap_or(0),
                            font_id: attr_u32(e, b"fontId").unwrap_or(0),
                            fill_id: attr_u32(e, b"fillId").unwrap_or(0),
                            border_id: attr_u32(e, b"borderId").unwrap_or(0),
                            alignment: None,
                        };
                        if is_empty {
                            xfs.push(xf);
                        } else {
                            current_xf = Some(xf);
                        }
                    }
                    "alignment" => {
                        if let Some(ref mut xf) = current_xf {
                            let alignment = XlsxAlignment {
                                horizontal: attr_string(e, b"horizontal"),
                                vertical: attr_string(e, b"vertical"),
                            };
                            if alignment != XlsxAlignment::default() {
                                xf.alignment = Some(alignment);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"numFmts" => in_num_fmts = false,
                    b"fonts" => in_fonts = false,
                    b"fills" => in_fills = false,
                    b"borders" => in_borders = false,
                    b"cellXfs" => in_cell_xfs = false,
                    b"font" => {
                        if let Some(font) = current_font.take() {
                            fonts.push(font);
                        }
                    }
                    b"fill" => {
                        if let Some(fill) = current_fill.take() {
                            fills.push(Some(fill));
                        }
                    }
                    b"border" => {
                        if let Some(border) = current_border.take() {
                            borders.push(border);
                        }
                    }
                    b"top" | b"right" | b"bottom" | b"left" => {
                        if let (Some((edge, value)), Some(border)) =
                            (current_edge.take(), current_border.as_mut())
                        {
                            set_edge(border, edge, value);
                        }
                    }
                    b"xf" => {
                        if let Some(xf) = current_xf.take() {
                            xfs.push(xf);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    let mut table = StyleTable::default();
    for (idx, xf) in xfs.iter().enumerate() {
        let custom_code = num_fmts.get(&xf.num_fmt_id).map(String::as_str);
        table
            .dates
            .push(is_date_format_id(xf.num_fmt_id, custom_code));
        if idx == 0 {
            table.styles.push(None);
            continue;
        }
        let style = resolve_xf(xf, &num_fmts, &fonts, &fills, &borders);
        table.styles.push(if style.is_empty() { None } else { Some(style) });
    }
    table
}

/// Combine one xf's references. Index 0 of the font and border lists and
/// the first two fills (`none`, `gray125`) are the workbook defaults and
/// contribute nothing.
fn resolve_xf(
    xf: &RawXf,
    num_fmts: &HashMap<u32, String>,
    fonts: &[XlsxFont],
    fills: &[Option<XlsxFill>],
    borders: &[XlsxBorder],
) -> XlsxStyle {
    let font = if xf.font_id == 0 {
        None
    } else {
        fonts
            .get(xf.font_id as usize)
            .filter(|f| !f.is_empty())
            .cloned()
    };

    let fill = if xf.fill_id < 2 {
        None
    } else {
        fills
            .get(xf.fill_id as usize)
            .and_then(Option::as_ref)
            .filter(|f| f.pattern_type.as_deref() != Some("none"))
            .filter(|f| f.fg_color.is_some())
            .cloned()
    };

    let border = if xf.border_id == 0 {
        None
    } else {
        borders
            .get(xf.border_id as usize)
            .filter(|b| !b.is_empty())
            .cloned()
    };

    let num_fmt = match xf.num_fmt_id {
        0 => None,
        id => num_fmts
            .get(&id)
            .cloned()
            .or_else(|| get_builtin_format(id).map(ToString::to_string)),
    };

    XlsxStyle {
        font,
        fill,
        alignment: xf.alignment.clone(),
        border,
        num_fmt,
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

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd"/></numFmts>
  <fonts count="3">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><u/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
    <font><strike/><color theme="1"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left style="thin"><color rgb="FF000000"/></left><right style="medium"/><top/><bottom style="dashed"><color rgb="80112233"/></bottom><diagonal/></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="6">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" fillId="2" borderId="1" xfId="0" applyFont="1"><alignment horizontal="center" vertical="top"/></xf>
    <xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="10" fontId="2" fillId="1" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"><alignment wrapText="1"/></xf>
  </cellXfs>
</styleSheet>"#;

    fn table() -> StyleTable {
        parse_styles(STYLES.as_bytes())
    }

    #[test]
    fn test_default_xf_has_no_style() {
        let t = table();
        assert_eq!(t.len(), 6);
        assert!(t.style(0).is_none());
        assert!(t.style(5).is_none());
        assert!(t.style(99).is_none());
    }

    #[test]
    fn test_font_fill_border_alignment() {
        let t = table();
        let s = t.style(1).unwrap();
        let font = s.font.as_ref().unwrap();
        assert!(font.bold);
        assert!(!font.italic);
        assert!(font.underline);
        assert_eq!(font.sz, Some(14.0));
        assert_eq!(font.name.as_deref(), Some("Arial"));
        assert_eq!(font.color.as_ref().unwrap().rgb, "FF0000");

        let fill = s.fill.as_ref().unwrap();
        assert_eq!(fill.pattern_type.as_deref(), Some("solid"));
        assert_eq!(fill.fg_color.as_ref().unwrap().rgb, "FFFF00");

        let border = s.border.as_ref().unwrap();
        assert_eq!(border.left.as_ref().unwrap().style.as_deref(), Some("thin"));
        assert_eq!(border.left.as_ref().unwrap().color.as_ref().unwrap().rgb, "000000");
        assert_eq!(border.right.as_ref().unwrap().color, None);
        assert!(border.top.is_none());
        assert_eq!(border.bottom.as_ref().unwrap().color.as_ref().unwrap().rgb, "11223380");

        let alignment = s.alignment.as_ref().unwrap();
        assert_eq!(alignment.horizontal.as_deref(), Some("center"));
        assert_eq!(alignment.vertical.as_deref(), Some("top"));
        assert!(s.num_fmt.is_none());
    }

    #[test]
    fn test_number_formats() {
        let t = table();
        assert_eq!(t.style(2).unwrap().num_fmt.as_deref(), Some("yyyy-mm-dd"));
        assert!(t.is_date(2));
        assert_eq!(t.style(3).unwrap().num_fmt.as_deref(), Some("mm-dd-yy"));
        assert!(t.is_date(3));
        assert!(!t.is_date(4));
        assert!(!t.is_date(0));
    }

    #[test]
    fn test_theme_color_dropped_and_gray_fill_skipped() {
        let t = table();
        let s = t.style(4).unwrap();
        let font = s.font.as_ref().unwrap();
        assert!(font.strike);
        assert!(font.color.is_none());
        assert!(s.fill.is_none());
        assert_eq!(s.num_fmt.as_deref(), Some("0.00%"));
    }
}
