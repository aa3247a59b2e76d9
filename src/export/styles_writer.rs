//! Builds xl/styles.xml from the nested styles of the written cells.
//!
//! Fonts, fills, borders, number formats and cell formats are deduplicated.
//! Index 0 of every list (and the `gray125` fill at index 1) holds the
//! workbook defaults, so registered entries never reuse those slots.

use std::fmt::Write as _;

use crate::numfmt::{builtin_format_id, FIRST_CUSTOM_FORMAT_ID};
use crate::types::xlsx::{XlsxBorder, XlsxBorderEdge, XlsxFill, XlsxFont, XlsxStyle};
use crate::xml_helpers::{to_argb, xml_escape};

#[derive(Debug, Default, Clone, PartialEq)]
struct XfKey {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    horizontal: Option<String>,
    vertical: Option<String>,
}

/// Deduplicating registry of cell formats.
#[derive(Debug)]
pub(crate) struct StyleRegistry {
    fonts: Vec<XlsxFont>,
    fills: Vec<XlsxFill>,
    borders: Vec<XlsxBorder>,
    num_fmts: Vec<(u32, String)>,
    xfs: Vec<XfKey>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self {
            fonts: vec![XlsxFont {
                sz: Some(11.0),
                name: Some("Calibri".to_string()),
                ..XlsxFont::default()
            }],
            fills: vec![
                XlsxFill {
                    pattern_type: Some("none".to_string()),
                    fg_color: None,
                },
                XlsxFill {
                    pattern_type: Some("gray125".to_string()),
                    fg_color: None,
                },
            ],
            borders: vec![XlsxBorder::default()],
            num_fmts: Vec::new(),
            xfs: vec![XfKey::default()],
        }
    }
}

/// Position of `item` at or after `reserved`, appending it when new.
#[allow(clippy::cast_possible_truncation)]
fn intern<T: PartialEq + Clone>(list: &mut Vec<T>, reserved: usize, item: &T) -> u32 {
    let found = list
        .iter()
        .enumerate()
        .skip(reserved)
        .find(|(_, existing)| *existing == item)
        .map(|(idx, _)| idx);
    let idx = found.unwrap_or_else(|| {
        list.push(item.clone());
        list.len() - 1
    });
    idx as u32
}

impl StyleRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The `s` index for a cell style. Empty styles use the default format.
    pub(crate) fn register(&mut self, style: &XlsxStyle) -> u32 {
        if style.is_empty() {
            return 0;
        }

        let font_id = match style.font.as_ref().filter(|f| !f.is_empty()) {
            Some(font) => intern(&mut self.fonts, 1, font),
            None => 0,
        };
        let fill_id = match style.fill.as_ref().filter(|f| f.fg_color.is_some()) {
            Some(fill) => {
                let fill = XlsxFill {
                    pattern_type: Some(
                        fill.pattern_type
                            .clone()
                            .unwrap_or_else(|| "solid".to_string()),
                    ),
                    fg_color: fill.fg_color.clone(),
                };
                intern(&mut self.fills, 2, &fill)
            }
            None => 0,
        };
        let border_id = match style.border.as_ref().filter(|b| !b.is_empty()) {
            Some(border) => intern(&mut self.borders, 1, border),
            None => 0,
        };
        let num_fmt_id = style.num_fmt.as_deref().map_or(0, |code| self.num_fmt_id(code));

        let alignment = style.alignment.clone().unwrap_or_default();
        let key = XfKey {
            num_fmt_id,
            font_id,
            fill_id,
            border_id,
            horizontal: alignment.horizontal,
            vertical: alignment.vertical,
        };
        intern(&mut self.xfs, 1, &key)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn num_fmt_id(&mut self, code: &str) -> u32 {
        if let Some(id) = builtin_format_id(code) {
            return id;
        }
        if let Some((id, _)) = self.num_fmts.iter().find(|(_, c)| c == code) {
            return *id;
        }
        let id = FIRST_CUSTOM_FORMAT_ID + self.num_fmts.len() as u32;
        self.num_fmts.push((id, code.to_string()));
        id
    }

    /// Serialize the registry as a complete styles part.
    pub(crate) fn to_xml(&self) -> String {
        let mut out = String::with_capacity(2048);
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push('\n');
        out.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !self.num_fmts.is_empty() {
            let _ = write!(out, r#"<numFmts count="{}">"#, self.num_fmts.len());
            for (id, code) in &self.num_fmts {
                let _ = write!(
                    out,
                    r#"<numFmt numFmtId="{id}" formatCode="{}"/>"#,
                    xml_escape(code)
                );
            }
            out.push_str("</numFmts>");
        }

        let _ = write!(out, r#"<fonts count="{}">"#, self.fonts.len());
        for font in &self.fonts {
            write_font(&mut out, font);
        }
        out.push_str("</fonts>");

        let _ = write!(out, r#"<fills count="{}">"#, self.fills.len());
        for fill in &self.fills {
            write_fill(&mut out, fill);
        }
        out.push_str("</fills>");

        let _ = write!(out, r#"<borders count="{}">"#, self.borders.len());
        for border in &self.borders {
            write_border(&mut out, border);
        }
        out.push_str("</borders>");

        out.push_str(
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
        );

        let _ = write!(out, r#"<cellXfs count="{}">"#, self.xfs.len());
        for xf in &self.xfs {
            write_xf(&mut out, xf);
        }
        out.push_str("</cellXfs>");

        out.push_str(
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
        );
        out.push_str("</styleSheet>");
        out
    }
}

fn write_font(out: &mut String, font: &XlsxFont) {
    out.push_str("<font>");
    if font.bold {
        out.push_str("<b/>");
    }
    if font.italic {
        out.push_str("<i/>");
    }
    if font.strike {
        out.push_str("<strike/>");
    }
    if font.underline {
        out.push_str("<u/>");
    }
    if let Some(sz) = font.sz {
        let _ = write!(out, r#"<sz val="{sz}"/>"#);
    }
    if let Some(ref color) = font.color {
        let _ = write!(out, r#"<color rgb="{}"/>"#, xml_escape(&to_argb(&color.rgb)));
    }
    if let Some(ref name) = font.name {
        let _ = write!(out, r#"<name val="{}"/>"#, xml_escape(name));
    }
    out.push_str("</font>");
}

fn write_fill(out: &mut String, fill: &XlsxFill) {
    let pattern = fill.pattern_type.as_deref().unwrap_or("none");
    match fill.fg_color {
        Some(ref color) => {
            let _ = write!(
                out,
                r#"<fill><patternFill patternType="{}"><fgColor rgb="{}"/><bgColor indexed="64"/></patternFill></fill>"#,
                xml_escape(pattern),
                xml_escape(&to_argb(&color.rgb))
            );
        }
        None => {
            let _ = write!(
                out,
                r#"<fill><patternFill patternType="{}"/></fill>"#,
                xml_escape(pattern)
            );
        }
    }
}

fn write_edge(out: &mut String, name: &str, edge: Option<&XlsxBorderEdge>) {
    let Some(style) = edge.and_then(|e| e.style.as_deref()) else {
        let _ = write!(out, "<{name}/>");
        return;
    };
    let _ = write!(out, r#"<{name} style="{}">"#, xml_escape(style));
    if let Some(color) = edge.and_then(|e| e.color.as_ref()) {
        let _ = write!(out, r#"<color rgb="{}"/>"#, xml_escape(&to_argb(&color.rgb)));
    }
    let _ = write!(out, "</{name}>");
}

fn write_border(out: &mut String, border: &XlsxBorder) {
    out.push_str("<border>");
    write_edge(out, "left", border.left.as_ref());
    write_edge(out, "right", border.right.as_ref());
    write_edge(out, "top", border.top.as_ref());
    write_edge(out, "bottom", border.bottom.as_ref());
    out.push_str("<diagonal/></border>");
}

fn write_xf(out: &mut String, xf: &XfKey) {
    let _ = write!(
        out,
        r#"<xf numFmtId="{}" fontId="{}" fillId="{}" borderId="{}" xfId="0""#,
        xf.num_fmt_id, xf.font_id, xf.fill_id, xf.border_id
    );
    if xf.num_fmt_id != 0 {
        out.push_str(r#" applyNumberFormat="1""#);
    }
    if xf.font_id != 0 {
        out.push_str(r#" applyFont="1""#);
    }
    if xf.fill_id != 0 {
        out.push_str(r#" applyFill="1""#);
    }
    if xf.border_id != 0 {
        out.push_str(r#" applyBorder="1""#);
    }
    if xf.horizontal.is_none() && xf.vertical.is_none() {
        out.push_str("/>");
        return;
    }
    out.push_str(r#" applyAlignment="1"><alignment"#);
    if let Some(ref h) = xf.horizontal {
        let _ = write!(out, r#" horizontal="{}""#, xml_escape(h));
    }
    if let Some(ref v) = xf.vertical {
        let _ = write!(out, r#" vertical="{}""#, xml_escape(v));
    }
    out.push_str("/></xf>");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::parser::styles::parse_styles;
    use crate::types::xlsx::{XlsxAlignment, XlsxColor};

    fn bold_red() -> XlsxStyle {
        XlsxStyle {
            font: Some(XlsxFont {
                bold: true,
                color: Some(XlsxColor::new("FF0000")),
                ..XlsxFont::default()
            }),
            ..XlsxStyle::default()
        }
    }

    #[test]
    fn test_register_dedups() {
        let mut registry = StyleRegistry::new();
        assert_eq!(registry.register(&XlsxStyle::default()), 0);
        let a = registry.register(&bold_red());
        let b = registry.register(&bold_red());
        assert_eq!(a, 1);
        assert_eq!(a, b);

        let mut with_fmt = bold_red();
        with_fmt.num_fmt = Some("0.000".into());
        assert_eq!(registry.register(&with_fmt), 2);
        assert_eq!(registry.num_fmts, vec![(164, "0.000".to_string())]);

        let mut builtin = bold_red();
        builtin.num_fmt = Some("0.00%".into());
        registry.register(&builtin);
        assert_eq!(registry.xfs.last().unwrap().num_fmt_id, 10);
    }

    #[test]
    fn test_default_font_slot_not_reused() {
        let mut registry = StyleRegistry::new();
        let calibri = XlsxStyle {
            font: Some(registry.fonts[0].clone()),
            ..XlsxStyle::default()
        };
        let xf = registry.register(&calibri);
        assert_eq!(registry.xfs[xf as usize].font_id, 1);
    }

    #[test]
    fn test_written_styles_parse_back() {
        let mut registry = StyleRegistry::new();
        let style = XlsxStyle {
            font: Some(XlsxFont {
                italic: true,
                sz: Some(14.0),
                name: Some("Arial".into()),
                ..XlsxFont::default()
            }),
            fill: Some(XlsxFill {
                pattern_type: Some("solid".into()),
                fg_color: Some(XlsxColor::new("FFFF00")),
            }),
            alignment: Some(XlsxAlignment {
                horizontal: Some("right".into()),
                vertical: Some("top".into()),
            }),
            border: Some(XlsxBorder {
                bottom: Some(XlsxBorderEdge {
                    style: Some("medium".into()),
                    color: Some(XlsxColor::new("112233")),
                }),
                ..XlsxBorder::default()
            }),
            num_fmt: Some("yyyy-mm-dd".into()),
        };
        let xf = registry.register(&style);
        let table = parse_styles(registry.to_xml().as_bytes());
        assert_eq!(table.style(xf), Some(&style));
        assert!(table.is_date(xf));
        assert_eq!(table.style(0), None);
    }
}
