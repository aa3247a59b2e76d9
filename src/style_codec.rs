//! Style translation between the semantic [`Style`] and its two flattened
//! encodings: the grid engine's short-code cell fields and the file format's
//! nested font/fill/alignment/border blocks.
//!
//! Every conversion goes through the semantic style. Unrecognized input is
//! dropped; an all-empty result is `None`.

use crate::types::engine::{BorderCell, BorderInfo, BorderSide, CellFormat, EngineCell};
use crate::types::engine::BORDER_RANGE_CELL;
use crate::types::xlsx::{
    XlsxAlignment, XlsxBorder, XlsxBorderEdge, XlsxColor, XlsxFill, XlsxFont, XlsxStyle,
};
use crate::types::{BorderEdge, BorderKind, HAlign, Style, VAlign};

/// Border color used when the source omits one.
pub const DEFAULT_BORDER_COLOR: &str = "#000000";

// ============================================================================
// Engine short codes
// ============================================================================

fn flag(value: Option<u8>) -> bool {
    value.is_some_and(|v| v != 0)
}

fn set_flag(target: &mut Option<u8>, on: bool) {
    if on {
        *target = Some(1);
    }
}

pub fn h_align_code(align: HAlign) -> u8 {
    match align {
        HAlign::Center => 0,
        HAlign::Left => 1,
        HAlign::Right => 2,
    }
}

pub fn h_align_from_code(code: u8) -> Option<HAlign> {
    match code {
        0 => Some(HAlign::Center),
        1 => Some(HAlign::Left),
        2 => Some(HAlign::Right),
        _ => None,
    }
}

pub fn v_align_code(align: VAlign) -> u8 {
    match align {
        VAlign::Middle => 0,
        VAlign::Top => 1,
        VAlign::Bottom => 2,
    }
}

pub fn v_align_from_code(code: u8) -> Option<VAlign> {
    match code {
        0 => Some(VAlign::Middle),
        1 => Some(VAlign::Top),
        2 => Some(VAlign::Bottom),
        _ => None,
    }
}

/// Write the style's short codes onto an engine cell. Borders are not part
/// of the cell; see [`border_to_engine`].
pub fn style_to_engine(style: &Style, cell: &mut EngineCell) {
    set_flag(&mut cell.bl, style.bold);
    set_flag(&mut cell.it, style.italic);
    set_flag(&mut cell.un, style.underline);
    set_flag(&mut cell.cl, style.strikethrough);
    if let Some(ref family) = style.font_family {
        cell.ff = Some(family.clone());
    }
    if let Some(size) = style.font_size {
        cell.fs = Some(size);
    }
    if let Some(ref color) = style.font_color {
        cell.fc = Some(color.clone());
    }
    if let Some(ref color) = style.background_color {
        cell.bg = Some(color.clone());
    }
    if let Some(align) = style.horizontal_align {
        cell.ht = Some(h_align_code(align));
    }
    if let Some(align) = style.vertical_align {
        cell.vt = Some(v_align_code(align));
    }
    if let Some(ref fmt) = style.number_format {
        cell.ct.get_or_insert_with(CellFormat::default).fa = Some(fmt.clone());
    }
}

/// Read the semantic style back from an engine cell's short codes.
pub fn engine_to_style(cell: &EngineCell) -> Option<Style> {
    Style {
        bold: flag(cell.bl),
        italic: flag(cell.it),
        underline: flag(cell.un),
        strikethrough: flag(cell.cl),
        font_family: cell.ff.clone(),
        font_size: cell.fs,
        font_color: cell.fc.clone(),
        background_color: cell.bg.clone(),
        horizontal_align: cell.ht.and_then(h_align_from_code),
        vertical_align: cell.vt.and_then(v_align_from_code),
        number_format: cell.ct.as_ref().and_then(|ct| ct.fa.clone()),
        ..Style::default()
    }
    .non_empty()
}

pub fn border_kind_code(kind: BorderKind) -> u8 {
    match kind {
        BorderKind::Thin => 1,
        BorderKind::Medium => 2,
        BorderKind::Thick => 3,
        BorderKind::Dashed => 4,
        BorderKind::Dotted => 5,
    }
}

/// Unknown codes fall back to thin.
pub fn border_kind_from_code(code: u8) -> BorderKind {
    match code {
        2 => BorderKind::Medium,
        3 => BorderKind::Thick,
        4 => BorderKind::Dashed,
        5 => BorderKind::Dotted,
        _ => BorderKind::Thin,
    }
}

fn edge_to_side(edge: Option<&BorderEdge>) -> Option<BorderSide> {
    edge.map(|e| BorderSide {
        style: border_kind_code(e.style),
        color: e.color.clone(),
    })
}

fn side_to_edge(side: Option<&BorderSide>) -> Option<BorderEdge> {
    side.map(|s| BorderEdge {
        style: border_kind_from_code(s.style),
        color: if s.color.is_empty() {
            DEFAULT_BORDER_COLOR.to_string()
        } else {
            s.color.clone()
        },
    })
}

/// Per-cell `borderInfo` entry for a style with borders.
pub fn border_to_engine(row: u32, col: u32, style: &Style) -> Option<BorderInfo> {
    if !style.has_borders() {
        return None;
    }
    Some(BorderInfo {
        range_type: BORDER_RANGE_CELL.to_string(),
        value: BorderCell {
            row_index: row,
            col_index: col,
            l: edge_to_side(style.border_left.as_ref()),
            r: edge_to_side(style.border_right.as_ref()),
            t: edge_to_side(style.border_top.as_ref()),
            b: edge_to_side(style.border_bottom.as_ref()),
        },
    })
}

/// Copy a `borderInfo` cell entry's edges onto a style.
pub fn engine_to_border(border: &BorderCell, style: &mut Style) {
    if let Some(edge) = side_to_edge(border.l.as_ref()) {
        style.border_left = Some(edge);
    }
    if let Some(edge) = side_to_edge(border.r.as_ref()) {
        style.border_right = Some(edge);
    }
    if let Some(edge) = side_to_edge(border.t.as_ref()) {
        style.border_top = Some(edge);
    }
    if let Some(edge) = side_to_edge(border.b.as_ref()) {
        style.border_bottom = Some(edge);
    }
}

// ============================================================================
// File-format nested style
// ============================================================================

/// `#RRGGBB` -> `RRGGBB`.
pub fn to_file_color(color: &str) -> XlsxColor {
    XlsxColor::new(color.strip_prefix('#').unwrap_or(color))
}

/// `RRGGBB` -> `#RRGGBB`.
pub fn from_file_color(color: &XlsxColor) -> String {
    if color.rgb.starts_with('#') {
        color.rgb.clone()
    } else {
        format!("#{}", color.rgb)
    }
}

fn edge_to_file(edge: Option<&BorderEdge>) -> Option<XlsxBorderEdge> {
    edge.map(|e| XlsxBorderEdge {
        style: Some(e.style.as_str().to_string()),
        color: Some(to_file_color(&e.color)),
    })
}

fn edge_from_file(edge: Option<&XlsxBorderEdge>) -> Option<BorderEdge> {
    edge.map(|e| BorderEdge {
        style: e
            .style
            .as_deref()
            .map_or(BorderKind::Thin, BorderKind::from_name),
        color: e
            .color
            .as_ref()
            .map_or_else(|| DEFAULT_BORDER_COLOR.to_string(), from_file_color),
    })
}

/// Semantic style -> nested file style.
pub fn style_to_file(style: &Style) -> Option<XlsxStyle> {
    let font = XlsxFont {
        bold: style.bold,
        italic: style.italic,
        underline: style.underline,
        strike: style.strikethrough,
        sz: style.font_size,
        name: style.font_family.clone(),
        color: style.font_color.as_deref().map(to_file_color),
    };

    let fill = style.background_color.as_deref().map(|bg| XlsxFill {
        pattern_type: Some("solid".to_string()),
        fg_color: Some(to_file_color(bg)),
    });

    let alignment = if style.horizontal_align.is_some() || style.vertical_align.is_some() {
        Some(XlsxAlignment {
            horizontal: style.horizontal_align.map(|h| {
                match h {
                    HAlign::Left => "left",
                    HAlign::Center => "center",
                    HAlign::Right => "right",
                }
                .to_string()
            }),
            vertical: style.vertical_align.map(|v| {
                match v {
                    VAlign::Top => "top",
                    VAlign::Middle => "center",
                    VAlign::Bottom => "bottom",
                }
                .to_string()
            }),
        })
    } else {
        None
    };

    let border = XlsxBorder {
        top: edge_to_file(style.border_top.as_ref()),
        right: edge_to_file(style.border_right.as_ref()),
        bottom: edge_to_file(style.border_bottom.as_ref()),
        left: edge_to_file(style.border_left.as_ref()),
    };

    let out = XlsxStyle {
        font: if font.is_empty() { None } else { Some(font) },
        fill,
        alignment,
        border: if border.is_empty() { None } else { Some(border) },
        num_fmt: style.number_format.clone(),
    };
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Nested file style -> semantic style.
pub fn file_to_style(file: &XlsxStyle) -> Option<Style> {
    let mut style = Style::default();

    if let Some(ref font) = file.font {
        style.bold = font.bold;
        style.italic = font.italic;
        style.underline = font.underline;
        style.strikethrough = font.strike;
        style.font_size = font.sz;
        style.font_family = font.name.clone();
        style.font_color = font.color.as_ref().map(from_file_color);
    }

    if let Some(color) = file.fill.as_ref().and_then(|f| f.fg_color.as_ref()) {
        style.background_color = Some(from_file_color(color));
    }

    if let Some(ref alignment) = file.alignment {
        style.horizontal_align = match alignment.horizontal.as_deref() {
            Some("left") => Some(HAlign::Left),
            Some("center") => Some(HAlign::Center),
            Some("right") => Some(HAlign::Right),
            _ => None,
        };
        style.vertical_align = match alignment.vertical.as_deref() {
            Some("top") => Some(VAlign::Top),
            Some("center" | "middle") => Some(VAlign::Middle),
            Some("bottom") => Some(VAlign::Bottom),
            _ => None,
        };
    }

    if let Some(ref border) = file.border {
        style.border_top = edge_from_file(border.top.as_ref());
        style.border_right = edge_from_file(border.right.as_ref());
        style.border_bottom = edge_from_file(border.bottom.as_ref());
        style.border_left = edge_from_file(border.left.as_ref());
    }

    style.number_format = file.num_fmt.clone();
    style.non_empty()
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

    fn full_style() -> Style {
        Style {
            bold: true,
            italic: true,
            underline: true,
            strikethrough: true,
            font_family: Some("Arial".into()),
            font_size: Some(12.0),
            font_color: Some("#FF0000".into()),
            background_color: Some("#00FF0080".into()),
            horizontal_align: Some(HAlign::Right),
            vertical_align: Some(VAlign::Middle),
            border_top: Some(BorderEdge::new(BorderKind::Thick, "#111111")),
            border_right: Some(BorderEdge::new(BorderKind::Dashed, "#222222")),
            border_bottom: Some(BorderEdge::new(BorderKind::Dotted, "#333333")),
            border_left: Some(BorderEdge::new(BorderKind::Medium, "#444444")),
            number_format: Some("0.00%".into()),
        }
    }

    #[test]
    fn test_engine_codes() {
        let mut cell = EngineCell::default();
        style_to_engine(&full_style(), &mut cell);
        assert_eq!(cell.bl, Some(1));
        assert_eq!(cell.cl, Some(1));
        assert_eq!(cell.ff.as_deref(), Some("Arial"));
        assert_eq!(cell.fs, Some(12.0));
        assert_eq!(cell.ht, Some(2));
        assert_eq!(cell.vt, Some(0));
        assert_eq!(cell.ct.as_ref().unwrap().fa.as_deref(), Some("0.00%"));
    }

    #[test]
    fn test_alignment_code_tables() {
        for (align, code) in [(HAlign::Center, 0), (HAlign::Left, 1), (HAlign::Right, 2)] {
            assert_eq!(h_align_code(align), code);
            assert_eq!(h_align_from_code(code), Some(align));
        }
        for (align, code) in [(VAlign::Middle, 0), (VAlign::Top, 1), (VAlign::Bottom, 2)] {
            assert_eq!(v_align_code(align), code);
            assert_eq!(v_align_from_code(code), Some(align));
        }
        assert_eq!(h_align_from_code(7), None);
    }

    #[test]
    fn test_engine_style_without_borders_round_trips() {
        let mut style = full_style();
        style.border_top = None;
        style.border_right = None;
        style.border_bottom = None;
        style.border_left = None;
        let mut cell = EngineCell::default();
        style_to_engine(&style, &mut cell);
        assert_eq!(engine_to_style(&cell), Some(style));
    }

    #[test]
    fn test_border_info_round_trips() {
        let info = border_to_engine(4, 2, &full_style()).unwrap();
        assert_eq!(info.range_type, "cell");
        assert_eq!(info.value.row_index, 4);
        assert_eq!(info.value.t.as_ref().unwrap().style, 3);

        let mut style = Style::default();
        engine_to_border(&info.value, &mut style);
        let expected = full_style();
        assert_eq!(style.border_top, expected.border_top);
        assert_eq!(style.border_left, expected.border_left);
        assert!(border_to_engine(0, 0, &Style::default()).is_none());
    }

    #[test]
    fn test_empty_engine_cell_has_no_style() {
        assert_eq!(engine_to_style(&EngineCell::default()), None);
        let cell = EngineCell {
            bl: Some(0),
            ht: Some(9),
            ..EngineCell::default()
        };
        assert_eq!(engine_to_style(&cell), None);
    }

    #[test]
    fn test_file_style_round_trips() {
        let style = full_style();
        let file = style_to_file(&style).unwrap();
        assert_eq!(file.fill.as_ref().unwrap().pattern_type.as_deref(), Some("solid"));
        assert_eq!(file.fill.as_ref().unwrap().fg_color.as_ref().unwrap().rgb, "00FF0080");
        assert_eq!(file.alignment.as_ref().unwrap().vertical.as_deref(), Some("center"));
        assert_eq!(file.font.as_ref().unwrap().color.as_ref().unwrap().rgb, "FF0000");
        assert_eq!(file_to_style(&file), Some(style));
    }

    #[test]
    fn test_file_border_defaults() {
        let file = XlsxStyle {
            border: Some(XlsxBorder {
                top: Some(XlsxBorderEdge {
                    style: Some("mediumDashDot".into()),
                    color: None,
                }),
                ..XlsxBorder::default()
            }),
            ..XlsxStyle::default()
        };
        let style = file_to_style(&file).unwrap();
        assert_eq!(
            style.border_top,
            Some(BorderEdge::new(BorderKind::Thin, "#000000"))
        );
    }

    #[test]
    fn test_empty_file_style() {
        assert_eq!(style_to_file(&Style::default()), None);
        assert_eq!(file_to_style(&XlsxStyle::default()), None);
        let unknown_alignment = XlsxStyle {
            alignment: Some(XlsxAlignment {
                horizontal: Some("justify".into()),
                vertical: None,
            }),
            ..XlsxStyle::default()
        };
        assert_eq!(file_to_style(&unknown_alignment), None);
    }
}
