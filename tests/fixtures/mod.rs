//! Test fixtures for generating valid XLSX files in memory.
//!
//! The builders produce packages the way a desktop spreadsheet application
//! would: shared strings, an explicit style sheet, relationship parts and
//! optional comments and core properties.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::{StyleBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .add_sheet("Sheet1")
//!     .add_cell("A1", "Hello", Some(StyleBuilder::new().bold().build()))
//!     .add_cell("B1", 42.0, None)
//!     .build();
//!
//! let workbook = xlgrid::read_xlsx(&xlsx, &xlgrid::XlsxOptions::default()).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Style Builder
// ============================================================================

/// A border side definition.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderSide {
    pub style: String,
    pub color: Option<String>,
}

impl BorderSide {
    #[must_use]
    pub fn new(style: &str) -> Self {
        Self {
            style: style.to_string(),
            color: None,
        }
    }

    #[must_use]
    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
}

/// Builder for creating cell styles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBuilder {
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub font_color: Option<String>,
    /// Theme color index instead of an explicit color.
    pub font_theme: Option<u32>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub bg_color: Option<String>,
    pub border_top: Option<BorderSide>,
    pub border_right: Option<BorderSide>,
    pub border_bottom: Option<BorderSide>,
    pub border_left: Option<BorderSide>,
    pub align_horizontal: Option<String>,
    pub align_vertical: Option<String>,
    pub number_format: Option<String>,
}

impl StyleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    #[must_use]
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    #[must_use]
    pub fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    #[must_use]
    pub fn font_name(mut self, name: &str) -> Self {
        self.font_name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Set font color (hex, e.g. "#FF0000" or "FFFF0000").
    #[must_use]
    pub fn font_color(mut self, color: &str) -> Self {
        self.font_color = Some(color.to_string());
        self
    }

    #[must_use]
    pub fn font_theme(mut self, theme: u32) -> Self {
        self.font_theme = Some(theme);
        self
    }

    /// Solid background fill.
    #[must_use]
    pub fn bg_color(mut self, color: &str) -> Self {
        self.bg_color = Some(color.to_string());
        self
    }

    #[must_use]
    pub fn border_all(mut self, style: &str, color: Option<&str>) -> Self {
        let side = BorderSide {
            style: style.to_string(),
            color: color.map(ToString::to_string),
        };
        self.border_top = Some(side.clone());
        self.border_right = Some(side.clone());
        self.border_bottom = Some(side.clone());
        self.border_left = Some(side);
        self
    }

    #[must_use]
    pub fn border_top(mut self, side: BorderSide) -> Self {
        self.border_top = Some(side);
        self
    }

    #[must_use]
    pub fn border_bottom(mut self, side: BorderSide) -> Self {
        self.border_bottom = Some(side);
        self
    }

    #[must_use]
    pub fn align_horizontal(mut self, align: &str) -> Self {
        self.align_horizontal = Some(align.to_string());
        self
    }

    #[must_use]
    pub fn align_vertical(mut self, align: &str) -> Self {
        self.align_vertical = Some(align.to_string());
        self
    }

    #[must_use]
    pub fn number_format(mut self, format: &str) -> Self {
        self.number_format = Some(format.to_string());
        self
    }

    /// Build the style (returns self for use in cell creation).
    #[must_use]
    pub fn build(self) -> Self {
        self
    }
}

// ============================================================================
// Cell Value
// ============================================================================

/// A cell value as it is written into the sheet XML.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Shared string.
    String(String),
    Number(f64),
    Boolean(bool),
    /// Error literal such as `#DIV/0!`.
    Error(String),
    InlineString(String),
    /// Formula without `=`, with an optional cached numeric result.
    Formula(String, Option<f64>),
    /// Style only.
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<StyleBuilder>,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    /// `(min, max, width)` with 1-based column numbers, width in characters.
    pub col_widths: Vec<(u32, u32, f64)>,
    /// `(row, height)` with 1-based row numbers, height in points.
    pub row_heights: Vec<(u32, f64)>,
    pub frozen_rows: u32,
    pub frozen_cols: u32,
    /// `(cell, author, text)`.
    pub comments: Vec<(String, String, String)>,
    /// Overrides the computed `<dimension ref>`.
    pub dimension: Option<String>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    #[must_use]
    pub fn styled_cell(mut self, cell_ref: &str, style: StyleBuilder) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Empty,
            style: Some(style),
        });
        self
    }

    #[must_use]
    pub fn formula(mut self, cell_ref: &str, formula: &str, cached: Option<f64>) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Formula(formula.to_string(), cached),
            style: None,
        });
        self
    }

    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push((min, max, width));
        self
    }

    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push((row, height));
        self
    }

    #[must_use]
    pub fn freeze_panes(mut self, rows: u32, cols: u32) -> Self {
        self.frozen_rows = rows;
        self.frozen_cols = cols;
        self
    }

    #[must_use]
    pub fn comment(mut self, cell_ref: &str, author: &str, text: &str) -> Self {
        self.comments
            .push((cell_ref.to_string(), author.to_string(), text.to_string()));
        self
    }

    #[must_use]
    pub fn dimension(mut self, range: &str) -> Self {
        self.dimension = Some(range.to_string());
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for creating complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    title: Option<String>,
    date1904: bool,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Add a simple sheet by name (returns a builder for chaining).
    #[must_use]
    pub fn add_sheet(self, name: &str) -> XlsxSheetAdder {
        XlsxSheetAdder {
            builder: self,
            sheet: SheetBuilder::new(name),
        }
    }

    /// Write `dc:title` into docProps/core.xml.
    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    #[must_use]
    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut styles = StylesCollector::new();
        let mut shared_strings: Vec<String> = Vec::new();
        for cell in self.sheets.iter().flat_map(|s| s.cells.iter()) {
            if let Some(ref style) = cell.style {
                styles.add_style(style);
            }
            if let CellValue::String(ref s) = cell.value {
                if !shared_strings.contains(s) {
                    shared_strings.push(s.clone());
                }
            }
        }

        let mut put = |path: &str, body: &str| {
            zip.start_file(path, options).expect("start file");
            zip.write_all(body.as_bytes()).expect("write part");
        };

        put(
            "[Content_Types].xml",
            &generate_content_types(&self.sheets, self.title.is_some()),
        );
        put("_rels/.rels", &generate_rels(self.title.is_some()));
        put(
            "xl/_rels/workbook.xml.rels",
            &generate_workbook_rels(self.sheets.len(), !shared_strings.is_empty()),
        );
        put("xl/workbook.xml", &generate_workbook(&self.sheets, self.date1904));
        put("xl/styles.xml", &styles.generate_styles_xml());
        if !shared_strings.is_empty() {
            put("xl/sharedStrings.xml", &generate_shared_strings(&shared_strings));
        }
        if let Some(ref title) = self.title {
            put("docProps/core.xml", &generate_core(title));
        }

        let mut comment_part = 0;
        for (i, sheet) in self.sheets.iter().enumerate() {
            put(
                &format!("xl/worksheets/sheet{}.xml", i + 1),
                &generate_sheet_xml(sheet, &shared_strings, &styles),
            );
            if !sheet.comments.is_empty() {
                comment_part += 1;
                put(
                    &format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1),
                    &generate_sheet_rels(comment_part),
                );
                put(
                    &format!("xl/comments{comment_part}.xml"),
                    &generate_comments(&sheet.comments),
                );
            }
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

/// Helper for fluent sheet building within `XlsxBuilder`.
pub struct XlsxSheetAdder {
    builder: XlsxBuilder,
    sheet: SheetBuilder,
}

impl XlsxSheetAdder {
    #[must_use]
    pub fn add_cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.sheet = self.sheet.cell(cell_ref, value, style);
        self
    }

    #[must_use]
    pub fn add_merge(mut self, range: &str) -> Self {
        self.sheet = self.sheet.merge(range);
        self
    }

    /// Finish the current sheet and return the builder.
    #[must_use]
    pub fn done(mut self) -> XlsxBuilder {
        self.builder.sheets.push(self.sheet);
        self.builder
    }

    /// Build the XLSX directly (finishes the current sheet automatically).
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.done().build()
    }
}

// ============================================================================
// Styles Collector
// ============================================================================

#[derive(Debug, Default)]
struct StylesCollector {
    fonts: Vec<String>,
    fills: Vec<String>,
    borders: Vec<String>,
    num_fmts: Vec<(u32, String)>,
    /// `(font, fill, border, numFmt, alignment xml)`.
    cell_xfs: Vec<(usize, usize, usize, u32, Option<String>)>,
    style_map: Vec<(StyleBuilder, u32)>,
}

impl StylesCollector {
    fn new() -> Self {
        let mut collector = Self::default();
        collector
            .fonts
            .push(r#"<font><sz val="11"/><name val="Calibri"/></font>"#.to_string());
        collector
            .fills
            .push(r#"<fill><patternFill patternType="none"/></fill>"#.to_string());
        collector
            .fills
            .push(r#"<fill><patternFill patternType="gray125"/></fill>"#.to_string());
        collector
            .borders
            .push("<border><left/><right/><top/><bottom/><diagonal/></border>".to_string());
        collector.cell_xfs.push((0, 0, 0, 0, None));
        collector
    }

    fn intern(list: &mut Vec<String>, xml: String) -> usize {
        if let Some(idx) = list.iter().position(|x| *x == xml) {
            return idx;
        }
        list.push(xml);
        list.len() - 1
    }

    fn add_style(&mut self, style: &StyleBuilder) -> u32 {
        if let Some((_, idx)) = self.style_map.iter().find(|(s, _)| s == style) {
            return *idx;
        }

        let mut font = String::from("<font>");
        if style.bold {
            font.push_str("<b/>");
        }
        if style.italic {
            font.push_str("<i/>");
        }
        if style.underline {
            font.push_str("<u/>");
        }
        if style.strikethrough {
            font.push_str("<strike/>");
        }
        font.push_str(&format!(r#"<sz val="{}"/>"#, style.font_size.unwrap_or(11.0)));
        if let Some(ref color) = style.font_color {
            font.push_str(&format!(r#"<color rgb="{}"/>"#, normalize_color(color)));
        } else if let Some(theme) = style.font_theme {
            font.push_str(&format!(r#"<color theme="{theme}"/>"#));
        }
        font.push_str(&format!(
            r#"<name val="{}"/></font>"#,
            escape_xml(style.font_name.as_deref().unwrap_or("Calibri"))
        ));
        let font_id = Self::intern(&mut self.fonts, font);

        let fill_id = match style.bg_color {
            Some(ref color) => Self::intern(
                &mut self.fills,
                format!(
                    r#"<fill><patternFill patternType="solid"><fgColor rgb="{}"/><bgColor indexed="64"/></patternFill></fill>"#,
                    normalize_color(color)
                ),
            ),
            None => 0,
        };

        let border_id = if style.border_top.is_some()
            || style.border_right.is_some()
            || style.border_bottom.is_some()
            || style.border_left.is_some()
        {
            let border = format!(
                "<border>{}{}{}{}<diagonal/></border>",
                format_border_side("left", style.border_left.as_ref()),
                format_border_side("right", style.border_right.as_ref()),
                format_border_side("top", style.border_top.as_ref()),
                format_border_side("bottom", style.border_bottom.as_ref()),
            );
            Self::intern(&mut self.borders, border)
        } else {
            0
        };

        let num_fmt_id = match style.number_format {
            Some(ref code) => get_builtin_format_id(code).unwrap_or_else(|| {
                if let Some((id, _)) = self.num_fmts.iter().find(|(_, c)| c == code) {
                    *id
                } else {
                    let id = 164 + self.num_fmts.len() as u32;
                    self.num_fmts.push((id, code.clone()));
                    id
                }
            }),
            None => 0,
        };

        let alignment = if style.align_horizontal.is_some() || style.align_vertical.is_some() {
            let mut attrs = String::new();
            if let Some(ref h) = style.align_horizontal {
                attrs.push_str(&format!(r#" horizontal="{h}""#));
            }
            if let Some(ref v) = style.align_vertical {
                attrs.push_str(&format!(r#" vertical="{v}""#));
            }
            Some(format!("<alignment{attrs}/>"))
        } else {
            None
        };

        let idx = self.cell_xfs.len() as u32;
        self.cell_xfs
            .push((font_id, fill_id, border_id, num_fmt_id, alignment));
        self.style_map.push((style.clone(), idx));
        idx
    }

    fn get_style_index(&self, style: &StyleBuilder) -> u32 {
        self.style_map
            .iter()
            .find(|(s, _)| s == style)
            .map_or(0, |(_, idx)| *idx)
    }

    fn generate_styles_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !self.num_fmts.is_empty() {
            xml.push_str(&format!(r#"<numFmts count="{}">"#, self.num_fmts.len()));
            for (id, code) in &self.num_fmts {
                xml.push_str(&format!(
                    r#"<numFmt numFmtId="{id}" formatCode="{}"/>"#,
                    escape_xml(code)
                ));
            }
            xml.push_str("</numFmts>");
        }

        for (tag, list) in [
            ("fonts", &self.fonts),
            ("fills", &self.fills),
            ("borders", &self.borders),
        ] {
            xml.push_str(&format!(r#"<{tag} count="{}">"#, list.len()));
            for item in list {
                xml.push_str(item);
            }
            xml.push_str(&format!("</{tag}>"));
        }

        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
        xml.push_str(&format!(r#"<cellXfs count="{}">"#, self.cell_xfs.len()));
        for (font, fill, border, num_fmt, alignment) in &self.cell_xfs {
            let attrs = format!(
                r#"numFmtId="{num_fmt}" fontId="{font}" fillId="{fill}" borderId="{border}" xfId="0""#
            );
            match alignment {
                Some(align) => xml.push_str(&format!("<xf {attrs}>{align}</xf>")),
                None => xml.push_str(&format!("<xf {attrs}/>")),
            }
        }
        xml.push_str("</cellXfs>");
        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        xml.push_str("</styleSheet>");
        xml
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Normalize color to ARGB format (without #).
fn normalize_color(color: &str) -> String {
    let color = color.trim_start_matches('#');
    if color.len() == 8 {
        color.to_uppercase()
    } else {
        format!("FF{}", color.to_uppercase())
    }
}

fn get_builtin_format_id(format: &str) -> Option<u32> {
    match format {
        "General" => Some(0),
        "0" => Some(1),
        "0.00" => Some(2),
        "#,##0" => Some(3),
        "#,##0.00" => Some(4),
        "0%" => Some(9),
        "0.00%" => Some(10),
        "mm-dd-yy" => Some(14),
        "h:mm" => Some(20),
        "m/d/yy h:mm" => Some(22),
        "@" => Some(49),
        _ => None,
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_border_side(name: &str, side: Option<&BorderSide>) -> String {
    match side {
        Some(side) => {
            let mut xml = format!(r#"<{name} style="{}">"#, side.style);
            if let Some(ref c) = side.color {
                xml.push_str(&format!(r#"<color rgb="{}"/>"#, normalize_color(c)));
            }
            xml.push_str(&format!("</{name}>"));
            xml
        }
        None => format!("<{name}/>"),
    }
}

/// "AB12" -> (row 12, column 28), both 1-based.
fn split_ref(cell_ref: &str) -> (u32, u32) {
    let letters: String = cell_ref.chars().take_while(char::is_ascii_alphabetic).collect();
    let digits = &cell_ref[letters.len()..];
    let col = letters
        .bytes()
        .fold(0u32, |acc, b| acc * 26 + u32::from(b.to_ascii_uppercase() - b'A' + 1));
    (digits.parse().expect("row number"), col)
}

fn column_letters(mut col: u32) -> String {
    let mut out = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        out.push(char::from(b'A' + rem as u8));
        col = (col - 1) / 26;
    }
    out.iter().rev().collect()
}

fn generate_content_types(sheets: &[SheetBuilder], with_core: bool) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    if with_core {
        xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    }
    let mut comment_part = 0;
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i + 1
        ));
        if !sheet.comments.is_empty() {
            comment_part += 1;
            xml.push_str(&format!(
                r#"<Override PartName="/xl/comments{comment_part}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml"/>"#
            ));
        }
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels(with_core: bool) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#);
    if with_core {
        xml.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#);
    }
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook_rels(sheet_count: usize, with_strings: bool) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    if with_strings {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
            sheet_count + 2
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder], date1904: bool) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    if date1904 {
        xml.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn generate_core(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title><dc:creator>fixtures</dc:creator></cp:coreProperties>"#,
        escape_xml(title)
    )
}

fn generate_sheet_rels(comment_part: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments" Target="../comments{comment_part}.xml"/></Relationships>"#
    )
}

fn generate_comments(comments: &[(String, String, String)]) -> String {
    let mut authors: Vec<&str> = Vec::new();
    for (_, author, _) in comments {
        if !authors.contains(&author.as_str()) {
            authors.push(author);
        }
    }
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><authors>"#);
    for author in &authors {
        xml.push_str(&format!("<author>{}</author>", escape_xml(author)));
    }
    xml.push_str("</authors><commentList>");
    for (cell_ref, author, text) in comments {
        let author_id = authors.iter().position(|a| a == author).unwrap_or(0);
        xml.push_str(&format!(
            r#"<comment ref="{cell_ref}" authorId="{author_id}"><text><r><rPr><b/></rPr><t xml:space="preserve">{}:</t></r><r><t xml:space="preserve">{}</t></r></text></comment>"#,
            escape_xml(author),
            escape_xml(text)
        ));
    }
    xml.push_str("</commentList></comments>");
    xml
}

fn generate_sheet_xml(
    sheet: &SheetBuilder,
    shared_strings: &[String],
    styles: &StylesCollector,
) -> String {
    let mut cells: Vec<(u32, u32, &CellEntry)> = sheet
        .cells
        .iter()
        .map(|c| {
            let (row, col) = split_ref(&c.cell_ref);
            (row, col, c)
        })
        .collect();
    cells.sort_by_key(|(row, col, _)| (*row, *col));

    let dimension = sheet.dimension.clone().unwrap_or_else(|| {
        let max_row = cells.iter().map(|c| c.0).max().unwrap_or(1);
        let max_col = cells.iter().map(|c| c.1).max().unwrap_or(1);
        format!("A1:{}{max_row}", column_letters(max_col))
    });

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str(&format!(r#"<dimension ref="{dimension}"/>"#));

    if sheet.frozen_rows > 0 || sheet.frozen_cols > 0 {
        let mut pane = String::from("<pane");
        if sheet.frozen_cols > 0 {
            pane.push_str(&format!(r#" xSplit="{}""#, sheet.frozen_cols));
        }
        if sheet.frozen_rows > 0 {
            pane.push_str(&format!(r#" ySplit="{}""#, sheet.frozen_rows));
        }
        pane.push_str(&format!(
            r#" topLeftCell="{}{}" state="frozen"/>"#,
            column_letters(sheet.frozen_cols + 1),
            sheet.frozen_rows + 1
        ));
        xml.push_str(&format!(
            r#"<sheetViews><sheetView workbookViewId="0">{pane}</sheetView></sheetViews>"#
        ));
    }

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for (min, max, width) in &sheet.col_widths {
            xml.push_str(&format!(
                r#"<col min="{min}" max="{max}" width="{width}" customWidth="1"/>"#
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    let mut rows: Vec<u32> = cells.iter().map(|c| c.0).collect();
    rows.extend(sheet.row_heights.iter().map(|(r, _)| *r));
    rows.sort_unstable();
    rows.dedup();
    for row in rows {
        match sheet.row_heights.iter().find(|(r, _)| *r == row) {
            Some((_, ht)) => {
                xml.push_str(&format!(r#"<row r="{row}" ht="{ht}" customHeight="1">"#));
            }
            None => xml.push_str(&format!(r#"<row r="{row}">"#)),
        }
        for (_, _, cell) in cells.iter().filter(|c| c.0 == row) {
            let style = cell
                .style
                .as_ref()
                .map(|s| styles.get_style_index(s))
                .unwrap_or(0);
            let s_attr = if style > 0 {
                format!(r#" s="{style}""#)
            } else {
                String::new()
            };
            let r = &cell.cell_ref;
            match cell.value {
                CellValue::String(ref s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap();
                    xml.push_str(&format!(r#"<c r="{r}"{s_attr} t="s"><v>{idx}</v></c>"#));
                }
                CellValue::Number(n) => {
                    xml.push_str(&format!(r#"<c r="{r}"{s_attr}><v>{n}</v></c>"#));
                }
                CellValue::Boolean(b) => {
                    xml.push_str(&format!(
                        r#"<c r="{r}"{s_attr} t="b"><v>{}</v></c>"#,
                        u8::from(b)
                    ));
                }
                CellValue::Error(ref e) => {
                    xml.push_str(&format!(
                        r#"<c r="{r}"{s_attr} t="e"><v>{}</v></c>"#,
                        escape_xml(e)
                    ));
                }
                CellValue::InlineString(ref s) => {
                    xml.push_str(&format!(
                        r#"<c r="{r}"{s_attr} t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    ));
                }
                CellValue::Formula(ref f, cached) => {
                    let value = cached.map(|v| format!("<v>{v}</v>")).unwrap_or_default();
                    xml.push_str(&format!(
                        r#"<c r="{r}"{s_attr}><f>{}</f>{value}</c>"#,
                        escape_xml(f)
                    ));
                }
                CellValue::Empty => {
                    xml.push_str(&format!(r#"<c r="{r}"{s_attr}/>"#));
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for merge in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{merge}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    if !sheet.comments.is_empty() {
        xml.push_str(r#"<legacyDrawing r:id="rId2"/>"#);
    }
    xml.push_str("</worksheet>");
    xml
}
