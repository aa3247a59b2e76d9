//! Editing facade over a grid engine.
//!
//! `SpreadsheetEditor` addresses sheets by tab index and translates between
//! the sparse workbook model and the engine's sheet shape. It also keeps
//! what the engine has no place for: the workbook id and title, and chart
//! placeholders per sheet id.

mod input;

pub use input::detect_input;

use std::collections::HashMap;

use log::debug;

use crate::adapter::{
    empty_engine_sheet, engine_format_to_workbook, engine_to_cell, workbook_to_engine_format,
};
use crate::cell_ref::parse_range;
use crate::csv::{sheet_to_csv, write_csv, CsvOptions};
use crate::engine::{
    Axis, FormatAttr, GridEngine, GridLimits, InsertAnchor, MemoryEngine, SheetHandle,
};
use crate::error::{Result, XlgridError};
use crate::id::generate_id;
use crate::style_codec::{border_to_engine, engine_to_border, engine_to_style};
use crate::types::{
    Cell, CellRange, CellValue, Chart, ChartSpec, Style, Workbook, DEFAULT_TITLE,
};
use crate::xlsx::{read_xlsx, write_xlsx, XlsxOptions};

use input::{text_to_cell_input, to_cell_input};

pub struct SpreadsheetEditor<E: GridEngine = MemoryEngine> {
    engine: E,
    id: String,
    title: String,
    charts: HashMap<String, Vec<Chart>>,
}

impl Default for SpreadsheetEditor<MemoryEngine> {
    fn default() -> Self {
        Self::new(MemoryEngine::new())
    }
}

/// Formatting attributes for every populated style field. Flags are always
/// included so that unset flags clear.
fn format_attrs(style: &Style) -> Vec<FormatAttr> {
    let mut attrs = vec![
        FormatAttr::Bold(style.bold),
        FormatAttr::Italic(style.italic),
        FormatAttr::Underline(style.underline),
        FormatAttr::Strikethrough(style.strikethrough),
    ];
    if let Some(ref family) = style.font_family {
        attrs.push(FormatAttr::FontFamily(family.clone()));
    }
    if let Some(size) = style.font_size {
        attrs.push(FormatAttr::FontSize(size));
    }
    if let Some(ref color) = style.font_color {
        attrs.push(FormatAttr::FontColor(color.clone()));
    }
    if let Some(ref color) = style.background_color {
        attrs.push(FormatAttr::Background(color.clone()));
    }
    if let Some(align) = style.horizontal_align {
        attrs.push(FormatAttr::HorizontalAlign(align));
    }
    if let Some(align) = style.vertical_align {
        attrs.push(FormatAttr::VerticalAlign(align));
    }
    if let Some(ref fmt) = style.number_format {
        attrs.push(FormatAttr::NumberFormat(fmt.clone()));
    }
    attrs
}

/// First `SheetN` not already taken, counting from the sheet count.
fn next_sheet_name(handles: &[SheetHandle]) -> String {
    (handles.len() + 1..)
        .map(|n| format!("Sheet{n}"))
        .find(|candidate| !handles.iter().any(|h| h.name == *candidate))
        .unwrap_or_default()
}

fn invalid_index(index: usize) -> XlgridError {
    XlgridError::InvalidOperation(format!("Invalid sheet index: {index}"))
}

impl<E: GridEngine> SpreadsheetEditor<E> {
    /// Wrap an engine. An engine without sheets gets a blank `Sheet1`.
    pub fn new(mut engine: E) -> Self {
        if engine.sheet_handles().is_empty() {
            engine.replace_sheets(vec![empty_engine_sheet()]);
        }
        Self {
            engine,
            id: generate_id(),
            title: DEFAULT_TITLE.to_string(),
            charts: HashMap::new(),
        }
    }

    pub fn from_workbook(engine: E, workbook: &Workbook) -> Self {
        let mut editor = Self::new(engine);
        editor.set_data(workbook);
        editor
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Bounds the engine holds edits to.
    pub fn limits(&self) -> GridLimits {
        self.engine.limits()
    }

    pub fn sheet_count(&self) -> usize {
        self.engine.sheet_handles().len()
    }

    fn sheet_id(&self, index: usize) -> Result<String> {
        self.engine
            .sheet_handles()
            .into_iter()
            .nth(index)
            .map(|h| h.id)
            .ok_or_else(|| XlgridError::SheetNotFound(format!("index {index}")))
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    /// Snapshot of the whole workbook, charts included.
    pub fn get_data(&self) -> Workbook {
        let mut workbook = engine_format_to_workbook(&self.engine.sheets(), Some(&self.title));
        workbook.id = self.id.clone();
        for sheet in &mut workbook.sheets {
            if let Some(charts) = self.charts.get(&sheet.id) {
                sheet.charts = charts.clone();
            }
        }
        workbook
    }

    /// Replace everything with `workbook`. A workbook without sheets loads
    /// as a blank `Sheet1`.
    pub fn set_data(&mut self, workbook: &Workbook) {
        self.id = workbook.id.clone();
        self.title = workbook.title.clone();
        self.charts = workbook
            .sheets
            .iter()
            .filter(|s| !s.charts.is_empty())
            .map(|s| (s.id.clone(), s.charts.clone()))
            .collect();

        let sheets = workbook_to_engine_format(workbook);
        if sheets.is_empty() {
            self.engine.replace_sheets(vec![empty_engine_sheet()]);
        } else {
            self.engine.replace_sheets(sheets);
        }
        debug!(
            "loaded workbook {:?} with {} sheets",
            self.title,
            workbook.sheets.len()
        );
    }

    /// Back to a single blank sheet and the default title.
    pub fn clear(&mut self) {
        self.id = generate_id();
        self.title = DEFAULT_TITLE.to_string();
        self.charts.clear();
        self.engine.replace_sheets(vec![empty_engine_sheet()]);
    }

    // ------------------------------------------------------------------
    // Cells
    // ------------------------------------------------------------------

    /// The full cell at a position, formula and style included.
    pub fn get_cell(&self, sheet: usize, row: u32, col: u32) -> Result<Option<Cell>> {
        let id = self.sheet_id(sheet)?;
        let mut cell = self
            .engine
            .cell(&id, row, col)?
            .as_ref()
            .and_then(engine_to_cell);
        if let Some(border) = self.engine.border(&id, row, col)? {
            let target = cell.get_or_insert_with(Cell::default);
            let mut style = target.style.take().unwrap_or_default();
            engine_to_border(&border, &mut style);
            target.style = style.non_empty();
        }
        Ok(cell)
    }

    pub fn get_cell_value(&self, sheet: usize, row: u32, col: u32) -> Result<CellValue> {
        let id = self.sheet_id(sheet)?;
        Ok(self
            .engine
            .cell(&id, row, col)?
            .as_ref()
            .and_then(engine_to_cell)
            .map(|cell| cell.value)
            .unwrap_or_default())
    }

    /// Set a value. A string starting with `=` is stored as a formula.
    pub fn set_cell_value(
        &mut self,
        sheet: usize,
        row: u32,
        col: u32,
        value: CellValue,
    ) -> Result<()> {
        let id = self.sheet_id(sheet)?;
        self.engine
            .set_cell_value(&id, row, col, to_cell_input(value))
    }

    /// Set a cell from user-typed text: `=` starts a formula, otherwise the
    /// type is inferred with [`detect_input`].
    pub fn enter_text(&mut self, sheet: usize, row: u32, col: u32, text: &str) -> Result<()> {
        let id = self.sheet_id(sheet)?;
        self.engine
            .set_cell_value(&id, row, col, text_to_cell_input(text))
    }

    /// Fill `range` row by row from `values`.
    pub fn set_cells_by_range(
        &mut self,
        sheet: usize,
        range: &CellRange,
        values: Vec<Vec<CellValue>>,
    ) -> Result<()> {
        let id = self.sheet_id(sheet)?;
        let inputs = values
            .into_iter()
            .map(|row| row.into_iter().map(to_cell_input).collect())
            .collect();
        self.engine.set_range_values(&id, range, inputs)
    }

    pub fn get_cell_style(&self, sheet: usize, row: u32, col: u32) -> Result<Option<Style>> {
        let id = self.sheet_id(sheet)?;
        let mut style = self
            .engine
            .cell(&id, row, col)?
            .as_ref()
            .and_then(engine_to_style)
            .unwrap_or_default();
        if let Some(border) = self.engine.border(&id, row, col)? {
            engine_to_border(&border, &mut style);
        }
        Ok(style.non_empty())
    }

    /// Apply a style attribute by attribute. Borders replace the cell's
    /// border entry when the style has any.
    pub fn set_cell_style(&mut self, sheet: usize, row: u32, col: u32, style: &Style) -> Result<()> {
        let id = self.sheet_id(sheet)?;
        for attr in format_attrs(style) {
            self.engine.set_cell_format(&id, row, col, attr)?;
        }
        if let Some(info) = border_to_engine(row, col, style) {
            self.engine.set_border(&id, row, col, Some(info.value))?;
        }
        Ok(())
    }

    pub fn set_cell_comment(
        &mut self,
        sheet: usize,
        row: u32,
        col: u32,
        comment: Option<&str>,
    ) -> Result<()> {
        let id = self.sheet_id(sheet)?;
        self.engine.set_cell_comment(&id, row, col, comment)
    }

    // ------------------------------------------------------------------
    // Sheets
    // ------------------------------------------------------------------

    /// Append a sheet; returns its id and tab index.
    pub fn add_sheet(&mut self, name: Option<&str>) -> Result<(String, usize)> {
        let handles = self.engine.sheet_handles();
        let name = match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => next_sheet_name(&handles),
        };
        let id = generate_id();
        self.engine.add_sheet(&id, &name)?;
        Ok((id, handles.len()))
    }

    /// Delete the sheet at `index`. The last remaining sheet cannot be deleted.
    pub fn delete_sheet(&mut self, index: usize) -> Result<()> {
        let handles = self.engine.sheet_handles();
        if handles.len() <= 1 {
            return Err(XlgridError::InvalidOperation(
                "Cannot delete the last sheet".to_string(),
            ));
        }
        let handle = handles.get(index).ok_or_else(|| invalid_index(index))?;
        self.engine.delete_sheet(&handle.id)?;
        self.charts.remove(&handle.id);
        Ok(())
    }

    /// Rename the sheet at `index`; returns the old name.
    pub fn rename_sheet(&mut self, index: usize, name: &str) -> Result<String> {
        let handle = self
            .engine
            .sheet_handles()
            .into_iter()
            .nth(index)
            .ok_or_else(|| invalid_index(index))?;
        self.engine.rename_sheet(&handle.id, name)?;
        Ok(handle.name)
    }

    /// Index of the active sheet, 0 when none is flagged.
    pub fn get_active_sheet(&self) -> usize {
        self.engine
            .sheet_handles()
            .iter()
            .position(|h| h.active)
            .unwrap_or(0)
    }

    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        let id = self.sheet_id(index)?;
        self.engine.activate_sheet(&id)
    }

    // ------------------------------------------------------------------
    // Rows and columns
    // ------------------------------------------------------------------

    /// Insert `count` rows at `start`; rows at and below it move down.
    pub fn insert_rows(&mut self, sheet: usize, start: u32, count: u32) -> Result<()> {
        let id = self.sheet_id(sheet)?;
        self.engine
            .insert_row_or_column(&id, Axis::Row, start, count, InsertAnchor::Before)
    }

    /// Insert `count` columns at `start`; columns at and right of it move right.
    pub fn insert_columns(&mut self, sheet: usize, start: u32, count: u32) -> Result<()> {
        let id = self.sheet_id(sheet)?;
        self.engine
            .insert_row_or_column(&id, Axis::Column, start, count, InsertAnchor::Before)
    }

    pub fn delete_rows(&mut self, sheet: usize, start: u32, count: u32) -> Result<()> {
        self.delete_lines(sheet, Axis::Row, start, count)
    }

    pub fn delete_columns(&mut self, sheet: usize, start: u32, count: u32) -> Result<()> {
        self.delete_lines(sheet, Axis::Column, start, count)
    }

    fn delete_lines(&mut self, sheet: usize, axis: Axis, start: u32, count: u32) -> Result<()> {
        let id = self.sheet_id(sheet)?;
        if count == 0 {
            return Ok(());
        }
        let end = start.saturating_add(count - 1);
        self.engine.delete_row_or_column(&id, axis, start, end)
    }

    // ------------------------------------------------------------------
    // Charts
    // ------------------------------------------------------------------

    /// Record a chart placeholder on a sheet; returns the new chart id.
    pub fn insert_chart(&mut self, sheet: usize, spec: ChartSpec) -> Result<String> {
        let sheet_id = self.sheet_id(sheet)?;
        parse_range(&spec.data_range)?;
        let id = generate_id();
        debug!("placing {:?} chart {id} over {}", spec.chart_type, spec.data_range);
        self.charts
            .entry(sheet_id)
            .or_default()
            .push(spec.into_chart(id.clone()));
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------

    /// Replace the content with an XLSX package. Fails with `GridLimit`
    /// when a sheet's used range does not fit the engine's limits.
    pub fn import_xlsx(&mut self, data: &[u8], options: &XlsxOptions) -> Result<()> {
        let workbook = read_xlsx(data, options)?;
        let limits = self.limits();
        for sheet in &workbook.sheets {
            if let Some(used) = sheet.used_range() {
                limits.check_range(&used)?;
            }
        }
        self.set_data(&workbook);
        Ok(())
    }

    pub fn export_xlsx(&self, options: &XlsxOptions) -> Result<Vec<u8>> {
        write_xlsx(&self.get_data(), options)
    }

    /// CSV text of one sheet; the active sheet when `sheet` is `None`.
    pub fn export_csv(&self, sheet: Option<usize>, options: &CsvOptions) -> Result<String> {
        let index = sheet.unwrap_or_else(|| self.get_active_sheet());
        let workbook = self.get_data();
        let sheet = workbook
            .sheet(index)
            .ok_or_else(|| XlgridError::SheetNotFound(format!("index {index}")))?;
        Ok(write_csv(&sheet_to_csv(sheet), options))
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
    use crate::types::{BorderEdge, BorderKind, CellPos, ChartType, HAlign, Sheet};

    fn editor() -> SpreadsheetEditor {
        SpreadsheetEditor::default()
    }

    #[test]
    fn test_starts_with_blank_sheet() {
        let editor = editor();
        let data = editor.get_data();
        assert_eq!(data.title, DEFAULT_TITLE);
        assert_eq!(data.sheets.len(), 1);
        assert_eq!(data.sheets[0].name, "Sheet1");
        assert!(data.sheets[0].cells.is_empty());
    }

    #[test]
    fn test_formula_text_becomes_formula() {
        let mut editor = editor();
        editor.set_cell_value(0, 0, 0, 2.0.into()).unwrap();
        editor.set_cell_value(0, 1, 0, "=A1*2".into()).unwrap();
        let cell = editor.get_cell(0, 1, 0).unwrap().unwrap();
        assert_eq!(cell.formula.as_deref(), Some("=A1*2"));
        assert_eq!(editor.get_cell_value(0, 0, 0).unwrap(), CellValue::Number(2.0));
        assert_eq!(editor.get_cell_value(0, 5, 5).unwrap(), CellValue::Null);
    }

    #[test]
    fn test_typed_text_is_inferred() {
        let mut editor = editor();
        editor.enter_text(0, 0, 0, "42").unwrap();
        editor.enter_text(0, 0, 1, "FALSE").unwrap();
        editor.enter_text(0, 0, 2, "hello").unwrap();
        editor.enter_text(0, 0, 3, "=A1+1").unwrap();
        assert_eq!(editor.get_cell_value(0, 0, 0).unwrap(), CellValue::Number(42.0));
        assert_eq!(editor.get_cell_value(0, 0, 1).unwrap(), CellValue::Boolean(false));
        assert_eq!(editor.get_cell_value(0, 0, 2).unwrap(), CellValue::from("hello"));
        let formula = editor.get_cell(0, 0, 3).unwrap().unwrap();
        assert_eq!(formula.formula.as_deref(), Some("=A1+1"));

        editor.enter_text(0, 0, 0, "").unwrap();
        assert_eq!(editor.get_cell_value(0, 0, 0).unwrap(), CellValue::Null);
    }

    #[test]
    fn test_oversized_import_is_rejected() {
        let mut workbook = Workbook::new("Far");
        let mut sheet = Sheet::new("S");
        sheet.set_cell(1_048_575, 0, Cell::new("bottom"));
        workbook.sheets.push(sheet);
        let bytes = write_xlsx(&workbook, &XlsxOptions::default()).unwrap();

        let mut editor = editor();
        editor.enter_text(0, 0, 0, "kept").unwrap();
        let err = editor
            .import_xlsx(&bytes, &XlsxOptions::default())
            .unwrap_err();
        assert!(matches!(err, XlgridError::GridLimit(_)));
        assert_eq!(editor.get_cell_value(0, 0, 0).unwrap(), CellValue::from("kept"));
    }

    #[test]
    fn test_style_round_trip() {
        let mut editor = editor();
        let style = Style {
            bold: true,
            font_size: Some(14.0),
            background_color: Some("#FFFF00".into()),
            horizontal_align: Some(HAlign::Right),
            border_bottom: Some(BorderEdge::new(BorderKind::Thick, "#FF0000")),
            ..Style::default()
        };
        editor.set_cell_style(0, 2, 3, &style).unwrap();
        assert_eq!(editor.get_cell_style(0, 2, 3).unwrap(), Some(style.clone()));
        assert_eq!(editor.get_cell_style(0, 0, 0).unwrap(), None);

        let data = editor.get_data();
        assert_eq!(
            data.sheets[0].cell(2, 3).unwrap().style.as_ref(),
            Some(&style)
        );
    }

    #[test]
    fn test_range_fill() {
        let mut editor = editor();
        let range = CellRange::new(CellPos::new(0, 0), CellPos::new(1, 1));
        editor
            .set_cells_by_range(
                0,
                &range,
                vec![vec!["a".into(), "b".into()], vec![1.0.into(), true.into()]],
            )
            .unwrap();
        let sheet = &editor.get_data().sheets[0];
        assert_eq!(sheet.cells.len(), 4);
        assert_eq!(sheet.cell(1, 1).unwrap().value, CellValue::Boolean(true));
    }

    #[test]
    fn test_sheet_management() {
        let mut editor = editor();
        let (id, index) = editor.add_sheet(None).unwrap();
        assert_eq!(index, 1);
        let (_, third) = editor.add_sheet(Some("Data")).unwrap();
        assert_eq!(third, 2);

        let data = editor.get_data();
        assert_eq!(data.sheets[1].id, id);
        assert_eq!(data.sheets[1].name, "Sheet2");

        assert_eq!(editor.rename_sheet(2, "Numbers").unwrap(), "Data");
        editor.set_active_sheet(2).unwrap();
        assert_eq!(editor.get_active_sheet(), 2);

        assert!(matches!(
            editor.delete_sheet(7),
            Err(XlgridError::InvalidOperation(ref m)) if m == "Invalid sheet index: 7"
        ));
        editor.delete_sheet(0).unwrap();
        editor.delete_sheet(0).unwrap();
        let err = editor.delete_sheet(0).unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete the last sheet");
        assert_eq!(editor.get_data().sheets[0].name, "Numbers");
    }

    #[test]
    fn test_default_name_skips_taken() {
        let mut editor = editor();
        editor.rename_sheet(0, "Sheet2").unwrap();
        editor.add_sheet(None).unwrap();
        assert_eq!(editor.get_data().sheets[1].name, "Sheet3");
    }

    #[test]
    fn test_insert_and_delete_rows() {
        let mut editor = editor();
        editor.set_cell_value(0, 0, 0, "keep".into()).unwrap();
        editor.set_cell_value(0, 2, 0, "move".into()).unwrap();
        editor.insert_rows(0, 1, 3).unwrap();
        assert_eq!(editor.get_cell_value(0, 5, 0).unwrap(), CellValue::from("move"));

        editor.delete_rows(0, 0, 2).unwrap();
        assert_eq!(editor.get_cell_value(0, 3, 0).unwrap(), CellValue::from("move"));
        assert_eq!(editor.get_cell_value(0, 0, 0).unwrap(), CellValue::Null);

        editor.insert_columns(0, 0, 1).unwrap();
        assert_eq!(editor.get_cell_value(0, 3, 1).unwrap(), CellValue::from("move"));
        editor.delete_columns(0, 0, 1).unwrap();
        assert_eq!(editor.get_cell_value(0, 3, 0).unwrap(), CellValue::from("move"));
    }

    #[test]
    fn test_charts_follow_sheet() {
        let mut editor = editor();
        let spec = ChartSpec {
            chart_type: ChartType::Line,
            data_range: "A1:B5".into(),
            title: Some("Trend".into()),
            position: None,
            size: None,
        };
        let id = editor.insert_chart(0, spec.clone()).unwrap();
        let charts = &editor.get_data().sheets[0].charts;
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].id, id);
        assert_eq!(charts[0].width, 400.0);

        let bad = ChartSpec {
            data_range: "A1:".into(),
            ..spec
        };
        assert!(matches!(
            editor.insert_chart(0, bad),
            Err(XlgridError::InvalidAddress(_))
        ));
        assert!(editor.insert_chart(4, ChartSpec {
            data_range: "A1".into(),
            chart_type: ChartType::Pie,
            title: None,
            position: None,
            size: None,
        })
        .is_err());
    }

    #[test]
    fn test_set_data_and_clear() {
        let mut wb = Workbook::new("Budget");
        let mut sheet = Sheet::new("Q1");
        sheet.set_cell(0, 0, Cell::new("Revenue"));
        sheet.set_cell(0, 1, Cell::new(10.0));
        let mut second = Sheet::new("Q2");
        second.frozen_rows = 1;
        wb.sheets = vec![sheet, second];
        wb.active_sheet = 1;

        let mut editor = SpreadsheetEditor::from_workbook(MemoryEngine::new(), &wb);
        assert_eq!(editor.title(), "Budget");
        assert_eq!(editor.get_active_sheet(), 1);
        let back = editor.get_data();
        assert_eq!(back.id, wb.id);
        assert_eq!(back.sheets, wb.sheets);

        assert_eq!(
            editor.export_csv(Some(0), &CsvOptions::default()).unwrap(),
            "Revenue,10"
        );

        editor.clear();
        let cleared = editor.get_data();
        assert_eq!(cleared.title, DEFAULT_TITLE);
        assert_eq!(cleared.sheets.len(), 1);
        assert_ne!(cleared.id, wb.id);
    }

    #[test]
    fn test_xlsx_export_reimports() {
        let mut source = editor();
        source.set_cell_value(0, 0, 0, "Name".into()).unwrap();
        source.set_cell_value(0, 1, 0, 3.5.into()).unwrap();
        let bytes = source.export_xlsx(&XlsxOptions::default()).unwrap();

        let mut other = editor();
        other.import_xlsx(&bytes, &XlsxOptions::default()).unwrap();
        assert_eq!(other.get_cell_value(0, 1, 0).unwrap(), CellValue::Number(3.5));
        assert_eq!(other.get_data().sheets[0].name, "Sheet1");
    }
}
