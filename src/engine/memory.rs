//! In-memory grid engine over engine-shaped sheets.
//!
//! Every sheet keeps a dense `data` matrix that grows on demand, never
//! shrinks below 100 x 26 and never grows past the engine's [`GridLimits`].
//! Formulas are stored, not evaluated.

use std::collections::BTreeMap;

use log::debug;

use super::{Axis, CellInput, FormatAttr, GridEngine, GridLimits, InsertAnchor, SheetHandle};
use crate::adapter::{cell_to_engine, sheet_to_engine_format, DEFAULT_MIN_COLS, DEFAULT_MIN_ROWS};
use crate::error::{Result, XlgridError};
use crate::id::generate_id;
use crate::style_codec::{h_align_code, v_align_code};
use crate::types::engine::{
    BorderCell, BorderInfo, CellFormat, EngineCell, EngineComment, EngineConfig, EngineSheet,
    MergeSpan, PositionedCell, BORDER_RANGE_CELL, STATUS_ACTIVE, STATUS_INACTIVE,
};
use crate::types::{strip_formula_prefix, Cell, CellRange, Sheet};

type Grid = Vec<Vec<Option<EngineCell>>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    sheets: Vec<EngineSheet>,
    limits: GridLimits,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limits(mut self, limits: GridLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_sheets(sheets: Vec<EngineSheet>) -> Self {
        let mut engine = Self::default();
        engine.replace_sheets(sheets);
        engine
    }

    fn sheet(&self, id: &str) -> Result<&EngineSheet> {
        self.sheets
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| XlgridError::SheetNotFound(id.to_string()))
    }

    fn sheet_mut(&mut self, id: &str) -> Result<&mut EngineSheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| XlgridError::SheetNotFound(id.to_string()))
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.sheets
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| XlgridError::SheetNotFound(id.to_string()))
    }

    fn renumber(&mut self) {
        for (sheet, order) in self.sheets.iter_mut().zip(0u32..) {
            sheet.order = order;
        }
    }

    fn set_active_index(&mut self, active: usize) {
        for (idx, sheet) in self.sheets.iter_mut().enumerate() {
            sheet.status = if idx == active {
                STATUS_ACTIVE
            } else {
                STATUS_INACTIVE
            };
        }
    }
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Current grid extent as (rows, cols). Grids are kept rectangular.
fn grid_dims(sheet: &EngineSheet) -> (u32, u32) {
    let grid = sheet.data.as_deref().unwrap_or_default();
    (
        len_u32(grid.len()),
        len_u32(grid.first().map_or(0, Vec::len)),
    )
}

/// Fails when holding a `rows` x `cols` extent would grow the grid past
/// `limits`. Extents already inside the grid always pass.
fn check_growth(sheet: &EngineSheet, rows: u32, cols: u32, limits: &GridLimits) -> Result<()> {
    let (have_rows, have_cols) = grid_dims(sheet);
    if rows <= have_rows && cols <= have_cols {
        return Ok(());
    }
    limits.check(
        rows.max(have_rows).max(DEFAULT_MIN_ROWS),
        cols.max(have_cols).max(DEFAULT_MIN_COLS),
    )
}

/// Pad ragged rows to the widest one.
fn square_off(grid: &mut Grid) {
    let widest = grid.iter().map(Vec::len).max().unwrap_or(0);
    for row in grid.iter_mut().filter(|r| r.len() < widest) {
        row.resize(widest, None);
    }
}

/// Grow the dense grid to at least `rows` x `cols` and the default minimum.
/// Rows are only walked when the width grows. `row` and `column` are
/// updated to match.
fn ensure_size(sheet: &mut EngineSheet, rows: u32, cols: u32) -> &mut Grid {
    let grid = sheet.data.get_or_insert_with(Vec::new);
    let width = grid.first().map_or(0, Vec::len);
    let rows = (rows as usize)
        .max(grid.len())
        .max(DEFAULT_MIN_ROWS as usize);
    let cols = (cols as usize).max(width).max(DEFAULT_MIN_COLS as usize);
    if cols > width {
        for row in grid.iter_mut() {
            row.resize(cols, None);
        }
    }
    grid.resize_with(rows, || vec![None; cols]);
    sheet.row = Some(len_u32(rows));
    sheet.column = Some(len_u32(cols));
    grid
}

/// Apply `edit` to the cell at (row, col), growing the grid as needed. A
/// cell left with nothing in it becomes an empty slot.
fn edit_cell<F: FnOnce(&mut EngineCell)>(sheet: &mut EngineSheet, row: u32, col: u32, edit: F) {
    let grid = ensure_size(sheet, row.saturating_add(1), col.saturating_add(1));
    let Some(slot) = grid
        .get_mut(row as usize)
        .and_then(|r| r.get_mut(col as usize))
    else {
        return;
    };
    let mut cell = slot.take().unwrap_or_default();
    edit(&mut cell);
    if cell != EngineCell::default() {
        *slot = Some(cell);
    }
}

fn apply_input(cell: &mut EngineCell, input: CellInput) {
    cell.v = None;
    cell.m = None;
    cell.f = None;
    if let Some(ct) = cell.ct.as_mut() {
        ct.t = None;
    }

    match input {
        CellInput::Value(value) => {
            let encoded = cell_to_engine(&Cell::new(value));
            cell.v = encoded.v;
            cell.m = encoded.m;
            if let Some(t) = encoded.ct.and_then(|ct| ct.t) {
                cell.ct.get_or_insert_with(CellFormat::default).t = Some(t);
            }
        }
        CellInput::Formula(formula) => {
            let bare = strip_formula_prefix(formula.trim());
            if !bare.is_empty() {
                cell.f = Some(bare.to_string());
            }
        }
    }

    if cell.ct.as_ref().is_some_and(|ct| *ct == CellFormat::default()) {
        cell.ct = None;
    }
}

fn flag(on: bool) -> Option<u8> {
    on.then_some(1)
}

fn apply_format(cell: &mut EngineCell, attr: FormatAttr) {
    match attr {
        FormatAttr::Bold(on) => cell.bl = flag(on),
        FormatAttr::Italic(on) => cell.it = flag(on),
        FormatAttr::Underline(on) => cell.un = flag(on),
        FormatAttr::Strikethrough(on) => cell.cl = flag(on),
        FormatAttr::FontFamily(family) => cell.ff = Some(family),
        FormatAttr::FontSize(size) => cell.fs = Some(size),
        FormatAttr::FontColor(color) => cell.fc = Some(color),
        FormatAttr::Background(color) => cell.bg = Some(color),
        FormatAttr::HorizontalAlign(align) => cell.ht = Some(h_align_code(align)),
        FormatAttr::VerticalAlign(align) => cell.vt = Some(v_align_code(align)),
        FormatAttr::NumberFormat(fmt) => {
            cell.ct.get_or_insert_with(CellFormat::default).fa = Some(fmt);
        }
    }
}

fn cell_records(sheet: &EngineSheet) -> Vec<PositionedCell> {
    let mut records = Vec::new();
    for (row, r) in sheet.data.iter().flatten().zip(0u32..) {
        for (slot, c) in row.iter().zip(0u32..) {
            if let Some(cell) = slot {
                records.push(PositionedCell {
                    r,
                    c,
                    v: Some(cell.clone()),
                });
            }
        }
    }
    records
}

/// Bring an incoming sheet into the engine's shape: an id, a dense grid
/// (built from `celldata` when present) and a config record.
fn normalize_sheet(mut sheet: EngineSheet) -> EngineSheet {
    if sheet.id.is_empty() {
        sheet.id = generate_id();
    }
    let records = sheet.celldata.take().unwrap_or_default();
    if !records.is_empty() {
        sheet.data = None;
    }
    if let Some(grid) = sheet.data.as_mut() {
        square_off(grid);
    }
    let (rows, cols) = (sheet.row.unwrap_or(0), sheet.column.unwrap_or(0));
    ensure_size(&mut sheet, rows, cols);
    for record in records {
        if let Some(cell) = record.v {
            edit_cell(&mut sheet, record.r, record.c, |slot| *slot = cell);
        }
    }
    sheet.config.get_or_insert_with(EngineConfig::default);
    sheet
}

// ============================================================================
// Row / column shifting
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Shift {
    Insert { at: u32, count: u32 },
    /// Inclusive, `start <= end`.
    Delete { start: u32, end: u32 },
}

impl Shift {
    /// New index of a line, `None` when the line was deleted.
    fn index(self, index: u32) -> Option<u32> {
        match self {
            Self::Insert { at, count } => Some(if index >= at {
                index.saturating_add(count)
            } else {
                index
            }),
            Self::Delete { start, end } => {
                if index < start {
                    Some(index)
                } else if index <= end {
                    None
                } else {
                    Some(index - (end - start + 1))
                }
            }
        }
    }

    /// New `(first, len)` of a run of lines. Insertion strictly inside the run
    /// widens it; deletion trims it and `None` means nothing is left.
    fn span(self, first: u32, len: u32) -> Option<(u32, u32)> {
        let len = len.max(1);
        match self {
            Self::Insert { at, count } => {
                if at <= first {
                    Some((first.saturating_add(count), len))
                } else if at < first.saturating_add(len) {
                    Some((first, len.saturating_add(count)))
                } else {
                    Some((first, len))
                }
            }
            Self::Delete { start, end } => {
                let last = first.saturating_add(len - 1);
                let (lo, hi) = (first.max(start), last.min(end));
                let removed = if lo <= hi { hi - lo + 1 } else { 0 };
                let remaining = len - removed;
                if remaining == 0 {
                    return None;
                }
                Some((self.index(first).unwrap_or(start), remaining))
            }
        }
    }
}

fn remove_clamped<T>(items: &mut Vec<T>, start: u32, end: u32) {
    let start = start as usize;
    if start >= items.len() {
        return;
    }
    let end = (end as usize).min(items.len() - 1);
    let tail = items.split_off(end + 1);
    items.truncate(start);
    items.extend(tail);
}

fn shift_grid(sheet: &mut EngineSheet, axis: Axis, shift: Shift) {
    let grid = ensure_size(sheet, 0, 0);
    match (axis, shift) {
        (Axis::Row, Shift::Insert { at, count }) => {
            let width = grid.first().map_or(0, Vec::len);
            let at = (at as usize).min(grid.len());
            for _ in 0..count {
                grid.insert(at, vec![None; width]);
            }
        }
        (Axis::Column, Shift::Insert { at, count }) => {
            for row in grid.iter_mut() {
                let at = (at as usize).min(row.len());
                for _ in 0..count {
                    row.insert(at, None);
                }
            }
        }
        (Axis::Row, Shift::Delete { start, end }) => remove_clamped(grid, start, end),
        (Axis::Column, Shift::Delete { start, end }) => {
            for row in grid.iter_mut() {
                remove_clamped(row, start, end);
            }
        }
    }
    // Re-pad after deletion and recount either way
    ensure_size(sheet, 0, 0);
}

fn shift_merges(
    merge: BTreeMap<String, MergeSpan>,
    axis: Axis,
    shift: Shift,
) -> BTreeMap<String, MergeSpan> {
    let mut out = BTreeMap::new();
    for span in merge.into_values() {
        let moved = match axis {
            Axis::Row => shift
                .span(span.r, span.rs)
                .map(|(r, rs)| MergeSpan { r, rs, ..span }),
            Axis::Column => shift
                .span(span.c, span.cs)
                .map(|(c, cs)| MergeSpan { c, cs, ..span }),
        };
        match moved {
            Some(m) if m.rs > 1 || m.cs > 1 => {
                out.insert(format!("{}_{}", m.r, m.c), m);
            }
            _ => debug!("dropping merge at {}_{} reduced to a single cell", span.r, span.c),
        }
    }
    out
}

fn shift_sizes(sizes: BTreeMap<String, f64>, shift: Shift) -> BTreeMap<String, f64> {
    sizes
        .into_iter()
        .filter_map(|(key, size)| {
            let index = key.parse::<u32>().ok()?;
            shift.index(index).map(|i| (i.to_string(), size))
        })
        .collect()
}

fn shift_borders(borders: Vec<BorderInfo>, axis: Axis, shift: Shift) -> Vec<BorderInfo> {
    borders
        .into_iter()
        .filter_map(|mut info| {
            if info.range_type != BORDER_RANGE_CELL {
                return Some(info);
            }
            let index = match axis {
                Axis::Row => &mut info.value.row_index,
                Axis::Column => &mut info.value.col_index,
            };
            *index = shift.index(*index)?;
            Some(info)
        })
        .collect()
}

fn non_empty_map<V>(map: BTreeMap<String, V>) -> Option<BTreeMap<String, V>> {
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn shift_sheet(sheet: &mut EngineSheet, axis: Axis, shift: Shift) {
    shift_grid(sheet, axis, shift);

    let Some(config) = sheet.config.as_mut() else {
        return;
    };
    if let Some(merge) = config.merge.take() {
        config.merge = non_empty_map(shift_merges(merge, axis, shift));
    }
    let sizes = match axis {
        Axis::Row => &mut config.rowlen,
        Axis::Column => &mut config.columnlen,
    };
    if let Some(map) = sizes.take() {
        *sizes = non_empty_map(shift_sizes(map, shift));
    }
    if let Some(borders) = config.border_info.take() {
        let shifted = shift_borders(borders, axis, shift);
        config.border_info = if shifted.is_empty() {
            None
        } else {
            Some(shifted)
        };
    }
}

fn is_cell_border(info: &BorderInfo, row: u32, col: u32) -> bool {
    info.range_type == BORDER_RANGE_CELL
        && info.value.row_index == row
        && info.value.col_index == col
}

/// [`check_growth`] for the extent that holds (row, col).
fn check_cell(sheet: &EngineSheet, row: u32, col: u32, limits: &GridLimits) -> Result<()> {
    check_growth(sheet, row.saturating_add(1), col.saturating_add(1), limits)
}

impl GridEngine for MemoryEngine {
    fn limits(&self) -> GridLimits {
        self.limits
    }

    fn sheets(&self) -> Vec<EngineSheet> {
        self.sheets
            .iter()
            .map(|sheet| {
                let mut out = sheet.clone();
                out.celldata = Some(cell_records(sheet));
                out
            })
            .collect()
    }

    fn replace_sheets(&mut self, sheets: Vec<EngineSheet>) {
        self.sheets = sheets.into_iter().map(normalize_sheet).collect();
        self.renumber();
        let active = self
            .sheets
            .iter()
            .position(EngineSheet::is_active)
            .unwrap_or(0);
        self.set_active_index(active);
        debug!("engine loaded {} sheets", self.sheets.len());
    }

    fn sheet_handles(&self) -> Vec<SheetHandle> {
        self.sheets
            .iter()
            .map(|s| SheetHandle {
                id: s.id.clone(),
                name: s.name.clone(),
                active: s.is_active(),
            })
            .collect()
    }

    fn cell(&self, sheet_id: &str, row: u32, col: u32) -> Result<Option<EngineCell>> {
        let sheet = self.sheet(sheet_id)?;
        Ok(sheet
            .data
            .as_ref()
            .and_then(|grid| grid.get(row as usize))
            .and_then(|r| r.get(col as usize))
            .and_then(Clone::clone))
    }

    fn border(&self, sheet_id: &str, row: u32, col: u32) -> Result<Option<BorderCell>> {
        let sheet = self.sheet(sheet_id)?;
        Ok(sheet
            .config
            .as_ref()
            .and_then(|config| config.border_info.as_ref())
            .and_then(|borders| borders.iter().find(|info| is_cell_border(info, row, col)))
            .map(|info| info.value.clone()))
    }

    fn set_cell_value(
        &mut self,
        sheet_id: &str,
        row: u32,
        col: u32,
        input: CellInput,
    ) -> Result<()> {
        let limits = self.limits;
        let sheet = self.sheet_mut(sheet_id)?;
        check_cell(sheet, row, col, &limits)?;
        edit_cell(sheet, row, col, |cell| apply_input(cell, input));
        Ok(())
    }

    fn set_range_values(
        &mut self,
        sheet_id: &str,
        range: &CellRange,
        values: Vec<Vec<CellInput>>,
    ) -> Result<()> {
        let limits = self.limits;
        let sheet = self.sheet_mut(sheet_id)?;
        let widest = values.iter().map(Vec::len).max().unwrap_or(0);
        if widest > 0 {
            let last_row = range
                .start_row
                .saturating_add(len_u32(values.len()) - 1)
                .min(range.end_row);
            let last_col = range
                .start_col
                .saturating_add(len_u32(widest) - 1)
                .min(range.end_col);
            check_cell(sheet, last_row, last_col, &limits)?;
        }
        for (row_values, row) in values.into_iter().zip(range.start_row..=range.end_row) {
            for (input, col) in row_values.into_iter().zip(range.start_col..=range.end_col) {
                edit_cell(sheet, row, col, |cell| apply_input(cell, input));
            }
        }
        Ok(())
    }

    fn set_cell_format(
        &mut self,
        sheet_id: &str,
        row: u32,
        col: u32,
        attr: FormatAttr,
    ) -> Result<()> {
        let limits = self.limits;
        let sheet = self.sheet_mut(sheet_id)?;
        check_cell(sheet, row, col, &limits)?;
        edit_cell(sheet, row, col, |cell| apply_format(cell, attr));
        Ok(())
    }

    fn set_cell_comment(
        &mut self,
        sheet_id: &str,
        row: u32,
        col: u32,
        comment: Option<&str>,
    ) -> Result<()> {
        let limits = self.limits;
        let sheet = self.sheet_mut(sheet_id)?;
        check_cell(sheet, row, col, &limits)?;
        edit_cell(sheet, row, col, |cell| {
            cell.ps = comment.map(EngineComment::hidden);
        });
        Ok(())
    }

    fn set_border(
        &mut self,
        sheet_id: &str,
        row: u32,
        col: u32,
        border: Option<BorderCell>,
    ) -> Result<()> {
        let sheet = self.sheet_mut(sheet_id)?;
        let config = sheet.config.get_or_insert_with(EngineConfig::default);
        let borders = config.border_info.get_or_insert_with(Vec::new);
        borders.retain(|info| !is_cell_border(info, row, col));
        if let Some(mut value) = border {
            value.row_index = row;
            value.col_index = col;
            borders.push(BorderInfo {
                range_type: BORDER_RANGE_CELL.to_string(),
                value,
            });
        }
        if borders.is_empty() {
            config.border_info = None;
        }
        Ok(())
    }

    fn add_sheet(&mut self, id: &str, name: &str) -> Result<()> {
        if self.sheets.iter().any(|s| s.id == id) {
            return Err(XlgridError::InvalidOperation(format!(
                "Sheet id already exists: {id}"
            )));
        }
        let order = len_u32(self.sheets.len());
        let first = self.sheets.is_empty();
        self.sheets
            .push(sheet_to_engine_format(&Sheet::with_id(id, name), order, first));
        Ok(())
    }

    fn delete_sheet(&mut self, id: &str) -> Result<()> {
        let idx = self.position(id)?;
        let removed = self.sheets.remove(idx);
        self.renumber();
        if removed.is_active() && !self.sheets.is_empty() {
            self.set_active_index(idx.min(self.sheets.len() - 1));
        }
        Ok(())
    }

    fn rename_sheet(&mut self, id: &str, name: &str) -> Result<()> {
        self.sheet_mut(id)?.name = name.to_string();
        Ok(())
    }

    fn activate_sheet(&mut self, id: &str) -> Result<()> {
        let idx = self.position(id)?;
        self.set_active_index(idx);
        Ok(())
    }

    fn active_sheet_id(&self) -> Option<String> {
        self.sheets
            .iter()
            .find(|s| s.is_active())
            .map(|s| s.id.clone())
    }

    fn insert_row_or_column(
        &mut self,
        sheet_id: &str,
        axis: Axis,
        start: u32,
        count: u32,
        anchor: InsertAnchor,
    ) -> Result<()> {
        let limits = self.limits;
        let sheet = self.sheet_mut(sheet_id)?;
        if count == 0 {
            return Ok(());
        }
        let (rows, cols) = grid_dims(sheet);
        match axis {
            Axis::Row => check_growth(sheet, rows.saturating_add(count), cols, &limits)?,
            Axis::Column => check_growth(sheet, rows, cols.saturating_add(count), &limits)?,
        }
        let at = match anchor {
            InsertAnchor::Before => start,
            InsertAnchor::After => start.saturating_add(1),
        };
        shift_sheet(sheet, axis, Shift::Insert { at, count });
        debug!("inserted {count} {axis:?} lines at {at} in sheet {sheet_id}");
        Ok(())
    }

    fn delete_row_or_column(
        &mut self,
        sheet_id: &str,
        axis: Axis,
        start: u32,
        end: u32,
    ) -> Result<()> {
        let sheet = self.sheet_mut(sheet_id)?;
        let (start, end) = (start.min(end), start.max(end));
        shift_sheet(sheet, axis, Shift::Delete { start, end });
        debug!("deleted {axis:?} lines {start}..={end} in sheet {sheet_id}");
        Ok(())
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
    use crate::types::engine::{BorderSide, EngineValue};
    use crate::types::{CellPos, CellValue, HAlign};

    fn engine() -> MemoryEngine {
        let mut engine = MemoryEngine::new();
        engine.add_sheet("s1", "Sheet1").unwrap();
        engine
    }

    fn value_at(engine: &MemoryEngine, row: u32, col: u32) -> Option<EngineValue> {
        engine.cell("s1", row, col).unwrap().and_then(|c| c.v)
    }

    fn side() -> BorderSide {
        BorderSide {
            style: 1,
            color: "#000000".into(),
        }
    }

    #[test]
    fn test_value_keeps_format() {
        let mut engine = engine();
        engine
            .set_cell_format("s1", 0, 0, FormatAttr::Bold(true))
            .unwrap();
        engine
            .set_cell_value("s1", 0, 0, CellInput::Value(CellValue::Number(5.0)))
            .unwrap();
        let cell = engine.cell("s1", 0, 0).unwrap().unwrap();
        assert_eq!(cell.v, Some(EngineValue::Number(5.0)));
        assert_eq!(cell.m.as_deref(), Some("5"));
        assert_eq!(cell.bl, Some(1));

        engine
            .set_cell_value("s1", 0, 0, CellInput::Formula("=A2*2".into()))
            .unwrap();
        let cell = engine.cell("s1", 0, 0).unwrap().unwrap();
        assert_eq!(cell.f.as_deref(), Some("A2*2"));
        assert_eq!(cell.v, None);
        assert_eq!(cell.bl, Some(1));
    }

    #[test]
    fn test_clearing_everything_empties_slot() {
        let mut engine = engine();
        engine
            .set_cell_value("s1", 2, 2, CellInput::Value("x".into()))
            .unwrap();
        engine
            .set_cell_value("s1", 2, 2, CellInput::Value(CellValue::Null))
            .unwrap();
        assert_eq!(engine.cell("s1", 2, 2).unwrap(), None);
    }

    #[test]
    fn test_unknown_sheet() {
        let mut engine = engine();
        let err = engine
            .set_cell_value("nope", 0, 0, CellInput::Value(CellValue::Null))
            .unwrap_err();
        assert!(matches!(err, XlgridError::SheetNotFound(ref id) if id == "nope"));
        assert!(engine.cell("nope", 0, 0).is_err());
    }

    #[test]
    fn test_grid_grows_past_minimum() {
        let mut engine = engine();
        let sheet = &engine.sheets()[0];
        assert_eq!((sheet.row, sheet.column), (Some(100), Some(26)));

        engine
            .set_cell_value("s1", 149, 30, CellInput::Value(true.into()))
            .unwrap();
        let sheet = &engine.sheets()[0];
        assert_eq!((sheet.row, sheet.column), (Some(150), Some(31)));
        let grid = sheet.data.as_ref().unwrap();
        assert!(grid.iter().all(|row| row.len() == 31));
        assert_eq!(
            sheet.celldata.as_ref().unwrap()[0].v.as_ref().unwrap().v,
            Some(EngineValue::Bool(true))
        );
    }

    #[test]
    fn test_edits_past_limits_fail() {
        let mut engine = MemoryEngine::new().with_limits(GridLimits {
            max_rows: 200,
            max_cols: 40,
            max_cells: 6_000,
        });
        engine.add_sheet("s1", "Sheet1").unwrap();

        engine
            .set_cell_value("s1", 199, 0, CellInput::Value(1.0.into()))
            .unwrap();
        for (row, col) in [(200, 0), (0, 40), (150, 39)] {
            let err = engine
                .set_cell_value("s1", row, col, CellInput::Value(2.0.into()))
                .unwrap_err();
            assert!(matches!(err, XlgridError::GridLimit(_)), "({row}, {col})");
        }
        let sheet = &engine.sheets()[0];
        assert_eq!((sheet.row, sheet.column), (Some(200), Some(26)));

        // Cells already inside the grid stay editable
        engine
            .set_cell_format("s1", 199, 25, FormatAttr::Bold(true))
            .unwrap();
        assert!(engine
            .insert_row_or_column("s1", Axis::Row, 0, 1, InsertAnchor::Before)
            .is_err());
        assert!(engine
            .insert_row_or_column("s1", Axis::Column, 0, 4, InsertAnchor::Before)
            .is_ok());
    }

    #[test]
    fn test_far_address_does_not_allocate() {
        let mut engine = engine();
        let far = engine.set_cell_value("s1", 1_048_575, 0, CellInput::Value(1.0.into()));
        assert!(matches!(far, Err(XlgridError::GridLimit(_))));

        let range = CellRange::new(CellPos::new(0, 0), CellPos::new(1_048_575, 16_383));
        let values = vec![vec![CellInput::Value(1.0.into())]; 70_000];
        assert!(engine.set_range_values("s1", &range, values).is_err());
        // Nothing was written before the check failed
        assert_eq!(value_at(&engine, 0, 0), None);
        assert_eq!(engine.sheets[0].data.as_ref().unwrap().len(), 100);
    }

    #[test]
    fn test_ragged_grid_is_squared_on_load() {
        let mut sheet = sheet_to_engine_format(&Sheet::with_id("s1", "S"), 0, true);
        let mut grid = sheet.data.take().unwrap();
        grid[3].truncate(5);
        grid[7].push(None);
        sheet.data = Some(grid);

        let engine = MemoryEngine::with_sheets(vec![sheet]);
        let grid = engine.sheets[0].data.as_ref().unwrap();
        assert!(grid.iter().all(|row| row.len() == 27));
        assert_eq!(engine.sheets[0].column, Some(27));
    }

    #[test]
    fn test_range_values_clip_to_range() {
        let mut engine = engine();
        let range = CellRange::new(CellPos::new(1, 1), CellPos::new(1, 2));
        let values = vec![
            vec![
                CellInput::Value(1.0.into()),
                CellInput::Value(2.0.into()),
                CellInput::Value(3.0.into()),
            ],
            vec![CellInput::Value(4.0.into())],
        ];
        engine.set_range_values("s1", &range, values).unwrap();
        assert_eq!(value_at(&engine, 1, 2), Some(EngineValue::Number(2.0)));
        assert_eq!(value_at(&engine, 1, 3), None);
        assert_eq!(value_at(&engine, 2, 1), None);
    }

    #[test]
    fn test_insert_rows_shifts_everything() {
        let mut sheet = Sheet::with_id("s1", "Sheet1");
        sheet.set_cell(0, 0, Cell::new("top"));
        sheet.set_cell(3, 0, Cell::new("moved"));
        sheet.merges.push(CellRange::new(CellPos::new(2, 0), CellPos::new(4, 1)));
        sheet.merges.push(CellRange::new(CellPos::new(5, 0), CellPos::new(5, 2)));
        sheet.row_heights.insert(3, 40.0);
        let mut engine = MemoryEngine::with_sheets(vec![sheet_to_engine_format(&sheet, 0, true)]);
        engine
            .set_border(
                "s1",
                3,
                0,
                Some(BorderCell {
                    row_index: 0,
                    col_index: 0,
                    l: None,
                    r: None,
                    t: Some(side()),
                    b: None,
                }),
            )
            .unwrap();

        engine
            .insert_row_or_column("s1", Axis::Row, 3, 2, InsertAnchor::Before)
            .unwrap();

        assert_eq!(value_at(&engine, 0, 0), Some(EngineValue::Text("top".into())));
        assert_eq!(value_at(&engine, 3, 0), None);
        assert_eq!(value_at(&engine, 5, 0), Some(EngineValue::Text("moved".into())));

        let sheet = &engine.sheets()[0];
        let config = sheet.config.as_ref().unwrap();
        let merge = config.merge.as_ref().unwrap();
        assert_eq!(merge["2_0"], MergeSpan { r: 2, c: 0, rs: 5, cs: 2 });
        assert_eq!(merge["7_0"], MergeSpan { r: 7, c: 0, rs: 1, cs: 3 });
        assert_eq!(config.rowlen.as_ref().unwrap()["5"], 40.0);
        assert!(engine.border("s1", 5, 0).unwrap().is_some());
        assert!(engine.border("s1", 3, 0).unwrap().is_none());
        assert_eq!(sheet.row, Some(102));
    }

    #[test]
    fn test_insert_after_anchor() {
        let mut engine = engine();
        engine
            .set_cell_value("s1", 0, 1, CellInput::Value("b".into()))
            .unwrap();
        engine
            .insert_row_or_column("s1", Axis::Column, 0, 1, InsertAnchor::After)
            .unwrap();
        assert_eq!(value_at(&engine, 0, 2), Some(EngineValue::Text("b".into())));
        assert_eq!(engine.sheets()[0].column, Some(27));
    }

    #[test]
    fn test_delete_columns() {
        let mut sheet = Sheet::with_id("s1", "Sheet1");
        sheet.set_cell(0, 0, Cell::new("a"));
        sheet.set_cell(0, 1, Cell::new("b"));
        sheet.set_cell(0, 4, Cell::new("e"));
        sheet.merges.push(CellRange::new(CellPos::new(2, 0), CellPos::new(3, 2)));
        sheet.merges.push(CellRange::new(CellPos::new(5, 1), CellPos::new(5, 2)));
        sheet.col_widths.insert(1, 80.0);
        sheet.col_widths.insert(6, 90.0);
        let mut engine = MemoryEngine::with_sheets(vec![sheet_to_engine_format(&sheet, 0, true)]);

        engine
            .delete_row_or_column("s1", Axis::Column, 1, 2)
            .unwrap();

        assert_eq!(value_at(&engine, 0, 0), Some(EngineValue::Text("a".into())));
        assert_eq!(value_at(&engine, 0, 1), None);
        assert_eq!(value_at(&engine, 0, 2), Some(EngineValue::Text("e".into())));

        let sheet = &engine.sheets()[0];
        let config = sheet.config.as_ref().unwrap();
        let merge = config.merge.as_ref().unwrap();
        assert_eq!(merge.len(), 1);
        assert_eq!(merge["2_0"], MergeSpan { r: 2, c: 0, rs: 2, cs: 1 });
        let widths = config.columnlen.as_ref().unwrap();
        assert_eq!(widths.len(), 1);
        assert_eq!(widths["4"], 90.0);
        assert_eq!(sheet.column, Some(26));
    }

    #[test]
    fn test_sheet_lifecycle() {
        let mut engine = engine();
        engine.add_sheet("s2", "Second").unwrap();
        engine.add_sheet("s3", "Third").unwrap();
        assert!(engine.add_sheet("s2", "Again").is_err());
        assert_eq!(engine.active_sheet_id().as_deref(), Some("s1"));

        engine.activate_sheet("s2").unwrap();
        engine.rename_sheet("s2", "Renamed").unwrap();
        engine.delete_sheet("s2").unwrap();

        let handles = engine.sheet_handles();
        let names: Vec<&str> = handles.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Sheet1", "Third"]);
        assert_eq!(engine.active_sheet_id().as_deref(), Some("s3"));
        let orders: Vec<u32> = engine.sheets().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn test_replace_from_celldata() {
        let incoming = EngineSheet {
            name: "Loaded".into(),
            status: 1,
            celldata: Some(vec![PositionedCell {
                r: 4,
                c: 2,
                v: Some(EngineCell {
                    v: Some(EngineValue::Number(7.0)),
                    ht: Some(h_align_code(HAlign::Left)),
                    ..EngineCell::default()
                }),
            }]),
            ..EngineSheet::default()
        };
        let second = EngineSheet {
            id: "b".into(),
            name: "Other".into(),
            status: 1,
            ..EngineSheet::default()
        };
        let engine = MemoryEngine::with_sheets(vec![incoming, second]);
        let handles = engine.sheet_handles();
        assert!(!handles[0].id.is_empty());
        assert_eq!(
            handles.iter().map(|h| h.active).collect::<Vec<_>>(),
            vec![true, false]
        );
        let cell = engine.cell(&handles[0].id, 4, 2).unwrap().unwrap();
        assert_eq!(cell.ht, Some(1));
        assert!(engine.sheets()[1].config.is_some());
    }
}
