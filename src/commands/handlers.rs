//! One handler per operation. Each returns its result record as JSON.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use serde_json::Value;

use super::request::{
    AddSheetPayload, CreatePayload, DeleteSheetPayload, ExportFormat, ExportPayload,
    FormatPayload, GetDataPayload, InsertChartPayload, RenameSheetPayload, Request,
    SetCellsPayload,
};
use crate::cell_ref::parse_range;
use crate::csv::CsvOptions;
use crate::editor::SpreadsheetEditor;
use crate::engine::GridEngine;
use crate::error::{Result, XlgridError};
use crate::types::{canonical_formula, CellPos, CellRange, CellValue, Workbook};
use crate::xlsx::XlsxOptions;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateResult {
    document_id: String,
    title: String,
    sheet_count: usize,
}

#[derive(Serialize)]
struct SheetGrid {
    name: String,
    data: Vec<Vec<CellValue>>,
}

#[derive(Serialize)]
struct RangeValues {
    values: Vec<Vec<CellValue>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum GetDataResult {
    Workbook(Workbook),
    Sheet(SheetGrid),
    Range(RangeValues),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetCellsResult {
    updated_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormatResult {
    formatted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertChartResult {
    chart_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportResult {
    /// Base64 of the exported bytes.
    data: String,
    mime_type: &'static str,
    filename: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddSheetResult {
    sheet_id: String,
    sheet_name: String,
    index: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteSheetResult {
    deleted: bool,
    remaining_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenameSheetResult {
    old_name: String,
    new_name: String,
}

/// Run a request against the editor.
pub(super) fn dispatch<E: GridEngine>(
    editor: &mut SpreadsheetEditor<E>,
    request: Request,
) -> Result<Value> {
    let value = match request {
        Request::Create(p) => serde_json::to_value(create(editor, p)?)?,
        Request::GetData(p) => serde_json::to_value(get_data(editor, &p)?)?,
        Request::SetCells(p) => serde_json::to_value(set_cells(editor, p)?)?,
        Request::Format(p) => serde_json::to_value(format_cells(editor, &p)?)?,
        Request::InsertChart(p) => serde_json::to_value(insert_chart(editor, p)?)?,
        Request::Export(p) => serde_json::to_value(export(editor, &p)?)?,
        Request::AddSheet(p) => serde_json::to_value(add_sheet(editor, &p)?)?,
        Request::DeleteSheet(p) => serde_json::to_value(delete_sheet(editor, &p)?)?,
        Request::RenameSheet(p) => serde_json::to_value(rename_sheet(editor, &p)?)?,
    };
    Ok(value)
}

/// Range spanning a row-major grid placed at `origin`; `None` for an empty grid.
fn grid_range(origin: CellPos, values: &[Vec<CellValue>]) -> Option<CellRange> {
    let rows = u32::try_from(values.len()).ok()?;
    let cols = u32::try_from(values.iter().map(Vec::len).max()?).ok()?;
    if rows == 0 || cols == 0 {
        return None;
    }
    Some(CellRange::new(
        origin,
        CellPos::new(
            origin.row.saturating_add(rows - 1),
            origin.col.saturating_add(cols - 1),
        ),
    ))
}

fn sheet_names<E: GridEngine>(editor: &SpreadsheetEditor<E>) -> Vec<String> {
    editor
        .engine()
        .sheet_handles()
        .into_iter()
        .map(|h| h.name)
        .collect()
}

fn create<E: GridEngine>(
    editor: &mut SpreadsheetEditor<E>,
    payload: CreatePayload,
) -> Result<CreateResult> {
    editor.clear();
    if let Some(ref title) = payload.title {
        editor.set_title(title);
    }

    for (index, seed) in payload.sheets.unwrap_or_default().into_iter().enumerate() {
        if index == 0 {
            editor.rename_sheet(0, &seed.name)?;
        } else {
            editor.add_sheet(Some(&seed.name))?;
        }
        if let Some(data) = seed.data {
            if let Some(range) = grid_range(CellPos::new(0, 0), &data) {
                editor.set_cells_by_range(index, &range, data)?;
            }
        }
    }

    let workbook = editor.get_data();
    Ok(CreateResult {
        document_id: workbook.id,
        title: workbook.title,
        sheet_count: workbook.sheets.len(),
    })
}

fn get_data<E: GridEngine>(
    editor: &SpreadsheetEditor<E>,
    payload: &GetDataPayload,
) -> Result<GetDataResult> {
    if payload.sheet_index.is_none() && payload.range.is_none() {
        return Ok(GetDataResult::Workbook(editor.get_data()));
    }

    let index = payload
        .sheet_index
        .unwrap_or_else(|| editor.get_active_sheet());

    if let Some(ref range) = payload.range {
        let range = parse_range(range)?;
        editor.limits().check_range(&range)?;
        let values = (range.start_row..=range.end_row)
            .map(|row| {
                (range.start_col..=range.end_col)
                    .map(|col| editor.get_cell_value(index, row, col))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(GetDataResult::Range(RangeValues { values }));
    }

    let workbook = editor.get_data();
    let sheet = workbook
        .sheet(index)
        .ok_or_else(|| XlgridError::SheetNotFound(format!("index {index}")))?;
    // Dense from A1; an empty sheet still yields one empty row
    let (max_row, max_col) = sheet
        .cells
        .keys()
        .fold((0, 0), |(r, c), pos| (r.max(pos.row), c.max(pos.col)));
    let data = (0..=max_row)
        .map(|row| {
            (0..=max_col)
                .map(|col| {
                    sheet
                        .cell(row, col)
                        .map(|cell| cell.value.clone())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    Ok(GetDataResult::Sheet(SheetGrid {
        name: sheet.name.clone(),
        data,
    }))
}

fn set_cells<E: GridEngine>(
    editor: &mut SpreadsheetEditor<E>,
    payload: SetCellsPayload,
) -> Result<SetCellsResult> {
    let index = payload
        .sheet_index
        .unwrap_or_else(|| editor.get_active_sheet());
    let limits = editor.limits();
    let mut updated = 0usize;

    for write in payload.cells {
        let range = parse_range(&write.reference)?;
        limits.check_range(&range)?;
        let value = match write.formula {
            Some(ref f) if !f.is_empty() => Some(CellValue::String(canonical_formula(f))),
            _ => write.value,
        };

        if let Some(values) = write.values {
            let count = values.iter().map(Vec::len).sum::<usize>();
            if let Some(target) = grid_range(range.start(), &values) {
                limits.check_range(&target)?;
                editor.set_cells_by_range(index, &target, values)?;
            }
            updated += count;
        } else if range.is_single() {
            let pos = range.start();
            editor.set_cell_value(index, pos.row, pos.col, value.unwrap_or_default())?;
            updated += 1;
        } else if let Some(value) = value {
            for pos in range.positions() {
                editor.set_cell_value(index, pos.row, pos.col, value.clone())?;
                updated += 1;
            }
        }
    }

    Ok(SetCellsResult {
        updated_count: updated,
    })
}

fn format_cells<E: GridEngine>(
    editor: &mut SpreadsheetEditor<E>,
    payload: &FormatPayload,
) -> Result<FormatResult> {
    let index = payload
        .sheet_index
        .unwrap_or_else(|| editor.get_active_sheet());
    let range = parse_range(&payload.range)?;
    editor.limits().check_range(&range)?;
    let mut formatted = 0usize;

    for pos in range.positions() {
        let merged = editor
            .get_cell_style(index, pos.row, pos.col)?
            .unwrap_or_default()
            .merged_with(&payload.style);
        editor.set_cell_style(index, pos.row, pos.col, &merged)?;
        formatted += 1;
    }

    Ok(FormatResult {
        formatted_count: formatted,
    })
}

fn insert_chart<E: GridEngine>(
    editor: &mut SpreadsheetEditor<E>,
    payload: InsertChartPayload,
) -> Result<InsertChartResult> {
    let index = payload
        .sheet_index
        .unwrap_or_else(|| editor.get_active_sheet());
    let chart_id = editor.insert_chart(index, payload.chart)?;
    Ok(InsertChartResult { chart_id })
}

fn export<E: GridEngine>(
    editor: &SpreadsheetEditor<E>,
    payload: &ExportPayload,
) -> Result<ExportResult> {
    let bytes = match payload.format {
        ExportFormat::Xlsx => {
            let options = XlsxOptions {
                include_styles: payload.options.include_styles.unwrap_or(true),
                ..XlsxOptions::default()
            };
            editor
                .export_xlsx(&options)
                .map_err(|e| XlgridError::Export(e.to_string()))?
        }
        ExportFormat::Csv => editor
            .export_csv(payload.sheet_index, &CsvOptions::default())?
            .into_bytes(),
        ExportFormat::Pdf => {
            return Err(XlgridError::Unsupported(
                "PDF export not yet implemented".to_string(),
            ))
        }
    };

    let filename = payload.filename.clone().unwrap_or_else(|| {
        let stem = if editor.title().is_empty() {
            "spreadsheet"
        } else {
            editor.title()
        };
        format!("{stem}.{}", payload.format.extension())
    });

    Ok(ExportResult {
        data: STANDARD.encode(bytes),
        mime_type: payload.format.mime_type(),
        filename,
    })
}

fn add_sheet<E: GridEngine>(
    editor: &mut SpreadsheetEditor<E>,
    payload: &AddSheetPayload,
) -> Result<AddSheetResult> {
    let (sheet_id, index) = editor.add_sheet(payload.name.as_deref())?;
    let sheet_name = sheet_names(editor)
        .into_iter()
        .nth(index)
        .unwrap_or_default();
    Ok(AddSheetResult {
        sheet_id,
        sheet_name,
        index,
    })
}

fn delete_sheet<E: GridEngine>(
    editor: &mut SpreadsheetEditor<E>,
    payload: &DeleteSheetPayload,
) -> Result<DeleteSheetResult> {
    editor.delete_sheet(payload.index)?;
    Ok(DeleteSheetResult {
        deleted: true,
        remaining_count: editor.sheet_count(),
    })
}

fn rename_sheet<E: GridEngine>(
    editor: &mut SpreadsheetEditor<E>,
    payload: &RenameSheetPayload,
) -> Result<RenameSheetResult> {
    let old_name = editor.rename_sheet(payload.index, &payload.name)?;
    Ok(RenameSheetResult {
        old_name,
        new_name: payload.name.clone(),
    })
}
