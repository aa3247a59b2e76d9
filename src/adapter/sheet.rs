use std::collections::BTreeMap;

use log::debug;

use super::AdapterOptions;
use crate::matrix::{matrix_to_sparse, sparse_to_matrix, MatrixSource};
use crate::style_codec::{border_to_engine, engine_to_border, engine_to_style, style_to_engine};
use crate::types::engine::{
    CellFormat, EngineCell, EngineComment, EngineConfig, EngineSheet, EngineValue,
    FrozenDescriptor, FrozenKind, FrozenRange, MergeSpan, BORDER_RANGE_CELL, DATE_TYPE,
    STATUS_ACTIVE, STATUS_INACTIVE,
};
use crate::types::{
    canonical_formula, parse_datetime, Cell, CellPos, CellRange, CellValue, Sheet, Style,
    DATETIME_FORMAT,
};

/// Encode one sparse cell as an engine cell.
pub fn cell_to_engine(cell: &Cell) -> EngineCell {
    let mut out = EngineCell::default();

    let value = match cell.value {
        CellValue::Null => None,
        CellValue::Boolean(b) => Some(EngineValue::Bool(b)),
        CellValue::Number(n) => Some(EngineValue::Number(n)),
        CellValue::DateTime(dt) => {
            out.ct.get_or_insert_with(CellFormat::default).t = Some(DATE_TYPE.to_string());
            Some(EngineValue::Text(dt.format(DATETIME_FORMAT).to_string()))
        }
        CellValue::String(ref s) => Some(EngineValue::Text(s.clone())),
    };
    if value.is_some() {
        out.m = Some(cell.value.display());
    }
    out.v = value;

    if let Some(formula) = cell.bare_formula() {
        out.f = Some(formula.to_string());
    }
    if let Some(ref style) = cell.style {
        style_to_engine(style, &mut out);
    }
    if let Some(ref comment) = cell.comment {
        out.ps = Some(EngineComment::hidden(comment));
    }
    out
}

/// Decode an engine cell. `None` when nothing in it maps to the sparse model.
pub fn engine_to_cell(engine: &EngineCell) -> Option<Cell> {
    let value = match engine.v {
        None => CellValue::Null,
        Some(EngineValue::Bool(b)) => CellValue::Boolean(b),
        Some(EngineValue::Number(n)) => CellValue::Number(n),
        Some(EngineValue::Text(ref s)) if engine.is_temporal() => {
            parse_datetime(s).map_or_else(|| CellValue::String(s.clone()), CellValue::DateTime)
        }
        Some(EngineValue::Text(ref s)) => CellValue::String(s.clone()),
    };

    let cell = Cell {
        value,
        formula: engine
            .f
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(canonical_formula),
        style: engine_to_style(engine),
        comment: engine.ps.as_ref().map(|ps| ps.value.clone()),
    };
    if cell.is_blank() {
        None
    } else {
        Some(cell)
    }
}

fn sizes_to_engine(sizes: &BTreeMap<u32, f64>) -> Option<BTreeMap<String, f64>> {
    if sizes.is_empty() {
        return None;
    }
    Some(sizes.iter().map(|(k, v)| (k.to_string(), *v)).collect())
}

fn sizes_from_engine(sizes: Option<&BTreeMap<String, f64>>) -> BTreeMap<u32, f64> {
    let mut out = BTreeMap::new();
    for (key, size) in sizes.into_iter().flatten() {
        match key.parse::<u32>() {
            Ok(index) => {
                out.insert(index, *size);
            }
            Err(_) => debug!("dropping size entry with non-numeric key {key:?}"),
        }
    }
    out
}

fn frozen_descriptor(rows: u32, cols: u32) -> Option<FrozenDescriptor> {
    let kind = match (rows > 0, cols > 0) {
        (true, true) => FrozenKind::Both,
        (true, false) => FrozenKind::Row,
        (false, true) => FrozenKind::Column,
        (false, false) => return None,
    };
    Some(FrozenDescriptor {
        kind,
        range: Some(FrozenRange {
            row_focus: rows.saturating_sub(1),
            column_focus: cols.saturating_sub(1),
        }),
    })
}

fn frozen_counts(frozen: Option<&FrozenDescriptor>) -> (u32, u32) {
    let Some(frozen) = frozen else {
        return (0, 0);
    };
    if frozen.kind == FrozenKind::Other {
        debug!("ignoring unknown frozen pane type");
    }
    let range = frozen.range.unwrap_or_default();
    let rows = if frozen.kind.freezes_rows() {
        range.row_focus.saturating_add(1)
    } else {
        0
    };
    let cols = if frozen.kind.freezes_cols() {
        range.column_focus.saturating_add(1)
    } else {
        0
    };
    (rows, cols)
}

/// [`sheet_to_engine_format_with`] using the default 100 x 26 minimum.
pub fn sheet_to_engine_format(sheet: &Sheet, order: u32, is_active: bool) -> EngineSheet {
    sheet_to_engine_format_with(sheet, order, is_active, &AdapterOptions::default())
}

/// Encode a sheet for the grid engine.
pub fn sheet_to_engine_format_with(
    sheet: &Sheet,
    order: u32,
    is_active: bool,
    options: &AdapterOptions,
) -> EngineSheet {
    let matrix = sparse_to_matrix(&sheet.cells, options.min_rows, options.min_cols, |_, cell| {
        cell_to_engine(cell)
    });

    let merge: BTreeMap<String, MergeSpan> = sheet
        .merges
        .iter()
        .map(|m| {
            (
                format!("{}_{}", m.start_row, m.start_col),
                MergeSpan {
                    r: m.start_row,
                    c: m.start_col,
                    rs: m.row_count(),
                    cs: m.col_count(),
                },
            )
        })
        .collect();

    let borders: Vec<_> = sheet
        .cells
        .iter()
        .filter_map(|(pos, cell)| {
            cell.style
                .as_ref()
                .and_then(|style| border_to_engine(pos.row, pos.col, style))
        })
        .collect();

    let config = EngineConfig {
        merge: if merge.is_empty() { None } else { Some(merge) },
        rowlen: sizes_to_engine(&sheet.row_heights),
        columnlen: sizes_to_engine(&sheet.col_widths),
        border_info: if borders.is_empty() {
            None
        } else {
            Some(borders)
        },
    };

    EngineSheet {
        id: sheet.id.clone(),
        name: sheet.name.clone(),
        order,
        status: if is_active {
            STATUS_ACTIVE
        } else {
            STATUS_INACTIVE
        },
        row: Some(matrix.row_count),
        column: Some(matrix.col_count),
        data: Some(matrix.into_rows()),
        celldata: None,
        config: Some(config),
        frozen: frozen_descriptor(sheet.frozen_rows, sheet.frozen_cols),
    }
}

/// Decode an engine sheet. `celldata` wins over `data` when it is non-empty.
pub fn engine_format_to_sheet(engine: &EngineSheet) -> Sheet {
    let decode = |_: CellPos, cell: &EngineCell| engine_to_cell(cell);
    let cells = match (engine.celldata.as_deref(), engine.data.as_deref()) {
        (Some(records), _) if !records.is_empty() => {
            matrix_to_sparse(MatrixSource::Records(records), decode)
        }
        (_, Some(rows)) => matrix_to_sparse(MatrixSource::Dense(rows), decode),
        _ => BTreeMap::new(),
    };

    let mut sheet = if engine.id.is_empty() {
        Sheet::new(&engine.name)
    } else {
        Sheet::with_id(&engine.id, &engine.name)
    };
    sheet.cells = cells;

    let config = engine.config.as_ref();

    for span in config
        .and_then(|c| c.merge.as_ref())
        .into_iter()
        .flat_map(BTreeMap::values)
    {
        let merge = CellRange {
            start_row: span.r,
            start_col: span.c,
            end_row: span.r.saturating_add(span.rs.max(1) - 1),
            end_col: span.c.saturating_add(span.cs.max(1) - 1),
        };
        if !sheet.add_merge(merge) {
            debug!("dropping overlapping merge {merge}");
        }
    }

    sheet.row_heights = sizes_from_engine(config.and_then(|c| c.rowlen.as_ref()));
    sheet.col_widths = sizes_from_engine(config.and_then(|c| c.columnlen.as_ref()));

    for info in config
        .and_then(|c| c.border_info.as_ref())
        .into_iter()
        .flatten()
    {
        if info.range_type != BORDER_RANGE_CELL {
            debug!("dropping border entry with range type {:?}", info.range_type);
            continue;
        }
        let pos = CellPos::new(info.value.row_index, info.value.col_index);
        let mut cell = sheet.cells.remove(&pos).unwrap_or_default();
        let mut style = cell.style.take().unwrap_or_default();
        engine_to_border(&info.value, &mut style);
        cell.style = Style::non_empty(style);
        sheet.set_cell(pos.row, pos.col, cell);
    }

    let (rows, cols) = frozen_counts(engine.frozen.as_ref());
    sheet.frozen_rows = rows;
    sheet.frozen_cols = cols;
    sheet
}

/// The blank `Sheet1` shown when there is nothing to load.
pub fn empty_engine_sheet() -> EngineSheet {
    let sheet = Sheet::new("Sheet1");
    sheet_to_engine_format(&sheet, 0, true)
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
    use crate::types::{BorderEdge, BorderKind, HAlign};

    #[test]
    fn test_merge_encoding() {
        let mut sheet = Sheet::with_id("s1", "Sheet1");
        sheet.merges.push(CellRange {
            start_row: 0,
            start_col: 0,
            end_row: 1,
            end_col: 2,
        });
        let engine = sheet_to_engine_format(&sheet, 0, true);
        let merge = engine.config.as_ref().unwrap().merge.as_ref().unwrap();
        assert_eq!(
            merge["0_0"],
            MergeSpan {
                r: 0,
                c: 0,
                rs: 2,
                cs: 3
            }
        );
        let json = serde_json::to_value(&engine).unwrap();
        assert_eq!(
            json["config"]["merge"]["0_0"],
            serde_json::json!({"r": 0, "c": 0, "rs": 2, "cs": 3})
        );

        let back = engine_format_to_sheet(&engine);
        assert_eq!(back.merges, sheet.merges);
    }

    #[test]
    fn test_range_both_frozen_decodes_counts() {
        let engine: EngineSheet = serde_json::from_value(serde_json::json!({
            "name": "Sheet1",
            "frozen": {"type": "rangeBoth", "range": {"row_focus": 2, "column_focus": 1}}
        }))
        .unwrap();
        let sheet = engine_format_to_sheet(&engine);
        assert_eq!((sheet.frozen_rows, sheet.frozen_cols), (3, 2));
    }

    #[test]
    fn test_frozen_encoding() {
        let mut sheet = Sheet::new("S");
        assert!(sheet_to_engine_format(&sheet, 0, false).frozen.is_none());

        sheet.frozen_rows = 2;
        let f = sheet_to_engine_format(&sheet, 0, false).frozen.unwrap();
        assert_eq!(f.kind, FrozenKind::Row);
        assert_eq!(f.range.unwrap().row_focus, 1);

        sheet.frozen_cols = 1;
        let f = sheet_to_engine_format(&sheet, 0, false).frozen.unwrap();
        assert_eq!(f.kind, FrozenKind::Both);
        assert_eq!(f.range.unwrap().column_focus, 0);

        sheet.frozen_rows = 0;
        let engine = sheet_to_engine_format(&sheet, 0, false);
        assert_eq!(engine.frozen.unwrap().kind, FrozenKind::Column);
        let back = engine_format_to_sheet(&engine);
        assert_eq!((back.frozen_rows, back.frozen_cols), (0, 1));
    }

    #[test]
    fn test_dense_shape_and_status() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(0, 0, Cell::new("x"));
        let engine = sheet_to_engine_format(&sheet, 3, true);
        assert_eq!(engine.order, 3);
        assert!(engine.is_active());
        assert_eq!(engine.row, Some(100));
        assert_eq!(engine.column, Some(26));
        let data = engine.data.as_ref().unwrap();
        assert_eq!(data.len(), 100);
        assert!(data.iter().all(|r| r.len() == 26));
        assert_eq!(data[0][0].as_ref().unwrap().m.as_deref(), Some("x"));

        let small = sheet_to_engine_format_with(
            &sheet,
            0,
            false,
            &AdapterOptions {
                min_rows: 1,
                min_cols: 1,
            },
        );
        assert_eq!((small.row, small.column), (Some(1), Some(1)));
        assert_eq!(small.status, STATUS_INACTIVE);
    }

    #[test]
    fn test_cell_encoding() {
        let cell = Cell::new(42.0).with_formula("=A1*2").with_comment("checked");
        let engine = cell_to_engine(&cell);
        assert_eq!(engine.v, Some(EngineValue::Number(42.0)));
        assert_eq!(engine.m.as_deref(), Some("42"));
        assert_eq!(engine.f.as_deref(), Some("A1*2"));
        assert_eq!(engine.ps.as_ref().unwrap().value, "checked");
        assert_eq!(engine_to_cell(&engine), Some(cell));
    }

    #[test]
    fn test_temporal_cell() {
        let dt = parse_datetime("2024-02-29T13:45:00").unwrap();
        let cell = Cell::new(dt);
        let engine = cell_to_engine(&cell);
        assert!(engine.is_temporal());
        assert_eq!(
            engine.v,
            Some(EngineValue::Text("2024-02-29T13:45:00".into()))
        );
        assert_eq!(engine_to_cell(&engine), Some(cell));
    }

    #[test]
    fn test_formula_only_cell_has_no_value() {
        let engine = cell_to_engine(&Cell::formula("SUM(A1:A3)"));
        assert!(engine.v.is_none());
        assert!(engine.m.is_none());
        assert_eq!(engine.f.as_deref(), Some("SUM(A1:A3)"));
    }

    #[test]
    fn test_celldata_preferred_over_data() {
        let engine: EngineSheet = serde_json::from_value(serde_json::json!({
            "name": "S",
            "data": [[{"v": "from data"}]],
            "celldata": [{"r": 2, "c": 1, "v": {"v": "from celldata"}}]
        }))
        .unwrap();
        let sheet = engine_format_to_sheet(&engine);
        assert_eq!(sheet.cells.len(), 1);
        assert_eq!(
            sheet.cell(2, 1).unwrap().value,
            CellValue::from("from celldata")
        );

        let empty_records: EngineSheet = serde_json::from_value(serde_json::json!({
            "name": "S",
            "data": [[null, {"v": 1}]],
            "celldata": []
        }))
        .unwrap();
        let sheet = engine_format_to_sheet(&empty_records);
        assert_eq!(sheet.cell(0, 1).unwrap().value, CellValue::Number(1.0));
    }

    #[test]
    fn test_missing_config_decodes_plain() {
        let engine: EngineSheet = serde_json::from_value(serde_json::json!({
            "name": "S",
            "data": [[{"v": 2}]]
        }))
        .unwrap();
        assert!(engine.config.is_none());
        let sheet = engine_format_to_sheet(&engine);
        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::Number(2.0));
        assert!(sheet.merges.is_empty());
        assert!(sheet.row_heights.is_empty());
        assert!(sheet.col_widths.is_empty());
    }

    #[test]
    fn test_sizes_and_borders_round_trip() {
        let mut sheet = Sheet::new("S");
        sheet.row_heights.insert(4, 30.0);
        sheet.col_widths.insert(1, 120.0);
        let style = Style {
            horizontal_align: Some(HAlign::Center),
            border_bottom: Some(BorderEdge::new(BorderKind::Dashed, "#FF0000")),
            ..Style::default()
        };
        sheet.set_cell(2, 2, Cell::new("b").with_style(style));

        let engine = sheet_to_engine_format(&sheet, 0, true);
        let config = engine.config.as_ref().unwrap();
        assert_eq!(config.rowlen.as_ref().unwrap()["4"], 30.0);
        assert_eq!(config.columnlen.as_ref().unwrap()["1"], 120.0);
        assert_eq!(config.border_info.as_ref().unwrap().len(), 1);

        assert_eq!(engine_format_to_sheet(&engine), sheet);
    }

    #[test]
    fn test_border_only_cell_is_materialized() {
        let engine: EngineSheet = serde_json::from_value(serde_json::json!({
            "name": "S",
            "config": {"borderInfo": [
                {"rangeType": "cell", "value": {"row_index": 1, "col_index": 0,
                  "t": {"style": 2, "color": "#123456"}}},
                {"rangeType": "range", "value": {"row_index": 5, "col_index": 5}}
            ]}
        }))
        .unwrap();
        let sheet = engine_format_to_sheet(&engine);
        assert_eq!(sheet.cells.len(), 1);
        let style = sheet.cell(1, 0).unwrap().style.clone().unwrap();
        assert_eq!(
            style.border_top,
            Some(BorderEdge::new(BorderKind::Medium, "#123456"))
        );
    }

    #[test]
    fn test_empty_engine_sheet() {
        let engine = empty_engine_sheet();
        assert_eq!(engine.name, "Sheet1");
        assert!(engine.is_active());
        assert_eq!(engine.data.as_ref().unwrap().len(), 100);
        assert!(engine.config.as_ref().unwrap().is_empty());
    }
}
