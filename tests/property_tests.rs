//! Property tests for addressing, matrices and the engine translation.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::cast_possible_truncation
)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use xlgrid::cell_ref::{cell_ref_to_indices, indices_to_cell_ref, parse_range, range_to_range_ref};
use xlgrid::csv::{read_csv, write_csv, CsvOptions};
use xlgrid::matrix::{matrix_to_sparse, sparse_to_matrix, MatrixSource};
use xlgrid::{
    adapter::AdapterOptions, engine_format_to_sheet, sheet_to_engine_format, Cell, CellPos,
    CellRange, CellValue, Sheet,
};

fn cell_value() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        (-1.0e9f64..1.0e9).prop_map(CellValue::Number),
        any::<bool>().prop_map(CellValue::Boolean),
        "[A-Za-z0-9 _.-]{1,12}".prop_map(CellValue::String),
    ]
}

fn sparse_cells(max_row: u32, max_col: u32) -> impl Strategy<Value = BTreeMap<CellPos, Cell>> {
    proptest::collection::btree_map(
        (0..max_row, 0..max_col).prop_map(|(r, c)| CellPos::new(r, c)),
        cell_value().prop_map(Cell::new),
        0..40,
    )
}

proptest! {
    #[test]
    fn prop_cell_ref_round_trip(row in 0u32..1_048_576, col in 0u32..16_384) {
        let reference = indices_to_cell_ref(row, col);
        prop_assert_eq!(cell_ref_to_indices(&reference).unwrap(), CellPos::new(row, col));
        prop_assert_eq!(
            cell_ref_to_indices(&reference.to_lowercase()).unwrap(),
            CellPos::new(row, col)
        );
    }

    #[test]
    fn prop_range_normalized(
        a in (0u32..5000, 0u32..500),
        b in (0u32..5000, 0u32..500),
    ) {
        let text = format!(
            "{}:{}",
            indices_to_cell_ref(a.0, a.1),
            indices_to_cell_ref(b.0, b.1)
        );
        let range = parse_range(&text).unwrap();
        prop_assert!(range.start_row <= range.end_row);
        prop_assert!(range.start_col <= range.end_col);
        prop_assert_eq!(range.start_row, a.0.min(b.0));
        prop_assert_eq!(range.end_col, a.1.max(b.1));
        prop_assert_eq!(parse_range(&range_to_range_ref(&range)).unwrap(), range);
    }

    #[test]
    fn prop_matrix_identity(cells in sparse_cells(300, 60), min_rows in 0u32..120, min_cols in 0u32..30) {
        let matrix = sparse_to_matrix(&cells, min_rows, min_cols, |_, cell| cell.clone());
        prop_assert!(matrix.row_count >= min_rows);
        prop_assert!(matrix.col_count >= min_cols);
        prop_assert_eq!(matrix.rows.len(), matrix.row_count as usize);
        prop_assert!(matrix.rows.iter().all(|r| r.len() == matrix.col_count as usize));

        let back = matrix_to_sparse(MatrixSource::Dense(&matrix.rows), |_, cell| Some(cell.clone()));
        prop_assert_eq!(back, cells);
    }

    #[test]
    fn prop_engine_sheet_round_trip(
        cells in sparse_cells(150, 40),
        heights in proptest::collection::btree_map(0u32..50, 10.0f64..80.0, 0..5),
        frozen_rows in 0u32..4,
        frozen_cols in 0u32..4,
    ) {
        let mut sheet = Sheet::with_id("sheet-1", "Data");
        sheet.cells = cells;
        sheet.row_heights = heights;
        sheet.frozen_rows = frozen_rows;
        sheet.frozen_cols = frozen_cols;

        let engine = sheet_to_engine_format(&sheet, 0, true);
        let defaults = AdapterOptions::default();
        prop_assert!(engine.row.unwrap() >= defaults.min_rows);
        prop_assert!(engine.column.unwrap() >= defaults.min_cols);

        let back = engine_format_to_sheet(&engine);
        prop_assert_eq!(back, sheet);
    }

    #[test]
    fn prop_csv_round_trip(
        rows in proptest::collection::vec(
            proptest::collection::vec("[a-z0-9 ,\"\n]{1,8}", 1..5),
            1..8,
        )
    ) {
        let options = CsvOptions::default();
        let text = write_csv(&rows, &options);
        prop_assert_eq!(read_csv(&text, &options), rows);
    }
}

#[test]
fn test_merge_keys_survive_engine() {
    let mut sheet = Sheet::with_id("s", "Merged");
    sheet.set_cell(0, 0, Cell::new("Header"));
    sheet.merges.push(CellRange::new(CellPos::new(0, 0), CellPos::new(0, 3)));
    sheet.merges.push(CellRange::new(CellPos::new(4, 2), CellPos::new(6, 2)));

    let engine = sheet_to_engine_format(&sheet, 0, true);
    let merge = engine.config.as_ref().unwrap().merge.as_ref().unwrap();
    assert_eq!(merge["0_0"].cs, 4);
    assert_eq!(merge["4_2"].rs, 3);
    assert_eq!(engine_format_to_sheet(&engine).merges, sheet.merges);
}
