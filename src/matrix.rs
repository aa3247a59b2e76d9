//! Sparse cell maps to dense padded matrices and back.

use std::collections::BTreeMap;

use crate::types::engine::Positioned;
use crate::types::{Cell, CellPos};

/// A fully populated rectangular grid. `None` is the explicit empty marker;
/// every row holds exactly `col_count` slots.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMatrix<T> {
    pub rows: Vec<Vec<Option<T>>>,
    pub row_count: u32,
    pub col_count: u32,
}

impl<T> GridMatrix<T> {
    /// A matrix of empty slots.
    pub fn empty(row_count: u32, col_count: u32) -> Self {
        let rows = (0..row_count)
            .map(|_| (0..col_count).map(|_| None).collect())
            .collect();
        Self {
            rows,
            row_count,
            col_count,
        }
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&T> {
        self.rows
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .and_then(Option::as_ref)
    }

    /// Place a value. Out-of-bounds positions are ignored and reported as false.
    pub fn set(&mut self, row: u32, col: u32, value: T) -> bool {
        match self
            .rows
            .get_mut(row as usize)
            .and_then(|r| r.get_mut(col as usize))
        {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn into_rows(self) -> Vec<Vec<Option<T>>> {
        self.rows
    }
}

/// Where [`matrix_to_sparse`] reads cells from.
#[derive(Debug, Clone, Copy)]
pub enum MatrixSource<'a, T> {
    /// Row-major dense rows.
    Dense(&'a [Vec<Option<T>>]),
    /// Flat `{r, c, v}` records.
    Records(&'a [Positioned<T>]),
}

/// Build a dense matrix of at least `min_rows` x `min_cols`, large enough for
/// every stored cell.
pub fn sparse_to_matrix<T, F>(
    cells: &BTreeMap<CellPos, Cell>,
    min_rows: u32,
    min_cols: u32,
    mut encode: F,
) -> GridMatrix<T>
where
    F: FnMut(CellPos, &Cell) -> T,
{
    let (mut rows, mut cols) = (min_rows, min_cols);
    for pos in cells.keys() {
        rows = rows.max(pos.row.saturating_add(1));
        cols = cols.max(pos.col.saturating_add(1));
    }

    let mut matrix = GridMatrix::empty(rows, cols);
    for (pos, cell) in cells {
        matrix.set(pos.row, pos.col, encode(*pos, cell));
    }
    matrix
}

/// Collect the cells of a dense matrix or record list. Slots that decode to
/// nothing, or to a blank cell, produce no entry.
#[allow(clippy::cast_possible_truncation)]
pub fn matrix_to_sparse<T, F>(source: MatrixSource<'_, T>, mut decode: F) -> BTreeMap<CellPos, Cell>
where
    F: FnMut(CellPos, &T) -> Option<Cell>,
{
    let mut cells = BTreeMap::new();
    let mut put = |pos: CellPos, value: &T| {
        if let Some(cell) = decode(pos, value) {
            if !cell.is_blank() {
                cells.insert(pos, cell);
            }
        }
    };

    match source {
        MatrixSource::Dense(rows) => {
            for (r, row) in rows.iter().enumerate() {
                for (c, slot) in row.iter().enumerate() {
                    if let Some(value) = slot {
                        put(CellPos::new(r as u32, c as u32), value);
                    }
                }
            }
        }
        MatrixSource::Records(records) => {
            for record in records {
                if let Some(ref value) = record.v {
                    put(CellPos::new(record.r, record.c), value);
                }
            }
        }
    }
    cells
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
    use crate::types::CellValue;

    fn encode(_: CellPos, cell: &Cell) -> CellValue {
        cell.value.clone()
    }

    fn decode(_: CellPos, value: &CellValue) -> Option<Cell> {
        Some(Cell::new(value.clone()))
    }

    #[test]
    fn test_empty_map_is_fully_padded() {
        let m = sparse_to_matrix(&BTreeMap::new(), 100, 26, encode);
        assert_eq!(m.row_count, 100);
        assert_eq!(m.col_count, 26);
        assert_eq!(m.rows.len(), 100);
        assert!(m.rows.iter().all(|r| r.len() == 26));
        assert!(m.rows[99][25].is_none());
    }

    #[test]
    fn test_grows_past_minimum() {
        let mut cells = BTreeMap::new();
        cells.insert(CellPos::new(120, 30), Cell::new(7.0));
        cells.insert(CellPos::new(2, 1), Cell::new("x"));
        let m = sparse_to_matrix(&cells, 100, 26, encode);
        assert_eq!((m.row_count, m.col_count), (121, 31));
        assert!(m.rows.iter().all(|r| r.len() == 31));
        assert_eq!(m.get(120, 30), Some(&CellValue::Number(7.0)));
        assert_eq!(m.get(2, 1), Some(&CellValue::String("x".into())));
        assert_eq!(m.get(0, 0), None);
    }

    #[test]
    fn test_dense_round_trip() {
        let mut cells = BTreeMap::new();
        cells.insert(CellPos::new(0, 0), Cell::new(1.0));
        cells.insert(CellPos::new(4, 3), Cell::new(true));
        let m = sparse_to_matrix(&cells, 10, 5, encode);
        let back = matrix_to_sparse(MatrixSource::Dense(&m.rows), decode);
        assert_eq!(back, cells);
    }

    #[test]
    fn test_records_source() {
        let records = vec![
            Positioned {
                r: 3,
                c: 2,
                v: Some(CellValue::from("hi")),
            },
            Positioned { r: 0, c: 0, v: None },
            Positioned {
                r: 1,
                c: 1,
                v: Some(CellValue::Null),
            },
        ];
        let cells = matrix_to_sparse(MatrixSource::Records(&records), decode);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[&CellPos::new(3, 2)].value, CellValue::from("hi"));
    }
}
