use super::sheet::{engine_format_to_sheet, sheet_to_engine_format_with};
use super::AdapterOptions;
use crate::types::engine::EngineSheet;
use crate::types::{Workbook, DEFAULT_TITLE};

/// Encode every sheet; only the sheet at `active_sheet` is flagged active.
pub fn workbook_to_engine_format(workbook: &Workbook) -> Vec<EngineSheet> {
    workbook_to_engine_format_with(workbook, &AdapterOptions::default())
}

pub fn workbook_to_engine_format_with(
    workbook: &Workbook,
    options: &AdapterOptions,
) -> Vec<EngineSheet> {
    workbook
        .sheets
        .iter()
        .zip(0u32..)
        .map(|(sheet, order)| {
            sheet_to_engine_format_with(
                sheet,
                order,
                order as usize == workbook.active_sheet,
                options,
            )
        })
        .collect()
}

/// Decode engine sheets into a workbook with a fresh id. The first sheet
/// flagged active becomes the active index, else 0.
pub fn engine_format_to_workbook(sheets: &[EngineSheet], title: Option<&str>) -> Workbook {
    let mut workbook = Workbook::new(title.unwrap_or(DEFAULT_TITLE));
    workbook.sheets = sheets.iter().map(engine_format_to_sheet).collect();
    workbook.active_sheet = sheets.iter().position(EngineSheet::is_active).unwrap_or(0);
    workbook
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
    use crate::types::{Cell, CellRange, Sheet, Style};

    fn sample() -> Workbook {
        let mut wb = Workbook::new("Budget");
        let mut first = Sheet::new("Income");
        first.set_cell(0, 0, Cell::new("Month"));
        first.set_cell(1, 0, Cell::new(1200.5));
        first.set_cell(2, 0, Cell::formula("SUM(A2:A2)"));
        first.set_cell(
            0,
            1,
            Cell::new(true).with_style(Style {
                bold: true,
                font_color: Some("#336699".into()),
                font_size: Some(14.0),
                ..Style::default()
            }),
        );
        first.merges.push(CellRange {
            start_row: 5,
            start_col: 0,
            end_row: 6,
            end_col: 3,
        });
        let second = Sheet::new("Costs");
        wb.sheets = vec![first, second];
        wb.active_sheet = 1;
        wb
    }

    #[test]
    fn test_active_flag() {
        let engine = workbook_to_engine_format(&sample());
        let statuses: Vec<u8> = engine.iter().map(|s| s.status).collect();
        assert_eq!(statuses, vec![0, 1]);
        assert_eq!(engine[1].order, 1);
    }

    #[test]
    fn test_round_trip() {
        let wb = sample();
        let back = engine_format_to_workbook(&workbook_to_engine_format(&wb), Some(&wb.title));
        assert_ne!(back.id, wb.id);
        assert_eq!(back.title, wb.title);
        assert_eq!(back.active_sheet, wb.active_sheet);
        assert_eq!(back.sheets, wb.sheets);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(workbook_to_engine_format(&Workbook::new("T")).is_empty());
        let wb = engine_format_to_workbook(&[], None);
        assert!(wb.sheets.is_empty());
        assert_eq!(wb.active_sheet, 0);
        assert_eq!(wb.title, "Untitled Spreadsheet");
    }

    #[test]
    fn test_no_active_flag_defaults_to_first() {
        let mut engine = workbook_to_engine_format(&sample());
        for sheet in &mut engine {
            sheet.status = 0;
        }
        assert_eq!(engine_format_to_workbook(&engine, None).active_sheet, 0);
    }
}
