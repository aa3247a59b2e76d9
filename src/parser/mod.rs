//! Main XLSX parser
//!
//! Orchestrates the parsing of all components from the ZIP archive into
//! file-format records.

mod comments;
mod relationships;
pub(crate) mod styles;
mod worksheet;

use std::io::Cursor;
use zip::ZipArchive;

use serde::{Deserialize, Serialize};

use crate::cell_ref::{range_ref_to_range, range_to_range_ref};
use crate::error::Result;
use crate::types::xlsx::{XlsxBook, XlsxCell, XlsxCellType};
use crate::types::{CellPos, CellRange};

use comments::parse_comments;
use relationships::{
    get_comments_path, get_sheet_info, parse_core_title, parse_shared_strings, parse_stylesheet,
    parse_workbook_relationships,
};
use worksheet::{parse_sheet, SheetContext};

pub(crate) use worksheet::{COLUMN_PADDING_PX, DIGIT_WIDTH_PX};

/// What to pull out of the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Resolve cell formats into nested styles.
    pub include_styles: bool,
    /// Only parse the sheet with this name.
    pub sheet_name: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            include_styles: true,
            sheet_name: None,
        }
    }
}

/// Stretch a used-range marker so it covers `pos`. An absent marker stays
/// absent and an unreadable one is dropped; the importer scans addresses then.
fn widen_range(range: Option<String>, pos: CellPos) -> Option<String> {
    let current = range.as_deref().and_then(range_ref_to_range)?;
    let widened = CellRange::new(
        CellPos::new(
            current.start_row.min(pos.row),
            current.start_col.min(pos.col),
        ),
        CellPos::new(current.end_row.max(pos.row), current.end_col.max(pos.col)),
    );
    if widened == current {
        return range;
    }
    Some(range_to_range_ref(&widened))
}

/// Parse an XLSX file from bytes with default options.
pub fn parse(data: &[u8]) -> Result<XlsxBook> {
    parse_with_options(data, &ParseOptions::default())
}

/// Parse an XLSX file from bytes.
pub fn parse_with_options(data: &[u8], options: &ParseOptions) -> Result<XlsxBook> {
    let cursor = Cursor::new(data);
    let mut archive = ZipArchive::new(cursor)?;

    // Parse workbook relationships first to get actual file paths
    let relationships = parse_workbook_relationships(&mut archive);

    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());
    let styles = parse_stylesheet(&mut archive, relationships.styles.as_deref());
    log::debug!(
        "{} shared strings, {} cell formats",
        shared_strings.len(),
        styles.len()
    );

    let (sheet_info, date1904) = get_sheet_info(&mut archive, &relationships.worksheets)?;

    let ctx = SheetContext {
        shared_strings: &shared_strings,
        styles: &styles,
        date1904,
        include_styles: options.include_styles,
    };

    let mut sheets = Vec::with_capacity(sheet_info.len());
    for info in &sheet_info {
        if options
            .sheet_name
            .as_deref()
            .is_some_and(|name| name != info.name)
        {
            continue;
        }
        if archive.by_name(&info.path).is_err() {
            log::warn!("worksheet part {} for {} is missing", info.path, info.name);
            continue;
        }

        let mut sheet = parse_sheet(&mut archive, info, &ctx)?;

        if let Some(comments_path) = get_comments_path(&mut archive, &info.path) {
            for (pos, text) in parse_comments(&mut archive, &comments_path) {
                sheet.range = widen_range(sheet.range.take(), pos);
                sheet
                    .cells
                    .entry(pos.to_a1())
                    .or_insert_with(|| XlsxCell {
                        t: XlsxCellType::Blank,
                        ..XlsxCell::default()
                    })
                    .c
                    .push(text);
            }
        }

        sheets.push(sheet);
    }

    Ok(XlsxBook {
        title: parse_core_title(&mut archive),
        sheets,
    })
}
