//! XLSX export pipeline.
//!
//! Writes a complete package from file-format records: every part is
//! generated fresh, strings are inline and styles are rebuilt into a
//! deduplicated registry.

mod comments_writer;
mod package;
pub(crate) mod sheet_writer;
mod styles_writer;

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::Result;
use crate::types::xlsx::XlsxBook;

use comments_writer::{write_comments_xml, write_vml_drawing};
use package::{
    content_types_xml, core_xml, root_rels_xml, sheet_rels_xml, workbook_rels_xml, workbook_xml,
    SheetParts,
};
use sheet_writer::write_sheet_xml;
use styles_writer::StyleRegistry;

/// Serialize a book to XLSX bytes.
pub fn write_book(book: &XlsxBook) -> Result<Vec<u8>> {
    let mut styles = StyleRegistry::new();
    let mut parts: Vec<SheetParts> = Vec::with_capacity(book.sheets.len());
    let mut entries: Vec<(String, String)> = Vec::new();

    for (idx, sheet) in book.sheets.iter().enumerate() {
        let number = idx + 1;
        let written = write_sheet_xml(sheet, &mut styles);
        entries.push((format!("xl/worksheets/sheet{number}.xml"), written.xml));

        let has_comments = !written.comments.is_empty();
        if has_comments {
            entries.push((
                format!("xl/comments{number}.xml"),
                write_comments_xml(&written.comments),
            ));
            entries.push((
                format!("xl/drawings/vmlDrawing{number}.vml"),
                write_vml_drawing(&written.comments),
            ));
            entries.push((
                format!("xl/worksheets/_rels/sheet{number}.xml.rels"),
                sheet_rels_xml(number),
            ));
        }

        parts.push(SheetParts {
            number,
            name: sheet.name.clone(),
            has_comments,
        });
    }

    let buf: Vec<u8> = Vec::with_capacity(16 * 1024);
    let mut writer = ZipWriter::new(Cursor::new(buf));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let package_parts = [
        ("[Content_Types].xml".to_string(), content_types_xml(&parts)),
        ("_rels/.rels".to_string(), root_rels_xml()),
        ("docProps/core.xml".to_string(), core_xml(book.title.as_deref())),
        ("xl/workbook.xml".to_string(), workbook_xml(&parts)),
        ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels_xml(&parts)),
        ("xl/styles.xml".to_string(), styles.to_xml()),
    ];

    for (name, body) in package_parts.iter().chain(entries.iter()) {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(body.as_bytes())?;
    }

    let cursor = writer.finish()?;
    log::debug!(
        "wrote {} sheets into {} bytes",
        book.sheets.len(),
        cursor.get_ref().len()
    );
    Ok(cursor.into_inner())
}
