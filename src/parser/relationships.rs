//! Package-level parts: workbook relationships, sheet list, shared strings,
//! stylesheet, sheet relationships and document properties.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::Result;
use crate::xml_helpers::{attr_bool, attr_string, attr_string_local, decode_xstring};

use super::styles::{parse_styles, StyleTable};

/// Workbook relationships parsed from xl/_rels/workbook.xml.rels
///
/// Paths are resolved relative to the xl/ directory and stored as full paths.
#[derive(Default, Debug)]
pub(super) struct WorkbookRelationships {
    /// Map of rId -> full path for worksheet relationships
    /// e.g., "rId1" -> "xl/worksheets/sheet1.xml"
    pub worksheets: HashMap<String, String>,
    pub shared_strings: Option<String>,
    pub styles: Option<String>,
}

/// One `<sheet>` entry of xl/workbook.xml.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Parse workbook relationships from xl/_rels/workbook.xml.rels
pub(super) fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> WorkbookRelationships {
    let mut rels = WorkbookRelationships::default();

    let Ok(file) = archive.by_name("xl/_rels/workbook.xml.rels") else {
        return rels; // Relationships file is optional
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let id = attr_string(e, b"Id").unwrap_or_default();
                    let target = attr_string(e, b"Target").unwrap_or_default();
                    let rel_type = attr_string(e, b"Type").unwrap_or_default();

                    // Resolve target path relative to xl/
                    let full_path = if let Some(stripped) = target.strip_prefix('/') {
                        stripped.to_string()
                    } else {
                        format!("xl/{target}")
                    };

                    if rel_type.ends_with("/worksheet") && !id.is_empty() && !target.is_empty() {
                        rels.worksheets.insert(id, full_path);
                    } else if rel_type.ends_with("/sharedStrings") {
                        rels.shared_strings = Some(full_path);
                    } else if rel_type.ends_with("/styles") {
                        rels.styles = Some(full_path);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// Get sheet names and paths from xl/workbook.xml, plus the date1904 flag.
pub(super) fn get_sheet_info<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    relationships: &HashMap<String, String>,
) -> Result<(Vec<SheetInfo>, bool)> {
    let file = archive.by_name("xl/workbook.xml")?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut sheets = Vec::new();
    let mut date1904 = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    date1904 = attr_bool(e, b"date1904").unwrap_or(false);
                }
                b"sheet" => {
                    let name = attr_string(e, b"name").unwrap_or_default();
                    let r_id = attr_string_local(e, b"id").unwrap_or_default();
                    if !name.is_empty() {
                        // Try to get path from relationships, fallback to default
                        let path = relationships.get(&r_id).cloned().unwrap_or_else(|| {
                            let idx = sheets.len() + 1;
                            format!("xl/worksheets/sheet{idx}.xml")
                        });
                        sheets.push(SheetInfo { name, path });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, date1904))
}

/// Parse shared strings. Rich-text runs are concatenated; phonetic runs are skipped.
pub(super) fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<String> {
    let sst_path = path.unwrap_or("xl/sharedStrings.xml");
    let Ok(file) = archive.by_name(sst_path) else {
        return Vec::new(); // SharedStrings is optional
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current_string = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current_string.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                // <si/> is an empty string and still takes an index
                if e.local_name().as_ref() == b"si" {
                    strings.push(String::new());
                }
            }
            Ok(Event::Text(ref e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current_string.push_str(&decode_xstring(&text));
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current_string));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    strings
}

/// Parse the stylesheet; a missing part means every cell is unstyled.
pub(super) fn parse_stylesheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> StyleTable {
    let styles_path = path.unwrap_or("xl/styles.xml");
    let Ok(file) = archive.by_name(styles_path) else {
        return StyleTable::default();
    };
    parse_styles(BufReader::new(file))
}

/// Find the comments part of a sheet through its relationship file.
///
/// ```xml
/// <Relationships>
///   <Relationship Id="rId1"
///     Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments"
///     Target="../comments1.xml"/>
/// </Relationships>
/// ```
pub(super) fn get_comments_path<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet_path: &str,
) -> Option<String> {
    // "xl/worksheets/sheet1.xml" -> "xl/worksheets/_rels/sheet1.xml.rels"
    let (sheet_dir, sheet_file) = match sheet_path.rfind('/') {
        Some(pos) => sheet_path.split_at(pos + 1),
        None => ("", sheet_path),
    };
    let rels_path = format!("{sheet_dir}_rels/{sheet_file}.rels");

    let Ok(file) = archive.by_name(&rels_path) else {
        return None;
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let target = attr_string(e, b"Target").unwrap_or_default();
                    let rel_type = attr_string(e, b"Type").unwrap_or_default();
                    if rel_type.ends_with("/comments") && !target.is_empty() {
                        return Some(resolve_relative_path(sheet_dir, &target));
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    None
}

/// Resolve a relative path from a base directory
pub(super) fn resolve_relative_path(base_dir: &str, relative: &str) -> String {
    if let Some(stripped) = relative.strip_prefix('/') {
        stripped.to_string()
    } else if let Some(stripped) = relative.strip_prefix("../") {
        let trimmed = base_dir.trim_end_matches('/');
        let parent = match trimmed.rfind('/') {
            Some(pos) => trimmed.split_at(pos + 1).0,
            None => "",
        };
        resolve_relative_path(parent, stripped)
    } else if let Some(stripped) = relative.strip_prefix("./") {
        resolve_relative_path(base_dir, stripped)
    } else {
        format!("{base_dir}{relative}")
    }
}

/// `dc:title` from docProps/core.xml, if present and non-blank.
pub(super) fn parse_core_title<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let file = archive.by_name("docProps/core.xml").ok()?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut buf = Vec::new();
    let mut in_title = false;
    let mut title = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"title" => in_title = true,
            Ok(Event::Text(ref e)) if in_title => {
                if let Ok(text) = e.unescape() {
                    title.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"title" => break,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    let title = title.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
