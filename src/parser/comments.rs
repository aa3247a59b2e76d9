//! Cell comments (notes) parsing.
//!
//! Each sheet can have its own comments part (e.g. xl/comments1.xml), linked
//! through the sheet's relationship file. Authors and run formatting are not
//! kept: a comment is the concatenated text of its runs.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::types::CellPos;
use crate::xml_helpers::decode_xstring;

/// Parse a comments part into `(cell, text)` pairs in document order.
///
/// ```xml
/// <comments>
///   <authors><author>John Doe</author></authors>
///   <commentList>
///     <comment ref="A1" authorId="0">
///       <text><r><t>Comment text</t></r></text>
///     </comment>
///   </commentList>
/// </comments>
/// ```
pub(super) fn parse_comments<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    comments_path: &str,
) -> Vec<(CellPos, String)> {
    let Ok(file) = archive.by_name(comments_path) else {
        log::debug!("comments part {comments_path} not readable");
        return Vec::new();
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut comments = Vec::new();
    let mut buf = Vec::new();

    let mut current_ref: Option<CellPos> = None;
    let mut current_text = String::new();
    let mut in_text = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"comment" => {
                    current_ref = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"ref")
                        .and_then(|a| parse_cell_ref_bytes(&a.value));
                    if current_ref.is_none() {
                        log::warn!("comment without a resolvable cell reference skipped");
                    }
                    current_text.clear();
                }
                b"text" => in_text = true,
                b"rPh" => in_phonetic = true,
                b"t" if in_text && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current_text.push_str(&decode_xstring(&text));
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"comment" => {
                    if let Some(pos) = current_ref.take() {
                        comments.push((pos, std::mem::take(&mut current_text)));
                    }
                }
                b"text" => in_text = false,
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    comments
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    #[test]
    fn test_parse_comments_concatenates_runs() {
        let xml = r#"<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<authors><author>Ann</author></authors>
<commentList>
<comment ref="B2" authorId="0"><text><r><rPr><b/></rPr><t>Ann:</t></r><r><t xml:space="preserve"> check this</t></r></text></comment>
<comment ref="$C$5" authorId="0"><text><t>plain</t></text></comment>
<comment authorId="0"><text><t>orphan</t></text></comment>
</commentList>
</comments>"#;
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("xl/comments1.xml", FileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let comments = parse_comments(&mut archive, "xl/comments1.xml");
        assert_eq!(
            comments,
            vec![
                (CellPos::new(1, 1), "Ann: check this".to_string()),
                (CellPos::new(4, 2), "plain".to_string()),
            ]
        );
        assert!(parse_comments(&mut archive, "xl/missing.xml").is_empty());
    }
}
