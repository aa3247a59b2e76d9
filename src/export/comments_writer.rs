//! Comments part and the legacy VML drawing that anchors each note.

use std::fmt::Write as _;

use crate::types::CellPos;
use crate::xml_helpers::xml_escape_text;

const DEFAULT_AUTHOR: &str = "xlgrid";

/// xl/commentsN.xml for `(cell, text)` pairs in row-major order.
pub(crate) fn write_comments_xml(comments: &[(CellPos, String)]) -> String {
    let mut out = String::with_capacity(256 + comments.len() * 96);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push_str(
        r#"<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    let _ = write!(out, "<authors><author>{DEFAULT_AUTHOR}</author></authors>");
    out.push_str("<commentList>");
    for (pos, text) in comments {
        let _ = write!(
            out,
            r#"<comment ref="{}" authorId="0"><text><r><t xml:space="preserve">{}</t></r></text></comment>"#,
            pos.to_a1(),
            xml_escape_text(text)
        );
    }
    out.push_str("</commentList></comments>");
    out
}

/// xl/drawings/vmlDrawingN.vml with one hidden note shape per comment.
pub(crate) fn write_vml_drawing(comments: &[(CellPos, String)]) -> String {
    let mut out = String::with_capacity(512 + comments.len() * 512);
    out.push_str(
        r#"<xml xmlns:v="urn:schemas-microsoft-com:vml" xmlns:o="urn:schemas-microsoft-com:office:office" xmlns:x="urn:schemas-microsoft-com:office:excel">"#,
    );
    out.push_str(
        r#"<o:shapelayout v:ext="edit"><o:idmap v:ext="edit" data="1"/></o:shapelayout>"#,
    );
    out.push_str(
        r#"<v:shapetype id="_x0000_t202" coordsize="21600,21600" o:spt="202" path="m,l,21600r21600,l21600,xe"><v:stroke joinstyle="miter"/><v:path gradientshapeok="t" o:connecttype="rect"/></v:shapetype>"#,
    );
    for (idx, (pos, _)) in comments.iter().enumerate() {
        let _ = write!(
            out,
            concat!(
                r##"<v:shape id="_x0000_s{id}" type="#_x0000_t202" style="position:absolute;visibility:hidden;width:108pt;height:59.25pt" fillcolor="infoBackground [80]">"##,
                r#"<v:fill color2="infoBackground [80]"/><v:shadow on="t" color="black" obscured="t"/><v:path o:connecttype="none"/>"#,
                r#"<x:ClientData ObjectType="Note"><x:MoveWithCells/><x:SizeWithCells/>"#,
                r#"<x:Anchor>{c1}, 15, {r0}, 2, {c3}, 15, {r4}, 16</x:Anchor><x:AutoFill>False</x:AutoFill>"#,
                r#"<x:Row>{row}</x:Row><x:Column>{col}</x:Column></x:ClientData></v:shape>"#
            ),
            id = 1025 + idx,
            c1 = pos.col.saturating_add(1),
            r0 = pos.row,
            c3 = pos.col.saturating_add(3),
            r4 = pos.row.saturating_add(4),
            row = pos.row,
            col = pos.col,
        );
    }
    out.push_str("</xml>");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_xml() {
        let comments = vec![(CellPos::new(1, 2), "a < b".to_string())];
        let xml = write_comments_xml(&comments);
        assert!(xml.contains(r#"<comment ref="C2" authorId="0">"#));
        assert!(xml.contains("a &lt; b"));
        let vml = write_vml_drawing(&comments);
        assert!(vml.contains("<x:Row>1</x:Row><x:Column>2</x:Column>"));
        assert!(vml.contains(r##"<v:shape id="_x0000_s1025" type="#_x0000_t202""##));
    }
}
