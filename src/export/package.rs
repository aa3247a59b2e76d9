//! Package-level parts: content types, relationships, workbook and
//! document properties.

use std::fmt::Write as _;

use crate::xml_helpers::xml_escape;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Part names of one written sheet.
#[derive(Debug, Clone)]
pub(crate) struct SheetParts {
    /// 1-based part number, e.g. `1` for xl/worksheets/sheet1.xml.
    pub number: usize,
    pub name: String,
    pub has_comments: bool,
}

pub(crate) fn content_types_xml(sheets: &[SheetParts]) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(XML_DECL);
    out.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    out.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    out.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    if sheets.iter().any(|s| s.has_comments) {
        out.push_str(
            r#"<Default Extension="vml" ContentType="application/vnd.openxmlformats-officedocument.vmlDrawing"/>"#,
        );
    }
    out.push_str(
        r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for sheet in sheets {
        let _ = write!(
            out,
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            sheet.number
        );
        if sheet.has_comments {
            let _ = write!(
                out,
                r#"<Override PartName="/xl/comments{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml"/>"#,
                sheet.number
            );
        }
    }
    out.push_str(
        r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );
    out.push_str(
        r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
    );
    out.push_str("</Types>");
    out
}

pub(crate) fn root_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#
    )
}

pub(crate) fn core_xml(title: Option<&str>) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(XML_DECL);
    out.push_str(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    );
    if let Some(title) = title {
        let _ = write!(out, "<dc:title>{}</dc:title>", xml_escape(title));
    }
    out.push_str("</cp:coreProperties>");
    out
}

/// Workbook part; the first sheet is the selected tab.
pub(crate) fn workbook_xml(sheets: &[SheetParts]) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(XML_DECL);
    let _ = write!(
        out,
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{REL_NS}">"#
    );
    out.push_str(r#"<workbookPr/><bookViews><workbookView activeTab="0"/></bookViews><sheets>"#);
    for sheet in sheets {
        let _ = write!(
            out,
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            xml_escape(&sheet.name),
            sheet.number,
            sheet.number
        );
    }
    out.push_str("</sheets></workbook>");
    out
}

/// Workbook relationships: one per sheet, then styles.
pub(crate) fn workbook_rels_xml(sheets: &[SheetParts]) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(XML_DECL);
    out.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for sheet in sheets {
        let _ = write!(
            out,
            r#"<Relationship Id="rId{n}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{n}.xml"/>"#,
            n = sheet.number
        );
    }
    let _ = write!(
        out,
        r#"<Relationship Id="rId{}" Type="{REL_NS}/styles" Target="styles.xml"/>"#,
        sheets.len() + 1
    );
    out.push_str("</Relationships>");
    out
}

/// Relationships of a sheet that has comments.
pub(crate) fn sheet_rels_xml(number: usize) -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/comments" Target="../comments{number}.xml"/><Relationship Id="rId2" Type="{REL_NS}/vmlDrawing" Target="../drawings/vmlDrawing{number}.vml"/></Relationships>"#
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_workbook_parts() {
        let sheets = vec![
            SheetParts {
                number: 1,
                name: "Q1 & Q2".into(),
                has_comments: false,
            },
            SheetParts {
                number: 2,
                name: "Notes".into(),
                has_comments: true,
            },
        ];
        let workbook = workbook_xml(&sheets);
        assert!(workbook.contains(r#"<sheet name="Q1 &amp; Q2" sheetId="1" r:id="rId1"/>"#));
        let rels = workbook_rels_xml(&sheets);
        assert!(rels.contains(r#"Id="rId3""#));
        let types = content_types_xml(&sheets);
        assert!(types.contains("/xl/comments2.xml"));
        assert!(!types.contains("/xl/comments1.xml"));
        assert!(core_xml(Some("Budget")).contains("<dc:title>Budget</dc:title>"));
        assert!(!core_xml(None).contains("dc:title>"));
    }
}
