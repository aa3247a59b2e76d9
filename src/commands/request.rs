//! Typed command requests, one variant per operation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, XlgridError};
use crate::types::{CellValue, ChartSpec, Style};

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSeed {
    pub name: String,
    #[serde(default)]
    pub data: Option<Vec<Vec<CellValue>>>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sheets: Option<Vec<SheetSeed>>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDataPayload {
    #[serde(default, alias = "sheet")]
    pub sheet_index: Option<usize>,
    #[serde(default)]
    pub range: Option<String>,
}

/// One entry of `sheet.setCells`. `ref` is a cell (`"A1"`) or a range (`"B2:D5"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellWrite {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub value: Option<CellValue>,
    #[serde(default)]
    pub values: Option<Vec<Vec<CellValue>>>,
    /// Formula without the leading `=`.
    #[serde(default)]
    pub formula: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCellsPayload {
    #[serde(default, alias = "sheet")]
    pub sheet_index: Option<usize>,
    pub cells: Vec<CellWrite>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatPayload {
    #[serde(default, alias = "sheet")]
    pub sheet_index: Option<usize>,
    pub range: String,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertChartPayload {
    #[serde(default, alias = "sheet")]
    pub sheet_index: Option<usize>,
    #[serde(flatten)]
    pub chart: ChartSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv",
            Self::Pdf => "application/pdf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default)]
    pub include_styles: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub format: ExportFormat,
    #[serde(default)]
    pub filename: Option<String>,
    /// Sheet written by CSV export; the active sheet when absent.
    #[serde(default, alias = "sheet")]
    pub sheet_index: Option<usize>,
    #[serde(default)]
    pub options: ExportSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSheetPayload {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSheetPayload {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSheetPayload {
    pub index: usize,
    pub name: String,
}

/// A validated command.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Create(CreatePayload),
    GetData(GetDataPayload),
    SetCells(SetCellsPayload),
    Format(FormatPayload),
    InsertChart(InsertChartPayload),
    Export(ExportPayload),
    AddSheet(AddSheetPayload),
    DeleteSheet(DeleteSheetPayload),
    RenameSheet(RenameSheetPayload),
}

/// Every command type the layer answers to.
pub const COMMAND_TYPES: [&str; 9] = [
    "sheet.create",
    "sheet.getData",
    "sheet.setCells",
    "sheet.format",
    "sheet.insertChart",
    "sheet.export",
    "sheet.addSheet",
    "sheet.deleteSheet",
    "sheet.renameSheet",
];

fn payload<T: DeserializeOwned>(value: &Value) -> Result<T> {
    // Commands without a payload read as an empty object
    let value = if value.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        value.clone()
    };
    serde_json::from_value(value).map_err(|e| XlgridError::InvalidPayload(e.to_string()))
}

impl Request {
    pub fn is_known(kind: &str) -> bool {
        COMMAND_TYPES.contains(&kind)
    }

    /// Parse a `(type, payload)` pair.
    pub fn parse(kind: &str, value: &Value) -> Result<Self> {
        Ok(match kind {
            "sheet.create" => Self::Create(payload(value)?),
            "sheet.getData" => Self::GetData(payload(value)?),
            "sheet.setCells" => Self::SetCells(payload(value)?),
            "sheet.format" => Self::Format(payload(value)?),
            "sheet.insertChart" => Self::InsertChart(payload(value)?),
            "sheet.export" => Self::Export(payload(value)?),
            "sheet.addSheet" => Self::AddSheet(payload(value)?),
            "sheet.deleteSheet" => Self::DeleteSheet(payload(value)?),
            "sheet.renameSheet" => Self::RenameSheet(payload(value)?),
            other => return Err(XlgridError::UnknownCommand(other.to_string())),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "sheet.create",
            Self::GetData(_) => "sheet.getData",
            Self::SetCells(_) => "sheet.setCells",
            Self::Format(_) => "sheet.format",
            Self::InsertChart(_) => "sheet.insertChart",
            Self::Export(_) => "sheet.export",
            Self::AddSheet(_) => "sheet.addSheet",
            Self::DeleteSheet(_) => "sheet.deleteSheet",
            Self::RenameSheet(_) => "sheet.renameSheet",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::ChartType;
    use serde_json::json;

    #[test]
    fn test_every_type_parses() {
        let samples = [
            json!({}),
            json!({}),
            json!({"cells": []}),
            json!({"range": "A1", "style": {}}),
            json!({"type": "bar", "dataRange": "A1:B2"}),
            json!({"format": "csv"}),
            json!(null),
            json!({"index": 0}),
            json!({"index": 0, "name": "N"}),
        ];
        for (kind, sample) in COMMAND_TYPES.iter().zip(samples.iter()) {
            let request = Request::parse(kind, sample).unwrap();
            assert_eq!(request.kind(), *kind);
        }
    }

    #[test]
    fn test_sheet_alias_and_ref() {
        let request = Request::parse(
            "sheet.setCells",
            &json!({"sheet": 1, "cells": [{"ref": "B2", "value": 3}, {"ref": "C1", "formula": "B2*2"}]}),
        )
        .unwrap();
        let Request::SetCells(payload) = request else {
            panic!("wrong variant");
        };
        assert_eq!(payload.sheet_index, Some(1));
        assert_eq!(payload.cells[0].reference, "B2");
        assert_eq!(payload.cells[0].value, Some(CellValue::Number(3.0)));
        assert_eq!(payload.cells[1].formula.as_deref(), Some("B2*2"));
    }

    #[test]
    fn test_chart_payload_flattens() {
        let request = Request::parse(
            "sheet.insertChart",
            &json!({"type": "pie", "dataRange": "A1:B3", "title": "Share", "position": {"x": 10, "y": 20}}),
        )
        .unwrap();
        let Request::InsertChart(payload) = request else {
            panic!("wrong variant");
        };
        assert_eq!(payload.chart.chart_type, ChartType::Pie);
        assert_eq!(payload.chart.title.as_deref(), Some("Share"));
        assert!(payload.chart.position.is_some());
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            Request::parse("sheet.fly", &json!({})),
            Err(XlgridError::UnknownCommand(ref k)) if k == "sheet.fly"
        ));
        assert!(matches!(
            Request::parse("sheet.deleteSheet", &json!({"index": "first"})),
            Err(XlgridError::InvalidPayload(_))
        ));
        assert!(matches!(
            Request::parse("sheet.export", &json!({"format": "docx"})),
            Err(XlgridError::InvalidPayload(_))
        ));
        assert!(!Request::is_known("sheet.fly"));
    }
}
