//! Address-keyed records for the XLSX file format.
//!
//! This is the shape the container reader produces and the writer consumes.
//! The codec in [`crate::xlsx`] maps it to and from the sparse model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{is_false, CellRange};

/// Cell type tag.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum XlsxCellType {
    #[serde(rename = "n")]
    Number,
    #[serde(rename = "b")]
    Boolean,
    #[serde(rename = "d")]
    Date,
    #[serde(rename = "s")]
    #[default]
    String,
    /// Blank (style or comment only).
    #[serde(rename = "z")]
    Blank,
    #[serde(rename = "e")]
    Error,
}

/// Raw cell value as stored in the file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum XlsxRawValue {
    Bool(bool),
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct XlsxColor {
    /// `RRGGBB` or `RRGGBBAA`, no `#`.
    pub rgb: String,
}

impl XlsxColor {
    pub fn new(rgb: &str) -> Self {
        Self {
            rgb: rgb.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct XlsxFont {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strike: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sz: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<XlsxColor>,
}

impl XlsxFont {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct XlsxFill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg_color: Option<XlsxColor>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct XlsxAlignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct XlsxBorderEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<XlsxColor>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct XlsxBorder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<XlsxBorderEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<XlsxBorderEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<XlsxBorderEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<XlsxBorderEdge>,
}

impl XlsxBorder {
    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }
}

/// Nested per-cell style block.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct XlsxStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<XlsxFont>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<XlsxFill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<XlsxAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<XlsxBorder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_fmt: Option<String>,
}

impl XlsxStyle {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One address-keyed cell record.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct XlsxCell {
    pub t: XlsxCellType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<XlsxRawValue>,
    /// Formula without a leading `=`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<XlsxStyle>,
    /// Comment fragments, one per comment attached to the cell.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub c: Vec<String>,
}

/// One worksheet's records.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct XlsxSheet {
    pub name: String,
    /// Used-range marker such as `"A1:D4"`; may be absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Letter-number address -> cell.
    #[serde(default)]
    pub cells: BTreeMap<String, XlsxCell>,
    #[serde(default)]
    pub merges: Vec<CellRange>,
    /// Row index -> height in points.
    #[serde(default)]
    pub rows: BTreeMap<u32, f64>,
    /// Column index -> width in pixels.
    #[serde(default)]
    pub cols: BTreeMap<u32, f64>,
    #[serde(default)]
    pub frozen_rows: u32,
    #[serde(default)]
    pub frozen_cols: u32,
}

/// A whole workbook's records.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct XlsxBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub sheets: Vec<XlsxSheet>,
}
