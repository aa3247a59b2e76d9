//! Sheet shape exchanged with the grid engine.
//!
//! Field names follow the engine's JSON contract, so most of them are short
//! codes (`bl` for bold, `ht` for horizontal alignment, ...).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar stored in an engine cell's `v`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum EngineValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Engine cell format descriptor (`ct`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CellFormat {
    /// Number format pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fa: Option<String>,
    /// Value type marker; `"d"` for temporal values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

/// Temporal marker in [`CellFormat::t`].
pub const DATE_TYPE: &str = "d";

/// Comment box (`ps`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineComment {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub value: String,
    #[serde(default)]
    pub is_show: bool,
}

impl EngineComment {
    pub fn hidden(value: &str) -> Self {
        Self {
            left: None,
            top: None,
            width: None,
            height: None,
            value: value.to_string(),
            is_show: false,
        }
    }
}

/// One engine cell. Every field is optional; absent fields are omitted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct EngineCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<EngineValue>,
    /// Display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<String>,
    /// Formula without its leading `=`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bl: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub it: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub un: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cl: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
    /// Horizontal alignment: center=0, left=1, right=2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ht: Option<u8>,
    /// Vertical alignment: middle=0, top=1, bottom=2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vt: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ct: Option<CellFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ps: Option<EngineComment>,
}

impl EngineCell {
    pub fn is_temporal(&self) -> bool {
        self.ct
            .as_ref()
            .and_then(|ct| ct.t.as_deref())
            .is_some_and(|t| t == DATE_TYPE)
    }
}

/// One `{r, c, v}` entry of a flat positional cell list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Positioned<T> {
    pub r: u32,
    pub c: u32,
    #[serde(default)]
    pub v: Option<T>,
}

/// One entry of `celldata`.
pub type PositionedCell = Positioned<EngineCell>;

/// Merge entry keyed by `"row_col"` in [`EngineConfig::merge`].
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MergeSpan {
    pub r: u32,
    pub c: u32,
    pub rs: u32,
    pub cs: u32,
}

/// Border edge in `borderInfo`. `style`: thin=1, medium=2, thick=3, dashed=4, dotted=5.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BorderSide {
    pub style: u8,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BorderCell {
    pub row_index: u32,
    pub col_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<BorderSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<BorderSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<BorderSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<BorderSide>,
}

/// Range type for per-cell border entries.
pub const BORDER_RANGE_CELL: &str = "cell";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BorderInfo {
    pub range_type: String,
    pub value: BorderCell,
}

/// Sheet-level config. Empty maps are omitted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<BTreeMap<String, MergeSpan>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowlen: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columnlen: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_info: Option<Vec<BorderInfo>>,
}

impl EngineConfig {
    pub fn is_empty(&self) -> bool {
        self.merge.is_none()
            && self.rowlen.is_none()
            && self.columnlen.is_none()
            && self.border_info.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FrozenKind {
    None,
    Row,
    Column,
    Both,
    RangeRow,
    RangeColumn,
    RangeBoth,
    #[serde(other)]
    Other,
}

impl FrozenKind {
    pub fn freezes_rows(self) -> bool {
        matches!(
            self,
            Self::Row | Self::Both | Self::RangeRow | Self::RangeBoth
        )
    }

    pub fn freezes_cols(self) -> bool {
        matches!(
            self,
            Self::Column | Self::Both | Self::RangeColumn | Self::RangeBoth
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrozenRange {
    #[serde(default)]
    pub row_focus: u32,
    #[serde(default)]
    pub column_focus: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FrozenDescriptor {
    #[serde(rename = "type")]
    pub kind: FrozenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<FrozenRange>,
}

/// Sheet status flag values.
pub const STATUS_ACTIVE: u8 = 1;
pub const STATUS_INACTIVE: u8 = 0;

/// A sheet in engine form.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct EngineSheet {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub status: u8,
    /// Dense matrix; `None` slots are the explicit empty marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Vec<Option<EngineCell>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub celldata: Option<Vec<PositionedCell>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EngineConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen: Option<FrozenDescriptor>,
}

impl EngineSheet {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_frozen_kind_names() {
        let d: FrozenDescriptor = serde_json::from_str(
            r#"{"type":"rangeBoth","range":{"row_focus":2,"column_focus":1}}"#,
        )
        .unwrap();
        assert_eq!(d.kind, FrozenKind::RangeBoth);
        assert_eq!(d.range.unwrap().row_focus, 2);

        let other: FrozenDescriptor = serde_json::from_str(r#"{"type":"cancel"}"#).unwrap();
        assert_eq!(other.kind, FrozenKind::Other);
        assert!(!other.kind.freezes_rows());
    }

    #[test]
    fn test_null_slots_serialize_as_null() {
        let sheet = EngineSheet {
            name: "S".into(),
            data: Some(vec![vec![None, Some(EngineCell::default())]]),
            ..EngineSheet::default()
        };
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json["data"][0][0], serde_json::Value::Null);
        assert_eq!(json["data"][0][1], serde_json::json!({}));
        assert!(json.get("config").is_none());
    }

    #[test]
    fn test_comment_box_keeps_null_geometry() {
        let json = serde_json::to_value(EngineComment::hidden("note")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "left": null, "top": null, "width": null, "height": null,
                "value": "note", "isShow": false
            })
        );
    }
}
