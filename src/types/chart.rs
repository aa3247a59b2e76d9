use serde::{Deserialize, Serialize};

/// Type of chart
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Column,
    Line,
    Pie,
    Doughnut,
    Scatter,
    Area,
}

/// Chart placeholder carried on a sheet. Nothing renders it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub id: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    /// Normalized range reference, e.g. `"A1:B10"`.
    pub data_range: String,
    /// Anchor offset in pixels.
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_chart_width")]
    pub width: f64,
    #[serde(default = "default_chart_height")]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

pub(crate) fn default_chart_width() -> f64 {
    400.0
}

pub(crate) fn default_chart_height() -> f64 {
    300.0
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct ChartPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ChartSize {
    pub width: f64,
    pub height: f64,
}

/// What to place when inserting a chart; the id is assigned on insert.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    /// Letter-number range such as `"A1:B5"`.
    pub data_range: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: Option<ChartPosition>,
    #[serde(default)]
    pub size: Option<ChartSize>,
}

impl ChartSpec {
    pub fn into_chart(self, id: String) -> Chart {
        let position = self.position.unwrap_or_default();
        let size = self.size.unwrap_or(ChartSize {
            width: default_chart_width(),
            height: default_chart_height(),
        });
        Chart {
            id,
            chart_type: self.chart_type,
            data_range: self.data_range,
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
            title: self.title,
        }
    }
}
