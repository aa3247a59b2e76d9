use serde::{Deserialize, Serialize};

use super::is_false;

/// Semantic cell style. Every field is independent and optional.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// `#RRGGBB` or `#RRGGBBAA`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_align: Option<HAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_top: Option<BorderEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_right: Option<BorderEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_bottom: Option<BorderEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_left: Option<BorderEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
}

impl Style {
    /// True when no field is populated.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `Some(self)` unless the style is empty.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    pub fn has_borders(&self) -> bool {
        self.border_top.is_some()
            || self.border_right.is_some()
            || self.border_bottom.is_some()
            || self.border_left.is_some()
    }

    /// Overlay every populated field of `other` onto `self`.
    ///
    /// Flags are only ever switched on; unset fields in `other` keep the
    /// current value.
    #[must_use]
    pub fn merged_with(mut self, other: &Style) -> Self {
        self.bold |= other.bold;
        self.italic |= other.italic;
        self.underline |= other.underline;
        self.strikethrough |= other.strikethrough;
        overlay(&mut self.font_family, &other.font_family);
        if other.font_size.is_some() {
            self.font_size = other.font_size;
        }
        overlay(&mut self.font_color, &other.font_color);
        overlay(&mut self.background_color, &other.background_color);
        if other.horizontal_align.is_some() {
            self.horizontal_align = other.horizontal_align;
        }
        if other.vertical_align.is_some() {
            self.vertical_align = other.vertical_align;
        }
        overlay(&mut self.border_top, &other.border_top);
        overlay(&mut self.border_right, &other.border_right);
        overlay(&mut self.border_bottom, &other.border_bottom);
        overlay(&mut self.border_left, &other.border_left);
        overlay(&mut self.number_format, &other.number_format);
        self
    }
}

fn overlay<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if let Some(value) = source {
        *target = Some(value.clone());
    }
}

/// One border edge.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BorderEdge {
    pub style: BorderKind,
    /// `#RRGGBB`.
    pub color: String,
}

impl BorderEdge {
    pub fn new(style: BorderKind, color: &str) -> Self {
        Self {
            style,
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BorderKind {
    #[default]
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
}

impl BorderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thin => "thin",
            Self::Medium => "medium",
            Self::Thick => "thick",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
        }
    }

    /// Unrecognized kinds fall back to `thin`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "medium" => Self::Medium,
            "thick" => Self::Thick,
            "dashed" => Self::Dashed,
            "dotted" => Self::Dotted,
            _ => Self::Thin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}
