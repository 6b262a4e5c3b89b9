//! Highlight and field records
//!
//! Both are supplied externally (usually from a JSON fixture) and stay
//! read-only for the lifetime of a viewing session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Overlay color used when a highlight does not carry its own.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "rgba(99, 102, 241, 0.3)";

/// A rectangle on a document page that a field was extracted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    /// Page number (1-indexed)
    pub page: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Coordinates are fractions of the page size unless this is `Some(false)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<bool>,
}

impl Highlight {
    /// Normalized highlight with no optional attributes set.
    pub fn new(id: impl Into<String>, page: usize, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            page,
            x,
            y,
            width,
            height,
            text: None,
            label: None,
            color: None,
            normalized: None,
        }
    }

    /// Same highlight, with coordinates interpreted as page pixels.
    #[must_use]
    pub fn in_pixels(mut self) -> Self {
        self.normalized = Some(false);
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Absent `normalized` means normalized.
    pub fn is_normalized(&self) -> bool {
        self.normalized != Some(false)
    }

    /// Text to print inside the overlay, if any.
    pub fn caption(&self) -> Option<&str> {
        self.label.as_deref().or(self.text.as_deref())
    }
}

/// Extracted value of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FieldValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A value extracted from the document, linked to the highlight it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub value: Option<FieldValue>,
    /// Id of the linked [`Highlight`]; not checked against the highlight list
    #[serde(rename = "highlightId")]
    pub highlight_id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Field {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        value: Option<FieldValue>,
        highlight_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value,
            highlight_id: highlight_id.into(),
            kind: None,
            group: None,
        }
    }

    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Value as shown in the data panel; missing values render as an em dash.
    pub fn display_value(&self) -> String {
        match &self.value {
            Some(value) => value.to_string(),
            None => "—".to_string(),
        }
    }

    /// Group name, treating an empty string as no group.
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref().filter(|g| !g.is_empty())
    }
}
