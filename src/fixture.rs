//! Loading highlight/field fixtures from JSON

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::geometry::is_valid;
use crate::model::{Field, Highlight};

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Highlights and fields for one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Path of the PDF, relative to the fixture file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Document path resolved against the directory holding the fixture
    pub fn document_path(&self, fixture_path: &Path) -> Option<PathBuf> {
        let document = self.document.as_ref()?;
        if document.is_absolute() {
            return Some(document.clone());
        }
        let base = fixture_path.parent().unwrap_or_else(|| Path::new(""));
        Some(base.join(document))
    }

    /// Collect problems with the data. Nothing here stops the viewer from
    /// running; a field with a dangling reference simply never highlights.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut seen = HashSet::new();

        for highlight in &self.highlights {
            if !is_valid(highlight) || highlight.page == 0 {
                report.invalid_highlights.push(highlight.id.clone());
            }
            if !seen.insert(highlight.id.as_str()) {
                report.duplicate_highlight_ids.push(highlight.id.clone());
            }
        }

        for field in &self.fields {
            if !seen.contains(field.highlight_id.as_str()) {
                report
                    .dangling_fields
                    .push((field.id.clone(), field.highlight_id.clone()));
            }
        }

        report
    }
}

pub fn load_fixture(path: &Path) -> Result<Fixture, FixtureError> {
    let content = fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let fixture = Fixture::from_json(&content).map_err(|source| FixtureError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "Loaded fixture {path:?}: {} highlights, {} fields",
        fixture.highlights.len(),
        fixture.fields.len()
    );
    let report = fixture.validate();
    if !report.is_clean() {
        for line in report.to_string().lines() {
            warn!("{line}");
        }
    }

    Ok(fixture)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Highlights with out-of-range coordinates or page 0
    pub invalid_highlights: Vec<String>,
    pub duplicate_highlight_ids: Vec<String>,
    /// `(field id, highlight id)` for fields pointing at no highlight
    pub dangling_fields: Vec<(String, String)>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.invalid_highlights.is_empty()
            && self.duplicate_highlight_ids.is_empty()
            && self.dangling_fields.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(f, "fixture OK");
        }
        for id in &self.invalid_highlights {
            writeln!(f, "highlight {id}: coordinates out of range")?;
        }
        for id in &self.duplicate_highlight_ids {
            writeln!(f, "highlight {id}: duplicate id")?;
        }
        for (field, highlight) in &self.dangling_fields {
            writeln!(f, "field {field}: no highlight with id {highlight}")?;
        }
        Ok(())
    }
}
