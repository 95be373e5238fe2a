//! Raw keyboard geometry tree as reported by the host.
//!
//! This mirrors the XKB geometry description: sections contain rows of named
//! keys and may nest further sections (overlay doodads). Nothing here is
//! resolved to keycodes yet; see `services::key_layout` for that step.

use serde::{Deserialize, Serialize};

/// One key slot in a geometry row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryKey {
    /// XKB key name ("AE01"); `None` when the geometry carries an unnamed slot
    #[serde(default)]
    pub name: Option<String>,
}

impl GeometryKey {
    /// Creates a named key slot.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// A row of key slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryRow {
    /// Key slots in drawing order
    #[serde(default)]
    pub keys: Vec<GeometryKey>,
}

impl GeometryRow {
    /// Builds a row from key names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: names.into_iter().map(GeometryKey::named).collect(),
        }
    }
}

/// A geometry section, possibly with nested sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometrySection {
    /// Section name ("Alpha", "Editing", "Keypad")
    #[serde(default)]
    pub name: String,
    /// Nested sections, visited before `rows`
    #[serde(default)]
    pub sections: Vec<GeometrySection>,
    /// The section's own rows
    #[serde(default)]
    pub rows: Vec<GeometryRow>,
}

impl GeometrySection {
    /// Creates an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    #[must_use]
    pub fn with_row(mut self, row: GeometryRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Appends a nested section.
    #[must_use]
    pub fn with_section(mut self, section: GeometrySection) -> Self {
        self.sections.push(section);
        self
    }

    /// Total rows in this section and every nested section.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.rows.len() + self.sections.iter().map(Self::total_rows).sum::<usize>()
    }
}
