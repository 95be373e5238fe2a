//! JSON keyboard description loader.
//!
//! Hosts that can export their XKB state write a dump like:
//!
//! ```json
//! {
//!   "active_group": 0,
//!   "sections": [{ "name": "Alpha", "rows": [{ "keys": [{ "name": "AE01" }] }] }],
//!   "keymap": [{ "name": "AE01", "keycode": 10, "group_widths": [2], "keysyms": [49, 33] }]
//! }
//! ```
//!
//! The loaded dump implements [`GeometrySource`], so it can be fed straight to
//! the key layout builder.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::models::{GeometrySection, Keycode, Keysym};
use crate::services::GeometrySource;

/// Keysym data for one keycode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeymapEntry {
    /// XKB key name
    pub name: String,
    /// Hardware keycode
    pub keycode: Keycode,
    /// Shift levels per group
    #[serde(default)]
    pub group_widths: Vec<usize>,
    /// Flat keysym stream
    #[serde(default)]
    pub keysyms: Vec<Keysym>,
}

/// On-disk geometry dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeometryDump {
    /// Group active when the dump was taken
    #[serde(default)]
    pub active_group: usize,
    /// Geometry tree
    #[serde(default)]
    pub sections: Vec<GeometrySection>,
    /// Keycode table
    #[serde(default)]
    pub keymap: Vec<KeymapEntry>,
}

/// A [`GeometryDump`] indexed for lookups.
#[derive(Debug, Clone)]
pub struct JsonGeometrySource {
    dump: GeometryDump,
    by_name: HashMap<String, usize>,
    by_code: HashMap<Keycode, usize>,
}

impl JsonGeometrySource {
    /// Indexes a dump. For duplicate names or keycodes the first entry wins.
    #[must_use]
    pub fn from_dump(dump: GeometryDump) -> Self {
        let mut by_name = HashMap::new();
        let mut by_code = HashMap::new();
        for (idx, entry) in dump.keymap.iter().enumerate() {
            by_name.entry(entry.name.clone()).or_insert(idx);
            by_code.entry(entry.keycode).or_insert(idx);
        }
        Self {
            dump,
            by_name,
            by_code,
        }
    }

    /// Parses a dump from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let dump: GeometryDump =
            serde_json::from_str(content).context("Failed to parse geometry JSON")?;
        Ok(Self::from_dump(dump))
    }

    /// The underlying dump.
    #[must_use]
    pub const fn dump(&self) -> &GeometryDump {
        &self.dump
    }

    fn entry(&self, keycode: Keycode) -> Option<&KeymapEntry> {
        self.by_code.get(&keycode).map(|&idx| &self.dump.keymap[idx])
    }
}

/// Loads a geometry dump from disk.
///
/// # Arguments
///
/// * `path` - Path to the JSON file
///
/// # Returns
///
/// The indexed source
pub fn parse_geometry_json(path: &Path) -> Result<JsonGeometrySource> {
    let content = fs::read_to_string(path)
        .context(format!("Failed to read geometry file: {}", path.display()))?;

    let dump: GeometryDump = serde_json::from_str(&content)
        .context(format!("Failed to parse geometry file: {}", path.display()))?;

    Ok(JsonGeometrySource::from_dump(dump))
}

impl GeometrySource for JsonGeometrySource {
    fn sections(&self) -> &[GeometrySection] {
        &self.dump.sections
    }

    fn resolve_keycode(&self, name: &str) -> Keycode {
        self.by_name
            .get(name)
            .map_or(0, |&idx| self.dump.keymap[idx].keycode)
    }

    fn keysyms(&self, keycode: Keycode) -> &[Keysym] {
        self.entry(keycode).map_or(&[][..], |entry| entry.keysyms.as_slice())
    }

    fn group_count(&self, keycode: Keycode) -> usize {
        self.entry(keycode).map_or(0, |entry| entry.group_widths.len())
    }

    fn group_width(&self, keycode: Keycode, group: usize) -> usize {
        self.entry(keycode)
            .and_then(|entry| entry.group_widths.get(group).copied())
            .unwrap_or(0)
    }

    fn active_group(&self) -> usize {
        self.dump.active_group
    }
}
