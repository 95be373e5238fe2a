//! Builds the Row→Key model from a host geometry description.
//!
//! The builder walks the geometry tree depth-first, resolves each key name to
//! a keycode and decodes the keycode's keysym stream into per-group arrays.
//! Keys the host cannot resolve are skipped; building never fails.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::DEFAULT_INSERTION_RULES;
use crate::models::{GeometryRow, GeometrySection, Key, KeyLayout, Keycode, Keysym, Row, NO_SYMBOL};

/// Host keyboard description the builder reads from.
///
/// Mirrors what XKB exposes: a geometry tree, a name→keycode map and a flat
/// keysym stream per keycode with per-group widths.
pub trait GeometrySource {
    /// Top-level geometry sections in drawing order.
    fn sections(&self) -> &[GeometrySection];

    /// Keycode for a 4-character key name, `0` if unknown.
    fn resolve_keycode(&self, name: &str) -> Keycode;

    /// Flat keysym stream of `keycode`: groups back to back, possibly
    /// separated by `NoSymbol` padding.
    fn keysyms(&self, keycode: Keycode) -> &[Keysym];

    /// Number of keysym groups on `keycode`.
    fn group_count(&self, keycode: Keycode) -> usize;

    /// Number of shift levels in `group` of `keycode`.
    fn group_width(&self, keycode: Keycode, group: usize) -> usize;

    /// Index of the group the host currently has active.
    fn active_group(&self) -> usize {
        0
    }
}

/// Splice a key that the geometry does not list next to an existing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInsertionRule {
    /// Name of the key to add
    pub new_key: String,
    /// Name of the key it goes after
    pub anchor: String,
}

impl KeyInsertionRule {
    /// Creates a rule placing `new_key` after `anchor`.
    pub fn new(new_key: impl Into<String>, anchor: impl Into<String>) -> Self {
        Self {
            new_key: new_key.into(),
            anchor: anchor.into(),
        }
    }

    /// The Japanese keyboard extensions (`AE13` after `AE12`, `AB11` after
    /// `AB10`).
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        DEFAULT_INSERTION_RULES
            .iter()
            .map(|(new_key, anchor)| Self::new(*new_key, *anchor))
            .collect()
    }
}

/// Turns a [`GeometrySource`] into a [`KeyLayout`].
#[derive(Debug, Clone)]
pub struct KeyLayoutBuilder {
    rules: Vec<KeyInsertionRule>,
}

impl Default for KeyLayoutBuilder {
    fn default() -> Self {
        Self::new(KeyInsertionRule::defaults())
    }
}

impl KeyLayoutBuilder {
    /// Creates a builder applying `rules` after traversal.
    #[must_use]
    pub const fn new(rules: Vec<KeyInsertionRule>) -> Self {
        Self { rules }
    }

    /// Insertion rules applied by this builder.
    #[must_use]
    pub fn rules(&self) -> &[KeyInsertionRule] {
        &self.rules
    }

    /// Builds the layout.
    ///
    /// Rows whose keys were all skipped are not emitted.
    pub fn build(&self, source: &dyn GeometrySource) -> KeyLayout {
        let mut rows = Vec::new();
        for section in source.sections() {
            collect_section(source, section, &mut rows);
        }

        let mut layout = KeyLayout::new(rows);
        for rule in &self.rules {
            apply_rule(source, &mut layout, rule);
        }

        debug!(
            "Built key layout: {} rows, {} keys",
            layout.row_count(),
            layout.key_count()
        );
        layout
    }
}

fn collect_section(source: &dyn GeometrySource, section: &GeometrySection, rows: &mut Vec<Row>) {
    for nested in &section.sections {
        collect_section(source, nested, rows);
    }

    for (row_idx, row) in section.rows.iter().enumerate() {
        let keys = collect_row(source, row, row_idx);
        if keys.is_empty() {
            debug!("Dropping empty row {} of section {:?}", row_idx, section.name);
        } else {
            rows.push(Row::new(keys));
        }
    }
}

fn collect_row(source: &dyn GeometrySource, row: &GeometryRow, row_idx: usize) -> Vec<Key> {
    row.keys
        .iter()
        .enumerate()
        .filter_map(|(col_idx, slot)| match slot.name.as_deref() {
            Some(name) => resolve_key(source, name),
            None => {
                warn!("Invalid key name at ({}, {})", row_idx, col_idx);
                None
            }
        })
        .collect()
}

/// Resolves `name` to a [`Key`], or `None` if the host has nothing for it.
pub fn resolve_key(source: &dyn GeometrySource, name: &str) -> Option<Key> {
    let keycode = source.resolve_keycode(name);
    if keycode == 0 {
        warn!("{} is not defined in the keymap", name);
        return None;
    }

    let stream = source.keysyms(keycode);
    if stream.is_empty() {
        debug!("{} is not included in this keyboard", name);
        return None;
    }

    let groups = decode_groups(stream, source.group_count(keycode), |group| {
        source.group_width(keycode, group)
    });
    Some(Key::new(keycode, name, groups))
}

/// Splits a flat keysym stream into groups.
///
/// Each group takes `width(g)` entries; with more than one group, `NoSymbol`
/// padding between groups is skipped. A stream shorter than the declared
/// widths yields short (possibly empty) groups.
pub fn decode_groups(stream: &[Keysym], group_count: usize, width: impl Fn(usize) -> usize) -> Vec<Vec<Keysym>> {
    let mut groups = Vec::with_capacity(group_count);
    let mut bulk = 0;

    for group in 0..group_count {
        let n = width(group);
        let start = bulk.min(stream.len());
        let end = (bulk + n).min(stream.len());
        groups.push(stream[start..end].to_vec());

        bulk += n;
        while group_count > 1 && stream.get(bulk) == Some(&NO_SYMBOL) {
            bulk += 1;
        }
    }
    groups
}

fn apply_rule(source: &dyn GeometrySource, layout: &mut KeyLayout, rule: &KeyInsertionRule) {
    let Some(key) = resolve_key(source, &rule.new_key) else {
        return;
    };
    if !layout.insert_after(&rule.anchor, key) {
        warn!(
            "Cannot insert {}: anchor key {} not found",
            rule.new_key, rule.anchor
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeometryKey;
    use std::collections::HashMap;

    /// In-memory source: name → (keycode, group widths, stream).
    struct FakeSource {
        sections: Vec<GeometrySection>,
        keys: HashMap<String, (Keycode, Vec<usize>, Vec<Keysym>)>,
    }

    impl FakeSource {
        fn new(sections: Vec<GeometrySection>) -> Self {
            Self {
                sections,
                keys: HashMap::new(),
            }
        }

        fn key(mut self, name: &str, keycode: Keycode, widths: Vec<usize>, stream: Vec<Keysym>) -> Self {
            self.keys.insert(name.to_string(), (keycode, widths, stream));
            self
        }

        fn entry(&self, keycode: Keycode) -> Option<&(Keycode, Vec<usize>, Vec<Keysym>)> {
            self.keys.values().find(|(code, _, _)| *code == keycode)
        }
    }

    impl GeometrySource for FakeSource {
        fn sections(&self) -> &[GeometrySection] {
            &self.sections
        }

        fn resolve_keycode(&self, name: &str) -> Keycode {
            self.keys.get(name).map_or(0, |(code, _, _)| *code)
        }

        fn keysyms(&self, keycode: Keycode) -> &[Keysym] {
            self.entry(keycode).map_or(&[][..], |(_, _, stream)| stream.as_slice())
        }

        fn group_count(&self, keycode: Keycode) -> usize {
            self.entry(keycode).map_or(0, |(_, widths, _)| widths.len())
        }

        fn group_width(&self, keycode: Keycode, group: usize) -> usize {
            self.entry(keycode)
                .and_then(|(_, widths, _)| widths.get(group).copied())
                .unwrap_or(0)
        }
    }

    fn alpha_section() -> GeometrySection {
        GeometrySection::new("Alpha")
            .with_row(GeometryRow::from_names(["AE11", "AE12", "BKSP"]))
            .with_row(GeometryRow::from_names(["AB09", "AB10", "RTSH"]))
    }

    fn alpha_source() -> FakeSource {
        FakeSource::new(vec![alpha_section()])
            .key("AE11", 20, vec![2], vec![0x2d, 0x5f])
            .key("AE12", 21, vec![2], vec![0x3d, 0x2b])
            .key("BKSP", 22, vec![1], vec![0xff08])
            .key("AB09", 60, vec![2], vec![0x2e, 0x3e])
            .key("AB10", 61, vec![2], vec![0x2f, 0x3f])
            .key("RTSH", 62, vec![1], vec![0xffe2])
            .key("AE13", 132, vec![2], vec![0x5c, 0x7c])
            .key("AB11", 97, vec![2], vec![0x5c, 0x5f])
    }

    fn names(row: &Row) -> Vec<&str> {
        row.keys.iter().map(|k| k.name.as_str()).collect()
    }

    #[test]
    fn test_default_rules_insert_japanese_keys() {
        let layout = KeyLayoutBuilder::default().build(&alpha_source());
        assert_eq!(layout.row_count(), 2);
        assert_eq!(names(&layout.rows[0]), vec!["AE11", "AE12", "AE13", "BKSP"]);
        assert_eq!(names(&layout.rows[1]), vec!["AB09", "AB10", "AB11", "RTSH"]);
    }

    #[test]
    fn test_no_rules() {
        let layout = KeyLayoutBuilder::new(Vec::new()).build(&alpha_source());
        assert_eq!(layout.key_count(), 6);
    }

    #[test]
    fn test_missing_anchor_drops_rule() {
        let source = FakeSource::new(vec![GeometrySection::new("Alpha")
            .with_row(GeometryRow::from_names(["AE01"]))])
        .key("AE01", 10, vec![2], vec![0x31, 0x21])
        .key("AE13", 132, vec![1], vec![0x5c]);
        let layout = KeyLayoutBuilder::default().build(&source);
        assert_eq!(layout.key_count(), 1);
    }

    #[test]
    fn test_unresolved_keys_are_skipped() {
        let section = GeometrySection::new("Alpha")
            .with_row(GeometryRow {
                keys: vec![
                    GeometryKey::named("AE01"),
                    GeometryKey { name: None },
                    GeometryKey::named("XXXX"),
                    GeometryKey::named("EMPT"),
                    GeometryKey::named("AE02"),
                ],
            });
        let source = FakeSource::new(vec![section])
            .key("AE01", 10, vec![1], vec![0x31])
            .key("AE02", 11, vec![1], vec![0x32])
            .key("EMPT", 200, vec![], vec![]);
        let layout = KeyLayoutBuilder::new(Vec::new()).build(&source);
        assert_eq!(names(&layout.rows[0]), vec!["AE01", "AE02"]);
    }

    #[test]
    fn test_fully_skipped_row_is_omitted() {
        let section = GeometrySection::new("Alpha")
            .with_row(GeometryRow::from_names(["AE01"]))
            .with_row(GeometryRow::from_names(["I120", "I121"]))
            .with_row(GeometryRow::from_names(["AD01"]));
        let source = FakeSource::new(vec![section])
            .key("AE01", 10, vec![1], vec![0x31])
            .key("AD01", 24, vec![1], vec![0x71]);
        let layout = KeyLayoutBuilder::new(Vec::new()).build(&source);
        assert_eq!(layout.row_count(), 2);
        assert_eq!(layout.rows[1].keys[0].name, "AD01");
    }

    #[test]
    fn test_nested_sections_come_first() {
        let section = GeometrySection::new("Alpha")
            .with_row(GeometryRow::from_names(["AD01"]))
            .with_section(GeometrySection::new("Overlay").with_row(GeometryRow::from_names(["AE01"])));
        let source = FakeSource::new(vec![section])
            .key("AE01", 10, vec![1], vec![0x31])
            .key("AD01", 24, vec![1], vec![0x71]);
        let layout = KeyLayoutBuilder::new(Vec::new()).build(&source);
        assert_eq!(layout.rows[0].keys[0].name, "AE01");
        assert_eq!(layout.rows[1].keys[0].name, "AD01");
    }

    #[test]
    fn test_build_is_stable() {
        let source = alpha_source();
        let builder = KeyLayoutBuilder::default();
        assert_eq!(builder.build(&source), builder.build(&source));
    }

    #[test]
    fn test_decode_groups_skips_padding() {
        let stream = [0x61, 0x41, 0, 0, 0x6d1, 0x6f1];
        let groups = decode_groups(&stream, 2, |_| 2);
        assert_eq!(groups, vec![vec![0x61, 0x41], vec![0x6d1, 0x6f1]]);
    }

    #[test]
    fn test_decode_groups_single_group_keeps_zeros() {
        let stream = [0x61, 0];
        let groups = decode_groups(&stream, 1, |_| 2);
        assert_eq!(groups, vec![vec![0x61, 0]]);
    }

    #[test]
    fn test_decode_groups_short_stream() {
        let stream = [0x61, 0x41];
        let groups = decode_groups(&stream, 2, |_| 2);
        assert_eq!(groups, vec![vec![0x61, 0x41], vec![]]);
    }

    #[test]
    fn test_decode_groups_uneven_widths() {
        let stream = [0xff09, 0x61, 0x41, 0xe1, 0xc1];
        let groups = decode_groups(&stream, 2, |g| if g == 0 { 1 } else { 4 });
        assert_eq!(groups, vec![vec![0xff09], vec![0x61, 0x41, 0xe1, 0xc1]]);
    }
}
