//! Row→Key model built from the host keyboard geometry.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::keysym::display_name;

/// Platform keysym value (X11 keysym space). `0` is `NoSymbol`.
pub type Keysym = u32;

/// Hardware keycode. `0` means the key name could not be resolved.
pub type Keycode = u32;

/// The X11 `NoSymbol` keysym.
pub const NO_SYMBOL: Keysym = 0;

/// A physical key with its keysym groups.
///
/// `groups[g][level]` is the keysym produced at group `g` and shift level
/// `level`. A key is only ever constructed when the host reported at least one
/// symbol for its keycode, but individual groups may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Hardware keycode (never 0)
    pub keycode: Keycode,
    /// XKB key name, e.g. "AE01" or "TLDE"
    pub name: String,
    /// Keysyms per group, each ordered by shift level
    pub groups: Vec<Vec<Keysym>>,
}

impl Key {
    /// Creates a new `Key`.
    pub fn new(keycode: Keycode, name: impl Into<String>, groups: Vec<Vec<Keysym>>) -> Self {
        Self {
            keycode,
            name: name.into(),
            groups,
        }
    }

    /// Number of keysym groups on this key.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Keysym at `group` and shift `level`.
    ///
    /// Returns `None` for a missing group, a missing level, or `NoSymbol`.
    #[must_use]
    pub fn keysym(&self, group: usize, level: usize) -> Option<Keysym> {
        self.groups
            .get(group)
            .and_then(|syms| syms.get(level))
            .copied()
            .filter(|&sym| sym != NO_SYMBOL)
    }

    /// Base (unshifted) keysym for `group`.
    #[must_use]
    pub fn base_keysym(&self, group: usize) -> Option<Keysym> {
        self.keysym(group, 0)
    }

    /// Resolves which group a key should display when `requested` is active.
    ///
    /// Keys that do not have the requested group keep showing `current`.
    #[must_use]
    pub fn effective_group(&self, requested: usize, current: usize) -> usize {
        if requested < self.groups.len() {
            requested
        } else {
            current
        }
    }

    /// Label for `group`, derived from the base keysym.
    #[must_use]
    pub fn label(&self, group: usize) -> Option<String> {
        self.base_keysym(group).and_then(display_name)
    }

    /// Returns true if any group of this key produces `keysym`.
    #[must_use]
    pub fn produces(&self, keysym: Keysym) -> bool {
        keysym != NO_SYMBOL && self.groups.iter().any(|syms| syms.contains(&keysym))
    }
}

/// One keyboard row in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Keys in within-row order
    pub keys: Vec<Key>,
}

impl Row {
    /// Creates a row from its keys.
    #[must_use]
    pub const fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    /// Number of keys in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the row has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index of the first key named `name`.
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.keys.iter().position(|key| key.name == name)
    }
}

/// A contiguous block of rows drawn as one keyboard part.
///
/// The default split puts the main block, navigation cluster and keypad in
/// separate parts so the UI can fold the latter two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardPart {
    /// Row indices belonging to the part
    pub rows: Range<usize>,
    /// Widest row in the part (in keys)
    pub columns: usize,
}

/// Ordered rows produced from one geometry snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLayout {
    /// Rows in section traversal order
    pub rows: Vec<Row>,
}

impl KeyLayout {
    /// Creates a layout from rows.
    #[must_use]
    pub const fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total number of keys across all rows.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    /// Returns true if no row was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Key at (`row`, `col`).
    #[must_use]
    pub fn key(&self, row: usize, col: usize) -> Option<&Key> {
        self.rows.get(row).and_then(|r| r.keys.get(col))
    }

    /// Iterates `(row, col, key)` in row-major order.
    pub fn iter_keys(&self) -> impl Iterator<Item = (usize, usize, &Key)> {
        self.rows.iter().enumerate().flat_map(|(row_idx, row)| {
            row.keys
                .iter()
                .enumerate()
                .map(move |(col_idx, key)| (row_idx, col_idx, key))
        })
    }

    /// Position of the first key named `name`, searching rows in order.
    #[must_use]
    pub fn find_key(&self, name: &str) -> Option<(usize, usize)> {
        self.rows
            .iter()
            .enumerate()
            .find_map(|(row_idx, row)| row.position_of(name).map(|col| (row_idx, col)))
    }

    /// First key whose groups produce `keysym`.
    #[must_use]
    pub fn find_keysym(&self, keysym: Keysym) -> Option<&Key> {
        self.iter_keys()
            .map(|(_, _, key)| key)
            .find(|key| key.produces(keysym))
    }

    /// Splices `key` directly after the first key named `anchor`.
    ///
    /// Returns `false` (and drops `key`) when no such anchor exists.
    pub fn insert_after(&mut self, anchor: &str, key: Key) -> bool {
        match self.find_key(anchor) {
            Some((row, col)) => {
                self.rows[row].keys.insert(col + 1, key);
                true
            }
            None => false,
        }
    }

    /// Largest number of groups on any key.
    #[must_use]
    pub fn max_group_count(&self) -> usize {
        self.iter_keys()
            .map(|(_, _, key)| key.group_count())
            .max()
            .unwrap_or(0)
    }

    /// Group index following `current`, wrapping around.
    #[must_use]
    pub fn next_group(&self, current: usize) -> usize {
        match self.max_group_count() {
            0 => 0,
            n => (current + 1) % n,
        }
    }

    /// Splits rows into keyboard parts starting at the given row indices.
    ///
    /// Start indices beyond the row count produce no part; the first part
    /// always starts at row 0.
    #[must_use]
    pub fn parts(&self, starts: &[usize]) -> Vec<KeyboardPart> {
        let mut bounds: Vec<usize> = starts
            .iter()
            .copied()
            .filter(|&start| start > 0 && start < self.rows.len())
            .collect();
        bounds.sort_unstable();
        bounds.dedup();

        let mut parts = Vec::with_capacity(bounds.len() + 1);
        let mut begin = 0;
        for end in bounds.into_iter().chain(std::iter::once(self.rows.len())) {
            if end <= begin {
                continue;
            }
            let columns = self.rows[begin..end]
                .iter()
                .map(Row::len)
                .max()
                .unwrap_or(0);
            parts.push(KeyboardPart {
                rows: begin..end,
                columns,
            });
            begin = end;
        }
        parts
    }
}
