//! Pad groups and tables loaded from pad definition files.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TABLE_COLUMN;

/// The four table kinds a pad file can define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    /// Code points written as hex, one button per code point
    Chars,
    /// Keysym names, one button per keysym
    Keysyms,
    /// Arbitrary strings with optional comment and raw text
    Strings,
    /// Shell commands
    Commands,
}

impl TableKind {
    /// Element name used in pad files.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Chars => "chars",
            Self::Keysyms => "keys",
            Self::Strings => "string",
            Self::Commands => "command",
        }
    }
}

/// One `<string>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadString {
    /// Button label, also the text sent when `rawtext` is absent
    pub label: String,
    /// Tooltip text
    pub comment: Option<String>,
    /// Text sent instead of the label
    pub rawtext: Option<String>,
}

impl PadString {
    /// Text to send when the entry is activated.
    #[must_use]
    pub fn text(&self) -> &str {
        self.rawtext.as_deref().unwrap_or(&self.label)
    }
}

/// One `<command>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadCommand {
    /// Button label; the command line is shown when absent
    pub label: Option<String>,
    /// Shell command line
    pub execl: String,
}

impl PadCommand {
    /// Label to display on the button.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.execl)
    }
}

/// Kind-specific table content.
///
/// The payload carries the kind, so a table can never have a kind without
/// data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TablePayload {
    /// Whitespace-delimited hex code points
    Chars(String),
    /// Whitespace-delimited keysym names
    Keysyms(String),
    /// String entries in document order
    Strings(Vec<PadString>),
    /// Command entries in document order
    Commands(Vec<PadCommand>),
}

impl TablePayload {
    /// Kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> TableKind {
        match self {
            Self::Chars(_) => TableKind::Chars,
            Self::Keysyms(_) => TableKind::Keysyms,
            Self::Strings(_) => TableKind::Strings,
            Self::Commands(_) => TableKind::Commands,
        }
    }

    /// Number of buttons the payload renders to.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Chars(blob) | Self::Keysyms(blob) => blob.split_whitespace().count(),
            Self::Strings(strs) => strs.len(),
            Self::Commands(cmds) => cmds.len(),
        }
    }

    /// Returns true if the payload renders no buttons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named table of buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadTable {
    /// Display name (translated)
    pub name: String,
    /// Buttons per rendered row (always positive)
    pub column: usize,
    /// Table content
    pub payload: TablePayload,
}

impl PadTable {
    /// Creates a table with the default column width.
    pub fn new(name: impl Into<String>, payload: TablePayload) -> Self {
        Self {
            name: name.into(),
            column: DEFAULT_TABLE_COLUMN,
            payload,
        }
    }

    /// Kind of this table.
    #[must_use]
    pub const fn kind(&self) -> TableKind {
        self.payload.kind()
    }

    /// Whitespace-separated cells of a chars/keysyms table.
    ///
    /// Strings and commands tables have no blob and yield nothing.
    #[must_use]
    pub fn cells(&self) -> Vec<&str> {
        match &self.payload {
            TablePayload::Chars(blob) | TablePayload::Keysyms(blob) => {
                blob.split_whitespace().collect()
            }
            TablePayload::Strings(_) | TablePayload::Commands(_) => Vec::new(),
        }
    }

    /// Decoded characters of a chars table, skipping cells that are not a
    /// valid code point.
    #[must_use]
    pub fn chars(&self) -> Vec<char> {
        match &self.payload {
            TablePayload::Chars(blob) => blob.split_whitespace().filter_map(decode_char_cell).collect(),
            _ => Vec::new(),
        }
    }

    /// Number of rendered rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.payload.len().div_ceil(self.column.max(1))
    }

    /// (row, col) of the button at `index`.
    #[must_use]
    pub fn grid_position(&self, index: usize) -> (usize, usize) {
        let column = self.column.max(1);
        (index / column, index % column)
    }
}

/// Decodes a chars cell such as `0x3042` or `3042` into a character.
#[must_use]
pub fn decode_char_cell(cell: &str) -> Option<char> {
    let digits = cell
        .strip_prefix("0x")
        .or_else(|| cell.strip_prefix("0X"))
        .unwrap_or(cell);
    u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
}

/// A named group of tables (one notebook page in the UI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadGroup {
    /// Display name (translated)
    pub name: String,
    /// Tables in document order
    pub tables: Vec<PadTable>,
}

impl PadGroup {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Table at ordinal `nth`.
    #[must_use]
    pub fn table(&self, nth: usize) -> Option<&PadTable> {
        self.tables.get(nth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_char_cell() {
        assert_eq!(decode_char_cell("0x41"), Some('A'));
        assert_eq!(decode_char_cell("0X3042"), Some('あ'));
        assert_eq!(decode_char_cell("20ac"), Some('€'));
        assert_eq!(decode_char_cell("zz"), None);
        assert_eq!(decode_char_cell("0xD800"), None);
    }

    #[test]
    fn test_cells_and_grid() {
        let mut table = PadTable::new("Latin", TablePayload::Chars("0x41 0x42\n\t0x43  0x44 0x45".into()));
        table.column = 2;
        assert_eq!(table.cells(), vec!["0x41", "0x42", "0x43", "0x44", "0x45"]);
        assert_eq!(table.chars(), vec!['A', 'B', 'C', 'D', 'E']);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.grid_position(3), (1, 1));
    }

    #[test]
    fn test_strings_table_has_no_cells() {
        let table = PadTable::new(
            "Emoticons",
            TablePayload::Strings(vec![PadString {
                label: ":-)".into(),
                comment: None,
                rawtext: Some("smile".into()),
            }]),
        );
        assert_eq!(table.kind(), TableKind::Strings);
        assert!(table.cells().is_empty());
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_entry_fallbacks() {
        let s = PadString {
            label: "ä".into(),
            comment: None,
            rawtext: None,
        };
        assert_eq!(s.text(), "ä");
        let c = PadCommand {
            label: None,
            execl: "xterm".into(),
        };
        assert_eq!(c.display_label(), "xterm");
    }
}
