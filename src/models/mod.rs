//! Data models for the keyboard, pad tables and layout registry.
//!
//! Models are plain data independent of any host toolkit. Building them is
//! the job of `parser` and `services`.

pub mod geometry;
pub mod key_layout;
pub mod keysym;
pub mod pad;
pub mod registry;

// Re-export all model types
pub use geometry::{GeometryKey, GeometryRow, GeometrySection};
pub use key_layout::{Key, KeyLayout, KeyboardPart, Keycode, Keysym, Row, NO_SYMBOL};
pub use keysym::{display_name, keysym_name, keysym_to_char};
pub use pad::{decode_char_cell, PadCommand, PadGroup, PadString, PadTable, TableKind, TablePayload};
pub use registry::{
    parse_options, ActiveSelection, LayoutEntry, LayoutVariant, OptionEntry, OptionGroupEntry, VariantEntry,
};
