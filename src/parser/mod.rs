//! Parsing for the file formats the model is loaded from.
//!
//! This module reads pad definition XML, xkeyboard-config registry XML,
//! JSON geometry dumps and the XKB rules names property.

pub mod geometry_json;
pub mod pad;
pub mod registry_xml;
pub mod rules_names;

// Re-export commonly used types and functions
pub use geometry_json::{parse_geometry_json, GeometryDump, JsonGeometrySource, KeymapEntry};
pub use pad::{
    collect_pad_files, compare_pad_paths, list_pad_files, system_pad_dir, user_pad_dir, PadError, PadParser,
    PadSyntaxError,
};
pub use registry_xml::{parse_registry_file, parse_registry_str, XkbRegistry};
pub use rules_names::RulesNames;
