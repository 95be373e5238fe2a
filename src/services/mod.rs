//! Service layer for building and querying the model.
//!
//! This module contains the builders that turn host data into models and the
//! session that caches them for the UI.

pub mod backend;
pub mod key_layout;
pub mod registry;
pub mod session;

// Re-export commonly used types and functions
pub use backend::{BackendRegistry, KeyboardBackend, TextBackend, TEXT_BACKEND};
pub use key_layout::{decode_groups, resolve_key, GeometrySource, KeyInsertionRule, KeyLayoutBuilder};
pub use registry::{
    find_layouts_index, merge_layouts, partition, plan_default_layout_switch, plan_layout_switch, LayoutCatalog,
    LayoutRecord, LayoutRegistryBuilder, LayoutRegistrySource, LayoutSelection, LayoutSwitch, Partition,
    SelectionError,
};
pub use session::{InputPadSession, PadsUnavailable};
