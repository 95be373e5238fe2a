//! Input Pad Library
//!
//! This library provides the data model behind an on-screen input pad: the
//! keyboard built from the host's key geometry, the custom character tables
//! loaded from pad XML files, and the catalog of keyboard layouts, variants
//! and options offered by the layout chooser.

// Module declarations
pub mod config;
pub mod constants;
pub mod i18n;
pub mod models;
pub mod parser;
pub mod services;

pub use config::Config;
pub use services::InputPadSession;
