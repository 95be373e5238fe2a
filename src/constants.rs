//! Crate-wide constants.
//!
//! Default locations and fixed conventions shared by the parsers, the
//! configuration layer and the session model.

/// Directory name used under the user's config directory.
pub const APP_CONFIG_DIR_NAME: &str = "input-pad";

/// System-wide pad definition directory.
pub const PAD_SYSTEM_DIR: &str = "/usr/share/input-pad/pad";

/// Per-user pad directory, relative to the home directory.
pub const USER_PAD_SUBDIR: &str = ".config/input-pad/pad";

/// File extension pad definition files must carry.
pub const PAD_FILE_EXTENSION: &str = "xml";

/// Default buttons per row for a pad table without a column setting.
pub const DEFAULT_TABLE_COLUMN: usize = 15;

/// xkeyboard-config registry file used when nothing else is configured.
pub const DEFAULT_REGISTRY_FILE: &str = "/usr/share/X11/xkb/rules/evdev.xml";

/// Layout description that is always listed first in the catalog.
pub const DEFAULT_LAYOUT_DESCRIPTION: &str = "English (US)";

/// Upper bound of simultaneously active layout groups in XKB.
pub const DEFAULT_MAX_GROUPS: usize = 4;

/// Row indices where the main block, navigation cluster and keypad start.
pub const DEFAULT_PART_START_ROWS: [usize; 3] = [0, 6, 10];

/// Extra keys on Japanese keyboards: (new key, anchor key).
pub const DEFAULT_INSERTION_RULES: [(&str, &str); 2] = [("AE13", "AE12"), ("AB11", "AB10")];
