//! Shared test fixtures for integration tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use inputpad::config::Config;
use inputpad::models::{GeometryRow, GeometrySection, Keysym, LayoutEntry, OptionGroupEntry, VariantEntry};
use inputpad::parser::{GeometryDump, JsonGeometrySource, KeymapEntry};
use inputpad::services::LayoutRegistrySource;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Pad document with one group holding a single chars table.
///
/// # Arguments
/// * `group` - Group name
/// * `chars` - Chars blob
pub fn pad_xml(group: &str, chars: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<input-pad><pad><group><name>{group}</name>\
         <table><name>{group} table</name><chars>{chars}</chars></table>\
         </group></pad></input-pad>\n"
    )
}

/// Writes `content` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// System and user pad directories in one temp dir.
pub struct PadDirs {
    /// Keeps the directories alive
    pub temp: TempDir,
    /// System pad directory
    pub system: PathBuf,
    /// User pad directory
    pub user: PathBuf,
}

impl PadDirs {
    /// Creates empty system and user directories.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let system = temp.path().join("system");
        let user = temp.path().join("user");
        fs::create_dir_all(&system).unwrap();
        fs::create_dir_all(&user).unwrap();
        Self { temp, system, user }
    }

    /// Config pointing at these directories.
    pub fn config(&self) -> Config {
        let mut config = Config::new();
        config.paths.system_pad_dir = self.system.clone();
        config.paths.user_pad_dir = Some(self.user.clone());
        config
    }
}

fn keymap(name: &str, keycode: u32, widths: Vec<usize>, keysyms: Vec<Keysym>) -> KeymapEntry {
    KeymapEntry {
        name: name.to_string(),
        keycode,
        group_widths: widths,
        keysyms,
    }
}

/// A small JIS-like keyboard: number row, one letter row, bottom row with
/// AB10, a navigation section, and a row of keys the host does not know.
///
/// AE13 and AB11 are present in the keymap but not in the geometry.
pub fn jis_geometry() -> JsonGeometrySource {
    let alpha = GeometrySection::new("Alpha")
        .with_row(GeometryRow::from_names(["TLDE", "AE01", "AE12", "BKSP"]))
        .with_row(GeometryRow::from_names(["AD01", "AD02"]))
        .with_row(GeometryRow::from_names(["I240", "I241"]))
        .with_row(GeometryRow::from_names(["LFSH", "AB10", "RTSH"]));
    let editing = GeometrySection::new("Editing").with_row(GeometryRow::from_names(["INS", "HOME"]));

    JsonGeometrySource::from_dump(GeometryDump {
        active_group: 0,
        sections: vec![alpha, editing],
        keymap: vec![
            keymap("TLDE", 49, vec![2], vec![0xff2a, 0]),
            keymap("AE01", 10, vec![2, 2], vec![0x31, 0x21, 0, 0x4c7, 0x4c7]),
            keymap("AE12", 21, vec![2], vec![0x5e, 0x7e]),
            keymap("AE13", 132, vec![2], vec![0x5c, 0x7c]),
            keymap("BKSP", 22, vec![1], vec![0xff08]),
            keymap("AD01", 24, vec![2, 2], vec![0x71, 0x51, 0x4c0, 0]),
            keymap("AD02", 25, vec![2, 2], vec![0x77, 0x57, 0x4c6, 0]),
            keymap("LFSH", 50, vec![1], vec![0xffe1]),
            keymap("AB10", 61, vec![2], vec![0x2f, 0x3f]),
            keymap("AB11", 97, vec![2], vec![0x5c, 0x5f]),
            keymap("RTSH", 62, vec![1], vec![0xffe2]),
            keymap("INS", 118, vec![1], vec![0xff63]),
            keymap("HOME", 110, vec![1], vec![0xff50]),
        ],
    })
}

/// In-memory registry.
pub struct StaticRegistry {
    /// Layouts in source order
    pub layouts: Vec<LayoutEntry>,
    /// Option groups in source order
    pub option_groups: Vec<OptionGroupEntry>,
}

impl LayoutRegistrySource for StaticRegistry {
    fn layouts(&self) -> &[LayoutEntry] {
        &self.layouts
    }

    fn option_groups(&self) -> &[OptionGroupEntry] {
        &self.option_groups
    }
}

/// Registry with `us`, `jp` (variant `kana`) and `de`.
pub fn three_layout_registry() -> StaticRegistry {
    let mut jp = LayoutEntry::new("jp", Some("Japanese".to_string()));
    jp.variants.push(VariantEntry {
        variant_code: "kana".to_string(),
        description: Some("Japanese (Kana)".to_string()),
    });

    StaticRegistry {
        layouts: vec![
            LayoutEntry::new("us", Some("English (US)".to_string())),
            jp,
            LayoutEntry::new("de", Some("German".to_string())),
        ],
        option_groups: Vec::new(),
    }
}
