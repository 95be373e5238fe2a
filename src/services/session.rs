//! Query surface consumed by the input pad UI.
//!
//! [`InputPadSession`] lazily builds the keyboard model and the pad catalog,
//! caches them until invalidated, and owns the layout registry selection.
//! Rebuilds replace the cached model wholesale.

use anyhow::{bail, Context, Result};
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::i18n::{IdentityTranslator, Translator};
use crate::models::{
    ActiveSelection, Key, KeyLayout, KeyboardPart, Keysym, LayoutVariant, PadGroup, PadTable,
};
use crate::parser::{parse_geometry_json, parse_registry_file, PadParser};
use crate::services::backend::BackendRegistry;
use crate::services::key_layout::{GeometrySource, KeyLayoutBuilder};
use crate::services::registry::{
    plan_layout_switch, LayoutCatalog, LayoutRecord, LayoutRegistryBuilder, LayoutRegistrySource,
    LayoutSelection, LayoutSwitch, SelectionError,
};

/// Pad definitions could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("custom characters unavailable: {message}")]
pub struct PadsUnavailable {
    /// Why loading failed
    pub message: String,
}

#[derive(Debug)]
enum PadState {
    NotLoaded,
    Loaded(Vec<PadGroup>),
    Unavailable(PadsUnavailable),
}

/// Lazily built keyboard and pad model for one UI session.
pub struct InputPadSession {
    config: Config,
    translator: Box<dyn Translator>,
    geometry: Option<Box<dyn GeometrySource>>,
    key_layout: Option<KeyLayout>,
    current_group: usize,
    pads: PadState,
    catalog: Option<LayoutCatalog>,
    selection: Option<LayoutSelection>,
    group_layouts: Vec<LayoutVariant>,
    backends: BackendRegistry,
    generation: u64,
}

impl InputPadSession {
    /// Creates a session that leaves pad text untranslated.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_translator(config, Box::new(IdentityTranslator))
    }

    /// Creates a session translating pad text with `translator`.
    #[must_use]
    pub fn with_translator(config: Config, translator: Box<dyn Translator>) -> Self {
        let mut backends = BackendRegistry::new();
        if let Err(err) = backends.select(&config.keyboard.backend) {
            warn!("{}; using the default backend", err);
        }

        Self {
            config,
            translator,
            geometry: None,
            key_layout: None,
            current_group: 0,
            pads: PadState::NotLoaded,
            catalog: None,
            selection: None,
            group_layouts: Vec::new(),
            backends,
            generation: 0,
        }
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Bumped every time a model is built.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the geometry source and drops the cached keyboard.
    ///
    /// The source's active group becomes current, and so does its layout
    /// in the registry selection.
    pub fn set_geometry_source(&mut self, source: Box<dyn GeometrySource>) {
        self.current_group = source.active_group();
        self.geometry = Some(source);
        self.invalidate_keyboard();
        self.sync_applied();
    }

    /// Loads the geometry dump named in `[paths] geometry_file`.
    pub fn load_geometry_file(&mut self) -> Result<()> {
        let Some(path) = self.config.paths.geometry_file.clone() else {
            bail!("No geometry file configured");
        };
        let source = parse_geometry_json(&path)?;
        self.set_geometry_source(Box::new(source));
        Ok(())
    }

    /// Drops the cached keyboard model; the next query rebuilds it.
    pub fn invalidate_keyboard(&mut self) {
        if self.key_layout.take().is_some() {
            debug!("Keyboard model invalidated");
        }
    }

    /// The keyboard model, built on first use.
    ///
    /// `None` until a geometry source is set.
    pub fn key_layout(&mut self) -> Option<&KeyLayout> {
        if self.key_layout.is_none() {
            let source = self.geometry.as_deref()?;
            let builder = KeyLayoutBuilder::new(self.config.keyboard.insertion_rules.clone());
            self.key_layout = Some(builder.build(source));
            self.generation += 1;
        }
        self.key_layout.as_ref()
    }

    /// Key at (`row`, `col`).
    pub fn key(&mut self, row: usize, col: usize) -> Option<&Key> {
        self.key_layout()?.key(row, col)
    }

    /// Keysym shown on the key at (`row`, `col`) for shift `level` in the
    /// current group. Keys lacking the current group show their first group.
    pub fn keysym_at(&mut self, row: usize, col: usize, level: usize) -> Option<Keysym> {
        let group = self.current_group;
        let key = self.key(row, col)?;
        key.keysym(key.effective_group(group, 0), level)
    }

    /// First key producing `keysym`.
    pub fn find_keysym(&mut self, keysym: Keysym) -> Option<&Key> {
        self.key_layout()?.find_keysym(keysym)
    }

    /// Group the keyboard currently shows.
    #[must_use]
    pub const fn current_group(&self) -> usize {
        self.current_group
    }

    /// Shows `group`. Ignored when no key has that many groups.
    pub fn set_group(&mut self, group: usize) -> bool {
        let max = self.key_layout().map_or(0, KeyLayout::max_group_count);
        if group >= max {
            debug!("Ignoring group {} (keyboard has {})", group, max);
            return false;
        }
        self.current_group = group;
        true
    }

    /// Advances to the next group, wrapping around.
    pub fn next_group(&mut self) -> usize {
        let current = self.current_group;
        let next = self.key_layout().map_or(0, |layout| layout.next_group(current));
        self.current_group = next;
        next
    }

    /// Keyboard parts at the configured start rows.
    pub fn keyboard_parts(&mut self) -> Vec<KeyboardPart> {
        let starts = self.config.keyboard.part_start_rows.clone();
        self.key_layout()
            .map(|layout| layout.parts(&starts))
            .unwrap_or_default()
    }

    /// Backends available for drawing.
    pub fn backends_mut(&mut self) -> &mut BackendRegistry {
        &mut self.backends
    }

    /// Draws the keyboard with the selected backend.
    pub fn render_keyboard(&mut self, out: &mut dyn Write) -> Result<()> {
        let group = self.current_group;
        self.key_layout();
        let Some(layout) = self.key_layout.as_ref() else {
            bail!("No keyboard geometry loaded");
        };
        self.backends
            .selected()
            .render(layout, group, out)
            .context("Failed to render keyboard")
    }

    /// Drops the cached pad catalog; the next query reloads it.
    pub fn invalidate_pads(&mut self) {
        self.pads = PadState::NotLoaded;
    }

    /// Pad groups, loaded on first use.
    ///
    /// A failed load is remembered until [`invalidate_pads`](Self::invalidate_pads).
    pub fn pad_groups(&mut self) -> Result<&[PadGroup], PadsUnavailable> {
        if matches!(self.pads, PadState::NotLoaded) {
            self.pads = self.load_pads();
            self.generation += 1;
        }
        match &self.pads {
            PadState::Loaded(groups) => Ok(groups.as_slice()),
            PadState::Unavailable(err) => Err(err.clone()),
            PadState::NotLoaded => Ok(&[]),
        }
    }

    /// Pad group at ordinal `nth`.
    pub fn pad_group(&mut self, nth: usize) -> Option<&PadGroup> {
        self.pad_groups().ok()?.get(nth)
    }

    /// Table `table` of pad group `group`.
    pub fn pad_table(&mut self, group: usize, table: usize) -> Option<&PadTable> {
        self.pad_group(group)?.table(table)
    }

    fn load_pads(&self) -> PadState {
        let parser = PadParser::new(self.translator.as_ref())
            .with_domain(self.config.pad.translation_domain.clone());
        let user_dir = self.config.resolved_user_pad_dir();

        match parser.parse_directory(&self.config.paths.system_pad_dir, user_dir.as_deref()) {
            Ok(groups) => {
                info!("Loaded {} pad groups", groups.len());
                PadState::Loaded(groups)
            }
            Err(err) => {
                warn!("Pad definitions unavailable: {}", err);
                PadState::Unavailable(PadsUnavailable {
                    message: err.to_string(),
                })
            }
        }
    }

    /// Builds the layout catalog from `source` and partitions it under
    /// `active`.
    pub fn load_registry(&mut self, source: &dyn LayoutRegistrySource, active: &ActiveSelection) {
        let catalog =
            LayoutRegistryBuilder::new(&self.config.registry.default_layout_description).build(source);
        self.selection = Some(LayoutSelection::new(&catalog, active));
        self.catalog = Some(catalog);
        self.group_layouts = active.layouts.clone();
        self.sync_applied();
    }

    /// Marks the pair of the current group as applied.
    fn sync_applied(&mut self) {
        let applied = self
            .group_layouts
            .get(self.current_group)
            .or_else(|| self.group_layouts.first())
            .cloned();
        if let Some(selection) = self.selection.as_mut() {
            debug!(
                "Applied layout: {}",
                applied.as_ref().map_or_else(|| "none".to_string(), ToString::to_string)
            );
            selection.set_applied(applied);
        }
    }

    /// Loads the registry file named in `[paths] registry_file`.
    pub fn load_registry_file(&mut self, active: &ActiveSelection) -> Result<()> {
        let registry = parse_registry_file(&self.config.paths.registry_file, self.translator.as_ref())?;
        self.load_registry(&registry, active);
        Ok(())
    }

    /// Layout catalog, once loaded.
    #[must_use]
    pub const fn catalog(&self) -> Option<&LayoutCatalog> {
        self.catalog.as_ref()
    }

    /// Active/available layout state, once loaded.
    #[must_use]
    pub const fn selection(&self) -> Option<&LayoutSelection> {
        self.selection.as_ref()
    }

    /// Moves `pair` to the active list.
    pub fn add_layout(&mut self, pair: &LayoutVariant) -> Result<(), SelectionError> {
        match self.selection.as_mut() {
            Some(selection) => selection.add_layout(pair),
            None => Err(SelectionError::NotAvailable(pair.clone())),
        }
    }

    /// Moves `pair` back to the available list.
    pub fn remove_layout(&mut self, pair: &LayoutVariant) -> Result<(), SelectionError> {
        match self.selection.as_mut() {
            Some(selection) => selection.remove_layout(pair),
            None => Err(SelectionError::NotActive(pair.clone())),
        }
    }

    /// Plans switching to `layouts` from `initial`.
    ///
    /// When the switch changes anything the cached keyboard is dropped and
    /// the target group becomes current.
    pub fn request_layout(
        &mut self,
        initial: &LayoutRecord,
        layouts: &str,
        variants: Option<&str>,
        options: Option<&str>,
    ) -> LayoutSwitch {
        let switch = plan_layout_switch(
            initial,
            self.current_group,
            layouts,
            variants,
            options,
            self.config.registry.max_groups,
        );
        if let LayoutSwitch::Apply { record, group } = &switch {
            self.current_group = *group;
            self.group_layouts = record
                .layouts
                .iter()
                .enumerate()
                .map(|(idx, layout)| {
                    LayoutVariant::new(layout.as_str(), record.variants.get(idx).map(String::as_str))
                })
                .collect();
            self.invalidate_keyboard();
            self.sync_applied();
        }
        switch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeometryRow, GeometrySection, LayoutEntry, OptionGroupEntry};
    use crate::parser::{GeometryDump, JsonGeometrySource, KeymapEntry};
    use std::fs;
    use tempfile::TempDir;

    fn source() -> JsonGeometrySource {
        source_in_group(0)
    }

    fn source_in_group(active_group: usize) -> JsonGeometrySource {
        let entry = |name: &str, keycode, widths: Vec<usize>, keysyms: Vec<Keysym>| KeymapEntry {
            name: name.into(),
            keycode,
            group_widths: widths,
            keysyms,
        };
        JsonGeometrySource::from_dump(GeometryDump {
            active_group,
            sections: vec![GeometrySection::new("Alpha")
                .with_row(GeometryRow::from_names(["AE01", "AE02"]))
                .with_row(GeometryRow::from_names(["AD01"]))],
            keymap: vec![
                entry("AE01", 10, vec![2, 2], vec![0x31, 0x21, 0x0100_0661, 0x21]),
                entry("AE02", 11, vec![2], vec![0x32, 0x40]),
                entry("AD01", 24, vec![2, 2], vec![0x71, 0x51, 0x6d1, 0]),
            ],
        })
    }

    fn session_with_dirs(system: &TempDir) -> InputPadSession {
        let mut config = Config::new();
        config.paths.system_pad_dir = system.path().to_path_buf();
        config.pad.load_user_pads = false;
        InputPadSession::new(config)
    }

    #[test]
    fn test_keyboard_is_cached() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_dirs(&dir);
        assert!(session.key_layout().is_none());

        session.set_geometry_source(Box::new(source()));
        assert_eq!(session.key_layout().unwrap().row_count(), 2);
        let generation = session.generation();
        session.key_layout();
        assert_eq!(session.generation(), generation);

        session.invalidate_keyboard();
        session.key_layout();
        assert_eq!(session.generation(), generation + 1);
    }

    #[test]
    fn test_group_cycling() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_dirs(&dir);
        session.set_geometry_source(Box::new(source()));

        assert_eq!(session.keysym_at(0, 0, 0), Some(0x31));
        assert_eq!(session.next_group(), 1);
        assert_eq!(session.keysym_at(0, 0, 0), Some(0x0100_0661));
        // AE02 has a single group and keeps showing it
        assert_eq!(session.keysym_at(0, 1, 0), Some(0x32));
        // Empty level is no symbol
        assert_eq!(session.keysym_at(1, 0, 1), None);

        assert!(!session.set_group(5));
        assert_eq!(session.current_group(), 1);
        assert!(session.set_group(0));
        assert_eq!(session.next_group(), 1);
        assert_eq!(session.next_group(), 0);
    }

    #[test]
    fn test_find_keysym_and_parts() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_dirs(&dir);
        session.set_geometry_source(Box::new(source()));
        assert_eq!(session.find_keysym(0x51).map(|k| k.name.clone()), Some("AD01".to_string()));
        let parts = session.keyboard_parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].columns, 2);
    }

    #[test]
    fn test_render_keyboard() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_dirs(&dir);
        let mut out = Vec::new();
        assert!(session.render_keyboard(&mut out).is_err());

        session.set_geometry_source(Box::new(source()));
        session.render_keyboard(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 2\nq\n");
    }

    #[test]
    fn test_pads_unavailable_is_cached() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.xml"), "<input-pad><pad/></input-pad>").unwrap();
        let mut session = session_with_dirs(&dir);

        let err = session.pad_groups().unwrap_err();
        assert!(err.message.contains("broken.xml"));
        let generation = session.generation();
        assert!(session.pad_groups().is_err());
        assert_eq!(session.generation(), generation);

        fs::write(
            dir.path().join("broken.xml"),
            "<input-pad><pad><group><name>G</name><table><name>T</name><chars>0x41</chars></table></group></pad></input-pad>",
        )
        .unwrap();
        session.invalidate_pads();
        assert_eq!(session.pad_groups().unwrap().len(), 1);
        assert_eq!(session.pad_table(0, 0).unwrap().chars(), vec!['A']);
        assert!(session.pad_table(0, 1).is_none());
    }

    #[test]
    fn test_keyboard_works_without_pads() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.xml"), "not xml at all").unwrap();
        let mut session = session_with_dirs(&dir);
        session.set_geometry_source(Box::new(source()));
        assert!(session.pad_groups().is_err());
        assert_eq!(session.key_layout().unwrap().key_count(), 3);
    }

    struct Registry(Vec<LayoutEntry>, Vec<OptionGroupEntry>);

    impl LayoutRegistrySource for Registry {
        fn layouts(&self) -> &[LayoutEntry] {
            &self.0
        }

        fn option_groups(&self) -> &[OptionGroupEntry] {
            &self.1
        }
    }

    #[test]
    fn test_registry_selection() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_dirs(&dir);
        let us = LayoutVariant::layout_only("us");
        let de = LayoutVariant::layout_only("de");
        assert!(session.add_layout(&de).is_err());

        let registry = Registry(
            vec![
                LayoutEntry::new("de", Some("German".into())),
                LayoutEntry::new("us", Some("English (US)".into())),
            ],
            Vec::new(),
        );
        session.load_registry(&registry, &ActiveSelection::from_strings("us", "", ""));
        assert_eq!(session.catalog().unwrap().layouts[0].layout_code, "us");

        session.add_layout(&de).unwrap();
        assert_eq!(session.remove_layout(&us), Err(SelectionError::InUse(us)));
        session.remove_layout(&de).unwrap();
    }

    #[test]
    fn test_live_group_layout_cannot_be_removed() {
        let dir = TempDir::new().unwrap();
        let registry = Registry(
            vec![
                LayoutEntry::new("jp", Some("Japanese".into())),
                LayoutEntry::new("us", Some("English (US)".into())),
            ],
            Vec::new(),
        );
        let us = LayoutVariant::layout_only("us");
        let jp = LayoutVariant::layout_only("jp");

        let mut session = session_with_dirs(&dir);
        session.set_geometry_source(Box::new(source_in_group(1)));
        session.load_registry(&registry, &ActiveSelection::from_strings("us,jp", "", ""));
        assert_eq!(session.current_group(), 1);
        assert_eq!(session.selection().unwrap().applied(), Some(&jp));
        assert_eq!(session.remove_layout(&jp), Err(SelectionError::InUse(jp.clone())));

        // Registry loaded first, geometry arriving later re-syncs
        let mut session = session_with_dirs(&dir);
        session.load_registry(&registry, &ActiveSelection::from_strings("us,jp", "", ""));
        assert_eq!(session.selection().unwrap().applied(), Some(&us));
        session.set_geometry_source(Box::new(source_in_group(1)));
        assert_eq!(session.selection().unwrap().applied(), Some(&jp));
        session.remove_layout(&us).unwrap();
    }

    #[test]
    fn test_request_layout() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_dirs(&dir);
        session.set_geometry_source(Box::new(source()));
        session.key_layout();
        let generation = session.generation();

        let initial = LayoutRecord::from_selection(None, &ActiveSelection::from_strings("us,ru", "", ""));
        assert_eq!(session.request_layout(&initial, "us", None, None), LayoutSwitch::Unchanged);

        let switch = session.request_layout(&initial, "ru", None, None);
        assert!(matches!(switch, LayoutSwitch::Apply { group: 1, .. }));
        assert_eq!(session.current_group(), 1);
        session.key_layout();
        assert_eq!(session.generation(), generation + 1);
    }

    #[test]
    fn test_request_layout_moves_applied_pair() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_dirs(&dir);
        let registry = Registry(
            vec![
                LayoutEntry::new("us", Some("English (US)".into())),
                LayoutEntry::new("jp", Some("Japanese".into())),
            ],
            Vec::new(),
        );
        let active = ActiveSelection::from_strings("us,jp", "", "");
        session.load_registry(&registry, &active);

        let initial = LayoutRecord::from_selection(None, &active);
        session.request_layout(&initial, "jp", None, None);
        assert_eq!(
            session.selection().unwrap().applied(),
            Some(&LayoutVariant::layout_only("jp"))
        );
        session.remove_layout(&LayoutVariant::layout_only("us")).unwrap();
    }
}
