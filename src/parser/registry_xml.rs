//! xkeyboard-config registry reader (`rules/evdev.xml`).
//!
//! Only the parts the layout chooser needs are read: layouts with their
//! variants, and option groups with their options. Models, language lists and
//! other metadata are skipped.

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::i18n::Translator;
use crate::models::{LayoutEntry, OptionEntry, OptionGroupEntry, VariantEntry};
use crate::services::LayoutRegistrySource;

/// Message domain xkeyboard-config descriptions are translated in.
pub const REGISTRY_DOMAIN: &str = "xkeyboard-config";

/// Registry content loaded from an xkeyboard-config XML file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XkbRegistry {
    /// Layouts in file order
    pub layouts: Vec<LayoutEntry>,
    /// Option groups in file order
    pub option_groups: Vec<OptionGroupEntry>,
}

impl LayoutRegistrySource for XkbRegistry {
    fn layouts(&self) -> &[LayoutEntry] {
        &self.layouts
    }

    fn option_groups(&self) -> &[OptionGroupEntry] {
        &self.option_groups
    }
}

/// Reads and parses a registry file.
pub fn parse_registry_file(path: &Path, translator: &dyn Translator) -> Result<XkbRegistry> {
    let content = fs::read_to_string(path)
        .context(format!("Failed to read layout registry: {}", path.display()))?;

    parse_registry_str(&content, translator)
        .context(format!("Failed to parse layout registry: {}", path.display()))
}

/// Parses registry XML from a string.
pub fn parse_registry_str(xml: &str, translator: &dyn Translator) -> Result<XkbRegistry> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut walker = RegistryWalker { reader, translator };
    let registry = walker.parse_root()?;
    debug!(
        "Parsed layout registry: {} layouts, {} option groups",
        registry.layouts.len(),
        registry.option_groups.len()
    );
    Ok(registry)
}

/// `<configItem>` content.
#[derive(Default)]
struct ConfigItem {
    name: Option<String>,
    description: Option<String>,
}

struct RegistryWalker<'x, 't> {
    reader: Reader<&'x [u8]>,
    translator: &'t dyn Translator,
}

impl<'x> RegistryWalker<'x, '_> {
    fn parse_root(&mut self) -> Result<XkbRegistry> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"xkbConfigRegistry" => break,
                Event::Start(e) | Event::Empty(e) => {
                    bail!(
                        "unexpected root element <{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    );
                }
                Event::Eof => bail!("registry has no root element"),
                _ => {}
            }
        }

        let mut registry = XkbRegistry::default();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"layoutList" => registry.layouts.extend(self.parse_layout_list()?),
                    b"optionList" => registry.option_groups.extend(self.parse_option_list()?),
                    _ => self.skip(&e)?,
                },
                Event::End(_) | Event::Eof => break,
                _ => {}
            }
        }
        Ok(registry)
    }

    fn parse_layout_list(&mut self) -> Result<Vec<LayoutEntry>> {
        let mut layouts = Vec::new();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"layout" => {
                    if let Some(layout) = self.parse_layout()? {
                        layouts.push(layout);
                    }
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => break,
                Event::Eof => bail!("unexpected end of document in <layoutList>"),
                _ => {}
            }
        }
        Ok(layouts)
    }

    fn parse_layout(&mut self) -> Result<Option<LayoutEntry>> {
        let mut item = ConfigItem::default();
        let mut variants = Vec::new();

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"configItem" => item = self.parse_config_item()?,
                    b"variantList" => variants = self.parse_variant_list()?,
                    _ => self.skip(&e)?,
                },
                Event::End(_) => break,
                Event::Eof => bail!("unexpected end of document in <layout>"),
                _ => {}
            }
        }

        let Some(name) = item.name else {
            warn!("Skipping registry layout without a name");
            return Ok(None);
        };
        Ok(Some(LayoutEntry {
            layout_code: name,
            description: item.description,
            variants,
        }))
    }

    fn parse_variant_list(&mut self) -> Result<Vec<VariantEntry>> {
        let mut variants = Vec::new();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"variant" => {
                    let item = self.parse_wrapped_item("variant")?;
                    match item.name {
                        Some(name) => variants.push(VariantEntry {
                            variant_code: name,
                            description: item.description,
                        }),
                        None => warn!("Skipping registry variant without a name"),
                    }
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => break,
                Event::Eof => bail!("unexpected end of document in <variantList>"),
                _ => {}
            }
        }
        Ok(variants)
    }

    fn parse_option_list(&mut self) -> Result<Vec<OptionGroupEntry>> {
        let mut groups = Vec::new();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"group" => {
                    let allow_multiple = allow_multiple_selection(&e)?;
                    if let Some(group) = self.parse_option_group(allow_multiple)? {
                        groups.push(group);
                    }
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => break,
                Event::Eof => bail!("unexpected end of document in <optionList>"),
                _ => {}
            }
        }
        Ok(groups)
    }

    fn parse_option_group(&mut self, allow_multiple: bool) -> Result<Option<OptionGroupEntry>> {
        let mut item = ConfigItem::default();
        let mut options = Vec::new();

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"configItem" => item = self.parse_config_item()?,
                    b"option" => {
                        let option = self.parse_wrapped_item("option")?;
                        match option.name {
                            Some(name) => options.push(OptionEntry {
                                option_code: name,
                                description: option.description,
                            }),
                            None => warn!("Skipping registry option without a name"),
                        }
                    }
                    _ => self.skip(&e)?,
                },
                Event::End(_) => break,
                Event::Eof => bail!("unexpected end of document in option <group>"),
                _ => {}
            }
        }

        let Some(name) = item.name else {
            warn!("Skipping registry option group without a name");
            return Ok(None);
        };
        Ok(Some(OptionGroupEntry {
            group_code: name,
            description: item.description,
            allow_multiple,
            options,
        }))
    }

    /// Reads an element whose only interesting child is `<configItem>`.
    fn parse_wrapped_item(&mut self, element: &str) -> Result<ConfigItem> {
        let mut item = ConfigItem::default();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"configItem" => {
                    item = self.parse_config_item()?;
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => break,
                Event::Eof => bail!("unexpected end of document in <{}>", element),
                _ => {}
            }
        }
        Ok(item)
    }

    fn parse_config_item(&mut self) -> Result<ConfigItem> {
        let mut item = ConfigItem::default();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"name" => item.name = Some(self.read_text("name")?),
                    b"description" => {
                        let text = self.read_text("description")?;
                        item.description = Some(self.translator.translate(Some(REGISTRY_DOMAIN), &text));
                    }
                    _ => self.skip(&e)?,
                },
                Event::End(_) => break,
                Event::Eof => bail!("unexpected end of document in <configItem>"),
                _ => {}
            }
        }
        Ok(item)
    }

    fn read_text(&mut self, element: &str) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.reader.read_event()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(&self.reader.decoder().decode(&c)?),
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => break,
                Event::Eof => bail!("unexpected end of document in <{}>", element),
                _ => {}
            }
        }
        Ok(text)
    }

    fn skip(&mut self, start: &BytesStart<'x>) -> Result<()> {
        self.reader.read_to_end(start.name())?;
        Ok(())
    }
}

fn allow_multiple_selection(start: &BytesStart<'_>) -> Result<bool> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"allowMultipleSelection" {
            return Ok(attr.unescape_value()?.trim() == "true");
        }
    }
    Ok(false)
}
