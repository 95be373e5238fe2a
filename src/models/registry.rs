//! Keyboard layout registry catalog and active selection.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A layout variant in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantEntry {
    /// Variant code ("dvorak", "kana")
    pub variant_code: String,
    /// Human readable description
    pub description: Option<String>,
}

/// A layout with its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Layout code ("us", "jp")
    pub layout_code: String,
    /// Human readable description ("English (US)")
    pub description: Option<String>,
    /// Variants in registry order
    pub variants: Vec<VariantEntry>,
}

impl LayoutEntry {
    /// Creates a layout without variants.
    pub fn new(layout_code: impl Into<String>, description: Option<String>) -> Self {
        Self {
            layout_code: layout_code.into(),
            description,
            variants: Vec::new(),
        }
    }

    /// Description, falling back to the layout code.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.layout_code)
    }
}

/// One option in an option group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEntry {
    /// Option code ("grp:alt_shift_toggle")
    pub option_code: String,
    /// Human readable description
    pub description: Option<String>,
}

/// A group of related options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroupEntry {
    /// Group code ("grp")
    pub group_code: String,
    /// Human readable description
    pub description: Option<String>,
    /// Whether several options of the group may be active together
    pub allow_multiple: bool,
    /// Options in registry order
    pub options: Vec<OptionEntry>,
}

/// A (layout, variant) pair.
///
/// An empty variant string is treated the same as no variant, both when
/// comparing and when deserializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutVariant {
    /// Layout code
    pub layout: String,
    /// Variant code, if any
    #[serde(default, deserialize_with = "non_empty_variant")]
    pub variant: Option<String>,
}

fn non_empty_variant<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let variant = Option::<String>::deserialize(deserializer)?;
    Ok(variant.filter(|v| !v.is_empty()))
}

impl PartialEq for LayoutVariant {
    fn eq(&self, other: &Self) -> bool {
        self.layout == other.layout && self.variant_or_empty() == other.variant_or_empty()
    }
}

impl Eq for LayoutVariant {}

impl Hash for LayoutVariant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.layout.hash(state);
        self.variant_or_empty().hash(state);
    }
}

impl LayoutVariant {
    /// Creates a pair; an empty variant is normalized to `None`.
    pub fn new(layout: impl Into<String>, variant: Option<&str>) -> Self {
        Self {
            layout: layout.into(),
            variant: variant.filter(|v| !v.is_empty()).map(str::to_string),
        }
    }

    /// Layout without variant.
    pub fn layout_only(layout: impl Into<String>) -> Self {
        Self::new(layout, None)
    }

    /// Variant code or the empty string.
    #[must_use]
    pub fn variant_or_empty(&self) -> &str {
        self.variant.as_deref().unwrap_or("")
    }
}

impl fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_or_empty() {
            "" => f.write_str(&self.layout),
            variant => write!(f, "{}({})", self.layout, variant),
        }
    }
}

/// Layouts and options the caller considers currently applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSelection {
    /// Active (layout, variant) pairs in group order
    pub layouts: Vec<LayoutVariant>,
    /// Active option codes in application order
    pub options: Vec<String>,
}

impl ActiveSelection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection from comma separated layout/variant/option strings,
    /// the way they are stored in the rules names property.
    #[must_use]
    pub fn from_strings(layouts: &str, variants: &str, options: &str) -> Self {
        let variants: Vec<&str> = variants.split(',').collect();
        // Group index is positional; empty layout slots still consume a variant
        let layouts = layouts
            .split(',')
            .enumerate()
            .filter(|(_, layout)| !layout.is_empty())
            .map(|(idx, layout)| LayoutVariant::new(layout, variants.get(idx).copied()))
            .collect();
        Self {
            layouts,
            options: parse_options(options),
        }
    }

    /// Adds an option code if not already active.
    pub fn add_option(&mut self, option: impl Into<String>) -> bool {
        let option = option.into();
        if option.is_empty() || self.options.contains(&option) {
            return false;
        }
        self.options.push(option);
        true
    }

    /// Removes an option code.
    pub fn remove_option(&mut self, option: &str) -> bool {
        let before = self.options.len();
        self.options.retain(|o| o != option);
        before != self.options.len()
    }

    /// Comma-joined option codes in list order.
    #[must_use]
    pub fn options_string(&self) -> String {
        self.options.join(",")
    }

    /// Comma-joined layout codes in group order.
    #[must_use]
    pub fn layouts_string(&self) -> String {
        self.layouts
            .iter()
            .map(|lv| lv.layout.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Comma-joined variant codes aligned with `layouts_string`.
    #[must_use]
    pub fn variants_string(&self) -> String {
        self.layouts
            .iter()
            .map(LayoutVariant::variant_or_empty)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Splits a comma separated option list, dropping empty pieces.
#[must_use]
pub fn parse_options(options: &str) -> Vec<String> {
    options
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_variant_normalized() {
        assert_eq!(LayoutVariant::new("us", Some("")), LayoutVariant::layout_only("us"));
    }

    #[test]
    fn test_raw_empty_variant_equals_unset() {
        let raw = LayoutVariant {
            layout: "us".into(),
            variant: Some(String::new()),
        };
        assert_eq!(raw, LayoutVariant::layout_only("us"));
        assert_ne!(raw, LayoutVariant::new("us", Some("intl")));
        assert_eq!(raw.to_string(), "us");
        assert!(vec![LayoutVariant::layout_only("us")].contains(&raw));
    }

    #[test]
    fn test_empty_variant_deserializes_as_unset() {
        let pair: LayoutVariant = serde_json::from_str(r#"{"layout":"us","variant":""}"#).unwrap();
        assert_eq!(pair.variant, None);
        let pair: LayoutVariant = serde_json::from_str(r#"{"layout":"jp"}"#).unwrap();
        assert_eq!(pair.variant, None);
    }

    #[test]
    fn test_layout_variant_display() {
        assert_eq!(LayoutVariant::new("jp", Some("kana")).to_string(), "jp(kana)");
        assert_eq!(LayoutVariant::layout_only("us").to_string(), "us");
    }

    #[test]
    fn test_options_round_trip() {
        let mut selection = ActiveSelection::new();
        selection.add_option("grp:alt_shift_toggle");
        selection.add_option("ctrl:nocaps");
        selection.add_option("compose:ralt");
        let joined = selection.options_string();
        assert_eq!(joined, "grp:alt_shift_toggle,ctrl:nocaps,compose:ralt");
        assert_eq!(parse_options(&joined), selection.options);
    }

    #[test]
    fn test_option_add_remove() {
        let mut selection = ActiveSelection::new();
        assert!(selection.add_option("ctrl:nocaps"));
        assert!(!selection.add_option("ctrl:nocaps"));
        assert!(!selection.add_option(""));
        assert!(selection.remove_option("ctrl:nocaps"));
        assert!(!selection.remove_option("ctrl:nocaps"));
        assert_eq!(selection.options_string(), "");
    }

    #[test]
    fn test_from_strings_aligns_variants() {
        let selection = ActiveSelection::from_strings("us,jp,de", ",kana", "grp:win_space_toggle");
        assert_eq!(
            selection.layouts,
            vec![
                LayoutVariant::layout_only("us"),
                LayoutVariant::new("jp", Some("kana")),
                LayoutVariant::layout_only("de"),
            ]
        );
        assert_eq!(selection.layouts_string(), "us,jp,de");
        assert_eq!(selection.variants_string(), ",kana,");
        assert_eq!(selection.options, vec!["grp:win_space_toggle"]);
    }

    #[test]
    fn test_from_strings_keeps_variants_after_empty_slot() {
        let selection = ActiveSelection::from_strings("us,,jp", ",,kana", "");
        assert_eq!(
            selection.layouts,
            vec![LayoutVariant::layout_only("us"), LayoutVariant::new("jp", Some("kana"))]
        );
        assert_eq!(selection.layouts[1].variant.as_deref(), Some("kana"));
    }
}
