//! `_XKB_RULES_NAMES` root window property.
//!
//! The property holds five NUL-terminated strings: rules file, model,
//! layouts, variants and options. The last three are comma separated lists
//! aligned by group.

use serde::{Deserialize, Serialize};

use crate::models::ActiveSelection;

/// Decoded rules names property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesNames {
    /// Rules file ("evdev")
    pub rules: String,
    /// Keyboard model ("pc105")
    pub model: String,
    /// Comma separated layouts
    pub layouts: String,
    /// Comma separated variants
    pub variants: String,
    /// Comma separated options
    pub options: String,
}

impl RulesNames {
    /// Decodes the raw property value. Missing trailing fields are empty.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let mut fields = raw
            .split(|&b| b == 0)
            .map(|field| String::from_utf8_lossy(field).into_owned());
        let mut next = || fields.next().unwrap_or_default();

        Self {
            rules: next(),
            model: next(),
            layouts: next(),
            variants: next(),
            options: next(),
        }
    }

    /// Encodes the property value, each field NUL-terminated.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.rules.len()
                + self.model.len()
                + self.layouts.len()
                + self.variants.len()
                + self.options.len()
                + 5,
        );
        for field in [&self.rules, &self.model, &self.layouts, &self.variants, &self.options] {
            out.extend_from_slice(field.as_bytes());
            out.push(0);
        }
        out
    }

    /// Layout of each group, in group order.
    #[must_use]
    pub fn group_layouts(&self) -> Vec<String> {
        if self.layouts.is_empty() {
            return Vec::new();
        }
        self.layouts.split(',').map(str::to_string).collect()
    }

    /// Active layouts and options described by the property.
    #[must_use]
    pub fn selection(&self) -> ActiveSelection {
        ActiveSelection::from_strings(&self.layouts, &self.variants, &self.options)
    }

    /// Builds the property for `selection` under the given rules and model.
    pub fn from_selection(rules: impl Into<String>, model: impl Into<String>, selection: &ActiveSelection) -> Self {
        Self {
            rules: rules.into(),
            model: model.into(),
            layouts: selection.layouts_string(),
            variants: selection.variants_string(),
            options: selection.options_string(),
        }
    }
}
