//! Layout registry catalog, active/available partition and layout switching.

use std::cmp::Ordering;
use thiserror::Error;
use tracing::debug;

use crate::constants::{DEFAULT_LAYOUT_DESCRIPTION, DEFAULT_MAX_GROUPS};
use crate::models::{parse_options, ActiveSelection, LayoutEntry, LayoutVariant, OptionGroupEntry};

/// Keyboard model used when the initial record carries none.
const FALLBACK_MODEL: &str = "pc105";

/// Where the registry of layouts, variants and options comes from.
pub trait LayoutRegistrySource {
    /// Layouts with their variants, in source order.
    fn layouts(&self) -> &[LayoutEntry];

    /// Option groups with their options, in source order.
    fn option_groups(&self) -> &[OptionGroupEntry];
}

/// Immutable catalog of everything the registry offers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutCatalog {
    /// Layouts in display order
    pub layouts: Vec<LayoutEntry>,
    /// Option groups in source order
    pub option_groups: Vec<OptionGroupEntry>,
}

impl LayoutCatalog {
    /// Every (layout, variant) combination in catalog order: each layout on
    /// its own, followed by each of its variants.
    #[must_use]
    pub fn combinations(&self) -> Vec<LayoutVariant> {
        self.layouts
            .iter()
            .flat_map(|layout| {
                std::iter::once(LayoutVariant::layout_only(&layout.layout_code)).chain(
                    layout
                        .variants
                        .iter()
                        .map(|variant| LayoutVariant::new(&layout.layout_code, Some(variant.variant_code.as_str()))),
                )
            })
            .collect()
    }

    /// Layout entry for `code`.
    #[must_use]
    pub fn layout(&self, code: &str) -> Option<&LayoutEntry> {
        self.layouts.iter().find(|layout| layout.layout_code == code)
    }

    /// Human readable name of a combination ("Japanese - Kana").
    #[must_use]
    pub fn describe(&self, pair: &LayoutVariant) -> String {
        let Some(layout) = self.layout(&pair.layout) else {
            return pair.to_string();
        };
        let Some(code) = pair.variant.as_deref() else {
            return layout.display_name().to_string();
        };
        let variant = layout
            .variants
            .iter()
            .find(|variant| variant.variant_code == code)
            .and_then(|variant| variant.description.as_deref())
            .unwrap_or(code);
        format!("{} - {}", layout.display_name(), variant)
    }

    /// Option group owning `option_code`.
    #[must_use]
    pub fn option_group_of(&self, option_code: &str) -> Option<&OptionGroupEntry> {
        self.option_groups
            .iter()
            .find(|group| group.options.iter().any(|option| option.option_code == option_code))
    }
}

/// Builds a [`LayoutCatalog`] from a [`LayoutRegistrySource`].
#[derive(Debug, Clone)]
pub struct LayoutRegistryBuilder {
    default_description: String,
}

impl Default for LayoutRegistryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_LAYOUT_DESCRIPTION)
    }
}

impl LayoutRegistryBuilder {
    /// Creates a builder that lists `default_description` first.
    pub fn new(default_description: impl Into<String>) -> Self {
        Self {
            default_description: default_description.into(),
        }
    }

    /// Copies the source into a catalog sorted by description.
    #[must_use]
    pub fn build(&self, source: &dyn LayoutRegistrySource) -> LayoutCatalog {
        let mut layouts = source.layouts().to_vec();
        layouts.sort_by(|a, b| self.compare(a, b));

        debug!(
            "Layout catalog: {} layouts, {} option groups",
            layouts.len(),
            source.option_groups().len()
        );
        LayoutCatalog {
            layouts,
            option_groups: source.option_groups().to_vec(),
        }
    }

    fn compare(&self, a: &LayoutEntry, b: &LayoutEntry) -> Ordering {
        let a_default = a.display_name() == self.default_description;
        let b_default = b.display_name() == self.default_description;
        b_default
            .cmp(&a_default)
            .then_with(|| a.display_name().cmp(b.display_name()))
    }
}

/// Catalog combinations split by whether they are active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Not currently active, in catalog order
    pub available: Vec<LayoutVariant>,
    /// Currently active, in catalog order
    pub active: Vec<LayoutVariant>,
}

/// Splits every catalog combination into available and active.
///
/// A combination without variant matches an active pair whose variant is
/// unset or empty; one with a variant only matches exactly.
#[must_use]
pub fn partition(catalog: &LayoutCatalog, selection: &ActiveSelection) -> Partition {
    let (active, available): (Vec<_>, Vec<_>) = catalog
        .combinations()
        .into_iter()
        .partition(|combo| selection.layouts.contains(combo));
    Partition { available, active }
}

/// Errors from moving layouts between the lists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The pair is not in the available list
    #[error("layout {0} is not available")]
    NotAvailable(LayoutVariant),
    /// The pair is not in the active list
    #[error("layout {0} is not active")]
    NotActive(LayoutVariant),
    /// The pair is the layout currently applied to the keyboard
    #[error("layout {0} is in use and cannot be removed")]
    InUse(LayoutVariant),
}

/// Mutable active/available state for the layout chooser.
#[derive(Debug, Clone)]
pub struct LayoutSelection {
    order: Vec<LayoutVariant>,
    active: Vec<LayoutVariant>,
    applied: Option<LayoutVariant>,
}

impl LayoutSelection {
    /// Starts from the partition of `catalog` under `selection`.
    #[must_use]
    pub fn new(catalog: &LayoutCatalog, selection: &ActiveSelection) -> Self {
        Self {
            order: catalog.combinations(),
            active: partition(catalog, selection).active,
            applied: None,
        }
    }

    /// Active pairs.
    #[must_use]
    pub fn active(&self) -> &[LayoutVariant] {
        &self.active
    }

    /// Available pairs in catalog order.
    #[must_use]
    pub fn available(&self) -> Vec<LayoutVariant> {
        self.order
            .iter()
            .filter(|combo| !self.active.contains(combo))
            .cloned()
            .collect()
    }

    /// Marks the pair the keyboard is currently using.
    pub fn set_applied(&mut self, applied: Option<LayoutVariant>) {
        self.applied = applied;
    }

    /// Pair the keyboard is currently using.
    #[must_use]
    pub const fn applied(&self) -> Option<&LayoutVariant> {
        self.applied.as_ref()
    }

    /// Moves `pair` from available to the end of the active list.
    pub fn add_layout(&mut self, pair: &LayoutVariant) -> Result<(), SelectionError> {
        if !self.order.contains(pair) || self.active.contains(pair) {
            return Err(SelectionError::NotAvailable(pair.clone()));
        }
        self.active.push(pair.clone());
        Ok(())
    }

    /// Moves `pair` from active back to available.
    pub fn remove_layout(&mut self, pair: &LayoutVariant) -> Result<(), SelectionError> {
        let Some(idx) = self.active.iter().position(|p| p == pair) else {
            return Err(SelectionError::NotActive(pair.clone()));
        };
        if self.applied.as_ref() == Some(pair) {
            return Err(SelectionError::InUse(pair.clone()));
        }
        self.active.remove(idx);
        Ok(())
    }
}

/// Group index at which `sub` (comma separated) appears in `all`.
///
/// Matching is element-wise on whole codes.
#[must_use]
pub fn find_layouts_index(all: &[String], sub: &str) -> Option<usize> {
    let wanted: Vec<&str> = sub.split(',').collect();
    if wanted.is_empty() || wanted.len() > all.len() {
        return None;
    }
    all.windows(wanted.len())
        .position(|window| window.iter().zip(&wanted).all(|(have, want)| have == want))
}

/// Appends the codes of `sub` to `all`, dropping trailing entries of `all`
/// so that the result fits `max_groups`. At least one entry of `all` is kept.
#[must_use]
pub fn merge_layouts(all: &[String], sub: &str, max_groups: usize) -> Vec<String> {
    let groups = max_groups.max(1);
    let n_all = all.iter().take_while(|code| !code.is_empty()).count();
    let sub: Vec<String> = sub
        .split(',')
        .take_while(|code| !code.is_empty())
        .map(str::to_string)
        .collect();

    let keep = if n_all + sub.len() > groups {
        groups.saturating_sub(sub.len()).max(1).min(n_all)
    } else {
        n_all
    };

    all[..keep].iter().cloned().chain(sub).collect()
}

/// Layouts, variants and options as applied to the keyboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutRecord {
    /// Keyboard model
    pub model: Option<String>,
    /// Layout per group
    pub layouts: Vec<String>,
    /// Variant per group
    pub variants: Vec<String>,
    /// Active options
    pub options: Vec<String>,
}

impl LayoutRecord {
    /// Record matching `selection`.
    #[must_use]
    pub fn from_selection(model: Option<String>, selection: &ActiveSelection) -> Self {
        Self {
            model,
            layouts: selection.layouts.iter().map(|pair| pair.layout.clone()).collect(),
            variants: selection
                .layouts
                .iter()
                .map(|pair| pair.variant_or_empty().to_string())
                .collect(),
            options: selection.options.clone(),
        }
    }
}

/// What to do for a layout change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSwitch {
    /// The requested layout is already the current group
    Unchanged,
    /// Activate `record` and lock `group`
    Apply {
        /// Record to activate
        record: LayoutRecord,
        /// Group to lock after activation
        group: usize,
    },
}

/// Plans switching to `layouts` (and optionally `variants` / `options`)
/// starting from the keyboard's `initial` record.
///
/// Requested codes already present in the initial record are selected by
/// group; anything else is appended under `max_groups`.
#[must_use]
pub fn plan_layout_switch(
    initial: &LayoutRecord,
    current_group: usize,
    layouts: &str,
    variants: Option<&str>,
    options: Option<&str>,
    max_groups: usize,
) -> LayoutSwitch {
    let split = |list: &str| list.split(',').map(str::to_string).collect::<Vec<_>>();

    let (new_layouts, group) = if initial.layouts.is_empty() {
        (split(layouts), None)
    } else if let Some(idx) = find_layouts_index(&initial.layouts, layouts) {
        if idx == current_group {
            return LayoutSwitch::Unchanged;
        }
        (initial.layouts.clone(), Some(idx))
    } else {
        let merged = merge_layouts(&initial.layouts, layouts, max_groups);
        let idx = find_layouts_index(&merged, layouts);
        (merged, idx)
    };

    let group = group.unwrap_or(0);

    // Variants stay aligned with layouts; requested ones land on the
    // requested group.
    let mut new_variants = initial.variants.clone();
    new_variants.resize(new_layouts.len(), String::new());
    if let Some(requested) = variants {
        for (slot, variant) in new_variants.iter_mut().skip(group).zip(requested.split(',')) {
            *slot = variant.to_string();
        }
    }

    let record = LayoutRecord {
        model: Some(
            initial
                .model
                .clone()
                .unwrap_or_else(|| FALLBACK_MODEL.to_string()),
        ),
        layouts: new_layouts,
        variants: new_variants,
        options: match options {
            Some(req) if !initial.options.is_empty() => {
                let mut merged = initial.options.clone();
                for option in parse_options(req) {
                    if !merged.contains(&option) {
                        merged.push(option);
                    }
                }
                merged
            }
            Some(req) => parse_options(req),
            None => initial.options.clone(),
        },
    };

    LayoutSwitch::Apply { record, group }
}

/// [`plan_layout_switch`] with the default group limit.
#[must_use]
pub fn plan_default_layout_switch(initial: &LayoutRecord, current_group: usize, layouts: &str) -> LayoutSwitch {
    plan_layout_switch(initial, current_group, layouts, None, None, DEFAULT_MAX_GROUPS)
}
