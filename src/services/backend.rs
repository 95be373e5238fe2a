//! Pluggable keyboard drawing backends.
//!
//! A backend only ever sees the finished [`KeyLayout`] and the group to show.
//! The built-in [`TextBackend`] draws the keyboard as plain text, which is
//! handy for logs and tests; toolkits register their own implementations.

use anyhow::{anyhow, Context, Result};
use std::io::Write;
use tracing::debug;

use crate::models::KeyLayout;

/// Name of the built-in text backend.
pub const TEXT_BACKEND: &str = "text";

/// Trait for keyboard drawing backends, allowing toolkits to plug in.
pub trait KeyboardBackend {
    /// Unique backend name used for selection.
    fn name(&self) -> &str;

    /// Draws `layout` showing keysym `group` into `out`.
    fn render(&self, layout: &KeyLayout, group: usize, out: &mut dyn Write) -> Result<()>;
}

/// Draws each row as space separated key labels.
///
/// Keys whose base keysym has no label show their key name in brackets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBackend;

impl KeyboardBackend for TextBackend {
    fn name(&self) -> &str {
        TEXT_BACKEND
    }

    fn render(&self, layout: &KeyLayout, group: usize, out: &mut dyn Write) -> Result<()> {
        for row in &layout.rows {
            let labels: Vec<String> = row
                .keys
                .iter()
                .map(|key| {
                    let shown = key.effective_group(group, 0);
                    key.label(shown)
                        .unwrap_or_else(|| format!("[{}]", key.name))
                })
                .collect();
            writeln!(out, "{}", labels.join(" ")).context("Failed to write keyboard row")?;
        }
        Ok(())
    }
}

/// Named set of backends with one selected.
pub struct BackendRegistry {
    backends: Vec<Box<dyn KeyboardBackend>>,
    selected: usize,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self {
            backends: vec![Box::new(TextBackend)],
            selected: 0,
        }
    }
}

impl BackendRegistry {
    /// Registry with only the text backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `backend`, replacing any backend with the same name.
    pub fn register(&mut self, backend: Box<dyn KeyboardBackend>) {
        match self.position(backend.name()) {
            Some(idx) => self.backends[idx] = backend,
            None => {
                debug!("Registered keyboard backend {}", backend.name());
                self.backends.push(backend);
            }
        }
    }

    /// Names of all registered backends in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    /// Selects the backend called `name`.
    pub fn select(&mut self, name: &str) -> Result<()> {
        let idx = self
            .position(name)
            .ok_or_else(|| anyhow!("Unknown keyboard backend: {}", name))?;
        self.selected = idx;
        Ok(())
    }

    /// The selected backend.
    #[must_use]
    pub fn selected(&self) -> &dyn KeyboardBackend {
        self.backends[self.selected].as_ref()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.backends.iter().position(|backend| backend.name() == name)
    }
}
