//! Translation hook for user-facing pad text.
//!
//! Message catalogs are not handled here. Callers plug in whatever lookup they
//! use (gettext, fluent, a static map) through [`Translator`].

/// Looks up the translation of `text` in an optional message domain.
pub trait Translator {
    /// Returns the translated text, or `text` itself when there is none.
    fn translate(&self, domain: Option<&str>, text: &str) -> String;
}

/// Translator that returns every message unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, _domain: Option<&str>, text: &str) -> String {
        text.to_string()
    }
}

impl<F> Translator for F
where
    F: Fn(Option<&str>, &str) -> String,
{
    fn translate(&self, domain: Option<&str>, text: &str) -> String {
        self(domain, text)
    }
}
