//! Language registry: single source of truth for the available languages.
//!
//! The registry is a read-only view over the administrator-managed language
//! rows in the page store. It is injected into the components that need it
//! rather than accessed through a global, so tests can construct isolated
//! registries over throwaway stores.

use crate::error::{Error, Result};
use crate::store::{Language, PageStore};

#[derive(Clone)]
pub struct LanguageRegistry {
    store: PageStore,
}

impl LanguageRegistry {
    pub fn new(store: PageStore) -> Self {
        Self { store }
    }

    /// Get the single language flagged as default.
    ///
    /// The administrator tooling keeps at most one default flag set, but the
    /// check is repeated here so a misconfigured store surfaces as a
    /// `Configuration` error instead of arbitrary behavior.
    pub fn default(&self) -> Result<Language> {
        let mut defaults = self.store.default_languages()?;
        match defaults.len() {
            0 => Err(Error::Configuration(
                "no default language configured".to_string(),
            )),
            1 => Ok(defaults.remove(0)),
            n => Err(Error::Configuration(format!(
                "{} languages flagged as default, expected exactly one",
                n
            ))),
        }
    }

    /// All languages in ascending `position` order.
    ///
    /// With `live_only`, languages not selectable for new content are
    /// filtered out.
    pub fn list(&self, live_only: bool) -> Result<Vec<Language>> {
        self.store.languages(live_only)
    }

    /// Get a language by its code.
    pub fn get(&self, code: &str) -> Result<Language> {
        self.store
            .language(code)?
            .ok_or_else(|| Error::UnknownLanguage(code.to_string()))
    }
}
