//! Tree operations for multilingual pages: insertion with language
//! inheritance, and translation creation.
//!
//! There are two distinct insertion entry points. `add_child` inherits the
//! parent's language, while `create_translation` grafts a page at root level
//! as the top of a new subtree for its language, the one place a page's
//! language may differ from its tree surroundings. Everything below a
//! translation root inherits that root's language through `add_child` like
//! any other subtree.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::registry::LanguageRegistry;
use crate::store::{NewPage, PageStore, TranslatedPage};

#[derive(Clone)]
pub struct PageTree {
    store: PageStore,
    registry: LanguageRegistry,
}

impl PageTree {
    pub fn new(store: PageStore, registry: LanguageRegistry) -> Self {
        Self { store, registry }
    }

    /// Insert a root-level page. Roots keep their requested language; each
    /// root is the language root of its own subtree.
    pub fn add_root(&self, page: NewPage) -> Result<TranslatedPage> {
        self.registry.get(&page.language)?;
        self.store.insert_root(&page)
    }

    /// Insert a page under `parent_id`. The parent's language wins: a
    /// mismatched requested language is overwritten, not rejected.
    pub fn add_child(&self, parent_id: i64, mut page: NewPage) -> Result<TranslatedPage> {
        let parent = self.store.page(parent_id)?;
        if page.language != parent.language {
            warn!(
                "Requested language '{}' for a child of page {} does not match \
                 parent language '{}', forcing parent language",
                page.language, parent_id, parent.language
            );
            page.language = parent.language.clone();
        }
        self.store.insert_child(parent_id, &page)
    }

    /// Create a translation of `page_id` in `language`.
    ///
    /// The new page is linked to the translation group's canonical page
    /// (translations of translations are flattened onto the original) and
    /// inserted at root level as the start of an independent subtree. With
    /// `copy_fields`, the canonical page's content fields are carried over
    /// and the copied slug is made unique among its new siblings; without it
    /// the content fields start blank. Descendants of the canonical page are
    /// not translated; each must be translated on its own.
    pub fn create_translation(
        &self,
        page_id: i64,
        language: &str,
        copy_fields: bool,
    ) -> Result<TranslatedPage> {
        let target = self.registry.get(language)?;
        let page = self.store.page(page_id)?;

        if target.code == page.language {
            return Err(Error::InvalidTranslation {
                page: page_id,
                language: target.code,
            });
        }

        let canonical = match page.canonical_id {
            Some(root_id) => self.store.page(root_id)?,
            None => page,
        };

        let fields = if copy_fields {
            NewPage {
                language: target.code.clone(),
                title: canonical.title.clone(),
                slug: canonical.slug.clone(),
                body: canonical.body.clone(),
            }
        } else {
            NewPage {
                language: target.code.clone(),
                ..NewPage::default()
            }
        };

        let created = self
            .store
            .insert_translation(canonical.id, &target.code, &fields)?;
        info!(
            "Created '{}' translation (page {}) of page {}",
            target.code, created.id, canonical.id
        );
        Ok(created)
    }

    /// Every other member of the page's translation group, ordered by the
    /// registry's language positions.
    ///
    /// With `live_only`, members whose language is no longer live are
    /// filtered out.
    pub fn translations(&self, page_id: i64, live_only: bool) -> Result<Vec<TranslatedPage>> {
        let page = self.store.page(page_id)?;
        let canonical_id = page.canonical_id.unwrap_or(page.id);

        let mut group = Vec::new();
        if canonical_id != page.id {
            group.push(self.store.page(canonical_id)?);
        }
        for translation in self.store.translations_of(canonical_id)? {
            if translation.id != page.id {
                group.push(translation);
            }
        }

        let mut ordered = Vec::new();
        for language in self.registry.list(live_only)? {
            if let Some(member) = group.iter().find(|p| p.language == language.code) {
                ordered.push(member.clone());
            }
        }
        Ok(ordered)
    }
}
