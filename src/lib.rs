//! Multilingual page trees with linked translations.
//!
//! Pages live in a hierarchical tree and each page belongs to exactly one
//! language. Pages in different languages can be linked as translations of a
//! shared canonical page, and sub-pages always take the language of their
//! position in the tree.
//!
//! # Example
//!
//! ```no_run
//! use pagetrans::{Config, LanguageRegistry, NewPage, PageStore, PageTree};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let store = PageStore::new(&config.database_path)?;
//! store.add_language("en", true, 0, true)?;
//! store.add_language("nl", false, 1, true)?;
//!
//! let registry = LanguageRegistry::new(store.clone());
//! let tree = PageTree::new(store, registry);
//!
//! let home = tree.add_root(NewPage {
//!     language: "en".to_string(),
//!     title: "Home".to_string(),
//!     ..NewPage::default()
//! })?;
//!
//! // A linked Dutch copy, rooting its own subtree
//! let home_nl = tree.create_translation(home.id, "nl", true)?;
//! assert_eq!(home_nl.canonical_id, Some(home.id));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod registry;
pub mod store;
pub mod tree;

pub use config::Config;
pub use error::{Error, Result};
pub use registry::LanguageRegistry;
pub use store::{Language, NewPage, PageStore, TranslatedPage};
pub use tree::PageTree;
