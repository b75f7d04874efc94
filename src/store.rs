use chrono::Utc;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A content language, managed by an administrator and read-only to the
/// tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Unique identifier, e.g. an ISO language tag ("en", "nl")
    pub code: String,

    /// Whether this is the default language (at most one should be true)
    pub is_default: bool,

    /// Display/iteration order, ascending
    pub position: i32,

    /// Whether the language is selectable for new content
    pub live: bool,
}

/// A page node in the content tree.
///
/// `language` and `canonical_id` are fixed at creation; only the content
/// fields (`title`, `slug`, `body`) may change afterwards via `save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedPage {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub language: String,
    /// The page this one is a translation of; `None` means this page is
    /// itself the canonical original.
    pub canonical_id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub created_at: String,
}

impl TranslatedPage {
    pub fn is_canonical(&self) -> bool {
        self.canonical_id.is_none()
    }
}

/// Caller-supplied fields for a page insert. The store assigns the id and
/// timestamp and normalizes the slug (derived from the title when empty).
#[derive(Debug, Clone, Default)]
pub struct NewPage {
    pub language: String,
    pub title: String,
    pub slug: String,
    pub body: String,
}

// Slug characters outside [a-z0-9] collapse to hyphens (cached for reuse)
static NON_SLUG_CHARS: OnceLock<Regex> = OnceLock::new();

fn slugify(raw: &str) -> String {
    let pattern = NON_SLUG_CHARS.get_or_init(|| Regex::new("[^a-z0-9]+").expect("valid regex"));
    let slug = pattern
        .replace_all(&raw.to_lowercase(), "-")
        .trim_matches('-')
        .to_string();
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

#[derive(Clone)]
pub struct PageStore {
    conn: Arc<Mutex<Connection>>,
}

impl PageStore {
    /// Open the database connection and create tables
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS languages (
                code TEXT PRIMARY KEY,
                is_default INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL DEFAULT 0,
                live INTEGER NOT NULL DEFAULT 1
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                parent_id INTEGER,
                language TEXT NOT NULL,
                canonical_id INTEGER,
                title TEXT NOT NULL DEFAULT '',
                slug TEXT NOT NULL DEFAULT '',
                body TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        info!("Opened page store at {}", database_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // ==================== Language rows (administrator-facing) ====================

    /// Register a language. Fails if the code is already registered.
    pub fn add_language(
        &self,
        code: &str,
        is_default: bool,
        position: i32,
        live: bool,
    ) -> Result<Language> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO languages (code, is_default, position, live) VALUES (?1, ?2, ?3, ?4)",
            params![code, is_default as i64, position, live as i64],
        )?;

        Ok(Language {
            code: code.to_string(),
            is_default,
            position,
            live,
        })
    }

    /// Flag `code` as the default language and clear the flag everywhere else,
    /// in one transaction.
    pub fn set_default(&self, code: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("BEGIN IMMEDIATE", [])?;

        match Self::set_default_inner(&conn, code) {
            Ok(()) => {
                conn.execute("COMMIT", [])?;
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    fn set_default_inner(conn: &Connection, code: &str) -> Result<()> {
        let rows = conn.execute(
            "UPDATE languages SET is_default = 1 WHERE code = ?1",
            params![code],
        )?;
        if rows == 0 {
            return Err(Error::UnknownLanguage(code.to_string()));
        }
        conn.execute(
            "UPDATE languages SET is_default = 0 WHERE code != ?1",
            params![code],
        )?;
        Ok(())
    }

    pub fn language(&self, code: &str) -> Result<Option<Language>> {
        let conn = self.conn.lock().unwrap();
        let language = conn
            .query_row(
                "SELECT code, is_default, position, live FROM languages WHERE code = ?1",
                params![code],
                Self::language_from_row,
            )
            .optional()?;
        Ok(language)
    }

    /// All languages ordered by ascending position, optionally only live ones.
    pub fn languages(&self, live_only: bool) -> Result<Vec<Language>> {
        let conn = self.conn.lock().unwrap();
        let sql = if live_only {
            "SELECT code, is_default, position, live FROM languages
             WHERE live = 1 ORDER BY position ASC"
        } else {
            "SELECT code, is_default, position, live FROM languages ORDER BY position ASC"
        };
        let mut stmt = conn.prepare(sql)?;
        let languages = stmt
            .query_map([], Self::language_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(languages)
    }

    /// Every language flagged default. The registry treats anything other
    /// than exactly one row as a configuration error.
    pub fn default_languages(&self) -> Result<Vec<Language>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT code, is_default, position, live FROM languages
             WHERE is_default = 1 ORDER BY position ASC",
        )?;
        let languages = stmt
            .query_map([], Self::language_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(languages)
    }

    /// Whether any page references this language.
    pub fn has_pages(&self, code: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE language = ?1",
            params![code],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn language_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Language> {
        Ok(Language {
            code: row.get(0)?,
            is_default: row.get::<_, i64>(1)? != 0,
            position: row.get(2)?,
            live: row.get::<_, i64>(3)? != 0,
        })
    }

    // ==================== Tree primitives ====================

    /// Insert a root-level page with the requested language.
    pub fn insert_root(&self, fields: &NewPage) -> Result<TranslatedPage> {
        let conn = self.conn.lock().unwrap();
        Self::insert_page(&conn, None, None, &fields.language, fields)
    }

    /// Insert a page under `parent_id` with the requested language. The
    /// language-inheritance policy lives in the tree layer, not here.
    pub fn insert_child(&self, parent_id: i64, fields: &NewPage) -> Result<TranslatedPage> {
        let conn = self.conn.lock().unwrap();
        if Self::fetch_page(&conn, parent_id)?.is_none() {
            return Err(Error::PageNotFound(parent_id));
        }
        Self::insert_page(&conn, Some(parent_id), None, &fields.language, fields)
    }

    pub fn page(&self, id: i64) -> Result<TranslatedPage> {
        let conn = self.conn.lock().unwrap();
        Self::fetch_page(&conn, id)?.ok_or(Error::PageNotFound(id))
    }

    pub fn roots(&self) -> Result<Vec<TranslatedPage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, parent_id, language, canonical_id, title, slug, body, created_at
             FROM pages WHERE parent_id IS NULL ORDER BY id",
        )?;
        let pages = stmt
            .query_map([], Self::page_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    pub fn children(&self, parent_id: i64) -> Result<Vec<TranslatedPage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, parent_id, language, canonical_id, title, slug, body, created_at
             FROM pages WHERE parent_id = ?1 ORDER BY id",
        )?;
        let pages = stmt
            .query_map(params![parent_id], Self::page_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    /// Persist content-field edits. Language and canonical link are fixed at
    /// creation and never updated here.
    pub fn save(&self, page: &TranslatedPage) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE pages SET title = ?1, slug = ?2, body = ?3 WHERE id = ?4",
            params![page.title, page.slug, page.body, page.id],
        )?;
        if rows == 0 {
            return Err(Error::PageNotFound(page.id));
        }
        Ok(())
    }

    // ==================== Translation links ====================

    /// Direct translations of a canonical page.
    pub fn translations_of(&self, canonical_id: i64) -> Result<Vec<TranslatedPage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, parent_id, language, canonical_id, title, slug, body, created_at
             FROM pages WHERE canonical_id = ?1 ORDER BY id",
        )?;
        let pages = stmt
            .query_map(params![canonical_id], Self::page_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    /// The translation of a canonical page in one language, if any.
    pub fn translation_in(&self, canonical_id: i64, code: &str) -> Result<Option<TranslatedPage>> {
        let conn = self.conn.lock().unwrap();
        let page = conn
            .query_row(
                "SELECT id, parent_id, language, canonical_id, title, slug, body, created_at
                 FROM pages WHERE canonical_id = ?1 AND language = ?2",
                params![canonical_id, code],
                Self::page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    /// Insert a translation linked to `canonical_id`, rooting a new subtree.
    ///
    /// The occupancy check and the insert share one transaction so that two
    /// concurrent requests for the same (canonical, language) pair cannot
    /// both pass validation.
    pub(crate) fn insert_translation(
        &self,
        canonical_id: i64,
        language: &str,
        fields: &NewPage,
    ) -> Result<TranslatedPage> {
        let conn = self.conn.lock().unwrap();
        conn.execute("BEGIN IMMEDIATE", [])?;

        match Self::insert_translation_inner(&conn, canonical_id, language, fields) {
            Ok(page) => {
                conn.execute("COMMIT", [])?;
                Ok(page)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    fn insert_translation_inner(
        conn: &Connection,
        canonical_id: i64,
        language: &str,
        fields: &NewPage,
    ) -> Result<TranslatedPage> {
        let canonical =
            Self::fetch_page(conn, canonical_id)?.ok_or(Error::PageNotFound(canonical_id))?;

        // The canonical page's own language counts as occupied
        if canonical.language == language {
            return Err(Error::DuplicateTranslation {
                page: canonical_id,
                language: language.to_string(),
            });
        }

        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE canonical_id = ?1 AND language = ?2",
            params![canonical_id, language],
            |row| row.get(0),
        )?;
        if taken > 0 {
            return Err(Error::DuplicateTranslation {
                page: canonical_id,
                language: language.to_string(),
            });
        }

        Self::insert_page(conn, None, Some(canonical_id), language, fields)
    }

    // ==================== Internals ====================

    fn insert_page(
        conn: &Connection,
        parent_id: Option<i64>,
        canonical_id: Option<i64>,
        language: &str,
        fields: &NewPage,
    ) -> Result<TranslatedPage> {
        let base = if fields.slug.is_empty() {
            slugify(&fields.title)
        } else {
            slugify(&fields.slug)
        };
        let slug = Self::unique_slug(conn, parent_id, &base)?;
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO pages (parent_id, language, canonical_id, title, slug, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                parent_id,
                language,
                canonical_id,
                fields.title,
                slug,
                fields.body,
                created_at
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted page {} ({}) under parent {:?}", id, language, parent_id);

        Ok(TranslatedPage {
            id,
            parent_id,
            language: language.to_string(),
            canonical_id,
            title: fields.title.clone(),
            slug,
            body: fields.body.clone(),
            created_at,
        })
    }

    /// Append -2, -3, ... until the slug is unique among its tree siblings.
    fn unique_slug(conn: &Connection, parent_id: Option<i64>, base: &str) -> Result<String> {
        let mut candidate = base.to_string();
        let mut suffix = 2;
        loop {
            let taken: i64 = conn.query_row(
                "SELECT COUNT(*) FROM pages WHERE parent_id IS ?1 AND slug = ?2",
                params![parent_id, candidate],
                |row| row.get(0),
            )?;
            if taken == 0 {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
    }

    fn fetch_page(conn: &Connection, id: i64) -> Result<Option<TranslatedPage>> {
        let page = conn
            .query_row(
                "SELECT id, parent_id, language, canonical_id, title, slug, body, created_at
                 FROM pages WHERE id = ?1",
                params![id],
                Self::page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn page_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TranslatedPage> {
        Ok(TranslatedPage {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            language: row.get(2)?,
            canonical_id: row.get(3)?,
            title: row.get(4)?,
            slug: row.get(5)?,
            body: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}
