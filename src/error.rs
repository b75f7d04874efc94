use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("language configuration error: {0}")]
    Configuration(String),

    #[error("unknown language code: '{0}'")]
    UnknownLanguage(String),

    #[error("page {0} not found")]
    PageNotFound(i64),

    #[error("page {page} is already in language '{language}'")]
    InvalidTranslation { page: i64, language: String },

    #[error("page {page} already has a translation in language '{language}'")]
    DuplicateTranslation { page: i64, language: String },
}
