//! Error types for worklist-rs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The remote worklist source failed to answer a count or page request.
    #[error("worklist source error: {0}")]
    Remote(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad preferences file: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("cannot write preferences: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("traversal session already initialized")]
    AlreadyInitialized,

    #[error("traversal session not initialized")]
    NotInitialized,

    #[error("traversal session has no current item")]
    SessionFinished,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
