//! Error type for jar storage, selection, and search.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FortuneError {
    #[error("no fortune jars exist yet")]
    NoJars,

    #[error("jar not found: {0}")]
    JarNotFound(String),

    /// The jar exists but holds no fortunes.
    #[error("jar is empty: {0}")]
    EmptyJar(String),

    #[error("fortune not found: {jar}/{id}")]
    FortuneNotFound { jar: String, id: i64 },

    #[error("invalid jar name: {0:?}")]
    InvalidJarName(String),

    #[error("search pattern must not be empty")]
    EmptyPattern,

    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl FortuneError {
    /// True for the "nothing to show" family: the caller asked for something
    /// that does not exist rather than hitting a malfunction.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FortuneError::NoJars
                | FortuneError::JarNotFound(_)
                | FortuneError::EmptyJar(_)
                | FortuneError::FortuneNotFound { .. }
        )
    }
}

pub type Result<T, E = FortuneError> = std::result::Result<T, E>;
