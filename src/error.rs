use std::path::PathBuf;

/// Errors surfaced at the library boundary.
///
/// All variants are fatal at the point they're raised; the core never retries
/// and never attempts partial recovery (the index is in-memory and
/// deterministic given its inputs).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error reading/writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("corrupted index: {0}")]
    Corrupt(String),

    #[error("allocation failed: {0}")]
    Alloc(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
