use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything the scanning and cleaning core can report about a single entry.
///
/// None of these are fatal. Scans collect them into a `skipped` list and keep
/// going; the cleaner records them per item.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read {}: {source}", path.display())]
    UnreadablePath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed transcript {}: {reason}", path.display())]
    MalformedArchive { path: PathBuf, reason: String },

    #[error("storage root does not exist: {}", .0.display())]
    MissingStorageRoot(PathBuf),

    #[error("failed to delete {}: {source}", path.display())]
    DeletionFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("already deleted: {}", .0.display())]
    AlreadyDeleted(PathBuf),
}

impl Error {
    pub fn path(&self) -> &PathBuf {
        match self {
            Error::UnreadablePath { path, .. }
            | Error::MalformedArchive { path, .. }
            | Error::DeletionFailure { path, .. } => path,
            Error::MissingStorageRoot(path) | Error::AlreadyDeleted(path) => path,
        }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::UnreadablePath {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
