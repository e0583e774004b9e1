use std::path::PathBuf;

use scanner::ScanError;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid pattern {0:?}")]
    InvalidPattern(String),

    #[error("cannot step above the filesystem root")]
    Navigation,

    #[error("no directory matching '{token}' under '{}'", base.display())]
    NoMatchFound { token: String, base: PathBuf },

    #[error("index {index} is out of range for {count} matches of '{token}'")]
    IndexOutOfRange {
        token: String,
        index: usize,
        count: usize,
    },

    #[error(transparent)]
    FileSystem(#[from] ScanError),
}
