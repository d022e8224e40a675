use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access watched directory '{path}': {reason}")]
    DirectoryAccess { path: String, reason: String },

    #[error("request file '{file}' is not valid structured data: {reason}")]
    ContentParse { file: String, reason: String },

    #[error("cannot read request file '{file}': {reason}")]
    FileRead { file: String, reason: String },

    #[error("Invalid cursor: {0}")]
    Cursor(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Hashing error: {0}")]
    Hash(String),
}

impl Error {
    /// Name of the request file this error is about, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            Error::ContentParse { file, .. } | Error::FileRead { file, .. } => Some(file),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Cursor(e.to_string())
    }
}
