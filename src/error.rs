use thiserror::Error;

/// Errors surfaced by the guest list.
///
/// Edits and deletes aimed at a guest that no longer exists are not errors:
/// the roster reports them as "nothing changed". Unparseable table numbers are
/// read as table 0 and never reach this type either.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field was empty when adding a guest. No record is created.
    #[error("validation error: {0}")]
    Validation(String),

    /// The spreadsheet service could not be reached, refused the credentials,
    /// or the requested event does not exist there.
    #[error("connection error: {0}")]
    Connection(String),

    /// Local file storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("pdf error: {0}")]
    Pdf(String),

    #[error("template error: {0}")]
    Template(String),
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
