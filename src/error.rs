use std::path::PathBuf;
use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, WordDbError>;

/// Fatal errors that abort a whole run.
///
/// Problems with a single input record are not errors at this level; they are
/// reported as a [`crate::validate::Rejection`] and the run continues.
#[derive(Error, Debug)]
pub enum WordDbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not open database '{}'. Make sure the language database exists.", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("Could not find input file '{}'", .0.display())]
    InputFileNotFound(PathBuf),

    #[error("CSV file '{}' must contain the column(s): {}", file.display(), columns.join(", "))]
    MissingColumns { file: PathBuf, columns: Vec<String> },

    #[error("Database '{}' has no word schema; run `init` first", .0.display())]
    SchemaMissing(PathBuf),

    #[error("Database has no language_info row")]
    LanguageInfoMissing,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
