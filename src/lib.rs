// Declare modules
pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod parse;
pub mod progress;
pub mod validate;

// Re-export key types for easier use
pub use error::{Result, WordDbError};
pub use export::{ConvertSummary, ExportOptions, convert_csv};
pub use import::{LevelUpdateSummary, SourceImportSummary, WordImportOptions, WordImportSummary};
pub use models::{LanguageInfo, Source, Word, WordEntry, WordGroup, WordList};
pub use progress::{ProgressCallback, ProgressUpdate};
pub use validate::Rejection;

use log::info;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// File name used for a language's database when no path is given.
pub fn default_db_path(language_code: &str) -> PathBuf {
    PathBuf::from(format!("word_{}.db", language_code.trim().to_lowercase()))
}

/// An open vocabulary database. Every operation goes through this handle.
pub struct WordDb {
    conn: Connection,
    db_file_path: PathBuf,
}

impl WordDb {
    /// Creates (or reuses) the database at `path`, makes sure every table and
    /// index exists and records `language` unless a language row is already
    /// present.
    pub fn create(path: &Path, language: &LanguageInfo) -> Result<Self> {
        info!("Creating word database at {:?}", path);
        let mut conn = db::open_db_connection(path, true)?;
        db::initialize_database(&mut conn)?;
        db::ensure_language_info(&conn, language)?;
        Ok(WordDb {
            conn,
            db_file_path: path.to_path_buf(),
        })
    }

    /// Opens an existing, initialized database.
    pub fn open(path: &Path) -> Result<Self> {
        info!("Using database path: {:?}", path);
        let conn = db::open_db_connection(path, false)?;
        if !db::has_word_schema(&conn)? {
            return Err(WordDbError::SchemaMissing(path.to_path_buf()));
        }
        Ok(WordDb {
            conn,
            db_file_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_file_path
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn language_info(&self) -> Result<LanguageInfo> {
        db::language_info(&self.conn)?.ok_or(WordDbError::LanguageInfoMissing)
    }

    /// Resolves the language code to use: an explicit one wins over the code
    /// stored in `language_info`.
    pub fn language_code(&self, explicit: Option<&str>) -> Result<String> {
        match explicit {
            Some(code) => Ok(code.trim().to_string()),
            None => Ok(self.language_info()?.language_code),
        }
    }

    // --- Imports ---

    /// Imports a word feed in one transaction. Rejected rows are skipped and
    /// counted; the transaction is committed once the file is processed.
    pub fn import_words(
        &mut self,
        csv_path: &Path,
        options: &WordImportOptions,
        progress: Option<&mut ProgressCallback>,
    ) -> Result<WordImportSummary> {
        let lines = parse::read_word_records(csv_path)?;
        let tx = self.conn.transaction()?;
        let summary = import::import_words(&tx, &lines, options, progress)?;
        tx.commit()?;
        Ok(summary)
    }

    /// Imports the rows of a source feed that belong to `language_code`.
    pub fn import_sources(
        &mut self,
        csv_path: &Path,
        language_code: &str,
        progress: Option<&mut ProgressCallback>,
    ) -> Result<SourceImportSummary> {
        let lines = parse::read_source_records(csv_path)?;
        let tx = self.conn.transaction()?;
        let summary = import::import_sources(&tx, &lines, language_code, progress)?;
        tx.commit()?;
        Ok(summary)
    }

    /// Applies a `word,level` file to words already in the database.
    pub fn update_levels(
        &mut self,
        csv_path: &Path,
        progress: Option<&mut ProgressCallback>,
    ) -> Result<LevelUpdateSummary> {
        let lines = parse::read_level_records(csv_path)?;
        let tx = self.conn.transaction()?;
        let summary = import::update_levels(&tx, &lines, progress)?;
        tx.commit()?;
        Ok(summary)
    }

    // --- Queries ---

    pub fn sources(&self) -> Result<Vec<Source>> {
        db::list_sources(&self.conn)
    }

    pub fn word(&self, word: &str) -> Result<Option<Word>> {
        db::get_word(&self.conn, word)
    }

    pub fn word_count(&self) -> Result<u64> {
        db::word_count(&self.conn)
    }

    pub fn sources_for_word(&self, word: &str) -> Result<Vec<String>> {
        db::sources_for_word(&self.conn, word)
    }

    // --- Export ---

    /// Writes the length-grouped export. Returns the number of words written,
    /// or `None` when no word has the requested length (no file is written).
    pub fn export(
        &self,
        output: &Path,
        language_code: &str,
        options: &ExportOptions,
    ) -> Result<Option<usize>> {
        export::export_words(&self.conn, language_code, output, options)
    }
}
