use crate::error::{Result, WordDbError};
use crate::models::{LanguageInfo, NewSource, NewWord, Source, Word};
use crate::validate::{Rejection, RowOutcome};
use log::{debug, info, warn};
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, Row, params};
use std::fs;
use std::path::Path;

// --- Schema Definition ---

const SCHEMA_VERSION: u32 = 1;

const CREATE_METADATA_TABLE: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

const CREATE_LANGUAGE_INFO_TABLE: &str = "
CREATE TABLE IF NOT EXISTS language_info (
    language_name TEXT NOT NULL,
    english_name TEXT NOT NULL,
    language_code TEXT NOT NULL
);";

const CREATE_SOURCES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS sources (
    source_id INTEGER PRIMARY KEY AUTOINCREMENT,
    short_name TEXT NOT NULL UNIQUE,
    description TEXT,
    CHECK (length(short_name) = 4),
    CHECK (length(description) <= 120)
);";

// `length` is the stored column, `length(word)` the SQL function.
const CREATE_WORDS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS words (
    word_id INTEGER PRIMARY KEY AUTOINCREMENT,
    word TEXT NOT NULL UNIQUE,
    length INTEGER NOT NULL,
    en_translation TEXT,
    frequency REAL,
    level INTEGER NOT NULL DEFAULT 5,
    is_answer INTEGER NOT NULL DEFAULT 0, -- 0 for false, 1 for true
    categories TEXT,
    CHECK (length(word) <= 15),
    CHECK (length >= 1 AND length <= 15),
    CHECK (length = length(word)),
    CHECK (length(en_translation) <= 120),
    CHECK (frequency >= 0 AND frequency <= 1.0),
    CHECK (level >= 0 AND level <= 10),
    CHECK (is_answer IN (0, 1))
);";

const CREATE_WORD_SOURCES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS word_sources (
    word_id INTEGER NOT NULL,
    source_id INTEGER NOT NULL,
    PRIMARY KEY (word_id, source_id),
    FOREIGN KEY (word_id) REFERENCES words(word_id),
    FOREIGN KEY (source_id) REFERENCES sources(source_id)
);";

// --- Indices ---

const CREATE_WORD_LENGTH_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_words_length ON words (length);";
const CREATE_WORD_LEVEL_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_words_level ON words (level);";
const CREATE_WORD_IS_ANSWER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_words_is_answer ON words (is_answer);";
const CREATE_WORD_SOURCES_SOURCE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_word_sources_source ON word_sources (source_id);";

const WORD_TABLES: [&str; 4] = ["language_info", "sources", "words", "word_sources"];

// --- Connection ---

/// Opens the database at `path`.
///
/// With `create` set the file (and its parent directory) is created if
/// needed. Without it a missing file is reported as
/// [`WordDbError::DatabaseNotFound`] instead of silently creating an empty
/// database.
pub fn open_db_connection(path: &Path, create: bool) -> Result<Connection> {
    let flags = if create {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
    } else {
        if !path.is_file() {
            return Err(WordDbError::DatabaseNotFound(path.to_path_buf()));
        }
        OpenFlags::SQLITE_OPEN_READ_WRITE
    };

    let conn = Connection::open_with_flags(path, flags)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

// --- Initialization Function ---

/// Creates all tables and indices if they don't exist and records the schema
/// version. Safe to run against an already initialized database.
pub fn initialize_database(conn: &mut Connection) -> Result<()> {
    info!(
        "Initializing database schema (version {})...",
        SCHEMA_VERSION
    );
    let tx = conn.transaction()?;

    tx.execute(CREATE_METADATA_TABLE, [])?;
    tx.execute(CREATE_LANGUAGE_INFO_TABLE, [])?;
    tx.execute(CREATE_SOURCES_TABLE, [])?;
    tx.execute(CREATE_WORDS_TABLE, [])?;
    tx.execute(CREATE_WORD_SOURCES_TABLE, [])?;

    tx.execute(CREATE_WORD_LENGTH_INDEX, [])?;
    tx.execute(CREATE_WORD_LEVEL_INDEX, [])?;
    tx.execute(CREATE_WORD_IS_ANSWER_INDEX, [])?;
    tx.execute(CREATE_WORD_SOURCES_SOURCE_INDEX, [])?;

    let existing_version: Option<String> = tx
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match existing_version {
        Some(v_str) => match v_str.parse::<u32>() {
            Ok(v) if v == SCHEMA_VERSION => {
                debug!("Database schema version ({}) matches expected version.", v);
            }
            Ok(v) => {
                warn!(
                    "Database schema version ({}) differs from expected ({}). No migration is performed.",
                    v, SCHEMA_VERSION
                );
            }
            Err(_) => {
                warn!("Unreadable schema version '{}' in metadata table.", v_str);
            }
        },
        None => {
            tx.execute(
                "INSERT INTO metadata (key, value) VALUES ('schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()],
            )?;
            info!("Set initial schema version in metadata table.");
        }
    }

    tx.commit()?;
    info!("Database schema initialization complete.");
    Ok(())
}

/// True when every word-database table is present.
pub fn has_word_schema(conn: &Connection) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    for table in WORD_TABLES {
        let count: i64 = stmt.query_row([table], |row| row.get(0))?;
        if count == 0 {
            debug!("Table '{}' is missing", table);
            return Ok(false);
        }
    }
    Ok(true)
}

// --- Language info ---

pub fn language_info(conn: &Connection) -> Result<Option<LanguageInfo>> {
    let info = conn
        .query_row(
            "SELECT language_name, english_name, language_code FROM language_info ORDER BY rowid LIMIT 1",
            [],
            |row| {
                Ok(LanguageInfo {
                    language_name: row.get(0)?,
                    english_name: row.get(1)?,
                    language_code: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(info)
}

/// Writes the language row unless one already exists. An existing row always
/// wins and is returned.
pub fn ensure_language_info(conn: &Connection, info: &LanguageInfo) -> Result<LanguageInfo> {
    if let Some(existing) = language_info(conn)? {
        if &existing != info {
            warn!(
                "Database already describes {} ({}); keeping it instead of {} ({}).",
                existing.english_name, existing.language_code, info.english_name, info.language_code
            );
        }
        return Ok(existing);
    }
    conn.execute(
        "INSERT INTO language_info (language_name, english_name, language_code) VALUES (?1, ?2, ?3)",
        params![info.language_name, info.english_name, info.language_code],
    )?;
    info!("Recorded language info for {}", info.language_code);
    Ok(info.clone())
}

// --- Writes ---

/// Turns a constraint violation into a per-row [`Rejection`]. Any other
/// database error stays fatal.
fn reject_on_constraint(err: rusqlite::Error) -> Result<Rejection> {
    match &err {
        rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
            match e.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Ok(Rejection::Duplicate),
                _ => Ok(Rejection::Constraint(
                    msg.clone().unwrap_or_else(|| e.to_string()),
                )),
            }
        }
        _ => Err(err.into()),
    }
}

/// Inserts a validated word and returns its row id. A word that already
/// exists is rejected as [`Rejection::Duplicate`] and left untouched.
pub fn insert_word(conn: &Connection, word: &NewWord) -> Result<RowOutcome<i64>> {
    let inserted = conn.execute(
        "INSERT INTO words (word, en_translation, length, level, is_answer, frequency, categories)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            word.word,
            word.en_translation,
            word.length() as i64,
            word.level,
            word.is_answer,
            word.frequency,
            word.categories,
        ],
    );
    match inserted {
        Ok(_) => Ok(Ok(conn.last_insert_rowid())),
        Err(e) => reject_on_constraint(e).map(Err),
    }
}

pub fn insert_source(conn: &Connection, source: &NewSource) -> Result<RowOutcome<i64>> {
    let inserted = conn.execute(
        "INSERT INTO sources (short_name, description) VALUES (?1, ?2)",
        params![source.short_name, source.description],
    );
    match inserted {
        Ok(_) => Ok(Ok(conn.last_insert_rowid())),
        Err(e) => reject_on_constraint(e).map(Err),
    }
}

pub fn find_source_id(conn: &Connection, short_name: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT source_id FROM sources WHERE short_name = ?1",
            [short_name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Links a word to a source. Returns `false` when the link already existed.
pub fn link_word_source(conn: &Connection, word_id: i64, source_id: i64) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO word_sources (word_id, source_id) VALUES (?1, ?2)",
        params![word_id, source_id],
    )?;
    Ok(inserted > 0)
}

/// Sets the level of the word matching `word` exactly. Returns the number of
/// rows changed, which is 0 when the word is not in the table.
pub fn update_word_level(conn: &Connection, word: &str, level: u8) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE words SET level = ?1 WHERE word = ?2",
        params![level, word],
    )?;
    Ok(changed)
}

// --- Reads ---

fn row_to_word(row: &Row) -> std::result::Result<Word, rusqlite::Error> {
    Ok(Word {
        id: row.get(0)?,
        word: row.get(1)?,
        length: row.get(2)?,
        en_translation: row.get(3)?,
        frequency: row.get(4)?,
        level: row.get(5)?,
        is_answer: row.get(6)?,
        categories: row.get(7)?,
    })
}

pub fn get_word(conn: &Connection, word: &str) -> Result<Option<Word>> {
    let found = conn
        .query_row(
            "SELECT word_id, word, length, en_translation, frequency, level, is_answer, categories
             FROM words WHERE word = ?1",
            [word],
            row_to_word,
        )
        .optional()?;
    Ok(found)
}

pub fn word_count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?;
    Ok(count as u64)
}

/// `(word, translation)` pairs of the given length, in insertion order. A
/// missing translation reads as an empty string.
pub fn words_of_length(conn: &Connection, length: usize) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT word, COALESCE(en_translation, '') FROM words
         WHERE length = ?1 ORDER BY word_id",
    )?;
    let rows = stmt.query_map([length as i64], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut pairs = Vec::new();
    for pair in rows {
        pairs.push(pair?);
    }
    Ok(pairs)
}

pub fn list_sources(conn: &Connection) -> Result<Vec<Source>> {
    let mut stmt =
        conn.prepare("SELECT source_id, short_name, description FROM sources ORDER BY short_name")?;
    let rows = stmt.query_map([], |row| {
        Ok(Source {
            id: row.get(0)?,
            short_name: row.get(1)?,
            description: row.get(2)?,
        })
    })?;
    let mut sources = Vec::new();
    for source in rows {
        sources.push(source?);
    }
    Ok(sources)
}

/// Short names of every source linked to `word`, sorted.
pub fn sources_for_word(conn: &Connection, word: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT s.short_name FROM word_sources ws
         JOIN words w ON w.word_id = ws.word_id
         JOIN sources s ON s.source_id = ws.source_id
         WHERE w.word = ?1 ORDER BY s.short_name",
    )?;
    let rows = stmt.query_map([word], |row| row.get(0))?;
    let mut names = Vec::new();
    for name in rows {
        names.push(name?);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        initialize_database(&mut conn).unwrap();
        conn
    }

    fn new_word(word: &str, translation: &str) -> NewWord {
        NewWord {
            word: word.to_string(),
            en_translation: translation.to_string(),
            level: 5,
            is_answer: true,
            frequency: None,
            categories: None,
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut conn = test_conn();
        initialize_database(&mut conn).unwrap();
        assert!(has_word_schema(&conn).unwrap());
        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM metadata", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn test_empty_database_has_no_schema() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!has_word_schema(&conn).unwrap());
    }

    #[test]
    fn test_duplicate_word_is_rejected_without_overwrite() {
        let conn = test_conn();
        assert!(insert_word(&conn, &new_word("hola", "hello")).unwrap().is_ok());
        let second = insert_word(&conn, &new_word("hola", "hi")).unwrap();
        assert_eq!(second, Err(Rejection::Duplicate));
        let stored = get_word(&conn, "hola").unwrap().unwrap();
        assert_eq!(stored.en_translation.as_deref(), Some("hello"));
        assert_eq!(stored.length, 4);
        assert_eq!(word_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_check_constraint_is_a_row_rejection() {
        let conn = test_conn();
        let mut word = new_word("hola", "hello");
        word.level = 11;
        let outcome = insert_word(&conn, &word).unwrap();
        assert!(matches!(outcome, Err(Rejection::Constraint(_))));
        assert_eq!(word_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_stored_length_counts_characters() {
        let conn = test_conn();
        insert_word(&conn, &new_word("niño", "child")).unwrap().unwrap();
        assert_eq!(get_word(&conn, "niño").unwrap().unwrap().length, 4);
        assert_eq!(words_of_length(&conn, 4).unwrap().len(), 1);
    }

    #[test]
    fn test_links_are_unique() {
        let conn = test_conn();
        let source = NewSource {
            short_name: "ivan".to_string(),
            description: "Ivan's list".to_string(),
        };
        let source_id = insert_source(&conn, &source).unwrap().unwrap();
        let word_id = insert_word(&conn, &new_word("perro", "dog")).unwrap().unwrap();
        assert!(link_word_source(&conn, word_id, source_id).unwrap());
        assert!(!link_word_source(&conn, word_id, source_id).unwrap());
        assert_eq!(sources_for_word(&conn, "perro").unwrap(), vec!["ivan"]);
        assert_eq!(find_source_id(&conn, "ivan").unwrap(), Some(source_id));
        assert_eq!(find_source_id(&conn, "none").unwrap(), None);
    }

    #[test]
    fn test_update_level_of_missing_word_changes_nothing() {
        let conn = test_conn();
        insert_word(&conn, &new_word("gato", "cat")).unwrap().unwrap();
        assert_eq!(update_word_level(&conn, "gatos", 2).unwrap(), 0);
        assert_eq!(update_word_level(&conn, "gato", 2).unwrap(), 1);
        assert_eq!(get_word(&conn, "gato").unwrap().unwrap().level, 2);
    }

    #[test]
    fn test_language_info_is_written_once() {
        let conn = test_conn();
        let spanish = LanguageInfo {
            language_name: "español".to_string(),
            english_name: "Spanish".to_string(),
            language_code: "es".to_string(),
        };
        let french = LanguageInfo {
            language_name: "français".to_string(),
            english_name: "French".to_string(),
            language_code: "fr".to_string(),
        };
        ensure_language_info(&conn, &spanish).unwrap();
        assert_eq!(ensure_language_info(&conn, &french).unwrap(), spanish);
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM language_info", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
