//! Single-pass importers: words, sources and level updates.
//!
//! Every importer works on an already-read list of [`Line`]s against one
//! connection (normally an open transaction). Rejected records are logged and
//! counted; only database failures abort the pass.

use crate::db;
use crate::error::Result;
use crate::parse::{LevelRecord, Line, SourceRecord, WordRecord};
use crate::progress::{ProgressCallback, Reporter};
use crate::validate::{self, Rejection, RowOutcome};
use log::{debug, error, info, warn};
use rusqlite::Connection;

/// Run-wide settings for a word import.
#[derive(Debug, Clone, Default)]
pub struct WordImportOptions {
    /// Source short name linked to every row whose own `source` cell is empty.
    pub default_source: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordImportSummary {
    pub added: u64,
    pub skipped: u64,
    pub sources_linked: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceImportSummary {
    pub added: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelUpdateSummary {
    /// Rows whose word was found and updated.
    pub updated: u64,
    /// Rows naming a word that is not in the table.
    pub unmatched: u64,
    /// Rows with a malformed word/level pair.
    pub failed: u64,
}

// --- Words ---

pub fn import_words(
    conn: &Connection,
    lines: &[Line<WordRecord>],
    options: &WordImportOptions,
    progress: Option<&mut ProgressCallback>,
) -> Result<WordImportSummary> {
    info!("Importing {} word records...", lines.len());
    let mut reporter = Reporter::start(progress, "Importing words", lines.len());
    let mut summary = WordImportSummary::default();

    for line in lines {
        let record = match &line.record {
            Ok(record) => record,
            Err(rejection) => {
                warn!("Skipping row {}: {}", line.number, rejection);
                summary.skipped += 1;
                reporter.advance(format!("row {}", line.number));
                continue;
            }
        };

        match import_word(conn, record, options)? {
            Ok(linked) => {
                info!("Added word: {}", record.word);
                summary.added += 1;
                if linked {
                    summary.sources_linked += 1;
                }
            }
            Err(rejection) => {
                warn!("Skipping word '{}' - {}", record.word, rejection);
                summary.skipped += 1;
            }
        }
        reporter.advance(record.word.clone());
    }

    Ok(summary)
}

/// Validates, inserts and links one word. The inner result says whether a new
/// source link was created, or why the word was skipped.
fn import_word(
    conn: &Connection,
    record: &WordRecord,
    options: &WordImportOptions,
) -> Result<RowOutcome<bool>> {
    let word = match validate::validate_word(record) {
        Ok(word) => word,
        Err(rejection) => return Ok(Err(rejection)),
    };
    let word_id = match db::insert_word(conn, &word)? {
        Ok(id) => id,
        Err(rejection) => return Ok(Err(rejection)),
    };

    let source = record
        .source
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(options.default_source.as_deref());
    let Some(source) = source else {
        return Ok(Ok(false));
    };

    let Some(source_id) = db::find_source_id(conn, source)? else {
        debug!("Source '{}' not found; '{}' left unlinked", source, word.word);
        return Ok(Ok(false));
    };
    if db::link_word_source(conn, word_id, source_id)? {
        Ok(Ok(true))
    } else {
        warn!("Word-source link already exists for '{}'", word.word);
        Ok(Ok(false))
    }
}

// --- Sources ---

pub fn import_sources(
    conn: &Connection,
    lines: &[Line<SourceRecord>],
    language_code: &str,
    progress: Option<&mut ProgressCallback>,
) -> Result<SourceImportSummary> {
    info!(
        "Importing {} source records for language '{}'...",
        lines.len(),
        language_code
    );
    let mut reporter = Reporter::start(progress, "Importing sources", lines.len());
    let mut summary = SourceImportSummary::default();

    for line in lines {
        let record = match &line.record {
            Ok(record) => record,
            Err(rejection) => {
                warn!("Skipping row {}: {}", line.number, rejection);
                summary.skipped += 1;
                reporter.advance(format!("row {}", line.number));
                continue;
            }
        };

        if let Err(rejection) = validate::check_language(record, language_code) {
            debug!("Ignoring source '{}': {}", record.short_name, rejection);
            summary.skipped += 1;
            reporter.advance(record.short_name.clone());
            continue;
        }

        let outcome = match validate::validate_source(record) {
            Ok(source) => db::insert_source(conn, &source)?,
            Err(rejection) => Err(rejection),
        };
        match outcome {
            Ok(_) => {
                info!("Added source: {}", record.short_name);
                summary.added += 1;
            }
            Err(Rejection::Duplicate) => {
                warn!(
                    "Source '{}' already exists in the database - skipping",
                    record.short_name
                );
                summary.skipped += 1;
            }
            Err(rejection) => {
                warn!("Skipping source '{}' - {}", record.short_name, rejection);
                summary.skipped += 1;
            }
        }
        reporter.advance(record.short_name.clone());
    }

    Ok(summary)
}

// --- Levels ---

pub fn update_levels(
    conn: &Connection,
    lines: &[Line<LevelRecord>],
    progress: Option<&mut ProgressCallback>,
) -> Result<LevelUpdateSummary> {
    info!("Updating levels from {} records...", lines.len());
    let mut reporter = Reporter::start(progress, "Updating levels", lines.len());
    let mut summary = LevelUpdateSummary::default();

    for line in lines {
        let record = match &line.record {
            Ok(record) => record,
            Err(rejection) => {
                error!("Error reading row {}: {}", line.number, rejection);
                summary.failed += 1;
                reporter.advance(format!("row {}", line.number));
                continue;
            }
        };

        match validate::parse_level(&record.level) {
            Ok(level) => {
                if db::update_word_level(conn, &record.word, level)? == 0 {
                    debug!("No word '{}' to update", record.word);
                    summary.unmatched += 1;
                } else {
                    debug!("Set level of '{}' to {}", record.word, level);
                    summary.updated += 1;
                }
            }
            Err(rejection) => {
                error!("Error updating word '{}': {}", record.word, rejection);
                summary.failed += 1;
            }
        }
        reporter.advance(record.word.clone());
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewSource;
    use crate::parse;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        db::initialize_database(&mut conn).unwrap();
        conn
    }

    fn word_line(number: u64, word: &str, translation: &str, is_answer: &str, level: &str) -> Line<WordRecord> {
        Line {
            number,
            record: Ok(WordRecord {
                word: word.to_string(),
                translation: translation.to_string(),
                is_answer: Some(is_answer.to_string()),
                level: Some(level.to_string()),
                ..Default::default()
            }),
        }
    }

    fn add_source(conn: &Connection, short_name: &str) {
        let source = NewSource {
            short_name: short_name.to_string(),
            description: format!("{} source", short_name),
        };
        db::insert_source(conn, &source).unwrap().unwrap();
    }

    #[test]
    fn test_duplicate_word_keeps_first_values() {
        let conn = test_conn();
        let lines = vec![
            word_line(1, "hola", "hello", "TRUE", "5"),
            word_line(2, "hola", "hi", "TRUE", "3"),
        ];
        let summary = import_words(&conn, &lines, &WordImportOptions::default(), None).unwrap();
        assert_eq!(
            summary,
            WordImportSummary {
                added: 1,
                skipped: 1,
                sources_linked: 0
            }
        );
        let stored = db::get_word(&conn, "hola").unwrap().unwrap();
        assert_eq!(stored.en_translation.as_deref(), Some("hello"));
        assert_eq!(stored.level, 5);
        assert!(stored.is_answer);
    }

    #[test]
    fn test_long_word_leaves_table_unchanged() {
        let conn = test_conn();
        let lines = vec![word_line(1, "anticonstitucional", "unconstitutional", "TRUE", "5")];
        let summary = import_words(&conn, &lines, &WordImportOptions::default(), None).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.added, 0);
        assert_eq!(db::word_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_blank_level_cell_skips_word() {
        let conn = test_conn();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"word,en_translation,isAnswer,level\nhola,hello,TRUE,\n")
            .unwrap();
        let lines = parse::read_word_records(file.path()).unwrap();

        let summary = import_words(&conn, &lines, &WordImportOptions::default(), None).unwrap();
        assert_eq!(
            summary,
            WordImportSummary {
                added: 0,
                skipped: 1,
                sources_linked: 0
            }
        );
        assert!(db::get_word(&conn, "hola").unwrap().is_none());
    }

    #[test]
    fn test_out_of_range_level_skips_word() {
        let conn = test_conn();
        let lines = vec![
            word_line(1, "perro", "dog", "TRUE", "11"),
            word_line(2, "gato", "cat", "TRUE", "-2"),
        ];
        let summary = import_words(&conn, &lines, &WordImportOptions::default(), None).unwrap();
        assert_eq!(summary.skipped, 2);
        assert_eq!(db::word_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_invalid_answer_flag_skips_word() {
        let conn = test_conn();
        let lines = vec![word_line(1, "perro", "dog", "true", "2")];
        let summary = import_words(&conn, &lines, &WordImportOptions::default(), None).unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(db::get_word(&conn, "perro").unwrap().is_none());
    }

    #[test]
    fn test_source_linking() {
        let conn = test_conn();
        add_source(&conn, "ivan");
        let mut linked = word_line(1, "perro", "dog", "TRUE", "1");
        if let Ok(rec) = linked.record.as_mut() {
            rec.source = Some("ivan".to_string());
        }
        let mut unknown = word_line(2, "gato", "cat", "TRUE", "1");
        if let Ok(rec) = unknown.record.as_mut() {
            rec.source = Some("zzzz".to_string());
        }

        let summary =
            import_words(&conn, &[linked, unknown], &WordImportOptions::default(), None).unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(summary.sources_linked, 1);
        assert_eq!(db::sources_for_word(&conn, "perro").unwrap(), vec!["ivan"]);
        assert!(db::sources_for_word(&conn, "gato").unwrap().is_empty());
    }

    #[test]
    fn test_default_source_applies_to_blank_cells() {
        let conn = test_conn();
        add_source(&conn, "ivan");
        add_source(&conn, "rae1");
        let mut own = word_line(1, "perro", "dog", "TRUE", "1");
        if let Ok(rec) = own.record.as_mut() {
            rec.source = Some("rae1".to_string());
        }
        let blank = word_line(2, "gato", "cat", "TRUE", "1");
        let options = WordImportOptions {
            default_source: Some("ivan".to_string()),
        };

        let summary = import_words(&conn, &[own, blank], &options, None).unwrap();
        assert_eq!(summary.sources_linked, 2);
        assert_eq!(db::sources_for_word(&conn, "perro").unwrap(), vec!["rae1"]);
        assert_eq!(db::sources_for_word(&conn, "gato").unwrap(), vec!["ivan"]);
    }

    #[test]
    fn test_unreadable_rows_are_counted() {
        let conn = test_conn();
        let lines = vec![Line {
            number: 1,
            record: Err(Rejection::Unreadable("invalid UTF-8".to_string())),
        }];
        let summary = import_words(&conn, &lines, &WordImportOptions::default(), None).unwrap();
        assert_eq!(summary.skipped, 1);
    }

    fn source_line(lang: &str, short_name: &str, description: &str) -> Line<SourceRecord> {
        Line {
            number: 1,
            record: Ok(SourceRecord {
                lang: lang.to_string(),
                short_name: short_name.to_string(),
                description: description.to_string(),
            }),
        }
    }

    #[test]
    fn test_source_import_validates_and_filters() {
        let conn = test_conn();
        let lines = vec![
            source_line("es", "casa", "Casa del libro"),
            source_line("es", "cas", "Too short"),
            source_line("FR", "lrse", "Larousse"),
            source_line("ES", "casa", "Duplicate"),
            source_line("es", "long", &"x".repeat(121)),
        ];
        let summary = import_sources(&conn, &lines, "es", None).unwrap();
        assert_eq!(summary, SourceImportSummary { added: 1, skipped: 4 });
        let sources = db::list_sources(&conn).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].short_name, "casa");
        assert_eq!(sources[0].description.as_deref(), Some("Casa del libro"));
    }

    fn level_line(number: u64, word: &str, level: &str) -> Line<LevelRecord> {
        Line {
            number,
            record: Ok(LevelRecord {
                word: word.to_string(),
                level: level.to_string(),
            }),
        }
    }

    #[test]
    fn test_level_updates() {
        let conn = test_conn();
        let words = vec![word_line(1, "perro", "dog", "TRUE", "5")];
        import_words(&conn, &words, &WordImportOptions::default(), None).unwrap();

        let lines = vec![
            level_line(1, "perro", "2"),
            level_line(2, "ausente", "3"),
            level_line(3, "perro", "x"),
            level_line(4, "perro", "42"),
        ];
        let summary = update_levels(&conn, &lines, None).unwrap();
        assert_eq!(
            summary,
            LevelUpdateSummary {
                updated: 1,
                unmatched: 1,
                failed: 2
            }
        );
        assert_eq!(db::get_word(&conn, "perro").unwrap().unwrap().level, 2);
        assert!(db::get_word(&conn, "ausente").unwrap().is_none());
    }
}
