//! Reading the delimited feeds (word lists, source lists, level lists).
//!
//! Opening a file and resolving its header are fatal steps. Everything after
//! that is per record: an unreadable or malformed row becomes a
//! [`Rejection`] on its own [`Line`] and the rest of the file is still read.

use crate::error::{Result, WordDbError};
use crate::validate::{Rejection, RowOutcome};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use std::fs::File;
use std::path::Path;

/// One data record of an input file. `number` counts data records from 1,
/// not counting the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Line<T> {
    pub number: u64,
    pub record: RowOutcome<T>,
}

/// A word feed row. Optional columns are `None` when the file has no such
/// column and `Some("")` when the column exists but the cell is blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordRecord {
    pub word: String,
    pub translation: String,
    pub level: Option<String>,
    pub is_answer: Option<String>,
    pub source: Option<String>,
    pub length: Option<String>,
    pub frequency: Option<String>,
    pub categories: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRecord {
    pub lang: String,
    pub short_name: String,
    pub description: String,
}

/// A `(word, level)` row; the level is still unparsed.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRecord {
    pub word: String,
    pub level: String,
}

/// A `(word, translation)` row of the two-column converter input.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRecord {
    pub word: String,
    pub translation: String,
}

/// Column positions of a word feed, resolved from its header.
struct WordColumns {
    word: usize,
    translation: usize,
    level: Option<usize>,
    is_answer: Option<usize>,
    source: Option<usize>,
    length: Option<usize>,
    frequency: Option<usize>,
    categories: Option<usize>,
}

impl WordColumns {
    fn resolve(headers: &StringRecord, file: &Path) -> Result<Self> {
        let word = column(headers, "word");
        let translation =
            column(headers, "en_translation").or_else(|| column(headers, "translation"));

        let (Some(word), Some(translation)) = (word, translation) else {
            return Err(WordDbError::MissingColumns {
                file: file.to_path_buf(),
                columns: vec!["word".to_string(), "en_translation".to_string()],
            });
        };

        Ok(Self {
            word,
            translation,
            level: column(headers, "level"),
            is_answer: column(headers, "isAnswer"),
            source: column(headers, "source"),
            length: column(headers, "length"),
            frequency: column(headers, "frequency"),
            categories: column(headers, "categories"),
        })
    }

    fn extract(&self, rec: &StringRecord) -> WordRecord {
        let optional = |idx: Option<usize>| idx.map(|i| field(rec, i));
        WordRecord {
            word: field(rec, self.word),
            translation: field(rec, self.translation),
            level: optional(self.level),
            is_answer: optional(self.is_answer),
            source: optional(self.source),
            length: optional(self.length),
            frequency: optional(self.frequency),
            categories: optional(self.categories),
        }
    }
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Missing trailing cells read as empty.
fn field(rec: &StringRecord, idx: usize) -> String {
    rec.get(idx).unwrap_or_default().to_string()
}

/// Opens a CSV file whose first row is a header. Fields and headers are trimmed
/// and rows may have differing lengths.
fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    if !path.is_file() {
        return Err(WordDbError::InputFileNotFound(path.to_path_buf()));
    }
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;
    Ok(reader)
}

/// Reads every data record, mapping each through `map`. Only I/O failures
/// abort; malformed records become rejected lines.
fn collect_lines<T>(
    reader: &mut csv::Reader<File>,
    mut map: impl FnMut(&StringRecord) -> RowOutcome<T>,
) -> Result<Vec<Line<T>>> {
    let mut lines = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(rec) => map(&rec),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(Rejection::Unreadable(e.to_string())),
        };
        lines.push(Line {
            number: idx as u64 + 1,
            record,
        });
    }
    Ok(lines)
}

/// Reads a header-driven word feed. Requires `word` and either
/// `en_translation` or `translation`.
pub fn read_word_records(path: &Path) -> Result<Vec<Line<WordRecord>>> {
    let mut reader = open_csv(path)?;
    let columns = WordColumns::resolve(reader.headers()?, path)?;
    let lines = collect_lines(&mut reader, |rec| Ok(columns.extract(rec)))?;
    debug!("Read {} word records from {:?}", lines.len(), path);
    Ok(lines)
}

/// Reads a header-driven source feed with `lang`, `short_name` and
/// `description` columns.
pub fn read_source_records(path: &Path) -> Result<Vec<Line<SourceRecord>>> {
    let mut reader = open_csv(path)?;
    let headers = reader.headers()?.clone();
    let required = ["lang", "short_name", "description"];
    let positions: Vec<Option<usize>> = required.iter().map(|n| column(&headers, n)).collect();

    let &[Some(lang), Some(short_name), Some(description)] = positions.as_slice() else {
        return Err(WordDbError::MissingColumns {
            file: path.to_path_buf(),
            columns: required.iter().map(|c| c.to_string()).collect(),
        });
    };

    let lines = collect_lines(&mut reader, |rec| {
        Ok(SourceRecord {
            lang: field(rec, lang),
            short_name: field(rec, short_name),
            description: field(rec, description),
        })
    })?;
    debug!("Read {} source records from {:?}", lines.len(), path);
    Ok(lines)
}

/// Reads a positional `word,level` file; the first row is skipped as a header.
pub fn read_level_records(path: &Path) -> Result<Vec<Line<LevelRecord>>> {
    let mut reader = open_csv(path)?;
    let lines = collect_lines(&mut reader, |rec| {
        if rec.len() != 2 {
            return Err(Rejection::FieldCount(rec.len()));
        }
        Ok(LevelRecord {
            word: field(rec, 0),
            level: field(rec, 1),
        })
    })?;
    debug!("Read {} level records from {:?}", lines.len(), path);
    Ok(lines)
}

/// Reads a positional `word,translation` file; the first row is skipped as a
/// header and columns beyond the second are ignored.
pub fn read_pair_records(path: &Path) -> Result<Vec<Line<PairRecord>>> {
    let mut reader = open_csv(path)?;
    let lines = collect_lines(&mut reader, |rec| {
        if rec.len() < 2 {
            return Err(Rejection::FieldCount(rec.len()));
        }
        Ok(PairRecord {
            word: field(rec, 0),
            translation: field(rec, 1),
        })
    })?;
    debug!("Read {} word/translation pairs from {:?}", lines.len(), path);
    Ok(lines)
}
