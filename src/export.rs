//! Length-grouped JSON output: the database exporter and the CSV converter.

use crate::db;
use crate::error::Result;
use crate::models::{WordEntry, WordGroup, WordList, char_len};
use crate::parse::{self, PairRecord};
use crate::progress::{ProgressCallback, Reporter};
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Word length the game currently consumes.
pub const DEFAULT_EXPORT_LENGTH: usize = 5;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Only words of exactly this many characters are exported.
    pub word_length: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            word_length: DEFAULT_EXPORT_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub words: u64,
    pub groups: u64,
    pub skipped: u64,
}

/// Buckets pairs by the character count of the word. Groups come out sorted
/// by length; words keep their input order within a group.
pub fn group_by_length(
    language_code: &str,
    pairs: impl IntoIterator<Item = (String, String)>,
) -> WordList {
    let mut by_length: BTreeMap<usize, Vec<WordEntry>> = BTreeMap::new();
    for (word, translation) in pairs {
        by_length
            .entry(char_len(&word))
            .or_default()
            .push(WordEntry { word, translation });
    }

    WordList {
        language_code: language_code.to_string(),
        word_groups: by_length
            .into_iter()
            .map(|(word_length, words)| WordGroup { word_length, words })
            .collect(),
    }
}

/// Writes the document as UTF-8 JSON with four-space indentation. Non-ASCII
/// characters are written as-is.
pub fn write_word_list(list: &WordList, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    list.serialize(&mut serializer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

impl WordList {
    /// Reads a document previously written by [`write_word_list`].
    pub fn read_from(path: &Path) -> Result<WordList> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Builds the export document for one word length, or `None` when the
/// database holds no words of that length.
pub fn build_export(
    conn: &Connection,
    language_code: &str,
    options: &ExportOptions,
) -> Result<Option<WordList>> {
    let pairs = db::words_of_length(conn, options.word_length)?;
    if pairs.is_empty() {
        return Ok(None);
    }
    Ok(Some(group_by_length(language_code, pairs)))
}

/// Exports words of the configured length to `output`.
///
/// When no word matches, nothing is written and `None` is returned, so a
/// previous export at the same path survives.
pub fn export_words(
    conn: &Connection,
    language_code: &str,
    output: &Path,
    options: &ExportOptions,
) -> Result<Option<usize>> {
    let Some(list) = build_export(conn, language_code, options)? else {
        warn!(
            "No {}-letter words found; {:?} was not written",
            options.word_length, output
        );
        return Ok(None);
    };
    write_word_list(&list, output)?;
    let count = list.word_count();
    info!(
        "Exported {} {}-letter words to {:?}",
        count, options.word_length, output
    );
    Ok(Some(count))
}

/// Converts a two-column `word,translation` CSV into the length-grouped
/// document. Unlike [`export_words`] the output is always written, even
/// when no usable rows were found.
pub fn convert_csv(
    input: &Path,
    output: &Path,
    language_code: &str,
    progress: Option<&mut ProgressCallback>,
) -> Result<ConvertSummary> {
    let lines = parse::read_pair_records(input)?;
    let mut reporter = Reporter::start(progress, "Converting", lines.len());
    let mut summary = ConvertSummary::default();
    let mut pairs = Vec::with_capacity(lines.len());

    for line in lines {
        match line.record {
            Ok(PairRecord { word, .. }) if word.is_empty() => {
                warn!("Skipping row {}: word is empty", line.number);
                summary.skipped += 1;
            }
            Ok(PairRecord { word, translation }) => pairs.push((word, translation)),
            Err(rejection) => {
                warn!("Skipping row {}: {}", line.number, rejection);
                summary.skipped += 1;
            }
        }
        reporter.advance(format!("row {}", line.number));
    }

    let list = group_by_length(language_code, pairs);
    summary.words = list.word_count() as u64;
    summary.groups = list.word_groups.len() as u64;
    write_word_list(&list, output)?;
    info!(
        "Converted {} words in {} groups to {:?}",
        summary.words, summary.groups, output
    );
    Ok(summary)
}
