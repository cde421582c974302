//! Per-record validation rules.
//!
//! Each rule either accepts a field or rejects the whole record with a
//! [`Rejection`]. Rules run in a fixed order and the first rejection wins, so
//! the logged reason is always the highest-priority problem with the record.

use crate::models::{
    DEFAULT_LEVEL, MAX_LEVEL, MAX_TEXT_CHARS, MAX_WORD_CHARS, NewSource, NewWord,
    SHORT_NAME_CHARS, char_len,
};
use crate::parse::{SourceRecord, WordRecord};
use thiserror::Error;

/// Outcome of handling one input record: the value, or why it was skipped.
pub type RowOutcome<T> = std::result::Result<T, Rejection>;

/// Why a single input record was skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("word is empty")]
    EmptyWord,

    #[error("word exceeds 15 characters ({0})")]
    WordTooLong(usize),

    #[error("declared length '{declared}' does not match the {actual} characters of the word")]
    LengthMismatch { declared: String, actual: usize },

    #[error("translation is empty")]
    MissingTranslation,

    #[error("translation exceeds 120 characters ({0})")]
    TranslationTooLong(usize),

    #[error("invalid level '{0}'")]
    InvalidLevel(String),

    #[error("level {0} is outside 0..=10")]
    LevelOutOfRange(i64),

    #[error("invalid isAnswer '{0}' (expected TRUE or FALSE)")]
    InvalidAnswerFlag(String),

    #[error("invalid frequency '{0}' (expected a number between 0 and 1)")]
    InvalidFrequency(String),

    #[error("short_name must be exactly 4 characters ({0})")]
    ShortNameLength(usize),

    #[error("description exceeds 120 characters ({0})")]
    DescriptionTooLong(usize),

    #[error("language '{0}' does not match this database")]
    OtherLanguage(String),

    #[error("unexpected number of fields ({0})")]
    FieldCount(usize),

    #[error("unreadable record: {0}")]
    Unreadable(String),

    #[error("already exists in the database")]
    Duplicate,

    #[error("rejected by the database: {0}")]
    Constraint(String),
}

// --- Words ---

/// Runs the word rules in priority order and builds the row to insert.
pub fn validate_word(record: &WordRecord) -> Result<NewWord, Rejection> {
    check_word_text(&record.word)?;
    check_declared_length(&record.word, record.length.as_deref())?;
    check_translation(&record.translation)?;
    let level = level_or_default(record.level.as_deref())?;
    let is_answer = parse_answer_flag(record.is_answer.as_deref())?;
    let frequency = parse_frequency(record.frequency.as_deref())?;

    Ok(NewWord {
        word: record.word.clone(),
        en_translation: record.translation.clone(),
        level,
        is_answer,
        frequency,
        categories: record.categories.clone().filter(|c| !c.is_empty()),
    })
}

fn check_word_text(word: &str) -> Result<(), Rejection> {
    let chars = char_len(word);
    if chars == 0 {
        return Err(Rejection::EmptyWord);
    }
    if chars > MAX_WORD_CHARS {
        return Err(Rejection::WordTooLong(chars));
    }
    Ok(())
}

fn check_declared_length(word: &str, declared: Option<&str>) -> Result<(), Rejection> {
    let Some(declared) = declared.filter(|d| !d.is_empty()) else {
        return Ok(());
    };
    let actual = char_len(word);
    match declared.parse::<usize>() {
        Ok(n) if n == actual => Ok(()),
        _ => Err(Rejection::LengthMismatch {
            declared: declared.to_string(),
            actual,
        }),
    }
}

fn check_translation(translation: &str) -> Result<(), Rejection> {
    let chars = char_len(translation);
    if chars == 0 {
        return Err(Rejection::MissingTranslation);
    }
    if chars > MAX_TEXT_CHARS {
        return Err(Rejection::TranslationTooLong(chars));
    }
    Ok(())
}

/// Only a file without a `level` column falls back to [`DEFAULT_LEVEL`]. A
/// present cell, blank or not, must be a valid level.
fn level_or_default(level: Option<&str>) -> Result<u8, Rejection> {
    match level {
        None => Ok(DEFAULT_LEVEL),
        Some(value) => parse_level(value),
    }
}

/// Parses a level that must be an integer in `0..=MAX_LEVEL`. Out-of-range
/// values are rejected, never clamped.
pub fn parse_level(value: &str) -> Result<u8, Rejection> {
    let level: i64 = value
        .trim()
        .parse()
        .map_err(|_| Rejection::InvalidLevel(value.to_string()))?;
    if !(0..=i64::from(MAX_LEVEL)).contains(&level) {
        return Err(Rejection::LevelOutOfRange(level));
    }
    Ok(level as u8)
}

fn parse_answer_flag(flag: Option<&str>) -> Result<bool, Rejection> {
    match flag {
        None => Ok(false),
        Some("TRUE") => Ok(true),
        Some("FALSE") => Ok(false),
        Some(other) => Err(Rejection::InvalidAnswerFlag(other.to_string())),
    }
}

fn parse_frequency(frequency: Option<&str>) -> Result<Option<f64>, Rejection> {
    let Some(value) = frequency.filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    match value.parse::<f64>() {
        Ok(f) if (0.0..=1.0).contains(&f) => Ok(Some(f)),
        _ => Err(Rejection::InvalidFrequency(value.to_string())),
    }
}

// --- Sources ---

/// Runs the source rules for a row that already matched the target language.
pub fn validate_source(record: &SourceRecord) -> Result<NewSource, Rejection> {
    let short_chars = char_len(&record.short_name);
    if short_chars != SHORT_NAME_CHARS {
        return Err(Rejection::ShortNameLength(short_chars));
    }
    let description_chars = char_len(&record.description);
    if description_chars > MAX_TEXT_CHARS {
        return Err(Rejection::DescriptionTooLong(description_chars));
    }
    Ok(NewSource {
        short_name: record.short_name.clone(),
        description: record.description.clone(),
    })
}

/// Case-insensitive language filter for multi-language source feeds.
pub fn check_language(record: &SourceRecord, language_code: &str) -> Result<(), Rejection> {
    if record.lang.to_lowercase() == language_code.trim().to_lowercase() {
        Ok(())
    } else {
        Err(Rejection::OtherLanguage(record.lang.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(word: &str, translation: &str) -> WordRecord {
        WordRecord {
            word: word.to_string(),
            translation: translation.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_word_too_long_is_rejected() {
        let r = record("electroencefalograma", "electroencephalogram");
        assert_eq!(validate_word(&r), Err(Rejection::WordTooLong(20)));
    }

    #[test]
    fn test_fifteen_characters_is_accepted() {
        let r = record("abcdefghijklmnñ", "fifteen");
        assert!(validate_word(&r).is_ok());
    }

    #[test]
    fn test_missing_level_column_defaults() {
        let word = validate_word(&record("hola", "hello")).unwrap();
        assert_eq!(word.level, DEFAULT_LEVEL);
        assert!(!word.is_answer);
        assert_eq!(word.frequency, None);
    }

    #[test]
    fn test_level_bounds_are_inclusive() {
        assert_eq!(parse_level("0"), Ok(0));
        assert_eq!(parse_level("10"), Ok(10));
        assert_eq!(parse_level("11"), Err(Rejection::LevelOutOfRange(11)));
        assert_eq!(parse_level("-1"), Err(Rejection::LevelOutOfRange(-1)));
        assert_eq!(
            parse_level("five"),
            Err(Rejection::InvalidLevel("five".to_string()))
        );
    }

    #[test]
    fn test_blank_level_cell_rejects_word() {
        let mut r = record("hola", "hello");
        r.level = Some(String::new());
        assert_eq!(validate_word(&r), Err(Rejection::InvalidLevel(String::new())));
    }

    #[test]
    fn test_out_of_range_level_rejects_word() {
        let mut r = record("hola", "hello");
        r.level = Some("12".to_string());
        assert_eq!(validate_word(&r), Err(Rejection::LevelOutOfRange(12)));
    }

    #[test]
    fn test_answer_flag_literals() {
        let mut r = record("hola", "hello");
        r.is_answer = Some("TRUE".to_string());
        assert!(validate_word(&r).unwrap().is_answer);
        r.is_answer = Some("FALSE".to_string());
        assert!(!validate_word(&r).unwrap().is_answer);
        r.is_answer = Some("yes".to_string());
        assert_eq!(
            validate_word(&r),
            Err(Rejection::InvalidAnswerFlag("yes".to_string()))
        );
    }

    #[test]
    fn test_declared_length_must_match() {
        let mut r = record("año", "year");
        r.length = Some("3".to_string());
        assert!(validate_word(&r).is_ok());
        r.length = Some("4".to_string());
        assert_eq!(
            validate_word(&r),
            Err(Rejection::LengthMismatch {
                declared: "4".to_string(),
                actual: 3
            })
        );
    }

    #[test]
    fn test_rule_order_reports_word_length_first() {
        let mut r = record("palabramuylarguisima", "");
        r.level = Some("99".to_string());
        assert_eq!(validate_word(&r), Err(Rejection::WordTooLong(20)));
    }

    #[test]
    fn test_frequency_range() {
        let mut r = record("hola", "hello");
        r.frequency = Some("0.25".to_string());
        assert_eq!(validate_word(&r).unwrap().frequency, Some(0.25));
        r.frequency = Some("1.5".to_string());
        assert!(matches!(
            validate_word(&r),
            Err(Rejection::InvalidFrequency(_))
        ));
    }

    #[test]
    fn test_source_short_name_length() {
        let mut s = SourceRecord {
            lang: "es".to_string(),
            short_name: "casa".to_string(),
            description: "Casa del libro".to_string(),
        };
        assert!(validate_source(&s).is_ok());
        s.short_name = "cas".to_string();
        assert_eq!(validate_source(&s), Err(Rejection::ShortNameLength(3)));
    }

    #[test]
    fn test_language_filter_is_case_insensitive() {
        let s = SourceRecord {
            lang: "ES".to_string(),
            short_name: "casa".to_string(),
            description: String::new(),
        };
        assert!(check_language(&s, "es").is_ok());
        assert!(check_language(&s, "fr").is_err());
    }
}
