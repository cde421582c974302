use serde::{Deserialize, Serialize};

// --- Limits ---

/// Maximum number of characters in a word.
pub const MAX_WORD_CHARS: usize = 15;
/// Maximum number of characters in a translation or source description.
pub const MAX_TEXT_CHARS: usize = 120;
/// Exact number of characters in a source short name.
pub const SHORT_NAME_CHARS: usize = 4;
/// Highest allowed difficulty level (the lowest is 0).
pub const MAX_LEVEL: u8 = 10;
/// Level given to words whose feed carries no level.
pub const DEFAULT_LEVEL: u8 = 5;

/// Character count used for every length rule and for the `length` column.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

// --- Database rows ---

/// Descriptive row identifying the language a database holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    /// Native name, e.g. "español".
    pub language_name: String,
    /// English name, e.g. "Spanish".
    pub english_name: String,
    /// ISO-like code, e.g. "es".
    pub language_code: String,
}

/// A word that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWord {
    pub word: String,
    pub en_translation: String,
    pub level: u8,
    pub is_answer: bool,
    pub frequency: Option<f64>,
    pub categories: Option<String>,
}

impl NewWord {
    pub fn length(&self) -> usize {
        char_len(&self.word)
    }
}

/// A stored word as read back from the `words` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub id: i64,
    pub word: String,
    pub length: u32,
    pub en_translation: Option<String>,
    pub frequency: Option<f64>,
    pub level: u8,
    pub is_answer: bool,
    pub categories: Option<String>,
}

/// A source that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSource {
    pub short_name: String,
    pub description: String,
}

/// A stored source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub id: i64,
    pub short_name: String,
    pub description: Option<String>,
}

// --- Export document ---

/// The JSON document consumed by the word-game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordList {
    pub language_code: String,
    pub word_groups: Vec<WordGroup>,
}

/// All exported words sharing one character length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordGroup {
    pub word_length: usize,
    pub words: Vec<WordEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub translation: String,
}

impl WordList {
    /// Total number of words across all groups.
    pub fn word_count(&self) -> usize {
        self.word_groups.iter().map(|g| g.words.len()).sum()
    }
}
