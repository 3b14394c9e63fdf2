//! Romanized text module
//! Turns display text into per-character units carrying every admissible pinyin spelling

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::double_pinyin::{to_double_pinyin, DoublePinyinScheme};

/// Small built-in dictionary used when no dictionary file is configured
const BUILTIN_DICTIONARY: &str = include_str!("../data/pinyin_sample.json");

/// Whether a unit can be typed through its romanizations or only literally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Plain,
    Romanizable,
}

/// One character of an item's text plus its candidate spellings
#[derive(Debug, Clone, PartialEq)]
pub struct RomanizedUnit {
    /// Case-folded literal character
    pub character: char,
    pub kind: UnitKind,
    /// For `Plain` units this is just the literal character
    pub candidates: Vec<String>,
}

impl RomanizedUnit {
    pub fn is_separator(&self) -> bool {
        self.character.is_whitespace()
    }
}

/// Provides the romanizations registered for a character
pub trait RomanizationTable {
    /// Empty slice means "not romanizable"
    fn candidates_for(&self, ch: char) -> &[String];
}

/// Ordered sequence of units built from one piece of text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RomanizedText {
    units: Vec<RomanizedUnit>,
    source: String,
}

impl RomanizedText {
    /// Build the unit sequence for `text` using `table`
    pub fn build(text: &str, table: &dyn RomanizationTable) -> Self {
        let source = fold_case(text);
        let units = source
            .chars()
            .map(|ch| {
                let candidates: Vec<String> = table
                    .candidates_for(ch)
                    .iter()
                    .filter(|c| !c.is_empty())
                    .cloned()
                    .collect();

                if candidates.is_empty() {
                    RomanizedUnit {
                        character: ch,
                        kind: UnitKind::Plain,
                        candidates: vec![ch.to_string()],
                    }
                } else {
                    RomanizedUnit {
                        character: ch,
                        kind: UnitKind::Romanizable,
                        candidates,
                    }
                }
            })
            .collect();

        Self { units, source }
    }

    /// Join two fragments into one matchable text, `self` first
    pub fn concat(&self, other: &RomanizedText) -> RomanizedText {
        let mut units = Vec::with_capacity(self.units.len() + other.units.len());
        units.extend_from_slice(&self.units);
        units.extend_from_slice(&other.units);

        let mut source = String::with_capacity(self.source.len() + other.source.len());
        source.push_str(&self.source);
        source.push_str(&other.source);

        RomanizedText { units, source }
    }

    pub fn units(&self) -> &[RomanizedUnit] {
        &self.units
    }

    /// The case-folded text this sequence was built from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Length of the source text in characters, used for coverage scoring
    pub fn source_len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Lower-case per character so that unit count always equals the source character count
fn fold_case(text: &str) -> String {
    text.chars()
        .map(|ch| ch.to_lowercase().next().unwrap_or(ch))
        .collect()
}

/// Dictionary-backed romanization table
#[derive(Debug, Clone, Default)]
pub struct PinyinTable {
    map: HashMap<char, Vec<String>>,
}

impl PinyinTable {
    /// Table built from the bundled sample dictionary
    pub fn builtin(scheme: Option<&DoublePinyinScheme>) -> Self {
        // Bundled data; an empty table if it ever fails to parse
        Self::from_json_str(BUILTIN_DICTIONARY, scheme).unwrap_or_else(|e| {
            log::error!("Built-in dictionary failed to parse: {}", e);
            Self::default()
        })
    }

    /// Load a `{"syllable": "characters"}` dictionary from disk
    pub fn from_path(
        path: impl AsRef<Path>,
        scheme: Option<&DoublePinyinScheme>,
    ) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| DictionaryError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let table = Self::from_json_str(&content, scheme)?;
        log::info!("Loaded dictionary from {:?} ({} characters)", path, table.len());
        Ok(table)
    }

    /// Parse a `{"syllable": "characters"}` dictionary
    pub fn from_json_str(
        content: &str,
        scheme: Option<&DoublePinyinScheme>,
    ) -> Result<Self, DictionaryError> {
        // File order decides which reading of a heteronym is tried first
        let dict: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(content).map_err(|e| DictionaryError::Parse(e.to_string()))?;

        let mut entries = Vec::with_capacity(dict.len());
        for (syllable, characters) in &dict {
            let characters = characters.as_str().ok_or_else(|| {
                DictionaryError::Parse(format!("characters for {:?} must be a string", syllable))
            })?;
            entries.push((syllable.as_str(), characters));
        }

        Ok(Self::from_syllables(entries, scheme))
    }

    /// Invert `(syllable, characters)` pairs into a per-character candidate table
    pub fn from_syllables<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
        scheme: Option<&DoublePinyinScheme>,
    ) -> Self {
        let mut map: HashMap<char, Vec<String>> = HashMap::new();

        for (syllable, characters) in entries {
            let syllable = syllable.trim().to_lowercase();
            if syllable.is_empty() || !syllable.chars().all(|c| c.is_ascii_lowercase()) {
                log::warn!("Skipping malformed dictionary syllable {:?}", syllable);
                continue;
            }

            let key = match scheme {
                Some(scheme) => to_double_pinyin(&syllable, scheme).unwrap_or_else(|| {
                    log::debug!("Scheme {} cannot express {:?}, keeping full spelling", scheme.name(), syllable);
                    syllable.clone()
                }),
                None => syllable,
            };

            for ch in characters.chars().filter(|c| !c.is_whitespace()) {
                let candidates = map.entry(ch).or_default();
                if !candidates.contains(&key) {
                    candidates.push(key.clone());
                }
            }
        }

        Self { map }
    }

    /// Number of romanizable characters
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl RomanizationTable for PinyinTable {
    fn candidates_for(&self, ch: char) -> &[String] {
        self.map.get(&ch).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Errors that can occur while loading romanization data
#[derive(Debug)]
pub enum DictionaryError {
    Read { path: String, message: String },
    Parse(String),
}

impl fmt::Display for DictionaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "Could not read {}: {}", path, message),
            Self::Parse(message) => write!(f, "Invalid dictionary data: {}", message),
        }
    }
}

impl std::error::Error for DictionaryError {}
