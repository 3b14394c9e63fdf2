//! Configuration Management Module
//! Handles loading/saving engine settings to <config dir>/fuzzy-pinyin/config.json

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::double_pinyin::DoublePinyinScheme;
use crate::index::FileIndexOptions;
use crate::romanize::PinyinTable;
use crate::search::SearchOptions;

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Romanization settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// File index settings
    #[serde(default)]
    pub file: FileConfig,

    /// Search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Most Recently Used tracking
    #[serde(default)]
    pub mru: HashMap<String, u32>,

    /// Where this config was loaded from (not persisted)
    #[serde(skip)]
    path: Option<PathBuf>,
}

/// Romanization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// "full", "xiaohe", or a path to a scheme JSON file
    #[serde(default = "default_double_pinyin")]
    pub double_pinyin: String,

    /// Pinyin dictionary JSON; the built-in sample is used when unset.
    /// Point this at a traditional-character dictionary for traditional Chinese.
    #[serde(default)]
    pub dictionary_path: Option<PathBuf>,
}

fn default_double_pinyin() -> String {
    "full".to_string()
}

/// File index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub show_all_file_types: bool,

    /// Show images, audio, video and PDFs
    #[serde(default)]
    pub show_attachments: bool,

    #[serde(default = "default_attachment_extensions")]
    pub attachment_extensions: Vec<String>,

    #[serde(default = "default_note_extensions")]
    pub note_extensions: Vec<String>,

    /// Search paths when names give few results
    #[serde(default)]
    pub use_path_to_search: bool,

    /// How many directory levels to scan
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

fn default_attachment_extensions() -> Vec<String> {
    [
        "bmp", "png", "jpg", "jpeg", "gif", "svg", "webp", "mp3", "wav", "m4a", "3gp", "flac", "ogg", "oga",
        "opus", "mp4", "webm", "ogv", "mov", "mkv", "pdf",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_note_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

fn default_max_depth() -> u32 {
    8
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of search results to show
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Path search only runs when fewer names than this matched
    #[serde(default = "default_path_search_threshold")]
    pub path_search_threshold: usize,
}

fn default_max_results() -> usize {
    20
}

fn default_path_search_threshold() -> usize {
    10
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            double_pinyin: default_double_pinyin(),
            dictionary_path: None,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            show_all_file_types: false,
            show_attachments: false,
            attachment_extensions: default_attachment_extensions(),
            note_extensions: default_note_extensions(),
            use_path_to_search: false,
            max_depth: default_max_depth(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            path_search_threshold: default_path_search_threshold(),
        }
    }
}

impl EngineConfig {
    /// Get the default configuration file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fuzzy-pinyin").join("config.json"))
    }

    /// Load configuration from the default location, or create it if missing
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(path),
            None => {
                log::warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from `path`; unreadable or invalid files fall back to defaults
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str::<EngineConfig>(&content) {
                    Ok(mut config) => {
                        log::info!("Loaded configuration from {:?}", path);
                        config.path = Some(path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("Failed to parse config file: {}. Using defaults.", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read config file: {}. Using defaults.", e);
                }
            }
            // keep the broken file for the user to fix
            return Self {
                path: Some(path),
                ..Self::default()
            };
        }

        log::info!("No config file found, creating default at {:?}", path);
        let config = Self {
            path: Some(path),
            ..Self::default()
        };
        config.save();
        config
    }

    /// Save configuration back to where it was loaded from
    pub fn save(&self) {
        if let Some(path) = &self.path {
            self.save_to(path);
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) {
        if let Some(dir) = path.parent() {
            if let Err(e) = fs::create_dir_all(dir) {
                log::error!("Failed to create config directory: {}", e);
                return;
            }
        }

        match serde_json::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = fs::write(path, content) {
                    log::error!("Failed to write config file: {}", e);
                } else {
                    log::debug!("Configuration saved to {:?}", path);
                }
            }
            Err(e) => {
                log::error!("Failed to serialize config: {}", e);
            }
        }
    }

    /// Record a usage for MRU tracking
    pub fn record_usage(&mut self, name: &str) {
        *self.mru.entry(name.to_string()).or_insert(0) += 1;

        // Save periodically (every 5 uses of any item)
        let total_uses: u32 = self.mru.values().sum();
        if total_uses % 5 == 0 {
            self.save();
        }
    }

    /// Get MRU score for an item
    pub fn get_mru_score(&self, name: &str) -> u32 {
        *self.mru.get(name).unwrap_or(&0)
    }

    /// Build the romanization table; bad scheme or dictionary files fall back to built-ins
    pub fn romanization_table(&self) -> PinyinTable {
        let scheme = match DoublePinyinScheme::from_setting(&self.global.double_pinyin) {
            Ok(scheme) => scheme,
            Err(e) => {
                log::warn!("Failed to load double pinyin scheme: {}. Using full pinyin.", e);
                None
            }
        };

        match &self.global.dictionary_path {
            Some(path) => PinyinTable::from_path(path, scheme.as_ref()).unwrap_or_else(|e| {
                log::warn!("Failed to load dictionary: {}. Using built-in dictionary.", e);
                PinyinTable::builtin(scheme.as_ref())
            }),
            None => PinyinTable::builtin(scheme.as_ref()),
        }
    }

    pub fn file_index_options(&self) -> FileIndexOptions {
        FileIndexOptions {
            max_depth: self.file.max_depth,
            note_extensions: self.file.note_extensions.clone(),
            show_attachments: self.file.show_attachments,
            attachment_extensions: self.file.attachment_extensions.clone(),
            show_all_file_types: self.file.show_all_file_types,
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_results: Some(self.search.max_results),
            path_search: self.file.use_path_to_search,
            path_search_threshold: self.search.path_search_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::romanize::RomanizationTable;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.global.double_pinyin, "full");
        assert!(config.file.attachment_extensions.contains(&"pdf".to_string()));
        assert_eq!(config.search.path_search_threshold, 10);
    }

    #[test]
    fn test_mru_tracking() {
        let mut config = EngineConfig::default();
        config.record_usage("笔记");
        config.record_usage("笔记");
        assert_eq!(config.get_mru_score("笔记"), 2);
        assert_eq!(config.get_mru_score("Unknown"), 0);
    }

    #[test]
    fn test_serialization() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.search.max_results, config.search.max_results);
    }

    #[test]
    fn test_partial_file_loads() {
        let parsed: EngineConfig = serde_json::from_str(r#"{"file": {"use_path_to_search": true}}"#).unwrap();
        assert!(parsed.file.use_path_to_search);
        assert_eq!(parsed.file.note_extensions, vec!["md"]);
        assert!(parsed.search_options().path_search);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = EngineConfig::load_from(&path);
        assert!(path.exists());
        assert_eq!(config.search.max_results, 20);

        let mut changed = config.clone();
        changed.search.max_results = 5;
        changed.save();
        assert_eq!(EngineConfig::load_from(&path).search.max_results, 5);
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = EngineConfig::load_from(&path);
        assert_eq!(config.global.double_pinyin, "full");
        // the broken file is left alone
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_romanization_table_fallbacks() {
        let mut config = EngineConfig::default();
        config.global.double_pinyin = "xiaohe".to_string();
        let table = config.romanization_table();
        assert_eq!(table.candidates_for('中'), ["vs".to_string()]);

        config.global.double_pinyin = "full".to_string();
        config.global.dictionary_path = Some(PathBuf::from("/nonexistent/dict.json"));
        let table = config.romanization_table();
        assert!(table.candidates_for('中').contains(&"zhong".to_string()));
    }
}
