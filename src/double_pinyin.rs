//! Double pinyin module
//! Maps full pinyin syllables to two-key scheme codes

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::romanize::DictionaryError;

const XIAOHE_SCHEME: &str = include_str!("../data/xiaohe.json");

/// Retroflex initials that occupy a key of their own
const COMPOUND_INITIALS: [&str; 3] = ["zh", "ch", "sh"];

/// A double pinyin layout: each key lists the syllable parts it stands for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoublePinyinScheme {
    name: String,
    keys: BTreeMap<String, Vec<String>>,
}

impl DoublePinyinScheme {
    pub fn new(name: impl Into<String>, keys: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            name: name.into(),
            keys,
        }
    }

    /// The bundled Xiaohe (小鹤双拼) layout
    pub fn xiaohe() -> Self {
        Self::from_json_str(XIAOHE_SCHEME).unwrap_or_else(|e| {
            log::error!("Built-in xiaohe scheme failed to parse: {}", e);
            Self::new("xiaohe", BTreeMap::new())
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, DictionaryError> {
        serde_json::from_str(content).map_err(|e| DictionaryError::Parse(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| DictionaryError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&content)
    }

    /// Resolve a setting value: `"full"` means no scheme, `"xiaohe"` the built-in,
    /// anything else is read as a path to a scheme file
    pub fn from_setting(setting: &str) -> Result<Option<Self>, DictionaryError> {
        match setting.trim() {
            "" | "full" => Ok(None),
            "xiaohe" => Ok(Some(Self::xiaohe())),
            path => Self::from_path(path).map(Some),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First key (in key order) whose part list contains `part`
    pub fn key_for(&self, part: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|(_, parts)| parts.iter().any(|p| p == part))
            .map(|(key, _)| key.as_str())
    }
}

/// Convert one full pinyin syllable into its scheme code.
///
/// A `zh`/`ch`/`sh` initial is looked up in the scheme, any other initial is kept
/// as typed; the remaining final is looked up. Returns `None` when the scheme has
/// no key for a part.
pub fn to_double_pinyin(full: &str, scheme: &DoublePinyinScheme) -> Option<String> {
    let mut code = String::with_capacity(2);

    let rest = match COMPOUND_INITIALS.iter().find(|p| full.starts_with(**p)) {
        Some(initial) => {
            code.push_str(scheme.key_for(initial)?);
            &full[initial.len()..]
        }
        None => {
            let first = full.chars().next()?;
            code.push(first);
            &full[first.len_utf8()..]
        }
    };

    if !rest.is_empty() {
        code.push_str(scheme.key_for(rest)?);
    }

    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xiaohe_codes() {
        let scheme = DoublePinyinScheme::xiaohe();
        assert_eq!(to_double_pinyin("zhong", &scheme).as_deref(), Some("vs"));
        assert_eq!(to_double_pinyin("shi", &scheme).as_deref(), Some("ui"));
        assert_eq!(to_double_pinyin("chuang", &scheme).as_deref(), Some("il"));
        assert_eq!(to_double_pinyin("wen", &scheme).as_deref(), Some("wf"));
        assert_eq!(to_double_pinyin("xue", &scheme).as_deref(), Some("xt"));
        assert_eq!(to_double_pinyin("a", &scheme).as_deref(), Some("a"));
    }

    #[test]
    fn test_unmapped_final() {
        let scheme = DoublePinyinScheme::xiaohe();
        // zero-initial syllables whose remainder is not a final of the layout
        assert_eq!(to_double_pinyin("ang", &scheme), None);
        assert_eq!(to_double_pinyin("", &scheme), None);
    }

    #[test]
    fn test_key_order_breaks_ties() {
        let mut keys = BTreeMap::new();
        keys.insert("b".to_string(), vec!["an".to_string()]);
        keys.insert("a".to_string(), vec!["an".to_string()]);
        let scheme = DoublePinyinScheme::new("custom", keys);
        assert_eq!(scheme.key_for("an"), Some("a"));
        assert_eq!(to_double_pinyin("lan", &scheme).as_deref(), Some("la"));
    }

    #[test]
    fn test_from_setting() {
        assert!(DoublePinyinScheme::from_setting("full").unwrap().is_none());
        assert_eq!(
            DoublePinyinScheme::from_setting("xiaohe").unwrap().map(|s| s.name().to_string()),
            Some("xiaohe".to_string())
        );
        assert!(DoublePinyinScheme::from_setting("/nonexistent/scheme.json").is_err());
    }
}
