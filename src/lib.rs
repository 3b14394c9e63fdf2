//! Fuzzy pinyin matching
//! Locate items by typing full, initial-only or double pinyin of their Chinese text,
//! re-ranked incrementally after every keystroke.

pub mod align;
pub mod cache;
pub mod config;
pub mod double_pinyin;
pub mod index;
pub mod romanize;
pub mod score;
pub mod search;

pub use align::align;
pub use config::EngineConfig;
pub use double_pinyin::{to_double_pinyin, DoublePinyinScheme};
pub use index::{FileIndex, FileItem, FolderIndex, FolderItem, PinyinIndex, TagIndex, TagItem};
pub use romanize::{PinyinTable, RomanizationTable, RomanizedText, RomanizedUnit, UnitKind};
pub use score::{score, to_ranges, Score};
pub use search::{MatchField, MatchOutcome, Matcher, SearchOptions, Searchable};
