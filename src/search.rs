//! Search module
//! Runs the cache lookup, aligns and scores the candidate items, and ranks the results

use std::ops::RangeInclusive;

use crate::align::align;
use crate::cache::{CandidateSubsets, QueryCache};
use crate::romanize::RomanizedText;
use crate::score::{score, to_ranges, Score};

/// Anything the matcher can rank: a file, a tag, a command...
pub trait Searchable {
    /// Display text that name matches highlight
    fn name(&self) -> &str;

    fn romanized(&self) -> &RomanizedText;

    /// Secondary display text and its romanization, searched when few names match
    fn path(&self) -> Option<(&str, &RomanizedText)> {
        None
    }
}

/// Which text of the item produced the match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Name,
    Path,
}

/// One ranked result
#[derive(Debug, Clone)]
pub struct MatchOutcome<'a, T> {
    pub item: &'a T,
    /// Position of the item in the collection
    pub index: usize,
    pub score: Score,
    /// Ascending, non-overlapping character ranges of the matched text
    pub ranges: Vec<RangeInclusive<usize>>,
    pub field: MatchField,
}

impl<'a, T: Searchable> MatchOutcome<'a, T> {
    /// The text `ranges` refer to
    pub fn text(&self) -> &'a str {
        match self.field {
            MatchField::Name => self.item.name(),
            MatchField::Path => self.item.path().map_or(self.item.name(), |(text, _)| text),
        }
    }

    /// Wrap every matched range in `open`/`close` markers
    pub fn highlight(&self, open: &str, close: &str) -> String {
        let mut out = String::new();
        let mut ranges = self.ranges.iter().peekable();

        for (i, ch) in self.text().chars().enumerate() {
            if ranges.peek().is_some_and(|r| *r.start() == i) {
                out.push_str(open);
            }
            out.push(ch);
            if ranges.peek().is_some_and(|r| *r.end() == i) {
                out.push_str(close);
                ranges.next();
            }
        }

        out
    }
}

/// Search options
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Truncate the ranked list (the cache still keeps every match)
    pub max_results: Option<usize>,
    /// Also search item paths when names alone give few results
    pub path_search: bool,
    pub path_search_threshold: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: None,
            path_search: false,
            path_search_threshold: 10,
        }
    }
}

/// Align one field of an item against a normalised query
pub fn match_item<'a, T: Searchable>(
    item: &'a T,
    index: usize,
    query: &[char],
    field: MatchField,
) -> Option<MatchOutcome<'a, T>> {
    let text = match field {
        MatchField::Name => item.romanized(),
        MatchField::Path => item.path()?.1,
    };

    let indices = align(text, query)?;
    let ranges = to_ranges(&indices);
    let score = score(&ranges, text.source_len());

    Some(MatchOutcome {
        item,
        index,
        score,
        ranges,
        field,
    })
}

/// Empty-input result: every item in collection order, unscored
pub fn default_suggestions<T: Searchable>(items: &[T]) -> Vec<MatchOutcome<'_, T>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| MatchOutcome {
            item,
            index,
            score: Score::ZERO,
            ranges: Vec::new(),
            field: MatchField::Name,
        })
        .collect()
}

/// Lower-case and drop whitespace
pub fn normalize_query(query: &str) -> Vec<char> {
    query
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Per-keystroke matcher owning the incremental cache for one input box
#[derive(Debug, Default)]
pub struct Matcher {
    cache: QueryCache,
    options: SearchOptions,
    /// Collection size the cached indices refer to
    collection_len: Option<usize>,
}

impl Matcher {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            cache: QueryCache::new(),
            options,
            collection_len: None,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Forget cached subsets.
    ///
    /// Cached subsets are item indices. The matcher only notices a new collection when its
    /// length changes, so call this whenever items are replaced, reordered or re-romanized.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.collection_len = None;
    }

    /// Rank `items` against the current query; an empty query lists every item.
    ///
    /// `items` must be the same collection, in the same order, as on the previous call
    /// unless its length differs or [`Matcher::reset`] was called in between.
    pub fn query<'a, T: Searchable>(&mut self, query: &str, items: &'a [T]) -> Vec<MatchOutcome<'a, T>> {
        self.query_or_else(query, items, default_suggestions)
    }

    /// Rank `items` against the current query, using `on_empty` when the query is empty.
    /// Same collection contract as [`Matcher::query`].
    pub fn query_or_else<'a, T, F>(
        &mut self,
        query: &str,
        items: &'a [T],
        on_empty: F,
    ) -> Vec<MatchOutcome<'a, T>>
    where
        T: Searchable,
        F: FnOnce(&'a [T]) -> Vec<MatchOutcome<'a, T>>,
    {
        if query.is_empty() {
            self.cache.clear();
            return on_empty(items);
        }

        if self.collection_len != Some(items.len()) {
            if self.collection_len.is_some() {
                log::debug!("Item collection changed size, dropping query cache");
            }
            self.cache.clear();
            self.collection_len = Some(items.len());
        }

        let typed: Vec<char> = query.chars().collect();
        let valid_depth = self.cache.walk(&typed);

        let normalized = normalize_query(query);
        if normalized.is_empty() {
            // whitespace only; nothing to align and nothing worth caching
            return Vec::new();
        }

        let seed = self.cache.seed(valid_depth);
        let name_pool = candidate_pool(seed.and_then(|s| s.by_name.as_deref()), items.len());
        let path_pool = candidate_pool(seed.and_then(|s| s.by_path.as_deref()), items.len());

        let mut results: Vec<MatchOutcome<'a, T>> = name_pool
            .iter()
            .filter_map(|&i| match_item(&items[i], i, &normalized, MatchField::Name))
            .collect();
        results.sort_by(rank);

        let mut subsets = CandidateSubsets {
            by_name: Some(results.iter().map(|m| m.index).collect()),
            by_path: None,
        };

        if self.options.path_search && results.len() < self.options.path_search_threshold {
            let mut path_matches: Vec<MatchOutcome<'a, T>> = path_pool
                .iter()
                .filter_map(|&i| match_item(&items[i], i, &normalized, MatchField::Path))
                .collect();
            path_matches.sort_by(rank);
            subsets.by_path = Some(path_matches.iter().map(|m| m.index).collect());

            let mut matched_by_name = vec![false; items.len()];
            for m in &results {
                matched_by_name[m.index] = true;
            }
            results.extend(path_matches.into_iter().filter(|m| !matched_by_name[m.index]));
        }

        log::debug!(
            "Query {:?}: scanned {} of {} items, {} matches",
            query,
            name_pool.len(),
            items.len(),
            results.len()
        );

        self.cache.store(typed.len(), subsets);

        if let Some(max) = self.options.max_results {
            results.truncate(max);
        }

        results
    }
}

/// Descending score; equal scores keep collection order so cached and fresh scans agree
fn rank<T>(a: &MatchOutcome<'_, T>, b: &MatchOutcome<'_, T>) -> std::cmp::Ordering {
    b.score.cmp(&a.score).then_with(|| a.index.cmp(&b.index))
}

/// Cached subset if one was computed, otherwise the whole collection
fn candidate_pool(cached: Option<&[usize]>, len: usize) -> Vec<usize> {
    match cached {
        Some(indices) => indices.iter().copied().filter(|&i| i < len).collect(),
        None => (0..len).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::romanize::PinyinTable;

    struct Entry {
        name: String,
        pinyin: RomanizedText,
        path: Option<(String, RomanizedText)>,
    }

    impl Searchable for Entry {
        fn name(&self) -> &str {
            &self.name
        }

        fn romanized(&self) -> &RomanizedText {
            &self.pinyin
        }

        fn path(&self) -> Option<(&str, &RomanizedText)> {
            self.path.as_ref().map(|(text, pinyin)| (text.as_str(), pinyin))
        }
    }

    fn table() -> PinyinTable {
        PinyinTable::from_syllables(
            [
                ("zhong", "中"),
                ("wen", "文"),
                ("jian", "件"),
                ("ri", "日"),
                ("ji", "记"),
                ("shu", "书"),
                ("bi", "笔"),
                ("xue", "学"),
                ("xi", "习"),
            ],
            None,
        )
    }

    fn entries(names: &[&str]) -> Vec<Entry> {
        let t = table();
        names
            .iter()
            .map(|name| Entry {
                name: name.to_string(),
                pinyin: RomanizedText::build(name, &t),
                path: None,
            })
            .collect()
    }

    fn names<'a>(results: &[MatchOutcome<'a, Entry>]) -> Vec<&'a str> {
        results.iter().map(|m| m.item.name.as_str()).collect()
    }

    #[test]
    fn test_end_to_end_ranges() {
        let items = entries(&["中文"]);
        let mut matcher = Matcher::default();

        let results = matcher.query("zw", &items);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ranges, vec![0..=1]);
        assert!(results[0].score.is_full_coverage());

        let results = matcher.query("zho", &items);
        assert_eq!(results[0].ranges, vec![0..=0]);
        assert!(!results[0].score.is_full_coverage());

        assert!(matcher.query("xq", &items).is_empty());
    }

    #[test]
    fn test_results_sorted_by_score() {
        let items = entries(&["读书笔记", "笔记", "日记本"]);
        let mut matcher = Matcher::default();
        let results = matcher.query("bj", &items);
        assert_eq!(names(&results), vec!["笔记", "读书笔记"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_query_is_normalized() {
        let items = entries(&["中文 Notes"]);
        let mut matcher = Matcher::default();
        assert_eq!(matcher.query("ZW", &items).len(), 1);
        assert_eq!(matcher.query("zw no", &items).len(), 1);
    }

    #[test]
    fn test_empty_query_uses_default_path() {
        let items = entries(&["中文", "笔记"]);
        let mut matcher = Matcher::default();
        matcher.query("zw", &items);

        let results = matcher.query("", &items);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|m| m.ranges.is_empty() && m.score == Score::ZERO));
        assert_eq!(matcher.cache().depth(), 0);

        let custom = matcher.query_or_else("", &items, |_| Vec::new());
        assert!(custom.is_empty());
    }

    #[test]
    fn test_whitespace_only_query() {
        let items = entries(&["中文"]);
        let mut matcher = Matcher::default();
        assert!(matcher.query("  ", &items).is_empty());
        // nothing was cached for the blank prefix
        assert_eq!(names(&matcher.query("  zw", &items)), vec!["中文"]);
    }

    #[test]
    fn test_cache_narrows_on_append() {
        let items = entries(&["中文", "文件", "笔记"]);
        let mut matcher = Matcher::default();
        matcher.query("w", &items);
        let results = matcher.query("wj", &items);
        assert_eq!(names(&results), vec!["文件"]);
    }

    #[test]
    fn test_cache_edit_matches_fresh_query() {
        let items = entries(&["a中", "ab", "ac", "文ac", "cab", "xyz"]);

        let mut incremental = Matcher::default();
        incremental.query("a", &items);
        incremental.query("ab", &items);
        incremental.query("a", &items);
        let edited = incremental.query("ac", &items);

        let mut fresh = Matcher::default();
        let direct = fresh.query("ac", &items);

        assert_eq!(names(&edited), names(&direct));
        let ranges: Vec<_> = edited.iter().map(|m| m.ranges.clone()).collect();
        let direct_ranges: Vec<_> = direct.iter().map(|m| m.ranges.clone()).collect();
        assert_eq!(ranges, direct_ranges);
    }

    #[test]
    fn test_cache_edit_in_the_middle() {
        let items = entries(&["中文件", "中学", "中日记"]);
        let mut matcher = Matcher::default();
        matcher.query("z", &items);
        matcher.query("zw", &items);
        matcher.query("zwj", &items);
        let results = matcher.query("zr", &items);
        assert_eq!(names(&results), vec!["中日记"]);

        let mut fresh = Matcher::default();
        assert_eq!(names(&fresh.query("zr", &items)), vec!["中日记"]);
    }

    #[test]
    fn test_collection_change_drops_cache() {
        let mut matcher = Matcher::default();
        let small = entries(&["笔记"]);
        assert_eq!(matcher.query("b", &small).len(), 1);

        let large = entries(&["笔记", "读书笔记", "中文"]);
        let results = matcher.query("bj", &large);
        assert_eq!(names(&results), vec!["笔记", "读书笔记"]);
    }

    #[test]
    fn test_reset_after_same_size_replacement() {
        let mut matcher = Matcher::default();
        let before = entries(&["笔记", "中文"]);
        assert_eq!(names(&matcher.query("b", &before)), vec!["笔记"]);

        let after = entries(&["中文", "笔记"]);
        matcher.reset();
        assert_eq!(matcher.cache().depth(), 0);
        assert_eq!(names(&matcher.query("bj", &after)), vec!["笔记"]);
    }

    #[test]
    fn test_max_results() {
        let items = entries(&["笔记", "读书笔记", "日记本"]);
        let mut matcher = Matcher::new(SearchOptions {
            max_results: Some(1),
            ..SearchOptions::default()
        });
        assert_eq!(matcher.query("j", &items).len(), 1);
        // the cache still holds every match for the next keystroke
        assert_eq!(matcher.query("ji", &items).len(), 1);
    }

    #[test]
    fn test_path_search() {
        let t = table();
        let folder = RomanizedText::build("学习/", &t);
        let items: Vec<Entry> = ["笔记", "readme"]
            .iter()
            .map(|name| {
                let pinyin = RomanizedText::build(name, &t);
                Entry {
                    name: name.to_string(),
                    path: Some((format!("学习/{}", name), folder.concat(&pinyin))),
                    pinyin,
                }
            })
            .collect();

        let mut matcher = Matcher::new(SearchOptions {
            path_search: true,
            ..SearchOptions::default()
        });

        let results = matcher.query("xr", &items);
        assert_eq!(results.len(), 0);

        let results = matcher.query("xx/b", &items);
        assert_eq!(names(&results), vec!["笔记"]);
        assert_eq!(results[0].field, MatchField::Path);
        assert_eq!(results[0].text(), "学习/笔记");
        assert_eq!(results[0].ranges, vec![0..=3]);
    }

    #[test]
    fn test_name_matches_come_before_path_matches() {
        let t = table();
        let folder = RomanizedText::build("笔记 ", &t);
        let items: Vec<Entry> = ["笔记", "文件"]
            .iter()
            .map(|name| {
                let pinyin = RomanizedText::build(name, &t);
                Entry {
                    name: name.to_string(),
                    path: Some((format!("笔记 {}", name), folder.concat(&pinyin))),
                    pinyin,
                }
            })
            .collect();

        let mut matcher = Matcher::new(SearchOptions {
            path_search: true,
            ..SearchOptions::default()
        });
        let results = matcher.query("bj", &items);
        assert_eq!(names(&results), vec!["笔记", "文件"]);
        assert_eq!(results[0].field, MatchField::Name);
        assert_eq!(results[1].field, MatchField::Path);
    }

    #[test]
    fn test_highlight() {
        let items = entries(&["读书笔记"]);
        let mut matcher = Matcher::default();
        let results = matcher.query("shubj", &items);
        assert_eq!(results[0].highlight("[", "]"), "读[书笔记]");

        let items = entries(&["a-b-c"]);
        let results = matcher.query("abc", &items);
        assert!(results.is_empty());
        let results = matcher.query("b-c", &items);
        assert_eq!(results[0].highlight("<", ">"), "a-<b-c>");
    }
}
