//! Terminal host for the fuzzy pinyin matcher
//! Indexes a directory, then treats every stdin line as the current contents of the search box

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use fuzzy_pinyin::index::{rebuild_all, FileItem, PinyinIndex};
use fuzzy_pinyin::search::{MatchField, MatchOutcome, Searchable};
use fuzzy_pinyin::{EngineConfig, FileIndex, FolderIndex, Matcher, Score};

/// Empty input: most used items first
fn mru_suggestions<'a>(items: &'a [FileItem], config: &EngineConfig) -> Vec<MatchOutcome<'a, FileItem>> {
    let mut used: Vec<MatchOutcome<'a, FileItem>> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| config.get_mru_score(&item.name) > 0)
        .map(|(index, item)| MatchOutcome {
            item,
            index,
            score: Score::ZERO,
            ranges: Vec::new(),
            field: MatchField::Name,
        })
        .collect();

    used.sort_by_key(|m| std::cmp::Reverse(config.get_mru_score(&m.item.name)));
    used.truncate(config.search.max_results);
    used
}

fn print_results<T: Searchable>(out: &mut impl Write, results: &[MatchOutcome<'_, T>]) -> io::Result<()> {
    for (n, result) in results.iter().enumerate() {
        let score = if result.score.is_full_coverage() {
            "full".to_string()
        } else {
            format!("{:.2}", result.score.value())
        };
        writeln!(out, "{:>3} {:>7}  {}", n, score, result.highlight("[", "]"))?;
    }
    writeln!(out, "---")?;
    out.flush()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting fuzzy-pinyin...");

    let mut config = EngineConfig::load();
    let table = config.romanization_table();

    let root = match env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => env::current_dir()?,
    };

    let mut folders = FolderIndex::new(root.clone(), config.file.max_depth);
    let mut index = FileIndex::new(root, config.file_index_options());
    {
        let mut indexes: [&mut dyn PinyinIndex; 2] = [&mut folders, &mut index];
        rebuild_all(&mut indexes, &table);
    }

    let mut matcher = Matcher::new(config.search_options());
    let mut folder_matcher = Matcher::new(config.search_options());
    let mut last_shown: Vec<String> = Vec::new();

    println!(
        "Type a query per line; '@query' searches folders, an empty line shows recent items, \
         ':open N' records a choice, ':reindex' rescans."
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;

        if let Some(arg) = line.strip_prefix(":open ") {
            match arg.trim().parse::<usize>().ok().and_then(|n| last_shown.get(n)) {
                Some(name) => {
                    log::info!("Opening: {}", name);
                    config.record_usage(name);
                }
                None => log::warn!("No result at {:?}", arg.trim()),
            }
            continue;
        }

        if line == ":reindex" {
            index.update(&table);
            folders.update(&table);
            matcher.reset();
            folder_matcher.reset();
            log::info!("Index refreshed, {} files, {} folders", index.len(), folders.len());
            continue;
        }

        if let Some(query) = line.strip_prefix('@') {
            let results = folder_matcher.query(query, folders.items());
            last_shown = results.iter().map(|m| m.item.name().to_string()).collect();
            print_results(&mut stdout, &results)?;
            continue;
        }

        let results = matcher.query_or_else(&line, index.items(), |items| mru_suggestions(items, &config));
        log::debug!("Search returned {} results", results.len());

        last_shown = results.iter().map(|m| m.item.name.clone()).collect();
        print_results(&mut stdout, &results)?;
    }

    config.save();
    log::info!("fuzzy-pinyin shutting down...");
    Ok(())
}
