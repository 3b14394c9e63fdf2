//! Item index module
//! Builds searchable items (files, folders, tags) together with their romanized text

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::romanize::{RomanizationTable, RomanizedText};
use crate::search::Searchable;

/// A collection of items that knows how to (re)build itself
pub trait PinyinIndex {
    /// Short name used in logs
    fn id(&self) -> &str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard everything and rebuild from the source
    fn rebuild(&mut self, table: &dyn RomanizationTable);

    /// Bring the items in line with the source, re-romanizing only what changed
    fn update(&mut self, table: &dyn RomanizationTable);
}

/// Rebuild every index, logging item counts and timings
pub fn rebuild_all(indexes: &mut [&mut dyn PinyinIndex], table: &dyn RomanizationTable) {
    for index in indexes.iter_mut() {
        let started = Instant::now();
        index.rebuild(table);
        log::info!(
            "{} indexing completed, totaling {} items, taking {:.3}s",
            index.id(),
            index.len(),
            started.elapsed().as_secs_f64()
        );
    }
}

/// What kind of file an item is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Note,
    Attachment,
    Other,
}

/// Represents an indexed file
#[derive(Clone, Debug)]
pub struct FileItem {
    /// Display name: the stem for notes, the full file name otherwise
    pub name: String,
    pub path: PathBuf,
    /// Path relative to the index root, `/`-separated
    pub relative: String,
    pub kind: FileKind,
    pinyin: RomanizedText,
    path_pinyin: RomanizedText,
}

impl FileItem {
    fn new(root: &Path, path: PathBuf, kind: FileKind, table: &dyn RomanizationTable) -> Option<Self> {
        let name = match kind {
            FileKind::Note => path.file_stem(),
            FileKind::Attachment | FileKind::Other => path.file_name(),
        }
        .and_then(|n| n.to_str())?
        .to_string();

        let folder = parent_text(root, &path);
        let pinyin = RomanizedText::build(&name, table);
        let path_pinyin = RomanizedText::build(&folder, table).concat(&pinyin);

        Some(Self {
            relative: format!("{}{}", folder, name),
            name,
            path,
            kind,
            pinyin,
            path_pinyin,
        })
    }
}

impl Searchable for FileItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn romanized(&self) -> &RomanizedText {
        &self.pinyin
    }

    fn path(&self) -> Option<(&str, &RomanizedText)> {
        Some((&self.relative, &self.path_pinyin))
    }
}

/// `/`-terminated text of the folders between `root` and `path`
fn parent_text(root: &Path, path: &Path) -> String {
    path.parent()
        .and_then(|p| p.strip_prefix(root).ok())
        .map(|p| {
            p.components()
                .filter_map(|c| c.as_os_str().to_str())
                .map(|c| format!("{}/", c))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Which files a `FileIndex` picks up
#[derive(Clone, Debug)]
pub struct FileIndexOptions {
    pub max_depth: u32,
    pub note_extensions: Vec<String>,
    pub show_attachments: bool,
    pub attachment_extensions: Vec<String>,
    pub show_all_file_types: bool,
}

impl Default for FileIndexOptions {
    fn default() -> Self {
        Self {
            max_depth: 8,
            note_extensions: vec!["md".to_string()],
            show_attachments: false,
            attachment_extensions: Vec::new(),
            show_all_file_types: false,
        }
    }
}

impl FileIndexOptions {
    fn classify(&self, path: &Path) -> Option<FileKind> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if self.note_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            Some(FileKind::Note)
        } else if self.attachment_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            (self.show_attachments || self.show_all_file_types).then_some(FileKind::Attachment)
        } else {
            self.show_all_file_types.then_some(FileKind::Other)
        }
    }
}

/// Files below a root directory
#[derive(Debug)]
pub struct FileIndex {
    root: PathBuf,
    options: FileIndexOptions,
    items: Vec<FileItem>,
}

impl FileIndex {
    pub fn new(root: impl Into<PathBuf>, options: FileIndexOptions) -> Self {
        Self {
            root: root.into(),
            options,
            items: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn items(&self) -> &[FileItem] {
        &self.items
    }

    fn scan(&self) -> Vec<(PathBuf, FileKind)> {
        let mut found = Vec::new();
        scan_directory(&self.root, &self.options, &mut found, self.options.max_depth);
        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
    }
}

impl PinyinIndex for FileIndex {
    fn id(&self) -> &str {
        "file"
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn rebuild(&mut self, table: &dyn RomanizationTable) {
        let root = self.root.clone();
        self.items = self
            .scan()
            .into_iter()
            .filter_map(|(path, kind)| FileItem::new(&root, path, kind, table))
            .collect();
    }

    fn update(&mut self, table: &dyn RomanizationTable) {
        let found = self.scan();
        let current: HashSet<&Path> = found.iter().map(|(p, _)| p.as_path()).collect();
        let known: HashSet<PathBuf> = self.items.iter().map(|item| item.path.clone()).collect();

        let before = self.items.len();
        self.items.retain(|item| current.contains(item.path.as_path()));
        let removed = before - self.items.len();

        let root = self.root.clone();
        let added: Vec<FileItem> = found
            .into_iter()
            .filter(|(path, _)| !known.contains(path))
            .filter_map(|(path, kind)| FileItem::new(&root, path, kind, table))
            .collect();

        log::debug!("file index update: {} added, {} removed", added.len(), removed);
        self.items.extend(added);
    }
}

/// Recursively collect matching files, skipping dot-directories
fn scan_directory(dir: &Path, options: &FileIndexOptions, found: &mut Vec<(PathBuf, FileKind)>, max_depth: u32) {
    if max_depth == 0 {
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Failed to read directory {:?}: {}", dir, e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }

        if path.is_dir() {
            scan_directory(&path, options, found, max_depth - 1);
        } else if let Some(kind) = options.classify(&path) {
            found.push((path, kind));
        }
    }
}

/// Represents an indexed folder
#[derive(Clone, Debug)]
pub struct FolderItem {
    pub name: String,
    pub path: PathBuf,
    /// Path relative to the index root, `/`-separated
    pub relative: String,
    pinyin: RomanizedText,
    path_pinyin: RomanizedText,
}

impl FolderItem {
    fn new(root: &Path, path: PathBuf, table: &dyn RomanizationTable) -> Option<Self> {
        let name = path.file_name().and_then(|n| n.to_str())?.to_string();
        let parent = parent_text(root, &path);

        let pinyin = RomanizedText::build(&name, table);
        let path_pinyin = RomanizedText::build(&parent, table).concat(&pinyin);

        Some(Self {
            relative: format!("{}{}", parent, name),
            name,
            path,
            pinyin,
            path_pinyin,
        })
    }
}

impl Searchable for FolderItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn romanized(&self) -> &RomanizedText {
        &self.pinyin
    }

    fn path(&self) -> Option<(&str, &RomanizedText)> {
        Some((&self.relative, &self.path_pinyin))
    }
}

/// Folders below a root directory, the root itself excluded
#[derive(Debug)]
pub struct FolderIndex {
    root: PathBuf,
    max_depth: u32,
    items: Vec<FolderItem>,
}

impl FolderIndex {
    pub fn new(root: impl Into<PathBuf>, max_depth: u32) -> Self {
        Self {
            root: root.into(),
            max_depth,
            items: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn items(&self) -> &[FolderItem] {
        &self.items
    }

    fn scan(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        scan_folders(&self.root, &mut found, self.max_depth);
        found.sort();
        found
    }
}

impl PinyinIndex for FolderIndex {
    fn id(&self) -> &str {
        "folder"
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn rebuild(&mut self, table: &dyn RomanizationTable) {
        let root = self.root.clone();
        self.items = self
            .scan()
            .into_iter()
            .filter_map(|path| FolderItem::new(&root, path, table))
            .collect();
    }

    fn update(&mut self, table: &dyn RomanizationTable) {
        let found = self.scan();
        let current: HashSet<&Path> = found.iter().map(PathBuf::as_path).collect();
        let known: HashSet<PathBuf> = self.items.iter().map(|item| item.path.clone()).collect();

        let before = self.items.len();
        self.items.retain(|item| current.contains(item.path.as_path()));
        let removed = before - self.items.len();

        let root = self.root.clone();
        let added: Vec<FolderItem> = found
            .into_iter()
            .filter(|path| !known.contains(path))
            .filter_map(|path| FolderItem::new(&root, path, table))
            .collect();

        log::debug!("folder index update: {} added, {} removed", added.len(), removed);
        self.items.extend(added);
    }
}

/// Recursively collect non-hidden directories
fn scan_folders(dir: &Path, found: &mut Vec<PathBuf>, max_depth: u32) {
    if max_depth == 0 {
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Failed to read directory {:?}: {}", dir, e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if is_hidden(&path) || !path.is_dir() {
            continue;
        }
        scan_folders(&path, found, max_depth - 1);
        found.push(path);
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(true, |n| n.starts_with('.'))
}

/// Represents a tag
#[derive(Clone, Debug)]
pub struct TagItem {
    pub name: String,
    pinyin: RomanizedText,
}

impl TagItem {
    pub fn new(name: impl Into<String>, table: &dyn RomanizationTable) -> Self {
        let name = name.into();
        let pinyin = RomanizedText::build(&name, table);
        Self { name, pinyin }
    }
}

impl Searchable for TagItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn romanized(&self) -> &RomanizedText {
        &self.pinyin
    }
}

/// Tags pulled from a caller-supplied source
pub struct TagIndex {
    source: Box<dyn Fn() -> Vec<String>>,
    items: Vec<TagItem>,
}

impl TagIndex {
    pub fn new(source: impl Fn() -> Vec<String> + 'static) -> Self {
        Self {
            source: Box::new(source),
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[TagItem] {
        &self.items
    }
}

impl PinyinIndex for TagIndex {
    fn id(&self) -> &str {
        "tag"
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn rebuild(&mut self, table: &dyn RomanizationTable) {
        self.items = (self.source)()
            .into_iter()
            .map(|tag| TagItem::new(tag, table))
            .collect();
    }

    fn update(&mut self, table: &dyn RomanizationTable) {
        let tags = (self.source)();
        let current: HashSet<&str> = tags.iter().map(String::as_str).collect();
        let known: HashSet<String> = self.items.iter().map(|t| t.name.clone()).collect();

        self.items.retain(|item| current.contains(item.name.as_str()));
        self.items.extend(
            tags.iter()
                .filter(|tag| !known.contains(tag.as_str()))
                .map(|tag| TagItem::new(tag.clone(), table)),
        );
    }
}
