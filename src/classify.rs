use crate::error::{PackError, Result};
use crate::ignore::IgnoreRules;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Semantic category a packaged file belongs to. Every regular file in the
/// source tree maps to exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Weights,
    Config,
    Docs,
    Code,
    Dataset,
}

impl Category {
    /// Layer emission order. Manifests list categories in this fixed
    /// priority so layer ordering is independent of walk order.
    pub const PRIORITY: [Category; 5] = [
        Category::Weights,
        Category::Config,
        Category::Docs,
        Category::Code,
        Category::Dataset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Weights => "weights",
            Category::Config => "config",
            Category::Docs => "docs",
            Category::Code => "code",
            Category::Dataset => "dataset",
        }
    }
}

// Classification tables. Kept as data so the rules stay auditable in one
// place; matching order is weights, docs, config, code, dataset.
const WEIGHT_EXTENSIONS: &[&str] = &["safetensors", "bin", "gguf", "pt", "ckpt"];
const DOC_PREFIXES: &[&str] = &["readme", "license"];
const CONFIG_NAMES: &[&str] = &["config.json", "tokenizer.json", "generation_config.json"];
const CONFIG_EXTENSIONS: &[&str] = &["json", "txt"];
const CODE_EXTENSIONS: &[&str] = &["py", "sh", "ipynb", "go", "js", "ts"];
const DATASET_EXTENSIONS: &[&str] = &["csv", "tsv", "jsonl", "parquet", "arrow", "h5", "npz"];

/// Unmatched files at or above this size are treated as weights: an
/// oversized unknown file is far more likely a model blob than metadata.
pub const WEIGHT_SIZE_THRESHOLD: u64 = 10 * 1024 * 1024;

fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Classify a single file by its lower-cased base name and size.
pub fn classify_name(lower: &str, size: u64) -> Category {
    let ext = extension(lower);

    if ext.is_some_and(|e| WEIGHT_EXTENSIONS.contains(&e)) {
        return Category::Weights;
    }
    if DOC_PREFIXES.iter().any(|p| lower.starts_with(p)) || ext == Some("md") {
        return Category::Docs;
    }
    if CONFIG_NAMES.contains(&lower)
        || (lower.contains("tokenizer") && ext == Some("json"))
        || ext.is_some_and(|e| CONFIG_EXTENSIONS.contains(&e))
    {
        return Category::Config;
    }
    if ext.is_some_and(|e| CODE_EXTENSIONS.contains(&e)) {
        return Category::Code;
    }
    if ext.is_some_and(|e| DATASET_EXTENSIONS.contains(&e)) {
        return Category::Dataset;
    }
    if size >= WEIGHT_SIZE_THRESHOLD {
        Category::Weights
    } else {
        Category::Config
    }
}

/// Category-partitioned file lists, relative forward-slash paths, each list
/// sorted lexicographically.
#[derive(Debug, Default)]
pub struct ClassifiedTree {
    by_category: BTreeMap<Category, Vec<String>>,
}

impl ClassifiedTree {
    pub fn files(&self, category: Category) -> &[String] {
        self.by_category.get(&category).map_or(&[], Vec::as_slice)
    }

    pub fn total_files(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }
}

/// Walk the source tree and return all non-excluded regular files as sorted
/// forward-slash relative paths. Walk errors abort the run.
pub fn list_files(root: &Path, ignore: &IgnoreRules) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| PackError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if ignore.is_ignored(rel) {
            continue;
        }
        files.push(to_forward_slash(rel));
    }
    // Explicit sort for OS-independent determinism
    files.sort();
    Ok(files)
}

/// Walk the source tree and partition every regular file into its category.
pub fn classify_tree(root: &Path, ignore: &IgnoreRules) -> Result<ClassifiedTree> {
    let mut tree = ClassifiedTree::default();
    for rel in list_files(root, ignore)? {
        let base = rel.rsplit('/').next().unwrap_or(&rel).to_lowercase();
        let size = std::fs::metadata(root.join(&rel))?.len();
        tree.by_category
            .entry(classify_name(&base, size))
            .or_default()
            .push(rel);
    }
    // Each list is already sorted: list_files sorts globally and partition
    // preserves relative order.
    Ok(tree)
}

fn to_forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
