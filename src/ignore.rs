use glob::Pattern;
use std::path::Path;

/// Exclusion rules applied while walking a source tree.
///
/// Lock files and transient download caches never belong in an artifact, so
/// they are filtered before classification; callers can stack additional
/// glob patterns on top.
pub struct IgnoreRules {
    patterns: Vec<Pattern>,
}

/// Patterns excluded from every packaging run.
const BUILTIN_PATTERNS: &[&str] = &["*.lock", ".cache"];

impl IgnoreRules {
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Built-in exclusions plus caller-supplied glob patterns.
    pub fn defaults_with(extra: &[String]) -> Self {
        let patterns = BUILTIN_PATTERNS
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
            .filter_map(|p| Pattern::new(p).ok())
            .collect();
        Self { patterns }
    }

    /// Parse rules from a newline-separated string.
    pub fn parse(content: &str) -> Self {
        let patterns = content
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|l| Pattern::new(l).ok())
            .collect();
        Self { patterns }
    }

    /// Returns true if the given path (relative to the source root) should be excluded
    pub fn is_ignored(&self, path: &Path) -> bool {
        // Check the path itself and all its parents
        for ancestor in path.ancestors() {
            let path_str = ancestor.to_string_lossy();
            if path_str.is_empty() || path_str == "." {
                continue;
            }
            for pattern in &self.patterns {
                if pattern.matches(&path_str) {
                    return true;
                }
            }
        }
        false
    }
}

/// Split a caller-supplied exclude string into individual glob patterns.
/// Patterns may be wrapped in single or double quotes; unquoted runs split
/// on whitespace.
pub fn parse_exclude_patterns(input: &str) -> Vec<String> {
    let mut patterns = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                patterns.push(std::mem::take(&mut current));
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    patterns.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        patterns.push(current);
    }
    patterns
}
