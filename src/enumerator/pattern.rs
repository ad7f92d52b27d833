// src/enumerator/pattern.rs

//! Classification and splitting of input patterns.

use once_cell::sync::Lazy;
use regex::Regex;

/// Glob metacharacters: `* ? [ ] { }`.
static GLOB_META: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[*?\[\]{}]").unwrap_or_else(|e| panic!("invalid glob meta regex: {e}"))
});

/// A leading `.` or a `/.` segment not followed by another dot: the shapes
/// that select the with-dotfiles ignore variant. Bare `.` and `..`
/// components do not count.
static DOTFILE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[/\\])\.[^./\\]")
        .unwrap_or_else(|e| panic!("invalid dotfile regex: {e}"))
});

/// True when `pattern` contains glob metacharacters.
pub(crate) fn is_glob_pattern(pattern: &str) -> bool {
    GLOB_META.is_match(pattern)
}

/// True when `pattern` explicitly names dotfiles.
pub(crate) fn is_dotfile_pattern(pattern: &str) -> bool {
    DOTFILE_SHAPE.is_match(pattern)
}

/// Splits an absolute glob pattern (forward slashes) into the non-glob
/// parent directory and the glob tail: the parent is everything before the
/// first segment containing a metacharacter.
pub(crate) fn split_glob(pattern: &str) -> (String, String) {
    let mut parent_end = 0;
    for (offset, segment) in split_segments(pattern) {
        if is_glob_pattern(segment) {
            let parent = pattern[..parent_end].trim_end_matches('/');
            let parent = if parent.is_empty() { "/" } else { parent };
            return (parent.to_string(), pattern[offset..].to_string());
        }
        parent_end = offset + segment.len();
    }
    // No glob segment: the parent is the dirname.
    match pattern.rfind('/') {
        Some(0) => ("/".to_string(), pattern[1..].to_string()),
        Some(idx) => (pattern[..idx].to_string(), pattern[idx + 1..].to_string()),
        None => (pattern.to_string(), String::new()),
    }
}

/// True when a glob tail requires descending into subdirectories.
pub(crate) fn is_recursive_tail(tail: &str) -> bool {
    tail.contains("**") || tail.contains('/')
}

fn split_segments(pattern: &str) -> impl Iterator<Item = (usize, &str)> {
    pattern
        .split('/')
        .scan(0usize, |offset, segment| {
            let start = *offset;
            *offset = start + segment.len() + 1;
            Some((start, segment))
        })
        .filter(|(_, segment)| !segment.is_empty())
}
