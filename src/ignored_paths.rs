//! The ignore predicate: answers whether a path is excluded from
//! enumeration.
//!
//! Two matchers are held per instance. The default matcher carries the
//! built-in patterns (and, unless the dotfiles variant is requested, the
//! dotfile exclusion); the custom matcher carries the user's ignore file
//! and any extra CLI patterns. The enumerator keeps two full instances,
//! one per dotfiles setting, so user-supplied patterns are preserved
//! exactly when switching variants.

use crate::constants::{DEFAULT_IGNORE_PATTERNS, IGNORE_FILENAME};
use crate::errors::{io_error_with_path, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log::debug;
use std::io;
use std::path::{Path, PathBuf};

/// Matches paths against built-in defaults, the ignore file, and extra
/// patterns. All matching is rooted at the working directory; paths
/// outside it are never ignored.
#[derive(Debug)]
pub struct IgnoredPaths {
    cwd: PathBuf,
    default_matcher: Gitignore,
    custom_matcher: Gitignore,
}

impl IgnoredPaths {
    /// Builds the predicate.
    ///
    /// * `ignore` — when false, the ignore file and `patterns` are not
    ///   consulted at all; only the built-in defaults remain.
    /// * `ignore_path` — explicit ignore file. Missing is an error; when
    ///   `None`, the default ignore file is used if present.
    /// * `dotfiles` — when true, dotfiles are not excluded by default.
    pub fn new(
        cwd: &Path,
        ignore: bool,
        ignore_path: Option<&Path>,
        patterns: &[String],
        dotfiles: bool,
    ) -> Result<Self> {
        let mut default_builder = GitignoreBuilder::new(cwd);
        for pattern in DEFAULT_IGNORE_PATTERNS {
            default_builder.add_line(None, pattern)?;
        }
        if !dotfiles {
            default_builder.add_line(None, ".*")?;
        }
        let default_matcher = default_builder.build()?;

        let custom_matcher = if ignore {
            let mut custom_builder = GitignoreBuilder::new(cwd);
            match ignore_path {
                Some(path) => {
                    if !path.is_file() {
                        return Err(io_error_with_path(
                            io::Error::new(io::ErrorKind::NotFound, "ignore file not found"),
                            path,
                        ));
                    }
                    if let Some(err) = custom_builder.add(path) {
                        return Err(err.into());
                    }
                }
                None => {
                    let default_path = cwd.join(IGNORE_FILENAME);
                    if default_path.is_file() {
                        debug!("Loading ignore file: {}", default_path.display());
                        if let Some(err) = custom_builder.add(&default_path) {
                            return Err(err.into());
                        }
                    }
                }
            }
            for pattern in patterns {
                custom_builder.add_line(None, pattern)?;
            }
            custom_builder.build()?
        } else {
            Gitignore::empty()
        };

        Ok(IgnoredPaths {
            cwd: cwd.to_path_buf(),
            default_matcher,
            custom_matcher,
        })
    }

    /// True when any matcher (built-in or user-supplied) ignores `path`.
    pub fn contains(&self, path: &Path, is_dir: bool) -> bool {
        self.contains_by_default(path, is_dir) || self.is_match(&self.custom_matcher, path, is_dir)
    }

    /// True when only the built-in default patterns ignore `path`. Used for
    /// walk-discovered files when the ignore flag is off.
    pub fn contains_by_default(&self, path: &Path, is_dir: bool) -> bool {
        self.is_match(&self.default_matcher, path, is_dir)
    }

    fn is_match(&self, matcher: &Gitignore, path: &Path, is_dir: bool) -> bool {
        let Ok(relative) = path.strip_prefix(&self.cwd) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return false;
        }
        matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }
}
