//! The public surface: expands input patterns into target files and binds
//! each file to its finalized configuration.
//!
//! Enumeration is lazy: [`FileEnumerator::iterate_files`] returns a
//! pull-based iterator, and no filesystem work happens beyond what the
//! consumer pulls. Pattern dispatch precedence is glob, then directory,
//! then single file.

use crate::constants::{DEFAULT_EXTENSIONS, DEFAULT_TARGET_FILENAME};
use crate::core_types::{ConfigArray, FileAndConfig, FileEntry, IgnoredStatus};
use crate::errors::{io_error_with_path, Error, Result};
use crate::ignored_paths::IgnoredPaths;
use crate::loader::ConfigData;
use crate::paths::{resolve_path, to_match_string};
use crate::resolver::{CascadingResolver, ResolverSources};
use directories::UserDirs;
use log::{debug, trace};
use regex::Regex;
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod pattern;
mod walker;

use pattern::{is_dotfile_pattern, is_glob_pattern, is_recursive_tail, split_glob};
use walker::{DirWalk, Selector};

/// Enumerates target files for a set of input patterns and resolves the
/// cascaded configuration for each.
///
/// Construct with [`FileEnumerator::builder`]. The enumerator is
/// single-threaded; callers must not share one instance across threads.
pub struct FileEnumerator {
    cwd: PathBuf,
    pub(crate) resolver: CascadingResolver,
    ignored_paths: IgnoredPaths,
    ignored_paths_with_dotfiles: IgnoredPaths,
    pub(crate) extension_regex: Regex,
    ignore_flag: bool,
    glob_input_paths: bool,
}

impl FileEnumerator {
    pub fn builder() -> FileEnumeratorBuilder {
        FileEnumeratorBuilder::default()
    }

    /// The configured working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Lazily yields the files selected by `patterns` with their finalized
    /// configurations. Accepts a single pattern or a sequence.
    ///
    /// Per pattern, the iterator fails with [`Error::NoFilesFound`] when
    /// nothing matched at all and with [`Error::AllFilesIgnored`] when
    /// everything that matched was silently ignored. After an error the
    /// iterator is exhausted.
    pub fn iterate_files<P: IntoPatterns>(&self, patterns: P) -> FileIterator<'_> {
        FileIterator {
            enumerator: self,
            patterns: patterns.into_patterns().into_iter(),
            seen: HashSet::new(),
            current: None,
            done: false,
        }
    }

    /// Resolves the finalized configuration array for `file_path`
    /// (resolved against the working directory). With `None`, resolves for
    /// a placeholder file in the working directory, which is the hook for
    /// print-config style callers when no file is given.
    pub fn config_array_for_file<P: AsRef<Path>>(
        &self,
        file_path: Option<P>,
    ) -> Result<Arc<ConfigArray>> {
        let target = match file_path {
            Some(path) => resolve_path(&self.cwd, path.as_ref()),
            None => self.cwd.join(DEFAULT_TARGET_FILENAME),
        };
        debug!("Resolving config for {}", target.display());
        self.resolver.config_array_for_file(&target, false)
    }

    /// Rebuilds the base and CLI configurations and drops all caches.
    /// Arrays returned before the clear keep their contents but no longer
    /// share identity with anything returned afterwards.
    pub fn clear_cache(&mut self) -> Result<()> {
        debug!("Clearing config caches");
        self.resolver.clear_cache()
    }

    /// Applies the ignore predicate. Directly-named files bypass user
    /// ignore rules when the ignore flag is off; walk-discovered files are
    /// always subject to at least the built-in defaults.
    pub(crate) fn is_ignored_file(
        &self,
        path: &Path,
        is_dir: bool,
        dotfiles: bool,
        direct: bool,
    ) -> bool {
        let ignored_paths = if dotfiles {
            &self.ignored_paths_with_dotfiles
        } else {
            &self.ignored_paths
        };
        if self.ignore_flag {
            ignored_paths.contains(path, is_dir)
        } else {
            !direct && ignored_paths.contains_by_default(path, is_dir)
        }
    }
}

/// Conversion into a pattern list, so [`FileEnumerator::iterate_files`]
/// accepts a single pattern or a sequence.
pub trait IntoPatterns {
    fn into_patterns(self) -> Vec<String>;
}

impl IntoPatterns for &str {
    fn into_patterns(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoPatterns for String {
    fn into_patterns(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoPatterns for &String {
    fn into_patterns(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<S: AsRef<str>> IntoPatterns for &[S] {
    fn into_patterns(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> IntoPatterns for &[S; N] {
    fn into_patterns(self) -> Vec<String> {
        self[..].into_patterns()
    }
}

impl<S: AsRef<str>> IntoPatterns for Vec<S> {
    fn into_patterns(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

/// Builds a [`FileEnumerator`].
#[derive(Debug, Default)]
pub struct FileEnumeratorBuilder {
    cwd: Option<PathBuf>,
    home_dir: Option<PathBuf>,
    base_config: Option<ConfigData>,
    cli_config: Option<ConfigData>,
    config_file: Option<PathBuf>,
    rule_dirs: Vec<PathBuf>,
    extensions: Option<Vec<String>>,
    use_config_files: Option<bool>,
    glob_input_paths: Option<bool>,
    ignore: Option<bool>,
    ignore_path: Option<PathBuf>,
    ignore_patterns: Vec<String>,
}

impl FileEnumeratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Working directory patterns and relative paths resolve against.
    /// Defaults to the process working directory.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Overrides the detected home directory (personal config location and
    /// ancestor-walk stop condition).
    pub fn home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home_dir.into());
        self
    }

    /// The base configuration, lowest precedence of every chain.
    pub fn base_config(mut self, data: ConfigData) -> Self {
        self.base_config = Some(data);
        self
    }

    /// Inline CLI configuration, highest precedence of every chain.
    pub fn cli_config(mut self, data: ConfigData) -> Self {
        self.cli_config = Some(data);
        self
    }

    /// Explicit config file, loaded underneath the inline CLI config.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Extra rule directories exposed through the synthetic rules-dir
    /// plugin.
    pub fn rule_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.rule_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// File extensions targeted by directory walks.
    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// When false, per-directory config files are not searched and the
    /// base configuration is used directly.
    pub fn use_config_files(mut self, enabled: bool) -> Self {
        self.use_config_files = Some(enabled);
        self
    }

    /// When false, patterns are never interpreted as globs.
    pub fn glob_input_paths(mut self, enabled: bool) -> Self {
        self.glob_input_paths = Some(enabled);
        self
    }

    /// When false, the ignore file and extra ignore patterns are not
    /// consulted; built-in defaults still apply to walk-discovered files.
    pub fn ignore(mut self, enabled: bool) -> Self {
        self.ignore = Some(enabled);
        self
    }

    /// Explicit ignore file path.
    pub fn ignore_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignore_path = Some(path.into());
        self
    }

    /// Extra ignore patterns, applied after the ignore file.
    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn build(self) -> Result<FileEnumerator> {
        let cwd = {
            let current = env::current_dir().map_err(|e| io_error_with_path(e, "."))?;
            match self.cwd {
                Some(path) => resolve_path(&current, &path),
                None => current,
            }
        };
        let home_dir = self
            .home_dir
            .or_else(|| UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf()));

        let extensions = self
            .extensions
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect());
        let extension_regex = build_extension_regex(&extensions)?;

        let ignore_flag = self.ignore.unwrap_or(true);
        let ignored_paths = IgnoredPaths::new(
            &cwd,
            ignore_flag,
            self.ignore_path.as_deref(),
            &self.ignore_patterns,
            false,
        )?;
        let ignored_paths_with_dotfiles = IgnoredPaths::new(
            &cwd,
            ignore_flag,
            self.ignore_path.as_deref(),
            &self.ignore_patterns,
            true,
        )?;

        let resolver = CascadingResolver::new(
            cwd.clone(),
            home_dir,
            self.use_config_files.unwrap_or(true),
            ResolverSources {
                base_config: self.base_config,
                cli_config: self.cli_config,
                config_file: self.config_file,
                rule_dirs: self.rule_dirs,
            },
        )?;

        Ok(FileEnumerator {
            cwd,
            resolver,
            ignored_paths,
            ignored_paths_with_dotfiles,
            extension_regex,
            ignore_flag,
            glob_input_paths: self.glob_input_paths.unwrap_or(true),
        })
    }
}

fn build_extension_regex(extensions: &[String]) -> Result<Regex> {
    if extensions.is_empty() {
        return Err(Error::InvalidConfig {
            name: "extensions".to_string(),
            message: "at least one target extension is required".to_string(),
        });
    }
    let alternatives: Vec<String> = extensions
        .iter()
        .map(|ext| regex::escape(ext.trim_start_matches('.')))
        .collect();
    Regex::new(&format!(r"\.(?:{})$", alternatives.join("|"))).map_err(|e| {
        Error::InvalidConfig {
            name: "extensions".to_string(),
            message: e.to_string(),
        }
    })
}

/// The lazy sequence produced by [`FileEnumerator::iterate_files`].
pub struct FileIterator<'a> {
    enumerator: &'a FileEnumerator,
    patterns: std::vec::IntoIter<String>,
    seen: HashSet<PathBuf>,
    current: Option<PatternState<'a>>,
    done: bool,
}

struct PatternState<'a> {
    pattern: String,
    glob_disabled: bool,
    direct: bool,
    source: EntrySource<'a>,
    found_any: bool,
    found_target: bool,
}

enum EntrySource<'a> {
    Empty,
    Single(Option<FileEntry>),
    Walk(DirWalk<'a>),
}

impl EntrySource<'_> {
    fn next_entry(&mut self) -> Option<Result<FileEntry>> {
        match self {
            EntrySource::Empty => None,
            EntrySource::Single(slot) => slot.take().map(Ok),
            EntrySource::Walk(walk) => walk.next_entry(),
        }
    }
}

impl<'a> FileIterator<'a> {
    /// Dispatches one pattern: glob, then existing directory, then existing
    /// file; anything else yields nothing and fails as not found.
    fn start_pattern(&self, pattern: String) -> Result<PatternState<'a>> {
        let enumerator = self.enumerator;
        let normalized = if cfg!(windows) {
            pattern.replace('\\', "/")
        } else {
            pattern.clone()
        };
        let absolute = resolve_path(&enumerator.cwd, Path::new(&normalized));
        let dotfiles = is_dotfile_pattern(&normalized);
        let is_glob = is_glob_pattern(&normalized);
        let glob_disabled = is_glob && !enumerator.glob_input_paths;

        let source = if enumerator.glob_input_paths && is_glob {
            let absolute_pattern = to_match_string(&absolute);
            match glob::Pattern::new(&absolute_pattern) {
                Ok(selector) => {
                    let (parent, tail) = split_glob(&absolute_pattern);
                    let recursive = is_recursive_tail(&tail);
                    debug!(
                        "Glob pattern '{normalized}': parent {parent}, recursive {recursive}"
                    );
                    EntrySource::Walk(DirWalk::new(
                        enumerator,
                        PathBuf::from(parent),
                        Selector::Glob(selector),
                        dotfiles,
                        recursive,
                    )?)
                }
                Err(e) => {
                    debug!("Invalid glob pattern '{normalized}': {e}");
                    EntrySource::Empty
                }
            }
        } else if absolute.is_dir() {
            debug!("Directory pattern: {}", absolute.display());
            EntrySource::Walk(DirWalk::new(
                enumerator,
                absolute,
                Selector::Extensions,
                dotfiles,
                true,
            )?)
        } else if absolute.is_file() {
            debug!("File pattern: {}", absolute.display());
            let directory = absolute
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| enumerator.cwd.clone());
            let config = enumerator.resolver.config_for_directory(&directory)?;
            let flag = if enumerator.is_ignored_file(&absolute, false, false, true) {
                IgnoredStatus::Ignored
            } else {
                IgnoredStatus::None
            };
            EntrySource::Single(Some(FileEntry {
                file_path: absolute,
                config,
                flag,
            }))
        } else {
            EntrySource::Empty
        };

        Ok(PatternState {
            pattern,
            glob_disabled,
            direct: matches!(source, EntrySource::Single(_)),
            source,
            found_any: false,
            found_target: false,
        })
    }
}

impl Iterator for FileIterator<'_> {
    type Item = Result<FileAndConfig>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if self.current.is_none() {
                // Empty strings are skipped silently.
                let pattern = loop {
                    match self.patterns.next() {
                        None => return None,
                        Some(p) if p.is_empty() => continue,
                        Some(p) => break p,
                    }
                };
                match self.start_pattern(pattern) {
                    Ok(state) => self.current = Some(state),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }

            let state = self.current.as_mut()?;
            match state.source.next_entry() {
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(entry)) => {
                    state.found_any = true;
                    if entry.flag == IgnoredStatus::IgnoredSilently {
                        trace!("Silently ignored: {}", entry.file_path.display());
                        continue;
                    }
                    state.found_target = true;
                    if !self.seen.insert(entry.file_path.clone()) {
                        trace!("Duplicate skipped: {}", entry.file_path.display());
                        continue;
                    }
                    let direct = state.direct;
                    let directory = entry
                        .file_path
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.enumerator.cwd.clone());
                    match self
                        .enumerator
                        .resolver
                        .finalize(&entry.config, &directory, !direct)
                    {
                        Ok(config) => {
                            return Some(Ok(FileAndConfig {
                                file_path: entry.file_path,
                                config,
                                ignored: entry.flag == IgnoredStatus::Ignored,
                            }))
                        }
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }
                None => {
                    // Pattern drained; enforce the per-pattern guarantees.
                    let state = self.current.take()?;
                    if !state.found_any {
                        self.done = true;
                        return Some(Err(Error::NoFilesFound {
                            pattern: state.pattern,
                            glob_disabled: state.glob_disabled,
                        }));
                    }
                    if !state.found_target {
                        self.done = true;
                        return Some(Err(Error::AllFilesIgnored {
                            pattern: state.pattern,
                        }));
                    }
                }
            }
        }
    }
}
