// src/enumerator/walker.rs

//! The recursive directory walk behind glob and directory patterns.
//!
//! Frames are pushed depth-first in listing order, so entries come out in
//! the deterministic order of the sorted directory listings. Each frame
//! binds its configuration lazily, on the first file it yields; the
//! resolver's per-directory cache makes that binding reference-stable.

use super::FileEnumerator;
use crate::core_types::{ConfigArray, FileEntry, IgnoredStatus, GLOB_MATCH_OPTIONS};
use crate::errors::{io_error_with_path, Result};
use crate::paths::to_match_string;
use log::trace;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How walk entries are selected.
pub(super) enum Selector {
    /// Match by the configured extension regex (directory-walk origin).
    Extensions,
    /// Match the full path against the originating glob (glob origin).
    Glob(glob::Pattern),
}

pub(super) struct DirWalk<'a> {
    enumerator: &'a FileEnumerator,
    selector: Selector,
    dotfiles: bool,
    recursive: bool,
    stack: Vec<Frame>,
}

struct Frame {
    directory: PathBuf,
    entries: std::vec::IntoIter<PathBuf>,
    config: Option<Arc<ConfigArray>>,
}

impl<'a> DirWalk<'a> {
    pub(super) fn new(
        enumerator: &'a FileEnumerator,
        directory: PathBuf,
        selector: Selector,
        dotfiles: bool,
        recursive: bool,
    ) -> Result<Self> {
        let mut stack = Vec::new();
        if enumerator.is_ignored_file(&directory, true, dotfiles, false) {
            trace!("Directory pruned: {}", directory.display());
        } else {
            stack.push(Frame {
                entries: read_dir_sorted(&directory)?.into_iter(),
                directory,
                config: None,
            });
        }
        Ok(DirWalk {
            enumerator,
            selector,
            dotfiles,
            recursive,
            stack,
        })
    }

    pub(super) fn next_entry(&mut self) -> Option<Result<FileEntry>> {
        loop {
            let next = self.stack.last_mut()?.entries.next();
            let Some(path) = next else {
                self.stack.pop();
                continue;
            };
            // Unreadable entries (dangling symlinks etc.) are skipped.
            let Ok(metadata) = fs::metadata(&path) else {
                continue;
            };

            if metadata.is_file() {
                let config = match self.current_config() {
                    Ok(config) => config,
                    Err(e) => return Some(Err(e)),
                };
                let matched = match &self.selector {
                    Selector::Glob(pattern) => {
                        pattern.matches_with(&to_match_string(&path), GLOB_MATCH_OPTIONS)
                    }
                    Selector::Extensions => self
                        .enumerator
                        .extension_regex
                        .is_match(&path.to_string_lossy()),
                };
                if matched {
                    let flag = if self.enumerator.is_ignored_file(&path, false, self.dotfiles, false)
                    {
                        IgnoredStatus::IgnoredSilently
                    } else {
                        IgnoredStatus::None
                    };
                    trace!("File found: {} ({:?})", path.display(), flag);
                    return Some(Ok(FileEntry {
                        file_path: path,
                        config,
                        flag,
                    }));
                }
            } else if metadata.is_dir() && self.recursive {
                if self.enumerator.is_ignored_file(&path, true, self.dotfiles, false) {
                    trace!("Directory pruned: {}", path.display());
                    continue;
                }
                match read_dir_sorted(&path) {
                    Ok(entries) => self.stack.push(Frame {
                        entries: entries.into_iter(),
                        directory: path,
                        config: None,
                    }),
                    Err(e) => return Some(Err(e)),
                }
            }
        }
    }

    /// The configuration bound to the current frame, resolving it on first
    /// use.
    fn current_config(&mut self) -> Result<Arc<ConfigArray>> {
        let resolver = &self.enumerator.resolver;
        // A file was just taken from this frame, so the stack is non-empty.
        let frame = match self.stack.last_mut() {
            Some(frame) => frame,
            None => return Ok(Arc::new(ConfigArray::default())),
        };
        match &frame.config {
            Some(config) => Ok(config.clone()),
            None => {
                let config = resolver.config_for_directory(&frame.directory)?;
                frame.config = Some(config.clone());
                Ok(config)
            }
        }
    }
}

/// Lists `directory` in file-name order. A missing directory is an empty
/// listing; other errors propagate.
fn read_dir_sorted(directory: &Path) -> Result<Vec<PathBuf>> {
    let reader = match fs::read_dir(directory) {
        Ok(reader) => reader,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error_with_path(e, directory)),
    };
    let mut paths: Vec<PathBuf> = reader
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| io_error_with_path(e, directory))?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    paths.sort();
    Ok(paths)
}
