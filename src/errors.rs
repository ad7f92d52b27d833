//! Defines application-specific error types.
//!
//! This module provides the `Error` enum, which categorizes the failures the
//! resolver can surface, offering more context than generic I/O errors. The
//! pattern-level and configuration-level variants additionally expose a
//! structured message template and data so an enclosing tool can render
//! localized messages.

use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the enumerator and the configuration resolver.
#[derive(Error, Debug)]
pub enum Error {
    /// No file matched an input pattern.
    #[error("No files matching '{pattern}' were found{}.", glob_disabled_suffix(.glob_disabled))]
    NoFilesFound {
        /// The pattern that matched nothing.
        pattern: String,
        /// True when the pattern was a glob but glob interpretation was
        /// disabled and the pattern did not exist as a literal path.
        glob_disabled: bool,
    },

    /// Every file matched by a pattern was ignored.
    #[error("All files matched by '{pattern}' are ignored.")]
    AllFilesIgnored {
        /// The pattern whose matches were all ignored.
        pattern: String,
    },

    /// Finalization produced an empty configuration while config-file
    /// search was enabled.
    #[error("No rulewalk configuration found on {}.", .directory_path.display())]
    ConfigurationNotFound {
        /// The directory the configuration was demanded for.
        directory_path: PathBuf,
    },

    /// A configuration file could not be parsed.
    #[error("Failed to parse config file '{}': {message}", .path.display())]
    ConfigParse {
        /// The config file that failed to parse.
        path: PathBuf,
        message: String,
    },

    /// A configuration is structurally invalid.
    #[error("Invalid configuration in '{name}': {message}")]
    InvalidConfig {
        /// Diagnostic name of the offending config element.
        name: String,
        message: String,
    },

    /// An `extends` chain loops back on itself.
    #[error("Circular 'extends' chain detected at '{}'.", .path.display())]
    CircularExtends {
        /// The config file reached for the second time.
        path: PathBuf,
    },

    /// Error occurring during file or directory access.
    #[error("I/O error accessing path '{}': {source}", .path.display())]
    Io {
        /// The path that caused the I/O error.
        path: PathBuf,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// Building the ignore matchers failed (bad pattern or ignore file).
    #[error("Failed to build ignore patterns: {0}")]
    Ignore(#[from] ignore::Error),
}

fn glob_disabled_suffix(glob_disabled: &bool) -> &'static str {
    if *glob_disabled {
        " (glob was disabled)"
    } else {
        ""
    }
}

impl Error {
    /// Identifier of the message template for this error, when the error is
    /// one an enclosing tool localizes.
    pub fn message_template(&self) -> Option<&'static str> {
        match self {
            Error::NoFilesFound { .. } => Some("file-not-found"),
            Error::AllFilesIgnored { .. } => Some("all-files-ignored"),
            Error::ConfigurationNotFound { .. } => Some("no-config-found"),
            _ => None,
        }
    }

    /// Structured data accompanying [`Error::message_template`].
    pub fn message_data(&self) -> Option<serde_json::Value> {
        match self {
            Error::NoFilesFound {
                pattern,
                glob_disabled,
            } => Some(json!({ "pattern": pattern, "glob_disabled": glob_disabled })),
            Error::AllFilesIgnored { pattern } => Some(json!({ "pattern": pattern })),
            Error::ConfigurationNotFound { directory_path } => {
                Some(json!({ "directory_path": directory_path.display().to_string() }))
            }
            _ => None,
        }
    }

    /// True for the "access denied" I/O class that the ancestor walk
    /// substitutes with the base configuration.
    pub(crate) fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            Error::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied
        )
    }
}

/// Helper function to create an [`Error::Io`] with path context.
pub fn io_error_with_path<P: AsRef<std::path::Path>>(source: std::io::Error, path: P) -> Error {
    Error::Io {
        path: path.as_ref().to_path_buf(),
        source,
    }
}
