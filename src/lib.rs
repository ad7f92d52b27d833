//! rulewalk resolves, for a set of input path patterns, the concrete files
//! to process and the cascaded configuration that applies to each of them.
//!
//! Configurations cascade from ancestor directories: deeper directories
//! override shallower ones, a `root: true` marker halts the upward walk,
//! and the final chain is completed with the CLI configuration and, when
//! no project config exists, a personal configuration from the home
//! directory. Files in the same directory share the exact same
//! configuration array instance, so downstream caches can key on identity.

pub mod cli;
pub mod constants;
pub mod core_types;
pub mod enumerator;
pub mod errors;
pub mod extract;
pub mod ignored_paths;
pub mod loader;
mod paths;
mod resolver;

pub use core_types::{
    ConfigArray, ConfigElement, FileAndConfig, GlobalAccess, IgnoredStatus, ParserDescriptor,
    PluginDescriptor, RuleEntry, Severity,
};
pub use enumerator::{FileEnumerator, FileEnumeratorBuilder, FileIterator, IntoPatterns};
pub use errors::{Error, Result};
pub use extract::ExtractedConfig;
pub use loader::{ConfigData, ConfigLoader};
