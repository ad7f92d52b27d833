//! Defines core data structures used throughout the resolver pipeline.
//!
//! A configuration is an ordered sequence of [`ConfigElement`] layers
//! ([`ConfigArray`]), shared between files through `Arc` so that callers can
//! rely on reference identity for caching.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Glob semantics used for input patterns and override matching: dotfiles
/// are matched by wildcards, `*` does not cross path separators.
pub(crate) const GLOB_MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Severity of a rule setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Off,
    Warn,
    Error,
}

impl Severity {
    /// Parses a severity from its string or numeric (`0|1|2`) form.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => match s.as_str() {
                "off" => Ok(Severity::Off),
                "warn" => Ok(Severity::Warn),
                "error" => Ok(Severity::Error),
                other => Err(format!(
                    "invalid severity '{other}' (expected off, warn, or error)"
                )),
            },
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(Severity::Off),
                Some(1) => Ok(Severity::Warn),
                Some(2) => Ok(Severity::Error),
                _ => Err(format!("invalid severity {n} (expected 0, 1, or 2)")),
            },
            other => Err(format!("invalid severity {other}")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Severity::from_value(&value).map_err(D::Error::custom)
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One rule setting: a severity plus free-form option values.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    pub severity: Severity,
    pub options: Vec<Value>,
}

impl RuleEntry {
    /// Parses the scalar (`"error"`, `2`) or array (`["error", opts...]`)
    /// form of a rule entry.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => {
                let first = items
                    .first()
                    .ok_or_else(|| "rule entry must not be an empty array".to_string())?;
                Ok(RuleEntry {
                    severity: Severity::from_value(first)?,
                    options: items[1..].to_vec(),
                })
            }
            other => Ok(RuleEntry {
                severity: Severity::from_value(other)?,
                options: Vec::new(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for RuleEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RuleEntry::from_value(&value).map_err(D::Error::custom)
    }
}

impl Serialize for RuleEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.options.is_empty() {
            self.severity.serialize(serializer)
        } else {
            let mut items = Vec::with_capacity(self.options.len() + 1);
            items.push(Value::String(self.severity.as_str().to_string()));
            items.extend(self.options.iter().cloned());
            items.serialize(serializer)
        }
    }
}

/// Access mode of a declared global variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAccess {
    Readonly,
    Writable,
    Off,
}

impl GlobalAccess {
    /// Parses an access mode, accepting the documented aliases and the
    /// boolean shorthand (`false` is readonly, `true` is writable).
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(false) => Ok(GlobalAccess::Readonly),
            Value::Bool(true) => Ok(GlobalAccess::Writable),
            Value::String(s) => match s.as_str() {
                "readonly" | "readable" => Ok(GlobalAccess::Readonly),
                "writable" | "writeable" => Ok(GlobalAccess::Writable),
                "off" => Ok(GlobalAccess::Off),
                other => Err(format!(
                    "invalid global access '{other}' (expected readonly, writable, or off)"
                )),
            },
            other => Err(format!("invalid global access {other}")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GlobalAccess::Readonly => "readonly",
            GlobalAccess::Writable => "writable",
            GlobalAccess::Off => "off",
        }
    }
}

impl<'de> Deserialize<'de> for GlobalAccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        GlobalAccess::from_value(&value).map_err(D::Error::custom)
    }
}

impl Serialize for GlobalAccess {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A parser referenced by a configuration layer. The definition itself is
/// loaded lazily by an external component; only the identifier and, for
/// path-like identifiers, the resolved file path are materialized here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserDescriptor {
    /// The identifier as written in the config file.
    pub id: String,
    /// Resolved file path for relative or absolute identifiers.
    pub file_path: Option<PathBuf>,
}

/// Rules exposed by a plugin. The only definition this crate materializes
/// itself is the rules table of the synthetic rules-dir plugin, mapping
/// rule id to the descriptor file it was discovered in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginDefinition {
    pub rules: BTreeMap<String, PathBuf>,
}

/// A plugin referenced by a configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub id: String,
    /// Present only for plugins this crate materializes itself.
    pub definition: Option<PluginDefinition>,
}

/// A single glob pattern of an override block, kept in both raw and
/// compiled form. Patterns without a separator match the file basename.
#[derive(Debug, Clone)]
pub struct FilePattern {
    raw: String,
    pattern: glob::Pattern,
}

impl FilePattern {
    pub fn new(raw: &str) -> Result<Self, glob::PatternError> {
        Ok(FilePattern {
            raw: raw.to_string(),
            pattern: glob::Pattern::new(raw)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn matches(&self, relative: Option<&Path>, target: &Path) -> bool {
        if self.raw.contains('/') {
            relative.is_some_and(|rel| self.pattern.matches_path_with(rel, GLOB_MATCH_OPTIONS))
        } else {
            target
                .file_name()
                .is_some_and(|name| self.pattern.matches_with(&name.to_string_lossy(), GLOB_MATCH_OPTIONS))
        }
    }
}

/// A conditional sub-configuration of one layer, applied when the target
/// file matches `files` and none of `excluded_files`.
#[derive(Debug, Clone)]
pub struct OverrideBlock {
    pub files: Vec<FilePattern>,
    pub excluded_files: Vec<FilePattern>,
    /// Directory the patterns are relative to (the declaring file's
    /// directory, or the working directory for inline configs).
    pub base_path: PathBuf,
    /// The nested configuration applied on a match.
    pub config: Box<ConfigElement>,
}

impl OverrideBlock {
    /// True when `target` (an absolute path) is selected by this block.
    pub fn matches(&self, target: &Path) -> bool {
        let relative = target.strip_prefix(&self.base_path).ok();
        self.files.iter().any(|p| p.matches(relative, target))
            && !self
                .excluded_files
                .iter()
                .any(|p| p.matches(relative, target))
    }
}

/// One layer of configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigElement {
    /// Diagnostic name (file path relative to the working directory, or a
    /// synthetic name such as `BaseConfig` or `--rules-dir`).
    pub name: String,
    /// Source file. `None` for synthetic layers, which therefore never
    /// count as "a real config file exists".
    pub file_path: Option<PathBuf>,
    /// Halts the upward ancestor walk when set on a directory's own layer.
    pub root: bool,
    /// Environment toggles.
    pub env: BTreeMap<String, bool>,
    /// Global variable declarations.
    pub globals: BTreeMap<String, GlobalAccess>,
    pub parser: Option<ParserDescriptor>,
    /// Free-form parser options.
    pub parser_options: serde_json::Map<String, Value>,
    /// Plugin descriptors keyed by plugin id.
    pub plugins: BTreeMap<String, PluginDescriptor>,
    pub processor: Option<String>,
    /// Rule settings keyed by rule id.
    pub rules: BTreeMap<String, RuleEntry>,
    /// Free-form shared settings.
    pub settings: serde_json::Map<String, Value>,
    /// Conditional sub-configurations, in declaration order.
    pub overrides: Vec<OverrideBlock>,
}

/// An ordered sequence of configuration layers, lowest precedence first.
///
/// Arrays are shared as `Arc<ConfigArray>`; two files in the same directory
/// receive the exact same array instance, so callers may use
/// `Arc::ptr_eq` to detect shared configurations.
#[derive(Debug, Default)]
pub struct ConfigArray {
    elements: Vec<ConfigElement>,
}

impl ConfigArray {
    pub fn new(elements: Vec<ConfigElement>) -> Self {
        ConfigArray { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigElement> {
        self.elements.iter()
    }

    pub fn elements(&self) -> &[ConfigElement] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<ConfigElement> {
        self.elements
    }

    /// The `root` flag of the last element. An extending element sits after
    /// its `extends` ancestry, so the last element is the one loaded from
    /// the directory's own file.
    pub fn is_root(&self) -> bool {
        self.elements.last().is_some_and(|e| e.root)
    }

    /// True when any layer originates from a real file on disk.
    pub fn has_config_file(&self) -> bool {
        self.elements.iter().any(|e| e.file_path.is_some())
    }

    /// A new array holding `parent`'s layers followed by `child`'s.
    pub fn concat(parent: &ConfigArray, child: &ConfigArray) -> ConfigArray {
        let mut elements = Vec::with_capacity(parent.len() + child.len());
        elements.extend(parent.elements.iter().cloned());
        elements.extend(child.elements.iter().cloned());
        ConfigArray { elements }
    }
}

impl std::ops::Deref for ConfigArray {
    type Target = [ConfigElement];

    fn deref(&self) -> &Self::Target {
        &self.elements
    }
}

impl<'a> IntoIterator for &'a ConfigArray {
    type Item = &'a ConfigElement;
    type IntoIter = std::slice::Iter<'a, ConfigElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// How a discovered file relates to the ignore rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredStatus {
    /// A lint target.
    None,
    /// Matched an ignore rule during a glob or directory walk; skipped
    /// without notice.
    IgnoredSilently,
    /// The caller named this file directly yet it is ignored; the caller
    /// must be told.
    Ignored,
}

/// A file produced by the per-pattern iteration, carrying its raw
/// (unfinalized) configuration.
#[derive(Debug, Clone)]
pub(crate) struct FileEntry {
    pub file_path: PathBuf,
    pub config: Arc<ConfigArray>,
    pub flag: IgnoredStatus,
}

/// A file yielded to callers, bound to its finalized configuration.
#[derive(Debug, Clone)]
pub struct FileAndConfig {
    /// Absolute path of the target file.
    pub file_path: PathBuf,
    /// The finalized configuration array for the file's directory.
    pub config: Arc<ConfigArray>,
    /// True when the caller named this file directly but it is ignored.
    pub ignored: bool,
}
