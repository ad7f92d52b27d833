// src/constants.rs

/// Configuration file names recognized in each directory, in priority order.
/// The first name found wins; the rest are not consulted.
pub const CONFIG_FILENAMES: &[&str] = &[".rulewalkrc.json", ".rulewalkrc.toml", ".rulewalkrc"];

/// The ignore file consulted at the working directory.
pub const IGNORE_FILENAME: &str = ".rulewalkignore";

/// Extensions targeted by directory walks when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["rs"];

/// Patterns ignored regardless of any ignore file (gitignore syntax).
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &["/**/target/*"];

/// Placeholder file name used to resolve a configuration when no target
/// file is given; its directory is the working directory.
pub const DEFAULT_TARGET_FILENAME: &str = "input.rs";

/// Name of the synthetic config element that carries rules loaded from
/// extra rule directories. Its `file_path` stays empty so it never counts
/// as a real config file.
pub const RULES_DIR_ELEMENT_NAME: &str = "--rules-dir";

/// Extension of rule descriptor files inside an extra rule directory.
pub const RULE_FILE_EXTENSION: &str = "toml";
