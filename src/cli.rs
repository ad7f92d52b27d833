// src/cli.rs

use crate::core_types::RuleEntry;
use crate::errors::{Error, Result};
use crate::loader::ConfigData;
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;

/// Resolves target files and their cascaded configurations.
///
/// rulewalk expands the given patterns into concrete files (honoring the
/// ignore rules), walks ancestor directories to assemble the configuration
/// chain for each file, and prints the result. With `--print-config` it
/// prints the fully resolved configuration for a single file instead.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files, directories, or glob patterns to enumerate.
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Use this configuration file, layered underneath inline --rule settings.
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not search for .rulewalkrc.* files; use only the base and CLI configuration.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_config_search: bool,

    /// Load additional rules from these directories (repeatable).
    #[arg(long = "rules-dir", value_name = "DIR")]
    pub rules_dirs: Option<Vec<PathBuf>>,

    /// Target files with these extensions in directory walks (repeatable).
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Option<Vec<String>>,

    /// Use this file instead of .rulewalkignore.
    #[arg(long, value_name = "FILE")]
    pub ignore_path: Option<PathBuf>,

    /// Additional ignore patterns, gitignore syntax (repeatable).
    #[arg(long = "ignore-pattern", value_name = "GLOB")]
    pub ignore_patterns: Option<Vec<String>>,

    /// Do not consult the ignore file or --ignore-pattern rules.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_ignore: bool,

    /// Treat patterns as literal paths, never as globs.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_glob: bool,

    /// Inline rule settings, e.g. --rule dead-code=error (repeatable).
    #[arg(long = "rule", value_name = "ID=SEVERITY")]
    pub rules: Option<Vec<String>>,

    /// Print the resolved configuration for the given file and exit.
    #[arg(long, value_name = "FILE")]
    pub print_config: Option<PathBuf>,
}

impl Cli {
    /// Builds the inline CLI configuration from `--rule` settings, or
    /// `None` when no inline settings were given.
    pub fn cli_config_data(&self) -> Result<Option<ConfigData>> {
        let Some(rules) = &self.rules else {
            return Ok(None);
        };
        let mut data = ConfigData::default();
        for setting in rules {
            let (id, severity) = setting.split_once('=').ok_or_else(|| Error::InvalidConfig {
                name: "CLIOptions".to_string(),
                message: format!("invalid --rule '{setting}' (expected ID=SEVERITY)"),
            })?;
            // Numeric severities arrive as strings on the command line.
            let value = severity
                .parse::<u64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(severity.to_string()));
            let entry = RuleEntry::from_value(&value).map_err(
                |message| Error::InvalidConfig {
                    name: "CLIOptions".to_string(),
                    message: format!("invalid --rule '{setting}': {message}"),
                },
            )?;
            data.rules.insert(id.to_string(), entry);
        }
        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Severity;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rulewalk").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_rules_means_no_cli_config() {
        assert!(cli(&["lib"]).cli_config_data().unwrap().is_none());
    }

    #[test]
    fn rule_settings_parse_into_config_data() {
        let data = cli(&["--rule", "dead-code=error", "--rule", "line-length=1", "lib"])
            .cli_config_data()
            .unwrap()
            .unwrap();
        assert_eq!(data.rules["dead-code"].severity, Severity::Error);
        assert_eq!(data.rules["line-length"].severity, Severity::Warn);
    }

    #[test]
    fn malformed_rule_setting_is_rejected() {
        let err = cli(&["--rule", "dead-code", "lib"])
            .cli_config_data()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let err = cli(&["--rule", "dead-code=loud", "lib"])
            .cli_config_data()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
