// src/loader/parsing.rs

//! Raw configuration data as read from files or supplied inline.

use crate::core_types::{GlobalAccess, RuleEntry};
use crate::errors::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration contents before binding to a file location. This is both
/// the deserialization target for config files and the inline form callers
/// pass for the base and CLI configurations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigData {
    /// Marks the chain root; halts the ancestor walk at this directory.
    pub root: bool,
    /// Configurations to layer underneath this one, as file paths relative
    /// to the declaring file.
    #[serde(deserialize_with = "one_or_many")]
    pub extends: Vec<String>,
    pub env: BTreeMap<String, bool>,
    pub globals: BTreeMap<String, GlobalAccess>,
    pub parser: Option<String>,
    pub parser_options: Map<String, Value>,
    pub plugins: Vec<String>,
    pub processor: Option<String>,
    pub rules: BTreeMap<String, RuleEntry>,
    pub settings: Map<String, Value>,
    pub overrides: Vec<OverrideData>,
}

/// One `overrides` entry: file selectors plus the nested config fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OverrideData {
    #[serde(deserialize_with = "one_or_many")]
    pub files: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub excluded_files: Vec<String>,
    #[serde(flatten)]
    pub config: ConfigData,
}

/// Accepts either a single string or an array of strings.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Parses config file text, dispatching on the file extension: `.toml` is
/// TOML, everything else (including the extension-less `.rulewalkrc`) is
/// JSON.
pub(crate) fn parse_config_text(path: &Path, text: &str) -> Result<ConfigData> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(text).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        _ => serde_json::from_str(text).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Severity;
    use serde_json::json;

    #[test]
    fn parses_json_config() {
        let data = parse_config_text(
            Path::new("/p/.rulewalkrc.json"),
            r#"{
                "root": true,
                "extends": "./base.json",
                "parser": "./parser",
                "rules": { "dead-code": "error", "line-length": ["warn", 120] },
                "globals": { "FIXTURES": "readable" }
            }"#,
        )
        .unwrap();

        assert!(data.root);
        assert_eq!(data.extends, vec!["./base.json"]);
        assert_eq!(data.parser.as_deref(), Some("./parser"));
        assert_eq!(data.rules["dead-code"].severity, Severity::Error);
        assert_eq!(data.rules["line-length"].options, vec![json!(120)]);
        assert_eq!(data.globals["FIXTURES"], GlobalAccess::Readonly);
    }

    #[test]
    fn parses_toml_config() {
        let data = parse_config_text(
            Path::new("/p/.rulewalkrc.toml"),
            r#"
                plugins = ["style"]

                [rules]
                dead-code = 2
                line-length = ["warn", 120]

                [env]
                test = true
            "#,
        )
        .unwrap();

        assert_eq!(data.plugins, vec!["style"]);
        assert_eq!(data.rules["dead-code"].severity, Severity::Error);
        assert_eq!(data.rules["line-length"].severity, Severity::Warn);
        assert_eq!(data.env["test"], true);
    }

    #[test]
    fn extensionless_file_is_json() {
        let data = parse_config_text(
            Path::new("/p/.rulewalkrc"),
            r#"{ "rules": { "dead-code": 0 } }"#,
        )
        .unwrap();
        assert_eq!(data.rules["dead-code"].severity, Severity::Off);
    }

    #[test]
    fn override_entries_accept_scalar_files() {
        let data = parse_config_text(
            Path::new("/p/.rulewalkrc.json"),
            r#"{
                "overrides": [
                    { "files": "*.gen.rs", "rules": { "dead-code": "off" } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(data.overrides.len(), 1);
        assert_eq!(data.overrides[0].files, vec!["*.gen.rs"]);
        assert_eq!(
            data.overrides[0].config.rules["dead-code"].severity,
            Severity::Off
        );
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let err = parse_config_text(Path::new("/p/.rulewalkrc.json"), "{ not json").unwrap_err();
        match err {
            Error::ConfigParse { path, .. } => {
                assert_eq!(path, Path::new("/p/.rulewalkrc.json"))
            }
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }

    #[test]
    fn invalid_severity_is_a_parse_error() {
        let err = parse_config_text(
            Path::new("/p/.rulewalkrc.json"),
            r#"{ "rules": { "dead-code": "loud" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }
}
