// src/loader/validation.rs

//! Structural validation of finalized configuration arrays.
//!
//! Most shape checks are carried by the typed deserialization (severities,
//! global access modes, override selectors). What remains here are the
//! cross-field invariants that types cannot express. Violations are fatal
//! at finalization.

use crate::core_types::{ConfigArray, ConfigElement};
use crate::errors::{Error, Result};
use std::collections::BTreeSet;

/// Validates a finalized array. Checks every element, including the nested
/// elements of override blocks.
pub fn validate_config_array(array: &ConfigArray) -> Result<()> {
    let declared_plugins: BTreeSet<&str> = array
        .iter()
        .flat_map(|element| element.plugins.keys().map(String::as_str))
        .collect();

    for element in array.iter() {
        validate_element(element, &declared_plugins)?;
        for block in &element.overrides {
            validate_element(&block.config, &declared_plugins)?;
        }
    }
    Ok(())
}

fn validate_element(element: &ConfigElement, declared_plugins: &BTreeSet<&str>) -> Result<()> {
    if let Some(processor) = &element.processor {
        match processor.split_once('/') {
            Some((plugin, name)) if !name.is_empty() => {
                if !declared_plugins.contains(plugin) {
                    return Err(invalid(
                        element,
                        format!(
                            "processor '{processor}' references plugin '{plugin}' which is not declared"
                        ),
                    ));
                }
            }
            _ => {
                return Err(invalid(
                    element,
                    format!("processor '{processor}' must have the form 'plugin/name'"),
                ));
            }
        }
    }

    for id in element.rules.keys() {
        if id.is_empty() {
            return Err(invalid(element, "rule ids must be non-empty".to_string()));
        }
    }
    for name in element.env.keys() {
        if name.is_empty() {
            return Err(invalid(
                element,
                "environment names must be non-empty".to_string(),
            ));
        }
    }
    for name in element.globals.keys() {
        if name.is_empty() {
            return Err(invalid(
                element,
                "global variable names must be non-empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn invalid(element: &ConfigElement, message: String) -> Error {
    Error::InvalidConfig {
        name: element.name.clone(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::PluginDescriptor;

    fn element(name: &str) -> ConfigElement {
        ConfigElement {
            name: name.to_string(),
            ..ConfigElement::default()
        }
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(validate_config_array(&ConfigArray::default()).is_ok());
    }

    #[test]
    fn processor_requires_declared_plugin() {
        let mut with_plugin = element("a");
        with_plugin.plugins.insert(
            "style".to_string(),
            PluginDescriptor {
                id: "style".to_string(),
                definition: None,
            },
        );
        let mut with_processor = element("b");
        with_processor.processor = Some("style/docs".to_string());

        let ok = ConfigArray::new(vec![with_plugin, with_processor.clone()]);
        assert!(validate_config_array(&ok).is_ok());

        let missing = ConfigArray::new(vec![with_processor]);
        let err = validate_config_array(&missing).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn processor_must_be_plugin_slash_name() {
        let mut bad = element("a");
        bad.processor = Some("docs".to_string());
        let err = validate_config_array(&ConfigArray::new(vec![bad])).unwrap_err();
        match err {
            Error::InvalidConfig { message, .. } => {
                assert!(message.contains("plugin/name"))
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn empty_rule_id_is_rejected() {
        let mut bad = element("a");
        bad.rules.insert(
            String::new(),
            crate::core_types::RuleEntry {
                severity: crate::core_types::Severity::Error,
                options: Vec::new(),
            },
        );
        assert!(validate_config_array(&ConfigArray::new(vec![bad])).is_err());
    }
}
