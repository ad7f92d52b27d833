//! Folds a [`ConfigArray`] into the flat view consumed by a lint engine.
//!
//! Layers are applied lowest precedence first: later elements override
//! scalar fields and merge into map fields. Override blocks that match the
//! target path are folded in immediately after their owning element.

use crate::core_types::{
    ConfigArray, ConfigElement, GlobalAccess, ParserDescriptor, PluginDescriptor, RuleEntry,
    Severity,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// The flattened configuration for one target file.
#[derive(Debug, Clone, Default)]
pub struct ExtractedConfig {
    pub env: BTreeMap<String, bool>,
    pub globals: BTreeMap<String, GlobalAccess>,
    pub parser: Option<ParserDescriptor>,
    pub parser_options: Map<String, Value>,
    /// Plugins in insertion order. The first element that declares a plugin
    /// fixes its position; later declarations replace the descriptor only.
    pub plugins: Vec<(String, PluginDescriptor)>,
    pub processor: Option<String>,
    pub rules: BTreeMap<String, RuleEntry>,
    pub settings: Map<String, Value>,
}

impl ConfigArray {
    /// Extracts the configuration that applies to `target_path`, folding
    /// matching override blocks into the result.
    pub fn extract_config(&self, target_path: &Path) -> ExtractedConfig {
        let mut extracted = ExtractedConfig::default();
        for element in self.iter() {
            extracted.apply_element(element, target_path);
        }
        extracted
    }
}

impl ExtractedConfig {
    fn apply_element(&mut self, element: &ConfigElement, target_path: &Path) {
        for (name, enabled) in &element.env {
            self.env.insert(name.clone(), *enabled);
        }
        for (name, access) in &element.globals {
            self.globals.insert(name.clone(), *access);
        }
        if let Some(parser) = &element.parser {
            self.parser = Some(parser.clone());
        }
        deep_merge(&mut self.parser_options, &element.parser_options);
        for (id, descriptor) in &element.plugins {
            match self.plugins.iter_mut().find(|(known, _)| known == id) {
                Some(slot) => slot.1 = descriptor.clone(),
                None => self.plugins.push((id.clone(), descriptor.clone())),
            }
        }
        if let Some(processor) = &element.processor {
            self.processor = Some(processor.clone());
        }
        self.merge_rules(&element.rules);
        deep_merge(&mut self.settings, &element.settings);

        for block in &element.overrides {
            if block.matches(target_path) {
                self.apply_element(&block.config, target_path);
            }
        }
    }

    /// A later severity-only entry keeps the earlier entry's options and
    /// replaces only the severity; anything with options replaces the
    /// whole entry.
    fn merge_rules(&mut self, rules: &BTreeMap<String, RuleEntry>) {
        for (id, entry) in rules {
            match self.rules.get_mut(id) {
                Some(existing) if entry.options.is_empty() => {
                    existing.severity = entry.severity;
                }
                _ => {
                    self.rules.insert(id.clone(), entry.clone());
                }
            }
        }
    }

    /// Renders the extraction as config-file content: the parser is
    /// replaced by its file path (or null), plugin ids are listed in the
    /// reverse of insertion order, and the processor is omitted.
    pub fn to_config_file_content(&self) -> Value {
        let parser = match &self.parser {
            Some(ParserDescriptor {
                file_path: Some(path),
                ..
            }) => Value::String(path.display().to_string()),
            _ => Value::Null,
        };
        let plugins: Vec<&str> = self
            .plugins
            .iter()
            .rev()
            .map(|(id, _)| id.as_str())
            .collect();

        json!({
            "env": self.env,
            "globals": self.globals,
            "parser": parser,
            "parser_options": self.parser_options,
            "plugins": plugins,
            "rules": self.rules,
            "settings": self.settings,
        })
    }

    /// Convenience accessor for a rule's effective severity.
    pub fn rule_severity(&self, id: &str) -> Option<Severity> {
        self.rules.get(id).map(|entry| entry.severity)
    }
}

/// Deep-merges `overlay` on top of `base`. If both sides have an object for
/// the same key, recurse; otherwise `overlay`'s value wins.
pub(crate) fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(key), overlay_value) {
            (Some(Value::Object(base_object)), Value::Object(overlay_object)) => {
                deep_merge(base_object, overlay_object);
            }
            _ => {
                base.insert(key.clone(), overlay_value.clone());
            }
        }
    }
}
