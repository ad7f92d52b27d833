//! Loads configuration arrays from inline data, explicit files, and
//! directory scans.
//!
//! The loader is the factory behind the cascading resolver: it materializes
//! [`ConfigElement`] layers, resolves `extends` chains (file paths, with
//! cycle detection), binds parser identifiers, and compiles override
//! blocks. Parser and plugin definitions themselves are loaded lazily by
//! external components; only descriptors are produced here.

use crate::constants::CONFIG_FILENAMES;
use crate::core_types::{
    ConfigArray, ConfigElement, FilePattern, OverrideBlock, ParserDescriptor, PluginDescriptor,
};
use crate::errors::{io_error_with_path, Error, Result};
use crate::paths::resolve_path;
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

mod parsing;
pub mod validation;

pub use parsing::{ConfigData, OverrideData};
use parsing::parse_config_text;

/// Creates configuration arrays from in-memory data, single files, or
/// directory scans.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    cwd: PathBuf,
}

impl ConfigLoader {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        ConfigLoader { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Materializes inline data under a synthetic name. The result carries
    /// no file path; relative references resolve against the working
    /// directory.
    pub fn create(&self, data: &ConfigData, name: &str) -> Result<ConfigArray> {
        let cwd = self.cwd.clone();
        let mut visiting = Vec::new();
        let elements = self.elements_from_data(data, None, &cwd, name, &mut visiting)?;
        Ok(ConfigArray::new(elements))
    }

    /// Loads one explicit config file, resolving its `extends` chain.
    pub fn load_file(&self, path: &Path, name: &str) -> Result<ConfigArray> {
        let resolved = resolve_path(&self.cwd, path);
        let mut visiting = Vec::new();
        let elements = self.load_config_file(&resolved, Some(name), &mut visiting)?;
        Ok(ConfigArray::new(elements))
    }

    /// Scans `dir` for recognized config file names, loading the first one
    /// found. Returns an empty array when none exist.
    pub fn load_on_directory(&self, dir: &Path, name: Option<&str>) -> Result<ConfigArray> {
        for filename in CONFIG_FILENAMES {
            let path = dir.join(filename);
            match fs::read_to_string(&path) {
                Ok(text) => {
                    debug!("Config file found: {}", path.display());
                    let mut visiting = vec![path.clone()];
                    let elements =
                        self.elements_from_text(&path, &text, name, &mut visiting)?;
                    return Ok(ConfigArray::new(elements));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error_with_path(e, &path)),
            }
        }
        Ok(ConfigArray::default())
    }

    fn load_config_file(
        &self,
        path: &Path,
        name: Option<&str>,
        visiting: &mut Vec<PathBuf>,
    ) -> Result<Vec<ConfigElement>> {
        let text = fs::read_to_string(path).map_err(|e| io_error_with_path(e, path))?;
        visiting.push(path.to_path_buf());
        let result = self.elements_from_text(path, &text, name, visiting);
        visiting.pop();
        result
    }

    fn elements_from_text(
        &self,
        path: &Path,
        text: &str,
        name: Option<&str>,
        visiting: &mut Vec<PathBuf>,
    ) -> Result<Vec<ConfigElement>> {
        let data = parse_config_text(path, text)?;
        let display_name = name
            .map(str::to_string)
            .unwrap_or_else(|| self.relative_name(path));
        let base_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cwd.clone());
        self.elements_from_data(&data, Some(path), &base_path, &display_name, visiting)
    }

    /// Produces the elements for `data`: the flattened `extends` ancestry
    /// first, then the element itself.
    fn elements_from_data(
        &self,
        data: &ConfigData,
        file_path: Option<&Path>,
        base_path: &Path,
        name: &str,
        visiting: &mut Vec<PathBuf>,
    ) -> Result<Vec<ConfigElement>> {
        let mut elements = Vec::new();
        for extend in &data.extends {
            elements.extend(self.load_extends(extend, base_path, name, visiting)?);
        }

        let mut element = element_from_fields(data, file_path, base_path, name);
        element.root = data.root;
        for (index, block) in data.overrides.iter().enumerate() {
            element
                .overrides
                .push(override_block(block, index, file_path, base_path, name)?);
        }
        elements.push(element);
        Ok(elements)
    }

    fn load_extends(
        &self,
        extend: &str,
        base_path: &Path,
        parent_name: &str,
        visiting: &mut Vec<PathBuf>,
    ) -> Result<Vec<ConfigElement>> {
        if !is_path_reference(extend) {
            return Err(Error::InvalidConfig {
                name: parent_name.to_string(),
                message: format!(
                    "cannot resolve 'extends' entry '{extend}'; only file paths are supported"
                ),
            });
        }

        let resolved = resolve_path(base_path, Path::new(extend));
        if visiting.contains(&resolved) {
            return Err(Error::CircularExtends { path: resolved });
        }
        let child_name = format!("{parent_name} \u{bb} {extend}");
        self.load_config_file(&resolved, Some(&child_name), visiting)
    }

    fn relative_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.cwd)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Builds one element from the non-structural fields of `data`, leaving
/// `root` and `overrides` to the caller.
fn element_from_fields(
    data: &ConfigData,
    file_path: Option<&Path>,
    base_path: &Path,
    name: &str,
) -> ConfigElement {
    ConfigElement {
        name: name.to_string(),
        file_path: file_path.map(Path::to_path_buf),
        root: false,
        env: data.env.clone(),
        globals: data.globals.clone(),
        parser: data.parser.as_deref().map(|id| parser_descriptor(id, base_path)),
        parser_options: data.parser_options.clone(),
        plugins: plugin_descriptors(&data.plugins),
        processor: data.processor.clone(),
        rules: data.rules.clone(),
        settings: data.settings.clone(),
        overrides: Vec::new(),
    }
}

fn override_block(
    block: &OverrideData,
    index: usize,
    file_path: Option<&Path>,
    base_path: &Path,
    parent_name: &str,
) -> Result<OverrideBlock> {
    if block.files.is_empty() {
        return Err(Error::InvalidConfig {
            name: parent_name.to_string(),
            message: "an 'overrides' entry must declare at least one file pattern".to_string(),
        });
    }
    if block.config.root || !block.config.extends.is_empty() || !block.config.overrides.is_empty()
    {
        return Err(Error::InvalidConfig {
            name: parent_name.to_string(),
            message: "'root', 'extends', and 'overrides' are not allowed inside an 'overrides' entry"
                .to_string(),
        });
    }

    let name = format!("{parent_name}#overrides[{index}]");
    let files = compile_patterns(&block.files, &name)?;
    let excluded_files = compile_patterns(&block.excluded_files, &name)?;
    Ok(OverrideBlock {
        files,
        excluded_files,
        base_path: base_path.to_path_buf(),
        config: Box::new(element_from_fields(&block.config, file_path, base_path, &name)),
    })
}

fn compile_patterns(patterns: &[String], name: &str) -> Result<Vec<FilePattern>> {
    patterns
        .iter()
        .map(|p| {
            FilePattern::new(p).map_err(|e| Error::InvalidConfig {
                name: name.to_string(),
                message: format!("invalid file pattern '{p}': {e}"),
            })
        })
        .collect()
}

/// True for identifiers the loader resolves itself: relative or absolute
/// file paths. Everything else belongs to external package resolution.
fn is_path_reference(id: &str) -> bool {
    id.starts_with("./") || id.starts_with("../") || Path::new(id).is_absolute()
}

fn parser_descriptor(id: &str, base_path: &Path) -> ParserDescriptor {
    ParserDescriptor {
        id: id.to_string(),
        file_path: is_path_reference(id).then(|| resolve_path(base_path, Path::new(id))),
    }
}

fn plugin_descriptors(ids: &[String]) -> BTreeMap<String, PluginDescriptor> {
    ids.iter()
        .map(|id| {
            (
                id.clone(),
                PluginDescriptor {
                    id: id.clone(),
                    definition: None,
                },
            )
        })
        .collect()
}
