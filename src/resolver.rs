// src/resolver.rs

//! The cascading configuration resolver.
//!
//! For a target file, the resolver walks the ancestor directories of the
//! file, loading and merging per-directory configurations until a stop
//! condition (filesystem root, the home directory, a `root: true` marker,
//! or an access-denied error). Results are cached per directory so that
//! every file in a directory shares the exact same array instance.
//! Finalization appends the CLI configuration (and, when no real config
//! file exists anywhere, the personal configuration from the home
//! directory), validates the result, and memoizes it per raw array.

use crate::constants::{RULES_DIR_ELEMENT_NAME, RULE_FILE_EXTENSION};
use crate::core_types::{ConfigArray, ConfigElement, PluginDefinition, PluginDescriptor};
use crate::errors::{io_error_with_path, Error, Result};
use crate::loader::validation::validate_config_array;
use crate::loader::{ConfigData, ConfigLoader};
use log::debug;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The raw inputs the resolver was built from, retained so that
/// `clear_cache` can rebuild the base and CLI arrays with fresh
/// identities.
#[derive(Debug, Default)]
pub(crate) struct ResolverSources {
    pub base_config: Option<ConfigData>,
    pub cli_config: Option<ConfigData>,
    /// Explicit config file path (`--config`).
    pub config_file: Option<PathBuf>,
    /// Extra rule directories (`--rules-dir`).
    pub rule_dirs: Vec<PathBuf>,
}

pub(crate) struct CascadingResolver {
    loader: ConfigLoader,
    cwd: PathBuf,
    home_dir: Option<PathBuf>,
    use_config_files: bool,
    sources: ResolverSources,
    base_array: Arc<ConfigArray>,
    cli_array: Arc<ConfigArray>,
    /// Merged ancestor chains, keyed by absolute directory path.
    config_cache: RefCell<HashMap<PathBuf, Arc<ConfigArray>>>,
    /// Finalized arrays, keyed by the identity of the raw input array.
    finalize_cache: RefCell<HashMap<usize, Arc<ConfigArray>>>,
}

impl CascadingResolver {
    pub fn new(
        cwd: PathBuf,
        home_dir: Option<PathBuf>,
        use_config_files: bool,
        sources: ResolverSources,
    ) -> Result<Self> {
        let loader = ConfigLoader::new(&cwd);
        let base_array = build_base_config_array(&loader, &sources)?;
        let cli_array = build_cli_config_array(&loader, &sources)?;
        Ok(CascadingResolver {
            loader,
            cwd,
            home_dir,
            use_config_files,
            sources,
            base_array,
            cli_array,
            config_cache: RefCell::new(HashMap::new()),
            finalize_cache: RefCell::new(HashMap::new()),
        })
    }

    /// Rebuilds the base and CLI arrays from the retained sources and
    /// drops both caches, invalidating every previously returned identity.
    pub fn clear_cache(&mut self) -> Result<()> {
        self.base_array = build_base_config_array(&self.loader, &self.sources)?;
        self.cli_array = build_cli_config_array(&self.loader, &self.sources)?;
        self.config_cache.get_mut().clear();
        self.finalize_cache.get_mut().clear();
        Ok(())
    }

    /// The finalized configuration for `file_path` (an absolute path).
    pub fn config_array_for_file(
        &self,
        file_path: &Path,
        ignore_not_found: bool,
    ) -> Result<Arc<ConfigArray>> {
        let directory = file_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cwd.clone());
        let raw = self.config_for_directory(&directory)?;
        self.finalize(&raw, &directory, ignore_not_found)
    }

    /// The merged (unfinalized) ancestor chain for `directory`.
    pub fn config_for_directory(&self, directory: &Path) -> Result<Arc<ConfigArray>> {
        if !self.use_config_files {
            return Ok(self.base_array.clone());
        }
        if let Some(hit) = self.config_cache.borrow().get(directory) {
            return Ok(hit.clone());
        }

        // The personal config is applied by the finalizer, not here, so
        // the walk stops at the home directory unless the project itself
        // lives there.
        if self.home_dir.as_deref() == Some(directory) && directory != self.cwd {
            debug!(
                "Stop traversing at home directory: {}",
                directory.display()
            );
            return Ok(self.cache_config(directory, self.base_array.clone()));
        }

        let loaded = match self.loader.load_on_directory(directory, None) {
            Ok(array) => array,
            Err(e) if e.is_permission_denied() => {
                debug!(
                    "Stop traversing because of access denied: {}",
                    directory.display()
                );
                return Ok(self.cache_config(directory, self.base_array.clone()));
            }
            Err(e) => return Err(e),
        };

        if !loaded.is_empty() && loaded.is_root() {
            debug!("Stop traversing because of root: {}", directory.display());
            let merged = Arc::new(ConfigArray::concat(&self.base_array, &loaded));
            return Ok(self.cache_config(directory, merged));
        }

        let parent_array = match directory.parent() {
            Some(parent) if parent != directory => self.config_for_directory(parent)?,
            _ => self.base_array.clone(),
        };

        let merged = if loaded.is_empty() {
            parent_array
        } else {
            Arc::new(ConfigArray::concat(&parent_array, &loaded))
        };
        Ok(self.cache_config(directory, merged))
    }

    /// Appends the CLI configuration (and the personal config when no real
    /// config file exists anywhere), validates, and memoizes per raw
    /// array. With `ignore_not_found`, the empty-result failure is
    /// suppressed; the cache entry is written either way.
    pub fn finalize(
        &self,
        raw: &Arc<ConfigArray>,
        directory: &Path,
        ignore_not_found: bool,
    ) -> Result<Arc<ConfigArray>> {
        let key = Arc::as_ptr(raw) as usize;
        let cached = self.finalize_cache.borrow().get(&key).cloned();

        let final_array = match cached {
            Some(hit) => hit,
            None => {
                let mut final_array = raw.clone();

                if self.use_config_files
                    && !raw.has_config_file()
                    && !self.cli_array.has_config_file()
                {
                    if let Some(home) = &self.home_dir {
                        debug!("Loading personal config from {}", home.display());
                        let personal =
                            self.loader.load_on_directory(home, Some("PersonalConfig"))?;
                        final_array = Arc::new(ConfigArray::concat(&final_array, &personal));
                    }
                }

                if !self.cli_array.is_empty() {
                    final_array = Arc::new(ConfigArray::concat(&final_array, &self.cli_array));
                }

                validate_config_array(&final_array)?;
                self.finalize_cache
                    .borrow_mut()
                    .insert(key, final_array.clone());
                debug!(
                    "Configuration determined for {}: {} element(s)",
                    directory.display(),
                    final_array.len()
                );
                final_array
            }
        };

        if !ignore_not_found && self.use_config_files && final_array.is_empty() {
            return Err(Error::ConfigurationNotFound {
                directory_path: directory.to_path_buf(),
            });
        }
        Ok(final_array)
    }

    fn cache_config(&self, directory: &Path, array: Arc<ConfigArray>) -> Arc<ConfigArray> {
        self.config_cache
            .borrow_mut()
            .insert(directory.to_path_buf(), array.clone());
        array
    }
}

/// Builds the immutable tail of every chain: the caller's base config plus,
/// when extra rule directories were given, a synthetic element exposing the
/// discovered rules through a pseudo-plugin keyed by the empty string.
fn build_base_config_array(
    loader: &ConfigLoader,
    sources: &ResolverSources,
) -> Result<Arc<ConfigArray>> {
    let mut elements = match &sources.base_config {
        Some(data) => loader.create(data, "BaseConfig")?.into_elements(),
        None => Vec::new(),
    };

    if !sources.rule_dirs.is_empty() {
        let mut rules = BTreeMap::new();
        for dir in &sources.rule_dirs {
            for (id, path) in load_rule_descriptors(dir)? {
                rules.insert(id, path);
            }
        }
        let plugin = PluginDescriptor {
            id: String::new(),
            definition: Some(PluginDefinition { rules }),
        };
        elements.push(ConfigElement {
            name: RULES_DIR_ELEMENT_NAME.to_string(),
            plugins: BTreeMap::from([(String::new(), plugin)]),
            ..ConfigElement::default()
        });
    }

    Ok(Arc::new(ConfigArray::new(elements)))
}

/// Builds the head of the final chain: the explicit config file (when
/// given) followed by the inline CLI configuration, so the file's settings
/// precede CLI-inline overrides in the merge order.
fn build_cli_config_array(
    loader: &ConfigLoader,
    sources: &ResolverSources,
) -> Result<Arc<ConfigArray>> {
    let mut elements = Vec::new();
    if let Some(path) = &sources.config_file {
        elements.extend(loader.load_file(path, "--config")?.into_elements());
    }
    if let Some(data) = &sources.cli_config {
        elements.extend(loader.create(data, "CLIOptions")?.into_elements());
    }
    Ok(Arc::new(ConfigArray::new(elements)))
}

/// Scans one rule directory (non-recursively) for rule descriptor files,
/// in file-name order. The rule id is the file stem.
fn load_rule_descriptors(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(dir).map_err(|e| io_error_with_path(e, dir))?;
    let mut paths: Vec<PathBuf> = entries
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| io_error_with_path(e, dir))?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(RULE_FILE_EXTENSION)
        })
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .filter_map(|path| {
            path.file_stem()
                .map(|stem| (stem.to_string_lossy().into_owned(), path.clone()))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{RuleEntry, Severity};
    use std::fs;
    use tempfile::tempdir;

    fn rules_data(id: &str) -> ConfigData {
        let mut data = ConfigData::default();
        data.rules.insert(
            id.to_string(),
            RuleEntry {
                severity: Severity::Error,
                options: Vec::new(),
            },
        );
        data
    }

    fn resolver(cwd: &Path, home: Option<&Path>, sources: ResolverSources) -> CascadingResolver {
        CascadingResolver::new(
            cwd.to_path_buf(),
            home.map(Path::to_path_buf),
            true,
            sources,
        )
        .unwrap()
    }

    #[test]
    fn walk_stops_at_root_marker() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join(".rulewalkrc.json"),
            r#"{ "rules": { "outer": "error" } }"#,
        )
        .unwrap();
        let project = temp.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(
            project.join(".rulewalkrc.json"),
            r#"{ "root": true, "rules": { "inner": "error" } }"#,
        )
        .unwrap();

        let resolver = resolver(&project, None, ResolverSources::default());
        let array = resolver.config_for_directory(&project).unwrap();
        assert!(array.iter().all(|e| !e.rules.contains_key("outer")));
        assert!(array.iter().any(|e| e.rules.contains_key("inner")));
    }

    #[test]
    fn walk_stops_at_home_unless_home_is_cwd() {
        let temp = tempdir().unwrap();
        let home = temp.path().join("home");
        let project = home.join("project");
        fs::create_dir_all(&project).unwrap();
        fs::write(
            home.join(".rulewalkrc.json"),
            r#"{ "rules": { "home-rule": "error" } }"#,
        )
        .unwrap();

        // Project below home: the walk stops at home without loading it.
        let below = resolver(&project, Some(&home), ResolverSources::default());
        let array = below.config_for_directory(&project).unwrap();
        assert!(array.iter().all(|e| !e.rules.contains_key("home-rule")));

        // Working directory *is* home: its config is discoverable.
        let at_home = resolver(&home, Some(&home), ResolverSources::default());
        let array = at_home.config_for_directory(&home).unwrap();
        assert!(array.iter().any(|e| e.rules.contains_key("home-rule")));
    }

    #[test]
    fn directories_without_config_share_the_parent_array() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(".rulewalkrc.json"), "{}").unwrap();
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let resolver = resolver(temp.path(), None, ResolverSources::default());
        let outer = resolver.config_for_directory(temp.path()).unwrap();
        let inner = resolver.config_for_directory(&nested).unwrap();
        assert!(Arc::ptr_eq(&outer, &inner));
    }

    #[test]
    fn use_config_files_off_returns_base_array() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join(".rulewalkrc.json"),
            r#"{ "rules": { "ignored": "error" } }"#,
        )
        .unwrap();

        let resolver = CascadingResolver::new(
            temp.path().to_path_buf(),
            None,
            false,
            ResolverSources {
                base_config: Some(rules_data("base-rule")),
                ..ResolverSources::default()
            },
        )
        .unwrap();

        let array = resolver.config_for_directory(temp.path()).unwrap();
        assert!(array.iter().any(|e| e.rules.contains_key("base-rule")));
        assert!(array.iter().all(|e| !e.rules.contains_key("ignored")));
    }

    #[test]
    fn finalize_appends_cli_array_and_memoizes() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(".rulewalkrc.json"), "{}").unwrap();

        let resolver = CascadingResolver::new(
            temp.path().to_path_buf(),
            None,
            true,
            ResolverSources {
                cli_config: Some(rules_data("cli-rule")),
                ..ResolverSources::default()
            },
        )
        .unwrap();

        let raw = resolver.config_for_directory(temp.path()).unwrap();
        let first = resolver.finalize(&raw, temp.path(), false).unwrap();
        let second = resolver.finalize(&raw, temp.path(), false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first
            .last()
            .is_some_and(|e| e.rules.contains_key("cli-rule")));
    }

    #[test]
    fn empty_finalized_array_fails_unless_suppressed() {
        let temp = tempdir().unwrap();
        let resolver = resolver(temp.path(), None, ResolverSources::default());
        let raw = resolver.config_for_directory(temp.path()).unwrap();

        let err = resolver.finalize(&raw, temp.path(), false).unwrap_err();
        assert!(matches!(err, Error::ConfigurationNotFound { .. }));

        let suppressed = resolver.finalize(&raw, temp.path(), true).unwrap();
        assert!(suppressed.is_empty());
    }

    #[test]
    fn rules_dir_pseudo_plugin_collects_descriptors() {
        let temp = tempdir().unwrap();
        let first = temp.path().join("rules-a");
        let second = temp.path().join("rules-b");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("dead-code.toml"), "").unwrap();
        fs::write(first.join("shared.toml"), "").unwrap();
        fs::write(second.join("shared.toml"), "").unwrap();
        fs::write(second.join("notes.txt"), "").unwrap();

        let loader = ConfigLoader::new(temp.path());
        let sources = ResolverSources {
            rule_dirs: vec![first, second.clone()],
            ..ResolverSources::default()
        };
        let base = build_base_config_array(&loader, &sources).unwrap();

        let element = base.last().unwrap();
        assert_eq!(element.name, RULES_DIR_ELEMENT_NAME);
        assert!(element.file_path.is_none());
        let definition = element.plugins[""].definition.as_ref().unwrap();
        assert!(definition.rules.contains_key("dead-code"));
        // Later directories win on id collision.
        assert_eq!(definition.rules["shared"], second.join("shared.toml"));
        assert!(!definition.rules.contains_key("notes"));
        // The synthetic element does not count as a real config file.
        assert!(!base.has_config_file());
    }

    #[test]
    fn explicit_config_file_precedes_inline_cli_config() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("shared.json");
        fs::write(&config_path, r#"{ "rules": { "from-file": "warn" } }"#).unwrap();

        let loader = ConfigLoader::new(temp.path());
        let sources = ResolverSources {
            cli_config: Some(rules_data("from-cli")),
            config_file: Some(config_path),
            ..ResolverSources::default()
        };
        let cli = build_cli_config_array(&loader, &sources).unwrap();
        assert_eq!(cli.len(), 2);
        assert!(cli[0].rules.contains_key("from-file"));
        assert!(cli[1].rules.contains_key("from-cli"));
        assert!(cli.has_config_file());
    }
}
