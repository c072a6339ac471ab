//! YAML configuration parsing.
//!
//! Parses kind definitions from `kind.yml` files.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;

use super::error::ConfigError;

/// File name of a kind definition inside its directory.
pub const KIND_FILE: &str = "kind.yml";

/// Kind configuration from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KindConfig {
    /// Loader used to produce the raw tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<String>,
    /// Transform stages, in application order.
    #[serde(default)]
    pub transforms: Vec<String>,
    /// Kinds whose tasks this kind may depend on.
    #[serde(default)]
    pub kind_dependencies: Vec<String>,
    /// Values merged underneath every task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_defaults: Option<Mapping>,
    /// Task definitions keyed by name, in file order.
    #[serde(default)]
    pub tasks: Mapping,
}

/// YAML configuration loader.
pub struct YamlLoader;

impl YamlLoader {
    /// Load a kind configuration from a file.
    pub fn load_kind_config(path: impl AsRef<Path>) -> Result<KindConfig, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::FileReadError {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let config: KindConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlFileError {
                path: path.to_path_buf(),
                source,
            })?;
        Self::validate_kind_config(&config)?;
        Ok(config)
    }

    /// Parse a kind configuration from a YAML string.
    pub fn parse_kind_config(yaml: &str) -> Result<KindConfig, ConfigError> {
        let config: KindConfig = serde_yaml::from_str(yaml)?;
        Self::validate_kind_config(&config)?;
        Ok(config)
    }

    /// Validate a kind configuration.
    pub fn validate_kind_config(config: &KindConfig) -> Result<(), ConfigError> {
        for transform in &config.transforms {
            if transform.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "transform entries cannot be empty".into(),
                ));
            }
        }

        for (key, body) in &config.tasks {
            let name = match key.as_str() {
                Some(name) if !name.is_empty() => name,
                Some(_) => return Err(ConfigError::MissingField("task name".into())),
                None => {
                    return Err(ConfigError::InvalidConfig(format!(
                        "task names must be strings, got {:?}",
                        key
                    )));
                }
            };

            if !body.is_mapping() {
                return Err(ConfigError::InvalidConfig(format!(
                    "task '{}' must be a mapping",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Merge `defaults` underneath `task`.
///
/// Mappings merge key by key, sequences concatenate with the defaults first,
/// and any other value in `task` wins. A single-key mapping keyed `by-*` in
/// `task` replaces the default outright.
pub fn merge_defaults(defaults: &Mapping, task: Mapping) -> Mapping {
    let mut merged = defaults.clone();
    for (key, value) in task {
        match merged.get_mut(&key) {
            Some(slot) => {
                let base = std::mem::replace(slot, Value::Null);
                *slot = merge_value(base, value);
            }
            None => {
                merged.insert(key, value);
            }
        }
    }
    merged
}

fn merge_value(base: Value, overlay: Value) -> Value {
    if is_keyed_by(&overlay) {
        return overlay;
    }
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            Value::Mapping(merge_defaults(&base, overlay))
        }
        (Value::Sequence(mut base), Value::Sequence(overlay)) => {
            base.extend(overlay);
            Value::Sequence(base)
        }
        (_, overlay) => overlay,
    }
}

fn is_keyed_by(value: &Value) -> bool {
    match value.as_mapping() {
        Some(mapping) if mapping.len() == 1 => mapping
            .keys()
            .next()
            .and_then(Value::as_str)
            .is_some_and(|key| key.starts_with("by-")),
        _ => false,
    }
}
