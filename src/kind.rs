//! Kinds: a directory of task definitions sharing one transform sequence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, KIND_FILE, KindConfig, YamlLoader, merge_defaults};
use crate::core::{Task, TransformConfig, TransformError, TransformSequence};
use crate::transforms;

/// Errors raised while lowering a kind.
#[derive(Debug, Error)]
pub enum KindError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("kind '{kind}': {source}")]
    Transform {
        kind: String,
        #[source]
        source: TransformError,
    },
}

/// A loaded kind.
#[derive(Debug, Clone)]
pub struct Kind {
    name: String,
    path: PathBuf,
    config: KindConfig,
}

impl Kind {
    /// Build a kind from an already parsed configuration.
    ///
    /// The configuration is validated here so every entry of `tasks` is a
    /// string-keyed mapping by the time [`Kind::tasks`] walks it.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        config: KindConfig,
    ) -> Result<Self, ConfigError> {
        YamlLoader::validate_kind_config(&config)?;
        Ok(Self {
            name: name.into(),
            path: path.into(),
            config,
        })
    }

    /// Load the kind defined by `dir/kind.yml`. The kind is named after `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let name = Self::name_from_dir(dir)?;

        let config = YamlLoader::load_kind_config(dir.join(KIND_FILE))?;
        debug!(kind = %name, tasks = config.tasks.len(), "loaded kind");
        Self::new(name, dir, config)
    }

    /// Kind name from the last component of `dir`, resolving `.` and `..`.
    fn name_from_dir(dir: &Path) -> Result<String, ConfigError> {
        let resolved;
        let named = match dir.file_name() {
            Some(_) => dir,
            None => {
                resolved = dir.canonicalize().map_err(|source| ConfigError::FileReadError {
                    path: dir.to_path_buf(),
                    source,
                })?;
                resolved.as_path()
            }
        };

        named
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ConfigError::InvalidConfig(format!(
                    "cannot derive a kind name from '{}'",
                    dir.display()
                ))
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &KindConfig {
        &self.config
    }

    /// Task names in file order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.config.tasks.keys().filter_map(Value::as_str)
    }

    /// Raw tasks, one at a time, with `task-defaults` merged in.
    ///
    /// Each task gets a `name` field from its key unless it sets one. Yields
    /// exactly one task per entry; [`Kind::new`] has already rejected entries
    /// that are not string-keyed mappings.
    pub fn tasks(&self) -> impl Iterator<Item = Task> + '_ {
        let defaults = self.config.task_defaults.as_ref();
        self.config.tasks.iter().map(move |(key, body)| {
            let mut fields = body.as_mapping().cloned().unwrap_or_default();
            if !fields.contains_key("name") {
                fields.insert(Value::String("name".into()), key.clone());
            }
            apply_defaults(defaults, Task::new(fields))
        })
    }

    /// Resolve the kind's transform entries, in order.
    pub fn transform_sequence(&self) -> Result<TransformSequence, ConfigError> {
        let mut sequence = TransformSequence::new();
        for entry in &self.config.transforms {
            let stage = transforms::lookup(entry)
                .ok_or_else(|| ConfigError::UnknownTransform(entry.clone()))?;
            sequence.push(Box::new(stage));
        }
        Ok(sequence)
    }

    /// Context handed to the kind's stages.
    pub fn transform_config(&self, params: HashMap<String, String>) -> TransformConfig {
        TransformConfig::new(self.name.as_str())
            .with_path(self.path.as_path())
            .with_kind_dependencies(self.config.kind_dependencies.clone())
            .with_params(params)
    }

    /// Run every task through the kind's transforms.
    ///
    /// Stops at the first task that fails to transform.
    pub fn lower(&self, params: HashMap<String, String>) -> Result<Vec<Task>, KindError> {
        let sequence = self.transform_sequence()?;
        let config = self.transform_config(params);

        info!(
            kind = %self.name,
            transforms = ?sequence.names(),
            "lowering tasks"
        );

        let tasks = sequence
            .apply(&config, self.tasks())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| KindError::Transform {
                kind: self.name.clone(),
                source,
            })?;

        info!(kind = %self.name, tasks = tasks.len(), "lowered tasks");
        Ok(tasks)
    }
}

/// Merge `defaults`, if any, underneath the fields of `task`.
pub fn apply_defaults(defaults: Option<&Mapping>, task: Task) -> Task {
    match defaults {
        Some(defaults) => Task::new(merge_defaults(defaults, task.into_inner())),
        None => task,
    }
}
