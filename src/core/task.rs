//! Task records.
//!
//! A task is an ordered mapping of fields describing one unit of work in the
//! build graph. Transform stages take ownership of a task, rewrite some of its
//! fields, and hand it downstream.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::transform::TransformError;

/// Label reported for tasks that carry neither `label` nor `name`.
pub const UNNAMED_TASK: &str = "<unnamed>";

/// A single task record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Task {
    fields: Mapping,
}

impl Task {
    /// Wrap an existing mapping.
    pub fn new(fields: Mapping) -> Self {
        Self { fields }
    }

    /// Parse a task from a YAML mapping.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Get a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a top-level field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(Value::String(key.into()), value)
    }

    /// All fields of the task.
    pub fn fields(&self) -> &Mapping {
        &self.fields
    }

    /// Consume the task, returning its fields.
    pub fn into_inner(self) -> Mapping {
        self.fields
    }

    /// Human-readable identifier used in diagnostics.
    ///
    /// Prefers `label`, then `name`.
    pub fn label(&self) -> &str {
        ["label", "name"]
            .iter()
            .find_map(|key| self.fields.get(*key).and_then(Value::as_str))
            .unwrap_or(UNNAMED_TASK)
    }

    /// The nested `run` mapping.
    pub fn run(&self) -> Option<&Mapping> {
        self.fields.get("run").and_then(Value::as_mapping)
    }

    /// Mutable access to the nested `run` mapping.
    pub fn run_mut(&mut self) -> Result<&mut Mapping, TransformError> {
        let label = self.label().to_string();
        match self.fields.get_mut("run") {
            Some(Value::Mapping(run)) => Ok(run),
            Some(_) => Err(TransformError::InvalidField {
                task: label,
                field: "run".into(),
                expected: "a mapping",
            }),
            None => Err(TransformError::MissingField {
                task: label,
                field: "run".into(),
            }),
        }
    }
}

impl From<Mapping> for Task {
    fn from(fields: Mapping) -> Self {
        Self::new(fields)
    }
}
