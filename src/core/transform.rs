//! Transform stages and their composition.
//!
//! A stage maps one lazy stream of tasks to another. Stages are collected in
//! an explicit [`TransformSequence`] owned by whoever drives the pipeline, and
//! are chained in insertion order. Nothing is buffered between stages: pulling
//! one task from the end of the sequence pulls exactly one task from its input.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::task::Task;

/// Errors raised while transforming a task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// A required field is absent.
    #[error("task '{task}': missing required field '{field}'")]
    MissingField { task: String, field: String },

    /// A field holds a value of the wrong shape.
    #[error("task '{task}': field '{field}' must be {expected}")]
    InvalidField {
        task: String,
        field: String,
        expected: &'static str,
    },

    /// The script contains a line that would end its heredoc early.
    #[error("task '{task}': line {line} of run.script would terminate the SCRIPT heredoc")]
    HeredocTerminator { task: String, line: usize },
}

/// A lazy, single-pass stream of tasks flowing between stages.
pub type TaskStream<'a> = Box<dyn Iterator<Item = Result<Task, TransformError>> + 'a>;

/// Context handed to every stage alongside the tasks.
///
/// Stages only ever borrow it.
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    /// Name of the kind being transformed.
    pub kind: String,
    /// Directory the kind was loaded from.
    pub path: PathBuf,
    /// Kinds this kind depends on.
    pub kind_dependencies: Vec<String>,
    /// Free-form parameters supplied by the driver.
    pub params: HashMap<String, String>,
}

impl TransformConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_kind_dependencies(mut self, kinds: Vec<String>) -> Self {
        self.kind_dependencies = kinds;
        self
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Look up a single parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// A single transform stage.
///
/// Implementations must forward upstream errors unchanged and must not
/// reorder, drop, or buffer tasks.
pub trait Transform {
    /// Name used in logs and listings.
    fn name(&self) -> &str;

    /// Wrap `tasks` in this stage.
    fn apply<'a>(&'a self, config: &'a TransformConfig, tasks: TaskStream<'a>) -> TaskStream<'a>;
}

/// Signature of a stage written as a plain function.
pub type TransformFn = for<'a> fn(&'a TransformConfig, TaskStream<'a>) -> TaskStream<'a>;

/// A named stage backed by a plain function.
#[derive(Clone, Copy)]
pub struct FnTransform {
    name: &'static str,
    func: TransformFn,
}

impl FnTransform {
    pub const fn new(name: &'static str, func: TransformFn) -> Self {
        Self { name, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for FnTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("name", &self.name)
            .finish()
    }
}

impl Transform for FnTransform {
    fn name(&self) -> &str {
        self.name
    }

    fn apply<'a>(&'a self, config: &'a TransformConfig, tasks: TaskStream<'a>) -> TaskStream<'a> {
        (self.func)(config, tasks)
    }
}

/// An ordered list of stages.
#[derive(Default)]
pub struct TransformSequence {
    stages: Vec<Box<dyn Transform>>,
}

impl TransformSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage, builder style.
    pub fn add(mut self, stage: impl Transform + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Append an already boxed stage.
    pub fn push(&mut self, stage: Box<dyn Transform>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in application order.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run `tasks` through every stage, lazily.
    ///
    /// An empty sequence yields the input unchanged.
    pub fn apply<'a, I>(&'a self, config: &'a TransformConfig, tasks: I) -> TaskStream<'a>
    where
        I: IntoIterator<Item = Task>,
        I::IntoIter: 'a,
    {
        let source: TaskStream<'a> = Box::new(tasks.into_iter().map(Ok));
        self.stages
            .iter()
            .fold(source, |stream, stage| stage.apply(config, stream))
    }
}

impl fmt::Debug for TransformSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;
    use std::cell::Cell;

    fn task(name: &str) -> Task {
        Task::from_yaml(&format!("name: {name}\nrun: {{}}\n")).unwrap()
    }

    fn append_a<'a>(_config: &'a TransformConfig, tasks: TaskStream<'a>) -> TaskStream<'a> {
        Box::new(tasks.map(|task| task.map(|t| append_marker(t, "a"))))
    }

    fn append_b<'a>(_config: &'a TransformConfig, tasks: TaskStream<'a>) -> TaskStream<'a> {
        Box::new(tasks.map(|task| task.map(|t| append_marker(t, "b"))))
    }

    fn fail_on_second<'a>(_config: &'a TransformConfig, tasks: TaskStream<'a>) -> TaskStream<'a> {
        Box::new(tasks.map(|task| {
            let task = task?;
            if task.label() == "second" {
                return Err(TransformError::MissingField {
                    task: task.label().to_string(),
                    field: "run.script".into(),
                });
            }
            Ok(task)
        }))
    }

    fn append_marker(mut task: Task, marker: &str) -> Task {
        let trail = task
            .get("trail")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        task.insert("trail", Value::String(trail + marker));
        task
    }

    fn trail(task: &Task) -> &str {
        task.get("trail").and_then(Value::as_str).unwrap_or_default()
    }

    #[test]
    fn test_empty_sequence_passes_tasks_through() {
        let sequence = TransformSequence::new();
        let config = TransformConfig::new("test");

        let out: Vec<Task> = sequence
            .apply(&config, vec![task("first"), task("second")])
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(sequence.is_empty());
        assert_eq!(out, vec![task("first"), task("second")]);
    }

    #[test]
    fn test_stages_apply_in_insertion_order() {
        let sequence = TransformSequence::new()
            .add(FnTransform::new("a", append_a))
            .add(FnTransform::new("b", append_b));
        let config = TransformConfig::new("test");

        let out: Vec<Task> = sequence
            .apply(&config, vec![task("first")])
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(sequence.names(), vec!["a", "b"]);
        assert_eq!(trail(&out[0]), "ab");
    }

    #[test]
    fn test_push_boxed_stage() {
        let mut sequence = TransformSequence::new();
        sequence.push(Box::new(FnTransform::new("b", append_b)));
        sequence.push(Box::new(FnTransform::new("a", append_a)));
        let config = TransformConfig::new("test");

        let out: Vec<Task> = sequence
            .apply(&config, vec![task("first")])
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(sequence.len(), 2);
        assert_eq!(trail(&out[0]), "ba");
    }

    #[test]
    fn test_order_preserved() {
        let sequence = TransformSequence::new().add(FnTransform::new("a", append_a));
        let config = TransformConfig::new("test");
        let input: Vec<Task> = (0..5).map(|i| task(&format!("task-{i}"))).collect();

        let labels: Vec<String> = sequence
            .apply(&config, input)
            .map(|task| task.unwrap().label().to_string())
            .collect();

        assert_eq!(labels, vec!["task-0", "task-1", "task-2", "task-3", "task-4"]);
    }

    #[test]
    fn test_streaming_pulls_one_task_at_a_time() {
        let pulled = Cell::new(0);
        let source = (0..3).map(|i| {
            pulled.set(pulled.get() + 1);
            task(&format!("task-{i}"))
        });
        let sequence = TransformSequence::new()
            .add(FnTransform::new("a", append_a))
            .add(FnTransform::new("b", append_b));
        let config = TransformConfig::new("test");

        let mut stream = sequence.apply(&config, source);
        assert_eq!(pulled.get(), 0);

        let first = stream.next().unwrap().unwrap();
        assert_eq!(first.label(), "task-0");
        assert_eq!(pulled.get(), 1);

        stream.next().unwrap().unwrap();
        assert_eq!(pulled.get(), 2);
    }

    #[test]
    fn test_errors_flow_through_later_stages() {
        let sequence = TransformSequence::new()
            .add(FnTransform::new("fail", fail_on_second))
            .add(FnTransform::new("a", append_a));
        let config = TransformConfig::new("test");

        let out: Vec<Result<Task, TransformError>> = sequence
            .apply(&config, vec![task("first"), task("second"), task("third")])
            .collect();

        assert_eq!(out.len(), 3);
        assert_eq!(trail(out[0].as_ref().unwrap()), "a");
        assert!(matches!(
            out[1],
            Err(TransformError::MissingField { ref task, .. }) if task == "second"
        ));
        assert_eq!(trail(out[2].as_ref().unwrap()), "a");
    }

    #[test]
    fn test_collect_short_circuits_on_error() {
        let sequence = TransformSequence::new().add(FnTransform::new("fail", fail_on_second));
        let config = TransformConfig::new("test");

        let result: Result<Vec<Task>, TransformError> = sequence
            .apply(&config, vec![task("first"), task("second"), task("third")])
            .collect();

        assert!(result.is_err());
    }

    #[test]
    fn test_transform_config_builder() {
        let mut params = HashMap::new();
        params.insert("level".to_string(), "3".to_string());

        let config = TransformConfig::new("build")
            .with_path("/taskcluster/kinds/build")
            .with_kind_dependencies(vec!["toolchain".into()])
            .with_params(params);

        assert_eq!(config.kind, "build");
        assert_eq!(config.path, PathBuf::from("/taskcluster/kinds/build"));
        assert_eq!(config.kind_dependencies, vec!["toolchain".to_string()]);
        assert_eq!(config.param("level"), Some("3"));
        assert_eq!(config.param("missing"), None);
    }
}
