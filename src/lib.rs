//! taskgraph-transforms - transform stages for task-graph build configuration.
//!
//! Task definitions are loaded per kind from `kind.yml`, then streamed one at a
//! time through an ordered [`TransformSequence`] that lowers declarative fields
//! into executable ones. The built-in `script_to_run_task` stage turns a
//! `run.script` into a `run.command` that replays the script under bash.
//!
//! ```
//! use taskgraph_transforms::{FnTransform, Task, TransformConfig, TransformSequence};
//! use taskgraph_transforms::transforms::script_to_run_task;
//!
//! let sequence = TransformSequence::new()
//!     .add(FnTransform::new("script_to_run_task", script_to_run_task::transforms));
//! let config = TransformConfig::new("checks");
//! let task = Task::from_yaml("run:\n  script: echo hi\n").unwrap();
//!
//! let lowered: Vec<Task> = sequence
//!     .apply(&config, vec![task])
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert!(lowered[0].run().unwrap().contains_key("command"));
//! ```

pub mod config;
pub mod core;
pub mod kind;
pub mod transforms;

pub use crate::config::{ConfigError, KindConfig, YamlLoader};
pub use crate::core::{
    FnTransform, Task, TaskStream, Transform, TransformConfig, TransformError, TransformSequence,
};
pub use crate::kind::{Kind, KindError};
