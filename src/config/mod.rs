//! Kind configuration loading and parsing.
//!
//! A kind is a directory holding a `kind.yml` that lists the transform stages
//! to apply, optional `task-defaults`, and the task definitions themselves:
//!
//! ```yaml
//! transforms:
//!   - glean_taskgraph.transforms.script_to_run_task:transforms
//! task-defaults:
//!   run:
//!     using: run-task
//! tasks:
//!   lint:
//!     run:
//!       script: cargo clippy --all-targets
//! ```
//!
//! Task bodies are kept as untyped YAML mappings; their schema belongs to the
//! stages that consume them.

mod error;
mod yaml;

pub use error::ConfigError;
pub use yaml::{KIND_FILE, KindConfig, YamlLoader, merge_defaults};
