//! Built-in transform stages.
//!
//! Stages are resolved by name through [`lookup`]. Kind files usually name a
//! stage by its dotted module path with a `:transforms` suffix, e.g.
//! `glean_taskgraph.transforms.script_to_run_task:transforms`; only the last
//! path segment is significant.

pub mod script_to_run_task;

use crate::core::FnTransform;

const REGISTRY: &[FnTransform] = &[FnTransform::new(
    "script_to_run_task",
    script_to_run_task::transforms,
)];

/// Resolve a stage from a bare name or a dotted module path.
pub fn lookup(path: &str) -> Option<FnTransform> {
    let name = stage_name(path);
    REGISTRY
        .iter()
        .find(|stage| stage.name() == name)
        .copied()
}

/// Names of every built-in stage.
pub fn names() -> Vec<&'static str> {
    REGISTRY.iter().map(FnTransform::name).collect()
}

fn stage_name(path: &str) -> &str {
    let module = path.trim().split(':').next().unwrap_or_default();
    module.rsplit('.').next().unwrap_or(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_bare_name() {
        let stage = lookup("script_to_run_task").unwrap();
        assert_eq!(stage.name(), "script_to_run_task");
    }

    #[test]
    fn test_lookup_module_path() {
        assert!(lookup("glean_taskgraph.transforms.script_to_run_task:transforms").is_some());
        assert!(lookup("glean_taskgraph.transforms.script_to_run_task").is_some());
        assert!(lookup(" script_to_run_task:transforms ").is_some());
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("taskgraph.transforms.job:transforms").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_names() {
        assert_eq!(names(), vec!["script_to_run_task"]);
    }
}
