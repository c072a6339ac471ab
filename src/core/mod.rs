pub mod task;
pub mod transform;

pub use task::Task;
pub use transform::{
    FnTransform, TaskStream, Transform, TransformConfig, TransformError, TransformFn,
    TransformSequence,
};
