//! Lower `run.script` into a `run.command` that replays the script under bash.
//!
//! The script body is written to `../script.sh` through a quoted heredoc and
//! then executed with `bash -e`, so the task aborts on its first failing
//! command. Quoting the delimiter disables expansion inside the body; the only
//! line a script may not contain is the bare delimiter itself.

use serde_yaml::Value;
use tracing::debug;

use crate::core::{Task, TaskStream, TransformConfig, TransformError};

/// Heredoc delimiter wrapping the script body.
pub const HEREDOC_TERMINATOR: &str = "SCRIPT";

/// Build the argv that runs `script` under a login bash shell.
///
/// The body is embedded verbatim. Callers that cannot vouch for the script
/// should check it with [`terminator_line`] first.
pub fn script_to_bash_command(script: &str) -> [String; 4] {
    [
        "/bin/bash".to_string(),
        "--login".to_string(),
        "-c".to_string(),
        format!(
            "cat <<'{HEREDOC_TERMINATOR}' > ../script.sh && bash -e ../script.sh\n{script}\n{HEREDOC_TERMINATOR}"
        ),
    ]
}

/// 1-based number of the first line of `script` equal to the delimiter.
///
/// Lines are split on `\n` only: bash compares the whole line, so
/// `SCRIPT\r` or an indented `SCRIPT` does not close the heredoc.
pub fn terminator_line(script: &str) -> Option<usize> {
    script
        .split('\n')
        .position(|line| line == HEREDOC_TERMINATOR)
        .map(|index| index + 1)
}

/// Stage entry point: lower every task in `tasks`.
pub fn transforms<'a>(_config: &'a TransformConfig, tasks: TaskStream<'a>) -> TaskStream<'a> {
    Box::new(tasks.map(|task| task.and_then(build_task)))
}

fn build_task(mut task: Task) -> Result<Task, TransformError> {
    let label = task.label().to_string();
    let run = task.run_mut()?;

    let script = match run.shift_remove("script") {
        Some(Value::String(script)) => script,
        Some(_) => {
            return Err(TransformError::InvalidField {
                task: label,
                field: "run.script".into(),
                expected: "a string",
            });
        }
        None => {
            return Err(TransformError::MissingField {
                task: label,
                field: "run.script".into(),
            });
        }
    };

    if let Some(line) = terminator_line(&script) {
        return Err(TransformError::HeredocTerminator { task: label, line });
    }

    let command = script_to_bash_command(&script)
        .into_iter()
        .map(Value::String)
        .collect();
    run.insert(Value::String("command".into()), Value::Sequence(command));

    debug!(task = %label, "lowered run.script to run.command");
    Ok(task)
}
