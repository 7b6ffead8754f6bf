//! JSON snapshot codec
//!
//! The durable representation is a JSON array of task records. Decoding is
//! lenient per record: an unreadable record is skipped with a warning, while
//! a document that is not an array at all is an error.

use serde_json::Value;
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::task::Task;

/// Serialize tasks in order
pub fn encode(tasks: &[Task]) -> Result<String> {
    Ok(serde_json::to_string(tasks)?)
}

/// Serialize tasks in order, indented for humans
pub fn encode_pretty(tasks: &[Task]) -> Result<String> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

/// Deserialize a snapshot; blank input and `null` mean "no tasks"
pub fn decode(raw: &str) -> Result<Vec<Task>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records = match serde_json::from_str::<Value>(raw)? {
        Value::Null => return Ok(Vec::new()),
        Value::Array(records) => records,
        other => {
            return Err(CoreError::parse(format!(
                "Expected a JSON array of tasks, found {}",
                json_kind(&other)
            )));
        }
    };

    let mut tasks = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Task>(record) {
            Ok(task) => tasks.push(task),
            Err(e) => warn!(index, error = %e, "Skipping invalid task record"),
        }
    }
    Ok(tasks)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
