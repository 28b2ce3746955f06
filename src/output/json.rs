use std::path::Path;

use serde_json::{json, Map, Value};

use crate::error::{ErrorCode, TodoError};
use crate::models::Task;

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

/// Error envelope. Only the operation name reaches the caller; the cause
/// chain stays in the logs. Validation failures add per-field messages.
pub fn error(op: &str, err: &TodoError) -> Value {
    let mut body = json!({
        "code": err.code.as_str(),
        "message": format!("{op} failed"),
    });
    if err.code == ErrorCode::InvalidArgument {
        if let Some(fields) = err.validations() {
            body["validations"] = validations_json(fields.iter().map(|(k, v)| (k.as_str(), v)));
        }
    }
    json!({
        "success": false,
        "error": body
    })
}

pub fn not_initialized(home: &Path) -> Value {
    json!({
        "success": false,
        "error": {
            "code": "NOT_INITIALIZED",
            "message": format!("not initialized at {}. Run `todo-svc init` first.", home.display())
        }
    })
}

fn validations_json<'a>(fields: impl Iterator<Item = (&'a str, &'a TodoError)>) -> Value {
    let map: Map<String, Value> = fields
        .map(|(field, e)| (field.to_string(), json!(e.message)))
        .collect();
    Value::Object(map)
}

pub fn task_json(t: &Task) -> Value {
    json!({
        "id": t.id,
        "description": t.description,
        "priority": t.priority.as_str(),
        "dates": {
            "start": t.dates.start,
            "due": t.dates.due
        },
        "is_done": t.is_done
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldErrors;

    #[test]
    fn unknown_errors_hide_details() {
        let err = TodoError::wrap(TodoError::unknown("disk I/O error at /var/db"), ErrorCode::Unknown, "search");
        let v = error("search", &err);
        assert_eq!(v["error"]["code"], "INTERNAL");
        assert_eq!(v["error"]["message"], "search failed");
        assert!(!v.to_string().contains("/var/db"));
    }

    #[test]
    fn invalid_argument_lists_fields() {
        let mut fields = FieldErrors::new();
        fields.insert("description".into(), TodoError::invalid_argument("cannot be blank"));
        let err = TodoError::invalid_argument("invalid task").with_validations(fields);
        let v = error("create", &err);
        assert_eq!(v["error"]["code"], "INVALID_ARGUMENT");
        assert_eq!(v["error"]["validations"]["description"], "cannot be blank");
    }
}
