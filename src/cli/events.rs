use std::path::Path;

use serde_json::json;

use crate::events::JsonlEventLog;
use crate::output;

use super::{events_path, print_json, report_error, require_init};

pub async fn run(home: &Path, json_output: bool) -> i32 {
    if let Some(code) = require_init(home, json_output) {
        return code;
    }
    let log = JsonlEventLog::new(events_path(home));
    match log.read_all().await {
        Ok(records) => {
            if json_output {
                print_json(&output::json::success(json!({ "events": records })));
            } else {
                output::text::print_events(&records);
            }
            0
        }
        Err(e) => report_error("events", &e, json_output),
    }
}
