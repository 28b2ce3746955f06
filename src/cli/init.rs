use std::path::Path;

use serde_json::json;

use crate::config::Config;
use crate::db::connection;

use super::{print_json, report_error};

pub fn run(home: &Path, config: &Config, json_output: bool) -> i32 {
    let result = connection::init_db(home).and_then(|db| Ok((db, config.write_if_missing(home)?)));
    match result {
        Ok((db_path, config_path)) => {
            if json_output {
                print_json(&json!({
                    "success": true,
                    "data": {
                        "path": db_path.to_string_lossy(),
                        "config": config_path.to_string_lossy(),
                    }
                }));
            } else {
                println!("Initialized todo-svc at {}", db_path.display());
            }
            0
        }
        Err(e) => report_error("init", &e, json_output),
    }
}
