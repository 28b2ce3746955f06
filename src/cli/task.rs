use std::path::Path;

use serde_json::json;

use crate::cli::commands::TaskCommands;
use crate::config::Config;
use crate::context::Context;
use crate::error::TodoError;
use crate::models::{CreateParams, Dates, SearchParams};
use crate::output;
use crate::service::TaskService;

use super::{open_service, parse_date, parse_priority, print_json, report_error, require_init};

pub async fn run(
    cmd: TaskCommands,
    ctx: &Context,
    home: &Path,
    config: &Config,
    json_output: bool,
) -> i32 {
    if let Some(code) = require_init(home, json_output) {
        return code;
    }
    let service = match open_service(home, config) {
        Ok(service) => service,
        Err(e) => return report_error("open", &e, json_output),
    };

    let (op, result) = match cmd {
        TaskCommands::Create { description, priority, start, due } => (
            "create",
            run_create(&service, ctx, description, &priority, start.as_deref(), due.as_deref(), json_output).await,
        ),
        TaskCommands::Show { id } => ("find", run_show(&service, ctx, &id, json_output).await),
        TaskCommands::Update { id, description, priority, start, due, done } => (
            "update",
            run_update(
                &service,
                ctx,
                &id,
                &description,
                &priority,
                start.as_deref(),
                due.as_deref(),
                done,
                json_output,
            )
            .await,
        ),
        TaskCommands::Delete { id } => ("delete", run_delete(&service, ctx, &id, json_output).await),
        TaskCommands::Search { description, priority, done, from, size } => {
            let params = SearchParams { description, priority: None, is_done: done, from, size };
            ("search", run_search(&service, ctx, params, priority.as_deref(), json_output).await)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => report_error(op, &e, json_output),
    }
}

fn parse_dates(start: Option<&str>, due: Option<&str>) -> Result<Dates, TodoError> {
    Ok(Dates::new(parse_date("start", start)?, parse_date("due", due)?))
}

async fn run_create(
    service: &TaskService,
    ctx: &Context,
    description: String,
    priority: &str,
    start: Option<&str>,
    due: Option<&str>,
    json_output: bool,
) -> Result<i32, TodoError> {
    let params = CreateParams {
        description,
        priority: parse_priority(priority)?,
        dates: parse_dates(start, due)?,
    };
    let task = service.create(ctx, &params).await?;

    if json_output {
        print_json(&output::json::success(json!({ "task": output::json::task_json(&task) })));
    } else {
        println!("Created task: {} ({})", task.description, task.id);
    }
    Ok(0)
}

async fn run_show(service: &TaskService, ctx: &Context, id: &str, json_output: bool) -> Result<i32, TodoError> {
    let task = service.task(ctx, id).await?;

    if json_output {
        print_json(&output::json::success(json!({ "task": output::json::task_json(&task) })));
    } else {
        output::text::print_task(&task);
    }
    Ok(0)
}

#[allow(clippy::too_many_arguments)]
async fn run_update(
    service: &TaskService,
    ctx: &Context,
    id: &str,
    description: &str,
    priority: &str,
    start: Option<&str>,
    due: Option<&str>,
    done: bool,
    json_output: bool,
) -> Result<i32, TodoError> {
    let priority = parse_priority(priority)?;
    let dates = parse_dates(start, due)?;
    service.update(ctx, id, description, priority, &dates, done).await?;

    if json_output {
        print_json(&output::json::success(json!({ "updated": { "id": id } })));
    } else {
        println!("Updated task {id}");
    }
    Ok(0)
}

async fn run_delete(service: &TaskService, ctx: &Context, id: &str, json_output: bool) -> Result<i32, TodoError> {
    service.delete(ctx, id).await?;

    if json_output {
        print_json(&output::json::success(json!({ "deleted": { "id": id } })));
    } else {
        println!("Deleted task {id}");
    }
    Ok(0)
}

async fn run_search(
    service: &TaskService,
    ctx: &Context,
    mut params: SearchParams,
    priority: Option<&str>,
    json_output: bool,
) -> Result<i32, TodoError> {
    params.priority = priority.map(parse_priority).transpose()?;
    let results = service.by(ctx, &params).await?;

    if json_output {
        let tasks: Vec<_> = results.tasks.iter().map(output::json::task_json).collect();
        print_json(&output::json::success(json!({
            "tasks": tasks,
            "total": results.total,
        })));
    } else {
        output::text::print_task_list(&results.tasks);
        println!("Total: {}", results.total);
    }
    Ok(0)
}
