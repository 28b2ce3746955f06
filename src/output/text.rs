use crate::error::TodoError;
use crate::events::EventRecord;
use crate::models::Task;

pub fn print_error(op: &str, err: &TodoError) {
    eprintln!("Error: {op} failed ({})", err.code.as_str());
    if let Some(fields) = err.validations() {
        for (field, e) in fields {
            eprintln!("  {field}: {}", e.message);
        }
    }
}

pub fn print_task(t: &Task) {
    println!("Task: {} ({})", t.description, t.id);
    println!("  Priority: {}", t.priority);
    println!("  Done: {}", if t.is_done { "yes" } else { "no" });
    if let Some(start) = t.dates.start {
        println!("  Start: {}", start.to_rfc3339());
    }
    if let Some(due) = t.dates.due {
        println!("  Due: {}", due.to_rfc3339());
    }
}

pub fn print_task_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        println!(
            "  [{}] {} ({}) p={}",
            if t.is_done { "x" } else { " " },
            t.description,
            t.id,
            t.priority
        );
    }
}

pub fn print_events(records: &[EventRecord]) {
    if records.is_empty() {
        println!("No events.");
        return;
    }
    for r in records {
        println!("  {} {} {}", r.published_at.to_rfc3339(), r.channel, r.payload);
    }
}
