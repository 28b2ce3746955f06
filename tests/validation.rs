use chrono::{TimeZone, Utc};

use todo_svc::error::ErrorCode;
use todo_svc::models::{CreateParams, Dates, Priority, Task};
use todo_svc::validation::Validate;

fn day(d: u32) -> Option<chrono::DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2024, 3, d, 9, 0, 0).unwrap())
}

#[test]
fn test_priority_numbers() {
    for (n, want) in [(0, Priority::None), (1, Priority::Low), (2, Priority::Medium), (3, Priority::High)] {
        let p = Priority::try_from(n).unwrap();
        assert_eq!(p, want);
        assert!(p.validate().is_ok());
    }

    for n in [-1, 4, 99] {
        let err = Priority::try_from(n).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
        assert_eq!(err.message, format!("invalid priority: {n}"));
    }
}

#[test]
fn test_priority_parses_name_or_number() {
    assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
    assert_eq!("Medium".parse::<Priority>().unwrap(), Priority::Medium);
    assert_eq!("1".parse::<Priority>().unwrap(), Priority::Low);
    assert_eq!("urgent".parse::<Priority>().unwrap_err().message, "invalid priority: urgent");
    assert_eq!("7".parse::<Priority>().unwrap_err().message, "invalid priority: 7");
}

#[test]
fn test_dates_ordering() {
    let cases = [
        (None, None, true),
        (day(1), None, true),
        (None, day(1), true),
        (day(1), day(2), true),
        (day(2), day(2), true),
        (day(3), day(2), false),
    ];
    for (start, due, ok) in cases {
        let result = Dates::new(start, due).validate();
        assert_eq!(result.is_ok(), ok, "start={start:?} due={due:?}");
        if let Err(e) = result {
            assert_eq!(e.message, "start date should not be after due date");
        }
    }
}

#[test]
fn test_task_collects_every_failing_field() {
    let task = Task {
        description: String::new(),
        priority: Priority::Low,
        dates: Dates::new(day(5), day(1)),
        ..Task::default()
    };
    let err = task.validate().unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidArgument);
    assert_eq!(err.message, "invalid task");

    let fields = err.validations().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["description"].message, "cannot be blank");
    assert_eq!(fields["dates"].message, "start date should not be after due date");
}

#[test]
fn test_whitespace_description_is_accepted() {
    let task = Task {
        description: "  ".into(),
        priority: Priority::High,
        ..Task::default()
    };
    assert!(task.validate().is_ok());
}

#[test]
fn test_missing_priority_reports_only_priority() {
    let params = CreateParams {
        description: String::new(),
        priority: Priority::None,
        dates: Dates::new(day(5), day(1)),
    };
    let err = params.validate().unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidArgument);

    let fields = err.validations().unwrap();
    assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["priority"]);
}

#[test]
fn test_create_params_wrap_task_errors() {
    let params = CreateParams {
        description: String::new(),
        priority: Priority::Medium,
        dates: Dates::default(),
    };
    let err = params.validate().unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidArgument);
    assert_eq!(err.message, "validation.validate");
    assert!(err.to_string().starts_with("validation.validate: invalid task"));
    assert!(err.validations().unwrap().contains_key("description"));
}

#[test]
fn test_valid_create_params() {
    let params = CreateParams {
        description: "buy milk".into(),
        priority: Priority::Low,
        dates: Dates::new(day(1), day(2)),
    };
    assert!(params.validate().is_ok());
}
