//! Input acceptance rules. Everything here is pure: no I/O, no side effects.

use crate::error::{ErrorCode, FieldErrors, TodoError};
use crate::models::{CreateParams, Dates, Priority, Task};

pub trait Validate {
    fn validate(&self) -> Result<(), TodoError>;
}

/// Every `Priority` value is one of the four accepted levels; out-of-range
/// numbers are rejected earlier by `Priority::try_from`.
impl Validate for Priority {
    fn validate(&self) -> Result<(), TodoError> {
        match self {
            Priority::None | Priority::Low | Priority::Medium | Priority::High => Ok(()),
        }
    }
}

impl Validate for Dates {
    fn validate(&self) -> Result<(), TodoError> {
        if let (Some(start), Some(due)) = (self.start, self.due) {
            if start > due {
                return Err(TodoError::invalid_argument(
                    "start date should not be after due date",
                ));
            }
        }
        Ok(())
    }
}

impl Validate for Task {
    fn validate(&self) -> Result<(), TodoError> {
        let mut fields = FieldErrors::new();

        if self.description.is_empty() {
            fields.insert("description".into(), TodoError::invalid_argument("cannot be blank"));
        }
        if let Err(e) = self.priority.validate() {
            fields.insert("priority".into(), e);
        }
        if let Err(e) = self.dates.validate() {
            fields.insert("dates".into(), e);
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(TodoError::invalid_argument("invalid task").with_validations(fields))
        }
    }
}

impl Validate for CreateParams {
    fn validate(&self) -> Result<(), TodoError> {
        if self.priority == Priority::None {
            let mut fields = FieldErrors::new();
            fields.insert("priority".into(), TodoError::invalid_argument("priority is required"));
            return Err(TodoError::invalid_argument("priority is required").with_validations(fields));
        }

        self.to_task()
            .validate()
            .map_err(|e| TodoError::wrap(e, ErrorCode::InvalidArgument, "validation.validate"))
    }
}
