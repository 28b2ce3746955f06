use std::collections::BTreeMap;
use std::error::Error as StdError;

use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Field name to the error raised for that field.
pub type FieldErrors = BTreeMap<String, TodoError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unknown,
    NotFound,
    InvalidArgument,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "INTERNAL",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
        }
    }
}

#[derive(Debug, Error)]
#[error("{}", render(.message, .source))]
pub struct TodoError {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    source: Option<BoxError>,
    validations: Option<FieldErrors>,
}

fn render(message: &str, source: &Option<BoxError>) -> String {
    match source {
        Some(orig) => format!("{message}: {orig}"),
        None => message.to_string(),
    }
}

impl TodoError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            validations: None,
        }
    }

    /// Wraps `orig` under `message`, keeping it reachable through `source()`.
    pub fn wrap(orig: impl Into<BoxError>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(orig.into()),
            validations: None,
        }
    }

    /// Like [`TodoError::wrap`] with [`ErrorCode::Unknown`], except that a
    /// NotFound reported by the wrapped error survives the wrapping.
    pub fn wrap_unknown(orig: TodoError, message: impl Into<String>) -> Self {
        let code = match orig.code {
            ErrorCode::NotFound => ErrorCode::NotFound,
            _ => ErrorCode::Unknown,
        };
        Self::wrap(orig, code, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn not_found(reference: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("task not found: {reference}"))
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }

    pub fn with_validations(mut self, fields: FieldErrors) -> Self {
        self.validations = Some(fields);
        self
    }

    /// Field errors attached to this error or to the nearest wrapped
    /// `TodoError` carrying them.
    pub fn validations(&self) -> Option<&FieldErrors> {
        if let Some(fields) = &self.validations {
            return Some(fields);
        }
        self.source
            .as_deref()
            .and_then(|orig| orig.downcast_ref::<TodoError>())
            .and_then(TodoError::validations)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

impl From<rusqlite::Error> for TodoError {
    fn from(e: rusqlite::Error) -> Self {
        Self::wrap(e, ErrorCode::Unknown, "database")
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(e: serde_json::Error) -> Self {
        Self::wrap(e, ErrorCode::Unknown, "json")
    }
}

impl From<std::io::Error> for TodoError {
    fn from(e: std::io::Error) -> Self {
        Self::wrap(e, ErrorCode::Unknown, "io")
    }
}
