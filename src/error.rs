use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// How a provider failure should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Network trouble, timeouts, 5xx and empty completions. Worth another attempt.
    Transient,
    /// Authentication, quota and other 4xx answers. Repeating the call will not help.
    Permanent,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::Transient => f.write_str("transient"),
            ProviderErrorKind::Permanent => f.write_str("permanent"),
        }
    }
}

/// Failure raised at the boundary to the text-generation provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} provider error: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// HTTP status returned by the provider, when there was one
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Transient,
            message: message.into(),
            status: None,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Permanent,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ProviderErrorKind::Transient
    }
}

/// No JSON-shaped candidate could be isolated from the provider output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("provider output contains no JSON object")]
    NoObject,

    #[error("JSON object starting at byte {start} is never closed")]
    Unbalanced { start: usize },
}

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    ParseFailure,
    MissingField,
    WrongType,
    OutOfRange,
    LengthMismatch,
    CrossCheckMismatch,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::ParseFailure => "parse_failure",
            ValidationErrorKind::MissingField => "missing_field",
            ValidationErrorKind::WrongType => "wrong_type",
            ValidationErrorKind::OutOfRange => "out_of_range",
            ValidationErrorKind::LengthMismatch => "length_mismatch",
            ValidationErrorKind::CrossCheckMismatch => "cross_check_mismatch",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The candidate payload is malformed or disagrees with the request.
///
/// `path` points at the offending location in the provider payload using
/// dotted/indexed notation, e.g. `itinerary[2].activities[0].lat`, or
/// `<root>` for the document itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {path}: {detail}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub path: String,
    pub detail: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Error produced by a single generation attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl StageError {
    /// Permanent provider errors stop the retry loop; everything else gets another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            StageError::Provider(err) => err.is_transient(),
            StageError::Extraction(_) => true,
            StageError::Validation(_) => true,
        }
    }

    /// Name of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            StageError::Provider(_) => "generating",
            StageError::Extraction(_) => "extracting",
            StageError::Validation(_) => "validating",
        }
    }
}

/// What the caller should tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureOutcome {
    /// Transient trouble or exhausted retries: trying again later may work.
    Unavailable,
    /// The provider refused the request outright.
    Rejected,
}

/// Terminal failure of `plan_trip`, surfaced after retries are exhausted or
/// on the first permanent provider error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("itinerary generation failed after {attempts} attempt(s): {last_error}")]
pub struct GenerationFailure {
    pub attempts: usize,
    pub last_error: StageError,
}

impl GenerationFailure {
    pub fn outcome(&self) -> FailureOutcome {
        if self.last_error.is_retryable() {
            FailureOutcome::Unavailable
        } else {
            FailureOutcome::Rejected
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self.outcome() {
            FailureOutcome::Unavailable => {
                "The itinerary service is temporarily unavailable. Please try again."
            }
            FailureOutcome::Rejected => {
                "The request could not be fulfilled. Please try a different request."
            }
        }
    }
}

/// Main error type for the planner
#[derive(Error, Debug)]
pub enum TripError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid trip request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Generation(#[from] GenerationFailure),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TripError>;

impl TripError {
    /// Check if the caller may usefully repeat the same request
    pub fn is_retryable(&self) -> bool {
        match self {
            TripError::Generation(failure) => failure.outcome() == FailureOutcome::Unavailable,
            TripError::Io(_) => true,
            _ => false,
        }
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            TripError::Config(_) => "CONFIG_ERROR",
            TripError::InvalidRequest(_) => "INVALID_REQUEST",
            TripError::Generation(failure) => match failure.outcome() {
                FailureOutcome::Unavailable => "GENERATION_UNAVAILABLE",
                FailureOutcome::Rejected => "GENERATION_REJECTED",
            },
            TripError::Io(_) => "IO_ERROR",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        match self {
            TripError::Generation(failure) => serde_json::json!({
                "error": {
                    "code": self.error_code(),
                    "message": failure.user_message(),
                    "retryable": self.is_retryable(),
                    "outcome": failure.outcome(),
                    "attempts": failure.attempts,
                    "stage": failure.last_error.stage(),
                }
            }),
            _ => serde_json::json!({
                "error": {
                    "code": self.error_code(),
                    "message": self.to_string(),
                    "retryable": self.is_retryable()
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_retryability() {
        assert!(StageError::from(ProviderError::transient("timeout")).is_retryable());
        assert!(!StageError::from(ProviderError::permanent("bad key")).is_retryable());
        assert!(StageError::from(ExtractionError::NoObject).is_retryable());
        assert!(StageError::from(ValidationError::new(
            ValidationErrorKind::ParseFailure,
            "<root>",
            "eof"
        ))
        .is_retryable());
    }

    #[test]
    fn test_failure_outcome_follows_last_error() {
        let exhausted = GenerationFailure {
            attempts: 3,
            last_error: ProviderError::transient("503").into(),
        };
        assert_eq!(exhausted.outcome(), FailureOutcome::Unavailable);
        assert!(exhausted.user_message().contains("try again"));

        let rejected = GenerationFailure {
            attempts: 1,
            last_error: ProviderError::permanent("401").with_status(401).into(),
        };
        assert_eq!(rejected.outcome(), FailureOutcome::Rejected);
        assert!(rejected.user_message().contains("different request"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(
            ValidationErrorKind::OutOfRange,
            "itinerary[0].activities[1].lat",
            "123.0 is greater than the maximum of 90",
        );
        assert_eq!(
            err.to_string(),
            "out_of_range at itinerary[0].activities[1].lat: 123.0 is greater than the maximum of 90"
        );
    }

    #[test]
    fn test_generation_payload() {
        let error = TripError::from(GenerationFailure {
            attempts: 3,
            last_error: ExtractionError::NoObject.into(),
        });
        let payload = error.to_error_payload();
        assert_eq!(payload["error"]["code"], "GENERATION_UNAVAILABLE");
        assert_eq!(payload["error"]["retryable"], true);
        assert_eq!(payload["error"]["outcome"], "unavailable");
        assert_eq!(payload["error"]["attempts"], 3);
        assert_eq!(payload["error"]["stage"], "extracting");
    }
}
