//! Error taxonomy shared by the query, client and store layers.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid query input, detected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no date selected")]
    MissingDate,

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("no province selected")]
    MissingProvince,

    #[error("unknown province '{0}'")]
    UnknownProvince(String),
}

/// Failure talking to the remote prediction service.
#[derive(Debug, Error)]
pub enum PredictionServiceError {
    /// The service answered with a non-2xx status.
    #[error("prediction service returned status {status}: {}", truncate_body(.body))]
    Status { status: u16, body: String },

    /// The request never produced a response (unreachable endpoint, reset connection, ...).
    #[error("failed to reach prediction service: {cause}")]
    Transport { cause: String },

    /// A 2xx response whose body is not a prediction.
    #[error("malformed prediction response: {cause}")]
    InvalidResponse { cause: String },
}

impl PredictionServiceError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether resubmitting the same query may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Transport { .. } => true,
            Self::InvalidResponse { .. } => false,
        }
    }
}

/// Stored history that cannot be read or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to access history file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("stored prediction '{key}' is malformed: {reason}")]
    MalformedRecord { key: String, reason: String },

    #[error("failed to encode prediction record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Umbrella error for a full submit / browse cycle.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Service(#[from] PredictionServiceError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl PredictError {
    /// Inline message for the view that triggered the operation.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(ValidationError::MissingDate | ValidationError::MissingProvince) => {
                "Please select both date and province".to_string()
            }
            Self::Validation(err) => format!("Invalid input: {err}"),
            Self::Service(err) => format!(
                "An error occurred while fetching the prediction: {err}. \
                 Please ensure the prediction service is running."
            ),
            Self::Persistence(err) => format!("Saved predictions could not be accessed: {err}"),
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
